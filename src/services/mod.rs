pub mod homework_service;
pub mod notifier;
pub mod telegram_service;
