pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    homework_service::HomeworkService, notifier::Notifier, telegram_service::TelegramService,
};
use crate::utils::time::SystemClock;
use tokio::sync::watch;

pub type HomeworkNotifier = Notifier<HomeworkService, TelegramService, SystemClock>;

pub struct App {
    pub config: Config,
    pub notifier: HomeworkNotifier,
}

impl App {
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(Config::from_lookup(lookup)?)
    }

    pub fn new(config: Config) -> Result<Self> {
        let homework_service = HomeworkService::new(&config)?;
        let telegram_service = TelegramService::new(&config).map_err(|e| {
            tracing::error!(severity = "critical", error = %e, "Bot is not initialized");
            e
        })?;

        let notifier = Notifier::new(
            homework_service,
            telegram_service,
            SystemClock,
            config.telegram_chat_id.clone(),
            config.retry_time,
        );

        Ok(Self { config, notifier })
    }

    pub async fn run(mut self, shutdown: watch::Receiver<bool>) {
        self.notifier.run(shutdown).await;
    }
}
