use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn unix_now() -> i64 {
    now().timestamp()
}

/// Time source and delay used by the polling loop.
#[async_trait]
pub trait Clock: Send + Sync {
    fn unix_now(&self) -> i64;

    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn unix_now(&self) -> i64 {
        unix_now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
