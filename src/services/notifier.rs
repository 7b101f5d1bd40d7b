use crate::error::{Error, Result};
use crate::models::homework::{Homework, HomeworkStatus, StatusUpdate};
use crate::services::homework_service::{check_response, current_date, HomeworkApi};
use crate::services::telegram_service::Messenger;
use crate::utils::time::Clock;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub fn parse_status(homework: &Homework) -> StatusUpdate {
    let name = homework.homework_name.as_deref();
    let code = homework.status.as_deref();

    match (name, code) {
        (None, None) => {
            info!("No homework status changes detected");
            StatusUpdate::Unchanged
        }
        (Some(name), None) => {
            error!(homework = name, "Homework record has no status");
            StatusUpdate::Failed(Error::UndocumentedStatus("<missing>".to_string()))
        }
        (name, Some(code)) => match code.parse::<HomeworkStatus>() {
            Err(e) => {
                error!(status = code, "Undocumented homework status in response");
                StatusUpdate::Failed(e)
            }
            Ok(status) => match name {
                Some(name) => StatusUpdate::changed(name, status),
                None => {
                    error!(status = code, "Homework record has no name");
                    StatusUpdate::Failed(Error::Shape("`homework_name` is missing".to_string()))
                }
            },
        },
    }
}

pub fn failure_message(err: &Error) -> String {
    format!("Program failure: {}", err)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The window was fetched; `sent` notifications were delivered.
    Polled { sent: usize },
    /// Fetch or validation failed; the cursor stayed where it was.
    Failed,
}

pub struct Notifier<A, M, C> {
    api: A,
    messenger: M,
    clock: C,
    chat_id: String,
    retry_time: Duration,
    cursor: i64,
}

impl<A, M, C> Notifier<A, M, C>
where
    A: HomeworkApi,
    M: Messenger,
    C: Clock,
{
    pub fn new(api: A, messenger: M, clock: C, chat_id: String, retry_time: Duration) -> Self {
        let cursor = clock.unix_now();
        Self {
            api,
            messenger,
            clock,
            chat_id,
            retry_time,
            cursor,
        }
    }

    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Delivers `text` to the configured chat. Failures are logged, never returned.
    pub async fn send_message(&self, text: &str) -> bool {
        match self.messenger.send_message(&self.chat_id, text).await {
            Ok(sent) => {
                info!(recipient = %sent.chat.display_name(), "Message delivered");
                true
            }
            Err(e) => {
                error!(error = %e, "Message was not delivered");
                false
            }
        }
    }

    async fn poll(&mut self) -> Result<Vec<Homework>> {
        let response = self.api.get_api_answer(self.cursor).await?;
        let homeworks = check_response(&response)?;
        let next = current_date(&response)?;

        if next < self.cursor {
            warn!(
                cursor = self.cursor,
                current_date = next,
                "Server date is behind the cursor, keeping cursor"
            );
        } else {
            self.cursor = next;
        }
        Ok(homeworks)
    }

    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let homeworks = match self.poll().await {
            Ok(homeworks) => homeworks,
            Err(e) => {
                error!(error = %e, cursor = self.cursor, "Polling cycle failed");
                self.send_message(&failure_message(&e)).await;
                return CycleOutcome::Failed;
            }
        };

        debug!(count = homeworks.len(), cursor = self.cursor, "Homework statuses received");

        let mut sent = 0;
        for homework in &homeworks {
            let delivered = match parse_status(homework) {
                StatusUpdate::Changed(message) => self.send_message(&message).await,
                StatusUpdate::Unchanged => continue,
                StatusUpdate::Failed(e) => self.send_message(&failure_message(&e)).await,
            };
            if delivered {
                sent += 1;
            }
        }
        CycleOutcome::Polled { sent }
    }

    /// Polls until `shutdown` turns true or its sender is dropped.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(cursor = self.cursor, retry_time = ?self.retry_time, "Notifier started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = self.run_cycle().await;
            debug!(?outcome, "Cycle finished");

            tokio::select! {
                _ = self.clock.sleep(self.retry_time) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!(cursor = self.cursor, "Notifier stopped");
    }
}
