use crate::error::Error;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Homework {
    pub homework_name: Option<String>,
    pub status: Option<String>,
}

impl Homework {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            homework_name: Some(name.into()),
            status: Some(status.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub const ALL: [HomeworkStatus; 3] = [
        HomeworkStatus::Approved,
        HomeworkStatus::Reviewing,
        HomeworkStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "approved",
            HomeworkStatus::Reviewing => "reviewing",
            HomeworkStatus::Rejected => "rejected",
        }
    }

    pub fn verdict(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            HomeworkStatus::Reviewing => "Работа взята на проверку ревьюером.",
            HomeworkStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for HomeworkStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::UndocumentedStatus(s.to_string()))
    }
}

/// Outcome of mapping one homework record to a notification.
#[derive(Debug)]
pub enum StatusUpdate {
    Changed(String),
    Unchanged,
    Failed(Error),
}

impl StatusUpdate {
    pub fn changed(name: &str, status: HomeworkStatus) -> Self {
        StatusUpdate::Changed(format!(
            "Changed review status of work \"{}\". {}",
            name,
            status.verdict()
        ))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            StatusUpdate::Changed(msg) => Some(msg),
            _ => None,
        }
    }
}
