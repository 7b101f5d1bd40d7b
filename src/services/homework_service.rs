use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::homework::Homework;
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use serde_json::Value as JsonValue;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HomeworkApi: Send + Sync {
    /// Fetches homework statuses changed since `from_date` (Unix seconds).
    async fn get_api_answer(&self, from_date: i64) -> Result<JsonValue>;
}

#[derive(Clone)]
pub struct HomeworkService {
    client: Client,
    endpoint: String,
    token: String,
}

impl HomeworkService {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.practicum_token.clone(),
        })
    }
}

#[async_trait]
impl HomeworkApi for HomeworkService {
    async fn get_api_answer(&self, from_date: i64) -> Result<JsonValue> {
        let timestamp = if from_date == 0 {
            crate::utils::time::unix_now()
        } else {
            from_date
        };

        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", timestamp)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Homework service request failed");
                Error::Http(e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e.without_url()));
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                "Unexpected status from homework service"
            );
            return Err(Error::InvalidResponse {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let answer: JsonValue = serde_json::from_str(&body)?;
        tracing::info!(from_date = timestamp, "Homework service answered");
        Ok(answer)
    }
}

/// Validates the answer shape and returns its homework list.
pub fn check_response(response: &JsonValue) -> Result<Vec<Homework>> {
    let Some(object) = response.as_object() else {
        tracing::error!("Homework service answer is not an object");
        return Err(Error::Shape("response is not an object".to_string()));
    };

    let Some(homeworks) = object.get("homeworks").and_then(|v| v.as_array()) else {
        tracing::error!("Homework service answer has no `homeworks` list");
        return Err(Error::Shape("`homeworks` is missing or not a list".to_string()));
    };

    homeworks
        .iter()
        .map(|item| {
            if !item.is_object() {
                tracing::error!(item = %item, "Homework entry is not an object");
                return Err(Error::Shape("homework entry is not an object".to_string()));
            }
            Ok(serde_json::from_value::<Homework>(item.clone())?)
        })
        .collect()
}

pub fn current_date(response: &JsonValue) -> Result<i64> {
    response
        .get("current_date")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| {
            tracing::error!("Homework service answer has no integer `current_date`");
            Error::Shape("`current_date` is missing or not an integer".to_string())
        })
}
