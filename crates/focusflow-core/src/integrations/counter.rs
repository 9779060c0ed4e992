//! Remote tally of completed pomodoros.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::task::JoinHandle;
use url::Url;

use super::parse_endpoint;
use crate::error::IntegrationError;
use crate::storage::IntegrationsConfig;

#[derive(Debug, Deserialize)]
struct HitResponse {
    value: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CompletionCounter {
    http_client: Client,
    url: Url,
    timeout: Duration,
}

impl CompletionCounter {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, IntegrationError> {
        Ok(Self {
            http_client: Client::new(),
            url: parse_endpoint(url)?,
            timeout,
        })
    }

    /// `None` when the counter is switched off in config.
    pub fn from_config(config: &IntegrationsConfig) -> Result<Option<Self>, IntegrationError> {
        if !config.completion_counter {
            return Ok(None);
        }
        Self::new(&config.counter_url, Duration::from_millis(config.timeout_ms)).map(Some)
    }

    /// Increment the remote counter. Returns the new total if the service
    /// reports one.
    pub async fn hit(&self) -> Result<Option<u64>, IntegrationError> {
        let request = async {
            let resp = self
                .http_client
                .get(self.url.clone())
                .send()
                .await?
                .error_for_status()?;
            Ok::<_, IntegrationError>(resp.json::<HitResponse>().await.ok())
        };
        let body = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| IntegrationError::Timeout(self.timeout.as_millis() as u64))??;
        Ok(body.and_then(|b| b.value))
    }

    /// Fire-and-forget `hit` on the current tokio runtime.
    pub fn spawn_hit(&self) -> JoinHandle<()> {
        let counter = self.clone();
        tokio::spawn(async move {
            match counter.hit().await {
                Ok(total) => tracing::debug!(?total, "completion counter hit"),
                Err(e) => tracing::debug!(error = %e, "completion counter unavailable"),
            }
        })
    }
}
