//! Break activity suggestions from a public "bored" style API.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::parse_endpoint;
use crate::error::IntegrationError;
use crate::storage::IntegrationsConfig;

/// Shown whenever the suggestion service is disabled, slow or broken.
pub const FALLBACK_ACTIVITY: &str = "Take a deep breath and stretch.";

#[derive(Debug, Deserialize)]
struct ActivityResponse {
    activity: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ActivityClient {
    http_client: Client,
    endpoint: Url,
    timeout: Duration,
    enabled: bool,
}

impl ActivityClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, IntegrationError> {
        Ok(Self {
            http_client: Client::new(),
            endpoint: parse_endpoint(endpoint)?,
            timeout,
            enabled: true,
        })
    }

    pub fn from_config(config: &IntegrationsConfig) -> Result<Self, IntegrationError> {
        let mut client = Self::new(
            &config.activity_endpoint,
            Duration::from_millis(config.timeout_ms),
        )?;
        client.enabled = config.break_suggestions;
        Ok(client)
    }

    /// Fetch one relaxation activity.
    pub async fn fetch_activity(&self) -> Result<String, IntegrationError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("type", "relaxation");

        let request = async {
            let resp: ActivityResponse = self
                .http_client
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            Ok::<_, IntegrationError>(resp)
        };
        let resp = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| IntegrationError::Timeout(self.timeout.as_millis() as u64))??;

        resp.activity
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| IntegrationError::UnexpectedResponse("missing 'activity'".into()))
    }

    /// A suggestion for the break that just started. Never fails.
    pub async fn suggest_break_activity(&self) -> String {
        if !self.enabled {
            return FALLBACK_ACTIVITY.to_string();
        }
        match self.fetch_activity().await {
            Ok(activity) => activity,
            Err(e) => {
                tracing::debug!(error = %e, "break suggestion unavailable");
                FALLBACK_ACTIVITY.to_string()
            }
        }
    }
}
