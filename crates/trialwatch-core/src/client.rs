//! REST client for the experiment details API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::WatchConfig;
use crate::error::{Result, TrackerError};
use crate::models::{Experiment, TrialDetails};

/// Anything that can look up experiments and trials by id.
///
/// The HTTP client implements it; tests and the server's in-process views
/// can supply their own.
#[async_trait]
pub trait DetailsSource: Send + Sync {
    async fn get_experiment_details(&self, id: i64) -> Result<Experiment>;
    async fn get_trial_details(&self, id: i64) -> Result<TrialDetails>;
}

/// HTTP client for a trialwatch-compatible server.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given base URL (e.g. `http://localhost:8080`).
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &WatchConfig) -> Result<Self> {
        Self::with_timeout(&config.api_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, not_found: TrackerError) -> Result<T> {
        let url = format!("{}/api/v1{}", self.base_url, path);
        debug!(%url, "GET");
        let resp = self.client.get(&url).send().await?;
        handle_response(resp, not_found).await
    }
}

async fn handle_response<T: DeserializeOwned>(resp: Response, not_found: TrackerError) -> Result<T> {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(not_found);
    }
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(TrackerError::Api {
            status: status.as_u16(),
            message,
        });
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl DetailsSource for ApiClient {
    async fn get_experiment_details(&self, id: i64) -> Result<Experiment> {
        self.get_json(&format!("/experiments/{id}"), TrackerError::experiment_not_found(id))
            .await
    }

    async fn get_trial_details(&self, id: i64) -> Result<TrialDetails> {
        self.get_json(&format!("/trials/{id}"), TrackerError::trial_not_found(id))
            .await
    }
}
