//! HTTP client for the EPIC metadata endpoints.
//!
//! This is the production [`NetworkClient`]: one shared `reqwest::Client`,
//! a per-request timeout, and the status/transport classification the
//! retry path depends on.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::NetworkClient;
use crate::error::FetchError;

/// A [`NetworkClient`] backed by [`reqwest`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("earthview/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NetworkClient for HttpClient {
    async fn request(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16()));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| {
                if e.is_decode() {
                    FetchError::Malformed(e.to_string())
                } else {
                    classify_transport(e)
                }
            })
    }
}

fn classify_transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err.to_string())
    }
}
