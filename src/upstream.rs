use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::quotation::{QuotationReading, UpstreamEnvelope};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build upstream request: {0}")]
    Request(#[source] reqwest::Error),
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("upstream answered with status {0}")]
    Status(StatusCode),
    #[error("failed to read upstream body: {0}")]
    Body(#[source] reqwest::Error),
    #[error("failed to parse upstream body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("upstream did not answer within {0:?}")]
    DeadlineExceeded(Duration),
}

/// Bounded fetcher for the USD-BRL quotation.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    url: String,
    deadline: Duration,
}

impl UpstreamClient {
    pub fn new(http: Client, url: &str, deadline: Duration) -> Self {
        UpstreamClient {
            http,
            url: url.to_string(),
            deadline,
        }
    }

    /// Sends the request, reads and parses the body; all of it must finish before the deadline.
    pub async fn fetch(&self) -> Result<QuotationReading, FetchError> {
        tokio::time::timeout(self.deadline, self.load())
            .await
            .map_err(|_| FetchError::DeadlineExceeded(self.deadline))?
    }

    async fn load(&self) -> Result<QuotationReading, FetchError> {
        let request = self.http.get(&self.url).build().map_err(FetchError::Request)?;
        debug!("Requesting quotation from {}", self.url);

        let resp = self.http.execute(request).await.map_err(FetchError::Transport)?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }

        let body = resp.bytes().await.map_err(FetchError::Body)?;
        let envelope: UpstreamEnvelope = serde_json::from_slice(&body)?;

        Ok(envelope.usd_brl)
    }
}
