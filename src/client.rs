use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{error, info};
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::config::ClientConfig;
use crate::quotation::TrimmedQuotation;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build request: {0}")]
    Request(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(StatusCode),
    #[error("failed to read body: {0}")]
    Body(#[source] reqwest::Error),
    #[error("failed to parse body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("server did not answer within {0:?}")]
    DeadlineExceeded(Duration),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub async fn fetch_quotation(
    http: &Client,
    url: &str,
    deadline: Duration,
) -> Result<TrimmedQuotation, ClientError> {
    tokio::time::timeout(deadline, load(http, url))
        .await
        .map_err(|_| ClientError::DeadlineExceeded(deadline))?
}

async fn load(http: &Client, url: &str) -> Result<TrimmedQuotation, ClientError> {
    let request = http.get(url).build().map_err(ClientError::Request)?;
    let resp = http.execute(request).await.map_err(ClientError::Transport)?;
    if !resp.status().is_success() {
        return Err(ClientError::Status(resp.status()));
    }

    let body = resp.bytes().await.map_err(ClientError::Body)?;
    Ok(serde_json::from_slice(&body)?)
}

/// Replaces the file with a single `Dólar: <bid>` line.
///
/// The line goes to a sibling temp file first, so a failed write leaves the old content alone.
pub async fn write_quotation_file(path: &Path, quotation: &TrimmedQuotation) -> Result<(), ClientError> {
    let tmp = temp_path(path);
    let write_err = |source: io::Error| ClientError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Err(e) = tokio::fs::write(&tmp, quotation.file_line()).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_err(e));
    }
    tokio::fs::rename(&tmp, path).await.map_err(write_err)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("cotacao.txt"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// One request, one file write. Failures are logged and swallowed.
pub async fn run(config: &ClientConfig) {
    let http = Client::new();

    let quotation = match fetch_quotation(&http, &config.server_url, config.timeout).await {
        Ok(quotation) => quotation,
        Err(e) => {
            error!("Error fetching quotation from {}: {e}", config.server_url);
            return;
        }
    };

    if let Err(e) = write_quotation_file(&config.output_path, &quotation).await {
        error!("Error saving quotation: {e}");
        return;
    }
    info!("Bid: {}", quotation.bid);
}
