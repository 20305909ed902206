use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_UPSTREAM_URL: &str = "https://economia.awesomeapi.com.br/json/last/USD-BRL";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_millis(200);
pub const DEFAULT_DATABASE_PATH: &str = "quotations.db";
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(10);

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080/cotacao";
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_millis(300);
pub const DEFAULT_OUTPUT_PATH: &str = "cotacao.txt";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub upstream_url: String,
    pub upstream_timeout: Duration,
    pub database_path: PathBuf,
    pub store_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Reads `.env` (if any) and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = ServerConfig::default();
        Ok(ServerConfig {
            bind_addr: lookup("COTACAO_BIND_ADDR").unwrap_or(defaults.bind_addr),
            upstream_url: lookup("COTACAO_UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            upstream_timeout: millis(&lookup, "COTACAO_UPSTREAM_TIMEOUT_MS")?
                .unwrap_or(defaults.upstream_timeout),
            database_path: lookup("COTACAO_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            store_timeout: millis(&lookup, "COTACAO_STORE_TIMEOUT_MS")?
                .unwrap_or(defaults.store_timeout),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub server_url: String,
    pub timeout: Duration,
    pub output_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout: DEFAULT_CLIENT_TIMEOUT,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = ClientConfig::default();
        Ok(ClientConfig {
            server_url: lookup("COTACAO_SERVER_URL").unwrap_or(defaults.server_url),
            timeout: millis(&lookup, "COTACAO_CLIENT_TIMEOUT_MS")?.unwrap_or(defaults.timeout),
            output_path: lookup("COTACAO_OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path),
        })
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    match lookup(key) {
        Some(raw) => {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{key} must be a number of milliseconds, got {raw:?}"))?;
            Ok(Some(Duration::from_millis(ms)))
        }
        None => Ok(None),
    }
}
