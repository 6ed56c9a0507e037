use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed for {url}: {}", describe_http(.source))]
    Http { url: String, source: reqwest::Error },
    #[error("failed to decode hot list envelope from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("API returned error status {status}: {message}")]
    Status { status: i64, message: String },
    #[error("hot list fetch failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

/// The reqwest message followed by its cause chain.
fn describe_http(err: &reqwest::Error) -> String {
    let mut out = if err.is_timeout() {
        format!("timed out: {err}")
    } else {
        err.to_string()
    };
    let mut cause = err.source();
    while let Some(c) = cause {
        out.push_str(": ");
        out.push_str(&c.to_string());
        cause = c.source();
    }
    out
}
