use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::hot::{HotUnit, default_units};

/// Envelope status the aggregation backend uses to signal success.
pub const SUCCESS_STATUS: i64 = 100_000;

const MIN_POLL_INTERVAL: Duration = Duration::from_secs(30);
const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hotboard: HotboardConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default = "default_units")]
    pub unit: Vec<HotUnit>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hotboard: HotboardConfig::default(),
            source: SourceConfig::default(),
            poll: PollConfig::default(),
            unit: default_units(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HotboardConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for HotboardConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            listen: default_listen(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

/// Where the aggregated hot list comes from and how hard to try.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_name")]
    pub name: String,
    #[serde(default = "default_source_url")]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: String,
    #[serde(default = "default_success_status")]
    pub success_status: i64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: default_source_name(),
            url: default_source_url(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            success_status: default_success_status(),
        }
    }
}

fn default_source_name() -> String {
    "supabase".to_string()
}
fn default_source_url() -> String {
    "https://qguuzxljrertmjypatge.supabase.co/functions/v1/hot_list".to_string()
}
fn default_timeout() -> String {
    "15s".to_string()
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_delay() -> String {
    "1s".to_string()
}
fn default_success_status() -> i64 {
    SUCCESS_STATUS
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval")]
    pub interval: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> String {
    "5m".to_string()
}

impl SourceConfig {
    pub fn timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.timeout).with_context(|| format!("parsing source timeout '{}'", self.timeout))
    }

    pub fn retry_delay(&self) -> Result<Duration> {
        humantime::parse_duration(&self.retry_delay)
            .with_context(|| format!("parsing source retry_delay '{}'", self.retry_delay))
    }
}

impl PollConfig {
    pub fn interval(&self) -> Result<Duration> {
        humantime::parse_duration(&self.interval).with_context(|| format!("parsing poll interval '{}'", self.interval))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(ConfigError::ReadFile)
        .context("reading config file")?;
    let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
    Ok(config)
}

/// Like [`load_config`], but a missing file means "all defaults".
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }
    load_config(path)
}

pub fn validate_config(config: &Config) -> Result<()> {
    let source = &config.source;

    if source.name.trim().is_empty() {
        return Err(ConfigError::Validation("source name must not be empty".to_string()).into());
    }

    if !(source.url.starts_with("http://") || source.url.starts_with("https://")) {
        return Err(ConfigError::Validation(format!(
            "source url '{}' must start with http:// or https://",
            source.url
        ))
        .into());
    }

    humantime::parse_duration(&source.timeout)
        .map_err(|e| ConfigError::Validation(format!("source timeout '{}': {}", source.timeout, e)))?;
    humantime::parse_duration(&source.retry_delay)
        .map_err(|e| ConfigError::Validation(format!("source retry_delay '{}': {}", source.retry_delay, e)))?;

    if source.max_retries > MAX_RETRIES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "source max_retries {} exceeds maximum ({})",
            source.max_retries, MAX_RETRIES_LIMIT
        ))
        .into());
    }

    let interval = humantime::parse_duration(&config.poll.interval)
        .map_err(|e| ConfigError::Validation(format!("poll interval '{}': {}", config.poll.interval, e)))?;
    if interval < MIN_POLL_INTERVAL {
        return Err(ConfigError::Validation(format!(
            "poll interval '{}' is below the minimum of {}",
            config.poll.interval,
            humantime::format_duration(MIN_POLL_INTERVAL)
        ))
        .into());
    }

    let mut markers = HashSet::new();
    for unit in &config.unit {
        if unit.marker.is_empty() {
            return Err(ConfigError::Validation("unit marker must not be empty".to_string()).into());
        }
        if !markers.insert(&unit.marker) {
            return Err(ConfigError::Validation(format!("duplicate unit marker: '{}'", unit.marker)).into());
        }
        if !unit.factor.is_finite() || unit.factor <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "unit '{}': factor {} must be a positive number",
                unit.marker, unit.factor
            ))
            .into());
        }
    }

    config
        .hotboard
        .listen
        .parse::<SocketAddr>()
        .map_err(|_| ConfigError::Validation(format!("invalid listen address '{}'", config.hotboard.listen)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn parse(s: &str) -> Config {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse("");
        assert_eq!(config.source.max_retries, 2);
        assert_eq!(config.source.timeout().unwrap(), Duration::from_secs(15));
        assert_eq!(config.source.retry_delay().unwrap(), Duration::from_millis(1000));
        assert_eq!(config.source.success_status, SUCCESS_STATUS);
        assert_eq!(config.poll.interval().unwrap(), Duration::from_secs(300));
        assert_eq!(config.unit, default_units());
        validate_config(&config).unwrap();
    }

    #[test]
    fn overrides_and_unit_table_are_read() {
        let config = parse(
            r#"
            [hotboard]
            listen = "0.0.0.0:9000"

            [source]
            url = "http://localhost:3000/hot_list"
            max_retries = 4

            [[unit]]
            marker = "亿"
            factor = 100000000.0

            [[unit]]
            marker = "万"
            factor = 10000.0
            "#,
        );
        assert_eq!(config.hotboard.listen, "0.0.0.0:9000");
        assert_eq!(config.source.max_retries, 4);
        assert_eq!(config.unit.len(), 2);
        assert_eq!(config.unit[0].marker, "亿");
        validate_config(&config).unwrap();
    }

    #[test]
    fn rejects_invalid_values() {
        let cases = [
            "[source]\nurl = \"ftp://example.com\"",
            "[source]\ntimeout = \"soon\"",
            "[source]\nmax_retries = 11",
            "[poll]\ninterval = \"5s\"",
            "[hotboard]\nlisten = \"nowhere\"",
            "[[unit]]\nmarker = \"\"\nfactor = 10.0",
            "[[unit]]\nmarker = \"k\"\nfactor = 0.0",
            "[[unit]]\nmarker = \"k\"\nfactor = 1000.0\n[[unit]]\nmarker = \"k\"\nfactor = 1000.0",
        ];
        for case in cases {
            let config = parse(case);
            assert!(validate_config(&config).is_err(), "expected rejection for: {case}");
        }
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.source.name, "supabase");
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[source]\nname = \"local\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.source.name, "local");
    }

    #[test]
    fn load_config_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[source\nname = ").unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
