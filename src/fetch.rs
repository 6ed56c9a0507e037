use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::hot::HotUnit;
use crate::models::{Envelope, FetchResult};
use crate::normalize::{derive_platforms, transform};
use crate::registry::PlatformRegistry;

/// One GET against the aggregation endpoint, yielding the raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_body(&self) -> Result<Vec<u8>, FetchError>;
    fn url(&self) -> &str;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    url: String,
}

impl ReqwestTransport {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("hotboard/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Http {
                url: url.to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get_body(&self) -> Result<Vec<u8>, FetchError> {
        let http_err = |e| FetchError::Http {
            url: self.url.clone(),
            source: e,
        };

        let response = self.client.get(&self.url).send().await.map_err(http_err)?;
        let status = response.status();
        debug!(url = %self.url, status = status.as_u16(), "hot list response received");

        let body = response.error_for_status().map_err(http_err)?.bytes().await.map_err(http_err)?;
        Ok(body.to_vec())
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Knobs of the retrieval pipeline, resolved from [`Config`].
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub source_name: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub success_status: i64,
    pub units: Vec<HotUnit>,
}

impl FetchSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            source_name: config.source.name.clone(),
            max_retries: config.source.max_retries,
            retry_delay: config.source.retry_delay()?,
            success_status: config.source.success_status,
            units: config.unit.clone(),
        })
    }
}

/// Fetches the aggregated hot list and keeps the platform registry in sync with it.
#[derive(Clone)]
pub struct HotlistClient {
    transport: Arc<dyn Transport>,
    registry: PlatformRegistry,
    settings: FetchSettings,
}

impl HotlistClient {
    pub fn new(transport: Arc<dyn Transport>, registry: PlatformRegistry, settings: FetchSettings) -> Self {
        Self {
            transport,
            registry,
            settings,
        }
    }

    pub fn from_config(config: &Config, registry: PlatformRegistry) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.source.url, config.source.timeout()?)?;
        Ok(Self::new(Arc::new(transport), registry, FetchSettings::from_config(config)?))
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    /// Fetch and normalize the hot list, retrying with a fixed delay.
    ///
    /// Transport errors, undecodable bodies and non-success envelope statuses all
    /// count as a failed attempt. After `max_retries + 1` failed attempts the last
    /// failure is reported inside [`FetchError::Exhausted`].
    pub async fn fetch_hotlist(&self) -> Result<FetchResult, FetchError> {
        let attempts = self.settings.max_retries + 1;
        let url = self.transport.url();
        info!(url = %url, source = %self.settings.source_name, "fetching hot list");

        let mut last_err = None;

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                let delay_ms = self.settings.retry_delay.as_millis() as u64;
                debug!(attempt = attempt + 1, delay_ms, "waiting before retry");
                tokio::time::sleep(self.settings.retry_delay).await;
            }

            let started = Instant::now();
            match self.attempt().await {
                Ok(result) => {
                    info!(
                        attempt = attempt + 1,
                        attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        items = result.data.len(),
                        "hot list fetched"
                    );
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        attempt = attempt + 1,
                        attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %e,
                        "hot list fetch attempt failed"
                    );
                    last_err = Some(e);
                }
            }
        }

        let last = last_err.map(|e| e.to_string()).unwrap_or_default();
        error!(url = %url, attempts, error = %last, "hot list fetch failed after all retries");
        Err(FetchError::Exhausted { attempts, last })
    }

    async fn attempt(&self) -> Result<FetchResult, FetchError> {
        let body = self.transport.get_body().await?;
        let url = self.transport.url();

        let envelope: Envelope = serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if envelope.status != self.settings.success_status {
            return Err(FetchError::Status {
                status: envelope.status,
                message: envelope.message.unwrap_or_default(),
            });
        }

        let records = envelope.data.ok_or_else(|| FetchError::Decode {
            url: url.to_string(),
            message: "envelope has no data array".to_string(),
        })?;

        let platforms = derive_platforms(&records);
        let platform_count = platforms.len();
        self.registry.replace(platforms);

        let data = transform(&records, &self.settings.units);
        debug!(platforms = platform_count, items = data.len(), "hot list normalized");

        Ok(FetchResult {
            data,
            source: self.settings.source_name.clone(),
            timestamp: Utc::now(),
            error: None,
        })
    }
}
