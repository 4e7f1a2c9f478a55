//! Throughput probe
//!
//! One probe is a paired upload + download measurement against the best
//! (lowest-latency) configured server. Rates are reported in bits per second.

use crate::error::ProbeError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::debug;

const DEFAULT_CONNECTIONS: usize = 4;
const DEFAULT_UPLOAD_BYTES: usize = 10_000_000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw probe result in bits per second
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawProbe {
    pub upload_bps: f64,
    pub download_bps: f64,
}

/// Source of throughput measurements
#[async_trait]
pub trait SpeedProbe: Send + Sync {
    /// Measure upload and download rates once
    async fn probe(&self) -> Result<RawProbe, ProbeError>;
}

/// A speed test endpoint pair
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProbeServer {
    pub name: String,
    pub download_url: String,
    pub upload_url: String,
}

/// Probe settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub servers: Vec<ProbeServer>,
    /// Parallel streams per direction
    pub connections: usize,
    /// Payload size of each upload stream
    pub upload_bytes: usize,
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            servers: vec![ProbeServer {
                name: "cloudflare".to_string(),
                download_url: "https://speed.cloudflare.com/__down?bytes=25000000".to_string(),
                upload_url: "https://speed.cloudflare.com/__up".to_string(),
            }],
            connections: DEFAULT_CONNECTIONS,
            upload_bytes: DEFAULT_UPLOAD_BYTES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// HTTP speed test against the configured servers
pub struct HttpSpeedProbe {
    client: reqwest::Client,
    config: ProbeConfig,
}

impl HttpSpeedProbe {
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ProbeError::Client)?;

        Ok(Self { client, config })
    }

    /// Pick the server with the lowest round-trip time
    pub async fn best_server(&self) -> Result<&ProbeServer, ProbeError> {
        if self.config.servers.is_empty() {
            return Err(ProbeError::NoServers);
        }

        let mut best: Option<(&ProbeServer, Duration)> = None;
        for server in &self.config.servers {
            match self.latency(server).await {
                Ok(rtt) => {
                    debug!(server = %server.name, rtt_ms = rtt.as_millis(), "Probe server latency");
                    if best.map_or(true, |(_, best_rtt)| rtt < best_rtt) {
                        best = Some((server, rtt));
                    }
                }
                Err(e) => {
                    debug!(server = %server.name, error = %e, "Probe server unreachable");
                }
            }
        }

        best.map(|(server, _)| server)
            .ok_or(ProbeError::NoReachableServer)
    }

    async fn latency(&self, server: &ProbeServer) -> Result<Duration, ProbeError> {
        let start = Instant::now();
        let response = self
            .client
            .head(&server.download_url)
            .send()
            .await
            .map_err(|source| request_error(&server.download_url, source))?;
        check_status(&server.download_url, &response)?;
        Ok(start.elapsed())
    }

    /// Download rate in bits per second
    pub async fn download_bps(&self, server: &ProbeServer) -> Result<f64, ProbeError> {
        let start = Instant::now();
        let mut tasks = JoinSet::new();
        for _ in 0..self.config.connections {
            let client = self.client.clone();
            let url = server.download_url.clone();
            tasks.spawn(async move { download_stream(&client, &url).await });
        }

        let mut total = 0u64;
        while let Some(result) = tasks.join_next().await {
            total += result??;
        }

        bits_per_second(total, start.elapsed())
    }

    /// Upload rate in bits per second
    pub async fn upload_bps(&self, server: &ProbeServer) -> Result<f64, ProbeError> {
        let start = Instant::now();
        let mut tasks = JoinSet::new();
        for _ in 0..self.config.connections {
            let client = self.client.clone();
            let url = server.upload_url.clone();
            let size = self.config.upload_bytes;
            tasks.spawn(async move { upload_stream(&client, &url, size).await });
        }

        let mut total = 0u64;
        while let Some(result) = tasks.join_next().await {
            total += result??;
        }

        bits_per_second(total, start.elapsed())
    }
}

#[async_trait]
impl SpeedProbe for HttpSpeedProbe {
    async fn probe(&self) -> Result<RawProbe, ProbeError> {
        let server = self.best_server().await?;

        let download_bps = self.download_bps(server).await?;
        let upload_bps = self.upload_bps(server).await?;

        Ok(RawProbe {
            upload_bps,
            download_bps,
        })
    }
}

async fn download_stream(client: &reqwest::Client, url: &str) -> Result<u64, ProbeError> {
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|source| request_error(url, source))?;
    check_status(url, &response)?;

    let mut received = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| request_error(url, source))?
    {
        received += chunk.len() as u64;
    }

    Ok(received)
}

async fn upload_stream(client: &reqwest::Client, url: &str, size: usize) -> Result<u64, ProbeError> {
    let response = client
        .post(url)
        .body(vec![0u8; size])
        .send()
        .await
        .map_err(|source| request_error(url, source))?;
    check_status(url, &response)?;

    Ok(size as u64)
}

fn request_error(url: &str, source: reqwest::Error) -> ProbeError {
    ProbeError::Request {
        url: url.to_string(),
        source,
    }
}

fn check_status(url: &str, response: &reqwest::Response) -> Result<(), ProbeError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ProbeError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

fn bits_per_second(bytes: u64, elapsed: Duration) -> Result<f64, ProbeError> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return Err(ProbeError::ZeroElapsed);
    }
    Ok(bytes as f64 * 8.0 / secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_per_second() {
        let rate = bits_per_second(1_250_000, Duration::from_secs(1)).unwrap();
        assert_eq!(rate, 10_000_000.0);

        let rate = bits_per_second(1_000, Duration::from_millis(500)).unwrap();
        assert_eq!(rate, 16_000.0);
    }

    #[test]
    fn test_bits_per_second_zero_elapsed() {
        assert!(matches!(
            bits_per_second(10, Duration::ZERO),
            Err(ProbeError::ZeroElapsed)
        ));
    }

    #[test]
    fn test_probe_config_default() {
        let config = ProbeConfig::default();
        assert_eq!(config.connections, 4);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.upload_bytes, 10_000_000);
        assert_eq!(config.servers.len(), 1);
    }

    #[tokio::test]
    async fn test_no_servers() {
        let probe = HttpSpeedProbe::new(ProbeConfig {
            servers: vec![],
            ..ProbeConfig::default()
        })
        .unwrap();

        assert!(matches!(probe.probe().await, Err(ProbeError::NoServers)));
    }
}
