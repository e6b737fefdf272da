use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use crate::config::MirrorConfig;
use crate::error::{MirrorError, Result};

/// Retrieves the full body behind a URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetch {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Keeps consecutive requests at least `interval` apart.
///
/// The first request goes through immediately. Every completed request pushes
/// the next allowed instant forward by `interval`.
#[derive(Debug)]
pub struct RateGate {
    interval: Duration,
    next_allowed: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_allowed: Mutex::new(None),
        }
    }

    /// How long a request issued at `now` has to wait.
    pub async fn delay_at(&self, now: Instant) -> Duration {
        match *self.next_allowed.lock().await {
            Some(next) => next.saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Sleeps until the next request is allowed.
    pub async fn wait(&self) {
        let delay = self.delay_at(Instant::now()).await;
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "politeness delay");
            tokio::time::sleep(delay).await;
        }
    }

    /// Records that a request just finished.
    pub async fn mark(&self) {
        if self.interval.is_zero() {
            return;
        }
        *self.next_allowed.lock().await = Some(Instant::now() + self.interval);
    }
}

/// Sequential HTTP(S) GET behind a [`RateGate`].
pub struct HttpFetcher {
    client: Client,
    gate: RateGate,
}

impl HttpFetcher {
    pub fn new(config: &MirrorConfig) -> Result<Self> {
        let client = Self::build_http_client(config)?;
        Ok(Self {
            client,
            gate: RateGate::new(config.politeness_delay),
        })
    }

    fn build_http_client(config: &MirrorConfig) -> Result<Client> {
        ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| MirrorError::Fetch {
                url: config.source_root.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })
    }

    async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        let fetch_error = |reason: String| MirrorError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| fetch_error(format!("failed to read response body: {e}")))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        self.gate.wait().await;
        debug!(%url, "GET");
        let result = self.get(url).await;
        // Failed requests still count against the server.
        self.gate.mark().await;
        result
    }
}
