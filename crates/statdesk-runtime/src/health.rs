//! HTTP readiness probe for the backend.
//!
//! The backend is ready when `GET /` on its loopback port answers 200.
//! Polling is a bounded loop with an explicit deadline.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, info};

/// Per-request timeout for a single probe.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Polls a URL until it answers 200 or a deadline passes.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    client: Client,
    url: String,
    interval: Duration,
}

impl ReadinessProbe {
    /// Probe for `http://127.0.0.1:<port>/`.
    pub fn for_port(port: u16, interval: Duration) -> Self {
        Self::new(format!("http://127.0.0.1:{port}/"), interval)
    }

    pub fn new(url: impl Into<String>, interval: Duration) -> Self {
        // Builder only fails on TLS backend setup, which is disabled
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
            interval,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One probe. Anything but a 200 (including connection errors) is "not ready".
    pub async fn check(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                debug!(url = %self.url, status = %response.status(), "Readiness probe answered non-200");
                false
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "Readiness probe failed");
                false
            }
        }
    }

    /// Poll until ready or `timeout` elapses. Returns whether it became ready.
    ///
    /// An in-flight request is abandoned at the deadline.
    pub async fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match timeout_at(deadline, self.check()).await {
                Ok(true) => {
                    info!(url = %self.url, attempt, "Backend answered readiness probe");
                    return true;
                }
                Ok(false) => {}
                Err(_) => {
                    debug!(url = %self.url, attempt, "Readiness probe cut off at deadline");
                    return false;
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            sleep(self.interval.min(deadline - now)).await;
        }
    }
}
