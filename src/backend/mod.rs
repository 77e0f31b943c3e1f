//! CA backend invocation.
//!
//! The backend is the certificate-authority service that actually issues,
//! lists and retrieves certificates. The gateway treats it as an opaque
//! JSON-over-HTTP API: approved native payloads go out unmodified with the
//! operation identifier in a target header, and responses come back as raw
//! JSON values. Failures are opaque backend errors — no retries, since
//! issuance calls are not guaranteed idempotent.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::CaBackendConfig;
use crate::{Error, Result};

/// Executes approved operations against the CA backend.
#[async_trait]
pub trait CaBackend: Send + Sync {
    /// Invoke `operation` with the caller's original native payload and
    /// return the backend's JSON response.
    ///
    /// # Errors
    ///
    /// Returns `Error::Backend` for transport failures, non-success HTTP
    /// statuses, and unparseable response bodies.
    async fn invoke(&self, operation: &str, payload: &[u8]) -> Result<Value>;
}

/// HTTP client for the CA backend.
///
/// Built once at startup and reused across requests — backend client
/// configuration is invariant, so there is no per-request setup.
pub struct HttpCaBackend {
    client: Client,
    url: String,
    target_header: String,
    headers: HashMap<String, String>,
}

impl HttpCaBackend {
    /// Build the backend client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be constructed.
    /// Construction failures are fatal at startup, never deferred to
    /// request time.
    pub fn from_config(config: &CaBackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build backend HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            target_header: config.target_header.clone(),
            headers: config.headers.clone(),
        })
    }
}

#[async_trait]
impl CaBackend for HttpCaBackend {
    async fn invoke(&self, operation: &str, payload: &[u8]) -> Result<Value> {
        debug!(operation = %operation, url = %self.url, "Invoking CA backend");

        let mut request = self
            .client
            .post(&self.url)
            .header(self.target_header.as_str(), operation)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_vec());

        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Backend(format!("could not reach CA backend: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Backend(format!("failed to read backend response: {e}")))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(Error::Backend(format!(
                "backend returned {status}: {}",
                text.trim()
            )));
        }

        serde_json::from_slice(&body)
            .map_err(|e| Error::Backend(format!("backend response is not valid JSON: {e}")))
    }
}
