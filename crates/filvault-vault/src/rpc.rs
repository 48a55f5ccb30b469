//! Thin client handle for the remote chain node.
//!
//! The vault owns exactly one of these: it is dialed at construction
//! and closed during shutdown. No chain operation lives in this
//! backend — the handle only carries the endpoint, the bearer token,
//! and the version probe that construction uses to confirm the node
//! answers.

use std::sync::atomic::{AtomicBool, Ordering};

use filvault_types::{FilvaultError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use url::Url;

/// JSON-RPC client handle for a Filecoin node endpoint.
pub struct RpcClient {
    endpoint: Url,
    client: reqwest::Client,
    closed: AtomicBool,
}

impl RpcClient {
    /// Dials the endpoint and returns a ready client.
    ///
    /// After validating the URL and attaching the optional bearer
    /// token, the node is probed with `Filecoin.Version`; construction
    /// fails if the endpoint does not answer.
    ///
    /// # Errors
    ///
    /// Returns [`FilvaultError::Rpc`] for an unparseable endpoint, an
    /// unsupported scheme, a token that cannot form a valid header, or
    /// a node that cannot be reached.
    pub async fn connect(endpoint: &str, token: Option<&str>) -> Result<Self> {
        let url = Url::parse(endpoint).map_err(|e| FilvaultError::Rpc {
            reason: format!("invalid rpc endpoint {endpoint}: {e}"),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(FilvaultError::Rpc {
                    reason: format!("unsupported rpc scheme: {other}"),
                })
            }
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                FilvaultError::Rpc {
                    reason: format!("invalid rpc token: {e}"),
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| FilvaultError::Rpc {
                reason: format!("build rpc client: {e}"),
            })?;

        let client = Self {
            endpoint: url,
            client: http,
            closed: AtomicBool::new(false),
        };

        let version = client.version().await?;
        tracing::debug!(endpoint = %client.endpoint, %version, "rpc endpoint dialed");
        Ok(client)
    }

    /// The configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Asks the node for its version string (`Filecoin.Version`).
    ///
    /// # Errors
    ///
    /// Returns [`FilvaultError::Rpc`] if the client is closed, the
    /// request fails, or the response is not a JSON-RPC result.
    pub async fn version(&self) -> Result<String> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FilvaultError::Rpc {
                reason: "rpc client is closed".into(),
            });
        }

        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "Filecoin.Version",
            "params": [],
            "id": 1,
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| FilvaultError::Rpc {
                reason: format!("dial {}: {e}", self.endpoint),
            })?;

        let payload: serde_json::Value =
            response.json().await.map_err(|e| FilvaultError::Rpc {
                reason: format!("decode version response: {e}"),
            })?;

        payload["result"]["Version"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| FilvaultError::Rpc {
                reason: "version response missing result".into(),
            })
    }

    /// Marks the handle closed; subsequent requests fail fast.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(endpoint = %self.endpoint, "rpc client closed");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
