//! JSON-over-HTTP client for coin daemons
//!
//! The client knows nothing about a coin's method vocabulary. It serializes
//! `{method, id, params}`, authenticates with the credentials from the coin's
//! `.conf` file and maps transport outcomes onto `MnError`.

use async_trait::async_trait;
use reqwest::StatusCode;
use sdk::{CoinDescriptor, ConfMap, MnError, RpcHandleImpl, RpcRequest, RpcResponse};
use std::net::Ipv6Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Process-wide request id counter
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Next request id; strictly increasing for the life of the process
pub fn next_request_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// HTTP client bound to a single daemon endpoint
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    user: String,
    password: String,
}

impl RpcClient {
    pub fn new(
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MnError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MnError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: url.into(),
            user: user.into(),
            password: password.into(),
        })
    }

    /// Build a client from a coin's loaded `.conf` settings
    ///
    /// Missing credentials are sent as empty strings; the daemon answers
    /// those with 401.
    pub fn from_conf(
        descriptor: &CoinDescriptor,
        conf: &ConfMap,
        timeout: Duration,
    ) -> Result<Self, MnError> {
        Self::new(
            endpoint(descriptor, conf),
            conf.value("rpcuser"),
            conf.value("rpcpassword"),
            timeout,
        )
    }
}

/// Daemon URL from `rpcbind`/`rpcallowip`/`rpcport`, falling back to
/// localhost and the coin's default RPC port
pub fn endpoint(descriptor: &CoinDescriptor, conf: &ConfMap) -> String {
    let host = [conf.value("rpcbind"), conf.value("rpcallowip")]
        .into_iter()
        .map(str::trim)
        .find(|h| !h.is_empty())
        .unwrap_or("127.0.0.1");

    let port = match conf.get("rpcport").map(str::trim) {
        Some(raw) if !raw.is_empty() => raw.parse::<u16>().unwrap_or_else(|_| {
            warn!(
                "Ignoring invalid rpcport '{}', using {}",
                raw, descriptor.rpc_port
            );
            descriptor.rpc_port
        }),
        _ => descriptor.rpc_port,
    };

    if host.parse::<Ipv6Addr>().is_ok() {
        format!("http://[{}]:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

#[async_trait]
impl RpcHandleImpl for RpcClient {
    async fn call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<RpcResponse, MnError> {
        let request = RpcRequest {
            method: method.to_string(),
            id: next_request_id(),
            params,
        };
        debug!("RPC {} -> {} (id {})", method, self.url, request.id);

        let response = self
            .http
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| MnError::TransportUnavailable(format!("{}: {}", self.url, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(MnError::AuthorizationFailed);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| MnError::TransportUnavailable(format!("{}: {}", self.url, e)))?;

        if body.is_empty() {
            return Err(MnError::NoResponse(format!("empty body (HTTP {})", status)));
        }

        serde_json::from_slice(&body)
            .map_err(|e| MnError::NoResponse(format!("unparseable body (HTTP {}): {}", status, e)))
    }
}
