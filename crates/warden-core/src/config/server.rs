//! HTTP server configuration.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// HTTP listener and request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request deadline in seconds. Covers header read, handler and body write.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Maximum accepted request body in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// Grace period for in-flight requests on shutdown (at most 10).
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
    /// Peers allowed to set `X-Forwarded-For` / `X-Real-IP`. Empty means the
    /// socket peer is always the client.
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

impl ServerConfig {
    /// Returns `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether forwarding headers from `peer` are believed.
    pub fn is_trusted_proxy(&self, peer: IpAddr) -> bool {
        self.trusted_proxies.contains(&peer)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            body_limit_bytes: default_body_limit(),
            shutdown_grace_seconds: default_shutdown_grace(),
            trusted_proxies: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    15
}

fn default_body_limit() -> usize {
    64 * 1024
}

fn default_shutdown_grace() -> u64 {
    10
}
