//! Caller address and user agent.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

use warden_core::config::ServerConfig;

use crate::state::AppState;

/// Where a request came from. Both fields are best effort.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// The socket peer, or the address a trusted proxy forwarded for.
    pub ip: Option<String>,
    /// `User-Agent` header.
    pub user_agent: Option<String>,
}

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let ip = resolve_client_ip(peer, &parts.headers, &state.config.server)
            .map(|ip| ip.to_string());
        let user_agent =
            header(&parts.headers, "user-agent").map(|ua| ua.chars().take(512).collect());

        Ok(Self { ip, user_agent })
    }
}

/// Forwarding headers count only when the peer is a configured proxy. The
/// `X-Forwarded-For` chain is walked from the right and the first hop that is
/// not itself a trusted proxy wins.
fn resolve_client_ip(
    peer: Option<IpAddr>,
    headers: &HeaderMap,
    server: &ServerConfig,
) -> Option<IpAddr> {
    let peer = peer?;
    if !server.is_trusted_proxy(peer) {
        return Some(peer);
    }

    let forwarded = header(headers, "x-forwarded-for").and_then(|chain| {
        chain
            .rsplit(',')
            .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
            .find(|hop| !server.is_trusted_proxy(*hop))
    });

    forwarded
        .or_else(|| header(headers, "x-real-ip").and_then(|v| v.parse().ok()))
        .or(Some(peer))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn forwarded(chain: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", chain.parse().unwrap());
        headers
    }

    fn behind_proxy() -> ServerConfig {
        ServerConfig {
            trusted_proxies: vec![ip("10.0.0.2"), ip("10.0.0.3")],
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_untrusted_peer_ignores_forwarding_headers() {
        let mut headers = forwarded("1.2.3.4");
        headers.insert("x-real-ip", "5.6.7.8".parse().unwrap());
        let resolved = resolve_client_ip(Some(ip("198.51.100.9")), &headers, &behind_proxy());
        assert_eq!(resolved, Some(ip("198.51.100.9")));
    }

    #[test]
    fn test_trusted_peer_uses_rightmost_untrusted_hop() {
        let headers = forwarded("6.6.6.6, 203.0.113.5, 10.0.0.3");
        let resolved = resolve_client_ip(Some(ip("10.0.0.2")), &headers, &behind_proxy());
        assert_eq!(resolved, Some(ip("203.0.113.5")));
    }

    #[test]
    fn test_trusted_peer_falls_back_to_real_ip_then_peer() {
        let config = behind_proxy();
        let mut headers = forwarded("not-an-ip");
        headers.insert("x-real-ip", "203.0.113.8".parse().unwrap());
        assert_eq!(
            resolve_client_ip(Some(ip("10.0.0.2")), &headers, &config),
            Some(ip("203.0.113.8"))
        );
        assert_eq!(
            resolve_client_ip(Some(ip("10.0.0.2")), &HeaderMap::new(), &config),
            Some(ip("10.0.0.2"))
        );
    }

    #[test]
    fn test_missing_peer_is_unknown() {
        let headers = forwarded("1.2.3.4");
        assert_eq!(resolve_client_ip(None, &headers, &behind_proxy()), None);
    }
}
