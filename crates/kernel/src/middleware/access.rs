//! Network-origin access filter.
//!
//! Only local callers (and explicitly trusted addresses) may use the server.
//! Addresses are compared as parsed IPs, so every textual form of loopback,
//! including IPv4-mapped IPv6 and zone-suffixed spellings, is covered.

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{CheckError, ErrorKind};
use crate::state::AppState;

/// Which callers are let through.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    trusted: Vec<IpAddr>,
}

impl AccessPolicy {
    /// Loopback plus `trusted`.
    pub fn new(trusted: Vec<IpAddr>) -> Self {
        Self {
            trusted: trusted.into_iter().map(|ip| ip.to_canonical()).collect(),
        }
    }

    pub fn is_trusted(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        ip.is_loopback() || self.trusted.contains(&ip)
    }

    /// Decide whether a request may proceed.
    ///
    /// Denies an empty path and a caller whose address is unknown.
    pub fn allow(&self, remote: Option<IpAddr>, raw_path: &str) -> bool {
        !raw_path.is_empty() && remote.is_some_and(|ip| self.is_trusted(ip))
    }
}

/// Middleware rejecting untrusted callers with 403 before any other work.
///
/// The remote address comes from [`ConnectInfo`], so the server must be run
/// with `into_make_service_with_connect_info::<SocketAddr>()`.
pub async fn enforce_access(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let path = request.uri().path();

    if state.access().allow(remote, path) {
        return next.run(request).await;
    }

    let err = CheckError::AccessDenied {
        origin: remote.map_or_else(|| "unknown origin".to_string(), |ip| ip.to_string()),
        path: path.to_string(),
    };
    let response = err.into_response();
    state
        .metrics()
        .record_request("denied", response.status().as_u16());
    state.metrics().record_error(ErrorKind::AccessDenied.as_str());
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn ip(s: &str) -> Option<IpAddr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn loopback_forms_are_allowed() {
        let policy = AccessPolicy::default();
        for addr in ["127.0.0.1", "127.1.2.3", "::1", "0:0:0:0:0:0:0:1", "::ffff:127.0.0.1"] {
            assert!(policy.allow(ip(addr), "/"), "{addr} should be allowed");
        }
    }

    #[test]
    fn remote_addresses_are_denied() {
        let policy = AccessPolicy::default();
        for addr in ["10.0.0.1", "192.168.1.1", "::", "fe80::1", "::ffff:10.0.0.1"] {
            assert!(!policy.allow(ip(addr), "/"), "{addr} should be denied");
        }
    }

    #[test]
    fn empty_path_or_unknown_origin_is_denied() {
        let policy = AccessPolicy::default();
        assert!(!policy.allow(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)), ""));
        assert!(!policy.allow(None, "/Languages"));
    }

    #[test]
    fn trusted_addresses_extend_loopback() {
        let policy = AccessPolicy::new(vec![
            "10.0.0.5".parse().unwrap(),
            "::ffff:192.168.0.9".parse().unwrap(),
        ]);
        assert!(policy.allow(ip("10.0.0.5"), "/"));
        assert!(policy.allow(ip("::ffff:10.0.0.5"), "/"));
        assert!(policy.allow(ip("192.168.0.9"), "/"));
        assert!(policy.allow(Some(IpAddr::V6(Ipv6Addr::LOCALHOST)), "/"));
        assert!(!policy.allow(ip("10.0.0.6"), "/"));
    }
}
