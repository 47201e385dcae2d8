//! Client IP extraction shared by the request logger and the API key gate.
//!
//! # Security Warning: IP Spoofing Risk
//!
//! Forwarding headers are client-controlled unless a reverse proxy overwrites
//! them. Per-IP brute force protection is only meaningful when this service
//! is reachable exclusively through such a proxy:
//!
//! ```nginx
//! proxy_set_header X-Real-IP $remote_addr;
//! proxy_set_header X-Forwarded-For $remote_addr;
//! ```
//!
//! When no header is present the socket peer address is used, which is what
//! a directly exposed deployment should rely on.

use std::borrow::Cow;
use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::Request;

/// Fallback IP value when no client IP can be determined.
pub const UNKNOWN_IP: &str = "unknown";

/// Where the client address was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractedIp<'a> {
    /// First entry of X-Forwarded-For.
    FromXff(&'a str),
    FromRealIp(&'a str),
    /// Socket peer address from `ConnectInfo`.
    FromPeer(SocketAddr),
    NotFound,
}

fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

#[inline]
fn extract_ip<B>(req: &Request<B>) -> ExtractedIp<'_> {
    // Format: "client, proxy1, proxy2"; the first entry is the client
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first_ip) = value.split(',').next().and_then(non_blank)
    {
        return ExtractedIp::FromXff(first_ip);
    }

    if let Some(real_ip) = req.headers().get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
        && let Some(ip) = non_blank(value)
    {
        return ExtractedIp::FromRealIp(ip);
    }

    if let Some(addr) = peer_addr(req) {
        return ExtractedIp::FromPeer(addr);
    }

    ExtractedIp::NotFound
}

fn peer_addr<B>(req: &Request<B>) -> Option<SocketAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Best-effort client address of `req`.
///
/// # Priority
///
/// 1. `X-Forwarded-For` header (first IP in a comma-separated list)
/// 2. `X-Real-IP` header
/// 3. Socket peer address, when the server was started with connect info
/// 4. Falls back to [`UNKNOWN_IP`]
///
/// Blank header values are skipped.
///
/// # Returns
///
/// `Cow<'static, str>` - Borrowed for "unknown" (no allocation), owned for actual IPs.
#[inline]
pub fn extract_client_ip<B>(req: &Request<B>) -> Cow<'static, str> {
    match extract_ip(req) {
        ExtractedIp::FromXff(ip) | ExtractedIp::FromRealIp(ip) => Cow::Owned(ip.to_string()),
        ExtractedIp::FromPeer(addr) => Cow::Owned(addr.ip().to_string()),
        ExtractedIp::NotFound => Cow::Borrowed(UNKNOWN_IP),
    }
}

/// Client address as a parsed [`IpAddr`], suitable as a map key.
///
/// Same priority as [`extract_client_ip`], except that a header value that
/// doesn't parse as an IP is ignored in favour of the socket peer address.
pub fn client_ip_addr<B>(req: &Request<B>) -> Option<IpAddr> {
    match extract_ip(req) {
        ExtractedIp::FromXff(ip) | ExtractedIp::FromRealIp(ip) => ip
            .parse()
            .ok()
            .or_else(|| peer_addr(req).map(|addr| addr.ip())),
        ExtractedIp::FromPeer(addr) => Some(addr.ip()),
        ExtractedIp::NotFound => None,
    }
}
