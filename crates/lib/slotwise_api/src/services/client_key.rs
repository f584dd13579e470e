//! Rate-limit key derivation from client-identifying request metadata.
//!
//! Forwarded headers are spoofable without a trusted proxy allowlist; that
//! hardening gap is known and deliberately not papered over here — the
//! derivation is a total function over the header categories with the peer
//! address as the documented default.

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Derive the limiter key: first `X-Forwarded-For` entry, else
/// `X-Real-Ip`, else the socket peer address.
pub fn derive(headers: &HeaderMap, peer: SocketAddr) -> String {
    if let Some(forwarded) = header_str(headers, "x-forwarded-for")
        && let Some(first) = forwarded.split(',').next()
        && !first.trim().is_empty()
    {
        return first.trim().to_string();
    }

    if let Some(real_ip) = header_str(headers, "x-real-ip")
        && !real_ip.trim().is_empty()
    {
        return real_ip.trim().to_string();
    }

    peer.ip().to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "10.0.0.9:55555".parse().unwrap()
    }

    #[test]
    fn forwarded_for_wins_and_takes_the_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(derive(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn real_ip_is_the_second_choice() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(derive(&headers, peer()), "198.51.100.2");
    }

    #[test]
    fn peer_address_is_the_fallback() {
        assert_eq!(derive(&HeaderMap::new(), peer()), "10.0.0.9");
    }

    #[test]
    fn empty_forwarded_header_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  "));
        assert_eq!(derive(&headers, peer()), "10.0.0.9");
    }
}
