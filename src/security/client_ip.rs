//! Client address resolution behind reverse proxies.
//!
//! # Strategy
//! ```text
//! trusted_proxy_count > 0 and X-Forwarded-For present
//!     → entry at len - trusted_proxy_count (clamped to 0)
//! otherwise
//!     → X-Forwarded-For, then X-Real-Ip, scanned right to left
//!       → first global unicast address outside the private table
//! otherwise
//!     → remote socket address without its port
//! ```
//!
//! With a known proxy depth, each trusted proxy appended exactly one hop, so
//! the entry `trusted_proxy_count` from the right was written by our own edge
//! and cannot be forged by the client. Without one, the scan walks inward from
//! our vantage point and takes the first address that looks public.

use axum::http::HeaderMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Private and reserved IPv4 blocks that never identify a real client.
/// Bounds are inclusive.
pub const PRIVATE_RANGES: [(Ipv4Addr, Ipv4Addr); 6] = [
    (Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(10, 255, 255, 255)),
    (Ipv4Addr::new(100, 64, 0, 0), Ipv4Addr::new(100, 127, 255, 255)),
    (Ipv4Addr::new(172, 16, 0, 0), Ipv4Addr::new(172, 31, 255, 255)),
    (Ipv4Addr::new(192, 0, 0, 0), Ipv4Addr::new(192, 0, 0, 255)),
    (Ipv4Addr::new(192, 168, 0, 0), Ipv4Addr::new(192, 168, 255, 255)),
    (Ipv4Addr::new(198, 18, 0, 0), Ipv4Addr::new(198, 19, 255, 255)),
];

/// Resolve the address of the client that originated a request.
///
/// Never fails. The result is empty only when `remote_addr` itself is empty.
pub fn resolve_client_ip(trusted_proxy_count: usize, headers: &HeaderMap, remote_addr: &str) -> String {
    if trusted_proxy_count > 0 {
        if let Some(forwarded) = header_str(headers, X_FORWARDED_FOR).filter(|v| !v.is_empty()) {
            return trusted_hop(forwarded, trusted_proxy_count).to_string();
        }
    }

    if let Some(ip) = best_public_ip(headers) {
        return ip;
    }

    match strip_port(remote_addr) {
        "" => remote_addr.to_string(),
        host => host.to_string(),
    }
}

/// The hop appended by the outermost trusted proxy.
fn trusted_hop(forwarded: &str, trusted_proxy_count: usize) -> &str {
    let parts: Vec<&str> = forwarded.split(',').collect();
    let index = parts.len().saturating_sub(trusted_proxy_count);
    parts[index].trim()
}

/// Scan forwarding headers right to left for a plausible public address.
fn best_public_ip(headers: &HeaderMap) -> Option<String> {
    for name in [X_FORWARDED_FOR, X_REAL_IP] {
        let Some(value) = header_str(headers, name) else {
            continue;
        };

        for candidate in value.split(',').rev() {
            let host = strip_port(candidate.trim());
            let Ok(ip) = host.parse::<IpAddr>() else {
                continue;
            };
            if !is_global_unicast(&ip) || is_private_subnet(&ip) {
                continue;
            }
            return Some(host.to_string());
        }
    }
    None
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Drop a `:port` suffix from `host:port` or `[v6]:port`.
///
/// Anything that is not a socket address (a bare IP, garbage) is returned
/// unchanged.
pub fn strip_port(addr: &str) -> &str {
    if addr.parse::<SocketAddr>().is_err() {
        return addr;
    }
    match addr.rsplit_once(':') {
        Some((host, _port)) => host.trim_start_matches('[').trim_end_matches(']'),
        None => addr,
    }
}

/// Whether an address is routable unicast: not unspecified, loopback,
/// link-local, multicast or limited broadcast.
///
/// Private blocks are deliberately not excluded here; see [`is_private_subnet`].
pub fn is_global_unicast(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_global_unicast_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_global_unicast_v4(&v4),
            None => is_global_unicast_v6(v6),
        },
    }
}

fn is_global_unicast_v4(ip: &Ipv4Addr) -> bool {
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast())
}

fn is_global_unicast_v6(ip: &Ipv6Addr) -> bool {
    let link_local = (ip.segments()[0] & 0xffc0) == 0xfe80;
    !(ip.is_unspecified() || ip.is_loopback() || ip.is_multicast() || link_local)
}

/// Whether an IPv4 (or IPv4-mapped) address falls inside [`PRIVATE_RANGES`].
pub fn is_private_subnet(ip: &IpAddr) -> bool {
    let v4 = match ip {
        IpAddr::V4(v4) => *v4,
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4,
            None => return false,
        },
    };

    PRIVATE_RANGES
        .iter()
        .any(|(start, end)| (*start..=*end).contains(&v4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_trusted_hop_selects_from_right() {
        let h = headers(&[(X_FORWARDED_FOR, "1.1.1.1, 2.2.2.2, 3.3.3.3")]);
        assert_eq!(resolve_client_ip(1, &h, "9.9.9.9:1234"), "2.2.2.2");
        assert_eq!(resolve_client_ip(2, &h, "9.9.9.9:1234"), "1.1.1.1");
    }

    #[test]
    fn test_trusted_hop_clamps_to_first_entry() {
        let h = headers(&[(X_FORWARDED_FOR, "1.1.1.1, 2.2.2.2")]);
        assert_eq!(resolve_client_ip(2, &h, ""), "1.1.1.1");
        assert_eq!(resolve_client_ip(5, &h, ""), "1.1.1.1");
    }

    #[test]
    fn test_trusted_hop_is_not_filtered() {
        // Our own edge wrote it; private addresses are taken as-is.
        let h = headers(&[(X_FORWARDED_FOR, "8.8.8.8,  10.0.0.7 ")]);
        assert_eq!(resolve_client_ip(1, &h, ""), "10.0.0.7");
    }

    #[test]
    fn test_zero_proxies_scans_right_to_left() {
        let h = headers(&[(X_FORWARDED_FOR, "10.0.0.5, 8.8.8.8")]);
        assert_eq!(resolve_client_ip(0, &h, "127.0.0.1:80"), "8.8.8.8");

        // Rightmost public address wins over a spoofed one further left.
        let h = headers(&[(X_FORWARDED_FOR, "1.2.3.4, 8.8.8.8, 192.168.1.1")]);
        assert_eq!(resolve_client_ip(0, &h, ""), "8.8.8.8");
    }

    #[test]
    fn test_scan_rejects_private_regardless_of_position() {
        let h = headers(&[(X_FORWARDED_FOR, "8.8.8.8, 10.0.0.5")]);
        assert_eq!(resolve_client_ip(0, &h, ""), "8.8.8.8");

        let h = headers(&[(X_FORWARDED_FOR, "10.0.0.5, 172.16.3.3, 127.0.0.1")]);
        assert_eq!(resolve_client_ip(0, &h, "203.0.113.9:5000"), "203.0.113.9");
    }

    #[test]
    fn test_scan_strips_ports_and_skips_garbage() {
        let h = headers(&[(X_FORWARDED_FOR, "4.4.4.4:8080, unknown")]);
        assert_eq!(resolve_client_ip(0, &h, ""), "4.4.4.4");

        let h = headers(&[(X_FORWARDED_FOR, "[2001:4860::8888]:443")]);
        assert_eq!(resolve_client_ip(0, &h, ""), "2001:4860::8888");
    }

    #[test]
    fn test_real_ip_consulted_after_forwarded_for() {
        let h = headers(&[(X_FORWARDED_FOR, "10.1.1.1"), (X_REAL_IP, "5.6.7.8")]);
        assert_eq!(resolve_client_ip(0, &h, ""), "5.6.7.8");
    }

    #[test]
    fn test_missing_forwarded_for_with_trusted_proxies_scans_real_ip() {
        let h = headers(&[(X_REAL_IP, "5.6.7.8")]);
        assert_eq!(resolve_client_ip(3, &h, "10.0.0.1:9000"), "5.6.7.8");
    }

    #[test]
    fn test_remote_address_fallback() {
        let h = HeaderMap::new();
        assert_eq!(resolve_client_ip(0, &h, "192.168.0.10:51234"), "192.168.0.10");
        assert_eq!(resolve_client_ip(0, &h, "[::1]:8080"), "::1");
        assert_eq!(resolve_client_ip(0, &h, "unix-socket"), "unix-socket");
        assert_eq!(resolve_client_ip(0, &h, ""), "");
    }

    #[test]
    fn test_global_unicast() {
        let yes = ["8.8.8.8", "10.0.0.1", "2001:db8::1"];
        let no = [
            "0.0.0.0",
            "127.0.0.1",
            "169.254.1.1",
            "224.0.0.1",
            "255.255.255.255",
            "::",
            "::1",
            "fe80::1",
            "ff02::1",
            "::ffff:127.0.0.1",
        ];
        for ip in yes {
            assert!(is_global_unicast(&ip.parse().unwrap()), "{ip}");
        }
        for ip in no {
            assert!(!is_global_unicast(&ip.parse().unwrap()), "{ip}");
        }
    }

    #[test]
    fn test_private_ranges_inclusive() {
        let private = [
            "10.0.0.0",
            "10.255.255.255",
            "100.64.0.1",
            "172.31.255.255",
            "192.0.0.8",
            "192.168.10.10",
            "198.19.0.1",
            "::ffff:10.1.2.3",
        ];
        let public = ["9.255.255.255", "11.0.0.0", "172.32.0.0", "198.20.0.0", "2001:db8::1"];
        for ip in private {
            assert!(is_private_subnet(&ip.parse().unwrap()), "{ip}");
        }
        for ip in public {
            assert!(!is_private_subnet(&ip.parse().unwrap()), "{ip}");
        }
    }
}
