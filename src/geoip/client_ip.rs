//! Client Address Resolution
//!
//! Extracts the most likely public client address from the forwarding headers
//! set by reverse proxies and load balancers.
//!
//! **Warning**: the leftmost routable entry of `x-forwarded-for` is trusted as-is.
//! Deploy behind an edge that overwrites the header if spoofing matters.

use axum::http::HeaderMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::trace;

/// Headers consulted for the client address, highest priority first
pub const FORWARDING_HEADERS: [&str; 2] = ["x-forwarded-for", "x-real-ip"];

/// Address returned when no header carries an acceptable candidate
pub const UNKNOWN_CLIENT_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Half-open IPv4 range, `start <= ip < end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
}

impl AddressRange {
    pub const fn new(start: Ipv4Addr, end: Ipv4Addr) -> Self {
        Self { start, end }
    }

    /// Octet-wise comparison, most significant octet first
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let octets = ip.octets();
        octets >= self.start.octets() && octets < self.end.octets()
    }
}

/// Reserved and special-use IPv4 blocks that never identify a client.
///
/// The end address of each block is excluded from the range.
pub static PRIVATE_RANGES: [AddressRange; 6] = [
    // 10.0.0.0/8
    AddressRange::new(Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(10, 255, 255, 255)),
    // 100.64.0.0/10, carrier-grade NAT
    AddressRange::new(Ipv4Addr::new(100, 64, 0, 0), Ipv4Addr::new(100, 127, 255, 255)),
    // 172.16.0.0/12
    AddressRange::new(Ipv4Addr::new(172, 16, 0, 0), Ipv4Addr::new(172, 31, 255, 255)),
    // 192.0.0.0/24, IETF protocol assignments
    AddressRange::new(Ipv4Addr::new(192, 0, 0, 0), Ipv4Addr::new(192, 0, 0, 255)),
    // 192.168.0.0/16
    AddressRange::new(Ipv4Addr::new(192, 168, 0, 0), Ipv4Addr::new(192, 168, 255, 255)),
    // 198.18.0.0/15, benchmarking
    AddressRange::new(Ipv4Addr::new(198, 18, 0, 0), Ipv4Addr::new(198, 19, 255, 255)),
];

/// Check if an address falls inside one of the [`PRIVATE_RANGES`].
///
/// Only IPv4 (and IPv4-mapped IPv6) addresses are tested, any other IPv6
/// address is reported as not private.
pub fn is_private_subnet(ip: IpAddr) -> bool {
    match ip.to_canonical() {
        IpAddr::V4(v4) => PRIVATE_RANGES.iter().any(|range| range.contains(v4)),
        IpAddr::V6(_) => false,
    }
}

/// Check if an address can be routed to a single host on the public internet.
///
/// Rejects unspecified, loopback, multicast, link-local and the IPv4 broadcast
/// address. Private ranges pass this check; see [`is_private_subnet`].
pub fn is_global_unicast(ip: IpAddr) -> bool {
    match ip.to_canonical() {
        IpAddr::V4(v4) => {
            !(v4.is_unspecified()
                || v4.is_loopback()
                || v4.is_multicast()
                || v4.is_link_local()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            !(v6.is_unspecified()
                || v6.is_loopback()
                || v6.is_multicast()
                || is_unicast_link_local(v6))
        }
    }
}

// fe80::/10
fn is_unicast_link_local(ip: Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xffc0) == 0xfe80
}

/// Parse a single header token into an acceptable client address
fn parse_candidate(token: &str) -> Option<IpAddr> {
    let ip = token.trim().parse::<IpAddr>().ok()?;
    if !is_global_unicast(ip) || is_private_subnet(ip) {
        return None;
    }
    Some(ip.to_canonical())
}

/// Resolve the client address from the request headers.
///
/// Headers are scanned in [`FORWARDING_HEADERS`] order and each value
/// left-to-right, since the leftmost entry is the one closest to the client.
/// The first public address wins; [`UNKNOWN_CLIENT_IP`] is returned when no
/// header yields one.
pub fn resolve_client_ip(headers: &HeaderMap) -> IpAddr {
    for name in FORWARDING_HEADERS {
        // Split raw bytes so one non-ASCII token does not hide the other hops
        let value = headers.get(name).map(|v| v.as_bytes()).unwrap_or_default();

        for token in value.split(|b| *b == b',') {
            let Ok(token) = std::str::from_utf8(token) else {
                continue;
            };
            // Bad or non-public entry, move on to the next hop
            if let Some(ip) = parse_candidate(token) {
                trace!("Client address {} taken from {}", ip, name);
                return ip;
            }
        }
    }

    UNKNOWN_CLIENT_IP
}
