//! Tests for client address resolution from forwarding headers

use axum::http::{HeaderMap, HeaderValue};
use georouter::geoip::{is_private_subnet, resolve_client_ip, PRIVATE_RANGES, UNKNOWN_CLIENT_IP};
use std::net::{IpAddr, Ipv4Addr};

fn headers(forwarded_for: Option<&'static str>, real_ip: Option<&'static str>) -> HeaderMap {
    let mut map = HeaderMap::new();
    if let Some(value) = forwarded_for {
        map.insert("x-forwarded-for", HeaderValue::from_static(value));
    }
    if let Some(value) = real_ip {
        map.insert("x-real-ip", HeaderValue::from_static(value));
    }
    map
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[test]
fn test_private_hop_is_skipped() {
    let map = headers(Some("10.0.0.5, 8.8.8.8"), None);
    assert_eq!(resolve_client_ip(&map), ip("8.8.8.8"));
}

#[test]
fn test_first_public_hop_wins() {
    let map = headers(Some("8.8.8.8, 1.1.1.1"), None);
    assert_eq!(resolve_client_ip(&map), ip("8.8.8.8"));

    // x-real-ip is not consulted once x-forwarded-for matched
    let map = headers(Some("8.8.8.8"), Some("9.9.9.9"));
    assert_eq!(resolve_client_ip(&map), ip("8.8.8.8"));
}

#[test]
fn test_real_ip_is_second_choice() {
    let map = headers(None, Some("9.9.9.9"));
    assert_eq!(resolve_client_ip(&map), ip("9.9.9.9"));

    let map = headers(Some(""), Some(" 9.9.9.9 "));
    assert_eq!(resolve_client_ip(&map), ip("9.9.9.9"));
}

#[test]
fn test_malformed_or_missing_headers_yield_unknown() {
    let cases = [
        headers(None, None),
        headers(Some(""), Some("")),
        headers(Some(",,,"), None),
        headers(Some("unknown"), Some("localhost")),
        headers(Some("8.8.8.8:443"), Some("[2001:db8::1]")),
        headers(Some("127.0.0.1, 0.0.0.0"), Some("169.254.169.254")),
        headers(Some("224.0.0.1, 255.255.255.255"), None),
    ];

    for map in &cases {
        assert_eq!(resolve_client_ip(map), UNKNOWN_CLIENT_IP, "headers: {:?}", map);
    }
    assert_eq!(UNKNOWN_CLIENT_IP, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
}

#[test]
fn test_every_private_range_is_rejected() {
    for range in &PRIVATE_RANGES {
        let [a, b, c, _] = range.start.octets();
        let inside = Ipv4Addr::new(a, b, c, 42);
        assert!(is_private_subnet(IpAddr::V4(inside)), "{} should be private", inside);

        let value = format!("{}, 8.8.4.4", inside);
        let mut map = HeaderMap::new();
        map.insert("x-forwarded-for", HeaderValue::from_str(&value).unwrap());
        assert_eq!(resolve_client_ip(&map), ip("8.8.4.4"));
    }
}

#[test]
fn test_range_boundaries() {
    // Start is inside, end is outside
    assert!(is_private_subnet(ip("172.16.0.0")));
    assert!(!is_private_subnet(ip("172.31.255.255")));
    assert!(is_private_subnet(ip("100.64.0.0")));
    assert!(!is_private_subnet(ip("100.127.255.255")));

    let map = headers(Some("192.168.255.255"), None);
    assert_eq!(resolve_client_ip(&map), ip("192.168.255.255"));
}

#[test]
fn test_ipv6_is_not_filtered_by_private_ranges() {
    let map = headers(Some("fd12:3456::1, 8.8.8.8"), None);
    assert_eq!(resolve_client_ip(&map), ip("fd12:3456::1"));

    let map = headers(Some("::1, fe80::1, 2606:4700::1111"), None);
    assert_eq!(resolve_client_ip(&map), ip("2606:4700::1111"));
}

#[test]
fn test_ipv4_mapped_addresses_are_unwrapped() {
    let map = headers(Some("::ffff:10.0.0.1, ::ffff:8.8.8.8"), None);
    assert_eq!(resolve_client_ip(&map), ip("8.8.8.8"));
}
