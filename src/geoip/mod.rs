//! GeoIP Module
//!
//! Country codes and client address extraction from forwarding headers.

pub mod client_ip;
pub mod country;

pub use client_ip::{
    is_global_unicast, is_private_subnet, resolve_client_ip, AddressRange, FORWARDING_HEADERS,
    PRIVATE_RANGES, UNKNOWN_CLIENT_IP,
};
pub use country::{CountryCode, InvalidCountryCode};
