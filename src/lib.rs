//! GeoRouter Library
//!
//! Resolves the originating client of an HTTP request from its proxy
//! forwarding headers, maps that address to an ISO country through a pluggable
//! resolver and redirects the client to a country-specific location.

pub mod config;
pub mod geoip;
pub mod redirect;
pub mod resolver;
pub mod server;
pub mod shutdown;

pub use config::Config;
pub use geoip::{resolve_client_ip, CountryCode};
pub use redirect::{CountryRouter, RoutingRules};
pub use resolver::{CountryResolver, RequestContext, ResolveError};
pub use server::GeoRouterServer;
pub use shutdown::ShutdownCoordinator;

/// Common error type for the router
pub type Result<T> = anyhow::Result<T>;
