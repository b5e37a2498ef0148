//! Configuration Types

use crate::geoip::CountryCode;
use crate::redirect::RoutingRules;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub geoip: GeoIpConfig,
    /// Destination per country code
    pub routes: RoutingRules,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
    /// Path answered with `200 ok` instead of a redirect
    pub health_path: Option<String>,
}

/// Country lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeoIpConfig {
    /// MaxMind country database (`.mmdb`)
    pub database: Option<PathBuf>,
    #[serde(with = "humantime_serde")]
    pub lookup_timeout: Duration,
    pub networks: Vec<NetworkRule>,
}

/// Static network to country assignment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkRule {
    pub network: IpNet,
    pub country: CountryCode,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            shutdown_timeout: Duration::from_secs(30),
            health_path: Some("/healthz".to_string()),
        }
    }
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            database: None,
            lookup_timeout: Duration::from_secs(2),
            networks: vec![],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
