//! Configuration Manager

use super::Config;
use crate::Result;
use anyhow::{bail, Context};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config = Self::parse(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            config.validate()
                .with_context(|| "Configuration validation failed")?;

            tracing::info!("Configuration loaded and validated successfully");
            Ok(config)
        } else {
            tracing::warn!("Configuration file not found at {}, using defaults", path.display());
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Parse configuration from TOML text without validating it
    pub fn parse(content: &str) -> Result<Config> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Config> {
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file (or defaults when missing) and layer environment variables on top
    pub fn load(path: &Path) -> Result<Config> {
        let mut config = Self::load_from_file(path)?;
        Self::apply_env_overrides(&mut config)?;
        config.validate()
            .with_context(|| "Configuration validation failed after environment overrides")?;
        Ok(config)
    }

    /// Override configuration values from `GEOROUTER_*` environment variables
    pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
        Self::apply_overrides(config, |key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(config: &mut Config, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind_addr) = var("GEOROUTER_BIND_ADDR") {
            config.server.bind_addr = bind_addr.parse::<SocketAddr>()
                .with_context(|| format!("Invalid GEOROUTER_BIND_ADDR: {}", bind_addr))?;
            tracing::info!("Environment override: bind address set to {}", config.server.bind_addr);
        }

        if let Some(database) = var("GEOROUTER_GEOIP_DATABASE") {
            config.geoip.database = Some(PathBuf::from(database));
        }

        if let Some(timeout) = var("GEOROUTER_LOOKUP_TIMEOUT") {
            config.geoip.lookup_timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid GEOROUTER_LOOKUP_TIMEOUT: {}", timeout))?;
        }

        if let Some(log_level) = var("GEOROUTER_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        Ok(())
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// Route destinations are used verbatim and are not checked here.
    pub fn validate(&self) -> Result<()> {
        self.validate_server_config()
            .with_context(|| "Server configuration validation failed")?;

        self.validate_geoip_config()
            .with_context(|| "GeoIP configuration validation failed")?;

        self.validate_logging_config()
            .with_context(|| "Logging configuration validation failed")?;

        Ok(())
    }

    fn validate_server_config(&self) -> Result<()> {
        if self.server.shutdown_timeout.is_zero() {
            bail!("shutdown_timeout must be greater than 0");
        }

        if let Some(path) = &self.server.health_path {
            if !path.starts_with('/') {
                bail!("health_path must start with '/', got {:?}", path);
            }

            // Route parameters and wildcards would make the router panic
            if path.contains([':', '*']) {
                bail!("health_path must be a literal path, got {:?}", path);
            }
        }

        Ok(())
    }

    fn validate_geoip_config(&self) -> Result<()> {
        if self.geoip.lookup_timeout.is_zero() {
            bail!("lookup_timeout must be greater than 0");
        }

        if self.geoip.lookup_timeout > Duration::from_secs(60) {
            bail!("lookup_timeout cannot exceed 60 seconds");
        }

        if let Some(database) = &self.geoip.database {
            if !database.is_file() {
                bail!("GeoIP database not found: {}", database.display());
            }
        }

        let mut seen = HashSet::new();
        for (i, rule) in self.geoip.networks.iter().enumerate() {
            if !seen.insert(rule.network.trunc()) {
                bail!("Network rule {} duplicates network {}", i, rule.network);
            }
        }

        Ok(())
    }

    fn validate_logging_config(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            bail!("logging.level must be one of: {}", valid_log_levels.join(", "));
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(
        &mut self,
        bind: Option<&str>,
        port: Option<u16>,
        geoip_database: Option<&Path>,
        lookup_timeout: Option<Duration>,
    ) {
        if let Some(bind_str) = bind {
            if let Ok(addr) = bind_str.parse::<SocketAddr>() {
                self.server.bind_addr = addr;
                tracing::info!("CLI override: bind address set to {}", addr);
            } else {
                tracing::warn!("Invalid bind address provided: {}", bind_str);
            }
        }

        if let Some(port) = port {
            self.server.bind_addr.set_port(port);
            tracing::info!("CLI override: port set to {}", port);
        }

        if let Some(database) = geoip_database {
            self.geoip.database = Some(database.to_path_buf());
            tracing::info!("CLI override: GeoIP database set to {}", database.display());
        }

        if let Some(timeout) = lookup_timeout {
            self.geoip.lookup_timeout = timeout;
            tracing::info!("CLI override: lookup timeout set to {:?}", timeout);
        }
    }
}
