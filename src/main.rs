//! GeoRouter - country based redirect service
//!
//! Determines the client's country from proxy forwarding headers and redirects
//! it to the location configured for that country.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use georouter::{config::ConfigManager, resolver, CountryRouter, GeoRouterServer, ShutdownCoordinator};

/// CLI arguments for GeoRouter
#[derive(Parser, Debug)]
#[command(name = "georouter")]
#[command(about = "GeoRouter - redirect clients to a country-specific location")]
#[command(version)]
#[command(long_about = "
GeoRouter - redirect clients to a country-specific location

The client address is taken from x-forwarded-for, then x-real-ip, skipping
private and non-routable entries. Its country is looked up in the static
network table and/or a MaxMind country database, and the client is sent a
302 redirect to the configured route, or to /<country> when none is set.

Configuration priority (highest to lowest):
1. Command-line arguments
2. Environment variables
3. Configuration file
4. Built-in defaults

Environment variables:
  GEOROUTER_BIND_ADDR       - Bind address (e.g., 0.0.0.0:8080)
  GEOROUTER_GEOIP_DATABASE  - Path to a GeoIP2/GeoLite2 country database
  GEOROUTER_LOOKUP_TIMEOUT  - Country lookup timeout (e.g., 500ms, 2s)
  GEOROUTER_LOG_LEVEL       - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "georouter.toml",
        help = "Path to configuration file"
    )]
    pub config: PathBuf,

    /// Bind address (overrides config file)
    #[arg(short, long, help = "Bind address (e.g., 0.0.0.0:8080)")]
    pub bind: Option<String>,

    /// Port to bind to (overrides config file)
    #[arg(short, long, help = "Port to bind to")]
    pub port: Option<u16>,

    /// GeoIP database (overrides config file)
    #[arg(long, help = "Path to a GeoIP2/GeoLite2 country database")]
    pub geoip_database: Option<PathBuf>,

    /// Country lookup timeout (overrides config file)
    #[arg(long, value_parser = humantime::parse_duration, help = "Country lookup timeout (e.g., 500ms)")]
    pub lookup_timeout: Option<Duration>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, help = "Log level (defaults to the configured level)")]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Load configuration with priority: CLI args > environment > config file > defaults
    let mut config = ConfigManager::load(&args.config)?;

    init_tracing(&args, &config.logging.level)?;

    info!("Starting GeoRouter v{}", env!("CARGO_PKG_VERSION"));

    config.merge_with_cli_args(
        args.bind.as_deref(),
        args.port,
        args.geoip_database.as_deref(),
        args.lookup_timeout,
    );

    config
        .validate()
        .context("Final configuration validation failed")?;

    if args.validate_config {
        info!("Configuration is valid");
        info!("Configuration summary:");
        info!("  Bind address: {}", config.server.bind_addr);
        info!("  Health path: {}", config.server.health_path.as_deref().unwrap_or("disabled"));
        info!(
            "  GeoIP database: {}",
            config
                .geoip
                .database
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        info!("  Static networks: {}", config.geoip.networks.len());
        info!("  Lookup timeout: {:?}", config.geoip.lookup_timeout);
        info!("  Routes: {}", config.routes.len());
        return Ok(());
    }

    let country_resolver = resolver::from_config(&config.geoip)
        .context("Failed to initialize country resolver")?;
    let router = CountryRouter::new(country_resolver, config.routes.clone());

    let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
    let server = GeoRouterServer::new(config, router);

    let server_shutdown = shutdown.clone();
    let server_handle = tokio::spawn(async move {
        let result = server.start(server_shutdown.clone()).await;
        // Stop the signal listener too if the server exits on its own
        server_shutdown.trigger();
        result
    });

    info!("Press Ctrl+C or send SIGTERM/SIGINT to shutdown gracefully");

    if let Err(e) = shutdown.listen_for_signals().await {
        error!("Error setting up signal handlers: {}", e);
        shutdown.trigger();
    }

    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("Server error: {:#}", e);
            return Err(e);
        }
        Err(e) if !e.is_cancelled() => error!("Server task failed: {}", e),
        Err(_) => {}
    }

    info!("GeoRouter shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(args: &CliArgs, configured_level: &str) -> Result<()> {
    let log_level = if args.verbose {
        "debug"
    } else {
        args.log_level.as_deref().unwrap_or(configured_level)
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}
