//! Country Resolution Module
//!
//! The capability the redirect handler uses to map a client address to a
//! country, plus the lookup backends the server ships with.

pub mod chain;
pub mod maxmind;
pub mod static_table;
pub mod types;

pub use chain::{ChainResolver, WithTimeout};
pub use maxmind::MaxMindResolver;
pub use static_table::StaticResolver;
pub use types::*;

use crate::config::GeoIpConfig;
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// Build the resolver stack described by the configuration.
///
/// Static networks are consulted before the database so they can override it.
pub fn from_config(config: &GeoIpConfig) -> Result<Arc<dyn CountryResolver>> {
    let mut chain = ChainResolver::new();

    if !config.networks.is_empty() {
        info!("Using {} static network rules", config.networks.len());
        chain.push(StaticResolver::from_rules(&config.networks));
    }

    if let Some(database) = &config.database {
        info!("Using GeoIP database {}", database.display());
        chain.push(MaxMindResolver::open(database)?);
    }

    if chain.is_empty() {
        info!("No country resolvers configured, every client routes to the default country");
    }

    Ok(Arc::new(WithTimeout::new(chain, config.lookup_timeout)))
}
