//! MaxMind GeoIP2 Country Resolver

use super::types::{CountryResolver, RequestContext, ResolveError};
use crate::geoip::CountryCode;
use crate::Result;
use async_trait::async_trait;
use std::net::IpAddr;
use std::path::Path;
use tracing::{debug, warn};

#[cfg(feature = "geoip")]
use anyhow::Context;
#[cfg(feature = "geoip")]
use maxminddb::{geoip2, MaxMindDBError, Reader};

/// GeoIP2 / GeoLite2 country database reader
pub struct MaxMindResolver {
    #[cfg(feature = "geoip")]
    reader: Option<Reader<Vec<u8>>>,
    #[cfg(not(feature = "geoip"))]
    _phantom: std::marker::PhantomData<()>,
}

impl MaxMindResolver {
    /// Load a country database from disk
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();

        #[cfg(feature = "geoip")]
        {
            let reader = Reader::open_readfile(db_path)
                .with_context(|| format!("Failed to load GeoIP database: {}", db_path.display()))?;
            debug!("Loaded GeoIP database {}", db_path.display());
            Ok(Self {
                reader: Some(reader),
            })
        }

        #[cfg(not(feature = "geoip"))]
        {
            warn!(
                "GeoIP feature not enabled, ignoring database {}",
                db_path.display()
            );
            Ok(Self::disabled())
        }
    }

    /// Create a resolver with no database behind it
    pub fn disabled() -> Self {
        #[cfg(feature = "geoip")]
        {
            Self { reader: None }
        }

        #[cfg(not(feature = "geoip"))]
        {
            Self {
                _phantom: std::marker::PhantomData,
            }
        }
    }

    /// Check if a database is loaded
    pub fn is_available(&self) -> bool {
        #[cfg(feature = "geoip")]
        {
            self.reader.is_some()
        }

        #[cfg(not(feature = "geoip"))]
        {
            false
        }
    }

    fn lookup(&self, ip: IpAddr) -> std::result::Result<CountryCode, ResolveError> {
        #[cfg(feature = "geoip")]
        {
            let reader = self
                .reader
                .as_ref()
                .ok_or_else(|| ResolveError::Unavailable("no GeoIP database loaded".into()))?;

            match reader.lookup::<geoip2::Country>(ip) {
                Ok(record) => {
                    let iso_code = record
                        .country
                        .and_then(|country| country.iso_code)
                        .ok_or(ResolveError::NotFound(ip))?;
                    debug!("GeoIP lookup for {}: {}", ip, iso_code);
                    iso_code.parse::<CountryCode>().map_err(|e| {
                        warn!("GeoIP database returned unusable code for {}: {}", ip, e);
                        ResolveError::Lookup(e.to_string())
                    })
                }
                Err(MaxMindDBError::AddressNotFoundError(_)) => Err(ResolveError::NotFound(ip)),
                Err(e) => Err(ResolveError::Lookup(e.to_string())),
            }
        }

        #[cfg(not(feature = "geoip"))]
        {
            debug!("GeoIP lookup for {} skipped (feature disabled)", ip);
            Err(ResolveError::Unavailable("geoip feature not enabled".into()))
        }
    }
}

#[async_trait]
impl CountryResolver for MaxMindResolver {
    async fn resolve_country_code(
        &self,
        ctx: &RequestContext,
        ip: IpAddr,
    ) -> std::result::Result<CountryCode, ResolveError> {
        if ctx.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        self.lookup(ip)
    }
}
