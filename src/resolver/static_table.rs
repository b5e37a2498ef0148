//! Static Network Table Resolver

use super::types::{CountryResolver, RequestContext, ResolveError};
use crate::config::NetworkRule;
use crate::geoip::CountryCode;
use async_trait::async_trait;
use ipnet::IpNet;
use std::net::IpAddr;
use tracing::debug;

/// Resolves countries from a fixed list of networks, most specific prefix first
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    networks: Vec<(IpNet, CountryCode)>,
}

impl StaticResolver {
    pub fn new<I>(networks: I) -> Self
    where
        I: IntoIterator<Item = (IpNet, CountryCode)>,
    {
        let mut networks: Vec<_> = networks
            .into_iter()
            .map(|(net, country)| (net.trunc(), country))
            .collect();
        // Longest prefix wins, stable so earlier entries win ties
        networks.sort_by(|a, b| b.0.prefix_len().cmp(&a.0.prefix_len()));
        Self { networks }
    }

    pub fn from_rules(rules: &[NetworkRule]) -> Self {
        Self::new(rules.iter().map(|rule| (rule.network, rule.country)))
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn lookup(&self, ip: IpAddr) -> Option<CountryCode> {
        self.networks
            .iter()
            .find(|(net, _)| net.contains(&ip))
            .map(|(_, country)| *country)
    }
}

#[async_trait]
impl CountryResolver for StaticResolver {
    async fn resolve_country_code(
        &self,
        ctx: &RequestContext,
        ip: IpAddr,
    ) -> Result<CountryCode, ResolveError> {
        if ctx.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        match self.lookup(ip) {
            Some(country) => {
                debug!("Static table lookup for {}: {}", ip, country);
                Ok(country)
            }
            None => Err(ResolveError::NotFound(ip)),
        }
    }
}
