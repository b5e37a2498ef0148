//! Resolver Chaining

use super::types::{CountryResolver, RequestContext, ResolveError};
use crate::geoip::CountryCode;
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Tries each resolver in order until one of them knows the address
#[derive(Clone, Default)]
pub struct ChainResolver {
    resolvers: Vec<Arc<dyn CountryResolver>>,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<R: CountryResolver + 'static>(&mut self, resolver: R) -> &mut Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    pub fn with<R: CountryResolver + 'static>(mut self, resolver: R) -> Self {
        self.push(resolver);
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

#[async_trait]
impl CountryResolver for ChainResolver {
    async fn resolve_country_code(
        &self,
        ctx: &RequestContext,
        ip: IpAddr,
    ) -> Result<CountryCode, ResolveError> {
        let mut last_error = ResolveError::Unavailable("no country resolvers configured".into());

        for (index, resolver) in self.resolvers.iter().enumerate() {
            match resolver.resolve_country_code(ctx, ip).await {
                Ok(country) => return Ok(country),
                Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
                Err(e) => {
                    debug!("Resolver #{} could not resolve {}: {}", index, ip, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

/// Bounds a lookup by a deadline and by the request's cancellation
pub struct WithTimeout<R> {
    inner: R,
    timeout: Duration,
}

impl<R> WithTimeout<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<R: CountryResolver> CountryResolver for WithTimeout<R> {
    async fn resolve_country_code(
        &self,
        ctx: &RequestContext,
        ip: IpAddr,
    ) -> Result<CountryCode, ResolveError> {
        tokio::select! {
            _ = ctx.cancelled() => Err(ResolveError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.inner.resolve_country_code(ctx, ip)) => {
                result.unwrap_or(Err(ResolveError::TimedOut(self.timeout)))
            }
        }
    }
}
