//! Country Resolution Types

use crate::geoip::CountryCode;
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Errors a country lookup can end with
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no country known for {0}")]
    NotFound(IpAddr),

    #[error("country resolver unavailable: {0}")]
    Unavailable(String),

    #[error("lookup cancelled")]
    Cancelled,

    #[error("lookup timed out after {0:?}")]
    TimedOut(Duration),

    #[error("lookup failed: {0}")]
    Lookup(String),
}

/// Per-request scope handed to every lookup.
///
/// The token is cancelled once the inbound request is abandoned, lookups that
/// do I/O should stop waiting when that happens.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    cancel: CancellationToken,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            cancel,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completes when the request scope is cancelled
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a client address to the country it is most likely located in
#[async_trait]
pub trait CountryResolver: Send + Sync {
    async fn resolve_country_code(
        &self,
        ctx: &RequestContext,
        ip: IpAddr,
    ) -> Result<CountryCode, ResolveError>;
}

#[async_trait]
impl<T: CountryResolver + ?Sized> CountryResolver for Arc<T> {
    async fn resolve_country_code(
        &self,
        ctx: &RequestContext,
        ip: IpAddr,
    ) -> Result<CountryCode, ResolveError> {
        (**self).resolve_country_code(ctx, ip).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_ids_are_unique() {
        assert_ne!(RequestContext::new().request_id(), RequestContext::new().request_id());
    }

    #[tokio::test]
    async fn test_context_observes_cancellation() {
        let token = CancellationToken::new();
        let ctx = RequestContext::with_token(token.clone());
        assert!(!ctx.is_cancelled());

        token.cancel();
        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_guard_cancels_context() {
        let ctx = RequestContext::new();
        {
            let _guard = ctx.cancellation_token().clone().drop_guard();
        }
        assert!(ctx.is_cancelled());
    }
}
