//! Country Redirect Handler

use super::rules::{fallback_destination, RoutingRules};
use crate::geoip::{resolve_client_ip, CountryCode};
use crate::resolver::{CountryResolver, RequestContext};
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of routing one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub client_ip: IpAddr,
    pub country: CountryCode,
    pub destination: String,
    /// Destination came from the routing rules rather than the `/{country}` fallback
    pub matched_rule: bool,
    /// The resolver failed and the default country was used
    pub resolver_failed: bool,
}

/// Redirects every request to the location configured for the client's country
#[derive(Clone)]
pub struct CountryRouter {
    resolver: Arc<dyn CountryResolver>,
    rules: Arc<RoutingRules>,
}

impl CountryRouter {
    pub fn new(resolver: Arc<dyn CountryResolver>, rules: RoutingRules) -> Self {
        Self {
            resolver,
            rules: Arc::new(rules),
        }
    }

    pub fn rules(&self) -> &RoutingRules {
        &self.rules
    }

    /// Decide where the request should go. Never fails.
    pub async fn route(&self, headers: &HeaderMap, ctx: &RequestContext) -> RouteDecision {
        let client_ip = resolve_client_ip(headers);

        let (country, resolver_failed) = match self.resolver.resolve_country_code(ctx, client_ip).await {
            Ok(country) => (country, false),
            Err(e) => {
                warn!(
                    request_id = %ctx.request_id(),
                    "Country lookup for {} failed, using {}: {}",
                    client_ip,
                    CountryCode::DEFAULT,
                    e
                );
                (CountryCode::DEFAULT, true)
            }
        };

        let (destination, matched_rule) = match self.rules.get(&country) {
            Some(destination) => (destination.to_string(), true),
            None => (fallback_destination(country), false),
        };

        RouteDecision {
            client_ip,
            country,
            destination,
            matched_rule,
            resolver_failed,
        }
    }

    /// Route the request and answer with `302 Found`
    pub async fn redirect(&self, headers: &HeaderMap, ctx: &RequestContext) -> Response {
        let decision = self.route(headers, ctx).await;

        debug!(
            request_id = %ctx.request_id(),
            client_ip = %decision.client_ip,
            country = %decision.country,
            matched_rule = decision.matched_rule,
            "Redirecting to {}",
            decision.destination
        );

        let location = HeaderValue::try_from(decision.destination.as_str()).unwrap_or_else(|_| {
            warn!(
                request_id = %ctx.request_id(),
                "Destination for {} is not a valid Location header, using fallback path",
                decision.country
            );
            // Country codes are plain ASCII letters
            HeaderValue::try_from(fallback_destination(decision.country))
                .unwrap_or_else(|_| HeaderValue::from_static("/"))
        });

        found(location)
    }

    /// Router that sends every method and path through [`CountryRouter::redirect`]
    pub fn into_router(self) -> Router {
        Router::new().fallback(redirect_handler).with_state(self)
    }
}

fn found(location: HeaderValue) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

async fn redirect_handler(State(router): State<CountryRouter>, headers: HeaderMap) -> Response {
    let ctx = RequestContext::new();
    // Dropping the request future (client went away) cancels in-flight lookups
    let _guard = ctx.cancellation_token().clone().drop_guard();
    router.redirect(&headers, &ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolveError;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Returns a fixed answer and remembers the address it was asked about
    struct FixedResolver {
        answer: Result<CountryCode, ResolveError>,
        seen: Mutex<Vec<IpAddr>>,
    }

    impl FixedResolver {
        fn new(answer: Result<CountryCode, ResolveError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CountryResolver for FixedResolver {
        async fn resolve_country_code(
            &self,
            _ctx: &RequestContext,
            ip: IpAddr,
        ) -> Result<CountryCode, ResolveError> {
            self.seen.lock().unwrap().push(ip);
            self.answer.clone()
        }
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[tokio::test]
    async fn test_route_uses_matching_rule() {
        let resolver = FixedResolver::new(Ok(CountryCode::IN));
        let router = CountryRouter::new(resolver.clone(), RoutingRules::new().with(CountryCode::IN, "/india"));

        let decision = router
            .route(&forwarded("10.0.0.5, 49.36.1.1"), &RequestContext::new())
            .await;

        assert_eq!(decision.destination, "/india");
        assert!(decision.matched_rule);
        assert!(!decision.resolver_failed);
        assert_eq!(resolver.seen.lock().unwrap().as_slice(), &["49.36.1.1".parse::<IpAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_route_synthesizes_path_for_unconfigured_country() {
        let router = CountryRouter::new(
            FixedResolver::new(Ok("fr".parse().unwrap())),
            RoutingRules::new().with(CountryCode::IN, "/india"),
        );

        let decision = router.route(&HeaderMap::new(), &RequestContext::new()).await;
        assert_eq!(decision.destination, "/fr");
        assert!(!decision.matched_rule);
    }

    #[tokio::test]
    async fn test_route_defaults_when_resolver_fails() {
        let resolver = FixedResolver::new(Err(ResolveError::Lookup("boom".into())));
        let router = CountryRouter::new(resolver.clone(), RoutingRules::new());

        let decision = router.route(&HeaderMap::new(), &RequestContext::new()).await;
        assert_eq!(decision.country, CountryCode::DEFAULT);
        assert_eq!(decision.destination, "/us");
        assert!(decision.resolver_failed);

        // Unknown clients are still looked up, as 0.0.0.0
        assert_eq!(resolver.seen.lock().unwrap().as_slice(), &["0.0.0.0".parse::<IpAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_default_country_rule_applies_on_failure() {
        let router = CountryRouter::new(
            FixedResolver::new(Err(ResolveError::NotFound("8.8.8.8".parse().unwrap()))),
            RoutingRules::new().with(CountryCode::US, "https://us.example.org/"),
        );

        let decision = router
            .route(&forwarded("8.8.8.8"), &RequestContext::new())
            .await;
        assert_eq!(decision.destination, "https://us.example.org/");
        assert!(decision.matched_rule);
    }

    #[tokio::test]
    async fn test_redirect_answers_found() {
        let router = CountryRouter::new(
            FixedResolver::new(Ok(CountryCode::IN)),
            RoutingRules::new().with(CountryCode::IN, "/india"),
        );

        let response = router.redirect(&HeaderMap::new(), &RequestContext::new()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/india");
    }

    #[tokio::test]
    async fn test_unencodable_destination_uses_fallback_path() {
        let router = CountryRouter::new(
            FixedResolver::new(Ok(CountryCode::IN)),
            RoutingRules::new().with(CountryCode::IN, "/india\r\nset-cookie: x=1"),
        );

        let response = router.redirect(&HeaderMap::new(), &RequestContext::new()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/in");
    }

    #[tokio::test]
    async fn test_router_redirects_any_path_and_method() {
        let app = CountryRouter::new(FixedResolver::new(Ok(CountryCode::US)), RoutingRules::new()).into_router();

        for (method, uri) in [("GET", "/"), ("POST", "/some/deep/path?q=1"), ("HEAD", "/x")] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();

            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::FOUND);
            assert_eq!(response.headers()[header::LOCATION], "/us");
        }
    }
}
