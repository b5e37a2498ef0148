//! Redirect Module
//!
//! Maps the resolved client country to a destination and answers with a redirect.

pub mod handler;
pub mod rules;

pub use handler::{CountryRouter, RouteDecision};
pub use rules::{fallback_destination, RoutingRules, RoutingRulesError};
