//! Country Routing Rules

use crate::geoip::{CountryCode, InvalidCountryCode};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Error building routing rules from raw country keys
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingRulesError {
    #[error(transparent)]
    InvalidCountry(#[from] InvalidCountryCode),

    #[error("route for {country} given more than once (key {key:?})")]
    DuplicateCountry { country: CountryCode, key: String },
}

/// Destination per country, loaded once and read-only afterwards.
///
/// Destinations are used verbatim; a missing country is not an error.
/// Keys are normalized while loading, so `in` and `IN` in one table is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "HashMap<String, String>",
    into = "HashMap<CountryCode, String>"
)]
pub struct RoutingRules(HashMap<CountryCode, String>);

impl RoutingRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, country: CountryCode, destination: impl Into<String>) -> Option<String> {
        self.0.insert(country, destination.into())
    }

    pub fn with(mut self, country: CountryCode, destination: impl Into<String>) -> Self {
        self.insert(country, destination);
        self
    }

    pub fn get(&self, country: &CountryCode) -> Option<&str> {
        self.0.get(country).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CountryCode, &str)> {
        self.0.iter().map(|(country, dest)| (country, dest.as_str()))
    }
}

/// Same-origin path used for countries without a rule
pub fn fallback_destination(country: CountryCode) -> String {
    format!("/{}", country)
}

impl FromIterator<(CountryCode, String)> for RoutingRules {
    fn from_iter<I: IntoIterator<Item = (CountryCode, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl TryFrom<HashMap<String, String>> for RoutingRules {
    type Error = RoutingRulesError;

    fn try_from(raw: HashMap<String, String>) -> Result<Self, Self::Error> {
        let mut rules = HashMap::with_capacity(raw.len());
        for (key, destination) in raw {
            let country: CountryCode = key.parse()?;
            match rules.entry(country) {
                Entry::Occupied(_) => {
                    return Err(RoutingRulesError::DuplicateCountry { country, key });
                }
                Entry::Vacant(slot) => {
                    slot.insert(destination);
                }
            }
        }
        Ok(Self(rules))
    }
}

impl From<RoutingRules> for HashMap<CountryCode, String> {
    fn from(rules: RoutingRules) -> Self {
        rules.0
    }
}

impl From<HashMap<CountryCode, String>> for RoutingRules {
    fn from(map: HashMap<CountryCode, String>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_miss() {
        let rules = RoutingRules::new()
            .with(CountryCode::IN, "/india")
            .with(CountryCode::US, "https://us.example.org/");

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get(&CountryCode::IN), Some("/india"));
        assert_eq!(rules.get(&"fr".parse().unwrap()), None);
    }

    #[test]
    fn test_fallback_destination() {
        assert_eq!(fallback_destination("fr".parse().unwrap()), "/fr");
        assert_eq!(fallback_destination(CountryCode::DEFAULT), "/us");
    }

    #[test]
    fn test_deserialize_from_toml_table() {
        let rules: RoutingRules = toml::from_str(
            r#"
            in = "/india"
            US = "https://us.example.org/"
            "#,
        )
        .unwrap();

        assert_eq!(rules.get(&CountryCode::IN), Some("/india"));
        assert_eq!(rules.get(&CountryCode::US), Some("https://us.example.org/"));
    }

    #[test]
    fn test_deserialize_rejects_keys_differing_only_in_case() {
        let result: Result<RoutingRules, _> = toml::from_str(
            r#"
            in = "/india"
            IN = "/bharat"
            "#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("more than once"), "unexpected error: {err}");
    }

    #[test]
    fn test_try_from_raw_map() {
        let raw: HashMap<String, String> = [
            ("us".to_string(), "/usa".to_string()),
            (" Us ".to_string(), "/america".to_string()),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            RoutingRules::try_from(raw),
            Err(RoutingRulesError::DuplicateCountry { country: CountryCode::US, .. })
        ));

        let raw: HashMap<String, String> = [("fr".to_string(), "/france".to_string())]
            .into_iter()
            .collect();
        let rules = RoutingRules::try_from(raw).unwrap();
        assert_eq!(rules.get(&"fr".parse().unwrap()), Some("/france"));
    }

    #[test]
    fn test_serialize_round_trips_through_toml() {
        let rules = RoutingRules::new().with(CountryCode::IN, "/india");
        let text = toml::to_string(&rules).unwrap();
        assert_eq!(toml::from_str::<RoutingRules>(&text).unwrap(), rules);
    }

    #[test]
    fn test_deserialize_rejects_bad_country() {
        let result: Result<RoutingRules, _> = toml::from_str(r#"india = "/india""#);
        assert!(result.is_err());
    }
}
