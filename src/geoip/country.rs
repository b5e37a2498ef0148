//! ISO Country Codes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a string is not a well-formed ISO 3166-1 alpha-2 code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ISO country code: {0:?}")]
pub struct InvalidCountryCode(pub String);

/// Two-letter ISO 3166-1 alpha-2 country code, stored lowercase.
///
/// Codes compare, hash and print in their lowercase form, so `"IN"`, `"in"`
/// and `" in "` all parse to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    pub const US: CountryCode = CountryCode(*b"us");
    pub const IN: CountryCode = CountryCode(*b"in");

    /// Country used whenever resolution fails
    pub const DEFAULT: CountryCode = CountryCode::US;

    /// Best-effort parse that falls back to [`CountryCode::DEFAULT`]
    pub fn parse_lossy(code: &str) -> Self {
        code.parse().unwrap_or(Self::DEFAULT)
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII letters ever reach the inner array
        std::str::from_utf8(&self.0).unwrap_or("us")
    }
}

impl Default for CountryCode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for CountryCode {
    type Err = InvalidCountryCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().as_bytes() {
            [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
                Ok(CountryCode([a.to_ascii_lowercase(), b.to_ascii_lowercase()]))
            }
            _ => Err(InvalidCountryCode(s.to_string())),
        }
    }
}

impl TryFrom<String> for CountryCode {
    type Error = InvalidCountryCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
