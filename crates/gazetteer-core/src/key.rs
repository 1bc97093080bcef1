//! Canonical country identifiers.
//!
//! Every store and queue operation is keyed by the canonical form of a
//! human-entered country name: trimmed, case-folded, with internal
//! whitespace collapsed to single hyphens. Callers may supply raw names
//! (`"United  States"`); construction always normalizes before use, so
//! `"United States"`, `"united states"` and `"united-states"` all address
//! the same records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Minimum length of a canonical key, exclusive.
const MIN_KEY_LENGTH: usize = 3;

/// The canonical identifier for a country.
///
/// Construction via [`CountryKey::parse`] is the only way to obtain a key,
/// so a `CountryKey` in hand is always normalized and validated.
/// Deserialization goes through the same validation; a corrupt wire value
/// never yields a usable key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryKey(String);

impl CountryKey {
    /// Normalizes and validates a raw country name.
    ///
    /// Normalization lowercases the name and replaces runs of whitespace
    /// with a single hyphen. The result must be longer than three
    /// characters, contain only letters and hyphens, and carry no leading,
    /// trailing, or doubled hyphens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] when the name cannot be
    /// normalized into a valid key.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_identifier("country name is empty"));
        }

        let canonical: String = trimmed
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");

        if canonical.chars().count() <= MIN_KEY_LENGTH {
            return Err(Error::invalid_identifier(format!(
                "country name '{canonical}' must be longer than {MIN_KEY_LENGTH} characters"
            )));
        }

        if !canonical.chars().all(|c| c.is_alphabetic() || c == '-') {
            return Err(Error::invalid_identifier(format!(
                "country name '{canonical}' may only contain letters and hyphens"
            )));
        }

        if canonical.starts_with('-') || canonical.ends_with('-') || canonical.contains("--") {
            return Err(Error::invalid_identifier(format!(
                "country name '{canonical}' is malformed"
            )));
        }

        Ok(Self(canonical))
    }

    /// Returns the canonical key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the human-readable form with hyphens restored to spaces.
    ///
    /// Upstream sources index by the spoken name (`"united kingdom"`),
    /// not the canonical key (`"united-kingdom"`).
    #[must_use]
    pub fn display_name(&self) -> String {
        self.0.replace('-', " ")
    }
}

impl fmt::Display for CountryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CountryKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CountryKey> for String {
    fn from(key: CountryKey) -> Self {
        key.0
    }
}
