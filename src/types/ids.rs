use super::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a Notion database, stored in canonical non-hyphenated form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseId(String);

impl DatabaseId {
    /// Parses a 32-char hex id, a dashed UUID, or a Notion URL.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let cleaned = input.trim().trim_end_matches('/');

        if cleaned.is_empty() {
            return Err(ValidationError::EmptyField("database id"));
        }

        let compact = cleaned.replace('-', "");
        if compact.len() == 32 && compact.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Self(compact.to_lowercase()));
        }

        if cleaned.starts_with("http://") || cleaned.starts_with("https://") {
            return Self::extract_from_url(cleaned);
        }

        Err(ValidationError::InvalidId(format!(
            "Could not parse Notion database ID from: {}",
            input
        )))
    }

    /// Extracts ID from Notion URLs.
    fn extract_from_url(url: &str) -> Result<Self, ValidationError> {
        lazy_static::lazy_static! {
            static ref ID_REGEX: Regex = Regex::new(
                r"(?:[/-])([a-fA-F0-9]{32}|[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12})(?:[/?#]|$)"
            ).expect("Failed to compile Notion ID regex - this is a bug in the code");
        }

        if let Some(id_match) = ID_REGEX.captures(url).and_then(|c| c.get(1)) {
            return Ok(Self(id_match.as_str().replace('-', "").to_lowercase()));
        }

        Err(ValidationError::InvalidId(format!(
            "No valid ID found in URL: {}",
            url
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the hyphenated UUID format used in API paths.
    pub fn to_hyphenated(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            &self.0[0..8],
            &self.0[8..12],
            &self.0[12..16],
            &self.0[16..20],
            &self.0[20..32]
        )
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a remote record (a Notion page).
///
/// Kept verbatim as returned by the API, dashes included, because it is
/// embedded in asset file names and derived links that later runs match on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
