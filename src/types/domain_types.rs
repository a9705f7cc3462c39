// src/types/domain_types.rs
//! Domain-specific newtypes for type safety and validation.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API key for Notion API authentication
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Create a new API key with validation
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into().trim().to_string();

        if key.is_empty() {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key cannot be empty".to_string(),
            });
        }

        if !key.starts_with("secret_") && !key.starts_with("ntn_") {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key must start with 'secret_' or 'ntn_'".to_string(),
            });
        }

        if key.len() < 20 {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key is too short".to_string(),
            });
        }

        Ok(Self(key))
    }

    /// Get the API key as a string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redact API key in display
        let prefix: String = self.0.chars().take(10).collect();
        write!(f, "{}...", prefix)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self)
    }
}

/// The name of a property on a Notion page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyName(String);

impl PropertyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for PropertyName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for PropertyName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PropertyName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Upper bound on in-flight record tasks for one feed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimit(usize);

impl ConcurrencyLimit {
    pub const MAX: usize = 32;

    pub fn new(limit: usize) -> Result<Self, ValidationError> {
        if limit == 0 || limit > Self::MAX {
            return Err(ValidationError::OutOfBounds {
                value: limit,
                min: 1,
                max: Self::MAX,
            });
        }
        Ok(Self(limit))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        Self(crate::constants::RECORD_CONCURRENCY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_validation() {
        assert!(ApiKey::new("secret_abcdefghijklmnopqrs").is_ok());
        assert!(ApiKey::new("ntn_abcdefghijklmnopqrs").is_ok());
        assert!(ApiKey::new("").is_err());
        assert!(ApiKey::new("   ").is_err());
        assert!(ApiKey::new("invalid_key").is_err());
        assert!(ApiKey::new("secret_short").is_err());
    }

    #[test]
    fn test_api_key_is_redacted() {
        let key = ApiKey::new("secret_abcdefghijklmnopqrs").unwrap();
        assert_eq!(key.to_string(), "secret_abc...");
        assert!(!format!("{:?}", key).contains("mnopqrs"));
    }

    #[test]
    fn test_api_key_redaction_respects_char_boundaries() {
        let key = ApiKey::new("ntn_x가나다라마바사아").unwrap();
        assert_eq!(key.to_string(), "ntn_x가나다라마...");
        assert_eq!(format!("{:?}", key), "ApiKey(ntn_x가나다라마...)");
    }

    #[test]
    fn test_concurrency_limit_bounds() {
        assert_eq!(ConcurrencyLimit::default().get(), 5);
        assert!(ConcurrencyLimit::new(1).is_ok());
        assert!(ConcurrencyLimit::new(0).is_err());
        assert!(ConcurrencyLimit::new(33).is_err());
    }
}
