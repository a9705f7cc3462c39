// src/error_recovery.rs
//! Retry policy for Notion API calls.
//!
//! The policy only decides *whether* to retry and *how long* to wait;
//! the loop that performs the attempts lives in the API client.

use crate::constants::{NOTION_API_MAX_ATTEMPTS, NOTION_API_RETRY_DELAY_MS};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// How many attempts a request gets and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub default_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: NOTION_API_MAX_ATTEMPTS,
            default_delay: Duration::from_millis(NOTION_API_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// A response is worth another attempt iff it was rate limited or a server error.
    pub fn is_retryable_status(status: u16) -> bool {
        status == 429 || status >= 500
    }

    /// Delay before the next attempt after a retryable status.
    ///
    /// Only a 429 consults `Retry-After`; server errors always use the default.
    pub fn delay_for_status(
        &self,
        status: u16,
        retry_after: Option<&str>,
        now: DateTime<Utc>,
    ) -> Duration {
        if status != 429 {
            return self.default_delay;
        }

        match retry_after.and_then(|value| parse_retry_after(value, now)) {
            Some(delay) => delay,
            None => {
                log::warn!(
                    "429 received without a valid Retry-After header. Falling back to default backoff."
                );
                self.default_delay
            }
        }
    }
}

/// Parses a `Retry-After` header value relative to `now`.
///
/// Accepts decimal seconds or an HTTP date. Returns `None` for anything
/// unparseable and for durations that are not strictly positive.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<f64>() {
        if !seconds.is_finite() || seconds <= 0.0 {
            return None;
        }
        let millis = (seconds * 1000.0).ceil() as u64;
        return Some(Duration::from_millis(millis));
    }

    let at = DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()?
        .with_timezone(&Utc);

    (at - now).to_std().ok().filter(|d| !d.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_seconds() {
        assert_eq!(
            parse_retry_after("2", fixed_now()),
            Some(Duration::from_millis(2000))
        );
        assert_eq!(
            parse_retry_after("0.25", fixed_now()),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn parses_http_date_relative_to_now() {
        let delay = parse_retry_after("Sun, 01 Mar 2026 12:00:05 GMT", fixed_now());
        assert_eq!(delay, Some(Duration::from_secs(5)));
    }

    #[test]
    fn rejects_non_positive_and_malformed_values() {
        assert_eq!(parse_retry_after("0", fixed_now()), None);
        assert_eq!(parse_retry_after("-3", fixed_now()), None);
        assert_eq!(parse_retry_after("soon", fixed_now()), None);
        assert_eq!(parse_retry_after("", fixed_now()), None);
        assert_eq!(
            parse_retry_after("Sun, 01 Mar 2026 11:59:00 GMT", fixed_now()),
            None
        );
    }

    #[test]
    fn server_errors_ignore_retry_after() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for_status(503, Some("30"), fixed_now()),
            Duration::from_millis(500)
        );
        assert_eq!(
            policy.delay_for_status(429, Some("30"), fixed_now()),
            Duration::from_secs(30)
        );
        assert_eq!(
            policy.delay_for_status(429, Some("garbage"), fixed_now()),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn retryable_statuses() {
        assert!(RetryPolicy::is_retryable_status(429));
        assert!(RetryPolicy::is_retryable_status(500));
        assert!(RetryPolicy::is_retryable_status(503));
        assert!(!RetryPolicy::is_retryable_status(400));
        assert!(!RetryPolicy::is_retryable_status(404));
    }
}
