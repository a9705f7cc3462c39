// src/api/client.rs
//! HTTP client for the Notion API.
//!
//! [`NotionHttpClient`] is the reqwest-backed transport: it authenticates
//! and performs exactly one exchange per call. [`NotionClient`] layers the
//! retry loop and JSON decoding on top of any transport.

use super::{HttpMethod, NotionTransport, RawResponse, TransportError};
use crate::constants::{NOTION_API_BASE_URL, NOTION_API_VERSION};
use crate::error::{AppError, NotionErrorCode};
use crate::error_recovery::RetryPolicy;
use crate::types::{ApiKey, RecordId};
use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use serde_json::{json, Value};
use std::sync::Arc;

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .build()?;
        Ok(Self {
            client,
            base_url: NOTION_API_BASE_URL.to_string(),
        })
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_API_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }
}

#[async_trait::async_trait]
impl NotionTransport for NotionHttpClient {
    async fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse, TransportError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        log::debug!("{} {}", method, url);

        let request = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Patch => self.client.patch(&url),
        };
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Retrying JSON client over a [`NotionTransport`].
#[derive(Clone)]
pub struct NotionClient {
    transport: Arc<dyn NotionTransport>,
    policy: RetryPolicy,
    clock: fn() -> DateTime<Utc>,
}

impl NotionClient {
    pub fn new(transport: Arc<dyn NotionTransport>) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            clock: Utc::now,
        }
    }

    /// Replaces the wall clock used to resolve HTTP-date `Retry-After` values.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Sends one logical request, retrying rate limits, server errors and
    /// network failures up to the policy's attempt cap.
    ///
    /// A successful empty body decodes as `{}`.
    pub async fn send(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, AppError> {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            let is_last = attempt == max_attempts;

            match self.transport.execute(method, endpoint, body).await {
                Ok(response) if (200..300).contains(&response.status) => {
                    return decode_body(&response.body);
                }
                Ok(response) => {
                    if is_last || !RetryPolicy::is_retryable_status(response.status) {
                        return Err(service_error(method, endpoint, response));
                    }
                    let delay = self.policy.delay_for_status(
                        response.status,
                        response.retry_after.as_deref(),
                        (self.clock)(),
                    );
                    log::warn!(
                        "Notion API ({} {}) returned {}; retrying in {} ms (attempt {}/{})",
                        method,
                        endpoint,
                        response.status,
                        delay.as_millis(),
                        attempt,
                        max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(TransportError(message)) => {
                    if is_last {
                        return Err(AppError::Transport {
                            method: method.to_string(),
                            endpoint: endpoint.to_string(),
                            message,
                        });
                    }
                    log::warn!(
                        "Notion API ({} {}) network error: {}; retrying in {} ms (attempt {}/{})",
                        method,
                        endpoint,
                        message,
                        self.policy.default_delay.as_millis(),
                        attempt,
                        max_attempts
                    );
                    tokio::time::sleep(self.policy.default_delay).await;
                }
            }
        }

        Err(AppError::internal("retry loop terminated unexpectedly"))
    }

    /// Replaces the given properties of one record.
    pub async fn update_page(&self, record: &RecordId, properties: Value) -> Result<(), AppError> {
        let endpoint = format!("pages/{}", record.as_str());
        let body = json!({ "properties": properties });
        self.send(HttpMethod::Patch, &endpoint, Some(&body)).await?;
        Ok(())
    }
}

fn decode_body(body: &str) -> Result<Value, AppError> {
    if body.trim().is_empty() {
        return Ok(json!({}));
    }
    Ok(serde_json::from_str(body)?)
}

fn service_error(method: HttpMethod, endpoint: &str, response: RawResponse) -> AppError {
    AppError::NotionService {
        method: method.to_string(),
        endpoint: endpoint.to_string(),
        status: response.status,
        code: NotionErrorCode::classify(response.status, &response.body),
        body: response.body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_decodes_as_empty_object() {
        assert_eq!(decode_body("").unwrap(), json!({}));
        assert_eq!(decode_body("  \n").unwrap(), json!({}));
        assert_eq!(decode_body(r#"{"ok":true}"#).unwrap(), json!({"ok": true}));
        assert!(matches!(
            decode_body("<html>"),
            Err(AppError::MalformedResponse(_))
        ));
    }

    #[test]
    fn service_error_carries_parsed_code() {
        let err = service_error(
            HttpMethod::Post,
            "databases/x/query",
            RawResponse {
                status: 404,
                retry_after: None,
                body: r#"{"code":"object_not_found"}"#.to_string(),
            },
        );
        match err {
            AppError::NotionService { status, code, .. } => {
                assert_eq!(status, 404);
                assert_eq!(code, NotionErrorCode::ObjectNotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
