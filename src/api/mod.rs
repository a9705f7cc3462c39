// src/api/mod.rs
//! Notion API interaction: authenticated, retrying JSON requests and
//! cursor pagination over database queries.
//!
//! Business logic depends on [`NotionClient`]; the raw HTTP exchange sits
//! behind the [`NotionTransport`] trait so it can be scripted in tests.

pub mod client;
pub mod pagination;
pub mod query;

use std::fmt;
use thiserror::Error;

pub use client::{NotionClient, NotionHttpClient};
pub use pagination::collect_all;
pub use query::{DatabaseQuery, SortDirection};

/// HTTP verbs the pipeline issues against Notion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Patch => write!(f, "PATCH"),
        }
    }
}

/// One completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Raw `Retry-After` header value, if the server sent one.
    pub retry_after: Option<String>,
    pub body: String,
}

/// The request never produced a response (DNS, TLS, connection reset...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// The ability to perform one raw HTTP exchange with the Notion API.
///
/// Implementations do not retry and do not interpret statuses.
#[async_trait::async_trait]
pub trait NotionTransport: Send + Sync {
    async fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, TransportError>;
}
