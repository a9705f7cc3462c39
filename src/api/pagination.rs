// src/api/pagination.rs
//! Cursor pagination over database queries.

use super::{DatabaseQuery, HttpMethod, NotionClient};
use crate::constants::NOTION_API_PAGE_SIZE;
use crate::error::AppError;
use crate::model::RemoteRecord;
use crate::types::DatabaseId;
use serde::Deserialize;

/// One page of a paginated Notion list response.
#[derive(Debug, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Fetches pages until the server reports no more, preserving encounter order.
pub async fn fetch_all_pages<T, F, Fut>(mut fetch_fn: F) -> Result<Vec<T>, AppError>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let mut cursor = None;
    let mut pages_fetched = 0u32;

    loop {
        let response = fetch_fn(NOTION_API_PAGE_SIZE, cursor).await?;
        pages_fetched += 1;

        let has_more = response.has_more;
        cursor = response.next_cursor;
        all_items.extend(response.results);

        if !has_more || cursor.is_none() {
            break;
        }
    }

    log::debug!(
        "Fetched {} items in {} page(s)",
        all_items.len(),
        pages_fetched
    );
    Ok(all_items)
}

/// Collects every record of a database matching `query`.
pub async fn collect_all(
    client: &NotionClient,
    database: &DatabaseId,
    query: &DatabaseQuery,
) -> Result<Vec<RemoteRecord>, AppError> {
    let endpoint = format!("databases/{}/query", database.to_hyphenated());

    fetch_all_pages(|page_size, cursor| {
        let body = query.request_body(page_size, cursor.as_deref());
        let endpoint = endpoint.as_str();
        async move {
            let value = client.send(HttpMethod::Post, endpoint, Some(&body)).await?;
            let page: PaginatedResponse<RemoteRecord> = serde_json::from_value(value)?;
            Ok(page)
        }
    })
    .await
}
