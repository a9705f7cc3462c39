//! Database query parameters passed through to Notion unchanged.

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Filter and sort criteria of a database query.
///
/// The filter is opaque to the pipeline; sorts are applied by Notion in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseQuery {
    pub filter: Option<Value>,
    pub sorts: Vec<Value>,
}

impl DatabaseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort_by_property(mut self, property: &str, direction: SortDirection) -> Self {
        self.sorts
            .push(json!({ "property": property, "direction": direction }));
        self
    }

    /// Sorts by a record timestamp such as `created_time`.
    pub fn sort_by_timestamp(mut self, timestamp: &str, direction: SortDirection) -> Self {
        self.sorts
            .push(json!({ "timestamp": timestamp, "direction": direction }));
        self
    }

    /// Body of one query request. The cursor is omitted on the first page.
    pub fn request_body(&self, page_size: usize, start_cursor: Option<&str>) -> Value {
        let mut body = json!({ "page_size": page_size });
        if let Some(cursor) = start_cursor {
            body["start_cursor"] = json!(cursor);
        }
        if let Some(filter) = &self.filter {
            body["filter"] = filter.clone();
        }
        if !self.sorts.is_empty() {
            body["sorts"] = Value::Array(self.sorts.clone());
        }
        body
    }
}
