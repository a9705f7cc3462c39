//! Normalization rules shared by every feed mapper.

use super::PropertyValue;
use crate::constants::UNCATEGORIZED;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parses the date and date-time shapes Notion emits into a UTC instant.
///
/// Accepts RFC 3339 date-times, zone-less date-times (read as UTC) and bare
/// `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `YYYY.MM.DD` in UTC, or `None` when the value does not parse.
pub fn day_precision(value: &str) -> Option<String> {
    parse_instant(value).map(|dt| dt.format("%Y.%m.%d").to_string())
}

/// `YYYY.MM` in UTC, or `None` when the value does not parse.
pub fn month_precision(value: &str) -> Option<String> {
    parse_instant(value).map(|dt| dt.format("%Y.%m").to_string())
}

/// Categories of a select, multi_select or comma-separated rich_text value.
///
/// Values are trimmed, blanks dropped and duplicates removed keeping the
/// first occurrence. An empty result becomes the single uncategorized entry.
pub fn categories(property: Option<&PropertyValue>) -> Vec<String> {
    let raw: Vec<String> = match property {
        Some(p @ (PropertyValue::Select { .. } | PropertyValue::MultiSelect { .. })) => {
            p.option_names()
        }
        Some(PropertyValue::RichText { rich_text }) => rich_text
            .first()
            .map(|t| t.plain_text.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let values = dedup_preserving_order(
        raw.into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
    );

    if values.is_empty() {
        vec![UNCATEGORIZED.to_string()]
    } else {
        values
    }
}

/// Removes duplicates while keeping the first occurrence of each value.
pub fn dedup_preserving_order(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prop(value: serde_json::Value) -> PropertyValue {
        PropertyValue::from_json(value)
    }

    #[test]
    fn formats_dates_in_utc() {
        assert_eq!(day_precision("2024-03-05").as_deref(), Some("2024.03.05"));
        assert_eq!(
            day_precision("2024-03-05T23:30:00.000+09:00").as_deref(),
            Some("2024.03.05")
        );
        assert_eq!(
            day_precision("2024-03-05T01:30:00.000+09:00").as_deref(),
            Some("2024.03.04")
        );
        assert_eq!(month_precision("2023-11-20").as_deref(), Some("2023.11"));
        assert_eq!(day_precision("not a date"), None);
        assert_eq!(month_precision(""), None);
    }

    #[test]
    fn categories_from_each_supported_kind() {
        let select = prop(json!({"type": "select", "select": {"name": " 행사 "}}));
        assert_eq!(categories(Some(&select)), vec!["행사"]);

        let multi = prop(json!({
            "type": "multi_select",
            "multi_select": [{"name": "A"}, {"name": "B"}, {"name": "A"}]
        }));
        assert_eq!(categories(Some(&multi)), vec!["A", "B"]);

        let text = prop(json!({
            "type": "rich_text",
            "rich_text": [{"plain_text": "밋업, 스터디,,밋업 "}]
        }));
        assert_eq!(categories(Some(&text)), vec!["밋업", "스터디"]);
    }

    #[test]
    fn categories_fall_back_to_uncategorized() {
        assert_eq!(categories(None), vec!["기타"]);
        let empty = prop(json!({"type": "select", "select": null}));
        assert_eq!(categories(Some(&empty)), vec!["기타"]);
        let blank = prop(json!({"type": "rich_text", "rich_text": [{"plain_text": " , "}]}));
        assert_eq!(categories(Some(&blank)), vec!["기타"]);
        let number = prop(json!({"type": "number", "number": 3}));
        assert_eq!(categories(Some(&number)), vec!["기타"]);
    }
}
