//! Remote record model: the loosely typed rows a Notion database query returns.
//!
//! Records are read-only to the pipeline. Mappers in `feeds` turn them into
//! normalized feed records using the total accessors defined here and in
//! [`extract`].

pub mod extract;
mod property_value;

pub use property_value::{
    DateValue, FileLocation, FileObject, FormulaResult, Person, PropertyKind, PropertyValue,
    RichTextItem, SelectOption,
};

use crate::types::{PropertyName, RecordId};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// One row of a Notion database.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteRecord {
    pub id: RecordId,
    #[serde(default)]
    pub created_time: String,
    /// Properties in the order Notion listed them; first-of-kind scans rely on it.
    #[serde(default, deserialize_with = "deserialize_properties")]
    pub properties: IndexMap<PropertyName, PropertyValue>,
    #[serde(default, deserialize_with = "deserialize_cover")]
    pub cover: Option<FileObject>,
}

impl RemoteRecord {
    /// Looks up a property by its exact name.
    pub fn property(&self, name: &PropertyName) -> Option<&PropertyValue> {
        self.properties.get(name.as_str())
    }

    /// The first property of the given kind anywhere in the record.
    pub fn first_of_kind(&self, kind: PropertyKind) -> Option<&PropertyValue> {
        self.properties.values().find(|p| p.kind() == kind)
    }

    /// Plain text of a named title/rich_text property; empty when absent.
    pub fn text(&self, name: &PropertyName) -> String {
        self.property(name)
            .map(PropertyValue::plain_text)
            .unwrap_or_default()
    }

    /// Text of the first title property, which every Notion database has exactly one of.
    pub fn title_text(&self) -> String {
        self.first_of_kind(PropertyKind::Title)
            .map(PropertyValue::plain_text)
            .unwrap_or_default()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        extract::parse_instant(&self.created_time)
    }

    pub fn cover_url(&self) -> Option<String> {
        self.cover.as_ref().and_then(FileObject::url)
    }
}

fn deserialize_properties<'de, D>(
    deserializer: D,
) -> Result<IndexMap<PropertyName, PropertyValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| (PropertyName::new(name), PropertyValue::from_json(value)))
        .collect())
}

fn deserialize_cover<'de, D>(deserializer: D) -> Result<Option<FileObject>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}
