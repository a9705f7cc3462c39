use serde::Deserialize;

/// A property value as Notion reports it, discriminated by its `type` tag.
///
/// Every accessor below is total: asking a value for something its kind
/// does not carry yields an empty result rather than an error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        title: Vec<RichTextItem>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichTextItem>,
    },
    Select {
        select: Option<SelectOption>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<SelectOption>,
    },
    Status {
        status: Option<SelectOption>,
    },
    Date {
        date: Option<DateValue>,
    },
    Checkbox {
        #[serde(default)]
        checkbox: bool,
    },
    Url {
        url: Option<String>,
    },
    Files {
        #[serde(default)]
        files: Vec<FileObject>,
    },
    People {
        #[serde(default)]
        people: Vec<Person>,
    },
    Formula {
        formula: FormulaResult,
    },
    Number {
        number: Option<f64>,
    },
    /// A property type this pipeline does not read, or a payload that did
    /// not match its declared type.
    #[serde(other)]
    Unsupported,
}

/// The `type` tag of a property, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Title,
    RichText,
    Select,
    MultiSelect,
    Status,
    Date,
    Checkbox,
    Url,
    Files,
    People,
    Formula,
    Number,
    Unsupported,
}

impl PropertyValue {
    /// Decodes one property, degrading to `Unsupported` instead of failing.
    pub fn from_json(value: serde_json::Value) -> Self {
        match serde_json::from_value(value) {
            Ok(property) => property,
            Err(e) => {
                log::debug!("Property payload not understood, ignoring it: {}", e);
                PropertyValue::Unsupported
            }
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Title { .. } => PropertyKind::Title,
            PropertyValue::RichText { .. } => PropertyKind::RichText,
            PropertyValue::Select { .. } => PropertyKind::Select,
            PropertyValue::MultiSelect { .. } => PropertyKind::MultiSelect,
            PropertyValue::Status { .. } => PropertyKind::Status,
            PropertyValue::Date { .. } => PropertyKind::Date,
            PropertyValue::Checkbox { .. } => PropertyKind::Checkbox,
            PropertyValue::Url { .. } => PropertyKind::Url,
            PropertyValue::Files { .. } => PropertyKind::Files,
            PropertyValue::People { .. } => PropertyKind::People,
            PropertyValue::Formula { .. } => PropertyKind::Formula,
            PropertyValue::Number { .. } => PropertyKind::Number,
            PropertyValue::Unsupported => PropertyKind::Unsupported,
        }
    }

    /// Concatenated plain text of a title or rich_text value, trimmed.
    pub fn plain_text(&self) -> String {
        let tokens = match self {
            PropertyValue::Title { title } => title,
            PropertyValue::RichText { rich_text } => rich_text,
            _ => return String::new(),
        };
        tokens
            .iter()
            .map(|t| t.plain_text.as_str())
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Non-empty option names of a select or multi_select value.
    pub fn option_names(&self) -> Vec<String> {
        match self {
            PropertyValue::Select { select } | PropertyValue::Status { status: select } => select
                .iter()
                .map(|o| o.name.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
            PropertyValue::MultiSelect { multi_select } => multi_select
                .iter()
                .map(|o| o.name.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Name of the selected option of a select or status value.
    pub fn selected_name(&self) -> Option<&str> {
        match self {
            PropertyValue::Select { select: Some(o) }
            | PropertyValue::Status { status: Some(o) } => Some(o.name.as_str()),
            _ => None,
        }
    }

    pub fn date(&self) -> Option<&DateValue> {
        match self {
            PropertyValue::Date { date } => date.as_ref(),
            _ => None,
        }
    }

    pub fn checkbox(&self) -> bool {
        matches!(self, PropertyValue::Checkbox { checkbox: true })
    }

    /// Finite number of a number value.
    pub fn number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number { number: Some(n) } if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Non-empty, trimmed URL of a url value.
    pub fn url(&self) -> Option<String> {
        match self {
            PropertyValue::Url { url: Some(u) } if !u.trim().is_empty() => {
                Some(u.trim().to_string())
            }
            _ => None,
        }
    }

    /// A link stored either as a url value or as rich_text.
    pub fn link(&self) -> Option<String> {
        match self {
            PropertyValue::Url { .. } => self.url(),
            PropertyValue::RichText { .. } => Some(self.plain_text()).filter(|s| !s.is_empty()),
            _ => None,
        }
    }

    /// URLs of every file in a files value, in order.
    pub fn file_urls(&self) -> Vec<String> {
        match self {
            PropertyValue::Files { files } => files.iter().filter_map(FileObject::url).collect(),
            _ => Vec::new(),
        }
    }

    /// URL of the first file of a files value.
    pub fn first_file_url(&self) -> Option<String> {
        match self {
            PropertyValue::Files { files } => files.first().and_then(FileObject::url),
            _ => None,
        }
    }

    /// Display names of a people value, unnamed people skipped.
    pub fn people_names(&self) -> Vec<String> {
        match self {
            PropertyValue::People { people } => people
                .iter()
                .filter_map(|p| p.name.as_deref())
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// One token of rich text; only the rendered plain text matters here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RichTextItem {
    #[serde(default)]
    pub plain_text: String,
}

/// Select, multi_select and status option.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub name: String,
}

/// Date value; both ends kept as the raw strings Notion sent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DateValue {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Person {
    pub name: Option<String>,
}

/// Formula result types
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaResult {
    String { string: Option<String> },
    Number { number: Option<f64> },
    Boolean { boolean: Option<bool> },
    Date { date: Option<DateValue> },
    #[serde(other)]
    Unsupported,
}

/// A file reference: uploaded to Notion, or linked from elsewhere.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileObject {
    File { file: FileLocation },
    External { external: FileLocation },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileLocation {
    #[serde(default)]
    pub url: String,
}

impl FileObject {
    pub fn url(&self) -> Option<String> {
        let location = match self {
            FileObject::File { file } => file,
            FileObject::External { external } => external,
            FileObject::Unsupported => return None,
        };
        Some(location.url.trim().to_string()).filter(|u| !u.is_empty())
    }
}
