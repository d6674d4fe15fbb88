use std::collections::BTreeMap;

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::LoadError;
use crate::language::{create_lang_data, LangData};

/// Schema of a book's `meta.json`. Every field is optional; the default used
/// when a field is missing or has an unexpected type is noted on it. Unknown
/// fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetaJson {
    /// Default: empty.
    #[serde(deserialize_with = "lenient")]
    pub title: String,
    /// Default: none.
    #[serde(rename = "bookInstanceId", deserialize_with = "lenient")]
    pub book_instance_id: Option<String>,
    /// Default: none.
    #[serde(rename = "brandingProjectName", deserialize_with = "lenient")]
    pub branding_project_name: Option<String>,
    /// Default: none.
    #[serde(deserialize_with = "lenient")]
    pub publisher: Option<String>,
    /// Default: none.
    #[serde(rename = "originalPublisher", deserialize_with = "lenient")]
    pub original_publisher: Option<String>,
    /// Default: no features.
    #[serde(deserialize_with = "lenient")]
    pub features: Vec<String>,
    /// Default: no bookshelves.
    #[serde(deserialize_with = "lenient")]
    pub bookshelves: Vec<String>,
    /// Default: 0.
    #[serde(rename = "pageCount", deserialize_with = "lenient")]
    pub page_count: u32,
    /// Language code to display name, in the book's order. Default: empty.
    #[serde(rename = "language-display-names", deserialize_with = "object_or_encoded")]
    pub language_display_names: Map<String, Value>,
    /// Title per language code. Also accepted as a JSON-encoded string.
    /// Default: empty.
    #[serde(rename = "allTitles", deserialize_with = "object_or_encoded")]
    pub all_titles: Map<String, Value>,
}

/// Reads a field that only feeds display or analytics. A value of the wrong
/// type is logged and replaced by the default instead of failing the book.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("Ignoring meta.json field with unexpected type: {e}");
        T::default()
    }))
}

/// Reads an object that may also arrive as a string holding JSON.
fn object_or_encoded<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Value::deserialize(deserializer)? {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::Null),
        other => other,
    };
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => {
            warn!("Ignoring meta.json field, expected an object: {other}");
            Ok(Map::new())
        }
    }
}

impl MetaJson {
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        // Some servers hand back a byte-order mark.
        let text = text.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(text)
            .map_err(|e| LoadError::transform(format!("meta.json is malformed: {e}")))
    }

    pub fn language_names(&self) -> Vec<(String, String)> {
        self.language_display_names
            .iter()
            .map(|(code, name)| {
                let name = name.as_str().unwrap_or_default().to_string();
                (code.clone(), name)
            })
            .collect()
    }
}

/// Book-level facts gathered from the fetch, the markup scan and `meta.json`.
#[derive(Debug, Clone, Default)]
pub struct BookMetadata {
    pub title: String,
    pub can_rotate: bool,
    pub numbered_page_count: usize,
    pub question_page_count: usize,
    pub l1: Option<String>,
    pub l2: Option<String>,
    pub l3: Option<String>,
    pub languages: Vec<LangData>,
    pub features: Vec<String>,
    /// Properties attached to every analytics report.
    pub analytics: BTreeMap<String, Value>,
}

/// Facts that come from scanning the markup.
#[derive(Debug, Clone, Default)]
pub struct MarkupFacts {
    pub can_rotate: bool,
    pub l1: Option<String>,
    pub l2: Option<String>,
    pub l3: Option<String>,
    pub numbered_page_count: usize,
    pub question_page_count: usize,
}

impl BookMetadata {
    pub fn build(facts: MarkupFacts, meta: &MetaJson) -> Self {
        let mut names = meta.language_names();
        // Books made before the display-name table existed only tell us L1.
        if names.is_empty() {
            if let Some(l1) = &facts.l1 {
                names.push((l1.clone(), l1.clone()));
            }
        }
        let languages = create_lang_data(&names, facts.l1.as_deref());

        let title = facts
            .l1
            .as_ref()
            .and_then(|l1| meta.all_titles.get(l1))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| meta.title.clone());

        let mut metadata = Self {
            title,
            can_rotate: facts.can_rotate,
            numbered_page_count: facts.numbered_page_count,
            question_page_count: facts.question_page_count,
            l1: facts.l1,
            l2: facts.l2,
            l3: facts.l3,
            languages,
            features: meta.features.clone(),
            analytics: BTreeMap::new(),
        };
        metadata.analytics = metadata.analytics_properties(meta);
        metadata
    }

    fn analytics_properties(&self, meta: &MetaJson) -> BTreeMap<String, Value> {
        let mut props = BTreeMap::new();
        props.insert("title".to_string(), Value::from(meta.title.clone()));
        props.insert("features".to_string(), Value::from(self.features.join(",")));
        let optional = [
            ("bookInstanceId", &meta.book_instance_id),
            ("brandingProjectName", &meta.branding_project_name),
            ("publisher", &meta.publisher),
            ("originalPublisher", &meta.original_publisher),
            ("contentLang", &self.l1),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                props.insert(key.to_string(), Value::from(value.clone()));
            }
        }
        if !meta.bookshelves.is_empty() {
            props.insert(
                "bookshelves".to_string(),
                Value::from(meta.bookshelves.join(",")),
            );
        }
        props
    }
}
