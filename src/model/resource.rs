//! Resource records as sources deliver them and as callers receive them.
//!
//! Upstream payloads are treated leniently. A vocabulary value this crate
//! does not know is dropped with a warning instead of failing the whole
//! result set, and `null` collections read as empty.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use super::vocab::{LearningResourceType, MediaType, Rating, SchoolType, Subject, Vocabulary};

/// One search hit, normalised across sources.
///
/// `id` is only unique within its source; see [`ItemKey`] for the global
/// identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "known_terms")]
    pub subject: Vec<Subject>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "known_terms")]
    pub learning_resource_type: Vec<LearningResourceType>,
    #[serde(default, deserialize_with = "nullable")]
    pub language: Vec<String>,
    #[serde(default)]
    pub typical_age_range: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub author: Vec<String>,
    /// Always overwritten with the source's display name.
    #[serde(default)]
    pub publisher: Option<String>,
    /// Always overwritten with the source id.
    #[serde(default)]
    pub publisher_id: Option<String>,
    #[serde(default, rename = "useRightsURL")]
    pub use_rights_url: Option<String>,
    #[serde(default)]
    pub time_required: Option<String>,
    #[serde(default, deserialize_with = "known_term")]
    pub technical_format: Option<MediaType>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub publish_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "known_term")]
    pub rating: Option<Rating>,
    /// Source-assigned relevance; higher is more relevant.
    #[serde(default)]
    pub relevance: Option<f32>,
    #[serde(default, deserialize_with = "known_terms")]
    pub school_type: Vec<SchoolType>,
    #[serde(default)]
    pub page_from: Option<String>,
    #[serde(default)]
    pub page_to: Option<String>,
}

impl ResourceSummary {
    pub fn key(&self) -> Option<ItemKey> {
        self.publisher_id
            .as_ref()
            .map(|source_id| ItemKey::new(source_id.clone(), self.id.clone()))
    }
}

/// Body of an upstream search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceSet {
    #[serde(default, deserialize_with = "nullable")]
    pub resources: Vec<ResourceSummary>,
}

/// A single resource plus caller-specific engagement flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDetails {
    #[serde(flatten)]
    pub summary: ResourceSummary,
    pub favorite: bool,
    pub rated: bool,
    pub total_ratings_count: u64,
    /// Mean of all votes with one decimal, e.g. `"4.5"`. Absent without
    /// votes.
    pub current_rating: Option<String>,
}

/// External identity of an item: the pair of source id and item id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemKey {
    pub source_id: String,
    pub item_id: String,
}

impl ItemKey {
    pub fn new(source_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            item_id: item_id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoders
// ---------------------------------------------------------------------------

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn known_terms<'de, D, V>(deserializer: D) -> Result<Vec<V>, D::Error>
where
    D: Deserializer<'de>,
    V: Vocabulary,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.iter().filter_map(term_from_value::<V>).collect())
}

fn known_term<'de, D, V>(deserializer: D) -> Result<Option<V>, D::Error>
where
    D: Deserializer<'de>,
    V: Vocabulary,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(term_from_value::<V>))
}

fn term_from_value<V: Vocabulary>(value: &Value) -> Option<V> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let term = V::from_label(&text);
    if term.is_none() {
        warn!(kind = V::KIND, value = %text, "dropping unsupported vocabulary value");
    }
    term
}

/// Accepts `"2024-01-31"`, a datetime string starting with a date, or a
/// `[2024, 1, 31]` triple.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let date = match &raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => s
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()),
        Some(Value::Array(parts)) => match parts.as_slice() {
            [y, m, d, ..] => match (y.as_i64(), m.as_u64(), d.as_u64()) {
                (Some(y), Some(m), Some(d)) => i32::try_from(y)
                    .ok()
                    .and_then(|y| NaiveDate::from_ymd_opt(y, m as u32, d as u32)),
                _ => None,
            },
            _ => None,
        },
        Some(_) => None,
    };
    if date.is_none() {
        if let Some(value) = raw.filter(|v| !v.is_null()) {
            warn!(value = %value, "ignoring unparseable publishDate");
        }
    }
    Ok(date)
}
