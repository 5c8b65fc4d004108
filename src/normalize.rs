//! Per-source result wrapping.
//!
//! [`wrap`] is the only place where an item learns which source it came
//! from; after it runs every item carries `publisher` and `publisherId`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::ResourceSummary;
use crate::source::Source;

/// Sources describe age in years of life; callers expect school years.
const AGE_TO_SCHOOL_YEAR: u32 = 5;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// What one source answered, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawSourceResult {
    pub resources: Vec<ResourceSummary>,
    /// Value of the `X-Total-Count` header, 0 when missing.
    pub declared_total: u64,
}

/// One source's items tagged with the source identity.
///
/// A failed source still yields one of these, empty with a total of 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    pub source_id: String,
    pub source_name: String,
    pub total_elements: u64,
    pub items: Vec<ResourceSummary>,
}

impl NormalizedResult {
    pub fn empty(source: &Source) -> Self {
        wrap(source, RawSourceResult::default())
    }
}

pub fn wrap(source: &Source, raw: RawSourceResult) -> NormalizedResult {
    let items = raw
        .resources
        .into_iter()
        .map(|item| stamp(source, item))
        .collect();

    NormalizedResult {
        source_id: source.id.clone(),
        source_name: source.display_name.clone(),
        total_elements: raw.declared_total,
        items,
    }
}

/// Overwrite the publisher fields and convert the age range of one item.
pub fn stamp(source: &Source, mut item: ResourceSummary) -> ResourceSummary {
    item.publisher = Some(source.display_name.clone());
    item.publisher_id = Some(source.id.clone());
    item.typical_age_range = item.typical_age_range.as_deref().map(school_years);
    item
}

/// `"11-12"` becomes `"6-7"`. Non-numeric text is kept as is.
fn school_years(age_range: &str) -> String {
    NUMBER
        .replace_all(age_range, |caps: &regex::Captures<'_>| {
            match caps[0].parse::<u32>() {
                Ok(age) => age.saturating_sub(AGE_TO_SCHOOL_YEAR).to_string(),
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}
