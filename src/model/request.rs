//! Inbound request types: the structured filter plus paging and sort order.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::vocab::{
    FederalState, Grade, LearningResourceType, MediaType, Rating, SchoolBook, SchoolType,
    StudyYear, Subject,
};
use crate::error::{AggregatorError, Result};

/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Structured search filter.
///
/// Every field is optional; unset fields and empty collections never reach
/// the encoded filter. Collection fields keep the caller's insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    /// Free-text term, matched upstream against name, subject and
    /// description.
    pub search: Option<String>,
    pub subject: Vec<Subject>,
    pub id: Vec<String>,
    pub learning_resource_type: Option<LearningResourceType>,
    pub language: Option<String>,
    pub school_type: Option<SchoolType>,
    pub typical_age_range: Option<StudyYear>,
    pub text_complexity: Option<String>,
    pub learning_objectives: LearningObjectiveFilter,
    pub author: Option<String>,
    /// Restricts the fan-out to the source with this id, and is forwarded
    /// upstream as a regular clause.
    pub publisher: Option<String>,
    pub time_required: Option<String>,
    pub technical_format: Vec<MediaType>,
    pub educational_audience: Option<String>,
    #[serde(rename = "accessibilityAPI")]
    pub accessibility_api: Option<String>,
    pub accessibility_input_methods: Option<String>,
    pub access_mode: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub rating: Option<Rating>,
    pub federal_states: Vec<FederalState>,
    pub school_book: Option<SchoolBook>,
    pub grade: Option<Grade>,
}

/// Learning-objective sub-filter, sent as `learningObject.*` clauses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearningObjectiveFilter {
    pub alignment_type: Option<String>,
    pub educational_framework: Option<String>,
    pub target_description: Option<String>,
    pub target_name: Option<String>,
    #[serde(rename = "targetURL")]
    pub target_url: Option<String>,
    #[serde(rename = "caseItemURI")]
    pub case_item_uri: Option<String>,
    #[serde(rename = "caseItemGUID")]
    pub case_item_guid: Option<String>,
}

impl SearchRequest {
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject.push(subject);
        self
    }

    pub fn with_technical_format(mut self, format: MediaType) -> Self {
        self.technical_format.push(format);
        self
    }

    pub fn with_publisher(mut self, source_id: impl Into<String>) -> Self {
        self.publisher = Some(source_id.into());
        self
    }
}

/// Externally requested order of the merged result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortKey {
    Alphabetic,
    MostViewed,
    Newest,
    Oldest,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::Alphabetic,
        SortKey::MostViewed,
        SortKey::Newest,
        SortKey::Oldest,
    ];

    /// Upstream `sort` parameter.
    pub fn property(self) -> &'static str {
        match self {
            Self::Alphabetic => "name",
            Self::MostViewed => "relevance",
            Self::Newest | Self::Oldest => "publishDate",
        }
    }

    /// Upstream `orderBy` parameter.
    pub fn direction(self) -> &'static str {
        match self {
            Self::Alphabetic | Self::Oldest => "asc",
            Self::MostViewed | Self::Newest => "desc",
        }
    }

    /// Resolve a `(property, direction)` pair as a web layer would receive
    /// it. Matching is case-insensitive.
    pub fn from_pair(property: &str, direction: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|key| {
                key.property().eq_ignore_ascii_case(property)
                    && key.direction().eq_ignore_ascii_case(direction)
            })
            .ok_or_else(|| {
                AggregatorError::InvalidRequest(format!(
                    "unsupported sort: {property},{direction}"
                ))
            })
    }

    fn code(self) -> &'static str {
        match self {
            Self::Alphabetic => "ALPHABETIC",
            Self::MostViewed => "MOST_VIEWED",
            Self::Newest => "NEWEST",
            Self::Oldest => "OLDEST",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Accepts either a code (`NEWEST`) or a `property,direction` pair
/// (`publishDate,desc`).
impl FromStr for SortKey {
    type Err = AggregatorError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some((property, direction)) = s.split_once(',') {
            return Self::from_pair(property.trim(), direction.trim());
        }
        Self::ALL
            .into_iter()
            .find(|key| key.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AggregatorError::InvalidRequest(format!("unsupported sort: {s}")))
    }
}

/// Page number, page size and optional sort key of an aggregate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpec {
    pub page_number: u32,
    pub page_size: u32,
    pub sort: Option<SortKey>,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

impl PageSpec {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
            sort: None,
        }
    }

    pub fn sorted(mut self, key: SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(AggregatorError::InvalidRequest(
                "page size must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Number of merged items skipped before the page starts.
    pub fn offset(&self) -> usize {
        self.page_number as usize * self.page_size as usize
    }

    /// `limit` sent to every source: everything from the first item through
    /// the end of the requested page.
    pub fn upstream_limit(&self) -> u64 {
        (u64::from(self.page_number) + 1) * u64::from(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_maps_to_upstream_pair() {
        assert_eq!(SortKey::Alphabetic.property(), "name");
        assert_eq!(SortKey::Alphabetic.direction(), "asc");
        assert_eq!(SortKey::MostViewed.property(), "relevance");
        assert_eq!(SortKey::MostViewed.direction(), "desc");
        assert_eq!(SortKey::Newest.direction(), "desc");
        assert_eq!(SortKey::Oldest.direction(), "asc");
    }

    #[test]
    fn sort_key_parses_codes_and_pairs() {
        assert_eq!("newest".parse::<SortKey>().unwrap(), SortKey::Newest);
        assert_eq!(
            "publishDate,ASC".parse::<SortKey>().unwrap(),
            SortKey::Oldest
        );
        assert_eq!(
            SortKey::from_pair("relevance", "desc").unwrap(),
            SortKey::MostViewed
        );
        assert!(matches!(
            SortKey::from_pair("relevance", "asc"),
            Err(AggregatorError::InvalidRequest(_))
        ));
        assert!("sideways".parse::<SortKey>().is_err());
    }

    #[test]
    fn upstream_limit_covers_all_pages_through_requested_one() {
        assert_eq!(PageSpec::new(0, 20).upstream_limit(), 20);
        assert_eq!(PageSpec::new(2, 20).upstream_limit(), 60);
        assert_eq!(PageSpec::new(2, 20).offset(), 40);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(PageSpec::new(0, 0).validate().is_err());
        assert!(PageSpec::default().validate().is_ok());
    }

    #[test]
    fn request_deserializes_from_camel_case_json() {
        let json = r#"{
            "search": "bruch",
            "subject": ["Mathematik"],
            "technicalFormat": ["Text/Book", "Media/Video"],
            "learningObjectives": {"targetName": "Brüche"},
            "publishDate": "2024-05-01"
        }"#;
        let req: SearchRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.search.as_deref(), Some("bruch"));
        assert_eq!(req.subject, vec![Subject::Mathematik]);
        assert_eq!(
            req.technical_format,
            vec![MediaType::TextBook, MediaType::MediaVideo]
        );
        assert_eq!(
            req.learning_objectives.target_name.as_deref(),
            Some("Brüche")
        );
        assert_eq!(req.publish_date, NaiveDate::from_ymd_opt(2024, 5, 1));
    }
}
