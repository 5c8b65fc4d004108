//! Filter-query encoder.
//!
//! A [`SearchRequest`] becomes a single `filters` token such as
//!
//! ```text
//! subject='Mathematik' AND technicalFormat~'Text/Book,Media/Video'
//! ```
//!
//! percent-encoded for the query string. Fields are enumerated through the
//! static [`FIELDS`] table in declaration order, so clause order is stable.
//! Fields flagged as OR-group render several values disjunctively inside
//! one `~` clause; a single value, and every other field, renders as
//! `key='value'`.
//!
//! Values containing `'` cannot be quoted, and values containing `,` cannot
//! share an OR-group with other values. Both are rejected with
//! [`AggregatorError::Encoding`] before anything is sent.

use tracing::debug;

use crate::error::{AggregatorError, Result};
use crate::model::{ProviderType, SearchRequest, Vocabulary};

/// Separator between clauses.
pub const AND: &str = " AND ";
/// Separator between the values of an OR-group clause.
pub const OR_DELIMITER: char = ',';

/// How one request field is rendered.
pub struct FieldRule {
    pub key: &'static str,
    /// Render several values inside one `key~'a,b'` clause.
    pub or_group: bool,
    render: fn(&SearchRequest, ProviderType) -> Vec<String>,
}

impl FieldRule {
    const fn single(
        key: &'static str,
        render: fn(&SearchRequest, ProviderType) -> Vec<String>,
    ) -> Self {
        Self {
            key,
            or_group: false,
            render,
        }
    }

    const fn any_of(
        key: &'static str,
        render: fn(&SearchRequest, ProviderType) -> Vec<String>,
    ) -> Self {
        Self {
            key,
            or_group: true,
            render,
        }
    }

    fn values(&self, request: &SearchRequest, provider: ProviderType) -> Vec<String> {
        (self.render)(request, provider)
    }
}

/// Every filterable field, in the order clauses are emitted.
pub static FIELDS: &[FieldRule] = &[
    FieldRule::single("search", |r, _| {
        r.search.as_deref().and_then(search_terms).into_iter().collect()
    }),
    // DUF sources match free text against `name` only.
    FieldRule::single("name", |r, p| match p {
        ProviderType::Duf => r.search.as_deref().and_then(search_terms).into_iter().collect(),
        ProviderType::Default => Vec::new(),
    }),
    FieldRule::any_of("subject", |r, _| labels(&r.subject)),
    FieldRule::any_of("id", |r, _| texts(&r.id)),
    FieldRule::single("learningResourceType", |r, p| {
        r.learning_resource_type
            .map(|t| match p {
                ProviderType::Duf => t.duf_label(),
                ProviderType::Default => t.label(),
            })
            .map(String::from)
            .into_iter()
            .collect()
    }),
    FieldRule::single("language", |r, _| text(&r.language)),
    FieldRule::single("schoolType", |r, p| {
        r.school_type
            .map(|t| match p {
                ProviderType::Duf => t.duf_label(),
                ProviderType::Default => t.label(),
            })
            .map(String::from)
            .into_iter()
            .collect()
    }),
    FieldRule::single("typicalAgeRange", |r, _| label(r.typical_age_range)),
    FieldRule::single("textComplexity", |r, _| text(&r.text_complexity)),
    FieldRule::single("learningObject.alignmentType", |r, _| {
        text(&r.learning_objectives.alignment_type)
    }),
    FieldRule::single("learningObject.educationalFramework", |r, _| {
        text(&r.learning_objectives.educational_framework)
    }),
    FieldRule::single("learningObject.targetDescription", |r, _| {
        text(&r.learning_objectives.target_description)
    }),
    FieldRule::single("learningObject.targetName", |r, _| {
        text(&r.learning_objectives.target_name)
    }),
    FieldRule::single("learningObject.targetURL", |r, _| {
        text(&r.learning_objectives.target_url)
    }),
    FieldRule::single("learningObject.caseItemURI", |r, _| {
        text(&r.learning_objectives.case_item_uri)
    }),
    FieldRule::single("learningObject.caseItemGUID", |r, _| {
        text(&r.learning_objectives.case_item_guid)
    }),
    FieldRule::single("author", |r, _| text(&r.author)),
    FieldRule::single("publisher", |r, _| text(&r.publisher)),
    FieldRule::single("timeRequired", |r, _| text(&r.time_required)),
    FieldRule::any_of("technicalFormat", |r, _| labels(&r.technical_format)),
    FieldRule::single("educationalAudience", |r, _| text(&r.educational_audience)),
    FieldRule::single("accessibilityAPI", |r, _| text(&r.accessibility_api)),
    FieldRule::single("accessibilityInputMethods", |r, _| {
        text(&r.accessibility_input_methods)
    }),
    FieldRule::single("accessMode", |r, _| text(&r.access_mode)),
    FieldRule::single("publishDate", |r, _| {
        r.publish_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .into_iter()
            .collect()
    }),
    FieldRule::single("rating", |r, _| label(r.rating)),
    FieldRule::any_of("federalStates", |r, _| labels(&r.federal_states)),
    FieldRule::single("schoolBook", |r, _| label(r.school_book)),
    FieldRule::single("grade", |r, _| label(r.grade)),
];

/// Render the filter for `provider` without percent-encoding.
///
/// An empty request renders as an empty string.
pub fn render_filter(request: &SearchRequest, provider: ProviderType) -> Result<String> {
    let mut clauses = Vec::new();

    for field in FIELDS {
        let values = field.values(request, provider);
        if values.is_empty() {
            continue;
        }
        if let Some(bad) = values.iter().find(|v| v.contains('\'')) {
            return Err(AggregatorError::Encoding {
                field: field.key,
                reason: format!("value {bad:?} contains a single quote"),
            });
        }

        // Upstream treats `key~'v'` and `key='v'` alike for one value.
        let clause = if field.or_group && values.len() > 1 {
            if let Some(bad) = values.iter().find(|v| v.contains(OR_DELIMITER)) {
                return Err(AggregatorError::Encoding {
                    field: field.key,
                    reason: format!("value {bad:?} contains {OR_DELIMITER:?} inside an OR-group"),
                });
            }
            format!("{}~'{}'", field.key, values.join(&OR_DELIMITER.to_string()))
        } else {
            // Non-group fields render exactly one value.
            format!("{}='{}'", field.key, values[0])
        };
        clauses.push(clause);
    }

    Ok(clauses.join(AND))
}

/// Render and percent-encode (UTF-8, RFC 3986 unreserved set) the filter.
pub fn encode_filter(request: &SearchRequest, provider: ProviderType) -> Result<String> {
    let rendered = render_filter(request, provider)?;
    let encoded = urlencoding::encode(&rendered).into_owned();
    debug!(filter = %rendered, encoded = %encoded, ?provider, "encoded filter");
    Ok(encoded)
}

/// Normalise the free-text term.
///
/// A value wrapped in double quotes is treated as a list of quoted phrases;
/// anything else is split on whitespace. Terms are comma-joined either way.
fn search_terms(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let terms: Vec<&str> = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"')
    {
        trimmed
            .split('"')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    } else {
        trimmed.split_whitespace().collect()
    };

    (!terms.is_empty()).then(|| terms.join(","))
}

fn text(value: &Option<String>) -> Vec<String> {
    value
        .iter()
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .collect()
}

fn texts(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !value.trim().is_empty() && !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}

fn label<V: Vocabulary>(value: Option<V>) -> Vec<String> {
    value.map(|v| v.label().to_string()).into_iter().collect()
}

fn labels<V: Vocabulary>(values: &[V]) -> Vec<String> {
    let mut seen: Vec<V> = Vec::with_capacity(values.len());
    for value in values {
        if !seen.contains(value) {
            seen.push(*value);
        }
    }
    seen.into_iter().map(|v| v.label().to_string()).collect()
}
