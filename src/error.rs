//! Error taxonomy for the aggregation core.
//!
//! Source-level failures ([`AggregatorError::SourceUnavailable`] and
//! [`AggregatorError::SourceBadResponse`]) are normally swallowed by the
//! fan-out client and only reach callers through single-item lookups.
//! Everything else is raised before any network call is made.

use thiserror::Error;

use crate::source::Source;

/// Crate-wide result alias.
pub type Result<T, E = AggregatorError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AggregatorError {
    /// Network error, timeout or error status from one source.
    #[error("source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// The source answered, but the payload could not be decoded.
    #[error("source {source_name} sent an unreadable response: {reason}")]
    SourceBadResponse { source_name: String, reason: String },

    /// A details lookup was answered with a 4xx status.
    #[error("resource {item_id} not found at source {source_id}")]
    ItemNotFound { source_id: String, item_id: String },

    /// A filter field could not be expressed in the upstream filter DSL.
    #[error("cannot encode filter field `{field}`: {reason}")]
    Encoding { field: &'static str, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error("invalid url for source {source_name}: {reason}")]
    InvalidSourceUrl { source_name: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl AggregatorError {
    pub(crate) fn unavailable(source: &Source, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_name: source.display_name.clone(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn bad_response(source: &Source, reason: impl ToString) -> Self {
        Self::SourceBadResponse {
            source_name: source.display_name.clone(),
            reason: reason.to_string(),
        }
    }

    /// True for failures that the fan-out client absorbs instead of
    /// propagating.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::SourceBadResponse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_failures_are_classified() {
        let unavailable = AggregatorError::SourceUnavailable {
            source_name: "a".into(),
            reason: "timeout".into(),
        };
        let bad = AggregatorError::SourceBadResponse {
            source_name: "a".into(),
            reason: "eof".into(),
        };
        let not_found = AggregatorError::ItemNotFound {
            source_id: "1".into(),
            item_id: "x".into(),
        };

        assert!(unavailable.is_source_failure());
        assert!(bad.is_source_failure());
        assert!(!not_found.is_source_failure());
        assert!(!AggregatorError::InvalidRequest("x".into()).is_source_failure());
    }

    #[test]
    fn messages_name_the_offender() {
        let err = AggregatorError::Encoding {
            field: "author",
            reason: "contains a quote".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot encode filter field `author`: contains a quote"
        );
    }
}
