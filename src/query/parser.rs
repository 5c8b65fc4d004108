//! Parser for rendered filter strings, the inverse of
//! [`encoder`](super::encoder).
//!
//! Used to check round-trips and to make logged filters readable. Values
//! never contain single quotes (the encoder rejects them), so a clause ends
//! at the first closing quote. Members of a `~` group never contain a comma
//! either, so splitting on it is exact.

use crate::error::{AggregatorError, Result};

use super::encoder::{AND, OR_DELIMITER};

/// One `key='value'` or `key~'a,b'` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub key: String,
    pub or_group: bool,
    pub values: Vec<String>,
}

/// Parse a percent-encoded `filters` token.
pub fn parse_encoded(encoded: &str) -> Result<Vec<Clause>> {
    let decoded = urlencoding::decode(encoded)
        .map_err(|e| AggregatorError::InvalidRequest(format!("filter is not UTF-8: {e}")))?;
    parse_filter(&decoded)
}

/// Parse a rendered (not encoded) filter string.
pub fn parse_filter(rendered: &str) -> Result<Vec<Clause>> {
    let mut clauses = Vec::new();
    let mut rest = rendered;

    while !rest.is_empty() {
        let op_at = rest
            .find(['=', '~'])
            .ok_or_else(|| malformed(rest, "missing operator"))?;
        let key = &rest[..op_at];
        let or_group = rest[op_at..].starts_with('~');

        let after_op = &rest[op_at + 1..];
        let body = after_op
            .strip_prefix('\'')
            .ok_or_else(|| malformed(rest, "value must be quoted"))?;
        let close = body
            .find('\'')
            .ok_or_else(|| malformed(rest, "unterminated value"))?;
        let value = &body[..close];

        let values = if or_group {
            value.split(OR_DELIMITER).map(String::from).collect()
        } else {
            vec![value.to_string()]
        };
        clauses.push(Clause {
            key: key.to_string(),
            or_group,
            values,
        });

        rest = &body[close + 1..];
        if !rest.is_empty() {
            rest = rest
                .strip_prefix(AND)
                .ok_or_else(|| malformed(rest, "clauses must be joined with AND"))?;
        }
    }

    Ok(clauses)
}

fn malformed(at: &str, reason: &str) -> AggregatorError {
    AggregatorError::InvalidRequest(format!("malformed filter near {at:?}: {reason}"))
}
