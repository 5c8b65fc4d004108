//! Filter-query DSL spoken by upstream sources.
//!
//! [`encoder`] turns a [`SearchRequest`](crate::model::SearchRequest) into
//! the `filters` query parameter; [`parser`] reads one back.

pub mod encoder;
pub mod parser;

pub use encoder::{encode_filter, render_filter};
pub use parser::{parse_encoded, parse_filter, Clause};
