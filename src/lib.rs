//! lor-federation: federated search over several learning-object catalogs.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌────────────┐ sources ┌──────────────┐  filters  ┌────────────┐
//! │  source/   │ ──────► │ aggregator   │ ────────► │  query/    │
//! │ (registry) │         │ (service)    │ ◄──────── │ (encoder)  │
//! └────────────┘         └──────────────┘           └────────────┘
//!                          │         ▲
//!               search_all │         │ AggregatePage
//!                          ▼         │
//!                    ┌──────────┐  ┌──────────┐
//!                    │ client   │─►│  merge   │
//!                    │ (fan-out)│  │ (rank)   │
//!                    └──────────┘  └──────────┘
//!                          │ normalize::wrap
//! ```
//!
//! * **`model`**: vocabularies, the search request, paging and resource
//!   records.
//! * **`query`**: the upstream filter DSL: encoder and parser.
//! * **`source`**: the `Source` record and the `SourceRegistry` trait.
//! * **`client`**: concurrent HTTP calls with timeout, cancellation and
//!   failure isolation.
//! * **`normalize`**: tags each source's items with the source identity.
//! * **`merge`**: global ordering, local pagination and total counts.
//! * **`engagement`**: favorites/ratings seam used by detail lookups.
//! * **`filters`**: catalog of supported filter values.
//! * **`aggregator`**: wires everything into the public operations.
//! * **`config`** / **`error`**: configuration layers and error taxonomy.

pub mod aggregator;
pub mod client;
pub mod config;
pub mod engagement;
pub mod error;
pub mod filters;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod query;
pub mod source;

pub use aggregator::Aggregator;
pub use client::{CatalogClient, ClientSettings};
pub use config::{Config, SourceConfig};
pub use engagement::{EngagementStore, InMemoryEngagement, RatingVotes};
pub use error::{AggregatorError, Result};
pub use filters::FilterCatalog;
pub use merge::{AggregatePage, MergeOrder};
pub use model::{ItemKey, PageSpec, ResourceDetails, ResourceSummary, SearchRequest, SortKey};
pub use normalize::{NormalizedResult, RawSourceResult};
pub use source::{Source, SourceRegistry, StaticRegistry};
