//! Catalog source abstraction layer.
//!
//! This module defines the [`Source`] record and the [`SourceRegistry`]
//! trait that supplies the active sources to the aggregator. Concrete
//! registries live in sub-modules (currently only the config-backed
//! [`StaticRegistry`]).
//!
//! ## For contributors: adding a new registry
//!
//! 1. Create a new file in this directory (e.g. `database.rs`).
//! 2. Define a struct and implement [`SourceRegistry`] for it.
//! 3. Add `mod database;` below and re-export your struct.
//! 4. Hand an instance to [`Aggregator::new`](crate::Aggregator::new).
//!
//! The fan-out, merge and detail lookups never look past this trait.

mod registry;

pub use registry::StaticRegistry;

use serde::Serialize;

use crate::model::ProviderType;

/// One external publisher catalog.
///
/// Sources are immutable for the duration of an aggregation call; the
/// registry hands out clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Stable identifier, also written into every item's `publisherId`.
    pub id: String,
    /// Human-readable name, written into every item's `publisher`.
    pub display_name: String,
    /// Base URL the configured search path is appended to.
    pub search_base_url: String,
    /// Base URL the configured details path is appended to.
    pub details_base_url: String,
    /// Filter dialect spoken by this source.
    pub provider_type: ProviderType,
}

impl Source {
    /// Create a source whose details live under the search base URL.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        search_base_url: impl Into<String>,
    ) -> Self {
        let search_base_url = search_base_url.into();
        Self {
            id: id.into(),
            display_name: display_name.into(),
            details_base_url: search_base_url.clone(),
            search_base_url,
            provider_type: ProviderType::Default,
        }
    }

    pub fn with_details_base_url(mut self, url: impl Into<String>) -> Self {
        self.details_base_url = url.into();
        self
    }

    pub fn with_provider_type(mut self, provider_type: ProviderType) -> Self {
        self.provider_type = provider_type;
        self
    }
}

/// Supplier of catalog sources.
///
/// Implementations must be [`Send`] + [`Sync`]: one registry is shared by
/// every concurrent aggregation call.
///
/// ## Implementing a new registry
///
/// ```ignore
/// pub struct MyRegistry { /* connection pool, cache, ... */ }
///
/// impl SourceRegistry for MyRegistry {
///     fn active_sources(&self) -> Vec<Source> { todo!() }
///     fn source(&self, id: &str) -> Option<Source> { todo!() }
/// }
/// ```
pub trait SourceRegistry: Send + Sync {
    /// All sources currently enabled for fan-out, in a stable order.
    fn active_sources(&self) -> Vec<Source>;

    /// Look up one source by id, active or not.
    fn source(&self, id: &str) -> Option<Source>;

    /// Look up several sources by id. Unknown ids are skipped.
    fn sources(&self, ids: &[&str]) -> Vec<Source> {
        ids.iter().filter_map(|id| self.source(id)).collect()
    }
}
