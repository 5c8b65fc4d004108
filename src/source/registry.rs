//! Config-backed, refreshable source registry.

use parking_lot::RwLock;
use tracing::info;

use super::{Source, SourceRegistry};
use crate::config::Config;
use crate::model::ProviderType;

#[derive(Debug, Clone)]
struct Entry {
    source: Source,
    active: bool,
}

/// In-memory registry, loaded from [`Config`] and replaceable at runtime.
///
/// Readers take a shared lock only long enough to clone the list, so a
/// refresh never blocks an in-flight fan-out.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    entries: RwLock<Vec<Entry>>,
}

impl StaticRegistry {
    /// Registry in which every given source is active.
    pub fn new(sources: impl IntoIterator<Item = Source>) -> Self {
        let registry = Self::default();
        registry.replace(sources.into_iter().map(|source| (source, true)));
        registry
    }

    pub fn from_config(config: &Config) -> Self {
        let registry = Self::default();
        registry.replace(config.sources.iter().map(|entry| {
            let provider_type = match &config.duf_provider_name {
                Some(duf) if *duf == entry.name => ProviderType::Duf,
                _ => ProviderType::Default,
            };
            let source = Source::new(&entry.id, &entry.name, &entry.search_url)
                .with_details_base_url(entry.details_url.as_deref().unwrap_or(&entry.search_url))
                .with_provider_type(provider_type);
            (source, entry.active)
        }));
        registry
    }

    /// Swap in a new source list. Active sources are kept ordered by name.
    pub fn replace(&self, sources: impl IntoIterator<Item = (Source, bool)>) {
        let mut entries: Vec<Entry> = sources
            .into_iter()
            .map(|(source, active)| Entry { source, active })
            .collect();
        entries.sort_by(|a, b| a.source.display_name.cmp(&b.source.display_name));

        let active = entries.iter().filter(|e| e.active).count();
        info!(total = entries.len(), active, "source registry loaded");
        *self.entries.write() = entries;
    }

    /// Enable or disable one source. Returns `false` for unknown ids.
    pub fn set_active(&self, id: &str, active: bool) -> bool {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.source.id == id) {
            Some(entry) => {
                entry.active = active;
                true
            }
            None => false,
        }
    }
}

impl SourceRegistry for StaticRegistry {
    fn active_sources(&self) -> Vec<Source> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.active)
            .map(|e| e.source.clone())
            .collect()
    }

    fn source(&self, id: &str) -> Option<Source> {
        self.entries
            .read()
            .iter()
            .find(|e| e.source.id == id)
            .map(|e| e.source.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
