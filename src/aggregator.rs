//! The aggregation service.
//!
//! [`Aggregator`] wires the pieces together:
//!
//! ```text
//! SearchRequest + PageSpec
//!        │
//!        ▼
//! SourceRegistry ──► one query per source ──► CatalogClient::search_all
//!                                                    │
//!                                                    ▼
//!                        AggregatePage ◄── merge ◄── NormalizedResult per source
//! ```
//!
//! Every operation has a `_with_cancel` twin that takes a
//! [`CancellationToken`]; the plain versions never cancel.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::CatalogClient;
use crate::engagement::EngagementStore;
use crate::error::{AggregatorError, Result};
use crate::filters::FilterCatalog;
use crate::merge::{merge, AggregatePage, MergeOrder};
use crate::model::{ItemKey, PageSpec, ResourceDetails, SearchRequest};
use crate::source::{Source, SourceRegistry};

pub struct Aggregator {
    registry: Arc<dyn SourceRegistry>,
    client: CatalogClient,
    engagement: Arc<dyn EngagementStore>,
}

impl Aggregator {
    pub fn new(
        registry: Arc<dyn SourceRegistry>,
        client: CatalogClient,
        engagement: Arc<dyn EngagementStore>,
    ) -> Self {
        Self {
            registry,
            client,
            engagement,
        }
    }

    // -- free search ---------------------------------------------------------

    /// Search every active source and return one merged page.
    pub async fn search(&self, request: &SearchRequest, page: &PageSpec) -> Result<AggregatePage> {
        self.search_with_cancel(request, page, &CancellationToken::new())
            .await
    }

    pub async fn search_with_cancel(
        &self,
        request: &SearchRequest,
        page: &PageSpec,
        cancel: &CancellationToken,
    ) -> Result<AggregatePage> {
        page.validate()?;

        let sources = self.fanout_sources(request);
        if sources.is_empty() {
            info!(publisher = ?request.publisher, "no active source to search");
            return Ok(AggregatePage::empty(page));
        }

        let queries: Vec<_> = sources
            .into_iter()
            .map(|source| (source, request.clone()))
            .collect();
        let results = self.client.search_all(&queries, page, cancel).await?;
        let merged = merge(results, page, &MergeOrder::External);

        info!(
            sources = queries.len(),
            items = merged.items.len(),
            total = merged.total_elements,
            "aggregate search finished"
        );
        Ok(merged)
    }

    /// Active sources, narrowed to the requested publisher if one is set.
    fn fanout_sources(&self, request: &SearchRequest) -> Vec<Source> {
        let active = self.registry.active_sources();
        match request.publisher.as_deref().map(str::trim) {
            Some(publisher) if !publisher.is_empty() => active
                .into_iter()
                .filter(|source| source.id == publisher)
                .collect(),
            _ => active,
        }
    }

    // -- id search -----------------------------------------------------------

    /// Fetch the given items from their sources, for favorites and history
    /// lists.
    ///
    /// `keys` is already one page of the caller's store, so sources are
    /// queried from the start and no items are skipped locally; the page
    /// number is only echoed back. `base` supplies extra filters; its `id`
    /// field is replaced per source.
    pub async fn search_by_ids(
        &self,
        keys: &[ItemKey],
        base: &SearchRequest,
        page: &PageSpec,
        order: MergeOrder,
    ) -> Result<AggregatePage> {
        self.search_by_ids_with_cancel(keys, base, page, order, &CancellationToken::new())
            .await
    }

    pub async fn search_by_ids_with_cancel(
        &self,
        keys: &[ItemKey],
        base: &SearchRequest,
        page: &PageSpec,
        order: MergeOrder,
        cancel: &CancellationToken,
    ) -> Result<AggregatePage> {
        page.validate()?;
        if let Some(blank) = keys
            .iter()
            .find(|k| k.source_id.trim().is_empty() || k.item_id.trim().is_empty())
        {
            return Err(AggregatorError::InvalidRequest(format!(
                "blank id in item key {blank:?}"
            )));
        }

        let queries = self.id_queries(keys, base);
        if queries.is_empty() {
            debug!(keys = keys.len(), "no known source among item keys");
            return Ok(AggregatePage::empty(page));
        }

        let upstream = PageSpec {
            page_number: 0,
            ..*page
        };
        let results = self.client.search_all(&queries, &upstream, cancel).await?;
        let mut merged = merge(results, &upstream, &order);
        merged.page_number = page.page_number;
        Ok(merged)
    }

    /// One request per known source, in first-seen order.
    fn id_queries(&self, keys: &[ItemKey], base: &SearchRequest) -> Vec<(Source, SearchRequest)> {
        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for key in keys {
            match grouped.iter_mut().find(|(id, _)| *id == key.source_id) {
                Some((_, items)) => items.push(key.item_id.clone()),
                None => grouped.push((key.source_id.clone(), vec![key.item_id.clone()])),
            }
        }

        grouped
            .into_iter()
            .filter_map(|(source_id, item_ids)| match self.registry.source(&source_id) {
                Some(source) => {
                    let request = SearchRequest {
                        id: item_ids,
                        ..base.clone()
                    };
                    Some((source, request))
                }
                None => {
                    warn!(source_id, "skipping items of unknown source");
                    None
                }
            })
            .collect()
    }

    // -- details -------------------------------------------------------------

    /// One item plus the engagement flags of `user` (anonymous when `None`).
    pub async fn details(
        &self,
        source_id: &str,
        item_id: &str,
        user: Option<&str>,
    ) -> Result<ResourceDetails> {
        if item_id.trim().is_empty() {
            return Err(AggregatorError::InvalidRequest("blank item id".into()));
        }
        let source = self
            .registry
            .source(source_id)
            .ok_or_else(|| AggregatorError::UnknownSource(source_id.to_string()))?;

        let summary = self.client.details(&source, item_id).await?;

        let key = ItemKey::new(source.id.as_str(), item_id);
        let votes = self.engagement.votes(&key);
        let (favorite, rated) = match user {
            Some(user) => (
                self.engagement.is_favorite(user, &key),
                self.engagement.has_rated(user, &key),
            ),
            None => (false, false),
        };

        Ok(ResourceDetails {
            summary,
            favorite,
            rated,
            total_ratings_count: votes.total(),
            current_rating: votes.average_label(),
        })
    }

    // -- filters -------------------------------------------------------------

    pub async fn filters(&self) -> Result<FilterCatalog> {
        self.filters_with_cancel(&CancellationToken::new()).await
    }

    pub async fn filters_with_cancel(&self, cancel: &CancellationToken) -> Result<FilterCatalog> {
        let sources = self.registry.active_sources();
        let subjects = self.client.subjects(&sources, cancel).await?;
        debug!(subjects = subjects.len(), "collected upstream subjects");
        Ok(FilterCatalog::build(&subjects, &sources))
    }
}
