//! Concurrent HTTP fan-out to catalog sources.
//!
//! One future per source, all joined with [`join_all`]. Each branch gets
//! its own timeout and watches the caller's [`CancellationToken`]; a branch
//! that fails for any reason degrades to an empty result for its source and
//! never takes the other branches down with it.
//!
//! ## For contributors
//!
//! Request construction (URLs, query strings) happens up front in
//! [`CatalogClient::search_all`], before the first request is sent. Keep it
//! that way: a request that cannot be encoded must fail the whole call
//! without side effects.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::header::HeaderMap;
use reqwest::{Response, Url};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::config::Config;
use crate::error::{AggregatorError, Result};
use crate::model::{PageSpec, ResourceSet, ResourceSummary, SearchRequest};
use crate::normalize::{stamp, wrap, NormalizedResult, RawSourceResult};
use crate::query::encode_filter;
use crate::source::Source;

/// Header carrying the total number of matches a source reports.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Endpoint paths and the per-call timeout.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub search_path: String,
    pub details_path: String,
    pub subject_path: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ClientSettings {
    fn from(config: &Config) -> Self {
        Self {
            timeout: config.request_timeout(),
            search_path: config.search_path.clone(),
            details_path: config.details_path.clone(),
            subject_path: config.subject_path.clone(),
        }
    }
}

/// HTTP client shared by every aggregation call. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    settings: Arc<ClientSettings>,
}

impl CatalogClient {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("lor-federation/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            settings: Arc::new(settings),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(ClientSettings::from(config))
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    // -- search --------------------------------------------------------------

    /// Run one search per `(source, request)` pair concurrently.
    ///
    /// Returns one [`NormalizedResult`] per pair, in input order. Only
    /// errors raised before dispatch (encoding, bad source URL, invalid
    /// page) fail the call.
    pub async fn search_all(
        &self,
        queries: &[(Source, SearchRequest)],
        page: &PageSpec,
        cancel: &CancellationToken,
    ) -> Result<Vec<NormalizedResult>> {
        page.validate()?;

        let prepared = queries
            .iter()
            .map(|(source, request)| Ok((source, self.search_url(source, request, page)?)))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            sources = prepared.len(),
            page = page.page_number,
            size = page.page_size,
            "fanning out search"
        );

        let calls = prepared.into_iter().map(|(source, url)| async move {
            let raw = self
                .isolated(source, cancel, "search", self.fetch_search(source, url))
                .await;
            wrap(source, raw)
        });
        Ok(join_all(calls).await)
    }

    fn search_url(&self, source: &Source, request: &SearchRequest, page: &PageSpec) -> Result<Url> {
        let filters = encode_filter(request, source.provider_type)?;
        let mut url = endpoint(source, &source.search_base_url, &self.settings.search_path)?;

        let mut query = format!(
            "limit={}&filters={filters}&offset=0",
            page.upstream_limit()
        );
        if let Some(sort) = page.sort {
            query.push_str(&format!("&sort={}&orderBy={}", sort.property(), sort.direction()));
        }
        query.push_str("&fields=");
        // Already percent-encoded; set_query leaves unreserved and %XX alone.
        url.set_query(Some(&query));
        Ok(url)
    }

    async fn fetch_search(&self, source: &Source, url: Url) -> Result<RawSourceResult> {
        trace!(source = %source.display_name, %url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AggregatorError::unavailable(source, e))?;
        let response = ensure_success(source, response).await?;

        let declared_total = declared_total(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| AggregatorError::unavailable(source, e))?;
        let set: ResourceSet =
            serde_json::from_slice(&body).map_err(|e| AggregatorError::bad_response(source, e))?;

        debug!(
            source = %source.display_name,
            items = set.resources.len(),
            declared_total,
            "source answered"
        );
        Ok(RawSourceResult {
            resources: set.resources,
            declared_total,
        })
    }

    // -- details -------------------------------------------------------------

    /// Fetch one item from its source.
    ///
    /// Unlike the fan-out calls, failures are returned to the caller: a 4xx
    /// answer is [`AggregatorError::ItemNotFound`], everything else a
    /// source failure.
    pub async fn details(&self, source: &Source, item_id: &str) -> Result<ResourceSummary> {
        let mut url = endpoint(source, &source.details_base_url, &self.settings.details_path)?;
        url.path_segments_mut()
            .map_err(|_| AggregatorError::InvalidSourceUrl {
                source_name: source.display_name.clone(),
                reason: "details url cannot carry a path".into(),
            })?
            .pop_if_empty()
            .push(item_id);

        self.bounded(source, async {
            trace!(source = %source.display_name, %url, "GET");
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| AggregatorError::unavailable(source, e))?;

            let status = response.status();
            if status.is_client_error() {
                log_error_body(source, response).await;
                return Err(AggregatorError::ItemNotFound {
                    source_id: source.id.clone(),
                    item_id: item_id.to_string(),
                });
            }
            let response = ensure_success(source, response).await?;
            let body = response
                .bytes()
                .await
                .map_err(|e| AggregatorError::unavailable(source, e))?;
            let item: ResourceSummary = serde_json::from_slice(&body)
                .map_err(|e| AggregatorError::bad_response(source, e))?;
            Ok(stamp(source, item))
        })
        .await
    }

    // -- subjects ------------------------------------------------------------

    /// Union of the subject names all given sources report, in first-seen
    /// order. Failing sources contribute nothing.
    pub async fn subjects(
        &self,
        sources: &[Source],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let prepared = sources
            .iter()
            .map(|source| {
                Ok((
                    source,
                    endpoint(source, &source.search_base_url, &self.settings.subject_path)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let calls = prepared.into_iter().map(|(source, url)| {
            self.isolated(source, cancel, "subjects", self.fetch_subjects(source, url))
        });

        let mut names: Vec<String> = Vec::new();
        for name in join_all(calls).await.into_iter().flatten() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }

    async fn fetch_subjects(&self, source: &Source, url: Url) -> Result<Vec<String>> {
        trace!(source = %source.display_name, %url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AggregatorError::unavailable(source, e))?;
        let response = ensure_success(source, response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| AggregatorError::unavailable(source, e))?;
        let payload: SubjectPayload =
            serde_json::from_slice(&body).map_err(|e| AggregatorError::bad_response(source, e))?;

        Ok(payload
            .into_entries()
            .into_iter()
            .filter_map(|entry| entry.name)
            .filter(|name| !name.trim().is_empty())
            .collect())
    }

    // -- branch plumbing -----------------------------------------------------

    /// Apply the per-call timeout to one upstream call.
    async fn bounded<T>(&self, source: &Source, call: impl Future<Output = Result<T>>) -> Result<T> {
        let limit = self.settings.timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(AggregatorError::unavailable(
                source,
                format!("timed out after {}ms", limit.as_millis()),
            )),
        }
    }

    /// Run one fan-out branch: timeout, cancellation and failure isolation.
    async fn isolated<T: Default>(
        &self,
        source: &Source,
        cancel: &CancellationToken,
        what: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> T {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(source = %source.display_name, call = what, "cancelled");
                T::default()
            }
            outcome = self.bounded(source, call) => match outcome {
                Ok(value) => value,
                Err(e) => {
                    error!(source = %source.display_name, call = what, error = %e, "source call failed");
                    T::default()
                }
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `base` + `path` as a URL. A trailing slash on `base` is not doubled.
fn endpoint(source: &Source, base: &str, path: &str) -> Result<Url> {
    let joined = match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{path}", base.trim_end_matches('/')),
        _ => format!("{base}{path}"),
    };
    Url::parse(&joined).map_err(|e| AggregatorError::InvalidSourceUrl {
        source_name: source.display_name.clone(),
        reason: format!("{joined}: {e}"),
    })
}

fn declared_total(headers: &HeaderMap) -> u64 {
    headers
        .get(TOTAL_COUNT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

async fn ensure_success(source: &Source, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    log_error_body(source, response).await;
    Err(AggregatorError::unavailable(source, format!("HTTP {status}")))
}

async fn log_error_body(source: &Source, response: Response) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    trace!(source = %source.display_name, %status, %body, "error response body");
}

/// `/subjects` answers either a bare list or a wrapped one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubjectPayload {
    List(Vec<SubjectEntry>),
    Wrapped { subjects: Vec<SubjectEntry> },
}

impl SubjectPayload {
    fn into_entries(self) -> Vec<SubjectEntry> {
        match self {
            Self::List(entries) | Self::Wrapped { subjects: entries } => entries,
        }
    }
}

/// One `{identifier, name, parent}` record; only the name is used.
#[derive(Debug, Deserialize)]
struct SubjectEntry {
    #[serde(default)]
    name: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MediaType, ProviderType, SortKey, Subject};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Instant;

    fn client(timeout: Duration) -> CatalogClient {
        CatalogClient::new(ClientSettings {
            timeout,
            ..ClientSettings::default()
        })
        .unwrap()
    }

    fn source(server: &MockServer, id: &str, name: &str) -> Source {
        Source::new(id, name, server.base_url())
    }

    fn resources(ids: &[&str]) -> serde_json::Value {
        let items: Vec<_> = ids
            .iter()
            .map(|id| json!({"id": id, "name": format!("Item {id}")}))
            .collect();
        json!({ "resources": items })
    }

    #[test]
    fn endpoint_does_not_double_slashes() {
        let source = Source::new("s", "S", "http://s.test/api/");
        let url = endpoint(&source, &source.search_base_url, "/resources").unwrap();
        assert_eq!(url.as_str(), "http://s.test/api/resources");

        let bad = endpoint(&source, "not a url", "/x").unwrap_err();
        assert!(matches!(bad, AggregatorError::InvalidSourceUrl { .. }));
    }

    #[test]
    fn search_url_carries_paging_sort_and_encoded_filter() {
        let client = client(Duration::from_secs(1));
        let source = Source::new("s", "S", "http://s.test/api");
        let request = SearchRequest::default()
            .with_subject(Subject::Mathematik)
            .with_technical_format(MediaType::TextBook);
        let page = PageSpec::new(2, 10).sorted(SortKey::Newest);

        let url = client.search_url(&source, &request, &page).unwrap();
        let query = url.query().unwrap();

        assert!(url.path().ends_with("/api/resources"));
        assert!(query.starts_with("limit=30&filters=subject%3D%27Mathematik%27"));
        assert!(query.contains("&offset=0&sort=publishDate&orderBy=desc&fields="));
    }

    #[test]
    fn unsorted_search_omits_sort_params() {
        let client = client(Duration::from_secs(1));
        let source = Source::new("s", "S", "http://s.test");
        let url = client
            .search_url(&source, &SearchRequest::default(), &PageSpec::default())
            .unwrap();
        assert_eq!(url.query(), Some("limit=20&filters=&offset=0&fields="));
    }

    #[test]
    fn total_count_header_is_lenient() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_total(&headers), 0);
        headers.insert(TOTAL_COUNT_HEADER, "57".parse().unwrap());
        assert_eq!(declared_total(&headers), 57);
        headers.insert(TOTAL_COUNT_HEADER, "many".parse().unwrap());
        assert_eq!(declared_total(&headers), 0);
    }

    #[tokio::test]
    async fn search_all_isolates_failures() {
        let server = MockServer::start_async().await;
        let ok = server
            .mock_async(|when, then| {
                when.method(GET).path("/ok/resources").query_param("limit", "20");
                then.status(200)
                    .header(TOTAL_COUNT_HEADER, "2")
                    .json_body(resources(&["a", "b"]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/broken/resources");
                then.status(500).body("boom");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/garbled/resources");
                then.status(200).body("<html>");
            })
            .await;

        let sources = vec![
            Source::new("1", "Ok", server.url("/ok")),
            Source::new("2", "Broken", server.url("/broken")),
            Source::new("3", "Garbled", server.url("/garbled")),
        ];
        let queries: Vec<_> = sources
            .into_iter()
            .map(|s| (s, SearchRequest::default()))
            .collect();

        let results = client(Duration::from_secs(2))
            .search_all(&queries, &PageSpec::default(), &CancellationToken::new())
            .await
            .unwrap();

        ok.assert_async().await;
        assert_eq!(results.len(), 3, "every source keeps its entry");
        assert_eq!(results[0].items.len(), 2);
        assert_eq!(results[0].total_elements, 2);
        assert_eq!(results[0].items[0].publisher.as_deref(), Some("Ok"));
        for failed in &results[1..] {
            assert!(failed.items.is_empty());
            assert_eq!(failed.total_elements, 0);
        }
    }

    #[tokio::test]
    async fn duf_sources_receive_their_dialect() {
        let server = MockServer::start_async().await;
        let duf = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/resources")
                    .query_param("filters", "search='bruch' AND name='bruch'");
                then.status(200).json_body(resources(&[]));
            })
            .await;

        let source = source(&server, "d", "DUF").with_provider_type(ProviderType::Duf);
        let request = SearchRequest::default().with_search("bruch");
        client(Duration::from_secs(2))
            .search_all(&[(source, request)], &PageSpec::default(), &CancellationToken::new())
            .await
            .unwrap();

        duf.assert_async().await;
    }

    #[tokio::test]
    async fn encoding_errors_fail_before_dispatch() {
        let server = MockServer::start_async().await;
        let never = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200).json_body(resources(&[]));
            })
            .await;

        let request = SearchRequest {
            author: Some("O'Brien".into()),
            ..SearchRequest::default()
        };
        let queries = vec![
            (source(&server, "1", "A"), SearchRequest::default()),
            (source(&server, "2", "B"), request),
        ];
        let err = client(Duration::from_secs(1))
            .search_all(&queries, &PageSpec::default(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AggregatorError::Encoding { field: "author", .. }));
        never.assert_calls_async(0).await;
    }

    #[tokio::test]
    async fn slow_source_times_out_alone() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow/resources");
                then.status(200)
                    .delay(Duration::from_secs(5))
                    .json_body(resources(&["late"]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/fast/resources");
                then.status(200).json_body(resources(&["quick"]));
            })
            .await;

        let queries = vec![
            (Source::new("1", "Slow", server.url("/slow")), SearchRequest::default()),
            (Source::new("2", "Fast", server.url("/fast")), SearchRequest::default()),
        ];
        let started = Instant::now();
        let results = client(Duration::from_millis(300))
            .search_all(&queries, &PageSpec::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(results[0].items.is_empty());
        assert_eq!(results[1].items[0].id, "quick");
    }

    #[tokio::test]
    async fn cancelled_token_yields_empty_results() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200)
                    .delay(Duration::from_secs(5))
                    .json_body(resources(&["x"]));
            })
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let results = client(Duration::from_secs(10))
            .search_all(
                &[(source(&server, "1", "A"), SearchRequest::default())],
                &PageSpec::default(),
                &cancel,
            )
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(results.len(), 1);
        assert!(results[0].items.is_empty());
    }

    #[tokio::test]
    async fn details_maps_status_codes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/resources/r-1");
                then.status(200).json_body(json!({
                    "id": "r-1",
                    "name": "Brüche",
                    "publisher": "Spoofed",
                    "typicalAgeRange": "11-12"
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/resources/missing");
                then.status(404);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/resources/broken");
                then.status(503);
            })
            .await;

        let client = client(Duration::from_secs(2));
        let source = source(&server, "7", "Westermann");

        let item = client.details(&source, "r-1").await.unwrap();
        assert_eq!(item.name, "Brüche");
        assert_eq!(item.publisher.as_deref(), Some("Westermann"));
        assert_eq!(item.publisher_id.as_deref(), Some("7"));
        assert_eq!(item.typical_age_range.as_deref(), Some("6-7"));

        let missing = client.details(&source, "missing").await.unwrap_err();
        assert!(matches!(missing, AggregatorError::ItemNotFound { .. }));

        let broken = client.details(&source, "broken").await.unwrap_err();
        assert!(matches!(broken, AggregatorError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn details_separate_garbled_bodies_from_timeouts() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/resources/garbled");
                then.status(200)
                    .header("content-type", "application/json")
                    .body("{\"id\": ");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/resources/slow");
                then.status(200)
                    .delay(Duration::from_secs(5))
                    .json_body(json!({"id": "slow", "name": "Spät"}));
            })
            .await;

        let client = client(Duration::from_millis(300));
        let source = source(&server, "7", "Westermann");

        let garbled = client.details(&source, "garbled").await.unwrap_err();
        assert!(matches!(garbled, AggregatorError::SourceBadResponse { .. }));

        let started = std::time::Instant::now();
        let slow = client.details(&source, "slow").await.unwrap_err();
        assert!(matches!(slow, AggregatorError::SourceUnavailable { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn subjects_accept_both_payload_shapes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/a/subjects");
                then.status(200).json_body(json!([
                    {"identifier": "m", "name": "Mathematik", "parent": null},
                    {"identifier": "d", "name": "Deutsch"}
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/b/subjects");
                then.status(200).json_body(json!({
                    "subjects": [{"name": "Mathematik"}, {"name": "Physik"}]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/c/subjects");
                then.status(500);
            })
            .await;

        let sources = vec![
            Source::new("a", "A", server.url("/a")),
            Source::new("b", "B", server.url("/b")),
            Source::new("c", "C", server.url("/c")),
        ];
        let names = client(Duration::from_secs(2))
            .subjects(&sources, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(names, vec!["Mathematik", "Deutsch", "Physik"]);
    }
}
