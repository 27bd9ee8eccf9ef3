//! MemoStore - the caller-facing API
//!
//! Wraps a `MemosApi` collaborator and shapes what it returns:
//! validate → fetch → date filter → tag filter → score/sort → paginate → project.
//!
//! Every call is a self-contained function of its inputs and the upstream
//! memo set. There is no cache and no retry; an upstream failure aborts the
//! call before anything is shaped.

use tracing::{debug, info, warn};

use crate::config::{
    BY_TAG_CONTENT_MAX_LENGTH, BY_TAG_DEFAULT_LIMIT, DEFAULT_CONTENT_MAX_LENGTH, DEFAULT_TAG,
    LATEST_CONTENT_MAX_LENGTH, LATEST_DEFAULT_LIMIT, LEGACY_SEARCH_LIMIT, MAX_LIST_LIMIT,
};
use crate::interface::{
    DeleteAck, MemoscopeError, MemoscopeResult, MemosApi, ProjectedMemo, QueryMetadata, SearchResponse,
};
use crate::models::{
    memo_name, memo_short_id, normalize_tag, ListOptions, Memo, ResponseFormat, SearchParams, SearchRequest,
};
use crate::pagination::paginate;
use crate::projection::{project, project_all, ProjectionOptions};
use crate::ranking::{rank, ScoredMemo, ScoringWeights};

pub struct MemoStore<A: MemosApi> {
    api: A,
    default_tag: String,
    weights: ScoringWeights,
}

impl<A: MemosApi> MemoStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            default_tag: DEFAULT_TAG.to_string(),
            weights: ScoringWeights::default(),
        }
    }

    /// Tag added to every memo created through this store.
    pub fn with_default_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tag = tag.into();
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Search
    // ─────────────────────────────────────────────────────────────────────────────

    /// Enhanced search.
    ///
    /// All request validation happens before the upstream fetch, so an invalid
    /// request never costs a round trip.
    pub async fn search(&self, request: &SearchRequest) -> MemoscopeResult<SearchResponse> {
        let (limit, limit_clamped_from) = request.effective_limit()?;
        let content_max_length = request.content_max_length()?;
        request.date_range.validate()?;
        if let Some(requested) = limit_clamped_from {
            warn!(requested, limit, "search limit clamped");
        }

        let candidates = self.api.fetch_candidates(&request.query).await?;
        let candidate_count = candidates.len();

        let filtered: Vec<Memo> = candidates
            .into_iter()
            .filter(|m| request.date_range.is_open() || request.date_range.contains(m.create_time))
            .filter(|m| request.tags.is_empty() || m.has_any_tag(&request.tags))
            .collect();
        let filtered_count = filtered.len();

        let ranked = rank(filtered, &request.query, &self.weights);
        let page = paginate(ranked, request.offset, limit)?;

        let opts = ProjectionOptions { query: &request.query, content_max_length };
        let memos = project_all(&page.items, request.format, &opts);

        debug!(
            ranked = request.has_query(),
            candidates = candidate_count,
            filtered = filtered_count,
            returned = page.returned_count,
            offset = request.offset,
            format = %request.format,
            "search complete"
        );

        Ok(SearchResponse {
            memos,
            total_count: page.total_count,
            returned_count: page.returned_count,
            has_more: page.has_more,
            next_offset: page.next_offset,
            query_metadata: QueryMetadata {
                query: request.query.clone(),
                limit,
                offset: request.offset,
                format: request.format,
                filtered_count,
                returned_count: page.returned_count,
                limit_clamped_from,
            },
        })
    }

    /// Search from raw caller input. Format and timestamps are parsed first.
    pub async fn search_params(&self, params: SearchParams) -> MemoscopeResult<SearchResponse> {
        let request = SearchRequest::try_from(params)?;
        self.search(&request).await
    }

    /// Plain search with the historical shape: up to 20 memos, FULL format.
    pub async fn search_memos(&self, query: &str) -> MemoscopeResult<Vec<ProjectedMemo>> {
        let request = SearchRequest {
            limit: LEGACY_SEARCH_LIMIT,
            format: ResponseFormat::Full,
            ..SearchRequest::new(query)
        };
        Ok(self.search(&request).await?.memos)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Listings
    // ─────────────────────────────────────────────────────────────────────────────

    /// Most recently created memos.
    pub async fn get_latest(&self, options: ListOptions) -> MemoscopeResult<Vec<ProjectedMemo>> {
        let request = list_request(options, LATEST_DEFAULT_LIMIT, LATEST_CONTENT_MAX_LENGTH, Vec::new())?;
        Ok(self.search(&request).await?.memos)
    }

    /// Most recent memos carrying `tag` (with or without `#`).
    pub async fn get_by_tag(&self, tag: &str, options: ListOptions) -> MemoscopeResult<Vec<ProjectedMemo>> {
        if normalize_tag(tag).is_empty() {
            return Err(MemoscopeError::invalid("tag", "must not be empty"));
        }
        let request = list_request(
            options,
            BY_TAG_DEFAULT_LIMIT,
            BY_TAG_CONTENT_MAX_LENGTH,
            vec![tag.to_string()],
        )?;
        Ok(self.search(&request).await?.memos)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Pass-through CRUD
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn get_memo(&self, id: &str, format: Option<ResponseFormat>) -> MemoscopeResult<ProjectedMemo> {
        let id = require_id(id)?;
        let memo = self.api.get_by_id(id).await?;
        Ok(project_single(memo, format))
    }

    /// Create a memo. The configured default tag is always attached.
    pub async fn create_memo(
        &self,
        content: &str,
        tags: &[String],
        format: Option<ResponseFormat>,
    ) -> MemoscopeResult<ProjectedMemo> {
        if content.trim().is_empty() {
            return Err(MemoscopeError::invalid("content", "must not be empty"));
        }
        let tags = with_default_tag(tags, &self.default_tag);
        let memo = self.api.create(content, &tags).await?;
        info!(id = %memo.id, tags = tags.len(), "memo created");
        Ok(project_single(memo, format))
    }

    pub async fn update_memo(
        &self,
        id: &str,
        content: &str,
        tags: &[String],
        format: Option<ResponseFormat>,
    ) -> MemoscopeResult<ProjectedMemo> {
        let id = require_id(id)?;
        if content.trim().is_empty() {
            return Err(MemoscopeError::invalid("content", "must not be empty"));
        }
        let memo = self.api.update(id, content, tags).await?;
        info!(id = %memo.id, "memo updated");
        Ok(project_single(memo, format))
    }

    pub async fn delete_memo(&self, id: &str) -> MemoscopeResult<DeleteAck> {
        let id = require_id(id)?;
        self.api.delete(id).await?;
        let name = memo_name(id);
        info!(id = %name, "memo deleted");
        Ok(DeleteAck {
            message: format!("Memo {} deleted", memo_short_id(&name)),
            id: name,
        })
    }
}

fn require_id(id: &str) -> MemoscopeResult<&str> {
    if memo_short_id(id).is_empty() {
        return Err(MemoscopeError::invalid("id", "must not be empty"));
    }
    Ok(id.trim())
}

/// Append `default_tag` unless an equivalent tag is already present.
fn with_default_tag(tags: &[String], default_tag: &str) -> Vec<String> {
    let mut out: Vec<String> = tags.iter().filter(|t| !normalize_tag(t).is_empty()).cloned().collect();
    let wanted = normalize_tag(default_tag);
    if !wanted.is_empty() && !out.iter().any(|t| normalize_tag(t) == wanted) {
        out.push(default_tag.to_string());
    }
    out
}

fn list_request(
    options: ListOptions,
    default_limit: usize,
    default_content_length: usize,
    tags: Vec<String>,
) -> MemoscopeResult<SearchRequest> {
    let limit = options.limit.unwrap_or(default_limit);
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(MemoscopeError::invalid(
            "limit",
            format!("must be between 1 and {}, got {}", MAX_LIST_LIMIT, limit),
        ));
    }
    Ok(SearchRequest {
        limit,
        format: options.format,
        tags,
        max_snippet_length: Some(options.content_max_length.unwrap_or(default_content_length)),
        ..SearchRequest::default()
    })
}

fn project_single(memo: Memo, format: Option<ResponseFormat>) -> ProjectedMemo {
    let opts = ProjectionOptions { query: "", content_max_length: DEFAULT_CONTENT_MAX_LENGTH };
    project(&ScoredMemo { memo, score: None }, format.unwrap_or(ResponseFormat::Full), &opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryMemos;
    use crate::models::DateRange;
    use chrono::{DateTime, TimeZone, Utc};

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, 10, 0, 0).unwrap()
    }

    fn seeded() -> MemoStore<InMemoryMemos> {
        let api = InMemoryMemos::new();
        api.insert("mcp rollout plan\n- step one", &["work"], day(1));
        api.insert("notes on the mcp server, mcp tools and mcp prompts", &["work", "mcp"], day(2));
        api.insert("grocery list: eggs, milk", &["home"], day(3));
        api.insert("quarterly report draft", &["Work"], day(4));
        api.insert("weekend hike with mcp friends", &["personal"], day(5));
        MemoStore::new(api)
    }

    fn ids(memos: &[ProjectedMemo]) -> Vec<String> {
        memos.iter().map(|m| m.id().to_string()).collect()
    }

    #[test]
    fn test_search_ranks_and_paginates() {
        let rt = runtime();
        let store = seeded();
        let request = SearchRequest { limit: 2, format: ResponseFormat::IdOnly, ..SearchRequest::new("mcp") };
        let response = rt.block_on(store.search(&request)).unwrap();

        assert_eq!(response.total_count, 3);
        assert_eq!(response.returned_count, 2);
        assert!(response.has_more);
        assert_eq!(response.next_offset, Some(2));
        assert_eq!(response.memos[0].id(), "memos/2", "tagged, repeated matches rank first");
        assert_eq!(response.query_metadata.filtered_count, 3);
        assert_eq!(response.query_metadata.limit_clamped_from, None);
    }

    #[test]
    fn test_search_without_query_is_newest_first() {
        let rt = runtime();
        let store = seeded();
        let response = rt.block_on(store.search(&SearchRequest::default())).unwrap();
        assert_eq!(
            ids(&response.memos),
            vec!["memos/5", "memos/4", "memos/3", "memos/2", "memos/1"]
        );
    }

    #[test]
    fn test_tag_filter_any_of() {
        let rt = runtime();
        let store = seeded();
        let request = SearchRequest {
            tags: vec!["#home".into(), "PERSONAL".into()],
            format: ResponseFormat::IdOnly,
            ..SearchRequest::default()
        };
        let response = rt.block_on(store.search(&request)).unwrap();
        assert_eq!(ids(&response.memos), vec!["memos/5", "memos/3"]);
        assert_eq!(response.total_count, 2);
    }

    #[test]
    fn test_date_filter_inclusive() {
        let rt = runtime();
        let store = seeded();
        let request = SearchRequest {
            date_range: DateRange { from: Some(day(2)), to: Some(day(4)) },
            format: ResponseFormat::IdOnly,
            ..SearchRequest::default()
        };
        let response = rt.block_on(store.search(&request)).unwrap();
        assert_eq!(ids(&response.memos), vec!["memos/4", "memos/3", "memos/2"]);
    }

    #[test]
    fn test_inverted_date_range_rejected_before_fetch() {
        let rt = runtime();
        let store = seeded();
        store.api().set_offline(true);
        let request = SearchRequest {
            date_range: DateRange { from: Some(day(4)), to: Some(day(2)) },
            ..SearchRequest::default()
        };
        let err = rt.block_on(store.search(&request)).unwrap_err();
        assert!(matches!(err, MemoscopeError::InvalidArgument { field: "date_from", .. }));
    }

    #[test]
    fn test_limit_clamped_and_signaled() {
        let rt = runtime();
        let store = seeded();
        let request = SearchRequest { limit: 500, ..SearchRequest::default() };
        let response = rt.block_on(store.search(&request)).unwrap();
        assert_eq!(response.query_metadata.limit, 50);
        assert_eq!(response.query_metadata.limit_clamped_from, Some(500));
        assert_eq!(response.returned_count, 5);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let rt = runtime();
        let store = seeded();
        let request = SearchRequest { limit: 0, ..SearchRequest::default() };
        assert!(matches!(
            rt.block_on(store.search(&request)),
            Err(MemoscopeError::InvalidArgument { field: "limit", .. })
        ));
    }

    #[test]
    fn test_upstream_failure_propagates() {
        let rt = runtime();
        let store = seeded();
        store.api().set_offline(true);
        assert!(matches!(
            rt.block_on(store.search(&SearchRequest::new("mcp"))),
            Err(MemoscopeError::UpstreamUnavailable(_))
        ));
    }

    #[test]
    fn test_search_params_bogus_format() {
        let rt = runtime();
        let store = seeded();
        store.api().set_offline(true);
        let params = SearchParams { format: Some("bogus".into()), ..Default::default() };
        assert!(matches!(
            rt.block_on(store.search_params(params)),
            Err(MemoscopeError::InvalidArgument { field: "format", .. })
        ));
    }

    #[test]
    fn test_search_memos_legacy_shape() {
        let rt = runtime();
        let store = seeded();
        let memos = rt.block_on(store.search_memos("mcp")).unwrap();
        assert_eq!(memos.len(), 3);
        assert!(memos.iter().all(|m| m.format() == ResponseFormat::Full));
    }

    #[test]
    fn test_get_latest_defaults() {
        let rt = runtime();
        let store = seeded();
        let memos = rt.block_on(store.get_latest(ListOptions::default())).unwrap();
        assert_eq!(ids(&memos), vec!["memos/5", "memos/4", "memos/3"]);
        assert!(memos.iter().all(|m| m.format() == ResponseFormat::Full));

        let opts = ListOptions { limit: Some(1), format: ResponseFormat::Summary, content_max_length: None };
        let memos = rt.block_on(store.get_latest(opts)).unwrap();
        assert_eq!(memos.len(), 1);
        assert_eq!(memos[0].format(), ResponseFormat::Summary);
    }

    #[test]
    fn test_listing_limit_bounds() {
        let rt = runtime();
        let store = seeded();
        for limit in [0, MAX_LIST_LIMIT + 1] {
            let opts = ListOptions { limit: Some(limit), ..ListOptions::default() };
            assert!(matches!(
                rt.block_on(store.get_latest(opts)),
                Err(MemoscopeError::InvalidArgument { field: "limit", .. })
            ));
        }
    }

    #[test]
    fn test_get_by_tag() {
        let rt = runtime();
        let store = seeded();
        let memos = rt.block_on(store.get_by_tag("#work", ListOptions::default())).unwrap();
        assert_eq!(ids(&memos), vec!["memos/4", "memos/2", "memos/1"]);
        let memos = rt.block_on(store.get_by_tag("work", ListOptions::default())).unwrap();
        assert_eq!(memos.len(), 3);
        assert!(rt.block_on(store.get_by_tag("#", ListOptions::default())).is_err());
    }

    #[test]
    fn test_create_adds_default_tag_once() {
        let rt = runtime();
        let store = seeded();
        let created = rt
            .block_on(store.create_memo("new idea", &["idea".into(), "#mcp".into()], None))
            .unwrap();
        let ProjectedMemo::Full(full) = created else { panic!("expected full") };
        assert_eq!(full.tags, vec!["idea".to_string(), "mcp".to_string()]);

        let created = rt.block_on(store.create_memo("plain", &[], Some(ResponseFormat::IdOnly))).unwrap();
        assert_eq!(created.format(), ResponseFormat::IdOnly);
        let memo = rt.block_on(store.api().get_by_id(created.id())).unwrap();
        assert!(memo.tags.contains("MCP"));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_content() {
        let store = seeded();
        assert!(matches!(
            store.create_memo("   ", &[], None).await,
            Err(MemoscopeError::InvalidArgument { field: "content", .. })
        ));
    }

    #[tokio::test]
    async fn test_get_update_delete() {
        let store = seeded();

        let got = store.get_memo("3", None).await.unwrap();
        assert_eq!(got.id(), "memos/3");

        let updated = store
            .update_memo("memos/3", "grocery list: eggs", &["home".into()], Some(ResponseFormat::Minimal))
            .await
            .unwrap();
        let ProjectedMemo::Minimal(m) = updated else { panic!("expected minimal") };
        assert_eq!(m.snippet.text, "grocery list: eggs");

        let ack = store.delete_memo("3").await.unwrap();
        assert_eq!(ack.id, "memos/3");
        assert!(matches!(store.get_memo("3", None).await, Err(MemoscopeError::NotFound(_))));
        assert!(matches!(store.delete_memo("").await, Err(MemoscopeError::InvalidArgument { field: "id", .. })));
    }
}
