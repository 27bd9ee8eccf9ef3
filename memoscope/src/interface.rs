//! Memoscope Interface Definition
//!
//! This file defines the public surface handed to the calling agent and the
//! collaborator boundary towards the upstream notes service.
//! It acts as the source of truth for shared types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::{Memo, MemoState, ResponseFormat, Visibility};

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// A highlight range `[start, end)` in chars, relative to the text it annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HighlightRange {
    pub start: usize,
    pub end: usize,
}

impl HighlightRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Bounded excerpt of a memo body.
///
/// `text` is a verbatim window of the body starting at char `offset`.
/// `highlights` index into `text`, not into the body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Snippet {
    pub text: String,
    pub highlights: Vec<HighlightRange>,
    /// Char offset of the window start within the source body
    pub offset: usize,
}

/// ID_ONLY tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdOnlyMemo {
    pub id: String,
}

/// MINIMAL tier: identifier, a short snippet and tags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimalMemo {
    pub id: String,
    pub snippet: Snippet,
    pub tags: Vec<String>,
}

/// SUMMARY tier
///
/// `summary` is a query-centered snippet when the request carried a query,
/// otherwise a structure-aware condensation of the body. `content_length`
/// is the char count of the untruncated body and `truncated` tells whether
/// `summary` lost anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMemo {
    pub id: String,
    pub tags: Vec<String>,
    pub create_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    pub summary: Snippet,
    /// Short excerpts around individual matches; empty without a query
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub match_snippets: Vec<Snippet>,
    pub content_length: usize,
    pub truncated: bool,
}

/// FULL tier: the memo verbatim
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullMemo {
    pub id: String,
    pub content: String,
    pub tags: Vec<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub state: MemoState,
    pub visibility: Visibility,
}

/// A memo reduced to one output tier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProjectedMemo {
    IdOnly(IdOnlyMemo),
    Minimal(MinimalMemo),
    Summary(SummaryMemo),
    Full(FullMemo),
}

impl ProjectedMemo {
    pub fn id(&self) -> &str {
        match self {
            ProjectedMemo::IdOnly(m) => &m.id,
            ProjectedMemo::Minimal(m) => &m.id,
            ProjectedMemo::Summary(m) => &m.id,
            ProjectedMemo::Full(m) => &m.id,
        }
    }

    pub fn format(&self) -> ResponseFormat {
        match self {
            ProjectedMemo::IdOnly(_) => ResponseFormat::IdOnly,
            ProjectedMemo::Minimal(_) => ResponseFormat::Minimal,
            ProjectedMemo::Summary(_) => ResponseFormat::Summary,
            ProjectedMemo::Full(_) => ResponseFormat::Full,
        }
    }
}

/// Echo of how a search request was interpreted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMetadata {
    pub query: String,
    /// Effective page size after clamping
    pub limit: usize,
    pub offset: usize,
    pub format: ResponseFormat,
    pub filtered_count: usize,
    pub returned_count: usize,
    /// Original limit when it exceeded the maximum and was clamped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_clamped_from: Option<usize>,
}

/// Search result container
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub memos: Vec<ProjectedMemo>,
    pub total_count: usize,
    pub returned_count: usize,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<usize>,
    pub query_metadata: QueryMetadata,
}

/// Acknowledgement for a completed delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteAck {
    pub id: String,
    pub message: String,
}

/// Error type for Memoscope operations
#[derive(Debug, Error)]
pub enum MemoscopeError {
    #[error("Invalid argument `{field}`: {reason}")]
    InvalidArgument { field: &'static str, reason: String },
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Memo not found: {0}")]
    NotFound(String),
}

impl MemoscopeError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        MemoscopeError::InvalidArgument { field, reason: reason.into() }
    }
}

pub type MemoscopeResult<T> = Result<T, MemoscopeError>;

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAM INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

/// The notes service as seen from this crate.
///
/// Implementations own transport, authentication and any retry policy.
/// Ordering of `fetch_candidates` is not trusted; callers re-sort.
#[async_trait::async_trait]
pub trait MemosApi: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Keyword search. Empty query returns every memo.
    async fn fetch_candidates(&self, query: &str) -> MemoscopeResult<Vec<Memo>>;

    /// Fetch a single memo. Accepts `memos/XYZ` or bare `XYZ`.
    async fn get_by_id(&self, id: &str) -> MemoscopeResult<Memo>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────────

    async fn create(&self, content: &str, tags: &[String]) -> MemoscopeResult<Memo>;

    async fn update(&self, id: &str, content: &str, tags: &[String]) -> MemoscopeResult<Memo>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Delete Operations
    // ─────────────────────────────────────────────────────────────────────────────

    async fn delete(&self, id: &str) -> MemoscopeResult<()>;
}

impl From<reqwest::Error> for MemoscopeError {
    fn from(e: reqwest::Error) -> Self {
        MemoscopeError::UpstreamUnavailable(e.to_string())
    }
}
