//! Core data models for Memoscope
//!
//! `Memo` is the read-only view of a note returned by the upstream service.
//! `SearchParams` is untyped caller input; `SearchRequest` is the validated,
//! strongly typed form the orchestrator works with.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_CONTENT_MAX_LENGTH, DEFAULT_LIMIT, DEFAULT_OFFSET, MAX_CONTENT_MAX_LENGTH, MAX_LIMIT,
    MIN_CONTENT_MAX_LENGTH,
};
use crate::interface::{MemoscopeError, MemoscopeResult};
use crate::search::{find_occurrences, fold_chars, query_terms};

const MEMO_NAME_PREFIX: &str = "memos/";

// ─────────────────────────────────────────────────────────────────────────────
// MEMO
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoState {
    Normal,
    Archived,
    #[serde(other)]
    StateUnspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Private,
    Protected,
    Public,
    #[serde(other)]
    VisibilityUnspecified,
}

/// A single note from the upstream service
#[derive(Debug, Clone, PartialEq)]
pub struct Memo {
    /// Resource name, e.g. `memos/Vx3k9`
    pub id: String,
    pub content: String,
    pub tags: BTreeSet<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub state: MemoState,
    pub visibility: Visibility,
}

impl Memo {
    /// Whether every query term appears in the content or in a tag.
    /// Empty query matches everything.
    /// Folding matches the snippet extractor, so every candidate it admits
    /// can be highlighted.
    pub fn matches_keywords(&self, query: &str) -> bool {
        let content = fold_chars(&self.content);
        let tags: Vec<Vec<char>> = self.tags.iter().map(|t| fold_chars(t)).collect();
        query_terms(query).iter().all(|term| {
            !find_occurrences(&content, term).is_empty() || tags.iter().any(|t| !find_occurrences(t, term).is_empty())
        })
    }

    /// "Any of" tag membership. Both sides are compared via `normalize_tag`.
    pub fn has_any_tag(&self, wanted: &[String]) -> bool {
        wanted.iter().any(|w| {
            let w = normalize_tag(w);
            self.tags.iter().any(|t| normalize_tag(t) == w)
        })
    }
}

/// Strip a leading `#` and lowercase.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_lowercase()
}

/// Accept both `memos/XYZ` and `XYZ`, returning the bare identifier.
pub fn memo_short_id(id: &str) -> &str {
    let id = id.trim();
    id.strip_prefix(MEMO_NAME_PREFIX).unwrap_or(id)
}

/// Full resource name (`memos/XYZ`) for either identifier form.
pub fn memo_name(id: &str) -> String {
    format!("{}{}", MEMO_NAME_PREFIX, memo_short_id(id))
}

// ─────────────────────────────────────────────────────────────────────────────
// RESPONSE FORMAT
// ─────────────────────────────────────────────────────────────────────────────

/// Output tiers, ordered by increasing information content
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    IdOnly,
    Minimal,
    Summary,
    Full,
}

impl ResponseFormat {
    pub const ALL: [ResponseFormat; 4] = [
        ResponseFormat::IdOnly,
        ResponseFormat::Minimal,
        ResponseFormat::Summary,
        ResponseFormat::Full,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::IdOnly => "id_only",
            ResponseFormat::Minimal => "minimal",
            ResponseFormat::Summary => "summary",
            ResponseFormat::Full => "full",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = MemoscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "id_only" => Ok(ResponseFormat::IdOnly),
            "minimal" => Ok(ResponseFormat::Minimal),
            "summary" => Ok(ResponseFormat::Summary),
            "full" => Ok(ResponseFormat::Full),
            _ => Err(MemoscopeError::invalid(
                "format",
                format!("unknown format {:?}, expected one of id_only, minimal, summary, full", s),
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TIMESTAMPS & DATE RANGE
// ─────────────────────────────────────────────────────────────────────────────

/// Parse an ISO-8601 / RFC 3339 timestamp that carries an explicit offset or `Z`.
pub fn parse_timestamp(field: &'static str, raw: &str) -> MemoscopeResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    let is_naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).is_ok())
        || NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok();

    let reason = if is_naive {
        format!("{:?} has no timezone; append `Z` or an offset like `+02:00`", raw)
    } else {
        format!("{:?} is not an ISO-8601 timestamp", raw)
    };
    Err(MemoscopeError::invalid(field, reason))
}

/// Inclusive creation-time window. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// An inverted range is rejected rather than treated as empty.
    pub fn validate(&self) -> MemoscopeResult<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(MemoscopeError::invalid(
                    "date_from",
                    format!("date_from ({}) is after date_to ({})", from.to_rfc3339(), to.to_rfc3339()),
                ));
            }
        }
        Ok(())
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| ts >= from) && self.to.map_or(true, |to| ts <= to)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SEARCH REQUEST
// ─────────────────────────────────────────────────────────────────────────────

/// Validated search input.
///
/// Defaults: empty query, `limit` 10, `offset` 0, SUMMARY format, no date or
/// tag filter, content budget 500 chars.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    pub offset: usize,
    pub format: ResponseFormat,
    pub date_range: DateRange,
    /// "Any of" tag filter; empty means no filter
    pub tags: Vec<String>,
    pub max_snippet_length: Option<usize>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
            format: ResponseFormat::Summary,
            date_range: DateRange::default(),
            tags: Vec::new(),
            max_snippet_length: None,
        }
    }
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Self::default() }
    }

    /// Effective page size plus the requested value when it had to be clamped.
    pub fn effective_limit(&self) -> MemoscopeResult<(usize, Option<usize>)> {
        match self.limit {
            0 => Err(MemoscopeError::invalid("limit", format!("must be between 1 and {}", MAX_LIMIT))),
            l if l > MAX_LIMIT => Ok((MAX_LIMIT, Some(l))),
            l => Ok((l, None)),
        }
    }

    pub fn content_max_length(&self) -> MemoscopeResult<usize> {
        let len = self.max_snippet_length.unwrap_or(DEFAULT_CONTENT_MAX_LENGTH);
        if !(MIN_CONTENT_MAX_LENGTH..=MAX_CONTENT_MAX_LENGTH).contains(&len) {
            return Err(MemoscopeError::invalid(
                "max_snippet_length",
                format!("must be between {} and {}, got {}", MIN_CONTENT_MAX_LENGTH, MAX_CONTENT_MAX_LENGTH, len),
            ));
        }
        Ok(len)
    }

    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

/// Raw caller input as it arrives from JSON or the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub query: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(alias = "response_format")]
    pub format: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    #[serde(alias = "tags")]
    pub tags_filter: Vec<String>,
    #[serde(alias = "content_max_length")]
    pub max_snippet_length: Option<i64>,
}

fn non_negative(field: &'static str, value: i64) -> MemoscopeResult<usize> {
    usize::try_from(value).map_err(|_| MemoscopeError::invalid(field, format!("must be >= 0, got {}", value)))
}

impl TryFrom<SearchParams> for SearchRequest {
    type Error = MemoscopeError;

    fn try_from(params: SearchParams) -> Result<Self, Self::Error> {
        let format = match params.format.as_deref() {
            Some(raw) => raw.parse()?,
            None => ResponseFormat::Summary,
        };
        let limit = params.limit.map(|l| non_negative("limit", l)).transpose()?.unwrap_or(DEFAULT_LIMIT);
        let offset = params.offset.map(|o| non_negative("offset", o)).transpose()?.unwrap_or(DEFAULT_OFFSET);
        let max_snippet_length = params
            .max_snippet_length
            .map(|l| non_negative("max_snippet_length", l))
            .transpose()?;

        let date_range = DateRange {
            from: params.date_from.as_deref().map(|raw| parse_timestamp("date_from", raw)).transpose()?,
            to: params.date_to.as_deref().map(|raw| parse_timestamp("date_to", raw)).transpose()?,
        };

        let tags = params
            .tags_filter
            .into_iter()
            .filter(|t| !normalize_tag(t).is_empty())
            .collect();

        Ok(SearchRequest {
            query: params.query,
            limit,
            offset,
            format,
            date_range,
            tags,
            max_snippet_length,
        })
    }
}

/// Options of the plain listing entry points (`get_latest`, `get_by_tag`).
/// `format` defaults to FULL so omitting it keeps the historical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: Option<usize>,
    pub format: ResponseFormat,
    pub content_max_length: Option<usize>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self { limit: None, format: ResponseFormat::Full, content_max_length: None }
    }
}
