//! Request limits, defaults and upstream connection settings.
//!
//! Limits and defaults are compile-time constants. Connection settings come
//! from the environment (`MEMOS_URL`, `MEMOS_ACCESS_TOKEN` / `MEMOS_API_KEY`,
//! `DEFAULT_TAG`, `MEMOS_TIMEOUT_SECS`) and may be overridden by CLI flags.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Page size when the request omits `limit`.
pub const DEFAULT_LIMIT: usize = 10;

/// Hard upper bound on page size.
pub const MAX_LIMIT: usize = 50;

pub const DEFAULT_OFFSET: usize = 0;

/// Default char budget for SUMMARY snippets and summaries.
pub const DEFAULT_CONTENT_MAX_LENGTH: usize = 500;
pub const MIN_CONTENT_MAX_LENGTH: usize = 20;
pub const MAX_CONTENT_MAX_LENGTH: usize = 2000;

/// Char budget of the MINIMAL tier snippet.
pub const MINIMAL_SNIPPET_LENGTH: usize = 100;

/// Per-match excerpts on SUMMARY results: context on each side and count.
pub const MATCH_CONTEXT_CHARS: usize = 50;
pub const MAX_MATCH_SNIPPETS: usize = 3;

/// Listing entry points (`get_latest`, `get_by_tag`)
pub const LATEST_DEFAULT_LIMIT: usize = 3;
pub const BY_TAG_DEFAULT_LIMIT: usize = 10;
pub const MAX_LIST_LIMIT: usize = 20;
pub const LATEST_CONTENT_MAX_LENGTH: usize = 300;
pub const BY_TAG_CONTENT_MAX_LENGTH: usize = 400;

/// Page size of the backward-compatible `search_memos`.
pub const LEGACY_SEARCH_LIMIT: usize = 20;

/// Tag attached to every memo created through this crate.
pub const DEFAULT_TAG: &str = "#MCP";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Page size used when walking the upstream memo list.
pub const FETCH_PAGE_SIZE: usize = 200;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("Invalid MEMOS_URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Connection settings for the upstream notes service
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub access_token: String,
    pub default_tag: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: Url, access_token: impl Into<String>) -> Self {
        Self {
            base_url,
            access_token: access_token.into(),
            default_tag: DEFAULT_TAG.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (env, CLI overlay, tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = non_empty("MEMOS_URL").ok_or(ConfigError::Missing("MEMOS_URL"))?;
        let base_url = Url::parse(raw_url.trim())?;

        let access_token = non_empty("MEMOS_ACCESS_TOKEN")
            .or_else(|| non_empty("MEMOS_API_KEY"))
            .ok_or(ConfigError::Missing("MEMOS_ACCESS_TOKEN or MEMOS_API_KEY"))?;

        let mut config = Self::new(base_url, access_token.trim());

        if let Some(tag) = non_empty("DEFAULT_TAG") {
            config.default_tag = tag.trim().to_string();
        }

        if let Some(raw) = non_empty("MEMOS_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "MEMOS_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
