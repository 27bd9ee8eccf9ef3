//! HTTP collaborator for a Memos server (`/api/v1/memos`).
//!
//! Thin transport only: authentication, paging through the memo list and
//! status mapping. No retries; a timeout or transport error surfaces as
//! `UpstreamUnavailable` and a 404 as `NotFound`.

use std::future::Future;

use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::{ClientConfig, FETCH_PAGE_SIZE};
use crate::interface::{MemoscopeError, MemoscopeResult, MemosApi};
use crate::models::{memo_name, memo_short_id, Memo, MemoState, Visibility};

const MEMOS_PATH: &str = "api/v1/memos";
const USER_AGENT: &str = concat!("memoscope/", env!("CARGO_PKG_VERSION"));

/// Upper bound on list pages walked for one candidate fetch.
const MAX_FETCH_PAGES: usize = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Wire payloads
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemoPayload {
    name: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    create_time: DateTime<Utc>,
    #[serde(default)]
    update_time: Option<DateTime<Utc>>,
    #[serde(default)]
    state: Option<MemoState>,
    #[serde(default)]
    visibility: Option<Visibility>,
}

impl From<MemoPayload> for Memo {
    fn from(p: MemoPayload) -> Self {
        Memo {
            id: p.name,
            content: p.content,
            tags: p.tags.into_iter().collect(),
            create_time: p.create_time,
            update_time: p.update_time.unwrap_or(p.create_time),
            state: p.state.unwrap_or(MemoState::Normal),
            visibility: p.visibility.unwrap_or(Visibility::Private),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPayload {
    #[serde(default)]
    memos: Vec<MemoPayload>,
    #[serde(default)]
    next_page_token: String,
}

#[derive(Debug, Serialize)]
struct CreateBody<'a> {
    content: &'a str,
    visibility: Visibility,
}

#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    content: &'a str,
}

/// The server derives tags from `#tag` words, so tags travel inside the content.
pub(crate) fn compose_content(content: &str, tags: &[String]) -> String {
    let words: Vec<String> = tags
        .iter()
        .map(|t| t.trim().trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{}", t))
        .collect();
    if words.is_empty() {
        content.to_string()
    } else {
        format!("{}\n\n{}", content, words.join(" "))
    }
}

fn status_error(status: StatusCode, name: &str) -> MemoscopeError {
    match status {
        StatusCode::NOT_FOUND => MemoscopeError::NotFound(name.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            MemoscopeError::UpstreamUnavailable(format!("authentication rejected ({})", status))
        }
        other => MemoscopeError::UpstreamUnavailable(format!("{} returned {}", name, other)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

pub struct MemosClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
}

impl MemosClient {
    pub fn new(config: &ClientConfig) -> MemoscopeResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        // `Url::join` replaces the last segment unless the base ends with '/'
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { http, base_url, access_token: config.access_token.clone() })
    }

    fn collection_url(&self) -> MemoscopeResult<Url> {
        self.base_url
            .join(MEMOS_PATH)
            .map_err(|e| MemoscopeError::UpstreamUnavailable(format!("bad memos url: {}", e)))
    }

    fn memo_url(&self, id: &str) -> MemoscopeResult<Url> {
        self.base_url
            .join(&format!("{}/{}", MEMOS_PATH, memo_short_id(id)))
            .map_err(|e| MemoscopeError::UpstreamUnavailable(format!("bad memo url: {}", e)))
    }

    fn list_url(&self, page_token: &str) -> MemoscopeResult<Url> {
        let mut url = self.collection_url()?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &FETCH_PAGE_SIZE.to_string());
            if !page_token.is_empty() {
                query.append_pair("pageToken", page_token);
            }
        }
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, name: &str, body: Option<serde_json::Value>) -> MemoscopeResult<reqwest::Response> {
        let mut request = self.http.request(method.clone(), url.clone()).bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        debug!(%method, path = url.path(), status = status.as_u16(), "memos request");
        if !status.is_success() {
            return Err(status_error(status, name));
        }
        Ok(response)
    }

    async fn send_for_memo(&self, method: Method, url: Url, name: &str, body: Option<serde_json::Value>) -> MemoscopeResult<Memo> {
        let payload: MemoPayload = self.send(method, url, name, body).await?.json().await?;
        Ok(payload.into())
    }
}

fn to_json<T: Serialize>(body: &T) -> MemoscopeResult<serde_json::Value> {
    serde_json::to_value(body).map_err(|e| MemoscopeError::UpstreamUnavailable(format!("request encoding failed: {}", e)))
}

/// Walk the list pages until the server stops handing out tokens.
///
/// A listing longer than `max_pages` is an error: returning what was read so
/// far would misreport every count derived from it.
async fn collect_pages<F, Fut>(max_pages: usize, mut fetch_page: F) -> MemoscopeResult<Vec<MemoPayload>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = MemoscopeResult<ListPayload>>,
{
    let mut memos = Vec::new();
    let mut page_token = String::new();
    for page in 1..=max_pages {
        let list = fetch_page(std::mem::take(&mut page_token)).await?;
        memos.extend(list.memos);
        if list.next_page_token.is_empty() {
            debug!(pages = page, memos = memos.len(), "listed memos");
            return Ok(memos);
        }
        page_token = list.next_page_token;
    }
    warn!(max_pages, "memo listing exceeds page cap");
    Err(MemoscopeError::UpstreamUnavailable(format!(
        "candidate set exceeds {} pages of {} memos",
        max_pages, FETCH_PAGE_SIZE
    )))
}

#[async_trait::async_trait]
impl MemosApi for MemosClient {
    async fn fetch_candidates(&self, query: &str) -> MemoscopeResult<Vec<Memo>> {
        let memos = collect_pages(MAX_FETCH_PAGES, |page_token| async move {
            let url = self.list_url(&page_token)?;
            let list: ListPayload = self.send(Method::GET, url, MEMOS_PATH, None).await?.json().await?;
            Ok::<_, MemoscopeError>(list)
        })
        .await?;

        let candidates: Vec<Memo> = memos
            .into_iter()
            .map(Memo::from)
            .filter(|m| m.matches_keywords(query))
            .collect();
        debug!(candidates = candidates.len(), "fetched candidates");
        Ok(candidates)
    }

    async fn get_by_id(&self, id: &str) -> MemoscopeResult<Memo> {
        let url = self.memo_url(id)?;
        self.send_for_memo(Method::GET, url, &memo_name(id), None).await
    }

    async fn create(&self, content: &str, tags: &[String]) -> MemoscopeResult<Memo> {
        let content = compose_content(content, tags);
        let body = to_json(&CreateBody { content: &content, visibility: Visibility::Private })?;
        let url = self.collection_url()?;
        self.send_for_memo(Method::POST, url, MEMOS_PATH, Some(body)).await
    }

    async fn update(&self, id: &str, content: &str, tags: &[String]) -> MemoscopeResult<Memo> {
        let content = compose_content(content, tags);
        let body = to_json(&UpdateBody { content: &content })?;
        let url = self.memo_url(id)?;
        self.send_for_memo(Method::PATCH, url, &memo_name(id), Some(body)).await
    }

    async fn delete(&self, id: &str) -> MemoscopeResult<()> {
        let url = self.memo_url(id)?;
        self.send(Method::DELETE, url, &memo_name(id), None).await?;
        Ok(())
    }
}
