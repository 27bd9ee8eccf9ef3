//! In-process notes service.
//!
//! Backs tests, benchmarks and offline runs with the same `MemosApi` contract
//! as the HTTP client. Candidate matching follows `Memo::matches_keywords`.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::interface::{MemoscopeError, MemoscopeResult, MemosApi};
use crate::models::{memo_name, Memo, MemoState, Visibility};

/// Tags as the notes service stores them: without `#`, empty ones dropped.
fn clean_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|t| t.trim().trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct InMemoryMemos {
    memos: RwLock<Vec<Memo>>,
    next_id: AtomicU64,
    offline: AtomicBool,
}

impl Default for InMemoryMemos {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMemos {
    pub fn new() -> Self {
        Self {
            memos: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            offline: AtomicBool::new(false),
        }
    }

    /// Seed with existing memos; ids are kept as given.
    pub fn with_memos(memos: impl IntoIterator<Item = Memo>) -> Self {
        let memos: Vec<Memo> = memos.into_iter().collect();
        Self {
            next_id: AtomicU64::new(memos.len() as u64 + 1),
            memos: RwLock::new(memos),
            offline: AtomicBool::new(false),
        }
    }

    /// Add a memo with an explicit creation time.
    pub fn insert(&self, content: &str, tags: &[&str], create_time: DateTime<Utc>) -> Memo {
        let memo = Memo {
            id: self.allocate_id(),
            content: content.to_string(),
            tags: clean_tags(tags.iter().copied()),
            create_time,
            update_time: create_time,
            state: MemoState::Normal,
            visibility: Visibility::Private,
        };
        self.memos.write().push(memo.clone());
        memo
    }

    /// Simulate an unreachable service: every call fails with `UpstreamUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.memos.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate_id(&self) -> String {
        format!("memos/{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn ensure_online(&self) -> MemoscopeResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(MemoscopeError::UpstreamUnavailable("in-memory service is offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MemosApi for InMemoryMemos {
    async fn fetch_candidates(&self, query: &str) -> MemoscopeResult<Vec<Memo>> {
        self.ensure_online()?;
        Ok(self
            .memos
            .read()
            .iter()
            .filter(|m| m.matches_keywords(query))
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> MemoscopeResult<Memo> {
        self.ensure_online()?;
        let name = memo_name(id);
        self.memos
            .read()
            .iter()
            .find(|m| m.id == name)
            .cloned()
            .ok_or(MemoscopeError::NotFound(name))
    }

    async fn create(&self, content: &str, tags: &[String]) -> MemoscopeResult<Memo> {
        self.ensure_online()?;
        let now = Utc::now();
        let memo = Memo {
            id: self.allocate_id(),
            content: content.to_string(),
            tags: clean_tags(tags.iter().map(String::as_str)),
            create_time: now,
            update_time: now,
            state: MemoState::Normal,
            visibility: Visibility::Private,
        };
        self.memos.write().push(memo.clone());
        Ok(memo)
    }

    async fn update(&self, id: &str, content: &str, tags: &[String]) -> MemoscopeResult<Memo> {
        self.ensure_online()?;
        let name = memo_name(id);
        let mut memos = self.memos.write();
        let memo = memos
            .iter_mut()
            .find(|m| m.id == name)
            .ok_or_else(|| MemoscopeError::NotFound(name.clone()))?;
        memo.content = content.to_string();
        memo.tags = clean_tags(tags.iter().map(String::as_str));
        memo.update_time = Utc::now().max(memo.create_time);
        Ok(memo.clone())
    }

    async fn delete(&self, id: &str) -> MemoscopeResult<()> {
        self.ensure_online()?;
        let name = memo_name(id);
        let mut memos = self.memos.write();
        let before = memos.len();
        memos.retain(|m| m.id != name);
        if memos.len() == before {
            return Err(MemoscopeError::NotFound(name));
        }
        Ok(())
    }
}
