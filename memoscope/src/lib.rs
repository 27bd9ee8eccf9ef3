//! Memoscope - response shaping for a Memos notes server
//!
//! Fetches memos from the upstream service and reduces them to what a
//! context-limited caller can afford: relevance ordering, pagination,
//! query-centered snippets, structure-aware summaries and tiered output
//! formats (ID_ONLY, MINIMAL, SUMMARY, FULL).

pub mod client;
pub mod config;
pub mod interface;
pub mod memory;
pub mod models;
pub mod pagination;
pub mod projection;
pub mod ranking;
pub mod search;
mod store;
pub mod summary;

pub use client::MemosClient;
pub use interface::*;
pub use memory::InMemoryMemos;
pub use models::{DateRange, ListOptions, Memo, ResponseFormat, SearchParams, SearchRequest};
pub use store::MemoStore;
