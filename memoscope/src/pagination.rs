//! Offset/limit slicing with pagination metadata.

use crate::config::MAX_LIMIT;
use crate::interface::{MemoscopeError, MemoscopeResult};

/// One page of an ordered result set
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole set before slicing
    pub total_count: usize,
    pub returned_count: usize,
    pub has_more: bool,
    /// `offset + returned_count` while more items remain
    pub next_offset: Option<usize>,
}

/// Slice `items[offset..offset + limit]`.
///
/// `limit` must lie in `[1, MAX_LIMIT]`; callers clamp and report before
/// getting here. An offset past the end is a valid empty page.
pub fn paginate<T>(items: Vec<T>, offset: usize, limit: usize) -> MemoscopeResult<Page<T>> {
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(MemoscopeError::invalid(
            "limit",
            format!("must be between 1 and {}, got {}", MAX_LIMIT, limit),
        ));
    }

    let total_count = items.len();
    let page: Vec<T> = items.into_iter().skip(offset).take(limit).collect();
    let returned_count = page.len();
    let has_more = offset.saturating_add(returned_count) < total_count;

    Ok(Page {
        items: page,
        total_count,
        returned_count,
        has_more,
        next_offset: has_more.then(|| offset + returned_count),
    })
}
