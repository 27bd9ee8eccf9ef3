//! Snippet extraction (term occurrences + densest-window excerpting)
//!
//! Query terms are matched as case-insensitive substrings of the body. The
//! excerpt window is placed over the densest cluster of occurrences, then its
//! edges are nudged onto word boundaries. All offsets are char offsets:
//! `fold_chars` lowercases one char into exactly one char, so positions found
//! in the folded body are valid positions in the original body.

use crate::interface::{HighlightRange, Snippet};

/// How far (in chars) a window edge may move to land on a word boundary.
pub(crate) const WORD_BOUNDARY_SLACK: usize = 8;

/// Case-fold a single char without changing the char count.
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

pub(crate) fn fold_chars(text: &str) -> Vec<char> {
    text.chars().map(fold_char).collect()
}

/// Whitespace-delimited query terms, case-folded, first occurrence wins on duplicates.
pub(crate) fn query_terms(query: &str) -> Vec<Vec<char>> {
    let mut terms: Vec<Vec<char>> = Vec::new();
    for word in query.split_whitespace() {
        let folded = fold_chars(word);
        if !terms.contains(&folded) {
            terms.push(folded);
        }
    }
    terms
}

/// Non-overlapping occurrences of `needle` in `haystack`, scanning left to right.
pub(crate) fn find_occurrences(haystack: &[char], needle: &[char]) -> Vec<usize> {
    let mut positions = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return positions;
    }
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if haystack[i..i + needle.len()] == *needle {
            positions.push(i);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    positions
}

/// Every occurrence of every term, sorted by position.
/// Occurrences of different terms may overlap.
pub(crate) fn term_occurrences(folded_body: &[char], terms: &[Vec<char>]) -> Vec<HighlightRange> {
    let mut ranges: Vec<HighlightRange> = terms
        .iter()
        .flat_map(|term| {
            find_occurrences(folded_body, term)
                .into_iter()
                .map(move |start| HighlightRange { start, end: start + term.len() })
        })
        .collect();
    ranges.sort_unstable();
    ranges
}

/// Find the window of `window_size` chars that contains the most occurrences.
///
/// Candidate windows start at an occurrence (any best window can slide right
/// onto one without losing matches). Ties go to the earliest window.
/// Returns the `[start, end)` span covered by the winning cluster.
pub(crate) fn find_densest_cluster(occurrences: &[HighlightRange], window_size: usize) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, usize)> = None; // (count, start, end)

    for (left, anchor) in occurrences.iter().enumerate() {
        let limit = anchor.start + window_size;
        let mut count = 0;
        let mut cluster_end = anchor.start;
        for occ in occurrences[left..].iter().take_while(|o| o.start < limit) {
            if occ.end <= limit {
                count += 1;
                cluster_end = cluster_end.max(occ.end);
            }
        }
        if count > 0 && best.map_or(true, |(best_count, _, _)| count > best_count) {
            best = Some((count, anchor.start, cluster_end));
        }
    }

    best.map(|(_, start, end)| (start, end))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A cut at `pos` does not split a word.
fn is_boundary(chars: &[char], pos: usize) -> bool {
    pos == 0 || pos >= chars.len() || !is_word_char(chars[pos - 1]) || !is_word_char(chars[pos])
}

/// Move a window start off a mid-word position. Prefers moving forward
/// (shrinking) but never past `keep`; otherwise extends backward by at most
/// `WORD_BOUNDARY_SLACK`.
fn snap_start(chars: &[char], start: usize, keep: usize) -> usize {
    if is_boundary(chars, start) {
        return start;
    }
    let forward_limit = (start + WORD_BOUNDARY_SLACK).min(keep);
    if let Some(pos) = (start + 1..=forward_limit).find(|&p| is_boundary(chars, p)) {
        return pos;
    }
    let backward_limit = start.saturating_sub(WORD_BOUNDARY_SLACK);
    (backward_limit..start).rev().find(|&p| is_boundary(chars, p)).unwrap_or(start)
}

/// Mirror of `snap_start` for the window end; never moves before `keep`.
fn snap_end(chars: &[char], end: usize, keep: usize) -> usize {
    if is_boundary(chars, end) {
        return end;
    }
    let backward_limit = end.saturating_sub(WORD_BOUNDARY_SLACK).max(keep);
    if let Some(pos) = (backward_limit..end).rev().find(|&p| is_boundary(chars, p)) {
        return pos;
    }
    let forward_limit = (end + WORD_BOUNDARY_SLACK).min(chars.len());
    (end + 1..=forward_limit).find(|&p| is_boundary(chars, p)).unwrap_or(end)
}

/// First `max_length` chars of `body`, no highlights.
fn leading_snippet(chars: &[char], max_length: usize) -> Snippet {
    Snippet {
        text: chars[..max_length.min(chars.len())].iter().collect(),
        highlights: Vec::new(),
        offset: 0,
    }
}

/// Extract a bounded excerpt of `body` around the densest cluster of `query` matches.
///
/// - Empty query, or no term found: the first `max_length` chars.
/// - Otherwise a window of `max_length` chars centered on the densest cluster,
///   with edges moved onto word boundaries (which may grow the window by up to
///   `WORD_BOUNDARY_SLACK` chars per side).
///
/// Highlights cover every occurrence fully inside the window, relative to the
/// window start, with overlapping spans merged.
pub fn extract(body: &str, query: &str, max_length: usize) -> Snippet {
    let chars: Vec<char> = body.chars().collect();
    let terms = query_terms(query);
    if terms.is_empty() || max_length == 0 {
        return leading_snippet(&chars, max_length);
    }

    let folded = fold_chars(body);
    let occurrences = term_occurrences(&folded, &terms);
    let Some((cluster_start, cluster_end)) = find_densest_cluster(&occurrences, max_length) else {
        return leading_snippet(&chars, max_length);
    };

    // Center the window on the cluster, then pull it back inside the body
    let slack = max_length - (cluster_end - cluster_start);
    let mut start = cluster_start.saturating_sub(slack / 2);
    if start + max_length > chars.len() {
        start = chars.len().saturating_sub(max_length);
    }
    let end = (start + max_length).min(chars.len());

    excerpt(&chars, &occurrences, start, end, (cluster_start, cluster_end))
}

/// Cut `[start, end)` out of `chars` with its edges on word boundaries and
/// surrounding whitespace dropped, never cutting into `keep`. Highlights
/// cover occurrences fully inside the excerpt, window-relative and with
/// overlapping spans merged.
fn excerpt(
    chars: &[char],
    occurrences: &[HighlightRange],
    start: usize,
    end: usize,
    keep: (usize, usize),
) -> Snippet {
    let (keep_start, keep_end) = keep;
    let mut start = snap_start(chars, start, keep_start);
    let mut end = snap_end(chars, end, keep_end);
    while start < keep_start && chars[start].is_whitespace() {
        start += 1;
    }
    while end > keep_end && chars[end - 1].is_whitespace() {
        end -= 1;
    }

    let mut highlights: Vec<HighlightRange> = Vec::new();
    for occ in occurrences.iter().filter(|o| o.start >= start && o.end <= end) {
        let rel = HighlightRange { start: occ.start - start, end: occ.end - start };
        match highlights.last_mut() {
            Some(last) if rel.start < last.end => last.end = last.end.max(rel.end),
            _ => highlights.push(rel),
        }
    }

    Snippet {
        text: chars[start..end].iter().collect(),
        highlights,
        offset: start,
    }
}

/// Short excerpts around individual matches, in document order.
///
/// Each excerpt shows `context_chars` on both sides of one match. A match
/// already visible in the previous excerpt does not open a new one. At most
/// `max_windows` excerpts are returned; none for an empty query.
pub fn match_windows(body: &str, query: &str, context_chars: usize, max_windows: usize) -> Vec<Snippet> {
    let terms = query_terms(query);
    if terms.is_empty() {
        return Vec::new();
    }
    let chars: Vec<char> = body.chars().collect();
    let occurrences = term_occurrences(&fold_chars(body), &terms);

    let mut windows: Vec<Snippet> = Vec::new();
    let mut covered_to = 0;
    for occ in &occurrences {
        if windows.len() >= max_windows {
            break;
        }
        if occ.end <= covered_to {
            continue;
        }
        let start = occ.start.saturating_sub(context_chars);
        let end = (occ.end + context_chars).min(chars.len());
        let window = excerpt(&chars, &occurrences, start, end, (occ.start, occ.end));
        covered_to = window.offset + window.text.chars().count();
        windows.push(window);
    }
    windows
}

/// Whether `snippet` omits any part of a body of `body_chars` chars.
pub fn is_truncated(snippet: &Snippet, body_chars: usize) -> bool {
    snippet.offset > 0 || snippet.offset + snippet.text.chars().count() < body_chars
}
