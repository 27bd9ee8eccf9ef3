//! Heuristic relevance scoring for memos.
//!
//! The score is a weighted sum of independent signals, all non-negative:
//! 1. body matches: every occurrence of every query term in the body
//! 2. title matches: extra weight for occurrences in the first line
//! 3. tag matches: tags containing a query term
//! 4. position bonus: decays with the char offset of the earliest match
//! 5. phrase bonus: the whole multi-word query appears verbatim
//!
//! Each body occurrence adds a positive amount and the position bonus only
//! depends on the earliest match, so adding an occurrence never lowers a score.
//! Ordering is score descending, then creation time descending, then id.

use std::cmp::Ordering;

use crate::models::{normalize_tag, Memo};
use crate::search::{find_occurrences, fold_chars, query_terms, term_occurrences};

pub const BODY_MATCH_WEIGHT: f64 = 1.0;
/// Added on top of `BODY_MATCH_WEIGHT` for occurrences inside the first line.
pub const TITLE_MATCH_WEIGHT: f64 = 2.0;
pub const TAG_MATCH_WEIGHT: f64 = 3.0;
/// Bonus for a match at offset 0; halves by `POSITION_DECAY_CHARS`.
pub const POSITION_BONUS_MAX: f64 = 2.0;
pub const POSITION_DECAY_CHARS: f64 = 100.0;
pub const PHRASE_BONUS: f64 = 2.0;

/// Tunable weights. `Default` uses the module constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub body_match: f64,
    pub title_match: f64,
    pub tag_match: f64,
    pub position_bonus_max: f64,
    pub position_decay_chars: f64,
    pub phrase_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            body_match: BODY_MATCH_WEIGHT,
            title_match: TITLE_MATCH_WEIGHT,
            tag_match: TAG_MATCH_WEIGHT,
            position_bonus_max: POSITION_BONUS_MAX,
            position_decay_chars: POSITION_DECAY_CHARS,
            phrase_bonus: PHRASE_BONUS,
        }
    }
}

/// A memo with its relevance score. `score` is `None` when there was no query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMemo {
    pub memo: Memo,
    pub score: Option<f64>,
}

/// Relevance of `memo` for `query`. Empty query scores 0.
pub fn score(memo: &Memo, query: &str, weights: &ScoringWeights) -> f64 {
    let terms = query_terms(query);
    if terms.is_empty() {
        return 0.0;
    }

    let body = fold_chars(&memo.content);
    let occurrences = term_occurrences(&body, &terms);
    let title_len = body.iter().position(|&c| c == '\n').unwrap_or(body.len());

    let body_score = occurrences.len() as f64 * weights.body_match;
    let title_score = occurrences.iter().filter(|o| o.end <= title_len).count() as f64 * weights.title_match;

    let tags: Vec<String> = memo.tags.iter().map(|t| normalize_tag(t)).collect();
    let tag_hits = terms
        .iter()
        .map(|term| {
            let term: String = term.iter().collect();
            tags.iter().filter(|t| t.contains(&term)).count()
        })
        .sum::<usize>();
    let tag_score = tag_hits as f64 * weights.tag_match;

    let position_score = occurrences.first().map_or(0.0, |first| {
        weights.position_bonus_max / (1.0 + first.start as f64 / weights.position_decay_chars)
    });

    let phrase_score = if terms.len() > 1 && !find_occurrences(&body, &fold_chars(query.trim())).is_empty() {
        weights.phrase_bonus
    } else {
        0.0
    };

    body_score + title_score + tag_score + position_score + phrase_score
}

/// Score every memo; `score` stays `None` for an empty query.
pub fn score_all(memos: Vec<Memo>, query: &str, weights: &ScoringWeights) -> Vec<ScoredMemo> {
    let has_query = !query.trim().is_empty();
    memos
        .into_iter()
        .map(|memo| {
            let score = has_query.then(|| score(&memo, query, weights));
            ScoredMemo { memo, score }
        })
        .collect()
}

/// Result order: score desc, then newest first, then id ascending.
pub fn compare_scored(a: &ScoredMemo, b: &ScoredMemo) -> Ordering {
    let sa = a.score.unwrap_or(0.0);
    let sb = b.score.unwrap_or(0.0);
    sb.total_cmp(&sa)
        .then_with(|| b.memo.create_time.cmp(&a.memo.create_time))
        .then_with(|| a.memo.id.cmp(&b.memo.id))
}

/// Score and sort in one step.
pub fn rank(memos: Vec<Memo>, query: &str, weights: &ScoringWeights) -> Vec<ScoredMemo> {
    let mut scored = score_all(memos, query, weights);
    scored.sort_by(compare_scored);
    scored
}
