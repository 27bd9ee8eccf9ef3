//! Reduce scored memos to one output tier.

use crate::config::{MATCH_CONTEXT_CHARS, MAX_MATCH_SNIPPETS, MINIMAL_SNIPPET_LENGTH};
use crate::interface::{FullMemo, IdOnlyMemo, MinimalMemo, ProjectedMemo, Snippet, SummaryMemo};
use crate::models::ResponseFormat;
use crate::ranking::ScoredMemo;
use crate::search::{extract, is_truncated, match_windows, WORD_BOUNDARY_SLACK};
use crate::summary::condense;

/// Window requested for MINIMAL snippets, leaving room for word-boundary
/// snapping so the result stays within `MINIMAL_SNIPPET_LENGTH`.
const MINIMAL_WINDOW: usize = MINIMAL_SNIPPET_LENGTH - 2 * WORD_BOUNDARY_SLACK;

/// Request context a projection depends on.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionOptions<'a> {
    pub query: &'a str,
    /// Char budget of SUMMARY snippets and summaries
    pub content_max_length: usize,
}

fn tag_list(scored: &ScoredMemo) -> Vec<String> {
    scored.memo.tags.iter().cloned().collect()
}

/// Project one memo. Reads from `scored` only; the source memo is never changed.
pub fn project(scored: &ScoredMemo, format: ResponseFormat, opts: &ProjectionOptions<'_>) -> ProjectedMemo {
    let memo = &scored.memo;
    match format {
        ResponseFormat::IdOnly => ProjectedMemo::IdOnly(IdOnlyMemo { id: memo.id.clone() }),
        ResponseFormat::Minimal => ProjectedMemo::Minimal(MinimalMemo {
            id: memo.id.clone(),
            snippet: extract(&memo.content, opts.query, MINIMAL_WINDOW.min(opts.content_max_length)),
            tags: tag_list(scored),
        }),
        ResponseFormat::Summary => {
            let content_length = memo.content.chars().count();
            let snippet = extract(&memo.content, opts.query, opts.content_max_length);
            // A query that only hit tags leaves nothing to center on
            let (summary, truncated) = if snippet.highlights.is_empty() {
                let condensed = condense(&memo.content, opts.content_max_length);
                (Snippet { text: condensed.text, ..Snippet::default() }, condensed.truncated)
            } else {
                let truncated = is_truncated(&snippet, content_length);
                (snippet, truncated)
            };
            ProjectedMemo::Summary(SummaryMemo {
                id: memo.id.clone(),
                tags: tag_list(scored),
                create_time: memo.create_time,
                relevance_score: scored.score,
                summary,
                match_snippets: match_windows(&memo.content, opts.query, MATCH_CONTEXT_CHARS, MAX_MATCH_SNIPPETS),
                content_length,
                truncated,
            })
        }
        ResponseFormat::Full => ProjectedMemo::Full(FullMemo {
            id: memo.id.clone(),
            content: memo.content.clone(),
            tags: tag_list(scored),
            create_time: memo.create_time,
            update_time: memo.update_time,
            state: memo.state,
            visibility: memo.visibility,
        }),
    }
}

pub fn project_all(page: &[ScoredMemo], format: ResponseFormat, opts: &ProjectionOptions<'_>) -> Vec<ProjectedMemo> {
    page.iter().map(|scored| project(scored, format, opts)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Memo, MemoState, Visibility};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn scored(content: &str, tags: &[&str], score: Option<f64>) -> ScoredMemo {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
        ScoredMemo {
            memo: Memo {
                id: "memos/q1".into(),
                content: content.into(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                create_time: ts,
                update_time: ts + chrono::Duration::hours(1),
                state: MemoState::Normal,
                visibility: Visibility::Private,
            },
            score,
        }
    }

    fn opts(query: &str) -> ProjectionOptions<'_> {
        ProjectionOptions { query, content_max_length: 500 }
    }

    fn keys(p: &ProjectedMemo) -> BTreeSet<String> {
        match serde_json::to_value(p).unwrap() {
            serde_json::Value::Object(map) => map.keys().cloned().collect(),
            other => panic!("not an object: {}", other),
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_id_only() {
        let p = project(&scored("quarterly report", &["work"], Some(1.0)), ResponseFormat::IdOnly, &opts("report"));
        assert_eq!(keys(&p), set(&["id"]));
        assert_eq!(p.id(), "memos/q1");
        assert_eq!(p.format(), ResponseFormat::IdOnly);
    }

    #[test]
    fn test_minimal_has_highlighted_snippet_and_tags() {
        let p = project(&scored("quarterly report", &["work"], Some(1.0)), ResponseFormat::Minimal, &opts("report"));
        let ProjectedMemo::Minimal(m) = p else { panic!("expected minimal") };
        assert!(m.snippet.text.contains("report"));
        assert_eq!(m.snippet.highlights.len(), 1);
        let h = m.snippet.highlights[0];
        assert_eq!(&m.snippet.text[h.start..h.end], "report");
        assert_eq!(m.tags, vec!["work".to_string()]);
    }

    #[test]
    fn test_minimal_snippet_bounded() {
        let content = format!("{} needle {}", "lorem ipsum ".repeat(40), "dolor sit ".repeat(40));
        let p = project(&scored(&content, &[], Some(1.0)), ResponseFormat::Minimal, &opts("needle"));
        let ProjectedMemo::Minimal(m) = p else { panic!("expected minimal") };
        assert!(m.snippet.text.chars().count() <= MINIMAL_SNIPPET_LENGTH);
        assert!(m.snippet.text.contains("needle"));
    }

    #[test]
    fn test_summary_with_query_uses_snippet() {
        let content = format!("{}needle here{}", "filler text ".repeat(100), " more words".repeat(100));
        let p = project(&scored(&content, &["t"], Some(4.2)), ResponseFormat::Summary, &opts("needle"));
        let ProjectedMemo::Summary(s) = p else { panic!("expected summary") };
        assert_eq!(s.relevance_score, Some(4.2));
        assert!(s.truncated);
        assert_eq!(s.content_length, content.chars().count());
        assert!(!s.summary.highlights.is_empty());
        assert!(s.summary.offset > 0);
    }

    #[test]
    fn test_summary_without_query_uses_summarizer() {
        let content = format!("Title line\n## Heading\n{}", "prose words ".repeat(100));
        let p = project(&scored(&content, &[], None), ResponseFormat::Summary, &opts(""));
        let ProjectedMemo::Summary(s) = p.clone() else { panic!("expected summary") };
        assert_eq!(s.relevance_score, None);
        assert!(s.truncated);
        assert!(s.summary.highlights.is_empty());
        assert!(s.summary.text.starts_with("Title line\n## Heading"));
        assert!(!keys(&p).contains("relevance_score"));
    }

    #[test]
    fn test_summary_short_body_not_truncated() {
        let p = project(&scored("tiny", &[], None), ResponseFormat::Summary, &opts(""));
        let ProjectedMemo::Summary(s) = p else { panic!("expected summary") };
        assert!(!s.truncated);
        assert_eq!(s.summary.text, "tiny");
    }

    #[test]
    fn test_full_is_verbatim() {
        let content = "x".repeat(5000);
        let p = project(&scored(&content, &["a", "b"], Some(1.0)), ResponseFormat::Full, &opts("x"));
        let ProjectedMemo::Full(f) = p else { panic!("expected full") };
        assert_eq!(f.content, content);
        assert_eq!(f.tags, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(f.state, MemoState::Normal);
        assert!(f.update_time > f.create_time);
    }

    #[test]
    fn test_projection_idempotent() {
        let s = scored("quarterly report\n- item", &["work"], Some(2.0));
        for format in ResponseFormat::ALL {
            assert_eq!(project(&s, format, &opts("report")), project(&s, format, &opts("report")));
        }
    }

    #[test]
    fn test_field_sets_narrow() {
        let s = scored("quarterly report", &["work"], Some(2.0));
        let id_only = keys(&project(&s, ResponseFormat::IdOnly, &opts("report")));
        let minimal = keys(&project(&s, ResponseFormat::Minimal, &opts("report")));
        let summary = keys(&project(&s, ResponseFormat::Summary, &opts("report")));
        let full = keys(&project(&s, ResponseFormat::Full, &opts("report")));

        assert!(id_only.is_subset(&minimal));
        let minimal_plain: BTreeSet<String> = minimal.difference(&set(&["snippet"])).cloned().collect();
        assert!(minimal_plain.is_subset(&summary));
        let synthesized = set(&["summary", "match_snippets", "relevance_score", "content_length", "truncated"]);
        let summary_plain: BTreeSet<String> = summary.difference(&synthesized).cloned().collect();
        assert!(summary_plain.is_subset(&full));
        assert!(id_only.len() < minimal.len() && minimal.len() < summary.len());
    }

    #[test]
    fn test_source_memo_untouched() {
        let s = scored("quarterly report", &["work"], Some(2.0));
        let before = s.clone();
        let _ = project_all(std::slice::from_ref(&s), ResponseFormat::Summary, &opts("report"));
        assert_eq!(s, before);
    }

    #[test]
    fn test_summary_falls_back_when_only_tags_match() {
        let content = format!("Intro line\n{}\n## Key heading\n- key item", "prose words here ".repeat(60));
        let opts = ProjectionOptions { query: "mcp", content_max_length: 120 };
        let p = project(&scored(&content, &["mcp"], Some(3.0)), ResponseFormat::Summary, &opts);
        let ProjectedMemo::Summary(s) = p else { panic!("expected summary") };
        assert!(s.truncated);
        assert!(s.summary.highlights.is_empty());
        assert!(s.summary.text.starts_with("Intro line"));
        assert!(s.summary.text.contains("## Key heading"));
        assert!(s.summary.text.contains("- key item"));
        assert!(s.summary.text.ends_with(crate::summary::TRUNCATION_MARKER));
        assert!(s.summary.text.chars().count() <= 120);
        assert!(s.match_snippets.is_empty());
    }

    #[test]
    fn test_summary_match_snippets_bounded() {
        let content = (0..6).map(|i| format!("needle {} {}", i, "padding words ".repeat(10))).collect::<String>();
        let p = project(&scored(&content, &[], Some(1.0)), ResponseFormat::Summary, &opts("needle"));
        let ProjectedMemo::Summary(s) = p.clone() else { panic!("expected summary") };
        assert_eq!(s.match_snippets.len(), MAX_MATCH_SNIPPETS);
        assert!(s.match_snippets.iter().all(|m| m.highlights.len() == 1));
        assert!(keys(&p).contains("match_snippets"));

        let p = project(&scored(&content, &[], None), ResponseFormat::Summary, &opts(""));
        assert!(!keys(&p).contains("match_snippets"));
    }
}
