//! Structure-aware condensation of memo bodies.
//!
//! Query-independent. Lines are picked in priority order (title, then
//! headings and list items, then prose) and emitted in document order.
//! Structural lines are kept whole or dropped; the first prose line that
//! does not fit is cut on a word boundary. When anything was cut the
//! output ends with `TRUNCATION_MARKER`, and the result never exceeds
//! `max_length` chars.

pub const TRUNCATION_MARKER: &str = "…";

/// A partial prose line shorter than this is not worth emitting.
const MIN_PROSE_FRAGMENT: usize = 12;

const BULLET_PREFIXES: [&str; 3] = ["- ", "* ", "+ "];

/// Result of `condense`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condensed {
    pub text: String,
    pub truncated: bool,
}

/// Headings (`#`), bullets (`-`, `*`, `+`) and numbered items (`1.`, `2)`).
pub fn is_structural(line: &str) -> bool {
    if line.starts_with('#') || BULLET_PREFIXES.iter().any(|p| line.starts_with(p)) {
        return true;
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && matches!(line[digits..].chars().next(), Some('.') | Some(')'))
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cut `text` to at most `limit` chars without splitting a word, unless
/// the first word alone is longer than `limit`.
pub(crate) fn truncate_words(text: &str, limit: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= limit {
        return text.to_string();
    }
    let mut cut = limit;
    if !chars[limit].is_whitespace() {
        if let Some(space) = chars[..limit].iter().rposition(|c| c.is_whitespace()) {
            cut = space;
        }
    }
    chars[..cut].iter().collect::<String>().trim_end().to_string()
}

#[derive(Clone, Copy, PartialEq)]
enum LineKind {
    Title,
    Structural,
    Prose,
}

/// Condense `body` to at most `max_length` chars.
pub fn condense(body: &str, max_length: usize) -> Condensed {
    if char_len(body) <= max_length {
        return Condensed { text: body.to_string(), truncated: false };
    }

    let budget = max_length.saturating_sub(char_len(TRUNCATION_MARKER));
    let lines: Vec<(LineKind, &str)> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(i, l)| {
            let kind = if i == 0 {
                LineKind::Title
            } else if is_structural(l) {
                LineKind::Structural
            } else {
                LineKind::Prose
            };
            (kind, l)
        })
        .collect();

    let Some(&(_, title)) = lines.first() else {
        return Condensed { text: String::new(), truncated: false };
    };
    if char_len(title) > budget {
        let text = format!("{}{}", truncate_words(title, budget), TRUNCATION_MARKER);
        return Condensed { text, truncated: true };
    }

    let mut selected: Vec<Option<String>> = vec![None; lines.len()];
    selected[0] = Some(title.to_string());
    let mut used = char_len(title);
    let mut cut = false;

    for (i, &(kind, line)) in lines.iter().enumerate() {
        if kind == LineKind::Structural {
            let cost = char_len(line) + 1;
            if used + cost <= budget {
                selected[i] = Some(line.to_string());
                used += cost;
            } else {
                cut = true;
            }
        }
    }

    let mut prose_open = true;
    for (i, &(kind, line)) in lines.iter().enumerate() {
        if kind != LineKind::Prose {
            continue;
        }
        let cost = char_len(line) + 1;
        if prose_open && used + cost <= budget {
            selected[i] = Some(line.to_string());
            used += cost;
            continue;
        }
        cut = true;
        if prose_open {
            prose_open = false;
            let room = budget.saturating_sub(used + 1);
            if room >= MIN_PROSE_FRAGMENT {
                let fragment = truncate_words(line, room);
                used += char_len(&fragment) + 1;
                selected[i] = Some(fragment);
            }
        }
    }

    let mut text = selected.into_iter().flatten().collect::<Vec<_>>().join("\n");
    if cut {
        text.push_str(TRUNCATION_MARKER);
    }
    Condensed { text, truncated: cut }
}

/// Condensed text only.
pub fn summarize(body: &str, max_length: usize) -> String {
    condense(body, max_length).text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note() -> String {
        [
            "Weekly sync notes",
            "",
            "We talked about the migration for a long time and nobody could agree on the rollout order.",
            "## Decisions",
            "- ship the importer first",
            "- freeze the schema",
            "Afterwards there was a long tangent about lunch options that went on and on.",
            "1. follow up with infra",
        ]
        .join("\n")
    }

    #[test]
    fn test_short_body_unchanged() {
        let c = condense("short\n\nbody", 100);
        assert_eq!(c.text, "short\n\nbody");
        assert!(!c.truncated);
    }

    #[test]
    fn test_is_structural() {
        assert!(is_structural("# Title"));
        assert!(is_structural("### Sub"));
        assert!(is_structural("- item"));
        assert!(is_structural("* item"));
        assert!(is_structural("+ item"));
        assert!(is_structural("1. first"));
        assert!(is_structural("12) twelfth"));
        assert!(!is_structural("-dash"));
        assert!(!is_structural("2024 was a year"));
        assert!(!is_structural("plain prose"));
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("hello world again", 13), "hello world");
        assert_eq!(truncate_words("hello world again", 11), "hello world");
        assert_eq!(truncate_words("hello", 10), "hello");
        assert_eq!(truncate_words("supercalifragilistic", 5), "super");
    }

    #[test]
    fn test_structure_kept_whole_and_prose_cut() {
        let body = note();
        let c = condense(&body, 120);
        assert!(c.truncated);
        assert!(c.text.chars().count() <= 120, "len {}", c.text.chars().count());
        assert!(c.text.starts_with("Weekly sync notes"));
        assert!(c.text.contains("## Decisions"));
        assert!(c.text.contains("- ship the importer first"));
        assert!(c.text.contains("- freeze the schema"));
        assert!(c.text.contains("1. follow up with infra"));
        assert!(c.text.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_lines_keep_document_order() {
        let body = note();
        let text = summarize(&body, 120);
        let decisions = text.find("## Decisions").unwrap();
        let follow_up = text.find("1. follow up").unwrap();
        assert!(decisions < follow_up);
    }

    #[test]
    fn test_prose_cut_on_word_boundary() {
        let body = format!("Title\n{}", "alpha beta gamma delta ".repeat(10));
        let text = summarize(&body, 60);
        assert!(text.chars().count() <= 60);
        let prose = text.lines().nth(1).unwrap().trim_end_matches(TRUNCATION_MARKER);
        for word in prose.split_whitespace() {
            assert!(["alpha", "beta", "gamma", "delta"].contains(&word), "split word {:?}", word);
        }
    }

    #[test]
    fn test_long_title_truncated() {
        let body = format!("{}\nmore", "word ".repeat(50));
        let c = condense(&body, 30);
        assert!(c.truncated);
        assert!(c.text.chars().count() <= 30);
        assert!(c.text.ends_with(TRUNCATION_MARKER));
        assert!(!c.text.contains('\n'));
    }

    #[test]
    fn test_whitespace_only_excess_not_marked() {
        let body = format!("title\n{}\nend", "\n".repeat(30));
        let c = condense(&body, 20);
        assert_eq!(c.text, "title\nend");
        assert!(!c.truncated);
    }

    #[test]
    fn test_deterministic() {
        let body = note();
        assert_eq!(summarize(&body, 80), summarize(&body, 80));
    }
}
