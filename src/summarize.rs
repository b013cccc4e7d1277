//! Keyword-driven extractive summarization.
//!
//! Sentences mentioning one of a fixed set of topical keywords are kept
//! verbatim. Keyword-sparse documents fall back to their opening sentences.

/// Default upper bound on summary length, in words.
pub const DEFAULT_MAX_WORDS: usize = 220;

/// Lowercase keywords; a sentence is selected if it contains any of them.
const KEYWORDS: &[&str] = &[
    "purpose",
    "goal",
    "result",
    "conclusion",
    "find",
    "show",
    "study",
    "research",
    "important",
    "significant",
    "suggest",
    "improve",
    "develop",
    "main",
    "aim",
];

/// Fewer keyword hits than this and the leading sentences are used instead.
const MIN_SELECTED: usize = 4;
const FALLBACK_SENTENCES: usize = 6;
const ELLIPSIS: &str = "...";

/// Summarize `text` to at most `max_words` words.
///
/// Output is deterministic. When the joined sentences run over the limit the
/// first `max_words` words are kept and `...` is appended to the last one.
/// A limit of zero yields an empty summary.
pub fn summarize(text: &str, max_words: usize) -> String {
    let normalized = normalize_whitespace(text);
    let sentences = split_sentences(&normalized);

    let mut selected: Vec<&str> = sentences
        .iter()
        .copied()
        .filter(|s| mentions_keyword(s))
        .collect();

    if selected.len() < MIN_SELECTED {
        log::debug!(
            "Only {} keyword sentences of {}, using the first {}",
            selected.len(),
            sentences.len(),
            FALLBACK_SENTENCES
        );
        selected = sentences.iter().copied().take(FALLBACK_SENTENCES).collect();
    }

    let summary = selected.join(" ");
    let words: Vec<&str> = summary.split_whitespace().collect();
    if max_words == 0 {
        return String::new();
    }
    if words.len() > max_words {
        let mut truncated = words[..max_words].join(" ");
        truncated.push_str(ELLIPSIS);
        return truncated;
    }
    summary
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split after `.`, `!` or `?` when followed by whitespace.
///
/// Expects whitespace-normalized input, so a boundary is always exactly one
/// space. Abbreviations like "e.g. this" split too; that's accepted.
fn split_sentences(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev_terminal = false;
    for (idx, ch) in text.char_indices() {
        if ch == ' ' && prev_terminal {
            sentences.push(&text[start..idx]);
            start = idx + 1;
        }
        prev_terminal = matches!(ch, '.' | '!' | '?');
    }
    sentences.push(&text[start..]);
    sentences
}

fn mentions_keyword(sentence: &str) -> bool {
    let lower = sentence.to_lowercase();
    KEYWORDS.iter().any(|k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::{split_sentences, summarize, DEFAULT_MAX_WORDS};

    #[test]
    fn zero_limit_gives_an_empty_summary() {
        assert_eq!(summarize("one two three.", 0), "");
    }

    #[test]
    fn splits_on_terminal_punctuation_followed_by_space() {
        assert_eq!(
            split_sentences("One. Two! Three? Four"),
            vec!["One.", "Two!", "Three?", "Four"]
        );
    }

    #[test]
    fn keeps_decimal_points_inside_sentences() {
        assert_eq!(
            split_sentences("Version 2.0 shipped. Done."),
            vec!["Version 2.0 shipped.", "Done."]
        );
    }

    #[test]
    fn selects_keyword_sentences_when_there_are_enough() {
        let text = "The purpose is clear. Weather was nice. Results were strong. \
                    We had lunch. This study matters. Findings suggest more work. \
                    Nothing else.";
        assert_eq!(
            summarize(text, DEFAULT_MAX_WORDS),
            "The purpose is clear. Results were strong. This study matters. \
             Findings suggest more work."
        );
    }

    #[test]
    fn keyword_match_ignores_case_and_word_boundaries() {
        let text = "MAIN point here. Rediscovered showcase. Aiming high. Goalkeeper saves. Filler.";
        assert_eq!(
            summarize(text, DEFAULT_MAX_WORDS),
            "MAIN point here. Rediscovered showcase. Aiming high. Goalkeeper saves."
        );
    }

    #[test]
    fn falls_back_to_first_six_sentences() {
        let text = "A. B. C. D. E. F. G. H. The main aim.";
        assert_eq!(summarize(text, DEFAULT_MAX_WORDS), "A. B. C. D. E. F.");
    }

    #[test]
    fn collapses_whitespace_runs() {
        let text = "  Line one\n\nstill one.\tLine   two.  ";
        assert_eq!(
            summarize(text, DEFAULT_MAX_WORDS),
            "Line one still one. Line two."
        );
    }

    #[test]
    fn truncates_to_max_words_with_ellipsis() {
        let text = "one two three four five six seven eight nine ten.";
        let summary = summarize(text, 4);
        assert_eq!(summary, "one two three four...");
        assert_eq!(summary.split_whitespace().count(), 4);
    }

    #[test]
    fn word_count_never_exceeds_limit() {
        let sentence = "The important result of this study is significant. ";
        let text = sentence.repeat(200);
        for max in [1, 5, 50, DEFAULT_MAX_WORDS] {
            assert!(summarize(&text, max).split_whitespace().count() <= max);
        }
    }

    #[test]
    fn empty_and_blank_input_give_empty_summary() {
        assert_eq!(summarize("", DEFAULT_MAX_WORDS), "");
        assert_eq!(summarize(" \n\t ", DEFAULT_MAX_WORDS), "");
    }

    #[test]
    fn is_deterministic() {
        let text = "Our goal was simple. It rained. We show gains. We improve it. Develop more.";
        assert_eq!(summarize(text, 10), summarize(text, 10));
    }
}
