//! Text clean-up before sending tutor replies to speech synthesis.

use crate::directive::compile_pattern;
use regex::Regex;
use std::sync::OnceLock;

struct SpeechPatterns {
    tags: Regex,
    display_math: Regex,
    inline_math: Regex,
    frac: Regex,
    sqrt: Regex,
    latex_punct: Regex,
    whitespace: Regex,
}

fn patterns() -> Option<&'static SpeechPatterns> {
    static PATTERNS: OnceLock<Option<SpeechPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            let compile = |pattern: &str| compile_pattern("speech", pattern);
            Some(SpeechPatterns {
                tags: compile(r":::(?:GRAPH|QUIZ)_DATA[\s\S]*?:::")?,
                display_math: compile(r"\$\$[\s\S]*?\$\$")?,
                inline_math: compile(r"\$[^$]*\$")?,
                frac: compile(r"\\frac\{([^}]+)\}\{([^}]+)\}")?,
                sqrt: compile(r"\\sqrt\{([^}]+)\}")?,
                latex_punct: compile(r"[\\{}]")?,
                whitespace: compile(r"\s+")?,
            })
        })
        .as_ref()
}

/// Reduce Markdown-with-LaTeX reply text to something a voice can read.
///
/// Directive tags and `$`-delimited math are dropped, `\frac` and `\sqrt`
/// outside math are spoken as words and whitespace is collapsed.
pub fn sanitize_for_speech(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let Some(p) = patterns() else {
        return text.split_whitespace().collect::<Vec<_>>().join(" ");
    };
    let s = p.tags.replace_all(text, "");
    let s = p.display_math.replace_all(&s, " ");
    let s = p.inline_math.replace_all(&s, " ");
    let s = p.frac.replace_all(&s, "$1 over $2");
    let s = p.sqrt.replace_all(&s, "square root of $1");
    let s = p.latex_punct.replace_all(&s, " ");
    let s = p.whitespace.replace_all(&s, " ");
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{patterns, sanitize_for_speech};
    use pretty_assertions::assert_eq;

    #[test]
    fn built_in_patterns_compile() {
        assert!(patterns().is_some());
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(sanitize_for_speech(""), "");
    }

    #[test]
    fn strips_tags_and_math() {
        let text = "Solve $x+1=2$ then :::GRAPH_DATA {\"title\":\"t\",\"data\":[]} ::: check $$\\int x\\,dx$$ done.";
        assert_eq!(sanitize_for_speech(text), "Solve then check done.");
    }

    #[test]
    fn strips_quiz_tags_across_lines() {
        let text = "Quiz time\n:::QUIZ_DATA [\n{\"question\": \"q\"}\n] :::\nGood luck";
        assert_eq!(sanitize_for_speech(text), "Quiz time Good luck");
    }

    #[test]
    fn speaks_fractions_and_roots() {
        assert_eq!(sanitize_for_speech("\\frac{1}{2}"), "1 over 2");
        assert_eq!(sanitize_for_speech("\\sqrt{9} is 3"), "square root of 9 is 3");
        assert_eq!(
            sanitize_for_speech("\\sqrt{\\frac{a}{b}}"),
            "square root of a over b"
        );
    }

    #[test]
    fn leftover_latex_punctuation_becomes_spaces() {
        assert_eq!(sanitize_for_speech("\\alpha{beta}"), "alpha beta");
    }

    #[test]
    fn idempotent_on_plain_text() {
        let text = "  Great   work,\n\nkeep going!  ";
        let once = sanitize_for_speech(text);
        assert_eq!(once, "Great work, keep going!");
        assert_eq!(sanitize_for_speech(&once), once);
    }
}
