//! Directive extraction and routing for assistant replies.
//!
//! Tutor replies may embed `:::GRAPH_DATA <json> :::` and
//! `:::QUIZ_DATA <json> :::` blocks. Extraction removes the first block of
//! each kind from the display text and parses its payload. A payload that
//! fails to parse leaves the text untouched.

use dreamarc_protocol::{DirectiveEnvelope, GraphDirective, QuizDirective};
use log::{debug, warn};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

/// Literal marking the display text of a mentor handover report.
pub const HANDOVER_MARKER: &str = "MENTOR HANDOVER REPORT";

/// Compile a built-in pattern, logging instead of panicking on failure.
pub(crate) fn compile_pattern(name: &str, pattern: &str) -> Option<Regex> {
    let Ok(regex) = Regex::new(pattern) else {
        warn!("{} pattern failed to compile; matching disabled", name);
        return None;
    };
    Some(regex)
}

fn graph_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| compile_pattern("graph", r":::GRAPH_DATA ([\s\S]*?) :::"))
        .as_ref()
}

fn quiz_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| compile_pattern("quiz", r":::QUIZ_DATA ([\s\S]*?) :::"))
        .as_ref()
}

/// Display text plus the directives found in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub text: String,
    pub graph: Option<GraphDirective>,
    pub quiz: Option<QuizDirective>,
}

/// Scan raw assistant text for directive tags.
///
/// Only the first tag of each kind is considered; later ones stay in the
/// text as literals. Whitespace before a removed tag is kept. Whitespace
/// after it is dropped, except that a line break there is kept as a single
/// `\n` unless the text before already ends in a blank line. The result is
/// trimmed.
pub fn extract_directives(raw: &str) -> Extraction {
    let mut text = raw.to_string();

    let graph = match take_first::<GraphDirective>(&text, graph_pattern(), "graph") {
        Some((stripped, graph)) => {
            text = stripped;
            Some(graph)
        }
        None => None,
    };
    let quiz = match take_first::<QuizDirective>(&text, quiz_pattern(), "quiz") {
        Some((stripped, quiz)) => {
            text = stripped;
            Some(quiz)
        }
        None => None,
    };

    Extraction { text, graph, quiz }
}

fn take_first<T: DeserializeOwned>(
    text: &str,
    pattern: Option<&Regex>,
    kind: &str,
) -> Option<(String, T)> {
    let captures = pattern?.captures(text)?;
    let (whole, payload) = (captures.get(0)?, captures.get(1)?);
    match serde_json::from_str::<T>(payload.as_str()) {
        Ok(value) => {
            let (head, tail) = (&text[..whole.start()], &text[whole.end()..]);
            let rest = tail.trim_start();
            let mut stripped = String::with_capacity(text.len() - whole.len());
            stripped.push_str(head);
            // A line break after the tag survives, capped at one blank line.
            if tail[..tail.len() - rest.len()].contains('\n') && !head.ends_with("\n\n") {
                stripped.push('\n');
            }
            stripped.push_str(rest);
            debug!(
                "extracted {} directive (payload_len={})",
                kind,
                payload.len()
            );
            Some((stripped.trim().to_string(), value))
        }
        Err(err) => {
            warn!("ignoring malformed {} directive: {}", kind, err);
            None
        }
    }
}

/// Receiver for directives routed out of assistant replies.
pub trait DirectiveSink: Send + Sync {
    /// Show a graph; the host opens its graph panel.
    fn open_graph(&self, graph: GraphDirective);
    /// A quiz was attached to the latest assistant message.
    fn quiz_attached(&self, _quiz: &QuizDirective) {}
}

/// Sink that drops every directive.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDirectiveSink;

impl DirectiveSink for NoopDirectiveSink {
    fn open_graph(&self, _graph: GraphDirective) {}
}

/// Result of routing one reply.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedReply {
    pub text: String,
    /// Graph handed to the sink, if any.
    pub graph: Option<GraphDirective>,
    pub quiz: Option<QuizDirective>,
}

/// Extract directives from reply text and dispatch them to a sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectiveRouter;

impl DirectiveRouter {
    pub fn new() -> Self {
        Self
    }

    /// Route raw reply text, preferring typed envelope entries per kind.
    ///
    /// The text is always scanned so legacy tags never reach the display.
    pub fn route(
        &self,
        raw: &str,
        envelope: Option<&DirectiveEnvelope>,
        sink: &dyn DirectiveSink,
    ) -> RoutedReply {
        let extraction = extract_directives(raw);
        let graph = envelope
            .and_then(|envelope| envelope.graph.clone())
            .or(extraction.graph);
        let quiz = envelope
            .and_then(|envelope| envelope.quiz.clone())
            .or(extraction.quiz);

        if let Some(graph) = graph.as_ref() {
            debug!("opening graph panel (points={})", graph.data.len());
            sink.open_graph(graph.clone());
        }
        if let Some(quiz) = quiz.as_ref() {
            sink.quiz_attached(quiz);
        }

        RoutedReply {
            text: extraction.text,
            graph,
            quiz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreamarc_protocol::{GraphPoint, QuizQuestion};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    const GRAPH: &str = r#":::GRAPH_DATA {"title": "y=x", "data": [{"x": 0, "y": 0}, {"x": 1, "y": 1}]} :::"#;
    const QUIZ: &str = r#":::QUIZ_DATA [{"question": "1+1?", "options": ["1", "2"], "correct_index": 1, "explanation": "two"}] :::"#;

    #[derive(Default)]
    struct CaptureSink {
        graphs: Mutex<Vec<GraphDirective>>,
        quizzes: Mutex<usize>,
    }

    impl DirectiveSink for CaptureSink {
        fn open_graph(&self, graph: GraphDirective) {
            self.graphs.lock().push(graph);
        }

        fn quiz_attached(&self, _quiz: &QuizDirective) {
            *self.quizzes.lock() += 1;
        }
    }

    #[test]
    fn invalid_pattern_compiles_to_none() {
        assert!(compile_pattern("broken", "(unclosed").is_none());
        assert!(compile_pattern("graph", r":::GRAPH_DATA ([\s\S]*?) :::").is_some());
    }

    #[test]
    fn missing_pattern_leaves_text_untouched() {
        let raw = format!("Here: {GRAPH} done");
        assert!(take_first::<GraphDirective>(&raw, None, "graph").is_none());
    }

    #[test]
    fn text_without_tags_is_unchanged() {
        let raw = "  Let's look at $x^2$ together.\n";
        let extraction = extract_directives(raw);
        assert_eq!(extraction.text, raw);
        assert_eq!(extraction.graph, None);
        assert_eq!(extraction.quiz, None);
    }

    #[test]
    fn graph_tag_is_removed_with_following_whitespace() {
        let extraction = extract_directives(&format!("Here: {GRAPH} done"));
        assert_eq!(extraction.text, "Here: done");
        let graph = extraction.graph.expect("graph");
        assert_eq!(graph.title, "y=x");
        assert_eq!(
            graph.data,
            vec![GraphPoint { x: 0.0, y: 0.0 }, GraphPoint { x: 1.0, y: 1.0 }]
        );
    }

    #[test]
    fn line_break_after_tag_is_kept() {
        let extraction = extract_directives(&format!("Line1\n{GRAPH}\nLine2"));
        assert_eq!(extraction.text, "Line1\n\nLine2");

        let extraction = extract_directives(&format!("Line1 {GRAPH}\n\n  Line2"));
        assert_eq!(extraction.text, "Line1 \nLine2");
    }

    #[test]
    fn malformed_graph_leaves_text_untouched() {
        let raw = "See :::GRAPH_DATA {\"title\": oops} ::: above";
        let extraction = extract_directives(raw);
        assert_eq!(extraction.text, raw);
        assert_eq!(extraction.graph, None);
    }

    #[test]
    fn quiz_is_extracted_after_graph() {
        let raw = format!("Plot:\n\n{GRAPH}\n\nNow try:\n{QUIZ}");
        let extraction = extract_directives(&raw);
        assert_eq!(extraction.text, "Plot:\n\nNow try:");
        assert!(extraction.graph.is_some());
        let quiz = extraction.quiz.expect("quiz");
        assert_eq!(
            quiz.questions()[0],
            QuizQuestion {
                question: "1+1?".to_string(),
                options: vec!["1".to_string(), "2".to_string()],
                correct_index: 1,
                explanation: "two".to_string(),
            }
        );
    }

    #[test]
    fn quiz_runs_even_when_graph_is_malformed() {
        let raw = format!(":::GRAPH_DATA nope ::: {QUIZ}");
        let extraction = extract_directives(&raw);
        assert_eq!(extraction.text, ":::GRAPH_DATA nope :::");
        assert!(extraction.quiz.is_some());
    }

    #[test]
    fn only_first_tag_of_a_kind_is_honoured() {
        let raw = format!("{GRAPH} and {GRAPH}");
        let extraction = extract_directives(&raw);
        assert_eq!(extraction.text, format!("and {GRAPH}"));
    }

    #[test]
    fn multiline_payload_is_accepted() {
        let raw = ":::GRAPH_DATA {\"title\": \"t\",\n \"data\": []} :::";
        let extraction = extract_directives(raw);
        assert_eq!(extraction.text, "");
        assert_eq!(extraction.graph.expect("graph").data, Vec::new());
    }

    #[test]
    fn router_opens_graph_and_reports_quiz() {
        let sink = CaptureSink::default();
        let routed = DirectiveRouter::new().route(&format!("{GRAPH}\n{QUIZ}"), None, &sink);
        assert!(routed.graph.is_some());
        assert_eq!(routed.text, "");
        assert!(routed.quiz.is_some());
        assert_eq!(sink.graphs.lock().len(), 1);
        assert_eq!(*sink.quizzes.lock(), 1);
    }

    #[test]
    fn envelope_entries_win_but_tags_are_still_stripped() {
        let sink = CaptureSink::default();
        let envelope = DirectiveEnvelope {
            graph: Some(GraphDirective {
                title: "typed".to_string(),
                data: vec![GraphPoint { x: 2.0, y: 3.0 }],
            }),
            quiz: None,
        };
        let routed = DirectiveRouter::new().route(
            &format!("Look {GRAPH} here {QUIZ}"),
            Some(&envelope),
            &sink,
        );
        assert_eq!(routed.text, "Look here");
        assert_eq!(sink.graphs.lock()[0].title, "typed");
        assert!(routed.quiz.is_some());
    }

    #[test]
    fn plain_reply_touches_nothing() {
        let sink = CaptureSink::default();
        let routed = DirectiveRouter::new().route("hello", Some(&DirectiveEnvelope::default()), &sink);
        assert_eq!(routed.text, "hello");
        assert!(routed.graph.is_none());
        assert!(sink.graphs.lock().is_empty());
    }
}
