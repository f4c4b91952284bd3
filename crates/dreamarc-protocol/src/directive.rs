use serde::{Deserialize, Serialize};

/// Single point plotted on the graph panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GraphPoint {
    pub x: f64,
    pub y: f64,
}

/// Line graph requested by the tutor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphDirective {
    /// Caption shown above the chart.
    pub title: String,
    /// Points in plotting order.
    pub data: Vec<GraphPoint>,
}

/// One multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer. Decoded signed so a
    /// negative value is accepted and simply matches no option.
    pub correct_index: i64,
    /// Shown once an answer has been picked.
    pub explanation: String,
}

impl QuizQuestion {
    /// Position of the correct option, if the index points at one.
    pub fn correct_option(&self) -> Option<usize> {
        usize::try_from(self.correct_index)
            .ok()
            .filter(|index| *index < self.options.len())
    }
}

/// Ordered list of questions attached to an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct QuizDirective(pub Vec<QuizQuestion>);

impl QuizDirective {
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Typed side channel carrying directives next to reply content.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DirectiveEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphDirective>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizDirective>,
}

impl DirectiveEnvelope {
    pub fn is_empty(&self) -> bool {
        self.graph.is_none() && self.quiz.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn graph_accepts_integer_coordinates() {
        let graph: GraphDirective =
            serde_json::from_str(r#"{"title":"y=x","data":[{"x":0,"y":0},{"x":1,"y":1.5}]}"#)
                .expect("graph");
        assert_eq!(graph.data[1], GraphPoint { x: 1.0, y: 1.5 });
    }

    #[test]
    fn quiz_decodes_from_bare_array() {
        let quiz: QuizDirective = serde_json::from_str(
            r#"[{"question":"q","options":["a","b"],"correct_index":1,"explanation":"e"}]"#,
        )
        .expect("quiz");
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz.questions()[0].correct_index, 1);
    }

    #[test]
    fn negative_correct_index_matches_no_option() {
        let quiz: QuizDirective = serde_json::from_str(
            r#"[{"question":"q","options":["a","b"],"correct_index":-1,"explanation":"e"}]"#,
        )
        .expect("quiz");
        assert_eq!(quiz.questions()[0].correct_index, -1);
        assert_eq!(quiz.questions()[0].correct_option(), None);
    }

    #[test]
    fn envelope_fields_are_optional() {
        let envelope: DirectiveEnvelope = serde_json::from_str("{}").expect("envelope");
        assert!(envelope.is_empty());
    }
}
