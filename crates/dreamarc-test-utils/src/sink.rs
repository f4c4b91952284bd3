use dreamarc_core::DirectiveSink;
use dreamarc_protocol::{GraphDirective, QuizDirective};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Graph(GraphDirective),
    Quiz(usize),
}

/// Directive sink that records what it was handed.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    pub fn graphs(&self) -> Vec<GraphDirective> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Graph(graph) => Some(graph.clone()),
                SinkEvent::Quiz(_) => None,
            })
            .collect()
    }
}

impl DirectiveSink for RecordingSink {
    fn open_graph(&self, graph: GraphDirective) {
        self.events.lock().push(SinkEvent::Graph(graph));
    }

    fn quiz_attached(&self, quiz: &QuizDirective) {
        self.events.lock().push(SinkEvent::Quiz(quiz.len()));
    }
}
