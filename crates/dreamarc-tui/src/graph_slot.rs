//! Directive sink that holds the routed graph for the UI loop.

use dreamarc_core::DirectiveSink;
use dreamarc_protocol::{GraphDirective, QuizDirective};
use log::debug;
use parking_lot::Mutex;

/// Keeps the graph routed out of a reply until the UI loop takes it.
///
/// Replies are applied on the UI loop itself, so the graph is picked up
/// right after `apply_completion` returns and cannot be lost to a full
/// event channel.
#[derive(Debug, Default)]
pub struct GraphSlot {
    pending: Mutex<Option<GraphDirective>>,
}

impl GraphSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the routed graph, leaving the slot empty.
    pub fn take(&self) -> Option<GraphDirective> {
        self.pending.lock().take()
    }
}

impl DirectiveSink for GraphSlot {
    fn open_graph(&self, graph: GraphDirective) {
        debug!("graph routed to panel (points={})", graph.data.len());
        *self.pending.lock() = Some(graph);
    }

    fn quiz_attached(&self, quiz: &QuizDirective) {
        debug!("quiz attached (questions={})", quiz.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreamarc_core::DirectiveRouter;
    use pretty_assertions::assert_eq;

    #[test]
    fn routed_graph_is_taken_once() {
        let slot = GraphSlot::new();
        let routed = DirectiveRouter::new().route(
            r#"Look :::GRAPH_DATA {"title": "y=x", "data": [{"x": 0, "y": 0}]} :::"#,
            None,
            &slot,
        );
        assert_eq!(routed.text, "Look");
        assert_eq!(slot.take().map(|graph| graph.title), Some("y=x".to_string()));
        assert_eq!(slot.take(), None);
    }
}
