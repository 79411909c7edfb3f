//! Undo/redo history of graph actions.

use serde::{Deserialize, Serialize};

use crate::action::{GraphAction, GraphActionReceiver};
use crate::MapResult;

/// History state after a mutation, for toolbars and autosave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryChange {
    /// Whether `undo` would do something.
    pub can_undo: bool,
    /// Whether `redo` would do something.
    pub can_redo: bool,
}

/// LIFO undo and redo stacks.
///
/// Actions are applied before they are recorded, so an action whose `apply`
/// fails never reaches the undo stack.
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<Box<dyn GraphAction>>,
    redo: Vec<Box<dyn GraphAction>>,
    capacity: Option<usize>,
}

impl History {
    /// Create an unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history that keeps at most `capacity` undo steps.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Apply an action and record it, discarding any redo steps.
    ///
    /// # Errors
    ///
    /// Returns the action's error; nothing is recorded in that case.
    pub fn execute(
        &mut self,
        receiver: &mut dyn GraphActionReceiver,
        mut action: Box<dyn GraphAction>,
    ) -> MapResult<HistoryChange> {
        action.apply(receiver)?;
        tracing::debug!("Executed '{}'", action.description());
        self.redo.clear();
        self.undo.push(action);
        if let Some(capacity) = self.capacity {
            if self.undo.len() > capacity {
                let excess = self.undo.len() - capacity;
                self.undo.drain(..excess);
            }
        }
        Ok(self.state())
    }

    /// Roll back the most recent action.
    ///
    /// Returns `false` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails; the action stays on the undo
    /// stack.
    pub fn undo(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<bool> {
        let Some(mut action) = self.undo.pop() else {
            return Ok(false);
        };
        if let Err(err) = action.rollback(receiver) {
            self.undo.push(action);
            return Err(err);
        }
        tracing::debug!("Undid '{}'", action.description());
        self.redo.push(action);
        Ok(true)
    }

    /// Re-apply the most recently undone action.
    ///
    /// Returns `false` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns an error if the action fails; it stays on the redo stack.
    pub fn redo(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<bool> {
        let Some(mut action) = self.redo.pop() else {
            return Ok(false);
        };
        if let Err(err) = action.apply(receiver) {
            self.redo.push(action);
            return Err(err);
        }
        tracing::debug!("Redid '{}'", action.description());
        self.undo.push(action);
        Ok(true)
    }

    /// Whether there is something to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether there is something to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Description of the action `undo` would roll back.
    #[must_use]
    pub fn undo_description(&self) -> Option<&str> {
        self.undo.last().map(|a| a.description())
    }

    /// Description of the action `redo` would apply.
    #[must_use]
    pub fn redo_description(&self) -> Option<&str> {
        self.redo.last().map(|a| a.description())
    }

    /// Current undo/redo availability.
    #[must_use]
    pub fn state(&self) -> HistoryChange {
        HistoryChange {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{EdgeCreation, NodeCreation, NodeDeletion};
    use crate::graph::{Edge, Node, UniversalGraph};

    fn create(hash: &str) -> Box<dyn GraphAction> {
        Box::new(NodeCreation::new(
            "Create node",
            Node::new(hash, "note", hash, 0.0, 0.0),
        ))
    }

    #[test]
    fn test_add_undo_redo() {
        let mut graph = UniversalGraph::new();
        let mut history = History::new();

        history.execute(&mut graph, create("a")).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        let after_add = graph.clone();

        assert!(history.undo(&mut graph).unwrap());
        assert!(graph.nodes.is_empty());

        assert!(history.redo(&mut graph).unwrap());
        assert_eq!(graph, after_add);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut graph = UniversalGraph::new();
        let mut history = History::new();
        assert!(!history.undo(&mut graph).unwrap());
        assert!(!history.redo(&mut graph).unwrap());
        assert_eq!(history.state(), HistoryChange::default());
    }

    #[test]
    fn test_failed_apply_is_not_recorded() {
        let mut graph = UniversalGraph::new();
        let mut history = History::new();
        let result = history.execute(
            &mut graph,
            Box::new(EdgeCreation::new("Create edge", Edge::new("x", "y", "z"))),
        );
        assert!(result.is_err());
        assert!(!history.can_undo());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_execute_discards_redo() {
        let mut graph = UniversalGraph::new();
        let mut history = History::new();
        history.execute(&mut graph, create("a")).unwrap();
        history.undo(&mut graph).unwrap();
        assert!(history.can_redo());

        let change = history.execute(&mut graph, create("b")).unwrap();
        assert!(change.can_undo);
        assert!(!change.can_redo);
        assert_eq!(graph.nodes[0].hash, "b");
    }

    #[test]
    fn test_lifo_order() {
        let mut graph = UniversalGraph::new();
        let mut history = History::new();
        history.execute(&mut graph, create("a")).unwrap();
        history.execute(&mut graph, create("b")).unwrap();
        history
            .execute(&mut graph, Box::new(NodeDeletion::new("a")))
            .unwrap();

        assert_eq!(history.undo_description(), Some("Delete node"));
        history.undo(&mut graph).unwrap();
        assert_eq!(graph.nodes[0].hash, "a");
        history.undo(&mut graph).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(history.redo_description(), Some("Create node"));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut graph = UniversalGraph::new();
        let mut history = History::with_capacity(2);
        for hash in ["a", "b", "c"] {
            history.execute(&mut graph, create(hash)).unwrap();
        }
        assert!(history.undo(&mut graph).unwrap());
        assert!(history.undo(&mut graph).unwrap());
        assert!(!history.undo(&mut graph).unwrap());
        assert_eq!(graph.nodes.len(), 1);
    }
}
