//! Reversible graph edits.
//!
//! Every edit the user makes is a [`GraphAction`] value. The action mutates a
//! [`GraphActionReceiver`] on `apply` and must restore it exactly on
//! `rollback`, so the history can replay edits in both directions:
//!
//! ```text
//!   state S ──apply──▶ state S' ──rollback──▶ state S
//! ```
//!
//! Positional information (node and edge indices) is captured during
//! `apply` so that rollback also restores drawing order.

use std::fmt;

use crate::graph::{Edge, Node, UniversalGraph};
use crate::{MapError, MapResult};

/// A node removed from a receiver, with the edges removed alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    /// Index the node occupied.
    pub index: usize,
    /// The node itself.
    pub node: Node,
    /// Cascaded edges with their former indices, ascending.
    pub edges: Vec<(usize, Edge)>,
}

/// Something graph actions can be applied to.
pub trait GraphActionReceiver {
    /// Look up a node by hash.
    fn node(&self, hash: &str) -> Option<&Node>;

    /// Insert a node at `index`, or append when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if a node with the same hash exists.
    fn insert_node(&mut self, index: Option<usize>, node: Node) -> MapResult<()>;

    /// Remove a node and every edge touching it.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist.
    fn remove_node(&mut self, hash: &str) -> MapResult<RemovedNode>;

    /// Replace the node with the same hash, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist.
    fn replace_node(&mut self, node: Node) -> MapResult<Node>;

    /// Insert an edge at `index`, or append when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is missing.
    fn insert_edge(&mut self, index: Option<usize>, edge: Edge) -> MapResult<()>;

    /// Remove the last edge equal to `edge`, returning its index.
    ///
    /// # Errors
    ///
    /// Returns an error if no such edge exists.
    fn remove_edge(&mut self, edge: &Edge) -> MapResult<usize>;

    /// Replace the last edge equal to `current` with `replacement`,
    /// returning its index.
    ///
    /// # Errors
    ///
    /// Returns an error if no such edge exists or the replacement has a
    /// missing endpoint.
    fn replace_edge(&mut self, current: &Edge, replacement: Edge) -> MapResult<usize>;

    /// Replace the edge at `index`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the replacement has
    /// a missing endpoint.
    fn replace_edge_at(&mut self, index: usize, replacement: Edge) -> MapResult<Edge>;

    /// Swap in a whole new graph, returning the old one.
    ///
    /// # Errors
    ///
    /// Returns an error if the new graph is invalid.
    fn replace_graph(&mut self, graph: UniversalGraph) -> MapResult<UniversalGraph>;
}

impl GraphActionReceiver for UniversalGraph {
    fn node(&self, hash: &str) -> Option<&Node> {
        UniversalGraph::node(self, hash)
    }

    fn insert_node(&mut self, index: Option<usize>, node: Node) -> MapResult<()> {
        if self.node_index(&node.hash).is_some() {
            return Err(MapError::DuplicateNode(node.hash));
        }
        let index = index.map_or(self.nodes.len(), |i| i.min(self.nodes.len()));
        self.nodes.insert(index, node);
        Ok(())
    }

    fn remove_node(&mut self, hash: &str) -> MapResult<RemovedNode> {
        let index = self
            .node_index(hash)
            .ok_or_else(|| MapError::NodeNotFound(hash.to_string()))?;
        let node = self.nodes.remove(index);

        let mut edges = Vec::new();
        let mut position = 0;
        self.edges.retain(|edge| {
            let hit = edge.touches(hash);
            if hit {
                edges.push((position, edge.clone()));
            }
            position += 1;
            !hit
        });

        Ok(RemovedNode { index, node, edges })
    }

    fn replace_node(&mut self, node: Node) -> MapResult<Node> {
        let index = self
            .node_index(&node.hash)
            .ok_or_else(|| MapError::NodeNotFound(node.hash.clone()))?;
        Ok(std::mem::replace(&mut self.nodes[index], node))
    }

    fn insert_edge(&mut self, index: Option<usize>, edge: Edge) -> MapResult<()> {
        if self.node_index(&edge.from).is_none() || self.node_index(&edge.to).is_none() {
            return Err(MapError::MissingEndpoint {
                from: edge.from,
                to: edge.to,
            });
        }
        let index = index.map_or(self.edges.len(), |i| i.min(self.edges.len()));
        self.edges.insert(index, edge);
        Ok(())
    }

    fn remove_edge(&mut self, edge: &Edge) -> MapResult<usize> {
        let index = self
            .edges
            .iter()
            .rposition(|e| e == edge)
            .ok_or_else(|| MapError::EdgeNotFound(edge.to_string()))?;
        self.edges.remove(index);
        Ok(index)
    }

    fn replace_edge(&mut self, current: &Edge, replacement: Edge) -> MapResult<usize> {
        let index = self
            .edges
            .iter()
            .rposition(|e| e == current)
            .ok_or_else(|| MapError::EdgeNotFound(current.to_string()))?;
        self.replace_edge_at(index, replacement)?;
        Ok(index)
    }

    fn replace_edge_at(&mut self, index: usize, replacement: Edge) -> MapResult<Edge> {
        if self.node_index(&replacement.from).is_none() || self.node_index(&replacement.to).is_none()
        {
            return Err(MapError::MissingEndpoint {
                from: replacement.from,
                to: replacement.to,
            });
        }
        let slot = self
            .edges
            .get_mut(index)
            .ok_or_else(|| MapError::EdgeNotFound(format!("index {index}")))?;
        Ok(std::mem::replace(slot, replacement))
    }

    fn replace_graph(&mut self, graph: UniversalGraph) -> MapResult<UniversalGraph> {
        graph.validate()?;
        Ok(std::mem::replace(self, graph))
    }
}

/// A reversible edit.
pub trait GraphAction: fmt::Debug {
    /// Short human readable description, e.g. "Delete node".
    fn description(&self) -> &str;

    /// Perform the edit.
    ///
    /// # Errors
    ///
    /// Returns an error if the edit cannot be made. The receiver is left
    /// unchanged in that case.
    fn apply(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()>;

    /// Undo a previously applied edit.
    ///
    /// # Errors
    ///
    /// Returns an error if the receiver no longer matches the state the
    /// action left it in.
    fn rollback(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()>;
}

/// Adds a node.
#[derive(Debug, Clone)]
pub struct NodeCreation {
    description: String,
    node: Node,
}

impl NodeCreation {
    /// Create the action.
    #[must_use]
    pub fn new(description: impl Into<String>, node: Node) -> Self {
        Self {
            description: description.into(),
            node,
        }
    }

    /// The node being created.
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }
}

impl GraphAction for NodeCreation {
    fn description(&self) -> &str {
        &self.description
    }

    fn apply(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        receiver.insert_node(None, self.node.clone())
    }

    fn rollback(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        receiver.remove_node(&self.node.hash).map(|_| ())
    }
}

/// Removes a node together with its edges.
#[derive(Debug, Clone)]
pub struct NodeDeletion {
    hash: String,
    removed: Option<RemovedNode>,
}

impl NodeDeletion {
    /// Create the action for the node with the given hash.
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            removed: None,
        }
    }

    /// What the last `apply` removed.
    #[must_use]
    pub fn removed(&self) -> Option<&RemovedNode> {
        self.removed.as_ref()
    }
}

impl GraphAction for NodeDeletion {
    fn description(&self) -> &str {
        "Delete node"
    }

    fn apply(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        self.removed = Some(receiver.remove_node(&self.hash)?);
        Ok(())
    }

    fn rollback(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        let removed = self.removed.take().ok_or_else(|| {
            MapError::InvalidOperation(format!("node {} was never deleted", self.hash))
        })?;
        receiver.insert_node(Some(removed.index), removed.node)?;
        for (index, edge) in removed.edges {
            receiver.insert_edge(Some(index), edge)?;
        }
        Ok(())
    }
}

/// Moves a node to a new position.
#[derive(Debug, Clone)]
pub struct NodeMove {
    hash: String,
    from: (f64, f64),
    to: (f64, f64),
}

impl NodeMove {
    /// Create the action.
    #[must_use]
    pub fn new(hash: impl Into<String>, from: (f64, f64), to: (f64, f64)) -> Self {
        Self {
            hash: hash.into(),
            from,
            to,
        }
    }

    fn move_to(
        &self,
        receiver: &mut dyn GraphActionReceiver,
        (x, y): (f64, f64),
    ) -> MapResult<()> {
        let mut node = receiver
            .node(&self.hash)
            .cloned()
            .ok_or_else(|| MapError::NodeNotFound(self.hash.clone()))?;
        node.data.x = x;
        node.data.y = y;
        receiver.replace_node(node).map(|_| ())
    }
}

impl GraphAction for NodeMove {
    fn description(&self) -> &str {
        "Move node"
    }

    fn apply(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        self.move_to(receiver, self.to)
    }

    fn rollback(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        self.move_to(receiver, self.from)
    }
}

/// Replaces a node's properties.
#[derive(Debug, Clone)]
pub struct NodeUpdate {
    updated: Node,
    previous: Option<Node>,
}

impl NodeUpdate {
    /// Create the action. The node is matched by hash.
    #[must_use]
    pub fn new(updated: Node) -> Self {
        Self {
            updated,
            previous: None,
        }
    }
}

impl GraphAction for NodeUpdate {
    fn description(&self) -> &str {
        "Update node properties"
    }

    fn apply(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        self.previous = Some(receiver.replace_node(self.updated.clone())?);
        Ok(())
    }

    fn rollback(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        let previous = self.previous.take().ok_or_else(|| {
            MapError::InvalidOperation(format!("node {} was never updated", self.updated.hash))
        })?;
        receiver.replace_node(previous).map(|_| ())
    }
}

/// Adds an edge.
#[derive(Debug, Clone)]
pub struct EdgeCreation {
    description: String,
    edge: Edge,
}

impl EdgeCreation {
    /// Create the action.
    #[must_use]
    pub fn new(description: impl Into<String>, edge: Edge) -> Self {
        Self {
            description: description.into(),
            edge,
        }
    }
}

impl GraphAction for EdgeCreation {
    fn description(&self) -> &str {
        &self.description
    }

    fn apply(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        receiver.insert_edge(None, self.edge.clone())
    }

    fn rollback(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        receiver.remove_edge(&self.edge).map(|_| ())
    }
}

/// Removes an edge.
#[derive(Debug, Clone)]
pub struct EdgeDeletion {
    edge: Edge,
    index: Option<usize>,
}

impl EdgeDeletion {
    /// Create the action.
    #[must_use]
    pub fn new(edge: Edge) -> Self {
        Self { edge, index: None }
    }
}

impl GraphAction for EdgeDeletion {
    fn description(&self) -> &str {
        "Delete edge"
    }

    fn apply(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        self.index = Some(receiver.remove_edge(&self.edge)?);
        Ok(())
    }

    fn rollback(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        let index = self.index.take();
        receiver.insert_edge(index, self.edge.clone())
    }
}

/// Replaces an edge's properties.
#[derive(Debug, Clone)]
pub struct EdgeUpdate {
    original: Edge,
    updated: Edge,
    index: Option<usize>,
}

impl EdgeUpdate {
    /// Create the action.
    #[must_use]
    pub fn new(original: Edge, updated: Edge) -> Self {
        Self {
            original,
            updated,
            index: None,
        }
    }
}

impl GraphAction for EdgeUpdate {
    fn description(&self) -> &str {
        "Update edge properties"
    }

    fn apply(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        self.index = Some(receiver.replace_edge(&self.original, self.updated.clone())?);
        Ok(())
    }

    fn rollback(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        let index = self.index.take().ok_or_else(|| {
            MapError::InvalidOperation(format!("edge {} was never updated", self.original))
        })?;
        receiver
            .replace_edge_at(index, self.original.clone())
            .map(|_| ())
    }
}

/// Replaces the whole graph, e.g. when restoring a backup or a past version.
#[derive(Debug, Clone)]
pub struct GraphRestore {
    description: String,
    next: UniversalGraph,
    previous: Option<UniversalGraph>,
}

impl GraphRestore {
    /// Create the action.
    #[must_use]
    pub fn new(description: impl Into<String>, graph: UniversalGraph) -> Self {
        Self {
            description: description.into(),
            next: graph,
            previous: None,
        }
    }
}

impl GraphAction for GraphRestore {
    fn description(&self) -> &str {
        &self.description
    }

    fn apply(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        self.previous = Some(receiver.replace_graph(self.next.clone())?);
        Ok(())
    }

    fn rollback(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        let previous = self.previous.take().ok_or_else(|| {
            MapError::InvalidOperation("graph was never restored".to_string())
        })?;
        receiver.replace_graph(previous).map(|_| ())
    }
}

/// Several actions applied as one undo step.
#[derive(Debug)]
pub struct CompoundAction {
    description: String,
    actions: Vec<Box<dyn GraphAction>>,
}

impl CompoundAction {
    /// Create the action.
    #[must_use]
    pub fn new(description: impl Into<String>, actions: Vec<Box<dyn GraphAction>>) -> Self {
        Self {
            description: description.into(),
            actions,
        }
    }

    /// Number of child actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if there are no child actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl GraphAction for CompoundAction {
    fn description(&self) -> &str {
        &self.description
    }

    fn apply(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        for i in 0..self.actions.len() {
            if let Err(err) = self.actions[i].apply(receiver) {
                for done in self.actions[..i].iter_mut().rev() {
                    if let Err(rollback_err) = done.rollback(receiver) {
                        tracing::warn!(
                            "Failed to roll back '{}' after partial apply: {}",
                            done.description(),
                            rollback_err
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn rollback(&mut self, receiver: &mut dyn GraphActionReceiver) -> MapResult<()> {
        for action in self.actions.iter_mut().rev() {
            action.rollback(receiver)?;
        }
        Ok(())
    }
}
