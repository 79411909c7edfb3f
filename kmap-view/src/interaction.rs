//! Pointer interaction and drag-and-drop.
//!
//! ```text
//!            down                 move > threshold
//!   Idle ──────────► Pressed ─┬──────────────────► Dragging   (on a node)
//!    ▲                   │    └──────────────────► RubberBand (on empty canvas)
//!    └───── up ──────────┴──── up: click-select / commit move / select enclosed
//! ```

use std::collections::HashMap;

use kmap_core::{
    new_node_hash, CompoundAction, DropPayload, EdgeCreation, GraphAction, GraphEntity, MapResult,
    NodeCreation, NodeMove, PointerEvent, PointerPhase, Relationship, ViewEvent,
};
use kmap_renderer::geometry::distance;
use kmap_renderer::{BoundingBox, Point};

use crate::view::CanvasGraphView;

/// Screen distance the pointer must travel before a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 3.0;

/// Where the pointer gesture currently is.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum PointerState {
    #[default]
    Idle,
    Pressed {
        screen: Point,
        origin: Point,
        target: Option<GraphEntity>,
        shift: bool,
    },
    Dragging {
        entity: String,
        origin: Point,
        /// Hash and start position of every moved node.
        starts: Vec<(String, (f64, f64))>,
    },
    RubberBand {
        origin: Point,
        current: Point,
        additive: bool,
    },
}

impl PointerState {
    /// The rubber band area in graph coordinates, while one is drawn.
    pub(crate) fn rubber_band(&self) -> Option<BoundingBox> {
        match self {
            Self::RubberBand {
                origin, current, ..
            } => Some(BoundingBox::from_corners(*origin, *current)),
            _ => None,
        }
    }
}

impl CanvasGraphView {
    /// Feed a pointer event in screen coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if committing a drag-move fails; the nodes keep
    /// their dragged positions in that case.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> MapResult<()> {
        let screen = Point::new(event.x, event.y);
        let graph = self.transform.invert(screen);
        match event.phase {
            PointerPhase::Down => {
                let target = self.entity_at_position(graph.x, graph.y);
                self.pointer = PointerState::Pressed {
                    screen,
                    origin: graph,
                    target,
                    shift: event.modifiers.shift,
                };
                Ok(())
            }
            PointerPhase::Move => {
                self.pointer_moved(screen, graph);
                Ok(())
            }
            PointerPhase::Up => self.pointer_released(graph),
        }
    }

    /// Whether a drag or rubber band is in progress.
    #[must_use]
    pub fn is_interacting(&self) -> bool {
        matches!(
            self.pointer,
            PointerState::Dragging { .. } | PointerState::RubberBand { .. }
        )
    }

    fn pointer_moved(&mut self, screen: Point, graph: Point) {
        match std::mem::take(&mut self.pointer) {
            PointerState::Pressed {
                screen: start,
                origin,
                target,
                shift,
            } => {
                if distance(start.x, start.y, screen.x, screen.y) < DRAG_THRESHOLD {
                    self.pointer = PointerState::Pressed {
                        screen: start,
                        origin,
                        target,
                        shift,
                    };
                    return;
                }
                match target {
                    Some(GraphEntity::Node(hash)) => self.start_drag(hash, origin, shift, graph),
                    Some(edge @ GraphEntity::Edge(_)) => {
                        // Edges follow their nodes; pressing one never drags.
                        self.pointer = PointerState::Pressed {
                            screen: start,
                            origin,
                            target: Some(edge),
                            shift,
                        };
                    }
                    None => {
                        self.pointer = PointerState::RubberBand {
                            origin,
                            current: graph,
                            additive: shift,
                        };
                        self.request_render();
                    }
                }
            }
            dragging @ PointerState::Dragging { .. } => {
                self.pointer = dragging;
                self.drag_to(graph);
            }
            PointerState::RubberBand {
                origin, additive, ..
            } => {
                self.pointer = PointerState::RubberBand {
                    origin,
                    current: graph,
                    additive,
                };
                self.request_render();
            }
            PointerState::Idle => {}
        }
    }

    fn start_drag(&mut self, hash: String, origin: Point, shift: bool, graph: Point) {
        let entity = GraphEntity::Node(hash.clone());
        if !self.selection.contains(&entity) {
            if shift {
                self.add_to_selection(vec![entity]);
            } else {
                self.select(vec![entity]);
            }
        }
        let starts = self
            .selection
            .get()
            .iter()
            .filter_map(GraphEntity::as_node)
            .filter_map(|h| self.graph.node(h).map(|n| (h.to_string(), n.position())))
            .collect();
        self.pointer = PointerState::Dragging {
            entity: hash,
            origin,
            starts,
        };
        self.drag_to(graph);
    }

    fn drag_to(&mut self, graph: Point) {
        let PointerState::Dragging {
            entity,
            origin,
            starts,
        } = &self.pointer
        else {
            return;
        };
        let (dx, dy) = (graph.x - origin.x, graph.y - origin.y);
        let moves: Vec<(String, f64, f64)> = starts
            .iter()
            .map(|(hash, (x, y))| (hash.clone(), x + dx, y + dy))
            .collect();
        let entity = GraphEntity::Node(entity.clone());

        for (hash, x, y) in moves {
            if let Err(e) = self.set_node_position(&hash, x, y) {
                tracing::warn!("Cannot move {}: {}", hash, e);
            }
        }
        self.events.push(ViewEvent::EntityDragged {
            entity,
            x: graph.x,
            y: graph.y,
        });
    }

    fn pointer_released(&mut self, graph: Point) -> MapResult<()> {
        match std::mem::take(&mut self.pointer) {
            PointerState::Idle => Ok(()),
            PointerState::Pressed { target, shift, .. } => {
                match (target, shift) {
                    (Some(entity), true) => self.toggle_selection(entity),
                    (Some(entity), false) => self.select(vec![entity]),
                    (None, false) => self.deselect_all(),
                    (None, true) => {}
                }
                Ok(())
            }
            PointerState::Dragging { starts, .. } => self.commit_drag(starts, graph),
            PointerState::RubberBand {
                origin, additive, ..
            } => {
                let found = self.entities_within_bbox(&BoundingBox::from_corners(origin, graph));
                if additive {
                    self.add_to_selection(found);
                } else {
                    self.select(found);
                }
                self.request_render();
                Ok(())
            }
        }
    }

    /// Record a finished drag as one undo step.
    fn commit_drag(&mut self, starts: Vec<(String, (f64, f64))>, graph: Point) -> MapResult<()> {
        let mut entities = Vec::with_capacity(starts.len());
        let mut moves: Vec<Box<dyn GraphAction>> = Vec::new();
        for (hash, from) in starts {
            let Some(to) = self.graph.node(&hash).map(kmap_core::Node::position) else {
                continue;
            };
            entities.push(GraphEntity::Node(hash.clone()));
            if to != from {
                moves.push(Box::new(NodeMove::new(hash, from, to)));
            }
        }
        self.events.push(ViewEvent::EntityDropped {
            entities,
            x: graph.x,
            y: graph.y,
        });
        if moves.is_empty() {
            return Ok(());
        }
        let description = if moves.len() == 1 {
            "Move node".to_string()
        } else {
            format!("Move {} nodes", moves.len())
        };
        self.execute(Box::new(CompoundAction::new(description, moves)))
    }

    /// Create entities from a drag-and-drop payload dropped at a screen
    /// point.
    ///
    /// The creation is one undo step. Created entities become the
    /// selection and are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be decoded or the creation
    /// fails; nothing changes in that case.
    pub fn handle_drop(
        &mut self,
        mime: &str,
        data: &str,
        x: f64,
        y: f64,
    ) -> MapResult<Vec<GraphEntity>> {
        let payload = DropPayload::parse(mime, data)
            .inspect_err(|e| tracing::warn!("Ignoring drop: {}", e))?;
        let at = self.transform.invert(Point::new(x, y));

        let mut created = Vec::new();
        let action: Box<dyn GraphAction> = match payload {
            DropPayload::Node(template) => {
                let node = template.into_node(new_node_hash(), at.x, at.y);
                created.push(GraphEntity::Node(node.hash.clone()));
                Box::new(NodeCreation::new("Create node", node))
            }
            DropPayload::Relationship(relationship) => {
                self.relationship_action(*relationship, at, &mut created)
            }
        };

        let edges_before = self.edge_ids.len();
        self.execute(action)?;
        created.extend(
            self.edge_ids
                .iter()
                .skip(edges_before)
                .map(|id| GraphEntity::Edge(*id)),
        );
        self.select(created.clone());
        Ok(created)
    }

    /// Nodes of a dropped relationship keep their layout relative to the
    /// drop point; hashes already in the graph are replaced.
    fn relationship_action(
        &self,
        relationship: Relationship,
        at: Point,
        created: &mut Vec<GraphEntity>,
    ) -> Box<dyn GraphAction> {
        let Relationship {
            node1,
            node2,
            mut edge,
        } = relationship;
        let mut renamed: HashMap<String, String> = HashMap::new();
        let mut actions: Vec<Box<dyn GraphAction>> = Vec::new();

        for mut node in [node1, node2] {
            if renamed.contains_key(&node.hash) {
                continue;
            }
            let original = node.hash.clone();
            if self.graph.node(&node.hash).is_some() {
                node.hash = new_node_hash();
            }
            node.data.x += at.x;
            node.data.y += at.y;
            renamed.insert(original, node.hash.clone());
            created.push(GraphEntity::Node(node.hash.clone()));
            actions.push(Box::new(NodeCreation::new("Create node", node)));
        }

        if let Some(hash) = renamed.get(&edge.from) {
            edge.from.clone_from(hash);
        }
        if let Some(hash) = renamed.get(&edge.to) {
            edge.to.clone_from(hash);
        }
        actions.push(Box::new(EdgeCreation::new("Create relationship", edge)));
        Box::new(CompoundAction::new("Create relationship", actions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryImageProvider, ViewConfig};
    use kmap_core::{
        Edge, Modifiers, Node, UniversalGraph, NODE_MIME_TYPE, RELATIONSHIP_MIME_TYPE,
    };
    use kmap_renderer::MonospaceMeasurer;

    fn view() -> CanvasGraphView {
        let mut view = CanvasGraphView::new(
            ViewConfig::default(),
            Box::new(MonospaceMeasurer::default()),
            MemoryImageProvider::new(),
        );
        view.set_viewport(800.0, 600.0);
        let mut graph = UniversalGraph::new();
        graph.nodes.push(Node::new("a", "gene", "A", 0.0, 0.0).with_size(100.0, 40.0));
        graph.nodes.push(Node::new("b", "gene", "B", 300.0, 0.0).with_size(100.0, 40.0));
        graph.edges.push(Edge::new("a", "b", "binds"));
        view.set_graph(graph).unwrap();
        view.drain_events();
        view
    }

    fn shift() -> Modifiers {
        Modifiers {
            shift: true,
            ..Modifiers::default()
        }
    }

    fn click(view: &mut CanvasGraphView, x: f64, y: f64, modifiers: Modifiers) {
        view.handle_pointer(PointerEvent::down(x, y).with_modifiers(modifiers))
            .unwrap();
        view.handle_pointer(PointerEvent::up(x, y).with_modifiers(modifiers))
            .unwrap();
    }

    #[test]
    fn test_click_selects_and_shift_toggles() {
        let mut view = view();
        click(&mut view, 0.0, 0.0, Modifiers::default());
        assert_eq!(view.selection(), &[GraphEntity::Node("a".into())]);

        click(&mut view, 300.0, 0.0, shift());
        assert_eq!(view.selection().len(), 2);

        click(&mut view, 0.0, 0.0, shift());
        assert_eq!(view.selection(), &[GraphEntity::Node("b".into())]);

        click(&mut view, 150.0, 300.0, Modifiers::default());
        assert!(view.selection().is_empty());
    }

    #[test]
    fn test_drag_moves_live_and_commits_one_step() {
        let mut view = view();
        view.select(vec![GraphEntity::Node("a".into()), GraphEntity::Node("b".into())]);
        view.drain_events();

        view.handle_pointer(PointerEvent::down(0.0, 0.0)).unwrap();
        view.handle_pointer(PointerEvent::moved(10.0, 5.0)).unwrap();
        assert_eq!(view.get_node("b").unwrap().position(), (310.0, 5.0));
        assert!(view.is_interacting());
        view.handle_pointer(PointerEvent::moved(20.0, 10.0)).unwrap();
        view.handle_pointer(PointerEvent::up(20.0, 10.0)).unwrap();

        assert_eq!(view.get_node("a").unwrap().position(), (20.0, 10.0));
        assert_eq!(view.get_node("b").unwrap().position(), (320.0, 10.0));
        let events = view.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, ViewEvent::EntityDragged { .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            ViewEvent::EntityDropped { entities, .. } if entities.len() == 2
        )));

        assert!(view.undo().unwrap());
        assert_eq!(view.get_node("a").unwrap().position(), (0.0, 0.0));
        assert_eq!(view.get_node("b").unwrap().position(), (300.0, 0.0));
        assert!(!view.history().can_undo());
    }

    #[test]
    fn test_small_movement_is_a_click() {
        let mut view = view();
        view.handle_pointer(PointerEvent::down(0.0, 0.0)).unwrap();
        view.handle_pointer(PointerEvent::moved(1.0, 1.0)).unwrap();
        view.handle_pointer(PointerEvent::up(1.0, 1.0)).unwrap();
        assert_eq!(view.get_node("a").unwrap().position(), (0.0, 0.0));
        assert_eq!(view.selection(), &[GraphEntity::Node("a".into())]);
        assert!(!view.history().can_undo());
    }

    #[test]
    fn test_rubber_band_selects_enclosed() {
        let mut view = view();
        view.handle_pointer(PointerEvent::down(-100.0, -100.0)).unwrap();
        view.handle_pointer(PointerEvent::moved(100.0, 100.0)).unwrap();
        assert!(view.pointer.rubber_band().is_some());
        view.handle_pointer(PointerEvent::up(100.0, 100.0)).unwrap();
        assert_eq!(view.selection(), &[GraphEntity::Node("a".into())]);
        assert!(view.pointer.rubber_band().is_none());
    }

    #[test]
    fn test_drop_node_at_graph_point() {
        let mut view = view();
        view.set_transform(kmap_renderer::ViewTransform::new(100.0, 0.0, 2.0));
        let json = r#"{"display_name": "TP53", "label": "gene"}"#;
        let created = view.handle_drop(NODE_MIME_TYPE, json, 300.0, 100.0).unwrap();
        assert_eq!(created.len(), 1);
        let hash = created[0].as_node().unwrap();
        assert_eq!(view.get_node(hash).unwrap().position(), (100.0, 50.0));
        assert_eq!(view.selection(), created.as_slice());

        assert!(view.undo().unwrap());
        assert_eq!(view.node_count(), 2);
    }

    #[test]
    fn test_drop_relationship_renames_taken_hashes() {
        let mut view = view();
        let json = r#"{
            "node1": {"hash": "a", "label": "gene", "display_name": "A", "data": {"x": 0, "y": 0}},
            "node2": {"hash": "c", "label": "chemical", "display_name": "C", "data": {"x": 50, "y": 0}},
            "edge": {"from": "a", "to": "c", "label": "targets"}
        }"#;
        let created = view
            .handle_drop(RELATIONSHIP_MIME_TYPE, json, 500.0, 500.0)
            .unwrap();
        assert_eq!(created.len(), 3);
        assert_eq!(view.node_count(), 4);
        assert_eq!(view.edge_count(), 2);

        let renamed = created[0].as_node().unwrap();
        assert_ne!(renamed, "a");
        assert_eq!(view.get_node("c").unwrap().position(), (550.0, 500.0));
        let (_, edge) = view.edges().last().unwrap();
        assert_eq!(edge.from, renamed);
        assert_eq!(edge.to, "c");

        // One undo step removes all three.
        assert!(view.undo().unwrap());
        assert_eq!(view.node_count(), 2);
        assert_eq!(view.edge_count(), 1);
    }

    #[test]
    fn test_bad_drop_changes_nothing() {
        let mut view = view();
        assert!(view.handle_drop("text/plain", "x", 0.0, 0.0).is_err());
        assert!(view.handle_drop(NODE_MIME_TYPE, "{", 0.0, 0.0).is_err());
        assert_eq!(view.node_count(), 2);
        assert!(!view.history().can_undo());
    }
}
