//! The scene controller.
//!
//! `CanvasGraphView` owns the live graph and everything derived from it:
//!
//! ```text
//!   UniversalGraph ──► RenderStyle ──► placed shape cache ──► DrawContext
//!        ▲                                   │
//!        │ GraphActionReceiver               └──► hit testing
//!   History (undo/redo)
//! ```
//!
//! Every mutation goes through the [`GraphActionReceiver`] impl, which
//! drops exactly the placed shapes the mutation made stale. Shapes are
//! rebuilt lazily before the next draw or query.

use std::collections::HashMap;
use std::fmt;

use kmap_core::{
    compile_find, Edge, EdgeId, EntityList, EntityListChange, FindOptions, GraphAction,
    GraphActionReceiver, GraphEntity, History, HistoryChange, MapError, MapResult, Node,
    RemovedNode, UniversalGraph, ViewEvent,
};
use kmap_renderer::{
    Bitmap, BoundingBox, EdgeEnds, KnowledgeMapStyle, LineEdge, PlacedNode, PlacedObject,
    PlacementOptions, Point, RenderStyle, ResourceManager, ResourceProvider, TextMeasurer,
    ViewTransform,
};

use crate::config::ViewConfig;
use crate::error::ViewResult;
use crate::interaction::PointerState;
use crate::render::RenderState;

/// Interactive controller for one knowledge map.
pub struct CanvasGraphView {
    pub(crate) config: ViewConfig,
    pub(crate) graph: UniversalGraph,
    /// Parallel to `graph.edges`.
    pub(crate) edge_ids: Vec<EdgeId>,
    next_edge_id: u64,
    pub(crate) style: Box<dyn RenderStyle>,
    pub(crate) measurer: Box<dyn TextMeasurer>,
    pub(crate) images: ResourceManager<Bitmap>,
    pub(crate) placed_nodes: HashMap<String, PlacedNode>,
    pub(crate) placed_edges: HashMap<EdgeId, LineEdge>,
    pub(crate) selection: EntityList,
    pub(crate) highlighting: EntityList,
    pub(crate) search_highlighting: EntityList,
    pub(crate) search_focus: Option<GraphEntity>,
    search: Option<(Vec<String>, FindOptions)>,
    history: History,
    dirty: bool,
    pub(crate) transform: ViewTransform,
    pub(crate) viewport: (f64, f64),
    pub(crate) events: Vec<ViewEvent>,
    pub(crate) pointer: PointerState,
    pub(crate) render: RenderState,
}

impl fmt::Debug for CanvasGraphView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasGraphView")
            .field("nodes", &self.graph.nodes.len())
            .field("edges", &self.graph.edges.len())
            .field("placed_nodes", &self.placed_nodes.len())
            .field("placed_edges", &self.placed_edges.len())
            .field("selection", &self.selection.get())
            .field("transform", &self.transform)
            .field("dirty", &self.dirty)
            .field("style", &self.style)
            .field("images", &self.images)
            .finish_non_exhaustive()
    }
}

impl CanvasGraphView {
    /// Create an empty view with the knowledge-map style.
    ///
    /// `measurer` sizes text; pass the canvas the view will draw on so
    /// layout matches what is drawn. `images` resolves image node bitmaps.
    #[must_use]
    pub fn new(
        config: ViewConfig,
        measurer: Box<dyn TextMeasurer>,
        images: impl ResourceProvider<Bitmap> + 'static,
    ) -> Self {
        let images = ResourceManager::with_config(images, config.resource_cache.clone());
        Self {
            config,
            graph: UniversalGraph::new(),
            edge_ids: Vec::new(),
            next_edge_id: 0,
            style: Box::new(KnowledgeMapStyle::default()),
            measurer,
            images,
            placed_nodes: HashMap::new(),
            placed_edges: HashMap::new(),
            selection: EntityList::new(),
            highlighting: EntityList::new(),
            search_highlighting: EntityList::new(),
            search_focus: None,
            search: None,
            history: History::new(),
            dirty: false,
            transform: ViewTransform::IDENTITY,
            viewport: (0.0, 0.0),
            events: Vec::new(),
            pointer: PointerState::Idle,
            render: RenderState::default(),
        }
    }

    /// The view configuration.
    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Switch the render style; every shape is placed again.
    pub fn set_style(&mut self, style: Box<dyn RenderStyle>) {
        self.style = style;
        self.invalidate_all();
    }

    /// The image cache.
    #[must_use]
    pub fn images(&self) -> &ResourceManager<Bitmap> {
        &self.images
    }

    // ========================================================================
    // Graph
    // ========================================================================

    /// Replace the working graph.
    ///
    /// Clears history, selection and every placed shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph fails validation; the current graph is
    /// kept in that case.
    pub fn set_graph(&mut self, graph: UniversalGraph) -> MapResult<()> {
        GraphActionReceiver::replace_graph(self, graph)?;
        self.history.clear();
        self.dirty = false;
        let HistoryChange { can_undo, can_redo } = self.history.state();
        self.events.push(ViewEvent::HistoryChanged {
            dirty: false,
            can_undo,
            can_redo,
        });
        Ok(())
    }

    /// Parse a graph document and display it.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or an invalid graph; nothing
    /// changes in that case.
    pub fn load_graph_json(&mut self, json: &str) -> ViewResult<()> {
        let graph = UniversalGraph::from_json(json)?;
        self.set_graph(graph)?;
        Ok(())
    }

    /// The current graph.
    #[must_use]
    pub fn graph(&self) -> &UniversalGraph {
        &self.graph
    }

    /// Serialize the current graph.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn graph_json(&self) -> MapResult<String> {
        self.graph.to_json()
    }

    /// Look up a node.
    #[must_use]
    pub fn get_node(&self, hash: &str) -> Option<&Node> {
        self.graph.node(hash)
    }

    /// Look up a node that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NodeNotFound`] if there is no such node.
    pub fn expect_node(&self, hash: &str) -> MapResult<&Node> {
        self.graph
            .node(hash)
            .ok_or_else(|| MapError::NodeNotFound(hash.to_string()))
    }

    /// Look up an edge by id.
    #[must_use]
    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edge_index(id).and_then(|i| self.graph.edges.get(i))
    }

    /// Edges with their ids, in drawing order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edge_ids.iter().copied().zip(&self.graph.edges)
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edges.len()
    }

    /// Whether the entity exists in the graph.
    #[must_use]
    pub fn contains_entity(&self, entity: &GraphEntity) -> bool {
        match entity {
            GraphEntity::Node(hash) => self.graph.node(hash).is_some(),
            GraphEntity::Edge(id) => self.edge_index(*id).is_some(),
        }
    }

    pub(crate) fn edge_index(&self, id: EdgeId) -> Option<usize> {
        self.edge_ids.iter().position(|e| *e == id)
    }

    fn fresh_edge_id(&mut self) -> EdgeId {
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        id
    }

    /// Add a node without recording history.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::DuplicateNode`] if the hash is taken.
    pub fn add_node(&mut self, node: Node) -> MapResult<()> {
        self.insert_node(None, node)
    }

    /// Remove a node and its edges without recording history.
    ///
    /// Returns the removed edges.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NodeNotFound`] if there is no such node.
    pub fn remove_node(&mut self, hash: &str) -> MapResult<Vec<Edge>> {
        let removed = GraphActionReceiver::remove_node(self, hash)?;
        Ok(removed.edges.into_iter().map(|(_, edge)| edge).collect())
    }

    /// Replace a node's properties without recording history.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NodeNotFound`] if there is no node with that hash.
    pub fn update_node(&mut self, node: Node) -> MapResult<Node> {
        self.replace_node(node)
    }

    /// Add an edge without recording history.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingEndpoint`] if an endpoint does not exist.
    pub fn add_edge(&mut self, edge: Edge) -> MapResult<EdgeId> {
        self.insert_edge(None, edge)?;
        self.edge_ids
            .last()
            .copied()
            .ok_or_else(|| MapError::InvalidOperation("edge was not inserted".to_string()))
    }

    /// Remove an edge without recording history.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::EdgeNotFound`] if the id is unknown.
    pub fn remove_edge(&mut self, id: EdgeId) -> MapResult<Edge> {
        let index = self
            .edge_index(id)
            .ok_or_else(|| MapError::EdgeNotFound(id.to_string()))?;
        let edge = self.graph.edges.remove(index);
        self.edge_ids.remove(index);
        self.forget_entity(&GraphEntity::Edge(id));
        Ok(edge)
    }

    /// Replace an edge's properties without recording history.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown or an endpoint does not exist.
    pub fn update_edge(&mut self, id: EdgeId, edge: Edge) -> MapResult<Edge> {
        let index = self
            .edge_index(id)
            .ok_or_else(|| MapError::EdgeNotFound(id.to_string()))?;
        self.replace_edge_at(index, edge)
    }

    pub(crate) fn set_node_position(&mut self, hash: &str, x: f64, y: f64) -> MapResult<()> {
        let mut node = self.expect_node(hash)?.clone();
        node.data.x = x;
        node.data.y = y;
        self.replace_node(node)?;
        Ok(())
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    /// Drop a node's placed shape and those of its edges.
    pub fn invalidate_node(&mut self, hash: &str) {
        if let Some(mut placed) = self.placed_nodes.remove(hash) {
            if let Some(image) = placed.as_image_mut() {
                image.unbind(&mut self.images);
            }
        }
        for (edge, id) in self.graph.edges.iter().zip(&self.edge_ids) {
            if edge.touches(hash) {
                self.placed_edges.remove(id);
            }
        }
        self.request_render();
    }

    /// Drop an edge's placed shape.
    pub fn invalidate_edge(&mut self, id: EdgeId) {
        self.placed_edges.remove(&id);
        self.request_render();
    }

    /// Drop the placed shape of any entity.
    pub fn invalidate_entity(&mut self, entity: &GraphEntity) {
        match entity {
            GraphEntity::Node(hash) => self.invalidate_node(hash),
            GraphEntity::Edge(id) => self.invalidate_edge(*id),
        }
    }

    /// Drop every placed shape.
    pub fn invalidate_all(&mut self) {
        for (_, mut placed) in self.placed_nodes.drain() {
            if let Some(image) = placed.as_image_mut() {
                image.unbind(&mut self.images);
            }
        }
        self.placed_edges.clear();
        self.request_render();
    }

    fn placement_options(&self, entity: &GraphEntity) -> PlacementOptions {
        PlacementOptions {
            selected: self.selection.contains(entity),
            highlighted: self.highlighting.contains(entity)
                || self.search_highlighting.contains(entity),
        }
    }

    /// Place every entity that has no placed shape yet.
    pub(crate) fn ensure_placed(&mut self) {
        for node in &self.graph.nodes {
            if self.placed_nodes.contains_key(&node.hash) {
                continue;
            }
            let options = self.placement_options(&GraphEntity::Node(node.hash.clone()));
            let mut placed = self.style.place_node(node, self.measurer.as_ref(), options);
            if let Some(image) = placed.as_image_mut() {
                image.bind(&mut self.images);
            }
            self.placed_nodes.insert(node.hash.clone(), placed);
        }

        if self.placed_edges.len() == self.graph.edges.len() {
            return;
        }
        let nodes: HashMap<&str, &Node> = self
            .graph
            .nodes
            .iter()
            .map(|n| (n.hash.as_str(), n))
            .collect();
        for (edge, id) in self.graph.edges.iter().zip(&self.edge_ids) {
            if self.placed_edges.contains_key(id) {
                continue;
            }
            let (Some(from), Some(to)) = (nodes.get(edge.from.as_str()), nodes.get(edge.to.as_str()))
            else {
                tracing::warn!("Edge {} references a missing node", edge);
                continue;
            };
            let (Some(placed_from), Some(placed_to)) =
                (self.placed_nodes.get(&edge.from), self.placed_nodes.get(&edge.to))
            else {
                continue;
            };
            let options = self.placement_options(&GraphEntity::Edge(*id));
            let placed = self
                .style
                .place_edge(
                    edge,
                    EdgeEnds {
                        from,
                        to,
                        placed_from,
                        placed_to,
                    },
                    self.measurer.as_ref(),
                    options,
                )
                .with_hit_tolerance(self.config.edge_hit_tolerance);
            self.placed_edges.insert(*id, placed);
        }
    }

    /// The placed shape of a node, placing it first if needed.
    pub fn placed_node(&mut self, hash: &str) -> Option<&PlacedNode> {
        self.ensure_placed();
        self.placed_nodes.get(hash)
    }

    /// The placed shape of an edge, placing it first if needed.
    pub fn placed_edge(&mut self, id: EdgeId) -> Option<&LineEdge> {
        self.ensure_placed();
        self.placed_edges.get(&id)
    }

    // ========================================================================
    // Selection and highlighting
    // ========================================================================

    fn apply_list_change(&mut self, change: &EntityListChange) -> bool {
        for entity in &change.invalidated {
            self.invalidate_entity(entity);
        }
        change.changed
    }

    fn emit_selection(&mut self) {
        self.events
            .push(ViewEvent::SelectionChanged(self.selection.get().to_vec()));
    }

    /// Replace the selection. Entities not in the graph are ignored.
    pub fn select(&mut self, entities: Vec<GraphEntity>) {
        let entities = entities
            .into_iter()
            .filter(|e| self.contains_entity(e))
            .collect();
        let change = self.selection.replace(entities);
        if self.apply_list_change(&change) {
            self.emit_selection();
        }
    }

    /// Add entities to the selection.
    pub fn add_to_selection(&mut self, entities: Vec<GraphEntity>) {
        let entities: Vec<GraphEntity> = entities
            .into_iter()
            .filter(|e| self.contains_entity(e))
            .collect();
        let change = self.selection.add(entities);
        if self.apply_list_change(&change) {
            self.emit_selection();
        }
    }

    /// Add the entity to the selection, or remove it if already selected.
    pub fn toggle_selection(&mut self, entity: GraphEntity) {
        let change = if self.selection.contains(&entity) {
            self.selection.remove(&entity)
        } else if self.contains_entity(&entity) {
            self.selection.add([entity])
        } else {
            return;
        };
        if self.apply_list_change(&change) {
            self.emit_selection();
        }
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) {
        let change = self.selection.clear();
        if self.apply_list_change(&change) {
            self.emit_selection();
        }
    }

    /// Selected entities in selection order.
    #[must_use]
    pub fn selection(&self) -> &[GraphEntity] {
        self.selection.get()
    }

    /// Replace the highlighted entities.
    pub fn highlight(&mut self, entities: Vec<GraphEntity>) {
        let change = self.highlighting.replace(entities);
        if self.apply_list_change(&change) {
            self.events
                .push(ViewEvent::HighlightChanged(self.highlighting.get().to_vec()));
        }
    }

    /// Highlighted entities.
    #[must_use]
    pub fn highlighted(&self) -> &[GraphEntity] {
        self.highlighting.get()
    }

    /// Remove a deleted entity from every list that mentions it.
    fn forget_entity(&mut self, entity: &GraphEntity) {
        if let GraphEntity::Edge(id) = entity {
            self.placed_edges.remove(id);
        }
        if self.selection.retain(|e| e != entity) {
            self.emit_selection();
        }
        if self.highlighting.retain(|e| e != entity) {
            self.events
                .push(ViewEvent::HighlightChanged(self.highlighting.get().to_vec()));
        }
        self.search_highlighting.retain(|e| e != entity);
        if self.search_focus.as_ref() == Some(entity) {
            self.search_focus = None;
        }
        self.request_render();
    }

    // ========================================================================
    // Find
    // ========================================================================

    /// Entities whose text matches any of `terms`: nodes first, then edges.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidPattern`] if the terms do not compile.
    pub fn find_matching<S: AsRef<str>>(
        &self,
        terms: &[S],
        options: FindOptions,
    ) -> MapResult<Vec<GraphEntity>> {
        let matcher = compile_find(terms, options)?;
        let nodes = self
            .graph
            .nodes
            .iter()
            .filter(|n| matcher.matches_node(n))
            .map(|n| GraphEntity::Node(n.hash.clone()));
        let edges = self
            .edges()
            .filter(|(_, e)| matcher.matches_edge(e))
            .map(|(id, _)| GraphEntity::Edge(id));
        Ok(nodes.chain(edges).collect())
    }

    /// Highlight every match of `terms` and keep doing so after edits.
    ///
    /// Returns the number of matches.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidPattern`] if the terms do not compile.
    pub fn set_search_terms<S: AsRef<str>>(
        &mut self,
        terms: &[S],
        options: FindOptions,
    ) -> MapResult<usize> {
        let terms: Vec<String> = terms.iter().map(|t| t.as_ref().to_string()).collect();
        let matches = self.find_matching(&terms, options)?;
        let count = matches.len();
        self.search = Some((terms, options));
        self.set_search_focus(None);
        let change = self.search_highlighting.replace(matches);
        self.apply_list_change(&change);
        Ok(count)
    }

    /// Stop highlighting search matches.
    pub fn clear_search(&mut self) {
        self.search = None;
        self.set_search_focus(None);
        let change = self.search_highlighting.clear();
        self.apply_list_change(&change);
    }

    /// Current search matches.
    #[must_use]
    pub fn search_results(&self) -> &[GraphEntity] {
        self.search_highlighting.get()
    }

    /// The focused search match.
    #[must_use]
    pub fn search_focus(&self) -> Option<&GraphEntity> {
        self.search_focus.as_ref()
    }

    /// Focus the match at `index` (wrapping around) and pan to it.
    pub fn focus_search_result(&mut self, index: usize) -> Option<GraphEntity> {
        let results = self.search_highlighting.get();
        if results.is_empty() {
            return None;
        }
        let entity = results[index % results.len()].clone();
        self.set_search_focus(Some(entity.clone()));
        self.pan_to_entity(&entity);
        Some(entity)
    }

    fn set_search_focus(&mut self, focus: Option<GraphEntity>) {
        if self.search_focus != focus {
            self.search_focus = focus;
            self.request_render();
        }
    }

    fn refresh_search(&mut self) {
        let Some((terms, options)) = self.search.clone() else {
            return;
        };
        match self.find_matching(&terms, options) {
            Ok(matches) => {
                let change = self.search_highlighting.replace(matches);
                self.apply_list_change(&change);
                if self
                    .search_focus
                    .as_ref()
                    .is_some_and(|f| !self.search_highlighting.contains(f))
                {
                    self.search_focus = None;
                }
            }
            Err(e) => tracing::warn!("Search refresh failed: {}", e),
        }
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Apply an action and record it for undo.
    ///
    /// # Errors
    ///
    /// Returns the action's error; the graph is left as it was and nothing
    /// is recorded.
    pub fn execute(&mut self, action: Box<dyn GraphAction>) -> MapResult<()> {
        let mut history = std::mem::take(&mut self.history);
        let result = history.execute(self, action);
        self.history = history;
        let change = result?;
        self.history_changed(change);
        Ok(())
    }

    /// Roll back the last action. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub fn undo(&mut self) -> MapResult<bool> {
        let mut history = std::mem::take(&mut self.history);
        let result = history.undo(self);
        self.history = history;
        if result? {
            self.history_changed(self.history.state());
            return Ok(true);
        }
        Ok(false)
    }

    /// Re-apply the last undone action. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the action fails.
    pub fn redo(&mut self) -> MapResult<bool> {
        let mut history = std::mem::take(&mut self.history);
        let result = history.redo(self);
        self.history = history;
        if result? {
            self.history_changed(self.history.state());
            return Ok(true);
        }
        Ok(false)
    }

    /// The undo/redo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    fn history_changed(&mut self, change: HistoryChange) {
        self.dirty = true;
        self.events.push(ViewEvent::HistoryChanged {
            dirty: true,
            can_undo: change.can_undo,
            can_redo: change.can_redo,
        });
        self.refresh_search();
        self.request_render();
    }

    /// Whether there are edits since the last load or save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record that the current graph was saved.
    pub fn mark_saved(&mut self) {
        if self.dirty {
            self.dirty = false;
            let HistoryChange { can_undo, can_redo } = self.history.state();
            self.events.push(ViewEvent::HistoryChanged {
                dirty: false,
                can_undo,
                can_redo,
            });
        }
    }

    /// Take the queued notifications.
    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Camera
    // ========================================================================

    /// Set the canvas size in screen pixels.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
        self.request_render();
    }

    /// Canvas size in screen pixels.
    #[must_use]
    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    /// Current pan/zoom.
    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    /// Set the pan/zoom.
    pub fn set_transform(&mut self, transform: ViewTransform) {
        if transform.k.is_finite() && transform.k > 0.0 {
            self.transform = transform;
            self.request_render();
        } else {
            tracing::warn!("Ignoring degenerate zoom {}", transform.k);
        }
    }

    /// Pan by a screen-space offset.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.set_transform(self.transform.translate_by(dx, dy));
    }

    /// Zoom by `factor` keeping the screen point `anchor` fixed.
    pub fn zoom_by(&mut self, factor: f64, anchor: Point) {
        self.set_transform(self.transform.scale_about(factor, anchor));
    }

    /// Center `bbox` in the viewport at zoom `k`.
    fn center_on(&mut self, bbox: &BoundingBox, k: f64) {
        let center = bbox.center();
        let (width, height) = self.viewport;
        self.set_transform(ViewTransform::new(
            width / 2.0 - center.x * k,
            height / 2.0 - center.y * k,
            k,
        ));
    }

    /// Fit the whole graph into the viewport, leaving `padding` pixels.
    pub fn zoom_to_fit(&mut self, padding: f64) {
        let Some(bbox) = self.graph_bounding_box() else {
            self.set_transform(ViewTransform::IDENTITY);
            return;
        };
        let (width, height) = self.viewport;
        let kx = (width - 2.0 * padding) / bbox.width();
        let ky = (height - 2.0 * padding) / bbox.height();
        let k = kx.min(ky);
        let k = if k.is_finite() && k > 0.0 { k } else { 1.0 };
        self.center_on(&bbox, k);
    }

    /// Zoom in on a node.
    pub fn pan_to_node(&mut self, hash: &str) {
        self.pan_to_entity(&GraphEntity::Node(hash.to_string()));
    }

    /// Zoom in on any entity.
    pub fn pan_to_entity(&mut self, entity: &GraphEntity) {
        if let Some(bbox) = self.entity_bounding_box(entity) {
            self.center_on(&bbox, self.config.pan_to_node_scale);
        }
    }

    /// Graph coordinates of a screen point.
    #[must_use]
    pub fn screen_to_graph(&self, x: f64, y: f64) -> Point {
        self.transform.invert(Point::new(x, y))
    }

    // ========================================================================
    // Geometry queries (graph coordinates)
    // ========================================================================

    fn find_node(&mut self, x: f64, y: f64, accept: impl Fn(&PlacedNode) -> bool) -> Option<String> {
        self.ensure_placed();
        let snap_sq = self.config.node_snap_distance.powi(2);
        let mut closest: Option<(f64, &str)> = None;
        for node in self.graph.nodes.iter().rev() {
            let Some(placed) = self.placed_nodes.get(&node.hash) else {
                continue;
            };
            if !accept(placed) || !placed.is_point_intersecting(x, y) {
                continue;
            }
            let distance_sq = (node.data.x - x).powi(2) + (node.data.y - y).powi(2);
            if distance_sq <= snap_sq {
                return Some(node.hash.clone());
            }
            if closest.is_none_or(|(best, _)| distance_sq < best) {
                closest = Some((distance_sq, &node.hash));
            }
        }
        closest.map(|(_, hash)| hash.to_string())
    }

    /// The node under a point.
    ///
    /// Topmost nodes are checked first; a node whose center is within the
    /// snap distance wins outright, otherwise the hit closest to its center.
    pub fn node_at_position(&mut self, x: f64, y: f64) -> Option<String> {
        self.find_node(x, y, |_| true)
    }

    /// The edge under a point, or the nearest one within the candidate
    /// distance.
    pub fn edge_at_position(&mut self, x: f64, y: f64) -> Option<EdgeId> {
        self.ensure_placed();
        let mut candidate: Option<(f64, EdgeId)> = None;
        for id in self.edge_ids.iter().rev() {
            let Some(placed) = self.placed_edges.get(id) else {
                continue;
            };
            if placed.is_point_intersecting(x, y) {
                return Some(*id);
            }
            let distance_sq = placed.point_distance_unsq(x, y);
            if distance_sq <= self.config.edge_candidate_distance_sq
                && candidate.is_none_or(|(best, _)| distance_sq < best)
            {
                candidate = Some((distance_sq, *id));
            }
        }
        candidate.map(|(_, id)| id)
    }

    /// The entity under a point.
    ///
    /// Nodes win over edges, except image nodes: edges drawn across an
    /// image stay clickable.
    pub fn entity_at_position(&mut self, x: f64, y: f64) -> Option<GraphEntity> {
        if let Some(hash) = self.find_node(x, y, |p| !p.is_image()) {
            return Some(GraphEntity::Node(hash));
        }
        if let Some(id) = self.edge_at_position(x, y) {
            return Some(GraphEntity::Edge(id));
        }
        self.find_node(x, y, PlacedNode::is_image)
            .map(GraphEntity::Node)
    }

    /// Entities lying completely inside `bbox`.
    pub fn entities_within_bbox(&mut self, bbox: &BoundingBox) -> Vec<GraphEntity> {
        self.ensure_placed();
        let nodes = self.graph.nodes.iter().filter_map(|node| {
            self.placed_nodes
                .get(&node.hash)
                .filter(|p| p.is_bbox_enclosing(bbox))
                .map(|_| GraphEntity::Node(node.hash.clone()))
        });
        let edges = self.edge_ids.iter().filter_map(|id| {
            self.placed_edges
                .get(id)
                .filter(|p| p.is_bbox_enclosing(bbox))
                .map(|_| GraphEntity::Edge(*id))
        });
        nodes.chain(edges).collect()
    }

    /// Bounding box of an entity's placed shape.
    pub fn entity_bounding_box(&mut self, entity: &GraphEntity) -> Option<BoundingBox> {
        self.ensure_placed();
        match entity {
            GraphEntity::Node(hash) => self.placed_nodes.get(hash).map(PlacedObject::bounding_box),
            GraphEntity::Edge(id) => self.placed_edges.get(id).map(PlacedObject::bounding_box),
        }
    }

    /// Bounding box of everything drawn, or `None` for an empty graph.
    pub fn graph_bounding_box(&mut self) -> Option<BoundingBox> {
        self.ensure_placed();
        let nodes = self.placed_nodes.values().map(PlacedObject::bounding_box);
        let edges = self.placed_edges.values().map(PlacedObject::bounding_box);
        nodes.chain(edges).reduce(|a, b| a.union(&b))
    }
}

impl GraphActionReceiver for CanvasGraphView {
    fn node(&self, hash: &str) -> Option<&Node> {
        self.graph.node(hash)
    }

    fn insert_node(&mut self, index: Option<usize>, node: Node) -> MapResult<()> {
        let hash = node.hash.clone();
        self.graph.insert_node(index, node)?;
        self.invalidate_node(&hash);
        Ok(())
    }

    fn remove_node(&mut self, hash: &str) -> MapResult<RemovedNode> {
        let removed = self.graph.remove_node(hash)?;
        for (index, _) in removed.edges.iter().rev() {
            let id = self.edge_ids.remove(*index);
            self.forget_entity(&GraphEntity::Edge(id));
        }
        self.invalidate_node(hash);
        self.forget_entity(&GraphEntity::Node(hash.to_string()));
        Ok(removed)
    }

    fn replace_node(&mut self, node: Node) -> MapResult<Node> {
        let hash = node.hash.clone();
        let old = self.graph.replace_node(node)?;
        self.invalidate_node(&hash);
        Ok(old)
    }

    fn insert_edge(&mut self, index: Option<usize>, edge: Edge) -> MapResult<()> {
        let len = self.graph.edges.len();
        let index = index.map_or(len, |i| i.min(len));
        self.graph.insert_edge(Some(index), edge)?;
        let id = self.fresh_edge_id();
        self.edge_ids.insert(index, id);
        self.request_render();
        Ok(())
    }

    fn remove_edge(&mut self, edge: &Edge) -> MapResult<usize> {
        let index = self.graph.remove_edge(edge)?;
        let id = self.edge_ids.remove(index);
        self.forget_entity(&GraphEntity::Edge(id));
        Ok(index)
    }

    fn replace_edge(&mut self, current: &Edge, replacement: Edge) -> MapResult<usize> {
        let index = self.graph.replace_edge(current, replacement)?;
        if let Some(id) = self.edge_ids.get(index).copied() {
            self.invalidate_edge(id);
        }
        Ok(index)
    }

    fn replace_edge_at(&mut self, index: usize, replacement: Edge) -> MapResult<Edge> {
        let old = self.graph.replace_edge_at(index, replacement)?;
        if let Some(id) = self.edge_ids.get(index).copied() {
            self.invalidate_edge(id);
        }
        Ok(old)
    }

    fn replace_graph(&mut self, graph: UniversalGraph) -> MapResult<UniversalGraph> {
        let old = self.graph.replace_graph(graph)?;
        tracing::debug!(
            "Graph replaced: {} nodes, {} edges",
            self.graph.nodes.len(),
            self.graph.edges.len()
        );
        let ids = (0..self.graph.edges.len())
            .map(|_| self.fresh_edge_id())
            .collect();
        self.edge_ids = ids;
        self.invalidate_all();
        self.pointer = PointerState::Idle;
        self.search_focus = None;
        self.search_highlighting.clear();
        if self.highlighting.clear().changed {
            self.events.push(ViewEvent::HighlightChanged(Vec::new()));
        }
        if self.selection.clear().changed {
            self.emit_selection();
        }
        self.refresh_search();
        Ok(old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryImageProvider;
    use kmap_core::{EdgeCreation, NodeCreation, NodeDeletion, NodeUpdate};
    use kmap_renderer::MonospaceMeasurer;

    fn view() -> CanvasGraphView {
        let mut view = CanvasGraphView::new(
            ViewConfig::default(),
            Box::new(MonospaceMeasurer::default()),
            MemoryImageProvider::new(),
        );
        view.set_viewport(800.0, 600.0);
        view
    }

    fn two_nodes() -> UniversalGraph {
        let mut graph = UniversalGraph::new();
        graph.nodes.push(Node::new("a", "gene", "A", 0.0, 0.0).with_size(100.0, 40.0));
        graph.nodes.push(Node::new("b", "gene", "B", 300.0, 0.0).with_size(100.0, 40.0));
        graph.edges.push(Edge::new("a", "b", "binds"));
        graph
    }

    #[test]
    fn test_add_node_undo_redo() {
        let mut view = view();
        let node = Node::new("a", "note", "", 0.0, 0.0);
        view.execute(Box::new(NodeCreation::new("Add note", node)))
            .unwrap();
        assert_eq!(view.node_count(), 1);
        let before_undo = view.graph().clone();

        assert!(view.undo().unwrap());
        assert_eq!(view.node_count(), 0);
        assert!(view.redo().unwrap());
        assert_eq!(view.graph(), &before_undo);
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut view = view();
        assert!(!view.undo().unwrap());
        assert!(!view.redo().unwrap());
        assert!(!view.is_dirty());
    }

    #[test]
    fn test_failed_action_is_not_recorded() {
        let mut view = view();
        let result = view.execute(Box::new(EdgeCreation::new(
            "Dangling",
            Edge::new("x", "y", "r"),
        )));
        assert!(matches!(result, Err(MapError::MissingEndpoint { .. })));
        assert!(!view.history().can_undo());
        assert!(!view.is_dirty());
    }

    #[test]
    fn test_history_events_and_dirty_flag() {
        let mut view = view();
        view.set_graph(two_nodes()).unwrap();
        view.drain_events();

        let mut node = view.get_node("a").unwrap().clone();
        node.display_name = "A2".to_string();
        view.execute(Box::new(NodeUpdate::new(node))).unwrap();
        assert!(view.is_dirty());
        assert!(view.drain_events().contains(&ViewEvent::HistoryChanged {
            dirty: true,
            can_undo: true,
            can_redo: false,
        }));

        view.mark_saved();
        assert!(!view.is_dirty());
    }

    #[test]
    fn test_invalid_graph_keeps_previous() {
        let mut view = view();
        view.set_graph(two_nodes()).unwrap();
        let result = view.load_graph_json(r#"{"nodes": [], "edges": [{"from": "a", "to": "z"}]}"#);
        assert!(result.is_err());
        assert_eq!(view.node_count(), 2);

        assert!(view.load_graph_json("{not json").is_err());
        assert_eq!(view.edge_count(), 1);
    }

    #[test]
    fn test_round_trip_keeps_unknown_fields() {
        let json = r#"{"nodes":[{"hash":"a","label":"gene","display_name":"A","data":{"x":1.0,"y":2.0,"custom":7},"color":"red"}],"edges":[],"version":3}"#;
        let mut view = view();
        view.load_graph_json(json).unwrap();
        let expected: serde_json::Value = serde_json::from_str(json).unwrap();
        let actual: serde_json::Value = serde_json::from_str(&view.graph_json().unwrap()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_edge_endpoints_on_node_borders() {
        let mut view = view();
        view.set_graph(two_nodes()).unwrap();
        let id = view.edges().next().unwrap().0;
        let a_box = view.entity_bounding_box(&GraphEntity::Node("a".into())).unwrap();
        let b_box = view.entity_bounding_box(&GraphEntity::Node("b".into())).unwrap();
        let edge = view.placed_edge(id).unwrap();
        assert!((edge.source().x - a_box.max_x).abs() < 1e-9);
        assert!((edge.target().x - b_box.min_x).abs() < 1e-9);
    }

    #[test]
    fn test_node_deletion_cascades_and_restores_edge_ids() {
        let mut view = view();
        view.set_graph(two_nodes()).unwrap();
        let id = view.edges().next().unwrap().0;
        view.select(vec![GraphEntity::Edge(id), GraphEntity::Node("a".into())]);

        view.execute(Box::new(NodeDeletion::new("a"))).unwrap();
        assert_eq!(view.edge_count(), 0);
        assert!(view.selection().is_empty());

        view.undo().unwrap();
        assert_eq!(view.edge_count(), 1);
        let (restored, edge) = view.edges().next().unwrap();
        assert_ne!(restored, id);
        assert_eq!(edge.label, "binds");
    }

    #[test]
    fn test_move_invalidates_node_and_edges() {
        let mut view = view();
        view.set_graph(two_nodes()).unwrap();
        let id = view.edges().next().unwrap().0;
        let before = view.placed_edge(id).unwrap().source();

        view.set_node_position("a", 0.0, 200.0).unwrap();
        assert!(!view.placed_edges.contains_key(&id));
        let after = view.placed_edge(id).unwrap().source();
        assert!(after.y > before.y);
    }

    #[test]
    fn test_hit_testing() {
        let mut view = view();
        view.set_graph(two_nodes()).unwrap();
        let id = view.edges().next().unwrap().0;

        assert_eq!(view.node_at_position(10.0, 5.0).as_deref(), Some("a"));
        assert_eq!(view.edge_at_position(150.0, 1.0), Some(id));
        // Near miss still picks the edge.
        assert_eq!(view.edge_at_position(100.0, 4.0), Some(id));
        assert_eq!(
            view.entity_at_position(300.0, 0.0),
            Some(GraphEntity::Node("b".into()))
        );
        assert_eq!(view.entity_at_position(150.0, 200.0), None);
    }

    #[test]
    fn test_overlapping_nodes_prefer_snap_then_closest() {
        let mut view = view();
        let mut graph = UniversalGraph::new();
        graph.nodes.push(Node::new("low", "gene", "L", 0.0, 0.0).with_size(100.0, 100.0));
        graph.nodes.push(Node::new("top", "gene", "T", 40.0, 0.0).with_size(100.0, 100.0));
        view.set_graph(graph).unwrap();

        // Within snap distance of the lower node's center.
        assert_eq!(view.node_at_position(2.0, 0.0).as_deref(), Some("low"));
        // Closer to the top node's center.
        assert_eq!(view.node_at_position(30.0, 0.0).as_deref(), Some("top"));
    }

    #[test]
    fn test_entities_within_bbox() {
        let mut view = view();
        view.set_graph(two_nodes()).unwrap();
        let found = view.entities_within_bbox(&BoundingBox::new(-100.0, -100.0, 100.0, 100.0));
        assert_eq!(found, vec![GraphEntity::Node("a".into())]);
        let all = view.entities_within_bbox(&BoundingBox::new(-500.0, -500.0, 900.0, 500.0));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_selection_events_and_placement() {
        let mut view = view();
        view.set_graph(two_nodes()).unwrap();
        view.drain_events();

        view.select(vec![GraphEntity::Node("a".into()), GraphEntity::Node("zz".into())]);
        assert_eq!(view.selection(), &[GraphEntity::Node("a".into())]);
        assert!(view
            .drain_events()
            .contains(&ViewEvent::SelectionChanged(vec![GraphEntity::Node("a".into())])));

        view.select(vec![GraphEntity::Node("a".into())]);
        assert!(!view
            .drain_events()
            .iter()
            .any(|e| matches!(e, ViewEvent::SelectionChanged(_))));

        view.toggle_selection(GraphEntity::Node("a".into()));
        assert!(view.selection().is_empty());
    }

    #[test]
    fn test_search_highlight_follows_edits() {
        let mut view = view();
        view.set_graph(two_nodes()).unwrap();
        assert_eq!(view.set_search_terms(&["binds"], FindOptions::default()).unwrap(), 1);

        let focused = view.focus_search_result(3).unwrap();
        assert!(matches!(focused, GraphEntity::Edge(_)));
        assert!((view.transform().k - 2.0).abs() < 1e-9);

        let mut node = view.get_node("b").unwrap().clone();
        node.display_name = "binds too".to_string();
        view.execute(Box::new(NodeUpdate::new(node))).unwrap();
        assert_eq!(view.search_results().len(), 2);

        view.clear_search();
        assert!(view.search_results().is_empty());
        assert!(view.search_focus().is_none());
    }

    #[test]
    fn test_zoom_to_fit_centers_graph() {
        let mut view = view();
        view.set_graph(two_nodes()).unwrap();
        view.zoom_to_fit(50.0);
        let bbox = view.graph_bounding_box().unwrap();
        let t = view.transform();
        let top_left = t.apply(Point::new(bbox.min_x, bbox.min_y));
        let bottom_right = t.apply(Point::new(bbox.max_x, bbox.max_y));
        assert!(top_left.x >= 50.0 - 1e-6);
        assert!(bottom_right.x <= 750.0 + 1e-6);
        let center = t.apply(bbox.center());
        assert!((center.x - 400.0).abs() < 1e-6);
        assert!((center.y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_to_fit_empty_graph_resets() {
        let mut view = view();
        view.set_transform(ViewTransform::new(10.0, 10.0, 3.0));
        view.zoom_to_fit(50.0);
        assert_eq!(view.transform(), ViewTransform::IDENTITY);
    }

    #[test]
    fn test_direct_edge_operations() {
        let mut view = view();
        view.set_graph(two_nodes()).unwrap();
        let id = view.add_edge(Edge::new("b", "a", "inhibits")).unwrap();
        assert_eq!(view.edge_count(), 2);
        let old = view.update_edge(id, Edge::new("b", "a", "activates")).unwrap();
        assert_eq!(old.label, "inhibits");
        assert_eq!(view.get_edge(id).unwrap().label, "activates");
        let removed = view.remove_edge(id).unwrap();
        assert_eq!(removed.label, "activates");
        assert!(view.get_edge(id).is_none());

        let edges = view.remove_node("a").unwrap();
        assert_eq!(edges.len(), 1);
        assert!(view.expect_node("a").is_err());
    }
}
