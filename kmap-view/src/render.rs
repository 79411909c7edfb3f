//! The render loop.
//!
//! Rendering is requested, not continuous: mutations call
//! [`CanvasGraphView::request_render`] and the host calls
//! [`CanvasGraphView::animation_frame`] once per display frame. A render
//! is a queue of steps drawn in this order:
//!
//! ```text
//!   background ─► selection backdrops ─► edges ─► edge labels ─► nodes
//!        ─► highlights ─► search highlights ─► search focus ─► rubber band
//! ```
//!
//! Steps run until the frame budget is spent; the rest of the queue
//! resumes on the next frame unless a new render request restarts it.

use std::collections::VecDeque;
use std::ops::Range;
use std::time::Duration;

use kmap_core::GraphEntity;
use kmap_renderer::style::backdrop::{
    draw_highlight_box, draw_selection_backdrop, edge_highlight_backdrop, edge_selection_backdrop,
};
use kmap_renderer::{BoundingBox, DrawContext, DrawParams, PlacedObject};

use crate::view::CanvasGraphView;

/// Entities drawn per render step.
const BATCH_SIZE: usize = 256;

const RUBBER_BAND_FILL: &str = "rgba(43, 124, 233, 0.1)";
const RUBBER_BAND_STROKE: &str = "#2B7CE9";

/// Source of frame timestamps.
pub trait FrameClock {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

impl<F: Fn() -> Duration> FrameClock for F {
    fn now(&self) -> Duration {
        self()
    }
}

/// Render loop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Renders begun.
    pub started: u64,
    /// Renders drawn to the end.
    pub completed: u64,
    /// Frames that ran out of budget with steps left.
    pub interrupted: u64,
    /// Steps drawn.
    pub steps: u64,
}

#[derive(Debug, Clone, PartialEq)]
enum RenderStep {
    Background,
    SelectionBackdrops,
    Edges(Range<usize>),
    EdgeLabels(Range<usize>),
    Nodes(Range<usize>),
    Highlights,
    SearchHighlights,
    SearchFocus,
    RubberBand,
}

fn batches(len: usize) -> impl Iterator<Item = Range<usize>> {
    (0..len)
        .step_by(BATCH_SIZE)
        .map(move |start| start..(start + BATCH_SIZE).min(len))
}

fn build_queue(node_count: usize, edge_count: usize) -> VecDeque<RenderStep> {
    let mut queue = VecDeque::new();
    queue.push_back(RenderStep::Background);
    queue.push_back(RenderStep::SelectionBackdrops);
    queue.extend(batches(edge_count).map(RenderStep::Edges));
    queue.extend(batches(edge_count).map(RenderStep::EdgeLabels));
    queue.extend(batches(node_count).map(RenderStep::Nodes));
    queue.push_back(RenderStep::Highlights);
    queue.push_back(RenderStep::SearchHighlights);
    queue.push_back(RenderStep::SearchFocus);
    queue.push_back(RenderStep::RubberBand);
    queue
}

#[derive(Debug, Default)]
pub(crate) struct RenderState {
    requested: bool,
    queue: VecDeque<RenderStep>,
    last_start: Option<Duration>,
    stats: RenderStats,
}

impl CanvasGraphView {
    /// Ask for a redraw on the next animation frame.
    pub fn request_render(&mut self) {
        if !self.render.requested {
            self.render.requested = true;
            self.events.push(kmap_core::ViewEvent::RenderRequested);
        }
    }

    /// Whether a render is requested or unfinished.
    #[must_use]
    pub fn needs_render(&self) -> bool {
        self.render.requested || !self.render.queue.is_empty()
    }

    /// Render loop counters.
    #[must_use]
    pub fn render_stats(&self) -> RenderStats {
        self.render.stats
    }

    /// Run one animation frame.
    ///
    /// Pumps image loads, then starts a requested render (at most once per
    /// minimum interval) or resumes an unfinished one. Returns whether
    /// anything was drawn.
    pub fn animation_frame(&mut self, ctx: &mut dyn DrawContext, clock: &dyn FrameClock) -> bool {
        let start = clock.now();
        self.pump_images(start);

        if self.render.requested {
            let too_soon = self
                .render
                .last_start
                .is_some_and(|last| start.saturating_sub(last) < self.config.render_min_interval);
            if too_soon {
                return false;
            }
            self.begin_render();
            self.render.last_start = Some(start);
        }
        if self.render.queue.is_empty() {
            return false;
        }

        let params = self.draw_params();
        while let Some(step) = self.render.queue.pop_front() {
            self.draw_step(ctx, &step, &params);
            self.render.stats.steps += 1;
            if self.render.queue.is_empty() {
                self.render.stats.completed += 1;
                tracing::trace!("Render completed in {:?}", clock.now().saturating_sub(start));
                break;
            }
            if clock.now().saturating_sub(start) >= self.config.frame_budget {
                self.render.stats.interrupted += 1;
                tracing::trace!("Frame budget spent, {} steps left", self.render.queue.len());
                break;
            }
        }
        true
    }

    /// Draw everything now, ignoring the frame budget.
    pub fn render_now(&mut self, ctx: &mut dyn DrawContext) {
        self.begin_render();
        let params = self.draw_params();
        while let Some(step) = self.render.queue.pop_front() {
            self.draw_step(ctx, &step, &params);
            self.render.stats.steps += 1;
        }
        self.render.stats.completed += 1;
    }

    /// Wait for every pending image load.
    ///
    /// Images that arrive request a render. Returns the number of finished
    /// loads.
    pub async fn settle_images(&mut self) -> usize {
        self.ensure_placed();
        let finished = self.images.settle().await;
        self.take_image_updates();
        finished
    }

    fn begin_render(&mut self) {
        self.render.requested = false;
        self.ensure_placed();
        self.render.queue = build_queue(self.graph.nodes.len(), self.graph.edges.len());
        self.render.stats.started += 1;
    }

    fn pump_images(&mut self, now: Duration) {
        self.images.poll_pending();
        self.take_image_updates();
        self.images.maintenance(now);
    }

    fn take_image_updates(&mut self) {
        let mut updated = 0;
        for placed in self.placed_nodes.values_mut() {
            if let Some(image) = placed.as_image_mut() {
                if image.take_image_update() {
                    updated += 1;
                }
            }
        }
        if updated > 0 {
            tracing::debug!("{} images arrived", updated);
            self.request_render();
        }
    }

    fn draw_params(&self) -> DrawParams {
        DrawParams::new(self.transform).with_detail_threshold(self.config.detail_threshold)
    }

    fn draw_step(&self, ctx: &mut dyn DrawContext, step: &RenderStep, params: &DrawParams) {
        if *step == RenderStep::Background {
            self.draw_background(ctx);
            return;
        }

        let t = self.transform;
        ctx.save();
        ctx.translate(t.x, t.y);
        ctx.scale(t.k, t.k);
        match step {
            RenderStep::Background => {}
            RenderStep::SelectionBackdrops => {
                for entity in self.selection.get() {
                    self.draw_selection(ctx, entity, params);
                }
            }
            RenderStep::Edges(range) => {
                for id in self.edge_ids.get(range.clone()).unwrap_or_default() {
                    if let Some(edge) = self.placed_edges.get(id) {
                        edge.draw(ctx, params);
                    }
                }
            }
            RenderStep::EdgeLabels(range) => {
                for id in self.edge_ids.get(range.clone()).unwrap_or_default() {
                    if let Some(edge) = self.placed_edges.get(id) {
                        edge.draw_layer2(ctx, params);
                    }
                }
            }
            RenderStep::Nodes(range) => {
                for node in self.graph.nodes.get(range.clone()).unwrap_or_default() {
                    if let Some(placed) = self.placed_nodes.get(&node.hash) {
                        placed.draw(ctx, params);
                    }
                }
            }
            RenderStep::Highlights => {
                for entity in self.highlighting.get() {
                    self.draw_highlight(ctx, entity, false, params);
                }
            }
            RenderStep::SearchHighlights => {
                for entity in self.search_highlighting.get() {
                    if self.search_focus.as_ref() != Some(entity) {
                        self.draw_highlight(ctx, entity, false, params);
                    }
                }
            }
            RenderStep::SearchFocus => {
                if let Some(entity) = &self.search_focus {
                    self.draw_highlight(ctx, entity, true, params);
                }
            }
            RenderStep::RubberBand => {
                if let Some(area) = self.pointer.rubber_band() {
                    draw_rubber_band(ctx, &area, params);
                }
            }
        }
        ctx.restore();
    }

    fn draw_background(&self, ctx: &mut dyn DrawContext) {
        let (width, height) = self.viewport;
        ctx.save();
        match &self.config.background {
            Some(color) => {
                ctx.set_fill_style(color);
                ctx.fill_rect(0.0, 0.0, width, height);
            }
            None => ctx.clear_rect(0.0, 0.0, width, height),
        }
        ctx.restore();
    }

    fn edge_line_width_scale(&self, index: usize) -> f64 {
        self.graph
            .edges
            .get(index)
            .and_then(|e| e.style.as_ref())
            .and_then(|s| s.line_width_scale)
            .unwrap_or(1.0)
    }

    fn draw_selection(&self, ctx: &mut dyn DrawContext, entity: &GraphEntity, params: &DrawParams) {
        match entity {
            GraphEntity::Node(hash) => {
                if let Some(placed) = self.placed_nodes.get(hash) {
                    draw_selection_backdrop(ctx, &placed.bounding_box());
                }
            }
            GraphEntity::Edge(id) => {
                if let (Some(placed), Some(index)) = (self.placed_edges.get(id), self.edge_index(*id)) {
                    edge_selection_backdrop(placed, self.edge_line_width_scale(index))
                        .draw(ctx, params);
                }
            }
        }
    }

    fn draw_highlight(
        &self,
        ctx: &mut dyn DrawContext,
        entity: &GraphEntity,
        strong: bool,
        params: &DrawParams,
    ) {
        match entity {
            GraphEntity::Node(hash) => {
                if let Some(placed) = self.placed_nodes.get(hash) {
                    draw_highlight_box(ctx, &placed.bounding_box(), strong);
                }
            }
            GraphEntity::Edge(id) => {
                if let (Some(placed), Some(index)) = (self.placed_edges.get(id), self.edge_index(*id)) {
                    edge_highlight_backdrop(placed, self.edge_line_width_scale(index), strong)
                        .draw(ctx, params);
                }
            }
        }
    }
}

fn draw_rubber_band(ctx: &mut dyn DrawContext, area: &BoundingBox, params: &DrawParams) {
    let scale = params.zoom_reset_scale();
    ctx.save();
    ctx.begin_path();
    ctx.rect(area.min_x, area.min_y, area.width(), area.height());
    ctx.set_fill_style(RUBBER_BAND_FILL);
    ctx.fill();
    ctx.set_line_width(scale);
    ctx.set_line_dash(&[4.0 * scale, 4.0 * scale]);
    ctx.set_stroke_style(RUBBER_BAND_STROKE);
    ctx.stroke();
    ctx.restore();
}
