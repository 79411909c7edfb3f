//! Selection and highlight decorations drawn behind or around shapes.

use super::palette::{edge_highlight_color, HIGHLIGHT_STROKE, SELECTION_FILL};
use crate::backend::{DrawContext, LineCap};
use crate::geometry::BoundingBox;
use crate::line::Line;
use crate::placed::LineEdge;

/// Margin of node backdrops around the node's bounding box.
pub const BACKDROP_MARGIN: f64 = 10.0;

/// Extra width of edge backdrops beyond the edge's own width.
pub const EDGE_BACKDROP_EXTRA_WIDTH: f64 = 20.0;

const HIGHLIGHT_WIDTH: f64 = 3.0;
const STRONG_HIGHLIGHT_WIDTH: f64 = 5.0;
const WEAK_HIGHLIGHT_ALPHA: f64 = 0.4;

/// Fill a margin around a selected node.
pub fn draw_selection_backdrop(ctx: &mut dyn DrawContext, bbox: &BoundingBox) {
    let area = bbox.expand(BACKDROP_MARGIN);
    ctx.save();
    ctx.begin_path();
    ctx.rect(area.min_x, area.min_y, area.width(), area.height());
    ctx.set_fill_style(SELECTION_FILL);
    ctx.fill();
    ctx.restore();
}

/// Outline a highlighted node.
///
/// Strong highlights mark the focused search result.
pub fn draw_highlight_box(ctx: &mut dyn DrawContext, bbox: &BoundingBox, strong: bool) {
    let area = bbox.expand(BACKDROP_MARGIN);
    ctx.save();
    if !strong {
        ctx.set_global_alpha(WEAK_HIGHLIGHT_ALPHA);
    }
    ctx.begin_path();
    ctx.rect(area.min_x, area.min_y, area.width(), area.height());
    ctx.set_line_dash(&[]);
    ctx.set_line_width(if strong {
        STRONG_HIGHLIGHT_WIDTH
    } else {
        HIGHLIGHT_WIDTH
    });
    ctx.set_stroke_style(HIGHLIGHT_STROKE);
    ctx.stroke();
    ctx.restore();
}

/// A wide band along `edge`, drawn before the edge itself.
#[must_use]
pub fn edge_backdrop(edge: &LineEdge, line_width_scale: f64, color: &str) -> LineEdge {
    LineEdge::new(edge.source(), edge.target())
        .with_stroke(Some(
            Line::solid(line_width_scale + EDGE_BACKDROP_EXTRA_WIDTH, color).with_cap(LineCap::Square),
        ))
        .with_force_high_detail(true)
}

/// Backdrop band of a selected edge.
#[must_use]
pub fn edge_selection_backdrop(edge: &LineEdge, line_width_scale: f64) -> LineEdge {
    edge_backdrop(edge, line_width_scale, SELECTION_FILL)
}

/// Backdrop band of a highlighted edge.
#[must_use]
pub fn edge_highlight_backdrop(edge: &LineEdge, line_width_scale: f64, strong: bool) -> LineEdge {
    edge_backdrop(edge, line_width_scale, edge_highlight_color(strong))
}
