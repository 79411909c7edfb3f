//! Line terminators.
//!
//! A head is described in a local frame where the line points along +x and
//! ends at the origin. Drawing maps that frame onto the real segment and
//! returns the point where the line's own stroke should stop, so the stroke
//! does not poke through the head.
//!
//! ```text
//!        body                     endpoint
//!   ───────────────────[stop]◄──head──┤ (0, 0)
//! ```

mod compound;
mod shapes;

use std::fmt;

use crate::backend::{DrawContext, LineCap, LineJoin};
use crate::geometry::{transform_control_point, transform_control_points, Point};

pub use compound::CompoundLineHead;
pub use shapes::{Arrowhead, CircleHead, CrossAxisLineHead, DiamondHead, RectangleHead};

/// Draws a terminator at the `end` of the segment `start -> end`.
pub trait LineHead: fmt::Debug {
    /// Draw the head and return where the line should stop.
    fn draw(&self, ctx: &mut dyn DrawContext, start: Point, end: Point) -> Point;

    /// Where the line should stop, without drawing.
    fn stop_point(&self, start: Point, end: Point) -> Point;
}

/// Fill and stroke settings shared by shaped heads.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadPaint {
    /// Fill color, if filled.
    pub fill: Option<String>,
    /// Stroke color, if outlined.
    pub stroke: Option<String>,
    /// Outline width.
    pub line_width: f64,
}

impl Default for HeadPaint {
    fn default() -> Self {
        Self {
            fill: Some("#000".to_string()),
            stroke: None,
            line_width: 1.0,
        }
    }
}

impl HeadPaint {
    /// Filled with `color`, no outline.
    #[must_use]
    pub fn filled(color: impl Into<String>) -> Self {
        Self {
            fill: Some(color.into()),
            ..Self::default()
        }
    }

    /// Filled and outlined with `color`.
    #[must_use]
    pub fn filled_and_stroked(color: impl Into<String>) -> Self {
        let color = color.into();
        Self {
            fill: Some(color.clone()),
            stroke: Some(color),
            ..Self::default()
        }
    }

    /// Set the outline width.
    #[must_use]
    pub fn with_line_width(mut self, line_width: f64) -> Self {
        self.line_width = line_width;
        self
    }

    /// Outline width, or zero when there is no outline.
    #[must_use]
    pub fn effective_line_width(&self) -> f64 {
        if self.stroke.is_some() {
            self.line_width
        } else {
            0.0
        }
    }

    /// Fill and stroke the path built by `path`.
    pub(crate) fn paint(&self, ctx: &mut dyn DrawContext, path: impl FnOnce(&mut dyn DrawContext)) {
        ctx.begin_path();
        path(&mut *ctx);

        ctx.set_line_width(self.line_width);
        if let Some(fill) = &self.fill {
            ctx.set_fill_style(fill);
        }
        if let Some(stroke) = &self.stroke {
            ctx.set_stroke_style(stroke);
        }
        if self.fill.is_some() {
            ctx.fill();
        }
        if self.stroke.is_some() {
            ctx.stroke();
        }
    }
}

/// Trace a polygon given in the head's local frame.
pub(crate) fn trace_polygon(ctx: &mut dyn DrawContext, start: Point, end: Point, points: &[Point]) {
    ctx.set_line_join(LineJoin::Round);
    ctx.set_line_cap(LineCap::Round);
    for (i, p) in transform_control_points(start, end, points).enumerate() {
        if i == 0 {
            ctx.move_to(p.x, p.y);
        } else {
            ctx.line_to(p.x, p.y);
        }
    }
}

/// Pure spacing: draws nothing and moves the stop point back by `length`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmptyLineHead {
    length: f64,
}

impl EmptyLineHead {
    /// A gap of `length` pixels.
    #[must_use]
    pub fn new(length: f64) -> Self {
        Self { length }
    }
}

impl LineHead for EmptyLineHead {
    fn draw(&self, _ctx: &mut dyn DrawContext, start: Point, end: Point) -> Point {
        self.stop_point(start, end)
    }

    fn stop_point(&self, start: Point, end: Point) -> Point {
        transform_control_point(start, end, Point::new(-self.length, 0.0))
    }
}
