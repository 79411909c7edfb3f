//! Stroke styles for edges and node borders.

use crate::backend::{DrawContext, LineCap, LineJoin};
use crate::geometry::Point;

/// A stroke: width, color and an optional dash pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    width: f64,
    color: String,
    dash: Vec<f64>,
    cap: LineCap,
}

impl Line {
    /// A solid stroke.
    #[must_use]
    pub fn solid(width: f64, color: impl Into<String>) -> Self {
        Self {
            width,
            color: color.into(),
            dash: Vec::new(),
            cap: LineCap::Butt,
        }
    }

    /// A dashed stroke with alternating dash and gap lengths.
    #[must_use]
    pub fn dashed(width: f64, color: impl Into<String>, pattern: impl Into<Vec<f64>>) -> Self {
        Self {
            width,
            color: color.into(),
            dash: pattern.into(),
            cap: LineCap::Butt,
        }
    }

    /// Set the cap drawn at both ends of [`Self::draw`].
    #[must_use]
    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    /// Stroke width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Stroke color.
    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Dash pattern; empty when solid.
    #[must_use]
    pub fn dash(&self) -> &[f64] {
        &self.dash
    }

    /// Whether the stroke is dashed.
    #[must_use]
    pub fn is_dashed(&self) -> bool {
        !self.dash.is_empty()
    }

    /// Configure the context's stroke width, color and dash pattern.
    pub fn set_context(&self, ctx: &mut dyn DrawContext) {
        ctx.set_line_width(self.width);
        ctx.set_stroke_style(&self.color);
        ctx.set_line_dash(&self.dash);
    }

    /// Stroke a straight segment.
    pub fn draw(&self, ctx: &mut dyn DrawContext, from: Point, to: Point) {
        ctx.save();
        ctx.begin_path();
        ctx.move_to(from.x, from.y);
        ctx.line_to(to.x, to.y);
        ctx.set_line_join(LineJoin::Miter);
        ctx.set_line_cap(self.cap);
        self.set_context(ctx);
        ctx.stroke();
        ctx.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawCommand, RecordingContext};

    #[test]
    fn test_solid_clears_dash() {
        let mut ctx = RecordingContext::new();
        Line::solid(2.0, "#000").set_context(&mut ctx);
        assert!(ctx
            .commands()
            .contains(&DrawCommand::LineDash { segments: vec![] }));
        assert!(ctx.commands().contains(&DrawCommand::LineWidth { width: 2.0 }));
    }

    #[test]
    fn test_dashed() {
        let line = Line::dashed(1.0, "#2B7CE9", [10.0, 10.0]);
        assert!(line.is_dashed());
        assert_eq!(line.dash(), &[10.0, 10.0]);
    }

    #[test]
    fn test_draw_segment() {
        let mut ctx = RecordingContext::new();
        Line::solid(1.0, "red").draw(&mut ctx, Point::new(0.0, 0.0), Point::new(10.0, 5.0));
        let commands = ctx.commands();
        assert_eq!(commands.first(), Some(&DrawCommand::Save));
        assert!(commands.contains(&DrawCommand::LineTo { x: 10.0, y: 5.0 }));
        assert!(commands.contains(&DrawCommand::Stroke));
        assert_eq!(commands.last(), Some(&DrawCommand::Restore));
        assert!(commands.contains(&DrawCommand::LineCap { cap: LineCap::Butt }));
    }

    #[test]
    fn test_square_cap() {
        let mut ctx = RecordingContext::new();
        Line::solid(21.0, "rgba(0, 0, 0, 0.075)")
            .with_cap(LineCap::Square)
            .draw(&mut ctx, Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!(ctx
            .commands()
            .contains(&DrawCommand::LineCap { cap: LineCap::Square }));
    }
}
