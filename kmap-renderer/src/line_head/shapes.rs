//! Shaped terminators.

use std::f64::consts::PI;

use super::{trace_polygon, HeadPaint, LineHead};
use crate::backend::DrawContext;
use crate::geometry::{transform_control_point, Point};

/// A triangular arrow with its tip on the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrowhead {
    width: f64,
    length: f64,
    inset: f64,
    paint: HeadPaint,
}

impl Arrowhead {
    /// An arrow `width` wide and as long as it is wide.
    #[must_use]
    pub fn new(width: f64, paint: HeadPaint) -> Self {
        Self {
            width,
            length: width,
            inset: 0.0,
            paint,
        }
    }

    /// Set the length from tip to back.
    #[must_use]
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    /// Pull the middle of the back towards the tip, for a swept arrow.
    #[must_use]
    pub fn with_inset(mut self, inset: f64) -> Self {
        self.inset = inset;
        self
    }

    fn control_points(&self) -> [Point; 4] {
        [
            Point::new(0.0, 0.0),
            Point::new(-self.length, -self.width / 2.0),
            Point::new(-self.length + self.inset, 0.0),
            Point::new(-self.length, self.width / 2.0),
        ]
    }
}

impl LineHead for Arrowhead {
    fn draw(&self, ctx: &mut dyn DrawContext, start: Point, end: Point) -> Point {
        let points = self.control_points();
        self.paint.paint(ctx, |ctx| {
            trace_polygon(ctx, start, end, &points);
            ctx.close_path();
        });
        self.stop_point(start, end)
    }

    fn stop_point(&self, start: Point, end: Point) -> Point {
        transform_control_point(start, end, Point::new(-self.length + self.inset, 0.0))
    }
}

/// A circle touching the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleHead {
    diameter: f64,
    paint: HeadPaint,
}

impl CircleHead {
    /// A circle of the given diameter.
    #[must_use]
    pub fn new(diameter: f64, paint: HeadPaint) -> Self {
        Self { diameter, paint }
    }
}

impl LineHead for CircleHead {
    fn draw(&self, ctx: &mut dyn DrawContext, start: Point, end: Point) -> Point {
        let center = transform_control_point(start, end, Point::new(-self.diameter / 2.0, 0.0));
        let radius = self.diameter / 2.0;
        self.paint.paint(ctx, |ctx| {
            ctx.arc(center.x, center.y, radius, 0.0, 2.0 * PI);
        });
        self.stop_point(start, end)
    }

    fn stop_point(&self, start: Point, end: Point) -> Point {
        transform_control_point(start, end, Point::new(-self.diameter, 0.0))
    }
}

/// A rhombus with one corner on the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DiamondHead {
    width: f64,
    length: f64,
    paint: HeadPaint,
}

impl DiamondHead {
    /// A diamond `width` across and `length` along the line.
    #[must_use]
    pub fn new(width: f64, length: f64, paint: HeadPaint) -> Self {
        Self {
            width,
            length,
            paint,
        }
    }
}

impl LineHead for DiamondHead {
    fn draw(&self, ctx: &mut dyn DrawContext, start: Point, end: Point) -> Point {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(-self.length / 2.0, -self.width / 2.0),
            Point::new(-self.length, 0.0),
            Point::new(-self.length / 2.0, self.width / 2.0),
        ];
        self.paint.paint(ctx, |ctx| {
            trace_polygon(ctx, start, end, &points);
            ctx.close_path();
        });
        self.stop_point(start, end)
    }

    fn stop_point(&self, start: Point, end: Point) -> Point {
        transform_control_point(start, end, Point::new(-self.length, 0.0))
    }
}

/// A rectangle with one side on the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RectangleHead {
    width: f64,
    length: f64,
    paint: HeadPaint,
}

impl RectangleHead {
    /// A rectangle `width` across and `length` along the line.
    #[must_use]
    pub fn new(width: f64, length: f64, paint: HeadPaint) -> Self {
        Self {
            width,
            length,
            paint,
        }
    }
}

impl LineHead for RectangleHead {
    fn draw(&self, ctx: &mut dyn DrawContext, start: Point, end: Point) -> Point {
        let points = [
            Point::new(0.0, -self.width / 2.0),
            Point::new(-self.length, -self.width / 2.0),
            Point::new(-self.length, self.width / 2.0),
            Point::new(0.0, self.width / 2.0),
        ];
        self.paint.paint(ctx, |ctx| {
            trace_polygon(ctx, start, end, &points);
            ctx.close_path();
        });
        self.stop_point(start, end)
    }

    fn stop_point(&self, start: Point, end: Point) -> Point {
        transform_control_point(start, end, Point::new(-self.length, 0.0))
    }
}

/// A bar across the line at the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossAxisLineHead {
    length: f64,
    paint: HeadPaint,
}

impl CrossAxisLineHead {
    /// A bar `length` pixels long.
    #[must_use]
    pub fn new(length: f64, paint: HeadPaint) -> Self {
        Self { length, paint }
    }
}

impl LineHead for CrossAxisLineHead {
    fn draw(&self, ctx: &mut dyn DrawContext, start: Point, end: Point) -> Point {
        let points = [
            Point::new(0.0, -self.length / 2.0),
            Point::new(0.0, self.length / 2.0),
        ];
        self.paint.paint(ctx, |ctx| trace_polygon(ctx, start, end, &points));
        self.stop_point(start, end)
    }

    fn stop_point(&self, start: Point, end: Point) -> Point {
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawCommand, RecordingContext};

    fn approx_point(p: Point, x: f64, y: f64) -> bool {
        (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9
    }

    const START: Point = Point::new(0.0, 0.0);
    const END: Point = Point::new(100.0, 0.0);

    #[test]
    fn test_arrowhead_geometry() {
        let mut ctx = RecordingContext::new();
        let arrow = Arrowhead::new(16.0, HeadPaint::filled("#000"));
        let stop = arrow.draw(&mut ctx, START, END);
        assert!(approx_point(stop, 84.0, 0.0));
        assert_eq!(
            ctx.commands()
                .iter()
                .find(|c| matches!(c, DrawCommand::MoveTo { .. })),
            Some(&DrawCommand::MoveTo { x: 100.0, y: 0.0 })
        );
        assert!(ctx.commands().contains(&DrawCommand::Fill));
        assert!(!ctx.commands().contains(&DrawCommand::Stroke));
    }

    #[test]
    fn test_arrowhead_inset() {
        let arrow = Arrowhead::new(16.0, HeadPaint::default())
            .with_length(20.0)
            .with_inset(4.0);
        assert!(approx_point(arrow.stop_point(START, END), 84.0, 0.0));
    }

    #[test]
    fn test_circle_head() {
        let mut ctx = RecordingContext::new();
        let stop = CircleHead::new(10.0, HeadPaint::filled("red")).draw(&mut ctx, START, END);
        assert!(approx_point(stop, 90.0, 0.0));
        assert!(ctx.commands().iter().any(|c| matches!(
            c,
            DrawCommand::Arc { x, radius, .. } if (*x - 95.0).abs() < 1e-9 && (*radius - 5.0).abs() < 1e-9
        )));
    }

    #[test]
    fn test_diamond_and_rectangle_stop() {
        let diamond = DiamondHead::new(8.0, 12.0, HeadPaint::default());
        assert!(approx_point(diamond.stop_point(START, END), 88.0, 0.0));
        let rect = RectangleHead::new(8.0, 12.0, HeadPaint::default());
        assert!(approx_point(rect.stop_point(START, END), 88.0, 0.0));
    }

    #[test]
    fn test_cross_axis_is_perpendicular() {
        let mut ctx = RecordingContext::new();
        let head = CrossAxisLineHead::new(16.0, HeadPaint::filled_and_stroked("#000"));
        let stop = head.draw(&mut ctx, START, END);
        assert_eq!(stop, END);
        assert!(ctx.commands().contains(&DrawCommand::Stroke));
        let ends: Vec<_> = ctx
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::MoveTo { x, y } | DrawCommand::LineTo { x, y } => Some((*x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(ends.len(), 2);
        assert!((ends[0].0 - 100.0).abs() < 1e-9 && (ends[0].1 + 8.0).abs() < 1e-9);
        assert!((ends[1].0 - 100.0).abs() < 1e-9 && (ends[1].1 - 8.0).abs() < 1e-9);
    }
}
