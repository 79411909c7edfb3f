use super::LineHead;
use crate::backend::DrawContext;
use crate::geometry::Point;

/// Several heads stacked along the line.
///
/// Children are listed from the line body towards the endpoint. The last
/// child touches the endpoint; each earlier child ends where the next one
/// stops.
#[derive(Debug, Default)]
pub struct CompoundLineHead {
    children: Vec<Box<dyn LineHead>>,
}

impl CompoundLineHead {
    /// Stack `children`, body first.
    #[must_use]
    pub fn new(children: Vec<Box<dyn LineHead>>) -> Self {
        Self { children }
    }

    /// Number of stacked heads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether there are no heads.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl LineHead for CompoundLineHead {
    fn draw(&self, ctx: &mut dyn DrawContext, start: Point, end: Point) -> Point {
        self.children
            .iter()
            .rev()
            .fold(end, |end, head| head.draw(ctx, start, end))
    }

    fn stop_point(&self, start: Point, end: Point) -> Point {
        self.children
            .iter()
            .rev()
            .fold(end, |end, head| head.stop_point(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawCommand, RecordingContext};
    use crate::line_head::{Arrowhead, EmptyLineHead, HeadPaint};

    fn spaced_arrow() -> CompoundLineHead {
        CompoundLineHead::new(vec![
            Box::new(EmptyLineHead::new(10.0)),
            Box::new(Arrowhead::new(16.0, HeadPaint::default())),
        ])
    }

    #[test]
    fn test_arrow_touches_endpoint_and_spacer_follows() {
        let mut ctx = RecordingContext::new();
        let stop = spaced_arrow().draw(&mut ctx, Point::new(0.0, 0.0), Point::new(100.0, 0.0));

        let first_move = ctx
            .commands()
            .iter()
            .find(|c| matches!(c, DrawCommand::MoveTo { .. }));
        assert_eq!(first_move, Some(&DrawCommand::MoveTo { x: 100.0, y: 0.0 }));
        assert!((stop.x - 74.0).abs() < 1e-9);
        assert!(stop.y.abs() < 1e-9);
    }

    #[test]
    fn test_stop_point_matches_draw() {
        let head = spaced_arrow();
        let start = Point::new(0.0, 0.0);
        let end = Point::new(30.0, 40.0);
        let mut ctx = RecordingContext::new();
        let drawn = head.draw(&mut ctx, start, end);
        let computed = head.stop_point(start, end);
        assert!((drawn.x - computed.x).abs() < 1e-9);
        assert!((drawn.y - computed.y).abs() < 1e-9);
        // 26px back along a 3-4-5 direction
        assert!((computed.x - (30.0 - 26.0 * 0.6)).abs() < 1e-9);
        assert!((computed.y - (40.0 - 26.0 * 0.8)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_compound_is_identity() {
        let head = CompoundLineHead::default();
        assert!(head.is_empty());
        let end = Point::new(5.0, 5.0);
        assert_eq!(head.stop_point(Point::new(0.0, 0.0), end), end);
    }
}
