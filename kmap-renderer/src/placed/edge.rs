use super::{DrawParams, PlacedObject};
use crate::backend::DrawContext;
use crate::geometry::{line_point_intersection_distance, segment_distance_unsq, BoundingBox, Point};
use crate::line::Line;
use crate::line_head::LineHead;
use crate::text::TextElement;

/// Distance from the line, in graph units, that still counts as a hit.
pub const DEFAULT_EDGE_HIT_TOLERANCE: f64 = 2.0;

/// A straight edge with optional heads and a label at its midpoint.
///
/// `source` and `target` are already resolved to the node borders. The
/// line is drawn between the heads' stop points so it does not show
/// through them. The label is drawn in a second pass, above every line.
#[derive(Debug)]
pub struct LineEdge {
    source: Point,
    target: Point,
    text_box: Option<TextElement>,
    source_head: Option<Box<dyn LineHead>>,
    target_head: Option<Box<dyn LineHead>>,
    stroke: Option<Line>,
    force_high_detail: bool,
    hit_tolerance: f64,
    label_center: Point,
    label_box: Option<BoundingBox>,
    bbox: BoundingBox,
}

impl LineEdge {
    /// An unstyled edge from `source` to `target`.
    #[must_use]
    pub fn new(source: Point, target: Point) -> Self {
        let mut edge = Self {
            source,
            target,
            text_box: None,
            source_head: None,
            target_head: None,
            stroke: None,
            force_high_detail: false,
            hit_tolerance: DEFAULT_EDGE_HIT_TOLERANCE,
            label_center: Point::new(
                (source.x + target.x) / 2.0,
                (source.y + target.y) / 2.0,
            ),
            label_box: None,
            bbox: BoundingBox::from_corners(source, target),
        };
        edge.update_bounds();
        edge
    }

    /// Draw a label at the midpoint.
    #[must_use]
    pub fn with_label(mut self, text_box: Option<TextElement>) -> Self {
        self.text_box = text_box;
        self.update_bounds();
        self
    }

    /// Heads at the source and target ends.
    #[must_use]
    pub fn with_heads(
        mut self,
        source_head: Option<Box<dyn LineHead>>,
        target_head: Option<Box<dyn LineHead>>,
    ) -> Self {
        self.source_head = source_head;
        self.target_head = target_head;
        self
    }

    /// The line stroke; `None` draws only heads and label.
    #[must_use]
    pub fn with_stroke(mut self, stroke: Option<Line>) -> Self {
        self.stroke = stroke;
        self
    }

    /// Keep the label visible at any zoom.
    #[must_use]
    pub fn with_force_high_detail(mut self, force: bool) -> Self {
        self.force_high_detail = force;
        self
    }

    /// Set how far from the line a point still hits it.
    #[must_use]
    pub fn with_hit_tolerance(mut self, tolerance: f64) -> Self {
        self.hit_tolerance = tolerance;
        self
    }

    /// Resolved start point.
    #[must_use]
    pub fn source(&self) -> Point {
        self.source
    }

    /// Resolved end point.
    #[must_use]
    pub fn target(&self) -> Point {
        self.target
    }

    /// The label, if any.
    #[must_use]
    pub fn text_box(&self) -> Option<&TextElement> {
        self.text_box.as_ref()
    }

    /// The line stroke, if any.
    #[must_use]
    pub fn stroke(&self) -> Option<&Line> {
        self.stroke.as_ref()
    }

    /// Whether a head is drawn at the source end.
    #[must_use]
    pub fn has_source_head(&self) -> bool {
        self.source_head.is_some()
    }

    /// Whether a head is drawn at the target end.
    #[must_use]
    pub fn has_target_head(&self) -> bool {
        self.target_head.is_some()
    }

    /// Squared distance from the edge; zero inside the label.
    #[must_use]
    pub fn point_distance_unsq(&self, x: f64, y: f64) -> f64 {
        if self.is_point_on_label(x, y) {
            0.0
        } else {
            segment_distance_unsq(x, y, self.source, self.target)
        }
    }

    /// Draw the label. Call after every edge's [`PlacedObject::draw`].
    pub fn draw_layer2(&self, ctx: &mut dyn DrawContext, params: &DrawParams) {
        if let Some(text_box) = &self.text_box {
            if params.detail(self.force_high_detail).is_full() {
                text_box.draw_centered_at(ctx, self.label_center.x, self.label_center.y);
            }
        }
    }

    fn is_point_on_label(&self, x: f64, y: f64) -> bool {
        self.label_box.is_some_and(|b| b.contains(x, y))
    }

    fn update_bounds(&mut self) {
        self.label_box = self.text_box.as_ref().map(|t| {
            BoundingBox::from_center(
                self.label_center.x,
                self.label_center.y,
                t.actual_width(),
                t.actual_height(),
            )
        });
        let line_box = BoundingBox::from_corners(self.source, self.target);
        self.bbox = match &self.label_box {
            Some(label) => line_box.union(label),
            None => line_box,
        };
    }
}

impl PlacedObject for LineEdge {
    fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    fn is_point_intersecting(&self, x: f64, y: f64) -> bool {
        self.is_point_on_label(x, y)
            || line_point_intersection_distance(x, y, self.source, self.target)
                <= self.hit_tolerance
    }

    fn draw(&self, ctx: &mut dyn DrawContext, _params: &DrawParams) {
        let mut line_start = self.source;
        let mut line_end = self.target;

        if let Some(head) = &self.source_head {
            ctx.save();
            line_start = head.draw(ctx, self.target, self.source);
            ctx.restore();
        }
        if let Some(head) = &self.target_head {
            ctx.save();
            line_end = head.draw(ctx, self.source, self.target);
            ctx.restore();
        }

        if let Some(stroke) = &self.stroke {
            stroke.draw(ctx, line_start, line_end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawCommand, Font, MonospaceMeasurer, RecordingContext};
    use crate::line_head::{Arrowhead, HeadPaint};
    use crate::transform::ViewTransform;

    fn label(text: &str) -> TextElement {
        TextElement::builder(text, Font::new(10.0, "sans-serif")).layout(&MonospaceMeasurer::default())
    }

    fn horizontal() -> LineEdge {
        LineEdge::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0))
            .with_stroke(Some(Line::solid(1.0, "#2B7CE9")))
    }

    #[test]
    fn test_hit_within_tolerance() {
        let edge = horizontal();
        assert!(edge.is_point_intersecting(50.0, 1.5));
        assert!(!edge.is_point_intersecting(50.0, 3.0));
        assert!(!edge.is_point_intersecting(120.0, 0.0));
        assert!(edge.with_hit_tolerance(5.0).is_point_intersecting(50.0, 3.0));
    }

    #[test]
    fn test_vertical_and_reversed_edges_hit() {
        let vertical = LineEdge::new(Point::new(10.0, 100.0), Point::new(10.0, 0.0));
        assert!(vertical.is_point_intersecting(11.0, 50.0));
        let diagonal = LineEdge::new(Point::new(100.0, 0.0), Point::new(0.0, 100.0));
        assert!(diagonal.is_point_intersecting(50.0, 50.0));
        assert!(!diagonal.is_point_intersecting(10.0, 10.0));
    }

    #[test]
    fn test_label_extends_bbox_and_hits() {
        let edge = horizontal().with_label(Some(label("binds")));
        let bbox = edge.bounding_box();
        // "binds" is 30px wide, 10px tall.
        assert!(bbox.min_y < -4.0);
        assert!(edge.is_point_intersecting(64.0, 4.0));
        assert!(edge.point_distance_unsq(64.0, 4.0).abs() < f64::EPSILON);
        assert!((horizontal().point_distance_unsq(64.0, 4.0) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_stops_at_head() {
        let edge = horizontal().with_heads(
            None,
            Some(Box::new(Arrowhead::new(16.0, HeadPaint::filled("#2B7CE9")))),
        );
        let mut ctx = RecordingContext::new();
        edge.draw(&mut ctx, &DrawParams::default());
        assert!(ctx.commands().contains(&DrawCommand::MoveTo { x: 100.0, y: 0.0 }));
        assert!(ctx.commands().contains(&DrawCommand::LineTo { x: 84.0, y: 0.0 }));
    }

    #[test]
    fn test_label_is_second_layer_and_zoom_gated() {
        let edge = horizontal().with_label(Some(label("binds")));
        let mut ctx = RecordingContext::new();
        edge.draw(&mut ctx, &DrawParams::default());
        assert_eq!(ctx.filled_texts().count(), 0);

        edge.draw_layer2(&mut ctx, &DrawParams::default());
        assert_eq!(ctx.filled_texts().count(), 1);

        let mut ctx = RecordingContext::new();
        edge.draw_layer2(&mut ctx, &DrawParams::new(ViewTransform::new(0.0, 0.0, 0.1)));
        assert_eq!(ctx.filled_texts().count(), 0);
    }

    #[test]
    fn test_degenerate_edge_is_finite() {
        let p = Point::new(5.0, 5.0);
        let edge = LineEdge::new(p, p);
        assert!(edge.point_distance_unsq(8.0, 9.0).is_finite());
        assert!(!edge.is_point_intersecting(8.0, 9.0));
        let mut ctx = RecordingContext::new();
        edge.with_stroke(Some(Line::solid(1.0, "#000")))
            .draw(&mut ctx, &DrawParams::default());
        assert!(ctx.commands().iter().all(|c| match c {
            DrawCommand::MoveTo { x, y } | DrawCommand::LineTo { x, y } => x.is_finite() && y.is_finite(),
            _ => true,
        }));
    }
}
