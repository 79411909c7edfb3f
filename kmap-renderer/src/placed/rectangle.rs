use super::{DrawParams, PlacedObject};
use crate::backend::DrawContext;
use crate::geometry::{point_on_rect, BoundingBox, Point};
use crate::line::Line;
use crate::text::TextElement;

/// Space between the content and the border, on each side.
pub const NODE_PADDING: f64 = 5.0;

const FULL_CORNER_RADIUS: f64 = 5.0;
const SIMPLIFIED_CORNER_RADIUS: f64 = 3.0;

/// A rounded box with centered text.
///
/// The box is the content size plus [`NODE_PADDING`] on each side. Below
/// the detail threshold only the box is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RectangleNode {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    padding: f64,
    text_box: TextElement,
    shape_fill_color: Option<String>,
    stroke: Option<Line>,
    force_high_detail: bool,
}

impl RectangleNode {
    /// A node centered on `(x, y)`, sized to fit its text.
    #[must_use]
    pub fn new(x: f64, y: f64, text_box: TextElement) -> Self {
        Self {
            x,
            y,
            width: text_box.actual_width(),
            height: text_box.actual_height(),
            padding: NODE_PADDING,
            text_box,
            shape_fill_color: None,
            stroke: None,
            force_high_detail: false,
        }
    }

    /// Override the content size.
    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Fill the box.
    #[must_use]
    pub fn with_fill(mut self, color: impl Into<String>) -> Self {
        self.shape_fill_color = Some(color.into());
        self
    }

    /// Outline the box; `None` draws no border.
    #[must_use]
    pub fn with_stroke(mut self, stroke: Option<Line>) -> Self {
        self.stroke = stroke;
        self
    }

    /// Keep full detail at any zoom.
    #[must_use]
    pub fn with_force_high_detail(mut self, force: bool) -> Self {
        self.force_high_detail = force;
        self
    }

    /// Center of the node.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Width including padding.
    #[must_use]
    pub fn node_width(&self) -> f64 {
        self.width + self.padding * 2.0
    }

    /// Height including padding.
    #[must_use]
    pub fn node_height(&self) -> f64 {
        self.height + self.padding * 2.0
    }

    /// The text drawn inside.
    #[must_use]
    pub fn text_box(&self) -> &TextElement {
        &self.text_box
    }

    /// Box fill color.
    #[must_use]
    pub fn fill_color(&self) -> Option<&str> {
        self.shape_fill_color.as_deref()
    }

    /// Border stroke.
    #[must_use]
    pub fn stroke(&self) -> Option<&Line> {
        self.stroke.as_ref()
    }

    /// Where an edge coming from `(x, y)` crosses the padded border.
    #[must_use]
    pub fn line_intersection_point(&self, x: f64, y: f64) -> Point {
        point_on_rect(x, y, &self.bounding_box(), true)
    }
}

impl PlacedObject for RectangleNode {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_center(self.x, self.y, self.node_width(), self.node_height())
    }

    fn is_point_intersecting(&self, x: f64, y: f64) -> bool {
        self.bounding_box().contains(x, y)
    }

    fn draw(&self, ctx: &mut dyn DrawContext, params: &DrawParams) {
        let detail = params.detail(self.force_high_detail);
        let bbox = self.bounding_box();
        let radius = if detail.is_full() {
            FULL_CORNER_RADIUS
        } else {
            SIMPLIFIED_CORNER_RADIUS
        };

        ctx.save();
        ctx.begin_path();
        ctx.rounded_rect(bbox.min_x, bbox.min_y, bbox.width(), bbox.height(), radius);
        if let Some(fill) = &self.shape_fill_color {
            ctx.set_fill_style(fill);
            ctx.fill();
        }
        if let Some(stroke) = &self.stroke {
            stroke.set_context(ctx);
            ctx.set_line_width(stroke.width() * params.zoom_reset_scale());
            ctx.stroke();
        }
        ctx.restore();

        if detail.is_full() {
            self.text_box.draw_centered_at(ctx, self.x, self.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawCommand, Font, MonospaceMeasurer, RecordingContext};
    use crate::transform::ViewTransform;

    fn label(text: &str) -> TextElement {
        TextElement::builder(text, Font::new(10.0, "sans-serif")).layout(&MonospaceMeasurer::default())
    }

    fn sized_node() -> RectangleNode {
        RectangleNode::new(100.0, 50.0, label("BRCA1")).with_size(100.0, 40.0)
    }

    #[test]
    fn test_padded_bounding_box() {
        let bbox = sized_node().bounding_box();
        assert!((bbox.min_x - 45.0).abs() < 1e-9);
        assert!((bbox.max_x - 155.0).abs() < 1e-9);
        assert!((bbox.min_y - 25.0).abs() < 1e-9);
        assert!((bbox.max_y - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_containment() {
        let node = sized_node();
        assert!(node.is_point_intersecting(100.0, 50.0));
        assert!(node.is_point_intersecting(100.0 - 50.0 - NODE_PADDING, 50.0));
        assert!(!node.is_point_intersecting(100.0 - 50.0 - NODE_PADDING - 1.0, 50.0));
    }

    #[test]
    fn test_sized_by_text() {
        let text = label("BRCA1");
        let node = RectangleNode::new(0.0, 0.0, text.clone());
        assert!((node.node_width() - (text.actual_width() + 10.0)).abs() < 1e-9);
        assert!((node.node_height() - (text.actual_height() + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_line_intersection_on_border() {
        let node = sized_node();
        let p = node.line_intersection_point(400.0, 50.0);
        assert!((p.x - 155.0).abs() < 1e-9);
        assert!((p.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_bbox_enclosing() {
        let node = sized_node();
        assert!(node.is_bbox_enclosing(&BoundingBox::new(0.0, 0.0, 200.0, 100.0)));
        assert!(!node.is_bbox_enclosing(&BoundingBox::new(60.0, 0.0, 200.0, 100.0)));
    }

    #[test]
    fn test_full_detail_draws_text() {
        let mut ctx = RecordingContext::new();
        let node = sized_node()
            .with_fill("#fff")
            .with_stroke(Some(Line::solid(1.0, "#2B7CE9")));
        node.draw(&mut ctx, &DrawParams::default());

        assert!(ctx.filled_texts().any(|t| t == "BRCA1"));
        assert!(ctx.commands().contains(&DrawCommand::FillStyle {
            color: "#fff".to_string()
        }));
        assert!(ctx.commands().contains(&DrawCommand::Stroke));
    }

    #[test]
    fn test_simplified_detail_skips_text() {
        let mut ctx = RecordingContext::new();
        let params = DrawParams::new(ViewTransform::new(0.0, 0.0, 0.25));
        sized_node()
            .with_stroke(Some(Line::solid(1.0, "#000")))
            .draw(&mut ctx, &params);
        assert_eq!(ctx.filled_texts().count(), 0);
        // The border keeps its on-screen width.
        assert!(ctx.commands().contains(&DrawCommand::LineWidth { width: 4.0 }));

        let mut ctx = RecordingContext::new();
        sized_node().with_force_high_detail(true).draw(&mut ctx, &params);
        assert_eq!(ctx.filled_texts().count(), 1);
    }
}
