use super::{DrawParams, PlacedObject};
use crate::backend::DrawContext;
use crate::geometry::{point_on_rect, BoundingBox, Point};
use crate::text::TextElement;

const MINIMUM_BBOX_SIZE: f64 = 10.0;
const ICON_LABEL_SPACING: f64 = 16.0;
/// Narrow or missing glyphs still get a usable click target.
const MINIMUM_CLICKABLE_ICON_WIDTH: f64 = 50.0;
const SIMPLIFIED_LABEL_FILL: &str = "#ccc";

/// An icon glyph stacked above a wrapped label.
///
/// ```text
///        ┌────┐
///        │ ✎  │   icon (font glyph)
///        └────┘
///          16px
///   ┌──────────────┐
///   │ label text   │
///   └──────────────┘
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FontIconNode {
    x: f64,
    y: f64,
    icon_text_box: TextElement,
    label_text_box: TextElement,
    force_high_detail: bool,
    total_height: f64,
    min_y: f64,
}

impl FontIconNode {
    /// An icon node centered on `(x, y)`.
    #[must_use]
    pub fn new(x: f64, y: f64, icon_text_box: TextElement, label_text_box: TextElement) -> Self {
        let total_height =
            icon_text_box.actual_height() + ICON_LABEL_SPACING + label_text_box.actual_height();
        Self {
            x,
            y,
            icon_text_box,
            label_text_box,
            force_high_detail: false,
            total_height,
            min_y: y - total_height / 2.0,
        }
    }

    /// Keep full detail at any zoom.
    #[must_use]
    pub fn with_force_high_detail(mut self, force: bool) -> Self {
        self.force_high_detail = force;
        self
    }

    /// The glyph.
    #[must_use]
    pub fn icon_text_box(&self) -> &TextElement {
        &self.icon_text_box
    }

    /// The label.
    #[must_use]
    pub fn label_text_box(&self) -> &TextElement {
        &self.label_text_box
    }

    /// Where an edge coming from `(x, y)` crosses the bounding box.
    #[must_use]
    pub fn line_intersection_point(&self, x: f64, y: f64) -> Point {
        point_on_rect(x, y, &self.bounding_box(), true)
    }

    fn label_top(&self) -> f64 {
        self.min_y + self.icon_text_box.actual_height() + ICON_LABEL_SPACING
    }
}

impl PlacedObject for FontIconNode {
    fn bounding_box(&self) -> BoundingBox {
        let width = self
            .label_text_box
            .actual_width()
            .max(self.icon_text_box.actual_width())
            .max(MINIMUM_BBOX_SIZE);
        let height = self.total_height.max(MINIMUM_BBOX_SIZE);
        BoundingBox::new(
            self.x - width / 2.0,
            self.min_y,
            self.x + width / 2.0,
            self.min_y + height,
        )
    }

    fn is_point_intersecting(&self, x: f64, y: f64) -> bool {
        let icon_half = self
            .icon_text_box
            .actual_width()
            .max(MINIMUM_CLICKABLE_ICON_WIDTH)
            / 2.0;
        let label_half = self.label_text_box.actual_width() / 2.0;
        let max_y = self.min_y + self.total_height;

        let on_icon =
            x >= self.x - icon_half && x <= self.x + icon_half && y >= self.min_y && y <= max_y;
        let on_label = x >= self.x - label_half
            && x <= self.x + label_half
            && y >= self.label_top()
            && y <= max_y;
        on_icon || on_label
    }

    fn draw(&self, ctx: &mut dyn DrawContext, params: &DrawParams) {
        let detail = params.detail(self.force_high_detail);

        ctx.save();
        ctx.begin_path();

        self.icon_text_box.draw(
            ctx,
            self.x - self.icon_text_box.actual_width() / 2.0,
            self.min_y,
        );

        let label_x = self.x - self.label_text_box.actual_width() / 2.0;
        if detail.is_full() {
            self.label_text_box.draw(ctx, label_x, self.label_top());
        } else {
            ctx.set_fill_style(SIMPLIFIED_LABEL_FILL);
            ctx.fill_rect(
                label_x,
                self.label_top(),
                self.label_text_box.actual_width(),
                self.label_text_box.actual_height(),
            );
        }

        ctx.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawCommand, Font, MonospaceMeasurer, RecordingContext};
    use crate::transform::ViewTransform;

    // Monospace metrics: 0.6em advance, 0.8em ascent, 0.2em descent.
    fn icon_node() -> FontIconNode {
        let measurer = MonospaceMeasurer::default();
        let icon = TextElement::builder("\u{f0c1}", Font::new(50.0, "\"Font Awesome 5 Pro\""))
            .layout(&measurer);
        let label = TextElement::builder("Paper", Font::new(10.0, "sans-serif"))
            .max_width(200.0)
            .layout(&measurer);
        FontIconNode::new(0.0, 0.0, icon, label)
    }

    #[test]
    fn test_stacked_geometry() {
        let node = icon_node();
        let total = node.icon_text_box().actual_height()
            + 16.0
            + node.label_text_box().actual_height();
        let bbox = node.bounding_box();
        assert!((bbox.height() - total).abs() < 1e-9);
        assert!((bbox.min_y + total / 2.0).abs() < 1e-9);
        // Icon glyph is 30px wide, label 30px: minimum clickable width applies.
        assert!(node.is_point_intersecting(24.0, bbox.min_y + 1.0));
        assert!(!node.is_point_intersecting(26.0, bbox.min_y + 1.0));
        assert!(node.is_point_intersecting(0.0, bbox.max_y));
    }

    #[test]
    fn test_wide_label_is_clickable_below_icon() {
        let measurer = MonospaceMeasurer::default();
        let icon = TextElement::builder("x", Font::new(50.0, "icons")).layout(&measurer);
        let label = TextElement::builder("A rather long label", Font::new(10.0, "sans-serif"))
            .max_width(200.0)
            .layout(&measurer);
        let node = FontIconNode::new(0.0, 0.0, icon, label);
        let bbox = node.bounding_box();
        // 19 chars * 6px = 114px label.
        assert!(node.is_point_intersecting(50.0, bbox.max_y - 1.0));
        assert!(!node.is_point_intersecting(50.0, bbox.min_y + 1.0));
    }

    #[test]
    fn test_simplified_label_is_a_box() {
        let node = icon_node();
        let mut ctx = RecordingContext::new();
        node.draw(&mut ctx, &DrawParams::new(ViewTransform::new(0.0, 0.0, 0.1)));
        assert_eq!(ctx.filled_texts().collect::<Vec<_>>(), vec!["\u{f0c1}"]);
        assert!(ctx.commands().contains(&DrawCommand::FillStyle {
            color: "#ccc".to_string()
        }));

        let mut ctx = RecordingContext::new();
        node.draw(&mut ctx, &DrawParams::default());
        assert_eq!(ctx.filled_texts().count(), 2);
    }

    #[test]
    fn test_line_intersection_is_on_bbox() {
        let node = icon_node();
        let bbox = node.bounding_box();
        let p = node.line_intersection_point(0.0, 500.0);
        assert!((p.y - bbox.max_y).abs() < 1e-9);
    }
}
