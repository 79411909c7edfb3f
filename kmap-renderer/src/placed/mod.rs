//! Drawable, hit-testable geometry derived from graph entities.
//!
//! A placed shape is built by the style layer from a node or edge and the
//! current selection state. It is immutable: any change to the entity
//! builds a new one.
//!
//! ```text
//!   PlacedNode ─┬─ RectangleNode   rounded box + centered text
//!               ├─ ImageNode       bitmap + caption below
//!               └─ FontIconNode    glyph + label below
//!   LineEdge                       line + heads + midpoint label
//! ```

mod edge;
mod icon;
mod image;
mod rectangle;

use crate::backend::DrawContext;
use crate::geometry::{BoundingBox, Point};
use crate::transform::{RenderDetail, ViewTransform, DEFAULT_DETAIL_THRESHOLD};

pub use edge::{LineEdge, DEFAULT_EDGE_HIT_TOLERANCE};
pub use icon::FontIconNode;
pub use image::ImageNode;
pub use rectangle::{RectangleNode, NODE_PADDING};

/// Per-frame drawing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    /// Current pan/zoom.
    pub transform: ViewTransform,
    /// Zoom below which shapes are simplified.
    pub detail_threshold: f64,
}

impl DrawParams {
    /// Parameters for a transform with the default detail threshold.
    #[must_use]
    pub fn new(transform: ViewTransform) -> Self {
        Self {
            transform,
            detail_threshold: DEFAULT_DETAIL_THRESHOLD,
        }
    }

    /// Set the detail threshold.
    #[must_use]
    pub fn with_detail_threshold(mut self, threshold: f64) -> Self {
        self.detail_threshold = threshold;
        self
    }

    /// Detail level for a shape that may force full detail.
    #[must_use]
    pub fn detail(&self, force_high_detail: bool) -> RenderDetail {
        RenderDetail::for_zoom(self.transform.k, force_high_detail, self.detail_threshold)
    }

    /// Factor that keeps a stroke the same on-screen width at any zoom.
    #[must_use]
    pub fn zoom_reset_scale(&self) -> f64 {
        if self.transform.k > 0.0 {
            1.0 / self.transform.k
        } else {
            1.0
        }
    }
}

impl Default for DrawParams {
    fn default() -> Self {
        Self::new(ViewTransform::IDENTITY)
    }
}

/// Geometry shared by every placed shape.
pub trait PlacedObject {
    /// Smallest box containing everything the shape draws.
    fn bounding_box(&self) -> BoundingBox;

    /// Precise hit test in graph coordinates.
    fn is_point_intersecting(&self, x: f64, y: f64) -> bool;

    /// Whether `bbox` fully contains the shape, for rubber-band selection.
    fn is_bbox_enclosing(&self, bbox: &BoundingBox) -> bool {
        bbox.encloses(&self.bounding_box())
    }

    /// Draw in graph coordinates; the caller has applied the transform.
    fn draw(&self, ctx: &mut dyn DrawContext, params: &DrawParams);
}

/// A placed node of any shape.
#[derive(Debug)]
pub enum PlacedNode {
    /// Bordered box with text.
    Rectangle(RectangleNode),
    /// Bitmap with caption.
    Image(ImageNode),
    /// Icon glyph with label.
    Icon(FontIconNode),
}

impl PlacedNode {
    /// Where an edge coming from `(x, y)` should touch this node.
    #[must_use]
    pub fn line_intersection_point(&self, x: f64, y: f64) -> Point {
        match self {
            Self::Rectangle(node) => node.line_intersection_point(x, y),
            Self::Image(node) => node.line_intersection_point(x, y),
            Self::Icon(node) => node.line_intersection_point(x, y),
        }
    }

    /// Whether this is an image node.
    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    /// The image node, if this is one.
    #[must_use]
    pub fn as_image(&self) -> Option<&ImageNode> {
        match self {
            Self::Image(node) => Some(node),
            _ => None,
        }
    }

    /// The image node, mutably, if this is one.
    pub fn as_image_mut(&mut self) -> Option<&mut ImageNode> {
        match self {
            Self::Image(node) => Some(node),
            _ => None,
        }
    }

    fn as_object(&self) -> &dyn PlacedObject {
        match self {
            Self::Rectangle(node) => node,
            Self::Image(node) => node,
            Self::Icon(node) => node,
        }
    }
}

impl PlacedObject for PlacedNode {
    fn bounding_box(&self) -> BoundingBox {
        self.as_object().bounding_box()
    }

    fn is_point_intersecting(&self, x: f64, y: f64) -> bool {
        self.as_object().is_point_intersecting(x, y)
    }

    fn is_bbox_enclosing(&self, bbox: &BoundingBox) -> bool {
        self.as_object().is_bbox_enclosing(bbox)
    }

    fn draw(&self, ctx: &mut dyn DrawContext, params: &DrawParams) {
        self.as_object().draw(ctx, params);
    }
}

impl From<RectangleNode> for PlacedNode {
    fn from(node: RectangleNode) -> Self {
        Self::Rectangle(node)
    }
}

impl From<ImageNode> for PlacedNode {
    fn from(node: ImageNode) -> Self {
        Self::Image(node)
    }
}

impl From<FontIconNode> for PlacedNode {
    fn from(node: FontIconNode) -> Self {
        Self::Icon(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_params_detail() {
        let zoomed_out = DrawParams::new(ViewTransform::new(0.0, 0.0, 0.2));
        assert_eq!(zoomed_out.detail(false), RenderDetail::Simplified);
        assert_eq!(zoomed_out.detail(true), RenderDetail::Full);
        assert_eq!(
            zoomed_out.with_detail_threshold(0.1).detail(false),
            RenderDetail::Full
        );
        assert!((zoomed_out.zoom_reset_scale() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_zoom_reset_scale() {
        let params = DrawParams::new(ViewTransform::new(0.0, 0.0, 0.0));
        assert!((params.zoom_reset_scale() - 1.0).abs() < f64::EPSILON);
    }
}
