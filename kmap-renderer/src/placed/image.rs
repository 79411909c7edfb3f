use super::{DrawParams, PlacedObject};
use crate::backend::{CompositeOperation, DrawContext};
use crate::geometry::{point_on_rect, BoundingBox, Point};
use crate::image::Bitmap;
use crate::line::Line;
use crate::resource::{OwnerId, ResourceHandle, ResourceManager};
use crate::text::TextElement;

/// Images are large, so their border is drawn thicker than the line width.
const IMAGE_STROKE_FACTOR: f64 = 2.0;

/// Gap between the image and its caption.
const LABEL_OFFSET: f64 = 20.0;

const PLACEHOLDER_STROKE: &str = "rgba(0, 0, 0, 0.4)";
const PLACEHOLDER_FILL: &str = "rgba(0, 0, 0, 0.1)";

/// A bitmap node with a caption below it.
///
/// The bitmap comes from the resource manager: [`ImageNode::bind`]
/// subscribes, [`ImageNode::unbind`] releases. Until the image arrives, or
/// forever if it never does, a gray placeholder box is drawn. Images are
/// composited behind what is already on the canvas so they never hide
/// overlapping shapes.
#[derive(Debug)]
pub struct ImageNode {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    image_id: String,
    owner: OwnerId,
    text_box: TextElement,
    stroke: Option<Line>,
    image: Option<ResourceHandle<Bitmap>>,
}

impl ImageNode {
    /// An unbound image node of the given size, centered on `(x, y)`.
    #[must_use]
    pub fn new(
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image_id: impl Into<String>,
        text_box: TextElement,
    ) -> Self {
        Self {
            x,
            y,
            width,
            height,
            image_id: image_id.into(),
            owner: OwnerId::new(),
            text_box,
            stroke: None,
            image: None,
        }
    }

    /// Outline the image; `None` draws no border.
    #[must_use]
    pub fn with_stroke(mut self, stroke: Option<Line>) -> Self {
        self.stroke = stroke;
        self
    }

    /// Resource id of the bitmap.
    #[must_use]
    pub fn image_id(&self) -> &str {
        &self.image_id
    }

    /// Identity used with the resource manager.
    #[must_use]
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// The caption.
    #[must_use]
    pub fn text_box(&self) -> &TextElement {
        &self.text_box
    }

    /// Whether the bitmap is available.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.image.as_ref().is_some_and(|h| h.current().is_some())
    }

    /// Whether the node is subscribed to its bitmap.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.image.is_some()
    }

    /// Subscribe to the bitmap.
    pub fn bind(&mut self, manager: &mut ResourceManager<Bitmap>) {
        if self.image.is_none() {
            self.image = Some(manager.acquire(self.owner, &self.image_id));
        }
    }

    /// Release the bitmap.
    pub fn unbind(&mut self, manager: &mut ResourceManager<Bitmap>) {
        if self.image.take().is_some() {
            manager.release(self.owner);
        }
    }

    /// Whether the bitmap arrived since the last call.
    pub fn take_image_update(&mut self) -> bool {
        match &mut self.image {
            Some(handle) if handle.has_changed() => {
                handle.mark_seen();
                true
            }
            _ => false,
        }
    }

    /// Where an edge coming from `(x, y)` crosses the image border.
    #[must_use]
    pub fn line_intersection_point(&self, x: f64, y: f64) -> Point {
        point_on_rect(x, y, &self.bounding_box(), true)
    }
}

impl PlacedObject for ImageNode {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_center(self.x, self.y, self.width, self.height)
    }

    fn is_point_intersecting(&self, x: f64, y: f64) -> bool {
        self.bounding_box().contains(x, y)
    }

    fn draw(&self, ctx: &mut dyn DrawContext, params: &DrawParams) {
        let bbox = self.bounding_box();
        let zoom_reset_scale = params.zoom_reset_scale();
        let mut line_width = 0.0;

        ctx.save();
        ctx.set_composite_operation(CompositeOperation::DestinationOver);
        ctx.begin_path();

        match self.image.as_ref().and_then(ResourceHandle::current) {
            Some(bitmap) => {
                ctx.draw_image(&bitmap, bbox.min_x, bbox.min_y, self.width, self.height);
                if let Some(stroke) = &self.stroke {
                    stroke.set_context(ctx);
                    line_width = zoom_reset_scale * stroke.width() * IMAGE_STROKE_FACTOR;
                    ctx.rect(
                        bbox.min_x - line_width / 2.0,
                        bbox.min_y - line_width / 2.0,
                        self.width + line_width,
                        self.height + line_width,
                    );
                    ctx.set_line_width(line_width);
                    ctx.stroke();
                }
            }
            None => {
                ctx.rect(bbox.min_x, bbox.min_y, self.width, self.height);
                ctx.set_line_width(zoom_reset_scale);
                ctx.set_stroke_style(PLACEHOLDER_STROKE);
                ctx.set_fill_style(PLACEHOLDER_FILL);
                ctx.fill();
                ctx.stroke();
            }
        }

        self.text_box.draw_centered_at(
            ctx,
            self.x,
            self.y
                + self.height / 2.0
                + LABEL_OFFSET
                + self.text_box.actual_height_with_insets() / 2.0
                + line_width,
        );
        ctx.restore();
    }
}
