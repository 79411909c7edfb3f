//! Browser canvas backend.

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use super::{CompositeOperation, DrawContext, Font, LineCap, LineJoin, TextMeasurer, TextMetrics};
use crate::error::{RenderError, RenderResult};
use crate::image::Bitmap;

/// Draws onto a browser `CanvasRenderingContext2D`.
///
/// Calls the canvas rejects are logged and skipped; a failed arc or text
/// call must not abort the rest of the frame.
#[derive(Debug, Clone)]
pub struct WebCanvasContext {
    ctx: CanvasRenderingContext2d,
}

impl WebCanvasContext {
    /// Wrap an existing 2D context.
    #[must_use]
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }

    /// Get the 2D context of a canvas element.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas has no 2D context.
    pub fn from_canvas(canvas: &HtmlCanvasElement) -> RenderResult<Self> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| RenderError::Backend(format!("{e:?}")))?
            .ok_or_else(|| RenderError::Backend("canvas has no 2d context".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| RenderError::Backend("not a 2d context".to_string()))?;
        Ok(Self::new(ctx))
    }

    /// The wrapped context.
    #[must_use]
    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.ctx
    }

    fn check(result: Result<(), JsValue>, what: &str) {
        if let Err(e) = result {
            tracing::warn!("Canvas {} failed: {:?}", what, e);
        }
    }

    fn bitmap_canvas(bitmap: &Bitmap) -> Result<HtmlCanvasElement, JsValue> {
        let image_data = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(&bitmap.rgba[..]),
            bitmap.width,
            bitmap.height,
        )?;
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("No document object"))?;
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("Element is not a canvas"))?;
        canvas.set_width(bitmap.width);
        canvas.set_height(bitmap.height);
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Failed to get 2D context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| JsValue::from_str("Failed to get 2D context"))?;
        ctx.put_image_data(&image_data, 0.0, 0.0)?;
        Ok(canvas)
    }
}

impl TextMeasurer for WebCanvasContext {
    fn measure_text(&self, font: &Font, text: &str) -> TextMetrics {
        let previous = self.ctx.font();
        self.ctx.set_font(&font.to_string());
        let metrics = match self.ctx.measure_text(text) {
            Ok(m) => TextMetrics {
                width: m.width(),
                ascent: m.actual_bounding_box_ascent(),
                descent: m.actual_bounding_box_descent(),
            },
            Err(e) => {
                tracing::warn!("Canvas measure_text failed: {:?}", e);
                TextMetrics::default()
            }
        };
        self.ctx.set_font(&previous);
        metrics
    }
}

impl DrawContext for WebCanvasContext {
    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, x: f64, y: f64) {
        Self::check(self.ctx.translate(x, y), "translate");
    }

    fn scale(&mut self, x: f64, y: f64) {
        Self::check(self.ctx.scale(x, y), "scale");
    }

    fn set_fill_style(&mut self, color: &str) {
        self.ctx.set_fill_style_str(color);
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.ctx.set_stroke_style_str(color);
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        let array = js_sys::Array::new();
        for segment in segments {
            array.push(&JsValue::from_f64(*segment));
        }
        Self::check(self.ctx.set_line_dash(&array), "set_line_dash");
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.ctx.set_line_cap(cap.as_str());
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.ctx.set_line_join(join.as_str());
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn set_composite_operation(&mut self, op: CompositeOperation) {
        Self::check(
            self.ctx.set_global_composite_operation(op.as_str()),
            "set_global_composite_operation",
        );
    }

    fn set_font(&mut self, font: &Font) {
        self.ctx.set_font(&font.to_string());
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ctx.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ctx.line_to(x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) {
        Self::check(self.ctx.arc(x, y, radius, start_angle, end_angle), "arc");
    }

    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) {
        Self::check(self.ctx.arc_to(x1, y1, x2, y2, radius), "arc_to");
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.rect(x, y, width, height);
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.fill_rect(x, y, width, height);
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.clear_rect(x, y, width, height);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        Self::check(self.ctx.fill_text(text, x, y), "fill_text");
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        Self::check(self.ctx.stroke_text(text, x, y), "stroke_text");
    }

    fn draw_image(&mut self, bitmap: &Bitmap, x: f64, y: f64, width: f64, height: f64) {
        match Self::bitmap_canvas(bitmap) {
            Ok(canvas) => Self::check(
                self.ctx
                    .draw_image_with_html_canvas_element_and_dw_and_dh(&canvas, x, y, width, height),
                "draw_image",
            ),
            Err(e) => tracing::warn!("Failed to prepare bitmap: {:?}", e),
        }
    }
}
