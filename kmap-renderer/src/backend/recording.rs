//! Recording backend.
//!
//! Captures every draw call as a [`DrawCommand`] instead of rasterizing. Used
//! by tests and by the command-line renderer to produce a command trace.
//! Text is measured with a deterministic monospace model so layouts are
//! reproducible without a font stack.

use serde::Serialize;

use super::{CompositeOperation, DrawContext, Font, LineCap, LineJoin, TextMeasurer, TextMetrics};
use crate::image::Bitmap;

/// Deterministic text measurement: every character advances the same amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    /// Advance per character, in ems.
    pub advance: f64,
    /// Ascent, in ems.
    pub ascent: f64,
    /// Descent, in ems.
    pub descent: f64,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self {
            advance: 0.6,
            ascent: 0.8,
            descent: 0.2,
        }
    }
}

impl TextMeasurer for MonospaceMeasurer {
    #[allow(clippy::cast_precision_loss)]
    fn measure_text(&self, font: &Font, text: &str) -> TextMetrics {
        TextMetrics {
            width: text.chars().count() as f64 * self.advance * font.size,
            ascent: self.ascent * font.size,
            descent: self.descent * font.size,
        }
    }
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum DrawCommand {
    Save,
    Restore,
    Translate { x: f64, y: f64 },
    Scale { x: f64, y: f64 },
    FillStyle { color: String },
    StrokeStyle { color: String },
    LineWidth { width: f64 },
    LineDash { segments: Vec<f64> },
    LineCap { cap: LineCap },
    LineJoin { join: LineJoin },
    GlobalAlpha { alpha: f64 },
    Composite {
        #[serde(rename = "operation")]
        op: CompositeOperation,
    },
    Font { font: String },
    BeginPath,
    ClosePath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    Arc { x: f64, y: f64, radius: f64, start: f64, end: f64 },
    ArcTo { x1: f64, y1: f64, x2: f64, y2: f64, radius: f64 },
    Rect { x: f64, y: f64, width: f64, height: f64 },
    Fill,
    Stroke,
    FillRect { x: f64, y: f64, width: f64, height: f64 },
    ClearRect { x: f64, y: f64, width: f64, height: f64 },
    FillText { text: String, x: f64, y: f64 },
    StrokeText { text: String, x: f64, y: f64 },
    DrawImage {
        bitmap_width: u32,
        bitmap_height: u32,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// A [`DrawContext`] that records commands.
#[derive(Debug, Clone)]
pub struct RecordingContext {
    width: u32,
    height: u32,
    measurer: MonospaceMeasurer,
    commands: Vec<DrawCommand>,
}

impl RecordingContext {
    /// Create a recording context with the default measurer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_measurer(MonospaceMeasurer::default())
    }

    /// Create a recording context with a custom measurer.
    #[must_use]
    pub fn with_measurer(measurer: MonospaceMeasurer) -> Self {
        Self {
            width: 800,
            height: 600,
            measurer,
            commands: Vec::new(),
        }
    }

    /// Surface size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Resize the recorded surface.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        tracing::debug!("Recording context resized to {}x{}", width, height);
    }

    /// Commands recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the context empty.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Drop the recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Text passed to `fill_text`, in order.
    pub fn filled_texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::FillText { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Number of commands matching a predicate.
    pub fn count(&self, predicate: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    fn push(&mut self, command: DrawCommand) {
        tracing::trace!("Record {:?}", command);
        self.commands.push(command);
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasurer for RecordingContext {
    fn measure_text(&self, font: &Font, text: &str) -> TextMetrics {
        self.measurer.measure_text(font, text)
    }
}

impl DrawContext for RecordingContext {
    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::Translate { x, y });
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::Scale { x, y });
    }

    fn set_fill_style(&mut self, color: &str) {
        self.push(DrawCommand::FillStyle {
            color: color.to_string(),
        });
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.push(DrawCommand::StrokeStyle {
            color: color.to_string(),
        });
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(DrawCommand::LineWidth { width });
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        self.push(DrawCommand::LineDash {
            segments: segments.to_vec(),
        });
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.push(DrawCommand::LineCap { cap });
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.push(DrawCommand::LineJoin { join });
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.push(DrawCommand::GlobalAlpha { alpha });
    }

    fn set_composite_operation(&mut self, op: CompositeOperation) {
        self.push(DrawCommand::Composite { op });
    }

    fn set_font(&mut self, font: &Font) {
        self.push(DrawCommand::Font {
            font: font.to_string(),
        });
    }

    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn close_path(&mut self) {
        self.push(DrawCommand::ClosePath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::LineTo { x, y });
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        self.push(DrawCommand::Arc {
            x,
            y,
            radius,
            start,
            end,
        });
    }

    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) {
        self.push(DrawCommand::ArcTo {
            x1,
            y1,
            x2,
            y2,
            radius,
        });
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
        });
    }

    fn fill(&mut self) {
        self.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
        });
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::ClearRect {
            x,
            y,
            width,
            height,
        });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        self.push(DrawCommand::StrokeText {
            text: text.to_string(),
            x,
            y,
        });
    }

    fn draw_image(&mut self, bitmap: &Bitmap, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::DrawImage {
            bitmap_width: bitmap.width,
            bitmap_height: bitmap.height,
            x,
            y,
            width,
            height,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monospace_measure() {
        let ctx = RecordingContext::new();
        let metrics = ctx.measure_text(&Font::new(10.0, "sans-serif"), "abcd");
        assert!((metrics.width - 24.0).abs() < 1e-9);
        assert!((metrics.ascent - 8.0).abs() < 1e-9);
        assert!((metrics.descent - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_records_in_order() {
        let mut ctx = RecordingContext::new();
        ctx.begin_path();
        ctx.move_to(1.0, 2.0);
        ctx.line_to(3.0, 4.0);
        ctx.stroke();
        ctx.fill_text("hi", 0.0, 0.0);
        assert_eq!(ctx.commands().len(), 5);
        assert_eq!(ctx.commands()[1], DrawCommand::MoveTo { x: 1.0, y: 2.0 });
        assert_eq!(ctx.filled_texts().collect::<Vec<_>>(), vec!["hi"]);
        assert_eq!(ctx.take_commands().len(), 5);
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn test_rounded_rect_path() {
        let mut ctx = RecordingContext::new();
        ctx.rounded_rect(0.0, 0.0, 20.0, 10.0, 50.0);
        assert_eq!(ctx.count(|c| matches!(c, DrawCommand::ArcTo { .. })), 4);
        // Radius clamps to half the smallest side.
        assert!(ctx
            .commands()
            .iter()
            .all(|c| !matches!(c, DrawCommand::ArcTo { radius, .. } if *radius > 5.0)));
    }

    #[test]
    fn test_command_serialization() {
        let json = serde_json::to_value(DrawCommand::LineTo { x: 1.0, y: 2.0 }).unwrap();
        assert_eq!(json["op"], "line_to");
        assert_eq!(json["x"], 1.0);
    }

    #[test]
    fn test_resize() {
        let mut ctx = RecordingContext::new();
        ctx.resize(1024, 768);
        assert_eq!(ctx.size(), (1024, 768));
    }
}
