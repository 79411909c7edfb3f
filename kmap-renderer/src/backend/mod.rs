//! Drawing backends.
//!
//! Every placed shape draws through [`DrawContext`], an immediate-mode 2D
//! canvas. The recording backend captures commands for tests and for the
//! command-line renderer; the web backend (feature `wasm`) forwards them to a
//! browser `CanvasRenderingContext2D`.

pub mod recording;
#[cfg(feature = "wasm")]
pub mod web;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::image::Bitmap;

pub use recording::{DrawCommand, MonospaceMeasurer, RecordingContext};
#[cfg(feature = "wasm")]
pub use web::WebCanvasContext;

/// A font description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    /// Size in pixels.
    pub size: f64,
    /// CSS font family list.
    pub family: String,
    /// Bold weight.
    pub bold: bool,
}

impl Font {
    /// Create a regular-weight font.
    #[must_use]
    pub fn new(size: f64, family: impl Into<String>) -> Self {
        Self {
            size,
            family: family.into(),
            bold: false,
        }
    }

    /// Set bold weight.
    #[must_use]
    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bold {
            write!(f, "bold {}px {}", self.size, self.family)
        } else {
            write!(f, "{}px {}", self.size, self.family)
        }
    }
}

/// Measured extent of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextMetrics {
    /// Advance width.
    pub width: f64,
    /// Distance from the baseline to the top of the glyphs.
    pub ascent: f64,
    /// Distance from the baseline to the bottom of the glyphs.
    pub descent: f64,
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    /// Flat end at the endpoint.
    Butt,
    /// Rounded end.
    Round,
    /// Square end extending past the endpoint.
    Square,
}

impl LineCap {
    /// Canvas keyword.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Butt => "butt",
            Self::Round => "round",
            Self::Square => "square",
        }
    }
}

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    /// Sharp corner.
    Miter,
    /// Rounded corner.
    Round,
    /// Cut-off corner.
    Bevel,
}

impl LineJoin {
    /// Canvas keyword.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Miter => "miter",
            Self::Round => "round",
            Self::Bevel => "bevel",
        }
    }
}

/// How new pixels combine with existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeOperation {
    /// Draw on top (the default).
    SourceOver,
    /// Draw behind existing pixels.
    DestinationOver,
}

impl CompositeOperation {
    /// Canvas keyword.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::DestinationOver => "destination-over",
        }
    }
}

/// Measures text without drawing it.
pub trait TextMeasurer {
    /// Measure `text` in `font`.
    fn measure_text(&self, font: &Font, text: &str) -> TextMetrics;
}

/// An immediate-mode 2D drawing surface.
///
/// Mirrors the subset of `CanvasRenderingContext2D` the engine uses. Colors
/// are CSS color strings.
pub trait DrawContext: TextMeasurer {
    /// Push the drawing state.
    fn save(&mut self);
    /// Pop the drawing state.
    fn restore(&mut self);
    /// Translate the current transform.
    fn translate(&mut self, x: f64, y: f64);
    /// Scale the current transform.
    fn scale(&mut self, x: f64, y: f64);

    /// Set the fill color.
    fn set_fill_style(&mut self, color: &str);
    /// Set the stroke color.
    fn set_stroke_style(&mut self, color: &str);
    /// Set the stroke width.
    fn set_line_width(&mut self, width: f64);
    /// Set the dash pattern; empty for solid.
    fn set_line_dash(&mut self, segments: &[f64]);
    /// Set the line cap.
    fn set_line_cap(&mut self, cap: LineCap);
    /// Set the line join.
    fn set_line_join(&mut self, join: LineJoin);
    /// Set the global alpha.
    fn set_global_alpha(&mut self, alpha: f64);
    /// Set the compositing operation.
    fn set_composite_operation(&mut self, op: CompositeOperation);
    /// Set the font used by text calls.
    fn set_font(&mut self, font: &Font);

    /// Start a new path.
    fn begin_path(&mut self);
    /// Close the current sub-path.
    fn close_path(&mut self);
    /// Move the pen.
    fn move_to(&mut self, x: f64, y: f64);
    /// Add a straight segment.
    fn line_to(&mut self, x: f64, y: f64);
    /// Add a circular arc around `(x, y)`.
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64);
    /// Add an arc tangent to two lines.
    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64);
    /// Add a rectangle sub-path.
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Add a rounded rectangle sub-path.
    fn rounded_rect(&mut self, x: f64, y: f64, width: f64, height: f64, radius: f64) {
        let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
        self.move_to(x + r, y);
        self.arc_to(x + width, y, x + width, y + height, r);
        self.arc_to(x + width, y + height, x, y + height, r);
        self.arc_to(x, y + height, x, y, r);
        self.arc_to(x, y, x + width, y, r);
        self.close_path();
    }

    /// Fill the current path.
    fn fill(&mut self);
    /// Stroke the current path.
    fn stroke(&mut self);
    /// Fill a rectangle directly.
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    /// Clear a rectangle to transparent.
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Fill text with its baseline at `y`.
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    /// Stroke text with its baseline at `y`.
    fn stroke_text(&mut self, text: &str, x: f64, y: f64);

    /// Draw a bitmap scaled into the given rectangle.
    fn draw_image(&mut self, bitmap: &Bitmap, x: f64, y: f64, width: f64, height: f64);
}
