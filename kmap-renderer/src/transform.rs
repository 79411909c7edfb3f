//! Pan/zoom transform and the zoom-dependent level of detail.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Zoom level below which shapes draw in simplified form.
pub const DEFAULT_DETAIL_THRESHOLD: f64 = 0.35;

/// Screen = graph * k + (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Horizontal pan in screen pixels.
    pub x: f64,
    /// Vertical pan in screen pixels.
    pub y: f64,
    /// Zoom factor.
    pub k: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    /// No pan, zoom 1.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    /// Create a transform.
    #[must_use]
    pub const fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    /// Graph to screen.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    /// Screen to graph.
    #[must_use]
    pub fn invert(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
    }

    /// Pan by a screen-space offset.
    #[must_use]
    pub fn translate_by(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.k)
    }

    /// Multiply the zoom by `factor`, keeping the screen point `anchor` fixed.
    #[must_use]
    pub fn scale_about(&self, factor: f64, anchor: Point) -> Self {
        let k = self.k * factor;
        Self::new(
            anchor.x - (anchor.x - self.x) * factor,
            anchor.y - (anchor.y - self.y) * factor,
            k,
        )
    }
}

/// How much of a shape to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderDetail {
    /// Shape, text and decorations.
    Full,
    /// Cheap outline only, for heavy zoom-out.
    Simplified,
}

impl RenderDetail {
    /// Decide the detail level for a zoom factor.
    ///
    /// Selected or highlighted shapes pass `force_full` to stay readable.
    #[must_use]
    pub fn for_zoom(zoom: f64, force_full: bool, threshold: f64) -> Self {
        if force_full || zoom >= threshold {
            Self::Full
        } else {
            Self::Simplified
        }
    }

    /// Whether this is [`RenderDetail::Full`].
    #[must_use]
    pub fn is_full(self) -> bool {
        self == Self::Full
    }
}
