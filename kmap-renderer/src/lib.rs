//! # Knowledge Map Renderer
//!
//! Turns graph entities into drawable, hit-testable shapes and draws them
//! through an immediate-mode 2D canvas.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  style       RenderStyle / KnowledgeMapStyle│
//! ├─────────────────────────────────────────────┤
//! │  placed      RectangleNode  ImageNode       │
//! │              FontIconNode   LineEdge        │
//! ├──────────────┬──────────────┬───────────────┤
//! │  text        │  line        │  resource     │
//! │  TextElement │  line_head   │  image cache  │
//! ├──────────────┴──────────────┴───────────────┤
//! │  geometry    transform    backend           │
//! │                           (recording / web) │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod error;
pub mod geometry;
pub mod image;
pub mod line;
pub mod line_head;
pub mod placed;
pub mod resource;
pub mod style;
pub mod text;
pub mod transform;

pub use backend::{
    CompositeOperation, DrawCommand, DrawContext, Font, LineCap, LineJoin, MonospaceMeasurer,
    RecordingContext, TextMeasurer, TextMetrics,
};
pub use error::{RenderError, RenderResult};
pub use geometry::{BoundingBox, Point};
pub use crate::image::Bitmap;
pub use line::Line;
pub use line_head::{CompoundLineHead, LineHead};
pub use placed::{
    DrawParams, FontIconNode, ImageNode, LineEdge, PlacedNode, PlacedObject, RectangleNode,
};
pub use resource::{
    CacheStats, OwnerId, ResourceCacheConfig, ResourceHandle, ResourceManager, ResourceProvider,
};
pub use style::{
    EdgeEnds, KnowledgeMapStyle, NodeShape, PlacementOptions, RenderStyle, StyleConfig,
};
pub use text::{Insets, TextAlignment, TextElement};
pub use transform::{RenderDetail, ViewTransform, DEFAULT_DETAIL_THRESHOLD};
