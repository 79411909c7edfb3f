//! # Knowledge Map View
//!
//! The interactive scene controller for a knowledge map: it owns the graph,
//! places and draws it through a render style, and turns pointer input and
//! drops into undoable edits.
//!
//! ## Usage
//!
//! ```rust
//! use kmap_core::{Node, NodeCreation};
//! use kmap_renderer::{MonospaceMeasurer, RecordingContext};
//! use kmap_view::{CanvasGraphView, MemoryImageProvider, ViewConfig};
//!
//! let mut view = CanvasGraphView::new(
//!     ViewConfig::default(),
//!     Box::new(MonospaceMeasurer::default()),
//!     MemoryImageProvider::new(),
//! );
//! view.execute(Box::new(NodeCreation::new("Add gene", Node::new("a", "gene", "TP53", 0.0, 0.0))))
//!     .unwrap();
//!
//! let mut ctx = RecordingContext::new();
//! view.render_now(&mut ctx);
//! assert!(view.undo().unwrap());
//! ```
//!
//! Build for the browser with `wasm-pack build --target web kmap-view -- --features wasm`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod images;
mod interaction;
pub mod render;
mod view;
#[cfg(feature = "wasm")]
pub mod web;

pub use config::ViewConfig;
pub use error::{ViewError, ViewResult};
pub use images::MemoryImageProvider;
pub use interaction::DRAG_THRESHOLD;
pub use render::{FrameClock, RenderStats};
pub use view::CanvasGraphView;
