//! Error types for the view controller.

use kmap_core::MapError;
use kmap_renderer::RenderError;
use thiserror::Error;

/// Errors from loading maps into the view.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The graph or an edit on it was rejected.
    #[error(transparent)]
    Map(#[from] MapError),

    /// A rendering resource could not be set up.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result type for view operations.
pub type ViewResult<T> = std::result::Result<T, ViewError>;
