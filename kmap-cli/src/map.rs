//! Map documents on disk.
//!
//! ```text
//! maps/p53/
//! ├── graph.json        UniversalGraph document
//! └── images/
//!     └── <image_id>    encoded image bytes, one file per image node
//! ```

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use kmap_core::MapError;
use kmap_renderer::{Bitmap, MonospaceMeasurer, RenderError, RenderResult, ResourceProvider};
use kmap_view::{CanvasGraphView, ViewConfig, ViewError};
use thiserror::Error;

/// Graph file name inside a map directory.
pub const GRAPH_FILE: &str = "graph.json";

/// Image directory name inside a map directory.
pub const IMAGES_DIR: &str = "images";

/// Errors locating or loading a map.
#[derive(Debug, Error)]
pub enum MapLoadError {
    /// Neither a map directory nor a graph file.
    #[error("No map at {0} (expected a directory with {GRAPH_FILE} or a JSON file)")]
    NotFound(PathBuf),

    /// Reading a file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// The cause.
        #[source]
        source: std::io::Error,
    },

    /// The view configuration file is not valid.
    #[error("Invalid view config {path}: {source}")]
    Config {
        /// The file.
        path: PathBuf,
        /// The cause.
        #[source]
        source: serde_json::Error,
    },

    /// The graph document is malformed or inconsistent.
    #[error("Invalid map document: {0}")]
    Document(#[from] MapError),

    /// The view rejected the graph.
    #[error(transparent)]
    View(#[from] ViewError),
}

/// Where a map's graph and images live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSource {
    /// The graph JSON file.
    pub graph_path: PathBuf,
    /// The image directory, if the map has one.
    pub images_dir: Option<PathBuf>,
}

impl MapSource {
    /// Resolve a map directory or graph file.
    ///
    /// # Errors
    ///
    /// Returns [`MapLoadError::NotFound`] if `path` is neither.
    pub async fn locate(path: &Path) -> Result<Self, MapLoadError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| MapLoadError::NotFound(path.to_path_buf()))?;

        if metadata.is_file() {
            return Ok(Self {
                graph_path: path.to_path_buf(),
                images_dir: None,
            });
        }

        let graph_path = path.join(GRAPH_FILE);
        if !is_file(&graph_path).await {
            return Err(MapLoadError::NotFound(path.to_path_buf()));
        }
        let images = path.join(IMAGES_DIR);
        let images_dir = is_dir(&images).await.then_some(images);
        tracing::debug!(
            "Map at {} (images: {})",
            graph_path.display(),
            images_dir.is_some()
        );
        Ok(Self {
            graph_path,
            images_dir,
        })
    }

    /// Read the graph document text.
    ///
    /// # Errors
    ///
    /// Returns [`MapLoadError::Io`] if the file cannot be read.
    pub async fn read_graph(&self) -> Result<String, MapLoadError> {
        tokio::fs::read_to_string(&self.graph_path)
            .await
            .map_err(|source| MapLoadError::Io {
                path: self.graph_path.clone(),
                source,
            })
    }

    /// Image provider for this map.
    #[must_use]
    pub fn image_provider(&self) -> DirectoryImageProvider {
        DirectoryImageProvider {
            root: self.images_dir.clone(),
        }
    }

    /// Load the map into a view sized `viewport`.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph cannot be read or is invalid.
    pub async fn open_view(
        &self,
        config: ViewConfig,
        viewport: (f64, f64),
    ) -> Result<CanvasGraphView, MapLoadError> {
        let json = self.read_graph().await?;
        let mut view = CanvasGraphView::new(
            config,
            Box::new(MonospaceMeasurer::default()),
            self.image_provider(),
        );
        view.set_viewport(viewport.0, viewport.1);
        view.load_graph_json(&json)?;
        tracing::info!(
            "Loaded {} nodes and {} edges from {}",
            view.node_count(),
            view.edge_count(),
            self.graph_path.display()
        );
        Ok(view)
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

/// Reads image nodes' bitmaps from a map's `images/` directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryImageProvider {
    root: Option<PathBuf>,
}

impl DirectoryImageProvider {
    /// Provider over `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// The file holding `image_id`, if the id names a plain file in the
    /// image directory.
    fn image_path(&self, image_id: &str) -> Option<PathBuf> {
        let root = self.root.as_ref()?;
        let mut components = Path::new(image_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Some(root.join(name)),
            _ => {
                tracing::warn!("Refusing image id {:?}", image_id);
                None
            }
        }
    }
}

#[async_trait(?Send)]
impl ResourceProvider<Bitmap> for DirectoryImageProvider {
    async fn fetch(&self, id: &str) -> RenderResult<Option<Bitmap>> {
        let Some(path) = self.image_path(id) else {
            return Ok(None);
        };
        tracing::debug!("Reading image {}", path.display());
        match tokio::fs::read(&path).await {
            Ok(bytes) => Bitmap::decode(&bytes).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RenderError::Resource(format!("{}: {e}", path.display()))),
        }
    }
}
