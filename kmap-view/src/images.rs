//! In-memory image source for hosts that already hold the map's images.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use kmap_renderer::{Bitmap, RenderResult, ResourceProvider};

/// Image bytes keyed by image id, shared with the host.
///
/// The host keeps a clone and adds images as it unpacks them; the resource
/// manager decodes on first use.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageProvider {
    images: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MemoryImageProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store encoded image bytes under `id`.
    pub fn insert(&self, id: impl Into<String>, bytes: Vec<u8>) {
        self.images.borrow_mut().insert(id.into(), bytes);
    }

    /// Number of stored images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.borrow().len()
    }

    /// Whether no image is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.borrow().is_empty()
    }
}

#[async_trait(?Send)]
impl ResourceProvider<Bitmap> for MemoryImageProvider {
    async fn fetch(&self, id: &str) -> RenderResult<Option<Bitmap>> {
        let bytes = self.images.borrow().get(id).cloned();
        match bytes {
            Some(bytes) => Bitmap::decode(&bytes).map(Some),
            None => {
                tracing::debug!("No image stored for {}", id);
                Ok(None)
            }
        }
    }
}
