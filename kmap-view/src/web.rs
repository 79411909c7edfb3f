//! Browser bindings.
//!
//! ```javascript
//! import init, { KnowledgeMapApp } from './pkg/kmap_view.js';
//!
//! await init();
//! const app = new KnowledgeMapApp('map-canvas');
//! app.loadGraph(graphJson);
//! app.zoomToFit();
//!
//! function frame() {
//!     app.frame();
//!     requestAnimationFrame(frame);
//! }
//! frame();
//! ```

use std::fmt;
use std::time::Duration;

use kmap_core::{tokenize_query, FindOptions, Modifiers, PointerEvent, PointerPhase};
use kmap_renderer::backend::WebCanvasContext;
use kmap_renderer::Point;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::images::MemoryImageProvider;
use crate::{CanvasGraphView, ViewConfig};

/// Zoom factor per wheel step.
const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    tracing::info!("Knowledge map view initialized");
}

fn js_error(e: impl fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn clock() -> Duration {
    Duration::from_secs_f64(js_sys::Date::now() / 1000.0)
}

/// A knowledge map bound to an HTML canvas.
#[wasm_bindgen]
pub struct KnowledgeMapApp {
    view: CanvasGraphView,
    canvas: HtmlCanvasElement,
    ctx: WebCanvasContext,
    images: MemoryImageProvider,
}

#[wasm_bindgen]
impl KnowledgeMapApp {
    /// Attach to the canvas element with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas element is not found or has no 2D
    /// context.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<KnowledgeMapApp, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("Canvas element '{canvas_id}' not found")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("Element is not a canvas"))?;
        let ctx = WebCanvasContext::from_canvas(&canvas).map_err(js_error)?;

        let images = MemoryImageProvider::new();
        let mut view = CanvasGraphView::new(
            ViewConfig::default(),
            Box::new(ctx.clone()),
            images.clone(),
        );
        view.set_viewport(f64::from(canvas.width()), f64::from(canvas.height()));

        Ok(Self {
            view,
            canvas,
            ctx,
            images,
        })
    }

    /// Display a graph document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the graph is invalid;
    /// the previous graph stays displayed.
    #[wasm_bindgen(js_name = loadGraph)]
    pub fn load_graph(&mut self, json: &str) -> Result<(), JsValue> {
        self.view.load_graph_json(json).map_err(js_error)
    }

    /// The current graph as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    #[wasm_bindgen(js_name = graphJson)]
    pub fn graph_json(&self) -> Result<String, JsValue> {
        self.view.graph_json().map_err(js_error)
    }

    /// Provide the encoded bytes of an image referenced by `image_id`.
    #[wasm_bindgen(js_name = putImage)]
    pub fn put_image(&mut self, image_id: &str, bytes: &[u8]) {
        self.images.insert(image_id, bytes.to_vec());
    }

    /// Run one animation frame. Returns whether anything was drawn.
    pub fn frame(&mut self) -> bool {
        self.view.animation_frame(&mut self.ctx, &clock)
    }

    /// Feed a pointer event: phase is "down", "move" or "up".
    ///
    /// # Errors
    ///
    /// Returns an error if committing a drag fails.
    #[wasm_bindgen(js_name = handlePointer)]
    pub fn handle_pointer(&mut self, phase: &str, x: f64, y: f64, shift: bool) -> Result<(), JsValue> {
        let phase = match phase {
            "down" | "start" => PointerPhase::Down,
            "up" | "end" | "cancel" => PointerPhase::Up,
            _ => PointerPhase::Move,
        };
        let event = PointerEvent::new(phase, x, y).with_modifiers(Modifiers {
            shift,
            ..Modifiers::default()
        });
        self.view.handle_pointer(event).map_err(js_error)
    }

    /// Create entities from dropped data. Returns how many were created.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a supported payload.
    #[wasm_bindgen(js_name = handleDrop)]
    pub fn handle_drop(&mut self, mime: &str, data: &str, x: f64, y: f64) -> Result<usize, JsValue> {
        self.view
            .handle_drop(mime, data, x, y)
            .map(|created| created.len())
            .map_err(js_error)
    }

    /// Zoom around the pointer for a wheel event.
    #[wasm_bindgen(js_name = handleWheel)]
    pub fn handle_wheel(&mut self, delta_y: f64, x: f64, y: f64) {
        let factor = if delta_y < 0.0 {
            WHEEL_ZOOM_STEP
        } else {
            1.0 / WHEEL_ZOOM_STEP
        };
        self.view.zoom_by(factor, Point::new(x, y));
    }

    /// Pan by a screen offset.
    #[wasm_bindgen(js_name = panBy)]
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.view.pan_by(dx, dy);
    }

    /// Undo the last edit.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub fn undo(&mut self) -> Result<bool, JsValue> {
        self.view.undo().map_err(js_error)
    }

    /// Redo the last undone edit.
    ///
    /// # Errors
    ///
    /// Returns an error if the edit fails.
    pub fn redo(&mut self) -> Result<bool, JsValue> {
        self.view.redo().map_err(js_error)
    }

    /// Fit the graph into the canvas.
    #[wasm_bindgen(js_name = zoomToFit)]
    pub fn zoom_to_fit(&mut self) {
        let padding = self.view.config().zoom_to_fit_padding;
        self.view.zoom_to_fit(padding);
    }

    /// Resize the canvas.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.view
            .set_viewport(f64::from(width), f64::from(height));
    }

    /// Highlight matches of a search query. Returns the match count.
    ///
    /// # Errors
    ///
    /// Returns an error if the query does not compile.
    #[wasm_bindgen(js_name = findMatching)]
    pub fn find_matching(&mut self, query: &str, whole_word: bool, wildcards: bool) -> Result<usize, JsValue> {
        let options = FindOptions {
            whole_word,
            keep_search_special_chars: wildcards,
        };
        self.view
            .set_search_terms(&tokenize_query(query), options)
            .map_err(js_error)
    }

    /// Focus a search match and pan to it.
    #[wasm_bindgen(js_name = focusSearchResult)]
    pub fn focus_search_result(&mut self, index: usize) -> bool {
        self.view.focus_search_result(index).is_some()
    }

    /// Whether there are unsaved edits.
    #[wasm_bindgen(js_name = isDirty)]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.view.is_dirty()
    }

    /// Record that the graph was saved.
    #[wasm_bindgen(js_name = markSaved)]
    pub fn mark_saved(&mut self) {
        self.view.mark_saved();
    }

    /// Take queued view events as a JSON array.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> String {
        serde_json::to_string(&self.view.drain_events()).unwrap_or_default()
    }
}
