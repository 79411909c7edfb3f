//! Render styles: the policy that turns graph entities into placed shapes.
//!
//! ```text
//!   Node ──┐                          ┌─ Detail  → RectangleNode (text box)
//!          ├─ RenderStyle::place_node ┼─ Icon    → FontIconNode
//!          │                          ├─ Image   → ImageNode
//!          │                          └─ Plain   → RectangleNode (label)
//!   Edge ──┴─ RenderStyle::place_edge ─────────── → LineEdge
//! ```

pub mod backdrop;
mod knowledge_map;
pub mod palette;

use std::fmt;

use kmap_core::{Edge, Node};
use serde::{Deserialize, Serialize};

use crate::backend::TextMeasurer;
use crate::placed::{LineEdge, PlacedNode};

pub use knowledge_map::KnowledgeMapStyle;

/// Style settings shared by every placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// CSS font family for labels.
    pub font_family: String,
    /// Label font size before the per-entity scale.
    pub base_font_size: f64,
    /// Base size of line heads.
    pub line_end_base_size: f64,
    /// Text wrap width for nodes without an explicit width.
    pub max_width_if_unsized: f64,
    /// Label wrap width below icons.
    pub max_icon_node_width_if_unsized: f64,
    /// Text height limit for nodes without an explicit height.
    pub max_height_if_unsized: f64,
    /// Glyph size for icon nodes without an explicit size.
    pub default_icon_size: f64,
    /// Whether notes and links show their detail text unless told otherwise.
    pub show_detail_by_default: bool,
    /// Base for resolving relative hyperlinks.
    pub base_url: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_family: "Roboto, \"Helvetica Neue\", sans-serif".to_string(),
            base_font_size: 16.0,
            line_end_base_size: 16.0,
            max_width_if_unsized: 400.0,
            max_icon_node_width_if_unsized: 200.0,
            max_height_if_unsized: 400.0,
            default_icon_size: 50.0,
            show_detail_by_default: false,
            base_url: "https://localhost/".to_string(),
        }
    }
}

/// Selection state of the entity being placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementOptions {
    /// The entity is selected.
    pub selected: bool,
    /// The entity is highlighted.
    pub highlighted: bool,
}

impl PlacementOptions {
    /// Selected or highlighted entities keep full detail at any zoom.
    #[must_use]
    pub fn force_high_detail(self) -> bool {
        self.selected || self.highlighted
    }
}

/// Which shape a node is drawn as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape<'a> {
    /// A note or link showing its detail text in a bordered box.
    Detail,
    /// A glyph above the label.
    Icon(IconGlyph),
    /// An embedded bitmap.
    Image {
        /// Resource id of the bitmap.
        image_id: &'a str,
    },
    /// A rounded box around the label.
    Plain,
}

/// A resolved icon glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconGlyph {
    /// Glyph code point.
    pub code: &'static str,
    /// Brand color that replaces the node color, for known file types.
    pub special_color: Option<&'static str>,
}

impl IconGlyph {
    /// A glyph drawn in the node's own color.
    #[must_use]
    pub const fn plain(code: &'static str) -> Self {
        Self {
            code,
            special_color: None,
        }
    }
}

/// Both ends of an edge being placed.
#[derive(Debug, Clone, Copy)]
pub struct EdgeEnds<'a> {
    /// Source node.
    pub from: &'a Node,
    /// Target node.
    pub to: &'a Node,
    /// Placed source node.
    pub placed_from: &'a PlacedNode,
    /// Placed target node.
    pub placed_to: &'a PlacedNode,
}

/// Builds placed shapes from graph entities.
pub trait RenderStyle: fmt::Debug {
    /// Place a node.
    fn place_node(
        &self,
        node: &Node,
        measurer: &dyn TextMeasurer,
        options: PlacementOptions,
    ) -> PlacedNode;

    /// Place an edge between two already placed nodes.
    fn place_edge(
        &self,
        edge: &Edge,
        ends: EdgeEnds<'_>,
        measurer: &dyn TextMeasurer,
        options: PlacementOptions,
    ) -> LineEdge;
}
