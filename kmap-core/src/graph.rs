//! The persisted knowledge-map document.
//!
//! A map is a `UniversalGraph`: a list of nodes and a list of edges that
//! refer to nodes by their `hash`. Every struct here keeps the JSON members it
//! does not interpret in a flattened `extra` map, so loading and saving a
//! document never drops data written by another tool.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{MapError, MapResult};

/// Node labels whose primary visual is a text box rather than a shape.
pub const DETAIL_NODE_LABELS: [&str; 2] = ["note", "link"];

/// Check whether a node label is a detail type (note or link).
#[must_use]
pub fn is_detail_label(label: &str) -> bool {
    DETAIL_NODE_LABELS.contains(&label)
}

/// Whether a display name is just the node's label (e.g. a note called "Note").
#[must_use]
pub fn is_common_node_display_name(label: &str, display_name: &str) -> bool {
    label.to_lowercase() == display_name.to_lowercase()
}

/// A hyperlink attached to an entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Hyperlink {
    /// Target URL, possibly relative.
    pub url: String,
    /// Human readable domain or file name.
    #[serde(default)]
    pub domain: String,
    /// Members not interpreted by the engine.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// A source document an entity was taken from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Source {
    /// Reference type, e.g. "PROJECT_OBJECT".
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Source URL.
    pub url: String,
    /// Human readable domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Members not interpreted by the engine.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// A typed reference to an external record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reference {
    /// Reference type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Referenced identifier.
    pub id: String,
    /// Members not interpreted by the engine.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Free-form data shared by nodes and edges.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityData {
    /// External references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
    /// Hyperlinks shown in the info panel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlinks: Option<Vec<Hyperlink>>,
    /// Detail text (the body of a note).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Search links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<Vec<Hyperlink>>,
    /// Entity sub-type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Documents this entity came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    /// Members not interpreted by the engine.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl EntityData {
    /// Sources followed by hyperlinks, as `(url, domain)` pairs.
    pub fn links(&self) -> impl Iterator<Item = (&str, &str)> {
        let sources = self
            .sources
            .iter()
            .flatten()
            .map(|s| (s.url.as_str(), s.domain.as_deref().unwrap_or("")));
        let hyperlinks = self
            .hyperlinks
            .iter()
            .flatten()
            .map(|h| (h.url.as_str(), h.domain.as_str()));
        sources.chain(hyperlinks)
    }
}

/// Position, optional size and entity data of a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeData {
    /// Center X in graph coordinates.
    pub x: f64,
    /// Center Y in graph coordinates.
    pub y: f64,
    /// Fixed width, if the user resized the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Fixed height, if the user resized the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Shared entity data.
    #[serde(flatten)]
    pub entity: EntityData,
}

/// Style overrides for a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    /// Label font scale (1.0 = 16px).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size_scale: Option<f64>,
    /// Text color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    /// Border color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    /// Border line type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_type: Option<String>,
    /// Border width scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width_scale: Option<f64>,
    /// Show the detail text box instead of the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_detail: Option<bool>,
    /// Members not interpreted by the engine.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Style overrides for an edge.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    /// Label font scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size_scale: Option<f64>,
    /// Line color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    /// Line type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_type: Option<String>,
    /// Line width scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width_scale: Option<f64>,
    /// Head type at the source end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_head_type: Option<String>,
    /// Head type at the target end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_head_type: Option<String>,
    /// Members not interpreted by the engine.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Explicit icon descriptor for a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeIcon {
    /// Icon glyph code point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Icon color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Icon font face.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<String>,
    /// Icon size in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    /// Icon font weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    /// Members not interpreted by the engine.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// A node of the map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Node {
    /// Stable unique identity.
    pub hash: String,
    /// Semantic type, e.g. "gene", "note", "link".
    pub label: String,
    /// Text shown on the node.
    #[serde(default)]
    pub display_name: String,
    /// Secondary labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_labels: Option<Vec<String>>,
    /// Position, size and entity data.
    pub data: NodeData,
    /// Style overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<NodeStyle>,
    /// Explicit icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<NodeIcon>,
    /// Image resource identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// Legacy shape name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    /// Members not interpreted by the engine.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Create a node at the given position.
    #[must_use]
    pub fn new(
        hash: impl Into<String>,
        label: impl Into<String>,
        display_name: impl Into<String>,
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            hash: hash.into(),
            label: label.into(),
            display_name: display_name.into(),
            data: NodeData {
                x,
                y,
                ..NodeData::default()
            },
            ..Self::default()
        }
    }

    /// Set a fixed size.
    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.data.width = Some(width);
        self.data.height = Some(height);
        self
    }

    /// Set the detail text.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.data.entity.detail = Some(detail.into());
        self
    }

    /// Attach an image resource.
    #[must_use]
    pub fn with_image(mut self, image_id: impl Into<String>) -> Self {
        self.image_id = Some(image_id.into());
        self
    }

    /// Set the style overrides.
    #[must_use]
    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Append a hyperlink.
    #[must_use]
    pub fn with_hyperlink(mut self, url: impl Into<String>, domain: impl Into<String>) -> Self {
        self.data
            .entity
            .hyperlinks
            .get_or_insert_with(Vec::new)
            .push(Hyperlink {
                url: url.into(),
                domain: domain.into(),
                extra: Map::new(),
            });
        self
    }

    /// Center position.
    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        (self.data.x, self.data.y)
    }

    /// Lower-cased text used by find: display name and detail.
    #[must_use]
    pub fn search_text(&self) -> String {
        let detail = self.data.entity.detail.as_deref().unwrap_or("");
        format!("{} {}", self.display_name, detail).to_lowercase()
    }

    /// Whether the style asks for the detail text box.
    #[must_use]
    pub fn shows_detail(&self) -> bool {
        self.style
            .as_ref()
            .and_then(|s| s.show_detail)
            .unwrap_or(false)
    }
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Edge {
    /// Relationship label, drawn at the middle of the line.
    #[serde(default)]
    pub label: String,
    /// Source node hash.
    pub from: String,
    /// Target node hash.
    pub to: String,
    /// Entity data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EntityData>,
    /// Style overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
    /// Members not interpreted by the engine.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Edge {
    /// Create an edge.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            from: from.into(),
            to: to.into(),
            ..Self::default()
        }
    }

    /// Set the style overrides.
    #[must_use]
    pub fn with_style(mut self, style: EdgeStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Whether this edge touches the given node.
    #[must_use]
    pub fn touches(&self, hash: &str) -> bool {
        self.from == hash || self.to == hash
    }

    /// Lower-cased text used by find: label and detail.
    #[must_use]
    pub fn search_text(&self) -> String {
        let detail = self
            .data
            .as_ref()
            .and_then(|d| d.detail.as_deref())
            .unwrap_or("");
        format!("{} {}", self.label, detail).to_lowercase()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from, self.label, self.to)
    }
}

/// Identifier the view assigns to a live edge. Never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge#{}", self.0)
    }
}

/// A reference to a node or edge of the live graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum GraphEntity {
    /// A node, by hash.
    Node(String),
    /// An edge, by view-local id.
    Edge(EdgeId),
}

impl GraphEntity {
    /// The node hash, if this is a node.
    #[must_use]
    pub fn as_node(&self) -> Option<&str> {
        match self {
            Self::Node(hash) => Some(hash),
            Self::Edge(_) => None,
        }
    }

    /// The edge id, if this is an edge.
    #[must_use]
    pub fn as_edge(&self) -> Option<EdgeId> {
        match self {
            Self::Node(_) => None,
            Self::Edge(id) => Some(*id),
        }
    }
}

impl fmt::Display for GraphEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(hash) => write!(f, "node {hash}"),
            Self::Edge(id) => write!(f, "{id}"),
        }
    }
}

/// The persisted map document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UniversalGraph {
    /// All nodes, in drawing order.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// All edges, in drawing order.
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Members not interpreted by the engine.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl UniversalGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a graph document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the graph is inconsistent.
    pub fn from_json(json: &str) -> MapResult<Self> {
        let graph: Self = serde_json::from_str(json)?;
        graph.validate()?;
        Ok(graph)
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> MapResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> MapResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that node hashes are unique and every edge endpoint exists.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> MapResult<()> {
        let mut hashes = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !hashes.insert(node.hash.as_str()) {
                return Err(MapError::DuplicateNode(node.hash.clone()));
            }
        }
        for edge in &self.edges {
            if !hashes.contains(edge.from.as_str()) || !hashes.contains(edge.to.as_str()) {
                return Err(MapError::MissingEndpoint {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                });
            }
        }
        Ok(())
    }

    /// Get a node by hash.
    #[must_use]
    pub fn node(&self, hash: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.hash == hash)
    }

    /// Get the index of a node by hash.
    #[must_use]
    pub fn node_index(&self, hash: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.hash == hash)
    }

    /// Edges touching a node.
    pub fn edges_of<'a>(&'a self, hash: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(hash))
    }

    /// Check whether the graph has no nodes and no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}
