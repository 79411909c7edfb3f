//! Drag-and-drop payload contracts.
//!
//! Other panels of the application (search results, document viewers, the
//! entity palette) put these payloads on a drag, and the view's drop handler
//! turns them into graph edits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph::{Edge, EntityData, Node, NodeData, NodeStyle};
use crate::{MapError, MapResult};

/// MIME type carrying a JSON [`NodeTemplate`].
pub const NODE_MIME_TYPE: &str = "application/lifelike-node";

/// MIME type carrying a JSON [`Relationship`].
pub const RELATIONSHIP_MIME_TYPE: &str = "application/lifelike-relationship";

/// Create a fresh, unique node hash.
#[must_use]
pub fn new_node_hash() -> String {
    Uuid::new_v4().to_string()
}

/// A partial node dragged in from elsewhere; it has no hash or position yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeTemplate {
    /// Text shown on the node.
    #[serde(default)]
    pub display_name: String,
    /// Semantic type.
    pub label: String,
    /// Secondary labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_labels: Option<Vec<String>>,
    /// Entity data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EntityData>,
    /// Style overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<NodeStyle>,
}

impl NodeTemplate {
    /// Materialize the template as a node centered at `(x, y)`.
    #[must_use]
    pub fn into_node(self, hash: impl Into<String>, x: f64, y: f64) -> Node {
        Node {
            hash: hash.into(),
            label: self.label,
            display_name: self.display_name,
            sub_labels: self.sub_labels,
            data: NodeData {
                x,
                y,
                width: None,
                height: None,
                entity: self.data.unwrap_or_default(),
            },
            style: self.style,
            ..Node::default()
        }
    }
}

/// Two nodes and the edge between them, e.g. dragged from a graph search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Source node.
    pub node1: Node,
    /// Target node.
    pub node2: Node,
    /// The edge from `node1` to `node2`.
    pub edge: Edge,
}

/// A decoded drop payload.
#[derive(Debug, Clone, PartialEq)]
pub enum DropPayload {
    /// A single node to create.
    Node(NodeTemplate),
    /// A relationship triple to create.
    Relationship(Box<Relationship>),
}

impl DropPayload {
    /// Decode a payload for one of the supported MIME types.
    ///
    /// # Errors
    ///
    /// Returns an error if the MIME type is unsupported or the JSON does not
    /// match the contract.
    pub fn parse(mime: &str, data: &str) -> MapResult<Self> {
        match mime {
            NODE_MIME_TYPE => Ok(Self::Node(serde_json::from_str(data).map_err(|e| {
                MapError::Payload(format!("{NODE_MIME_TYPE}: {e}"))
            })?)),
            RELATIONSHIP_MIME_TYPE => {
                let relationship: Relationship = serde_json::from_str(data)
                    .map_err(|e| MapError::Payload(format!("{RELATIONSHIP_MIME_TYPE}: {e}")))?;
                Ok(Self::Relationship(Box::new(relationship)))
            }
            other => Err(MapError::Payload(format!("unsupported type {other}"))),
        }
    }

    /// Pick the first supported payload from `(mime, data)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if no pair has a supported MIME type, or the first
    /// supported one cannot be decoded.
    pub fn from_transfer<'a>(
        items: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> MapResult<Self> {
        for (mime, data) in items {
            if mime == NODE_MIME_TYPE || mime == RELATIONSHIP_MIME_TYPE {
                return Self::parse(mime, data);
            }
        }
        Err(MapError::Payload("no supported data type".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_template() {
        let json = r#"{"display_name": "BRCA1", "label": "gene", "sub_labels": [],
                       "data": {"hyperlinks": [{"url": "https://x.org", "domain": "x"}]}}"#;
        let payload = DropPayload::parse(NODE_MIME_TYPE, json).unwrap();
        let DropPayload::Node(template) = payload else {
            panic!("expected node payload");
        };
        let node = template.into_node("h1", 10.0, 20.0);
        assert_eq!(node.hash, "h1");
        assert_eq!(node.position(), (10.0, 20.0));
        assert_eq!(node.label, "gene");
        assert_eq!(node.data.entity.hyperlinks.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_relationship() {
        let json = r#"{
            "node1": {"hash": "a", "label": "gene", "display_name": "A", "data": {"x": 0, "y": 0}},
            "node2": {"hash": "b", "label": "disease", "display_name": "B", "data": {"x": 0, "y": 0}},
            "edge": {"label": "associated", "from": "a", "to": "b"}
        }"#;
        let DropPayload::Relationship(rel) = DropPayload::parse(RELATIONSHIP_MIME_TYPE, json).unwrap()
        else {
            panic!("expected relationship payload");
        };
        assert_eq!(rel.edge.from, "a");
        assert_eq!(rel.node2.label, "disease");
    }

    #[test]
    fn test_bad_payloads() {
        assert!(matches!(
            DropPayload::parse("text/plain", "hi"),
            Err(MapError::Payload(_))
        ));
        assert!(matches!(
            DropPayload::parse(NODE_MIME_TYPE, "{"),
            Err(MapError::Payload(_))
        ));
    }

    #[test]
    fn test_from_transfer_skips_unknown_types() {
        let payload = DropPayload::from_transfer([
            ("text/uri-list", "https://example.org"),
            (NODE_MIME_TYPE, r#"{"label": "note", "display_name": "N"}"#),
        ])
        .unwrap();
        assert!(matches!(payload, DropPayload::Node(_)));
    }

    #[test]
    fn test_new_node_hash_unique() {
        assert_ne!(new_node_hash(), new_node_hash());
    }
}
