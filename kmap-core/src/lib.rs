//! # Knowledge Map Core
//!
//! Document model and editing logic for knowledge maps, independent of any
//! drawing surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  kmap-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Document          │  Editing               │
//! │  - UniversalGraph  │  - GraphAction         │
//! │  - Node / Edge     │  - CompoundAction      │
//! │  - lossless JSON   │  - History (undo/redo) │
//! ├─────────────────────────────────────────────┤
//! │  Interaction       │  Search                │
//! │  - PointerEvent    │  - compile_find        │
//! │  - ViewEvent       │  - tokenize_query      │
//! │  - DropPayload     │  - EntityList          │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod error;
pub mod event;
pub mod find;
pub mod graph;
pub mod history;
pub mod payload;
pub mod selection;

pub use action::{
    CompoundAction, EdgeCreation, EdgeDeletion, EdgeUpdate, GraphAction, GraphActionReceiver,
    GraphRestore, NodeCreation, NodeDeletion, NodeMove, NodeUpdate, RemovedNode,
};
pub use error::{MapError, MapResult};
pub use event::{Modifiers, PointerEvent, PointerPhase, ViewEvent};
pub use find::{compile_find, tokenize_query, FindOptions, Matcher};
pub use graph::{
    is_common_node_display_name, is_detail_label, Edge, EdgeId, EdgeStyle, EntityData,
    GraphEntity, Hyperlink, Node, NodeData, NodeIcon, NodeStyle, Reference, Source,
    UniversalGraph, DETAIL_NODE_LABELS,
};
pub use history::{History, HistoryChange};
pub use payload::{
    new_node_hash, DropPayload, NodeTemplate, Relationship, NODE_MIME_TYPE,
    RELATIONSHIP_MIME_TYPE,
};
pub use selection::{EntityList, EntityListChange};

/// Knowledge map core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
