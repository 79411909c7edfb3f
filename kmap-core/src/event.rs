//! Input events consumed by the view and notifications it emits.

use serde::{Deserialize, Serialize};

use crate::graph::GraphEntity;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed or finger down.
    Down,
    /// Pointer moved.
    Move,
    /// Button released or finger up.
    Up,
}

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Shift key.
    pub shift: bool,
    /// Control key.
    pub ctrl: bool,
    /// Alt/option key.
    pub alt: bool,
    /// Meta/command key.
    pub meta: bool,
}

/// A pointer event in screen (canvas element) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// X position in screen pixels.
    pub x: f64,
    /// Y position in screen pixels.
    pub y: f64,
    /// Modifier keys.
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Create a pointer event without modifiers.
    #[must_use]
    pub fn new(phase: PointerPhase, x: f64, y: f64) -> Self {
        Self {
            phase,
            x,
            y,
            modifiers: Modifiers::default(),
        }
    }

    /// Pointer pressed.
    #[must_use]
    pub fn down(x: f64, y: f64) -> Self {
        Self::new(PointerPhase::Down, x, y)
    }

    /// Pointer moved.
    #[must_use]
    pub fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerPhase::Move, x, y)
    }

    /// Pointer released.
    #[must_use]
    pub fn up(x: f64, y: f64) -> Self {
        Self::new(PointerPhase::Up, x, y)
    }

    /// Set the modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Notifications from the view to its host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ViewEvent {
    /// The selection changed.
    SelectionChanged(Vec<GraphEntity>),
    /// The highlighted entities changed.
    HighlightChanged(Vec<GraphEntity>),
    /// An action was executed, undone or redone.
    HistoryChanged {
        /// Whether the document has unsaved edits.
        dirty: bool,
        /// Whether undo is available.
        can_undo: bool,
        /// Whether redo is available.
        can_redo: bool,
    },
    /// An entity is being dragged; position in graph coordinates.
    EntityDragged {
        /// The dragged entity.
        entity: GraphEntity,
        /// Graph X.
        x: f64,
        /// Graph Y.
        y: f64,
    },
    /// Dragged entities were dropped; position in graph coordinates.
    EntityDropped {
        /// The dropped entities.
        entities: Vec<GraphEntity>,
        /// Graph X.
        x: f64,
        /// Graph Y.
        y: f64,
    },
    /// The view wants to be redrawn on the next animation frame.
    RenderRequested,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_constructors() {
        let event = PointerEvent::down(1.0, 2.0).with_modifiers(Modifiers {
            shift: true,
            ..Modifiers::default()
        });
        assert_eq!(event.phase, PointerPhase::Down);
        assert!(event.modifiers.shift);
        assert_eq!(PointerEvent::up(0.0, 0.0).phase, PointerPhase::Up);
    }

    #[test]
    fn test_view_event_serialization() {
        let event = ViewEvent::HistoryChanged {
            dirty: true,
            can_undo: true,
            can_redo: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "history_changed");
        assert_eq!(json["data"]["dirty"], true);
    }

    #[test]
    fn test_pointer_event_deserialization_defaults() {
        let event: PointerEvent =
            serde_json::from_str(r#"{"phase": "move", "x": 3.0, "y": 4.0}"#).unwrap();
        assert_eq!(event.phase, PointerPhase::Move);
        assert_eq!(event.modifiers, Modifiers::default());
    }
}
