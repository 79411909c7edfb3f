//! Entity lists (selection, highlighting) that report what to invalidate.

use std::collections::HashSet;

use crate::graph::GraphEntity;

/// Result of updating an [`EntityList`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityListChange {
    /// Entities that entered or left the list; their placed shapes are stale.
    pub invalidated: Vec<GraphEntity>,
    /// Whether the set of entities differs from before.
    pub changed: bool,
}

/// An ordered list of entities where membership affects rendering.
///
/// Placed shapes depend on whether an entity is selected or highlighted, so
/// every update reports exactly which entities need re-placement.
#[derive(Debug, Clone, Default)]
pub struct EntityList {
    items: Vec<GraphEntity>,
}

impl EntityList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents.
    pub fn replace(&mut self, items: Vec<GraphEntity>) -> EntityListChange {
        let mut previous: HashSet<&GraphEntity> = self.items.iter().collect();
        let mut invalidated = Vec::new();

        for item in &items {
            if !previous.remove(item) {
                invalidated.push(item.clone());
            }
        }
        invalidated.extend(previous.into_iter().cloned());

        let new_set: HashSet<&GraphEntity> = items.iter().collect();
        let old_set: HashSet<&GraphEntity> = self.items.iter().collect();
        let changed = new_set != old_set;

        self.items = items;
        EntityListChange {
            invalidated,
            changed,
        }
    }

    /// Add entities not already present.
    pub fn add(&mut self, items: impl IntoIterator<Item = GraphEntity>) -> EntityListChange {
        let mut next = self.items.clone();
        for item in items {
            if !next.contains(&item) {
                next.push(item);
            }
        }
        self.replace(next)
    }

    /// Remove one entity.
    pub fn remove(&mut self, item: &GraphEntity) -> EntityListChange {
        let next = self.items.iter().filter(|i| *i != item).cloned().collect();
        self.replace(next)
    }

    /// Remove everything.
    pub fn clear(&mut self) -> EntityListChange {
        self.replace(Vec::new())
    }

    /// Current contents in insertion order.
    #[must_use]
    pub fn get(&self) -> &[GraphEntity] {
        &self.items
    }

    /// Check membership.
    #[must_use]
    pub fn contains(&self, item: &GraphEntity) -> bool {
        self.items.contains(item)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop entities that no longer exist, without reporting a change.
    pub fn retain(&mut self, mut keep: impl FnMut(&GraphEntity) -> bool) -> bool {
        let before = self.items.len();
        self.items.retain(|item| keep(item));
        before != self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeId;

    fn node(hash: &str) -> GraphEntity {
        GraphEntity::Node(hash.to_string())
    }

    #[test]
    fn test_replace_reports_added_and_removed() {
        let mut list = EntityList::new();
        list.replace(vec![node("a"), node("b")]);

        let change = list.replace(vec![node("b"), GraphEntity::Edge(EdgeId(1))]);
        assert!(change.changed);
        assert_eq!(change.invalidated.len(), 2);
        assert!(change.invalidated.contains(&node("a")));
        assert!(change.invalidated.contains(&GraphEntity::Edge(EdgeId(1))));
    }

    #[test]
    fn test_reorder_is_not_a_change() {
        let mut list = EntityList::new();
        list.replace(vec![node("a"), node("b")]);
        let change = list.replace(vec![node("b"), node("a")]);
        assert!(!change.changed);
        assert!(change.invalidated.is_empty());
        assert_eq!(list.get(), &[node("b"), node("a")]);
    }

    #[test]
    fn test_add_skips_duplicates() {
        let mut list = EntityList::new();
        list.add([node("a")]);
        let change = list.add([node("a"), node("c")]);
        assert_eq!(change.invalidated, vec![node("c")]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut list = EntityList::new();
        list.add([node("a"), node("b")]);
        let change = list.remove(&node("a"));
        assert_eq!(change.invalidated, vec![node("a")]);
        assert!(list.contains(&node("b")));
        let change = list.clear();
        assert!(change.changed);
        assert!(list.is_empty());
    }

    #[test]
    fn test_retain() {
        let mut list = EntityList::new();
        list.add([node("a"), node("b")]);
        assert!(list.retain(|e| e.as_node() != Some("a")));
        assert_eq!(list.get(), &[node("b")]);
    }
}
