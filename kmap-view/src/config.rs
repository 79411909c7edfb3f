//! Controller configuration.

use std::time::Duration;

use kmap_renderer::{ResourceCacheConfig, DEFAULT_DETAIL_THRESHOLD};
use serde::{Deserialize, Serialize};

/// Configuration for a [`CanvasGraphView`](crate::CanvasGraphView).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Zoom below which unselected shapes are simplified.
    pub detail_threshold: f64,
    /// How far from an edge line a point still hits it.
    pub edge_hit_tolerance: f64,
    /// Squared distance within which a missed edge is still picked.
    pub edge_candidate_distance_sq: f64,
    /// A node whose center is this close to the pointer wins immediately.
    pub node_snap_distance: f64,
    /// Screen margin kept around the graph by `zoom_to_fit`.
    pub zoom_to_fit_padding: f64,
    /// Zoom used when panning to a single node.
    pub pan_to_node_scale: f64,
    /// Minimum time between the starts of two renders.
    pub render_min_interval: Duration,
    /// Time one animation frame may spend drawing.
    pub frame_budget: Duration,
    /// Canvas fill color; `None` clears to transparent.
    pub background: Option<String>,
    /// Image cache settings.
    pub resource_cache: ResourceCacheConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            detail_threshold: DEFAULT_DETAIL_THRESHOLD,
            edge_hit_tolerance: 2.0,
            edge_candidate_distance_sq: 25.0,
            node_snap_distance: 6.0,
            zoom_to_fit_padding: 50.0,
            pan_to_node_scale: 2.0,
            render_min_interval: Duration::from_millis(15),
            frame_budget: Duration::from_millis(33),
            background: None,
            resource_cache: ResourceCacheConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ViewConfig =
            serde_json::from_str(r##"{"edge_hit_tolerance": 4.0, "background": "#fff"}"##)
                .unwrap();
        assert!((config.edge_hit_tolerance - 4.0).abs() < f64::EPSILON);
        assert_eq!(config.background.as_deref(), Some("#fff"));
        assert!((config.node_snap_distance - 6.0).abs() < f64::EPSILON);
        assert_eq!(config.frame_budget, Duration::from_millis(33));
    }
}
