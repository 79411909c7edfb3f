//! Subcommand implementations.
//!
//! Each subcommand produces a [`Report`] that prints either as text or as
//! JSON.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use kmap_core::{FindOptions, GraphEntity, UniversalGraph};
use kmap_renderer::{BoundingBox, DrawCommand, RecordingContext};
use kmap_view::CanvasGraphView;
use serde::Serialize;

use crate::map::MapSource;
use crate::{CliConfig, Command};

/// The outcome of one subcommand.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Report {
    /// Graph overview.
    Inspect {
        /// Node count.
        nodes: usize,
        /// Edge count.
        edges: usize,
        /// Nodes per label.
        labels: BTreeMap<String, usize>,
        /// Nodes showing an image.
        image_nodes: usize,
        /// Extent of the placed graph.
        bounds: Option<BoundingBox>,
    },
    /// A valid document.
    Validate {
        /// Node count.
        nodes: usize,
        /// Edge count.
        edges: usize,
    },
    /// Search matches.
    Find {
        /// Matching entities, nodes first.
        matches: Vec<EntitySummary>,
    },
    /// Hit test result.
    Hit {
        /// The point in graph coordinates.
        graph_x: f64,
        /// The point in graph coordinates.
        graph_y: f64,
        /// The entity under the point.
        entity: Option<EntitySummary>,
    },
    /// Render summary.
    Render {
        /// Recorded draw calls.
        commands: usize,
        /// Draw calls per operation.
        operations: BTreeMap<String, usize>,
        /// Images that finished loading before the render.
        images_loaded: u64,
        /// Every recorded draw call, if asked for.
        #[serde(skip_serializing_if = "Option::is_none")]
        trace: Option<Vec<DrawCommand>>,
    },
}

/// A node or edge, described for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    /// The entity.
    pub entity: GraphEntity,
    /// Node display name or edge description.
    pub text: String,
}

impl EntitySummary {
    fn describe(view: &CanvasGraphView, entity: GraphEntity) -> Self {
        let text = match &entity {
            GraphEntity::Node(hash) => view
                .get_node(hash)
                .map(|n| format!("{} ({})", n.display_name, n.label))
                .unwrap_or_default(),
            GraphEntity::Edge(id) => view.get_edge(*id).map(ToString::to_string).unwrap_or_default(),
        };
        Self { entity, text }
    }
}

impl fmt::Display for EntitySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.entity, self.text)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inspect {
                nodes,
                edges,
                labels,
                image_nodes,
                bounds,
            } => {
                writeln!(f, "nodes: {nodes}")?;
                writeln!(f, "edges: {edges}")?;
                writeln!(f, "image nodes: {image_nodes}")?;
                for (label, count) in labels {
                    writeln!(f, "  {label}: {count}")?;
                }
                match bounds {
                    Some(b) => write!(
                        f,
                        "bounds: ({:.1}, {:.1}) - ({:.1}, {:.1})",
                        b.min_x, b.min_y, b.max_x, b.max_y
                    ),
                    None => write!(f, "bounds: empty"),
                }
            }
            Self::Validate { nodes, edges } => {
                write!(f, "valid: {nodes} nodes, {edges} edges")
            }
            Self::Find { matches } => {
                write!(f, "{} matches", matches.len())?;
                for summary in matches {
                    write!(f, "\n{summary}")?;
                }
                Ok(())
            }
            Self::Hit {
                graph_x,
                graph_y,
                entity,
            } => {
                writeln!(f, "graph point: ({graph_x:.1}, {graph_y:.1})")?;
                match entity {
                    Some(summary) => write!(f, "hit: {summary}"),
                    None => write!(f, "hit: nothing"),
                }
            }
            Self::Render {
                commands,
                operations,
                images_loaded,
                ..
            } => {
                write!(f, "{commands} draw commands, {images_loaded} images loaded")?;
                for (op, count) in operations {
                    write!(f, "\n  {op}: {count}")?;
                }
                Ok(())
            }
        }
    }
}

/// Run a subcommand.
///
/// # Errors
///
/// Returns an error if the map cannot be loaded or is invalid.
pub async fn run(command: &Command, config: &CliConfig) -> Result<Report> {
    let source = MapSource::locate(command.map()).await?;
    tracing::debug!("Running {:?}", command);

    if let Command::Validate { .. } = command {
        return validate(&source).await;
    }

    let view_config = config.view_config().await?;
    let mut view = source
        .open_view(view_config, config.viewport())
        .await
        .with_context(|| format!("Failed to load {}", source.graph_path.display()))?;

    match command {
        Command::Inspect { .. } => Ok(inspect(&mut view)),
        Command::Validate { .. } => Ok(Report::Validate {
            nodes: view.node_count(),
            edges: view.edge_count(),
        }),
        Command::Find {
            terms,
            whole_word,
            wildcards,
            ..
        } => find(
            &view,
            terms,
            FindOptions {
                whole_word: *whole_word,
                keep_search_special_chars: *wildcards,
            },
        ),
        Command::Hit { x, y, .. } => Ok(hit(&mut view, *x, *y)),
        Command::Render {
            zoom_to_fit, trace, ..
        } => render(&mut view, config, *zoom_to_fit, *trace).await,
    }
}

async fn validate(source: &MapSource) -> Result<Report> {
    let json = source.read_graph().await?;
    let graph = UniversalGraph::from_json(&json)
        .with_context(|| format!("{} is not a valid map", source.graph_path.display()))?;
    Ok(Report::Validate {
        nodes: graph.nodes.len(),
        edges: graph.edges.len(),
    })
}

fn inspect(view: &mut CanvasGraphView) -> Report {
    let mut labels = BTreeMap::new();
    for node in &view.graph().nodes {
        *labels.entry(node.label.clone()).or_insert(0) += 1;
    }
    let image_nodes = view
        .graph()
        .nodes
        .iter()
        .filter(|n| n.image_id.is_some())
        .count();
    Report::Inspect {
        nodes: view.node_count(),
        edges: view.edge_count(),
        labels,
        image_nodes,
        bounds: view.graph_bounding_box(),
    }
}

fn find(view: &CanvasGraphView, terms: &[String], options: FindOptions) -> Result<Report> {
    let matches = view
        .find_matching(terms, options)
        .context("Invalid search terms")?
        .into_iter()
        .map(|entity| EntitySummary::describe(view, entity))
        .collect();
    Ok(Report::Find { matches })
}

fn hit(view: &mut CanvasGraphView, x: f64, y: f64) -> Report {
    let padding = view.config().zoom_to_fit_padding;
    view.zoom_to_fit(padding);
    let point = view.screen_to_graph(x, y);
    let entity = view
        .entity_at_position(point.x, point.y)
        .map(|entity| EntitySummary::describe(view, entity));
    Report::Hit {
        graph_x: point.x,
        graph_y: point.y,
        entity,
    }
}

async fn render(
    view: &mut CanvasGraphView,
    config: &CliConfig,
    zoom_to_fit: bool,
    trace: bool,
) -> Result<Report> {
    if zoom_to_fit {
        let padding = view.config().zoom_to_fit_padding;
        view.zoom_to_fit(padding);
    }
    let settled = view.settle_images().await;
    let images_loaded = view.images().stats().loaded;
    tracing::debug!("{} image fetches settled, {} loaded", settled, images_loaded);

    let mut ctx = RecordingContext::new();
    ctx.resize(config.width, config.height);
    view.render_now(&mut ctx);

    let mut operations = BTreeMap::new();
    for command in ctx.commands() {
        *operations.entry(operation_name(command)?).or_insert(0) += 1;
    }
    let commands = ctx.commands().len();
    Ok(Report::Render {
        commands,
        operations,
        images_loaded,
        trace: trace.then(|| ctx.take_commands()),
    })
}

/// The serialized tag of a draw command, e.g. `fill_text`.
fn operation_name(command: &DrawCommand) -> Result<String> {
    let value = serde_json::to_value(command)?;
    value
        .get("op")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .context("Draw command without an op tag")
}
