//! # Knowledge Map CLI
//!
//! Command-line host for knowledge-map documents. It loads a map the same
//! way a browser host does, through [`kmap_view::CanvasGraphView`], and
//! reports on it without a window.
//!
//! ## Usage
//!
//! ```bash
//! kmap inspect maps/p53/
//! kmap find maps/p53/graph.json TP53 "cell cycle" --whole-word
//! kmap hit maps/p53/ 640 360
//! kmap --json render maps/p53/ --zoom-to-fit --trace
//! ```
//!
//! A map is either a directory holding `graph.json` and an optional
//! `images/` directory, or a path to a graph JSON file.
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Resolved settings: canvas size, output format, view config
//! - [`map`] - Locating and loading map documents and their images
//! - [`commands`] - One report type per subcommand

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod map;

pub use commands::{run, Report};
pub use map::{DirectoryImageProvider, MapLoadError, MapSource};

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kmap_view::ViewConfig;

/// Command-line arguments for kmap.
#[derive(Debug, Clone, Parser)]
#[command(name = "kmap")]
#[command(about = "Inspect, search, hit-test and render knowledge maps")]
#[command(version)]
pub struct CliArgs {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "KMAP_LOG_JSON")]
    pub log_json: bool,

    /// Print reports as JSON
    #[arg(long, global = true, env = "KMAP_JSON")]
    pub json: bool,

    /// Canvas width in pixels
    #[arg(long, global = true, default_value = "1280", env = "KMAP_WIDTH")]
    pub width: u32,

    /// Canvas height in pixels
    #[arg(long, global = true, default_value = "720", env = "KMAP_HEIGHT")]
    pub height: u32,

    /// View configuration file (JSON)
    #[arg(long, global = true, env = "KMAP_VIEW_CONFIG")]
    pub view_config: Option<PathBuf>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Count nodes and edges, list labels, report the graph bounds
    Inspect {
        /// Map directory or graph JSON file
        map: PathBuf,
    },

    /// Load and validate a map; exits non-zero if it is invalid
    Validate {
        /// Map directory or graph JSON file
        map: PathBuf,
    },

    /// List entities matching any of the search terms
    Find {
        /// Map directory or graph JSON file
        map: PathBuf,
        /// Search terms
        #[arg(required = true)]
        terms: Vec<String>,
        /// Match whole words only
        #[arg(long)]
        whole_word: bool,
        /// Treat `*` and `?` as wildcards
        #[arg(long)]
        wildcards: bool,
    },

    /// Report the entity under a screen point after zoom-to-fit
    Hit {
        /// Map directory or graph JSON file
        map: PathBuf,
        /// Screen X
        #[arg(allow_negative_numbers = true)]
        x: f64,
        /// Screen Y
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Render once into a command recorder and summarize the draw calls
    Render {
        /// Map directory or graph JSON file
        map: PathBuf,
        /// Fit the graph into the canvas first
        #[arg(long)]
        zoom_to_fit: bool,
        /// Include every recorded draw command
        #[arg(long)]
        trace: bool,
    },
}

impl Command {
    /// The map path the command operates on.
    #[must_use]
    pub fn map(&self) -> &PathBuf {
        match self {
            Self::Inspect { map }
            | Self::Validate { map }
            | Self::Find { map, .. }
            | Self::Hit { map, .. }
            | Self::Render { map, .. } => map,
        }
    }
}

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Print reports as JSON.
    pub json: bool,
    /// Emit logs as JSON lines.
    pub log_json: bool,
    /// View configuration file, read by [`CliConfig::view_config`].
    pub view_config_path: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CliConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: 1280,
            height: 720,
            json: false,
            log_json: false,
            view_config_path: None,
        }
    }

    /// Canvas size as floating point.
    #[must_use]
    pub fn viewport(&self) -> (f64, f64) {
        (f64::from(self.width), f64::from(self.height))
    }

    /// Load the view configuration, or the defaults if no file was given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn view_config(&self) -> Result<ViewConfig, MapLoadError> {
        let Some(path) = &self.view_config_path else {
            return Ok(ViewConfig::default());
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| MapLoadError::Io {
                path: path.clone(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|source| MapLoadError::Config {
            path: path.clone(),
            source,
        })
    }
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            width: args.width,
            height: args.height,
            json: args.json,
            log_json: args.log_json,
            view_config_path: args.view_config.clone(),
        }
    }
}
