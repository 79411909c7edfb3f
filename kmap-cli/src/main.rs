//! # kmap
//!
//! Command-line host for knowledge maps.

use anyhow::Context;
use clap::Parser;
use kmap_cli::{CliArgs, CliConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = CliConfig::from(&args);

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kmap=info,kmap_cli=info,kmap_view=info,kmap_renderer=warn".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!(
        "Canvas {}x{}, json output: {}",
        config.width,
        config.height,
        config.json
    );

    let report = kmap_cli::run(&args.command, &config)
        .await
        .with_context(|| format!("kmap failed on {}", args.command.map().display()))?;

    if config.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        println!("{report}");
    }
    Ok(())
}
