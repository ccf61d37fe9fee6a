mod animation;
mod app;
mod config;
mod graph;
mod navigation;
mod network;
mod physics;
mod util;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Neighbor graph endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Public key to open on; the upstream picks its own node when omitted
    #[arg(long)]
    focus: Option<String>,

    #[arg(long)]
    neighbor_level: Option<u32>,

    #[arg(long)]
    max_neighbors: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(neighbor_level) = self.neighbor_level {
            config.neighbor_level = neighbor_level;
        }
        if let Some(max_neighbors) = self.max_neighbors {
            config.max_neighbors = max_neighbors;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let focus = args.focus.unwrap_or_default();
    eframe::run_native(
        "peer-orbit",
        options,
        Box::new(move |cc| Ok(Box::new(app::PeerOrbitApp::new(cc, config, focus)))),
    )
    .map_err(|error| anyhow::anyhow!("viewer exited with an error: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let args = Args::parse_from([
            "peer-orbit",
            "--endpoint",
            "http://example.test/graph",
            "--max-neighbors",
            "30",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.endpoint, "http://example.test/graph");
        assert_eq!(config.max_neighbors, 30);
        assert_eq!(config.neighbor_level, Config::default().neighbor_level);
        assert!(!args.verbose);
    }
}
