//! Splicer CLI
//!
//! Headless access to the timeline engine: apply command lists to a document
//! and inspect capacity, snapping and active clips.

mod cli;
mod commands;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries command output, so logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!("splicer-cli v{}", env!("CARGO_PKG_VERSION"));

    let settings = commands::load_settings(cli.settings.as_deref())?;

    match cli.command {
        Commands::Apply {
            document,
            commands: command_file,
            output,
        } => commands::apply(&document, &command_file, output.as_deref(), &settings),
        Commands::Active { document, at, from } => commands::active(&document, at, from),
        Commands::Capacity {
            document,
            track,
            item,
            edge,
        } => commands::capacity(&document, &track, &item, edge.into()),
        Commands::Snap {
            document,
            raw,
            duration,
            zoom,
            playhead,
            exclude,
        } => commands::snap(&document, raw, duration, zoom, playhead, &exclude, &settings),
        Commands::Validate { document } => commands::validate(&document),
    }
}
