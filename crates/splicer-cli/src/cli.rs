//! Argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use splicer_core::{Edge, TimeUs};

/// Splicer timeline engine tools
#[derive(Parser, Debug)]
#[command(name = "splicer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Editor settings JSON file
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a JSON array of edit commands to a document
    Apply {
        /// Timeline document JSON
        #[arg(short, long)]
        document: PathBuf,

        /// JSON array of edit commands
        #[arg(short, long)]
        commands: PathBuf,

        /// Where to write the resulting document (stdout if absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the clips active at a playhead time
    Active {
        #[arg(short, long)]
        document: PathBuf,

        /// Playhead time in microseconds
        #[arg(long)]
        at: TimeUs,

        /// Previous playhead time; sweeps from here to `--at`
        #[arg(long)]
        from: Option<TimeUs>,
    },

    /// Show how long a transition on a clip edge may be
    Capacity {
        #[arg(short, long)]
        document: PathBuf,

        #[arg(long)]
        track: String,

        #[arg(long)]
        item: String,

        #[arg(long, value_enum)]
        edge: EdgeArg,
    },

    /// Snap a dragged item start against the document
    Snap {
        #[arg(short, long)]
        document: PathBuf,

        /// Raw start in microseconds
        #[arg(long, allow_hyphen_values = true)]
        raw: TimeUs,

        /// Duration of the dragged item in microseconds
        #[arg(long, default_value_t = 0)]
        duration: TimeUs,

        #[arg(long, default_value_t = 1.0)]
        zoom: f64,

        #[arg(long, default_value_t = 0)]
        playhead: TimeUs,

        /// Item ids that are being dragged and never act as targets
        #[arg(long)]
        exclude: Vec<String>,
    },

    /// Check a document against the model invariants
    Validate {
        #[arg(short, long)]
        document: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EdgeArg {
    Start,
    End,
}

impl From<EdgeArg> for Edge {
    fn from(edge: EdgeArg) -> Self {
        match edge {
            EdgeArg::Start => Edge::Start,
            EdgeArg::End => Edge::End,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capacity() {
        let cli = Cli::parse_from([
            "splicer", "capacity", "-d", "doc.json", "--track", "v1", "--item", "a", "--edge",
            "end",
        ]);
        match cli.command {
            Commands::Capacity { edge, track, .. } => {
                assert_eq!(edge, EdgeArg::End);
                assert_eq!(track, "v1");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "splicer", "validate", "-d", "doc.json", "-v", "--settings", "s.json",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.settings, Some(PathBuf::from("s.json")));
    }

    #[test]
    fn test_snap_accepts_negative_raw() {
        let cli = Cli::parse_from(["splicer", "snap", "-d", "doc.json", "--raw", "-5000"]);
        match cli.command {
            Commands::Snap { raw, zoom, .. } => {
                assert_eq!(raw, -5000);
                assert_eq!(zoom, 1.0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
