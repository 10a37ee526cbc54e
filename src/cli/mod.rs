//! Command-line interface
//!
//! Thin argument layer: flags are parsed here and translated into a
//! [`CollectorConfig`](crate::collector::CollectorConfig); all behavior
//! lives in the library modules.

pub mod collect;
pub mod resources;

use clap::{Parser, Subcommand};

/// Resilient collector for Quran verses, translations and tafsirs.
#[derive(Debug, Parser)]
#[command(name = "quran-collect", version, about)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Collect verses into a JSONL file
    Collect(collect::CollectArgs),
    /// List available translation or tafsir resources
    Resources(resources::ResourcesArgs),
}
