use std::path::PathBuf;

use clap::Parser;

use crate::application::data::{ColorChoice, LogLevel};

/// Builds an in-memory file tree from a manifest and prints its listing.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// YAML manifest describing the tree
    pub manifest: PathBuf,
    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Report kind and size of a path after the tree is built
    #[clap(long = "stat", short = 's', value_name = "PATH")]
    pub stat_paths: Vec<String>,

    #[clap(long, default_value = "auto", value_enum)]
    pub color: ColorChoice,
}
