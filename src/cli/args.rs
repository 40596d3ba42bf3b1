//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::config::Profile;

/// Fetch bill-of-materials trees from a BOM API and render them as node-link diagrams
#[derive(Parser, Debug)]
#[command(name = "bomviz")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory holding a local .bomviz.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Deployment profile; resets the canvas to its preset
    #[arg(long, global = true, value_enum)]
    pub profile: Option<Profile>,

    /// BOM API base URL
    #[arg(long, global = true, value_hint = ValueHint::Url)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a BOM tree as SVG
    Draw {
        /// BOM complexity (simple, moderate, complex, part)
        #[arg(required_unless_present = "input")]
        complexity: Option<String>,

        /// Output SVG file (default: configured output)
        #[arg(short, long, value_hint = ValueHint::FilePath, conflicts_with = "stdout")]
        output: Option<PathBuf>,

        /// Write the SVG to stdout
        #[arg(long)]
        stdout: bool,

        /// Read the BOM tree from a JSON file instead of the API
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
    },

    /// Print a BOM tree to the terminal
    Tree {
        /// BOM complexity
        #[arg(required_unless_present = "input")]
        complexity: Option<String>,

        /// Read the BOM tree from a JSON file instead of the API
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
    },

    /// Print run times per work center
    Routing {
        /// BOM complexity
        complexity: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
