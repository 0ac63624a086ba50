//! CLI command definitions.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Load a resource and print every tree change as a JSON line
    Load(LoadArgs),

    /// Show the stored tree and freshness metadata of a resource
    Inspect {
        /// Resource URL
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
    },

    /// Remove the stored tree and metadata of a resource
    Clear {
        /// Resource URL
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
    },

    /// List the available strategies
    Strategies,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args)]
pub struct LoadArgs {
    /// Resource URL
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Strategy name (defaults to the configured one)
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Extra request header as `name: value`
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// JSON file holding a tree to show if the primary phase fails
    #[arg(long)]
    pub fallback: Option<PathBuf>,

    /// Do not emit the loading placeholder
    #[arg(long)]
    pub no_loading: bool,

    /// Do not emit the error placeholder
    #[arg(long)]
    pub no_error: bool,

    /// Do not persist fetched trees
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}
