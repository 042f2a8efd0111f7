//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the scimq CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// scimq - compile SCIM filters into parameterized SQL
#[derive(Parser, Debug)]
#[command(name = "scimq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file (default: ~/.config/scimq/config.toml)
    #[arg(long, global = true, env = "SCIMQ_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a filter into SQL and bound parameters
    #[command(alias = "c")]
    Convert {
        /// Filter expression (e.g., 'userName eq "joe"'); empty for sort only
        filter: Option<String>,

        /// Attribute to sort by
        #[arg(short, long)]
        sort_by: Option<String>,

        /// Sort descending instead of ascending
        #[arg(short, long)]
        descending: bool,

        /// Extra attribute mapping, applied after the configured ones (repeatable)
        #[arg(short, long = "map", value_name = "PATTERN=COLUMN", action = clap::ArgAction::Append)]
        mappings: Vec<String>,

        /// Override connective precedence
        #[arg(long, value_enum)]
        precedence: Option<PrecedenceArg>,
    },

    /// Show the tokens of a filter
    #[command(alias = "t")]
    Tokens {
        /// Filter expression
        filter: String,
    },

    /// Show the parsed syntax tree of a filter
    #[command(alias = "p")]
    Parse {
        /// Filter expression
        filter: String,

        /// Override connective precedence
        #[arg(long, value_enum)]
        precedence: Option<PrecedenceArg>,
    },

    /// View or create configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Show config file path
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Connective precedence choices
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrecedenceArg {
    /// `and` and `or` group in the order they appear
    LeftToRight,
    /// `and` binds tighter than `or`
    AndBindsTighter,
}

impl From<PrecedenceArg> for scim_query_rs::Precedence {
    fn from(arg: PrecedenceArg) -> Self {
        match arg {
            PrecedenceArg::LeftToRight => Self::LeftToRight,
            PrecedenceArg::AndBindsTighter => Self::AndBindsTighter,
        }
    }
}

/// Supported shells for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}
