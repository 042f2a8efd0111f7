//! Command handlers for the scimq CLI.
//!
//! Every handler takes a [`CommandContext`] and prints its own output, as a
//! table or as JSON.

pub mod completions;
pub mod config;
pub mod convert;
pub mod inspect;

use crate::cli::Cli;

/// Anything a command can fail with.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The filter or sort key was rejected.
    #[error("filter error: {0}")]
    Filter(#[from] scim_query_rs::FilterError),

    /// A mapping pattern did not compile.
    #[error("mapping error: {0}")]
    Mapping(#[from] scim_query_rs::MapperError),

    /// Config file could not be located, read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// Output settings shared by all commands.
pub struct CommandContext {
    /// Print JSON instead of tables.
    pub json_output: bool,
    /// Colorize table output.
    pub use_colors: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl CommandContext {
    /// Builds the context from global flags. `NO_COLOR` also disables colors.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && std::env::var_os("NO_COLOR").is_none(),
            quiet: cli.quiet,
        }
    }
}
