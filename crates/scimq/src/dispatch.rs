//! Command dispatch module for routing CLI commands to their handlers.

use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::commands::config::get_config_path;
use crate::commands::convert::ConvertOptions;
use crate::commands::{self, CommandContext, CommandError, Result};

/// Locates the config file. Only commands that read config call this.
fn config_path(cli: &Cli) -> Result<PathBuf> {
    let path = get_config_path(cli.config.as_deref())?;
    tracing::debug!(path = %path.display(), "using config file");
    Ok(path)
}

/// Runs the command selected on the command line.
pub fn dispatch(cli: &Cli, ctx: &CommandContext) -> Result<()> {
    match &cli.command {
        Some(Commands::Convert {
            filter,
            sort_by,
            descending,
            mappings,
            precedence,
        }) => {
            let opts = ConvertOptions {
                filter: filter.clone(),
                sort_by: sort_by.clone(),
                descending: *descending,
                mappings: mappings.clone(),
                precedence: precedence.map(Into::into),
            };
            commands::convert::execute(ctx, &opts, &config_path(cli)?)
        }
        Some(Commands::Tokens { filter }) => commands::inspect::execute_tokens(ctx, filter),
        Some(Commands::Parse { filter, precedence }) => {
            // Without an explicit flag, parse the way convert would
            let precedence = match precedence {
                Some(p) => (*p).into(),
                None => commands::config::load_config(&config_path(cli)?)?.converter.precedence,
            };
            commands::inspect::execute_parse(ctx, filter, precedence)
        }
        Some(Commands::Config { command }) => dispatch_config(ctx, command, &config_path(cli)?),
        Some(Commands::Completions { shell }) => {
            commands::completions::execute(shell).map_err(CommandError::Io)
        }
        None => {
            if !ctx.quiet {
                println!("scimq - compile SCIM filters into parameterized SQL");
                println!("Use --help for usage information");
            }
            Ok(())
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(
    ctx: &CommandContext,
    command: &Option<ConfigCommands>,
    path: &Path,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx, path),
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx, path),
        Some(ConfigCommands::Init { force }) => commands::config::execute_init(ctx, path, *force),
    }
}
