//! Convert command implementation.
//!
//! Compiles a filter into SQL with the converter built from the config file.

use std::path::Path;

use scim_query_rs::Precedence;

use super::config::load_config;
use super::{CommandContext, Result};
use crate::output::{format_processed_filter_json, format_processed_filter_table};

/// Options for the convert command.
#[derive(Debug, Default)]
pub struct ConvertOptions {
    /// Filter expression; `None` or blank for sort only.
    pub filter: Option<String>,
    /// Attribute to sort by.
    pub sort_by: Option<String>,
    /// Sort descending.
    pub descending: bool,
    /// Extra `PATTERN=COLUMN` mappings.
    pub mappings: Vec<String>,
    /// Precedence override.
    pub precedence: Option<Precedence>,
}

/// Executes the convert command.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded, a mapping is invalid,
/// or the filter does not compile.
pub fn execute(ctx: &CommandContext, opts: &ConvertOptions, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let converter = config.build_converter(&opts.mappings, opts.precedence)?;

    let filter = converter.convert(
        opts.filter.as_deref(),
        opts.sort_by.as_deref(),
        !opts.descending,
    )?;

    if ctx.json_output {
        let output = format_processed_filter_json(&filter)?;
        println!("{output}");
    } else if !ctx.quiet {
        let output = format_processed_filter_table(&filter, ctx.use_colors);
        print!("{output}");
    }

    Ok(())
}
