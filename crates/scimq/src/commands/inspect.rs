//! Tokens and parse command implementations.
//!
//! Show what the lexer and parser make of a filter without converting it.

use scim_query_rs::filter::{FilterError, Lexer};
use scim_query_rs::{FilterParser, Precedence};

use super::{CommandContext, Result};
use crate::output::{
    format_expression_json, format_expression_tree, format_tokens_json, format_tokens_table,
};

/// Executes the tokens command.
///
/// # Errors
///
/// Returns `FilterError::Lexical` if any part of the input cannot be
/// tokenized.
pub fn execute_tokens(ctx: &CommandContext, filter: &str) -> Result<()> {
    let lexed = Lexer::new(filter).tokenize_with_errors();
    if !lexed.errors.is_empty() {
        return Err(FilterError::Lexical {
            errors: lexed.errors,
        }
        .into());
    }

    if ctx.json_output {
        let output = format_tokens_json(&lexed.tokens)?;
        println!("{output}");
    } else if !ctx.quiet {
        let output = format_tokens_table(&lexed.tokens, ctx.use_colors);
        print!("{output}");
    }

    Ok(())
}

/// Executes the parse command.
///
/// # Errors
///
/// Returns an error if the filter does not parse.
pub fn execute_parse(ctx: &CommandContext, filter: &str, precedence: Precedence) -> Result<()> {
    let expr = FilterParser::parse_with(filter, precedence)?;

    if ctx.json_output {
        let output = format_expression_json(&expr)?;
        println!("{output}");
    } else if !ctx.quiet {
        let output = format_expression_tree(&expr, ctx.use_colors);
        print!("{output}");
    }

    Ok(())
}
