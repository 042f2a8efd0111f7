//! Output formatting utilities for the scimq CLI.
//!
//! This module provides functions for formatting data as tables or JSON.
//! It is organized into submodules by what is being shown:
//!
//! - [`sql`] - Converted SQL and bound parameters
//! - [`syntax`] - Token streams and syntax trees

mod sql;
mod syntax;

pub use sql::{format_processed_filter_json, format_processed_filter_table};
pub use syntax::{
    format_expression_json, format_expression_tree, format_tokens_json, format_tokens_table,
};
