//! Converted filter output formatting.

use owo_colors::OwoColorize;
use serde::Serialize;

use scim_query_rs::{ParamValue, ParameterSet, ProcessedFilter};

/// JSON output structure for the convert command.
#[derive(Serialize)]
pub struct ProcessedFilterOutput<'a> {
    pub sql: &'a str,
    pub params: &'a ParameterSet,
}

/// Formats a converted filter as JSON.
pub fn format_processed_filter_json(filter: &ProcessedFilter) -> Result<String, serde_json::Error> {
    let output = ProcessedFilterOutput {
        sql: filter.sql(),
        params: filter.params(),
    };

    serde_json::to_string_pretty(&output)
}

/// Formats a converted filter as the SQL text followed by a parameter table.
pub fn format_processed_filter_table(filter: &ProcessedFilter, use_colors: bool) -> String {
    let mut output = String::new();

    let sql = if filter.sql().is_empty() {
        "(empty)"
    } else {
        filter.sql()
    };
    if use_colors {
        output.push_str(&format!("{}\n", sql.green()));
    } else {
        output.push_str(sql);
        output.push('\n');
    }

    if filter.params().is_empty() {
        return output;
    }

    output.push('\n');
    let header = format!("{:<12} {:<10} {}", "Name", "Type", "Value");
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for (name, value) in filter.params().iter() {
        let name = if use_colors {
            format!("{:<12}", name).cyan().to_string()
        } else {
            format!("{:<12}", name)
        };
        output.push_str(&format!("{} {:<10} {}\n", name, param_type(value), value));
    }

    output
}

/// Short type label for a bound value.
fn param_type(value: &ParamValue) -> &'static str {
    match value {
        ParamValue::Text(_) => "text",
        ParamValue::Integer(_) => "integer",
        ParamValue::Decimal(_) => "decimal",
        ParamValue::Boolean(_) => "boolean",
        ParamValue::Timestamp(_) => "timestamp",
    }
}
