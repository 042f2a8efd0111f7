//! Token and syntax tree output formatting.

use owo_colors::OwoColorize;
use serde::Serialize;

use scim_query_rs::filter::{FilterExpression, PositionedToken, Token};

/// JSON output structure for a single token.
#[derive(Serialize)]
pub struct TokenOutput {
    pub position: usize,
    pub kind: &'static str,
    pub text: String,
}

/// JSON output structure for the tokens command.
#[derive(Serialize)]
pub struct TokensOutput {
    pub tokens: Vec<TokenOutput>,
}

/// Formats a token stream as JSON.
pub fn format_tokens_json(tokens: &[PositionedToken]) -> Result<String, serde_json::Error> {
    let output = TokensOutput {
        tokens: tokens
            .iter()
            .map(|t| TokenOutput {
                position: t.position,
                kind: token_kind(&t.token),
                text: token_text(&t.token),
            })
            .collect(),
    };

    serde_json::to_string_pretty(&output)
}

/// Formats a token stream as a table.
pub fn format_tokens_table(tokens: &[PositionedToken], use_colors: bool) -> String {
    if tokens.is_empty() {
        return "No tokens.\n".to_string();
    }

    let mut output = String::new();

    let header = format!("{:<5} {:<11} {}", "Pos", "Kind", "Token");
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for t in tokens {
        let kind = format!("{:<11}", token_kind(&t.token));
        let kind = if use_colors {
            kind.cyan().to_string()
        } else {
            kind
        };
        output.push_str(&format!("{:<5} {} {}\n", t.position, kind, token_text(&t.token)));
    }

    output
}

/// Formats a syntax tree as JSON.
pub fn format_expression_json(expr: &FilterExpression) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(expr)
}

/// Formats a syntax tree as an indented outline, one node per line.
pub fn format_expression_tree(expr: &FilterExpression, use_colors: bool) -> String {
    let mut output = String::new();
    write_node(&mut output, expr, 0, use_colors);
    output
}

fn write_node(output: &mut String, expr: &FilterExpression, depth: usize, use_colors: bool) {
    let indent = "  ".repeat(depth);
    match expr {
        FilterExpression::Presence { attribute } => {
            output.push_str(&format!("{indent}{attribute} pr\n"));
        }
        FilterExpression::Comparison {
            attribute,
            op,
            value,
        } => {
            output.push_str(&format!("{indent}{attribute} {op} {value}\n"));
        }
        FilterExpression::Logical { op, left, right } => {
            if use_colors {
                output.push_str(&format!("{indent}{}\n", op.sql().yellow().bold()));
            } else {
                output.push_str(&format!("{indent}{}\n", op.sql()));
            }
            write_node(output, left, depth + 1, use_colors);
            write_node(output, right, depth + 1, use_colors);
        }
    }
}

fn token_kind(token: &Token) -> &'static str {
    match token {
        Token::Identifier(_) => "identifier",
        Token::Operator(_) => "operator",
        Token::Str(_) => "string",
        Token::DateTime { .. } => "datetime",
        Token::Number(_) => "number",
        Token::Boolean(_) => "boolean",
        Token::And | Token::Or => "connective",
        Token::OpenParen | Token::CloseParen => "paren",
    }
}

/// Token text without the quoting used in error messages.
fn token_text(token: &Token) -> String {
    match token {
        Token::Identifier(name) => name.clone(),
        Token::Operator(op) => op.keyword().to_string(),
        Token::And => "and".to_string(),
        Token::Or => "or".to_string(),
        Token::OpenParen => "(".to_string(),
        Token::CloseParen => ")".to_string(),
        other => other.to_string(),
    }
}
