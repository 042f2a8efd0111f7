//! Filter expression lexer and parser for SCIM filter syntax.
//!
//! This module turns the text of a SCIM-style filter into a
//! [`FilterExpression`] tree. Rendering the tree as SQL lives in
//! [`crate::render`].
//!
//! # Supported Syntax
//!
//! ## Attribute paths
//! - `userName`, `emails.value`, `meta.created` - dotted paths, case preserved
//!
//! ## Operators (case-insensitive)
//! - `pr` - attribute is present
//! - `eq`, `ne` - equal, not equal
//! - `co`, `sw`, `ew` - contains, starts with, ends with
//! - `gt`, `ge`, `lt`, `le` - ordering comparisons
//!
//! ## Values
//! - `"text"` - double-quoted strings; `\"` and `\\` are the only escapes
//! - `"2024-01-01T00:00:00Z"` - quoted ISO-8601 instants
//! - `42`, `-1.5` - numbers
//! - `true`, `false` - booleans
//!
//! ## Boolean Operators
//! - `and`, `or` - case-insensitive, see [`Precedence`] for grouping
//! - `()` - Grouping
//!
//! # Example
//!
//! ```
//! use scim_query_rs::filter::{ComparisonOp, FilterExpression, FilterParser, Literal};
//!
//! let filter = FilterParser::parse("userName EQ \"joe\"").unwrap();
//! assert_eq!(
//!     filter,
//!     FilterExpression::compare("userName", ComparisonOp::Eq, Literal::String("joe".into()))
//! );
//! ```

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::{ComparisonOp, FilterExpression, Literal, LogicalOp, NumberLiteral};
pub use error::{ErrorKind, FilterError, FilterResult};
pub use lexer::{Lexer, LexerError, LexerErrorKind, LexerResult, PositionedToken, Token};
pub use parser::{FilterParser, Precedence, MAX_CONNECTIVES, MAX_NESTING_DEPTH};

pub(crate) use lexer::{is_identifier_continue, is_identifier_start};
