//! Error types for filter compilation.

use thiserror::Error;

use super::lexer::LexerError;

/// A specialized Result type for filter compilation.
pub type FilterResult<T> = Result<T, FilterError>;

/// Broad category of a [`FilterError`].
///
/// Every category represents malformed caller input; callers usually map all
/// of them to a "bad request" response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input could not be tokenized.
    Lex,
    /// The tokens do not form a valid filter.
    Parse,
    /// An attribute or sort key could not be resolved to a column.
    Attribute,
    /// The expression is well-formed but cannot be rendered as SQL.
    Render,
}

/// Errors that can occur while compiling a filter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FilterError {
    /// The filter expression is empty.
    #[error("filter expression is empty")]
    EmptyExpression,

    /// The lexer rejected part of the input.
    #[error("{}", format_lexer_errors(.errors))]
    Lexical {
        /// Every problem found while tokenizing, in input order.
        errors: Vec<LexerError>,
    },

    /// An unexpected token was encountered during parsing.
    #[error("unexpected token {token} at position {position}")]
    UnexpectedToken {
        /// The unexpected token that was encountered.
        token: String,
        /// Byte offset of the token.
        position: usize,
    },

    /// An unexpected end of input was encountered.
    #[error("unexpected end of expression")]
    UnexpectedEndOfInput,

    /// An opening parenthesis was never closed.
    #[error("unclosed parenthesis opened at position {position}")]
    UnclosedParenthesis {
        /// Byte offset of the `(`.
        position: usize,
    },

    /// A word appeared where a comparison operator was expected.
    #[error("unknown operator '{operator}' at position {position}{}", suggestion_suffix(.suggestion))]
    UnknownOperator {
        /// The word that was found.
        operator: String,
        /// Byte offset of the word.
        position: usize,
        /// The closest known operator, if any is close enough.
        suggestion: Option<String>,
    },

    /// A comparison operator was not followed by a value.
    #[error("operator '{operator}' at position {position} requires a value")]
    MissingValue {
        /// The operator keyword.
        operator: String,
        /// Byte offset of the operator.
        position: usize,
    },

    /// Parentheses are nested deeper than the parser allows.
    #[error("parentheses nested deeper than {limit} levels at position {position}")]
    ExpressionTooDeep {
        /// Byte offset of the `(` that went over the limit.
        position: usize,
        /// The maximum nesting depth.
        limit: usize,
    },

    /// The filter chains more conditions than the parser allows.
    #[error("filter has more than {limit} and/or connectives (limit exceeded at position {position})")]
    TooManyConditions {
        /// Byte offset of the connective that went over the limit.
        position: usize,
        /// The maximum number of connectives.
        limit: usize,
    },

    /// The attribute is not in the configured allow-list.
    #[error("unknown attribute: {attribute}")]
    UnknownAttribute {
        /// The logical attribute path as written in the filter.
        attribute: String,
    },

    /// The attribute mapper produced something that is not a column name.
    #[error("attribute '{attribute}' maps to invalid column '{column}'")]
    InvalidColumn {
        /// The logical attribute path.
        attribute: String,
        /// The offending mapper output.
        column: String,
    },

    /// The sort key is not a valid attribute path.
    #[error("invalid sort attribute: {attribute}")]
    InvalidSortAttribute {
        /// The sort key as supplied.
        attribute: String,
    },

    /// The literal does not fit the column it is compared with.
    #[error("cannot compare {column} with {value}: expected {expected}")]
    TypeMismatch {
        /// The resolved column.
        column: String,
        /// The literal as written.
        value: String,
        /// What the column accepts.
        expected: &'static str,
    },

    /// The operator cannot be applied to this column or literal.
    #[error("operator '{operator}' is not supported for {column}")]
    UnsupportedOperator {
        /// The operator keyword.
        operator: String,
        /// The resolved column.
        column: String,
    },
}

impl FilterError {
    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>, position: usize) -> Self {
        FilterError::UnexpectedToken {
            token: token.into(),
            position,
        }
    }

    /// Creates an unknown attribute error.
    pub fn unknown_attribute(attribute: impl Into<String>) -> Self {
        FilterError::UnknownAttribute {
            attribute: attribute.into(),
        }
    }

    /// Creates an unsupported operator error.
    pub fn unsupported_operator(operator: impl Into<String>, column: impl Into<String>) -> Self {
        FilterError::UnsupportedOperator {
            operator: operator.into(),
            column: column.into(),
        }
    }

    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FilterError::Lexical { .. } => ErrorKind::Lex,
            FilterError::EmptyExpression
            | FilterError::UnexpectedToken { .. }
            | FilterError::UnexpectedEndOfInput
            | FilterError::UnclosedParenthesis { .. }
            | FilterError::UnknownOperator { .. }
            | FilterError::MissingValue { .. }
            | FilterError::ExpressionTooDeep { .. }
            | FilterError::TooManyConditions { .. } => ErrorKind::Parse,
            FilterError::UnknownAttribute { .. }
            | FilterError::InvalidColumn { .. }
            | FilterError::InvalidSortAttribute { .. } => ErrorKind::Attribute,
            FilterError::TypeMismatch { .. } | FilterError::UnsupportedOperator { .. } => {
                ErrorKind::Render
            }
        }
    }
}

/// Lexer errors shown in full before the rest are summarized.
const MAX_DISPLAYED_LEXER_ERRORS: usize = 10;

fn format_lexer_errors(errors: &[LexerError]) -> String {
    let mut message = errors
        .iter()
        .take(MAX_DISPLAYED_LEXER_ERRORS)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    if errors.len() > MAX_DISPLAYED_LEXER_ERRORS {
        message.push_str(&format!(
            "; and {} more",
            errors.len() - MAX_DISPLAYED_LEXER_ERRORS
        ));
    }
    message
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}
