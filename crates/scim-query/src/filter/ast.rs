//! Abstract Syntax Tree (AST) for filter expressions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A comparison operator of the filter language.
///
/// Operator keywords are case-insensitive in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOp {
    /// `pr` - attribute is present (non-null). Takes no value.
    Pr,
    /// `eq` - equal.
    Eq,
    /// `ne` - not equal.
    Ne,
    /// `co` - contains.
    Co,
    /// `sw` - starts with.
    Sw,
    /// `ew` - ends with.
    Ew,
    /// `gt` - greater than.
    Gt,
    /// `ge` - greater than or equal.
    Ge,
    /// `lt` - less than.
    Lt,
    /// `le` - less than or equal.
    Le,
}

impl ComparisonOp {
    /// Every operator keyword, in the order they are documented.
    pub const KEYWORDS: [&'static str; 10] =
        ["pr", "eq", "ne", "co", "sw", "ew", "gt", "ge", "lt", "le"];

    /// Looks up an operator by keyword, ignoring case.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "pr" => Some(Self::Pr),
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "co" => Some(Self::Co),
            "sw" => Some(Self::Sw),
            "ew" => Some(Self::Ew),
            "gt" => Some(Self::Gt),
            "ge" => Some(Self::Ge),
            "lt" => Some(Self::Lt),
            "le" => Some(Self::Le),
            _ => None,
        }
    }

    /// The canonical (lowercase) keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Pr => "pr",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Co => "co",
            Self::Sw => "sw",
            Self::Ew => "ew",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
        }
    }

    /// Whether the operator is one of the `LIKE`-based string matches.
    pub fn is_pattern_match(self) -> bool {
        matches!(self, Self::Co | Self::Sw | Self::Ew)
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A boolean connective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    /// The SQL keyword for this connective.
    pub fn sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// A numeric literal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NumberLiteral {
    Integer(i64),
    Decimal(f64),
}

impl fmt::Display for NumberLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Decimal(n) => write!(f, "{n}"),
        }
    }
}

/// A literal value on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Literal {
    String(String),
    Number(NumberLiteral),
    Boolean(bool),
    /// A quoted string that reads as an ISO-8601 instant.
    ///
    /// The raw text is kept so the literal can still be compared as a plain
    /// string when the column turns out not to be a timestamp.
    Timestamp {
        raw: String,
        instant: DateTime<Utc>,
    },
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Timestamp { raw, .. } => write!(f, "{raw:?}"),
        }
    }
}

/// A parsed filter expression.
///
/// The tree is built once by the parser and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilterExpression {
    /// `attribute pr`
    Presence { attribute: String },

    /// `attribute op value`
    Comparison {
        attribute: String,
        op: ComparisonOp,
        value: Literal,
    },

    /// `left and right` / `left or right`
    Logical {
        op: LogicalOp,
        left: Box<FilterExpression>,
        right: Box<FilterExpression>,
    },
}

impl FilterExpression {
    /// Creates a presence test.
    pub fn present(attribute: impl Into<String>) -> Self {
        FilterExpression::Presence {
            attribute: attribute.into(),
        }
    }

    /// Creates a comparison.
    ///
    /// # Example
    ///
    /// ```
    /// use scim_query_rs::filter::{ComparisonOp, FilterExpression, Literal};
    ///
    /// let expr = FilterExpression::compare("userName", ComparisonOp::Eq, Literal::String("joe".into()));
    /// assert!(matches!(expr, FilterExpression::Comparison { .. }));
    /// ```
    pub fn compare(attribute: impl Into<String>, op: ComparisonOp, value: Literal) -> Self {
        FilterExpression::Comparison {
            attribute: attribute.into(),
            op,
            value,
        }
    }

    /// Creates an AND node from two expressions.
    pub fn and(left: FilterExpression, right: FilterExpression) -> Self {
        Self::logical(LogicalOp::And, left, right)
    }

    /// Creates an OR node from two expressions.
    pub fn or(left: FilterExpression, right: FilterExpression) -> Self {
        Self::logical(LogicalOp::Or, left, right)
    }

    /// Creates a logical node with the given connective.
    pub fn logical(op: LogicalOp, left: FilterExpression, right: FilterExpression) -> Self {
        FilterExpression::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Number of literal values the expression will bind when rendered.
    pub fn literal_count(&self) -> usize {
        match self {
            FilterExpression::Presence { .. } => 0,
            FilterExpression::Comparison { .. } => 1,
            FilterExpression::Logical { left, right, .. } => {
                left.literal_count() + right.literal_count()
            }
        }
    }
}
