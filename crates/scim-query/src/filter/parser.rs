//! Recursive descent parser for filter expressions.

use serde::{Deserialize, Serialize};
use strsim::levenshtein;

use super::ast::{ComparisonOp, FilterExpression, Literal, LogicalOp};
use super::error::{FilterError, FilterResult};
use super::lexer::{Lexer, PositionedToken, Token};

/// Maximum Levenshtein distance for suggesting an operator keyword.
///
/// Operators are two letters long, so anything further away matches
/// every keyword equally badly.
const MAX_SUGGESTION_DISTANCE: usize = 1;

/// Deepest parenthesis nesting accepted.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Most `and`/`or` connectives accepted in one filter.
///
/// Every connective adds a level to the tree, so this also bounds the depth
/// the renderer walks.
pub const MAX_CONNECTIVES: usize = 256;

/// How `and` and `or` bind when both appear without parentheses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precedence {
    /// `and` and `or` have equal precedence and group left to right:
    /// `a or b and c` is `((a or b) and c)`.
    #[default]
    LeftToRight,
    /// Standard boolean precedence: `a or b and c` is `(a or (b and c))`.
    AndBindsTighter,
}

/// Parser for SCIM filter expressions.
///
/// # Grammar
///
/// ```text
/// expr       ::= term (("and" | "or") term)*
/// term       ::= presence | comparison | "(" expr ")"
/// presence   ::= IDENT "pr"
/// comparison ::= IDENT OPERATOR literal
/// literal    ::= STRING | NUMBER | "true" | "false"
/// ```
///
/// Under [`Precedence::AndBindsTighter`] the `expr` rule splits into the
/// usual `or_expr ::= and_expr ("or" and_expr)*` and
/// `and_expr ::= term ("and" term)*`.
///
/// # Example
///
/// ```
/// use scim_query_rs::filter::{FilterExpression, FilterParser};
///
/// let filter = FilterParser::parse("username pr").unwrap();
/// assert_eq!(filter, FilterExpression::present("username"));
///
/// let filter = FilterParser::parse("username pr and active eq true").unwrap();
/// assert!(matches!(filter, FilterExpression::Logical { .. }));
/// ```
pub struct FilterParser {
    tokens: Vec<PositionedToken>,
    position: usize,
    precedence: Precedence,
    depth: usize,
    connectives: usize,
}

impl FilterParser {
    /// Parses a filter expression with left-to-right connective grouping.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::EmptyExpression` if the input is blank,
    /// `FilterError::Lexical` if it cannot be tokenized, and one of the parse
    /// variants if the tokens do not form a filter. Input nested deeper than
    /// [`MAX_NESTING_DEPTH`] or chaining more than [`MAX_CONNECTIVES`]
    /// connectives is rejected before any tree is built for it.
    pub fn parse(input: &str) -> FilterResult<FilterExpression> {
        Self::parse_with(input, Precedence::default())
    }

    /// Parses a filter expression with the given connective precedence.
    pub fn parse_with(input: &str, precedence: Precedence) -> FilterResult<FilterExpression> {
        if input.trim().is_empty() {
            return Err(FilterError::EmptyExpression);
        }

        let lexed = Lexer::new(input).tokenize_with_errors();
        if !lexed.errors.is_empty() {
            return Err(FilterError::Lexical {
                errors: lexed.errors,
            });
        }
        if lexed.tokens.is_empty() {
            return Err(FilterError::EmptyExpression);
        }
        tracing::trace!(tokens = lexed.tokens.len(), "tokenized filter");

        let mut parser = Self {
            tokens: lexed.tokens,
            position: 0,
            precedence,
            depth: 0,
            connectives: 0,
        };
        let filter = parser.parse_expression()?;

        // Check that we consumed all tokens
        if let Some(remaining) = parser.tokens.get(parser.position) {
            return Err(FilterError::unexpected_token(
                remaining.token.to_string(),
                remaining.position,
            ));
        }

        Ok(filter)
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|t| &t.token)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Option<PositionedToken> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Consumes the current token if it is one of the accepted connectives.
    fn advance_connective(&mut self, accept: &[LogicalOp]) -> FilterResult<Option<LogicalOp>> {
        let (op, position) = match self.tokens.get(self.position) {
            Some(PositionedToken {
                token: Token::And,
                position,
            }) => (LogicalOp::And, *position),
            Some(PositionedToken {
                token: Token::Or,
                position,
            }) => (LogicalOp::Or, *position),
            _ => return Ok(None),
        };
        if !accept.contains(&op) {
            return Ok(None);
        }

        self.connectives += 1;
        if self.connectives > MAX_CONNECTIVES {
            return Err(FilterError::TooManyConditions {
                position,
                limit: MAX_CONNECTIVES,
            });
        }
        self.position += 1;
        Ok(Some(op))
    }

    fn parse_expression(&mut self) -> FilterResult<FilterExpression> {
        match self.precedence {
            Precedence::LeftToRight => self.parse_chain(),
            Precedence::AndBindsTighter => self.parse_or_expr(),
        }
    }

    /// Parses `term (("and" | "or") term)*`, folding to the left.
    fn parse_chain(&mut self) -> FilterResult<FilterExpression> {
        let mut left = self.parse_term()?;

        while let Some(op) = self.advance_connective(&[LogicalOp::And, LogicalOp::Or])? {
            let right = self.parse_term()?;
            left = FilterExpression::logical(op, left, right);
        }

        Ok(left)
    }

    /// Parses OR expressions: `and_expr ("or" and_expr)*`
    fn parse_or_expr(&mut self) -> FilterResult<FilterExpression> {
        let mut left = self.parse_and_expr()?;

        while self.advance_connective(&[LogicalOp::Or])?.is_some() {
            let right = self.parse_and_expr()?;
            left = FilterExpression::or(left, right);
        }

        Ok(left)
    }

    /// Parses AND expressions: `term ("and" term)*`
    fn parse_and_expr(&mut self) -> FilterResult<FilterExpression> {
        let mut left = self.parse_term()?;

        while self.advance_connective(&[LogicalOp::And])?.is_some() {
            let right = self.parse_term()?;
            left = FilterExpression::and(left, right);
        }

        Ok(left)
    }

    /// Parses `"(" expr ")" | IDENT "pr" | IDENT OPERATOR literal`
    fn parse_term(&mut self) -> FilterResult<FilterExpression> {
        let PositionedToken { token, position } =
            self.advance().ok_or(FilterError::UnexpectedEndOfInput)?;

        match token {
            Token::OpenParen => {
                if self.depth >= MAX_NESTING_DEPTH {
                    return Err(FilterError::ExpressionTooDeep {
                        position,
                        limit: MAX_NESTING_DEPTH,
                    });
                }
                self.depth += 1;
                let inner = self.parse_expression()?;
                self.depth -= 1;
                if self.peek() != Some(&Token::CloseParen) {
                    return Err(FilterError::UnclosedParenthesis { position });
                }
                self.advance(); // consume ')'
                Ok(inner)
            }
            Token::Identifier(attribute) => self.parse_attribute_test(attribute),
            other => Err(FilterError::unexpected_token(other.to_string(), position)),
        }
    }

    /// Parses whatever follows an attribute path.
    fn parse_attribute_test(&mut self, attribute: String) -> FilterResult<FilterExpression> {
        let PositionedToken { token, position } =
            self.advance().ok_or(FilterError::UnexpectedEndOfInput)?;

        let op = match token {
            Token::Operator(ComparisonOp::Pr) => return Ok(FilterExpression::present(attribute)),
            Token::Operator(op) => op,
            Token::Identifier(word) => {
                let suggestion = suggest_operator(&word);
                return Err(FilterError::UnknownOperator {
                    operator: word,
                    position,
                    suggestion,
                });
            }
            other => return Err(FilterError::unexpected_token(other.to_string(), position)),
        };

        let missing_value = || FilterError::MissingValue {
            operator: op.keyword().to_string(),
            position,
        };
        let Some(PositionedToken {
            token: value_token,
            position: value_position,
        }) = self.advance()
        else {
            return Err(missing_value());
        };

        let value = match value_token {
            Token::Str(s) => Literal::String(s),
            Token::DateTime { raw, instant } => Literal::Timestamp { raw, instant },
            Token::Number(n) => Literal::Number(n),
            Token::Boolean(b) => Literal::Boolean(b),
            Token::And | Token::Or | Token::CloseParen => return Err(missing_value()),
            other => {
                return Err(FilterError::unexpected_token(
                    other.to_string(),
                    value_position,
                ))
            }
        };

        Ok(FilterExpression::compare(attribute, op, value))
    }
}

/// Finds the operator keyword closest to a misspelled one.
fn suggest_operator(word: &str) -> Option<String> {
    let word_lower = word.to_ascii_lowercase();

    let (best_match, best_distance) = ComparisonOp::KEYWORDS
        .iter()
        .map(|keyword| (*keyword, levenshtein(&word_lower, keyword)))
        .min_by_key(|(_, d)| *d)?;

    if best_distance > 0 && best_distance <= MAX_SUGGESTION_DISTANCE {
        Some(best_match.to_string())
    } else {
        None
    }
}
