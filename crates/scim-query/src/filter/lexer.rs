//! Lexer (tokenizer) for filter expressions.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use chrono::{DateTime, Utc};

use super::ast::{ComparisonOp, NumberLiteral};

/// What went wrong at a given position of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexerErrorKind {
    /// A character that cannot start any token.
    UnexpectedCharacter(char),
    /// A string literal whose closing quote is missing.
    UnterminatedString,
    /// Text that starts like a number but does not parse as one.
    InvalidNumber(String),
}

/// Error encountered during lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub kind: LexerErrorKind,
    /// The position (0-indexed byte offset) where the error occurred.
    pub position: usize,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LexerErrorKind::UnexpectedCharacter(c) => {
                write!(f, "unexpected character '{}' at position {}", c, self.position)
            }
            LexerErrorKind::UnterminatedString => {
                write!(f, "unterminated string starting at position {}", self.position)
            }
            LexerErrorKind::InvalidNumber(text) => {
                write!(f, "invalid number '{}' at position {}", text, self.position)
            }
        }
    }
}

impl std::error::Error for LexerError {}

/// Result of tokenizing a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct LexerResult {
    /// The tokens successfully parsed, with their positions.
    pub tokens: Vec<PositionedToken>,
    /// Any errors encountered.
    pub errors: Vec<LexerError>,
}

/// A token with its position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken {
    /// The token.
    pub token: Token,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

/// A token in a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A dotted attribute path such as `emails.value`. Case is preserved.
    Identifier(String),

    /// A comparison operator keyword (`eq`, `co`, `pr`, ...).
    Operator(ComparisonOp),

    /// A double-quoted string, escapes decoded.
    Str(String),

    /// A quoted string that parses as an ISO-8601 instant.
    DateTime { raw: String, instant: DateTime<Utc> },

    /// An unquoted number.
    Number(NumberLiteral),

    /// `true` or `false`.
    Boolean(bool),

    /// The `and` connective.
    And,

    /// The `or` connective.
    Or,

    /// Opening parenthesis `(`.
    OpenParen,

    /// Closing parenthesis `)`.
    CloseParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "'{name}'"),
            Token::Operator(op) => write!(f, "'{op}'"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::DateTime { raw, .. } => write!(f, "{raw:?}"),
            Token::Number(n) => write!(f, "{n}"),
            Token::Boolean(b) => write!(f, "{b}"),
            Token::And => f.write_str("'and'"),
            Token::Or => f.write_str("'or'"),
            Token::OpenParen => f.write_str("'('"),
            Token::CloseParen => f.write_str("')'"),
        }
    }
}

/// Returns true when `c` may start an attribute path.
pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Returns true when `c` may continue an attribute path.
pub(crate) fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Lexer for tokenizing filter expressions.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    /// Current byte position in the input string.
    position: usize,
    /// Errors encountered during tokenization.
    errors: Vec<LexerError>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
            errors: Vec::new(),
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    /// Consumes and returns the next character, updating position.
    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            self.position += ch.len_utf8();
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.peek() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Reads an attribute path or keyword.
    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.peek() {
            if is_identifier_continue(c) {
                word.push(c);
                self.next_char();
            } else {
                break;
            }
        }
        word
    }

    /// Reads a double-quoted string. The opening quote has not been consumed.
    ///
    /// Only `\"` and `\\` are escapes; any other character, apostrophes
    /// included, is kept as written.
    fn read_quoted_string(&mut self, start: usize) -> Option<String> {
        self.next_char();

        let mut result = String::new();
        while let Some(c) = self.next_char() {
            match c {
                '"' => return Some(result),
                '\\' => match self.next_char() {
                    Some(escaped @ ('"' | '\\')) => result.push(escaped),
                    Some(other) => {
                        result.push('\\');
                        result.push(other);
                    }
                    None => break,
                },
                _ => result.push(c),
            }
        }

        self.errors.push(LexerError {
            kind: LexerErrorKind::UnterminatedString,
            position: start,
        });
        None
    }

    /// Reads an integer or decimal number, with optional sign and exponent.
    fn read_number(&mut self, start: usize) -> Option<NumberLiteral> {
        let mut text = String::new();
        if self.peek() == Some(&'-') {
            text.push('-');
            self.next_char();
        }
        self.push_digits(&mut text);

        let mut is_decimal = false;
        if self.peek() == Some(&'.') {
            is_decimal = true;
            text.push('.');
            self.next_char();
            self.push_digits(&mut text);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_decimal = true;
            text.push('e');
            self.next_char();
            if let Some(&sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.next_char();
            }
            self.push_digits(&mut text);
        }
        // Glued trailing word characters make the whole run invalid ("12ab").
        while let Some(&c) = self.peek() {
            if is_identifier_continue(c) {
                text.push(c);
                self.next_char();
            } else {
                break;
            }
        }

        let parsed = if is_decimal {
            if valid_decimal(&text) {
                text.parse::<f64>().ok().map(NumberLiteral::Decimal)
            } else {
                None
            }
        } else if let Ok(n) = text.parse::<i64>() {
            Some(NumberLiteral::Integer(n))
        } else if valid_decimal(&text) {
            // Integers beyond i64 still make sense as decimals.
            text.parse::<f64>().ok().map(NumberLiteral::Decimal)
        } else {
            None
        };

        if parsed.is_none() {
            self.errors.push(LexerError {
                kind: LexerErrorKind::InvalidNumber(text),
                position: start,
            });
        }
        parsed
    }

    fn push_digits(&mut self, text: &mut String) {
        while let Some(&c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Returns the next token with its position, or None if at end of input.
    ///
    /// Bad characters and malformed numbers are recorded in the error list
    /// and skipped.
    pub fn next_token(&mut self) -> Option<PositionedToken> {
        loop {
            self.skip_whitespace();

            let c = *self.peek()?;
            let token_start = self.position;

            let token = match c {
                '(' => {
                    self.next_char();
                    Token::OpenParen
                }
                ')' => {
                    self.next_char();
                    Token::CloseParen
                }

                '"' => {
                    let text = self.read_quoted_string(token_start)?;
                    match DateTime::parse_from_rfc3339(&text) {
                        Ok(instant) => Token::DateTime {
                            raw: text,
                            instant: instant.with_timezone(&Utc),
                        },
                        Err(_) => Token::Str(text),
                    }
                }

                _ if c.is_ascii_digit() || c == '-' => match self.read_number(token_start) {
                    Some(number) => Token::Number(number),
                    None => continue,
                },

                _ if is_identifier_start(c) => {
                    let word = self.read_word();
                    keyword_token(&word).unwrap_or(Token::Identifier(word))
                }

                // Unknown character - record error and keep going
                _ => {
                    let unknown_char = self.next_char()?;
                    self.errors.push(LexerError {
                        kind: LexerErrorKind::UnexpectedCharacter(unknown_char),
                        position: token_start,
                    });
                    continue;
                }
            };

            return Some(PositionedToken {
                token,
                position: token_start,
            });
        }
    }

    /// Collects all tokens and any errors encountered.
    ///
    /// Lexing does not stop at the first bad character, so callers can report
    /// every problem in the input at once.
    pub fn tokenize_with_errors(mut self) -> LexerResult {
        let mut tokens = Vec::new();
        while let Some(positioned_token) = self.next_token() {
            tokens.push(positioned_token);
        }
        LexerResult {
            tokens,
            errors: self.errors,
        }
    }

    /// Collects all tokens into a vector (without positions).
    #[cfg(test)]
    pub fn tokenize(self) -> Vec<Token> {
        self.tokenize_with_errors()
            .tokens
            .into_iter()
            .map(|pt| pt.token)
            .collect()
    }
}

/// Matches reserved words, ignoring case.
fn keyword_token(word: &str) -> Option<Token> {
    if let Some(op) = ComparisonOp::from_keyword(word) {
        return Some(Token::Operator(op));
    }
    match word.to_ascii_lowercase().as_str() {
        "and" => Some(Token::And),
        "or" => Some(Token::Or),
        "true" => Some(Token::Boolean(true)),
        "false" => Some(Token::Boolean(false)),
        _ => None,
    }
}

/// `-?digits(.digits)?(e[+-]?digits)?` with at least one digit in each part.
fn valid_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (mantissa, exponent) = match unsigned.split_once('e') {
        Some((m, e)) => (m, Some(e)),
        None => (unsigned, None),
    };
    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => {
            !int.is_empty()
                && int.chars().all(|c| c.is_ascii_digit())
                && !frac.is_empty()
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => !mantissa.is_empty() && mantissa.chars().all(|c| c.is_ascii_digit()),
    };
    let exponent_ok = exponent.map_or(true, |e| {
        let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
        !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
    });
    mantissa_ok && exponent_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(input: &str) -> Vec<LexerError> {
        Lexer::new(input).tokenize_with_errors().errors
    }

    #[test]
    fn test_tokenize_presence() {
        let tokens = Lexer::new("username pr").tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("username".to_string()),
                Token::Operator(ComparisonOp::Pr),
            ]
        );
    }

    #[test]
    fn test_tokenize_dotted_path() {
        let tokens = Lexer::new("emails.value co \".com\"").tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("emails.value".to_string()),
                Token::Operator(ComparisonOp::Co),
                Token::Str(".com".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_identifier_case_preserved() {
        let tokens = Lexer::new("USERNAME").tokenize();
        assert_eq!(tokens, vec![Token::Identifier("USERNAME".to_string())]);
    }

    #[test]
    fn test_tokenize_operators_case_insensitive() {
        for word in ["eq", "EQ", "Eq", "eQ"] {
            assert_eq!(
                Lexer::new(word).tokenize(),
                vec![Token::Operator(ComparisonOp::Eq)]
            );
        }
        assert_eq!(
            Lexer::new("PR").tokenize(),
            vec![Token::Operator(ComparisonOp::Pr)]
        );
    }

    #[test]
    fn test_tokenize_all_operators() {
        let tokens = Lexer::new("pr eq ne co sw ew gt ge lt le").tokenize();
        let expected: Vec<Token> = ComparisonOp::KEYWORDS
            .iter()
            .filter_map(|k| ComparisonOp::from_keyword(k))
            .map(Token::Operator)
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_tokenize_connectives_case_insensitive() {
        let tokens = Lexer::new("and AND Or or").tokenize();
        assert_eq!(tokens, vec![Token::And, Token::And, Token::Or, Token::Or]);
    }

    #[test]
    fn test_tokenize_booleans() {
        let tokens = Lexer::new("true FALSE").tokenize();
        assert_eq!(tokens, vec![Token::Boolean(true), Token::Boolean(false)]);
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(
            Lexer::new("0").tokenize(),
            vec![Token::Number(NumberLiteral::Integer(0))]
        );
        assert_eq!(
            Lexer::new("-42").tokenize(),
            vec![Token::Number(NumberLiteral::Integer(-42))]
        );
        assert_eq!(
            Lexer::new("3.25").tokenize(),
            vec![Token::Number(NumberLiteral::Decimal(3.25))]
        );
        assert_eq!(
            Lexer::new("1e3").tokenize(),
            vec![Token::Number(NumberLiteral::Decimal(1000.0))]
        );
    }

    #[test]
    fn test_tokenize_invalid_numbers() {
        let errs = errors("1.");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, LexerErrorKind::InvalidNumber("1.".to_string()));

        let errs = errors("version eq 12ab");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].position, 11);

        let errs = errors("-");
        assert_eq!(errs[0].kind, LexerErrorKind::InvalidNumber("-".to_string()));
    }

    #[test]
    fn test_tokenize_apostrophe_kept_verbatim() {
        let tokens = Lexer::new("\"marissa'@test.org\"").tokenize();
        assert_eq!(tokens, vec![Token::Str("marissa'@test.org".to_string())]);
    }

    #[test]
    fn test_tokenize_escaped_quote() {
        let tokens = Lexer::new(r#""say \"hi\" \\ \n""#).tokenize();
        assert_eq!(tokens, vec![Token::Str(r#"say "hi" \ \n"#.to_string())]);
    }

    #[test]
    fn test_tokenize_timestamp_string() {
        let tokens = Lexer::new("\"1970-01-01T00:00:00.000Z\"").tokenize();
        match &tokens[..] {
            [Token::DateTime { raw, instant }] => {
                assert_eq!(raw, "1970-01-01T00:00:00.000Z");
                assert_eq!(instant.timestamp(), 0);
            }
            other => panic!("Expected DateTime token, got {:?}", other),
        }
    }

    #[test]
    fn test_tokenize_date_without_time_is_string() {
        let tokens = Lexer::new("\"1970-01-01\"").tokenize();
        assert_eq!(tokens, vec![Token::Str("1970-01-01".to_string())]);
    }

    #[test]
    fn test_tokenize_parentheses() {
        let tokens = Lexer::new("(a pr)").tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::OpenParen,
                Token::Identifier("a".to_string()),
                Token::Operator(ComparisonOp::Pr),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn test_positions() {
        let result = Lexer::new("userName eq \"joe\"").tokenize_with_errors();
        let positions: Vec<usize> = result.tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 9, 12]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_unterminated_string() {
        let errs = errors("username eq \"joe");
        assert_eq!(
            errs,
            vec![LexerError {
                kind: LexerErrorKind::UnterminatedString,
                position: 12,
            }]
        );
    }

    #[test]
    fn test_unexpected_characters_collected() {
        let errs = errors("username $ eq 'joe'");
        let chars: Vec<_> = errs.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            chars,
            vec![
                LexerErrorKind::UnexpectedCharacter('$'),
                LexerErrorKind::UnexpectedCharacter('\''),
                LexerErrorKind::UnexpectedCharacter('\''),
            ]
        );
        assert_eq!(errs[0].position, 9);
    }

    #[test]
    fn test_long_run_of_bad_characters() {
        let input = "$".repeat(100_000);
        let result = Lexer::new(&input).tokenize_with_errors();
        assert!(result.tokens.is_empty());
        assert_eq!(result.errors.len(), 100_000);
        assert_eq!(result.errors[99_999].position, 99_999);
    }

    #[test]
    fn test_long_run_of_bad_numbers() {
        let input = "1x ".repeat(50_000) + "a";
        let result = Lexer::new(&input).tokenize_with_errors();
        assert_eq!(result.errors.len(), 50_000);
        assert_eq!(result.tokens.len(), 1);
        assert_eq!(result.tokens[0].token, Token::Identifier("a".to_string()));
    }

    #[test]
    fn test_error_display() {
        let err = LexerError {
            kind: LexerErrorKind::UnexpectedCharacter('$'),
            position: 6,
        };
        assert_eq!(err.to_string(), "unexpected character '$' at position 6");
    }
}
