//! Logical attribute name to physical column name mapping.
//!
//! The compiler never decides on its own which column an attribute lives in;
//! it asks an [`AttributeNameMapper`]. Mappers must be deterministic and free
//! of side effects, since one instance is shared by every compile call.

use regex::{NoExpand, Regex};
use thiserror::Error;

/// Errors raised while building a mapper.
#[derive(Debug, Error)]
pub enum MapperError {
    /// A mapping pattern is not a valid regular expression.
    #[error("invalid attribute pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as supplied.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// Maps a logical attribute path to a physical column name.
pub trait AttributeNameMapper: Send + Sync {
    /// Returns the column for `attribute`, or `attribute` unchanged when no
    /// rule applies.
    fn map(&self, attribute: &str) -> String;
}

impl<F> AttributeNameMapper for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn map(&self, attribute: &str) -> String {
        self(attribute)
    }
}

/// A mapper that leaves every attribute unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl AttributeNameMapper for IdentityMapper {
    fn map(&self, attribute: &str) -> String {
        attribute.to_string()
    }
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    replacement: String,
}

/// A mapper driven by `pattern => replacement` rules.
///
/// Each pattern is a regular expression; every match inside the attribute
/// path is replaced by the literal replacement text. Rules run in the order
/// they were given, each one seeing the output of the previous.
///
/// # Example
///
/// ```
/// use scim_query_rs::{AttributeNameMapper, SimpleAttributeNameMapper};
///
/// let mapper = SimpleAttributeNameMapper::new([(r"emails\.value", "email")]).unwrap();
/// assert_eq!(mapper.map("emails.value"), "email");
/// assert_eq!(mapper.map("userName"), "userName");
/// assert_eq!(mapper.map_from_internal("email"), "emails.value");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimpleAttributeNameMapper {
    rules: Vec<Rule>,
}

impl SimpleAttributeNameMapper {
    /// Builds a mapper from `(pattern, replacement)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `MapperError::InvalidPattern` for the first pattern that does
    /// not compile.
    pub fn new<I, P, R>(rules: I) -> Result<Self, MapperError>
    where
        I: IntoIterator<Item = (P, R)>,
        P: AsRef<str>,
        R: Into<String>,
    {
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| {
                let pattern = pattern.as_ref();
                Regex::new(pattern)
                    .map(|regex| Rule {
                        pattern: regex,
                        replacement: replacement.into(),
                    })
                    .map_err(|source| MapperError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the mapper has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Maps a column name back to the logical attribute path.
    ///
    /// The reverse of a rule replaces the replacement text with the pattern
    /// stripped of its backslash escapes, so only plain escaped-literal
    /// patterns round-trip.
    pub fn map_from_internal(&self, column: &str) -> String {
        self.rules.iter().rev().fold(column.to_string(), |acc, rule| {
            if rule.replacement.is_empty() {
                return acc;
            }
            acc.replace(&rule.replacement, &rule.pattern.as_str().replace('\\', ""))
        })
    }
}

impl AttributeNameMapper for SimpleAttributeNameMapper {
    fn map(&self, attribute: &str) -> String {
        self.rules.iter().fold(attribute.to_string(), |acc, rule| {
            rule.pattern
                .replace_all(&acc, NoExpand(&rule.replacement))
                .into_owned()
        })
    }
}
