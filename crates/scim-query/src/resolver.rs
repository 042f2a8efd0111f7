//! Attribute resolution: logical path to physical column plus column type.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::filter::{is_identifier_continue, is_identifier_start, FilterError, FilterResult};
use crate::mapper::AttributeNameMapper;

/// The storage type of a column, as far as rendering cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// String column, compared case-insensitively.
    Text,
    /// Integer column (`version`).
    Integer,
    /// Timestamp column (`created`, `lastModified`).
    Timestamp,
}

impl ColumnKind {
    /// Typed columns are never case-folded.
    pub fn is_typed(self) -> bool {
        !matches!(self, ColumnKind::Text)
    }
}

/// Built-in `meta.*` attributes and the typed columns they live in.
const TYPED_COLUMNS: [(&str, &str, ColumnKind); 3] = [
    ("meta.version", "version", ColumnKind::Integer),
    ("meta.created", "created", ColumnKind::Timestamp),
    ("meta.lastModified", "lastModified", ColumnKind::Timestamp),
];

/// A resolved attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttribute {
    /// The physical column name, safe to splice into SQL.
    pub column: String,
    /// How values compared against the column are rendered.
    pub kind: ColumnKind,
}

/// Resolves attribute paths through a mapper.
///
/// The resolver is immutable after construction and can be shared between
/// threads.
#[derive(Clone)]
pub struct AttributeResolver {
    mapper: Arc<dyn AttributeNameMapper>,
    allowed_columns: Option<BTreeSet<String>>,
}

impl fmt::Debug for AttributeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeResolver")
            .field("allowed_columns", &self.allowed_columns)
            .finish_non_exhaustive()
    }
}

impl AttributeResolver {
    /// Creates a resolver that passes unmapped attributes through.
    pub fn new(mapper: Arc<dyn AttributeNameMapper>) -> Self {
        Self {
            mapper,
            allowed_columns: None,
        }
    }

    /// Restricts resolution to the given columns.
    ///
    /// Attributes resolving to anything else fail with
    /// [`FilterError::UnknownAttribute`].
    pub fn with_allowed_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Resolves a logical attribute path to its column.
    ///
    /// # Errors
    ///
    /// - [`FilterError::InvalidColumn`] if the mapper output is not a plain
    ///   (optionally dotted) SQL identifier.
    /// - [`FilterError::UnknownAttribute`] if an allow-list is configured and
    ///   the column is not in it.
    pub fn resolve(&self, attribute: &str) -> FilterResult<ResolvedAttribute> {
        let builtin = TYPED_COLUMNS.iter().find(|(path, _, _)| *path == attribute);
        let mapped = self.mapper.map(attribute);
        let column = match builtin {
            Some((_, column, _)) if mapped == attribute => (*column).to_string(),
            _ => mapped,
        };

        if !is_column_name(&column) {
            return Err(FilterError::InvalidColumn {
                attribute: attribute.to_string(),
                column,
            });
        }

        if let Some(allowed) = &self.allowed_columns {
            if !allowed.contains(&column) {
                return Err(FilterError::unknown_attribute(attribute));
            }
        }

        // Built-in meta attributes stay typed even when the mapper renames them.
        let kind = builtin
            .or_else(|| TYPED_COLUMNS.iter().find(|(_, typed, _)| *typed == column))
            .map_or(ColumnKind::Text, |(_, _, kind)| *kind);

        tracing::trace!(attribute, column = %column, ?kind, "resolved attribute");
        Ok(ResolvedAttribute { column, kind })
    }
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_.]*`.
pub(crate) fn is_column_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_identifier_start) && chars.all(is_identifier_continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{IdentityMapper, SimpleAttributeNameMapper};

    fn resolver() -> AttributeResolver {
        let mapper =
            SimpleAttributeNameMapper::new([(r"emails\.value", "email")]).unwrap();
        AttributeResolver::new(Arc::new(mapper))
    }

    #[test]
    fn test_resolve_unmapped() {
        let resolved = resolver().resolve("userName").unwrap();
        assert_eq!(
            resolved,
            ResolvedAttribute {
                column: "userName".to_string(),
                kind: ColumnKind::Text,
            }
        );
    }

    #[test]
    fn test_resolve_mapped() {
        assert_eq!(resolver().resolve("emails.value").unwrap().column, "email");
    }

    #[test]
    fn test_resolve_typed_meta_attributes() {
        let r = resolver();
        assert_eq!(
            r.resolve("meta.version").unwrap(),
            ResolvedAttribute {
                column: "version".to_string(),
                kind: ColumnKind::Integer,
            }
        );
        assert_eq!(
            r.resolve("meta.created").unwrap().kind,
            ColumnKind::Timestamp
        );
        assert_eq!(
            r.resolve("meta.lastModified").unwrap().column,
            "lastModified"
        );
    }

    #[test]
    fn test_typed_column_named_directly() {
        assert_eq!(
            resolver().resolve("version").unwrap().kind,
            ColumnKind::Integer
        );
    }

    #[test]
    fn test_mapper_renames_builtin_meta_but_keeps_type() {
        let mapper = |attribute: &str| {
            if attribute == "meta.created" {
                "created_at".to_string()
            } else {
                attribute.to_string()
            }
        };
        let resolved = AttributeResolver::new(Arc::new(mapper))
            .resolve("meta.created")
            .unwrap();
        assert_eq!(resolved.column, "created_at");
        assert_eq!(resolved.kind, ColumnKind::Timestamp);
    }

    #[test]
    fn test_regex_mapper_renames_version() {
        let mapper = SimpleAttributeNameMapper::new([(r"^meta\.version$", "row_version")]).unwrap();
        let resolved = AttributeResolver::new(Arc::new(mapper))
            .resolve("meta.version")
            .unwrap();
        assert_eq!(
            resolved,
            ResolvedAttribute {
                column: "row_version".to_string(),
                kind: ColumnKind::Integer,
            }
        );
    }

    #[test]
    fn test_invalid_mapper_output_rejected() {
        let mapper = |_: &str| "x; DROP TABLE users".to_string();
        let err = AttributeResolver::new(Arc::new(mapper))
            .resolve("userName")
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn { .. }));
    }

    #[test]
    fn test_allow_list() {
        let r = resolver().with_allowed_columns(["userName", "email", "version"]);
        assert!(r.resolve("emails.value").is_ok());
        assert!(r.resolve("meta.version").is_ok());
        assert_eq!(
            r.resolve("password"),
            Err(FilterError::unknown_attribute("password"))
        );
    }

    #[test]
    fn test_is_column_name() {
        assert!(is_column_name("userName"));
        assert!(is_column_name("_x.y1"));
        assert!(!is_column_name(""));
        assert!(!is_column_name("1abc"));
        assert!(!is_column_name("a b"));
        assert!(!is_column_name("a)"));
    }

    #[test]
    fn test_identity_resolver() {
        let r = AttributeResolver::new(Arc::new(IdentityMapper));
        assert_eq!(r.resolve("displayName").unwrap().column, "displayName");
    }
}
