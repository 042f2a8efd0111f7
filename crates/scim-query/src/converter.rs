//! The top-level filter to SQL entry point.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::binder::{ParameterBinder, ParameterSet};
use crate::filter::{FilterParser, FilterResult, Precedence};
use crate::mapper::AttributeNameMapper;
use crate::render::SqlRenderer;
use crate::resolver::AttributeResolver;
use crate::sort::build_sort;

/// Converter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterOptions {
    /// How `and`/`or` group when mixed without parentheses.
    pub precedence: Precedence,

    /// Skip `LOWER()` wrapping because the database already compares
    /// strings case-insensitively.
    pub case_insensitive_db: bool,

    /// When set, only these columns may be filtered or sorted on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_columns: Option<Vec<String>>,
}

/// The compiled form of a filter: SQL text plus bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedFilter {
    sql: String,
    params: ParameterSet,
}

impl ProcessedFilter {
    /// The SQL predicate, possibly followed by an `ORDER BY` clause.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Values for the `:__value_<n>` placeholders in [`sql`](Self::sql).
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Splits the result into its SQL and parameters.
    pub fn into_parts(self) -> (String, ParameterSet) {
        (self.sql, self.params)
    }
}

/// Compiles SCIM filters into parameterized SQL.
///
/// A converter holds no per-call state and can be shared freely between
/// threads; every [`convert`](Self::convert) call gets its own parameter
/// binder.
///
/// # Example
///
/// ```
/// use scim_query_rs::{SearchQueryConverter, SimpleAttributeNameMapper};
///
/// let mapper = SimpleAttributeNameMapper::new([(r"emails\.value", "email")]).unwrap();
/// let converter = SearchQueryConverter::new(mapper);
///
/// let filter = converter
///     .convert(Some("emails.value sw \"joe\""), Some("emails.value"), true)
///     .unwrap();
/// assert_eq!(filter.sql(), "LOWER(email) LIKE LOWER(:__value_0) ORDER BY email ASC");
/// assert_eq!(filter.params().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SearchQueryConverter {
    resolver: AttributeResolver,
    precedence: Precedence,
    case_insensitive_db: bool,
}

impl SearchQueryConverter {
    /// Creates a converter with default options.
    pub fn new(mapper: impl AttributeNameMapper + 'static) -> Self {
        Self::with_options(mapper, ConverterOptions::default())
    }

    /// Creates a converter with the given options.
    pub fn with_options(mapper: impl AttributeNameMapper + 'static, options: ConverterOptions) -> Self {
        Self::from_shared(Arc::new(mapper), options)
    }

    /// Creates a converter around an already shared mapper.
    pub fn from_shared(mapper: Arc<dyn AttributeNameMapper>, options: ConverterOptions) -> Self {
        let mut resolver = AttributeResolver::new(mapper);
        if let Some(columns) = options.allowed_columns {
            resolver = resolver.with_allowed_columns(columns);
        }
        Self {
            resolver,
            precedence: options.precedence,
            case_insensitive_db: options.case_insensitive_db,
        }
    }

    /// Compiles `filter` and an optional sort key into SQL.
    ///
    /// A missing or blank filter yields an empty predicate; the result then
    /// holds only the `ORDER BY` clause, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterError`](crate::FilterError) when the filter cannot
    /// be tokenized or parsed, when an attribute or the sort key cannot be
    /// resolved, or when a comparison cannot be rendered.
    pub fn convert(
        &self,
        filter: Option<&str>,
        sort_by: Option<&str>,
        ascending: bool,
    ) -> FilterResult<ProcessedFilter> {
        let mut binder = ParameterBinder::new();

        let mut sql = match filter.filter(|f| !f.trim().is_empty()) {
            Some(filter) => {
                let expr = FilterParser::parse_with(filter, self.precedence)?;
                tracing::debug!(?expr, "parsed filter");
                SqlRenderer::new(&self.resolver, self.case_insensitive_db)
                    .render(&expr, &mut binder)?
            }
            None => String::new(),
        };

        if let Some(order_by) = build_sort(&self.resolver, sort_by, ascending)? {
            if sql.is_empty() {
                sql.push_str(order_by.trim_start());
            } else {
                sql.push_str(&order_by);
            }
        }

        let params = binder.finish();
        tracing::debug!(sql = %sql, params = params.len(), "converted filter");
        Ok(ProcessedFilter { sql, params })
    }
}
