//! Compiles SCIM-style filter expressions into parameterized SQL.
//!
//! A filter such as `userName eq "joe" and meta.version eq 0` becomes a SQL
//! predicate with named placeholders plus the values to bind to them:
//!
//! ```
//! use scim_query_rs::{ParamValue, SearchQueryConverter, SimpleAttributeNameMapper};
//!
//! let mapper = SimpleAttributeNameMapper::new([(r"emails\.value", "email")]).unwrap();
//! let converter = SearchQueryConverter::new(mapper);
//!
//! let filter = converter
//!     .convert(Some("userName eq \"joe\" and meta.version eq 0"), None, false)
//!     .unwrap();
//! assert_eq!(
//!     filter.sql(),
//!     "(LOWER(userName) = LOWER(:__value_0) AND version = :__value_1)"
//! );
//! assert_eq!(filter.params().get("__value_1"), Some(&ParamValue::Integer(0)));
//! ```
//!
//! Literal values never appear in the SQL text. Attribute names do, but only
//! after they have been mapped to a column and checked to be plain
//! identifiers.
//!
//! The pipeline is split into:
//! - [`filter`] - lexer, parser and AST
//! - [`mapper`] - logical attribute to column name mapping
//! - [`resolver`] - column lookup and typed-column detection
//! - [`render`] - AST to SQL
//! - [`binder`] - placeholder allocation
//! - [`sort`] - `ORDER BY` clause

pub mod binder;
pub mod converter;
pub mod filter;
pub mod mapper;
pub mod render;
pub mod resolver;
pub mod sort;

pub use binder::{ParamValue, ParameterBinder, ParameterSet, PLACEHOLDER_PREFIX};
pub use converter::{ConverterOptions, ProcessedFilter, SearchQueryConverter};
pub use filter::{ErrorKind, FilterError, FilterExpression, FilterParser, FilterResult, Precedence};
pub use mapper::{AttributeNameMapper, IdentityMapper, MapperError, SimpleAttributeNameMapper};
pub use resolver::{AttributeResolver, ColumnKind, ResolvedAttribute};
