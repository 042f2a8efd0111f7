//! SQL rendering of filter expressions.
//!
//! The renderer walks the tree depth-first, left to right, so placeholders are
//! numbered in the order their literals appear in the filter text. Literal
//! values only ever reach the output through the [`ParameterBinder`].

use crate::binder::{ParamValue, ParameterBinder};
use crate::filter::{
    ComparisonOp, FilterError, FilterExpression, FilterResult, Literal, NumberLiteral,
};
use crate::resolver::{AttributeResolver, ColumnKind, ResolvedAttribute};

/// The SQL comparison operator for a filter operator.
fn sql_operator(op: ComparisonOp) -> &'static str {
    match op {
        ComparisonOp::Eq => "=",
        ComparisonOp::Ne => "<>",
        ComparisonOp::Gt => ">",
        ComparisonOp::Ge => ">=",
        ComparisonOp::Lt => "<",
        ComparisonOp::Le => "<=",
        ComparisonOp::Co | ComparisonOp::Sw | ComparisonOp::Ew => "LIKE",
        ComparisonOp::Pr => "IS NOT NULL",
    }
}

/// Wraps a `co`/`sw`/`ew` value in `LIKE` wildcards.
fn like_pattern(op: ComparisonOp, value: &str) -> String {
    match op {
        ComparisonOp::Co => format!("%{value}%"),
        ComparisonOp::Sw => format!("{value}%"),
        ComparisonOp::Ew => format!("%{value}"),
        _ => value.to_string(),
    }
}

fn number_value(n: NumberLiteral) -> ParamValue {
    match n {
        NumberLiteral::Integer(i) => ParamValue::Integer(i),
        NumberLiteral::Decimal(d) => ParamValue::Decimal(d),
    }
}

/// Renders a [`FilterExpression`] as a SQL predicate.
#[derive(Debug, Clone, Copy)]
pub struct SqlRenderer<'a> {
    resolver: &'a AttributeResolver,
    case_insensitive_db: bool,
}

impl<'a> SqlRenderer<'a> {
    /// Creates a renderer.
    ///
    /// With `case_insensitive_db` set the database is assumed to compare
    /// strings case-insensitively already, and no `LOWER()` wrapping is
    /// emitted.
    pub fn new(resolver: &'a AttributeResolver, case_insensitive_db: bool) -> Self {
        Self {
            resolver,
            case_insensitive_db,
        }
    }

    /// Renders `expr`, binding every literal through `binder`.
    ///
    /// # Errors
    ///
    /// Returns attribute resolution errors, [`FilterError::TypeMismatch`] when
    /// a literal does not fit a typed column, and
    /// [`FilterError::UnsupportedOperator`] for pattern matches on typed
    /// columns or non-string values.
    pub fn render(
        &self,
        expr: &FilterExpression,
        binder: &mut ParameterBinder,
    ) -> FilterResult<String> {
        match expr {
            FilterExpression::Presence { attribute } => {
                let resolved = self.resolver.resolve(attribute)?;
                Ok(format!("{} IS NOT NULL", resolved.column))
            }
            FilterExpression::Comparison {
                attribute,
                op,
                value,
            } => {
                let resolved = self.resolver.resolve(attribute)?;
                self.render_comparison(&resolved, *op, value, binder)
            }
            FilterExpression::Logical { op, left, right } => {
                let left = self.render(left, binder)?;
                let right = self.render(right, binder)?;
                Ok(format!("({} {} {})", left, op.sql(), right))
            }
        }
    }

    fn render_comparison(
        &self,
        resolved: &ResolvedAttribute,
        op: ComparisonOp,
        value: &Literal,
        binder: &mut ParameterBinder,
    ) -> FilterResult<String> {
        let column = &resolved.column;

        if op == ComparisonOp::Pr {
            return Ok(format!("{column} IS NOT NULL"));
        }
        if op.is_pattern_match() && (resolved.kind.is_typed() || !is_textual(value)) {
            return Err(FilterError::unsupported_operator(op.keyword(), column.as_str()));
        }

        let sql_op = sql_operator(op);
        match (resolved.kind, value) {
            (ColumnKind::Integer, Literal::Number(n)) => {
                let placeholder = binder.bind(number_value(*n));
                Ok(format!("{column} {sql_op} :{placeholder}"))
            }
            (ColumnKind::Timestamp, Literal::Timestamp { instant, .. }) => {
                let placeholder = binder.bind(ParamValue::Timestamp(*instant));
                Ok(format!("{column} {sql_op} :{placeholder}"))
            }
            (ColumnKind::Integer, other) => Err(FilterError::TypeMismatch {
                column: column.clone(),
                value: other.to_string(),
                expected: "a number",
            }),
            (ColumnKind::Timestamp, other) => Err(FilterError::TypeMismatch {
                column: column.clone(),
                value: other.to_string(),
                expected: "an ISO-8601 timestamp",
            }),
            (ColumnKind::Text, Literal::String(text) | Literal::Timestamp { raw: text, .. }) => {
                let placeholder = binder.bind(ParamValue::Text(like_pattern(op, text)));
                if self.case_insensitive_db {
                    Ok(format!("{column} {sql_op} :{placeholder}"))
                } else {
                    Ok(format!("LOWER({column}) {sql_op} LOWER(:{placeholder})"))
                }
            }
            (ColumnKind::Text, Literal::Number(n)) => {
                let placeholder = binder.bind(number_value(*n));
                Ok(format!("{column} {sql_op} :{placeholder}"))
            }
            (ColumnKind::Text, Literal::Boolean(b)) => {
                let placeholder = binder.bind(ParamValue::Boolean(*b));
                Ok(format!("{column} {sql_op} :{placeholder}"))
            }
        }
    }
}

fn is_textual(value: &Literal) -> bool {
    matches!(value, Literal::String(_) | Literal::Timestamp { .. })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::filter::FilterParser;
    use crate::mapper::SimpleAttributeNameMapper;
    use crate::binder::ParameterSet;

    fn resolver() -> AttributeResolver {
        let mapper = SimpleAttributeNameMapper::new([(r"emails\.value", "email")]).unwrap();
        AttributeResolver::new(Arc::new(mapper))
    }

    fn render_with(filter: &str, case_insensitive_db: bool) -> FilterResult<(String, ParameterSet)> {
        let resolver = resolver();
        let expr = FilterParser::parse(filter)?;
        let mut binder = ParameterBinder::new();
        let sql = SqlRenderer::new(&resolver, case_insensitive_db).render(&expr, &mut binder)?;
        Ok((sql, binder.finish()))
    }

    fn render(filter: &str) -> FilterResult<(String, ParameterSet)> {
        render_with(filter, false)
    }

    fn text(value: &str) -> ParamValue {
        ParamValue::Text(value.to_string())
    }

    #[test]
    fn test_like_wildcards_go_into_values() {
        let (sql, params) = render("displayName co \"write\"").unwrap();
        assert_eq!(sql, "LOWER(displayName) LIKE LOWER(:__value_0)");
        assert_eq!(params.get("__value_0"), Some(&text("%write%")));

        let (_, params) = render("displayName sw \"scim.\"").unwrap();
        assert_eq!(params.get("__value_0"), Some(&text("scim.%")));

        let (_, params) = render("displayName ew \".org\"").unwrap();
        assert_eq!(params.get("__value_0"), Some(&text("%.org")));
    }

    #[test]
    fn test_ordering_operators() {
        let cases = [
            ("ne", "<>"),
            ("gt", ">"),
            ("ge", ">="),
            ("lt", "<"),
            ("le", "<="),
        ];
        for (keyword, sql_op) in cases {
            let (sql, params) = render(&format!("userName {keyword} \"m\"")).unwrap();
            assert_eq!(sql, format!("LOWER(userName) {sql_op} LOWER(:__value_0)"));
            assert_eq!(params.get("__value_0"), Some(&text("m")));
        }
    }

    #[test]
    fn test_typed_version_column() {
        let (sql, params) = render("meta.version ge 3").unwrap();
        assert_eq!(sql, "version >= :__value_0");
        assert_eq!(params.get("__value_0"), Some(&ParamValue::Integer(3)));
    }

    #[test]
    fn test_typed_timestamp_column() {
        let (sql, params) = render("meta.lastModified lt \"2024-05-01T12:00:00+02:00\"").unwrap();
        assert_eq!(sql, "lastModified < :__value_0");
        match params.get("__value_0") {
            Some(ParamValue::Timestamp(t)) => {
                assert_eq!(t.to_rfc3339(), "2024-05-01T10:00:00+00:00");
            }
            other => panic!("Expected timestamp param, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_literal_on_text_column_stays_text() {
        let (sql, params) = render("nickName eq \"2024-05-01T12:00:00Z\"").unwrap();
        assert_eq!(sql, "LOWER(nickName) = LOWER(:__value_0)");
        assert_eq!(params.get("__value_0"), Some(&text("2024-05-01T12:00:00Z")));
    }

    #[test]
    fn test_type_mismatch() {
        let err = render("meta.version eq \"one\"").unwrap_err();
        assert_eq!(
            err,
            FilterError::TypeMismatch {
                column: "version".to_string(),
                value: "\"one\"".to_string(),
                expected: "a number",
            }
        );

        let err = render("meta.created gt \"yesterday\"").unwrap_err();
        assert!(matches!(err, FilterError::TypeMismatch { .. }));

        let err = render("meta.created gt 0").unwrap_err();
        assert!(matches!(err, FilterError::TypeMismatch { .. }));
    }

    #[test]
    fn test_pattern_match_on_typed_column_unsupported() {
        let err = render("meta.version co 1").unwrap_err();
        assert_eq!(err, FilterError::unsupported_operator("co", "version"));
    }

    #[test]
    fn test_pattern_match_on_boolean_unsupported() {
        let err = render("active sw true").unwrap_err();
        assert_eq!(err, FilterError::unsupported_operator("sw", "active"));
    }

    #[test]
    fn test_number_on_text_column_not_folded() {
        let (sql, params) = render("externalId gt 1.5").unwrap();
        assert_eq!(sql, "externalId > :__value_0");
        assert_eq!(params.get("__value_0"), Some(&ParamValue::Decimal(1.5)));
    }

    #[test]
    fn test_case_insensitive_db_skips_lower() {
        let (sql, params) =
            render_with("userName eq \"joe\" and emails.value co \"x\"", true).unwrap();
        assert_eq!(sql, "(userName = :__value_0 AND email LIKE :__value_1)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_nested_parentheses() {
        let (sql, params) =
            render("a eq \"1\" and (b pr or (c eq \"2\" and d eq \"3\"))").unwrap();
        assert_eq!(
            sql,
            "(LOWER(a) = LOWER(:__value_0) AND (b IS NOT NULL OR \
             (LOWER(c) = LOWER(:__value_1) AND LOWER(d) = LOWER(:__value_2))))"
        );
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("__value_2"), Some(&text("3")));
    }

    #[test]
    fn test_injection_attempt_stays_in_parameter() {
        let payload = "x') OR 1=1; DROP TABLE users; --";
        let (sql, params) = render(&format!("userName eq \"{payload}\"")).unwrap();
        assert_eq!(sql, "LOWER(userName) = LOWER(:__value_0)");
        assert!(!sql.contains("DROP"));
        assert_eq!(params.get("__value_0"), Some(&text(payload)));
    }
}
