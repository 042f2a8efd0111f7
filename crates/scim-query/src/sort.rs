//! `ORDER BY` clause construction.

use crate::filter::{FilterError, FilterResult};
use crate::resolver::{is_column_name, AttributeResolver};

/// Builds the `ORDER BY` suffix for an optional sort attribute.
///
/// The suffix starts with a space so it can be appended directly to a
/// predicate. Returns `Ok(None)` when no attribute is given.
///
/// # Errors
///
/// The sort key is caller-supplied text that ends up in SQL verbatim, so it
/// must itself be a valid attribute path; anything else is
/// [`FilterError::InvalidSortAttribute`]. Resolution errors from the
/// resolver are passed through.
pub fn build_sort(
    resolver: &AttributeResolver,
    attribute: Option<&str>,
    ascending: bool,
) -> FilterResult<Option<String>> {
    let Some(attribute) = attribute.map(str::trim).filter(|a| !a.is_empty()) else {
        return Ok(None);
    };

    if !is_column_name(attribute) {
        return Err(FilterError::InvalidSortAttribute {
            attribute: attribute.to_string(),
        });
    }

    let resolved = resolver.resolve(attribute)?;
    let direction = if ascending { "ASC" } else { "DESC" };
    Ok(Some(format!(" ORDER BY {} {}", resolved.column, direction)))
}
