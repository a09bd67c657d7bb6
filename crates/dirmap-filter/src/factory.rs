//! Filter factory.
//!
//! Maps symbolic operator tokens to filter constructors. Negated tokens
//! (`!=`, `!*`, `not_starts_with`, …) construct the base filter and wrap
//! it in a negation group.

use crate::error::{FilterError, Result};
use crate::node::Filter;

/// Builds a [`Filter`] from an operator token and its operands.
///
/// The presence operators `*` and `!*` take the attribute alone; every
/// other operator requires a value.
///
/// ## Errors
///
/// Returns [`FilterError::UnsupportedOperator`] for a token outside the
/// operator table, and [`FilterError::MissingValue`] when a value-bearing
/// operator is called without one.
pub fn make(operator: &str, attribute: &str, value: Option<&str>) -> Result<Filter> {
    let attr = attribute.to_string();
    let required = || {
        value
            .map(str::to_string)
            .ok_or_else(|| FilterError::MissingValue(operator.to_string()))
    };

    let filter = match operator {
        "*" => Filter::Has(attr),
        "!*" => Filter::not(Filter::Has(attr)),
        "=" => Filter::Equals(attr, required()?),
        "!=" => Filter::not(Filter::Equals(attr, required()?)),
        ">=" => Filter::Gte(attr, required()?),
        "<=" => Filter::Lte(attr, required()?),
        "~=" => Filter::ApproxEquals(attr, required()?),
        "starts_with" => Filter::StartsWith(attr, required()?),
        "not_starts_with" => Filter::not(Filter::StartsWith(attr, required()?)),
        "ends_with" => Filter::EndsWith(attr, required()?),
        "not_ends_with" => Filter::not(Filter::EndsWith(attr, required()?)),
        "contains" => Filter::Contains(attr, required()?),
        "not_contains" => Filter::not(Filter::Contains(attr, required()?)),
        unknown => return Err(FilterError::UnsupportedOperator(unknown.to_string())),
    };

    Ok(filter)
}

/// The operator tokens accepted by [`make`].
pub const OPERATORS: [&str; 13] = [
    "*",
    "!*",
    "=",
    "!=",
    ">=",
    "<=",
    "~=",
    "starts_with",
    "not_starts_with",
    "ends_with",
    "not_ends_with",
    "contains",
    "not_contains",
];
