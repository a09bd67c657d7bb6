//! Fluent query filter accumulator.
//!
//! [`QueryBuilder`] collects filter fragments into `and`, `or`, and `raw`
//! buckets and compiles them into a single filter string, independent of
//! any transport. Values passed to `where_*` methods are escaped for
//! filter safety before node construction; raw fragments bypass escaping.

use crate::error::Result;
use crate::escape::escape;
use crate::factory;
use crate::node::Filter;

/// Accumulates filter fragments and compiles them into one filter string.
///
/// Compiling zero fragments yields an empty string (match all entries
/// under the base DN); one fragment compiles unwrapped; multiple
/// fragments are joined under an implicit `&` group, with the `or`
/// bucket wrapped in a single `|` group when it holds more than one
/// member.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    ands: Vec<String>,
    ors: Vec<String>,
    raws: Vec<String>,
}

impl QueryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Conjunctive conditions ===

    /// Adds an equality condition.
    #[must_use]
    pub fn where_equals(self, attribute: &str, value: &str) -> Self {
        self.push_and(Filter::Equals(attribute.to_string(), escape(value)))
    }

    /// Adds a negated equality condition.
    #[must_use]
    pub fn where_not_equals(self, attribute: &str, value: &str) -> Self {
        self.push_and(Filter::not(Filter::Equals(
            attribute.to_string(),
            escape(value),
        )))
    }

    /// Adds a presence condition.
    #[must_use]
    pub fn where_has(self, attribute: &str) -> Self {
        self.push_and(Filter::Has(attribute.to_string()))
    }

    /// Adds a negated presence condition.
    #[must_use]
    pub fn where_not_has(self, attribute: &str) -> Self {
        self.push_and(Filter::not(Filter::Has(attribute.to_string())))
    }

    /// Adds an approximate-match condition.
    #[must_use]
    pub fn where_approx(self, attribute: &str, value: &str) -> Self {
        self.push_and(Filter::ApproxEquals(attribute.to_string(), escape(value)))
    }

    /// Adds a greater-than-or-equals condition.
    #[must_use]
    pub fn where_gte(self, attribute: &str, value: &str) -> Self {
        self.push_and(Filter::Gte(attribute.to_string(), escape(value)))
    }

    /// Adds a less-than-or-equals condition.
    #[must_use]
    pub fn where_lte(self, attribute: &str, value: &str) -> Self {
        self.push_and(Filter::Lte(attribute.to_string(), escape(value)))
    }

    /// Adds a starts-with condition.
    #[must_use]
    pub fn where_starts_with(self, attribute: &str, value: &str) -> Self {
        self.push_and(Filter::StartsWith(attribute.to_string(), escape(value)))
    }

    /// Adds an ends-with condition.
    #[must_use]
    pub fn where_ends_with(self, attribute: &str, value: &str) -> Self {
        self.push_and(Filter::EndsWith(attribute.to_string(), escape(value)))
    }

    /// Adds a contains condition.
    #[must_use]
    pub fn where_contains(self, attribute: &str, value: &str) -> Self {
        self.push_and(Filter::Contains(attribute.to_string(), escape(value)))
    }

    /// Adds a condition from an operator token, escaping the value.
    ///
    /// ## Errors
    ///
    /// Fails on an unknown operator token or a missing value for a
    /// value-bearing operator.
    pub fn where_op(self, attribute: &str, operator: &str, value: Option<&str>) -> Result<Self> {
        let escaped = value.map(escape);
        let filter = factory::make(operator, attribute, escaped.as_deref())?;
        Ok(self.push_and(filter))
    }

    // === Disjunctive conditions ===

    /// Adds an equality condition to the `or` bucket.
    #[must_use]
    pub fn or_where_equals(self, attribute: &str, value: &str) -> Self {
        self.push_or(Filter::Equals(attribute.to_string(), escape(value)))
    }

    /// Adds a presence condition to the `or` bucket.
    #[must_use]
    pub fn or_where_has(self, attribute: &str) -> Self {
        self.push_or(Filter::Has(attribute.to_string()))
    }

    /// Adds a contains condition to the `or` bucket.
    #[must_use]
    pub fn or_where_contains(self, attribute: &str, value: &str) -> Self {
        self.push_or(Filter::Contains(attribute.to_string(), escape(value)))
    }

    /// Adds a condition from an operator token to the `or` bucket.
    ///
    /// ## Errors
    ///
    /// Fails on an unknown operator token or a missing value for a
    /// value-bearing operator.
    pub fn or_where_op(self, attribute: &str, operator: &str, value: Option<&str>) -> Result<Self> {
        let escaped = value.map(escape);
        let filter = factory::make(operator, attribute, escaped.as_deref())?;
        Ok(self.push_or(filter))
    }

    // === Raw fragments ===

    /// Adds a pre-built fragment verbatim, without escaping.
    ///
    /// The caller is responsible for the fragment's syntax and for
    /// escaping any untrusted values inside it.
    #[must_use]
    pub fn raw_filter(mut self, fragment: &str) -> Self {
        self.raws.push(fragment.to_string());
        self
    }

    // === Compilation ===

    /// Compiles the accumulated fragments into a single filter string.
    #[must_use]
    pub fn compile(&self) -> String {
        let mut fragments: Vec<String> =
            Vec::with_capacity(self.ands.len() + self.raws.len() + 1);
        fragments.extend(self.ands.iter().cloned());
        fragments.extend(self.raws.iter().cloned());

        match self.ors.len() {
            0 => {}
            1 => fragments.push(self.ors[0].clone()),
            _ => fragments.push(format!("(|{})", self.ors.concat())),
        }

        match fragments.len() {
            0 => String::new(),
            1 => fragments.pop().unwrap_or_default(),
            _ => format!("(&{})", fragments.concat()),
        }
    }

    /// Returns the number of accumulated fragments across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ands.len() + self.ors.len() + self.raws.len()
    }

    /// Checks whether no fragments have been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push_and(mut self, filter: Filter) -> Self {
        self.ands.push(filter.to_string());
        self
    }

    fn push_or(mut self, filter: Filter) -> Self {
        self.ors.push(filter.to_string());
        self
    }
}
