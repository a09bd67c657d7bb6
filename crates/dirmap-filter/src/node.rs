//! Filter node types.
//!
//! A [`Filter`] is an immutable tree describing one LDAP boolean
//! expression. Rendering via [`std::fmt::Display`] produces the canonical
//! parenthesized string form: every leaf serializes to a single
//! `(attribute op value)` expression, every group to `(op child1 child2 …)`.
//!
//! Nodes are pure string assembly. Values are interpolated exactly as
//! given; escaping reserved characters is the caller's responsibility
//! (the query builder escapes before constructing nodes).

use std::fmt;

/// One LDAP filter expression.
///
/// Filters have no identity beyond structural equality and cannot be
/// mutated once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `(attribute=value)`
    Equals(String, String),
    /// `(attribute=*)` — the attribute is present.
    Has(String),
    /// `(attribute~=value)`
    ApproxEquals(String, String),
    /// `(attribute>=value)`
    Gte(String, String),
    /// `(attribute<=value)`
    Lte(String, String),
    /// `(attribute=value*)`
    StartsWith(String, String),
    /// `(attribute=*value)`
    EndsWith(String, String),
    /// `(attribute=*value*)`
    Contains(String, String),
    /// A pre-built fragment emitted verbatim.
    Raw(String),
    /// `(!child)`
    Not(Box<Filter>),
    /// `(&child1 child2 …)`
    And(Vec<Filter>),
    /// `(|child1 child2 …)`
    Or(Vec<Filter>),
}

impl Filter {
    /// Wraps a filter in a negation group.
    #[must_use]
    pub fn not(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// Builds a conjunction group over the given filters.
    #[must_use]
    pub fn and(filters: Vec<Filter>) -> Self {
        Self::And(filters)
    }

    /// Builds a disjunction group over the given filters.
    #[must_use]
    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Or(filters)
    }

    /// Checks whether this node is a group (`&`, `|`, or `!`).
    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self, Self::Not(_) | Self::And(_) | Self::Or(_))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(attr, value) => write!(f, "({attr}={value})"),
            Self::Has(attr) => write!(f, "({attr}=*)"),
            Self::ApproxEquals(attr, value) => write!(f, "({attr}~={value})"),
            Self::Gte(attr, value) => write!(f, "({attr}>={value})"),
            Self::Lte(attr, value) => write!(f, "({attr}<={value})"),
            Self::StartsWith(attr, value) => write!(f, "({attr}={value}*)"),
            Self::EndsWith(attr, value) => write!(f, "({attr}=*{value})"),
            Self::Contains(attr, value) => write!(f, "({attr}=*{value}*)"),
            Self::Raw(fragment) => f.write_str(fragment),
            Self::Not(child) => write!(f, "(!{child})"),
            Self::And(children) => {
                f.write_str("(&")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
            Self::Or(children) => {
                f.write_str("(|")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}
