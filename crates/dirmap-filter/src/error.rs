//! Filter error types.

use thiserror::Error;

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors raised while building, parsing, or compiling LDAP filters.
///
/// Parsing never yields a partial tree: the first malformed construct
/// aborts the parse with one of the variants below.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The operator token is not part of the supported operator table.
    #[error("unsupported filter operator: `{0}`")]
    UnsupportedOperator(String),

    /// The operator requires a value operand, but none was supplied.
    #[error("filter operator `{0}` requires a value")]
    MissingValue(String),

    /// An opening parenthesis was never closed.
    #[error("unclosed group, missing `)`: `{0}`")]
    UnclosedGroup(String),

    /// A closing parenthesis had no matching opening parenthesis.
    #[error("unopened group, missing `(`: `{0}`")]
    UnopenedGroup(String),

    /// A group contained nested filters but no `&`, `|`, or `!` prefix.
    #[error("group filter has no recognized operator prefix: `{0}`")]
    MissingGroupOperator(String),

    /// A condition contained none of the comparison operators.
    #[error("condition contains no recognized operator: `{0}`")]
    MissingConditionOperator(String),
}

impl FilterError {
    /// Checks whether this error was produced by the parser.
    #[must_use]
    pub const fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::UnclosedGroup(_)
                | Self::UnopenedGroup(_)
                | Self::MissingGroupOperator(_)
                | Self::MissingConditionOperator(_)
        )
    }
}
