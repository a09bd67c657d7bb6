//! Directory error types and classification.
//!
//! Failed binds and operations carry a [`DetailedError`] captured at the
//! moment the server rejected the request. The [`ErrorClassifier`] maps
//! the opaque diagnostic text and result code onto a typed
//! [`ErrorCondition`] without the call sites having to know the
//! platform-specific code table.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for directory operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;

// ============================================================================
// Detailed error
// ============================================================================

/// The server's verdict on a failed bind or operation.
///
/// Captured once per failure and never reused across operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedError {
    /// Numeric LDAP result code.
    pub result_code: u32,
    /// Standard text for the result code.
    pub message: String,
    /// Server-supplied diagnostic message, typically
    /// `"<hex-code>: <platform-specific text>"` on Active Directory.
    pub diagnostic: String,
}

impl DetailedError {
    /// Creates a new detailed error.
    #[must_use]
    pub fn new(result_code: u32, message: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            result_code,
            message: message.into(),
            diagnostic: diagnostic.into(),
        }
    }
}

impl std::fmt::Display for DetailedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.result_code, self.message)?;
        if !self.diagnostic.is_empty() {
            write!(f, ": {}", self.diagnostic)?;
        }
        Ok(())
    }
}

// ============================================================================
// Error conditions
// ============================================================================

/// Why a constraint violation occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintCause {
    /// The new password was rejected by the directory's password policy.
    PasswordPolicy,
    /// The current password supplied for a password change was wrong.
    IncorrectPassword,
    /// The server reported a constraint violation without a known cause.
    Unspecified,
}

/// Typed classification of a failed directory operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCondition {
    /// A directory constraint rejected the request.
    ConstraintViolation(ConstraintCause),
    /// The bound identity lacks the rights for the operation.
    InsufficientAccess,
    /// The entry being added already exists.
    AlreadyExists,
    /// The credentials presented at bind were rejected.
    InvalidCredentials,
    /// The server could not be reached; eligible for failover retry.
    ServerUnreachable,
    /// No known code matched; the raw [`DetailedError`] remains available.
    Other,
}

// ============================================================================
// Classifier
// ============================================================================

/// Maps a [`DetailedError`] onto an [`ErrorCondition`].
///
/// Diagnostic-substring rules are always evaluated before result-code
/// rules: platform hex sub-codes (e.g. Active Directory's `0000052D`)
/// arrive alongside generic result codes and carry more information.
/// Within each table, rules are checked in registration order and the
/// first match wins.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    /// Substring containment on the diagnostic text (case-sensitive).
    diagnostics: Vec<(String, ErrorCondition)>,
    /// Exact match on the numeric result code.
    codes: Vec<(u32, ErrorCondition)>,
}

impl ErrorClassifier {
    /// Creates a classifier with no rules; everything classifies as
    /// [`ErrorCondition::Other`].
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            diagnostics: Vec::new(),
            codes: Vec::new(),
        }
    }

    /// Registers a diagnostic-substring rule.
    pub fn register_diagnostic(
        &mut self,
        pattern: impl Into<String>,
        condition: ErrorCondition,
    ) -> &mut Self {
        self.diagnostics.push((pattern.into(), condition));
        self
    }

    /// Registers a result-code rule.
    pub fn register_code(&mut self, code: u32, condition: ErrorCondition) -> &mut Self {
        self.codes.push((code, condition));
        self
    }

    /// Classifies a detailed error against the rule tables.
    #[must_use]
    pub fn classify(&self, detail: &DetailedError) -> ErrorCondition {
        for (pattern, condition) in &self.diagnostics {
            if detail.diagnostic.contains(pattern) {
                return *condition;
            }
        }
        for (code, condition) in &self.codes {
            if detail.result_code == *code {
                return *condition;
            }
        }
        ErrorCondition::Other
    }
}

impl Default for ErrorClassifier {
    /// The built-in code table for Active Directory and RFC 4511 result
    /// codes.
    fn default() -> Self {
        let mut classifier = Self::empty();
        classifier
            .register_diagnostic(
                "0000052D",
                ErrorCondition::ConstraintViolation(ConstraintCause::PasswordPolicy),
            )
            .register_diagnostic(
                "00000056",
                ErrorCondition::ConstraintViolation(ConstraintCause::IncorrectPassword),
            )
            .register_diagnostic("Can't contact LDAP server", ErrorCondition::ServerUnreachable)
            .register_code(
                19,
                ErrorCondition::ConstraintViolation(ConstraintCause::Unspecified),
            )
            .register_code(49, ErrorCondition::InvalidCredentials)
            .register_code(50, ErrorCondition::InsufficientAccess)
            .register_code(68, ErrorCondition::AlreadyExists)
            .register_code(81, ErrorCondition::ServerUnreachable);
        classifier
    }
}

// ============================================================================
// Directory errors
// ============================================================================

/// One failed connection attempt during host failover.
#[derive(Debug, Clone)]
pub struct HostAttempt {
    /// The host that was tried.
    pub host: String,
    /// When the attempt was made.
    pub at: DateTime<Utc>,
    /// Why it failed.
    pub error: String,
}

/// Errors raised by the directory connection layer.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// A username must be supplied before authentication is attempted.
    #[error("username is required")]
    UsernameRequired,

    /// A password must be supplied before authentication is attempted.
    #[error("password is required")]
    PasswordRequired,

    /// Invalid connection configuration.
    #[error("directory configuration error: {0}")]
    Configuration(String),

    /// A transport-level failure reaching the server.
    #[error("directory connection failed: {0}")]
    Connection(String),

    /// Every configured host was tried and failed.
    #[error("directory connection failed after trying {} host(s)", .attempts.len())]
    HostsExhausted {
        /// Per-host failure history, in the order the hosts were tried.
        attempts: Vec<HostAttempt>,
    },

    /// The server rejected a bind request.
    #[error("bind failed: {detail}")]
    Bind {
        /// Typed classification of the failure.
        condition: ErrorCondition,
        /// The server's verdict.
        detail: DetailedError,
    },

    /// The server rejected a non-bind operation.
    #[error("operation failed: {detail}")]
    Operation {
        /// Typed classification of the failure.
        condition: ErrorCondition,
        /// The server's verdict.
        detail: DetailedError,
    },

    /// An error raised by the underlying ldap3 client.
    #[error("LDAP client error: {0}")]
    Ldap3(#[from] ldap3::LdapError),
}

impl DirectoryError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Returns the server's detailed error, when one was captured.
    #[must_use]
    pub fn detailed_error(&self) -> Option<&DetailedError> {
        match self {
            Self::Bind { detail, .. } | Self::Operation { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// Returns the typed classification, when one was assigned.
    #[must_use]
    pub const fn condition(&self) -> Option<ErrorCondition> {
        match self {
            Self::Bind { condition, .. } | Self::Operation { condition, .. } => Some(*condition),
            _ => None,
        }
    }

    /// Checks whether this failure is in the server-unreachable class
    /// that the connection layer retries with host failover.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Bind { condition, .. } | Self::Operation { condition, .. } => {
                matches!(condition, ErrorCondition::ServerUnreachable)
            }
            _ => false,
        }
    }

    /// Checks whether this error was raised by input validation before
    /// any network I/O.
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::UsernameRequired | Self::PasswordRequired | Self::Configuration(_)
        )
    }
}
