//! # dirmap-ldap
//!
//! The connection half of the dirmap core: a resilient LDAP connection
//! layer executing the filters compiled by `dirmap-filter`.
//!
//! The transport is abstract — [`LdapTransport`] exposes the standard
//! LDAP v3 operations plus the simple paged-results control, and
//! [`Ldap3Transport`] is the shipped implementation over the `ldap3`
//! client. On top of it, [`Connection`] provides ordered multi-host
//! failover with a per-host attempt log, lazy reconnection, and bounded
//! retry of server-unreachable failures; [`Guard`] implements
//! validate-then-rebind authentication semantics; paged searches are
//! driven cookie-by-cookie; and failed operations carry a
//! [`DetailedError`] classified into typed [`ErrorCondition`]s by an
//! extensible [`ErrorClassifier`]. Named connections live in an explicit
//! [`ConnectionRegistry`] rather than ambient global state.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod auth;
pub mod config;
pub mod connection;
pub mod entry;
pub mod error;
pub mod paginate;
pub mod registry;
pub mod transport;

pub use auth::Guard;
pub use config::{ConnectionConfig, ConnectionConfigBuilder, TlsMode};
pub use connection::{BoundAs, Connection, OpContext, Operation};
pub use entry::Entry;
pub use error::{
    ConstraintCause, DetailedError, DirectoryError, ErrorClassifier, ErrorCondition, HostAttempt,
    Result,
};
pub use paginate::Page;
pub use registry::ConnectionRegistry;
pub use transport::{
    AttributeChange, Ldap3Transport, LdapResponse, LdapTransport, PageControl, SearchOutcome,
    SearchRequest, SearchScope,
};
