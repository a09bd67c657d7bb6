//! # dirmap-filter
//!
//! LDAP search filter construction, parsing, and compilation.
//!
//! This crate covers the filter half of the dirmap core: immutable
//! [`Filter`] nodes with canonical string rendering, an operator
//! [`factory`], a recursive-descent [`parser`] with an exact
//! [`assemble`](parser::assemble) inverse, reserved-character
//! [`escape`](escape::escape)-ing, and the fluent [`QueryBuilder`]
//! accumulator that compiles fragments into a single RFC 4515 filter
//! string. It performs no I/O; executing compiled filters belongs to
//! `dirmap-ldap`.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod builder;
pub mod error;
pub mod escape;
pub mod factory;
pub mod node;
pub mod parser;

pub use builder::QueryBuilder;
pub use error::{FilterError, Result};
pub use node::Filter;
pub use parser::{assemble, parse, CompOp, ConditionNode, GroupNode, GroupOp, Node};
