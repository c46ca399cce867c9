//! SQL Abstract Syntax Tree (AST) module
//!
//! A type-safe representation of SQL statements that can be constructed
//! programmatically and rendered to SQL text.
//!
//! # Architecture
//!
//! - [`expr`]: SQL expressions (columns, literals, operators, functions)
//! - [`stmt`]: SQL statements (SELECT, INSERT, UPDATE, DELETE, WITH,
//!   UNION ALL)
//! - [`render`]: SQL string generation and escaping
//!
//! All nodes are immutable values; builders compose new trees rather than
//! mutating existing ones, and rendering is deterministic.

mod expr;
mod render;
mod stmt;

pub use expr::*;
pub use render::*;
pub use stmt::*;
