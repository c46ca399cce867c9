//! Crate error type
//!
//! Composition errors surface at the builder call that detects them;
//! statement construction is all-or-nothing and never degrades to
//! malformed SQL.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("UNION ALL must combine two SELECT statements")]
    UnionRequiresSelect,

    #[error("no association named '{association}' declared for table '{table}'")]
    UnknownAssociation { table: String, association: String },

    #[error("cannot resolve more than one association per insert (requested {count})")]
    MultipleAssociations { count: usize },

    #[error("invalid schema metadata: {0}")]
    Schema(#[from] serde_json::Error),
}
