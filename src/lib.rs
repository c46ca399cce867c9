//! Programmatic SQL statement assembly for PostgreSQL.
//!
//! Statements are built as immutable expression trees, composed through
//! builders, and serialized to SQL text by a single renderer that owns all
//! escaping. Inserts can carry related rows; the association engine
//! expands them into one atomic WITH chain of CTE-bound inserts.
//!
//! ```
//! use sqlweave::{insert, SqlValue};
//!
//! let sql = insert("user", [("email", SqlValue::from("e@x.tld"))])
//!     .set_returning(&["id"])
//!     .to_sql();
//! assert_eq!(sql, "INSERT INTO \"user\" (email) VALUES (('e@x.tld')) RETURNING id");
//! ```

pub mod ast;
pub mod associate;
pub mod builder;
pub mod error;
pub mod schema;
pub mod value;

pub use associate::{insert_with_associations, AssociationRequest};
pub use builder::{
    delete, insert, insert_from, insert_with, update, upsert, DeleteBuilder, InsertBuilder,
    SelectBuilder, UnionBuilder, UpdateBuilder,
};
pub use error::{Error, Result};
pub use schema::{Association, AssociationMap};
pub use value::{gen_uuid, now, value_map, SqlValue, ValueMap};
