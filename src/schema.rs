//! Association metadata
//!
//! The relational schema description consumed by the association engine:
//! per source table, a named set of one-to-many and many-to-many
//! relationships. The metadata is supplied by an external schema provider
//! (typically produced by catalog introspection), loaded once, and read
//! only; the engine never refreshes or mutates it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A foreign-key column owned by a named table, used by many-to-many
/// associations where each fk column of the associative table points at a
/// different owner.
pub type OwnedColumn = (String, String);

/// One declared relationship from a source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Association {
    /// The related table holds a foreign key into the source table's key.
    /// `fks` maps fk column on the related table to the referenced column
    /// on the source table.
    #[serde(rename = "1xN")]
    OneToMany {
        table: String,
        fks: IndexMap<String, String>,
    },

    /// Two tables related through an associative table holding one
    /// foreign key into each. `fks` maps fk column on the associative
    /// table to `(owner table, owner column)`. Composite keys fan out to
    /// multiple entries per owner.
    #[serde(rename = "MxN")]
    ManyToMany {
        table: String,
        associative_table: String,
        fks: IndexMap<String, OwnedColumn>,
    },
}

impl Association {
    /// The related (target) table of the association
    pub fn table(&self) -> &str {
        match self {
            Association::OneToMany { table, .. } => table,
            Association::ManyToMany { table, .. } => table,
        }
    }
}

/// All declared associations, keyed by source table then association name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssociationMap {
    tables: IndexMap<String, IndexMap<String, Association>>,
}

impl AssociationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the schema provider's JSON shape
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Declare an association; used by generated schema modules and tests
    pub fn declare(
        mut self,
        source_table: impl Into<String>,
        name: impl Into<String>,
        association: Association,
    ) -> Self {
        self.tables
            .entry(source_table.into())
            .or_default()
            .insert(name.into(), association);
        self
    }

    /// Look up the association declared for `(source_table, name)`
    pub fn get(&self, source_table: &str, name: &str) -> Option<&Association> {
        self.tables.get(source_table)?.get(name)
    }
}
