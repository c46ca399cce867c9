//! Association resolution
//!
//! Expands an insert that carries related rows into a single atomic
//! statement: the base insert becomes a CTE binding exposing its generated
//! key columns via RETURNING, and each dependent insert draws its foreign
//! keys from that binding with INSERT ... SELECT. Binding order follows
//! dependency order, since SQL gives a CTE visibility of the bindings to
//! its left.

use crate::ast::{Expr, SelectColumn};
use crate::builder::{insert, insert_from, insert_with, InsertBuilder};
use crate::error::{Error, Result};
use crate::schema::{Association, AssociationMap};
use crate::value::ValueMap;

/// A requested related row: the association name declared for the base
/// table, plus the values of the row to create through it.
#[derive(Debug, Clone)]
pub struct AssociationRequest {
    pub association: String,
    pub values: ValueMap,
}

impl AssociationRequest {
    pub fn new(association: impl Into<String>, values: ValueMap) -> Self {
        Self {
            association: association.into(),
            values,
        }
    }
}

/// Resolve association requests against `base`, an insert into the table
/// the associations are declared for.
///
/// With no requests the base insert passes through untouched. Exactly one
/// request expands into a WITH chain; more than one is rejected, since the
/// generated RETURNING projection on the base insert would have to serve
/// several dependents at once.
pub fn insert_with_associations(
    base: InsertBuilder,
    associations: &AssociationMap,
    requests: Vec<AssociationRequest>,
) -> Result<InsertBuilder> {
    if requests.is_empty() {
        return Ok(base);
    }
    if requests.len() > 1 {
        return Err(Error::MultipleAssociations {
            count: requests.len(),
        });
    }
    let request = &requests[0];

    let association = associations
        .get(base.table(), &request.association)
        .ok_or_else(|| Error::UnknownAssociation {
            table: base.table().to_string(),
            association: request.association.clone(),
        })?;

    tracing::debug!(
        table = base.table(),
        association = %request.association,
        related = association.table(),
        "resolving association"
    );

    match association {
        Association::OneToMany { table, fks } => {
            Ok(expand_one_to_many(base, table, fks, &request.values))
        }
        Association::ManyToMany {
            table,
            associative_table,
            fks,
        } => Ok(expand_many_to_many(
            base,
            table,
            associative_table,
            fks,
            &request.values,
        )),
    }
}

/// The related table holds the foreign key, so one CTE suffices: bind the
/// base insert, then insert the related row drawing fk values from the
/// binding and carrying its own values as literals.
fn expand_one_to_many(
    base: InsertBuilder,
    related_table: &str,
    fks: &indexmap::IndexMap<String, String>,
    values: &ValueMap,
) -> InsertBuilder {
    let base_alias = base.table().to_string();
    let referenced: Vec<&str> = fks.values().map(String::as_str).collect();
    let base = base.set_returning(&referenced);

    let mut source = Vec::new();
    let mut targets = Vec::new();
    for (fk_column, referenced_column) in fks {
        source.push(SelectColumn::expr(Expr::qualified_column(
            base_alias.as_str(),
            referenced_column.as_str(),
        )));
        targets.push(fk_column.as_str());
    }
    for (column, value) in values {
        source.push(SelectColumn::expr(value.to_expr()));
        targets.push(column.as_str());
    }

    let related = insert_from(related_table, source, &targets);
    insert_with(&base_alias, base, related)
}

/// Both sides get a CTE binding exposing the key column their fk entry
/// references; the body inserts the associative row from those bindings.
fn expand_many_to_many(
    base: InsertBuilder,
    related_table: &str,
    associative_table: &str,
    fks: &indexmap::IndexMap<String, (String, String)>,
    values: &ValueMap,
) -> InsertBuilder {
    let base_alias = base.table().to_string();

    let mut base_keys = Vec::new();
    let mut related_keys = Vec::new();
    let mut source = Vec::new();
    let mut targets = Vec::new();
    for (fk_column, (owner_table, owner_column)) in fks {
        if owner_table == &base_alias {
            base_keys.push(owner_column.as_str());
        } else if owner_table == related_table {
            related_keys.push(owner_column.as_str());
        }
        source.push(SelectColumn::expr(Expr::qualified_column(
            owner_table.as_str(),
            owner_column.as_str(),
        )));
        targets.push(fk_column.as_str());
    }

    let base = base.set_returning(&base_keys);
    let related = insert(related_table, values.clone()).set_returning(&related_keys);

    let body = insert_from(associative_table, source, &targets);
    let chained = insert_with(&base_alias, base, body);
    insert_with(related_table, related, chained)
}
