//! SQL statement types
//!
//! This module defines the top-level statement types: SELECT, INSERT,
//! UPDATE, DELETE, WITH and UNION ALL. Statements, like expressions, are
//! immutable values: every `with_*` method consumes the statement and
//! returns a new one.

use crate::error::{Error, Result};

use super::expr::{Expr, Ident};

/// Top-level SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Select(SelectStmt),
    Insert(InsertStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    With(WithStmt),
    UnionAll(UnionAllStmt),
}

impl Stmt {
    /// Combine two statements with UNION ALL.
    ///
    /// Only SELECT statements (or nested UNION ALL chains of them) can be
    /// unioned; mutation statements are rejected with a composition error.
    pub fn union_all(left: Stmt, right: Stmt) -> Result<Stmt> {
        for side in [&left, &right] {
            match side {
                Stmt::Select(_) | Stmt::UnionAll(_) => {}
                _ => return Err(Error::UnionRequiresSelect),
            }
        }
        Ok(Stmt::UnionAll(UnionAllStmt {
            left: Box::new(left),
            right: Box::new(right),
        }))
    }
}

/// A table reference: [schema.]name [alias]
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub schema: Option<Ident>,
    pub name: Ident,
    pub alias: Option<Ident>,
}

impl TableRef {
    pub fn new(name: impl Into<Ident>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<Ident>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<Ident>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// A projected column: expr [AS alias]
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub expr: Expr,
    pub alias: Option<Ident>,
}

impl SelectColumn {
    pub fn expr(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn expr_as(expr: Expr, alias: impl Into<Ident>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }
}

/// One entry of a FROM list. Entries after the first either join against
/// the preceding entries (`join` set) or extend the cartesian product
/// (`join` unset, rendered comma-separated).
#[derive(Debug, Clone, PartialEq)]
pub struct FromItem {
    pub table: TableRef,
    pub join: Option<Join>,
}

impl FromItem {
    pub fn table(table: TableRef) -> Self {
        Self { table, join: None }
    }

    pub fn joined(table: TableRef, kind: JoinKind, on: Expr) -> Self {
        Self {
            table,
            join: Some(Join { kind, on }),
        }
    }
}

/// A join condition attached to a FROM entry
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub on: Expr,
}

/// JOIN kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// ORDER BY entry
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub direction: OrderDirection,
}

impl OrderByExpr {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Desc,
        }
    }
}

/// ORDER BY direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStmt {
    pub columns: Vec<SelectColumn>,
    pub from: Vec<FromItem>,
    pub where_clause: Option<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectStmt {
    pub fn from_table(table: TableRef) -> Self {
        Self {
            from: vec![FromItem::table(table)],
            ..Default::default()
        }
    }

    pub fn with_columns(mut self, columns: Vec<SelectColumn>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_where(mut self, expr: Expr) -> Self {
        self.where_clause = Some(expr);
        self
    }

    pub fn with_order_by(mut self, order_by: Vec<OrderByExpr>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table: TableRef,
    pub columns: Vec<Ident>,
    pub source: InsertSource,
    pub on_conflict: Option<OnConflict>,
    pub returning: Vec<SelectColumn>,
}

impl InsertStmt {
    pub fn new(table: TableRef, columns: Vec<Ident>, source: InsertSource) -> Self {
        Self {
            table,
            columns,
            source,
            on_conflict: None,
            returning: vec![],
        }
    }

    pub fn with_on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = Some(on_conflict);
        self
    }

    pub fn with_returning(mut self, returning: Vec<SelectColumn>) -> Self {
        self.returning = returning;
        self
    }
}

/// Source of the rows an INSERT writes
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// VALUES (row1), (row2), ...
    Values(Vec<Vec<Expr>>),
    /// INSERT ... SELECT ..., used to draw values from CTE bindings
    Select(Box<SelectStmt>),
}

/// ON CONFLICT ... DO UPDATE SET clause
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    /// Conflict target columns; empty means any conflicting constraint
    pub target: Vec<Ident>,
    pub set: Vec<(Ident, Expr)>,
}

impl OnConflict {
    pub fn do_update(set: Vec<(Ident, Expr)>) -> Self {
        Self {
            target: vec![],
            set,
        }
    }
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub table: TableRef,
    pub set: Vec<(Ident, Expr)>,
    pub where_clause: Option<Expr>,
    pub returning: Vec<SelectColumn>,
}

impl UpdateStmt {
    pub fn new(table: TableRef, set: Vec<(Ident, Expr)>) -> Self {
        Self {
            table,
            set,
            where_clause: None,
            returning: vec![],
        }
    }

    pub fn with_where(mut self, expr: Expr) -> Self {
        self.where_clause = Some(expr);
        self
    }

    pub fn with_returning(mut self, returning: Vec<SelectColumn>) -> Self {
        self.returning = returning;
        self
    }
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub table: TableRef,
    pub where_clause: Option<Expr>,
    pub returning: Vec<SelectColumn>,
}

impl DeleteStmt {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            where_clause: None,
            returning: vec![],
        }
    }

    pub fn with_where(mut self, expr: Expr) -> Self {
        self.where_clause = Some(expr);
        self
    }

    pub fn with_returning(mut self, returning: Vec<SelectColumn>) -> Self {
        self.returning = returning;
        self
    }
}

/// One CTE binding of a WITH statement
#[derive(Debug, Clone, PartialEq)]
pub struct CteBinding {
    pub alias: Ident,
    pub stmt: Stmt,
}

impl CteBinding {
    pub fn new(alias: impl Into<Ident>, stmt: Stmt) -> Self {
        Self {
            alias: alias.into(),
            stmt,
        }
    }
}

/// WITH statement: ordered CTE bindings plus a body.
///
/// Bindings preserve insertion order; SQL gives later bindings visibility
/// of earlier ones, and the association engine depends on that to sequence
/// dependent inserts.
#[derive(Debug, Clone, PartialEq)]
pub struct WithStmt {
    pub bindings: Vec<CteBinding>,
    pub body: Box<Stmt>,
}

impl WithStmt {
    pub fn new(bindings: Vec<CteBinding>, body: Stmt) -> Self {
        Self {
            bindings,
            body: Box::new(body),
        }
    }
}

/// UNION ALL of two statements; construct via [`Stmt::union_all`]
#[derive(Debug, Clone, PartialEq)]
pub struct UnionAllStmt {
    pub left: Box<Stmt>,
    pub right: Box<Stmt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_all_requires_selects() {
        let select = Stmt::Select(SelectStmt::from_table(TableRef::new("a")));
        let insert = Stmt::Insert(InsertStmt::new(
            TableRef::new("b"),
            vec![],
            InsertSource::Values(vec![vec![]]),
        ));

        assert!(Stmt::union_all(select.clone(), select.clone()).is_ok());
        assert!(matches!(
            Stmt::union_all(select.clone(), insert.clone()),
            Err(Error::UnionRequiresSelect)
        ));
        assert!(matches!(
            Stmt::union_all(insert.clone(), select.clone()),
            Err(Error::UnionRequiresSelect)
        ));

        // a union chains with further selects
        let chain = Stmt::union_all(select.clone(), select.clone()).unwrap();
        assert!(Stmt::union_all(chain, select).is_ok());
    }

    #[test]
    fn with_bindings_preserve_order() {
        let first = CteBinding::new("a", Stmt::Select(SelectStmt::default()));
        let second = CteBinding::new("b", Stmt::Select(SelectStmt::default()));
        let with = WithStmt::new(
            vec![first, second],
            Stmt::Select(SelectStmt::from_table(TableRef::new("a"))),
        );
        let names: Vec<&str> = with.bindings.iter().map(|b| b.alias.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
