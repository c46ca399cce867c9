//! Statement builders
//!
//! Composable constructors and transformers for SELECT, INSERT, UPDATE,
//! DELETE and UPSERT statements. Every operation consumes the builder and
//! returns a new one; nothing is mutated in place, so a builder can be
//! cloned at any point and both copies extended independently.
//!
//! Naming convention: `append_*` operations are cumulative (projection,
//! joins), `set_*` operations replace the clause they name (WHERE, ORDER
//! BY, LIMIT, OFFSET, RETURNING).

use crate::ast::{
    render, ColumnRef, CteBinding, DeleteStmt, Expr, FromItem, Ident, InsertSource, InsertStmt,
    JoinKind, OnConflict, OrderByExpr, OrderDirection, SelectColumn, SelectStmt, Stmt, TableRef,
    UnionAllStmt, UpdateStmt, WithStmt,
};
use crate::value::{SqlValue, ValueMap};

/// Collect (column, value) pairs into an ordered map
fn collect_values<K, V, I>(pairs: I) -> ValueMap
where
    K: Into<String>,
    V: Into<SqlValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Build the equality-list comparison `(col1, col2) = (val1, val2)`.
///
/// Composite keys compare as one list-vs-list expression rather than an
/// AND-chain.
fn eq_list(values: &ValueMap) -> Expr {
    let columns = values.keys().map(|k| Expr::column(k.as_str())).collect();
    let literals = values.values().map(SqlValue::to_expr).collect();
    Expr::list(columns).eq(Expr::list(literals))
}

/// Equality list over column references on both sides, for join
/// conditions. Each side is a dotted `table.column` path.
fn join_eq_list(on: &[(&str, &str)]) -> Expr {
    let left = on
        .iter()
        .map(|(l, _)| Expr::Column(ColumnRef::parse(l)))
        .collect();
    let right = on
        .iter()
        .map(|(_, r)| Expr::Column(ColumnRef::parse(r)))
        .collect();
    Expr::list(left).eq(Expr::list(right))
}

// =========================================================================
// SELECT
// =========================================================================

/// Builder for SELECT statements
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    stmt: SelectStmt,
}

impl SelectBuilder {
    /// Start a SELECT over a table, with an empty projection
    pub fn table(name: impl Into<Ident>) -> Self {
        Self {
            stmt: SelectStmt::from_table(TableRef::new(name)),
        }
    }

    /// Start a SELECT over an aliased table
    pub fn aliased(name: impl Into<Ident>, alias: impl Into<Ident>) -> Self {
        Self {
            stmt: SelectStmt::from_table(TableRef::new(name).with_alias(alias)),
        }
    }

    /// Schema-qualify the initial table
    pub fn in_schema(mut self, schema: impl Into<Ident>) -> Self {
        if let Some(first) = self.stmt.from.first_mut() {
            first.table.schema = Some(schema.into());
        }
        self
    }

    /// Append bare column references to the projection. Cumulative:
    /// calling twice projects both sets, in call order.
    pub fn append_columns(mut self, columns: &[&str]) -> Self {
        self.stmt
            .columns
            .extend(columns.iter().map(|c| SelectColumn::expr(Expr::column(*c))));
        self
    }

    /// Append table-qualified column references to the projection
    pub fn append_columns_from(mut self, table: &str, columns: &[&str]) -> Self {
        self.stmt.columns.extend(
            columns
                .iter()
                .map(|c| SelectColumn::expr(Expr::qualified_column(table, *c))),
        );
        self
    }

    /// Append aliased column references: (column, alias) pairs
    pub fn append_aliased_columns(mut self, columns: &[(&str, &str)]) -> Self {
        self.stmt.columns.extend(
            columns
                .iter()
                .map(|(c, a)| SelectColumn::expr_as(Expr::column(*c), *a)),
        );
        self
    }

    /// Append a literal value to the projection
    pub fn append_literal(mut self, value: impl Into<SqlValue>, alias: Option<&str>) -> Self {
        let expr = value.into().to_expr();
        self.stmt.columns.push(match alias {
            Some(a) => SelectColumn::expr_as(expr, a),
            None => SelectColumn::expr(expr),
        });
        self
    }

    /// Append a scalar subquery to the projection
    pub fn append_subquery(mut self, query: SelectBuilder, alias: impl Into<Ident>) -> Self {
        self.stmt.columns.push(SelectColumn::expr_as(
            Expr::Subquery(Box::new(query.stmt)),
            alias,
        ));
        self
    }

    /// Replace the whole projection with bare column references. The
    /// replacing counterpart of the cumulative `append_*` operations,
    /// mirroring `set_returning` on the mutation builders.
    pub fn set_columns(mut self, columns: &[&str]) -> Self {
        self.stmt.columns = columns
            .iter()
            .map(|c| SelectColumn::expr(Expr::column(*c)))
            .collect();
        self
    }

    /// Replace WHERE with an equality-list comparison over the given
    /// column/value pairs
    pub fn set_where_eq<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.stmt.where_clause = Some(eq_list(&collect_values(pairs)));
        self
    }

    /// Replace WHERE with an arbitrary expression
    pub fn set_where_expr(mut self, expr: Expr) -> Self {
        self.stmt.where_clause = Some(expr);
        self
    }

    /// Replace WHERE with a regular-expression match against the `||`
    /// concatenation of the given columns
    pub fn filter_regex(self, columns: &[&str], pattern: &str) -> Self {
        let mut refs = columns.iter().map(|c| Expr::column(*c));
        let concatenated = match refs.next() {
            Some(first) => refs.fold(first, Expr::concat),
            None => Expr::string(""),
        };
        self.set_where_expr(concatenated.regex_match(pattern))
    }

    /// Replace ORDER BY with the given (column, direction) entries
    pub fn set_order(mut self, columns: &[(&str, OrderDirection)]) -> Self {
        self.stmt.order_by = columns
            .iter()
            .map(|(c, d)| OrderByExpr {
                expr: Expr::column(*c),
                direction: *d,
            })
            .collect();
        self
    }

    /// Replace ORDER BY with ascending entries for the given columns
    pub fn set_order_asc(self, columns: &[&str]) -> Self {
        let specs: Vec<(&str, OrderDirection)> = columns
            .iter()
            .map(|c| (*c, OrderDirection::Asc))
            .collect();
        self.set_order(&specs)
    }

    /// Append a joined relation. `on` pairs are dotted `table.column`
    /// paths compared as a single equality list, so composite join keys
    /// stay one expression.
    pub fn append_join(mut self, relation: TableRef, on: &[(&str, &str)], kind: JoinKind) -> Self {
        self.stmt
            .from
            .push(FromItem::joined(relation, kind, join_eq_list(on)));
        self
    }

    /// Set LIMIT; last call wins
    pub fn set_limit(mut self, limit: u64) -> Self {
        self.stmt.limit = Some(limit);
        self
    }

    /// Set OFFSET; last call wins
    pub fn set_offset(mut self, offset: u64) -> Self {
        self.stmt.offset = Some(offset);
        self
    }

    /// Combine with another SELECT via UNION ALL
    pub fn union_all(self, other: SelectBuilder) -> UnionBuilder {
        // both sides are selects by construction
        UnionBuilder {
            stmt: Stmt::UnionAll(UnionAllStmt {
                left: Box::new(self.to_stmt()),
                right: Box::new(other.to_stmt()),
            }),
        }
    }

    pub fn to_stmt(&self) -> Stmt {
        Stmt::Select(self.stmt.clone())
    }

    pub fn to_sql(&self) -> String {
        render(&self.to_stmt())
    }
}

/// Builder holding a UNION ALL chain of SELECT statements
#[derive(Debug, Clone)]
pub struct UnionBuilder {
    stmt: Stmt,
}

impl UnionBuilder {
    /// Extend the chain with another SELECT
    pub fn union_all(self, other: SelectBuilder) -> Self {
        Self {
            stmt: Stmt::UnionAll(UnionAllStmt {
                left: Box::new(self.stmt),
                right: Box::new(other.to_stmt()),
            }),
        }
    }

    pub fn to_stmt(&self) -> Stmt {
        self.stmt.clone()
    }

    pub fn to_sql(&self) -> String {
        render(&self.stmt)
    }
}

// =========================================================================
// INSERT / UPSERT
// =========================================================================

/// Builder for INSERT statements, possibly wrapped in a WITH chain by
/// [`insert_with`] or the association engine
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    stmt: Stmt,
}

impl InsertBuilder {
    /// The target table of the (innermost) insert
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Replace the RETURNING projection. Not cumulative: a second call
    /// discards the first column set. On a WITH-wrapped insert the clause
    /// lands on the innermost DML body.
    pub fn set_returning(mut self, columns: &[&str]) -> Self {
        let returning: Vec<SelectColumn> = columns
            .iter()
            .map(|c| SelectColumn::expr(Expr::column(*c)))
            .collect();
        self.stmt = set_returning_on(self.stmt, returning);
        self
    }

    pub fn to_stmt(&self) -> Stmt {
        self.stmt.clone()
    }

    pub fn to_sql(&self) -> String {
        render(&self.stmt)
    }
}

/// Replace the RETURNING clause of a DML statement, reaching through a
/// WITH wrapper to its body. Non-DML statements pass through unchanged.
fn set_returning_on(stmt: Stmt, returning: Vec<SelectColumn>) -> Stmt {
    match stmt {
        Stmt::Insert(s) => Stmt::Insert(s.with_returning(returning)),
        Stmt::Update(s) => Stmt::Update(s.with_returning(returning)),
        Stmt::Delete(s) => Stmt::Delete(s.with_returning(returning)),
        Stmt::With(w) => Stmt::With(WithStmt {
            bindings: w.bindings,
            body: Box::new(set_returning_on(*w.body, returning)),
        }),
        other => other,
    }
}

/// Build an INSERT ... VALUES over one row. Column order follows the
/// iteration order of `values`; each value maps through
/// [`SqlValue::to_expr`], so omitted fields insert DEFAULT.
pub fn insert<K, V, I>(table: &str, values: I) -> InsertBuilder
where
    K: Into<String>,
    V: Into<SqlValue>,
    I: IntoIterator<Item = (K, V)>,
{
    let values = collect_values(values);
    let columns: Vec<Ident> = values.keys().map(Ident::new).collect();
    let row: Vec<Expr> = values.values().map(SqlValue::to_expr).collect();
    InsertBuilder {
        table: table.to_string(),
        stmt: Stmt::Insert(InsertStmt::new(
            TableRef::new(table),
            columns,
            InsertSource::Values(vec![row]),
        )),
    }
}

/// Build an INSERT whose source is a SELECT over the distinct tables the
/// source columns reference. Used to draw values from previously bound
/// CTEs instead of literals.
pub fn insert_from(
    table: &str,
    source_columns: Vec<SelectColumn>,
    target_columns: &[&str],
) -> InsertBuilder {
    // distinct referenced tables, preserving first-mention order
    let mut tables: Vec<&Ident> = Vec::new();
    for col in &source_columns {
        if let Expr::Column(ColumnRef {
            table: Some(t), ..
        }) = &col.expr
        {
            if !tables.contains(&t) {
                tables.push(t);
            }
        }
    }
    let from: Vec<FromItem> = tables
        .into_iter()
        .map(|t| FromItem::table(TableRef::new(t.clone())))
        .collect();

    let source = SelectStmt {
        columns: source_columns,
        from,
        ..Default::default()
    };

    InsertBuilder {
        table: table.to_string(),
        stmt: Stmt::Insert(InsertStmt::new(
            TableRef::new(table),
            target_columns.iter().map(|c| Ident::new(*c)).collect(),
            InsertSource::Select(Box::new(source)),
        )),
    }
}

/// Build an INSERT with an ON CONFLICT DO UPDATE clause. The SET list
/// comes from `update_values`, defaulting to `insert_values`.
pub fn upsert(
    table: &str,
    insert_values: ValueMap,
    update_values: Option<ValueMap>,
) -> InsertBuilder {
    let set: Vec<(Ident, Expr)> = update_values
        .as_ref()
        .unwrap_or(&insert_values)
        .iter()
        .map(|(k, v)| (Ident::new(k.as_str()), v.to_expr()))
        .collect();

    let builder = insert(table, insert_values);
    let stmt = match builder.stmt {
        Stmt::Insert(s) => Stmt::Insert(s.with_on_conflict(OnConflict::do_update(set))),
        other => other,
    };
    InsertBuilder {
        table: builder.table,
        stmt,
    }
}

/// Prepend `context` as a CTE binding named `alias` onto `target`.
///
/// When `target` is already a WITH statement the binding joins its
/// existing list instead of nesting another WITH, keeping the
/// left-to-right dependency order SQL requires.
pub fn insert_with(alias: &str, context: InsertBuilder, target: InsertBuilder) -> InsertBuilder {
    let binding = CteBinding::new(alias, context.to_stmt());
    let stmt = match target.stmt {
        Stmt::With(mut w) => {
            tracing::debug!(alias, "extending existing WITH chain");
            w.bindings.push(binding);
            Stmt::With(w)
        }
        body => Stmt::With(WithStmt::new(vec![binding], body)),
    };
    InsertBuilder {
        table: target.table,
        stmt,
    }
}

// =========================================================================
// UPDATE / DELETE
// =========================================================================

/// Builder for UPDATE statements
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    stmt: UpdateStmt,
}

impl UpdateBuilder {
    /// Replace the RETURNING projection (not cumulative)
    pub fn set_returning(mut self, columns: &[&str]) -> Self {
        self.stmt.returning = columns
            .iter()
            .map(|c| SelectColumn::expr(Expr::column(*c)))
            .collect();
        self
    }

    pub fn to_stmt(&self) -> Stmt {
        Stmt::Update(self.stmt.clone())
    }

    pub fn to_sql(&self) -> String {
        render(&self.to_stmt())
    }
}

/// Build an UPDATE. WHERE is the equality list over `keys`; the SET list
/// skips values marked [`SqlValue::Omitted`] (an omitted field is left
/// untouched, unlike an explicit NULL which assigns SQL NULL).
pub fn update<K1, V1, I1, K2, V2, I2>(table: &str, keys: I1, sets: I2) -> UpdateBuilder
where
    K1: Into<String>,
    V1: Into<SqlValue>,
    I1: IntoIterator<Item = (K1, V1)>,
    K2: Into<String>,
    V2: Into<SqlValue>,
    I2: IntoIterator<Item = (K2, V2)>,
{
    let keys = collect_values(keys);
    let sets = collect_values(sets);
    let set: Vec<(Ident, Expr)> = sets
        .iter()
        .filter(|(_, v)| !v.is_omitted())
        .map(|(k, v)| (Ident::new(k.as_str()), v.to_expr()))
        .collect();
    UpdateBuilder {
        stmt: UpdateStmt::new(TableRef::new(table), set).with_where(eq_list(&keys)),
    }
}

/// Builder for DELETE statements
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    stmt: DeleteStmt,
}

impl DeleteBuilder {
    /// Replace the RETURNING projection (not cumulative)
    pub fn set_returning(mut self, columns: &[&str]) -> Self {
        self.stmt.returning = columns
            .iter()
            .map(|c| SelectColumn::expr(Expr::column(*c)))
            .collect();
        self
    }

    pub fn to_stmt(&self) -> Stmt {
        Stmt::Delete(self.stmt.clone())
    }

    pub fn to_sql(&self) -> String {
        render(&self.to_stmt())
    }
}

/// Build a DELETE with an equality-list WHERE over `keys`
pub fn delete<K, V, I>(table: &str, keys: I) -> DeleteBuilder
where
    K: Into<String>,
    V: Into<SqlValue>,
    I: IntoIterator<Item = (K, V)>,
{
    let keys = collect_values(keys);
    DeleteBuilder {
        stmt: DeleteStmt::new(TableRef::new(table)).with_where(eq_list(&keys)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{now, value_map, SqlValue};

    #[test]
    fn select_with_schema() {
        let sql = SelectBuilder::table("tables")
            .in_schema("information_schema")
            .append_columns(&["table_name"])
            .to_sql();
        assert_eq!(sql, "SELECT table_name FROM information_schema.tables");
    }

    #[test]
    fn selection_is_cumulative() {
        let sql = SelectBuilder::table("t")
            .append_columns(&["a"])
            .append_columns(&["b"])
            .to_sql();
        assert_eq!(sql, "SELECT a, b FROM t");
    }

    #[test]
    fn aliased_table_and_columns() {
        let sql = SelectBuilder::aliased("table_constraints", "pk_tco")
            .in_schema("information_schema")
            .append_columns_from("pk_tco", &["table_name"])
            .to_sql();
        assert_eq!(
            sql,
            "SELECT pk_tco.table_name FROM information_schema.table_constraints AS pk_tco"
        );
    }

    #[test]
    fn set_columns_replaces_projection() {
        let sql = SelectBuilder::table("t")
            .append_columns(&["a", "b"])
            .set_columns(&["c"])
            .to_sql();
        assert_eq!(sql, "SELECT c FROM t");
    }

    #[test]
    fn where_eq_is_single_list_comparison() {
        let sql = SelectBuilder::table("t")
            .append_columns(&["a"])
            .set_where_eq([("a", 1i64), ("b", 2i64)])
            .to_sql();
        assert_eq!(sql, "SELECT a FROM t WHERE ((a, b) = (('1'), ('2')))");
    }

    #[test]
    fn where_is_replacing() {
        let sql = SelectBuilder::table("t")
            .append_columns(&["a"])
            .set_where_eq([("a", 1i64)])
            .set_where_eq([("b", 2i64)])
            .to_sql();
        assert_eq!(sql, "SELECT a FROM t WHERE ((b) = (('2')))");
    }

    #[test]
    fn filter_regex_concatenates_columns() {
        let sql = SelectBuilder::table("t")
            .append_columns(&["a"])
            .filter_regex(&["a", "b"], "^x")
            .to_sql();
        assert_eq!(sql, "SELECT a FROM t WHERE ((a || b) ~ ('^x'))");
    }

    #[test]
    fn order_limit_offset() {
        let sql = SelectBuilder::table("t")
            .append_columns(&["a"])
            .set_order(&[("a", OrderDirection::Desc)])
            .set_limit(10)
            .set_offset(5)
            .to_sql();
        assert_eq!(sql, "SELECT a FROM t ORDER BY a DESC LIMIT 10 OFFSET 5");
    }

    #[test]
    fn limit_last_call_wins() {
        let sql = SelectBuilder::table("t")
            .append_columns(&["a"])
            .set_limit(10)
            .set_limit(3)
            .to_sql();
        assert_eq!(sql, "SELECT a FROM t LIMIT 3");
    }

    #[test]
    fn join_with_composite_key() {
        let sql = SelectBuilder::table("orders")
            .append_columns_from("orders", &["id"])
            .append_join(
                TableRef::new("lines"),
                &[
                    ("orders.id", "lines.order_id"),
                    ("orders.region", "lines.region"),
                ],
                JoinKind::Inner,
            )
            .to_sql();
        assert_eq!(
            sql,
            "SELECT orders.id FROM orders INNER JOIN lines ON \
             ((orders.id, orders.region) = (lines.order_id, lines.region))"
        );
    }

    #[test]
    fn union_all_of_selects() {
        let sql = SelectBuilder::table("a")
            .append_columns(&["x"])
            .union_all(SelectBuilder::table("b").append_columns(&["x"]))
            .to_sql();
        assert_eq!(sql, "(SELECT x FROM a) UNION ALL (SELECT x FROM b)");
    }

    #[test]
    fn insert_values_follow_map_order() {
        let sql = insert("some_table", [("id", SqlValue::Omitted), ("data", "test".into())])
            .set_returning(&["id"])
            .to_sql();
        assert_eq!(
            sql,
            "INSERT INTO some_table (id, data) VALUES (DEFAULT, ('test')) RETURNING id"
        );
    }

    #[test]
    fn insert_with_raw_function_value() {
        let sql = insert(
            "user",
            [("data", SqlValue::from("test")), ("created_at", now())],
        )
        .to_sql();
        assert_eq!(
            sql,
            "INSERT INTO \"user\" (data, created_at) VALUES (('test'), now())"
        );
    }

    #[test]
    fn returning_is_replacing() {
        let sql = insert("user", [("data", "test")])
            .set_returning(&["data"])
            .set_returning(&["data", "tags"])
            .to_sql();
        assert_eq!(
            sql,
            "INSERT INTO \"user\" (data) VALUES (('test')) RETURNING data, tags"
        );
    }

    #[test]
    fn upsert_preserves_insert_and_adds_conflict_clause() {
        let sql = upsert(
            "some_table",
            value_map([("id", SqlValue::from(1i64)), ("updated", false.into())]),
            Some(value_map([("updated", true)])),
        )
        .to_sql();
        assert_eq!(
            sql,
            "INSERT INTO some_table (id, updated) VALUES (('1'), ('false')) \
             ON CONFLICT DO UPDATE SET updated = ('true')"
        );
    }

    #[test]
    fn upsert_defaults_conflict_set_to_insert_values() {
        let sql = upsert("t", value_map([("data", "x")]), None).to_sql();
        assert_eq!(
            sql,
            "INSERT INTO t (data) VALUES (('x')) ON CONFLICT DO UPDATE SET data = ('x')"
        );
    }

    #[test]
    fn update_skips_omitted_sets() {
        let sql = update(
            "some_table",
            [("id", SqlValue::from(1i64))],
            [
                ("data", SqlValue::from("test")),
                ("skipped", SqlValue::Omitted),
                ("cleared", SqlValue::Null),
            ],
        )
        .to_sql();
        assert_eq!(
            sql,
            "UPDATE some_table SET data = ('test'), cleared = null \
             WHERE ((id) = (('1')))"
        );
    }

    #[test]
    fn delete_with_key() {
        let sql = delete("some_table", [("id", 1i64)]).to_sql();
        assert_eq!(sql, "DELETE FROM some_table WHERE ((id) = (('1')))");
    }

    #[test]
    fn insert_with_binds_context_first() {
        let base = insert("user", [("data", "test")]).set_returning(&["id"]);
        let target = insert("user_account", [("account_id", 0i64), ("user_id", 0i64)]);
        let sql = insert_with("user", base, target)
            .set_returning(&["created_at"])
            .to_sql();
        assert_eq!(
            sql,
            "WITH \"user\" AS (INSERT INTO \"user\" (data) VALUES (('test')) RETURNING id) \
             INSERT INTO user_account (account_id, user_id) VALUES (('0'), ('0')) \
             RETURNING created_at"
        );
    }

    #[test]
    fn insert_with_appends_to_existing_chain() {
        let a = insert("a", [("x", 1i64)]);
        let b = insert("b", [("y", 2i64)]);
        let target = insert("c", [("z", 3i64)]);
        let chained = insert_with("b", b, insert_with("a", a, target));
        match chained.to_stmt() {
            Stmt::With(w) => {
                let aliases: Vec<&str> = w.bindings.iter().map(|x| x.alias.as_str()).collect();
                assert_eq!(aliases, ["a", "b"]);
            }
            _ => panic!("expected WITH"),
        }
    }

    #[test]
    fn insert_from_selects_distinct_tables() {
        let sql = insert_from(
            "user_account",
            vec![
                SelectColumn::expr(Expr::qualified_column("user", "id")),
                SelectColumn::expr(Expr::qualified_column("account", "id")),
                SelectColumn::expr(Expr::qualified_column("user", "id")),
            ],
            &["user_id", "account_id", "extra_user_id"],
        )
        .to_sql();
        assert_eq!(
            sql,
            "INSERT INTO user_account (user_id, account_id, extra_user_id) \
             SELECT \"user\".id, account.id, \"user\".id FROM \"user\", account"
        );
    }
}
