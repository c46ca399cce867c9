//! SQL string rendering
//!
//! This module converts AST nodes to SQL text. It is the only place in
//! the crate where SQL strings are constructed.
//!
//! # Safety
//!
//! Identifiers that do not match the simple fast path are double-quoted
//! with embedded quotes doubled; string literals are single-quoted with
//! embedded quotes doubled. Trees hold raw text, so escaping applies on
//! every render and adversarial input cannot break out of its syntactic
//! position.
//!
//! Rendering is deterministic and side-effect free; serializing the same
//! statement twice yields byte-identical SQL.

use std::fmt::Write;

use super::expr::{ColumnRef, Expr, FunctionCall, Ident, Literal};
use super::stmt::*;

/// Trait for AST nodes that can be rendered to SQL
pub trait Render {
    fn render(&self, renderer: &mut SqlRenderer);
}

impl Render for Stmt {
    fn render(&self, renderer: &mut SqlRenderer) {
        renderer.render_stmt(self);
    }
}

impl Render for SelectStmt {
    fn render(&self, renderer: &mut SqlRenderer) {
        renderer.render_select(self);
    }
}

impl Render for InsertStmt {
    fn render(&self, renderer: &mut SqlRenderer) {
        renderer.render_insert(self);
    }
}

impl Render for UpdateStmt {
    fn render(&self, renderer: &mut SqlRenderer) {
        renderer.render_update(self);
    }
}

impl Render for DeleteStmt {
    fn render(&self, renderer: &mut SqlRenderer) {
        renderer.render_delete(self);
    }
}

impl Render for Expr {
    fn render(&self, renderer: &mut SqlRenderer) {
        renderer.render_expr(self);
    }
}

/// Double every embedded double quote; the renderer adds the surrounding
/// quotes when the identifier misses the bare fast path.
pub fn escape_identifier(identifier: &str) -> String {
    identifier.replace('"', "\"\"")
}

/// Double every embedded single quote: `O'Brien` becomes `O''Brien`.
pub fn escape_literal(literal: &str) -> String {
    literal.replace('\'', "''")
}

/// PostgreSQL reserved words that force quoting even for simple
/// identifiers. Sorted for binary search.
const RESERVED_KEYWORDS: &[&str] = &[
    "all",
    "analyse",
    "analyze",
    "and",
    "any",
    "array",
    "as",
    "asc",
    "asymmetric",
    "authorization",
    "binary",
    "both",
    "case",
    "cast",
    "check",
    "collate",
    "column",
    "constraint",
    "create",
    "cross",
    "current_catalog",
    "current_date",
    "current_role",
    "current_time",
    "current_timestamp",
    "current_user",
    "default",
    "deferrable",
    "desc",
    "distinct",
    "do",
    "else",
    "end",
    "except",
    "false",
    "fetch",
    "for",
    "foreign",
    "freeze",
    "from",
    "full",
    "grant",
    "group",
    "having",
    "ilike",
    "in",
    "initially",
    "inner",
    "intersect",
    "into",
    "is",
    "isnull",
    "join",
    "lateral",
    "leading",
    "left",
    "like",
    "limit",
    "localtime",
    "localtimestamp",
    "natural",
    "not",
    "notnull",
    "null",
    "offset",
    "on",
    "only",
    "or",
    "order",
    "outer",
    "overlaps",
    "placing",
    "primary",
    "references",
    "returning",
    "right",
    "select",
    "session_user",
    "similar",
    "some",
    "symmetric",
    "table",
    "then",
    "to",
    "trailing",
    "true",
    "union",
    "unique",
    "user",
    "using",
    "variadic",
    "verbose",
    "when",
    "where",
    "window",
    "with",
];

/// An identifier may render bare when it is all-lowercase simple SQL and
/// not a reserved word. Quoting would also be correct; the fast path only
/// keeps common output readable.
fn is_safe_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let safe_shape = match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => chars
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$'),
        _ => false,
    };
    safe_shape && RESERVED_KEYWORDS.binary_search(&s).is_err()
}

/// Default buffer capacity for simple statements
const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Buffer capacity for statements carrying CTE chains
const CTE_BUFFER_CAPACITY: usize = 1024;

/// SQL renderer: walks a statement tree and accumulates SQL text
pub struct SqlRenderer {
    output: String,
}

impl SqlRenderer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: String::with_capacity(capacity),
        }
    }

    /// Estimate buffer capacity from statement shape
    fn estimate_capacity(stmt: &Stmt) -> usize {
        match stmt {
            Stmt::With(_) | Stmt::UnionAll(_) => CTE_BUFFER_CAPACITY,
            _ => DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Take ownership of the rendered SQL text
    pub fn into_sql(self) -> String {
        self.output
    }

    // =========================================================================
    // Statement rendering
    // =========================================================================

    pub fn render_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Select(s) => self.render_select(s),
            Stmt::Insert(s) => self.render_insert(s),
            Stmt::Update(s) => self.render_update(s),
            Stmt::Delete(s) => self.render_delete(s),
            Stmt::With(s) => self.render_with(s),
            Stmt::UnionAll(s) => self.render_union_all(s),
        }
    }

    fn render_select(&mut self, stmt: &SelectStmt) {
        self.write("SELECT ");
        self.render_select_columns(&stmt.columns);

        if !stmt.from.is_empty() {
            if !stmt.columns.is_empty() {
                self.write(" ");
            }
            self.write("FROM ");
            self.render_from(&stmt.from);
        }

        if let Some(where_clause) = &stmt.where_clause {
            self.write(" WHERE ");
            self.render_expr(where_clause);
        }

        if !stmt.order_by.is_empty() {
            self.write(" ORDER BY ");
            for (i, ob) in stmt.order_by.iter().enumerate() {
                if i > 0 {
                    self.write(", ");
                }
                self.render_expr(&ob.expr);
                self.write(" ");
                self.write(ob.direction.as_sql());
            }
        }

        if let Some(limit) = stmt.limit {
            write!(self.output, " LIMIT {limit}").expect("write to string");
        }

        if let Some(offset) = stmt.offset {
            write!(self.output, " OFFSET {offset}").expect("write to string");
        }
    }

    fn render_insert(&mut self, stmt: &InsertStmt) {
        self.write("INSERT INTO ");
        self.render_table_ref(&stmt.table);

        if !stmt.columns.is_empty() {
            self.write(" (");
            for (i, col) in stmt.columns.iter().enumerate() {
                if i > 0 {
                    self.write(", ");
                }
                self.write_ident(col);
            }
            self.write(")");
        }

        match &stmt.source {
            InsertSource::Values(rows) => {
                self.write(" VALUES ");
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write("(");
                    self.render_expr_list(row);
                    self.write(")");
                }
            }
            InsertSource::Select(query) => {
                self.write(" ");
                self.render_select(query);
            }
        }

        if let Some(on_conflict) = &stmt.on_conflict {
            self.write(" ON CONFLICT ");
            if !on_conflict.target.is_empty() {
                self.write("(");
                for (i, col) in on_conflict.target.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write_ident(col);
                }
                self.write(") ");
            }
            self.write("DO UPDATE SET ");
            self.render_set_list(&on_conflict.set);
        }

        self.render_returning(&stmt.returning);
    }

    fn render_update(&mut self, stmt: &UpdateStmt) {
        self.write("UPDATE ");
        self.render_table_ref(&stmt.table);
        self.write(" SET ");
        self.render_set_list(&stmt.set);

        if let Some(where_clause) = &stmt.where_clause {
            self.write(" WHERE ");
            self.render_expr(where_clause);
        }

        self.render_returning(&stmt.returning);
    }

    fn render_delete(&mut self, stmt: &DeleteStmt) {
        self.write("DELETE FROM ");
        self.render_table_ref(&stmt.table);

        if let Some(where_clause) = &stmt.where_clause {
            self.write(" WHERE ");
            self.render_expr(where_clause);
        }

        self.render_returning(&stmt.returning);
    }

    fn render_with(&mut self, stmt: &WithStmt) {
        self.write("WITH ");
        for (i, binding) in stmt.bindings.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write_ident(&binding.alias);
            self.write(" AS (");
            self.render_stmt(&binding.stmt);
            self.write(")");
        }
        self.write(" ");
        self.render_stmt(&stmt.body);
    }

    fn render_union_all(&mut self, stmt: &UnionAllStmt) {
        self.write("(");
        self.render_stmt(&stmt.left);
        self.write(") UNION ALL (");
        self.render_stmt(&stmt.right);
        self.write(")");
    }

    // =========================================================================
    // Clause rendering
    // =========================================================================

    fn render_from(&mut self, from: &[FromItem]) {
        for (i, item) in from.iter().enumerate() {
            match &item.join {
                Some(join) if i > 0 => {
                    self.write(" ");
                    self.write(join.kind.as_sql());
                    self.write(" ");
                    self.render_table_ref(&item.table);
                    self.write(" ON ");
                    self.render_expr(&join.on);
                }
                _ => {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.render_table_ref(&item.table);
                }
            }
        }
    }

    fn render_select_columns(&mut self, columns: &[SelectColumn]) {
        for (i, col) in columns.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.render_expr(&col.expr);
            if let Some(alias) = &col.alias {
                self.write(" AS ");
                self.write_ident(alias);
            }
        }
    }

    fn render_returning(&mut self, returning: &[SelectColumn]) {
        if returning.is_empty() {
            return;
        }
        self.write(" RETURNING ");
        self.render_select_columns(returning);
    }

    fn render_set_list(&mut self, set: &[(Ident, Expr)]) {
        for (i, (col, expr)) in set.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write_ident(col);
            self.write(" = ");
            self.render_expr(expr);
        }
    }

    fn render_table_ref(&mut self, table: &TableRef) {
        if let Some(schema) = &table.schema {
            self.write_ident(schema);
            self.write(".");
        }
        self.write_ident(&table.name);
        if let Some(alias) = &table.alias {
            self.write(" AS ");
            self.write_ident(alias);
        }
    }

    // =========================================================================
    // Expression rendering
    // =========================================================================

    pub fn render_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Column(col) => self.render_column_ref(col),

            Expr::Literal(lit) => self.render_literal(lit),

            Expr::FunctionCall(call) => self.render_function_call(call),

            Expr::BinaryOp { left, op, right } => {
                // binary operations always carry their own parentheses, so
                // nesting never needs precedence analysis
                self.write("(");
                self.render_expr(left);
                self.write(" ");
                self.write(op.as_sql());
                self.write(" ");
                self.render_expr(right);
                self.write(")");
            }

            Expr::List(items) => {
                self.write("(");
                self.render_expr_list(items);
                self.write(")");
            }

            Expr::Subquery(query) => {
                self.write("(");
                self.render_select(query);
                self.write(")");
            }
        }
    }

    fn render_column_ref(&mut self, col: &ColumnRef) {
        if let Some(schema) = &col.schema {
            self.write_ident(schema);
            self.write(".");
        }
        if let Some(table) = &col.table {
            self.write_ident(table);
            self.write(".");
        }
        self.write_ident(&col.column);
    }

    fn render_literal(&mut self, lit: &Literal) {
        match lit {
            Literal::Null => self.write("null"),
            Literal::Default => self.write("DEFAULT"),
            Literal::Integer(n) => write!(self.output, "{n}").expect("write to string"),
            // string literals carry their own parentheses, matching the
            // shape of every other composite expression
            Literal::String(s) => {
                self.write("(");
                self.write_literal(s);
                self.write(")");
            }
        }
    }

    fn render_function_call(&mut self, call: &FunctionCall) {
        self.write_ident(&call.name);
        self.write("(");
        self.render_expr_list(&call.args);
        self.write(")");
    }

    fn render_expr_list(&mut self, exprs: &[Expr]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.render_expr(expr);
        }
    }

    // =========================================================================
    // Low-level output methods
    // =========================================================================

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn write_ident(&mut self, ident: &Ident) {
        let raw = ident.as_str();
        if is_safe_identifier(raw) {
            self.output.push_str(raw);
        } else {
            self.output.push('"');
            self.output.push_str(&escape_identifier(raw));
            self.output.push('"');
        }
    }

    fn write_literal(&mut self, s: &str) {
        self.output.push('\'');
        self.output.push_str(&escape_literal(s));
        self.output.push('\'');
    }
}

impl Default for SqlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Convenience functions
// =========================================================================

/// Render a statement to SQL text
pub fn render(stmt: &Stmt) -> String {
    let mut renderer = SqlRenderer::with_capacity(SqlRenderer::estimate_capacity(stmt));
    renderer.render_stmt(stmt);
    let sql = renderer.into_sql();
    tracing::trace!(bytes = sql.len(), "rendered statement");
    sql
}

/// Render a single expression to SQL text
pub fn render_expr(expr: &Expr) -> String {
    let mut renderer = SqlRenderer::new();
    renderer.render_expr(expr);
    renderer.into_sql()
}
