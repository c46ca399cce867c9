//! SQL expression types
//!
//! Expressions are the building blocks of statements: column references,
//! literals, function calls, binary operations, expression lists and
//! subqueries. An expression is an immutable value; composing a new node
//! never mutates its inputs, so subtrees can be shared freely via `Clone`.

/// A SQL identifier (table name, column name, alias, ...).
///
/// The identifier holds raw text; escaping and quoting happen in the
/// renderer, which is the only place SQL strings are constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(pub String);

impl Ident {
    #[inline]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Ident {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a column, optionally qualified with a table and schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub schema: Option<Ident>,
    pub table: Option<Ident>,
    pub column: Ident,
}

impl ColumnRef {
    pub fn new(column: impl Into<Ident>) -> Self {
        Self {
            schema: None,
            table: None,
            column: column.into(),
        }
    }

    pub fn qualified(table: impl Into<Ident>, column: impl Into<Ident>) -> Self {
        Self {
            schema: None,
            table: Some(table.into()),
            column: column.into(),
        }
    }

    /// Parse a dotted path: `column`, `table.column` or `schema.table.column`.
    pub fn parse(path: &str) -> Self {
        let mut segments = path.rsplitn(3, '.');
        // rsplitn yields segments right-to-left
        let column = Ident::new(segments.next().unwrap_or_default());
        let table = segments.next().map(Ident::new);
        let schema = segments.next().map(Ident::new);
        Self {
            schema,
            table,
            column,
        }
    }
}

/// SQL literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// SQL NULL
    Null,
    /// SQL DEFAULT keyword: omit the value, let the column default apply
    Default,
    /// Integer literal
    Integer(i64),
    /// String literal; escaped when rendered
    String(String),
}

impl Literal {
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    And,
    Or,
    /// String concatenation: ||
    Concat,
    /// POSIX regular expression match: ~
    RegEx,
}

impl BinaryOperator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
            Self::RegEx => "~",
        }
    }
}

/// A function call expression.
///
/// `return_type` is a declared type tag carried by helper constructors
/// (e.g. `now()` declares `timestamp`); it is informational and never
/// rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: Ident,
    pub args: Vec<Expr>,
    pub return_type: Option<String>,
}

impl FunctionCall {
    pub fn new(name: impl Into<Ident>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            args,
            return_type: None,
        }
    }

    pub fn with_return_type(mut self, ty: impl Into<String>) -> Self {
        self.return_type = Some(ty.into());
        self
    }
}

/// The expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: [schema.][table.]column
    Column(ColumnRef),

    /// Literal value
    Literal(Literal),

    /// Function call
    FunctionCall(FunctionCall),

    /// Binary operation: expr op expr
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Ordered expression list: (e1, e2, ...). Used for composite-key
    /// comparisons, where a single list-vs-list equality replaces an
    /// AND-chain.
    List(Vec<Expr>),

    /// Scalar subquery: (SELECT ...)
    Subquery(Box<super::stmt::SelectStmt>),
}

impl Expr {
    /// Create a bare column reference
    pub fn column(name: impl Into<Ident>) -> Self {
        Self::Column(ColumnRef::new(name))
    }

    /// Create a table-qualified column reference
    pub fn qualified_column(table: impl Into<Ident>, column: impl Into<Ident>) -> Self {
        Self::Column(ColumnRef::qualified(table, column))
    }

    /// Create a NULL literal
    pub fn null() -> Self {
        Self::Literal(Literal::Null)
    }

    /// Create a DEFAULT literal
    pub fn default_value() -> Self {
        Self::Literal(Literal::Default)
    }

    /// Create an integer literal
    pub fn int(n: i64) -> Self {
        Self::Literal(Literal::Integer(n))
    }

    /// Create a string literal
    pub fn string(s: impl Into<String>) -> Self {
        Self::Literal(Literal::String(s.into()))
    }

    /// Create a function call
    pub fn function(name: impl Into<Ident>, args: Vec<Expr>) -> Self {
        Self::FunctionCall(FunctionCall::new(name, args))
    }

    /// Create a binary operation
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Self::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create an expression list
    pub fn list(items: Vec<Expr>) -> Self {
        Self::List(items)
    }

    /// Check equality
    pub fn eq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::Eq, other)
    }

    /// Combine with AND
    pub fn and(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::And, other)
    }

    /// Concatenate with ||
    pub fn concat(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::Concat, other)
    }

    /// Match against a POSIX regular expression
    pub fn regex_match(self, pattern: impl Into<String>) -> Self {
        Self::binary(self, BinaryOperator::RegEx, Expr::string(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_ref_parse_paths() {
        let col = ColumnRef::parse("id");
        assert_eq!(col.column.as_str(), "id");
        assert!(col.table.is_none());
        assert!(col.schema.is_none());

        let col = ColumnRef::parse("users.id");
        assert_eq!(col.table.as_ref().unwrap().as_str(), "users");
        assert_eq!(col.column.as_str(), "id");

        let col = ColumnRef::parse("public.users.id");
        assert_eq!(col.schema.as_ref().unwrap().as_str(), "public");
        assert_eq!(col.table.as_ref().unwrap().as_str(), "users");
        assert_eq!(col.column.as_str(), "id");
    }

    #[test]
    fn expr_constructors() {
        let expr = Expr::qualified_column("t", "id");
        match expr {
            Expr::Column(c) => {
                assert_eq!(c.table.unwrap().as_str(), "t");
                assert_eq!(c.column.as_str(), "id");
            }
            _ => panic!("expected Column"),
        }

        let expr = Expr::column("a").eq(Expr::string("x"));
        match expr {
            Expr::BinaryOp { op, .. } => assert_eq!(op, BinaryOperator::Eq),
            _ => panic!("expected BinaryOp"),
        }
    }

    #[test]
    fn composition_shares_without_mutation() {
        let base = Expr::column("a");
        let combined = base.clone().and(Expr::column("b"));
        // the input is untouched by composition
        assert_eq!(base, Expr::column("a"));
        assert!(matches!(combined, Expr::BinaryOp { .. }));
    }
}
