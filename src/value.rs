//! Builder-supplied values
//!
//! [`SqlValue`] is the explicit tagged type for values handed to the
//! statement builders. Each variant has one rendering rule, so the mapping
//! from caller values to expression nodes is total: [`SqlValue::to_expr`]
//! never fails.
//!
//! Non-string scalars and structured values are carried as canonical JSON
//! text and rendered as quoted string literals, matching a JSON/JSONB
//! column convention.

use indexmap::IndexMap;

use crate::ast::{Expr, FunctionCall};

/// An ordered column-to-value map. Order matters: insert column lists
/// follow map iteration order.
pub type ValueMap = IndexMap<String, SqlValue>;

/// A value supplied to a statement builder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Field omitted; renders as DEFAULT (the column default applies)
    Omitted,
    /// SQL NULL
    Null,
    /// A plain string, rendered as an escaped string literal
    Text(String),
    /// Any JSON-able value, rendered as its canonical JSON text in a
    /// string literal
    Json(serde_json::Value),
    /// An expression used verbatim, e.g. [`now()`] or [`gen_uuid()`]
    Raw(Expr),
}

impl SqlValue {
    /// Convert to an expression node. Total: every variant has a mapping.
    pub fn to_expr(&self) -> Expr {
        match self {
            SqlValue::Raw(expr) => expr.clone(),
            SqlValue::Omitted => Expr::default_value(),
            SqlValue::Null => Expr::null(),
            SqlValue::Text(s) => Expr::string(s.clone()),
            SqlValue::Json(v) => Expr::string(v.to_string()),
        }
    }

    /// True when the value marks an omitted field; UPDATE set-lists skip
    /// these (omitted is not NULL)
    pub fn is_omitted(&self) -> bool {
        matches!(self, SqlValue::Omitted)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        Self::Json(serde_json::Value::from(n))
    }
}

impl From<f64> for SqlValue {
    fn from(n: f64) -> Self {
        Self::Json(serde_json::Value::from(n))
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        Self::Json(serde_json::Value::from(b))
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<Expr> for SqlValue {
    fn from(e: Expr) -> Self {
        Self::Raw(e)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// Build a [`ValueMap`] from (column, value) pairs, preserving order
pub fn value_map<K, V, I>(pairs: I) -> ValueMap
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

/// The server-side `now()` timestamp
pub fn now() -> SqlValue {
    SqlValue::Raw(Expr::FunctionCall(
        FunctionCall::new("now", vec![]).with_return_type("timestamp"),
    ))
}

/// A server-generated random UUID, `gen_random_uuid()`
pub fn gen_uuid() -> SqlValue {
    SqlValue::Raw(Expr::FunctionCall(
        FunctionCall::new("gen_random_uuid", vec![]).with_return_type("uuid"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::render_expr;
    use serde_json::json;

    #[test]
    fn omitted_renders_default() {
        assert_eq!(render_expr(&SqlValue::Omitted.to_expr()), "DEFAULT");
    }

    #[test]
    fn null_renders_null() {
        assert_eq!(render_expr(&SqlValue::Null.to_expr()), "null");
    }

    #[test]
    fn null_and_omitted_are_distinguishable() {
        assert_ne!(
            render_expr(&SqlValue::Null.to_expr()),
            render_expr(&SqlValue::Omitted.to_expr())
        );
    }

    #[test]
    fn text_renders_escaped_literal() {
        let v = SqlValue::from("O'Brien");
        assert_eq!(render_expr(&v.to_expr()), "('O''Brien')");
    }

    #[test]
    fn scalars_render_as_json_text() {
        assert_eq!(render_expr(&SqlValue::from(1i64).to_expr()), "('1')");
        assert_eq!(render_expr(&SqlValue::from(false).to_expr()), "('false')");
    }

    #[test]
    fn structured_values_render_canonical_json() {
        let v = SqlValue::from(json!([{"someKey": "some value"}]));
        assert_eq!(
            render_expr(&v.to_expr()),
            r#"('[{"someKey":"some value"}]')"#
        );
    }

    #[test]
    fn raw_expression_passes_through() {
        assert_eq!(render_expr(&now().to_expr()), "now()");
        assert_eq!(render_expr(&gen_uuid().to_expr()), "gen_random_uuid()");
    }

    #[test]
    fn option_maps_none_to_null() {
        let v: SqlValue = Option::<i64>::None.into();
        assert_eq!(v, SqlValue::Null);
        let v: SqlValue = Some("x").into();
        assert_eq!(v, SqlValue::Text("x".to_string()));
    }

    #[test]
    fn value_map_preserves_order() {
        let map = value_map([("b", 1i64), ("a", 2i64)]);
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a"]);
    }
}
