//! Convert serde_json::Value to types that sqlx can bind.

use serde_json::Value;

/// SQL type family of a bound value. Lets a NULL be bound with the column's type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlKind {
    Bool,
    Int,
    Float,
    Text,
}

/// A value that can be bound to a query through the `Any` driver. Converts from serde_json::Value.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null(SqlKind),
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl BindValue {
    /// Untyped conversion, used for free-form where-clause arguments.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null(SqlKind::Text),
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::Int(i)
                } else {
                    BindValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => BindValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::Text(v.to_string()),
        }
    }

    /// Conversion guided by the column type. Strings from query or form data are parsed
    /// into the column's type when they parse; otherwise the value is bound as-is.
    pub fn for_column(v: &Value, kind: SqlKind) -> Self {
        match (kind, v) {
            (kind, Value::Null) => BindValue::Null(kind),
            (SqlKind::Float, Value::Number(n)) => BindValue::Float(n.as_f64().unwrap_or(0.0)),
            (SqlKind::Bool, Value::Number(n)) => BindValue::Bool(n.as_i64().unwrap_or(0) != 0),
            (SqlKind::Bool, Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" => BindValue::Bool(true),
                "false" | "0" | "off" | "" => BindValue::Bool(false),
                _ => BindValue::Text(s.clone()),
            },
            (SqlKind::Int, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(BindValue::Int)
                .unwrap_or_else(|_| BindValue::Text(s.clone())),
            (SqlKind::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(BindValue::Float)
                .unwrap_or_else(|_| BindValue::Text(s.clone())),
            (SqlKind::Text, Value::Bool(b)) => BindValue::Text(b.to_string()),
            (SqlKind::Text, Value::Number(n)) => BindValue::Text(n.to_string()),
            _ => Self::from_json(v),
        }
    }
}

impl From<&Value> for BindValue {
    fn from(v: &Value) -> Self {
        BindValue::from_json(v)
    }
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::Int(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_takes_column_kind() {
        assert_eq!(BindValue::for_column(&Value::Null, SqlKind::Bool), BindValue::Null(SqlKind::Bool));
        assert_eq!(BindValue::from_json(&Value::Null), BindValue::Null(SqlKind::Text));
    }

    #[test]
    fn form_strings_coerce_to_column_type() {
        assert_eq!(BindValue::for_column(&json!("42"), SqlKind::Int), BindValue::Int(42));
        assert_eq!(BindValue::for_column(&json!("1.5"), SqlKind::Float), BindValue::Float(1.5));
        assert_eq!(BindValue::for_column(&json!("true"), SqlKind::Bool), BindValue::Bool(true));
        assert_eq!(
            BindValue::for_column(&json!("abc"), SqlKind::Int),
            BindValue::Text("abc".into())
        );
    }

    #[test]
    fn integers_widen_for_real_columns() {
        assert_eq!(BindValue::for_column(&json!(3), SqlKind::Float), BindValue::Float(3.0));
        assert_eq!(BindValue::for_column(&json!(3), SqlKind::Text), BindValue::Text("3".into()));
    }
}
