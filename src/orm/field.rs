//! Field descriptors: one mapped column with its storage type, key flag and default.

use crate::sql::SqlKind;
use serde_json::Value;
use std::fmt;

/// Storage type of a mapped column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Varchar(u32),
    Text,
    Boolean,
    Integer,
    Real,
}

impl ColumnType {
    /// Descriptive DDL type name.
    pub fn ddl(&self) -> String {
        match self {
            ColumnType::Varchar(n) => format!("varchar({})", n),
            ColumnType::Text => "text".into(),
            ColumnType::Boolean => "boolean".into(),
            ColumnType::Integer => "bigint".into(),
            ColumnType::Real => "double precision".into(),
        }
    }

    pub fn sql_kind(&self) -> SqlKind {
        match self {
            ColumnType::Varchar(_) | ColumnType::Text => SqlKind::Text,
            ColumnType::Boolean => SqlKind::Bool,
            ColumnType::Integer => SqlKind::Int,
            ColumnType::Real => SqlKind::Float,
        }
    }

    /// Normalize a value read back from the database to this column's JSON shape
    /// (e.g. SQLite stores booleans as 0/1).
    pub fn coerce(&self, v: Value) -> Value {
        match (self, v) {
            (ColumnType::Boolean, Value::Number(n)) => Value::Bool(n.as_f64().unwrap_or(0.0) != 0.0),
            (ColumnType::Real, Value::Number(n)) if !n.is_f64() => n
                .as_f64()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Number(n)),
            (_, v) => v,
        }
    }
}

/// Default for an unset field: a fixed value or a nullary generator run on first read.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Generator(fn() -> Value),
}

impl DefaultValue {
    pub fn materialize(&self) -> Value {
        match self {
            DefaultValue::Value(v) => v.clone(),
            DefaultValue::Generator(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(v) => write!(f, "Value({})", v),
            DefaultValue::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    /// Attribute name on the record.
    pub attr: String,
    /// Column name when it differs from the attribute name.
    pub name: Option<String>,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub default: Option<DefaultValue>,
}

impl FieldDescriptor {
    fn new(attr: &str, column_type: ColumnType, default: Option<DefaultValue>) -> Self {
        FieldDescriptor {
            attr: attr.to_string(),
            name: None,
            column_type,
            primary_key: false,
            default,
        }
    }

    /// `varchar(100)` column without a default.
    pub fn string(attr: &str) -> Self {
        Self::new(attr, ColumnType::Varchar(100), None)
    }

    pub fn text(attr: &str) -> Self {
        Self::new(attr, ColumnType::Text, None)
    }

    /// Defaults to `false`.
    pub fn boolean(attr: &str) -> Self {
        Self::new(attr, ColumnType::Boolean, Some(DefaultValue::Value(Value::Bool(false))))
    }

    /// Defaults to `0`.
    pub fn integer(attr: &str) -> Self {
        Self::new(attr, ColumnType::Integer, Some(DefaultValue::Value(Value::from(0))))
    }

    /// Defaults to `0.0`.
    pub fn real(attr: &str) -> Self {
        Self::new(attr, ColumnType::Real, Some(DefaultValue::Value(Value::from(0.0))))
    }

    /// Override the varchar width. No effect on other column types.
    pub fn varchar(mut self, width: u32) -> Self {
        if let ColumnType::Varchar(_) = self.column_type {
            self.column_type = ColumnType::Varchar(width);
        }
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn column(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn default_value(mut self, v: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(v.into()));
        self
    }

    pub fn default_with(mut self, generator: fn() -> Value) -> Self {
        self.default = Some(DefaultValue::Generator(generator));
        self
    }

    pub fn column_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.attr)
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{}>", self.column_type.ddl(), self.column_name())
    }
}
