//! Records: dynamically keyed rows bound to a schema, with CRUD against the execution layer.

use crate::error::AppError;
use crate::orm::schema::Schema;
use crate::sql::{quoted, BindValue, Database, Dialect, Row};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Result-set alias used by [`Record::find_number`].
const NUM_ALIAS: &str = "_num_";

/// Row limit for [`FindAll`]: a maximum count, or an `(offset, count)` window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limit {
    Count(i64),
    Range { offset: i64, count: i64 },
}

impl Limit {
    /// Negative offsets and counts are rejected.
    fn check(self) -> Result<Self, AppError> {
        let (offset, count) = match self {
            Limit::Count(count) => (0, count),
            Limit::Range { offset, count } => (offset, count),
        };
        if offset < 0 || count < 0 {
            return Err(AppError::InvalidArgument(format!("Invalid limit value: {:?}", self)));
        }
        Ok(self)
    }
}

/// Options for [`Record::find_all`]: raw where-clause with `?` args, order-by, limit.
#[derive(Clone, Debug, Default)]
pub struct FindAll {
    pub where_clause: Option<String>,
    pub args: Vec<Value>,
    pub order_by: Option<String>,
    pub limit: Option<Limit>,
}

impl FindAll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, where_clause: &str, args: Vec<Value>) -> Self {
        self.where_clause = Some(where_clause.to_string());
        self.args = args;
        self
    }

    pub fn order_by(mut self, order_by: &str) -> Self {
        self.order_by = Some(order_by.to_string());
        self
    }

    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Statement text and arguments: where-clause args first, then limit args.
    pub fn to_sql(&self, schema: &Schema, dialect: Dialect) -> (String, Vec<BindValue>) {
        let mut sql = vec![schema.select_sql().to_string()];
        let mut args: Vec<BindValue> = self.args.iter().map(BindValue::from_json).collect();
        if let Some(w) = self.where_clause.as_deref().filter(|w| !w.is_empty()) {
            sql.push("where".into());
            sql.push(w.to_string());
        }
        if let Some(o) = self.order_by.as_deref().filter(|o| !o.is_empty()) {
            sql.push("order by".into());
            sql.push(o.to_string());
        }
        match self.limit {
            Some(Limit::Count(n)) => {
                sql.push("limit ?".into());
                args.push(BindValue::Int(n));
            }
            Some(Limit::Range { offset, count }) => {
                sql.push(dialect.range_limit_clause().into());
                args.push(BindValue::Int(offset));
                args.push(BindValue::Int(count));
            }
            None => {}
        }
        (sql.join(" "), args)
    }
}

/// One model instance. Keys are always declared fields of its schema.
#[derive(Clone, Debug)]
pub struct Record {
    schema: Arc<Schema>,
    values: Map<String, Value>,
}

impl Record {
    pub fn new(schema: Arc<Schema>) -> Self {
        Record {
            schema,
            values: Map::new(),
        }
    }

    /// Build from a result row. Columns that map to no declared field are dropped.
    pub fn from_row(schema: Arc<Schema>, row: Row) -> Self {
        let mut values = Map::new();
        for (column, v) in row {
            let Some(attr) = schema.attr_for_column(&column) else {
                tracing::debug!(column = %column, model = %schema.model(), "ignoring unmapped column");
                continue;
            };
            let Some(field) = schema.field(attr) else { continue };
            values.insert(attr.to_string(), field.column_type.coerce(v));
        }
        Record { schema, values }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.values.get(attr)
    }

    pub fn get_str(&self, attr: &str) -> Option<&str> {
        self.values.get(attr).and_then(Value::as_str)
    }

    pub fn primary_key(&self) -> Option<&Value> {
        self.get(self.schema.primary_key()).filter(|v| !v.is_null())
    }

    pub fn set(&mut self, attr: &str, value: impl Into<Value>) -> Result<&mut Self, AppError> {
        if self.schema.field(attr).is_none() {
            return Err(AppError::InvalidArgument(format!(
                "model {} has no field {}",
                self.schema.model(),
                attr
            )));
        }
        self.values.insert(attr.to_string(), value.into());
        Ok(self)
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, attr: &str, value: impl Into<Value>) -> Result<Self, AppError> {
        self.set(attr, value)?;
        Ok(self)
    }

    /// Overwrite a value that is already present. Absent keys stay absent.
    pub fn replace(&mut self, attr: &str, value: impl Into<Value>) -> Option<Value> {
        self.values
            .get_mut(attr)
            .map(|slot| std::mem::replace(slot, value.into()))
    }

    pub fn unset(&mut self, attr: &str) -> Option<Value> {
        self.values.remove(attr)
    }

    /// Current value, or the field default materialized and stored on first read.
    pub fn get_or_default(&mut self, attr: &str) -> Value {
        if let Some(v) = self.values.get(attr).filter(|v| !v.is_null()) {
            return v.clone();
        }
        let Some(default) = self.schema.field(attr).and_then(|f| f.default.as_ref()) else {
            return Value::Null;
        };
        let v = default.materialize();
        tracing::debug!("using default value for {}: {}", attr, v);
        self.values.insert(attr.to_string(), v.clone());
        v
    }

    fn bind(&self, attr: &str, v: &Value) -> BindValue {
        match self.schema.field(attr) {
            Some(f) => BindValue::for_column(v, f.column_type.sql_kind()),
            None => BindValue::from_json(v),
        }
    }

    /// INSERT arguments: non-key fields in declaration order, then the key. Defaults are materialized.
    pub fn insert_args(&mut self) -> Vec<BindValue> {
        let schema = self.schema.clone();
        let attrs = schema.fields().iter().map(String::as_str).chain(std::iter::once(schema.primary_key()));
        let mut args = Vec::with_capacity(schema.fields().len() + 1);
        for attr in attrs {
            let v = self.get_or_default(attr);
            args.push(self.bind(attr, &v));
        }
        args
    }

    /// UPDATE arguments: current non-key values (absent → NULL), then the key.
    pub fn update_args(&self) -> Result<Vec<BindValue>, AppError> {
        let pk = self.require_primary_key()?;
        let mut args: Vec<BindValue> = self
            .schema
            .fields()
            .iter()
            .map(|attr| self.bind(attr, self.values.get(attr).unwrap_or(&Value::Null)))
            .collect();
        args.push(self.bind(self.schema.primary_key(), pk));
        Ok(args)
    }

    pub fn delete_args(&self) -> Result<Vec<BindValue>, AppError> {
        let pk = self.require_primary_key()?;
        Ok(vec![self.bind(self.schema.primary_key(), pk)])
    }

    fn require_primary_key(&self) -> Result<&Value, AppError> {
        self.primary_key().ok_or_else(|| {
            AppError::InvalidArgument(format!(
                "primary key {} of {} is not set",
                self.schema.primary_key(),
                self.schema.model()
            ))
        })
    }

    /// Find by primary key. `None` when no row matches.
    pub async fn find(db: &Database, schema: &Arc<Schema>, pk: &Value) -> Result<Option<Record>, AppError> {
        let key = schema.primary_key_field();
        let sql = format!("{} where {}=?", schema.select_sql(), quoted(key.column_name()));
        let args = [BindValue::for_column(pk, key.column_type.sql_kind())];
        let rows = db.select(&sql, &args, Some(1)).await?;
        Ok(rows.into_iter().next().map(|row| Record::from_row(schema.clone(), row)))
    }

    pub async fn find_all(db: &Database, schema: &Arc<Schema>, query: &FindAll) -> Result<Vec<Record>, AppError> {
        if let Some(limit) = query.limit {
            limit.check()?;
        }
        let (sql, args) = query.to_sql(schema, db.dialect());
        let rows = db.select(&sql, &args, None).await?;
        Ok(rows.into_iter().map(|row| Record::from_row(schema.clone(), row)).collect())
    }

    /// Single-column aggregate, e.g. `count(id)`. `None` when no row comes back.
    pub async fn find_number(
        db: &Database,
        schema: &Schema,
        select_expr: &str,
        where_clause: Option<&str>,
        args: &[Value],
    ) -> Result<Option<Value>, AppError> {
        let mut sql = format!("select {} as {} from {}", select_expr, quoted(NUM_ALIAS), quoted(schema.table()));
        if let Some(w) = where_clause.filter(|w| !w.is_empty()) {
            sql.push_str(" where ");
            sql.push_str(w);
        }
        let args: Vec<BindValue> = args.iter().map(BindValue::from_json).collect();
        let rows = db.select(&sql, &args, Some(1)).await?;
        Ok(rows.into_iter().next().and_then(|mut row| row.remove(NUM_ALIAS)))
    }

    pub async fn save(&mut self, db: &Database) -> Result<(), AppError> {
        let args = self.insert_args();
        let rows = db.execute(self.schema.insert_sql(), &args, true).await?;
        if rows != 1 {
            tracing::warn!("failed to insert record: affected rows: {}", rows);
        }
        Ok(())
    }

    pub async fn update(&self, db: &Database) -> Result<(), AppError> {
        let args = self.update_args()?;
        let rows = db.execute(self.schema.update_sql(), &args, true).await?;
        if rows != 1 {
            tracing::warn!("failed to update by primary key: affected rows: {}", rows);
        }
        Ok(())
    }

    pub async fn remove(&self, db: &Database) -> Result<(), AppError> {
        let args = self.delete_args()?;
        let rows = db.execute(self.schema.delete_sql(), &args, true).await?;
        if rows != 1 {
            tracing::warn!("failed to remove by primary key: affected rows: {}", rows);
        }
        Ok(())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}
