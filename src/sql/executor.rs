//! Execution layer: parameterized select / mutation against the shared pool.

use crate::error::{AppError, ConfigError};
use crate::sql::{translate_placeholders, BindValue, Dialect};
use futures_util::{StreamExt, TryStreamExt};
use serde_json::{Map, Number, Value};
use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::{Any, AnyPool};
use std::sync::Once;

/// One result row keyed by column name (or alias).
pub type Row = Map<String, Value>;

type AnyQuery<'q> = sqlx::query::Query<'q, Any, AnyArguments<'q>>;

static INSTALL_DRIVERS: Once = Once::new();

/// Handle to the process-wide connection pool. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Database {
    pool: AnyPool,
    dialect: Dialect,
}

impl Database {
    /// Open the pool. The dialect follows the URL scheme (`postgres://`, `sqlite:`).
    pub async fn connect(url: &str, max_connections: u32, min_connections: u32) -> Result<Self, AppError> {
        let dialect = Dialect::from_url(url).ok_or_else(|| {
            ConfigError::Load(format!(
                "unsupported database url scheme: {}",
                url.split(':').next().unwrap_or_default()
            ))
        })?;
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);
        tracing::info!(?dialect, "create database connection pool...");
        // each connection to an in-memory sqlite database opens its own empty database
        let in_memory = url.contains(":memory:");
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections.max(1), min_connections)
        };
        let mut options = AnyPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections);
        if in_memory {
            options = options.idle_timeout(None).max_lifetime(None);
        }
        let pool = options.connect(url).await?;
        Ok(Database { pool, dialect })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Run a read query. Returns the first `row_limit` rows, or all rows when `None`.
    pub async fn select(
        &self,
        sql: &str,
        args: &[BindValue],
        row_limit: Option<usize>,
    ) -> Result<Vec<Row>, AppError> {
        let sql = translate_placeholders(sql, self.dialect);
        tracing::info!(sql = %sql, "SQL");
        tracing::debug!(args = ?args, "SQL args");
        let mut conn = self.pool.acquire().await?;
        let query = bind_all(sqlx::query(&sql), args);
        let rows: Vec<AnyRow> = match row_limit {
            Some(n) => query.fetch(&mut *conn).take(n).try_collect().await?,
            None => query.fetch_all(&mut *conn).await?,
        };
        tracing::info!(rows = rows.len(), "rows returned");
        Ok(rows.iter().map(row_to_map).collect())
    }

    /// Run an INSERT / UPDATE / DELETE and return the affected row count.
    /// With `autocommit = false` the statement runs in its own transaction: commit on success,
    /// rollback and return the original error on failure.
    pub async fn execute(&self, sql: &str, args: &[BindValue], autocommit: bool) -> Result<u64, AppError> {
        let sql = translate_placeholders(sql, self.dialect);
        tracing::info!(sql = %sql, "SQL");
        tracing::debug!(args = ?args, "SQL args");
        if autocommit {
            let mut conn = self.pool.acquire().await?;
            let result = bind_all(sqlx::query(&sql), args).execute(&mut *conn).await?;
            return Ok(result.rows_affected());
        }
        let mut tx = self.pool.begin().await?;
        match bind_all(sqlx::query(&sql), args).execute(&mut *tx).await {
            Ok(result) => {
                tx.commit().await?;
                Ok(result.rows_affected())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(e.into())
            }
        }
    }

    /// Liveness check used by the readiness route.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.select("select 1", &[], Some(1)).await.map(|_| ())
    }
}

fn bind_all<'q>(mut query: AnyQuery<'q>, args: &[BindValue]) -> AnyQuery<'q> {
    use crate::sql::SqlKind;
    for arg in args {
        query = match arg {
            BindValue::Null(SqlKind::Bool) => query.bind(None::<bool>),
            BindValue::Null(SqlKind::Int) => query.bind(None::<i64>),
            BindValue::Null(SqlKind::Float) => query.bind(None::<f64>),
            BindValue::Null(SqlKind::Text) => query.bind(None::<String>),
            BindValue::Bool(b) => query.bind(*b),
            BindValue::Int(n) => query.bind(*n),
            BindValue::Float(n) => query.bind(*n),
            BindValue::Text(s) => query.bind(s.clone()),
        };
    }
    query
}

fn row_to_map(row: &AnyRow) -> Row {
    use sqlx::{Column, Row as _};
    let mut map = Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, i));
    }
    map
}

fn cell_to_value(row: &AnyRow, i: usize) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(i) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(i) {
        if let Some(n) = Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(i) {
        if let Some(n) = Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(i) {
        return Value::Bool(b);
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(i) {
        return Value::String(s);
    }
    Value::Null
}
