//! The unified connection wrapper.
//!
//! `Connection` resolves its parameters once at construction time,
//! synthesizes the matching descriptor, and delegates every operation to
//! the sqlx Any engine. It adds no retry, caching, or pooling policy of
//! its own beyond sqlx defaults.

use std::path::Path;
use std::sync::Once;
use std::time::{Duration, Instant};

use async_lock::RwLock;
use serde::Serialize;
use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Column, Row as _, TypeInfo, ValueRef};

use crate::backend::BackendKind;
use crate::descriptor::ConnectionDescriptor;
use crate::error::{Error, Result};
use crate::resolver::{ConnectParams, ResolvedParams, Resolver};
use crate::row::{ColumnInfo, Row, Value};

/// Result of a row-returning query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// Column metadata
    pub columns: Vec<ColumnInfo>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Total row count
    pub row_count: usize,
    /// Execution time in milliseconds
    pub execution_time_ms: u128,
}

impl QueryResult {
    /// Create a new query result.
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Row>, execution_time_ms: u128) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
            execution_time_ms,
        }
    }
}

/// A database connection for one backend.
///
/// Parameters are resolved and the descriptor synthesized in the
/// constructor; `connect()` establishes the pool. MSSQL and Oracle have
/// no bundled engine: their descriptors are synthesized normally, but
/// `connect()` fails with [`Error::EngineUnsupported`].
pub struct Connection {
    backend: BackendKind,
    params: ResolvedParams,
    descriptor: ConnectionDescriptor,
    pool: RwLock<Option<AnyPool>>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("backend", &self.backend)
            .field("descriptor", &self.descriptor.to_string())
            .field("pool", &"<AnyPool>")
            .finish()
    }
}

impl Connection {
    /// Create a connection, filling unset parameters from the process
    /// environment.
    ///
    /// This does not connect immediately - call `connect()` to establish
    /// the pool.
    pub fn new(backend: BackendKind, explicit: ConnectParams) -> Result<Self> {
        Self::with_resolver(backend, explicit, &Resolver::from_process_env())
    }

    /// Create a connection against an injected resolver (fixed env
    /// snapshot, custom driver catalog).
    pub fn with_resolver(
        backend: BackendKind,
        explicit: ConnectParams,
        resolver: &Resolver<'_>,
    ) -> Result<Self> {
        let params = resolver.resolve(backend, &explicit)?;
        let descriptor = ConnectionDescriptor::synthesize(backend, &params)?;
        Ok(Self {
            backend,
            params,
            descriptor,
            pool: RwLock::new(None),
        })
    }

    /// The backend this connection targets.
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// The resolved connection parameters.
    pub fn params(&self) -> &ResolvedParams {
        &self.params
    }

    /// The synthesized connection descriptor.
    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// The object schema prefix, if the backend has one.
    pub fn schema(&self) -> Option<&str> {
        self.params.schema()
    }

    /// Human-readable connection identity: `user@server:port/database`
    /// for server backends, the file path for SQLite.
    pub fn display_name(&self) -> String {
        match &self.params {
            ResolvedParams::Server {
                user,
                server,
                port,
                database,
                ..
            } => format!("{user}@{server}:{port}/{database}"),
            ResolvedParams::File { path, .. } => path.display().to_string(),
        }
    }

    /// Establish the connection pool.
    pub async fn connect(&self) -> Result<()> {
        if !self.backend.engine_supported() {
            return Err(Error::EngineUnsupported(self.backend));
        }
        install_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(self.descriptor.as_str())
            .await?;

        tracing::debug!("connected to {}", self.display_name());
        let mut guard = self.pool.write().await;
        *guard = Some(pool);
        Ok(())
    }

    /// Close the pool.
    pub async fn disconnect(&self) -> Result<()> {
        let mut guard = self.pool.write().await;
        match guard.take() {
            Some(pool) => {
                pool.close().await;
                tracing::debug!("disconnected from {}", self.display_name());
                Ok(())
            }
            None => Err(Error::NotConnected),
        }
    }

    /// Check if the connection is alive with a lightweight probe.
    pub async fn is_connected(&self) -> bool {
        let guard = self.pool.read().await;
        match guard.as_ref() {
            Some(pool) => sqlx::query("SELECT 1").fetch_one(pool).await.is_ok(),
            None => false,
        }
    }

    /// Execute a row-returning query.
    pub async fn query(&self, sql: &str) -> Result<QueryResult> {
        let pool = self.pool().await?;
        let started = Instant::now();

        let any_rows = sqlx::query(sql).fetch_all(&pool).await?;
        let columns = match any_rows.first() {
            Some(row) => column_info(row),
            None => Vec::new(),
        };
        let rows = any_rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(QueryResult::new(
            columns,
            rows,
            started.elapsed().as_millis(),
        ))
    }

    /// Execute a row-returning query loaded from a `.sql` file.
    pub async fn query_from_file(&self, path: &Path) -> Result<QueryResult> {
        let sql = read_sql(path)?;
        self.query(&sql).await
    }

    /// Execute an arbitrary statement and return the rows affected.
    ///
    /// The statement runs verbatim; do not pass untrusted input.
    pub async fn exec(&self, sql: &str) -> Result<u64> {
        let pool = self.pool().await?;
        let result = sqlx::query(sql).execute(&pool).await?;
        Ok(result.rows_affected())
    }

    /// Execute an arbitrary statement loaded from a `.sql` file.
    pub async fn exec_from_file(&self, path: &Path) -> Result<u64> {
        let sql = read_sql(path)?;
        self.exec(&sql).await
    }

    /// Execute a stored procedure under the connection's schema.
    ///
    /// The name is interpolated into the statement verbatim; do not pass
    /// untrusted input.
    pub async fn exec_sproc(&self, name: &str) -> Result<u64> {
        let statement = self.backend.sproc_statement(self.schema(), name)?;
        self.exec(&statement).await
    }

    /// Delete all records in a table. Does not reset identity columns.
    pub async fn delete_all(&self, table: &str) -> Result<u64> {
        let statement = format!("DELETE FROM {}", self.qualified(table));
        self.exec(&statement).await
    }

    /// Empty a table. Faster than a delete and reseeds identity values
    /// on backends with a real TRUNCATE; SQLite falls back to DELETE.
    ///
    /// The table name is interpolated into the statement verbatim; do
    /// not pass untrusted input. Use `delete_all` for anything touched
    /// by user input.
    pub async fn truncate(&self, table: &str) -> Result<u64> {
        let statement = self.backend.truncate_statement(&self.qualified(table));
        self.exec(&statement).await
    }

    /// Insert rows into a table inside a single transaction.
    ///
    /// Placeholders follow the backend dialect; every row must have one
    /// value per column.
    pub async fn insert_rows(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Row],
    ) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let pool = self.pool().await?;

        let placeholders: Vec<String> = (1..=columns.len())
            .map(|n| self.backend.placeholder(n))
            .collect();
        let statement = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.qualified(table),
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut tx = pool.begin().await?;
        let mut affected = 0;
        for row in rows {
            if row.len() != columns.len() {
                return Err(Error::InvalidParameter {
                    backend: self.backend,
                    field: "rows",
                    value: format!(
                        "row has {} values, expected {}",
                        row.len(),
                        columns.len()
                    ),
                });
            }
            let mut query = sqlx::query(&statement);
            for value in row.values() {
                query = bind_value(query, value, self.backend)?;
            }
            affected += query.execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        tracing::debug!("inserted {affected} rows into {table}");
        Ok(affected)
    }

    /// Insert the contents of a CSV file. Headers are the column names;
    /// values are bound as text, empty cells as NULL.
    pub async fn insert_from_csv(&self, table: &str, path: &Path) -> Result<u64> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|cell| {
                        if cell.is_empty() {
                            Value::Null
                        } else {
                            Value::Text(cell.to_string())
                        }
                    })
                    .collect::<Row>(),
            );
        }
        let columns: Vec<&str> = headers.iter().map(String::as_str).collect();
        self.insert_rows(table, &columns, &rows).await
    }

    fn qualified(&self, table: &str) -> String {
        match self.schema() {
            Some(schema) => format!("{schema}.{table}"),
            None => table.to_string(),
        }
    }

    async fn pool(&self) -> Result<AnyPool> {
        let guard = self.pool.read().await;
        guard.as_ref().cloned().ok_or(Error::NotConnected)
    }
}

/// Register the bundled sqlx drivers with the Any interface, once.
fn install_drivers() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(sqlx::any::install_default_drivers);
}

fn read_sql(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn column_info(row: &AnyRow) -> Vec<ColumnInfo> {
    row.columns()
        .iter()
        .map(|column| {
            ColumnInfo::new(
                column.name().to_string(),
                column.type_info().name().to_string(),
                column.ordinal(),
            )
        })
        .collect()
}

fn decode_row(row: &AnyRow) -> Result<Row> {
    let mut values = Vec::with_capacity(row.len());
    for index in 0..row.len() {
        values.push(decode_value(row, index)?);
    }
    Ok(Row::from_values(values))
}

fn decode_value(row: &AnyRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();
    Ok(match type_name.as_str() {
        "BOOL" | "BOOLEAN" => Value::Bool(row.try_get(index)?),
        "SMALLINT" | "INT2" | "INT" | "INT4" | "INTEGER" | "BIGINT" | "INT8" => {
            Value::Int(row.try_get(index)?)
        }
        "REAL" | "FLOAT4" | "FLOAT" | "DOUBLE" | "FLOAT8" => {
            Value::Float(row.try_get(index)?)
        }
        "BLOB" | "BYTEA" => Value::Bytes(row.try_get(index)?),
        _ => match row.try_get::<String, _>(index) {
            Ok(text) => Value::Text(text),
            Err(_) => Value::Other { type_name },
        },
    })
}

fn bind_value<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    value: &Value,
    backend: BackendKind,
) -> Result<Query<'q, Any, AnyArguments<'q>>> {
    Ok(match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
        Value::Bytes(b) => query.bind(b.clone()),
        Value::Other { .. } => {
            return Err(Error::Unsupported {
                backend,
                operation: "binding non-scalar values",
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::odbc::DriverCatalog;

    struct OneDriver;

    impl DriverCatalog for OneDriver {
        fn drivers(&self) -> Vec<String> {
            vec!["ODBC Driver 18 for SQL Server".to_string()]
        }
    }

    fn full_env() -> MapEnv {
        MapEnv::new()
            .with("DB_SERVER", "db.internal")
            .with("DB", "sales")
            .with("DB_USER", "alice")
            .with("DB_PWD", "hunter2")
    }

    fn mssql_connection() -> Connection {
        let env = full_env();
        let resolver = Resolver::new(&env, &OneDriver);
        Connection::with_resolver(BackendKind::MsSql, ConnectParams::new(), &resolver).unwrap()
    }

    #[test]
    fn test_qualified_table_names() {
        let conn = mssql_connection();
        assert_eq!(conn.qualified("orders"), "dbo.orders");

        let env = full_env();
        let resolver = Resolver::new(&env, &OneDriver);
        let conn =
            Connection::with_resolver(BackendKind::MySQL, ConnectParams::new(), &resolver)
                .unwrap();
        assert_eq!(conn.qualified("orders"), "orders");
    }

    #[test]
    fn test_display_name() {
        let conn = mssql_connection();
        assert_eq!(conn.display_name(), "alice@db.internal:1433/sales");
    }

    #[test]
    fn test_connect_without_bundled_engine_fails() {
        let conn = mssql_connection();
        let err = smol::block_on(conn.connect()).unwrap_err();
        assert!(matches!(err, Error::EngineUnsupported(BackendKind::MsSql)));
    }

    #[test]
    fn test_query_before_connect_fails() {
        let env = full_env();
        let resolver = Resolver::new(&env, &OneDriver);
        let conn =
            Connection::with_resolver(BackendKind::PostgreSQL, ConnectParams::new(), &resolver)
                .unwrap();
        let err = smol::block_on(conn.query("SELECT 1")).unwrap_err();
        assert!(matches!(err, Error::NotConnected));
        assert!(!smol::block_on(conn.is_connected()));
    }

    #[test]
    fn test_debug_redacts_password() {
        let conn = mssql_connection();
        let debug = format!("{conn:?}");
        assert!(!debug.contains("hunter2"));
    }
}
