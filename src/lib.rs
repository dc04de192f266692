//! sqlweave - a thin convenience wrapper unifying connection setup and
//! basic CRUD-style operations across relational backends (MSSQL,
//! PostgreSQL, MySQL, Oracle, SQLite).
//!
//! There is no engine here: queries run on sqlx, and the crate's own
//! job is **connection parameter resolution**. Each parameter is
//! resolved through a layered fallback chain - explicit value, then a
//! backend-specific env var, then a generic `DB_*` env var, then a
//! hardcoded default - and synthesized into a backend-specific
//! connection descriptor.
//!
//! | Field    | Generic     | MSSQL       | PostgreSQL | MySQL     | Oracle    |
//! |----------|-------------|-------------|------------|-----------|-----------|
//! | server   | `DB_SERVER` | `MS_SERVER` | `PG_SERVER`| `MY_SERVER`| `OR_SERVER` |
//! | port     | `DB_PORT`   | `MS_PORT`   | `PG_PORT`  | `MY_PORT` | `OR_PORT` |
//! | database | `DB`        | `MS_DB`     | `PG_DB`    | `MY_DB`   | `OR_DB`   |
//! | user     | `DB_USER`   | `MS_USER`   | `PG_USER`  | `MY_USER` | `OR_USER` |
//! | password | `DB_PWD`    | `MS_PWD`    | `PG_PWD`   | `MY_PWD`  | `OR_PWD`  |
//! | schema   | `DB_SCHEMA` | `MS_SCHEMA` | `PG_SCHEMA`| -         | `OR_SCHEMA` |
//! | site id  | `DB_SID`    | -           | -          | -         | `OR_SID`  |
//!
//! # Example
//!
//! ```ignore
//! use sqlweave::{BackendKind, ConnectParams, Connection};
//!
//! // Server, database, user and password come from PG_*/DB_* env vars.
//! let conn = Connection::new(BackendKind::PostgreSQL, ConnectParams::new())?;
//! conn.connect().await?;
//! let result = conn.query("SELECT id, name FROM public.users").await?;
//! for row in &result.rows {
//!     println!("{:?}", row.get(1));
//! }
//! ```

pub mod backend;
pub mod connection;
pub mod descriptor;
pub mod env;
pub mod error;
pub mod odbc;
pub mod resolver;
pub mod row;

pub use backend::BackendKind;
pub use connection::{Connection, QueryResult};
pub use descriptor::ConnectionDescriptor;
pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use error::{Error, Result};
pub use odbc::{DriverCatalog, SystemDriverCatalog};
pub use resolver::{ConnectParams, ResolvedParams, Resolver};
pub use row::{ColumnInfo, Row, Value};
