//! Backend definitions.
//!
//! This module contains:
//! - `BackendKind` - Closed enumeration of supported database backends
//! - Per-backend defaults (port, schema) and env-var prefixes
//! - Backend-specific SQL dialect helpers (placeholders, TRUNCATE,
//!   stored procedure invocation)

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    MsSql,
    #[default]
    PostgreSQL,
    MySQL,
    Oracle,
    SQLite,
}

impl BackendKind {
    /// Get the display name for this backend.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MsSql => "MSSQL",
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::Oracle => "Oracle",
            Self::SQLite => "SQLite",
        }
    }

    /// URL scheme used when synthesizing a connection descriptor.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::MsSql => "mssql",
            Self::PostgreSQL => "postgres",
            Self::MySQL => "mysql",
            Self::Oracle => "oracle",
            Self::SQLite => "sqlite",
        }
    }

    /// Default port for server-based backends.
    pub fn default_port(&self) -> Option<&'static str> {
        match self {
            Self::MsSql => Some("1433"),
            Self::PostgreSQL => Some("5432"),
            Self::MySQL => Some("3306"),
            Self::Oracle => Some("1521"),
            Self::SQLite => None, // File-based
        }
    }

    /// Default object schema. MySQL has no schema prefix; the database
    /// itself plays that role.
    pub fn default_schema(&self) -> Option<&'static str> {
        match self {
            Self::MsSql => Some("dbo"),
            Self::PostgreSQL => Some("public"),
            Self::MySQL => None,
            Self::Oracle => Some("public"),
            Self::SQLite => Some("main"),
        }
    }

    /// Env-var prefix for backend-specific overrides (`MS_SERVER`,
    /// `PG_PORT`, ...). SQLite is file-based and consults no env vars.
    pub(crate) fn env_prefix(&self) -> Option<&'static str> {
        match self {
            Self::MsSql => Some("MS"),
            Self::PostgreSQL => Some("PG"),
            Self::MySQL => Some("MY"),
            Self::Oracle => Some("OR"),
            Self::SQLite => None,
        }
    }

    /// Check if this backend is file-based.
    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::SQLite)
    }

    /// Check if a bundled sqlx engine exists for this backend.
    ///
    /// MSSQL and Oracle descriptors are still fully synthesized; they are
    /// meant to be handed to an external driver.
    pub fn engine_supported(&self) -> bool {
        matches!(self, Self::PostgreSQL | Self::MySQL | Self::SQLite)
    }

    /// Bind-parameter placeholder for the n-th parameter (1-based).
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${n}"),
            _ => "?".to_string(),
        }
    }

    /// Statement that empties `target` (an already-qualified table name).
    ///
    /// SQLite has no TRUNCATE; an unqualified DELETE is the closest
    /// equivalent.
    pub fn truncate_statement(&self, target: &str) -> String {
        match self {
            Self::SQLite => format!("DELETE FROM {target}"),
            _ => format!("TRUNCATE TABLE {target}"),
        }
    }

    /// Statement that invokes the stored procedure `name` under `schema`.
    ///
    /// The name is interpolated into the statement verbatim; do not pass
    /// untrusted input.
    pub fn sproc_statement(
        &self,
        schema: Option<&str>,
        name: &str,
    ) -> Result<String, Error> {
        let qualified = match schema {
            Some(schema) => format!("{schema}.{name}"),
            None => name.to_string(),
        };
        match self {
            Self::MsSql => Ok(format!("EXEC {qualified}")),
            Self::PostgreSQL | Self::MySQL => Ok(format!("CALL {qualified}()")),
            Self::Oracle => Ok(format!("BEGIN {qualified}; END;")),
            Self::SQLite => Err(Error::Unsupported {
                backend: *self,
                operation: "stored procedures",
            }),
        }
    }

    /// Get all backends.
    pub fn all() -> Vec<BackendKind> {
        vec![
            Self::MsSql,
            Self::PostgreSQL,
            Self::MySQL,
            Self::Oracle,
            Self::SQLite,
        ]
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "mssql" | "sqlserver" | "ms" => Ok(Self::MsSql),
            "postgresql" | "postgres" | "pg" => Ok(Self::PostgreSQL),
            "mysql" | "mariadb" | "my" => Ok(Self::MySQL),
            "oracle" | "or" => Ok(Self::Oracle),
            "sqlite" | "sqlite3" => Ok(Self::SQLite),
            _ => Err(Error::UnknownBackend(s.to_string())),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
