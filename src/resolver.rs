//! Connection parameter resolution.
//!
//! Every field needed to reach a database is resolved through the same
//! four-tier fallback chain, first non-empty wins:
//!
//! 1. the explicit value passed by the caller,
//! 2. the backend-specific env var (`MS_SERVER`, `PG_PORT`, ...),
//! 3. the generic env var (`DB_SERVER`, `DB_PORT`, ...),
//! 4. a hardcoded default, where one exists (port, schema).
//!
//! Fields with no default (server, database, user, password, and the
//! Oracle SID) fail resolution with a typed error naming the field.
//! Resolution is pure and idempotent over a fixed environment snapshot.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::env::{EnvSource, ProcessEnv};
use crate::error::{Error, Result};
use crate::odbc::{self, DriverCatalog, SystemDriverCatalog};

/// Explicit connection parameters supplied by the caller.
///
/// Every field is optional; anything left unset is filled from the
/// environment. Empty strings count as unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectParams {
    pub server: Option<String>,
    pub port: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub schema: Option<String>,
    /// Oracle site identifier.
    pub sid: Option<String>,
    /// MSSQL ODBC driver name, overriding catalog discovery.
    pub driver: Option<String>,
    /// SQLite database file path.
    pub path: Option<PathBuf>,
}

impl ConnectParams {
    /// Create an empty parameter set (resolve everything from env).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Fully resolved connection parameters.
///
/// Immutable after resolution; a descriptor is synthesized from it and
/// the instance is not reused across connection attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResolvedParams {
    /// Server-based backends (MSSQL, PostgreSQL, MySQL, Oracle).
    Server {
        server: String,
        port: String,
        database: String,
        user: String,
        #[serde(skip_serializing, default)]
        password: String,
        /// Object schema prefix; `None` for MySQL.
        schema: Option<String>,
        /// Oracle site identifier.
        sid: Option<String>,
        /// Selected ODBC driver (MSSQL only).
        driver: Option<String>,
    },

    /// File-based backends (SQLite).
    File { path: PathBuf, schema: String },
}

impl ResolvedParams {
    /// Object schema prefix, if the backend has one.
    pub fn schema(&self) -> Option<&str> {
        match self {
            Self::Server { schema, .. } => schema.as_deref(),
            Self::File { schema, .. } => Some(schema),
        }
    }

    /// Server hostname, for server-based backends.
    pub fn server(&self) -> Option<&str> {
        match self {
            Self::Server { server, .. } => Some(server),
            Self::File { .. } => None,
        }
    }

    /// Database name, for server-based backends.
    pub fn database(&self) -> Option<&str> {
        match self {
            Self::Server { database, .. } => Some(database),
            Self::File { .. } => None,
        }
    }
}

/// Resolves [`ConnectParams`] against an environment snapshot and the
/// host's ODBC driver catalog.
pub struct Resolver<'a> {
    env: &'a dyn EnvSource,
    catalog: &'a dyn DriverCatalog,
}

static PROCESS_ENV: ProcessEnv = ProcessEnv;
static SYSTEM_CATALOG: SystemDriverCatalog = SystemDriverCatalog;

impl<'a> Resolver<'a> {
    /// Create a resolver over injected sources.
    pub fn new(env: &'a dyn EnvSource, catalog: &'a dyn DriverCatalog) -> Self {
        Self { env, catalog }
    }

    /// Resolver over the real process environment and system ODBC catalog.
    pub fn from_process_env() -> Resolver<'static> {
        Resolver::new(&PROCESS_ENV, &SYSTEM_CATALOG)
    }

    /// Resolve a complete parameter set for `kind`.
    pub fn resolve(
        &self,
        kind: BackendKind,
        explicit: &ConnectParams,
    ) -> Result<ResolvedParams> {
        match kind.env_prefix() {
            Some(prefix) => self.resolve_server(kind, prefix, explicit),
            None => resolve_file(kind, explicit),
        }
    }

    fn resolve_server(
        &self,
        kind: BackendKind,
        prefix: &str,
        explicit: &ConnectParams,
    ) -> Result<ResolvedParams> {
        let server = self.require(
            kind,
            "server",
            explicit.server.as_deref(),
            &format!("{prefix}_SERVER"),
            "DB_SERVER",
        )?;
        let port = self
            .field(
                explicit.port.as_deref(),
                &format!("{prefix}_PORT"),
                "DB_PORT",
                kind.default_port(),
            )
            .ok_or(Error::MissingParameter {
                backend: kind,
                field: "port",
            })?;
        let database = self.require(
            kind,
            "database",
            explicit.database.as_deref(),
            &format!("{prefix}_DB"),
            "DB",
        )?;
        let user = self.require(
            kind,
            "user",
            explicit.user.as_deref(),
            &format!("{prefix}_USER"),
            "DB_USER",
        )?;
        let password = self.require(
            kind,
            "password",
            explicit.password.as_deref(),
            &format!("{prefix}_PWD"),
            "DB_PWD",
        )?;
        let schema = kind.default_schema().map(|default| {
            self.field(
                explicit.schema.as_deref(),
                &format!("{prefix}_SCHEMA"),
                "DB_SCHEMA",
                Some(default),
            )
            .unwrap_or_else(|| default.to_string())
        });
        let sid = match kind {
            BackendKind::Oracle => Some(self.require(
                kind,
                "sid",
                explicit.sid.as_deref(),
                "OR_SID",
                "DB_SID",
            )?),
            _ => None,
        };
        let driver = match kind {
            BackendKind::MsSql => Some(self.resolve_driver(explicit)?),
            _ => None,
        };

        Ok(ResolvedParams::Server {
            server,
            port,
            database,
            user,
            password,
            schema,
            sid,
            driver,
        })
    }

    /// MSSQL driver chain: explicit value, `MS_DRIVER`, then the catalog.
    fn resolve_driver(&self, explicit: &ConnectParams) -> Result<String> {
        if let Some(driver) = non_empty(explicit.driver.as_deref()) {
            return Ok(driver);
        }
        if let Some(driver) = self.env.get("MS_DRIVER") {
            return Ok(driver);
        }
        odbc::select_driver(self.catalog)
    }

    /// Resolve one field through the fallback chain.
    fn field(
        &self,
        explicit: Option<&str>,
        backend_var: &str,
        generic_var: &str,
        default: Option<&str>,
    ) -> Option<String> {
        non_empty(explicit)
            .or_else(|| self.env.get(backend_var))
            .or_else(|| self.env.get(generic_var))
            .or_else(|| default.map(str::to_string))
    }

    /// Resolve a field with no hardcoded default.
    fn require(
        &self,
        backend: BackendKind,
        field: &'static str,
        explicit: Option<&str>,
        backend_var: &str,
        generic_var: &str,
    ) -> Result<String> {
        self.field(explicit, backend_var, generic_var, None)
            .ok_or(Error::MissingParameter { backend, field })
    }
}

/// SQLite takes only a filesystem path; the schema is always `main`.
fn resolve_file(kind: BackendKind, explicit: &ConnectParams) -> Result<ResolvedParams> {
    let path = explicit.path.clone().ok_or(Error::MissingParameter {
        backend: kind,
        field: "path",
    })?;
    Ok(ResolvedParams::File {
        path,
        schema: "main".to_string(),
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
