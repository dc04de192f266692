//! ODBC driver discovery for MSSQL descriptors.
//!
//! MSSQL connection strings must name an installed ODBC driver. The
//! catalog is injectable so tests (and hosts with unusual layouts) can
//! supply their own driver list.
//!
//! Selection policy: the driver whose name carries the highest embedded
//! version number wins (e.g. `ODBC Driver 18 for SQL Server` beats
//! `ODBC Driver 17 for SQL Server`). If no name carries a version, the
//! first listed driver is used.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Source of installed ODBC driver names.
pub trait DriverCatalog {
    /// Names of all installed drivers, in registration order.
    fn drivers(&self) -> Vec<String>;
}

/// Catalog backed by the host's `odbcinst.ini`.
///
/// The file is located the way unixODBC locates it: `ODBCINSTINI` names
/// the file directly, otherwise `odbcinst.ini` is looked up under
/// `ODBCSYSINI` (default `/etc`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDriverCatalog;

impl SystemDriverCatalog {
    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("ODBCINSTINI") {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        let base = std::env::var("ODBCSYSINI")
            .ok()
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| "/etc".to_string());
        Path::new(&base).join("odbcinst.ini")
    }
}

impl DriverCatalog for SystemDriverCatalog {
    fn drivers(&self) -> Vec<String> {
        match std::fs::read_to_string(Self::config_path()) {
            Ok(contents) => parse_driver_sections(&contents),
            Err(_) => Vec::new(),
        }
    }
}

/// Extract driver names from `odbcinst.ini` section headers.
///
/// The `[ODBC]` section holds tracing options, not a driver.
fn parse_driver_sections(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let name = line.strip_prefix('[')?.strip_suffix(']')?.trim();
            if name.is_empty() || name.eq_ignore_ascii_case("ODBC") {
                None
            } else {
                Some(name.to_string())
            }
        })
        .collect()
}

/// Pick one driver from the catalog, deterministically.
pub fn select_driver(catalog: &dyn DriverCatalog) -> Result<String> {
    let drivers = catalog.drivers();
    if drivers.is_empty() {
        return Err(Error::DriverUnavailable);
    }
    let best = drivers
        .iter()
        .filter_map(|name| embedded_version(name).map(|version| (version, name)))
        .max_by_key(|(version, _)| *version);
    match best {
        Some((_, name)) => Ok(name.clone()),
        None => Ok(drivers[0].clone()),
    }
}

/// Largest run of digits in the name, e.g. 18 for
/// "ODBC Driver 18 for SQL Server" and 11 for "Native Client 11.0".
fn embedded_version(name: &str) -> Option<u32> {
    name.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .filter_map(|run| run.parse::<u32>().ok())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCatalog(Vec<&'static str>);

    impl DriverCatalog for FixedCatalog {
        fn drivers(&self) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    #[test]
    fn test_parse_sections_skips_odbc_header() {
        let ini = "\
[ODBC]
Trace = no

[ODBC Driver 17 for SQL Server]
Driver = /opt/microsoft/msodbcsql17/lib64/libmsodbcsql-17.so

[ODBC Driver 18 for SQL Server]
Driver = /opt/microsoft/msodbcsql18/lib64/libmsodbcsql-18.so
";
        assert_eq!(
            parse_driver_sections(ini),
            vec![
                "ODBC Driver 17 for SQL Server",
                "ODBC Driver 18 for SQL Server",
            ]
        );
    }

    #[test]
    fn test_highest_version_wins() {
        let catalog = FixedCatalog(vec![
            "ODBC Driver 18 for SQL Server",
            "ODBC Driver 17 for SQL Server",
            "SQL Server Native Client 11.0",
        ]);
        assert_eq!(
            select_driver(&catalog).unwrap(),
            "ODBC Driver 18 for SQL Server"
        );
    }

    #[test]
    fn test_unversioned_falls_back_to_first() {
        let catalog = FixedCatalog(vec!["FreeTDS", "Some Other Driver"]);
        assert_eq!(select_driver(&catalog).unwrap(), "FreeTDS");
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let catalog = FixedCatalog(vec![]);
        assert!(matches!(
            select_driver(&catalog),
            Err(Error::DriverUnavailable)
        ));
    }

    #[test]
    fn test_embedded_version() {
        assert_eq!(embedded_version("ODBC Driver 18 for SQL Server"), Some(18));
        assert_eq!(embedded_version("SQL Server Native Client 11.0"), Some(11));
        assert_eq!(embedded_version("FreeTDS"), None);
    }
}
