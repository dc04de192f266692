//! Live round trip against a temporary SQLite database.

use sqlweave::{BackendKind, ConnectParams, Connection, Error, Row, Value};

fn temp_connection(dir: &tempfile::TempDir) -> Connection {
    let path = dir.path().join("test.db");
    Connection::new(BackendKind::SQLite, ConnectParams::new().path(path)).unwrap()
}

#[test]
fn sqlite_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let conn = temp_connection(&dir);
    assert_eq!(conn.schema(), Some("main"));

    smol::block_on(async {
        conn.connect().await.unwrap();
        assert!(conn.is_connected().await);

        conn.exec("CREATE TABLE main.users (id INTEGER PRIMARY KEY, name TEXT, score REAL)")
            .await
            .unwrap();

        let rows = vec![
            Row::from_values(vec![
                Value::Int(1),
                Value::Text("ada".to_string()),
                Value::Float(9.5),
            ]),
            Row::from_values(vec![
                Value::Int(2),
                Value::Text("grace".to_string()),
                Value::Null,
            ]),
        ];
        let inserted = conn
            .insert_rows("users", &["id", "name", "score"], &rows)
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let result = conn
            .query("SELECT id, name, score FROM main.users ORDER BY id")
            .await
            .unwrap();
        assert_eq!(result.row_count, 2);
        assert_eq!(result.columns.len(), 3);
        assert_eq!(result.columns[1].name, "name");
        assert_eq!(result.rows[0].get(0), Some(&Value::Int(1)));
        assert_eq!(result.rows[0].get(1), Some(&Value::Text("ada".to_string())));
        assert_eq!(result.rows[0].get(2), Some(&Value::Float(9.5)));
        assert!(result.rows[1].get(2).unwrap().is_null());

        let removed = conn.delete_all("users").await.unwrap();
        assert_eq!(removed, 2);

        conn.disconnect().await.unwrap();
        assert!(!conn.is_connected().await);
    });
}

#[test]
fn sqlite_sql_files_and_csv() {
    let dir = tempfile::tempdir().unwrap();
    let conn = temp_connection(&dir);

    let ddl_path = dir.path().join("schema.sql");
    std::fs::write(
        &ddl_path,
        "CREATE TABLE main.events (id INTEGER PRIMARY KEY, label TEXT, weight REAL)",
    )
    .unwrap();

    let csv_path = dir.path().join("events.csv");
    std::fs::write(&csv_path, "id,label,weight\n1,start,0.5\n2,stop,\n").unwrap();

    let query_path = dir.path().join("count.sql");
    std::fs::write(&query_path, "SELECT COUNT(*) AS n FROM main.events").unwrap();

    smol::block_on(async {
        conn.connect().await.unwrap();

        conn.exec_from_file(&ddl_path).await.unwrap();

        let inserted = conn.insert_from_csv("events", &csv_path).await.unwrap();
        assert_eq!(inserted, 2);

        let count = conn.query_from_file(&query_path).await.unwrap();
        assert_eq!(count.rows[0].get(0), Some(&Value::Int(2)));

        // Text values from the CSV take SQLite column affinity.
        let result = conn
            .query("SELECT id, weight FROM main.events ORDER BY id")
            .await
            .unwrap();
        assert_eq!(result.rows[0].get(0), Some(&Value::Int(1)));
        assert_eq!(result.rows[0].get(1), Some(&Value::Float(0.5)));
        assert!(result.rows[1].get(1).unwrap().is_null());

        // TRUNCATE falls back to DELETE on SQLite.
        conn.truncate("events").await.unwrap();
        let count = conn.query_from_file(&query_path).await.unwrap();
        assert_eq!(count.rows[0].get(0), Some(&Value::Int(0)));
    });
}

#[test]
fn sqlite_rejects_stored_procedures() {
    let dir = tempfile::tempdir().unwrap();
    let conn = temp_connection(&dir);

    smol::block_on(async {
        conn.connect().await.unwrap();
        let err = conn.exec_sproc("refresh_stats").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Unsupported {
                backend: BackendKind::SQLite,
                ..
            }
        ));
    });
}

#[test]
fn missing_sql_file_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let conn = temp_connection(&dir);

    smol::block_on(async {
        conn.connect().await.unwrap();
        let missing = dir.path().join("nope.sql");
        let err = conn.query_from_file(&missing).await.unwrap_err();
        match err {
            Error::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    });
}
