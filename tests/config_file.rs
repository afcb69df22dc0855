#![cfg(feature = "sqlite")]
use std::io::Write;

use sql_record::prelude::*;
use tokio::runtime::Runtime;

fn write_config(dir: &tempfile::TempDir, body: &str) -> Result<std::path::PathBuf, std::io::Error> {
    let path = dir.path().join("database.json");
    let mut file = std::fs::File::create(&path)?;
    file.write_all(body.as_bytes())?;
    Ok(path)
}

#[test]
fn file_database_from_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("app.sqlite");
    let config = serde_json::json!({
        "default": "sqlite",
        "connections": {
            "sqlite": { "database": db_path.to_string_lossy() },
            "pgsql": { "host": "localhost", "database": "unused" }
        }
    });
    let path = write_config(&dir, &config.to_string())?;

    let rt = Runtime::new()?;
    rt.block_on(async {
        let mut db = Database::from_config_file(&path)?;
        assert_eq!(db.db_type(), DatabaseType::Sqlite);
        assert!(!db.is_connected());

        db.execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);")
            .await?;
        assert!(db.is_connected());

        let mode = db.raw("PRAGMA journal_mode;", RawParams::None).await?;
        assert_eq!(
            mode.results[0].get_by_index(0),
            Some(&RowValues::Text("wal".into()))
        );

        db.table("notes").insert([("body", "kept")]).await?;
        db.close();
        assert!(!db.is_connected());

        // reopening sees the committed row
        assert_eq!(db.table("notes").count().await?, 1);

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
fn config_errors() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;

    let missing = Database::from_config_file(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(missing, SqlRecordError::ConfigFileNotFound(_)));

    let no_default = write_config(&dir, r#"{ "connections": { "sqlite": { "database": ":memory:" } } }"#)?;
    assert!(matches!(
        Database::from_config_file(&no_default).unwrap_err(),
        SqlRecordError::DriverNotFound(_)
    ));

    let oracle = write_config(
        &dir,
        r#"{ "default": "oracle", "connections": { "oracle": { "database": "app" } } }"#,
    )?;
    let err = Database::from_config_file(&oracle).unwrap_err();
    assert_eq!(err.to_string(), "Driver not found: Unsupported driver: oracle");

    Ok(())
}

#[test]
fn missing_database_setting_fails_on_first_use() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::parse(r#"{ "default": "sqlite", "connections": { "sqlite": {} } }"#)?;
    let db = Database::from_config(config)?;

    let rt = Runtime::new()?;
    rt.block_on(async {
        let err = db.connection().await.unwrap_err();
        assert!(matches!(err, SqlRecordError::ConfigError(_)));
        assert!(!db.is_connected());
    });
    Ok(())
}

#[cfg(feature = "mysql")]
#[test]
fn mysql_entry_resolves_without_connecting() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = write_config(
        &dir,
        r#"{ "default": "mysql", "connections": { "mysql": { "host": "db", "database": "app" } } }"#,
    )?;
    let db = Database::from_config_file(&path)?;
    assert_eq!(db.db_type(), DatabaseType::MySql);
    assert!(!db.is_connected());
    Ok(())
}
