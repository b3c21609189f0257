//! Tests for loading schema dumps

use driftguard::schema::{ColumnKind, TableOptions};
use driftguard::source::SchemaSource;
use driftguard::{Dialect, DriftError};
use driftguard_migrate::snapshot_loader::SnapshotSource;
use std::fs;
use tempfile::TempDir;

const POST_TOML: &str = r#"
dialect = "mysql"

[[tables]]
name = "post"

[[tables.columns]]
name = "id"
db_type = "int(11)"
nullable = false
auto_increment = true

[[tables.columns]]
name = "title"
db_type = "varchar(255)"
nullable = false

[tables.primary_key]
name = "PRIMARY"
columns = ["id"]
"#;

const USER_JSON: &str = r#"{
  "tables": [
    {
      "name": "user",
      "columns": [
        { "name": "id", "db_type": "int(11)", "nullable": false, "auto_increment": true },
        { "name": "email", "db_type": "varchar(255)", "nullable": false }
      ],
      "primary_key": { "columns": ["id"] }
    }
  ]
}"#;

#[test]
fn test_load_single_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schema.toml");
    fs::write(&path, POST_TOML).unwrap();

    let source = SnapshotSource::load(&path, Dialect::Mysql, TableOptions::default()).unwrap();
    assert_eq!(source.table_names().unwrap(), vec!["post"]);

    let post = source.current_table("post").unwrap();
    assert_eq!(post.columns.len(), 2);
    assert_eq!(post.columns[0].kind, ColumnKind::Integer);
    assert!(post.columns[0].primary_key && post.columns[0].auto_increment);
    assert_eq!(post.primary_key.as_ref().map(|pk| pk.columns.clone()), Some(vec!["id".to_string()]));
    assert!(post.primary_key.as_ref().is_some_and(|pk| pk.name.is_none()));
}

#[test]
fn test_load_directory_of_mixed_files() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("blog")).unwrap();
    fs::create_dir_all(dir.path().join(".cache")).unwrap();
    fs::write(dir.path().join("blog/post.toml"), POST_TOML).unwrap();
    fs::write(dir.path().join("user.json"), USER_JSON).unwrap();
    fs::write(dir.path().join("README.md"), "not a dump").unwrap();
    fs::write(dir.path().join(".cache/stale.toml"), "this is not toml [").unwrap();

    let source = SnapshotSource::load(dir.path(), Dialect::Mysql, TableOptions::default()).unwrap();
    // files are read in path order
    assert_eq!(source.table_names().unwrap(), vec!["post", "user"]);
    assert_eq!(source.current_table("user").unwrap().columns[1].name, "email");
}

#[test]
fn test_first_definition_wins() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.toml"), POST_TOML).unwrap();
    fs::write(
        dir.path().join("b.json"),
        r#"{"tables": [{"name": "post", "columns": [{"name": "id", "db_type": "bigint(20)"}]}]}"#,
    )
    .unwrap();

    let source = SnapshotSource::load(dir.path(), Dialect::Mysql, TableOptions::default()).unwrap();
    assert_eq!(source.table_names().unwrap(), vec!["post"]);
    assert_eq!(source.current_table("post").unwrap().columns.len(), 2);
}

#[test]
fn test_unknown_table_is_not_found() {
    let source = SnapshotSource::new(Dialect::Pgsql, TableOptions::default(), Vec::new());
    assert!(matches!(source.current_table("ghost"), Err(DriftError::NotFound(name)) if name == "ghost"));
}

#[test]
fn test_dialect_mismatch_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schema.toml");
    fs::write(&path, POST_TOML).unwrap();

    match SnapshotSource::load(&path, Dialect::Pgsql, TableOptions::default()) {
        Err(DriftError::Snapshot(message)) => assert!(message.contains("mysql")),
        other => panic!("expected a snapshot error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_path_and_bad_content() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        SnapshotSource::load(&dir.path().join("nope"), Dialect::Mysql, TableOptions::default()),
        Err(DriftError::Snapshot(_))
    ));

    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"tables\": [").unwrap();
    assert!(matches!(
        SnapshotSource::load(&path, Dialect::Mysql, TableOptions::default()),
        Err(DriftError::Snapshot(_))
    ));
}
