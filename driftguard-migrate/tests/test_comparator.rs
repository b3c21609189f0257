//! Tests for the structure comparator

use driftguard::migration::SchemaState;
use driftguard::plan::Change;
use driftguard::schema::{
    Column, ColumnKind, Dialect, OperationKind, RawColumn, RawForeignKey, RawIndex, RawPrimaryKey,
    RawTable, TableBuilder, TableOptions,
};
use driftguard::{DriftError, Table};
use driftguard_migrate::compare;
use proptest::prelude::*;

fn raw_column(name: &str, db_type: &str, nullable: bool) -> RawColumn {
    RawColumn {
        name: name.to_string(),
        db_type: db_type.to_string(),
        nullable,
        ..Default::default()
    }
}

fn raw_post() -> RawTable {
    RawTable {
        name: "post".to_string(),
        columns: vec![
            RawColumn {
                auto_increment: true,
                ..raw_column("id", "int(11)", false)
            },
            raw_column("author_id", "int(11)", false),
            raw_column("title", "varchar(255)", false),
            raw_column("status", "smallint(6)", true),
            RawColumn {
                default_expression: Some("CURRENT_TIMESTAMP".to_string()),
                extra: Some("on update CURRENT_TIMESTAMP".to_string()),
                ..raw_column("updated_at", "timestamp", true)
            },
        ],
        primary_key: Some(RawPrimaryKey {
            name: Some("PRIMARY".to_string()),
            columns: vec!["id".to_string()],
        }),
        foreign_keys: vec![RawForeignKey {
            name: Some("post_ibfk_1".to_string()),
            columns: vec!["author_id".to_string()],
            ref_table: "user".to_string(),
            ref_columns: vec!["id".to_string()],
            on_delete: Some("CASCADE".to_string()),
            on_update: None,
        }],
        indexes: vec![RawIndex {
            name: Some("title".to_string()),
            columns: vec!["title".to_string()],
            unique: true,
        }],
    }
}

fn build(dialect: Dialect, raw: &RawTable) -> Table {
    TableBuilder::new(dialect, TableOptions::default())
        .build(raw)
        .unwrap()
}

#[test]
fn test_compare_is_idempotent() {
    for dialect in [Dialect::Mysql, Dialect::Pgsql, Dialect::Sqlite, Dialect::Mssql] {
        let table = build(dialect, &raw_post());
        let blueprint = compare(&table, &table).unwrap();
        assert!(blueprint.is_empty(), "{} produced {:?}", dialect, blueprint.up());
    }
}

#[test]
fn test_added_and_removed_columns_are_symmetric() {
    let a = build(Dialect::Mysql, &raw_post());
    let mut raw = raw_post();
    raw.columns.push(raw_column("body", "text", true));
    let b = build(Dialect::Mysql, &raw);

    let forward = compare(&b, &a).unwrap();
    assert!(forward
        .up()
        .iter()
        .any(|c| matches!(c, Change::AddColumn { column, .. } if column.name == "body")));

    let backward = compare(&a, &b).unwrap();
    assert!(backward
        .up()
        .iter()
        .any(|c| matches!(c, Change::DropColumn { column, .. } if column == "body")));
}

#[test]
fn test_nullable_to_not_null_alters_one_column() {
    let historical = build(Dialect::Mysql, &raw_post());
    let mut raw = raw_post();
    raw.columns[3].nullable = false;
    let current = build(Dialect::Mysql, &raw);

    let blueprint = compare(&current, &historical).unwrap();
    assert_eq!(blueprint.up().len(), 1);
    match (&blueprint.up()[0], blueprint.down()[0]) {
        (Change::AlterColumn { column: up, .. }, Change::AlterColumn { column: down, .. }) => {
            assert_eq!(up.name, "status");
            assert!(up.not_null);
            assert!(!down.not_null);
        }
        other => panic!("unexpected changes {:?}", other),
    }
    assert_eq!(blueprint.differences().len(), 1);
    assert!(blueprint.differences()[0].contains("not null (false → true)"));
}

#[test]
fn test_unique_composite_index_is_created() {
    let historical = build(Dialect::Pgsql, &raw_post());
    let mut raw = raw_post();
    raw.indexes.push(RawIndex {
        name: Some("idx-post-author-status".to_string()),
        columns: vec!["author_id".to_string(), "status".to_string()],
        unique: true,
    });
    let current = build(Dialect::Pgsql, &raw);

    let blueprint = compare(&current, &historical).unwrap();
    match blueprint.up() {
        [Change::CreateIndex { index, .. }] => {
            assert!(index.unique);
            assert_eq!(index.columns, vec!["author_id", "status"]);
        }
        other => panic!("unexpected changes {:?}", other),
    }
    assert_eq!(
        blueprint.down(),
        vec![&Change::DropIndex {
            table: "post".to_string(),
            name: "idx-post-author-status".to_string(),
        }]
    );
}

#[test]
fn test_sqlite_alter_is_unsupported() {
    let historical = build(Dialect::Sqlite, &raw_post());
    let mut raw = raw_post();
    raw.columns[2].db_type = "text".to_string();
    let current = build(Dialect::Sqlite, &raw);

    match compare(&current, &historical) {
        Err(DriftError::UnsupportedOperation {
            table,
            dialect,
            operations,
            differences,
        }) => {
            assert_eq!(table, "post");
            assert_eq!(dialect, Dialect::Sqlite);
            assert_eq!(operations, vec![OperationKind::AlterColumn]);
            assert!(differences[0].contains("'title'"));
        }
        other => panic!("expected UnsupportedOperation, got {:?}", other),
    }
}

#[test]
fn test_sqlite_added_column_needs_manual_down() {
    let historical = build(Dialect::Sqlite, &raw_post());
    let mut raw = raw_post();
    raw.columns.push(raw_column("body", "text", true));
    let current = build(Dialect::Sqlite, &raw);

    let blueprint = compare(&current, &historical).unwrap();
    assert_eq!(blueprint.up().len(), 1);
    assert!(!blueprint.is_reversible());
    assert_eq!(blueprint.manual_down(), &[OperationKind::DropColumn]);
}

#[test]
fn test_primary_key_change() {
    let mut historical = Table::new("post_tag", Dialect::Mysql);
    historical.columns = vec![
        Column::new("post_id", ColumnKind::Integer).not_null().in_primary_key(),
        Column::new("tag_id", ColumnKind::Integer).not_null(),
    ];
    historical.primary_key = Some(driftguard::PrimaryKey::new(["post_id"]));

    let mut current = historical.clone();
    current.columns[1].primary_key = true;
    current.primary_key = Some(driftguard::PrimaryKey::new(["post_id", "tag_id"]));

    let kinds: Vec<OperationKind> = compare(&current, &historical)
        .unwrap()
        .up()
        .iter()
        .map(Change::kind)
        .collect();
    assert_eq!(kinds, vec![OperationKind::DropPrimaryKey, OperationKind::AddPrimaryKey]);
}

/// Replays `historical`, then the blueprint's up, then its down, returning
/// the table after each half
fn up_then_down(current: &Table, historical: &Table) -> (Table, Table) {
    let blueprint = compare(current, historical).unwrap();
    let mut state = SchemaState::new(historical.dialect, TableOptions::default());
    state
        .apply(&Change::CreateTable {
            table: historical.name.clone(),
            columns: historical.columns.clone(),
            keys: Default::default(),
        })
        .unwrap();

    state.apply_all(blueprint.up()).unwrap();
    let after_up = state.table(&historical.name).unwrap().clone();
    state.apply_all(blueprint.down()).unwrap();
    let after_down = state.into_table(&historical.name).unwrap();
    (after_up, after_down)
}

fn column_names(table: &Table) -> Vec<&str> {
    table.columns.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn test_down_restores_adjacent_dropped_columns() {
    let mut raw = raw_post();
    raw.columns.truncate(2);
    raw.foreign_keys.clear();
    raw.indexes.clear();
    let current = build(Dialect::Mysql, &raw);
    for name in ["a", "b", "c"] {
        raw.columns.push(raw_column(name, "text", true));
    }
    let historical = build(Dialect::Mysql, &raw);

    let (after_up, after_down) = up_then_down(&current, &historical);
    assert!(compare(&current, &after_up).unwrap().is_empty());
    assert!(compare(&historical, &after_down).unwrap().is_empty());
    assert_eq!(column_names(&after_down), vec!["id", "author_id", "a", "b", "c"]);
}

const TYPES: [&str; 4] = ["int(11)", "varchar(255)", "text", "smallint(6)"];

/// `post` with `id` plus column `cN` for every filled slot N
fn slotted(slots: &[Option<(usize, bool)>]) -> Table {
    let mut raw = RawTable {
        name: "post".to_string(),
        columns: vec![RawColumn {
            auto_increment: true,
            ..raw_column("id", "int(11)", false)
        }],
        primary_key: Some(RawPrimaryKey {
            name: Some("PRIMARY".to_string()),
            columns: vec!["id".to_string()],
        }),
        foreign_keys: Vec::new(),
        indexes: Vec::new(),
    };
    for (i, slot) in slots.iter().enumerate() {
        if let Some((ty, nullable)) = slot {
            raw.columns.push(raw_column(&format!("c{}", i), TYPES[*ty], *nullable));
        }
    }
    build(Dialect::Mysql, &raw)
}

fn slots() -> impl Strategy<Value = Vec<Option<(usize, bool)>>> {
    prop::collection::vec(prop::option::of((0..TYPES.len(), any::<bool>())), 5)
}

proptest! {
    #[test]
    fn prop_up_reaches_current_and_down_restores_history(old in slots(), new in slots()) {
        let historical = slotted(&old);
        let current = slotted(&new);

        let (after_up, after_down) = up_then_down(&current, &historical);
        prop_assert!(compare(&current, &after_up).unwrap().is_empty());
        prop_assert!(compare(&historical, &after_down).unwrap().is_empty());
        prop_assert_eq!(column_names(&after_up), column_names(&current));
        prop_assert_eq!(column_names(&after_down), column_names(&historical));
    }
}
