//! Create-table planning
//!
//! Builds the blueprint of a table that history has never seen, and the
//! follow-up blueprint adding foreign keys postponed to break cycles.

use driftguard::plan::{Blueprint, Change};
use driftguard::schema::{OperationKind, PrimaryKey, Table, TableKeys};
use driftguard::{ForeignKey, Result};

use crate::renderer::primary_key_name;

/// Blueprint creating `table` from nothing
///
/// Foreign keys referencing a table in `postponed` are left out; they go
/// into [`plan_foreign_keys`] once every table exists. A composite primary
/// key and the remaining foreign keys follow the create as separate changes,
/// or are declared inside it when the dialect cannot add them later. The
/// down side is a single `DropTable`.
///
/// # Errors
///
/// Returns `DriftError::UnsupportedOperation` when the dialect cannot
/// express a change the create needs.
pub fn plan_create(table: &Table, postponed: &[String]) -> Result<Blueprint> {
    let name = table.name.clone();
    let short = table.short_name();
    let dialect = table.dialect;
    let composite = table.primary_key.as_ref().filter(|pk| pk.is_composite());

    let columns = table
        .columns
        .iter()
        .map(|column| {
            let mut column = column.without_position();
            if composite.is_some() {
                column.primary_key = false;
            }
            column
        })
        .collect();

    let primary_key = composite.map(|pk| PrimaryKey {
        name: Some(pk.name.clone().unwrap_or_else(|| primary_key_name(&short))),
        columns: pk.columns.clone(),
    });
    let foreign_keys: Vec<ForeignKey> = table
        .foreign_keys
        .iter()
        .filter(|key| {
            let held = postponed.contains(&key.ref_table);
            if held {
                log::debug!("Table '{}': foreign key to '{}' postponed", name, key.ref_table);
            }
            !held
        })
        .map(|key| named(key, &short))
        .collect();

    let mut keys = TableKeys::new();
    let primary_key = match primary_key {
        Some(pk) if !dialect.supports(OperationKind::AddPrimaryKey) => {
            keys.primary_key = Some(pk);
            None
        }
        other => other,
    };
    let foreign_keys = if dialect.supports(OperationKind::AddForeignKey) {
        foreign_keys
    } else {
        keys.foreign_keys = foreign_keys;
        Vec::new()
    };

    let mut blueprint = Blueprint::new(&name);
    blueprint.describe(format!("table '{}' created", name));
    blueprint.push(
        Change::CreateTable {
            table: name.clone(),
            columns,
            keys,
        },
        Some(Change::DropTable { table: name.clone() }),
    );

    if let Some(key) = primary_key {
        blueprint.push(
            Change::AddPrimaryKey {
                table: name.clone(),
                key,
            },
            None,
        );
    }

    for index in &table.indexes {
        blueprint.push(
            Change::CreateIndex {
                table: name.clone(),
                index: index.clone(),
            },
            None,
        );
    }

    for key in foreign_keys {
        blueprint.push(
            Change::AddForeignKey {
                table: name.clone(),
                key,
            },
            None,
        );
    }

    blueprint.apply_dialect_policy(dialect)?;
    Ok(blueprint)
}

/// Blueprint adding the postponed foreign keys of several tables
///
/// `postponed` maps a table name to the referenced tables whose keys were
/// held back. Returns `None` when nothing was postponed.
///
/// # Errors
///
/// Returns `DriftError::UnsupportedOperation` when the dialect cannot add
/// foreign keys to existing tables.
pub fn plan_foreign_keys<'a>(
    tables: impl IntoIterator<Item = &'a Table>,
    postponed: &std::collections::BTreeMap<String, Vec<String>>,
) -> Result<Option<Blueprint>> {
    let tables: Vec<&Table> = tables
        .into_iter()
        .filter(|t| postponed.contains_key(&t.name))
        .collect();
    let Some(first) = tables.first() else {
        return Ok(None);
    };
    let dialect = first.dialect;

    let mut blueprint = Blueprint::new(&first.name);
    for table in &tables {
        let held: &[String] = postponed.get(&table.name).map(Vec::as_slice).unwrap_or(&[]);
        let short = table.short_name();
        for key in table.foreign_keys.iter().filter(|fk| held.contains(&fk.ref_table)) {
            let key = named(key, &short);
            blueprint.describe(format!(
                "foreign key '{}' from '{}' to '{}' added after creation",
                key.name, table.name, key.ref_table
            ));
            blueprint.push(
                Change::AddForeignKey {
                    table: table.name.clone(),
                    key: key.clone(),
                },
                Some(Change::DropForeignKey {
                    table: table.name.clone(),
                    name: key.name,
                }),
            );
        }
    }

    if blueprint.is_empty() {
        return Ok(None);
    }
    blueprint.apply_dialect_policy(dialect)?;
    Ok(Some(blueprint))
}

fn named(key: &ForeignKey, short_table: &str) -> ForeignKey {
    let mut key = key.clone();
    if ForeignKey::needs_name(&key.name) {
        key.name = ForeignKey::synthesize_name(short_table, &key.columns);
    }
    key
}
