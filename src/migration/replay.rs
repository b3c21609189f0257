//! History replay: applying recorded changes to table states

use crate::error::{DriftError, Result};
use crate::plan::Change;
use crate::schema::{Column, ColumnKind, Dialect, PrimaryKey, Table, TableKeys, TableOptions};
use std::collections::{BTreeMap, BTreeSet};

/// Table states reached by applying changes in order
#[derive(Debug, Clone)]
pub struct SchemaState {
    dialect: Dialect,
    options: TableOptions,
    tables: BTreeMap<String, Table>,
}

impl SchemaState {
    pub fn new(dialect: Dialect, options: TableOptions) -> Self {
        Self {
            dialect,
            options,
            tables: BTreeMap::new(),
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn into_table(mut self, name: &str) -> Option<Table> {
        self.tables.remove(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Apply every change in order
    pub fn apply_all<'a>(&mut self, changes: impl IntoIterator<Item = &'a Change>) -> Result<()> {
        for change in changes {
            self.apply(change)?;
        }
        Ok(())
    }

    /// Replay only the changes that shaped `name`, following renames back
    ///
    /// Malformed history of unrelated tables does not affect the result.
    pub fn replay_table(
        dialect: Dialect,
        options: TableOptions,
        changes: &[Change],
        name: &str,
    ) -> Result<Option<Table>> {
        let mut lineage: BTreeSet<&str> = BTreeSet::new();
        lineage.insert(name);
        for change in changes.iter().rev() {
            if let Change::RenameTable { from, to } = change {
                if lineage.contains(to.as_str()) {
                    lineage.insert(from.as_str());
                }
            }
        }

        let mut state = SchemaState::new(dialect, options);
        state.apply_all(changes.iter().filter(|c| lineage.contains(c.table())))?;
        Ok(state.into_table(name))
    }

    /// Apply one change
    ///
    /// # Errors
    ///
    /// Returns `MalformedHistory` when the change does not fit the current
    /// state (missing table or column, duplicate key, and so on).
    pub fn apply(&mut self, change: &Change) -> Result<()> {
        match change {
            Change::CreateTable { table, columns, keys } => {
                if self.tables.contains_key(table) {
                    return Err(DriftError::malformed(table, None, "table is created twice"));
                }
                let created = self.create(table, columns, keys)?;
                self.tables.insert(table.clone(), created);
            }
            Change::DropTable { table } => {
                self.tables
                    .remove(table)
                    .ok_or_else(|| DriftError::malformed(table, None, "dropping a missing table"))?;
            }
            Change::RenameTable { from, to } => {
                let mut moved = self
                    .tables
                    .remove(from)
                    .ok_or_else(|| DriftError::malformed(from, None, "renaming a missing table"))?;
                if self.tables.contains_key(to) {
                    return Err(DriftError::malformed(to, None, "rename target already exists"));
                }
                moved.name = to.clone();
                self.tables.insert(to.clone(), moved);
            }
            Change::AddColumn { table, column } => {
                let target = self.table_mut(table)?;
                if target.has_column(&column.name) {
                    return Err(DriftError::malformed(table, Some(column.name.as_str()), "column is added twice"));
                }
                let position = if column.first {
                    0
                } else {
                    match &column.after {
                        Some(after) => target
                            .position(after)
                            .map(|p| p + 1)
                            .ok_or_else(|| {
                                DriftError::malformed(
                                    table,
                                    Some(column.name.as_str()),
                                    format!("added after missing column '{}'", after),
                                )
                            })?,
                        None => target.columns.len(),
                    }
                };
                let added = column.without_position();
                let adds_key = added.is_primary_key() && target.primary_key.is_none();
                target.columns.insert(position, added);
                if adds_key {
                    target.primary_key = Some(PrimaryKey::new([column.name.clone()]));
                }
                target.sync_primary_key_flags();
            }
            Change::DropColumn { table, column } => {
                let target = self.table_mut(table)?;
                let position = target.position(column).ok_or_else(|| {
                    DriftError::malformed(table, Some(column.as_str()), "dropping a missing column")
                })?;
                target.columns.remove(position);
                forget_column(target, column);
            }
            Change::AlterColumn { table, column } => {
                let target = self.table_mut(table)?;
                let existing = target.column_mut(&column.name).ok_or_else(|| {
                    DriftError::malformed(table, Some(column.name.as_str()), "altering a missing column")
                })?;
                let in_key = existing.primary_key;
                *existing = column.without_position();
                existing.primary_key = in_key;
            }
            Change::RenameColumn { table, from, to } => {
                let target = self.table_mut(table)?;
                if target.has_column(to) {
                    return Err(DriftError::malformed(table, Some(to.as_str()), "rename target already exists"));
                }
                let existing = target.column_mut(from).ok_or_else(|| {
                    DriftError::malformed(table, Some(from.as_str()), "renaming a missing column")
                })?;
                existing.name = to.clone();
                rename_references(target, from, to);
            }
            Change::AddPrimaryKey { table, key } => {
                let target = self.table_mut(table)?;
                if target.primary_key.is_some() {
                    return Err(DriftError::malformed(table, None, "primary key is added twice"));
                }
                if let Some(missing) = key.columns.iter().find(|c| !target.has_column(c)) {
                    return Err(DriftError::malformed(table, Some(missing.as_str()), "primary key on a missing column"));
                }
                target.primary_key = Some(key.clone());
                target.sync_primary_key_flags();
            }
            Change::DropPrimaryKey { table, .. } => {
                let target = self.table_mut(table)?;
                if target.primary_key.take().is_none() {
                    return Err(DriftError::malformed(table, None, "dropping a missing primary key"));
                }
                target.sync_primary_key_flags();
            }
            Change::AddForeignKey { table, key } => {
                let target = self.table_mut(table)?;
                if target.foreign_key(&key.name).is_some() {
                    return Err(DriftError::malformed(
                        table,
                        None,
                        format!("foreign key '{}' is added twice", key.name),
                    ));
                }
                if let Some(missing) = key.columns.iter().find(|c| !target.has_column(c)) {
                    return Err(DriftError::malformed(table, Some(missing.as_str()), "foreign key on a missing column"));
                }
                target.foreign_keys.push(key.clone());
            }
            Change::DropForeignKey { table, name } => {
                let target = self.table_mut(table)?;
                let before = target.foreign_keys.len();
                target.foreign_keys.retain(|fk| &fk.name != name);
                if target.foreign_keys.len() == before {
                    return Err(DriftError::malformed(
                        table,
                        None,
                        format!("dropping missing foreign key '{}'", name),
                    ));
                }
            }
            Change::CreateIndex { table, index } => {
                let target = self.table_mut(table)?;
                if target.index(&index.name).is_some() {
                    return Err(DriftError::malformed(
                        table,
                        None,
                        format!("index '{}' is created twice", index.name),
                    ));
                }
                if let Some(missing) = index.columns.iter().find(|c| !target.has_column(c)) {
                    return Err(DriftError::malformed(table, Some(missing.as_str()), "index on a missing column"));
                }
                if !target.fold_unique_index(index) {
                    target.indexes.push(index.clone());
                }
            }
            Change::DropIndex { table, name } => {
                let target = self.table_mut(table)?;
                let before = target.indexes.len();
                target.indexes.retain(|idx| &idx.name != name);
                if target.indexes.len() == before {
                    // a folded unique index is dropped through its column
                    match target.column_mut(name) {
                        Some(column) if column.unique => column.unique = false,
                        _ => {
                            return Err(DriftError::malformed(
                                table,
                                None,
                                format!("dropping missing index '{}'", name),
                            ))
                        }
                    }
                }
            }
            Change::AddComment { table, column, comment } => {
                let target = self.table_mut(table)?;
                let existing = target.column_mut(column).ok_or_else(|| {
                    DriftError::malformed(table, Some(column.as_str()), "comment on a missing column")
                })?;
                existing.comment = Some(comment.clone());
            }
            Change::DropComment { table, column } => {
                let target = self.table_mut(table)?;
                let existing = target.column_mut(column).ok_or_else(|| {
                    DriftError::malformed(table, Some(column.as_str()), "comment on a missing column")
                })?;
                existing.comment = None;
            }
        }
        Ok(())
    }

    fn create(&self, name: &str, columns: &[Column], keys: &TableKeys) -> Result<Table> {
        let mut table = Table::new(name, self.dialect).with_options(self.options.clone());
        for column in columns {
            if table.has_column(&column.name) {
                return Err(DriftError::malformed(name, Some(column.name.as_str()), "column is declared twice"));
            }
            if let ColumnKind::Native(raw) = &column.kind {
                if raw.trim().is_empty() {
                    return Err(DriftError::malformed(name, Some(column.name.as_str()), "column has no type"));
                }
            }
            table.columns.push(column.without_position());
        }
        let key_columns: Vec<String> = table
            .columns
            .iter()
            .filter(|c| c.is_primary_key())
            .map(|c| c.name.clone())
            .collect();
        if !key_columns.is_empty() {
            table.primary_key = Some(PrimaryKey::new(key_columns));
        }
        if let Some(key) = &keys.primary_key {
            if let Some(missing) = key.columns.iter().find(|c| !table.has_column(c)) {
                return Err(DriftError::malformed(name, Some(missing.as_str()), "primary key on a missing column"));
            }
            table.primary_key = Some(key.clone());
        }
        for key in &keys.foreign_keys {
            if table.foreign_key(&key.name).is_some() {
                return Err(DriftError::malformed(
                    name,
                    None,
                    format!("foreign key '{}' is declared twice", key.name),
                ));
            }
            if let Some(missing) = key.columns.iter().find(|c| !table.has_column(c)) {
                return Err(DriftError::malformed(name, Some(missing.as_str()), "foreign key on a missing column"));
            }
            table.foreign_keys.push(key.clone());
        }
        table.sync_primary_key_flags();
        Ok(table)
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DriftError::malformed(name, None, "table does not exist at this point in history"))
    }
}

/// Remove a dropped column from keys and indexes
fn forget_column(table: &mut Table, column: &str) {
    if let Some(pk) = &mut table.primary_key {
        pk.columns.retain(|c| c != column);
        if pk.columns.is_empty() {
            table.primary_key = None;
        }
    }
    table.foreign_keys.retain(|fk| !fk.columns.iter().any(|c| c == column));
    for index in &mut table.indexes {
        index.columns.retain(|c| c != column);
    }
    table.indexes.retain(|idx| !idx.columns.is_empty());
}

fn rename_references(table: &mut Table, from: &str, to: &str) {
    let rename = |columns: &mut Vec<String>| {
        for c in columns.iter_mut() {
            if c == from {
                *c = to.to_string();
            }
        }
    };
    if let Some(pk) = &mut table.primary_key {
        rename(&mut pk.columns);
    }
    for fk in &mut table.foreign_keys {
        rename(&mut fk.columns);
    }
    for index in &mut table.indexes {
        rename(&mut index.columns);
    }
}
