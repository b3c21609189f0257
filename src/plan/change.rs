//! Typed structural changes

use crate::schema::{Column, ForeignKey, Index, OperationKind, PrimaryKey, TableKeys};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One structural change to one table
///
/// Table names are raw names; rendering applies the prefix placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Change {
    /// Columns carry their primary-key flag; composite and foreign keys
    /// follow as separate changes unless declared in `keys`
    CreateTable {
        table: String,
        columns: Vec<Column>,
        #[serde(default, skip_serializing_if = "TableKeys::is_empty")]
        keys: TableKeys,
    },
    DropTable { table: String },
    RenameTable { from: String, to: String },
    AddColumn { table: String, column: Column },
    DropColumn { table: String, column: String },
    AlterColumn { table: String, column: Column },
    RenameColumn { table: String, from: String, to: String },
    AddPrimaryKey { table: String, key: PrimaryKey },
    DropPrimaryKey { table: String, name: String },
    AddForeignKey { table: String, key: ForeignKey },
    DropForeignKey { table: String, name: String },
    CreateIndex { table: String, index: Index },
    DropIndex { table: String, name: String },
    AddComment { table: String, column: String, comment: String },
    DropComment { table: String, column: String },
}

impl Change {
    pub fn kind(&self) -> OperationKind {
        match self {
            Change::CreateTable { .. } => OperationKind::CreateTable,
            Change::DropTable { .. } => OperationKind::DropTable,
            Change::RenameTable { .. } => OperationKind::RenameTable,
            Change::AddColumn { .. } => OperationKind::AddColumn,
            Change::DropColumn { .. } => OperationKind::DropColumn,
            Change::AlterColumn { .. } => OperationKind::AlterColumn,
            Change::RenameColumn { .. } => OperationKind::RenameColumn,
            Change::AddPrimaryKey { .. } => OperationKind::AddPrimaryKey,
            Change::DropPrimaryKey { .. } => OperationKind::DropPrimaryKey,
            Change::AddForeignKey { .. } => OperationKind::AddForeignKey,
            Change::DropForeignKey { .. } => OperationKind::DropForeignKey,
            Change::CreateIndex { .. } => OperationKind::CreateIndex,
            Change::DropIndex { .. } => OperationKind::DropIndex,
            Change::AddComment { .. } => OperationKind::AddComment,
            Change::DropComment { .. } => OperationKind::DropComment,
        }
    }

    /// Table the change applies to (the source table for renames)
    pub fn table(&self) -> &str {
        match self {
            Change::RenameTable { from, .. } => from,
            Change::CreateTable { table, .. }
            | Change::DropTable { table }
            | Change::AddColumn { table, .. }
            | Change::DropColumn { table, .. }
            | Change::AlterColumn { table, .. }
            | Change::RenameColumn { table, .. }
            | Change::AddPrimaryKey { table, .. }
            | Change::DropPrimaryKey { table, .. }
            | Change::AddForeignKey { table, .. }
            | Change::DropForeignKey { table, .. }
            | Change::CreateIndex { table, .. }
            | Change::DropIndex { table, .. }
            | Change::AddComment { table, .. }
            | Change::DropComment { table, .. } => table,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::CreateTable { table, columns, .. } => {
                write!(f, "create table '{}' ({} columns)", table, columns.len())
            }
            Change::DropTable { table } => write!(f, "drop table '{}'", table),
            Change::RenameTable { from, to } => write!(f, "rename table '{}' to '{}'", from, to),
            Change::AddColumn { table, column } => {
                write!(f, "add column '{}' to '{}'", column.name, table)
            }
            Change::DropColumn { table, column } => {
                write!(f, "drop column '{}' from '{}'", column, table)
            }
            Change::AlterColumn { table, column } => {
                write!(f, "alter column '{}' in '{}'", column.name, table)
            }
            Change::RenameColumn { table, from, to } => {
                write!(f, "rename column '{}' to '{}' in '{}'", from, to, table)
            }
            Change::AddPrimaryKey { table, key } => {
                write!(f, "add primary key ({}) to '{}'", key.columns.join(", "), table)
            }
            Change::DropPrimaryKey { table, name } => {
                write!(f, "drop primary key '{}' from '{}'", name, table)
            }
            Change::AddForeignKey { table, key } => {
                write!(f, "add foreign key '{}' to '{}'", key.name, table)
            }
            Change::DropForeignKey { table, name } => {
                write!(f, "drop foreign key '{}' from '{}'", name, table)
            }
            Change::CreateIndex { table, index } => {
                write!(f, "create index '{}' on '{}'", index.name, table)
            }
            Change::DropIndex { table, name } => write!(f, "drop index '{}' from '{}'", name, table),
            Change::AddComment { table, column, .. } => {
                write!(f, "add comment on '{}.{}'", table, column)
            }
            Change::DropComment { table, column } => {
                write!(f, "drop comment from '{}.{}'", table, column)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnKind};

    #[test]
    fn test_serialized_form_is_tagged() {
        let change = Change::AddColumn {
            table: "post".to_string(),
            column: Column::new("body", ColumnKind::Text),
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["op"], "add_column");
        assert_eq!(json["column"]["kind"], "text");

        let back: Change = serde_json::from_value(json).unwrap();
        assert_eq!(back, change);
        assert_eq!(back.kind(), OperationKind::AddColumn);
    }

    #[test]
    fn test_rename_is_owned_by_source_table() {
        let change = Change::RenameTable {
            from: "post".to_string(),
            to: "article".to_string(),
        };
        assert_eq!(change.table(), "post");
        assert_eq!(change.to_string(), "rename table 'post' to 'article'");
    }
}
