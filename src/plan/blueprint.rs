//! Up/down change container for one table

use crate::error::{DriftError, Result};
use crate::plan::Change;
use crate::schema::{Dialect, OperationKind};

/// Ordered changes for one table, with their structural inverses
///
/// Changes are pushed as up/down pairs. `down()` yields the inverses in
/// reverse push order, so running up then down restores the starting state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blueprint {
    table: String,
    up: Vec<Change>,
    down: Vec<Change>,
    differences: Vec<String>,
    manual_down: Vec<OperationKind>,
}

impl Blueprint {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Append a change and, when one exists, its inverse
    pub fn push(&mut self, up: Change, down: Option<Change>) {
        self.up.push(up);
        if let Some(down) = down {
            self.down.push(down);
        }
    }

    /// Record a human-readable difference
    pub fn describe(&mut self, difference: impl Into<String>) {
        self.differences.push(difference.into());
    }

    pub fn up(&self) -> &[Change] {
        &self.up
    }

    /// Inverse changes in execution order
    pub fn down(&self) -> Vec<&Change> {
        self.down.iter().rev().collect()
    }

    pub fn differences(&self) -> &[String] {
        &self.differences
    }

    pub fn is_empty(&self) -> bool {
        self.up.is_empty()
    }

    /// Whether `down()` can be rendered as statements
    pub fn is_reversible(&self) -> bool {
        self.manual_down.is_empty()
    }

    /// Down operations the dialect cannot express
    pub fn manual_down(&self) -> &[OperationKind] {
        &self.manual_down
    }

    /// Check every change against what `dialect` can express
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` naming every unsupported up operation
    /// and carrying every recorded difference. Unsupported down operations
    /// only mark the blueprint as needing a manual down.
    pub fn apply_dialect_policy(&mut self, dialect: Dialect) -> Result<()> {
        let unsupported_up = unsupported(&self.up, dialect);
        if !unsupported_up.is_empty() {
            return Err(DriftError::UnsupportedOperation {
                table: self.table.clone(),
                dialect,
                operations: unsupported_up,
                differences: self.differences.clone(),
            });
        }
        self.manual_down = unsupported(&self.down, dialect);
        if !self.manual_down.is_empty() {
            log::warn!(
                "Table '{}': {} cannot revert {:?}, down() will need a manual implementation",
                self.table,
                dialect,
                self.manual_down
            );
        }
        Ok(())
    }
}

fn unsupported(changes: &[Change], dialect: Dialect) -> Vec<OperationKind> {
    let mut kinds: Vec<OperationKind> = changes
        .iter()
        .map(Change::kind)
        .filter(|kind| !dialect.supports(*kind))
        .collect();
    kinds.sort();
    kinds.dedup();
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnKind};

    fn add_column(name: &str) -> Change {
        Change::AddColumn {
            table: "post".to_string(),
            column: Column::new(name, ColumnKind::String),
        }
    }

    fn drop_column(name: &str) -> Change {
        Change::DropColumn {
            table: "post".to_string(),
            column: name.to_string(),
        }
    }

    #[test]
    fn test_down_runs_in_reverse() {
        let mut blueprint = Blueprint::new("post");
        blueprint.push(add_column("a"), Some(drop_column("a")));
        blueprint.push(add_column("b"), Some(drop_column("b")));

        let down = blueprint.down();
        assert_eq!(down[0], &drop_column("b"));
        assert_eq!(down[1], &drop_column("a"));
    }

    #[test]
    fn test_sqlite_unsupported_up_fails() {
        let mut blueprint = Blueprint::new("post");
        blueprint.describe("different 'not null' for column 'title'");
        blueprint.push(
            Change::AlterColumn {
                table: "post".to_string(),
                column: Column::new("title", ColumnKind::String).not_null(),
            },
            None,
        );

        match blueprint.apply_dialect_policy(Dialect::Sqlite) {
            Err(DriftError::UnsupportedOperation { operations, differences, .. }) => {
                assert_eq!(operations, vec![OperationKind::AlterColumn]);
                assert_eq!(differences.len(), 1);
            }
            other => panic!("expected UnsupportedOperation, got {:?}", other),
        }
    }

    #[test]
    fn test_sqlite_unsupported_down_marks_manual() {
        let mut blueprint = Blueprint::new("post");
        blueprint.push(add_column("a"), Some(drop_column("a")));

        blueprint.apply_dialect_policy(Dialect::Sqlite).unwrap();
        assert!(!blueprint.is_reversible());
        assert_eq!(blueprint.manual_down(), &[OperationKind::DropColumn]);

        let mut blueprint = Blueprint::new("post");
        blueprint.push(add_column("a"), Some(drop_column("a")));
        blueprint.apply_dialect_policy(Dialect::Mysql).unwrap();
        assert!(blueprint.is_reversible());
    }
}
