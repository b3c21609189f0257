//! Error types shared by the model, the migration runtime and the generator

use crate::schema::{Dialect, OperationKind};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, comparing, replaying or writing schema state
///
/// Every variant is scoped to a single table or file so a batch can report
/// it and move on to the next table.
#[derive(Error, Debug)]
pub enum DriftError {
    /// Requested table is absent from the live schema
    #[error("Table '{0}' does not exist in the database")]
    NotFound(String),

    /// The dialect cannot express a change the table needs
    #[error(
        "Table '{table}' requires a manual migration: {dialect} does not support {}",
        join_operations(.operations)
    )]
    UnsupportedOperation {
        table: String,
        dialect: Dialect,
        operations: Vec<OperationKind>,
        /// Every difference detected before giving up
        differences: Vec<String>,
    },

    /// Generated content could not be persisted
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// History replay produced something the model cannot interpret
    #[error("Malformed history for table '{table}'{}: {reason}", column_suffix(.column))]
    MalformedHistory {
        table: String,
        column: Option<String>,
        reason: String,
    },

    /// Introspection data violates a table invariant
    #[error("Invalid structure for table '{table}': {reason}")]
    InvalidStructure { table: String, reason: String },

    /// Raised by generated `down()` bodies that cannot be derived safely
    #[error("Migration '{0}' cannot be reverted")]
    Irreversible(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema dump or history journal could not be read
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl DriftError {
    /// Create a `MalformedHistory` error
    pub fn malformed(
        table: impl Into<String>,
        column: Option<&str>,
        reason: impl Into<String>,
    ) -> Self {
        DriftError::MalformedHistory {
            table: table.into(),
            column: column.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// Create an `InvalidStructure` error
    pub fn invalid(table: impl Into<String>, reason: impl Into<String>) -> Self {
        DriftError::InvalidStructure {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is tied to a single table and should not abort a batch
    #[must_use]
    pub fn is_table_scoped(&self) -> bool {
        !matches!(self, DriftError::Config(_))
    }
}

fn join_operations(operations: &[OperationKind]) -> String {
    operations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn column_suffix(column: &Option<String>) -> String {
    column
        .as_deref()
        .map(|c| format!(" (column '{c}')"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, DriftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_operation_names_every_operation() {
        let err = DriftError::UnsupportedOperation {
            table: "post".to_string(),
            dialect: Dialect::Sqlite,
            operations: vec![OperationKind::AlterColumn, OperationKind::AddForeignKey],
            differences: vec![],
        };
        let msg = err.to_string();
        assert!(msg.contains("post"));
        assert!(msg.contains("sqlite"));
        assert!(msg.contains("alter column"));
        assert!(msg.contains("add foreign key"));
    }

    #[test]
    fn test_malformed_history_mentions_column() {
        let err = DriftError::malformed("post", Some("title"), "unknown type");
        assert_eq!(
            err.to_string(),
            "Malformed history for table 'post' (column 'title'): unknown type"
        );

        let err = DriftError::malformed("post", None, "table already exists");
        assert_eq!(
            err.to_string(),
            "Malformed history for table 'post': table already exists"
        );
    }
}
