//! History journals
//!
//! Every generated migration gets a JSON journal of its up changes under
//! `<migrations_dir>/journal/`. Replaying the journals in version order
//! reconstructs what history says each table looks like, without parsing
//! migration source.

use driftguard::migration::{MigrationFile, SchemaState};
use driftguard::plan::Change;
use driftguard::schema::TableOptions;
use driftguard::source::HistorySource;
use driftguard::{Dialect, DriftError, Result, Table};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const JOURNAL_DIR: &str = "journal";

/// Up changes of one generated migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub version: i64,
    pub name: String,
    pub changes: Vec<Change>,
}

impl Journal {
    pub fn new(version: i64, name: impl Into<String>, changes: Vec<Change>) -> Self {
        Self {
            version,
            name: name.into(),
            changes,
        }
    }

    /// `m{version}_{name}`, the same id the migration file uses
    pub fn id(&self) -> String {
        format!("m{}_{}", self.version, self.name)
    }

    /// Where this journal lives for a migrations directory
    pub fn path_in(&self, migrations_dir: &Path) -> PathBuf {
        migrations_dir
            .join(JOURNAL_DIR)
            .join(format!("{}.json", self.id()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DriftError::Config(format!("Failed to serialize journal {}: {}", self.id(), e)))
    }

    fn is_skipped(&self, skip: &[String]) -> bool {
        let id = self.id();
        skip.iter().any(|s| *s == self.name || *s == id)
    }
}

/// [`HistorySource`] backed by the journals of a migrations directory
#[derive(Debug, Clone)]
pub struct JournalHistory {
    dir: PathBuf,
    dialect: Dialect,
    options: TableOptions,
}

impl JournalHistory {
    pub fn new(migrations_dir: &Path, dialect: Dialect, options: TableOptions) -> Self {
        Self {
            dir: migrations_dir.join(JOURNAL_DIR),
            dialect,
            options,
        }
    }

    /// Every journal, oldest first; a missing directory yields none
    pub fn journals(&self) -> Result<Vec<Journal>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| self.unreadable(&self.dir, e))?;

        let mut journals = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| self.unreadable(&self.dir, e))?.path();
            let is_journal = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|stem| MigrationFile::parse_filename(&format!("{}.rs", stem)))
                .is_some();
            if !is_journal {
                continue;
            }
            let content = fs::read_to_string(&path).map_err(|e| self.unreadable(&path, e))?;
            let journal: Journal = serde_json::from_str(&content).map_err(|e| {
                DriftError::Snapshot(format!("Invalid journal {}: {}", path.display(), e))
            })?;
            journals.push(journal);
        }

        journals.sort_by_key(|j| j.version);
        Ok(journals)
    }

    fn unreadable(&self, path: &Path, err: std::io::Error) -> DriftError {
        DriftError::Snapshot(format!("Failed to read {}: {}", path.display(), err))
    }
}

impl HistorySource for JournalHistory {
    fn historical_table(&self, name: &str, skip: &[String]) -> Result<Option<Table>> {
        let changes: Vec<Change> = self
            .journals()?
            .into_iter()
            .filter(|journal| {
                let skipped = journal.is_skipped(skip);
                if skipped {
                    log::debug!("Skipping {} while replaying history", journal.id());
                }
                !skipped
            })
            .flat_map(|journal| journal.changes)
            .collect();

        SchemaState::replay_table(self.dialect, self.options.clone(), &changes, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftguard::schema::{Column, ColumnKind};
    use tempfile::TempDir;

    fn write(dir: &Path, journal: &Journal) {
        let path = journal.path_in(dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, journal.to_json().unwrap()).unwrap();
    }

    #[test]
    fn test_replay_in_version_order_with_skip() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            &Journal::new(
                20240102000000,
                "update_table_post",
                vec![Change::AddColumn {
                    table: "post".to_string(),
                    column: Column::new("body", ColumnKind::Text),
                }],
            ),
        );
        write(
            dir.path(),
            &Journal::new(
                20240101000000,
                "create_table_post",
                vec![Change::CreateTable {
                    table: "post".to_string(),
                    columns: vec![Column::new("id", ColumnKind::PrimaryKey).in_primary_key()],
                    keys: Default::default(),
                }],
            ),
        );
        fs::write(dir.path().join(JOURNAL_DIR).join("notes.json"), "{}").unwrap();

        let history = JournalHistory::new(dir.path(), Dialect::Mysql, TableOptions::default());
        let post = history.historical_table("post", &[]).unwrap().unwrap();
        assert_eq!(post.columns.len(), 2);

        let skipped = history
            .historical_table("post", &["m20240102000000_update_table_post".to_string()])
            .unwrap()
            .unwrap();
        assert!(!skipped.has_column("body"));

        assert!(history.historical_table("user", &[]).unwrap().is_none());
    }

    #[test]
    fn test_missing_directory_has_no_history() {
        let dir = TempDir::new().unwrap();
        let history = JournalHistory::new(&dir.path().join("nope"), Dialect::Pgsql, TableOptions::default());
        assert!(history.journals().unwrap().is_empty());
    }
}
