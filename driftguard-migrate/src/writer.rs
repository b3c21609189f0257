//! Output collaborators: migration files and the history ledger

use chrono::{NaiveDateTime, Utc};
use driftguard::{DriftError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Persists generated files
pub trait MigrationWriter {
    /// Write `content` to `path`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns `DriftError::Write` when the file cannot be written.
    fn write(&mut self, path: &Path, content: &str) -> Result<()>;

    /// Delete a file written earlier in the same run; a missing file is fine
    fn remove(&mut self, path: &Path) -> Result<()>;
}

/// Writes straight to the filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

impl MigrationWriter for FsWriter {
    fn write(&mut self, path: &Path, content: &str) -> Result<()> {
        let io = |source| DriftError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io)?;
        }
        fs::write(path, content).map_err(io)
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Err(source) if source.kind() != ErrorKind::NotFound => Err(DriftError::Write {
                path: path.to_path_buf(),
                source,
            }),
            _ => Ok(()),
        }
    }
}

/// Marks generated migrations as already applied
pub trait HistoryLedger {
    fn record(&mut self, version: i64, namespace: Option<&str>) -> Result<()>;
}

/// One ledger line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub recorded_at: NaiveDateTime,
}

/// Appends JSON lines to a file
#[derive(Debug, Clone)]
pub struct JsonLedger {
    path: PathBuf,
}

impl JsonLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Every entry recorded so far; a missing file has none
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| DriftError::Write {
            path: self.path.clone(),
            source,
        })?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| {
                    DriftError::Snapshot(format!("Invalid ledger line in {}: {}", self.path.display(), e))
                })
            })
            .collect()
    }
}

impl HistoryLedger for JsonLedger {
    fn record(&mut self, version: i64, namespace: Option<&str>) -> Result<()> {
        let entry = LedgerEntry {
            version,
            namespace: namespace.map(str::to_string),
            recorded_at: Utc::now().naive_utc(),
        };
        let line = serde_json::to_string(&entry)
            .map_err(|e| DriftError::Config(format!("Failed to serialize ledger entry: {}", e)))?;

        let io = |source| DriftError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io)?;
        writeln!(file, "{}", line).map_err(io)?;
        log::debug!("Recorded version {} in {}", version, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_writer_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("migrations/m20240101000000_x.rs");
        FsWriter.write(&path, "// x\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "// x\n");

        FsWriter.remove(&path).unwrap();
        assert!(!path.exists());
        FsWriter.remove(&path).unwrap();
    }

    #[test]
    fn test_ledger_appends() {
        let dir = TempDir::new().unwrap();
        let mut ledger = JsonLedger::new(dir.path().join("ledger.jsonl"));
        ledger.record(20240101000000, None).unwrap();
        ledger.record(20240101000001, Some("app")).unwrap();

        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].version, 20240101000001);
        assert_eq!(entries[1].namespace.as_deref(), Some("app"));
    }
}
