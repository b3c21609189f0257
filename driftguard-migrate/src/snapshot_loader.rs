//! Schema dump loader
//!
//! Reads raw introspection records from TOML or JSON dumps and serves them
//! as a [`SchemaSource`]. A dump is either one file or a directory of files
//! (searched recursively); every file holds a list of tables:
//!
//! ```toml
//! [[tables]]
//! name = "post"
//!
//! [[tables.columns]]
//! name = "id"
//! db_type = "int(11)"
//! nullable = false
//! auto_increment = true
//!
//! [tables.primary_key]
//! columns = ["id"]
//! ```

use driftguard::schema::{RawTable, TableBuilder, TableOptions};
use driftguard::source::SchemaSource;
use driftguard::{Dialect, DriftError, Result, Table};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of one dump file
#[derive(Debug, Default, Deserialize)]
pub struct SnapshotFile {
    /// Dialect the dump was taken from, when recorded
    #[serde(default)]
    pub dialect: Option<Dialect>,
    #[serde(default)]
    pub tables: Vec<RawTable>,
}

/// Live schema read from a dump instead of a connection
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    builder: TableBuilder,
    tables: Vec<RawTable>,
}

impl SnapshotSource {
    pub fn new(dialect: Dialect, options: TableOptions, tables: Vec<RawTable>) -> Self {
        Self {
            builder: TableBuilder::new(dialect, options),
            tables,
        }
    }

    /// Load a dump file or directory
    ///
    /// Files other than `.toml` and `.json` are ignored. When several files
    /// define the same table the first one read wins.
    ///
    /// # Errors
    ///
    /// Returns `DriftError::Snapshot` if the path does not exist or a file
    /// cannot be read or parsed, or if files disagree on the dialect.
    pub fn load(path: &Path, dialect: Dialect, options: TableOptions) -> Result<Self> {
        if !path.exists() {
            return Err(DriftError::Snapshot(format!(
                "Schema dump does not exist: {}",
                path.display()
            )));
        }

        let mut files = Vec::new();
        if path.is_dir() {
            collect_files(path, &mut files)?;
            files.sort();
        } else {
            files.push(path.to_path_buf());
        }

        let mut tables: Vec<RawTable> = Vec::new();
        for file in &files {
            let snapshot = read_file(file)?;
            if let Some(recorded) = snapshot.dialect {
                if recorded != dialect {
                    return Err(DriftError::Snapshot(format!(
                        "{} was taken from {} but the generator is configured for {}",
                        file.display(),
                        recorded,
                        dialect
                    )));
                }
            }
            for table in snapshot.tables {
                if tables.iter().any(|t| t.name == table.name) {
                    log::warn!(
                        "Table '{}' defined again in {}, keeping the first definition",
                        table.name,
                        file.display()
                    );
                    continue;
                }
                tables.push(table);
            }
        }

        log::debug!("Loaded {} table(s) from {}", tables.len(), path.display());
        Ok(Self::new(dialect, options, tables))
    }
}

impl SchemaSource for SnapshotSource {
    fn current_table(&self, name: &str) -> Result<Table> {
        let raw = self
            .tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| DriftError::NotFound(name.to_string()))?;
        self.builder.build(raw)
    }

    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| {
        DriftError::Snapshot(format!("Failed to read {}: {}", dir.display(), e))
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| DriftError::Snapshot(format!("Failed to read {}: {}", dir.display(), e)))?
            .path();
        if path.is_dir() {
            let hidden = path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'));
            if !hidden {
                collect_files(&path, files)?;
            }
        } else if matches!(extension(&path).as_deref(), Some("toml" | "json")) {
            files.push(path);
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<SnapshotFile> {
    let content = fs::read_to_string(path)
        .map_err(|e| DriftError::Snapshot(format!("Failed to read {}: {}", path.display(), e)))?;

    match extension(path).as_deref() {
        Some("json") => serde_json::from_str(&content)
            .map_err(|e| DriftError::Snapshot(format!("Invalid JSON in {}: {}", path.display(), e))),
        _ => toml::from_str(&content)
            .map_err(|e| DriftError::Snapshot(format!("Invalid TOML in {}: {}", path.display(), e))),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}
