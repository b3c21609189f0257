//! Migration file naming, discovery and version allocation

use crate::error::{DriftError, Result};
use chrono::{Duration, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

static MIGRATION_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^m(\d{14})_(.+)\.rs$").expect("migration file pattern is valid"));

const VERSION_FORMAT: &str = "%Y%m%d%H%M%S";

/// Represents a discovered migration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Path to the migration file
    pub path: PathBuf,

    /// Migration version (timestamp: YYYYMMDDHHMMSS)
    pub version: i64,

    /// Human-readable migration name
    pub name: String,
}

impl MigrationFile {
    /// Parse migration file name to extract version and name
    ///
    /// Expected format: `m{YYYYMMDDHHMMSS}_{name}.rs`
    ///
    /// # Example
    /// - `m20240120120000_create_table_user.rs` → version: 20240120120000, name: "create_table_user"
    pub fn parse_filename(filename: &str) -> Option<(i64, String)> {
        let caps = MIGRATION_FILE.captures(filename)?;
        let version = caps.get(1)?.as_str().parse::<i64>().ok()?;
        let name = caps.get(2)?.as_str().to_string();
        Some((version, name))
    }

    /// `m{version}_{name}.rs`
    pub fn file_name(version: i64, name: &str) -> String {
        format!("m{}_{}.rs", version, name)
    }

    /// Struct name used inside a generated file: `M{version}{CamelName}`
    pub fn struct_name(version: i64, name: &str) -> String {
        let camel: String = name
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect();
        format!("M{}{}", version, camel)
    }
}

/// Discover all migration files in a directory
///
/// Scans for files matching `m{YYYYMMDDHHMMSS}_{name}.rs` and returns them
/// sorted by version (oldest first). Other files are ignored. A missing
/// directory yields an empty list.
///
/// # Errors
///
/// Returns `DriftError::Snapshot` if the path is not a directory or cannot be read.
pub fn discover_migrations(migrations_dir: &Path) -> Result<Vec<MigrationFile>> {
    if !migrations_dir.exists() {
        return Ok(Vec::new());
    }

    if !migrations_dir.is_dir() {
        return Err(DriftError::Snapshot(format!(
            "Path is not a directory: {}",
            migrations_dir.display()
        )));
    }

    let entries = fs::read_dir(migrations_dir).map_err(|e| {
        DriftError::Snapshot(format!(
            "Failed to read migrations directory {}: {}",
            migrations_dir.display(),
            e
        ))
    })?;

    let mut migrations = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| DriftError::Snapshot(format!("Failed to read directory entry: {}", e)))?;
        let path = entry.path();

        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((version, name)) = MigrationFile::parse_filename(filename) {
            migrations.push(MigrationFile {
                path: path.clone(),
                version,
                name,
            });
        }
    }

    migrations.sort_by_key(|m| m.version);
    Ok(migrations)
}

/// Hands out strictly increasing versions, one second apart
#[derive(Debug, Clone)]
pub struct VersionClock {
    next: NaiveDateTime,
}

impl VersionClock {
    /// Start at `now`, or one second after `latest` when that is later
    pub fn starting_at(now: NaiveDateTime, latest: Option<i64>) -> Self {
        let after_latest = latest
            .and_then(parse_version)
            .map(|t| t + Duration::seconds(1));
        let next = match after_latest {
            Some(t) if t > now => t,
            _ => now,
        };
        Self { next }
    }

    /// Start at the current local time, ahead of every file in `dir`
    pub fn for_directory(dir: &Path) -> Result<Self> {
        let latest = discover_migrations(dir)?.last().map(|m| m.version);
        Ok(Self::starting_at(chrono::Local::now().naive_local(), latest))
    }

    pub fn next_version(&mut self) -> i64 {
        let version = format_version(self.next);
        self.next += Duration::seconds(1);
        version
    }
}

pub fn format_version(time: NaiveDateTime) -> i64 {
    // 14 ASCII digits always fit an i64
    time.format(VERSION_FORMAT).to_string().parse().unwrap_or_default()
}

pub fn parse_version(version: i64) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&version.to_string(), VERSION_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn at(version: i64) -> NaiveDateTime {
        parse_version(version).unwrap()
    }

    #[test]
    fn test_parse_filename() {
        assert_eq!(
            MigrationFile::parse_filename("m20240120120000_create_table_user.rs"),
            Some((20240120120000, "create_table_user".to_string()))
        );
        assert_eq!(MigrationFile::parse_filename("mod.rs"), None);
        assert_eq!(MigrationFile::parse_filename("m2024_short.rs"), None);
    }

    #[test]
    fn test_struct_name() {
        assert_eq!(
            MigrationFile::struct_name(20240120120000, "create_table_user"),
            "M20240120120000CreateTableUser"
        );
    }

    #[test]
    fn test_discover_sorts_and_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("m20240102000000_b.rs")).unwrap();
        File::create(dir.path().join("m20240101000000_a.rs")).unwrap();
        File::create(dir.path().join("mod.rs")).unwrap();

        let found = discover_migrations(dir.path()).unwrap();
        let versions: Vec<i64> = found.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![20240101000000, 20240102000000]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(discover_migrations(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_clock_stays_ahead_of_existing_versions() {
        let mut clock = VersionClock::starting_at(at(20240101000000), Some(20240301235959));
        assert_eq!(clock.next_version(), 20240302000000);
        assert_eq!(clock.next_version(), 20240302000001);

        let mut clock = VersionClock::starting_at(at(20240101000000), Some(20231231000000));
        assert_eq!(clock.next_version(), 20240101000000);
    }
}
