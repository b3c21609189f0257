//! Explicit, ordered set of compiled migrations

use crate::error::{DriftError, Result};
use crate::migration::{Migration, Recorder};
use crate::plan::Change;
use crate::schema::{Dialect, Table, TableOptions};
use crate::source::HistorySource;

use super::replay::SchemaState;

/// Migrations known to a project, kept in version order
///
/// Unlike a process-wide registry, a set is an ordinary value: build it,
/// hand it to whatever needs history, drop it.
///
/// # Example
/// ```rust
/// use driftguard::migration::{ColumnBuilder as C, Migration, MigrationSet, SchemaOps};
/// use driftguard::schema::{Dialect, TableOptions};
/// use driftguard::source::HistorySource;
/// use driftguard::DriftError;
///
/// struct CreateUser;
///
/// impl Migration for CreateUser {
///     fn name(&self) -> &str { "create_table_user" }
///     fn version(&self) -> i64 { 20240120120000 }
///     fn up(&self, schema: &mut dyn SchemaOps) -> Result<(), DriftError> {
///         schema.create_table("user", vec![("id", C::primary_key())])
///     }
///     fn down(&self, schema: &mut dyn SchemaOps) -> Result<(), DriftError> {
///         schema.drop_table("user")
///     }
/// }
///
/// let mut set = MigrationSet::new(Dialect::Mysql, TableOptions::default());
/// set.register(Box::new(CreateUser)).unwrap();
/// let user = set.historical_table("user", &[]).unwrap().unwrap();
/// assert!(user.has_column("id"));
/// ```
pub struct MigrationSet {
    dialect: Dialect,
    options: TableOptions,
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationSet {
    pub fn new(dialect: Dialect, options: TableOptions) -> Self {
        Self {
            dialect,
            options,
            migrations: Vec::new(),
        }
    }

    /// Add a migration, keeping version order
    ///
    /// # Errors
    ///
    /// Returns `DriftError::Config` if a migration with the same version is
    /// already in the set.
    pub fn register(&mut self, migration: Box<dyn Migration>) -> Result<()> {
        let version = migration.version();
        if let Some(existing) = self.migrations.iter().find(|m| m.version() == version) {
            return Err(DriftError::Config(format!(
                "Migration version {} is registered twice ('{}' and '{}')",
                version,
                existing.name(),
                migration.name()
            )));
        }
        let position = self
            .migrations
            .iter()
            .position(|m| m.version() > version)
            .unwrap_or(self.migrations.len());
        self.migrations.insert(position, migration);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Versions in ascending order
    pub fn versions(&self) -> Vec<i64> {
        self.migrations.iter().map(|m| m.version()).collect()
    }

    /// Record the `up()` changes of every migration not skipped
    pub fn record(&self, skip: &[String]) -> Result<Vec<Change>> {
        let mut recorder = Recorder::new(self.options.clone());
        for migration in &self.migrations {
            if is_skipped(migration.as_ref(), skip) {
                log::debug!("Skipping migration {}", migration.id());
                continue;
            }
            migration.up(&mut recorder)?;
        }
        Ok(recorder.into_changes())
    }
}

impl HistorySource for MigrationSet {
    fn historical_table(&self, name: &str, skip: &[String]) -> Result<Option<Table>> {
        let changes = self.record(skip)?;
        SchemaState::replay_table(self.dialect, self.options.clone(), &changes, name)
    }
}

fn is_skipped(migration: &dyn Migration, skip: &[String]) -> bool {
    let id = migration.id();
    skip.iter().any(|s| s == migration.name() || *s == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{ColumnBuilder as C, SchemaOps};

    struct CreatePost;

    impl Migration for CreatePost {
        fn name(&self) -> &str {
            "create_table_post"
        }

        fn version(&self) -> i64 {
            20240101000000
        }

        fn up(&self, schema: &mut dyn SchemaOps) -> Result<()> {
            schema.create_table("post", vec![("id", C::primary_key()), ("title", C::string())])
        }

        fn down(&self, schema: &mut dyn SchemaOps) -> Result<()> {
            schema.drop_table("post")
        }
    }

    struct AddBody;

    impl Migration for AddBody {
        fn name(&self) -> &str {
            "update_table_post"
        }

        fn version(&self) -> i64 {
            20240102000000
        }

        fn up(&self, schema: &mut dyn SchemaOps) -> Result<()> {
            schema.add_column("post", "body", C::text())
        }

        fn down(&self, schema: &mut dyn SchemaOps) -> Result<()> {
            schema.drop_column("post", "body")
        }
    }

    fn set() -> MigrationSet {
        let mut set = MigrationSet::new(Dialect::Mysql, TableOptions::default());
        // registered out of order on purpose
        set.register(Box::new(AddBody)).unwrap();
        set.register(Box::new(CreatePost)).unwrap();
        set
    }

    #[test]
    fn test_versions_are_ordered() {
        assert_eq!(set().versions(), vec![20240101000000, 20240102000000]);
    }

    #[test]
    fn test_duplicate_version_is_rejected() {
        let mut set = set();
        assert!(set.register(Box::new(AddBody)).is_err());
    }

    #[test]
    fn test_skip_by_name_and_id() {
        let set = set();
        let table = set.historical_table("post", &[]).unwrap().unwrap();
        assert!(table.has_column("body"));

        let table = set
            .historical_table("post", &["update_table_post".to_string()])
            .unwrap()
            .unwrap();
        assert!(!table.has_column("body"));

        let table = set
            .historical_table("post", &["m20240102000000_update_table_post".to_string()])
            .unwrap()
            .unwrap();
        assert!(!table.has_column("body"));
    }

    #[test]
    fn test_unknown_table_has_no_history() {
        assert!(set().historical_table("comment", &[]).unwrap().is_none());
    }
}
