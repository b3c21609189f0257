//! Migration trait definition

use crate::error::DriftError;
use super::schema_ops::SchemaOps;

/// Trait that all migrations must implement
///
/// Each migration file defines a struct implementing this trait. `up()` and
/// `down()` describe schema changes through [`SchemaOps`]; whether those
/// changes are executed or only recorded depends on the implementation
/// passed in.
pub trait Migration {
    /// Get the migration name (human-readable identifier)
    fn name(&self) -> &str;

    /// Get the migration version (timestamp: YYYYMMDDHHMMSS)
    fn version(&self) -> i64;

    /// Apply the migration
    fn up(&self, schema: &mut dyn SchemaOps) -> Result<(), DriftError>;

    /// Revert the migration
    ///
    /// Migrations that cannot be reverted return `DriftError::Irreversible`.
    fn down(&self, schema: &mut dyn SchemaOps) -> Result<(), DriftError>;

    /// File stem: `m{version}_{name}`
    fn id(&self) -> String {
        format!("m{}_{}", self.version(), self.name())
    }
}
