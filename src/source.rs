//! Collaborator interfaces
//!
//! The generator never talks to a database or reads migration source
//! itself. It asks a [`SchemaSource`] for the live structure and a
//! [`HistorySource`] for the structure recorded by earlier migrations.

use crate::error::Result;
use crate::schema::Table;

/// Live database structure
pub trait SchemaSource {
    /// Current structure of `name`
    ///
    /// # Errors
    ///
    /// Returns `DriftError::NotFound` when the table does not exist.
    fn current_table(&self, name: &str) -> Result<Table>;

    /// Every table name the source knows, in a stable order
    fn table_names(&self) -> Result<Vec<String>>;
}

/// Structure recorded by the migration history
pub trait HistorySource {
    /// Structure of `name` after replaying history, `None` when no
    /// migration ever created it
    ///
    /// `skip` lists migrations (by name or `m<version>_<name>` id) to leave out.
    fn historical_table(&self, name: &str, skip: &[String]) -> Result<Option<Table>>;
}
