//! SchemaOps - schema operations available to migrations

use crate::error::DriftError;
use crate::migration::ColumnBuilder;
use crate::schema::{ForeignKey, Index, TableKeys};

/// Schema operations a migration can request
///
/// Table names may use the `{{%name}}` placeholder; implementations resolve
/// it against the configured table prefix.
///
/// # Example
/// ```rust
/// use driftguard::migration::{ColumnBuilder as C, Recorder, SchemaOps};
/// use driftguard::schema::TableOptions;
///
/// let mut recorder = Recorder::new(TableOptions::default());
/// recorder
///     .create_table(
///         "user",
///         vec![("id", C::primary_key()), ("email", C::string().not_null().unique())],
///     )
///     .unwrap();
/// assert_eq!(recorder.changes().len(), 1);
/// ```
pub trait SchemaOps {
    fn create_table(&mut self, table: &str, columns: Vec<(&str, ColumnBuilder)>) -> Result<(), DriftError>;

    /// Create a table declaring a composite primary key or foreign keys in
    /// the same statement
    fn create_table_with_keys(
        &mut self,
        table: &str,
        columns: Vec<(&str, ColumnBuilder)>,
        keys: TableKeys,
    ) -> Result<(), DriftError>;

    fn drop_table(&mut self, table: &str) -> Result<(), DriftError>;

    fn rename_table(&mut self, from: &str, to: &str) -> Result<(), DriftError>;

    fn add_column(&mut self, table: &str, column: &str, definition: ColumnBuilder) -> Result<(), DriftError>;

    fn drop_column(&mut self, table: &str, column: &str) -> Result<(), DriftError>;

    /// Replace a column definition in place
    fn alter_column(&mut self, table: &str, column: &str, definition: ColumnBuilder) -> Result<(), DriftError>;

    fn rename_column(&mut self, table: &str, from: &str, to: &str) -> Result<(), DriftError>;

    fn add_primary_key(&mut self, name: &str, table: &str, columns: &[&str]) -> Result<(), DriftError>;

    fn drop_primary_key(&mut self, name: &str, table: &str) -> Result<(), DriftError>;

    fn add_foreign_key(&mut self, table: &str, key: ForeignKey) -> Result<(), DriftError>;

    fn drop_foreign_key(&mut self, name: &str, table: &str) -> Result<(), DriftError>;

    fn create_index(&mut self, table: &str, index: Index) -> Result<(), DriftError>;

    fn drop_index(&mut self, name: &str, table: &str) -> Result<(), DriftError>;

    fn add_comment_on_column(&mut self, table: &str, column: &str, comment: &str) -> Result<(), DriftError>;

    fn drop_comment_from_column(&mut self, table: &str, column: &str) -> Result<(), DriftError>;
}
