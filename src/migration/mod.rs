//! Migration DSL for driftguard
//!
//! This module provides what generated migration files are written against:
//! - the [`Migration`] trait
//! - the [`SchemaOps`] operations a migration can request
//! - [`ColumnBuilder`] for column definitions
//! - [`Recorder`] and [`SchemaState`] for turning migrations into table history
//! - [`MigrationSet`] as an explicit collection of compiled migrations
//!
//! # Example
//!
//! ```rust
//! use driftguard::migration::{ColumnBuilder as C, Migration, SchemaOps};
//! use driftguard::DriftError;
//!
//! pub struct M20240120120000CreateTableUser;
//!
//! impl Migration for M20240120120000CreateTableUser {
//!     fn name(&self) -> &str {
//!         "create_table_user"
//!     }
//!
//!     fn version(&self) -> i64 {
//!         20240120120000
//!     }
//!
//!     fn up(&self, schema: &mut dyn SchemaOps) -> Result<(), DriftError> {
//!         schema.create_table(
//!             "{{%user}}",
//!             vec![
//!                 ("id", C::primary_key()),
//!                 ("email", C::string().not_null().unique()),
//!             ],
//!         )
//!     }
//!
//!     fn down(&self, schema: &mut dyn SchemaOps) -> Result<(), DriftError> {
//!         schema.drop_table("{{%user}}")
//!     }
//! }
//! ```

pub mod column_builder;
pub mod file;
pub mod migration;
pub mod recorder;
pub mod replay;
pub mod schema_ops;
pub mod set;

pub use column_builder::{ColumnBuilder, ColumnSpec};
pub use file::{discover_migrations, MigrationFile, VersionClock};
pub use migration::Migration;
pub use recorder::Recorder;
pub use replay::SchemaState;
pub use schema_ops::SchemaOps;
pub use set::MigrationSet;

// Re-exported so generated files only need this module
pub use crate::error::DriftError;
pub use crate::schema::{ForeignKey, Index, ReferentialAction, TableKeys};
