//! # driftguard
//!
//! Schema drift detection for hand-authored migration histories.
//!
//! The crate holds the pieces every migration generator needs:
//!
//! - [`schema`]: the in-memory table model (columns, keys, indexes, dialects)
//!   and the builder that turns raw introspection records into it
//! - [`plan`]: typed structural changes and the up/down [`plan::Blueprint`]
//! - [`migration`]: the DSL generated migrations are written against, a
//!   recorder that captures changes instead of executing them, and history
//!   replay
//! - [`source`]: the collaborator traits for live introspection and history
//!
//! The comparator, arranger, renderer and CLI live in `driftguard-migrate`.

pub mod config;
pub mod error;
pub mod migration;
pub mod plan;
pub mod schema;
pub mod source;

pub use config::GeneratorConfig;
pub use error::{DriftError, Result};
pub use schema::{Column, ColumnKind, Dialect, ForeignKey, Index, PrimaryKey, Table};
