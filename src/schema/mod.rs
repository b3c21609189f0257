//! In-memory table model
//!
//! A [`Table`] is built once, either from raw introspection records
//! ([`introspect::TableBuilder`]) or by replaying recorded history, and is
//! treated as a value from then on. Comparisons and rendering never mutate it.

pub mod column;
pub mod dialect;
pub mod introspect;
pub mod table;
pub mod typemap;

pub use column::{AppendSpec, Column, ColumnKind, DefaultValue, Length};
pub use dialect::{Dialect, OperationKind};
pub use introspect::{RawColumn, RawForeignKey, RawIndex, RawPrimaryKey, RawTable, TableBuilder};
pub use table::{ForeignKey, Index, PrimaryKey, ReferentialAction, Table, TableKeys, TableOptions};
