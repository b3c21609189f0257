//! Migration statement renderer
//!
//! Turns [`Change`]s into `SchemaOps` calls written against the
//! `driftguard::migration` DSL. Output is deterministic: the same change
//! always renders to the same bytes.

pub mod column;
pub mod template;

use driftguard::plan::{Blueprint, Change};
use driftguard::schema::{Column, ForeignKey, Index, TableKeys, TableOptions};
use driftguard::Dialect;

pub use column::{quote, ColumnContext, ColumnRenderer};
pub use template::MigrationTemplate;

/// Rendered `up` and `down` statement lists for one migration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedBody {
    pub up: Vec<String>,
    /// `None` when the dialect cannot express the inverse
    pub down: Option<Vec<String>>,
    /// Explanation placed in a manual `down()`
    pub down_note: Option<String>,
}

/// Renders changes for one dialect and naming configuration
#[derive(Debug, Clone)]
pub struct Renderer {
    dialect: Dialect,
    options: TableOptions,
    columns: ColumnRenderer,
}

impl Renderer {
    pub fn new(dialect: Dialect, options: TableOptions) -> Self {
        let columns = ColumnRenderer::new(dialect, options.general_schema);
        Self {
            dialect,
            options,
            columns,
        }
    }

    /// Render a blueprint's up changes and, when possible, its down changes
    pub fn render_blueprint(&self, blueprint: &Blueprint) -> RenderedBody {
        let up = blueprint.up().iter().map(|c| self.render_change(c)).collect();
        if blueprint.is_reversible() {
            RenderedBody {
                up,
                down: Some(blueprint.down().into_iter().map(|c| self.render_change(c)).collect()),
                down_note: None,
            }
        } else {
            let operations: Vec<String> = blueprint
                .manual_down()
                .iter()
                .map(ToString::to_string)
                .collect();
            RenderedBody {
                up,
                down: None,
                down_note: Some(format!(
                    "{} cannot {}; revert this migration by hand",
                    self.dialect,
                    operations.join(", ")
                )),
            }
        }
    }

    /// Render a single change as one `SchemaOps` call ending in `?;`
    pub fn render_change(&self, change: &Change) -> String {
        match change {
            Change::CreateTable { table, columns, keys } => self.create_table(table, columns, keys),
            Change::DropTable { table } => {
                format!("schema.drop_table({})?;", self.table(table))
            }
            Change::RenameTable { from, to } => {
                format!("schema.rename_table({}, {})?;", self.table(from), self.table(to))
            }
            Change::AddColumn { table, column } => format!(
                "schema.add_column({}, {}, {})?;",
                self.table(table),
                quote(&column.name),
                self.columns.render(column, ColumnContext::Alter)
            ),
            Change::DropColumn { table, column } => format!(
                "schema.drop_column({}, {})?;",
                self.table(table),
                quote(column)
            ),
            Change::AlterColumn { table, column } => format!(
                "schema.alter_column({}, {}, {})?;",
                self.table(table),
                quote(&column.name),
                self.columns.render(&column.without_position(), ColumnContext::Alter)
            ),
            Change::RenameColumn { table, from, to } => format!(
                "schema.rename_column({}, {}, {})?;",
                self.table(table),
                quote(from),
                quote(to)
            ),
            Change::AddPrimaryKey { table, key } => {
                let name = key
                    .name
                    .clone()
                    .unwrap_or_else(|| primary_key_name(&self.options.short_name(table)));
                format!(
                    "schema.add_primary_key({}, {}, &[{}])?;",
                    quote(&name),
                    self.table(table),
                    list(&key.columns)
                )
            }
            Change::DropPrimaryKey { table, name } => format!(
                "schema.drop_primary_key({}, {})?;",
                quote(name),
                self.table(table)
            ),
            Change::AddForeignKey { table, key } => self.add_foreign_key(table, key),
            Change::DropForeignKey { table, name } => format!(
                "schema.drop_foreign_key({}, {})?;",
                quote(name),
                self.table(table)
            ),
            Change::CreateIndex { table, index } => self.create_index(table, index),
            Change::DropIndex { table, name } => format!(
                "schema.drop_index({}, {})?;",
                quote(name),
                self.table(table)
            ),
            Change::AddComment { table, column, comment } => format!(
                "schema.add_comment_on_column({}, {}, {})?;",
                self.table(table),
                quote(column),
                quote(comment)
            ),
            Change::DropComment { table, column } => format!(
                "schema.drop_comment_from_column({}, {})?;",
                self.table(table),
                quote(column)
            ),
        }
    }

    fn create_table(&self, table: &str, columns: &[Column], keys: &TableKeys) -> String {
        let key_columns = columns.iter().filter(|c| c.primary_key).count();
        let call = if keys.is_empty() { "create_table" } else { "create_table_with_keys" };
        let mut out = format!("schema.{}(\n    {},\n    vec![\n", call, self.table(table));
        for column in columns {
            let context = ColumnContext::CreateTable {
                single_key: key_columns == 1 && column.primary_key,
            };
            out.push_str(&format!(
                "        ({}, {}),\n",
                quote(&column.name),
                self.columns.render(&column.without_position(), context)
            ));
        }
        out.push_str("    ],\n");
        if !keys.is_empty() {
            out.push_str("    TableKeys::new()");
            if let Some(pk) = &keys.primary_key {
                let name = pk
                    .name
                    .clone()
                    .unwrap_or_else(|| primary_key_name(&self.options.short_name(table)));
                out.push_str(&format!("\n        .primary_key({}, [{}])", quote(&name), list(&pk.columns)));
            }
            for key in &keys.foreign_keys {
                out.push_str(&format!(
                    "\n        .foreign_key({})",
                    self.foreign_key(table, key, "\n            ")
                ));
            }
            out.push_str(",\n");
        }
        out.push_str(")?;");
        out
    }

    fn add_foreign_key(&self, table: &str, key: &ForeignKey) -> String {
        format!(
            "schema.add_foreign_key(\n    {},\n    {},\n)?;",
            self.table(table),
            self.foreign_key(table, key, "\n        ")
        )
    }

    /// `ForeignKey::new(...)` with referential actions chained on lines
    /// starting with `break_indent`
    fn foreign_key(&self, table: &str, key: &ForeignKey, break_indent: &str) -> String {
        let name = if ForeignKey::needs_name(&key.name) {
            ForeignKey::synthesize_name(&self.options.short_name(table), &key.columns)
        } else {
            key.name.clone()
        };
        let mut builder = format!(
            "ForeignKey::new({}, [{}], {}, [{}])",
            quote(&name),
            list(&key.columns),
            self.table(&key.ref_table),
            list(&key.ref_columns)
        );
        if let Some(action) = key.on_delete {
            builder.push_str(&format!("{}.on_delete(ReferentialAction::{:?})", break_indent, action));
        }
        if let Some(action) = key.on_update {
            builder.push_str(&format!("{}.on_update(ReferentialAction::{:?})", break_indent, action));
        }
        builder
    }

    fn create_index(&self, table: &str, index: &Index) -> String {
        let name = if index.name.is_empty() {
            Index::synthesize_name(&self.options.short_name(table), &index.columns)
        } else {
            index.name.clone()
        };
        let unique = if index.unique { ".unique()" } else { "" };
        format!(
            "schema.create_index({}, Index::new({}, [{}]){})?;",
            self.table(table),
            quote(&name),
            list(&index.columns),
            unique
        )
    }

    /// Quoted table name with the prefix rule applied
    fn table(&self, raw: &str) -> String {
        quote(&self.options.display_name(raw))
    }
}

/// Name given to a primary key that was introspected without one
pub fn primary_key_name(short_table: &str) -> String {
    format!("pk-{}", short_table)
}

fn list(items: &[String]) -> String {
    items.iter().map(|i| quote(i)).collect::<Vec<_>>().join(", ")
}
