//! Raw introspection records and the builder that turns them into a [`Table`]
//!
//! The records mirror what an information-schema query returns. They are
//! serde-friendly so a schema dump can stand in for a live connection.

use crate::error::{DriftError, Result};
use crate::schema::typemap::classify;
use crate::schema::{
    AppendSpec, Column, DefaultValue, Dialect, ForeignKey, Index, PrimaryKey, ReferentialAction,
    Table, TableOptions,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<RawColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<RawPrimaryKey>,
    #[serde(default)]
    pub foreign_keys: Vec<RawForeignKey>,
    #[serde(default)]
    pub indexes: Vec<RawIndex>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumn {
    pub name: String,
    /// Native type as reported, e.g. `int(10) unsigned`
    pub db_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Literal default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Default computed by the database (`CURRENT_TIMESTAMP`, `now()`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_expression: Option<String>,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub unsigned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Engine extra text (`on update CURRENT_TIMESTAMP`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPrimaryKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawForeignKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIndex {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

/// Builds [`Table`] values for one dialect and one set of naming options
#[derive(Debug, Clone)]
pub struct TableBuilder {
    dialect: Dialect,
    options: TableOptions,
}

impl TableBuilder {
    pub fn new(dialect: Dialect, options: TableOptions) -> Self {
        Self { dialect, options }
    }

    /// Build and validate a table from its raw records
    ///
    /// # Errors
    ///
    /// Returns `InvalidStructure` when a column has no type, a referential
    /// action is unknown, or a key or index references a missing column.
    pub fn build(&self, raw: &RawTable) -> Result<Table> {
        let mut table = Table::new(&raw.name, self.dialect).with_options(self.options.clone());

        for raw_column in &raw.columns {
            table.columns.push(self.build_column(&raw.name, raw_column)?);
        }

        table.primary_key = raw
            .primary_key
            .as_ref()
            .filter(|pk| !pk.columns.is_empty())
            .map(|pk| PrimaryKey {
                // mysql names every primary key PRIMARY
                name: pk
                    .name
                    .clone()
                    .filter(|n| !n.is_empty() && !n.eq_ignore_ascii_case("primary")),
                columns: pk.columns.clone(),
            });
        table.sync_primary_key_flags();

        let short = table.short_name();
        for raw_fk in &raw.foreign_keys {
            table.foreign_keys.push(self.build_foreign_key(&raw.name, &short, raw_fk)?);
        }

        for raw_index in &raw.indexes {
            let name = raw_index
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| Index::synthesize_name(&short, &raw_index.columns));
            // Engines report the primary key as an index too
            if name.eq_ignore_ascii_case("primary") || self.duplicates_primary_key(&table, raw_index) {
                continue;
            }
            let index = Index {
                name,
                columns: raw_index.columns.clone(),
                unique: raw_index.unique,
            };
            if !table.fold_unique_index(&index) {
                table.indexes.push(index);
            }
        }

        table.validate()?;
        log::debug!(
            "Built table '{}' ({} columns, {} foreign keys, {} indexes)",
            table.name,
            table.columns.len(),
            table.foreign_keys.len(),
            table.indexes.len()
        );
        Ok(table)
    }

    fn build_column(&self, table: &str, raw: &RawColumn) -> Result<Column> {
        let classified = classify(self.dialect, &raw.db_type).ok_or_else(|| {
            DriftError::invalid(table, format!("column '{}' has no type", raw.name))
        })?;

        let extra = raw.extra.as_deref().map(AppendSpec::parse).unwrap_or_default();

        let mut column = Column::new(&raw.name, classified.kind);
        column.size = raw.size.or(classified.size);
        column.precision = raw.precision.or(classified.precision);
        column.scale = raw.scale.or(classified.scale);
        column.not_null = !raw.nullable || extra.not_null;
        column.unsigned = raw.unsigned || classified.unsigned || extra.unsigned;
        column.auto_increment = raw.auto_increment || extra.auto_increment;
        column.default = match (&raw.default_expression, &raw.default) {
            (Some(expr), _) => Some(DefaultValue::Expression(expr.clone())),
            (None, Some(value)) => Some(DefaultValue::Literal(value.clone())),
            (None, None) => None,
        };
        column.comment = raw.comment.clone().filter(|c| !c.is_empty());
        column.append = extra.rest;
        Ok(column)
    }

    fn build_foreign_key(&self, table: &str, short: &str, raw: &RawForeignKey) -> Result<ForeignKey> {
        let name = match raw.name.as_deref() {
            Some(name) if !ForeignKey::needs_name(name) => name.to_string(),
            _ => ForeignKey::synthesize_name(short, &raw.columns),
        };
        Ok(ForeignKey {
            name,
            columns: raw.columns.clone(),
            ref_table: raw.ref_table.clone(),
            ref_columns: raw.ref_columns.clone(),
            on_delete: parse_action(table, raw.on_delete.as_deref())?,
            on_update: parse_action(table, raw.on_update.as_deref())?,
        })
    }

    fn duplicates_primary_key(&self, table: &Table, index: &RawIndex) -> bool {
        index.unique
            && table
                .primary_key
                .as_ref()
                .is_some_and(|pk| pk.same_columns(&PrimaryKey::new(index.columns.iter().cloned())))
    }
}

fn parse_action(table: &str, raw: Option<&str>) -> Result<Option<ReferentialAction>> {
    match raw.map(str::trim).filter(|a| !a.is_empty()) {
        None => Ok(None),
        Some(action) => action
            .parse()
            .map(Some)
            .map_err(|e: String| DriftError::invalid(table, e)),
    }
}
