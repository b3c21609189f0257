//! Table model: keys, indexes and naming rules

use crate::error::DriftError;
use crate::schema::{Column, Dialect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Referential action for `ON DELETE` / `ON UPDATE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    pub fn as_sql(self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for ReferentialAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .split(|c: char| c.is_whitespace() || c == '_')
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        match normalized.as_str() {
            "CASCADE" => Ok(ReferentialAction::Cascade),
            "SET NULL" => Ok(ReferentialAction::SetNull),
            "SET DEFAULT" => Ok(ReferentialAction::SetDefault),
            "RESTRICT" => Ok(ReferentialAction::Restrict),
            "NO ACTION" => Ok(ReferentialAction::NoAction),
            _ => Err(format!("Unknown referential action: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
}

impl PrimaryKey {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Order-insensitive column set comparison
    pub fn same_columns(&self, other: &PrimaryKey) -> bool {
        let a: BTreeSet<&str> = self.columns.iter().map(String::as_str).collect();
        let b: BTreeSet<&str> = other.columns.iter().map(String::as_str).collect();
        a == b
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
}

impl ForeignKey {
    pub fn new<S: Into<String>, R: Into<String>>(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
        ref_table: impl Into<String>,
        ref_columns: impl IntoIterator<Item = R>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            ref_table: ref_table.into(),
            ref_columns: ref_columns.into_iter().map(Into::into).collect(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Same constraint regardless of name
    pub fn same_definition(&self, other: &ForeignKey) -> bool {
        self.columns == other.columns
            && self.ref_table == other.ref_table
            && self.ref_columns == other.ref_columns
            && self.on_delete == other.on_delete
            && self.on_update == other.on_update
    }

    /// Whether a stored name should be replaced by a synthesized one
    pub fn needs_name(name: &str) -> bool {
        name.is_empty() || name.chars().all(|c| c.is_ascii_digit())
    }

    /// `fk-<table>-<col1>-<col2>...`
    pub fn synthesize_name(table: &str, columns: &[String]) -> String {
        format!("fk-{}-{}", table, columns.join("-"))
    }
}

/// Keys declared inside `CREATE TABLE` instead of added afterwards
///
/// Used for dialects that cannot attach keys to an existing table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary_key<S: Into<String>>(mut self, name: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        self.primary_key = Some(PrimaryKey::new(columns).named(name));
        self
    }

    pub fn foreign_key(mut self, key: ForeignKey) -> Self {
        self.foreign_keys.push(key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.primary_key.is_none() && self.foreign_keys.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl Index {
    pub fn new<S: Into<String>>(name: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Same index regardless of name
    pub fn same_definition(&self, other: &Index) -> bool {
        self.columns == other.columns && self.unique == other.unique
    }

    /// `idx-<table>-<cols>`
    pub fn synthesize_name(table: &str, columns: &[String]) -> String {
        format!("idx-{}-{}", table, columns.join("-"))
    }

    /// A single-column unique index named after its column
    pub fn is_column_unique(&self) -> bool {
        self.unique && self.columns.len() == 1 && self.columns[0] == self.name
    }
}

/// Naming and representation options applied to every table in a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOptions {
    #[serde(default)]
    pub use_prefix: bool,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub general_schema: bool,
}

impl TableOptions {
    /// Name as written in generated code: `{{%name}}` when the prefix applies
    pub fn display_name(&self, raw: &str) -> String {
        match self.strip_prefix(raw) {
            Some(stripped) => format!("{{{{%{}}}}}", stripped),
            None => raw.to_string(),
        }
    }

    /// Name without prefix or placeholder, used to build constraint names
    pub fn short_name(&self, raw: &str) -> String {
        self.strip_prefix(raw).unwrap_or(raw).to_string()
    }

    /// Resolve a `{{%name}}` placeholder back to the raw table name
    pub fn resolve(&self, name: &str) -> String {
        match name.strip_prefix("{{%").and_then(|n| n.strip_suffix("}}")) {
            Some(inner) => format!("{}{}", self.prefix, inner),
            None => match name.strip_prefix("{{").and_then(|n| n.strip_suffix("}}")) {
                Some(inner) => inner.to_string(),
                None => name.to_string(),
            },
        }
    }

    fn strip_prefix<'a>(&self, raw: &'a str) -> Option<&'a str> {
        if !self.use_prefix {
            return None;
        }
        raw.strip_prefix(self.prefix.as_str())
    }
}

/// One table as the model sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub dialect: Dialect,
    /// In database order
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKey>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub options: TableOptions,
}

impl Table {
    pub fn new(name: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            name: name.into(),
            dialect,
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            options: TableOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.name == name)
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|idx| idx.name == name)
    }

    pub fn display_name(&self) -> String {
        self.options.display_name(&self.name)
    }

    pub fn short_name(&self) -> String {
        self.options.short_name(&self.name)
    }

    /// Tables this one references, excluding itself, in first-seen order
    pub fn dependencies(&self) -> Vec<String> {
        let mut deps: Vec<String> = Vec::new();
        for fk in &self.foreign_keys {
            if fk.ref_table != self.name && !deps.contains(&fk.ref_table) {
                deps.push(fk.ref_table.clone());
            }
        }
        deps
    }

    /// Mark every primary-key column with the membership flag
    pub fn sync_primary_key_flags(&mut self) {
        let pk = self.primary_key.clone();
        for column in &mut self.columns {
            column.primary_key = pk.as_ref().is_some_and(|pk| pk.contains(&column.name));
        }
    }

    /// Fold a single-column unique index named after its column into the
    /// column's `unique` flag. Returns `false` when the index was not folded.
    pub fn fold_unique_index(&mut self, index: &Index) -> bool {
        if !index.is_column_unique() {
            return false;
        }
        match self.column_mut(&index.columns[0]) {
            Some(column) => {
                column.unique = true;
                true
            }
            None => false,
        }
    }

    /// Check that keys and indexes only reference existing columns
    pub fn validate(&self) -> Result<(), DriftError> {
        let mut seen = BTreeSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DriftError::invalid(
                    &self.name,
                    format!("duplicate column '{}'", column.name),
                ));
            }
        }

        if let Some(pk) = &self.primary_key {
            if pk.columns.is_empty() {
                return Err(DriftError::invalid(&self.name, "primary key without columns"));
            }
            self.require_columns("primary key", &pk.columns)?;
        }

        for fk in &self.foreign_keys {
            if fk.columns.is_empty() || fk.columns.len() != fk.ref_columns.len() {
                return Err(DriftError::invalid(
                    &self.name,
                    format!(
                        "foreign key '{}' maps {} column(s) onto {}",
                        fk.name,
                        fk.columns.len(),
                        fk.ref_columns.len()
                    ),
                ));
            }
            self.require_columns(&format!("foreign key '{}'", fk.name), &fk.columns)?;
        }

        for index in &self.indexes {
            if index.columns.is_empty() {
                return Err(DriftError::invalid(
                    &self.name,
                    format!("index '{}' without columns", index.name),
                ));
            }
            self.require_columns(&format!("index '{}'", index.name), &index.columns)?;
        }

        Ok(())
    }

    fn require_columns(&self, owner: &str, columns: &[String]) -> Result<(), DriftError> {
        match columns.iter().find(|c| !self.has_column(c)) {
            Some(missing) => Err(DriftError::invalid(
                &self.name,
                format!("{} references missing column '{}'", owner, missing),
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnKind;

    fn prefixed() -> TableOptions {
        TableOptions {
            use_prefix: true,
            prefix: "app_".to_string(),
            general_schema: true,
        }
    }

    #[test]
    fn test_prefix_rule() {
        let options = prefixed();
        assert_eq!(options.display_name("app_post"), "{{%post}}");
        assert_eq!(options.display_name("post"), "post");
        assert_eq!(options.short_name("app_post"), "post");
        assert_eq!(options.resolve("{{%post}}"), "app_post");
        assert_eq!(options.resolve("post"), "post");

        let plain = TableOptions::default();
        assert_eq!(plain.display_name("app_post"), "app_post");
    }

    #[test]
    fn test_referential_action_parsing() {
        assert_eq!("set null".parse::<ReferentialAction>().unwrap(), ReferentialAction::SetNull);
        assert_eq!("NO_ACTION".parse::<ReferentialAction>().unwrap(), ReferentialAction::NoAction);
        assert!("explode".parse::<ReferentialAction>().is_err());
    }

    #[test]
    fn test_primary_key_membership_is_order_insensitive() {
        let a = PrimaryKey::new(["a", "b"]);
        let b = PrimaryKey::new(["b", "a"]);
        assert!(a.same_columns(&b));
        assert!(a.is_composite());
    }

    #[test]
    fn test_validate_rejects_missing_columns() {
        let mut table = Table::new("post", Dialect::Mysql);
        table.columns.push(Column::new("id", ColumnKind::Integer));
        table.indexes.push(Index::new("idx-post-title", ["title"]));
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("missing column 'title'"));
    }

    #[test]
    fn test_foreign_key_name_synthesis() {
        assert!(ForeignKey::needs_name(""));
        assert!(ForeignKey::needs_name("12345"));
        assert!(!ForeignKey::needs_name("fk_author"));
        let cols = vec!["author_id".to_string()];
        assert_eq!(ForeignKey::synthesize_name("post", &cols), "fk-post-author_id");
    }
}
