//! Recorder - a [`SchemaOps`] that captures changes instead of executing them

use crate::error::DriftError;
use crate::migration::{ColumnBuilder, SchemaOps};
use crate::plan::Change;
use crate::schema::{ForeignKey, Index, PrimaryKey, TableKeys, TableOptions};

/// Records every requested operation as a [`Change`]
///
/// Placeholders are resolved with the configured prefix, so recorded
/// changes always carry raw table names.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    options: TableOptions,
    changes: Vec<Change>,
}

impl Recorder {
    pub fn new(options: TableOptions) -> Self {
        Self {
            options,
            changes: Vec::new(),
        }
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    fn table(&self, name: &str) -> String {
        self.options.resolve(name)
    }

    fn record(&mut self, change: Change) -> Result<(), DriftError> {
        log::trace!("Recorded {}", change);
        self.changes.push(change);
        Ok(())
    }
}

impl SchemaOps for Recorder {
    fn create_table(&mut self, table: &str, columns: Vec<(&str, ColumnBuilder)>) -> Result<(), DriftError> {
        self.create_table_with_keys(table, columns, TableKeys::default())
    }

    fn create_table_with_keys(
        &mut self,
        table: &str,
        columns: Vec<(&str, ColumnBuilder)>,
        mut keys: TableKeys,
    ) -> Result<(), DriftError> {
        let table = self.table(table);
        let columns = columns
            .into_iter()
            .map(|(name, builder)| builder.into_spec().into_column(name))
            .collect();
        for key in &mut keys.foreign_keys {
            key.ref_table = self.table(&key.ref_table);
        }
        self.record(Change::CreateTable { table, columns, keys })
    }

    fn drop_table(&mut self, table: &str) -> Result<(), DriftError> {
        let table = self.table(table);
        self.record(Change::DropTable { table })
    }

    fn rename_table(&mut self, from: &str, to: &str) -> Result<(), DriftError> {
        let (from, to) = (self.table(from), self.table(to));
        self.record(Change::RenameTable { from, to })
    }

    fn add_column(&mut self, table: &str, column: &str, definition: ColumnBuilder) -> Result<(), DriftError> {
        let table = self.table(table);
        let column = definition.into_spec().into_column(column);
        self.record(Change::AddColumn { table, column })
    }

    fn drop_column(&mut self, table: &str, column: &str) -> Result<(), DriftError> {
        let table = self.table(table);
        self.record(Change::DropColumn {
            table,
            column: column.to_string(),
        })
    }

    fn alter_column(&mut self, table: &str, column: &str, definition: ColumnBuilder) -> Result<(), DriftError> {
        let table = self.table(table);
        let column = definition.into_spec().into_column(column);
        self.record(Change::AlterColumn { table, column })
    }

    fn rename_column(&mut self, table: &str, from: &str, to: &str) -> Result<(), DriftError> {
        let table = self.table(table);
        self.record(Change::RenameColumn {
            table,
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    fn add_primary_key(&mut self, name: &str, table: &str, columns: &[&str]) -> Result<(), DriftError> {
        let table = self.table(table);
        let key = PrimaryKey::new(columns.iter().copied()).named(name);
        self.record(Change::AddPrimaryKey { table, key })
    }

    fn drop_primary_key(&mut self, name: &str, table: &str) -> Result<(), DriftError> {
        let table = self.table(table);
        self.record(Change::DropPrimaryKey {
            table,
            name: name.to_string(),
        })
    }

    fn add_foreign_key(&mut self, table: &str, mut key: ForeignKey) -> Result<(), DriftError> {
        let table = self.table(table);
        key.ref_table = self.table(&key.ref_table);
        self.record(Change::AddForeignKey { table, key })
    }

    fn drop_foreign_key(&mut self, name: &str, table: &str) -> Result<(), DriftError> {
        let table = self.table(table);
        self.record(Change::DropForeignKey {
            table,
            name: name.to_string(),
        })
    }

    fn create_index(&mut self, table: &str, index: Index) -> Result<(), DriftError> {
        let table = self.table(table);
        self.record(Change::CreateIndex { table, index })
    }

    fn drop_index(&mut self, name: &str, table: &str) -> Result<(), DriftError> {
        let table = self.table(table);
        self.record(Change::DropIndex {
            table,
            name: name.to_string(),
        })
    }

    fn add_comment_on_column(&mut self, table: &str, column: &str, comment: &str) -> Result<(), DriftError> {
        let table = self.table(table);
        self.record(Change::AddComment {
            table,
            column: column.to_string(),
            comment: comment.to_string(),
        })
    }

    fn drop_comment_from_column(&mut self, table: &str, column: &str) -> Result<(), DriftError> {
        let table = self.table(table);
        self.record(Change::DropComment {
            table,
            column: column.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::ColumnBuilder as C;
    use crate::schema::ReferentialAction;

    fn prefixed() -> Recorder {
        Recorder::new(TableOptions {
            use_prefix: true,
            prefix: "app_".to_string(),
            general_schema: true,
        })
    }

    #[test]
    fn test_placeholders_are_resolved() {
        let mut recorder = prefixed();
        recorder
            .add_foreign_key(
                "{{%post}}",
                ForeignKey::new("fk-post-author_id", ["author_id"], "{{%user}}", ["id"])
                    .on_delete(ReferentialAction::Cascade),
            )
            .unwrap();

        match &recorder.changes()[0] {
            Change::AddForeignKey { table, key } => {
                assert_eq!(table, "app_post");
                assert_eq!(key.ref_table, "app_user");
            }
            other => panic!("unexpected change {:?}", other),
        }
    }

    #[test]
    fn test_create_table_keeps_column_order() {
        let mut recorder = prefixed();
        recorder
            .create_table(
                "{{%post}}",
                vec![
                    ("id", C::primary_key()),
                    ("title", C::string().length(45).not_null()),
                    ("body", C::text()),
                ],
            )
            .unwrap();

        match &recorder.changes()[0] {
            Change::CreateTable { table, columns, keys } => {
                assert_eq!(table, "app_post");
                assert!(keys.is_empty());
                let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["id", "title", "body"]);
                assert!(columns[0].primary_key);
            }
            other => panic!("unexpected change {:?}", other),
        }
    }

    #[test]
    fn test_inline_keys_resolve_placeholders() {
        let mut recorder = prefixed();
        recorder
            .create_table_with_keys(
                "{{%post_tag}}",
                vec![("post_id", C::integer().not_null()), ("tag_id", C::integer().not_null())],
                TableKeys::new()
                    .primary_key("pk-post_tag", ["post_id", "tag_id"])
                    .foreign_key(ForeignKey::new("fk-post_tag-post_id", ["post_id"], "{{%post}}", ["id"])),
            )
            .unwrap();

        match &recorder.changes()[0] {
            Change::CreateTable { table, keys, .. } => {
                assert_eq!(table, "app_post_tag");
                assert_eq!(
                    keys.primary_key,
                    Some(PrimaryKey::new(["post_id", "tag_id"]).named("pk-post_tag"))
                );
                assert_eq!(keys.foreign_keys[0].ref_table, "app_post");
            }
            other => panic!("unexpected change {:?}", other),
        }
    }
}
