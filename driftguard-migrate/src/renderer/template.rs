//! Migration file assembly
//!
//! Wraps rendered statements in a complete Rust source file implementing
//! `driftguard::migration::Migration`.

use chrono::NaiveDateTime;
use driftguard::migration::MigrationFile;

use super::RenderedBody;

/// One generated migration file, ready to be written
#[derive(Debug, Clone)]
pub struct MigrationTemplate {
    pub name: String,
    pub version: i64,
    pub generated_at: NaiveDateTime,
    pub body: RenderedBody,
}

impl MigrationTemplate {
    pub fn new(
        name: impl Into<String>,
        version: i64,
        generated_at: NaiveDateTime,
        body: RenderedBody,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            generated_at,
            body,
        }
    }

    /// `m{version}_{name}.rs`
    pub fn file_name(&self) -> String {
        MigrationFile::file_name(self.version, &self.name)
    }

    pub fn struct_name(&self) -> String {
        MigrationFile::struct_name(self.version, &self.name)
    }

    /// Full file contents
    pub fn render(&self) -> String {
        let struct_name = self.struct_name();
        let up = block(&self.body.up);
        let down = match &self.body.down {
            Some(statements) => format!(
                "    fn down(&self, schema: &mut dyn SchemaOps) -> Result<(), DriftError> {{\n{}        Ok(())\n    }}\n",
                block(statements)
            ),
            None => {
                let note = self
                    .body
                    .down_note
                    .as_deref()
                    .unwrap_or("this migration cannot be reverted automatically");
                format!(
                    "    fn down(&self, _schema: &mut dyn SchemaOps) -> Result<(), DriftError> {{\n        // {}\n        Err(DriftError::Irreversible(self.name().to_string()))\n    }}\n",
                    note
                )
            }
        };

        format!(
            r#"//! Migration: {name}
//! Version: {version}
//! Generated: {generated}

{imports}

pub struct {struct_name};

impl Migration for {struct_name} {{
    fn name(&self) -> &str {{
        {quoted_name}
    }}

    fn version(&self) -> i64 {{
        {version}
    }}

    fn up(&self, schema: &mut dyn SchemaOps) -> Result<(), DriftError> {{
{up}        Ok(())
    }}

{down}}}
"#,
            name = self.name,
            version = self.version,
            generated = self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            imports = self.imports(),
            struct_name = struct_name,
            quoted_name = super::quote(&self.name),
            up = up,
            down = down,
        )
    }

    /// `use` line naming only the DSL items the statements mention
    fn imports(&self) -> String {
        let statements: Vec<&String> = self
            .body
            .up
            .iter()
            .chain(self.body.down.iter().flatten())
            .collect();
        let mentions = |needle: &str| statements.iter().any(|s| s.contains(needle));

        let mut items: Vec<&str> = Vec::new();
        if mentions("C::") {
            items.push("ColumnBuilder as C");
        }
        items.push("DriftError");
        if mentions("ForeignKey::") {
            items.push("ForeignKey");
        }
        if mentions("Index::") {
            items.push("Index");
        }
        items.push("Migration");
        if mentions("ReferentialAction::") {
            items.push("ReferentialAction");
        }
        items.push("SchemaOps");
        if mentions("TableKeys::") {
            items.push("TableKeys");
        }

        format!("use driftguard::migration::{{{}}};", items.join(", "))
    }
}

/// Statements indented into a method body, one blank-free block
fn block(statements: &[String]) -> String {
    let mut out = String::new();
    for statement in statements {
        for line in statement.lines() {
            out.push_str("        ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 20)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_reversible_file() {
        let body = RenderedBody {
            up: vec![r#"schema.add_column("post", "body", C::text())?;"#.to_string()],
            down: Some(vec![r#"schema.drop_column("post", "body")?;"#.to_string()]),
            down_note: None,
        };
        let template = MigrationTemplate::new("update_table_post", 20240120120000, generated_at(), body);

        assert_eq!(template.file_name(), "m20240120120000_update_table_post.rs");
        let source = template.render();
        assert!(source.starts_with("//! Migration: update_table_post\n//! Version: 20240120120000\n"));
        assert!(source.contains("use driftguard::migration::{ColumnBuilder as C, DriftError, Migration, SchemaOps};"));
        assert!(source.contains("pub struct M20240120120000UpdateTablePost;"));
        assert!(source.contains("        schema.add_column(\"post\", \"body\", C::text())?;\n        Ok(())\n"));
        assert!(source.contains("        schema.drop_column(\"post\", \"body\")?;\n        Ok(())\n"));
    }

    #[test]
    fn test_irreversible_down() {
        let body = RenderedBody {
            up: vec![r#"schema.drop_column("post", "legacy")?;"#.to_string()],
            down: None,
            down_note: Some("sqlite cannot add column".to_string()),
        };
        let source = MigrationTemplate::new("update_table_post", 20240120120000, generated_at(), body).render();

        assert!(source.contains("fn down(&self, _schema: &mut dyn SchemaOps)"));
        assert!(source.contains("// sqlite cannot add column"));
        assert!(source.contains("Err(DriftError::Irreversible(self.name().to_string()))"));
        assert!(source.contains("use driftguard::migration::{DriftError, Migration, SchemaOps};"));
    }
}
