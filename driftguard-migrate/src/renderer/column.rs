//! Column definition rendering
//!
//! Produces `C::...` builder chains. Modifiers always come in the same
//! order: type and length, unsigned, not null, unique, default, append,
//! comment, position.

use driftguard::schema::{Column, ColumnKind, DefaultValue, Dialect, Length};

/// Where a column definition is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnContext {
    /// Inside `create_table`; `single_key` is set when this column alone is the primary key
    CreateTable { single_key: bool },
    /// `add_column` / `alter_column`
    Alter,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnRenderer {
    dialect: Dialect,
    general_schema: bool,
}

impl ColumnRenderer {
    pub fn new(dialect: Dialect, general_schema: bool) -> Self {
        Self {
            dialect,
            general_schema,
        }
    }

    pub fn render(&self, column: &Column, context: ColumnContext) -> String {
        let single_key = matches!(context, ColumnContext::CreateTable { single_key: true });
        let shorthand = self.shorthand(column, single_key);

        let mut out = match (&shorthand, &column.kind) {
            (Some(constructor), _) => format!("C::{}()", constructor),
            (None, ColumnKind::Native(raw)) => format!("C::native({})", quote(raw)),
            (None, kind) => format!("C::{}()", constructor(kind)),
        };

        let length = if self.general_schema {
            column.effective_length(self.dialect)
        } else {
            column.length()
        };
        match length {
            Some(Length::Size(size)) => out.push_str(&format!(".length({})", size)),
            Some(Length::Precision { precision, scale }) => {
                out.push_str(&format!(".precision({})", precision));
                if let Some(scale) = scale {
                    out.push_str(&format!(".scale({})", scale));
                }
            }
            None => {}
        }

        let absorbed = shorthand.is_some() || column.kind.is_primary_key_shorthand();
        if column.unsigned && shorthand.is_none() && !column.kind.implies_unsigned() {
            out.push_str(".unsigned()");
        }
        if column.not_null && !absorbed {
            out.push_str(".not_null()");
        }
        if column.unique {
            out.push_str(".unique()");
        }
        match &column.default {
            Some(DefaultValue::Literal(value)) => {
                out.push_str(&format!(".default_value({})", quote(value)))
            }
            Some(DefaultValue::Expression(expr)) => {
                out.push_str(&format!(".default_expression({})", quote(expr)))
            }
            None => {}
        }
        if let Some(append) = self.append(column, context, absorbed) {
            out.push_str(&format!(".append({})", quote(&append)));
        }
        if let Some(comment) = &column.comment {
            out.push_str(&format!(".comment({})", quote(comment)));
        }
        if column.first {
            out.push_str(".first()");
        } else if let Some(after) = &column.after {
            out.push_str(&format!(".after({})", quote(after)));
        }
        out
    }

    /// Primary-key shorthand constructor, when the column qualifies
    ///
    /// Only a single auto-increment integer key inside `create_table`, and
    /// only under the general schema.
    fn shorthand(&self, column: &Column, single_key: bool) -> Option<&'static str> {
        if !self.general_schema || !single_key || !column.is_auto_increment() {
            return None;
        }
        match (column.kind.storage(), column.is_unsigned()) {
            (ColumnKind::Integer, false) => Some("primary_key"),
            (ColumnKind::Integer, true) => Some("unsigned_primary_key"),
            (ColumnKind::BigInteger, false) => Some("big_primary_key"),
            (ColumnKind::BigInteger, true) => Some("big_unsigned_primary_key"),
            _ => None,
        }
    }

    /// Append text: synthesized key or auto-increment tokens plus the stored rest
    fn append(&self, column: &Column, context: ColumnContext, absorbed: bool) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        let declared = column.append_spec();

        if !absorbed {
            match context {
                ColumnContext::CreateTable { single_key: true } => {
                    parts.push(self.dialect.primary_key_append(column.auto_increment));
                }
                _ if column.auto_increment && !declared.auto_increment => {
                    if let Some(token) = self.dialect.auto_increment_append() {
                        parts.push(token);
                    }
                }
                _ => {}
            }
        }

        if let Some(append) = column.append.as_deref().filter(|a| !a.trim().is_empty()) {
            parts.push(append);
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Builder constructor for a portable kind
pub fn constructor(kind: &ColumnKind) -> &'static str {
    match kind {
        ColumnKind::BigInteger => "big_integer",
        ColumnKind::Integer => "integer",
        ColumnKind::SmallInteger => "small_integer",
        ColumnKind::TinyInteger => "tiny_integer",
        ColumnKind::Char => "char",
        ColumnKind::String => "string",
        ColumnKind::Text => "text",
        ColumnKind::Decimal => "decimal",
        ColumnKind::Double => "double",
        ColumnKind::Float => "float",
        ColumnKind::Money => "money",
        ColumnKind::DateTime => "date_time",
        ColumnKind::Timestamp => "timestamp",
        ColumnKind::Date => "date",
        ColumnKind::Time => "time",
        ColumnKind::Boolean => "boolean",
        ColumnKind::Binary => "binary",
        ColumnKind::Json => "json",
        ColumnKind::PrimaryKey => "primary_key",
        ColumnKind::BigPrimaryKey => "big_primary_key",
        ColumnKind::UnsignedPrimaryKey => "unsigned_primary_key",
        ColumnKind::BigUnsignedPrimaryKey => "big_unsigned_primary_key",
        // rendered through C::native
        ColumnKind::Native(_) => "native",
    }
}

/// Rust string literal for `value`, escaped for the double-quote delimiter
pub fn quote(value: &str) -> String {
    format!("{:?}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn general() -> ColumnRenderer {
        ColumnRenderer::new(Dialect::Mysql, true)
    }

    #[test]
    fn test_modifier_order() {
        let column = Column::new("price", ColumnKind::Decimal)
            .precision(10)
            .scale(2)
            .unsigned()
            .not_null()
            .default_value("0.00")
            .comment("Unit price")
            .after("name");
        assert_eq!(
            general().render(&column, ColumnContext::Alter),
            r#"C::decimal().precision(10).scale(2).unsigned().not_null().default_value("0.00").comment("Unit price").after("name")"#
        );
    }

    #[test]
    fn test_default_length_is_elided_only_under_general_schema() {
        let column = Column::new("title", ColumnKind::String).size(255);
        assert_eq!(general().render(&column, ColumnContext::Alter), "C::string()");
        assert_eq!(
            ColumnRenderer::new(Dialect::Mysql, false).render(&column, ColumnContext::Alter),
            "C::string().length(255)"
        );
    }

    #[test]
    fn test_primary_key_shorthand() {
        let id = Column::new("id", ColumnKind::Integer)
            .size(11)
            .not_null()
            .auto_increment()
            .in_primary_key();
        assert_eq!(
            general().render(&id, ColumnContext::CreateTable { single_key: true }),
            "C::primary_key()"
        );

        let id = Column::new("id", ColumnKind::BigInteger)
            .size(20)
            .unsigned()
            .not_null()
            .auto_increment()
            .in_primary_key();
        assert_eq!(
            general().render(&id, ColumnContext::CreateTable { single_key: true }),
            "C::big_unsigned_primary_key()"
        );
    }

    #[test]
    fn test_synthesized_key_append() {
        let id = Column::new("id", ColumnKind::Integer)
            .not_null()
            .auto_increment()
            .in_primary_key();
        let sqlite = ColumnRenderer::new(Dialect::Sqlite, false);
        assert_eq!(
            sqlite.render(&id, ColumnContext::CreateTable { single_key: true }),
            r#"C::integer().not_null().append("PRIMARY KEY AUTOINCREMENT")"#
        );

        let code = Column::new("code", ColumnKind::String).size(8).not_null().in_primary_key();
        assert_eq!(
            general().render(&code, ColumnContext::CreateTable { single_key: true }),
            r#"C::string().length(8).not_null().append("PRIMARY KEY")"#
        );
    }

    #[test]
    fn test_native_type_and_escaping() {
        let column = Column::new("shape", ColumnKind::Native("geometry".to_string()))
            .comment("say \"hi\"\\n");
        assert_eq!(
            general().render(&column, ColumnContext::Alter),
            r#"C::native("geometry").comment("say \"hi\"\\n")"#
        );
    }

    #[test]
    fn test_opaque_append_is_kept() {
        let column = Column::new("updated_at", ColumnKind::Timestamp)
            .default_expression("CURRENT_TIMESTAMP")
            .append("ON UPDATE CURRENT_TIMESTAMP");
        assert_eq!(
            general().render(&column, ColumnContext::Alter),
            r#"C::timestamp().default_expression("CURRENT_TIMESTAMP").append("ON UPDATE CURRENT_TIMESTAMP")"#
        );
    }
}
