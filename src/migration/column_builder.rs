//! Column builder used by migration code
//!
//! Generated migrations import it as `C`:
//!
//! ```rust
//! use driftguard::migration::ColumnBuilder as C;
//!
//! let title = C::string().length(45).not_null().comment("Headline");
//! let spec = title.describe();
//! assert_eq!(spec.size, Some(45));
//! ```

use crate::schema::{Column, ColumnKind, DefaultValue};

/// Everything a [`ColumnBuilder`] declares, without the column name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub size: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub not_null: bool,
    pub unique: bool,
    pub unsigned: bool,
    pub default: Option<DefaultValue>,
    pub comment: Option<String>,
    pub append: Option<String>,
    pub after: Option<String>,
    pub first: bool,
}

impl ColumnSpec {
    /// Attach a name, producing a model column
    pub fn into_column(self, name: impl Into<String>) -> Column {
        let mut column = Column::new(name, self.kind);
        column.size = self.size;
        column.precision = self.precision;
        column.scale = self.scale;
        column.not_null = self.not_null;
        column.unique = self.unique;
        column.unsigned = self.unsigned;
        column.default = self.default;
        column.comment = self.comment;
        column.append = self.append;
        column.after = self.after;
        column.first = self.first;
        column.primary_key = column.is_primary_key();
        column
    }
}

/// Chainable column definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBuilder {
    spec: ColumnSpec,
}

impl ColumnBuilder {
    fn of(kind: ColumnKind) -> Self {
        Self {
            spec: ColumnSpec {
                kind,
                size: None,
                precision: None,
                scale: None,
                not_null: false,
                unique: false,
                unsigned: false,
                default: None,
                comment: None,
                append: None,
                after: None,
                first: false,
            },
        }
    }

    /// Auto-incrementing integer primary key
    pub fn primary_key() -> Self {
        Self::of(ColumnKind::PrimaryKey)
    }

    pub fn big_primary_key() -> Self {
        Self::of(ColumnKind::BigPrimaryKey)
    }

    pub fn unsigned_primary_key() -> Self {
        Self::of(ColumnKind::UnsignedPrimaryKey)
    }

    pub fn big_unsigned_primary_key() -> Self {
        Self::of(ColumnKind::BigUnsignedPrimaryKey)
    }

    pub fn char() -> Self {
        Self::of(ColumnKind::Char)
    }

    pub fn string() -> Self {
        Self::of(ColumnKind::String)
    }

    pub fn text() -> Self {
        Self::of(ColumnKind::Text)
    }

    pub fn tiny_integer() -> Self {
        Self::of(ColumnKind::TinyInteger)
    }

    pub fn small_integer() -> Self {
        Self::of(ColumnKind::SmallInteger)
    }

    pub fn integer() -> Self {
        Self::of(ColumnKind::Integer)
    }

    pub fn big_integer() -> Self {
        Self::of(ColumnKind::BigInteger)
    }

    pub fn float() -> Self {
        Self::of(ColumnKind::Float)
    }

    pub fn double() -> Self {
        Self::of(ColumnKind::Double)
    }

    pub fn decimal() -> Self {
        Self::of(ColumnKind::Decimal)
    }

    pub fn money() -> Self {
        Self::of(ColumnKind::Money)
    }

    pub fn date_time() -> Self {
        Self::of(ColumnKind::DateTime)
    }

    pub fn timestamp() -> Self {
        Self::of(ColumnKind::Timestamp)
    }

    pub fn time() -> Self {
        Self::of(ColumnKind::Time)
    }

    pub fn date() -> Self {
        Self::of(ColumnKind::Date)
    }

    pub fn binary() -> Self {
        Self::of(ColumnKind::Binary)
    }

    pub fn boolean() -> Self {
        Self::of(ColumnKind::Boolean)
    }

    pub fn json() -> Self {
        Self::of(ColumnKind::Json)
    }

    /// Database-specific type written verbatim
    pub fn native(db_type: impl Into<String>) -> Self {
        Self::of(ColumnKind::Native(db_type.into()))
    }

    pub fn length(mut self, size: u32) -> Self {
        self.spec.size = Some(size);
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.spec.precision = Some(precision);
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.spec.scale = Some(scale);
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.spec.unsigned = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.spec.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.spec.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.spec.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn default_expression(mut self, expression: impl Into<String>) -> Self {
        self.spec.default = Some(DefaultValue::Expression(expression.into()));
        self
    }

    pub fn append(mut self, sql: impl Into<String>) -> Self {
        self.spec.append = Some(sql.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.spec.comment = Some(comment.into());
        self
    }

    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.spec.after = Some(column.into());
        self.spec.first = false;
        self
    }

    pub fn first(mut self) -> Self {
        self.spec.first = true;
        self.spec.after = None;
        self
    }

    pub fn describe(&self) -> ColumnSpec {
        self.spec.clone()
    }

    pub fn into_spec(self) -> ColumnSpec {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::ColumnBuilder as C;

    #[test]
    fn test_describe_reflects_modifiers() {
        let spec = C::decimal()
            .precision(10)
            .scale(2)
            .unsigned()
            .not_null()
            .default_value("0.00")
            .describe();
        assert_eq!(spec.kind, ColumnKind::Decimal);
        assert_eq!(spec.precision, Some(10));
        assert_eq!(spec.scale, Some(2));
        assert!(spec.unsigned);
        assert!(spec.not_null);
        assert_eq!(spec.default, Some(DefaultValue::Literal("0.00".to_string())));
    }

    #[test]
    fn test_primary_key_shorthand_marks_membership() {
        let column = C::primary_key().into_spec().into_column("id");
        assert!(column.primary_key);
        assert!(column.is_auto_increment());

        let column = C::integer().append("AUTO_INCREMENT PRIMARY KEY").into_spec().into_column("id");
        assert!(column.primary_key);
    }

    #[test]
    fn test_position_hints_are_exclusive() {
        let spec = C::string().after("title").first().describe();
        assert!(spec.first);
        assert_eq!(spec.after, None);
    }
}
