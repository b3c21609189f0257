//! Column model: portable kinds, lengths, defaults and engine appends

use crate::schema::Dialect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Portable column kind
///
/// `Native` carries the raw database type when no portable kind fits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    BigInteger,
    Integer,
    SmallInteger,
    TinyInteger,
    Char,
    String,
    Text,
    Decimal,
    Double,
    Float,
    Money,
    DateTime,
    Timestamp,
    Date,
    Time,
    Boolean,
    Binary,
    Json,
    PrimaryKey,
    BigPrimaryKey,
    UnsignedPrimaryKey,
    BigUnsignedPrimaryKey,
    Native(String),
}

/// How a kind carries its length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthStyle {
    /// Single size argument (`varchar(45)`, `int(11)`)
    Size,
    /// Precision with optional scale (`decimal(10,2)`, `datetime(6)`)
    Precision,
    None,
}

impl ColumnKind {
    /// Whether this is one of the primary-key shorthand kinds
    pub fn is_primary_key_shorthand(&self) -> bool {
        matches!(
            self,
            ColumnKind::PrimaryKey
                | ColumnKind::BigPrimaryKey
                | ColumnKind::UnsignedPrimaryKey
                | ColumnKind::BigUnsignedPrimaryKey
        )
    }

    /// Storage kind with primary-key shorthands resolved to their integer base
    pub fn storage(&self) -> ColumnKind {
        match self {
            ColumnKind::PrimaryKey | ColumnKind::UnsignedPrimaryKey => ColumnKind::Integer,
            ColumnKind::BigPrimaryKey | ColumnKind::BigUnsignedPrimaryKey => ColumnKind::BigInteger,
            other => other.clone(),
        }
    }

    pub fn implies_unsigned(&self) -> bool {
        matches!(
            self,
            ColumnKind::UnsignedPrimaryKey | ColumnKind::BigUnsignedPrimaryKey
        )
    }

    pub fn length_style(&self) -> LengthStyle {
        match self {
            ColumnKind::Char
            | ColumnKind::String
            | ColumnKind::Binary
            | ColumnKind::TinyInteger
            | ColumnKind::SmallInteger
            | ColumnKind::Integer
            | ColumnKind::BigInteger => LengthStyle::Size,
            ColumnKind::Decimal
            | ColumnKind::Money
            | ColumnKind::Float
            | ColumnKind::Double
            | ColumnKind::DateTime
            | ColumnKind::Timestamp
            | ColumnKind::Time => LengthStyle::Precision,
            _ => LengthStyle::None,
        }
    }

    /// Integer kinds that can back an auto-incrementing key
    pub fn is_integer(&self) -> bool {
        matches!(
            self.storage(),
            ColumnKind::Integer
                | ColumnKind::BigInteger
                | ColumnKind::SmallInteger
                | ColumnKind::TinyInteger
        )
    }
}

impl ColumnKind {
    /// Short portable name, `None` for native types
    pub fn portable_name(&self) -> Option<&'static str> {
        let name = match self {
            ColumnKind::BigInteger => "bigint",
            ColumnKind::Integer => "integer",
            ColumnKind::SmallInteger => "smallint",
            ColumnKind::TinyInteger => "tinyint",
            ColumnKind::Char => "char",
            ColumnKind::String => "string",
            ColumnKind::Text => "text",
            ColumnKind::Decimal => "decimal",
            ColumnKind::Double => "double",
            ColumnKind::Float => "float",
            ColumnKind::Money => "money",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Date => "date",
            ColumnKind::Time => "time",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Binary => "binary",
            ColumnKind::Json => "json",
            ColumnKind::PrimaryKey => "pk",
            ColumnKind::BigPrimaryKey => "bigpk",
            ColumnKind::UnsignedPrimaryKey => "upk",
            ColumnKind::BigUnsignedPrimaryKey => "ubigpk",
            ColumnKind::Native(_) => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.portable_name()) {
            (_, Some(name)) => f.write_str(name),
            (ColumnKind::Native(raw), None) => write!(f, "native({})", raw),
            (_, None) => Ok(()),
        }
    }
}

/// Length of a column as the database reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Length {
    Size(u32),
    Precision { precision: u32, scale: Option<u32> },
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Size(n) => write!(f, "{}", n),
            Length::Precision { precision, scale: Some(s) } => write!(f, "{}, {}", precision, s),
            Length::Precision { precision, scale: None } => write!(f, "{}", precision),
        }
    }
}

/// Length a dialect applies when a column of `kind` is declared without one
pub fn default_length(dialect: Dialect, kind: &ColumnKind, unsigned: bool) -> Option<Length> {
    let mysql = dialect == Dialect::Mysql;
    match kind {
        ColumnKind::String => Some(Length::Size(255)),
        ColumnKind::Char => Some(Length::Size(1)),
        ColumnKind::Integer if mysql => Some(Length::Size(if unsigned { 10 } else { 11 })),
        ColumnKind::BigInteger if mysql => Some(Length::Size(20)),
        ColumnKind::SmallInteger if mysql => Some(Length::Size(if unsigned { 5 } else { 6 })),
        ColumnKind::TinyInteger if mysql => Some(Length::Size(if unsigned { 3 } else { 4 })),
        ColumnKind::Decimal if matches!(dialect, Dialect::Mysql | Dialect::Pgsql) => {
            Some(Length::Precision { precision: 10, scale: Some(0) })
        }
        ColumnKind::Money => Some(Length::Precision { precision: 19, scale: Some(4) }),
        ColumnKind::DateTime | ColumnKind::Timestamp | ColumnKind::Time
            if matches!(dialect, Dialect::Mysql | Dialect::Pgsql) =>
        {
            Some(Length::Precision { precision: 0, scale: None })
        }
        _ => None,
    }
}

/// Column default: a literal value or a raw SQL expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    Literal(String),
    Expression(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(v) => write!(f, "'{}'", v),
            DefaultValue::Expression(e) => f.write_str(e),
        }
    }
}

/// Engine append text split into the tokens the model understands
///
/// Anything not recognised stays in `rest`, verbatim when no token was
/// recognised at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendSpec {
    pub not_null: bool,
    pub auto_increment: bool,
    pub primary_key: bool,
    pub unsigned: bool,
    pub rest: Option<String>,
}

impl AppendSpec {
    pub fn parse(raw: &str) -> Self {
        let words = split_words(raw);
        let mut spec = AppendSpec::default();
        let mut rest: Vec<&str> = Vec::new();
        let mut recognised = false;

        let mut i = 0;
        while i < words.len() {
            let word = words[i].to_ascii_uppercase();
            let next = words.get(i + 1).map(|w| w.to_ascii_uppercase());
            match (word.as_str(), next.as_deref()) {
                ("NOT", Some("NULL")) => {
                    spec.not_null = true;
                    recognised = true;
                    i += 2;
                    continue;
                }
                ("PRIMARY", Some("KEY")) => {
                    spec.primary_key = true;
                    recognised = true;
                    i += 2;
                    continue;
                }
                ("AUTO_INCREMENT" | "AUTOINCREMENT", _) => {
                    spec.auto_increment = true;
                    recognised = true;
                }
                ("UNSIGNED", _) => {
                    spec.unsigned = true;
                    recognised = true;
                }
                (w, _) if w == "IDENTITY" || w.starts_with("IDENTITY(") => {
                    spec.auto_increment = true;
                    recognised = true;
                }
                _ => rest.push(words[i]),
            }
            i += 1;
        }

        let rest = if recognised {
            rest.join(" ")
        } else {
            raw.trim().to_string()
        };
        spec.rest = if rest.is_empty() { None } else { Some(rest) };
        spec
    }

    pub fn is_empty(&self) -> bool {
        *self == AppendSpec::default()
    }
}

/// Split on whitespace outside single or double quotes
fn split_words(raw: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;

    for (i, ch) in raw.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => {
                quote = Some(ch);
                start.get_or_insert(i);
            }
            None if ch.is_whitespace() => {
                if let Some(s) = start.take() {
                    words.push(&raw[s..i]);
                }
            }
            None => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        words.push(&raw[s..]);
    }
    words
}

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub unsigned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Member of the table's primary key
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    /// Raw engine suffix (`ON UPDATE CURRENT_TIMESTAMP`, `COLLATE ...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default)]
    pub first: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size: None,
            precision: None,
            scale: None,
            not_null: false,
            unique: false,
            unsigned: false,
            default: None,
            comment: None,
            primary_key: false,
            auto_increment: false,
            append: None,
            after: None,
            first: false,
        }
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn default_expression(mut self, expression: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Expression(expression.into()));
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn append(mut self, append: impl Into<String>) -> Self {
        self.append = Some(append.into());
        self
    }

    pub fn in_primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.after = Some(column.into());
        self.first = false;
        self
    }

    pub fn first(mut self) -> Self {
        self.first = true;
        self.after = None;
        self
    }

    /// Parsed view of the `append` text
    pub fn append_spec(&self) -> AppendSpec {
        self.append
            .as_deref()
            .map(AppendSpec::parse)
            .unwrap_or_default()
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
            || self.kind.is_primary_key_shorthand()
            || self.append_spec().auto_increment
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned || self.kind.implies_unsigned() || self.append_spec().unsigned
    }

    /// Whether the column is declared as part of the primary key by any means
    pub fn is_primary_key(&self) -> bool {
        self.primary_key || self.kind.is_primary_key_shorthand() || self.append_spec().primary_key
    }

    pub fn is_not_null(&self) -> bool {
        self.not_null || self.is_primary_key() || self.append_spec().not_null
    }

    /// Declared length in the shape the kind uses
    pub fn length(&self) -> Option<Length> {
        match self.kind.storage().length_style() {
            LengthStyle::Size => self.size.map(Length::Size),
            LengthStyle::Precision => self.precision.map(|precision| Length::Precision {
                precision,
                scale: self.scale,
            }),
            LengthStyle::None => None,
        }
    }

    /// Length with the dialect's implicit default elided
    pub fn effective_length(&self, dialect: Dialect) -> Option<Length> {
        let length = self.length()?;
        let implicit = default_length(dialect, &self.kind.storage(), self.is_unsigned());
        if implicit == Some(length) {
            None
        } else {
            Some(length)
        }
    }

    /// Copy without `after`/`first` hints
    pub fn without_position(&self) -> Self {
        let mut column = self.clone();
        column.after = None;
        column.first = false;
        column
    }
}
