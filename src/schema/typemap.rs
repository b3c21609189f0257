//! Native type classification
//!
//! A native type string is split into a base name, its arguments and
//! trailing modifiers, then looked up in the dialect's type map. Anything the
//! map does not cover is kept as [`ColumnKind::Native`] verbatim.

use crate::schema::column::LengthStyle;
use crate::schema::{ColumnKind, Dialect};
use once_cell::sync::Lazy;
use regex::Regex;

static NATIVE_TYPE: Lazy<Regex> = Lazy::new(|| {
    // base words, optional (args), optional trailing words
    Regex::new(r"(?i)^\s*([a-z][a-z0-9_]*(?:\s+[a-z][a-z0-9_]*)*?)\s*(?:\(([^)]*)\))?((?:\s+[a-z_]+)*)\s*$")
        .expect("native type pattern is valid")
});

/// A native type string split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeType {
    /// Lowercased base name, multi-word names joined by single spaces
    pub base: String,
    pub args: Vec<String>,
    pub unsigned: bool,
    pub raw: String,
}

impl NativeType {
    /// Split `raw`; `None` when it is empty or not shaped like a type
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = NATIVE_TYPE.captures(raw)?;
        let mut base = caps
            .get(1)
            .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))?
            .to_ascii_lowercase();
        let args = caps
            .get(2)
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let mut unsigned = false;
        let mut trailing = Vec::new();
        if let Some(words) = caps.get(3) {
            for word in words.as_str().split_whitespace() {
                match word.to_ascii_lowercase().as_str() {
                    "unsigned" => unsigned = true,
                    "zerofill" => {}
                    other => trailing.push(other.to_string()),
                }
            }
        }
        // `timestamp(6) without time zone` classifies like `timestamp without time zone`
        if !trailing.is_empty() {
            base = format!("{} {}", base, trailing.join(" "));
        }

        Some(Self {
            base,
            args,
            unsigned,
            raw: raw.trim().to_string(),
        })
    }

    fn arg(&self, index: usize) -> Option<u32> {
        self.args.get(index).and_then(|a| a.parse().ok())
    }
}

/// Result of classifying a native type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: ColumnKind,
    pub size: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub unsigned: bool,
}

/// Classify a native type string for `dialect`
///
/// Returns `None` only when the string is empty or cannot be split at all;
/// unknown base names become `ColumnKind::Native`.
pub fn classify(dialect: Dialect, raw: &str) -> Option<Classified> {
    if raw.trim().is_empty() {
        return None;
    }
    let Some(native) = NativeType::parse(raw) else {
        return Some(Classified {
            kind: ColumnKind::Native(raw.trim().to_string()),
            size: None,
            precision: None,
            scale: None,
            unsigned: false,
        });
    };

    let kind = match (dialect, native.base.as_str()) {
        // tinyint(1) is the MySQL boolean
        (Dialect::Mysql, "tinyint") if native.arg(0) == Some(1) => Some(ColumnKind::Boolean),
        // NUMBER without a fractional part is an integer
        (Dialect::Oci, "number") => Some(match native.arg(1) {
            None | Some(0) if native.args.len() <= 2 => ColumnKind::Integer,
            _ => ColumnKind::Decimal,
        }),
        (dialect, base) => lookup(dialect, base),
    };

    let Some(kind) = kind else {
        return Some(Classified {
            kind: ColumnKind::Native(native.raw.clone()),
            size: None,
            precision: None,
            scale: None,
            unsigned: native.unsigned,
        });
    };

    let (size, precision, scale) = match kind.length_style() {
        LengthStyle::Size => (native.arg(0), None, None),
        LengthStyle::Precision => (None, native.arg(0), native.arg(1)),
        LengthStyle::None => (None, None, None),
    };

    Some(Classified {
        kind,
        size,
        precision,
        scale,
        unsigned: native.unsigned,
    })
}

fn lookup(dialect: Dialect, base: &str) -> Option<ColumnKind> {
    match dialect {
        Dialect::Mysql => mysql(base),
        Dialect::Pgsql => pgsql(base),
        Dialect::Sqlite => sqlite(base),
        Dialect::Mssql => mssql(base),
        Dialect::Oci => oci(base),
        Dialect::Cubrid => cubrid(base),
        Dialect::Generic => generic(base),
    }
}

fn mysql(base: &str) -> Option<ColumnKind> {
    Some(match base {
        "tinyint" => ColumnKind::TinyInteger,
        "bool" | "boolean" => ColumnKind::Boolean,
        "smallint" => ColumnKind::SmallInteger,
        "mediumint" | "int" | "integer" => ColumnKind::Integer,
        "bigint" => ColumnKind::BigInteger,
        "float" => ColumnKind::Float,
        "double" | "double precision" | "real" => ColumnKind::Double,
        "decimal" | "numeric" | "dec" | "fixed" => ColumnKind::Decimal,
        "tinytext" | "mediumtext" | "longtext" | "text" => ColumnKind::Text,
        "varchar" => ColumnKind::String,
        "char" => ColumnKind::Char,
        "datetime" => ColumnKind::DateTime,
        "date" => ColumnKind::Date,
        "time" => ColumnKind::Time,
        "timestamp" => ColumnKind::Timestamp,
        "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" => {
            ColumnKind::Binary
        }
        "json" => ColumnKind::Json,
        _ => return None,
    })
}

fn pgsql(base: &str) -> Option<ColumnKind> {
    Some(match base {
        "bool" | "boolean" => ColumnKind::Boolean,
        "smallint" | "int2" | "smallserial" => ColumnKind::SmallInteger,
        "integer" | "int" | "int4" | "serial" => ColumnKind::Integer,
        "bigint" | "int8" | "bigserial" => ColumnKind::BigInteger,
        "real" | "float4" => ColumnKind::Float,
        "double precision" | "float8" => ColumnKind::Double,
        "numeric" | "decimal" => ColumnKind::Decimal,
        "money" => ColumnKind::Money,
        "char" | "character" | "bpchar" => ColumnKind::Char,
        "varchar" | "character varying" => ColumnKind::String,
        "text" => ColumnKind::Text,
        "bytea" => ColumnKind::Binary,
        "date" => ColumnKind::Date,
        "time" | "time without time zone" => ColumnKind::Time,
        "timestamp" | "timestamp without time zone" => ColumnKind::Timestamp,
        "json" | "jsonb" => ColumnKind::Json,
        _ => return None,
    })
}

fn sqlite(base: &str) -> Option<ColumnKind> {
    Some(match base {
        "tinyint" => ColumnKind::TinyInteger,
        "bool" | "boolean" => ColumnKind::Boolean,
        "smallint" => ColumnKind::SmallInteger,
        "mediumint" | "int" | "integer" => ColumnKind::Integer,
        "bigint" => ColumnKind::BigInteger,
        "float" => ColumnKind::Float,
        "double" | "real" => ColumnKind::Double,
        "decimal" | "numeric" => ColumnKind::Decimal,
        "text" => ColumnKind::Text,
        "varchar" | "string" => ColumnKind::String,
        "char" => ColumnKind::Char,
        "blob" => ColumnKind::Binary,
        "datetime" => ColumnKind::DateTime,
        "date" => ColumnKind::Date,
        "time" => ColumnKind::Time,
        "timestamp" => ColumnKind::Timestamp,
        _ => return None,
    })
}

fn mssql(base: &str) -> Option<ColumnKind> {
    Some(match base {
        "bigint" => ColumnKind::BigInteger,
        "int" => ColumnKind::Integer,
        "smallint" => ColumnKind::SmallInteger,
        "tinyint" => ColumnKind::TinyInteger,
        "bit" => ColumnKind::Boolean,
        "decimal" | "numeric" => ColumnKind::Decimal,
        "money" | "smallmoney" => ColumnKind::Money,
        "float" | "real" => ColumnKind::Float,
        "date" => ColumnKind::Date,
        "datetime" | "datetime2" | "smalldatetime" => ColumnKind::DateTime,
        "time" => ColumnKind::Time,
        "char" | "nchar" => ColumnKind::Char,
        "varchar" | "nvarchar" => ColumnKind::String,
        "text" | "ntext" => ColumnKind::Text,
        "binary" | "varbinary" | "image" => ColumnKind::Binary,
        // mssql `timestamp` is a row version, not a point in time
        _ => return None,
    })
}

fn oci(base: &str) -> Option<ColumnKind> {
    Some(match base {
        "varchar2" | "nvarchar2" | "varchar" => ColumnKind::String,
        "char" | "nchar" => ColumnKind::Char,
        "clob" | "nclob" => ColumnKind::Text,
        "blob" => ColumnKind::Binary,
        "date" => ColumnKind::Date,
        "timestamp" => ColumnKind::Timestamp,
        "float" | "binary_float" => ColumnKind::Float,
        "binary_double" => ColumnKind::Double,
        _ => return None,
    })
}

fn cubrid(base: &str) -> Option<ColumnKind> {
    Some(match base {
        "short" | "smallint" => ColumnKind::SmallInteger,
        "int" | "integer" => ColumnKind::Integer,
        "bigint" => ColumnKind::BigInteger,
        "numeric" | "decimal" => ColumnKind::Decimal,
        "float" | "real" => ColumnKind::Float,
        "double" | "double precision" => ColumnKind::Double,
        "monetary" => ColumnKind::Money,
        "date" => ColumnKind::Date,
        "time" => ColumnKind::Time,
        "timestamp" => ColumnKind::Timestamp,
        "datetime" => ColumnKind::DateTime,
        "char" | "nchar" => ColumnKind::Char,
        "varchar" | "char varying" | "string" => ColumnKind::String,
        "blob" => ColumnKind::Binary,
        "clob" => ColumnKind::Text,
        _ => return None,
    })
}

fn generic(base: &str) -> Option<ColumnKind> {
    Some(match base {
        "tinyint" => ColumnKind::TinyInteger,
        "smallint" => ColumnKind::SmallInteger,
        "int" | "integer" => ColumnKind::Integer,
        "bigint" => ColumnKind::BigInteger,
        "char" => ColumnKind::Char,
        "varchar" | "string" => ColumnKind::String,
        "text" => ColumnKind::Text,
        "decimal" | "numeric" => ColumnKind::Decimal,
        "double" => ColumnKind::Double,
        "float" | "real" => ColumnKind::Float,
        "money" => ColumnKind::Money,
        "datetime" => ColumnKind::DateTime,
        "timestamp" => ColumnKind::Timestamp,
        "date" => ColumnKind::Date,
        "time" => ColumnKind::Time,
        "bool" | "boolean" => ColumnKind::Boolean,
        "binary" | "blob" => ColumnKind::Binary,
        "json" => ColumnKind::Json,
        _ => return None,
    })
}
