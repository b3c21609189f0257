//! Database dialects and the structural operations each one can express

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of database dialects the model understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Mysql,
    Pgsql,
    Sqlite,
    Mssql,
    Oci,
    Cubrid,
    #[default]
    Generic,
}

/// Kind of structural operation, one per `Change` variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateTable,
    DropTable,
    RenameTable,
    AddColumn,
    DropColumn,
    AlterColumn,
    RenameColumn,
    AddPrimaryKey,
    DropPrimaryKey,
    AddForeignKey,
    DropForeignKey,
    CreateIndex,
    DropIndex,
    AddComment,
    DropComment,
}

impl Dialect {
    pub const ALL: [Dialect; 7] = [
        Dialect::Mysql,
        Dialect::Pgsql,
        Dialect::Sqlite,
        Dialect::Mssql,
        Dialect::Oci,
        Dialect::Cubrid,
        Dialect::Generic,
    ];

    /// Whether the dialect can express `op` as a standalone statement
    ///
    /// SQLite cannot alter or drop columns, change keys or attach comments
    /// after a table exists; those changes need a table rebuild written by hand.
    pub fn supports(self, op: OperationKind) -> bool {
        match self {
            Dialect::Sqlite => !matches!(
                op,
                OperationKind::AlterColumn
                    | OperationKind::DropColumn
                    | OperationKind::AddPrimaryKey
                    | OperationKind::DropPrimaryKey
                    | OperationKind::AddForeignKey
                    | OperationKind::DropForeignKey
                    | OperationKind::AddComment
                    | OperationKind::DropComment
            ),
            _ => true,
        }
    }

    /// Dialects where `ADD COLUMN` accepts `AFTER`/`FIRST`
    pub fn tracks_column_position(self) -> bool {
        matches!(self, Dialect::Mysql | Dialect::Cubrid)
    }

    /// Dialects whose introspection reports column comments
    pub fn reports_comments(self) -> bool {
        matches!(self, Dialect::Mysql | Dialect::Pgsql | Dialect::Oci)
    }

    /// Column append that makes a single column the auto-incrementing key
    pub fn primary_key_append(self, auto_increment: bool) -> &'static str {
        if !auto_increment {
            return "PRIMARY KEY";
        }
        match self {
            Dialect::Mysql | Dialect::Cubrid => "AUTO_INCREMENT PRIMARY KEY",
            Dialect::Sqlite => "PRIMARY KEY AUTOINCREMENT",
            Dialect::Mssql => "IDENTITY PRIMARY KEY",
            Dialect::Pgsql | Dialect::Oci | Dialect::Generic => "PRIMARY KEY",
        }
    }

    /// Column append that makes a non-key column auto-increment, if the
    /// dialect expresses it in the column definition
    pub fn auto_increment_append(self) -> Option<&'static str> {
        match self {
            Dialect::Mysql | Dialect::Cubrid | Dialect::Generic => Some("AUTO_INCREMENT"),
            Dialect::Sqlite => Some("AUTOINCREMENT"),
            Dialect::Mssql => Some("IDENTITY"),
            Dialect::Pgsql | Dialect::Oci => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Mysql => "mysql",
            Dialect::Pgsql => "pgsql",
            Dialect::Sqlite => "sqlite",
            Dialect::Mssql => "mssql",
            Dialect::Oci => "oci",
            Dialect::Cubrid => "cubrid",
            Dialect::Generic => "generic",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::Mysql),
            "pgsql" | "postgres" | "postgresql" => Ok(Dialect::Pgsql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mssql" | "sqlsrv" | "dblib" => Ok(Dialect::Mssql),
            "oci" | "oracle" => Ok(Dialect::Oci),
            "cubrid" => Ok(Dialect::Cubrid),
            "generic" => Ok(Dialect::Generic),
            other => Err(format!("Unknown dialect: {}", other)),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OperationKind::CreateTable => "create table",
            OperationKind::DropTable => "drop table",
            OperationKind::RenameTable => "rename table",
            OperationKind::AddColumn => "add column",
            OperationKind::DropColumn => "drop column",
            OperationKind::AlterColumn => "alter column",
            OperationKind::RenameColumn => "rename column",
            OperationKind::AddPrimaryKey => "add primary key",
            OperationKind::DropPrimaryKey => "drop primary key",
            OperationKind::AddForeignKey => "add foreign key",
            OperationKind::DropForeignKey => "drop foreign key",
            OperationKind::CreateIndex => "create index",
            OperationKind::DropIndex => "drop index",
            OperationKind::AddComment => "add comment",
            OperationKind::DropComment => "drop comment",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_policy() {
        assert!(!Dialect::Sqlite.supports(OperationKind::AlterColumn));
        assert!(!Dialect::Sqlite.supports(OperationKind::AddForeignKey));
        assert!(Dialect::Sqlite.supports(OperationKind::AddColumn));
        assert!(Dialect::Sqlite.supports(OperationKind::CreateIndex));
        assert!(Dialect::Mysql.supports(OperationKind::AlterColumn));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("postgres".parse::<Dialect>().unwrap(), Dialect::Pgsql);
        assert_eq!("MariaDB".parse::<Dialect>().unwrap(), Dialect::Mysql);
        assert_eq!("sqlsrv".parse::<Dialect>().unwrap(), Dialect::Mssql);
        assert!("db2".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_primary_key_append() {
        assert_eq!(Dialect::Mysql.primary_key_append(true), "AUTO_INCREMENT PRIMARY KEY");
        assert_eq!(Dialect::Sqlite.primary_key_append(true), "PRIMARY KEY AUTOINCREMENT");
        assert_eq!(Dialect::Mssql.primary_key_append(true), "IDENTITY PRIMARY KEY");
        assert_eq!(Dialect::Pgsql.primary_key_append(true), "PRIMARY KEY");
        assert_eq!(Dialect::Mysql.primary_key_append(false), "PRIMARY KEY");
    }
}
