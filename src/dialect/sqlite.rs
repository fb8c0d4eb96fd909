use super::{Dialect, DialectKind};
use crate::transaction::IsolationLevel;

/// SQLite. `REGEXP` needs an application-defined `regexp()` function.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn identifier_quote(&self) -> Option<char> {
        Some('"')
    }

    fn regex_operator(&self) -> Option<&'static str> {
        Some("REGEXP")
    }

    fn fulltext(&self, column: &str, placeholder: &str) -> String {
        format!("{column} MATCH {placeholder}")
    }

    fn last_insert_id_sql(&self, _sequence: Option<&str>) -> String {
        "SELECT last_insert_rowid()".to_string()
    }

    /// Transactions are always serializable.
    fn isolation_sql(&self, _level: IsolationLevel) -> Option<String> {
        None
    }
}
