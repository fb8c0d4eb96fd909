use super::{Dialect, DialectKind};

/// MySQL / MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mysql;

/// Largest row count MySQL accepts; stands in for "no limit" before OFFSET.
const MAX_ROWS: u64 = u64::MAX;

impl Dialect for Mysql {
    fn kind(&self) -> DialectKind {
        DialectKind::Mysql
    }

    fn identifier_quote(&self) -> Option<char> {
        Some('`')
    }

    /// Backslash is an escape character unless `NO_BACKSLASH_ESCAPES` is set.
    fn escape_string(&self, raw: &str) -> String {
        raw.replace('\\', "\\\\").replace('\'', "''")
    }

    fn regex_operator(&self) -> Option<&'static str> {
        Some("REGEXP")
    }

    fn fulltext(&self, column: &str, placeholder: &str) -> String {
        format!("MATCH({column}) AGAINST({placeholder})")
    }

    fn offset(&self, mut sql: String, offset: Option<u64>, limit: Option<u64>) -> String {
        if let Some(m) = offset.filter(|m| *m > 0) {
            if limit.filter(|n| *n > 0).is_none() {
                sql.push_str(&format!(" LIMIT {MAX_ROWS}"));
            }
            sql.push_str(&format!(" OFFSET {m}"));
        }
        sql
    }

    fn last_insert_id_sql(&self, _sequence: Option<&str>) -> String {
        "SELECT LAST_INSERT_ID()".to_string()
    }

    /// Without `SESSION`/`GLOBAL` the level applies to the next transaction only.
    fn isolation_before_begin(&self) -> bool {
        true
    }
}
