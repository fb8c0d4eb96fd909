use super::{Dialect, DialectKind};

/// PostgreSQL: `"` identifiers, `~` regex, sequence-backed serial keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn identifier_quote(&self) -> Option<char> {
        Some('"')
    }

    fn regex_operator(&self) -> Option<&'static str> {
        Some("~")
    }

    fn fulltext(&self, column: &str, placeholder: &str) -> String {
        format!("to_tsvector({column}) @@ plainto_tsquery({placeholder})")
    }

    fn default_sequence(&self, table: &str) -> Option<String> {
        Some(format!("{table}_id_seq"))
    }

    fn last_insert_id_sql(&self, sequence: Option<&str>) -> String {
        match sequence {
            Some(seq) => format!("SELECT CURRVAL('{}')", self.escape_string(seq)),
            None => "SELECT LASTVAL()".to_string(),
        }
    }
}
