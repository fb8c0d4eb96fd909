//! SQL dialects.
//!
//! A [`Dialect`] owns everything that differs between engines: identifier and
//! literal quoting, regex and full-text spelling, LIMIT/OFFSET syntax and the
//! insert-id strategy. Clause methods fold over an in-progress SQL string, so
//! the statement assembler never branches on the engine.

mod db2;
mod mysql;
mod postgres;
mod sqlite;

pub use db2::Db2;
pub use mysql::Mysql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use crate::query::builder::{Join, SortOrder};
use crate::transaction::IsolationLevel;
use crate::value::Value;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Engine selector, as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Postgres,
    Mysql,
    Sqlite,
    Db2,
}

impl DialectKind {
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            DialectKind::Postgres => Arc::new(Postgres),
            DialectKind::Mysql => Arc::new(Mysql),
            DialectKind::Sqlite => Arc::new(Sqlite),
            DialectKind::Db2 => Arc::new(Db2),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DialectKind::Postgres => "postgres",
            DialectKind::Mysql => "mysql",
            DialectKind::Sqlite => "sqlite",
            DialectKind::Db2 => "db2",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Engine-specific SQL syntax.
pub trait Dialect: fmt::Debug + Send + Sync {
    fn kind(&self) -> DialectKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Identifier quote character, `None` when the engine's names are left bare.
    fn identifier_quote(&self) -> Option<char>;

    /// Quote a possibly qualified name part by part. `*` is never quoted.
    fn quote_identifier(&self, name: &str) -> String {
        let Some(q) = self.identifier_quote() else {
            return name.to_string();
        };
        name.split('.')
            .map(|part| {
                if part == "*" {
                    part.to_string()
                } else {
                    let doubled = part.replace(q, &format!("{q}{q}"));
                    format!("{q}{doubled}{q}")
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Escape the body of a single-quoted string literal.
    fn escape_string(&self, raw: &str) -> String {
        raw.replace('\'', "''")
    }

    /// Render a value as an inline SQL literal.
    fn quote_literal(&self, value: &Value, datetime_format: &str) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => i64::from(*b).to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) if v.is_finite() => v.to_string(),
            Value::Float(v) => format!("'{v}'"),
            Value::Text(s) => format!("'{}'", self.escape_string(s)),
            Value::DateTime(dt) => {
                format!("'{}'", self.escape_string(&dt.format(datetime_format).to_string()))
            }
            Value::Uuid(u) => format!("'{u}'"),
            Value::Json(serde_json::Value::String(s)) => format!("'{}'", self.escape_string(s)),
            Value::Json(j) => format!("'{}'", self.escape_string(&j.to_string())),
            Value::List(items) => items
                .iter()
                .map(|item| self.quote_literal(item, datetime_format))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Regex match operator, `None` when the engine has none.
    fn regex_operator(&self) -> Option<&'static str>;

    /// Full-text match of `column` against one bound placeholder.
    fn fulltext(&self, column: &str, placeholder: &str) -> String;

    fn select(&self, mut sql: String, fields: &[String]) -> String {
        sql.push_str("SELECT ");
        if fields.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&fields.join(", "));
        }
        sql
    }

    fn from(&self, mut sql: String, table: &str) -> String {
        sql.push_str(" FROM ");
        sql.push_str(table);
        sql
    }

    fn join(&self, mut sql: String, joins: &[Join]) -> String {
        for join in joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }
        sql
    }

    /// Append a compiled WHERE clause; an empty clause leaves `sql` untouched.
    fn where_(&self, mut sql: String, clause: &str) -> String {
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
        sql
    }

    fn group(&self, mut sql: String, columns: &[String]) -> String {
        if !columns.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&columns.join(", "));
        }
        sql
    }

    fn having(&self, mut sql: String, clause: &str) -> String {
        if !clause.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(clause);
        }
        sql
    }

    fn order(&self, mut sql: String, order: &[(String, SortOrder)]) -> String {
        if !order.is_empty() {
            let columns: Vec<String> = order
                .iter()
                .map(|(column, sort)| format!("{column} {}", sort.as_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&columns.join(", "));
        }
        sql
    }

    /// A limit of `None` or `0` means no limit.
    fn limit(&self, mut sql: String, limit: Option<u64>) -> String {
        if let Some(n) = limit.filter(|n| *n > 0) {
            sql.push_str(&format!(" LIMIT {n}"));
        }
        sql
    }

    /// `limit` is passed along for engines that cannot offset without one.
    fn offset(&self, mut sql: String, offset: Option<u64>, _limit: Option<u64>) -> String {
        if let Some(m) = offset.filter(|m| *m > 0) {
            sql.push_str(&format!(" OFFSET {m}"));
        }
        sql
    }

    /// `INSERT INTO t (cols) VALUES (values)`; `values` are placeholders or SQL expressions.
    fn insert(&self, table: &str, columns: &[String], values: &[String]) -> String {
        format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            values.join(", ")
        )
    }

    fn update(&self, table: &str, assignments: &[String]) -> String {
        format!("UPDATE {table} SET {}", assignments.join(", "))
    }

    fn delete(&self, table: &str) -> String {
        format!("DELETE FROM {table}")
    }

    /// Expression producing the next key from `sequence` inside an INSERT,
    /// `None` when the engine fills the key itself.
    fn next_sequence_value(&self, _sequence: &str) -> Option<String> {
        None
    }

    /// Sequence assumed for a serial key when the caller names none.
    fn default_sequence(&self, _table: &str) -> Option<String> {
        None
    }

    /// Statement returning the key generated by the last INSERT.
    fn last_insert_id_sql(&self, sequence: Option<&str>) -> String;

    /// Statement selecting `level` for the transaction being opened, `None`
    /// when the engine cannot choose one.
    fn isolation_sql(&self, level: IsolationLevel) -> Option<String> {
        level
            .to_sql()
            .map(|level| format!("SET TRANSACTION ISOLATION LEVEL {level}"))
    }

    /// Whether [`Dialect::isolation_sql`] must run before BEGIN.
    fn isolation_before_begin(&self) -> bool {
        false
    }

    /// Statement restoring the session level once the transaction has ended,
    /// for engines whose isolation statement outlives the transaction.
    fn isolation_reset_sql(&self) -> Option<String> {
        None
    }
}
