//! IBM DB2.
//!
//! Row limiting uses `FETCH FIRST n ROWS ONLY` and there is no OFFSET support,
//! so `offset` is a no-op. Keys come from explicit sequences: the INSERT
//! carries `NEXT VALUE FOR seq` and the id is read back with
//! `VALUES PREVIOUS VALUE FOR seq`.

use super::{Dialect, DialectKind};
use crate::transaction::IsolationLevel;

#[derive(Debug, Clone, Copy, Default)]
pub struct Db2;

impl Dialect for Db2 {
    fn kind(&self) -> DialectKind {
        DialectKind::Db2
    }

    fn identifier_quote(&self) -> Option<char> {
        None
    }

    fn regex_operator(&self) -> Option<&'static str> {
        None
    }

    fn fulltext(&self, column: &str, placeholder: &str) -> String {
        format!("CONTAINS({column}, {placeholder}) = 1")
    }

    fn limit(&self, mut sql: String, limit: Option<u64>) -> String {
        if let Some(n) = limit.filter(|n| *n > 0) {
            sql.push_str(&format!(" FETCH FIRST {n} ROWS ONLY"));
        }
        sql
    }

    fn offset(&self, sql: String, _offset: Option<u64>, _limit: Option<u64>) -> String {
        sql
    }

    fn next_sequence_value(&self, sequence: &str) -> Option<String> {
        Some(format!("NEXT VALUE FOR {sequence}"))
    }

    fn last_insert_id_sql(&self, sequence: Option<&str>) -> String {
        match sequence {
            Some(seq) => format!("VALUES PREVIOUS VALUE FOR {seq}"),
            None => "VALUES IDENTITY_VAL_LOCAL()".to_string(),
        }
    }

    /// `CURRENT ISOLATION` is a session register: set before the unit of work
    /// and reset afterwards.
    fn isolation_sql(&self, level: IsolationLevel) -> Option<String> {
        let register = match level {
            IsolationLevel::ServerDefault => return None,
            IsolationLevel::ReadUncommitted => "UR",
            IsolationLevel::ReadCommitted => "CS",
            IsolationLevel::RepeatableRead => "RS",
            IsolationLevel::Serializable => "RR",
        };
        Some(format!("SET CURRENT ISOLATION = {register}"))
    }

    fn isolation_before_begin(&self) -> bool {
        true
    }

    fn isolation_reset_sql(&self) -> Option<String> {
        Some("SET CURRENT ISOLATION = RESET".to_string())
    }
}
