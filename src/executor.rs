//! `Executor` Module
//!
//! The driver boundary. Compiled statements arrive with `:name` placeholders
//! and an ordered [`BindMap`]; an executor runs them and hands back affected
//! row counts or [`Record`]s. Failures come back as [`DriverError`] carrying the
//! SQLSTATE when the driver reported one, and the adapter classifies them.

use crate::query::bind::BindMap;
use crate::query::value_conversion::{decode_row, with_bound_params};
use crate::value::Record;
use may_postgres::{Client, Error as PostgresError};
use std::fmt;
use std::time::Instant;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Raw failure reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    /// SQLSTATE or driver specific code
    pub code: Option<String>,
    pub message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<PostgresError> for DriverError {
    fn from(err: PostgresError) -> Self {
        let code = err.code().map(|state| state.code().to_string());
        let message = err
            .as_db_error()
            .map(|db| db.message().to_string())
            .unwrap_or_else(|| err.to_string());
        Self { code, message }
    }
}

/// Trait for running compiled statements
///
/// Implementations own placeholder translation and value binding for their
/// driver. Statements are run synchronously; the caller's thread blocks until
/// the driver answers.
pub trait Executor {
    /// Run a statement and return the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if preparing or running the statement fails.
    fn execute(&self, sql: &str, binds: &BindMap) -> Result<u64, DriverError>;

    /// Run a query and return every row.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if preparing or running the query fails, or a row
    /// cannot be decoded.
    fn query(&self, sql: &str, binds: &BindMap) -> Result<Vec<Record>, DriverError>;

    /// Run a parameterless control statement (`BEGIN`, `SAVEPOINT sp_1`, ...).
    fn batch(&self, sql: &str) -> Result<(), DriverError> {
        self.execute(sql, &BindMap::new()).map(|_| ())
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, sql: &str, binds: &BindMap) -> Result<u64, DriverError> {
        (**self).execute(sql, binds)
    }

    fn query(&self, sql: &str, binds: &BindMap) -> Result<Vec<Record>, DriverError> {
        (**self).query(sql, binds)
    }

    fn batch(&self, sql: &str) -> Result<(), DriverError> {
        (**self).batch(sql)
    }
}

/// Implementation of `Executor` for `may_postgres::Client`
pub struct MayPostgresExecutor {
    client: Client,
}

impl MayPostgresExecutor {
    /// Create a new executor from a `may_postgres::Client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Consume the executor and return the underlying client
    pub fn into_client(self) -> Client {
        self.client
    }

    /// Run `SELECT 1` to check the connection is alive.
    pub fn check_health(&self) -> bool {
        crate::connection::check_connection_health(&self.client)
    }
}

impl Executor for MayPostgresExecutor {
    fn execute(&self, sql: &str, binds: &BindMap) -> Result<u64, DriverError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(sql).entered();

        let start = Instant::now();
        let result = with_bound_params(sql, binds, |sql, params| {
            self.client.execute(sql, params).map_err(DriverError::from)
        });

        #[cfg(feature = "metrics")]
        METRICS.record_outcome(start.elapsed(), result.is_ok());
        #[cfg(not(feature = "metrics"))]
        let _ = start;

        result
    }

    fn query(&self, sql: &str, binds: &BindMap) -> Result<Vec<Record>, DriverError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(sql).entered();

        let start = Instant::now();
        let result = with_bound_params(sql, binds, |sql, params| {
            let rows = self.client.query(sql, params).map_err(DriverError::from)?;
            rows.iter().map(decode_row).collect()
        });

        #[cfg(feature = "metrics")]
        METRICS.record_outcome(start.elapsed(), result.is_ok());
        #[cfg(not(feature = "metrics"))]
        let _ = start;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::with_code("42P01", "relation \"users\" does not exist");
        assert_eq!(err.to_string(), "[42P01] relation \"users\" does not exist");
        assert_eq!(DriverError::new("boom").to_string(), "boom");
    }

    struct Recording {
        statements: RefCell<Vec<String>>,
    }

    impl Executor for Recording {
        fn execute(&self, sql: &str, _binds: &BindMap) -> Result<u64, DriverError> {
            self.statements.borrow_mut().push(sql.to_string());
            Ok(0)
        }

        fn query(&self, _sql: &str, _binds: &BindMap) -> Result<Vec<Record>, DriverError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_batch_defaults_to_execute_and_refs_forward() {
        let exec = Recording {
            statements: RefCell::new(Vec::new()),
        };
        let by_ref = &exec;
        by_ref.batch("BEGIN").unwrap();
        exec.batch("COMMIT").unwrap();
        assert_eq!(*exec.statements.borrow(), vec!["BEGIN", "COMMIT"]);
    }
}
