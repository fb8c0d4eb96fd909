//! Error detection and classification utilities.
//!
//! Driver errors reach the adapter as [`DriverError`]. They are classified
//! once, at the execution boundary: "table does not exist" becomes
//! [`BuoyError::MissingDatasource`], everything else [`BuoyError::Adapter`].

use crate::error::BuoyError;
use crate::executor::DriverError;

/// SQLSTATE codes meaning the target relation is missing.
///
/// - `42P01`: PostgreSQL undefined_table
/// - `42S02`: MySQL / ODBC base table not found
/// - `42704`: DB2 undefined object name
const MISSING_TABLE_CODES: &[&str] = &["42P01", "42S02", "42704"];

/// Check if a driver error means the target table does not exist.
///
/// The SQLSTATE decides when the driver reported one. SQLite reports no
/// SQLSTATE, so its message is matched instead; the pattern is narrow so that
/// "no such column" and friends are not mistaken for a missing table.
pub(crate) fn is_missing_datasource(error: &DriverError) -> bool {
    if let Some(code) = error.code.as_deref() {
        return MISSING_TABLE_CODES.contains(&code);
    }
    let message = error.message.to_lowercase();
    message.contains("no such table")
        || (message.contains("relation") && message.contains("does not exist"))
}

/// Classify a driver error raised while running a statement against `datasource`.
pub(crate) fn classify(datasource: &str, error: DriverError) -> BuoyError {
    if is_missing_datasource(&error) {
        BuoyError::MissingDatasource {
            datasource: datasource.to_string(),
            message: error.message,
        }
    } else {
        BuoyError::Adapter {
            message: error.message,
            code: error.code,
        }
    }
}
