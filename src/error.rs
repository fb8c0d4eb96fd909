//! Error taxonomy for query compilation and statement execution.
//!
//! Compile-time problems (malformed condition maps, operators a dialect cannot
//! express) are raised before anything reaches the driver. Driver failures are
//! classified at the execution boundary, see [`crate::query::error_handling`].

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = BuoyError> = std::result::Result<T, E>;

/// Every error surfaced by the compiler, the adapter and the mapper.
#[derive(Debug, Error)]
pub enum BuoyError {
    /// Malformed condition map, bad data dictionary, or misuse of an operator.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The underlying table does not exist.
    ///
    /// Callers may recover from this one, e.g. by creating the table and retrying.
    #[error("Table or datasource '{datasource}' does not exist")]
    MissingDatasource {
        /// Table the statement targeted
        datasource: String,
        /// Driver message, kept for diagnostics
        message: String,
    },

    /// Any other driver-level failure during prepare/execute.
    #[error("Adapter error: {message}")]
    Adapter {
        /// Driver message
        message: String,
        /// SQLSTATE (or driver specific code) when the driver reported one
        code: Option<String>,
    },

    /// An operator that is recognised but cannot be expressed by the dialect.
    #[error("Operator '{operator}' is not supported by the {dialect} dialect")]
    UnsupportedOperator {
        /// Operator token as written by the caller
        operator: String,
        /// Dialect name
        dialect: String,
    },

    /// Transaction misuse (closed transaction) or a failed boundary statement.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Connection string or connection establishment failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl BuoyError {
    /// Shorthand for [`BuoyError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        BuoyError::InvalidArgument(message.into())
    }

    /// `true` when the error means the target table is missing.
    pub fn is_missing_datasource(&self) -> bool {
        matches!(self, BuoyError::MissingDatasource { .. })
    }
}
