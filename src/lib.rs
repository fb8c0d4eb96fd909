//! # Buoy
//!
//! Data-mapper query compiler: a fluent, resettable query description compiled
//! into dialect-specific SQL with named binds, executed on PostgreSQL through
//! `may_postgres`.
//!
//! - [`query`] describes and compiles queries
//! - [`dialect`] holds the per-engine SQL syntax (PostgreSQL, MySQL, SQLite, DB2)
//! - [`statement`] assembles SELECT/COUNT/INSERT/UPDATE/DELETE
//! - [`adapter`] runs statements and classifies driver errors
//! - [`mapper`] maps [`Entity`] types to rows

#[macro_use]
mod macros;

pub mod adapter;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod metrics;
pub mod query;
pub mod query_log;
pub mod statement;
pub mod transaction;
pub mod value;

pub use adapter::{Adapter, AdapterSettings};
pub use config::DatabaseConfig;
pub use connection::{check_connection_health, connect, validate_connection_string};
pub use dialect::{Dialect, DialectKind};
pub use entity::{Entity, EntityMeta, FieldKind, FieldMeta, MetadataRegistry};
pub use error::{BuoyError, Result};
pub use executor::{DriverError, Executor, MayPostgresExecutor};
pub use mapper::Mapper;
pub use query::{BindMap, BindValue, BoolOp, Conditions, Criteria, Query};
pub use query_log::{LoggedQuery, QueryLog};
pub use statement::{InsertOptions, Statement, StatementAssembler};
pub use transaction::{IsolationLevel, Transaction};
pub use value::{Record, Value};
