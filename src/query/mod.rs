//! Query description and compilation.
//!
//! # Architecture
//!
//! - **Condition**: WHERE/HAVING as ordered groups of `"column [op]" -> value` predicates
//! - **Operator**: operator tokens (`>=`, `:gte`, `:in`, ...) resolved against the operand
//! - **Bind**: value coercion, placeholder naming and the ordered bind map
//! - **Compiler**: one traversal producing both the predicate text and the binds
//! - **Builder**: the fluent, resettable [`Query`]
//! - **Methods**: custom builder verbs
//! - **Placeholder**: `:name` to `$n`/`?` rewriting for drivers
//! - **Error Handling**: driver error classification
//! - **Value Conversion**: binding coerced values and decoding rows through `may_postgres`
//!
//! # Examples
//!
//! ```
//! use buoy::query::{BoolOp, Query};
//! use buoy::value::Record;
//!
//! let mut query = Query::new("users");
//! query
//!     .select("id, name")
//!     .filter(Record::from([("age :gt", 18)]))
//!     .or_where(Record::from([("vip", true)]), BoolOp::And)
//!     .limit(10);
//! assert_eq!(query.state().conditions.predicate_count(), 2);
//! ```

pub mod bind;
pub mod builder;
pub mod compiler;
pub mod condition;
pub mod methods;
pub mod operator;
pub mod placeholder;

pub(crate) mod error_handling;
pub(crate) mod value_conversion;

#[doc(inline)]
pub use bind::{BindMap, BindValue};
#[doc(inline)]
pub use builder::{Join, JoinConstraint, JoinKind, Query, QueryState, SortOrder};
#[doc(inline)]
pub use compiler::{CompiledConditions, ConditionCompiler};
#[doc(inline)]
pub use condition::{BoolOp, ColumnSpec, ConditionGroup, Conditions, Criteria};
#[doc(inline)]
pub use methods::MethodRegistry;
#[doc(inline)]
pub use operator::{OperandPolicy, Operator};
