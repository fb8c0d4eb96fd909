//! Convenience macros.
//!
//! - [`criteria!`](crate::criteria) builds a condition map inline
//! - [`buoy_txn!`](crate::buoy_txn) runs a block inside BEGIN/COMMIT

mod criteria;
mod txn;
