//! Bounded in-memory log of executed statements.

use crate::query::bind::BindMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub const DEFAULT_QUERY_LOG_LIMIT: usize = 200;

/// One executed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedQuery {
    pub sql: String,
    pub binds: BindMap,
    pub dialect: &'static str,
    pub elapsed: Duration,
    pub succeeded: bool,
}

/// Keeps the last `limit` statements; the oldest one is dropped when full.
/// A limit of 0 disables logging.
#[derive(Debug)]
pub struct QueryLog {
    limit: usize,
    entries: Mutex<VecDeque<LoggedQuery>>,
}

impl Default for QueryLog {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_LOG_LIMIT)
    }
}

impl QueryLog {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            entries: Mutex::new(VecDeque::with_capacity(limit.min(DEFAULT_QUERY_LOG_LIMIT))),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn record(&self, entry: LoggedQuery) {
        if self.limit == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        while entries.len() >= self.limit {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Oldest first.
    pub fn entries(&self) -> Vec<LoggedQuery> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<LoggedQuery> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}
