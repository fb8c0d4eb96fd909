//! Scripted executor for driving the adapter without a database.

#![allow(dead_code)]

use buoy::{BindMap, DriverError, Executor, Record};
use std::cell::RefCell;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub binds: BindMap,
}

/// Records every statement; answers queries from a queue of scripted results.
#[derive(Default)]
pub struct MockExecutor {
    calls: RefCell<Vec<Call>>,
    results: RefCell<VecDeque<Result<Vec<Record>, DriverError>>>,
    failures: RefCell<VecDeque<(String, DriverError)>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next `query` returns `rows`.
    pub fn push_rows(&self, rows: Vec<Record>) -> &Self {
        self.results.borrow_mut().push_back(Ok(rows));
        self
    }

    /// Next `query` fails with `err`.
    pub fn push_query_error(&self, err: DriverError) -> &Self {
        self.results.borrow_mut().push_back(Err(err));
        self
    }

    /// The next statement starting with `prefix` fails with `err`.
    pub fn fail_on(&self, prefix: &str, err: DriverError) -> &Self {
        self.failures
            .borrow_mut()
            .push_back((prefix.to_string(), err));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.sql.clone()).collect()
    }

    pub fn last(&self) -> Option<Call> {
        self.calls.borrow().last().cloned()
    }

    fn record(&self, sql: &str, binds: &BindMap) -> Result<(), DriverError> {
        self.calls.borrow_mut().push(Call {
            sql: sql.to_string(),
            binds: binds.clone(),
        });
        let mut failures = self.failures.borrow_mut();
        if let Some(idx) = failures.iter().position(|(p, _)| sql.starts_with(p.as_str())) {
            if let Some((_, err)) = failures.remove(idx) {
                return Err(err);
            }
        }
        Ok(())
    }
}

impl Executor for MockExecutor {
    fn execute(&self, sql: &str, binds: &BindMap) -> Result<u64, DriverError> {
        self.record(sql, binds)?;
        Ok(1)
    }

    fn query(&self, sql: &str, binds: &BindMap) -> Result<Vec<Record>, DriverError> {
        self.record(sql, binds)?;
        self.results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
