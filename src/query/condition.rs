//! Condition model: WHERE/HAVING as an ordered sequence of predicate groups.
//!
//! Each `filter`/`and_where`/`or_where`/`having` call on the builder appends one
//! [`ConditionGroup`]. Two levels only: predicates inside a group, groups inside
//! the sequence.

use crate::error::{BuoyError, Result};
use crate::value::{Record, Value};
use serde::Serialize;
use std::fmt;

/// Criteria are an ordered `"column [operator]" -> value` map.
pub type Criteria = Record;

/// Boolean connective used inside a group and between groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BoolOp {
    #[default]
    And,
    Or,
}

impl BoolOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }

    /// Parse `and`/`or` case-insensitively.
    pub fn parse(token: &str) -> Result<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(BoolOp::And),
            "OR" => Ok(BoolOp::Or),
            other => Err(BuoyError::invalid(format!(
                "boolean operator must be AND or OR, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A predicate key split into column and optional operator token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub column: String,
    pub operator: Option<String>,
}

impl ColumnSpec {
    /// Split `"age :gt"` into `age` and `:gt`.
    ///
    /// With more than two tokens the last one is the operator and the rest is
    /// rejoined as the column, so `"name not like"` yields column `name not`
    /// and operator `like`.
    pub fn parse(key: &str) -> Result<Self> {
        let tokens: Vec<&str> = key.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Err(BuoyError::invalid("condition key must name a column")),
            [column] => Ok(Self {
                column: (*column).to_string(),
                operator: None,
            }),
            [column, operator] => Ok(Self {
                column: (*column).to_string(),
                operator: Some((*operator).to_string()),
            }),
            [rest @ .., operator] => Ok(Self {
                column: rest.join(" "),
                operator: Some((*operator).to_string()),
            }),
        }
    }
}

/// One set of predicates sharing a connective.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionGroup {
    pub predicates: Criteria,
    /// Joins predicates inside this group
    pub join_op: BoolOp,
    /// Joins this group to the previous one, ignored for the first group
    pub group_op: BoolOp,
}

impl ConditionGroup {
    pub fn new(predicates: impl Into<Criteria>, join_op: BoolOp, group_op: BoolOp) -> Self {
        Self {
            predicates: predicates.into(),
            join_op,
            group_op,
        }
    }
}

/// Ordered sequence of non-empty condition groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Conditions {
    groups: Vec<ConditionGroup>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group. Empty groups are skipped so no `()` is ever rendered.
    pub fn push(&mut self, group: ConditionGroup) {
        if !group.predicates.is_empty() {
            self.groups.push(group);
        }
    }

    pub fn groups(&self) -> &[ConditionGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Total number of predicates across all groups.
    pub fn predicate_count(&self) -> usize {
        self.groups.iter().map(|g| g.predicates.len()).sum()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

impl From<Criteria> for Conditions {
    /// A flat criteria map is one implicit AND group.
    fn from(criteria: Criteria) -> Self {
        let mut conditions = Conditions::new();
        conditions.push(ConditionGroup::new(criteria, BoolOp::And, BoolOp::And));
        conditions
    }
}

impl From<ConditionGroup> for Conditions {
    fn from(group: ConditionGroup) -> Self {
        let mut conditions = Conditions::new();
        conditions.push(group);
        conditions
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Conditions {
    fn from(entries: [(K, V); N]) -> Self {
        Conditions::from(Criteria::from(entries))
    }
}
