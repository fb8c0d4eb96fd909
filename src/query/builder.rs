//! Fluent query description.
//!
//! A [`Query`] accumulates select/from/join/where/order/group/having/limit
//! calls into a [`QueryState`]. Compilation happens on demand and always starts
//! from the current state; nothing derived is kept between calls except the
//! per-instance count memo, which is keyed by a hash of the state itself.
//!
//! The transient parts of the state (conditions, order, group, having, limit
//! and offset) can be captured with [`Query::snapshot`] and put back with
//! [`Query::restore`], so one query can serve as the base for several
//! executions.

use crate::adapter::Adapter;
use crate::error::{BuoyError, Result};
use crate::executor::Executor;
use crate::query::bind::BindMap;
use crate::query::condition::{BoolOp, ConditionGroup, Conditions, Criteria};
use crate::query::methods::MethodRegistry;
use crate::value::{Record, Value};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builder methods a custom verb may not shadow.
pub const BUILTIN_METHODS: &[&str] = &[
    "select",
    "from",
    "join",
    "inner_join",
    "left_outer_join",
    "right_outer_join",
    "full_outer_join",
    "cross_join",
    "filter",
    "where_group",
    "and_where",
    "or_where",
    "all",
    "order_by",
    "group_by",
    "having",
    "limit",
    "offset",
    "first",
    "execute",
    "execute_and_reset",
    "count",
    "to_sql",
    "parameters",
    "snapshot",
    "restore",
    "call",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// `asc`/`desc`, case-insensitive; anything else sorts ascending.
    pub fn parse(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum JoinKind {
    #[default]
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::LeftOuter => "LEFT OUTER",
            JoinKind::RightOuter => "RIGHT OUTER",
            JoinKind::FullOuter => "FULL OUTER",
            JoinKind::Cross => "CROSS",
        }
    }

    /// Unknown kinds fall back to INNER.
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "LEFT OUTER" | "LEFT" => JoinKind::LeftOuter,
            "RIGHT OUTER" | "RIGHT" => JoinKind::RightOuter,
            "FULL OUTER" | "FULL" => JoinKind::FullOuter,
            "CROSS" => JoinKind::Cross,
            _ => JoinKind::Inner,
        }
    }
}

/// Join condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JoinConstraint {
    None,
    /// Written into the statement as-is
    Raw(String),
    On {
        left: String,
        op: String,
        right: String,
    },
}

impl JoinConstraint {
    pub fn on(left: impl Into<String>, op: impl Into<String>, right: impl Into<String>) -> Self {
        JoinConstraint::On {
            left: left.into(),
            op: op.into(),
            right: right.into(),
        }
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        JoinConstraint::Raw(sql.into())
    }

    fn to_sql(&self) -> Option<String> {
        match self {
            JoinConstraint::None => None,
            JoinConstraint::Raw(sql) if sql.trim().is_empty() => None,
            JoinConstraint::Raw(sql) => Some(sql.trim().to_string()),
            JoinConstraint::On { left, op, right } => Some(format!("{left} {op} {right}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Join {
    pub table: String,
    pub constraint: JoinConstraint,
    pub kind: JoinKind,
}

impl Join {
    pub fn new(table: impl Into<String>, constraint: JoinConstraint, kind: JoinKind) -> Self {
        Self {
            table: table.into().trim().to_string(),
            constraint,
            kind,
        }
    }

    pub fn to_sql(&self) -> String {
        match self.constraint.to_sql() {
            Some(on) => format!("{} JOIN {} ON ({on})", self.kind.as_sql(), self.table),
            None => format!("{} JOIN {}", self.kind.as_sql(), self.table),
        }
    }
}

/// Everything a statement is compiled from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryState {
    pub fields: Vec<String>,
    pub datasource: String,
    pub joins: Vec<Join>,
    pub conditions: Conditions,
    pub order: Vec<(String, SortOrder)>,
    pub group: Vec<String>,
    pub having: Conditions,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// The resettable part of a [`QueryState`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    conditions: Conditions,
    order: Vec<(String, SortOrder)>,
    group: Vec<String>,
    having: Conditions,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Snapshot {
    fn capture(state: &QueryState) -> Self {
        Self {
            conditions: state.conditions.clone(),
            order: state.order.clone(),
            group: state.group.clone(),
            having: state.having.clone(),
            limit: state.limit,
            offset: state.offset,
        }
    }
}

/// Mutable, resettable query description.
#[derive(Clone)]
pub struct Query {
    state: QueryState,
    snapshot: Snapshot,
    count_cache: HashMap<String, u64>,
    methods: Arc<MethodRegistry>,
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("state", &self.state)
            .field("cached_counts", &self.count_cache.len())
            .finish()
    }
}

impl Query {
    /// New query over `datasource`; the empty transient state is the initial snapshot.
    pub fn new(datasource: impl Into<String>) -> Self {
        let state = QueryState {
            datasource: datasource.into(),
            ..Default::default()
        };
        Self {
            snapshot: Snapshot::capture(&state),
            state,
            count_cache: HashMap::new(),
            methods: Arc::new(MethodRegistry::new()),
        }
    }

    /// Attach the registry `call` resolves custom verbs from.
    pub fn with_methods(mut self, methods: Arc<MethodRegistry>) -> Self {
        self.methods = methods;
        self
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn datasource(&self) -> &str {
        &self.state.datasource
    }

    /// Add comma-separated fields. A lone `*` from an earlier call is replaced.
    pub fn select(&mut self, fields: &str) -> &mut Self {
        self.select_fields(fields.split(','))
    }

    pub fn select_fields<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.state.fields.len() == 1 && self.state.fields[0] == "*" {
            self.state.fields.clear();
        }
        for field in fields {
            let field = field.as_ref().trim();
            if !field.is_empty() {
                self.state.fields.push(field.to_string());
            }
        }
        self
    }

    pub fn from(&mut self, datasource: impl Into<String>) -> &mut Self {
        self.state.datasource = datasource.into();
        self
    }

    pub fn join(&mut self, table: &str, constraint: JoinConstraint, kind: JoinKind) -> &mut Self {
        self.state.joins.push(Join::new(table, constraint, kind));
        self
    }

    pub fn inner_join(&mut self, table: &str, constraint: JoinConstraint) -> &mut Self {
        self.join(table, constraint, JoinKind::Inner)
    }

    pub fn left_outer_join(&mut self, table: &str, constraint: JoinConstraint) -> &mut Self {
        self.join(table, constraint, JoinKind::LeftOuter)
    }

    pub fn right_outer_join(&mut self, table: &str, constraint: JoinConstraint) -> &mut Self {
        self.join(table, constraint, JoinKind::RightOuter)
    }

    pub fn full_outer_join(&mut self, table: &str, constraint: JoinConstraint) -> &mut Self {
        self.join(table, constraint, JoinKind::FullOuter)
    }

    pub fn cross_join(&mut self, table: &str) -> &mut Self {
        self.join(table, JoinConstraint::None, JoinKind::Cross)
    }

    /// Append one condition group.
    ///
    /// `join_op` joins the predicates inside the group, `group_op` joins the
    /// group to the previous one. Empty criteria are ignored.
    pub fn where_group(
        &mut self,
        criteria: impl Into<Criteria>,
        join_op: BoolOp,
        group_op: BoolOp,
    ) -> &mut Self {
        self.state
            .conditions
            .push(ConditionGroup::new(criteria, join_op, group_op));
        self
    }

    /// AND-joined predicates, AND-ed with what is already there.
    pub fn filter(&mut self, criteria: impl Into<Criteria>) -> &mut Self {
        self.where_group(criteria, BoolOp::And, BoolOp::And)
    }

    pub fn and_where(&mut self, criteria: impl Into<Criteria>, join_op: BoolOp) -> &mut Self {
        self.where_group(criteria, join_op, BoolOp::And)
    }

    pub fn or_where(&mut self, criteria: impl Into<Criteria>, join_op: BoolOp) -> &mut Self {
        self.where_group(criteria, join_op, BoolOp::Or)
    }

    /// Alias of [`Query::filter`].
    pub fn all(&mut self, criteria: impl Into<Criteria>) -> &mut Self {
        self.filter(criteria)
    }

    /// Sort by `field`; ordering the same field again replaces its direction.
    pub fn order_by(&mut self, field: &str, sort: SortOrder) -> &mut Self {
        let field = field.trim().to_string();
        match self.state.order.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = sort,
            None => self.state.order.push((field, sort)),
        }
        self
    }

    pub fn group_by<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.group.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn having(&mut self, criteria: impl Into<Criteria>) -> &mut Self {
        self.state
            .having
            .push(ConditionGroup::new(criteria, BoolOp::And, BoolOp::And));
        self
    }

    /// `0` means no limit.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.state.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.state.offset = Some(offset);
        self
    }

    /// Capture the transient state as the point [`Query::restore`] returns to.
    pub fn snapshot(&mut self) -> &mut Self {
        self.snapshot = Snapshot::capture(&self.state);
        self
    }

    /// Put conditions, order, group, having, limit and offset back to the last snapshot.
    pub fn restore(&mut self) -> &mut Self {
        let snap = self.snapshot.clone();
        self.state.conditions = snap.conditions;
        self.state.order = snap.order;
        self.state.group = snap.group;
        self.state.having = snap.having;
        self.state.limit = snap.limit;
        self.state.offset = snap.offset;
        self
    }

    /// Run a custom verb registered in the attached [`MethodRegistry`].
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<&mut Self> {
        let methods = Arc::clone(&self.methods);
        let method = methods
            .get(name)
            .ok_or_else(|| BuoyError::invalid(format!("no query method named '{name}'")))?;
        method(self, args)?;
        Ok(self)
    }

    /// Compiled SELECT text.
    pub fn to_sql<E: Executor>(&self, adapter: &Adapter<E>) -> Result<String> {
        Ok(adapter.assembler().select(&self.state)?.sql)
    }

    /// WHERE and HAVING binds, in placeholder order.
    pub fn parameters<E: Executor>(&self, adapter: &Adapter<E>) -> Result<BindMap> {
        Ok(adapter.assembler().select(&self.state)?.binds)
    }

    pub fn execute<E: Executor>(&self, adapter: &Adapter<E>) -> Result<Vec<Record>> {
        adapter.read_entities(self)
    }

    /// Execute, then [`Query::restore`] whether or not execution succeeded.
    pub fn execute_and_reset<E: Executor>(&mut self, adapter: &Adapter<E>) -> Result<Vec<Record>> {
        let result = self.execute(adapter);
        self.restore();
        result
    }

    /// Add `criteria`, limit to one row and return it.
    pub fn first<E: Executor>(
        &mut self,
        adapter: &Adapter<E>,
        criteria: impl Into<Criteria>,
    ) -> Result<Option<Record>> {
        self.filter(criteria).limit(1);
        Ok(self.execute(adapter)?.into_iter().next())
    }

    /// Row count for the current state, memoised per state on this instance.
    pub fn count<E: Executor>(&mut self, adapter: &Adapter<E>) -> Result<u64> {
        let key = self.state_key()?;
        if let Some(count) = self.count_cache.get(&key) {
            log::debug!("count cache hit for {}", self.state.datasource);
            return Ok(*count);
        }
        let count = adapter.count(self)?;
        self.count_cache.insert(key, count);
        Ok(count)
    }

    /// SHA-256 of the serialised state.
    pub fn state_key(&self) -> Result<String> {
        let encoded = serde_json::to_vec(&self.state)
            .map_err(|e| BuoyError::invalid(format!("query state cannot be hashed: {e}")))?;
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_splits_and_replaces_star() {
        let mut query = Query::new("users");
        query.select("*");
        assert_eq!(query.state().fields, vec!["*"]);
        query.select(" id, name ,");
        assert_eq!(query.state().fields, vec!["id", "name"]);
        query.select_fields(["COUNT(*) AS total"]);
        assert_eq!(query.state().fields.len(), 3);
    }

    #[test]
    fn test_join_rendering() {
        let join = Join::new("posts", JoinConstraint::raw(" posts.user_id = users.id "), JoinKind::Inner);
        assert_eq!(join.to_sql(), "INNER JOIN posts ON (posts.user_id = users.id)");
        let join = Join::new("tags", JoinConstraint::None, JoinKind::Cross);
        assert_eq!(join.to_sql(), "CROSS JOIN tags");
        assert_eq!(JoinKind::parse("left outer"), JoinKind::LeftOuter);
        assert_eq!(JoinKind::parse("sideways"), JoinKind::Inner);
    }

    #[test]
    fn test_empty_where_is_skipped() {
        let mut query = Query::new("users");
        query.filter(Criteria::new());
        assert!(query.state().conditions.is_empty());
    }

    #[test]
    fn test_order_by_replaces_direction() {
        let mut query = Query::new("users");
        query
            .order_by("name", SortOrder::Asc)
            .order_by("id", SortOrder::Desc)
            .order_by("name", SortOrder::parse("DESC"));
        assert_eq!(
            query.state().order,
            vec![
                ("name".to_string(), SortOrder::Desc),
                ("id".to_string(), SortOrder::Desc)
            ]
        );
    }

    #[test]
    fn test_restore_returns_to_snapshot() {
        let mut query = Query::new("users");
        query.select("id").filter([("active", true)]).snapshot();
        query
            .filter([("age :gt", 30)])
            .order_by("age", SortOrder::Asc)
            .limit(5)
            .offset(10);
        query.restore();

        assert_eq!(query.state().conditions.len(), 1);
        assert!(query.state().order.is_empty());
        assert_eq!(query.state().limit, None);
        assert_eq!(query.state().offset, None);
        assert_eq!(query.state().fields, vec!["id"]);
    }

    #[test]
    fn test_state_key_tracks_state() {
        let mut query = Query::new("users");
        let before = query.state_key().unwrap();
        assert_eq!(before, query.state_key().unwrap());
        query.filter([("a", 1)]);
        assert_ne!(before, query.state_key().unwrap());
        assert_eq!(before.len(), 64);
    }

    #[test]
    fn test_call_unknown_method() {
        let mut query = Query::new("users");
        assert!(matches!(
            query.call("published", &[]),
            Err(BuoyError::InvalidArgument(_))
        ));
    }
}
