//! Bind parameters: coercion, naming and the ordered bind map.
//!
//! Placeholder names are derived from the column (operator stripped), sanitised
//! to `[A-Za-z0-9_]` and suffixed with the running discriminator `ci` when one
//! is active. `ci` advances once per predicate visited, bound or not.
//!
//! A column that already ends in a digit gets `_` before `ci` (`x1` at 0 is
//! `x1_0`), so the trailing digits of a name are always exactly its `ci` and
//! two predicates of one statement never share a placeholder.

use crate::error::{BuoyError, Result};
use crate::query::condition::{ColumnSpec, Criteria};
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("static regex"));

/// A coerced scalar ready for the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BindValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl BindValue {
    pub fn is_null(&self) -> bool {
        matches!(self, BindValue::Null)
    }
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::Int(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

/// Ordered `placeholder name -> value` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BindMap {
    entries: Vec<(String, BindValue)>,
}

impl BindMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace in place.
    pub fn insert(&mut self, name: impl Into<String>, value: BindValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BindValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn extend(&mut self, other: BindMap) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }

    /// Copy without null entries; those were compiled as literal `IS NULL`.
    pub fn without_nulls(&self) -> BindMap {
        BindMap {
            entries: self
                .entries
                .iter()
                .filter(|(_, v)| !v.is_null())
                .cloned()
                .collect(),
        }
    }
}

impl<const N: usize> From<[(&str, BindValue); N]> for BindMap {
    fn from(entries: [(&str, BindValue); N]) -> Self {
        let mut map = BindMap::new();
        for (name, value) in entries {
            map.insert(name, value);
        }
        map
    }
}

/// Replace every run of non-word characters with `_`.
pub fn sanitize_param(raw: &str) -> String {
    NON_WORD.replace_all(raw, "_").into_owned()
}

/// Placeholder name for `column` at discriminator `ci`.
pub fn param_name(column: &str, ci: Option<usize>) -> String {
    let base = sanitize_param(column);
    match ci {
        Some(ci) if base.ends_with(|c: char| c.is_ascii_digit()) => format!("{base}_{ci}"),
        Some(ci) => format!("{base}{ci}"),
        None => base,
    }
}

/// Coerce an operand to its bind form.
///
/// Lists produce no bind value; they are rendered as literals.
pub fn coerce(value: &Value, datetime_format: &str) -> Option<BindValue> {
    match value {
        Value::Null => Some(BindValue::Null),
        Value::Bool(b) => Some(BindValue::Int(i64::from(*b))),
        Value::Int(v) => Some(BindValue::Int(*v)),
        Value::Float(v) => Some(BindValue::Float(*v)),
        Value::Text(s) => Some(BindValue::Text(s.clone())),
        Value::DateTime(dt) => Some(BindValue::Text(dt.format(datetime_format).to_string())),
        Value::Uuid(u) => Some(BindValue::Text(u.to_string())),
        Value::Json(serde_json::Value::String(s)) => Some(BindValue::Text(s.clone())),
        Value::Json(j) => Some(BindValue::Text(j.to_string())),
        Value::List(_) => None,
    }
}

/// Bind map for a data dictionary (INSERT values, UPDATE SET values).
///
/// With `ci = None` names are the bare sanitised column; with `Some(start)` each
/// entry gets the running suffix so the map can be merged with WHERE binds.
/// Lists cannot be stored in a column and are rejected, and so are two keys
/// that sanitise to the same bare name (`a.b` and `a_b`).
pub fn compile_binds(
    data: &Criteria,
    ci: Option<usize>,
    datetime_format: &str,
) -> Result<BindMap> {
    let mut binds = BindMap::new();
    let mut ci = ci;
    for (key, value) in data.iter() {
        let spec = ColumnSpec::parse(key)?;
        let bind = coerce(value, datetime_format).ok_or_else(|| {
            BuoyError::invalid(format!("column '{}' cannot take a list value", spec.column))
        })?;
        let name = param_name(&spec.column, ci);
        if binds.contains_key(&name) {
            return Err(BuoyError::invalid(format!(
                "column '{}' maps to placeholder :{name}, which an earlier column already uses",
                spec.column
            )));
        }
        binds.insert(name, bind);
        ci = ci.map(|n| n + 1);
    }
    Ok(binds)
}
