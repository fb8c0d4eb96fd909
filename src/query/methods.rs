//! Custom query verbs.
//!
//! Callers extend the builder by registering a function under a name and
//! invoking it with [`crate::query::Query::call`]. Built-in method names cannot
//! be shadowed.

use crate::error::{BuoyError, Result};
use crate::query::builder::{Query, BUILTIN_METHODS};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registered verb: receives the query and the call arguments.
pub type QueryMethod = Arc<dyn Fn(&mut Query, &[Value]) -> Result<()> + Send + Sync>;

#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, QueryMethod>,
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.methods.keys().collect();
        names.sort();
        f.debug_struct("MethodRegistry").field("methods", &names).finish()
    }
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`. Re-registering a custom verb replaces it.
    pub fn register<F>(&mut self, name: &str, method: F) -> Result<()>
    where
        F: Fn(&mut Query, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(BuoyError::invalid("query method name cannot be empty"));
        }
        if BUILTIN_METHODS.contains(&name) {
            return Err(BuoyError::invalid(format!(
                "method '{name}' already exists on Query"
            )));
        }
        if self.methods.insert(name.to_string(), Arc::new(method)).is_some() {
            log::debug!("query method '{name}' replaced");
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<QueryMethod> {
        self.methods.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::condition::Criteria;

    #[test]
    fn test_register_and_call() {
        let mut registry = MethodRegistry::new();
        registry
            .register("active", |query, _args| {
                query.filter(Criteria::from([("status", "active")]));
                Ok(())
            })
            .unwrap();
        registry
            .register("older_than", |query, args| {
                let age = args
                    .first()
                    .cloned()
                    .ok_or_else(|| BuoyError::invalid("older_than needs an age"))?;
                query.filter(Criteria::new().with("age :gt", age));
                Ok(())
            })
            .unwrap();

        let mut query = Query::new("users").with_methods(Arc::new(registry));
        query.call("active", &[]).unwrap();
        query.call("older_than", &[Value::Int(40)]).unwrap();
        assert_eq!(query.state().conditions.len(), 2);
        assert!(query.call("older_than", &[]).is_err());
    }

    #[test]
    fn test_builtin_names_are_reserved() {
        let mut registry = MethodRegistry::new();
        let err = registry.register("limit", |_, _| Ok(())).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(registry.is_empty());
    }
}
