//! Predicate compiler.
//!
//! One traversal over the condition groups lowers every predicate to a
//! [`CompiledFragment`]: its SQL text and, when it binds a value, the
//! placeholder name and value. The WHERE/HAVING text and the bind map are both
//! read off that single list, so a placeholder in the SQL always has its
//! bind entry and the other way round.

use crate::dialect::Dialect;
use crate::error::{BuoyError, Result};
use crate::query::bind::{coerce, param_name, BindMap, BindValue};
use crate::query::condition::{BoolOp, ColumnSpec, Conditions};
use crate::query::operator::{resolve, OperandPolicy, Operator};
use crate::value::Value;

/// One lowered predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFragment {
    pub sql: String,
    pub bind: Option<(String, BindValue)>,
}

/// Lowered predicates of one condition group.
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredGroup {
    pub fragments: Vec<CompiledFragment>,
    pub join_op: BoolOp,
    pub group_op: BoolOp,
}

/// Output of compiling a condition sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledConditions {
    /// Parenthesised groups, empty when there were no predicates
    pub sql: String,
    pub binds: BindMap,
    /// Discriminator to continue from (HAVING after WHERE, for instance)
    pub next_ci: usize,
}

impl CompiledConditions {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Compiles condition groups for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct ConditionCompiler<'a> {
    dialect: &'a dyn Dialect,
    datetime_format: &'a str,
    quote_identifiers: bool,
}

impl<'a> ConditionCompiler<'a> {
    pub fn new(dialect: &'a dyn Dialect, datetime_format: &'a str) -> Self {
        Self {
            dialect,
            datetime_format,
            quote_identifiers: false,
        }
    }

    /// Quote plain (undotted) predicate columns with the dialect's identifier quote.
    pub fn quote_identifiers(mut self, enabled: bool) -> Self {
        self.quote_identifiers = enabled;
        self
    }

    /// Lower every predicate, starting the discriminator at `ci`.
    ///
    /// Returns the groups and the discriminator after the last predicate; it
    /// advances exactly once per predicate.
    pub fn lower(&self, conditions: &Conditions, ci: usize) -> Result<(Vec<LoweredGroup>, usize)> {
        let mut ci = ci;
        let mut groups = Vec::with_capacity(conditions.len());
        for group in conditions.groups() {
            let mut fragments = Vec::with_capacity(group.predicates.len());
            for (key, value) in group.predicates.iter() {
                fragments.push(self.compile_predicate(key, value, ci)?);
                ci += 1;
            }
            groups.push(LoweredGroup {
                fragments,
                join_op: group.join_op,
                group_op: group.group_op,
            });
        }
        Ok((groups, ci))
    }

    /// Compile to SQL text and binds, starting the discriminator at `ci`.
    pub fn compile(&self, conditions: &Conditions, ci: usize) -> Result<CompiledConditions> {
        let (groups, next_ci) = self.lower(conditions, ci)?;
        if next_ci == ci {
            return Ok(CompiledConditions {
                next_ci,
                ..Default::default()
            });
        }

        let mut sql = String::new();
        let mut binds = BindMap::new();
        for group in groups {
            if !sql.is_empty() {
                sql.push(' ');
                sql.push_str(group.group_op.as_sql());
                sql.push(' ');
            }
            let separator = format!(" {} ", group.join_op.as_sql());
            let parts: Vec<&str> = group.fragments.iter().map(|f| f.sql.as_str()).collect();
            sql.push('(');
            sql.push_str(&parts.join(&separator));
            sql.push(')');

            for fragment in group.fragments {
                if let Some((name, value)) = fragment.bind {
                    if binds.contains_key(&name) {
                        return Err(BuoyError::invalid(format!(
                            "placeholder :{name} is bound twice"
                        )));
                    }
                    binds.insert(name, value);
                }
            }
        }

        Ok(CompiledConditions {
            sql,
            binds,
            next_ci,
        })
    }

    fn compile_predicate(&self, key: &str, value: &Value, ci: usize) -> Result<CompiledFragment> {
        let spec = ColumnSpec::parse(key)?;
        let operator = resolve(spec.operator.as_deref(), value, self.dialect.name())?;
        let column = render_column(self.dialect, self.quote_identifiers, &spec.column);

        let fragment = match operator.policy() {
            OperandPolicy::LiteralList => {
                let items = match value {
                    Value::List(items) => items.as_slice(),
                    _ => std::slice::from_ref(value),
                };
                let sql = if items.is_empty() {
                    // Nothing is IN an empty set; everything is NOT IN it.
                    match operator {
                        Operator::NotIn => "1 = 1".to_string(),
                        _ => "1 = 0".to_string(),
                    }
                } else {
                    let literals: Vec<String> = items
                        .iter()
                        .map(|item| self.dialect.quote_literal(item, self.datetime_format))
                        .collect();
                    format!("{column} {} ({})", symbol(operator), literals.join(", "))
                };
                CompiledFragment { sql, bind: None }
            }
            OperandPolicy::Omitted => CompiledFragment {
                sql: format!("{column} {}", symbol(operator)),
                bind: None,
            },
            OperandPolicy::Placeholder | OperandPolicy::FullText => {
                let name = param_name(&spec.column, Some(ci));
                let bound = coerce(value, self.datetime_format).ok_or_else(|| {
                    BuoyError::invalid(format!("'{key}' cannot bind a {} value", value.kind()))
                })?;
                let placeholder = format!(":{name}");
                let sql = match operator {
                    Operator::FullText => self.dialect.fulltext(&column, &placeholder),
                    Operator::Regex => {
                        let op = self.dialect.regex_operator().ok_or_else(|| {
                            BuoyError::UnsupportedOperator {
                                operator: spec.operator.clone().unwrap_or_default(),
                                dialect: self.dialect.name().to_string(),
                            }
                        })?;
                        format!("{column} {op} {placeholder}")
                    }
                    _ => format!("{column} {} {placeholder}", symbol(operator)),
                };
                CompiledFragment {
                    sql,
                    bind: Some((name, bound)),
                }
            }
        };
        Ok(fragment)
    }
}

/// Column as written into SQL. Dotted (qualified or computed) names are never quoted.
pub(crate) fn render_column(dialect: &dyn Dialect, quote: bool, column: &str) -> String {
    if quote && !column.contains('.') {
        dialect.quote_identifier(column)
    } else {
        column.to_string()
    }
}

fn symbol(operator: Operator) -> &'static str {
    operator.symbol().unwrap_or("=")
}
