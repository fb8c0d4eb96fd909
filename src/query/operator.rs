//! Operator resolution for predicate keys.
//!
//! Maps symbolic (`>=`) and keyword (`:gte`) tokens to one canonical
//! [`Operator`]. The operand decides the final form of equality: a list turns
//! `=` into `IN`, a null turns it into `IS NULL`.

use crate::error::{BuoyError, Result};
use crate::value::Value;

/// Canonical comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Lt,
    Lte,
    Gt,
    Gte,
    Regex,
    Like,
    Eq,
    NotEq,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    FullText,
}

/// How the right-hand side of a predicate is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandPolicy {
    /// `col OP :placeholder`, one bind entry
    Placeholder,
    /// `col OP (lit, lit)`, quoted literals, no bind entry
    LiteralList,
    /// `col IS [NOT] NULL`, no operand and no bind entry
    Omitted,
    /// Dialect full-text expression around one placeholder
    FullText,
}

impl Operator {
    /// Fixed SQL spelling. `None` for operators the dialect spells (regex, full-text).
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            Operator::Lt => Some("<"),
            Operator::Lte => Some("<="),
            Operator::Gt => Some(">"),
            Operator::Gte => Some(">="),
            Operator::Like => Some("LIKE"),
            Operator::Eq => Some("="),
            Operator::NotEq => Some("!="),
            Operator::In => Some("IN"),
            Operator::NotIn => Some("NOT IN"),
            Operator::IsNull => Some("IS NULL"),
            Operator::IsNotNull => Some("IS NOT NULL"),
            Operator::Regex | Operator::FullText => None,
        }
    }

    pub fn policy(self) -> OperandPolicy {
        match self {
            Operator::In | Operator::NotIn => OperandPolicy::LiteralList,
            Operator::IsNull | Operator::IsNotNull => OperandPolicy::Omitted,
            Operator::FullText => OperandPolicy::FullText,
            _ => OperandPolicy::Placeholder,
        }
    }
}

/// Resolve an operator token against its operand.
///
/// Unknown tokens fall through to equality. `:all` is recognised but no SQL
/// dialect implements it. Lists and nulls are only meaningful with the
/// equality family; anything else is rejected before the statement is built.
pub fn resolve(token: Option<&str>, value: &Value, dialect: &str) -> Result<Operator> {
    let token = token.map(str::to_ascii_lowercase);
    let operator = match token.as_deref() {
        Some("<") | Some(":lt") => Operator::Lt,
        Some("<=") | Some(":lte") => Operator::Lte,
        Some(">") | Some(":gt") => Operator::Gt,
        Some(">=") | Some(":gte") => Operator::Gte,
        Some("~=") | Some("=~") | Some(":regex") => Operator::Regex,
        Some(":like") => Operator::Like,
        Some(":fulltext") => Operator::FullText,
        Some(":all") => {
            return Err(BuoyError::UnsupportedOperator {
                operator: ":all".to_string(),
                dialect: dialect.to_string(),
            })
        }
        Some("<>") | Some("!=") | Some(":ne") | Some(":not") | Some(":notin") | Some(":isnot") => {
            match value {
                Value::List(_) => Operator::NotIn,
                Value::Null => Operator::IsNotNull,
                _ => Operator::NotEq,
            }
        }
        other => {
            if let Some(unknown) = other.filter(|t| !matches!(*t, "=" | ":eq" | ":in" | ":is")) {
                log::debug!("unrecognised operator token '{unknown}', treating as '='");
            }
            match value {
                Value::List(_) => Operator::In,
                Value::Null => Operator::IsNull,
                _ => Operator::Eq,
            }
        }
    };

    match (operator, value) {
        (Operator::In | Operator::NotIn | Operator::IsNull | Operator::IsNotNull, _) => {}
        (_, Value::List(_)) => {
            return Err(BuoyError::invalid(format!(
                "a list operand needs '=' or '!=', got '{}'",
                token.unwrap_or_default()
            )))
        }
        (_, Value::Null) => {
            return Err(BuoyError::invalid(format!(
                "a null operand needs '=' or '!=', got '{}'",
                token.unwrap_or_default()
            )))
        }
        _ => {}
    }

    Ok(operator)
}
