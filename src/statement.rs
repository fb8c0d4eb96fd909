//! Statement assembler.
//!
//! Turns a [`QueryState`] (or a data dictionary plus conditions) into SQL text
//! with `:name` placeholders and the matching [`BindMap`]. Clause syntax comes
//! from the [`Dialect`]; predicates come from the [`ConditionCompiler`].

use crate::dialect::Dialect;
use crate::error::{BuoyError, Result};
use crate::query::bind::{compile_binds, param_name, BindMap};
use crate::query::builder::QueryState;
use crate::query::compiler::{render_column, ConditionCompiler};
use crate::query::condition::{ColumnSpec, Conditions, Criteria};

/// Compiled SQL plus its binds.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: BindMap,
}

/// How INSERT treats the primary key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Primary key column
    pub pk: Option<String>,
    /// Key generated by the database; the new id is read back after the INSERT
    pub serial: bool,
    /// Sequence backing the key, if the engine uses explicit sequences
    pub sequence: Option<String>,
}

impl InsertOptions {
    pub fn serial(pk: impl Into<String>) -> Self {
        Self {
            pk: Some(pk.into()),
            serial: true,
            sequence: None,
        }
    }

    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }

    /// Whether the INSERT is followed by a last-insert-id lookup.
    pub fn returns_id(&self) -> bool {
        self.serial || self.sequence.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StatementAssembler<'a> {
    dialect: &'a dyn Dialect,
    datetime_format: &'a str,
    quote_identifiers: bool,
}

impl<'a> StatementAssembler<'a> {
    pub fn new(dialect: &'a dyn Dialect, datetime_format: &'a str) -> Self {
        Self {
            dialect,
            datetime_format,
            quote_identifiers: false,
        }
    }

    pub fn quote_identifiers(mut self, enabled: bool) -> Self {
        self.quote_identifiers = enabled;
        self
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    fn compiler(&self) -> ConditionCompiler<'a> {
        ConditionCompiler::new(self.dialect, self.datetime_format)
            .quote_identifiers(self.quote_identifiers)
    }

    fn require_datasource(state: &QueryState) -> Result<()> {
        if state.datasource.trim().is_empty() {
            return Err(BuoyError::invalid("query has no datasource, call from() first"));
        }
        Ok(())
    }

    /// `SELECT ... FROM ... [JOIN] [WHERE] [GROUP BY] [HAVING] [ORDER BY] [limit] [offset]`.
    ///
    /// HAVING placeholders continue the discriminator where WHERE stopped.
    pub fn select(&self, state: &QueryState) -> Result<Statement> {
        Self::require_datasource(state)?;
        let compiler = self.compiler();
        let where_ = compiler.compile(&state.conditions, 0)?;
        let having = compiler.compile(&state.having, where_.next_ci)?;

        let d = self.dialect;
        let sql = d.select(String::new(), &state.fields);
        let sql = d.from(sql, &state.datasource);
        let sql = d.join(sql, &state.joins);
        let sql = d.where_(sql, &where_.sql);
        let sql = d.group(sql, &state.group);
        let sql = d.having(sql, &having.sql);
        let sql = d.order(sql, &state.order);
        let sql = d.limit(sql, state.limit);
        let sql = d.offset(sql, state.offset, state.limit);

        let mut binds = where_.binds;
        binds.extend(having.binds);
        Ok(Statement { sql, binds })
    }

    /// `SELECT COUNT(*) AS count` over the same joins, conditions, group and having.
    pub fn count(&self, state: &QueryState) -> Result<Statement> {
        Self::require_datasource(state)?;
        let compiler = self.compiler();
        let where_ = compiler.compile(&state.conditions, 0)?;
        let having = compiler.compile(&state.having, where_.next_ci)?;

        let d = self.dialect;
        let sql = d.select(String::new(), &["COUNT(*) AS count".to_string()]);
        let sql = d.from(sql, &state.datasource);
        let sql = d.join(sql, &state.joins);
        let sql = d.where_(sql, &where_.sql);
        let sql = d.group(sql, &state.group);
        let sql = d.having(sql, &having.sql);

        let mut binds = where_.binds;
        binds.extend(having.binds);
        Ok(Statement { sql, binds })
    }

    /// `INSERT INTO t (a, b) VALUES (:a, :b)`.
    ///
    /// Engines with explicit sequences get the key column and the
    /// next-value expression prepended when the data does not carry the key.
    pub fn insert(&self, table: &str, data: &Criteria, options: &InsertOptions) -> Result<Statement> {
        if data.is_empty() {
            return Err(BuoyError::invalid(format!("nothing to insert into '{table}'")));
        }
        let binds = compile_binds(data, None, self.datetime_format)?;

        let mut columns = Vec::with_capacity(data.len() + 1);
        let mut values = Vec::with_capacity(data.len() + 1);

        if let (Some(pk), Some(sequence)) = (options.pk.as_deref(), options.sequence.as_deref()) {
            if !data.contains_key(pk) {
                if let Some(next) = self.dialect.next_sequence_value(sequence) {
                    columns.push(render_column(self.dialect, self.quote_identifiers, pk));
                    values.push(next);
                }
            }
        }

        for key in data.keys() {
            let spec = ColumnSpec::parse(key)?;
            columns.push(render_column(self.dialect, self.quote_identifiers, &spec.column));
            values.push(format!(":{}", param_name(&spec.column, None)));
        }

        Ok(Statement {
            sql: self.dialect.insert(table, &columns, &values),
            binds,
        })
    }

    /// `UPDATE t SET a = :a0 [WHERE ...]`, or `None` when there is nothing to set.
    ///
    /// SET binds take discriminators `0..len(data)`, WHERE binds continue after them.
    pub fn update(
        &self,
        table: &str,
        data: &Criteria,
        conditions: &Conditions,
    ) -> Result<Option<Statement>> {
        if data.is_empty() {
            return Ok(None);
        }
        let mut binds = compile_binds(data, Some(0), self.datetime_format)?;

        let mut assignments = Vec::with_capacity(data.len());
        for (ci, key) in data.keys().enumerate() {
            let spec = ColumnSpec::parse(key)?;
            let column = render_column(self.dialect, self.quote_identifiers, &spec.column);
            assignments.push(format!("{column} = :{}", param_name(&spec.column, Some(ci))));
        }

        let where_ = self.compiler().compile(conditions, data.len())?;
        let sql = self.dialect.update(table, &assignments);
        let sql = self.dialect.where_(sql, &where_.sql);
        binds.extend(where_.binds);
        Ok(Some(Statement { sql, binds }))
    }

    /// `DELETE FROM t [WHERE ...]`.
    pub fn delete(&self, table: &str, conditions: &Conditions) -> Result<Statement> {
        let where_ = self.compiler().compile(conditions, 0)?;
        let sql = self.dialect.where_(self.dialect.delete(table), &where_.sql);
        Ok(Statement {
            sql,
            binds: where_.binds,
        })
    }

    /// Statement reading back the generated key.
    ///
    /// A serial key without a named sequence falls back to the dialect's
    /// default sequence for `table`, if it has one.
    pub fn last_insert_id(&self, table: &str, options: &InsertOptions) -> String {
        let sequence = options.sequence.clone().or_else(|| {
            if options.serial {
                self.dialect.default_sequence(table)
            } else {
                None
            }
        });
        self.dialect.last_insert_id_sql(sequence.as_deref())
    }
}
