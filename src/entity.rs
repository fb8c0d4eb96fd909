//! Entity metadata.
//!
//! An [`Entity`] describes its table and fields once through [`EntityMeta`];
//! the [`MetadataRegistry`] resolves that description lazily and caches it per
//! entity type. The mapper uses it to validate data dictionaries before INSERT
//! and UPDATE and to find the primary key.

use crate::error::{BuoyError, Result};
use crate::query::condition::Criteria;
use crate::statement::InsertOptions;
use crate::value::{Record, Value};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    Bool,
    Text,
    DateTime,
    Uuid,
    Json,
}

impl FieldKind {
    /// Whether `value` can be stored in a field of this kind. NULL always can.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldKind::Int, Value::Int(_)) => true,
            (FieldKind::Float, Value::Float(_) | Value::Int(_)) => true,
            (FieldKind::Bool, Value::Bool(_)) => true,
            (FieldKind::Text, Value::Text(_)) => true,
            (FieldKind::DateTime, Value::DateTime(_) | Value::Text(_)) => true,
            (FieldKind::Uuid, Value::Uuid(_) | Value::Text(_)) => true,
            (FieldKind::Json, Value::List(_)) => false,
            (FieldKind::Json, _) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMeta {
    pub name: String,
    pub kind: FieldKind,
    pub default: Option<Value>,
    pub required: bool,
    pub primary: bool,
    /// Generated by the database (serial, identity or sequence)
    pub serial: bool,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            required: false,
            primary: false,
            serial: false,
        }
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Primary key generated by the database.
    pub fn serial(mut self) -> Self {
        self.primary = true;
        self.serial = true;
        self
    }
}

/// Table and field description of one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMeta {
    pub table: String,
    pub fields: Vec<FieldMeta>,
    /// Explicit sequence behind the primary key
    pub sequence: Option<String>,
}

impl EntityMeta {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            sequence: None,
        }
    }

    pub fn field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }

    pub fn sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }

    pub fn field_named(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn primary_key(&self) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.primary)
    }

    fn require_primary_key(&self) -> Result<&FieldMeta> {
        self.primary_key().ok_or_else(|| {
            BuoyError::invalid(format!("entity '{}' has no primary key field", self.table))
        })
    }

    /// Rejects unknown fields and values of the wrong kind.
    pub fn validate_data(&self, data: &Criteria) -> Result<()> {
        for (name, value) in data.iter() {
            let field = self.field_named(name).ok_or_else(|| {
                BuoyError::invalid(format!("'{name}' is not a field of '{}'", self.table))
            })?;
            if !field.kind.accepts(value) {
                return Err(BuoyError::invalid(format!(
                    "'{}.{name}' cannot hold a {} value",
                    self.table,
                    value.kind()
                )));
            }
        }
        Ok(())
    }

    /// Data dictionary for INSERT: defaults applied, a missing generated key left out.
    pub fn insert_data(&self, record: &Record) -> Result<Criteria> {
        self.validate_data(record)?;
        let mut data = Criteria::new();
        for field in &self.fields {
            let value = match record.get(&field.name) {
                Some(v) if !v.is_null() => v.clone(),
                _ if field.serial => continue,
                _ => match &field.default {
                    Some(default) => default.clone(),
                    None if field.required => {
                        return Err(BuoyError::invalid(format!(
                            "'{}.{}' is required",
                            self.table, field.name
                        )))
                    }
                    None if record.contains_key(&field.name) => Value::Null,
                    None => continue,
                },
            };
            data.insert(field.name.clone(), value);
        }
        Ok(data)
    }

    /// Data dictionary and key criteria for UPDATE of one entity.
    pub fn update_data(&self, record: &Record) -> Result<(Criteria, Criteria)> {
        self.validate_data(record)?;
        let key = self.key_criteria(record)?;
        let mut data = Criteria::new();
        for (name, value) in record.iter() {
            if key.contains_key(name) {
                continue;
            }
            if value.is_null() && self.field_named(name).is_some_and(|f| f.required) {
                return Err(BuoyError::invalid(format!(
                    "'{}.{name}' is required",
                    self.table
                )));
            }
            data.insert(name, value.clone());
        }
        Ok((data, key))
    }

    /// `pk = value` criteria for one entity.
    pub fn key_criteria(&self, record: &Record) -> Result<Criteria> {
        let pk = self.require_primary_key()?;
        match record.get(&pk.name) {
            Some(value) if !value.is_null() => Ok(Criteria::new().with(pk.name.clone(), value.clone())),
            _ => Err(BuoyError::invalid(format!(
                "'{}.{}' must be set to address a single row",
                self.table, pk.name
            ))),
        }
    }

    /// Whether the record has no key yet and the database would generate one.
    pub fn is_new(&self, record: &Record) -> bool {
        match self.primary_key() {
            Some(pk) => pk.serial && record.get(&pk.name).map_or(true, Value::is_null),
            None => true,
        }
    }

    pub fn insert_options(&self) -> InsertOptions {
        let Some(pk) = self.primary_key() else {
            return InsertOptions::default();
        };
        if !pk.serial {
            return InsertOptions {
                pk: Some(pk.name.clone()),
                ..Default::default()
            };
        }
        let options = InsertOptions::serial(pk.name.clone());
        match &self.sequence {
            Some(sequence) => options.with_sequence(sequence.clone()),
            None => options,
        }
    }
}

/// A type persisted through the mapper.
pub trait Entity: Sized + 'static {
    fn meta() -> EntityMeta;

    /// Field values, keyed by field name.
    fn to_record(&self) -> Record;

    fn from_record(record: Record) -> Result<Self>;
}

/// Per-type cache of [`EntityMeta`], populated on first use.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entries: RwLock<HashMap<TypeId, Arc<EntityMeta>>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Entity>(&self) -> Arc<EntityMeta> {
        let id = TypeId::of::<T>();
        if let Some(meta) = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
        {
            return Arc::clone(meta);
        }
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(entries.entry(id).or_insert_with(|| {
            log::debug!("resolving metadata for {}", std::any::type_name::<T>());
            Arc::new(T::meta())
        }))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
