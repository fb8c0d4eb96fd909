//! Entity-level CRUD on top of the [`Adapter`].

use crate::adapter::Adapter;
use crate::entity::{Entity, MetadataRegistry};
use crate::error::Result;
use crate::executor::Executor;
use crate::query::builder::Query;
use crate::query::condition::Criteria;
use crate::query::methods::MethodRegistry;
use crate::value::Value;
use std::sync::Arc;

/// Maps [`Entity`] types to rows through one adapter.
///
/// The metadata and method registries are shared handles owned by the
/// application, so several mappers can use the same ones.
pub struct Mapper<E: Executor> {
    adapter: Adapter<E>,
    registry: Arc<MetadataRegistry>,
    methods: Arc<MethodRegistry>,
}

impl<E: Executor> Mapper<E> {
    pub fn new(adapter: Adapter<E>) -> Self {
        Self {
            adapter,
            registry: Arc::new(MetadataRegistry::new()),
            methods: Arc::new(MethodRegistry::new()),
        }
    }

    pub fn with_registry(mut self, registry: Arc<MetadataRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Custom verbs attached to every query this mapper creates.
    pub fn with_methods(mut self, methods: Arc<MethodRegistry>) -> Self {
        self.methods = methods;
        self
    }

    pub fn adapter(&self) -> &Adapter<E> {
        &self.adapter
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// New query over `T`'s table.
    pub fn query<T: Entity>(&self) -> Query {
        Query::new(self.registry.get::<T>().table.clone()).with_methods(Arc::clone(&self.methods))
    }

    pub fn find<T: Entity>(&self, query: &Query) -> Result<Vec<T>> {
        self.adapter
            .read_entities(query)?
            .into_iter()
            .map(T::from_record)
            .collect()
    }

    /// Every row matching `criteria`.
    pub fn all<T: Entity>(&self, criteria: impl Into<Criteria>) -> Result<Vec<T>> {
        let mut query = self.query::<T>();
        query.filter(criteria);
        self.find(&query)
    }

    pub fn first<T: Entity>(&self, criteria: impl Into<Criteria>) -> Result<Option<T>> {
        let mut query = self.query::<T>();
        query.first(&self.adapter, criteria)?.map(T::from_record).transpose()
    }

    pub fn count<T: Entity>(&self, criteria: impl Into<Criteria>) -> Result<u64> {
        let mut query = self.query::<T>();
        query.filter(criteria);
        self.adapter.count(&query)
    }

    /// Insert `entity`, returning the generated key when the table has one.
    pub fn insert<T: Entity>(&self, entity: &T) -> Result<Option<Value>> {
        let meta = self.registry.get::<T>();
        let data = meta.insert_data(&entity.to_record())?;
        self.adapter.create(&meta.table, &data, &meta.insert_options())
    }

    /// Update `entity`'s row by primary key. `false` when there was nothing to write.
    pub fn update<T: Entity>(&self, entity: &T) -> Result<bool> {
        let meta = self.registry.get::<T>();
        let (data, key) = meta.update_data(&entity.to_record())?;
        self.adapter.update(&meta.table, &data, key)
    }

    /// Insert when the database still has to generate the key, update otherwise.
    ///
    /// Returns the entity's key.
    pub fn save<T: Entity>(&self, entity: &T) -> Result<Option<Value>> {
        let meta = self.registry.get::<T>();
        let record = entity.to_record();
        if meta.is_new(&record) {
            return self.insert(entity);
        }
        self.update(entity)?;
        let key = meta.key_criteria(&record)?;
        Ok(key.into_iter().next().map(|(_, v)| v))
    }

    pub fn delete<T: Entity>(&self, criteria: impl Into<Criteria>) -> Result<u64> {
        let meta = self.registry.get::<T>();
        let criteria: Criteria = criteria.into();
        self.adapter.delete(&meta.table, criteria)
    }

    /// Delete `entity`'s row by primary key.
    pub fn delete_entity<T: Entity>(&self, entity: &T) -> Result<u64> {
        let meta = self.registry.get::<T>();
        let key = meta.key_criteria(&entity.to_record())?;
        self.adapter.delete(&meta.table, key)
    }

    /// Run `work` inside BEGIN/COMMIT; an error rolls back and is returned.
    pub fn transaction<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.adapter.within_transaction(|| work(self))
    }
}
