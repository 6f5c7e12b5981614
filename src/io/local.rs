use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::io::api::{ApiError, CollectionApi, ListPage};
use crate::io::store::{CollectionQuery, Store, StoreError};
use crate::model::{Id, Relation, Resource};
use crate::ops::query::QueryEnvelope;

/// [`CollectionApi`] served in-process from a dataset file, with the same
/// query semantics as `catalog serve`.
#[derive(Debug, Clone)]
pub struct LocalApi {
    store: Arc<Mutex<Store>>,
}

impl LocalApi {
    pub fn new(store: Store) -> Self {
        LocalApi {
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(LocalApi::new(Store::load(path, false)?))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Transport("dataset lock poisoned".into()))
    }
}

fn expand_names(relations: &[Relation]) -> Vec<String> {
    relations.iter().map(|r| r.name().to_string()).collect()
}

impl CollectionApi for LocalApi {
    fn list(&self, resource: Resource, query: &QueryEnvelope) -> Result<ListPage, ApiError> {
        let parsed = CollectionQuery::from_pairs(&query.to_pairs())
            .map_err(|e| ApiError::from_store(resource, None, e))?;
        self.lock()?
            .list(resource.path(), &parsed)
            .map_err(|e| ApiError::from_store(resource, None, e))
    }

    fn get(&self, resource: Resource, id: Id, expand: &[Relation]) -> Result<Value, ApiError> {
        self.lock()?
            .get(resource.path(), &id.to_string(), &expand_names(expand))
            .map_err(|e| ApiError::from_store(resource, Some(id), e))
    }

    fn create(&self, resource: Resource, body: &Value) -> Result<Value, ApiError> {
        self.lock()?
            .create(resource.path(), body.clone())
            .map_err(|e| ApiError::from_store(resource, None, e))
    }

    fn update(&self, resource: Resource, id: Id, body: &Value) -> Result<Value, ApiError> {
        self.lock()?
            .update(resource.path(), &id.to_string(), body.clone())
            .map_err(|e| ApiError::from_store(resource, Some(id), e))
    }

    fn delete(&self, resource: Resource, id: Id) -> Result<(), ApiError> {
        self.lock()?
            .delete(resource.path(), &id.to_string())
            .map_err(|e| ApiError::from_store(resource, Some(id), e))
    }
}
