use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::io::store::StoreError;
use crate::model::{Brand, Category, Id, Relation, Resource, Subcategory, Supercategory, Taxonomy};
use crate::ops::query::QueryEnvelope;

/// Error type for Collection API calls
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("{resource}/{id} not found")]
    NotFound { resource: Resource, id: Id },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl ApiError {
    /// Map a store failure the way the HTTP server would report it
    pub fn from_store(resource: Resource, id: Option<Id>, err: StoreError) -> Self {
        match (err, id) {
            (StoreError::NotFound { .. }, Some(id)) => ApiError::NotFound { resource, id },
            (err, _) => ApiError::Status {
                status: err.status_code(),
                message: err.to_string(),
            },
        }
    }
}

/// One page of a collection plus the total number of matching records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub items: Vec<Value>,
    pub total: usize,
}

impl ListPage {
    /// Deserialize the raw items into typed records
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>, ApiError> {
        self.items
            .iter()
            .map(|v| serde_json::from_value(v.clone()).map_err(ApiError::from))
            .collect()
    }
}

/// The keyed, paginated, filterable resource store behind the console.
///
/// Implemented over HTTP ([`crate::io::http::HttpApi`]) and in-process over a
/// dataset file ([`crate::io::local::LocalApi`]).
pub trait CollectionApi: Send + Sync {
    fn list(&self, resource: Resource, query: &QueryEnvelope) -> Result<ListPage, ApiError>;

    fn get(&self, resource: Resource, id: Id, expand: &[Relation]) -> Result<Value, ApiError>;

    /// Create a record; the server assigns the id
    fn create(&self, resource: Resource, body: &Value) -> Result<Value, ApiError>;

    /// Merge `body` into the stored record
    fn update(&self, resource: Resource, id: Id, body: &Value) -> Result<Value, ApiError>;

    fn delete(&self, resource: Resource, id: Id) -> Result<(), ApiError>;
}

/// Every record of a collection, typed
pub fn fetch_all<T: DeserializeOwned>(
    api: &dyn CollectionApi,
    resource: Resource,
) -> Result<Vec<T>, ApiError> {
    api.list(resource, &QueryEnvelope::all())?.decode()
}

/// Load brands and the category tree for the filter selectors and the form
pub fn load_taxonomy(api: &dyn CollectionApi) -> Result<Taxonomy, ApiError> {
    Ok(Taxonomy {
        brands: fetch_all::<Brand>(api, Resource::Brands)?,
        supercategories: fetch_all::<Supercategory>(api, Resource::Supercategories)?,
        categories: fetch_all::<Category>(api, Resource::Categories)?,
        subcategories: fetch_all::<Subcategory>(api, Resource::Subcategories)?,
    })
}

/// Parse an `X-Total-Count` header value, falling back to the item count
pub fn parse_total(header: Option<&str>, item_count: usize) -> usize {
    header
        .and_then(|h| h.trim().parse().ok())
        .unwrap_or(item_count)
}
