use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;

use crate::io::api::{ApiError, CollectionApi, ListPage, parse_total};
use crate::model::{Id, Relation, Resource};
use crate::ops::query::QueryEnvelope;

/// Header carrying the number of matching records
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// [`CollectionApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, resource: Resource) -> String {
        format!("{}/{}", self.base_url, resource.path())
    }

    fn record_url(&self, resource: Resource, id: Id) -> String {
        format!("{}/{}/{}", self.base_url, resource.path(), id)
    }

    fn send(
        &self,
        request: RequestBuilder,
        resource: Resource,
        id: Option<Id>,
    ) -> Result<Response, ApiError> {
        let response = request.send()?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), url = %response.url(), "response");
        if status.is_success() {
            return Ok(response);
        }
        if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
            return Err(ApiError::NotFound { resource, id });
        }
        let message = response.text().unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: if message.trim().is_empty() {
                status.canonical_reason().unwrap_or("error").to_string()
            } else {
                message
            },
        })
    }
}

impl CollectionApi for HttpApi {
    fn list(&self, resource: Resource, query: &QueryEnvelope) -> Result<ListPage, ApiError> {
        let qs = query.to_query_string();
        let url = if qs.is_empty() {
            self.collection_url(resource)
        } else {
            format!("{}?{}", self.collection_url(resource), qs)
        };
        tracing::debug!(%url, "list");
        let response = self.send(self.client.get(&url), resource, None)?;
        let header = response
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let items: Vec<Value> = serde_json::from_str(&response.text()?)?;
        let total = parse_total(header.as_deref(), items.len());
        Ok(ListPage { items, total })
    }

    fn get(&self, resource: Resource, id: Id, expand: &[Relation]) -> Result<Value, ApiError> {
        let expand = QueryEnvelope::all().with_expand(expand).to_query_string();
        let mut url = self.record_url(resource, id);
        if !expand.is_empty() {
            url = format!("{}?{}", url, expand);
        }
        let response = self.send(self.client.get(&url), resource, Some(id))?;
        Ok(serde_json::from_str(&response.text()?)?)
    }

    fn create(&self, resource: Resource, body: &Value) -> Result<Value, ApiError> {
        let request = self.client.post(self.collection_url(resource)).json(body);
        let response = self.send(request, resource, None)?;
        Ok(serde_json::from_str(&response.text()?)?)
    }

    fn update(&self, resource: Resource, id: Id, body: &Value) -> Result<Value, ApiError> {
        let request = self.client.put(self.record_url(resource, id)).json(body);
        let response = self.send(request, resource, Some(id))?;
        Ok(serde_json::from_str(&response.text()?)?)
    }

    fn delete(&self, resource: Resource, id: Id) -> Result<(), ApiError> {
        self.send(
            self.client.delete(self.record_url(resource, id)),
            resource,
            Some(id),
        )?;
        Ok(())
    }
}
