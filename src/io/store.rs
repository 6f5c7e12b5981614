//! In-memory dataset behind the mock Collection API.
//!
//! The dataset is a JSON object whose keys are collection names and whose
//! values are arrays of records. Queries follow the Collection API contract:
//! `_page`/`_limit`, `_sort`/`_order`, `_expand`, `<field>_like`,
//! `<field>_ne`, `<field>_gte`/`<field>_lte` and repeated `<field>=<value>`.

use std::cmp::Ordering;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::io::api::ListPage;
use crate::model::SortDirection;
use crate::ops::search::matches_all_like;

/// Page size used when `_page` is given without `_limit`
pub const DEFAULT_LIMIT: usize = 10;

/// Error type for dataset operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown collection \"{0}\"")]
    UnknownCollection(String),
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },
    #[error("{collection}/{id} already exists")]
    DuplicateId { collection: String, id: String },
    #[error("invalid body: {0}")]
    InvalidBody(String),
    #[error("bad query: {0}")]
    BadQuery(String),
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("invalid dataset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("write did not finish: {0}")]
    Interrupted(String),
}

impl StoreError {
    /// HTTP status the server answers with
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::UnknownCollection(_) | StoreError::NotFound { .. } => 404,
            StoreError::DuplicateId { .. } => 409,
            StoreError::InvalidBody(_) | StoreError::BadQuery(_) => 400,
            StoreError::ReadError { .. }
            | StoreError::WriteError { .. }
            | StoreError::Json(_)
            | StoreError::Interrupted(_) => 500,
        }
    }
}

// ---------------------------------------------------------------------------
// Query parsing
// ---------------------------------------------------------------------------

/// A parsed list query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionQuery {
    pub expand: Vec<String>,
    pub like: Vec<(String, String)>,
    pub eq: IndexMap<String, Vec<String>>,
    pub ne: Vec<(String, String)>,
    pub gte: Vec<(String, f64)>,
    pub lte: Vec<(String, f64)>,
    pub sort: Vec<(String, SortDirection)>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl CollectionQuery {
    /// Parse decoded `(key, value)` pairs. Unknown `_` parameters are ignored.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, StoreError> {
        let mut query = CollectionQuery::default();
        let mut sort_fields: Vec<String> = Vec::new();
        let mut sort_orders: Vec<SortDirection> = Vec::new();

        for (key, value) in pairs {
            match key.as_str() {
                "_page" => query.page = Some(parse_count(key, value)?),
                "_limit" => query.limit = Some(parse_count(key, value)?),
                "_expand" => query.expand.push(value.clone()),
                "_sort" => sort_fields.extend(split_list(value)),
                "_order" => {
                    for order in split_list(value) {
                        let dir = order.parse::<SortDirection>().map_err(StoreError::BadQuery)?;
                        sort_orders.push(dir);
                    }
                }
                k if k.starts_with('_') => {}
                k => {
                    if let Some(field) = k.strip_suffix("_like") {
                        query.like.push((field.to_string(), value.clone()));
                    } else if let Some(field) = k.strip_suffix("_ne") {
                        query.ne.push((field.to_string(), value.clone()));
                    } else if let Some(field) = k.strip_suffix("_gte") {
                        query.gte.push((field.to_string(), parse_bound(k, value)?));
                    } else if let Some(field) = k.strip_suffix("_lte") {
                        query.lte.push((field.to_string(), parse_bound(k, value)?));
                    } else {
                        query.eq.entry(k.to_string()).or_default().push(value.clone());
                    }
                }
            }
        }

        query.sort = sort_fields
            .into_iter()
            .enumerate()
            .map(|(i, field)| (field, sort_orders.get(i).copied().unwrap_or_default()))
            .collect();
        Ok(query)
    }

    /// Parse a raw (still percent-encoded) query string
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let mut pairs = Vec::new();
        for part in raw.split('&').filter(|p| !p.is_empty()) {
            let (k, v) = part.split_once('=').unwrap_or((part, ""));
            pairs.push((decode_component(k)?, decode_component(v)?));
        }
        CollectionQuery::from_pairs(&pairs)
    }

    fn matches(&self, item: &Value) -> bool {
        let eq_ok = self.eq.iter().all(|(field, values)| {
            item.get(field)
                .map(scalar_text)
                .is_some_and(|text| values.iter().any(|v| *v == text))
        });
        let ne_ok = self.ne.iter().all(|(field, value)| {
            item.get(field).map(scalar_text).as_deref() != Some(value.as_str())
        });
        let like_ok = matches_all_like(item, &self.like);
        let gte_ok = self
            .gte
            .iter()
            .all(|(field, bound)| numeric(item.get(field)).is_some_and(|n| n >= *bound));
        let lte_ok = self
            .lte
            .iter()
            .all(|(field, bound)| numeric(item.get(field)).is_some_and(|n| n <= *bound));
        eq_ok && ne_ok && like_ok && gte_ok && lte_ok
    }

    /// `(offset, limit)` when the query is paged. An offset past `usize`
    /// saturates, which yields an empty page.
    fn window(&self) -> Option<(usize, usize)> {
        if self.page.is_none() && self.limit.is_none() {
            return None;
        }
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        Some(((page - 1).saturating_mul(limit), limit))
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_count(key: &str, value: &str) -> Result<usize, StoreError> {
    value
        .trim()
        .parse()
        .map_err(|_| StoreError::BadQuery(format!("{} must be a non-negative integer", key)))
}

fn parse_bound(key: &str, value: &str) -> Result<f64, StoreError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| StoreError::BadQuery(format!("{} must be a number", key)))
}

fn decode_component(raw: &str) -> Result<String, StoreError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|e| StoreError::BadQuery(e.to_string()))
}

/// Textual form of a scalar, used for equality filters and id lookups
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numeric(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Order for `_sort`: numbers numerically, strings by code point, numbers
/// before strings, missing and null values last.
fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            Some(Value::Number(_)) => 0,
            Some(Value::String(_)) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Null) | None => 4,
            Some(_) => 3,
        }
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Naive plural used to find the collection behind `_expand=<name>`
pub fn pluralize(name: &str) -> String {
    match name.strip_suffix('y') {
        Some(stem) => format!("{}ies", stem),
        None => format!("{}s", name),
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The dataset plus the file it was loaded from
#[derive(Debug, Clone, Default)]
pub struct Store {
    data: IndexMap<String, Value>,
    path: Option<PathBuf>,
    read_only: bool,
}

impl Store {
    /// An in-memory store that is never written to disk
    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        let data: IndexMap<String, Value> = serde_json::from_value(value)?;
        Ok(Store {
            data,
            path: None,
            read_only: true,
        })
    }

    /// Load a dataset file. Writes go back to the same file unless
    /// `read_only` is set.
    pub fn load(path: &Path, read_only: bool) -> Result<Self, StoreError> {
        let data = read_dataset(path)?;
        tracing::info!(path = %path.display(), collections = data.len(), "dataset loaded");
        Ok(Store {
            data,
            path: Some(path.to_path_buf()),
            read_only,
        })
    }

    /// Re-read the dataset file, keeping the current data if that fails
    pub fn reload(&mut self) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            self.data = read_dataset(path)?;
            tracing::info!(path = %path.display(), "dataset reloaded");
        }
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Names of the array-valued top-level keys
    pub fn collections(&self) -> Vec<&str> {
        self.data
            .iter()
            .filter(|(_, v)| v.is_array())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// The whole dataset, as served by `GET /db`
    pub fn snapshot(&self) -> Value {
        Value::Object(self.data.clone().into_iter().collect::<Map<String, Value>>())
    }

    fn records(&self, collection: &str) -> Result<&Vec<Value>, StoreError> {
        self.data
            .get(collection)
            .and_then(Value::as_array)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))
    }

    fn records_mut(&mut self, collection: &str) -> Result<&mut Vec<Value>, StoreError> {
        self.data
            .get_mut(collection)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))
    }

    fn not_found(collection: &str, id: &str) -> StoreError {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Filter, sort, count, paginate, then expand.
    pub fn list(&self, collection: &str, query: &CollectionQuery) -> Result<ListPage, StoreError> {
        let records = self.records(collection)?;
        let mut matched: Vec<&Value> = records.iter().filter(|item| query.matches(item)).collect();

        if !query.sort.is_empty() {
            matched.sort_by(|a, b| {
                for (field, direction) in &query.sort {
                    let ord = compare_field(a.get(field), b.get(field));
                    let ord = match direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let total = matched.len();
        let page: Vec<&Value> = match query.window() {
            Some((offset, limit)) => matched.into_iter().skip(offset).take(limit).collect(),
            None => matched,
        };

        let items = page
            .into_iter()
            .map(|item| self.expand(item.clone(), &query.expand))
            .collect();
        Ok(ListPage { items, total })
    }

    pub fn get(&self, collection: &str, id: &str, expand: &[String]) -> Result<Value, StoreError> {
        let records = self.records(collection)?;
        let item = records
            .iter()
            .find(|item| has_id(item, id))
            .ok_or_else(|| Store::not_found(collection, id))?;
        Ok(self.expand(item.clone(), expand))
    }

    /// Inline `<name>` from the `<name>s` collection via `<name>Id`.
    /// Missing targets leave the item unchanged.
    fn expand(&self, mut item: Value, relations: &[String]) -> Value {
        for name in relations {
            let Some(foreign_id) = item.get(format!("{}Id", name)).map(scalar_text) else {
                continue;
            };
            let target = self
                .records(&pluralize(name))
                .ok()
                .and_then(|records| records.iter().find(|r| has_id(r, &foreign_id)))
                .cloned();
            if let (Some(target), Some(obj)) = (target, item.as_object_mut()) {
                obj.insert(name.clone(), target);
            }
        }
        item
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Run a mutation and persist it. If saving fails the in-memory data is
    /// put back, so readers never see a write the file does not have.
    fn commit<T>(
        &mut self,
        mutate: impl FnOnce(&mut Self) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let before = self.data.clone();
        let out = mutate(self)?;
        if let Err(e) = self.save() {
            self.data = before;
            return Err(e);
        }
        Ok(out)
    }

    /// Insert a record. Without an id it gets `max(numeric ids) + 1`.
    pub fn create(&mut self, collection: &str, body: Value) -> Result<Value, StoreError> {
        let Value::Object(fields) = body else {
            return Err(StoreError::InvalidBody("expected a JSON object".into()));
        };
        self.commit(|store| store.insert(collection, fields))
    }

    fn insert(&mut self, collection: &str, fields: Map<String, Value>) -> Result<Value, StoreError> {
        let records = self.records_mut(collection)?;

        let id = match fields.get("id") {
            Some(id) if !id.is_null() => {
                let text = scalar_text(id);
                if records.iter().any(|r| has_id(r, &text)) {
                    return Err(StoreError::DuplicateId {
                        collection: collection.to_string(),
                        id: text,
                    });
                }
                id.clone()
            }
            _ => Value::from(next_id(records)),
        };

        let mut record = Map::new();
        record.insert("id".to_string(), id);
        for (k, v) in fields {
            if k != "id" {
                record.insert(k, v);
            }
        }
        let record = Value::Object(record);
        records.push(record.clone());
        Ok(record)
    }

    /// Merge `body` into an existing record. The id never changes.
    pub fn update(&mut self, collection: &str, id: &str, body: Value) -> Result<Value, StoreError> {
        let Value::Object(fields) = body else {
            return Err(StoreError::InvalidBody("expected a JSON object".into()));
        };
        self.commit(|store| {
            let record = store
                .records_mut(collection)?
                .iter_mut()
                .find(|r| has_id(r, id))
                .ok_or_else(|| Store::not_found(collection, id))?;
            if let Some(obj) = record.as_object_mut() {
                for (k, v) in fields {
                    if k != "id" {
                        obj.insert(k, v);
                    }
                }
            }
            Ok(record.clone())
        })
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.commit(|store| {
            let records = store.records_mut(collection)?;
            let index = records
                .iter()
                .position(|r| has_id(r, id))
                .ok_or_else(|| Store::not_found(collection, id))?;
            records.remove(index);
            Ok(())
        })
    }

    /// Persist to the dataset file (atomic replace). No-op when read-only.
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if self.read_only {
            return Ok(());
        }
        let mut content = serde_json::to_vec_pretty(&self.data)?;
        content.push(b'\n');
        atomic_write(path, &content).map_err(|e| StoreError::WriteError {
            path: path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "dataset saved");
        Ok(())
    }
}

fn has_id(record: &Value, id: &str) -> bool {
    record.get("id").map(scalar_text).as_deref() == Some(id)
}

fn next_id(records: &[Value]) -> u64 {
    records
        .iter()
        .filter_map(|r| match r.get("id")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
        .max()
        .map_or(1, |max| max + 1)
}

fn read_dataset(path: &Path) -> Result<IndexMap<String, Value>, StoreError> {
    let text = fs::read_to_string(path).map_err(|e| StoreError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Write to a temp file next to `path`, then rename over it.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
