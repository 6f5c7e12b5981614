//! Mock Collection API server (`catalog serve`).
//!
//! Serves a dataset file over HTTP with the query semantics of
//! [`crate::io::store`]. Every response carries permissive CORS headers and
//! exposes `X-Total-Count` to browsers.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::io::store::{CollectionQuery, Store, StoreError};
use crate::io::watcher::DatasetWatcher;

const TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

/// How often the file watcher's queue is drained
const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Error type for running the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("could not watch dataset: {0}")]
    Watch(#[from] notify::Error),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for [`serve`]
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub db: PathBuf,
    pub watch: bool,
    pub read_only: bool,
}

/// Shared server state. The store lock is never held across an await.
pub struct AppState {
    store: Mutex<Store>,
}

impl AppState {
    pub fn new(store: Store) -> Arc<Self> {
        Arc::new(AppState {
            store: Mutex::new(store),
        })
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = if status == StatusCode::NOT_FOUND {
            json!({})
        } else {
            json!({ "error": self.to_string() })
        };
        (status, Json(body)).into_response()
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([TOTAL_COUNT]);

    Router::new()
        .route("/db", get(dump_db))
        .route("/{resource}", get(list_records).post(create_record))
        .route(
            "/{resource}/{id}",
            get(get_record)
                .put(update_record)
                .patch(update_record)
                .delete(delete_record),
        )
        .layer(TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO)))
        .layer(cors)
        .with_state(state)
}

/// Bind, optionally watch the dataset file, and serve until Ctrl-C.
pub async fn serve(options: ServeOptions) -> Result<(), ServerError> {
    let store = Store::load(&options.db, options.read_only)?;
    let state = AppState::new(store);

    if options.watch {
        spawn_reloader(&options.db, Arc::clone(&state))?;
    }

    let addr = format!("{}:{}", options.host, options.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::Bind {
            addr: addr.clone(),
            source: e,
        })?;
    let local: SocketAddr = listener.local_addr()?;
    tracing::info!(%local, db = %options.db.display(), read_only = options.read_only, "serving");
    eprintln!("Serving {} at http://{}", options.db.display(), local);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

fn spawn_reloader(db: &std::path::Path, state: Arc<AppState>) -> Result<(), ServerError> {
    let watcher = DatasetWatcher::start(db)?;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(WATCH_POLL_INTERVAL);
        loop {
            interval.tick().await;
            if watcher.poll().is_empty() {
                continue;
            }
            if let Err(e) = state.store().reload() {
                tracing::warn!(error = %e, "dataset reload failed; keeping previous data");
            }
        }
    });
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn parse_body(body: &Bytes) -> Result<Value, StoreError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| StoreError::InvalidBody(e.to_string()))?;
    if !value.is_object() {
        return Err(StoreError::InvalidBody("expected a JSON object".into()));
    }
    Ok(value)
}

/// Run a store write on the blocking pool; saving touches the disk.
async fn write_blocking<T, F>(state: &Arc<AppState>, write: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&mut Store) -> Result<T, StoreError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || write(&mut *state.store()))
        .await
        .map_err(|e| StoreError::Interrupted(e.to_string()))?
}

async fn dump_db(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.store().snapshot())
}

async fn list_records(
    State(state): State<Arc<AppState>>,
    Path(resource): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Response, StoreError> {
    let query = CollectionQuery::parse(raw.as_deref().unwrap_or(""))?;
    let page = state.store().list(&resource, &query)?;
    let mut response = Json(page.items).into_response();
    response
        .headers_mut()
        .insert(TOTAL_COUNT, HeaderValue::from(page.total));
    Ok(response)
}

async fn get_record(
    State(state): State<Arc<AppState>>,
    Path((resource, id)): Path<(String, String)>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, StoreError> {
    let query = CollectionQuery::parse(raw.as_deref().unwrap_or(""))?;
    let record = state.store().get(&resource, &id, &query.expand)?;
    Ok(Json(record))
}

async fn create_record(
    State(state): State<Arc<AppState>>,
    Path(resource): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), StoreError> {
    let body = parse_body(&body)?;
    let collection = resource.clone();
    let created = write_blocking(&state, move |store| store.create(&collection, body)).await?;
    tracing::info!(%resource, id = %created["id"], "created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_record(
    State(state): State<Arc<AppState>>,
    Path((resource, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Value>, StoreError> {
    let body = parse_body(&body)?;
    let updated = write_blocking(&state, move |store| store.update(&resource, &id, body)).await?;
    Ok(Json(updated))
}

async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Value>, StoreError> {
    let (collection, key) = (resource.clone(), id.clone());
    write_blocking(&state, move |store| store.delete(&collection, &key)).await?;
    tracing::info!(%resource, %id, "deleted");
    Ok(Json(json!({})))
}
