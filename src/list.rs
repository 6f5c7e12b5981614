//! List controller: filter state + query builder + fetch lifecycle.
//!
//! The controller owns a [`FilterState`], turns every change into a
//! [`QueryEnvelope`] and hands it to a [`Fetcher`] as a numbered [`Ticket`].
//! Fetches never block the caller; outcomes are drained with
//! [`ListController::poll`] and only the latest generation is applied.
//! Free-text search is debounced against injected time so the whole cycle is
//! deterministic under test.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::io::api::{ApiError, CollectionApi, ListPage};
use crate::model::{Dimension, Id, Resource, SortDirection};
use crate::ops::filters::FilterState;
use crate::ops::price::PricePreset;
use crate::ops::query::{ListSpec, QueryEnvelope, build_list_query};

/// Default quiet period before a typed search is sent
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(700);

/// A single list request
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub generation: u64,
    pub resource: Resource,
    pub query: QueryEnvelope,
}

/// The result of a ticket
#[derive(Debug)]
pub struct Outcome {
    pub generation: u64,
    pub result: Result<ListPage, ApiError>,
}

/// Runs tickets somewhere and reports their outcomes later.
pub trait Fetcher {
    /// Start a fetch. Must not block on the network.
    fn dispatch(&mut self, ticket: Ticket);

    /// Completed outcomes since the last call (may be empty)
    fn poll(&mut self) -> Vec<Outcome>;
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn dispatch(&mut self, ticket: Ticket) {
        (**self).dispatch(ticket)
    }

    fn poll(&mut self) -> Vec<Outcome> {
        (**self).poll()
    }
}

// ---------------------------------------------------------------------------
// Fetchers
// ---------------------------------------------------------------------------

/// Runs each ticket on its own worker thread and reports over a channel.
/// Dropping the fetcher discards results that have not arrived yet.
pub struct ThreadFetcher {
    api: Arc<dyn CollectionApi>,
    tx: mpsc::Sender<Outcome>,
    rx: mpsc::Receiver<Outcome>,
    cancelled: Arc<AtomicBool>,
}

impl ThreadFetcher {
    pub fn new(api: Arc<dyn CollectionApi>) -> Self {
        let (tx, rx) = mpsc::channel();
        ThreadFetcher {
            api,
            tx,
            rx,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Report a ticket whose worker never started as a failed fetch
    fn spawn_failed(&self, generation: u64, e: &std::io::Error) {
        tracing::error!(error = %e, generation, "could not spawn fetch worker");
        let _ = self.tx.send(Outcome {
            generation,
            result: Err(ApiError::Transport(format!("could not start fetch: {}", e))),
        });
    }
}

impl Fetcher for ThreadFetcher {
    fn dispatch(&mut self, ticket: Ticket) {
        let generation = ticket.generation;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let cancelled = Arc::clone(&self.cancelled);
        let spawned = thread::Builder::new()
            .name(format!("fetch-{}", ticket.generation))
            .spawn(move || {
                let result = api.list(ticket.resource, &ticket.query);
                if !cancelled.load(Ordering::Acquire) {
                    let _ = tx.send(Outcome {
                        generation: ticket.generation,
                        result,
                    });
                }
            });
        if let Err(e) = spawned {
            self.spawn_failed(generation, &e);
        }
    }

    fn poll(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            outcomes.push(outcome);
        }
        outcomes
    }
}

impl Drop for ThreadFetcher {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Runs each ticket during `dispatch` and queues the outcome for `poll`.
/// Used over a local dataset, where a list call is a memory operation.
pub struct InlineFetcher {
    api: Arc<dyn CollectionApi>,
    ready: VecDeque<Outcome>,
}

impl InlineFetcher {
    pub fn new(api: Arc<dyn CollectionApi>) -> Self {
        InlineFetcher {
            api,
            ready: VecDeque::new(),
        }
    }
}

impl Fetcher for InlineFetcher {
    fn dispatch(&mut self, ticket: Ticket) {
        let result = self.api.list(ticket.resource, &ticket.query);
        self.ready.push_back(Outcome {
            generation: ticket.generation,
            result,
        });
    }

    fn poll(&mut self) -> Vec<Outcome> {
        self.ready.drain(..).collect()
    }
}

/// Records tickets and lets the owner complete them in any order.
/// Clones share the same queues.
#[derive(Clone, Default)]
pub struct ManualFetcher {
    inner: Arc<Mutex<ManualQueues>>,
}

#[derive(Default)]
struct ManualQueues {
    dispatched: Vec<Ticket>,
    completed: VecDeque<Outcome>,
}

impl ManualFetcher {
    pub fn new() -> Self {
        ManualFetcher::default()
    }

    /// Every ticket dispatched so far, oldest first
    pub fn dispatched(&self) -> Vec<Ticket> {
        self.inner
            .lock()
            .map(|q| q.dispatched.clone())
            .unwrap_or_default()
    }

    pub fn complete(&self, generation: u64, result: Result<ListPage, ApiError>) {
        if let Ok(mut q) = self.inner.lock() {
            q.completed.push_back(Outcome { generation, result });
        }
    }
}

impl Fetcher for ManualFetcher {
    fn dispatch(&mut self, ticket: Ticket) {
        if let Ok(mut q) = self.inner.lock() {
            q.dispatched.push(ticket);
        }
    }

    fn poll(&mut self) -> Vec<Outcome> {
        self.inner
            .lock()
            .map(|mut q| q.completed.drain(..).collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Lifecycle of the latest fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error(String),
}

pub struct ListController<F: Fetcher> {
    spec: ListSpec,
    filters: FilterState,
    fetcher: F,
    debounce: Duration,
    /// What the user has typed; becomes the applied search after the debounce
    search_input: String,
    search_deadline: Option<Instant>,
    generation: u64,
    status: FetchStatus,
    items: Vec<Value>,
    total: usize,
}

impl<F: Fetcher> ListController<F> {
    pub fn new(spec: ListSpec, fetcher: F, page_size: usize) -> Self {
        ListController {
            spec,
            filters: FilterState::new(page_size),
            fetcher,
            debounce: SEARCH_DEBOUNCE,
            search_input: String::new(),
            search_deadline: None,
            generation: 0,
            status: FetchStatus::Idle,
            items: Vec::new(),
            total: 0,
        }
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn spec(&self) -> &ListSpec {
        &self.spec
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.search_deadline
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            FetchStatus::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// Items of the last successful fetch
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn decoded<T: DeserializeOwned>(&self) -> Result<Vec<T>, ApiError> {
        ListPage {
            items: self.items.clone(),
            total: self.total,
        }
        .decode()
    }

    /// Nothing typed and nothing changed since mount
    pub fn is_pristine(&self) -> bool {
        self.filters.is_pristine() && self.search_input.is_empty()
    }

    /// The envelope the next fetch would send
    pub fn current_query(&self) -> QueryEnvelope {
        build_list_query(
            &self.spec,
            self.filters.selection(),
            self.filters.pagination(),
            Some(self.filters.sort()),
        )
    }

    // -----------------------------------------------------------------------
    // Fetch lifecycle
    // -----------------------------------------------------------------------

    /// First fetch when the view is opened
    pub fn mount(&mut self) {
        self.fetch();
    }

    /// Refetch with unchanged filters
    pub fn refresh(&mut self) {
        self.fetch();
    }

    fn fetch(&mut self) {
        self.generation += 1;
        let ticket = Ticket {
            generation: self.generation,
            resource: self.spec.resource,
            query: self.current_query(),
        };
        tracing::debug!(
            resource = %ticket.resource,
            generation = ticket.generation,
            query = %ticket.query.to_query_string(),
            "fetch"
        );
        self.status = FetchStatus::Loading;
        self.fetcher.dispatch(ticket);
    }

    /// Apply finished fetches. Returns true when visible state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for outcome in self.fetcher.poll() {
            if outcome.generation != self.generation {
                tracing::debug!(
                    generation = outcome.generation,
                    latest = self.generation,
                    "discarding stale fetch"
                );
                continue;
            }
            match outcome.result {
                Ok(page) => {
                    self.items = page.items;
                    self.total = page.total;
                    self.status = FetchStatus::Success;
                }
                Err(e) => {
                    tracing::warn!(resource = %self.spec.resource, error = %e, "fetch failed");
                    self.status = FetchStatus::Error(e.to_string());
                }
            }
            changed = true;
        }
        changed
    }

    /// Send the typed search once the input has been quiet for the debounce
    /// period. Returns true when a fetch was issued.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.search_deadline else {
            return false;
        };
        if now < deadline {
            return false;
        }
        self.search_deadline = None;
        if self.search_input == self.filters.selection().search_text {
            return false;
        }
        self.filters.set_search_text(self.search_input.clone());
        self.fetch();
        true
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Record typed text and restart the debounce window
    pub fn set_search_text(&mut self, text: impl Into<String>, now: Instant) {
        self.search_input = text.into();
        self.search_deadline = Some(now + self.debounce);
    }

    /// Apply a filter transition and refetch immediately if anything changed
    pub fn update(&mut self, transition: impl FnOnce(&mut FilterState)) {
        let before = self.filters.clone();
        transition(&mut self.filters);
        if self.filters != before {
            self.fetch();
        }
    }

    pub fn set_filter_values(&mut self, dimension: Dimension, values: impl IntoIterator<Item = Id>) {
        self.update(|f| f.set_filter_values(dimension, values));
    }

    pub fn toggle_filter_value(&mut self, dimension: Dimension, value: Id) {
        self.update(|f| f.toggle_filter_value(dimension, value));
    }

    pub fn remove_filter_value(&mut self, dimension: Dimension, value: Id) {
        self.update(|f| f.remove_filter_value(dimension, value));
    }

    pub fn set_price_range(&mut self, min: Option<f64>, max: Option<f64>) {
        self.update(|f| f.set_price_range(min, max));
    }

    pub fn clear_price_range(&mut self) {
        self.update(|f| f.clear_price_range());
    }

    pub fn toggle_price_preset(&mut self, preset: PricePreset) {
        self.update(|f| f.toggle_price_preset(preset));
    }

    /// Clear every filter and the typed search, cancelling a pending search
    pub fn clear_all(&mut self) {
        self.search_input.clear();
        self.search_deadline = None;
        self.update(|f| f.clear_all());
    }

    pub fn set_page(&mut self, page_index: usize) {
        self.update(|f| f.set_page(page_index));
    }

    pub fn next_page(&mut self) {
        let p = self.filters.pagination();
        if p.page_index + 1 < p.page_count(self.total) {
            self.set_page(p.page_index + 1);
        }
    }

    pub fn prev_page(&mut self) {
        let p = self.filters.pagination();
        if p.page_index > 0 {
            self.set_page(p.page_index - 1);
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.update(|f| f.set_page_size(page_size));
    }

    pub fn set_sort(&mut self, field: impl Into<String>, direction: SortDirection) {
        let field = field.into();
        self.update(|f| f.set_sort(field, direction));
    }
}
