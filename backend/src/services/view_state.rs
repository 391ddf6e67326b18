//! Generation-tagged view state.
//!
//! Each view keeps the last successful result and an error banner. Every
//! refresh takes a new generation; a result that completes after a newer
//! refresh began is discarded (last request wins). Nothing is cancelled.
//!
//! States are retained per [`ViewKey`], so a failed refresh falls back only to
//! data loaded for the same account and coordinates.

use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::api::AccountId;
use crate::error::AnalyticsResult;
use crate::routes::detail::DetailView;
use crate::routes::request::RequestView;
use crate::routes::summary::SummaryView;

/// What a view shows after a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot<T> {
    /// Generation of the data currently shown.
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Banner of the last failed fetch, shown over `data`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The refresh that produced this snapshot was superseded.
    #[serde(default)]
    pub stale: bool,
}

/// Generation handed out by [`ViewState::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Shown<T> {
    generation: u64,
    data: Option<T>,
    error: Option<String>,
}

/// Last-request-wins state of one view.
#[derive(Debug)]
pub struct ViewState<T> {
    latest: AtomicU64,
    shown: RwLock<Shown<T>>,
}

impl<T: Clone> ViewState<T> {
    pub fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
            shown: RwLock::new(Shown {
                generation: 0,
                data: None,
                error: None,
            }),
        }
    }

    /// Start a new generation, superseding any refresh in flight.
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    pub fn snapshot(&self) -> ViewSnapshot<T> {
        let shown = self.shown.read();
        ViewSnapshot {
            generation: shown.generation,
            data: shown.data.clone(),
            error: shown.error.clone(),
            stale: false,
        }
    }

    /// Apply the outcome of the refresh tagged `ticket`.
    ///
    /// Stale outcomes are dropped and the current snapshot is returned with
    /// `stale` set. Recoverable failures set the banner and keep prior data;
    /// they are returned as errors only when there is no prior data to show.
    /// Other errors leave the state untouched and are returned.
    pub fn complete(
        &self,
        ticket: Ticket,
        outcome: AnalyticsResult<T>,
    ) -> AnalyticsResult<ViewSnapshot<T>> {
        let mut shown = self.shown.write();

        if !self.is_current(ticket) {
            debug!(
                "Discarding result of generation {} (latest {})",
                ticket.0,
                self.latest.load(Ordering::SeqCst)
            );
            return Ok(ViewSnapshot {
                generation: shown.generation,
                data: shown.data.clone(),
                error: shown.error.clone(),
                stale: true,
            });
        }

        match outcome {
            Ok(data) => {
                shown.generation = ticket.0;
                shown.data = Some(data);
                shown.error = None;
                info!("View refreshed to generation {}", ticket.0);
            }
            Err(err) if err.is_recoverable() => {
                warn!("Fetch for generation {} failed: {}", ticket.0, err);
                shown.error = Some(err.to_string());
                if shown.data.is_none() {
                    return Err(err);
                }
            }
            Err(err) => return Err(err),
        }

        Ok(ViewSnapshot {
            generation: shown.generation,
            data: shown.data.clone(),
            error: shown.error.clone(),
            stale: false,
        })
    }

    /// Run `load` under a new generation and apply its outcome.
    pub async fn refresh<F, Fut>(&self, load: F) -> AnalyticsResult<ViewSnapshot<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AnalyticsResult<T>>,
    {
        let ticket = self.begin();
        let outcome = load().await;
        self.complete(ticket, outcome)
    }
}

impl<T: Clone> Default for ViewState<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of one retained view: the account plus the coordinates the view
/// was requested with. Prior data is only ever shown for the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub account: AccountId,
    pub coordinates: String,
}

impl ViewKey {
    pub fn new(account: &AccountId, coordinates: impl Into<String>) -> Self {
        Self {
            account: account.clone(),
            coordinates: coordinates.into(),
        }
    }
}

/// Default number of retained views per view type.
pub const DEFAULT_VIEW_CAPACITY: usize = 256;

struct CacheEntries<T> {
    states: HashMap<ViewKey, Arc<ViewState<T>>>,
    order: VecDeque<ViewKey>,
}

/// Bounded map of view states of one type.
///
/// An entry is kept only once its key has produced data. When full, the
/// oldest entry is evicted.
pub struct ViewCache<T> {
    entries: Arc<RwLock<CacheEntries<T>>>,
    capacity: usize,
}

impl<T> Clone for ViewCache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            capacity: self.capacity,
        }
    }
}

impl<T: Clone> ViewCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(CacheEntries {
                states: HashMap::new(),
                order: VecDeque::new(),
            })),
            capacity: capacity.max(1),
        }
    }

    /// State of `key`, created on first use.
    pub fn state(&self, key: &ViewKey) -> Arc<ViewState<T>> {
        if let Some(state) = self.entries.read().states.get(key) {
            return Arc::clone(state);
        }

        let mut entries = self.entries.write();
        if let Some(state) = entries.states.get(key) {
            return Arc::clone(state);
        }
        while entries.states.len() >= self.capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            debug!("Evicting view {:?}", oldest);
            entries.states.remove(&oldest);
        }
        let state = Arc::new(ViewState::new());
        entries.states.insert(key.clone(), Arc::clone(&state));
        entries.order.push_back(key.clone());
        state
    }

    /// Refresh the view of `key`. Keys that end up with no data are dropped.
    pub async fn refresh<F, Fut>(
        &self,
        key: &ViewKey,
        load: F,
    ) -> AnalyticsResult<ViewSnapshot<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AnalyticsResult<T>>,
    {
        let state = self.state(key);
        let outcome = state.refresh(load).await;
        if outcome.is_err() && state.snapshot().data.is_none() {
            self.release(key, &state);
        }
        outcome
    }

    fn release(&self, key: &ViewKey, state: &Arc<ViewState<T>>) {
        let mut entries = self.entries.write();
        if entries
            .states
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, state))
        {
            entries.states.remove(key);
            entries.order.retain(|k| k != key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().states.is_empty()
    }
}

/// Retained summary, detail and request views.
#[derive(Clone)]
pub struct ViewRegistry {
    pub summary: ViewCache<SummaryView>,
    pub detail: ViewCache<DetailView>,
    pub requests: ViewCache<RequestView>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_VIEW_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            summary: ViewCache::new(capacity),
            detail: ViewCache::new(capacity),
            requests: ViewCache::new(capacity),
        }
    }

    /// Number of retained views across all view types.
    pub fn len(&self) -> usize {
        self.summary.len() + self.detail.len() + self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}
