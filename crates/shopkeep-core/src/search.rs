// ── Incremental catalog search ──
//
// Derives a filtered view of the catalog from a live query. Filtering is
// synchronous; the `settling` flag drives the renderer's busy indicator
// and drops back to false one debounce window after the last trigger.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::catalog::CatalogSync;
use crate::config::DEFAULT_SEARCH_DEBOUNCE;
use crate::model::{CatalogSnapshot, ProductList};
use crate::stream::Feed;
use crate::subscription::{Subscription, lock};

/// What a renderer needs to draw the search results.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    /// The query as typed.
    pub query: String,
    /// Latest snapshot filtered by `query`, in snapshot order.
    pub filtered: ProductList,
    /// A recent trigger has not settled yet.
    pub settling: bool,
}

/// Cheaply cloneable handle to the search service.
#[derive(Clone)]
pub struct CatalogSearch {
    inner: Arc<SearchInner>,
}

struct SearchInner {
    debounce: Duration,
    state: watch::Sender<SearchState>,
    control: Mutex<Control>,
}

#[derive(Default)]
struct Control {
    query: String,
    items: ProductList,
    generation: u64,
    timer: Option<CancellationToken>,
}

impl Default for CatalogSearch {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEBOUNCE)
    }
}

impl CatalogSearch {
    pub fn new(debounce: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            inner: Arc::new(SearchInner {
                debounce,
                state,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    /// Change the query. Must be called within a Tokio runtime.
    pub fn set_query(&self, query: &str) {
        let mut control = lock(&self.inner.control);
        query.clone_into(&mut control.query);
        self.refresh(&mut control, true);
    }

    /// Feed a new catalog snapshot. Settles only while a query is active.
    pub fn apply_snapshot(&self, snapshot: &CatalogSnapshot) {
        let mut control = lock(&self.inner.control);
        control.items = Arc::clone(&snapshot.items);
        let settle = !control.query.trim().is_empty();
        self.refresh(&mut control, settle);
    }

    /// Forward every snapshot of `catalog` into this search, starting with
    /// the latest one. Must be called within a Tokio runtime.
    pub fn attach(&self, catalog: &CatalogSync) -> Subscription {
        let token = CancellationToken::new();
        let mut feed = catalog.feed();
        if let Some(snapshot) = feed.current() {
            self.apply_snapshot(snapshot);
        }

        let search: Weak<SearchInner> = Arc::downgrade(&self.inner);
        let cancel = token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    next = feed.changed() => {
                        let Some(next) = next else { break };
                        let Some(inner) = search.upgrade() else { break };
                        if let Some(snapshot) = next {
                            CatalogSearch { inner }.apply_snapshot(&snapshot);
                        }
                    }
                }
            }
        });
        Subscription::new(token)
    }

    // ── Read access ──────────────────────────────────────────────────

    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    pub fn query(&self) -> String {
        self.inner.state.borrow().query.clone()
    }

    pub fn filtered(&self) -> ProductList {
        Arc::clone(&self.inner.state.borrow().filtered)
    }

    pub fn is_settling(&self) -> bool {
        self.inner.state.borrow().settling
    }

    pub fn feed(&self) -> Feed<SearchState> {
        Feed::new(self.inner.state.subscribe())
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn refresh(&self, control: &mut Control, settle: bool) {
        let filtered = filter(&control.items, &control.query);

        if settle {
            control.generation += 1;
            if let Some(previous) = control.timer.take() {
                previous.cancel();
            }
            let token = CancellationToken::new();
            control.timer = Some(token.clone());
            tokio::spawn(settle_after(
                Arc::downgrade(&self.inner),
                control.generation,
                token,
                self.inner.debounce,
            ));
        }

        let query = control.query.clone();
        self.inner.state.send_modify(|state| {
            state.query = query;
            state.filtered = filtered;
            state.settling = settle || state.settling;
        });
    }
}

/// Items whose name contains the trimmed query, ignoring case.
fn filter(items: &ProductList, query: &str) -> ProductList {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Arc::clone(items);
    }
    Arc::new(
        items
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect(),
    )
}

async fn settle_after(
    search: Weak<SearchInner>,
    generation: u64,
    token: CancellationToken,
    debounce: Duration,
) {
    tokio::select! {
        biased;
        () = token.cancelled() => {}
        () = tokio::time::sleep(debounce) => {
            let Some(inner) = search.upgrade() else { return };
            let mut control = lock(&inner.control);
            if control.generation == generation {
                control.timer = None;
                inner.state.send_modify(|state| state.settling = false);
                debug!("search settled");
            }
        }
    }
}
