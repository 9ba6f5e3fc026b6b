// Live catalog synchronization.
//
// CatalogSync is the single writer of the catalog snapshot. Each
// subscription owns a task that turns provider listings into numbered
// snapshots; replacing or cancelling the subscription stops that task.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use arc_swap::ArcSwap;
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::draft::ProductDraft;
use crate::error::CoreError;
use crate::model::{CatalogSnapshot, CollectionPath, Product};
use crate::notify::NotificationChannel;
use crate::pending::Pending;
use crate::provider::{CollectionStore, CollectionStream};
use crate::stream::Feed;
use crate::subscription::{Listener, Subscription, lock};

/// Lifecycle of the live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SyncStatus {
    /// Never subscribed.
    Idle,
    /// Subscribed, waiting for the first listing.
    Connecting,
    Live,
    /// The provider failed; nothing more will arrive.
    Faulted,
    Cancelled,
}

/// Cheaply cloneable handle to the catalog service.
#[derive(Clone)]
pub struct CatalogSync {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    store: Arc<dyn CollectionStore>,
    notifier: NotificationChannel,
    path: ArcSwap<CollectionPath>,
    snapshot: watch::Sender<Option<CatalogSnapshot>>,
    status: watch::Sender<SyncStatus>,
    active: Mutex<Option<CancellationToken>>,
    generation: AtomicU64,
    add_pending: AtomicBool,
}

impl SyncInner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    fn set_status(&self, generation: u64, status: SyncStatus) {
        if self.is_current(generation) {
            self.status.send_replace(status);
        }
    }
}

impl CatalogSync {
    /// Create the service bound to `path`. Nothing is fetched until
    /// [`subscribe`](Self::subscribe).
    pub fn new(
        store: Arc<dyn CollectionStore>,
        notifier: NotificationChannel,
        path: CollectionPath,
    ) -> Self {
        let (snapshot, _) = watch::channel(None);
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            inner: Arc::new(SyncInner {
                store,
                notifier,
                path: ArcSwap::from_pointee(path),
                snapshot,
                status,
                active: Mutex::new(None),
                generation: AtomicU64::new(0),
                add_pending: AtomicBool::new(false),
            }),
        }
    }

    /// The collection currently synchronized (and written by `add_product`).
    pub fn path(&self) -> Arc<CollectionPath> {
        self.inner.path.load_full()
    }

    // ── Subscription ─────────────────────────────────────────────────

    /// Subscribe to `path`, replacing any previous subscription.
    ///
    /// `on_snapshot` runs once per provider delivery, in delivery order.
    /// Revisions restart at 0. A provider failure is reported as
    /// [`CoreError::SubscriptionFault`] feedback and ends the
    /// subscription; call `subscribe` again to retry. Must be called
    /// within a Tokio runtime.
    pub fn subscribe(
        &self,
        path: CollectionPath,
        on_snapshot: impl FnMut(CatalogSnapshot) + Send + 'static,
    ) -> Subscription {
        let token = CancellationToken::new();
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;

        if let Some(previous) = lock(&self.inner.active).replace(token.clone()) {
            previous.cancel();
            debug!("replaced catalog subscription");
        }

        info!(path = %path, "subscribing to catalog");
        self.inner.path.store(Arc::new(path.clone()));
        self.inner.snapshot.send_replace(None);
        self.inner.status.send_replace(SyncStatus::Connecting);

        let listings = self.inner.store.subscribe_collection(&path);
        let listener = Listener::new(token.clone(), on_snapshot);
        tokio::spawn(sync_task(
            Arc::clone(&self.inner),
            generation,
            listings,
            listener,
            token.clone(),
        ));

        let weak: Weak<SyncInner> = Arc::downgrade(&self.inner);
        Subscription::with_hook(token, move || {
            if let Some(inner) = weak.upgrade() {
                if inner.is_current(generation) && !matches!(*inner.status.borrow(), SyncStatus::Faulted) {
                    inner.status.send_replace(SyncStatus::Cancelled);
                }
            }
        })
    }

    /// Cancel the active subscription, if any.
    pub fn unsubscribe(&self) {
        if let Some(token) = lock(&self.inner.active).take() {
            token.cancel();
            if !matches!(*self.inner.status.borrow(), SyncStatus::Faulted) {
                self.inner.status.send_replace(SyncStatus::Cancelled);
            }
        }
    }

    // ── Snapshot access ──────────────────────────────────────────────

    /// The last delivered snapshot of the current subscription.
    pub fn latest(&self) -> Option<CatalogSnapshot> {
        self.inner.snapshot.borrow().clone()
    }

    pub fn product(&self, id: &str) -> Option<Arc<Product>> {
        self.inner.snapshot.borrow().as_ref()?.get(id)
    }

    pub fn feed(&self) -> Feed<Option<CatalogSnapshot>> {
        Feed::new(self.inner.snapshot.subscribe())
    }

    pub fn status(&self) -> SyncStatus {
        *self.inner.status.borrow()
    }

    pub fn status_feed(&self) -> Feed<SyncStatus> {
        Feed::new(self.inner.status.subscribe())
    }

    /// Subscribed but no listing has arrived yet.
    pub fn is_loading(&self) -> bool {
        self.status() == SyncStatus::Connecting
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Validate `draft` and write it to the current collection.
    ///
    /// Nothing is inserted locally: the new product shows up with the
    /// next snapshot. Returns the store-assigned id.
    pub async fn add_product(&self, draft: &ProductDraft) -> Result<String, CoreError> {
        let _pending = Pending::acquire(&self.inner.add_pending, "Adding a product")?;

        let product = match draft.validate() {
            Ok(product) => product,
            Err(err) => {
                self.inner.notifier.error(err.to_string());
                return Err(err);
            }
        };

        let path = self.path();
        match self.inner.store.add_document(&path, &product).await {
            Ok(id) => {
                info!(path = %path, id = %id, "product added");
                self.inner.notifier.info("Product added successfully!");
                Ok(id)
            }
            Err(e) => {
                warn!(path = %path, error = %e, "product write rejected");
                self.inner.notifier.error("Failed to add product.");
                Err(CoreError::WriteRejected {
                    reason: e.to_string(),
                })
            }
        }
    }
}

async fn sync_task(
    inner: Arc<SyncInner>,
    generation: u64,
    mut listings: CollectionStream,
    listener: Listener<CatalogSnapshot>,
    token: CancellationToken,
) {
    let mut revision = 0u64;

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            next = listings.next() => match next {
                Some(Ok(items)) => {
                    if !inner.is_current(generation) {
                        break;
                    }
                    let snapshot = CatalogSnapshot::new(items, revision);
                    revision += 1;
                    debug!(revision = snapshot.revision, count = snapshot.len(), "catalog snapshot");

                    inner.snapshot.send_replace(Some(snapshot.clone()));
                    inner.set_status(generation, SyncStatus::Live);
                    if !listener.deliver(snapshot) {
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "catalog subscription faulted");
                    token.cancel();
                    if inner.is_current(generation) {
                        let fault = CoreError::SubscriptionFault {
                            message: e.to_string(),
                        };
                        inner.notifier.error(fault.to_string());
                        inner.set_status(generation, SyncStatus::Faulted);
                    }
                    break;
                }
                None => {
                    debug!("catalog stream ended");
                    inner.set_status(generation, SyncStatus::Cancelled);
                    token.cancel();
                    break;
                }
            },
        }
    }
}
