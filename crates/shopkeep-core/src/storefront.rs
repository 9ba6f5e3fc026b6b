// ── Storefront context ──
//
// Owns every service for one app instance. `init()` starts observing the
// session; signing in mounts the main scope (catalog sync + search),
// signing out tears it down. `teardown()` cancels everything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::catalog::CatalogSync;
use crate::config::StorefrontConfig;
use crate::error::CoreError;
use crate::model::{CollectionPath, Identity, Session};
use crate::navigation::Navigator;
use crate::notify::NotificationChannel;
use crate::provider::{AuthProvider, CollectionStore};
use crate::search::CatalogSearch;
use crate::session::SessionObserver;
use crate::stream::Feed;
use crate::subscription::{Subscription, lock};

/// Services that exist only while someone is signed in.
#[derive(Clone)]
pub struct MainScope {
    pub identity: Identity,
    pub catalog: CatalogSync,
    pub search: CatalogSearch,
}

impl std::fmt::Debug for MainScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainScope")
            .field("uid", &self.identity.uid)
            .field("status", &self.catalog.status())
            .finish_non_exhaustive()
    }
}

struct Mounted {
    scope: MainScope,
    subscriptions: Vec<Subscription>,
}

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<StorefrontInner>`. Providers are passed in
/// at construction; there are no globals.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    path: CollectionPath,
    store: Arc<dyn CollectionStore>,
    notifier: NotificationChannel,
    session: SessionObserver,
    navigator: Navigator,
    observer: Mutex<Option<Subscription>>,
    mounted: Mutex<Option<Mounted>>,
    /// Set by `teardown` under the `mounted` lock; blocks late mounts.
    torn_down: AtomicBool,
    main: watch::Sender<Option<MainScope>>,
}

impl Storefront {
    /// Create the context. Does NOT start anything; call
    /// [`init()`](Self::init) on mount.
    pub fn new(
        config: StorefrontConfig,
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn CollectionStore>,
    ) -> Result<Self, CoreError> {
        let path = config.collection_path()?;
        let notifier = NotificationChannel::new(config.feedback_duration);
        let session = SessionObserver::new(auth, notifier.clone());
        let (main, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                path,
                store,
                notifier,
                session,
                navigator: Navigator::new(),
                observer: Mutex::new(None),
                mounted: Mutex::new(None),
                torn_down: AtomicBool::new(false),
                main,
            }),
        })
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &SessionObserver {
        &self.inner.session
    }

    pub fn notifier(&self) -> &NotificationChannel {
        &self.inner.notifier
    }

    pub fn navigator(&self) -> &Navigator {
        &self.inner.navigator
    }

    /// The mounted main scope, while signed in.
    pub fn main(&self) -> Option<MainScope> {
        self.inner.main.borrow().clone()
    }

    pub fn main_feed(&self) -> Feed<Option<MainScope>> {
        Feed::new(self.inner.main.subscribe())
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start observing the session. Idempotent. Must be called within a
    /// Tokio runtime.
    pub fn init(&self) {
        let mut observer = lock(&self.inner.observer);
        if observer.is_some() {
            return;
        }
        {
            let _mounted = lock(&self.inner.mounted);
            self.inner.torn_down.store(false, Ordering::Release);
        }

        let weak: Weak<StorefrontInner> = Arc::downgrade(&self.inner);
        *observer = Some(self.inner.session.start(move |session| {
            if let Some(inner) = weak.upgrade() {
                inner.on_session(&session);
            }
        }));
        info!(tenant = %self.inner.config.tenant, "storefront started");
    }

    /// Cancel every subscription and return to the splash screen.
    pub fn teardown(&self) {
        if let Some(observer) = lock(&self.inner.observer).take() {
            observer.cancel();
        }
        let previous = {
            let mut mounted = lock(&self.inner.mounted);
            self.inner.torn_down.store(true, Ordering::Release);
            self.inner.take_mounted(&mut mounted)
        };
        StorefrontInner::release(previous);
        self.inner.navigator.on_session(&Session::Unknown);
        info!("storefront torn down");
    }
}

impl StorefrontInner {
    fn on_session(&self, session: &Session) {
        self.navigator.on_session(session);
        match session {
            Session::SignedIn(identity) => self.mount(identity),
            Session::SignedOut | Session::Unknown => self.unmount(),
        }
    }

    fn mount(&self, identity: &Identity) {
        let mut mounted = lock(&self.mounted);
        if self.torn_down.load(Ordering::Acquire) {
            debug!(uid = %identity.uid, "storefront torn down, not mounting");
            return;
        }
        if let Some(current) = mounted.as_ref() {
            if current.scope.identity.uid == identity.uid {
                return;
            }
        }
        if let Some(previous) = mounted.take() {
            debug!(uid = %previous.scope.identity.uid, "replacing main scope");
            Self::release(Some(previous));
        }

        let catalog = CatalogSync::new(
            Arc::clone(&self.store),
            self.notifier.clone(),
            self.path.clone(),
        );
        let search = CatalogSearch::new(self.config.search_debounce);

        let sync = catalog.subscribe(self.path.clone(), |snapshot| {
            debug!(revision = snapshot.revision, "catalog delivered");
        });
        let forward = search.attach(&catalog);

        let scope = MainScope {
            identity: identity.clone(),
            catalog,
            search,
        };
        info!(uid = %identity.uid, "main scope mounted");
        *mounted = Some(Mounted {
            scope: scope.clone(),
            subscriptions: vec![sync, forward],
        });
        self.main.send_replace(Some(scope));
    }

    fn unmount(&self) {
        let previous = {
            let mut mounted = lock(&self.mounted);
            self.take_mounted(&mut mounted)
        };
        Self::release(previous);
    }

    /// Clear the mounted scope. Call with the `mounted` lock held so a
    /// concurrent mount cannot slip in between.
    fn take_mounted(&self, mounted: &mut Option<Mounted>) -> Option<Mounted> {
        let previous = mounted.take()?;
        self.main.send_replace(None);
        Some(previous)
    }

    fn release(previous: Option<Mounted>) {
        let Some(previous) = previous else {
            return;
        };
        previous.scope.catalog.unsubscribe();
        for subscription in &previous.subscriptions {
            subscription.cancel();
        }
        info!(uid = %previous.scope.identity.uid, "main scope unmounted");
    }
}
