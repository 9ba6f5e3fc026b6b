// In-process backend with failure injection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use crate::error::ProviderError;
use crate::model::{CollectionPath, Identity, NewProduct, Product};
use crate::provider::{AuthProvider, CollectionStore, CollectionStream, IdentityStream};

const MIN_PASSWORD_LEN: usize = 6;

/// State of one stored collection as seen by subscribers.
#[derive(Debug, Clone)]
enum Listing {
    Items(Arc<Vec<Product>>),
    Fault(String),
}

struct Account {
    uid: String,
    password: SecretString,
}

/// Per-operation call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub sign_in: usize,
    pub sign_up: usize,
    pub sign_out: usize,
    pub password_reset: usize,
    pub subscribe: usize,
    pub add_document: usize,
}

#[derive(Default)]
struct Counters {
    sign_in: AtomicUsize,
    sign_up: AtomicUsize,
    sign_out: AtomicUsize,
    password_reset: AtomicUsize,
    subscribe: AtomicUsize,
    add_document: AtomicUsize,
}

struct MemoryInner {
    accounts: DashMap<String, Account>,
    identity: watch::Sender<Option<Identity>>,
    collections: DashMap<String, watch::Sender<Listing>>,
    reset_requests: DashMap<String, usize>,
    counters: Counters,
    reject_writes: AtomicBool,
    fail_sign_out: AtomicBool,
    latency: std::sync::Mutex<Duration>,
}

/// [`AuthProvider`] and [`CollectionStore`] backed by in-process maps.
///
/// Cheaply cloneable; clones share state. Listings are delivered through
/// `watch` channels, so a subscriber that falls behind sees the latest
/// listing rather than every intermediate one.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            inner: Arc::new(MemoryInner {
                accounts: DashMap::new(),
                identity,
                collections: DashMap::new(),
                reset_requests: DashMap::new(),
                counters: Counters::default(),
                reject_writes: AtomicBool::new(false),
                fail_sign_out: AtomicBool::new(false),
                latency: std::sync::Mutex::new(Duration::ZERO),
            }),
        }
    }

    // ── Accounts ─────────────────────────────────────────────────────

    /// Register an account and return its uid.
    pub fn add_account(&self, email: &str, password: &str) -> String {
        let uid = uuid::Uuid::new_v4().simple().to_string();
        self.inner.accounts.insert(
            email.to_lowercase(),
            Account {
                uid: uid.clone(),
                password: SecretString::from(password.to_owned()),
            },
        );
        uid
    }

    /// Push an identity change as if the provider observed one.
    pub fn set_identity(&self, identity: Option<Identity>) {
        self.inner.identity.send_replace(identity);
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.identity.borrow().clone()
    }

    /// How many reset mails were requested for `email`.
    pub fn reset_requests(&self, email: &str) -> usize {
        self.inner
            .reset_requests
            .get(&email.to_lowercase())
            .map_or(0, |n| *n)
    }

    // ── Collections ──────────────────────────────────────────────────

    /// Replace a collection's contents and notify subscribers.
    pub fn set_items(&self, path: &CollectionPath, items: Vec<Product>) {
        self.sender(path)
            .send_replace(Listing::Items(Arc::new(items)));
    }

    /// Current contents of a collection (empty if never written).
    pub fn items(&self, path: &CollectionPath) -> Vec<Product> {
        let sender = self.sender(path);
        let listing = sender.borrow();
        match &*listing {
            Listing::Items(items) => items.as_ref().clone(),
            Listing::Fault(_) => Vec::new(),
        }
    }

    /// Fail every live subscription on `path`. Later subscriptions
    /// fail immediately until [`set_items`](Self::set_items) is called.
    pub fn fault_subscription(&self, path: &CollectionPath, message: &str) {
        self.sender(path)
            .send_replace(Listing::Fault(message.to_owned()));
    }

    /// Number of live subscribers on `path`.
    pub fn subscriber_count(&self, path: &CollectionPath) -> usize {
        self.sender(path).receiver_count()
    }

    // ── Failure injection ────────────────────────────────────────────

    pub fn reject_writes(&self, reject: bool) {
        self.inner.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn fail_sign_out(&self, fail: bool) {
        self.inner.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Delay every command by `latency` before it takes effect.
    pub fn set_latency(&self, latency: Duration) {
        *crate::subscription::lock(&self.inner.latency) = latency;
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.inner.counters;
        CallCounts {
            sign_in: c.sign_in.load(Ordering::SeqCst),
            sign_up: c.sign_up.load(Ordering::SeqCst),
            sign_out: c.sign_out.load(Ordering::SeqCst),
            password_reset: c.password_reset.load(Ordering::SeqCst),
            subscribe: c.subscribe.load(Ordering::SeqCst),
            add_document: c.add_document.load(Ordering::SeqCst),
        }
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn sender(&self, path: &CollectionPath) -> watch::Sender<Listing> {
        self.inner
            .collections
            .entry(path.as_str().to_owned())
            .or_insert_with(|| watch::channel(Listing::Items(Arc::new(Vec::new()))).0)
            .clone()
    }

    async fn simulate_latency(&self) {
        let latency = *crate::subscription::lock(&self.inner.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    fn observe_identity(&self) -> IdentityStream {
        WatchStream::new(self.inner.identity.subscribe()).boxed()
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Identity, ProviderError> {
        bump(&self.inner.counters.sign_in);
        self.simulate_latency().await;

        let key = email.to_lowercase();
        let uid = match self.inner.accounts.get(&key) {
            Some(account) if account.password.expose_secret() == password.expose_secret() => {
                account.uid.clone()
            }
            _ => {
                return Err(ProviderError::rejected(
                    "INVALID_LOGIN_CREDENTIALS",
                    "INVALID_LOGIN_CREDENTIALS",
                ));
            }
        };

        let identity = Identity {
            uid,
            email: Some(key),
        };
        self.set_identity(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Identity, ProviderError> {
        bump(&self.inner.counters.sign_up);
        self.simulate_latency().await;

        let key = email.to_lowercase();
        if !key.contains('@') {
            return Err(ProviderError::rejected("INVALID_EMAIL", "INVALID_EMAIL"));
        }
        if self.inner.accounts.contains_key(&key) {
            return Err(ProviderError::rejected("EMAIL_EXISTS", "EMAIL_EXISTS"));
        }
        if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::rejected(
                "WEAK_PASSWORD",
                "WEAK_PASSWORD : Password should be at least 6 characters",
            ));
        }

        let uid = self.add_account(&key, password.expose_secret());
        let identity = Identity {
            uid,
            email: Some(key),
        };
        self.set_identity(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        bump(&self.inner.counters.sign_out);
        self.simulate_latency().await;

        if self.inner.fail_sign_out.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable {
                message: "sign-out failed".into(),
            });
        }
        self.set_identity(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        bump(&self.inner.counters.password_reset);
        self.simulate_latency().await;

        let key = email.to_lowercase();
        if !self.inner.accounts.contains_key(&key) {
            return Err(ProviderError::rejected("EMAIL_NOT_FOUND", "EMAIL_NOT_FOUND"));
        }
        *self.inner.reset_requests.entry(key).or_insert(0) += 1;
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for MemoryBackend {
    fn subscribe_collection(&self, path: &CollectionPath) -> CollectionStream {
        bump(&self.inner.counters.subscribe);
        debug!(path = %path, "memory subscription");

        let mut listings = WatchStream::new(self.sender(path).subscribe());
        async_stream::stream! {
            while let Some(listing) = listings.next().await {
                match listing {
                    Listing::Items(items) => yield Ok(items.as_ref().clone()),
                    Listing::Fault(message) => {
                        yield Err(ProviderError::Unavailable { message });
                        break;
                    }
                }
            }
        }
        .boxed()
    }

    async fn add_document(&self, path: &CollectionPath, product: &NewProduct) -> Result<String, ProviderError> {
        bump(&self.inner.counters.add_document);
        self.simulate_latency().await;

        if self.inner.reject_writes.load(Ordering::SeqCst) {
            return Err(ProviderError::rejected(
                "PERMISSION_DENIED",
                "Missing or insufficient permissions.",
            ));
        }
        if self.identity().is_none() {
            return Err(ProviderError::NotSignedIn);
        }

        let id = uuid::Uuid::new_v4().simple().to_string();
        let stored = product.clone().with_id(id.clone());
        self.sender(path).send_modify(|listing| {
            let mut items = match listing {
                Listing::Items(items) => items.as_ref().clone(),
                Listing::Fault(_) => Vec::new(),
            };
            items.push(stored);
            *listing = Listing::Items(Arc::new(items));
        });
        Ok(id)
    }
}
