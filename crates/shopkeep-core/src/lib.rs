// shopkeep-core: Session, catalog and search services between shopkeep-api and consumers.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod navigation;
pub mod notify;
pub mod provider;
pub mod search;
pub mod session;
pub mod storefront;
pub mod stream;
pub mod subscription;

mod pending;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{FirebaseBackend, MemoryBackend};
pub use catalog::{CatalogSync, ProductDraft, SyncStatus};
pub use config::{BackendConfig, StorefrontConfig};
pub use error::{CoreError, ProviderError};
pub use navigation::{Navigator, Route, ScreenTree};
pub use notify::NotificationChannel;
pub use provider::{AuthProvider, CollectionStore};
pub use search::{CatalogSearch, SearchState};
pub use session::SessionObserver;
pub use storefront::{MainScope, Storefront};
pub use stream::Feed;
pub use subscription::Subscription;

pub use model::{
    CatalogSnapshot, CollectionPath, FeedbackMessage, Identity, NewProduct, Product, ProductList,
    Session, Severity,
};
