// ── Backend seams ──
//
// The storefront talks to its backend through two traits: one for
// identity, one for the product collection. `FirebaseBackend` and
// `MemoryBackend` implement both.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use secrecy::SecretString;

use crate::error::ProviderError;
use crate::model::{CollectionPath, Identity, NewProduct, Product};

/// Identity change events. The first item is the state at subscription
/// time (`None` when nobody is signed in).
pub type IdentityStream = BoxStream<'static, Option<Identity>>;

/// Full collection listings in store order. An `Err` item is terminal.
pub type CollectionStream = BoxStream<'static, Result<Vec<Product>, ProviderError>>;

/// Authentication provider.
///
/// Successful sign-in, sign-up and sign-out are also reported through
/// [`observe_identity`](Self::observe_identity); callers must not treat
/// the return value as the session change.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn observe_identity(&self) -> IdentityStream;

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Identity, ProviderError>;

    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Identity, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError>;
}

/// Remote document collection holding the catalog.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Live listing of `path`. Dropping the stream detaches.
    fn subscribe_collection(&self, path: &CollectionPath) -> CollectionStream;

    /// Create a document and return the id the store assigned.
    async fn add_document(&self, path: &CollectionPath, product: &NewProduct) -> Result<String, ProviderError>;
}
