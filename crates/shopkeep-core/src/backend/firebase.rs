// Hosted identity + document backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use secrecy::SecretString;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use shopkeep_api::transport::TransportConfig;
use shopkeep_api::{AuthSession, DocumentsClient, IdentityClient, poll_collection};

use crate::config::BackendConfig;
use crate::convert::product_fields;
use crate::error::{CoreError, ProviderError};
use crate::model::{CollectionPath, Identity, NewProduct, Product};
use crate::provider::{AuthProvider, CollectionStore, CollectionStream, IdentityStream};

/// [`AuthProvider`] and [`CollectionStore`] over the identity and
/// document REST APIs.
///
/// Sign-out is local: the session is dropped and the identity stream
/// reports `None`. The collection subscription is a poll loop that emits
/// the full listing on first load and on every change.
#[derive(Clone)]
pub struct FirebaseBackend {
    identity: Arc<IdentityClient>,
    documents: Arc<DocumentsClient>,
    poll_interval: Duration,
}

impl FirebaseBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let identity = IdentityClient::new(
            config.identity_url.clone(),
            config.token_url.clone(),
            config.api_key.clone(),
            &transport,
        )
        .map_err(setup_error)?;
        let documents = DocumentsClient::new(
            config.documents_url.clone(),
            config.project_id.clone(),
            &transport,
        )
        .map_err(setup_error)?;

        Ok(Self::from_clients(
            Arc::new(identity),
            Arc::new(documents),
            config.poll_interval,
        ))
    }

    /// Build from pre-configured clients.
    pub fn from_clients(
        identity: Arc<IdentityClient>,
        documents: Arc<DocumentsClient>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            identity,
            documents,
            poll_interval,
        }
    }

    pub fn identity_client(&self) -> &Arc<IdentityClient> {
        &self.identity
    }
}

fn setup_error(err: shopkeep_api::Error) -> CoreError {
    CoreError::Config {
        message: format!("cannot build HTTP client: {err}"),
    }
}

fn to_identity(session: &AuthSession) -> Identity {
    Identity {
        uid: session.local_id.clone(),
        email: session.email.clone(),
    }
}

#[async_trait]
impl AuthProvider for FirebaseBackend {
    fn observe_identity(&self) -> IdentityStream {
        WatchStream::new(self.identity.subscribe())
            .map(|session| session.as_ref().map(to_identity))
            .boxed()
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Identity, ProviderError> {
        let session = self.identity.sign_in_with_password(email, password).await?;
        Ok(to_identity(&session))
    }

    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Identity, ProviderError> {
        let session = self.identity.sign_up(email, password).await?;
        Ok(to_identity(&session))
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.identity.sign_out();
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        self.identity.send_password_reset(email).await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for FirebaseBackend {
    fn subscribe_collection(&self, path: &CollectionPath) -> CollectionStream {
        debug!(path = %path, "polling collection");
        poll_collection(
            Arc::clone(&self.identity),
            Arc::clone(&self.documents),
            path.as_str().to_owned(),
            self.poll_interval,
        )
        .map(|listing| {
            listing
                .map(|docs| docs.iter().map(Product::from).collect())
                .map_err(ProviderError::from)
        })
        .boxed()
    }

    async fn add_document(&self, path: &CollectionPath, product: &NewProduct) -> Result<String, ProviderError> {
        let token = self.identity.fresh_id_token().await?;
        let created = self
            .documents
            .create_document(path.as_str(), product_fields(product), &token)
            .await?;
        debug!(path = %path, id = created.id(), "document created");
        Ok(created.id().to_owned())
    }
}
