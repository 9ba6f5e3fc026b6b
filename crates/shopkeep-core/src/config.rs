// ── Runtime configuration ──
//
// These types describe how to reach the backend services and how the
// storefront behaves. They carry credentials and tuning but never touch
// disk: the CLI builds them from its profile and hands them in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use shopkeep_api::firestore::DEFAULT_DOCUMENTS_URL;
use shopkeep_api::identity::{DEFAULT_IDENTITY_URL, DEFAULT_TOKEN_URL};

use crate::error::CoreError;
use crate::model::CollectionPath;

/// Settle window for the search busy indicator.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
/// How long a feedback banner stays visible.
pub const DEFAULT_FEEDBACK_DURATION: Duration = Duration::from_secs(4);
/// How often the document backend re-lists the catalog.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Storefront behaviour, independent of the backend.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Company whose catalog is shown.
    pub tenant: String,
    pub search_debounce: Duration,
    pub feedback_duration: Duration,
}

impl StorefrontConfig {
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            feedback_duration: DEFAULT_FEEDBACK_DURATION,
        }
    }

    /// The canonical product collection for this tenant.
    pub fn collection_path(&self) -> Result<CollectionPath, CoreError> {
        CollectionPath::products(&self.tenant)
    }
}

/// Connection settings for the hosted identity and document services.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub project_id: String,
    /// Web API key of the project.
    pub api_key: SecretString,
    pub identity_url: Url,
    pub token_url: Url,
    pub documents_url: Url,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl BackendConfig {
    /// Settings for the production endpoints.
    pub fn new(project_id: impl Into<String>, api_key: SecretString) -> Result<Self, CoreError> {
        Ok(Self {
            project_id: project_id.into(),
            api_key,
            identity_url: parse_url(DEFAULT_IDENTITY_URL)?,
            token_url: parse_url(DEFAULT_TOKEN_URL)?,
            documents_url: parse_url(DEFAULT_DOCUMENTS_URL)?,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Point every service at a local emulator suite.
    ///
    /// The auth emulator serves both identity and token endpoints under
    /// host-prefixed paths; the document emulator serves the plain API.
    pub fn with_emulators(mut self, auth_host: &str, documents_host: &str) -> Result<Self, CoreError> {
        self.identity_url = parse_url(&format!("http://{auth_host}/identitytoolkit.googleapis.com/"))?;
        self.token_url = parse_url(&format!("http://{auth_host}/securetoken.googleapis.com/"))?;
        self.documents_url = parse_url(&format!("http://{documents_host}/"))?;
        Ok(self)
    }
}

fn parse_url(raw: &str) -> Result<Url, CoreError> {
    Url::parse(raw).map_err(|e| CoreError::Config {
        message: format!("invalid URL {raw}: {e}"),
    })
}
