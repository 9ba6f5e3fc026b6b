//! CLI configuration -- thin wrapper around `shopkeep_config`.
//!
//! Resolves the active profile from `--profile` / the config file and
//! builds a [`Storefront`] wired to the hosted backend.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use shopkeep_core::{AuthProvider, CollectionStore, FirebaseBackend, Storefront};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use shopkeep_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// The profile a command runs against, with CLI overrides applied.
pub struct ActiveProfile {
    pub name: String,
    pub profile: Profile,
    pub defaults: Defaults,
}

impl ActiveProfile {
    /// Load the config file and pick the profile named by `--profile`
    /// or the config's default.
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let mut cfg = shopkeep_config::load_config()?;
        let name = active_profile_name(global, &cfg);
        let available = available_profiles(&cfg);

        let mut profile = cfg
            .profiles
            .remove(&name)
            .ok_or_else(|| CliError::ProfileNotFound {
                name: name.clone(),
                available,
            })?;
        if global.timeout.is_some() {
            profile.timeout = global.timeout;
        }

        Ok(Self {
            name,
            profile,
            defaults: cfg.defaults,
        })
    }

    /// How long to wait for the backend before giving up.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.profile.timeout.unwrap_or(self.defaults.timeout))
    }

    /// Account email and password for sign-in.
    pub fn credentials(&self, email: Option<&str>) -> Result<(String, SecretString), CliError> {
        let (resolved, password) = shopkeep_config::resolve_credentials(&self.profile, &self.name)?;
        Ok((email.map_or(resolved, str::to_owned), password))
    }

    /// The account email, if any, without touching the password chain.
    pub fn email(&self, email: Option<&str>) -> Option<String> {
        email
            .map(str::to_owned)
            .or_else(|| self.profile.email.clone())
            .or_else(|| std::env::var("SHOPKEEP_EMAIL").ok())
    }

    /// Build a storefront against the hosted backend. Nothing is started.
    pub fn storefront(&self) -> Result<Storefront, CliError> {
        let backend_config =
            shopkeep_config::profile_to_backend_config(&self.profile, &self.name, &self.defaults)?;
        let storefront_config =
            shopkeep_config::profile_to_storefront_config(&self.profile, &self.defaults)?;

        let backend = Arc::new(FirebaseBackend::new(&backend_config)?);
        let auth: Arc<dyn AuthProvider> = backend.clone();
        let store: Arc<dyn CollectionStore> = backend;

        tracing::debug!(profile = %self.name, tenant = %storefront_config.tenant, "storefront configured");
        Ok(Storefront::new(storefront_config, auth, store)?)
    }
}
