//! Shared configuration for shopkeep.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `shopkeep_core::{BackendConfig, StorefrontConfig}`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopkeep_core::{BackendConfig, StorefrontConfig};

/// Keyring service name.
const KEYRING_SERVICE: &str = "shopkeep";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named storefront profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|p| (name, p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Catalog poll interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Search settle window in milliseconds.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Feedback banner lifetime in seconds.
    #[serde(default = "default_feedback_secs")]
    pub feedback_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            search_debounce_ms: default_search_debounce_ms(),
            feedback_secs: default_feedback_secs(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    5
}
fn default_search_debounce_ms() -> u64 {
    300
}
fn default_feedback_secs() -> u64 {
    4
}

/// A named storefront profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Backend project id.
    pub project_id: String,

    /// Company whose catalog is managed.
    pub tenant: String,

    /// Web API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Account email.
    pub email: Option<String>,

    /// Account password (plaintext; prefer keyring).
    pub password: Option<String>,

    /// Auth emulator `host:port`; routes identity calls locally.
    pub auth_emulator: Option<String>,

    /// Document emulator `host:port`.
    pub documents_emulator: Option<String>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override poll interval.
    pub poll_interval: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `SHOPKEEP_CONFIG` if set, otherwise
/// XDG / platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("SHOPKEEP_CONFIG") {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "shopkeep", "shopkeep").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("shopkeep");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. Environment overrides use `__` as the
/// nesting separator, e.g. `SHOPKEEP_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SHOPKEEP_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str, item: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{item}"))?)
}

fn keyring_secret(profile_name: &str, item: &str) -> Option<String> {
    keyring_entry(profile_name, item).ok()?.get_password().ok()
}

/// Resolve the web API key from the credential chain.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. SHOPKEEP_API_KEY
    if let Ok(val) = std::env::var("SHOPKEEP_API_KEY") {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Some(secret) = keyring_secret(profile_name, "api-key") {
        return Ok(SecretString::from(secret));
    }

    // 4. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve the account email and password.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let email = profile
        .email
        .clone()
        .or_else(|| std::env::var("SHOPKEEP_EMAIL").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    // 1. Env var
    if let Ok(pw) = std::env::var("SHOPKEEP_PASSWORD") {
        return Ok((email, SecretString::from(pw)));
    }

    // 2. Keyring
    if let Some(pw) = keyring_secret(profile_name, "password") {
        return Ok((email, SecretString::from(pw)));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok((email, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store the account password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "password")?.set_password(password.expose_secret())?;
    Ok(())
}

/// Store the API key in the system keyring.
pub fn store_api_key(profile_name: &str, key: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "api-key")?.set_password(key.expose_secret())?;
    Ok(())
}

// ── Translation to core configs ─────────────────────────────────────

/// Build the backend connection settings for a profile.
pub fn profile_to_backend_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<BackendConfig, ConfigError> {
    if profile.project_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "project_id".into(),
            reason: "must not be empty".into(),
        });
    }

    let emulators = match (&profile.auth_emulator, &profile.documents_emulator) {
        (Some(auth), Some(docs)) => Some((auth, docs)),
        (None, None) => None,
        _ => {
            return Err(ConfigError::Validation {
                field: "emulator".into(),
                reason: "set both auth_emulator and documents_emulator, or neither".into(),
            });
        }
    };

    let api_key = resolve_api_key(profile, profile_name)?;
    let mut config =
        BackendConfig::new(profile.project_id.trim(), api_key).map_err(core_validation("project_id"))?;
    if let Some((auth, docs)) = emulators {
        config = config
            .with_emulators(auth, docs)
            .map_err(core_validation("emulator"))?;
    }

    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.poll_interval =
        Duration::from_secs(profile.poll_interval.unwrap_or(defaults.poll_interval).max(1));
    Ok(config)
}

/// Build the storefront behaviour settings for a profile.
pub fn profile_to_storefront_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<StorefrontConfig, ConfigError> {
    let config = StorefrontConfig {
        tenant: profile.tenant.trim().to_owned(),
        search_debounce: Duration::from_millis(defaults.search_debounce_ms),
        feedback_duration: Duration::from_secs(defaults.feedback_secs),
    };
    config
        .collection_path()
        .map_err(core_validation("tenant"))?;
    Ok(config)
}

fn core_validation(field: &'static str) -> impl Fn(shopkeep_core::CoreError) -> ConfigError {
    move |err| ConfigError::Validation {
        field: field.into(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
default_profile = "shop"

[defaults]
output = "json"
timeout = 12

[profiles.shop]
project_id = "demo-shop"
tenant = "sk-hardwares"
api_key = "plain-key"
email = "owner@shop.test"
"#;

    #[test]
    fn loads_profiles_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.defaults.output, "json");
        assert_eq!(config.defaults.timeout, 12);
        assert_eq!(config.defaults.search_debounce_ms, 300);

        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "shop");
        assert_eq!(profile.tenant, "sk-hardwares");
        assert!(config.profile(Some("nope")).is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                project_id: "demo".into(),
                tenant: "acme".into(),
                ..Profile::default()
            },
        );
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile(None).unwrap().1.project_id, "demo");
    }

    #[test]
    fn storefront_config_from_profile() {
        let profile = Profile {
            tenant: " acme ".into(),
            ..Profile::default()
        };
        let config = profile_to_storefront_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(config.collection_path().unwrap().as_str(), "companies/acme/products");
        assert_eq!(config.feedback_duration, Duration::from_secs(4));

        let bad = Profile {
            tenant: "a/b".into(),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_storefront_config(&bad, &Defaults::default()),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn backend_config_requires_project() {
        let profile = Profile {
            api_key: Some("k".into()),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_backend_config(&profile, "default", &Defaults::default()),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn emulators_must_come_in_pairs() {
        let profile = Profile {
            project_id: "demo".into(),
            api_key: Some("k".into()),
            auth_emulator: Some("127.0.0.1:9099".into()),
            ..Profile::default()
        };
        let err = profile_to_backend_config(&profile, "default", &Defaults::default()).unwrap_err();
        assert!(err.to_string().contains("emulator"));
    }
}
