//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use shopkeep_config::ConfigError;
use shopkeep_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
    pub const BUSY: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(shopkeep::auth_failed),
        help(
            "Check the account email and password for this profile.\n\
             Run: shopkeep config set-password --profile {profile}"
        )
    )]
    AuthFailed { message: String, profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(shopkeep::no_credentials),
        help(
            "Configure credentials with: shopkeep config init\n\
             Or set SHOPKEEP_EMAIL / SHOPKEEP_PASSWORD / SHOPKEEP_API_KEY."
        )
    )]
    NoCredentials { profile: String },

    #[error("Not signed in")]
    #[diagnostic(code(shopkeep::not_signed_in), help("Run: shopkeep auth login"))]
    NotSignedIn,

    // ── Catalog ──────────────────────────────────────────────────────
    #[error("product '{id}' not found")]
    #[diagnostic(
        code(shopkeep::not_found),
        help("Run: shopkeep products list to see available products")
    )]
    ProductNotFound { id: String },

    #[error("{message}")]
    #[diagnostic(code(shopkeep::write_rejected))]
    WriteRejected { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(shopkeep::subscription_fault),
        help("The live catalog stopped. Check your connection and run the command again.")
    )]
    SubscriptionFault { message: String },

    #[error("{operation} is already in progress")]
    #[diagnostic(code(shopkeep::busy))]
    Busy { operation: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(shopkeep::validation))]
    Validation { message: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(shopkeep::invalid_value))]
    InvalidValue { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(shopkeep::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: shopkeep config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(shopkeep::config))]
    Config { message: String },

    #[error(transparent)]
    #[diagnostic(code(shopkeep::config_load))]
    ConfigLoad(Box<figment::Error>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Timed out after {seconds}s waiting for {what}")]
    #[diagnostic(
        code(shopkeep::timeout),
        help("Increase the timeout with --timeout or check your connection.")
    )]
    Timeout { what: &'static str, seconds: u64 },

    // ── Internal / IO ────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(shopkeep::internal))]
    Internal { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::NotSignedIn => {
                exit_code::AUTH
            }
            Self::ProductNotFound { .. } => exit_code::NOT_FOUND,
            Self::WriteRejected { .. } => exit_code::REJECTED,
            Self::Busy { .. } => exit_code::BUSY,
            Self::SubscriptionFault { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::InvalidValue { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the profile name to an auth failure.
    pub fn for_profile(self, profile: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                message,
                profile: profile.into(),
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { message } => CliError::Validation { message },
            CoreError::Auth { message, code: _ } => CliError::AuthFailed {
                message,
                profile: "current".into(),
            },
            err @ CoreError::WriteRejected { .. } => CliError::WriteRejected {
                message: err.to_string(),
            },
            err @ CoreError::SubscriptionFault { .. } => CliError::SubscriptionFault {
                message: err.to_string(),
            },
            CoreError::Busy { operation } => CliError::Busy {
                operation: operation.into(),
            },
            CoreError::NotSignedIn => CliError::NotSignedIn,
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::InvalidValue { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Figment(err) => CliError::ConfigLoad(err),
            ConfigError::Io(err) => CliError::Io(err),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_validation_is_a_usage_error() {
        let err = CliError::from(CoreError::Validation {
            message: "Please fill in all fields.".into(),
        });
        assert_eq!(err.to_string(), "Please fill in all fields.");
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn write_rejection_keeps_reason() {
        let err = CliError::from(CoreError::WriteRejected {
            reason: "permission denied".into(),
        });
        assert_eq!(err.to_string(), "Failed to add product: permission denied");
        assert_eq!(err.exit_code(), exit_code::REJECTED);
    }

    #[test]
    fn auth_failure_names_profile() {
        let err = CliError::from(CoreError::Auth {
            message: "Invalid email or password.".into(),
            code: Some("INVALID_LOGIN_CREDENTIALS".into()),
        })
        .for_profile("shop");
        assert!(matches!(err, CliError::AuthFailed { ref profile, .. } if profile == "shop"));
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn missing_credentials_map_to_auth_exit() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "default".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
