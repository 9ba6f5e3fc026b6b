// ── Core error types ──
//
// User-facing errors from shopkeep-core. Consumers never see HTTP status
// codes or JSON failures directly: backends translate transport errors
// into `ProviderError`, and the services below turn provider rejections
// into the domain variants of `CoreError`.

use thiserror::Error;

/// Unified error type for the core crate.
///
/// `Display` of the user-facing variants is the exact text shown in the
/// feedback banner.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    // ── Local validation ─────────────────────────────────────────────
    /// Input rejected before any remote call was made.
    #[error("{message}")]
    Validation { message: String },

    // ── Provider rejections ──────────────────────────────────────────
    /// The authentication provider refused the request.
    #[error("{message}")]
    Auth {
        message: String,
        /// Provider reason code, e.g. `"EMAIL_EXISTS"`.
        code: Option<String>,
    },

    /// The document store refused a write. Nothing was inserted locally.
    #[error("Failed to add product: {reason}")]
    WriteRejected { reason: String },

    /// The live catalog subscription failed and was terminated.
    #[error("Catalog subscription failed: {message}")]
    SubscriptionFault { message: String },

    // ── Command state ────────────────────────────────────────────────
    /// The same command is still in flight.
    #[error("{operation} is already in progress")]
    Busy { operation: &'static str },

    #[error("Not signed in")]
    NotSignedIn,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Failure reported by an [`AuthProvider`](crate::AuthProvider) or
/// [`CollectionStore`](crate::CollectionStore) implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The remote service refused the request.
    #[error("{message}")]
    Rejected {
        code: Option<String>,
        message: String,
    },

    #[error("Not signed in")]
    NotSignedIn,

    /// The service could not be reached or answered with garbage.
    #[error("Service unavailable: {message}")]
    Unavailable { message: String },
}

impl ProviderError {
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// The provider's reason code, if it sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<shopkeep_api::Error> for ProviderError {
    fn from(err: shopkeep_api::Error) -> Self {
        use shopkeep_api::Error as Api;

        match err {
            Api::Authentication { code, message } => Self::Rejected {
                code: Some(code),
                message,
            },
            Api::NotSignedIn => Self::NotSignedIn,
            Api::Documents {
                message, status, ..
            } => Self::Rejected {
                code: status,
                message,
            },
            Api::Deserialization { message, body: _ } => Self::Unavailable {
                message: format!("unexpected response: {message}"),
            },
            other => Self::Unavailable {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_auth_error_keeps_code() {
        let err = ProviderError::from(shopkeep_api::Error::Authentication {
            code: "EMAIL_EXISTS".into(),
            message: "EMAIL_EXISTS".into(),
        });
        assert_eq!(err.code(), Some("EMAIL_EXISTS"));
    }

    #[test]
    fn api_document_error_uses_status() {
        let err = ProviderError::from(shopkeep_api::Error::Documents {
            message: "denied".into(),
            status: Some("PERMISSION_DENIED".into()),
            http_status: 403,
        });
        assert_eq!(err.code(), Some("PERMISSION_DENIED"));
        assert_eq!(err.to_string(), "denied");
    }

    #[test]
    fn timeout_is_unavailable() {
        let err = ProviderError::from(shopkeep_api::Error::Timeout { timeout_secs: 30 });
        assert!(matches!(err, ProviderError::Unavailable { .. }));
    }

    #[test]
    fn validation_displays_message_verbatim() {
        let err = CoreError::validation("Please fill in all fields.");
        assert_eq!(err.to_string(), "Please fill in all fields.");
    }
}
