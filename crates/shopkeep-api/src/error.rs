use thiserror::Error;

/// Top-level error type for the `shopkeep-api` crate.
///
/// Covers every failure mode across both REST surfaces: the identity
/// service (sign-in, sign-up, password reset) and the document service
/// (list, create). `shopkeep-core` maps these into provider errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Identity ────────────────────────────────────────────────────
    /// The identity service rejected the request.
    ///
    /// `code` is the service's machine-readable reason, e.g.
    /// `"EMAIL_EXISTS"` or `"INVALID_LOGIN_CREDENTIALS"`.
    #[error("Authentication failed: {code}")]
    Authentication { code: String, message: String },

    /// The identity or token service is overloaded or down (HTTP 429 / 5xx).
    #[error("Identity service unavailable (HTTP {http_status})")]
    ServiceUnavailable { http_status: u16, message: String },

    /// A document call was attempted without a signed-in session.
    #[error("Not signed in")]
    NotSignedIn,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Documents ───────────────────────────────────────────────────
    /// Structured error from the document service.
    ///
    /// `status` is the canonical status string, e.g. `"PERMISSION_DENIED"`.
    #[error("Document service error (HTTP {http_status}): {message}")]
    Documents {
        message: String,
        status: Option<String>,
        http_status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session is missing or was rejected and a
    /// fresh sign-in might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::NotSignedIn => true,
            Self::Documents { http_status, .. } => *http_status == 401,
            Self::Authentication { code, .. } => code.starts_with("TOKEN_EXPIRED"),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::ServiceUnavailable { .. } => true,
            Self::Documents { http_status, .. } => matches!(http_status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Returns `true` if the service refused the operation for this caller.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Documents {
                status,
                http_status,
                ..
            } => *http_status == 403 || status.as_deref() == Some("PERMISSION_DENIED"),
            _ => false,
        }
    }

    /// Extract the service error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Authentication { code, .. } => Some(code),
            Self::Documents { status, .. } => status.as_deref(),
            _ => None,
        }
    }
}
