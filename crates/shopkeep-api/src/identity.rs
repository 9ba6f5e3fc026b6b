// Identity service client
//
// Email/password sign-in, account creation, password-reset mail and
// ID-token refresh against the identity REST endpoints. The signed-in
// session lives in a `watch` channel so observers see every identity
// change, including the initial "nobody signed in" state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::{TransportConfig, decode_json, send_error};

/// Production identity endpoint root.
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/";
/// Production token-refresh endpoint root.
pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/";

/// Refresh the ID token when it expires within this window.
const REFRESH_SKEW: chrono::Duration = chrono::Duration::seconds(60);

/// A signed-in user as reported by the identity service.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Stable account id (`localId`).
    pub local_id: String,
    pub email: Option<String>,
    pub id_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Whether the ID token needs a refresh at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - REFRESH_SKEW <= now
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

// ── IdentityClient ──────────────────────────────────────────────────

/// HTTP client for the identity service.
///
/// Holds the current [`AuthSession`] (if any). Sign-out is local: the
/// session is dropped and observers are notified, no request is sent.
pub struct IdentityClient {
    http: reqwest::Client,
    identity_url: Url,
    token_url: Url,
    api_key: SecretString,
    timeout: Duration,
    session: watch::Sender<Option<AuthSession>>,
}

impl IdentityClient {
    /// Create a client against the given endpoint roots.
    pub fn new(
        identity_url: Url,
        token_url: Url,
        api_key: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(
            http,
            identity_url,
            token_url,
            api_key,
            transport.timeout,
        ))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        identity_url: Url,
        token_url: Url,
        api_key: SecretString,
        timeout: Duration,
    ) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            http,
            identity_url,
            token_url,
            api_key,
            timeout,
            session,
        }
    }

    /// The current session, if signed in.
    pub fn current_session(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    /// Subscribe to session changes. The receiver starts with the current value.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.session.subscribe()
    }

    // ── Account operations ──────────────────────────────────────────

    /// Sign in with email and password.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, Error> {
        let session = self
            .password_call("signInWithPassword", email, password)
            .await?;
        debug!(uid = %session.local_id, "signed in");
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Create an account. On success the new account is signed in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, Error> {
        let session = self.password_call("signUp", email, password).await?;
        debug!(uid = %session.local_id, "account created");
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Ask the service to mail a password-reset link.
    pub async fn send_password_reset(&self, email: &str) -> Result<(), Error> {
        let url = self.account_url("sendOobCode")?;
        debug!("POST {}", redact(&url));

        let body = json!({ "requestType": "PASSWORD_RESET", "email": email });
        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;

        if !resp.status().is_success() {
            return Err(auth_error(resp).await);
        }
        Ok(())
    }

    /// Drop the local session. Observers see `None`.
    pub fn sign_out(&self) {
        if self.session.send_replace(None).is_some() {
            debug!("signed out");
        }
    }

    /// Return an ID token valid for at least the refresh window,
    /// refreshing it first if needed.
    pub async fn fresh_id_token(&self) -> Result<SecretString, Error> {
        let session = self.current_session().ok_or(Error::NotSignedIn)?;
        if !session.is_stale(Utc::now()) {
            return Ok(session.id_token);
        }
        let refreshed = self.refresh(&session).await?;
        Ok(refreshed.id_token)
    }

    /// Exchange the refresh token for a new ID token.
    pub async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, Error> {
        let mut url = join_root(&self.token_url, "v1/token")?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        debug!("POST {}", redact(&url));

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", session.refresh_token.expose_secret()),
        ];
        let resp = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = auth_error(resp).await;
            if ends_session(status, &err) {
                self.sign_out();
            } else {
                warn!(status = status.as_u16(), error = %err, "token refresh failed, keeping session");
            }
            return Err(err);
        }

        let body: RefreshResponse = decode_json(resp).await?;
        let refreshed = AuthSession {
            local_id: body.user_id,
            email: session.email.clone(),
            id_token: SecretString::from(body.id_token),
            refresh_token: SecretString::from(body.refresh_token),
            expires_at: expiry(&body.expires_in),
        };
        debug!(uid = %refreshed.local_id, "id token refreshed");
        self.session.send_replace(Some(refreshed.clone()));
        Ok(refreshed)
    }

    // ── Private helpers ─────────────────────────────────────────────

    async fn password_call(
        &self,
        method: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, Error> {
        let url = self.account_url(method)?;
        debug!("POST {}", redact(&url));

        let body = PasswordRequest {
            email,
            password: password.expose_secret(),
            return_secure_token: true,
        };
        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;

        if !resp.status().is_success() {
            return Err(auth_error(resp).await);
        }

        let body: SignInResponse = decode_json(resp).await?;
        Ok(AuthSession {
            local_id: body.local_id,
            email: body.email.or_else(|| Some(email.to_owned())),
            id_token: SecretString::from(body.id_token),
            refresh_token: SecretString::from(body.refresh_token),
            expires_at: expiry(&body.expires_in),
        })
    }

    /// `{identity_url}/v1/accounts:{method}?key={api_key}`
    fn account_url(&self, method: &str) -> Result<Url, Error> {
        let mut url = join_root(&self.identity_url, &format!("v1/accounts:{method}"))?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }
}

/// Join a path onto an endpoint root regardless of its trailing slash.
fn join_root(root: &Url, path: &str) -> Result<Url, Error> {
    let base = root.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}

/// Strip the query (which carries the API key) for logging.
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

fn expiry(expires_in: &str) -> DateTime<Utc> {
    let secs = expires_in.parse::<i64>().unwrap_or(3600);
    Utc::now() + chrono::Duration::seconds(secs)
}

/// Refresh rejections after which the refresh token can never work again.
const DEAD_SESSION_CODES: &[&str] = &[
    "TOKEN_EXPIRED",
    "INVALID_REFRESH_TOKEN",
    "USER_DISABLED",
    "USER_NOT_FOUND",
];

/// Whether a failed refresh means the session is gone for good.
fn ends_session(status: reqwest::StatusCode, err: &Error) -> bool {
    matches!(status.as_u16(), 400 | 401 | 403)
        && err
            .api_error_code()
            .is_some_and(|code| DEAD_SESSION_CODES.contains(&code))
}

/// Turn an error response into [`Error::Authentication`], or
/// [`Error::ServiceUnavailable`] for 429 and 5xx replies.
///
/// The service reports reasons like `"WEAK_PASSWORD : Password should be
/// at least 6 characters"`; the part before ` : ` is the code.
async fn auth_error(resp: reqwest::Response) -> Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or_default();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Error::ServiceUnavailable {
            http_status: status.as_u16(),
            message: if message.is_empty() { body } else { message },
        };
    }

    if message.is_empty() {
        return Error::Authentication {
            code: format!("HTTP_{}", status.as_u16()),
            message: body,
        };
    }

    let code = message
        .split(" : ")
        .next()
        .unwrap_or(&message)
        .trim()
        .to_owned();
    Error::Authentication { code, message }
}
