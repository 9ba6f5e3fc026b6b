// ── Session observer ──
//
// Watches the authentication provider's identity stream and exposes it
// as the three-state `Session` signal. Also runs the account commands
// (sign-in, sign-up, password reset, sign-out); their results reach the
// session only through the provider's identity stream.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{CoreError, ProviderError};
use crate::model::{Identity, Session};
use crate::notify::NotificationChannel;
use crate::pending::Pending;
use crate::provider::AuthProvider;
use crate::stream::Feed;
use crate::subscription::{Listener, Subscription};

const MIN_PASSWORD_LEN: usize = 6;

const FILL_ALL_FIELDS: &str = "Please fill in all fields.";

/// Cheaply cloneable handle to the session service.
#[derive(Clone)]
pub struct SessionObserver {
    inner: Arc<ObserverInner>,
}

struct ObserverInner {
    auth: Arc<dyn AuthProvider>,
    notifier: NotificationChannel,
    session: watch::Sender<Session>,
    sign_in_pending: AtomicBool,
    sign_up_pending: AtomicBool,
    reset_pending: AtomicBool,
    sign_out_pending: AtomicBool,
}

impl SessionObserver {
    pub fn new(auth: Arc<dyn AuthProvider>, notifier: NotificationChannel) -> Self {
        let (session, _) = watch::channel(Session::Unknown);
        Self {
            inner: Arc::new(ObserverInner {
                auth,
                notifier,
                session,
                sign_in_pending: AtomicBool::new(false),
                sign_up_pending: AtomicBool::new(false),
                reset_pending: AtomicBool::new(false),
                sign_out_pending: AtomicBool::new(false),
            }),
        }
    }

    /// The last session delivered by any running observer.
    pub fn current(&self) -> Session {
        self.inner.session.borrow().clone()
    }

    pub fn feed(&self) -> Feed<Session> {
        Feed::new(self.inner.session.subscribe())
    }

    /// Start observing identity changes.
    ///
    /// `on_change` runs once per distinct session, starting with the
    /// provider's initial report; repeats of the previous value are
    /// skipped. Must be called within a Tokio runtime.
    pub fn start(&self, on_change: impl FnMut(Session) + Send + 'static) -> Subscription {
        let token = CancellationToken::new();
        let listener = Listener::new(token.clone(), on_change);
        let identities = self.inner.auth.observe_identity();
        tokio::spawn(observe_task(
            Arc::clone(&self.inner),
            identities,
            listener,
            token.clone(),
        ));
        Subscription::new(token)
    }

    // ── Account commands ─────────────────────────────────────────────

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Identity, CoreError> {
        let _pending = Pending::acquire(&self.inner.sign_in_pending, "Sign-in")?;

        let email = email.trim();
        if email.is_empty() || password.expose_secret().is_empty() {
            return Err(self.report(CoreError::validation(FILL_ALL_FIELDS)));
        }

        match self.inner.auth.sign_in(email, password).await {
            Ok(identity) => {
                info!(uid = %identity.uid, "signed in");
                self.inner.notifier.info("Signed in successfully!");
                Ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "sign-in rejected");
                Err(self.report(CoreError::Auth {
                    message: "Invalid email or password.".into(),
                    code: e.code().map(str::to_owned),
                }))
            }
        }
    }

    /// Create an account. The new account is signed in on success.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        confirm: &SecretString,
    ) -> Result<Identity, CoreError> {
        let _pending = Pending::acquire(&self.inner.sign_up_pending, "Account creation")?;

        let email = email.trim();
        let (pw, confirm) = (password.expose_secret(), confirm.expose_secret());
        if email.is_empty() || pw.is_empty() || confirm.is_empty() {
            return Err(self.report(CoreError::validation(FILL_ALL_FIELDS)));
        }
        if pw != confirm {
            return Err(self.report(CoreError::validation("Passwords do not match.")));
        }
        if pw.chars().count() < MIN_PASSWORD_LEN {
            return Err(self.report(CoreError::validation(
                "Password should be at least 6 characters.",
            )));
        }

        match self.inner.auth.sign_up(email, password).await {
            Ok(identity) => {
                info!(uid = %identity.uid, "account created");
                self.inner.notifier.info("Account created successfully!");
                Ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "sign-up rejected");
                Err(self.report(CoreError::Auth {
                    message: sign_up_message(&e).into(),
                    code: e.code().map(str::to_owned),
                }))
            }
        }
    }

    /// Ask the provider to mail a password-reset link.
    pub async fn send_password_reset(&self, email: &str) -> Result<(), CoreError> {
        let _pending = Pending::acquire(&self.inner.reset_pending, "Password reset")?;

        let email = email.trim();
        if email.is_empty() {
            return Err(self.report(CoreError::validation(
                "Please enter your email address.",
            )));
        }

        match self.inner.auth.send_password_reset(email).await {
            Ok(()) => {
                debug!("password reset requested");
                self.inner
                    .notifier
                    .info("Password reset link sent! Check your inbox.");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "password reset rejected");
                Err(self.report(CoreError::Auth {
                    message: "Failed to send reset email. Please check the address.".into(),
                    code: e.code().map(str::to_owned),
                }))
            }
        }
    }

    /// Request sign-out. The session changes only when the provider
    /// reports it; a failure leaves the session as it was.
    pub async fn sign_out(&self) -> Result<(), CoreError> {
        let _pending = Pending::acquire(&self.inner.sign_out_pending, "Sign-out")?;

        if let Err(e) = self.inner.auth.sign_out().await {
            warn!(error = %e, "sign-out failed");
            return Err(self.report(CoreError::Auth {
                message: "Failed to sign out.".into(),
                code: e.code().map(str::to_owned),
            }));
        }
        debug!("sign-out requested");
        Ok(())
    }

    fn report(&self, err: CoreError) -> CoreError {
        self.inner.notifier.error(err.to_string());
        err
    }
}

/// Friendly text for provider sign-up rejections.
fn sign_up_message(err: &ProviderError) -> &'static str {
    match err.code() {
        Some("EMAIL_EXISTS") => "That email address is already in use.",
        Some("WEAK_PASSWORD") => "Password should be at least 6 characters.",
        Some("INVALID_EMAIL") => "That email address is invalid.",
        _ => "Failed to create account.",
    }
}

async fn observe_task(
    inner: Arc<ObserverInner>,
    mut identities: crate::provider::IdentityStream,
    listener: Listener<Session>,
    token: CancellationToken,
) {
    let mut last = Session::Unknown;

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            next = identities.next() => {
                let Some(identity) = next else {
                    debug!("identity stream ended");
                    break;
                };
                let session = Session::from(identity);
                if session == last {
                    continue;
                }
                debug!(session = %session, "session changed");
                last = session.clone();
                inner.session.send_replace(session.clone());
                if !listener.deliver(session) {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_messages() {
        assert_eq!(
            sign_up_message(&ProviderError::rejected("EMAIL_EXISTS", "x")),
            "That email address is already in use."
        );
        assert_eq!(
            sign_up_message(&ProviderError::NotSignedIn),
            "Failed to create account."
        );
    }
}
