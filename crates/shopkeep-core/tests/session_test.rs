#![allow(clippy::unwrap_used)]
// Integration tests for `SessionObserver` over `MemoryBackend`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use shopkeep_core::{CoreError, Identity, MemoryBackend, NotificationChannel, Session, SessionObserver, Severity};

use common::{assert_quiet, next, recorder};

// ── Helpers ─────────────────────────────────────────────────────────

fn setup() -> (MemoryBackend, NotificationChannel, SessionObserver) {
    let backend = MemoryBackend::new();
    let notifier = NotificationChannel::default();
    let observer = SessionObserver::new(Arc::new(backend.clone()), notifier.clone());
    (backend, notifier, observer)
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

fn identity(uid: &str) -> Identity {
    Identity {
        uid: uid.into(),
        email: None,
    }
}

// ── Observation ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_signed_out_then_signed_in_delivers_twice() {
    let (backend, _notifier, observer) = setup();
    assert_eq!(observer.current(), Session::Unknown);

    let (on_change, mut rx) = recorder();
    let _sub = observer.start(on_change);

    assert_eq!(next(&mut rx).await, Session::SignedOut);
    backend.set_identity(Some(identity("u1")));
    assert_eq!(next(&mut rx).await, Session::SignedIn(identity("u1")));
    assert_quiet(&mut rx).await;
    assert_eq!(observer.current(), Session::SignedIn(identity("u1")));
}

#[tokio::test]
async fn test_repeated_identity_is_not_redelivered() {
    let (backend, _notifier, observer) = setup();
    let (on_change, mut rx) = recorder();
    let _sub = observer.start(on_change);
    next(&mut rx).await;

    backend.set_identity(Some(identity("u1")));
    next(&mut rx).await;
    backend.set_identity(Some(identity("u1")));
    assert_quiet(&mut rx).await;

    backend.set_identity(Some(identity("u2")));
    assert_eq!(next(&mut rx).await, Session::SignedIn(identity("u2")));
}

#[tokio::test]
async fn test_cancelled_observer_stops_delivering() {
    let (backend, _notifier, observer) = setup();
    let (on_change, mut rx) = recorder();
    let sub = observer.start(on_change);
    next(&mut rx).await;

    assert!(sub.cancel());
    assert!(!sub.cancel());
    backend.set_identity(Some(identity("u1")));
    assert_quiet(&mut rx).await;
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_in_success_reaches_session_through_listener() {
    let (backend, notifier, observer) = setup();
    let uid = backend.add_account("owner@shop.test", "hunter22");
    let (on_change, mut rx) = recorder();
    let _sub = observer.start(on_change);
    next(&mut rx).await;

    let signed_in = observer
        .sign_in("owner@shop.test", &secret("hunter22"))
        .await
        .unwrap();
    assert_eq!(signed_in.uid, uid);
    assert_eq!(notifier.current().unwrap().text, "Signed in successfully!");

    match next(&mut rx).await {
        Session::SignedIn(identity) => assert_eq!(identity.uid, uid),
        other => panic!("expected SignedIn, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sign_in_validation_and_rejection() {
    let (backend, notifier, observer) = setup();
    backend.add_account("owner@shop.test", "hunter22");

    let err = observer.sign_in("  ", &secret("x")).await.unwrap_err();
    assert_eq!(
        err,
        CoreError::Validation {
            message: "Please fill in all fields.".into()
        }
    );
    assert_eq!(backend.calls().sign_in, 0);

    let err = observer
        .sign_in("owner@shop.test", &secret("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Auth { .. }));
    let message = notifier.current().unwrap();
    assert_eq!(message.text, "Invalid email or password.");
    assert_eq!(message.severity, Severity::Error);
}

#[tokio::test]
async fn test_sign_up_rules() {
    let (backend, notifier, observer) = setup();
    backend.add_account("taken@shop.test", "secret1");

    let mismatch = observer
        .sign_up("new@shop.test", &secret("abcdef"), &secret("abcdeg"))
        .await
        .unwrap_err();
    assert_eq!(mismatch.to_string(), "Passwords do not match.");

    let short = observer
        .sign_up("new@shop.test", &secret("abc"), &secret("abc"))
        .await
        .unwrap_err();
    assert_eq!(short.to_string(), "Password should be at least 6 characters.");
    assert_eq!(backend.calls().sign_up, 0);

    let taken = observer
        .sign_up("taken@shop.test", &secret("secret1"), &secret("secret1"))
        .await
        .unwrap_err();
    assert_eq!(taken.to_string(), "That email address is already in use.");

    observer
        .sign_up("new@shop.test", &secret("abcdef"), &secret("abcdef"))
        .await
        .unwrap();
    assert_eq!(notifier.current().unwrap().text, "Account created successfully!");
}

#[tokio::test]
async fn test_password_reset() {
    let (backend, notifier, observer) = setup();
    backend.add_account("owner@shop.test", "hunter22");

    let empty = observer.send_password_reset("").await.unwrap_err();
    assert_eq!(empty.to_string(), "Please enter your email address.");

    observer.send_password_reset("owner@shop.test").await.unwrap();
    assert_eq!(backend.reset_requests("owner@shop.test"), 1);
    assert_eq!(
        notifier.current().unwrap().text,
        "Password reset link sent! Check your inbox."
    );

    let unknown = observer.send_password_reset("ghost@shop.test").await.unwrap_err();
    assert_eq!(
        unknown.to_string(),
        "Failed to send reset email. Please check the address."
    );
}

#[tokio::test]
async fn test_failed_sign_out_keeps_session() {
    let (backend, notifier, observer) = setup();
    backend.set_identity(Some(identity("u1")));
    let (on_change, mut rx) = recorder();
    let _sub = observer.start(on_change);
    assert_eq!(next(&mut rx).await, Session::SignedIn(identity("u1")));

    backend.fail_sign_out(true);
    let err = observer.sign_out().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to sign out.");
    assert_eq!(notifier.current().unwrap().severity, Severity::Error);
    assert_quiet(&mut rx).await;
    assert!(observer.current().is_signed_in());

    backend.fail_sign_out(false);
    observer.sign_out().await.unwrap();
    assert_eq!(next(&mut rx).await, Session::SignedOut);
}

#[tokio::test(start_paused = true)]
async fn test_second_sign_in_while_pending_is_busy() {
    let (backend, _notifier, observer) = setup();
    backend.add_account("owner@shop.test", "hunter22");
    backend.set_latency(Duration::from_millis(500));

    let password = secret("hunter22");
    let (first, second) = tokio::join!(observer.sign_in("owner@shop.test", &password), async {
        tokio::task::yield_now().await;
        observer.sign_in("owner@shop.test", &password).await
    });

    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), CoreError::Busy { operation: "Sign-in" });
    assert_eq!(backend.calls().sign_in, 1);
}
