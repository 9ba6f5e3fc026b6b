//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use shopkeep_core::{CatalogSnapshot, MainScope, Storefront, Subscription, SyncStatus};

use crate::cli::GlobalOpts;
use crate::config::ActiveProfile;
use crate::error::CliError;
use crate::output;

/// Echo info feedback to stderr while the returned subscription lives.
///
/// Errors are not echoed: they come back as the command's `CliError`.
pub fn echo_feedback(storefront: &Storefront, global: &GlobalOpts) -> Option<Subscription> {
    if global.quiet {
        return None;
    }
    let color = output::should_color(&global.color);
    Some(storefront.notifier().subscribe(move |message| {
        if !message.is_error() {
            eprintln!("{}", output::feedback_line(&message, color));
        }
    }))
}

/// A stderr spinner, hidden when quiet or not on a terminal.
pub fn spinner(message: &'static str, global: &GlobalOpts) -> ProgressBar {
    if global.quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Start the storefront, sign in with the profile's credentials and wait
/// until the signed-in scope is mounted.
pub async fn sign_in(
    storefront: &Storefront,
    active: &ActiveProfile,
    email: Option<&str>,
) -> Result<MainScope, CliError> {
    let (email, password) = active.credentials(email)?;
    storefront.init();
    storefront
        .session()
        .sign_in(&email, &password)
        .await
        .map_err(|e| CliError::from(e).for_profile(&active.name))?;

    let mut main = storefront.main_feed();
    let mounted = tokio::time::timeout(active.timeout(), main.wait_for(Option::is_some))
        .await
        .map_err(|_| CliError::Timeout {
            what: "the session",
            seconds: active.timeout().as_secs(),
        })?;
    mounted.flatten().ok_or(CliError::NotSignedIn)
}

/// Wait for the first catalog snapshot, or the fault that replaced it.
pub async fn first_snapshot(
    storefront: &Storefront,
    scope: &MainScope,
    timeout: Duration,
) -> Result<CatalogSnapshot, CliError> {
    let mut status = scope.catalog.status_feed();
    let settled = tokio::time::timeout(
        timeout,
        status.wait_for(|s| !matches!(s, SyncStatus::Idle | SyncStatus::Connecting)),
    )
    .await
    .map_err(|_| CliError::Timeout {
        what: "the catalog",
        seconds: timeout.as_secs(),
    })?;

    match settled {
        Some(SyncStatus::Live) => scope
            .catalog
            .latest()
            .ok_or_else(|| subscription_fault(storefront)),
        _ => Err(subscription_fault(storefront)),
    }
}

/// The fault text the catalog published, or a generic one.
pub fn subscription_fault(storefront: &Storefront) -> CliError {
    let message = storefront
        .notifier()
        .current()
        .filter(|m| m.is_error())
        .map_or_else(|| "Catalog subscription ended.".to_owned(), |m| m.text.clone());
    CliError::SubscriptionFault { message }
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::InvalidValue {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
