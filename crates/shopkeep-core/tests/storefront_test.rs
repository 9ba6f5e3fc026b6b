#![allow(clippy::unwrap_used)]
// Integration tests for the `Storefront` context over `MemoryBackend`.

mod common;

use std::sync::Arc;

use secrecy::SecretString;

use shopkeep_core::{
    MemoryBackend, ProductDraft, Route, ScreenTree, Storefront, StorefrontConfig, SyncStatus,
};

use common::{WAIT, product};

// ── Helpers ─────────────────────────────────────────────────────────

fn setup() -> (MemoryBackend, Storefront) {
    let backend = MemoryBackend::new();
    let storefront = Storefront::new(
        StorefrontConfig::new("acme"),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
    )
    .unwrap();
    (backend, storefront)
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_in_mounts_main_scope_and_sign_out_unmounts() {
    let (backend, storefront) = setup();
    backend.add_account("owner@shop.test", "hunter22");
    backend.set_items(&common::path(), vec![product("a", "Hammer")]);

    assert_eq!(storefront.navigator().current(), Route::Splash);
    storefront.init();

    let mut routes = storefront.navigator().feed();
    tokio::time::timeout(WAIT, routes.wait_for(|r| *r == Route::Login))
        .await
        .unwrap()
        .unwrap();
    assert!(storefront.main().is_none());

    storefront
        .session()
        .sign_in("owner@shop.test", &SecretString::from("hunter22".to_owned()))
        .await
        .unwrap();

    let mut main = storefront.main_feed();
    let scope = tokio::time::timeout(WAIT, main.wait_for(Option::is_some))
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(storefront.navigator().tree(), ScreenTree::Main);

    let mut catalog = scope.catalog.feed();
    let snapshot = tokio::time::timeout(WAIT, catalog.wait_for(Option::is_some))
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.items[0].name, "Hammer");

    storefront.session().sign_out().await.unwrap();
    tokio::time::timeout(WAIT, main.wait_for(Option::is_none))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(storefront.navigator().current(), Route::Login);
    assert_eq!(scope.catalog.status(), SyncStatus::Cancelled);
}

#[tokio::test]
async fn test_added_product_reaches_search() {
    let (backend, storefront) = setup();
    backend.add_account("owner@shop.test", "hunter22");
    storefront.init();
    storefront
        .session()
        .sign_in("owner@shop.test", &SecretString::from("hunter22".to_owned()))
        .await
        .unwrap();

    let scope = tokio::time::timeout(WAIT, storefront.main_feed().wait_for(Option::is_some))
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    scope
        .catalog
        .add_product(&ProductDraft::new("Claw Hammer", "350"))
        .await
        .unwrap();
    scope.search.set_query("hammer");

    let state = tokio::time::timeout(
        WAIT,
        scope.search.feed().wait_for(|s| !s.filtered.is_empty()),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(state.filtered[0].name, "Claw Hammer");
}

#[tokio::test]
async fn test_teardown_cancels_everything() {
    let (backend, storefront) = setup();
    backend.set_identity(Some(shopkeep_core::Identity {
        uid: "u1".into(),
        email: None,
    }));
    storefront.init();
    storefront.init();

    let scope = tokio::time::timeout(WAIT, storefront.main_feed().wait_for(Option::is_some))
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let mut status = scope.catalog.status_feed();
    tokio::time::timeout(WAIT, status.wait_for(|s| *s == SyncStatus::Live))
        .await
        .unwrap()
        .unwrap();
    // One subscription despite the double init.
    assert_eq!(backend.calls().subscribe, 1);

    storefront.teardown();
    assert!(storefront.main().is_none());
    assert_eq!(storefront.navigator().current(), Route::Splash);
    assert_eq!(scope.catalog.status(), SyncStatus::Cancelled);

    // Identity changes after teardown no longer mount anything.
    backend.set_identity(Some(shopkeep_core::Identity {
        uid: "u2".into(),
        email: None,
    }));
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(storefront.main().is_none());
}

#[tokio::test]
async fn test_init_after_teardown_mounts_again() {
    let (backend, storefront) = setup();
    backend.set_identity(Some(shopkeep_core::Identity {
        uid: "u1".into(),
        email: None,
    }));
    storefront.init();
    tokio::time::timeout(WAIT, storefront.main_feed().wait_for(Option::is_some))
        .await
        .unwrap()
        .unwrap();

    storefront.teardown();
    assert!(storefront.main().is_none());

    storefront.init();
    let scope = tokio::time::timeout(WAIT, storefront.main_feed().wait_for(Option::is_some))
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(scope.identity.uid, "u1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_teardown_racing_sign_in_leaves_nothing_mounted() {
    for _ in 0..20 {
        let (backend, storefront) = setup();
        storefront.init();
        let signer = {
            let backend = backend.clone();
            tokio::spawn(async move {
                backend.set_identity(Some(shopkeep_core::Identity {
                    uid: "u1".into(),
                    email: None,
                }));
            })
        };
        storefront.teardown();
        signer.await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(storefront.main().is_none());
        assert_eq!(backend.subscriber_count(&common::path()), 0);
    }
}

#[tokio::test]
async fn test_feedback_latest_wins() {
    let (_backend, storefront) = setup();
    let notifier = storefront.notifier();
    notifier.info("M1");
    notifier.info("M2");
    assert_eq!(notifier.current().unwrap().text, "M2");
}
