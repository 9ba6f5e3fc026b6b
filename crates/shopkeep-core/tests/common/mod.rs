// Shared helpers for shopkeep-core integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::time::Duration;

use tokio::sync::mpsc;

use shopkeep_core::{CollectionPath, NewProduct, Product};

pub const WAIT: Duration = Duration::from_secs(2);

pub fn path() -> CollectionPath {
    CollectionPath::products("acme").unwrap()
}

pub fn product(id: &str, name: &str) -> Product {
    NewProduct {
        name: name.into(),
        buying_price: 10.0,
        selling_price: 12.5,
        buying_unit: "pc".into(),
        selling_unit: "pc".into(),
        buying_point: "Market Road".into(),
        date: "2026-10-01".into(),
        image: None,
        price_info: None,
    }
    .with_id(id)
}

/// A callback that forwards everything it receives into a channel.
pub fn recorder<T: Send + 'static>() -> (impl FnMut(T) + Send + 'static, mpsc::UnboundedReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |value| {
            let _ = tx.send(value);
        },
        rx,
    )
}

/// Receive the next value or fail after [`WAIT`].
pub async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for callback")
        .expect("callback channel closed")
}

/// Assert nothing arrives for a short while.
pub async fn assert_quiet<T: std::fmt::Debug>(rx: &mut mpsc::UnboundedReceiver<T>) {
    if let Ok(Some(value)) = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
        panic!("unexpected callback: {value:?}");
    }
}
