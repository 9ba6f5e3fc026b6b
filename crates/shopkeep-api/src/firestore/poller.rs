// Live collection feed
//
// The REST surface has no push channel, so a collection subscription is
// a poll loop: list on start, then re-list every interval and emit only
// when the listing changed. Each emission is the full ordered list.

use std::sync::Arc;
use std::time::Duration;

use futures_core::Stream;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::client::DocumentsClient;
use super::models::Document;
use crate::error::Error;
use crate::identity::IdentityClient;

/// Poll `collection` and yield the full document list whenever it changes.
///
/// The first successful listing is always yielded. Transient failures are
/// logged and retried on the next tick; any other failure is yielded once
/// and ends the stream. Dropping the stream stops polling.
pub fn poll_collection(
    identity: Arc<IdentityClient>,
    documents: Arc<DocumentsClient>,
    collection: String,
    interval: Duration,
) -> impl Stream<Item = Result<Vec<Document>, Error>> + Send + 'static {
    async_stream::stream! {
        let mut last: Option<Vec<Document>> = None;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let token = match identity.fresh_id_token().await {
                Ok(token) => token,
                Err(e) if e.is_transient() => {
                    warn!(collection = %collection, error = %e, "token refresh failed, retrying");
                    continue;
                }
                Err(e) => {
                    yield Err(e);
                    break;
                }
            };

            match documents.list_documents(&collection, &token).await {
                Ok(docs) => {
                    if last.as_ref() == Some(&docs) {
                        continue;
                    }
                    debug!(collection = %collection, count = docs.len(), "collection changed");
                    last = Some(docs.clone());
                    yield Ok(docs);
                }
                Err(e) if e.is_transient() => {
                    warn!(collection = %collection, error = %e, "poll failed, retrying");
                }
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    }
}
