// Document service: REST client, wire models and the polling feed.

mod client;
mod models;
mod poller;

pub use client::{DEFAULT_DOCUMENTS_URL, DocumentsClient};
pub use models::{Document, Fields, NewDocument, Value};
pub use poller::poll_collection;
