// shopkeep-api: Async REST client for the identity and document services.

pub mod error;
pub mod firestore;
pub mod identity;
pub mod transport;

pub use error::Error;
pub use firestore::{DocumentsClient, poll_collection};
pub use identity::{AuthSession, IdentityClient};
pub use transport::TransportConfig;
