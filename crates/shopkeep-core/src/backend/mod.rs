// ── Backend implementations ──
//
// `FirebaseBackend` talks to the hosted services through shopkeep-api.
// `MemoryBackend` keeps everything in-process for tests and demos.

mod firebase;
mod memory;

pub use firebase::FirebaseBackend;
pub use memory::{CallCounts, MemoryBackend};
