// ── Catalog ──
//
// Live product catalog: the synchronized snapshot and the product form.

mod draft;
mod sync;

pub use draft::ProductDraft;
pub use sync::{CatalogSync, SyncStatus};
