// ── Storefront domain model ──
//
// Canonical types shared by every service in this crate. Backends convert
// their wire formats into these; consumers (CLI, UI shells) depend only on
// this module.

pub mod feedback;
pub mod path;
pub mod product;
pub mod session;

// ── Re-exports ──────────────────────────────────────────────────────

pub use feedback::{FeedbackMessage, Severity};
pub use path::CollectionPath;
pub use product::{CatalogSnapshot, NewProduct, Product, ProductList};
pub use session::{Identity, Session};
