// ── Product catalog types ──

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

/// A catalog item as stored remotely. The client only ever holds a
/// read-only cached copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned document id.
    pub id: String,
    pub name: String,
    pub buying_price: f64,
    pub selling_price: f64,
    pub buying_unit: String,
    pub selling_unit: String,
    /// Where the item is bought from.
    pub buying_point: String,
    /// Free-form purchase date as entered, usually `YYYY-MM-DD`.
    pub date: String,
    pub image: Option<Url>,
    pub price_info: Option<String>,
}

/// A validated product ready to be written. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub buying_price: f64,
    pub selling_price: f64,
    pub buying_unit: String,
    pub selling_unit: String,
    pub buying_point: String,
    pub date: String,
    pub image: Option<Url>,
    pub price_info: Option<String>,
}

impl NewProduct {
    /// Attach the id the store assigned.
    pub fn with_id(self, id: impl Into<String>) -> Product {
        Product {
            id: id.into(),
            name: self.name,
            buying_price: self.buying_price,
            selling_price: self.selling_price,
            buying_unit: self.buying_unit,
            selling_unit: self.selling_unit,
            buying_point: self.buying_point,
            date: self.date,
            image: self.image,
            price_info: self.price_info,
        }
    }
}

/// Shared, immutable product list handed to every consumer.
pub type ProductList = Arc<Vec<Arc<Product>>>;

/// One delivery of the live catalog.
///
/// Items are in the order the store reported them; nothing re-sorts them.
/// `revision` is 0 for the first delivery of a subscription and grows by
/// one per delivery.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub items: ProductList,
    pub revision: u64,
}

impl CatalogSnapshot {
    pub fn new(items: Vec<Product>, revision: u64) -> Self {
        Self {
            items: Arc::new(items.into_iter().map(Arc::new).collect()),
            revision,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an item by id.
    pub fn get(&self, id: &str) -> Option<Arc<Product>> {
        self.items.iter().find(|p| p.id == id).cloned()
    }
}
