// ── Wire-to-domain conversions ──
//
// Bridges `shopkeep_api` documents into `model::Product` and back.
// Field names follow the stored camelCase schema. Reads are lenient:
// a missing or malformed field becomes an empty default and is logged,
// so one bad document never hides the rest of the catalog.

use shopkeep_api::firestore::{Document, Fields, Value};
use tracing::warn;
use url::Url;

use crate::model::{NewProduct, Product};

const NAME: &str = "name";
const BUYING_PRICE: &str = "buyingPrice";
const SELLING_PRICE: &str = "sellingPrice";
const BUYING_UNIT: &str = "buyingUnit";
const SELLING_UNIT: &str = "sellingUnit";
const BUYING_POINT: &str = "buyingPoint";
const DATE: &str = "date";
const IMAGE: &str = "image";
const PRICE_INFO: &str = "priceInfo";

// ── Helpers ────────────────────────────────────────────────────────

fn text(doc: &Document, key: &str) -> String {
    doc.field(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn optional_text(doc: &Document, key: &str) -> Option<String> {
    doc.field(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn price(doc: &Document, key: &str) -> f64 {
    match doc.field(key).and_then(Value::as_f64) {
        Some(v) if v.is_finite() => v,
        _ => {
            warn!(id = doc.id(), field = key, "missing or non-numeric price, using 0");
            0.0
        }
    }
}

fn image(doc: &Document) -> Option<Url> {
    let raw = optional_text(doc, IMAGE)?;
    match Url::parse(&raw) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(id = doc.id(), error = %e, "ignoring unparseable image URL");
            None
        }
    }
}

// ── Product ────────────────────────────────────────────────────────

impl From<&Document> for Product {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id().to_owned(),
            name: text(doc, NAME),
            buying_price: price(doc, BUYING_PRICE),
            selling_price: price(doc, SELLING_PRICE),
            buying_unit: text(doc, BUYING_UNIT),
            selling_unit: text(doc, SELLING_UNIT),
            buying_point: text(doc, BUYING_POINT),
            date: text(doc, DATE),
            image: image(doc),
            price_info: optional_text(doc, PRICE_INFO),
        }
    }
}

/// Document fields for a new product. Optional fields are omitted
/// rather than written as nulls.
pub(crate) fn product_fields(product: &NewProduct) -> Fields {
    let mut fields = Fields::new();
    fields.insert(NAME.into(), Value::string(&product.name));
    fields.insert(BUYING_PRICE.into(), Value::double(product.buying_price));
    fields.insert(SELLING_PRICE.into(), Value::double(product.selling_price));
    fields.insert(BUYING_UNIT.into(), Value::string(&product.buying_unit));
    fields.insert(SELLING_UNIT.into(), Value::string(&product.selling_unit));
    fields.insert(BUYING_POINT.into(), Value::string(&product.buying_point));
    fields.insert(DATE.into(), Value::string(&product.date));
    if let Some(ref url) = product.image {
        fields.insert(IMAGE.into(), Value::string(url.as_str()));
    }
    if let Some(ref info) = product.price_info {
        fields.insert(PRICE_INFO.into(), Value::string(info));
    }
    fields
}
