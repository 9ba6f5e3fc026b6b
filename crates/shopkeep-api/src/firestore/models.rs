// Document service wire models
//
// Typed values use the service's single-key object encoding:
// `{"stringValue": "Hammer"}`, `{"doubleValue": 12.5}`, and so on.
// Serde's externally tagged enums produce exactly that shape.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// 64-bit integers travel as decimal strings.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(serde_json::Value),
    MapValue(serde_json::Value),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Self::StringValue(s.into())
    }

    pub fn double(v: f64) -> Self {
        Self::DoubleValue(v)
    }

    /// The value as text, if it is a string (or timestamp) value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::StringValue(s) | Self::TimestampValue(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a number. Integer and numeric-string values are
    /// accepted since older clients wrote prices as text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::DoubleValue(v) => Some(*v),
            Self::IntegerValue(s) | Self::StringValue(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Field map of a document, ordered by key for stable serialization.
pub type Fields = BTreeMap<String, Value>;

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name: `projects/{p}/databases/(default)/documents/{path}/{id}`.
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// The document id: last segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Body sent when creating a document.
#[derive(Debug, Clone, Serialize)]
pub struct NewDocument {
    pub fields: Fields,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    pub error: StatusBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_uses_single_key_encoding() {
        let v = serde_json::to_value(Value::string("Hammer")).unwrap();
        assert_eq!(v, json!({ "stringValue": "Hammer" }));

        let v = serde_json::to_value(Value::NullValue(())).unwrap();
        assert_eq!(v, json!({ "nullValue": null }));
    }

    #[test]
    fn document_parses_and_exposes_id() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/companies/acme/products/abc123",
            "fields": {
                "name": { "stringValue": "Hammer" },
                "buyingPrice": { "integerValue": "120" },
                "sellingPrice": { "doubleValue": 150.5 }
            },
            "updateTime": "2024-06-15T10:30:00.123456Z"
        }))
        .unwrap();

        assert_eq!(doc.id(), "abc123");
        assert_eq!(doc.field("name").and_then(Value::as_str), Some("Hammer"));
        assert_eq!(doc.field("buyingPrice").and_then(Value::as_f64), Some(120.0));
        assert_eq!(doc.field("sellingPrice").and_then(Value::as_f64), Some(150.5));
        assert!(doc.update_time.is_some());
    }

    #[test]
    fn numeric_strings_parse_as_numbers() {
        assert_eq!(Value::string(" 10.5 ").as_f64(), Some(10.5));
        assert_eq!(Value::string("ten").as_f64(), None);
        assert_eq!(Value::BooleanValue(true).as_f64(), None);
    }
}
