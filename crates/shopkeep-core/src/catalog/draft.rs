// Raw "add product" form input and its validation.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;
use crate::model::NewProduct;

/// Product form fields exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub buying_price: String,
    pub selling_price: String,
    pub buying_unit: String,
    pub selling_unit: String,
    pub buying_point: String,
    /// Empty means today.
    pub date: String,
    pub image: String,
    pub price_info: String,
}

impl ProductDraft {
    /// Draft with just a name and a single price used for both sides.
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        let price = price.into();
        Self {
            name: name.into(),
            buying_price: price.clone(),
            selling_price: price,
            ..Self::default()
        }
    }

    /// Validate against today's local date.
    pub fn validate(&self) -> Result<NewProduct, CoreError> {
        self.validate_on(Local::now().date_naive())
    }

    /// Validate, filling an empty date with `today`.
    pub fn validate_on(&self, today: NaiveDate) -> Result<NewProduct, CoreError> {
        let name = self.name.trim();
        if name.is_empty() || self.buying_price.trim().is_empty() || self.selling_price.trim().is_empty()
        {
            return Err(CoreError::validation("Please fill in all fields."));
        }

        let buying_price = parse_price(&self.buying_price)?;
        let selling_price = parse_price(&self.selling_price)?;

        let image = match self.image.trim() {
            "" => None,
            raw => Some(
                Url::parse(raw)
                    .map_err(|_| CoreError::validation("Please enter a valid image URL."))?,
            ),
        };

        let date = match self.date.trim() {
            "" => today.format("%Y-%m-%d").to_string(),
            raw => raw.to_owned(),
        };

        Ok(NewProduct {
            name: name.to_owned(),
            buying_price,
            selling_price,
            buying_unit: self.buying_unit.trim().to_owned(),
            selling_unit: self.selling_unit.trim().to_owned(),
            buying_point: self.buying_point.trim().to_owned(),
            date,
            image,
            price_info: Some(self.price_info.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
        })
    }
}

fn parse_price(raw: &str) -> Result<f64, CoreError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| CoreError::validation("Please enter a valid price."))
}
