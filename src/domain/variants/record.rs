//! Variant records: one priced, stocked, imaged SKU per attribute combination.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::attribute_map::AttributeMap;
use super::sku;
use crate::domain::value_objects::{ImageRef, VariantId};

/// Prices applied to combinations seen for the first time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDefaults {
    pub base_price: Option<Decimal>,
    pub base_discount_price: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub variant_id: VariantId,
    pub attributes: AttributeMap,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    /// `None` only for records that came back incomplete from outside; the
    /// generator always sets it.
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl VariantRecord {
    /// A record for a combination with no history.
    pub fn fresh(attributes: AttributeMap, defaults: &VariantDefaults) -> Self {
        let sku = sku::synthesize(&attributes);
        Self {
            variant_id: VariantId::generate(),
            attributes,
            price: defaults.base_price,
            discount_price: defaults.base_discount_price,
            stock: Some(0),
            sku,
            images: Vec::new(),
            is_active: true,
        }
    }

    /// Stock as a count, with missing or negative values read as zero.
    pub fn available_stock(&self) -> i64 {
        self.stock.unwrap_or(0).max(0)
    }
}
