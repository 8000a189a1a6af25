//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use crate::config::DEFAULT_MAX_COMBINATIONS;
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::{ImageRef, VariantId};
use crate::domain::variants::{
    self, AttributeDefinition, AttributeMap, SelectedVariation, ValidationResult, VariantCatalog, VariantDefaults,
    VariantRecord,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    discount_price: Option<Decimal>,
    #[serde(default)]
    stock: i64,
    #[serde(default)]
    images: Vec<ImageRef>,
    #[serde(default)]
    attributes: Vec<AttributeDefinition>,
    #[serde(default)]
    has_variations: bool,
    #[serde(default)]
    variations: Vec<VariantRecord>,
    #[serde(default)]
    status: ProductStatus,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus { #[default] Draft, Active, Archived }

/// Operator edits to one variant; `None` leaves the field alone. For the
/// prices `Some(None)` clears the override (JSON `null`).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VariantEdit {
    #[serde(default, deserialize_with = "double_option")]
    pub price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub discount_price: Option<Option<Decimal>>,
    pub stock: Option<i64>,
    pub sku: Option<String>,
    pub images: Option<Vec<ImageRef>>,
    pub is_active: Option<bool>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Product {
    pub fn create(name: impl Into<String>, price: Option<Decimal>) -> Self {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();
        let mut product = Self {
            id: id.clone(), name: name.into(), description: String::new(), price, discount_price: None,
            stock: 0, images: vec![], attributes: vec![], has_variations: false, variations: vec![],
            status: ProductStatus::Draft, created_at: now, updated_at: now, events: vec![],
        };
        product.raise_event(DomainEvent::Product(ProductEvent::Created { product_id: id }));
        product
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn price(&self) -> Option<Decimal> { self.price }
    pub fn discount_price(&self) -> Option<Decimal> { self.discount_price }
    pub fn stock(&self) -> i64 { self.stock }
    pub fn attributes(&self) -> &[AttributeDefinition] { &self.attributes }
    pub fn has_variations(&self) -> bool { self.has_variations }
    pub fn status(&self) -> &ProductStatus { &self.status }

    pub fn update_price(&mut self, price: Option<Decimal>, discount_price: Option<Decimal>) {
        self.price = price;
        self.discount_price = discount_price;
        self.touch();
    }

    pub fn set_stock(&mut self, stock: i64) -> Result<(), ProductError> {
        if stock < 0 { return Err(ProductError::InvalidStock); }
        self.stock = stock;
        self.touch();
        Ok(())
    }

    pub fn add_image(&mut self, image: ImageRef) { self.images.push(image); self.touch(); }

    /// Replaces the attribute definitions and regenerates variations, carrying
    /// forward every combination that still exists. New combinations start at
    /// the product's base prices.
    pub fn define_attributes(&mut self, attributes: Vec<AttributeDefinition>) -> Result<ValidationResult, ProductError> {
        self.define_attributes_within(attributes, DEFAULT_MAX_COMBINATIONS)
    }

    /// As [`Product::define_attributes`], refusing input that expands to more
    /// than `limit` variants. Nothing changes when the limit is exceeded.
    pub fn define_attributes_within(&mut self, attributes: Vec<AttributeDefinition>, limit: usize) -> Result<ValidationResult, ProductError> {
        let usable = variants::attributes::usable(&attributes);
        match variants::attributes::combination_count(&usable) {
            Some(count) if count <= limit => {}
            _ => return Err(ProductError::TooManyCombinations { limit }),
        }
        let defaults = VariantDefaults { base_price: self.price, base_discount_price: self.discount_price };
        let outcome = variants::regenerate(&attributes, &self.variations, defaults);
        self.attributes = attributes;
        if outcome.changed {
            self.variations = outcome.variants;
            self.has_variations = !self.variations.is_empty();
            self.raise_event(DomainEvent::Product(ProductEvent::VariantsRegenerated {
                product_id: self.id.clone(),
                variant_count: self.variations.len(),
            }));
        }
        self.touch();
        Ok(outcome.validation)
    }

    pub fn variant(&self, id: &VariantId) -> Option<&VariantRecord> {
        self.variations.iter().find(|v| &v.variant_id == id)
    }

    pub fn update_variant(&mut self, id: &VariantId, edit: VariantEdit) -> Result<(), ProductError> {
        let variant = self.variations.iter_mut().find(|v| &v.variant_id == id).ok_or_else(|| ProductError::VariantNotFound(id.clone()))?;
        if let Some(stock) = edit.stock {
            if stock < 0 { return Err(ProductError::InvalidStock); }
            variant.stock = Some(stock);
        }
        if let Some(price) = edit.price { variant.price = price; }
        if let Some(discount) = edit.discount_price { variant.discount_price = discount; }
        if let Some(sku) = edit.sku { variant.sku = sku.trim().to_string(); }
        if let Some(images) = edit.images { variant.images = images; }
        if let Some(active) = edit.is_active { variant.is_active = active; }
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::VariantUpdated { product_id: self.id.clone(), variant_id: id.clone() }));
        Ok(())
    }

    pub fn validation(&self) -> ValidationResult { variants::validate(&self.attributes, &self.variations) }

    /// Snapshot for an add-to-cart of `attributes` (empty for products
    /// without variations).
    pub fn snapshot(&self, attributes: AttributeMap) -> SelectedVariation {
        SelectedVariation::capture(self, attributes, self.stock)
    }

    pub fn publish(&mut self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() { return Err(ProductError::MissingName); }
        let validation = self.validation();
        if !validation.is_valid { return Err(ProductError::InvalidVariants(validation.errors)); }
        self.status = ProductStatus::Active;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::Published { product_id: self.id.clone() }));
        Ok(())
    }

    pub fn archive(&mut self) { self.status = ProductStatus::Archived; self.touch(); }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

impl VariantCatalog for Product {
    fn base_price(&self) -> Option<Decimal> { self.price }
    fn base_discount_price(&self) -> Option<Decimal> { self.discount_price }
    fn variations(&self) -> &[VariantRecord] { &self.variations }
    fn images(&self) -> &[ImageRef] { &self.images }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("Missing name")]
    MissingName,
    #[error("Stock cannot be negative")]
    InvalidStock,
    #[error("Variant {0} not found")]
    VariantNotFound(VariantId),
    #[error("Variants are invalid: {}", .0.join("; "))]
    InvalidVariants(Vec<String>),
    #[error("Attributes expand to more than {limit} variants")]
    TooManyCombinations { limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::variants::resolve;

    fn phone() -> Product {
        let mut p = Product::create("Phone", Some(Decimal::new(1800, 0)));
        p.define_attributes(vec![
            AttributeDefinition::new("Color", ["Black", "White"]),
            AttributeDefinition::new("Storage", ["64GB", "128GB"]),
        ]).unwrap();
        p
    }

    #[test]
    fn test_product_create() {
        let mut p = Product::create("Test Product", Some(Decimal::new(1999, 2)));
        assert_eq!(p.name(), "Test Product");
        assert!(!p.has_variations());
        assert_eq!(p.take_events(), vec![DomainEvent::Product(ProductEvent::Created { product_id: p.id().to_string() })]);
    }

    #[test]
    fn test_define_attributes_generates_variations() {
        let mut p = phone();
        assert!(p.has_variations());
        assert_eq!(p.variations().len(), 4);
        assert!(p.variations().iter().all(|v| v.price == Some(Decimal::new(1800, 0))));
        let events = p.take_events();
        assert!(events.contains(&DomainEvent::Product(ProductEvent::VariantsRegenerated { product_id: p.id().to_string(), variant_count: 4 })));
    }

    #[test]
    fn test_redefining_same_attributes_is_quiet() {
        let mut p = phone();
        p.take_events();
        let ids: Vec<_> = p.variations().iter().map(|v| v.variant_id.clone()).collect();
        p.define_attributes(p.attributes().to_vec()).unwrap();
        assert!(p.take_events().is_empty());
        assert_eq!(p.variations().iter().map(|v| v.variant_id.clone()).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_clearing_attributes_clears_variations() {
        let mut p = phone();
        p.define_attributes(vec![]).unwrap();
        assert!(!p.has_variations());
        assert!(p.variations().is_empty());
    }

    #[test]
    fn test_update_variant() {
        let mut p = phone();
        let id = p.variations()[0].variant_id.clone();
        p.update_variant(&id, VariantEdit { stock: Some(5), sku: Some(" BLK-64 ".into()), ..VariantEdit::default() }).unwrap();
        let v = p.variant(&id).unwrap();
        assert_eq!(v.stock, Some(5));
        assert_eq!(v.sku, "BLK-64");
        assert_eq!(p.update_variant(&id, VariantEdit { stock: Some(-1), ..VariantEdit::default() }), Err(ProductError::InvalidStock));
        let missing = VariantId::from("nope");
        assert_eq!(p.update_variant(&missing, VariantEdit::default()), Err(ProductError::VariantNotFound(missing.clone())));
    }

    #[test]
    fn test_update_variant_clears_price_overrides() {
        let mut p = Product::create("Tee", Some(Decimal::new(20, 0)));
        p.define_attributes(vec![AttributeDefinition::new("Size", ["M"])]).unwrap();
        let id = p.variations()[0].variant_id.clone();
        let size_m = SelectedVariation::of([("Size", "M")].into_iter().collect());

        p.update_variant(&id, VariantEdit { discount_price: Some(Some(Decimal::new(15, 0))), ..VariantEdit::default() }).unwrap();
        assert_eq!(resolve(&p, Some(&size_m)).price, Decimal::new(15, 0));

        p.update_variant(&id, VariantEdit { discount_price: Some(None), ..VariantEdit::default() }).unwrap();
        assert_eq!(p.variant(&id).unwrap().discount_price, None);
        assert_eq!(resolve(&p, Some(&size_m)).price, Decimal::new(20, 0));

        p.update_variant(&id, VariantEdit { price: Some(None), ..VariantEdit::default() }).unwrap();
        assert_eq!(p.variant(&id).unwrap().price, None);
    }

    #[test]
    fn test_variant_edit_json_distinguishes_null_from_absent() {
        let edit: VariantEdit = serde_json::from_str(r#"{"discount_price": null, "stock": 2}"#).unwrap();
        assert_eq!(edit.discount_price, Some(None));
        assert_eq!(edit.price, None);
        let edit: VariantEdit = serde_json::from_str(r#"{"price": "12.50"}"#).unwrap();
        assert_eq!(edit.price, Some(Some(Decimal::new(1250, 2))));
    }

    #[test]
    fn test_define_attributes_enforces_combination_limit() {
        let mut p = phone();
        let ids: Vec<_> = p.variations().iter().map(|v| v.variant_id.clone()).collect();
        let wider = vec![
            AttributeDefinition::new("Color", ["Black", "White", "Blue"]),
            AttributeDefinition::new("Storage", ["64GB", "128GB"]),
        ];
        assert_eq!(p.define_attributes_within(wider.clone(), 5), Err(ProductError::TooManyCombinations { limit: 5 }));
        assert_eq!(p.variations().iter().map(|v| v.variant_id.clone()).collect::<Vec<_>>(), ids);
        assert_eq!(p.attributes().len(), 2);
        assert!(p.define_attributes_within(wider, 6).unwrap().is_valid);
        assert_eq!(p.variations().len(), 6);
    }

    #[test]
    fn test_publish_blocked_by_validation() {
        let mut p = phone();
        let id = p.variations()[1].variant_id.clone();
        p.update_variant(&id, VariantEdit { sku: Some("  ".into()), ..VariantEdit::default() }).unwrap();
        assert_eq!(p.publish(), Err(ProductError::InvalidVariants(vec!["Variant 2: SKU is required".to_string()])));
        p.update_variant(&id, VariantEdit { sku: Some("BLK-128".into()), ..VariantEdit::default() }).unwrap();
        p.publish().unwrap();
        assert_eq!(p.status(), &ProductStatus::Active);
    }

    #[test]
    fn test_product_resolves_as_catalog() {
        let mut p = phone();
        p.update_price(Some(Decimal::new(1800, 0)), Some(Decimal::new(1600, 0)));
        assert_eq!(resolve(&p, None).price, Decimal::new(1600, 0));
        let selection: AttributeMap = [("Color", "White"), ("Storage", "64GB")].into_iter().collect();
        let snapshot = p.snapshot(selection);
        assert_eq!(snapshot.price, Some(Decimal::new(1800, 0)));
        assert_eq!(snapshot.stock, Some(0));
    }

    #[test]
    fn test_product_deserializes_from_catalog_json() {
        let json = r#"{
            "id": "p1", "name": "Tee", "price": 20, "stock": 3, "has_variations": true,
            "variations": [{"variant_id": "v1", "attributes": [["Size", "M"]], "stock": 4, "sku": "SIZ-M"}]
        }"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.variations()[0].attributes.get("Size"), Some("M"));
        assert_eq!(p.price(), Some(Decimal::new(20, 0)));
        assert_eq!(p.stock(), 3);
    }
}
