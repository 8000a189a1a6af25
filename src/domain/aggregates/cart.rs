//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::{ImageRef, Money, VariantId};
use crate::domain::variants::{resolve, AttributeMap, Resolution, SelectedVariation, VariantCatalog};

#[derive(Clone, Debug, Serialize)]
pub struct Cart {
    id: String,
    customer_id: Option<String>,
    items: Vec<CartItem>,
    subtotal: Money,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// One cart line. `selection` is frozen at add time; only `quantity` changes
/// afterwards.
#[derive(Clone, Debug, Serialize)]
pub struct CartItem {
    pub product_id: String,
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub sku: Option<String>,
    pub quantity: u32,
    pub selection: SelectedVariation,
    pub unit_price: Money,
    pub image: Option<ImageRef>,
}

impl CartItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }

    /// Resolution for rendering this line against the current catalog entry.
    pub fn resolve(&self, product: &Product) -> Resolution { resolve(product, Some(&self.selection)) }

    fn is_line_for(&self, product_id: &str, attributes: &AttributeMap) -> bool {
        self.product_id == product_id && self.selection.attributes == *attributes
    }
}

/// A line asking for more than the live catalog currently holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StockShortfall {
    pub product_id: String,
    pub attributes: AttributeMap,
    pub requested: u32,
    pub available: i64,
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        let currency = currency.to_uppercase();
        Self {
            id: Uuid::new_v4().to_string(), customer_id: None,
            items: vec![], subtotal: Money::zero(&currency), currency,
            created_at: Utc::now(), updated_at: Utc::now(),
        }
    }

    pub fn for_customer(customer_id: impl Into<String>, currency: &str) -> Self {
        let mut cart = Self::new(currency);
        cart.customer_id = Some(customer_id.into());
        cart
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn customer_id(&self) -> Option<&str> { self.customer_id.as_deref() }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Adds `quantity` of the chosen combination (`None` for products without
    /// variations). A new line snapshots the catalog and needs an active
    /// variant; an existing line for the same combination only grows, checked
    /// against what its snapshot resolves to.
    pub fn add_product(&mut self, product: &Product, attributes: Option<AttributeMap>, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 { return Err(CartError::InvalidQuantity); }
        let attributes = match attributes {
            Some(a) if !a.is_empty() => a,
            _ if product.has_variations() => return Err(CartError::VariationRequired),
            _ => AttributeMap::new(),
        };

        if let Some(pos) = self.items.iter().position(|i| i.is_line_for(product.id(), &attributes)) {
            let available = self.items[pos].resolve(product).stock;
            let existing = &mut self.items[pos];
            let wanted = existing.quantity.saturating_add(quantity);
            if i64::from(wanted) > available { return Err(CartError::InsufficientStock { available }); }
            existing.quantity = wanted;
        } else {
            let selection = product.snapshot(attributes);
            let resolution = resolve(product, Some(&selection));
            if product.has_variations() {
                let record = resolution.variant_id.as_ref().and_then(|id| product.variant(id)).ok_or(CartError::UnknownVariation)?;
                if !record.is_active { return Err(CartError::VariationUnavailable); }
            }
            self.push_line(product, selection, resolution, quantity)?;
        }
        self.recalculate();
        Ok(())
    }

    /// Re-creates a line from a snapshot stored with an earlier cart. Price
    /// and stock come from the snapshot, not the live catalog.
    pub fn restore_line(&mut self, product: &Product, selection: SelectedVariation, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 { return Err(CartError::InvalidQuantity); }
        if self.items.iter().any(|i| i.is_line_for(product.id(), &selection.attributes)) {
            return Err(CartError::DuplicateLine);
        }
        let resolution = resolve(product, Some(&selection));
        self.push_line(product, selection, resolution, quantity)?;
        self.recalculate();
        Ok(())
    }

    fn push_line(&mut self, product: &Product, selection: SelectedVariation, resolution: Resolution, quantity: u32) -> Result<(), CartError> {
        if !resolution.in_stock() { return Err(CartError::OutOfStock); }
        if i64::from(quantity) > resolution.stock { return Err(CartError::InsufficientStock { available: resolution.stock }); }
        let sku = resolution.variant_id.as_ref()
            .and_then(|id| product.variations().iter().find(|v| &v.variant_id == id))
            .map(|v| v.sku.clone());
        self.items.push(CartItem {
            product_id: product.id().to_string(),
            variant_id: resolution.variant_id,
            name: product.name().to_string(),
            sku,
            quantity,
            selection,
            unit_price: Money::new(resolution.price, &self.currency),
            image: resolution.image,
        });
        Ok(())
    }

    /// Sets the line's quantity; zero removes it. Stock is whatever the line's
    /// snapshot resolves to against `product`.
    pub fn update_quantity(&mut self, product: &Product, attributes: &AttributeMap, quantity: u32) -> Result<(), CartError> {
        let pos = self.items.iter().position(|i| i.is_line_for(product.id(), attributes)).ok_or(CartError::ItemNotFound)?;
        if quantity == 0 {
            self.items.remove(pos);
        } else {
            let available = self.items[pos].resolve(product).stock;
            if i64::from(quantity) > available { return Err(CartError::InsufficientStock { available }); }
            self.items[pos].quantity = quantity;
        }
        self.recalculate();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str, attributes: &AttributeMap) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| !i.is_line_for(product_id, attributes));
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        self.recalculate();
        Ok(())
    }

    pub fn clear(&mut self) { self.items.clear(); self.recalculate(); }

    /// Lines whose quantity the live catalog can no longer cover. Snapshots
    /// stay authoritative for pricing; this is an advisory re-check before
    /// checkout. Lines whose product is absent from `products` are skipped.
    pub fn live_stock_check(&self, products: &[Product]) -> Vec<StockShortfall> {
        self.items.iter().filter_map(|item| {
            let product = products.iter().find(|p| p.id() == item.product_id)?;
            let available = if product.has_variations() {
                resolve(product, Some(&SelectedVariation::of(item.selection.attributes.clone()))).stock
            } else {
                product.stock().max(0)
            };
            (i64::from(item.quantity) > available).then(|| StockShortfall {
                product_id: item.product_id.clone(),
                attributes: item.selection.attributes.clone(),
                requested: item.quantity,
                available,
            })
        }).collect()
    }

    fn recalculate(&mut self) {
        self.subtotal = self.items.iter().fold(Money::zero(&self.currency), |acc, i| acc.add(&i.line_total()).unwrap_or(acc));
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("Item not found")]
    ItemNotFound,
    #[error("Quantity must be at least one")]
    InvalidQuantity,
    #[error("Choose a variation before adding this product")]
    VariationRequired,
    #[error("Selected variation does not exist")]
    UnknownVariation,
    #[error("Selected variation is not available")]
    VariationUnavailable,
    #[error("Cart already has a line for this variation")]
    DuplicateLine,
    #[error("Out of stock")]
    OutOfStock,
    #[error("Only {available} left in stock")]
    InsufficientStock { available: i64 },
}
