//! Effective price, stock and image for a line item.
//!
//! Cart, checkout, order history and admin previews all go through
//! [`resolve`]; none of them re-derive the fallback order themselves.
//!
//! Price: snapshot discount (non-zero) -> snapshot price -> matched variant
//! (`discount ?? price ?? product price ?? 0`) -> product
//! (`discount ?? price ?? 0`).
//! Stock: snapshot -> matched variant -> `0`.
//! Image: snapshot -> matched variant -> product -> none.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::attribute_map::AttributeMap;
use super::record::VariantRecord;
use crate::domain::value_objects::{ImageRef, VariantId};

/// Read access to a product as the resolver needs it.
pub trait VariantCatalog {
    fn base_price(&self) -> Option<Decimal>;
    fn base_discount_price(&self) -> Option<Decimal>;
    fn variations(&self) -> &[VariantRecord];
    fn images(&self) -> &[ImageRef];
}

/// Frozen copy of a chosen combination, taken when the item enters a cart.
/// Its own price and stock outrank the live catalog from then on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectedVariation {
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl SelectedVariation {
    /// A selection carrying attributes only; resolves purely against the
    /// live catalog.
    pub fn of(attributes: AttributeMap) -> Self {
        Self { attributes, ..Self::default() }
    }

    /// Snapshot of what the catalog currently says about `attributes`.
    ///
    /// Resolving the returned snapshot gives the same price, stock and image
    /// the live catalog gives today. Products without variations snapshot
    /// their base stock.
    pub fn capture<P: VariantCatalog + ?Sized>(product: &P, attributes: AttributeMap, base_stock: i64) -> Self {
        let bare = Self::of(attributes);
        let live = resolve(product, Some(&bare));
        let matched = find_match(product, &bare.attributes);

        let list_price = matched.and_then(|r| r.price).or(product.base_price()).unwrap_or(live.price);
        let (price, discount_price) = if !live.price.is_zero() && live.price < list_price {
            (list_price, Some(live.price))
        } else {
            (live.price, None)
        };

        let stock = match matched {
            Some(_) => live.stock,
            None if product.variations().is_empty() => base_stock.max(0),
            None => 0,
        };

        let images = match matched {
            Some(r) if !r.images.is_empty() => r.images.clone(),
            _ => product.images().to_vec(),
        };

        Self { attributes: bare.attributes, stock: Some(stock), price: Some(price), discount_price, images }
    }
}

/// Which fallback step produced [`Resolution::price`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    SnapshotDiscount,
    SnapshotPrice,
    VariantDiscount,
    VariantPrice,
    /// Matched variant carries no price of its own; the product list price
    /// stands in for it.
    InheritedProductPrice,
    ProductDiscount,
    ProductPrice,
    Unpriced,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub price: Decimal,
    pub stock: i64,
    pub image: Option<ImageRef>,
    /// Catalog variant the selection matched, if any.
    pub variant_id: Option<VariantId>,
    pub price_source: PriceSource,
}

impl Resolution {
    pub fn in_stock(&self) -> bool { self.stock > 0 }
}

/// The record whose attribute map is exactly the selected one. Generation
/// keeps every record's keys equal to the current attribute names, so a
/// candidate with extra keys belongs to a stale selection and never matches.
fn find_match<'a, P: VariantCatalog + ?Sized>(product: &'a P, selected: &AttributeMap) -> Option<&'a VariantRecord> {
    if selected.is_empty() {
        return None;
    }
    product.variations().iter().find(|record| record.attributes == *selected)
}

/// Total and side-effect free: never panics, never mutates, always returns a
/// number for price and stock.
pub fn resolve<P: VariantCatalog + ?Sized>(product: &P, selection: Option<&SelectedVariation>) -> Resolution {
    let matched = selection.and_then(|s| find_match(product, &s.attributes));

    let (price, price_source) = resolve_price(product, selection, matched);

    let stock = selection
        .and_then(|s| s.stock)
        .or_else(|| matched.and_then(|r| r.stock))
        .unwrap_or(0)
        .max(0);

    let image = selection
        .and_then(|s| s.images.first())
        .or_else(|| matched.and_then(|r| r.images.first()))
        .or_else(|| product.images().first())
        .cloned();

    let resolution = Resolution { price, stock, image, variant_id: matched.map(|r| r.variant_id.clone()), price_source };
    tracing::trace!(
        price = %resolution.price,
        stock = resolution.stock,
        source = ?resolution.price_source,
        matched = resolution.variant_id.is_some(),
        "resolved line item"
    );
    resolution
}

fn resolve_price<P: VariantCatalog + ?Sized>(
    product: &P,
    selection: Option<&SelectedVariation>,
    matched: Option<&VariantRecord>,
) -> (Decimal, PriceSource) {
    if let Some(selection) = selection {
        if let Some(discount) = selection.discount_price.filter(|d| !d.is_zero()) {
            return (discount, PriceSource::SnapshotDiscount);
        }
        if let Some(price) = selection.price {
            return (price, PriceSource::SnapshotPrice);
        }
    }
    if let Some(record) = matched {
        return match (record.discount_price, record.price, product.base_price()) {
            (Some(discount), _, _) => (discount, PriceSource::VariantDiscount),
            (None, Some(price), _) => (price, PriceSource::VariantPrice),
            (None, None, Some(price)) => (price, PriceSource::InheritedProductPrice),
            (None, None, None) => (Decimal::ZERO, PriceSource::Unpriced),
        };
    }
    match (product.base_discount_price(), product.base_price()) {
        (Some(discount), _) => (discount, PriceSource::ProductDiscount),
        (None, Some(price)) => (price, PriceSource::ProductPrice),
        (None, None) => (Decimal::ZERO, PriceSource::Unpriced),
    }
}
