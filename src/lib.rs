//! OpenSASE Product Variants
//!
//! Variant engine for the OpenSASE storefront and admin back-office.
//!
//! ## Features
//! - Attribute definitions expanded into individually priced SKUs
//! - Stable variant identity across regenerations
//! - Advisory validation for the admin product form
//! - One price/stock/image resolver shared by cart, checkout and order history
//! - Frozen cart/order snapshots that survive catalog edits

pub mod config;
pub mod domain;

use thiserror::Error;

pub use config::{ConfigError, ServiceConfig};
pub use domain::aggregates::{Cart, CartError, Order, OrderError, Product, ProductError};
pub use domain::value_objects::{ImageRef, Money, VariantId};
pub use domain::variants::{
    regenerate, resolve, validate, AttributeDefinition, AttributeMap, Regeneration, Resolution, SelectedVariation,
    ValidationResult, VariantCatalog, VariantDefaults, VariantRecord,
};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Attributes expand to more than {limit} variants")]
    TooManyCombinations { limit: usize },

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, EcommerceError>;

/// Rejects attribute input whose expansion exceeds `limit` variants.
pub fn check_combination_limit(attributes: &[AttributeDefinition], limit: usize) -> Result<usize> {
    let usable = domain::variants::attributes::usable(attributes);
    match domain::variants::attributes::combination_count(&usable) {
        Some(count) if count <= limit => Ok(count),
        _ => Err(EcommerceError::TooManyCombinations { limit }),
    }
}
