//! Domain events
use crate::domain::value_objects::VariantId;
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProductEvent {
    Created { product_id: String },
    VariantsRegenerated { product_id: String, variant_count: usize },
    VariantUpdated { product_id: String, variant_id: VariantId },
    Published { product_id: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum OrderEvent {
    Created { order_id: String, customer_id: String },
    Confirmed { order_id: String, total: Decimal },
    Cancelled { order_id: String },
}
