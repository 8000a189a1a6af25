//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::cart::{Cart, CartItem};
use crate::domain::aggregates::product::Product;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{ImageRef, Money, VariantId};
use crate::domain::variants::{resolve, Resolution, SelectedVariation};

#[derive(Clone, Debug, Serialize)]
pub struct Order {
    id: String,
    order_number: u64,
    customer_id: String,
    email: String,
    status: OrderStatus,
    items: Vec<LineItem>,
    subtotal: Money,
    total: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// Persisted line. `selection` is the cart snapshot stored verbatim, so later
/// catalog edits never reprice a placed order.
#[derive(Clone, Debug, Serialize)]
pub struct LineItem {
    pub id: String,
    pub product_id: String,
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub sku: Option<String>,
    pub quantity: u32,
    pub selection: SelectedVariation,
    pub unit_price: Money,
    pub total: Money,
    pub image: Option<ImageRef>,
}

impl LineItem {
    fn from_cart_item(item: &CartItem) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            product_id: item.product_id.clone(),
            variant_id: item.variant_id.clone(),
            name: item.name.clone(),
            sku: item.sku.clone(),
            quantity: item.quantity,
            selection: item.selection.clone(),
            unit_price: item.unit_price.clone(),
            total: item.line_total(),
            image: item.image.clone(),
        }
    }

    /// Order-history rendering goes through the same resolver as the cart.
    pub fn resolve(&self, product: &Product) -> Resolution { resolve(product, Some(&self.selection)) }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Pending, Confirmed, Cancelled }

impl Order {
    /// Places a pending order from the cart's lines.
    pub fn from_cart(order_number: u64, customer_id: impl Into<String>, email: impl Into<String>, cart: &Cart) -> Result<Self, OrderError> {
        if cart.is_empty() { return Err(OrderError::NoItems); }
        let id = Uuid::new_v4().to_string();
        let customer_id = customer_id.into();
        let now = Utc::now();
        let mut order = Self {
            id: id.clone(), order_number, customer_id: customer_id.clone(), email: email.into(),
            status: OrderStatus::Pending, items: cart.items().iter().map(LineItem::from_cart_item).collect(),
            subtotal: Money::zero(cart.currency()), total: Money::zero(cart.currency()),
            created_at: now, updated_at: now, events: vec![],
        };
        order.recalculate();
        order.raise_event(DomainEvent::Order(OrderEvent::Created { order_id: id, customer_id }));
        Ok(order)
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn order_number(&self) -> u64 { self.order_number }
    pub fn status(&self) -> &OrderStatus { &self.status }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn total(&self) -> &Money { &self.total }
    pub fn items(&self) -> &[LineItem] { &self.items }

    pub fn confirm(&mut self) -> Result<(), OrderError> {
        if self.items.is_empty() { return Err(OrderError::NoItems); }
        if self.status != OrderStatus::Pending { return Err(OrderError::NotPending); }
        self.status = OrderStatus::Confirmed;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Confirmed { order_id: self.id.clone(), total: self.total.amount() }));
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if self.status == OrderStatus::Cancelled { return Err(OrderError::CannotCancel); }
        self.status = OrderStatus::Cancelled;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Cancelled { order_id: self.id.clone() }));
        Ok(())
    }

    fn recalculate(&mut self) {
        self.subtotal = self.items.iter().fold(Money::zero(self.subtotal.currency()), |acc, i| acc.add(&i.total).unwrap_or(acc));
        self.total = self.subtotal.clone();
        self.touch();
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("No items")]
    NoItems,
    #[error("Order is not pending")]
    NotPending,
    #[error("Cannot cancel")]
    CannotCancel,
}
