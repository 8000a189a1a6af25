//! OpenSASE Product Variants - variant engine service
//!
//! Stateless HTTP surface over the engine: the admin product form posts
//! attributes and its previous variant list, the storefront posts products and
//! selections. Nothing is stored server-side.

use anyhow::Result;
use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use opensase_variants::domain::aggregates::StockShortfall;
use opensase_variants::{
    check_combination_limit, regenerate, resolve, validate, AttributeDefinition, AttributeMap, Cart, EcommerceError,
    Order, Product, ProductError, Regeneration, Resolution, SelectedVariation, ServiceConfig, ValidationResult, VariantDefaults,
    VariantRecord,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)] pub struct AppState { pub config: Arc<ServiceConfig> }

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = ServiceConfig::from_env()?;
    let addr = config.bind_addr();
    let app = router(AppState { config: Arc::new(config) });

    tracing::info!("🚀 OpenSASE variants listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-variants"})) }))
        .route("/api/v1/variants/regenerate", post(regenerate_variants))
        .route("/api/v1/variants/validate", post(validate_variants))
        .route("/api/v1/variants/resolve", post(resolve_variant))
        .route("/api/v1/variants/snapshot", post(snapshot_variant))
        .route("/api/v1/checkout/quote", post(quote_checkout))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

fn reject(err: EcommerceError) -> (StatusCode, String) {
    let status = match &err {
        EcommerceError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        EcommerceError::TooManyCombinations { .. }
        | EcommerceError::Product(ProductError::TooManyCombinations { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        EcommerceError::Cart(_) | EcommerceError::Order(_) | EcommerceError::Product(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EcommerceError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(status = status.as_u16(), error = %err, "request rejected");
    (status, err.to_string())
}

#[derive(Debug, Deserialize)]
pub struct RegenerateRequest {
    pub attributes: Vec<AttributeDefinition>,
    #[serde(default)] pub previous_variants: Vec<VariantRecord>,
    #[serde(default)] pub base_price: Option<Decimal>,
    #[serde(default)] pub base_discount_price: Option<Decimal>,
}

async fn regenerate_variants(State(s): State<AppState>, Json(r): Json<RegenerateRequest>) -> Result<Json<Regeneration>, (StatusCode, String)> {
    check_combination_limit(&r.attributes, s.config.max_combinations).map_err(reject)?;
    let defaults = VariantDefaults { base_price: r.base_price, base_discount_price: r.base_discount_price };
    Ok(Json(regenerate(&r.attributes, &r.previous_variants, defaults)))
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest { pub attributes: Vec<AttributeDefinition>, #[serde(default)] pub variants: Vec<VariantRecord> }

async fn validate_variants(Json(r): Json<ValidateRequest>) -> Json<ValidationResult> {
    Json(validate(&r.attributes, &r.variants))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest { pub product: Product, #[serde(default)] pub selected_variation: Option<SelectedVariation> }

async fn resolve_variant(Json(r): Json<ResolveRequest>) -> Json<Resolution> {
    Json(resolve(&r.product, r.selected_variation.as_ref()))
}

#[derive(Debug, Deserialize)]
pub struct SnapshotRequest { pub product: Product, #[serde(default)] pub attributes: AttributeMap }

async fn snapshot_variant(Json(r): Json<SnapshotRequest>) -> Json<SelectedVariation> {
    Json(r.product.snapshot(r.attributes))
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub customer_id: String,
    pub email: String,
    #[serde(default)] pub order_number: u64,
    #[serde(default)] pub currency: Option<String>,
    pub products: Vec<Product>,
    pub items: Vec<QuoteLine>,
}

/// A line either chooses attributes now or carries the snapshot stored when it
/// was first added to the cart.
#[derive(Debug, Deserialize)]
pub struct QuoteLine {
    pub product_id: String,
    #[serde(default)] pub attributes: Option<AttributeMap>,
    #[serde(default)] pub selection: Option<SelectedVariation>,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse { pub order: Order, pub stock_warnings: Vec<StockShortfall> }

async fn quote_checkout(State(s): State<AppState>, Json(r): Json<QuoteRequest>) -> Result<Json<QuoteResponse>, (StatusCode, String)> {
    let currency = r.currency.as_deref().unwrap_or(&s.config.default_currency);
    let mut cart = Cart::for_customer(r.customer_id.clone(), currency);
    for line in r.items {
        let product = r.products.iter().find(|p| p.id() == line.product_id)
            .ok_or_else(|| reject(EcommerceError::ProductNotFound(line.product_id.clone())))?;
        let added = match line.selection {
            Some(selection) => cart.restore_line(product, selection, line.quantity),
            None => cart.add_product(product, line.attributes, line.quantity),
        };
        added.map_err(|e| reject(e.into()))?;
    }
    let stock_warnings = cart.live_stock_check(&r.products);
    let order = Order::from_cart(r.order_number, r.customer_id, r.email, &cart).map_err(|e| reject(e.into()))?;
    tracing::debug!(order_id = order.id(), lines = order.items().len(), warnings = stock_warnings.len(), "quoted checkout");
    Ok(Json(QuoteResponse { order, stock_warnings }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(max_combinations: usize) -> Router {
        router(AppState { config: Arc::new(ServiceConfig { max_combinations, ..ServiceConfig::default() }) })
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::post(uri).header("content-type", "application/json").body(Body::from(body.to_string())).unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn tee_product() -> Value {
        json!({
            "id": "p1", "name": "Tee", "price": 20, "has_variations": true,
            "images": ["tee.png"],
            "variations": [
                {"variant_id": "v-m", "attributes": {"Size": "M"}, "price": 20, "discount_price": 15, "stock": 3, "sku": "SIZ-M"},
                {"variant_id": "v-l", "attributes": {"Size": "L"}, "price": 22, "stock": 0, "sku": "SIZ-L"}
            ]
        })
    }

    #[tokio::test]
    async fn health() {
        let res = app(10).oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn regenerate_round_trip_keeps_identities() {
        let attrs = json!([{"name": "Color", "values": ["Black", "White"]}, {"name": "Storage", "values": ["64GB", "128GB"]}]);
        let (status, first) = post_json(app(10), "/api/v1/variants/regenerate", json!({"attributes": attrs, "base_price": 1800})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["changed"], json!(true));
        assert_eq!(first["variants"].as_array().unwrap().len(), 4);
        assert_eq!(first["variants"][1]["sku"], json!("COL-BLA-STO-128"));

        let body = json!({"attributes": attrs, "previous_variants": first["variants"].clone()});
        let (_, second) = post_json(app(10), "/api/v1/variants/regenerate", body).await;
        assert_eq!(second["changed"], json!(false));
        assert_eq!(second["variants"], first["variants"]);
        assert_eq!(second["validation"]["is_valid"], json!(true));
    }

    #[tokio::test]
    async fn regenerate_enforces_combination_cap() {
        let attrs = json!([{"name": "Color", "values": ["Black", "White", "Red"]}]);
        let (status, _) = post_json(app(2), "/api/v1/variants/regenerate", json!({"attributes": attrs})).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn validate_reports_duplicates() {
        let body = json!({"attributes": [{"name": "Color", "values": ["Black"]}, {"name": "color", "values": ["White"]}]});
        let (_, out) = post_json(app(10), "/api/v1/variants/validate", body).await;
        assert_eq!(out["is_valid"], json!(false));
        assert_eq!(out["errors"][0], json!("Duplicate attribute name \"Color\""));
    }

    #[tokio::test]
    async fn resolve_prefers_snapshot_discount() {
        let body = json!({"product": tee_product(), "selected_variation": {"attributes": {"Size": "M"}, "discount_price": 1000, "price": 1800}});
        let (status, out) = post_json(app(10), "/api/v1/variants/resolve", body).await;
        assert_eq!(status, StatusCode::OK);
        let resolution: Resolution = serde_json::from_value(out).unwrap();
        assert_eq!(resolution.price, Decimal::new(1000, 0));
        assert_eq!(resolution.stock, 3);
    }

    #[tokio::test]
    async fn snapshot_accepts_entry_list_attributes() {
        let body = json!({"product": tee_product(), "attributes": [["Size", "M"]]});
        let (_, out) = post_json(app(10), "/api/v1/variants/snapshot", body).await;
        let snapshot: SelectedVariation = serde_json::from_value(out).unwrap();
        assert_eq!(snapshot.stock, Some(3));
        assert_eq!(snapshot.discount_price, Some(Decimal::new(15, 0)));
    }

    #[tokio::test]
    async fn quote_prices_lines_and_rejects_unknown_products() {
        let body = json!({
            "customer_id": "c1", "email": "c1@example.com", "currency": "ngn",
            "products": [tee_product()],
            "items": [{"product_id": "p1", "attributes": {"Size": "M"}, "quantity": 2}]
        });
        let (status, out) = post_json(app(10), "/api/v1/checkout/quote", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(out["order"]["items"][0]["sku"], json!("SIZ-M"));
        assert_eq!(out["order"]["total"]["currency"], json!("NGN"));
        assert!(out["stock_warnings"].as_array().unwrap().is_empty());

        let missing = json!({"customer_id": "c1", "email": "e", "products": [], "items": [{"product_id": "nope", "quantity": 1}]});
        let (status, _) = post_json(app(10), "/api/v1/checkout/quote", missing).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn quote_with_stored_snapshot_warns_about_live_stock() {
        let body = json!({
            "customer_id": "c1", "email": "c1@example.com",
            "products": [tee_product()],
            "items": [{"product_id": "p1", "selection": {"attributes": {"Size": "L"}, "price": 22, "stock": 4}, "quantity": 2}]
        });
        let (status, out) = post_json(app(10), "/api/v1/checkout/quote", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(out["stock_warnings"][0]["available"], json!(0));
    }

    #[tokio::test]
    async fn quote_rejects_out_of_stock_selection() {
        let body = json!({
            "customer_id": "c1", "email": "c1@example.com",
            "products": [tee_product()],
            "items": [{"product_id": "p1", "attributes": {"Size": "L"}, "quantity": 1}]
        });
        let (status, out) = post_json(app(10), "/api/v1/checkout/quote", body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(out, Value::Null);
    }
}
