//! Cart endpoints. Every handler acts on the caller's resolved cart.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::{
    AddItem, Aggregate, Cart, ChangeQuantity, CheckoutError, Identity, LineItem, LineItemId, Money,
    OrderForm, PlaceOrder, RemoveItem,
};
use common::AggregateId;
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{Caller, parse_id};
use crate::routes::orders::OrderResponse;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
}

#[derive(Deserialize)]
pub struct ChangeQuantityRequest {
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub id: Option<String>,
    pub state: String,
    pub anonymous: bool,
    pub items: Vec<LineItemResponse>,
    pub final_price: Money,
    pub final_quantity: u64,
}

#[derive(Serialize)]
pub struct LineItemResponse {
    pub id: String,
    pub product_id: String,
    pub title: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
    pub added_by: String,
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id().to_string(),
            product_id: item.product_id().to_string(),
            title: item.title().to_string(),
            unit_price: item.unit_price(),
            quantity: item.quantity(),
            subtotal: item.subtotal(),
            added_by: item.added_by().to_string(),
        }
    }
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id().map(|id| id.to_string()),
            state: cart.state().to_string(),
            anonymous: cart.is_anonymous(),
            items: cart.items().iter().map(LineItemResponse::from).collect(),
            final_price: cart.final_price(),
            final_quantity: cart.final_quantity(),
        }
    }
}

// -- Handlers --

/// GET /cart: the caller's open cart, created on first use.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(identity): Caller,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.checkout.resolve_cart(identity).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// POST /cart/items: put one unit of a product in the cart.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(identity): Caller,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart_id = resolved_cart_id(&state, identity).await?;
    let cart = state
        .checkout
        .add_item(AddItem::new(cart_id, req.product_id, identity))
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// PUT /cart/items/:line_item_id: set a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn change_quantity<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(identity): Caller,
    Path(line_item_id): Path<String>,
    Json(req): Json<ChangeQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let line_item_id: LineItemId = parse_id("line item", &line_item_id)?;
    let cart_id = resolved_cart_id(&state, identity).await?;
    let cart = state
        .checkout
        .change_quantity(ChangeQuantity::new(
            cart_id,
            line_item_id,
            req.quantity,
            identity,
        ))
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /cart/items/:line_item_id: take a line out of the cart.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(identity): Caller,
    Path(line_item_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let line_item_id: LineItemId = parse_id("line item", &line_item_id)?;
    let user = identity.require_user()?;
    let cart_id = resolved_cart_id(&state, user.into()).await?;
    let cart = state
        .checkout
        .remove_item(RemoveItem::new(cart_id, line_item_id))
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// POST /cart/checkout: turn the cart into an order.
#[tracing::instrument(skip(state, form))]
pub async fn place_order<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(identity): Caller,
    Json(form): Json<OrderForm>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let cart_id = resolved_cart_id(&state, identity).await?;
    let order = state
        .checkout
        .place_order(PlaceOrder::new(cart_id, form, identity))
        .await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

async fn resolved_cart_id<S: EventStore + Clone + 'static>(
    state: &AppState<S>,
    identity: Identity,
) -> Result<AggregateId, ApiError> {
    let cart = state.checkout.resolve_cart(identity).await?;
    let cart_id = cart
        .id()
        .ok_or_else(|| CheckoutError::InvalidState("resolved cart has no id".to_string()))?;
    Ok(cart_id)
}
