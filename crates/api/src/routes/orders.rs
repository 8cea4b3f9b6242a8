//! Order history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use checkout::{Aggregate, Money, Order, OrderDetails};
use common::AggregateId;
use event_store::EventStore;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{Caller, parse_id};
use crate::routes::cart::LineItemResponse;

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: Option<String>,
    pub cart_id: Option<String>,
    pub owner: Option<String>,
    pub details: Option<OrderDetails>,
    pub items: Vec<LineItemResponse>,
    pub final_price: Money,
    pub final_quantity: u64,
    pub created_at: Option<String>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().map(|id| id.to_string()),
            cart_id: order.cart_id().map(|id| id.to_string()),
            owner: order.owner().map(|user| user.to_string()),
            details: order.details().cloned(),
            items: order.items().iter().map(LineItemResponse::from).collect(),
            final_price: order.final_price(),
            final_quantity: order.final_quantity(),
            created_at: order.created_at().map(|at| at.to_rfc3339()),
        }
    }
}

/// GET /orders: the caller's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(identity): Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let user = identity.require_user()?;
    let orders = state.checkout.orders_for(user).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/:id: one of the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: AggregateId = parse_id("order", &id)?;
    let order = state.checkout.get_order_for(identity, order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}
