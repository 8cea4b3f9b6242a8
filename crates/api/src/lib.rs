//! HTTP API for the storefront cart and checkout engine.
//!
//! A thin JSON adapter over [`checkout::CheckoutService`]: every handler
//! resolves the caller's [`checkout::Identity`] from the `x-user-id` header
//! and forwards to one service operation. Requests are traced with
//! `tower-http` and service counters are exported on `/metrics`.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use checkout::{CheckoutConfig, CheckoutService, InMemoryCatalog};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore + Clone> {
    pub checkout: CheckoutService<S, InMemoryCatalog>,
}

impl<S: EventStore + Clone> AppState<S> {
    pub fn new(store: S, catalog: InMemoryCatalog, config: CheckoutConfig) -> Self {
        Self {
            checkout: CheckoutService::with_config(store, catalog, config),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/cart", get(routes::cart::get::<S>))
        .route("/cart/items", post(routes::cart::add_item::<S>))
        .route(
            "/cart/items/{line_item_id}",
            put(routes::cart::change_quantity::<S>).delete(routes::cart::remove_item::<S>),
        )
        .route("/cart/checkout", post(routes::cart::place_order::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
