//! HTTP API for market-server
//!
//! Every route except `/health` sits behind the JWT middleware, which puts an
//! [`Identity`](crate::auth::Identity) into the request extensions.

pub mod cart;
pub mod catalog;
pub mod health;
pub mod order;
pub mod seller;

use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router, middleware};
use shared::error::{ApiResponse, AppError};
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let cart = Router::new()
        .route("/api/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/cart/add", post(cart::add_to_cart))
        .route(
            "/api/cart/items/{id}",
            put(cart::update_cart_item).delete(cart::remove_cart_item),
        )
        .route("/api/cart/seller/{seller_id}", delete(cart::clear_seller_cart))
        .route("/api/cart/validate", post(cart::validate_cart))
        .route(
            "/api/cart/validate/seller/{seller_id}",
            post(cart::validate_seller_cart),
        );

    let orders = Router::new()
        .route(
            "/api/orders/checkout-selected",
            post(order::checkout_selected),
        )
        .route("/api/orders/buy-now", post(order::buy_now))
        .route("/api/orders/my-orders", get(order::my_orders))
        .route("/api/orders/{id}", get(order::get_order))
        .route("/api/orders/{id}/status", put(order::update_status));

    let seller = Router::new()
        .route("/api/seller/orders", get(seller::list_orders))
        .route("/api/seller/top-items", get(seller::top_items))
        .route("/api/seller/foods", post(seller::create_food_item))
        .route("/api/seller/foods/{id}", patch(seller::update_food_item))
        .route("/api/foods/{id}", get(catalog::get_food_item));

    let authenticated = Router::new()
        .merge(cart)
        .merge(orders)
        .merge(seller)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
