//! Cart endpoints (customer)

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::ApiResponse;
use shared::models::{
    AddToCartRequest, CartItemView, CartView, ClearSellerCartResponse, UpdateCartItemRequest,
    ValidationResult,
};

use crate::auth::Identity;
use crate::services::{cart, validation};
use crate::state::AppState;

use super::ApiResult;

/// GET /api/cart
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<CartView> {
    let view = cart::get_cart(state.store.as_ref(), &identity.user_id).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// POST /api/cart/add
pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<AddToCartRequest>,
) -> ApiResult<CartItemView> {
    let item = cart::add_to_cart(state.store.as_ref(), &identity.user_id, req).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Item added to cart",
        item,
    )))
}

/// PUT /api/cart/items/{id}
pub async fn update_cart_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCartItemRequest>,
) -> ApiResult<CartItemView> {
    let item = cart::update_cart_item(state.store.as_ref(), &identity.user_id, id, req).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// DELETE /api/cart/items/{id}
pub async fn remove_cart_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    cart::remove_cart_item(state.store.as_ref(), &identity.user_id, id).await?;
    Ok(Json(ApiResponse::ok_with_message("Item removed from cart")))
}

/// DELETE /api/cart
pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<()> {
    cart::clear_cart(state.store.as_ref(), &identity.user_id).await?;
    Ok(Json(ApiResponse::ok_with_message("Cart cleared")))
}

/// DELETE /api/cart/seller/{seller_id}
pub async fn clear_seller_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(seller_id): Path<String>,
) -> ApiResult<ClearSellerCartResponse> {
    let cleared =
        cart::clear_seller_cart(state.store.as_ref(), &identity.user_id, &seller_id).await?;
    Ok(Json(ApiResponse::success(cleared)))
}

/// POST /api/cart/validate
pub async fn validate_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<ValidationResult> {
    let result = validation::validate_cart(state.store.as_ref(), &identity.user_id).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// POST /api/cart/validate/seller/{seller_id}
pub async fn validate_seller_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(seller_id): Path<String>,
) -> ApiResult<ValidationResult> {
    let result =
        validation::validate_seller_cart(state.store.as_ref(), &identity.user_id, &seller_id)
            .await?;
    Ok(Json(ApiResponse::success(result)))
}
