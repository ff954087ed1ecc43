//! Seller endpoints: incoming orders and menu management

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use http::StatusCode;
use shared::error::{ApiResponse, AppError};
use shared::models::{
    FoodItem, FoodItemCreate, FoodItemUpdate, OrderView, OrdersQuery, Page, TopItemsQuery,
    TopSellingItem,
};

use crate::auth::Identity;
use crate::db::OrderParty;
use crate::services::{catalog, orders};
use crate::state::AppState;

use super::ApiResult;

/// GET /api/seller/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<OrdersQuery>,
) -> ApiResult<Page<OrderView>> {
    identity.require_seller()?;
    let page = orders::list_orders(
        state.store.as_ref(),
        OrderParty::Seller(identity.user_id),
        &query,
    )
    .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/seller/top-items
pub async fn top_items(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<TopItemsQuery>,
) -> ApiResult<Vec<TopSellingItem>> {
    identity.require_seller()?;
    let items =
        catalog::top_selling_items(state.store.as_ref(), &identity.user_id, query.limit).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// POST /api/seller/foods
pub async fn create_food_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<FoodItemCreate>,
) -> Result<(StatusCode, Json<ApiResponse<FoodItem>>), AppError> {
    identity.require_seller()?;
    let item = catalog::create_food_item(state.store.as_ref(), &identity.user_id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message("Food item created", item)),
    ))
}

/// PATCH /api/seller/foods/{id}
pub async fn update_food_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(req): Json<FoodItemUpdate>,
) -> ApiResult<FoodItem> {
    identity.require_seller()?;
    let item = catalog::update_food_item(state.store.as_ref(), &identity, id, req).await?;
    Ok(Json(ApiResponse::success(item)))
}
