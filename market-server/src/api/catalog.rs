//! Public catalog reads

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::ApiResponse;
use shared::models::FoodItem;

use crate::services::catalog;
use crate::state::AppState;

use super::ApiResult;

/// GET /api/foods/{id}
pub async fn get_food_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<FoodItem> {
    let item = catalog::get_food_item(state.store.as_ref(), id).await?;
    Ok(Json(ApiResponse::success(item)))
}
