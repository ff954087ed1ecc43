//! Order endpoints (customer side plus shared status updates)

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use http::StatusCode;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{
    BuyNowRequest, CheckoutOutcome, CheckoutResponse, CheckoutSelectedRequest, OrderView,
    OrdersQuery, Page, UpdateOrderStatusRequest,
};

use crate::auth::Identity;
use crate::db::OrderParty;
use crate::services::{checkout, order_status, orders};
use crate::state::AppState;

use super::ApiResult;

/// POST /api/orders/checkout-selected
///
/// 200 when every partition produced an order, 207 on partial success,
/// `CheckoutFailed` (400) with the per-seller errors when none did.
pub async fn checkout_selected(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CheckoutSelectedRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutResponse>>), AppError> {
    let response = checkout::checkout_selected(
        state.store.as_ref(),
        state.order_numbers.as_ref(),
        &identity.user_id,
        &req,
    )
    .await?;

    match response.outcome() {
        CheckoutOutcome::Success => Ok((
            StatusCode::OK,
            Json(ApiResponse::success_with_message(
                format!("Successfully created {} order(s)", response.orders_created),
                response,
            )),
        )),
        CheckoutOutcome::Partial => Ok((
            StatusCode::MULTI_STATUS,
            Json(ApiResponse::success_with_message(
                format!(
                    "Created {} of {} order(s)",
                    response.orders_created, response.total_orders
                ),
                response,
            )),
        )),
        CheckoutOutcome::Failed => {
            let errors = serde_json::to_value(&response.errors)
                .map_err(|e| AppError::internal(format!("Failed to encode checkout errors: {e}")))?;
            Err(AppError::new(ErrorCode::CheckoutFailed)
                .with_detail("errors", errors)
                .with_detail("total_orders", response.total_orders)
                .with_detail("orders_created", response.orders_created))
        }
    }
}

/// POST /api/orders/buy-now
pub async fn buy_now(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<BuyNowRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderView>>), AppError> {
    let view = checkout::buy_now(
        state.store.as_ref(),
        state.order_numbers.as_ref(),
        &identity.user_id,
        &req,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message("Order created", view)),
    ))
}

/// GET /api/orders/my-orders
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<OrdersQuery>,
) -> ApiResult<Page<OrderView>> {
    let page = orders::list_orders(
        state.store.as_ref(),
        OrderParty::Customer(identity.user_id),
        &query,
    )
    .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<OrderView> {
    let view = orders::get_order(state.store.as_ref(), id, &identity).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// PUT /api/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> ApiResult<OrderView> {
    let view =
        order_status::update_order_status(state.store.as_ref(), id, req.status, &identity).await?;
    Ok(Json(ApiResponse::success_with_message(
        format!("Order status updated to {}", view.order.status),
        view,
    )))
}
