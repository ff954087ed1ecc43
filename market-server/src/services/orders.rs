//! Order reads

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderView, OrdersQuery, Page};

use crate::auth::Identity;
use crate::db::{MarketStore, OrderParty};
use crate::error::ServiceResult;

use super::order_status::resolve_role;

/// Attach lines and party names to an order
pub async fn order_view(store: &dyn MarketStore, order: Order) -> ServiceResult<OrderView> {
    let items = store.load_order_items(order.id).await?;
    let customer = store.find_user(&order.customer_id).await?;
    let seller = store.find_user(&order.seller_id).await?;

    Ok(OrderView {
        customer_name: customer.as_ref().map(|c| c.full_name()).unwrap_or_default(),
        customer_email: customer.map(|c| c.email).unwrap_or_default(),
        seller_name: seller
            .as_ref()
            .map(|s| s.display_name())
            .unwrap_or_else(|| order.seller_id.clone()),
        seller_email: seller.map(|s| s.email).unwrap_or_default(),
        items,
        order,
    })
}

/// Visible to the order's customer, its seller and admins
pub async fn get_order(
    store: &dyn MarketStore,
    order_id: i64,
    actor: &Identity,
) -> ServiceResult<OrderView> {
    let order = store
        .find_order(order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    if resolve_role(&order, actor).is_none() {
        return Err(AppError::forbidden("You are not allowed to view this order").into());
    }
    order_view(store, order).await
}

pub async fn list_orders(
    store: &dyn MarketStore,
    party: OrderParty,
    query: &OrdersQuery,
) -> ServiceResult<Page<OrderView>> {
    let page = store.list_orders(&party, query).await?;
    let mut items = Vec::with_capacity(page.items.len());
    for order in page.items {
        items.push(order_view(store, order).await?);
    }
    Ok(Page {
        total: page.total,
        page_number: page.page_number,
        page_size: page.page_size,
        items,
    })
}
