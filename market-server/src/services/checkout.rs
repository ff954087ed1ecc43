//! Checkout orchestration
//!
//! A cart is split into one partition per selected seller. Partitions are
//! validated and committed one at a time and independently: a failing seller
//! never blocks the others, and its lines stay in the cart so a retry only
//! re-attempts what failed.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    BuyNowRequest, CartLine, CheckoutError, CheckoutErrorType, CheckoutResponse,
    CheckoutSelectedRequest, MAX_QUANTITY, Order, OrderItem, OrderStatus, OrderView, PriceChange,
};
use shared::util::{now_millis, snowflake_id};

use crate::db::{MarketStore, NewOrder, StoreError};
use crate::error::{ServiceError, ServiceResult};
use crate::utils::validation::{
    normalize_optional_text, validate_buy_now_request, validate_checkout_request,
};

use super::cart::partition_by_seller;
use super::orders::order_view;
use super::pricing::{OrderNumberGenerator, OrderTotals, estimated_delivery_time};

/// Attempts at a unique order number (first try plus retries)
const ORDER_NUMBER_ATTEMPTS: usize = 4;

/// Everything needed to create one order, minus its number
struct OrderDraft<'a> {
    customer_id: &'a str,
    seller_id: &'a str,
    totals: OrderTotals,
    estimated_delivery_time: i32,
    delivery_address: &'a str,
    phone_number: &'a str,
    notes: Option<String>,
    /// (food_item_id, name, quantity, live price, special instructions)
    lines: Vec<(i64, String, i32, Decimal, Option<String>)>,
}

impl OrderDraft<'_> {
    fn build(&self, order_number: String, now: i64) -> NewOrder {
        let order_id = snowflake_id();
        let items = self
            .lines
            .iter()
            .map(|(food_item_id, name, quantity, price, instructions)| OrderItem {
                id: snowflake_id(),
                order_id,
                food_item_id: *food_item_id,
                food_item_name: name.clone(),
                quantity: *quantity,
                price: *price,
                special_instructions: instructions.clone(),
            })
            .collect();

        NewOrder {
            order: Order {
                id: order_id,
                order_number,
                customer_id: self.customer_id.to_string(),
                seller_id: self.seller_id.to_string(),
                sub_total: self.totals.sub_total,
                delivery_fee: self.totals.delivery_fee,
                tax: self.totals.tax,
                total: self.totals.total,
                status: OrderStatus::Pending,
                delivery_address: self.delivery_address.to_string(),
                phone_number: self.phone_number.to_string(),
                notes: self.notes.clone(),
                estimated_delivery_time: self.estimated_delivery_time,
                created_at: now,
                confirmed_at: None,
                preparing_at: None,
                ready_at: None,
                out_for_delivery_at: None,
                delivered_at: None,
                cancelled_at: None,
            },
            items,
        }
    }
}

/// Commit a draft, drawing a fresh order number on each unique collision
async fn place_order(
    store: &dyn MarketStore,
    numbers: &dyn OrderNumberGenerator,
    draft: &OrderDraft<'_>,
    consumed_cart_items: &[i64],
) -> ServiceResult<Order> {
    for attempt in 1..=ORDER_NUMBER_ATTEMPTS {
        let now = now_millis();
        let new_order = draft.build(numbers.next_number(now), now);
        match store.commit_order(&new_order, consumed_cart_items).await {
            Ok(()) => return Ok(new_order.order),
            Err(StoreError::Duplicate(constraint)) => {
                tracing::warn!(
                    attempt,
                    order_number = %new_order.order.order_number,
                    constraint = %constraint,
                    "Order number collision, retrying"
                );
            }
            Err(StoreError::Conflict(reason)) => {
                return Err(ServiceError::Db(
                    format!("cart changed during checkout: {reason}").into(),
                ));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(AppError::new(ErrorCode::OrderNumberUnavailable).into())
}

/// Validation failure for a seller partition, if any.
/// Unavailable items are reported before price changes.
pub fn check_partition(seller_id: &str, lines: &[&CartLine]) -> Option<CheckoutError> {
    let seller_name = lines
        .first()
        .map(|l| l.seller_name.clone())
        .unwrap_or_else(|| seller_id.to_string());

    let unavailable: Vec<String> = lines
        .iter()
        .filter(|l| !l.is_available)
        .map(|l| l.food_item_name.clone())
        .collect();
    if !unavailable.is_empty() {
        return Some(CheckoutError {
            seller_id: seller_id.to_string(),
            message: format!("Some items from {seller_name} are no longer available"),
            seller_name,
            error_type: CheckoutErrorType::UnavailableItems,
            items: unavailable,
            price_changes: Vec::new(),
        });
    }

    let price_changes: Vec<PriceChange> = lines
        .iter()
        .filter(|l| l.price_changed())
        .map(|l| PriceChange {
            item_name: l.food_item_name.clone(),
            old_price: l.price_snapshot,
            new_price: l.price,
        })
        .collect();
    if !price_changes.is_empty() {
        return Some(CheckoutError {
            seller_id: seller_id.to_string(),
            message: format!("Prices have changed for items from {seller_name}"),
            seller_name,
            error_type: CheckoutErrorType::PriceChanges,
            items: Vec::new(),
            price_changes,
        });
    }

    None
}

/// Subtotal at live prices; snapshots equal live prices once validated
fn partition_draft<'a>(
    customer_id: &'a str,
    seller_id: &'a str,
    lines: &[&CartLine],
    req: &'a CheckoutSelectedRequest,
) -> OrderDraft<'a> {
    let sub_total: Decimal = lines
        .iter()
        .map(|l| l.price * Decimal::from(l.quantity))
        .sum();
    OrderDraft {
        customer_id,
        seller_id,
        totals: OrderTotals::compute(sub_total, req.delivery_fee.unwrap_or(Decimal::ZERO)),
        estimated_delivery_time: estimated_delivery_time(lines.iter().map(|l| l.preparation_time)),
        delivery_address: req.delivery_address.trim(),
        phone_number: req.phone_number.trim(),
        notes: normalize_optional_text(req.notes.clone()),
        lines: lines
            .iter()
            .map(|l| {
                (
                    l.food_item_id,
                    l.food_item_name.clone(),
                    l.quantity,
                    l.price,
                    l.special_instructions.clone(),
                )
            })
            .collect(),
    }
}

/// View of an already committed order; a failed read must not turn it into an error
async fn committed_view(store: &dyn MarketStore, order: Order) -> OrderView {
    match order_view(store, order.clone()).await {
        Ok(view) => view,
        Err(e) => {
            tracing::warn!(order_id = order.id, error = %e, "Order committed but view load failed");
            OrderView {
                customer_name: String::new(),
                customer_email: String::new(),
                seller_name: String::new(),
                seller_email: String::new(),
                items: Vec::new(),
                order,
            }
        }
    }
}

/// Check out the selected sellers' partitions of the customer's cart
pub async fn checkout_selected(
    store: &dyn MarketStore,
    numbers: &dyn OrderNumberGenerator,
    customer_id: &str,
    req: &CheckoutSelectedRequest,
) -> ServiceResult<CheckoutResponse> {
    validate_checkout_request(req)?;

    let cart = store
        .find_cart(customer_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CartEmpty))?;
    let lines = store.load_cart_lines(cart.id).await?;
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::CartEmpty).into());
    }

    let selected: Vec<CartLine> = lines
        .into_iter()
        .filter(|l| req.seller_ids.iter().any(|s| *s == l.seller_id))
        .collect();
    if selected.is_empty() {
        return Err(AppError::new(ErrorCode::NoItemsForSelectedSellers).into());
    }

    if !store
        .claim_cart(cart.id, cart.version, now_millis())
        .await?
    {
        tracing::warn!(customer_id = %customer_id, cart_id = cart.id, "Checkout claim lost");
        return Err(AppError::new(ErrorCode::CheckoutConflict).into());
    }

    let partitions = partition_by_seller(&selected);
    let total_orders = partitions.len();
    let mut orders: Vec<OrderView> = Vec::new();
    let mut errors: Vec<CheckoutError> = Vec::new();

    for (seller_id, group) in partitions {
        if let Some(failure) = check_partition(seller_id, &group) {
            tracing::warn!(
                customer_id = %customer_id,
                seller_id = %seller_id,
                error_type = ?failure.error_type,
                "Seller partition rejected"
            );
            errors.push(failure);
            continue;
        }

        let draft = partition_draft(customer_id, seller_id, &group, req);
        let consumed: Vec<i64> = group.iter().map(|l| l.id).collect();
        match place_order(store, numbers, &draft, &consumed).await {
            Ok(order) => {
                let view = committed_view(store, order).await;
                tracing::info!(
                    customer_id = %customer_id,
                    seller_id = %seller_id,
                    order_id = view.order.id,
                    order_number = %view.order.order_number,
                    total = %view.order.total,
                    "Order created from cart"
                );
                orders.push(view);
            }
            Err(e) => {
                let seller_name = group[0].seller_name.clone();
                // Store detail stays in the log; clients get a retryable message
                tracing::error!(
                    customer_id = %customer_id,
                    seller_id = %seller_id,
                    error = %e,
                    "Failed to create order for seller"
                );
                errors.push(CheckoutError {
                    seller_id: seller_id.to_string(),
                    message: format!(
                        "Failed to create order for {seller_name}. Please try again."
                    ),
                    seller_name,
                    error_type: CheckoutErrorType::SystemError,
                    items: Vec::new(),
                    price_changes: Vec::new(),
                });
            }
        }
    }

    let response = CheckoutResponse::new(total_orders, orders, errors);
    tracing::info!(
        customer_id = %customer_id,
        orders_created = response.orders_created,
        total_orders = response.total_orders,
        outcome = ?response.outcome(),
        "Checkout finished"
    );
    Ok(response)
}

/// Single-item purchase that bypasses the cart
pub async fn buy_now(
    store: &dyn MarketStore,
    numbers: &dyn OrderNumberGenerator,
    customer_id: &str,
    req: &BuyNowRequest,
) -> ServiceResult<OrderView> {
    validate_buy_now_request(req)?;

    let food = store
        .find_food_item(req.food_item_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::FoodItemNotFound))?;
    if !food.is_available {
        return Err(AppError::new(ErrorCode::FoodItemUnavailable).into());
    }
    if req.quantity <= 0 {
        return Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            "Quantity must be greater than 0",
        )
        .into());
    }
    if req.quantity > MAX_QUANTITY {
        return Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            format!("Quantity cannot exceed {MAX_QUANTITY}"),
        )
        .into());
    }

    let sub_total = food.price * Decimal::from(req.quantity);
    let draft = OrderDraft {
        customer_id,
        seller_id: &food.seller_id,
        totals: OrderTotals::compute(sub_total, req.delivery_fee.unwrap_or(Decimal::ZERO)),
        estimated_delivery_time: estimated_delivery_time([food.preparation_time]),
        delivery_address: req.delivery_address.trim(),
        phone_number: req.phone_number.trim(),
        notes: normalize_optional_text(req.notes.clone()),
        lines: vec![(
            food.id,
            food.name.clone(),
            req.quantity,
            food.price,
            normalize_optional_text(req.special_instructions.clone()),
        )],
    };

    let order = place_order(store, numbers, &draft, &[]).await?;
    tracing::info!(
        customer_id = %customer_id,
        seller_id = %order.seller_id,
        order_id = order.id,
        order_number = %order.order_number,
        "Buy-now order created"
    );
    order_view(store, order).await
}
