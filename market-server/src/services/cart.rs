//! Cart aggregation and cart mutations

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    AddToCartRequest, Cart, CartItemView, CartLine, CartView, ClearSellerCartResponse, MAX_QUANTITY,
    MAX_SPECIAL_INSTRUCTIONS_LEN, MIN_QUANTITY, SellerCart, UpdateCartItemRequest,
};
use shared::util::now_millis;

use crate::db::{MarketStore, NewCartItem, StoreError};
use crate::error::ServiceResult;
use crate::utils::validation::{normalize_optional_text, validate_optional_text};

/// Group lines by seller, keeping first-appearance order
pub fn partition_by_seller(lines: &[CartLine]) -> Vec<(&str, Vec<&CartLine>)> {
    let mut groups: Vec<(&str, Vec<&CartLine>)> = Vec::new();
    for line in lines {
        match groups.iter_mut().find(|(seller, _)| *seller == line.seller_id) {
            Some((_, group)) => group.push(line),
            None => groups.push((line.seller_id.as_str(), vec![line])),
        }
    }
    groups
}

/// Build the seller-grouped view of a cart
pub fn aggregate(cart: &Cart, lines: &[CartLine]) -> CartView {
    let sellers: Vec<SellerCart> = partition_by_seller(lines)
        .into_iter()
        .map(|(seller_id, group)| {
            let first = group[0];
            SellerCart {
                seller_id: seller_id.to_string(),
                business_name: first.seller_name.clone(),
                seller_rating: first.seller_rating,
                sub_total: group.iter().map(|l| l.line_total()).sum(),
                total_items: group.iter().map(|l| l.quantity).sum(),
                items: group.into_iter().map(CartItemView::from).collect(),
            }
        })
        .collect();

    CartView {
        id: cart.id,
        customer_id: cart.customer_id.clone(),
        grand_total: sellers.iter().map(|s| s.sub_total).sum::<Decimal>(),
        total_items: sellers.iter().map(|s| s.total_items).sum(),
        sellers,
        updated_at: cart.updated_at,
    }
}

fn check_quantity(quantity: i32) -> Result<(), AppError> {
    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
        return Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            format!("Quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}"),
        ));
    }
    Ok(())
}

fn cart_item_not_found() -> AppError {
    AppError::new(ErrorCode::CartItemNotFound)
}

async fn line_view(
    store: &dyn MarketStore,
    cart_id: i64,
    cart_item_id: i64,
) -> ServiceResult<CartItemView> {
    let line = store
        .find_cart_line(cart_id, cart_item_id)
        .await?
        .ok_or_else(cart_item_not_found)?;
    Ok(CartItemView::from(&line))
}

/// Load (or lazily create) the customer's cart, grouped by seller
pub async fn get_cart(store: &dyn MarketStore, customer_id: &str) -> ServiceResult<CartView> {
    let cart = store.get_or_create_cart(customer_id, now_millis()).await?;
    let lines = store.load_cart_lines(cart.id).await?;
    Ok(aggregate(&cart, &lines))
}

/// Add a food item, merging into the existing line for the same item
pub async fn add_to_cart(
    store: &dyn MarketStore,
    customer_id: &str,
    req: AddToCartRequest,
) -> ServiceResult<CartItemView> {
    let food = store
        .find_food_item(req.food_item_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::FoodItemNotFound))?;
    if !food.is_available {
        return Err(AppError::new(ErrorCode::FoodItemUnavailable).into());
    }
    check_quantity(req.quantity)?;
    validate_optional_text(
        &req.special_instructions,
        "special_instructions",
        MAX_SPECIAL_INSTRUCTIONS_LEN,
    )?;

    let now = now_millis();
    let cart = store.get_or_create_cart(customer_id, now).await?;
    let new_item = NewCartItem {
        food_item_id: food.id,
        quantity: req.quantity,
        special_instructions: normalize_optional_text(req.special_instructions),
        price_snapshot: food.price,
        now,
    };
    let saved = match store.add_cart_item(cart.id, new_item, MAX_QUANTITY).await {
        Ok(saved) => saved,
        Err(StoreError::Conflict(_)) => {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!("Quantity for {} cannot exceed {MAX_QUANTITY}", food.name),
            )
            .into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        customer_id = %customer_id,
        food_item_id = food.id,
        quantity = saved.quantity,
        "Cart item added"
    );
    line_view(store, cart.id, saved.id).await
}

pub async fn update_cart_item(
    store: &dyn MarketStore,
    customer_id: &str,
    cart_item_id: i64,
    req: UpdateCartItemRequest,
) -> ServiceResult<CartItemView> {
    check_quantity(req.quantity)?;
    validate_optional_text(
        &req.special_instructions,
        "special_instructions",
        MAX_SPECIAL_INSTRUCTIONS_LEN,
    )?;

    let cart = store
        .find_cart(customer_id)
        .await?
        .ok_or_else(cart_item_not_found)?;
    store
        .update_cart_item(
            cart.id,
            cart_item_id,
            req.quantity,
            normalize_optional_text(req.special_instructions),
            now_millis(),
        )
        .await?
        .ok_or_else(cart_item_not_found)?;

    line_view(store, cart.id, cart_item_id).await
}

pub async fn remove_cart_item(
    store: &dyn MarketStore,
    customer_id: &str,
    cart_item_id: i64,
) -> ServiceResult<()> {
    let cart = store
        .find_cart(customer_id)
        .await?
        .ok_or_else(cart_item_not_found)?;
    if !store
        .remove_cart_item(cart.id, cart_item_id, now_millis())
        .await?
    {
        return Err(cart_item_not_found().into());
    }
    Ok(())
}

/// Empty the whole cart (the cart itself is kept)
pub async fn clear_cart(store: &dyn MarketStore, customer_id: &str) -> ServiceResult<u64> {
    let cart = store
        .find_cart(customer_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CartNotFound))?;
    let removed = store.clear_cart(cart.id, None, now_millis()).await?;
    tracing::info!(customer_id = %customer_id, removed, "Cart cleared");
    Ok(removed)
}

/// Remove one seller's lines
pub async fn clear_seller_cart(
    store: &dyn MarketStore,
    customer_id: &str,
    seller_id: &str,
) -> ServiceResult<ClearSellerCartResponse> {
    let cart = store
        .find_cart(customer_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CartNotFound))?;
    let removed = store
        .clear_cart(cart.id, Some(seller_id), now_millis())
        .await?;
    if removed == 0 {
        return Err(AppError::with_message(
            ErrorCode::CartItemNotFound,
            "No items from this seller in cart",
        )
        .into());
    }
    Ok(ClearSellerCartResponse {
        seller_id: seller_id.to_string(),
        removed,
    })
}
