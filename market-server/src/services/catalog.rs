//! Seller catalog management

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    DEFAULT_PREPARATION_TIME, FoodItem, FoodItemCreate, FoodItemUpdate, TopSellingItem,
};
use shared::util::{now_millis, snowflake_id};

use crate::auth::Identity;
use crate::db::MarketStore;
use crate::error::ServiceResult;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, normalize_optional_text, validate_optional_text,
    validate_required_text,
};

/// Upper bound on preparation time (minutes)
const MAX_PREPARATION_TIME: i32 = 24 * 60;

pub const DEFAULT_TOP_ITEMS: u32 = 10;
const MAX_TOP_ITEMS: u32 = 50;

fn check_price(price: Decimal) -> Result<(), AppError> {
    if price <= Decimal::ZERO {
        return Err(AppError::new(ErrorCode::FoodItemInvalidPrice));
    }
    Ok(())
}

fn check_preparation_time(minutes: i32) -> Result<(), AppError> {
    if !(1..=MAX_PREPARATION_TIME).contains(&minutes) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("preparation_time must be between 1 and {MAX_PREPARATION_TIME} minutes"),
        ));
    }
    Ok(())
}

pub async fn get_food_item(store: &dyn MarketStore, id: i64) -> ServiceResult<FoodItem> {
    Ok(store
        .find_food_item(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::FoodItemNotFound))?)
}

pub async fn create_food_item(
    store: &dyn MarketStore,
    seller_id: &str,
    req: FoodItemCreate,
) -> ServiceResult<FoodItem> {
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&req.category, "category", MAX_NAME_LEN)?;
    validate_optional_text(&req.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&req.main_image_url, "main_image_url", MAX_URL_LEN)?;
    check_price(req.price)?;
    let preparation_time = req.preparation_time.unwrap_or(DEFAULT_PREPARATION_TIME);
    check_preparation_time(preparation_time)?;

    let now = now_millis();
    let item = FoodItem {
        id: snowflake_id(),
        seller_id: seller_id.to_string(),
        name: req.name.trim().to_string(),
        description: normalize_optional_text(req.description),
        category: req.category.trim().to_string(),
        price: req.price,
        is_available: req.is_available.unwrap_or(true),
        preparation_time,
        rating: Decimal::ZERO,
        total_ratings: 0,
        total_sold: 0,
        main_image_url: normalize_optional_text(req.main_image_url),
        created_at: now,
        updated_at: now,
    };
    store.insert_food_item(&item).await?;

    tracing::info!(seller_id = %seller_id, food_item_id = item.id, name = %item.name, "Food item created");
    Ok(item)
}

/// Owners (and admins) may change price, availability and descriptive fields
pub async fn update_food_item(
    store: &dyn MarketStore,
    actor: &Identity,
    id: i64,
    req: FoodItemUpdate,
) -> ServiceResult<FoodItem> {
    let mut item = store
        .find_food_item(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::FoodItemNotFound))?;
    if item.seller_id != actor.user_id && !actor.is_admin() {
        return Err(AppError::forbidden("You can only update your own food items").into());
    }

    if let Some(name) = &req.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&req.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&req.main_image_url, "main_image_url", MAX_URL_LEN)?;
    if let Some(price) = req.price {
        check_price(price)?;
    }
    if let Some(minutes) = req.preparation_time {
        check_preparation_time(minutes)?;
    }

    let old_price = item.price;
    req.apply_to(&mut item);
    item.updated_at = now_millis();
    store.update_food_item(&item).await?;

    if item.price != old_price {
        tracing::info!(
            seller_id = %item.seller_id,
            food_item_id = item.id,
            old_price = %old_price,
            new_price = %item.price,
            "Food item price changed"
        );
    }
    Ok(item)
}

/// Best sellers by the checkout-maintained `total_sold` counter
pub async fn top_selling_items(
    store: &dyn MarketStore,
    seller_id: &str,
    limit: Option<u32>,
) -> ServiceResult<Vec<TopSellingItem>> {
    let limit = limit.unwrap_or(DEFAULT_TOP_ITEMS);
    if !(1..=MAX_TOP_ITEMS).contains(&limit) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("limit must be between 1 and {MAX_TOP_ITEMS}"),
        )
        .into());
    }
    Ok(store.top_selling_items(seller_id, limit).await?)
}
