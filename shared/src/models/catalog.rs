//! Catalog Model (seller menu items)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default preparation time in minutes
pub const DEFAULT_PREPARATION_TIME: i32 = 30;

/// Sellable menu item with a live price and availability flag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct FoodItem {
    pub id: i64,
    /// Owning seller (user id)
    pub seller_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    /// Live catalog price
    pub price: Decimal,
    pub is_available: bool,
    /// Preparation time in minutes
    pub preparation_time: i32,
    pub rating: Decimal,
    pub total_ratings: i32,
    /// Only ever incremented by checkout
    pub total_sold: i32,
    pub main_image_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Entry in a seller's best-seller ranking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TopSellingItem {
    pub food_item_id: i64,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub main_image_url: Option<String>,
    pub rating: Decimal,
    pub total_sold: i32,
}

impl From<&FoodItem> for TopSellingItem {
    fn from(item: &FoodItem) -> Self {
        Self {
            food_item_id: item.id,
            name: item.name.clone(),
            category: item.category.clone(),
            price: item.price,
            main_image_url: item.main_image_url.clone(),
            rating: item.rating,
            total_sold: item.total_sold,
        }
    }
}

/// `?limit=` for the best-seller ranking
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopItemsQuery {
    pub limit: Option<u32>,
}

/// Create food item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItemCreate {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub preparation_time: Option<i32>,
    pub is_available: Option<bool>,
    pub main_image_url: Option<String>,
}

/// Update food item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_available: Option<bool>,
    pub preparation_time: Option<i32>,
    pub main_image_url: Option<String>,
}

impl FoodItemUpdate {
    /// Apply the present fields onto an existing item
    pub fn apply_to(&self, item: &mut FoodItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = Some(description.clone());
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(is_available) = self.is_available {
            item.is_available = is_available;
        }
        if let Some(preparation_time) = self.preparation_time {
            item.preparation_time = preparation_time;
        }
        if let Some(url) = &self.main_image_url {
            item.main_image_url = Some(url.clone());
        }
    }
}
