//! Cart Model
//!
//! One cart per customer, spanning any number of sellers. Every line carries
//! the catalog price captured when it was first added (the price snapshot).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quantity bounds for a single cart line
pub const MIN_QUANTITY: i32 = 1;
pub const MAX_QUANTITY: i32 = 100;

/// Max length of per-line special instructions
pub const MAX_SPECIAL_INSTRUCTIONS_LEN: usize = 200;

/// Cart entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: i64,
    pub customer_id: String,
    /// Bumped by every checkout claim
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_activity_at: i64,
}

/// Cart line entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub food_item_id: i64,
    pub quantity: i32,
    pub special_instructions: Option<String>,
    /// Price at add time, never refreshed
    pub price_snapshot: Decimal,
    pub added_at: i64,
    pub updated_at: i64,
}

/// Cart line joined with live catalog and seller data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: i64,
    pub cart_id: i64,
    pub food_item_id: i64,
    pub food_item_name: String,
    pub seller_id: String,
    pub seller_name: String,
    pub seller_rating: Option<Decimal>,
    pub quantity: i32,
    pub special_instructions: Option<String>,
    pub price_snapshot: Decimal,
    /// Live catalog price
    pub price: Decimal,
    pub is_available: bool,
    pub preparation_time: i32,
    pub main_image_url: Option<String>,
    pub added_at: i64,
}

impl CartLine {
    /// quantity × snapshot
    pub fn line_total(&self) -> Decimal {
        self.price_snapshot * Decimal::from(self.quantity)
    }

    pub fn price_changed(&self) -> bool {
        self.price_snapshot != self.price
    }
}

/// Cart line as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItemView {
    pub id: i64,
    pub food_item_id: i64,
    pub food_item_name: String,
    /// Live catalog price
    pub food_item_price: Decimal,
    pub price_snapshot: Decimal,
    pub quantity: i32,
    pub special_instructions: Option<String>,
    pub added_at: i64,
    pub line_total: Decimal,
    pub is_available: bool,
    pub main_image_url: Option<String>,
    pub seller_name: String,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id,
            food_item_id: line.food_item_id,
            food_item_name: line.food_item_name.clone(),
            food_item_price: line.price,
            price_snapshot: line.price_snapshot,
            quantity: line.quantity,
            special_instructions: line.special_instructions.clone(),
            added_at: line.added_at,
            line_total: line.line_total(),
            is_available: line.is_available,
            main_image_url: line.main_image_url.clone(),
            seller_name: line.seller_name.clone(),
        }
    }
}

/// One seller's group within a cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SellerCart {
    pub seller_id: String,
    pub business_name: String,
    pub seller_rating: Option<Decimal>,
    pub items: Vec<CartItemView>,
    /// Σ quantity × snapshot
    pub sub_total: Decimal,
    pub total_items: i32,
}

/// Whole cart grouped by seller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartView {
    pub id: i64,
    pub customer_id: String,
    pub sellers: Vec<SellerCart>,
    pub grand_total: Decimal,
    pub total_items: i32,
    pub updated_at: i64,
}

fn default_quantity() -> i32 {
    1
}

/// Add to cart payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCartRequest {
    pub food_item_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub special_instructions: Option<String>,
}

/// Update cart line payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
    pub special_instructions: Option<String>,
}

/// Result of clearing one seller's lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearSellerCartResponse {
    pub seller_id: String,
    pub removed: u64,
}

/// Kind of problem found on a cart line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ValidationIssueType {
    Unavailable,
    PriceIncrease,
    PriceDecrease,
}

/// One problem found on a cart line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub issue_type: ValidationIssueType,
    /// Cart line id
    pub item_id: i64,
    pub item_name: String,
    pub old_price: Option<Decimal>,
    pub new_price: Option<Decimal>,
    /// new - old
    pub price_difference: Option<Decimal>,
    pub message: String,
}

/// Cart validation report
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// False when any line is unavailable
    pub can_proceed: bool,
    /// True when any price changed
    pub requires_confirmation: bool,
    pub has_price_changes: bool,
    pub has_unavailable_items: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let has_unavailable_items = issues
            .iter()
            .any(|i| i.issue_type == ValidationIssueType::Unavailable);
        let has_price_changes = issues
            .iter()
            .any(|i| i.issue_type != ValidationIssueType::Unavailable);
        Self {
            is_valid: issues.is_empty(),
            can_proceed: !has_unavailable_items,
            requires_confirmation: has_price_changes,
            has_price_changes,
            has_unavailable_items,
            issues,
        }
    }
}
