//! Storage layer
//!
//! `MarketStore` is the seam between services and persistence. Two backends:
//! - [`postgres::PgStore`]: sqlx over PostgreSQL (production)
//! - [`memory::MemoryStore`]: process-local tables (development and tests)

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    Cart, CartItem, CartLine, FoodItem, Order, OrderItem, OrderItemView, OrderStatus, OrdersQuery,
    Page, TopSellingItem, UserProfile,
};
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// A guarded write found the row in an unexpected state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unique constraint violation
    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Duplicate(db_err.constraint().unwrap_or("unique").to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Cart line to add (or merge into an existing line for the same food item)
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub food_item_id: i64,
    pub quantity: i32,
    pub special_instructions: Option<String>,
    /// Used only when a new line is inserted
    pub price_snapshot: Decimal,
    pub now: i64,
}

/// Order with its lines, ready to be committed
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Which side of an order a listing is for
#[derive(Debug, Clone)]
pub enum OrderParty {
    Customer(String),
    Seller(String),
}

impl OrderParty {
    pub fn includes(&self, order: &Order) -> bool {
        match self {
            OrderParty::Customer(id) => &order.customer_id == id,
            OrderParty::Seller(id) => &order.seller_id == id,
        }
    }
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    // ── Identity directory ──

    async fn find_user(&self, user_id: &str) -> StoreResult<Option<UserProfile>>;

    // ── Catalog ──

    async fn find_food_item(&self, id: i64) -> StoreResult<Option<FoodItem>>;

    async fn insert_food_item(&self, item: &FoodItem) -> StoreResult<()>;

    /// Overwrite mutable fields (name, description, price, availability, prep time, image)
    async fn update_food_item(&self, item: &FoodItem) -> StoreResult<()>;

    /// A seller's items with at least one sale, by `total_sold` desc then id
    async fn top_selling_items(&self, seller_id: &str, limit: u32)
    -> StoreResult<Vec<TopSellingItem>>;

    // ── Cart ──

    async fn find_cart(&self, customer_id: &str) -> StoreResult<Option<Cart>>;

    /// At most one cart per customer, created on first use
    async fn get_or_create_cart(&self, customer_id: &str, now: i64) -> StoreResult<Cart>;

    /// Lines joined with live catalog data, ordered by `added_at`, then id
    async fn load_cart_lines(&self, cart_id: i64) -> StoreResult<Vec<CartLine>>;

    async fn find_cart_line(&self, cart_id: i64, cart_item_id: i64)
    -> StoreResult<Option<CartLine>>;

    /// Insert a line or add to the existing line for the same food item.
    ///
    /// The snapshot is kept on merge; special instructions are replaced only
    /// when new ones are given. Fails with `Conflict` when the merged quantity
    /// would exceed `max_quantity`.
    async fn add_cart_item(
        &self,
        cart_id: i64,
        item: NewCartItem,
        max_quantity: i32,
    ) -> StoreResult<CartItem>;

    /// None when the line does not belong to the cart
    async fn update_cart_item(
        &self,
        cart_id: i64,
        cart_item_id: i64,
        quantity: i32,
        special_instructions: Option<String>,
        now: i64,
    ) -> StoreResult<Option<CartItem>>;

    async fn remove_cart_item(&self, cart_id: i64, cart_item_id: i64, now: i64)
    -> StoreResult<bool>;

    /// Remove all lines, or only one seller's; returns the number removed
    async fn clear_cart(&self, cart_id: i64, seller_id: Option<&str>, now: i64)
    -> StoreResult<u64>;

    /// Compare-and-bump the cart version; false when another claim won
    async fn claim_cart(&self, cart_id: i64, expected_version: i64, now: i64)
    -> StoreResult<bool>;

    // ── Orders ──

    /// One unit of work: insert order and items, increment sold counts,
    /// delete exactly `consumed_cart_items`. Any mismatch rolls everything back.
    async fn commit_order(&self, order: &NewOrder, consumed_cart_items: &[i64])
    -> StoreResult<()>;

    async fn find_order(&self, id: i64) -> StoreResult<Option<Order>>;

    async fn load_order_items(&self, order_id: i64) -> StoreResult<Vec<OrderItemView>>;

    async fn list_orders(&self, party: &OrderParty, query: &OrdersQuery)
    -> StoreResult<Page<Order>>;

    /// Compare-and-set on the current status, stamping the target's timestamp.
    /// None when the order is no longer in `from`.
    async fn update_order_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
        now: i64,
    ) -> StoreResult<Option<Order>>;
}
