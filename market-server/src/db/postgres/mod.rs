//! PostgreSQL store
//!
//! Table-level queries live in submodules as free functions over `&PgPool`
//! (or a transaction); `PgStore` wires them into [`MarketStore`].

mod cart;
mod catalog;
mod orders;
mod users;

use async_trait::async_trait;
use shared::models::{
    Cart, CartItem, CartLine, FoodItem, Order, OrderItemView, OrderStatus, OrdersQuery, Page,
    TopSellingItem, UserProfile,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{MarketStore, NewCartItem, NewOrder, OrderParty, StoreResult};

/// `MarketStore` over a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and apply pending migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| super::StoreError::Database(e.to_string()))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MarketStore for PgStore {
    async fn find_user(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        users::find(&self.pool, user_id).await
    }

    async fn find_food_item(&self, id: i64) -> StoreResult<Option<FoodItem>> {
        catalog::find(&self.pool, id).await
    }

    async fn insert_food_item(&self, item: &FoodItem) -> StoreResult<()> {
        catalog::insert(&self.pool, item).await
    }

    async fn update_food_item(&self, item: &FoodItem) -> StoreResult<()> {
        catalog::update(&self.pool, item).await
    }

    async fn top_selling_items(
        &self,
        seller_id: &str,
        limit: u32,
    ) -> StoreResult<Vec<TopSellingItem>> {
        catalog::top_selling(&self.pool, seller_id, limit).await
    }

    async fn find_cart(&self, customer_id: &str) -> StoreResult<Option<Cart>> {
        cart::find(&self.pool, customer_id).await
    }

    async fn get_or_create_cart(&self, customer_id: &str, now: i64) -> StoreResult<Cart> {
        cart::get_or_create(&self.pool, customer_id, now).await
    }

    async fn load_cart_lines(&self, cart_id: i64) -> StoreResult<Vec<CartLine>> {
        cart::load_lines(&self.pool, cart_id).await
    }

    async fn find_cart_line(
        &self,
        cart_id: i64,
        cart_item_id: i64,
    ) -> StoreResult<Option<CartLine>> {
        cart::find_line(&self.pool, cart_id, cart_item_id).await
    }

    async fn add_cart_item(
        &self,
        cart_id: i64,
        item: NewCartItem,
        max_quantity: i32,
    ) -> StoreResult<CartItem> {
        cart::add_item(&self.pool, cart_id, item, max_quantity).await
    }

    async fn update_cart_item(
        &self,
        cart_id: i64,
        cart_item_id: i64,
        quantity: i32,
        special_instructions: Option<String>,
        now: i64,
    ) -> StoreResult<Option<CartItem>> {
        cart::update_item(
            &self.pool,
            cart_id,
            cart_item_id,
            quantity,
            special_instructions,
            now,
        )
        .await
    }

    async fn remove_cart_item(
        &self,
        cart_id: i64,
        cart_item_id: i64,
        now: i64,
    ) -> StoreResult<bool> {
        cart::remove_item(&self.pool, cart_id, cart_item_id, now).await
    }

    async fn clear_cart(
        &self,
        cart_id: i64,
        seller_id: Option<&str>,
        now: i64,
    ) -> StoreResult<u64> {
        cart::clear(&self.pool, cart_id, seller_id, now).await
    }

    async fn claim_cart(&self, cart_id: i64, expected_version: i64, now: i64) -> StoreResult<bool> {
        cart::claim(&self.pool, cart_id, expected_version, now).await
    }

    async fn commit_order(
        &self,
        order: &NewOrder,
        consumed_cart_items: &[i64],
    ) -> StoreResult<()> {
        orders::commit(&self.pool, order, consumed_cart_items).await
    }

    async fn find_order(&self, id: i64) -> StoreResult<Option<Order>> {
        orders::find(&self.pool, id).await
    }

    async fn load_order_items(&self, order_id: i64) -> StoreResult<Vec<OrderItemView>> {
        orders::load_items(&self.pool, order_id).await
    }

    async fn list_orders(
        &self,
        party: &OrderParty,
        query: &OrdersQuery,
    ) -> StoreResult<Page<Order>> {
        orders::list(&self.pool, party, query).await
    }

    async fn update_order_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
        now: i64,
    ) -> StoreResult<Option<Order>> {
        orders::update_status(&self.pool, id, from, to, now).await
    }
}
