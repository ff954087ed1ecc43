//! In-memory store
//!
//! All tables live behind one `parking_lot::Mutex`, so every trait call is a
//! single atomic step. The lock is never held across `.await`.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared::models::{
    Cart, CartItem, CartLine, FoodItem, Order, OrderItem, OrderItemView, OrderStatus, OrdersQuery,
    Page, SortDirection, TopSellingItem, UserProfile,
};
use shared::util::snowflake_id;

use super::{MarketStore, NewCartItem, NewOrder, OrderParty, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: HashMap<String, UserProfile>,
    food_items: BTreeMap<i64, FoodItem>,
    carts: BTreeMap<i64, Cart>,
    cart_items: BTreeMap<i64, CartItem>,
    orders: BTreeMap<i64, Order>,
    order_items: Vec<OrderItem>,
    /// Sellers whose order commits fail (fault injection)
    failing_sellers: HashSet<String>,
}

/// Insert a row under a fresh id; an existing row is never overwritten
fn insert_new<V>(table: &mut BTreeMap<i64, V>, id: i64, row: V, what: &str) -> StoreResult<()> {
    if table.contains_key(&id) {
        return Err(StoreError::Duplicate(format!("{what} {id}")));
    }
    table.insert(id, row);
    Ok(())
}

impl Tables {
    fn cart_line(&self, item: &CartItem) -> Option<CartLine> {
        let food = self.food_items.get(&item.food_item_id)?;
        let seller = self.users.get(&food.seller_id);
        Some(CartLine {
            id: item.id,
            cart_id: item.cart_id,
            food_item_id: item.food_item_id,
            food_item_name: food.name.clone(),
            seller_id: food.seller_id.clone(),
            seller_name: seller
                .map(|s| s.display_name())
                .unwrap_or_else(|| food.seller_id.clone()),
            seller_rating: seller.and_then(|s| s.rating),
            quantity: item.quantity,
            special_instructions: item.special_instructions.clone(),
            price_snapshot: item.price_snapshot,
            price: food.price,
            is_available: food.is_available,
            preparation_time: food.preparation_time,
            main_image_url: food.main_image_url.clone(),
            added_at: item.added_at,
        })
    }

    fn touch_cart(&mut self, cart_id: i64, now: i64) {
        if let Some(cart) = self.carts.get_mut(&cart_id) {
            cart.updated_at = now;
            cart.last_activity_at = now;
        }
    }
}

/// Process-local `MarketStore`
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an identity directory entry
    pub fn upsert_user(&self, user: UserProfile) {
        self.tables.lock().users.insert(user.id.clone(), user);
    }

    /// Make every order commit for `seller_id` fail with a database error
    pub fn inject_commit_failure(&self, seller_id: &str) {
        self.tables
            .lock()
            .failing_sellers
            .insert(seller_id.to_string());
    }

    pub fn clear_commit_failures(&self) {
        self.tables.lock().failing_sellers.clear();
    }

    /// Overwrite a food item's live price
    pub fn set_price(&self, food_item_id: i64, price: Decimal) {
        if let Some(item) = self.tables.lock().food_items.get_mut(&food_item_id) {
            item.price = price;
        }
    }

    /// Overwrite a food item's availability flag
    pub fn set_available(&self, food_item_id: i64, is_available: bool) {
        if let Some(item) = self.tables.lock().food_items.get_mut(&food_item_id) {
            item.is_available = is_available;
        }
    }

    pub fn order_count(&self) -> usize {
        self.tables.lock().orders.len()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn find_user(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        Ok(self.tables.lock().users.get(user_id).cloned())
    }

    async fn find_food_item(&self, id: i64) -> StoreResult<Option<FoodItem>> {
        Ok(self.tables.lock().food_items.get(&id).cloned())
    }

    async fn insert_food_item(&self, item: &FoodItem) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        insert_new(&mut tables.food_items, item.id, item.clone(), "food item")
    }

    async fn update_food_item(&self, item: &FoodItem) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let existing = tables
            .food_items
            .get_mut(&item.id)
            .ok_or_else(|| StoreError::NotFound(format!("food item {}", item.id)))?;
        existing.name = item.name.clone();
        existing.description = item.description.clone();
        existing.price = item.price;
        existing.is_available = item.is_available;
        existing.preparation_time = item.preparation_time;
        existing.main_image_url = item.main_image_url.clone();
        existing.updated_at = item.updated_at;
        Ok(())
    }

    async fn top_selling_items(
        &self,
        seller_id: &str,
        limit: u32,
    ) -> StoreResult<Vec<TopSellingItem>> {
        let tables = self.tables.lock();
        let mut sold: Vec<&FoodItem> = tables
            .food_items
            .values()
            .filter(|f| f.seller_id == seller_id && f.total_sold > 0)
            .collect();
        sold.sort_by_key(|f| (std::cmp::Reverse(f.total_sold), f.id));
        Ok(sold
            .into_iter()
            .take(limit as usize)
            .map(TopSellingItem::from)
            .collect())
    }

    async fn find_cart(&self, customer_id: &str) -> StoreResult<Option<Cart>> {
        Ok(self
            .tables
            .lock()
            .carts
            .values()
            .find(|c| c.customer_id == customer_id)
            .cloned())
    }

    async fn get_or_create_cart(&self, customer_id: &str, now: i64) -> StoreResult<Cart> {
        let mut tables = self.tables.lock();
        if let Some(cart) = tables.carts.values().find(|c| c.customer_id == customer_id) {
            return Ok(cart.clone());
        }
        let cart = Cart {
            id: snowflake_id(),
            customer_id: customer_id.to_string(),
            version: 0,
            created_at: now,
            updated_at: now,
            last_activity_at: now,
        };
        insert_new(&mut tables.carts, cart.id, cart.clone(), "cart")?;
        Ok(cart)
    }

    async fn load_cart_lines(&self, cart_id: i64) -> StoreResult<Vec<CartLine>> {
        let tables = self.tables.lock();
        let mut lines: Vec<CartLine> = tables
            .cart_items
            .values()
            .filter(|i| i.cart_id == cart_id)
            .filter_map(|i| tables.cart_line(i))
            .collect();
        lines.sort_by_key(|l| (l.added_at, l.id));
        Ok(lines)
    }

    async fn find_cart_line(
        &self,
        cart_id: i64,
        cart_item_id: i64,
    ) -> StoreResult<Option<CartLine>> {
        let tables = self.tables.lock();
        Ok(tables
            .cart_items
            .get(&cart_item_id)
            .filter(|i| i.cart_id == cart_id)
            .and_then(|i| tables.cart_line(i)))
    }

    async fn add_cart_item(
        &self,
        cart_id: i64,
        item: NewCartItem,
        max_quantity: i32,
    ) -> StoreResult<CartItem> {
        let mut guard = self.tables.lock();
        let tables = &mut *guard;
        let existing = tables
            .cart_items
            .values_mut()
            .find(|i| i.cart_id == cart_id && i.food_item_id == item.food_item_id);

        let saved = match existing {
            Some(line) => {
                let merged = line.quantity + item.quantity;
                if merged > max_quantity {
                    return Err(StoreError::Conflict(format!(
                        "quantity {merged} exceeds {max_quantity}"
                    )));
                }
                line.quantity = merged;
                if let Some(text) = item.special_instructions.filter(|t| !t.trim().is_empty()) {
                    line.special_instructions = Some(text);
                }
                line.updated_at = item.now;
                line.clone()
            }
            None => {
                let line = CartItem {
                    id: snowflake_id(),
                    cart_id,
                    food_item_id: item.food_item_id,
                    quantity: item.quantity,
                    special_instructions: item.special_instructions,
                    price_snapshot: item.price_snapshot,
                    added_at: item.now,
                    updated_at: item.now,
                };
                insert_new(&mut tables.cart_items, line.id, line.clone(), "cart item")?;
                line
            }
        };
        tables.touch_cart(cart_id, item.now);
        Ok(saved)
    }

    async fn update_cart_item(
        &self,
        cart_id: i64,
        cart_item_id: i64,
        quantity: i32,
        special_instructions: Option<String>,
        now: i64,
    ) -> StoreResult<Option<CartItem>> {
        let mut tables = self.tables.lock();
        let Some(line) = tables
            .cart_items
            .get_mut(&cart_item_id)
            .filter(|i| i.cart_id == cart_id)
        else {
            return Ok(None);
        };
        line.quantity = quantity;
        if special_instructions.is_some() {
            line.special_instructions = special_instructions;
        }
        line.updated_at = now;
        let saved = line.clone();
        tables.touch_cart(cart_id, now);
        Ok(Some(saved))
    }

    async fn remove_cart_item(
        &self,
        cart_id: i64,
        cart_item_id: i64,
        now: i64,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.lock();
        let owned = tables
            .cart_items
            .get(&cart_item_id)
            .is_some_and(|i| i.cart_id == cart_id);
        if !owned {
            return Ok(false);
        }
        tables.cart_items.remove(&cart_item_id);
        tables.touch_cart(cart_id, now);
        Ok(true)
    }

    async fn clear_cart(
        &self,
        cart_id: i64,
        seller_id: Option<&str>,
        now: i64,
    ) -> StoreResult<u64> {
        let mut tables = self.tables.lock();
        let doomed: Vec<i64> = tables
            .cart_items
            .values()
            .filter(|i| i.cart_id == cart_id)
            .filter(|i| match seller_id {
                Some(seller) => tables
                    .food_items
                    .get(&i.food_item_id)
                    .is_some_and(|f| f.seller_id == seller),
                None => true,
            })
            .map(|i| i.id)
            .collect();
        for id in &doomed {
            tables.cart_items.remove(id);
        }
        tables.touch_cart(cart_id, now);
        Ok(doomed.len() as u64)
    }

    async fn claim_cart(&self, cart_id: i64, expected_version: i64, now: i64) -> StoreResult<bool> {
        let mut tables = self.tables.lock();
        let Some(cart) = tables.carts.get_mut(&cart_id) else {
            return Ok(false);
        };
        if cart.version != expected_version {
            return Ok(false);
        }
        cart.version += 1;
        cart.updated_at = now;
        cart.last_activity_at = now;
        Ok(true)
    }

    async fn commit_order(
        &self,
        new_order: &NewOrder,
        consumed_cart_items: &[i64],
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let order = &new_order.order;

        // Validate everything before the first write so a failure leaves no trace
        if tables.failing_sellers.contains(&order.seller_id) {
            return Err(StoreError::Database(format!(
                "simulated commit failure for seller {}",
                order.seller_id
            )));
        }
        if tables
            .orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::Duplicate("orders_order_number_key".into()));
        }
        if let Some(missing) = new_order
            .items
            .iter()
            .find(|i| !tables.food_items.contains_key(&i.food_item_id))
        {
            return Err(StoreError::NotFound(format!(
                "food item {}",
                missing.food_item_id
            )));
        }
        let present = consumed_cart_items
            .iter()
            .filter(|id| tables.cart_items.contains_key(id))
            .count();
        if present != consumed_cart_items.len() {
            return Err(StoreError::Conflict(format!(
                "expected to remove {} cart items, found {present}",
                consumed_cart_items.len()
            )));
        }

        insert_new(&mut tables.orders, order.id, order.clone(), "order")?;
        for item in &new_order.items {
            if let Some(food) = tables.food_items.get_mut(&item.food_item_id) {
                food.total_sold += item.quantity;
            }
            tables.order_items.push(item.clone());
        }
        let mut touched_cart = None;
        for id in consumed_cart_items {
            if let Some(line) = tables.cart_items.remove(id) {
                touched_cart = Some(line.cart_id);
            }
        }
        if let Some(cart_id) = touched_cart {
            tables.touch_cart(cart_id, order.created_at);
        }
        Ok(())
    }

    async fn find_order(&self, id: i64) -> StoreResult<Option<Order>> {
        Ok(self.tables.lock().orders.get(&id).cloned())
    }

    async fn load_order_items(&self, order_id: i64) -> StoreResult<Vec<OrderItemView>> {
        let tables = self.tables.lock();
        Ok(tables
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .map(|i| OrderItemView {
                id: i.id,
                food_item_id: i.food_item_id,
                food_item_name: i.food_item_name.clone(),
                quantity: i.quantity,
                price: i.price,
                special_instructions: i.special_instructions.clone(),
                line_total: i.price * Decimal::from(i.quantity),
                main_image_url: tables
                    .food_items
                    .get(&i.food_item_id)
                    .and_then(|f| f.main_image_url.clone()),
            })
            .collect())
    }

    async fn list_orders(
        &self,
        party: &OrderParty,
        query: &OrdersQuery,
    ) -> StoreResult<Page<Order>> {
        let tables = self.tables.lock();
        let mut matching: Vec<&Order> = tables
            .orders
            .values()
            .filter(|o| party.includes(o) && query.matches(o))
            .collect();
        match query.sort.unwrap_or_default() {
            SortDirection::Asc => matching.sort_by_key(|o| (o.created_at, o.id)),
            SortDirection::Desc => {
                matching.sort_by_key(|o| std::cmp::Reverse((o.created_at, o.id)))
            }
        }
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size() as usize)
            .cloned()
            .collect();
        Ok(Page {
            total,
            page_number: query.page_number(),
            page_size: query.page_size(),
            items,
        })
    }

    async fn update_order_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
        now: i64,
    ) -> StoreResult<Option<Order>> {
        let mut tables = self.tables.lock();
        let Some(order) = tables.orders.get_mut(&id) else {
            return Ok(None);
        };
        if order.status != from {
            return Ok(None);
        }
        order.stamp_status(to, now);
        Ok(Some(order.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn food(id: i64) -> FoodItem {
        FoodItem {
            id,
            seller_id: "s1".into(),
            name: "Lumpia".into(),
            description: None,
            category: "Snack".into(),
            price: Decimal::new(450, 2),
            is_available: true,
            preparation_time: 10,
            rating: Decimal::ZERO,
            total_ratings: 0,
            total_sold: 0,
            main_image_url: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn new_order(order_number: &str, food_item_id: i64, quantity: i32) -> NewOrder {
        let order_id = snowflake_id();
        NewOrder {
            order: Order {
                id: order_id,
                order_number: order_number.into(),
                customer_id: "c1".into(),
                seller_id: "s1".into(),
                sub_total: Decimal::ZERO,
                delivery_fee: Decimal::ZERO,
                tax: Decimal::ZERO,
                total: Decimal::ZERO,
                status: OrderStatus::Pending,
                delivery_address: "addr".into(),
                phone_number: "123".into(),
                notes: None,
                estimated_delivery_time: 40,
                created_at: 1,
                confirmed_at: None,
                preparing_at: None,
                ready_at: None,
                out_for_delivery_at: None,
                delivered_at: None,
                cancelled_at: None,
            },
            items: vec![OrderItem {
                id: snowflake_id(),
                order_id,
                food_item_id,
                food_item_name: "Lumpia".into(),
                quantity,
                price: Decimal::new(450, 2),
                special_instructions: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_commit_rolls_back_when_cart_lines_are_gone() {
        let store = MemoryStore::new();
        store.insert_food_item(&food(1)).await.unwrap();
        let cart = store.get_or_create_cart("c1", 1).await.unwrap();
        let line = store
            .add_cart_item(
                cart.id,
                NewCartItem {
                    food_item_id: 1,
                    quantity: 2,
                    special_instructions: None,
                    price_snapshot: Decimal::new(450, 2),
                    now: 1,
                },
                100,
            )
            .await
            .unwrap();

        let err = store
            .commit_order(&new_order("ORD-1", 1, 2), &[line.id, 999])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.load_cart_lines(cart.id).await.unwrap().len(), 1);
        assert_eq!(store.find_food_item(1).await.unwrap().unwrap().total_sold, 0);

        store
            .commit_order(&new_order("ORD-1", 1, 2), &[line.id])
            .await
            .unwrap();
        assert_eq!(store.order_count(), 1);
        assert!(store.load_cart_lines(cart.id).await.unwrap().is_empty());
        assert_eq!(store.find_food_item(1).await.unwrap().unwrap().total_sold, 2);

        let err = store
            .commit_order(&new_order("ORD-1", 1, 1), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_status_update_is_compare_and_set() {
        let store = MemoryStore::new();
        store.insert_food_item(&food(1)).await.unwrap();
        let order = new_order("ORD-2", 1, 1);
        let id = order.order.id;
        store.commit_order(&order, &[]).await.unwrap();

        let updated = store
            .update_order_status(id, OrderStatus::Pending, OrderStatus::Confirmed, 5)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.confirmed_at, Some(5));

        let lost = store
            .update_order_status(id, OrderStatus::Pending, OrderStatus::Cancelled, 6)
            .await
            .unwrap();
        assert!(lost.is_none());
    }

    #[test]
    fn test_insert_new_never_overwrites() {
        let mut table = BTreeMap::new();
        insert_new(&mut table, 7, "first", "row").unwrap();
        let err = insert_new(&mut table, 7, "second", "row").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref what) if what == "row 7"));
        assert_eq!(table[&7], "first");
    }

    #[tokio::test]
    async fn test_colliding_order_id_is_rejected() {
        let store = MemoryStore::new();
        store.insert_food_item(&food(1)).await.unwrap();
        let first = new_order("ORD-A", 1, 1);
        store.commit_order(&first, &[]).await.unwrap();

        let mut clash = new_order("ORD-B", 1, 3);
        clash.order.id = first.order.id;
        let err = store.commit_order(&clash, &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        let kept = store.find_order(first.order.id).await.unwrap().unwrap();
        assert_eq!(kept.order_number, "ORD-A");
        assert_eq!(store.find_food_item(1).await.unwrap().unwrap().total_sold, 1);
    }

    #[tokio::test]
    async fn test_top_selling_ranks_by_sold_count() {
        let store = MemoryStore::new();
        for id in 1..=4 {
            store.insert_food_item(&food(id)).await.unwrap();
        }
        let mut other_seller = food(5);
        other_seller.seller_id = "s2".into();
        store.insert_food_item(&other_seller).await.unwrap();

        store.commit_order(&new_order("ORD-1", 2, 5), &[]).await.unwrap();
        store.commit_order(&new_order("ORD-2", 3, 2), &[]).await.unwrap();
        store.commit_order(&new_order("ORD-3", 1, 2), &[]).await.unwrap();
        store.commit_order(&new_order("ORD-4", 5, 9), &[]).await.unwrap();

        let top = store.top_selling_items("s1", 10).await.unwrap();
        let ranked: Vec<(i64, i32)> = top.iter().map(|t| (t.food_item_id, t.total_sold)).collect();
        assert_eq!(ranked, vec![(2, 5), (1, 2), (3, 2)]);

        let top = store.top_selling_items("s1", 1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].food_item_id, 2);
    }
}
