//! Order and order line queries

use std::collections::BTreeMap;

use shared::models::{Order, OrderItemView, OrderStatus, OrdersQuery, Page, SortDirection};
use sqlx::PgPool;

use crate::db::{NewOrder, OrderParty, StoreError, StoreResult};

const ORDER_COLUMNS: &str = "id, order_number, customer_id, seller_id, sub_total, delivery_fee, \
     tax, total, status, delivery_address, phone_number, notes, estimated_delivery_time, \
     created_at, confirmed_at, preparing_at, ready_at, out_for_delivery_at, delivered_at, \
     cancelled_at";

/// Lifecycle column stamped on entering a status
fn timestamp_column(status: OrderStatus) -> Option<&'static str> {
    match status {
        OrderStatus::Pending => None,
        OrderStatus::Confirmed => Some("confirmed_at"),
        OrderStatus::Preparing => Some("preparing_at"),
        OrderStatus::Ready => Some("ready_at"),
        OrderStatus::OutForDelivery => Some("out_for_delivery_at"),
        OrderStatus::Delivered => Some("delivered_at"),
        OrderStatus::Cancelled => Some("cancelled_at"),
    }
}

pub async fn commit(pool: &PgPool, new_order: &NewOrder, consumed_cart_items: &[i64]) -> StoreResult<()> {
    let order = &new_order.order;
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, customer_id, seller_id, sub_total, delivery_fee, tax, total,
            status, delivery_address, phone_number, notes, estimated_delivery_time, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(&order.customer_id)
    .bind(&order.seller_id)
    .bind(order.sub_total)
    .bind(order.delivery_fee)
    .bind(order.tax)
    .bind(order.total)
    .bind(order.status)
    .bind(&order.delivery_address)
    .bind(&order.phone_number)
    .bind(&order.notes)
    .bind(order.estimated_delivery_time)
    .bind(order.created_at)
    .execute(&mut *tx)
    .await?;

    if !new_order.items.is_empty() {
        let items = &new_order.items;
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        let order_ids: Vec<i64> = items.iter().map(|i| i.order_id).collect();
        let food_item_ids: Vec<i64> = items.iter().map(|i| i.food_item_id).collect();
        let names: Vec<String> = items.iter().map(|i| i.food_item_name.clone()).collect();
        let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
        let prices: Vec<rust_decimal::Decimal> = items.iter().map(|i| i.price).collect();
        let instructions: Vec<Option<String>> =
            items.iter().map(|i| i.special_instructions.clone()).collect();
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, food_item_id, food_item_name, quantity, price, special_instructions
            )
            SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::bigint[], $4::text[], $5::integer[], $6::numeric[], $7::text[])
            "#,
        )
        .bind(&ids)
        .bind(&order_ids)
        .bind(&food_item_ids)
        .bind(&names)
        .bind(&quantities)
        .bind(&prices)
        .bind(&instructions)
        .execute(&mut *tx)
        .await?;

        // Atomic increments, one row per food item
        let mut sold: BTreeMap<i64, i32> = BTreeMap::new();
        for item in items {
            *sold.entry(item.food_item_id).or_default() += item.quantity;
        }
        let sold_ids: Vec<i64> = sold.keys().copied().collect();
        let sold_qty: Vec<i32> = sold.values().copied().collect();
        sqlx::query(
            r#"
            UPDATE food_items fi
            SET total_sold = fi.total_sold + s.qty
            FROM UNNEST($1::bigint[], $2::integer[]) AS s(id, qty)
            WHERE fi.id = s.id
            "#,
        )
        .bind(&sold_ids)
        .bind(&sold_qty)
        .execute(&mut *tx)
        .await?;
    }

    if !consumed_cart_items.is_empty() {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = ANY($1)")
            .bind(consumed_cart_items)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() != consumed_cart_items.len() as u64 {
            // Dropping `tx` rolls back the order insert and sold counts
            return Err(StoreError::Conflict(format!(
                "expected to remove {} cart items, removed {}",
                consumed_cart_items.len(),
                result.rows_affected()
            )));
        }
    }

    tx.commit().await?;
    Ok(())
}

pub async fn find(pool: &PgPool, id: i64) -> StoreResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(order)
}

pub async fn load_items(pool: &PgPool, order_id: i64) -> StoreResult<Vec<OrderItemView>> {
    let items = sqlx::query_as::<_, OrderItemView>(
        r#"
        SELECT oi.id, oi.food_item_id, oi.food_item_name, oi.quantity, oi.price,
               oi.special_instructions,
               oi.price * oi.quantity AS line_total,
               fi.main_image_url
        FROM order_items oi
        LEFT JOIN food_items fi ON fi.id = oi.food_item_id
        WHERE oi.order_id = $1
        ORDER BY oi.id
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

pub async fn list(pool: &PgPool, party: &OrderParty, query: &OrdersQuery) -> StoreResult<Page<Order>> {
    let (column, party_id) = match party {
        OrderParty::Customer(id) => ("customer_id", id),
        OrderParty::Seller(id) => ("seller_id", id),
    };
    let direction = match query.sort.unwrap_or_default() {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    let filter = format!(
        "{column} = $1 \
         AND ($2::text IS NULL OR strpos(order_number, $2) > 0) \
         AND ($3::numeric IS NULL OR total <= $3) \
         AND ($4::order_status IS NULL OR status = $4)"
    );

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders WHERE {filter}"))
        .bind(party_id)
        .bind(&query.order_number)
        .bind(query.max_total)
        .bind(query.status)
        .fetch_one(pool)
        .await?;

    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE {filter} \
         ORDER BY created_at {direction}, id {direction} LIMIT $5 OFFSET $6"
    );
    let items = sqlx::query_as::<_, Order>(&sql)
        .bind(party_id)
        .bind(&query.order_number)
        .bind(query.max_total)
        .bind(query.status)
        .bind(i64::from(query.page_size()))
        .bind(query.offset() as i64)
        .fetch_all(pool)
        .await?;

    Ok(Page {
        total: total.max(0) as u64,
        page_number: query.page_number(),
        page_size: query.page_size(),
        items,
    })
}

/// Compare-and-set on status; a lost race returns None
pub async fn update_status(
    pool: &PgPool,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
    now: i64,
) -> StoreResult<Option<Order>> {
    let stamp = timestamp_column(to)
        .map(|col| format!(", {col} = $4"))
        .unwrap_or_default();
    let sql = format!(
        "UPDATE orders SET status = $3{stamp} WHERE id = $1 AND status = $2 RETURNING {ORDER_COLUMNS}"
    );
    let mut q = sqlx::query_as::<_, Order>(&sql).bind(id).bind(from).bind(to);
    if timestamp_column(to).is_some() {
        q = q.bind(now);
    }
    let order = q.fetch_optional(pool).await?;
    Ok(order)
}
