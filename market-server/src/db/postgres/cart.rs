//! Cart and cart line queries

use shared::models::{Cart, CartItem, CartLine};
use shared::util::snowflake_id;
use sqlx::{PgConnection, PgPool};

use crate::db::{NewCartItem, StoreError, StoreResult};

const CART_COLUMNS: &str = "id, customer_id, version, created_at, updated_at, last_activity_at";

const CART_ITEM_COLUMNS: &str =
    "id, cart_id, food_item_id, quantity, special_instructions, price_snapshot, added_at, updated_at";

/// Line joined with live catalog data and the seller's display name
const CART_LINE_SELECT: &str = r#"
    SELECT ci.id, ci.cart_id, ci.food_item_id,
           fi.name AS food_item_name,
           fi.seller_id,
           COALESCE(
               NULLIF(TRIM(u.business_name), ''),
               NULLIF(TRIM(u.first_name || ' ' || u.last_name), ''),
               fi.seller_id
           ) AS seller_name,
           u.rating AS seller_rating,
           ci.quantity, ci.special_instructions, ci.price_snapshot,
           fi.price, fi.is_available, fi.preparation_time, fi.main_image_url,
           ci.added_at
    FROM cart_items ci
    JOIN food_items fi ON fi.id = ci.food_item_id
    LEFT JOIN users u ON u.id = fi.seller_id
"#;

async fn touch(conn: &mut PgConnection, cart_id: i64, now: i64) -> StoreResult<()> {
    sqlx::query("UPDATE carts SET updated_at = $2, last_activity_at = $2 WHERE id = $1")
        .bind(cart_id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn find(pool: &PgPool, customer_id: &str) -> StoreResult<Option<Cart>> {
    let sql = format!("SELECT {CART_COLUMNS} FROM carts WHERE customer_id = $1");
    let cart = sqlx::query_as::<_, Cart>(&sql)
        .bind(customer_id)
        .fetch_optional(pool)
        .await?;
    Ok(cart)
}

pub async fn get_or_create(pool: &PgPool, customer_id: &str, now: i64) -> StoreResult<Cart> {
    sqlx::query(
        r#"
        INSERT INTO carts (id, customer_id, version, created_at, updated_at, last_activity_at)
        VALUES ($1, $2, 0, $3, $3, $3)
        ON CONFLICT (customer_id) DO NOTHING
        "#,
    )
    .bind(snowflake_id())
    .bind(customer_id)
    .bind(now)
    .execute(pool)
    .await?;

    find(pool, customer_id)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("cart for {customer_id}")))
}

pub async fn load_lines(pool: &PgPool, cart_id: i64) -> StoreResult<Vec<CartLine>> {
    let sql = format!("{CART_LINE_SELECT} WHERE ci.cart_id = $1 ORDER BY ci.added_at, ci.id");
    let lines = sqlx::query_as::<_, CartLine>(&sql)
        .bind(cart_id)
        .fetch_all(pool)
        .await?;
    Ok(lines)
}

pub async fn find_line(
    pool: &PgPool,
    cart_id: i64,
    cart_item_id: i64,
) -> StoreResult<Option<CartLine>> {
    let sql = format!("{CART_LINE_SELECT} WHERE ci.cart_id = $1 AND ci.id = $2");
    let line = sqlx::query_as::<_, CartLine>(&sql)
        .bind(cart_id)
        .bind(cart_item_id)
        .fetch_optional(pool)
        .await?;
    Ok(line)
}

/// Upsert on (cart_id, food_item_id). The merge arm keeps price_snapshot and
/// is skipped entirely when the merged quantity would exceed the cap.
pub async fn add_item(
    pool: &PgPool,
    cart_id: i64,
    item: NewCartItem,
    max_quantity: i32,
) -> StoreResult<CartItem> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        r#"
        INSERT INTO cart_items (
            id, cart_id, food_item_id, quantity, special_instructions,
            price_snapshot, added_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        ON CONFLICT (cart_id, food_item_id) DO UPDATE SET
            quantity = cart_items.quantity + EXCLUDED.quantity,
            special_instructions = COALESCE(
                NULLIF(TRIM(EXCLUDED.special_instructions), ''),
                cart_items.special_instructions
            ),
            updated_at = EXCLUDED.updated_at
        WHERE cart_items.quantity + EXCLUDED.quantity <= $8
        RETURNING {CART_ITEM_COLUMNS}
        "#
    );
    let saved = sqlx::query_as::<_, CartItem>(&sql)
        .bind(snowflake_id())
        .bind(cart_id)
        .bind(item.food_item_id)
        .bind(item.quantity)
        .bind(&item.special_instructions)
        .bind(item.price_snapshot)
        .bind(item.now)
        .bind(max_quantity)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::Conflict(format!("quantity would exceed {max_quantity}")))?;

    touch(&mut tx, cart_id, item.now).await?;
    tx.commit().await?;
    Ok(saved)
}

pub async fn update_item(
    pool: &PgPool,
    cart_id: i64,
    cart_item_id: i64,
    quantity: i32,
    special_instructions: Option<String>,
    now: i64,
) -> StoreResult<Option<CartItem>> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        r#"
        UPDATE cart_items
        SET quantity = $3,
            special_instructions = COALESCE($4, special_instructions),
            updated_at = $5
        WHERE cart_id = $1 AND id = $2
        RETURNING {CART_ITEM_COLUMNS}
        "#
    );
    let saved = sqlx::query_as::<_, CartItem>(&sql)
        .bind(cart_id)
        .bind(cart_item_id)
        .bind(quantity)
        .bind(&special_instructions)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

    if saved.is_some() {
        touch(&mut tx, cart_id, now).await?;
    }
    tx.commit().await?;
    Ok(saved)
}

pub async fn remove_item(
    pool: &PgPool,
    cart_id: i64,
    cart_item_id: i64,
    now: i64,
) -> StoreResult<bool> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND id = $2")
        .bind(cart_id)
        .bind(cart_item_id)
        .execute(&mut *tx)
        .await?;

    let removed = result.rows_affected() > 0;
    if removed {
        touch(&mut tx, cart_id, now).await?;
    }
    tx.commit().await?;
    Ok(removed)
}

pub async fn clear(
    pool: &PgPool,
    cart_id: i64,
    seller_id: Option<&str>,
    now: i64,
) -> StoreResult<u64> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        DELETE FROM cart_items ci
        USING food_items fi
        WHERE ci.food_item_id = fi.id
          AND ci.cart_id = $1
          AND ($2::text IS NULL OR fi.seller_id = $2)
        "#,
    )
    .bind(cart_id)
    .bind(seller_id)
    .execute(&mut *tx)
    .await?;

    touch(&mut tx, cart_id, now).await?;
    tx.commit().await?;
    Ok(result.rows_affected())
}

pub async fn claim(pool: &PgPool, cart_id: i64, expected_version: i64, now: i64) -> StoreResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE carts
        SET version = version + 1, updated_at = $3, last_activity_at = $3
        WHERE id = $1 AND version = $2
        "#,
    )
    .bind(cart_id)
    .bind(expected_version)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}
