//! Food item queries

use shared::models::{FoodItem, TopSellingItem};
use sqlx::PgPool;

use crate::db::{StoreError, StoreResult};

const FOOD_ITEM_COLUMNS: &str = "id, seller_id, name, description, category, price, is_available, \
     preparation_time, rating, total_ratings, total_sold, main_image_url, created_at, updated_at";

pub async fn find(pool: &PgPool, id: i64) -> StoreResult<Option<FoodItem>> {
    let sql = format!("SELECT {FOOD_ITEM_COLUMNS} FROM food_items WHERE id = $1");
    let item = sqlx::query_as::<_, FoodItem>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(item)
}

pub async fn insert(pool: &PgPool, item: &FoodItem) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO food_items (
            id, seller_id, name, description, category, price, is_available,
            preparation_time, rating, total_ratings, total_sold, main_image_url,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(item.id)
    .bind(&item.seller_id)
    .bind(&item.name)
    .bind(&item.description)
    .bind(&item.category)
    .bind(item.price)
    .bind(item.is_available)
    .bind(item.preparation_time)
    .bind(item.rating)
    .bind(item.total_ratings)
    .bind(item.total_sold)
    .bind(&item.main_image_url)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// total_sold is left alone: only checkout touches it, atomically
pub async fn update(pool: &PgPool, item: &FoodItem) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE food_items
        SET name = $2, description = $3, price = $4, is_available = $5,
            preparation_time = $6, main_image_url = $7, updated_at = $8
        WHERE id = $1
        "#,
    )
    .bind(item.id)
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.price)
    .bind(item.is_available)
    .bind(item.preparation_time)
    .bind(&item.main_image_url)
    .bind(item.updated_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("food item {}", item.id)));
    }
    Ok(())
}

pub async fn top_selling(
    pool: &PgPool,
    seller_id: &str,
    limit: u32,
) -> StoreResult<Vec<TopSellingItem>> {
    let items = sqlx::query_as::<_, TopSellingItem>(
        r#"
        SELECT id AS food_item_id, name, category, price, main_image_url, rating, total_sold
        FROM food_items
        WHERE seller_id = $1 AND total_sold > 0
        ORDER BY total_sold DESC, id
        LIMIT $2
        "#,
    )
    .bind(seller_id)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;
    Ok(items)
}
