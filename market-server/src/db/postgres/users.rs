//! Identity directory queries

use shared::models::UserProfile;
use sqlx::PgPool;

use crate::db::StoreResult;

pub async fn find(pool: &PgPool, user_id: &str) -> StoreResult<Option<UserProfile>> {
    let user = sqlx::query_as::<_, UserProfile>(
        "SELECT id, first_name, last_name, email, business_name, rating FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}
