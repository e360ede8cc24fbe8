//! Photo record queries.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::photo::PhotoRow;

pub struct NewPhoto<'a> {
    pub user_id: Uuid,
    pub job_id: Option<Uuid>,
    pub storage_path: &'a str,
    pub file_name: &'a str,
    pub file_size: i64,
    pub mime_type: &'a str,
}

pub async fn list_photos(pool: &PgPool, user_id: Uuid) -> Result<Vec<PhotoRow>, sqlx::Error> {
    sqlx::query_as::<_, PhotoRow>(
        "SELECT * FROM photos WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn find_photo(
    pool: &PgPool,
    photo_id: Uuid,
    user_id: Uuid,
) -> Result<Option<PhotoRow>, sqlx::Error> {
    sqlx::query_as::<_, PhotoRow>("SELECT * FROM photos WHERE id = $1 AND user_id = $2")
        .bind(photo_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_photo(pool: &PgPool, photo: NewPhoto<'_>) -> Result<PhotoRow, sqlx::Error> {
    sqlx::query_as::<_, PhotoRow>(
        r#"
        INSERT INTO photos
            (user_id, job_id, storage_path, file_name, file_size, mime_type, is_enhanced)
        VALUES ($1, $2, $3, $4, $5, $6, false)
        RETURNING *
        "#,
    )
    .bind(photo.user_id)
    .bind(photo.job_id)
    .bind(photo.storage_path)
    .bind(photo.file_name)
    .bind(photo.file_size)
    .bind(photo.mime_type)
    .fetch_one(pool)
    .await
}

/// Points the photo at its generated version and records which service made it.
/// Exactly one of `stored_path` and `provider_url` is expected.
pub async fn record_generation(
    pool: &PgPool,
    photo_id: Uuid,
    stored_path: Option<&str>,
    provider_url: Option<&str>,
    service: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE photos
        SET enhanced_path = $2, enhanced_url = $3, is_enhanced = true,
            enhancement_service = $4, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(photo_id)
    .bind(stored_path)
    .bind(provider_url)
    .bind(service)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_photo(pool: &PgPool, photo_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM photos WHERE id = $1 AND user_id = $2")
        .bind(photo_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
