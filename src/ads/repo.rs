use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{TargetAudience, UpdateAdRequest};
use super::validation::NewAd;

/// Ad row joined with its publisher's display fields.
#[derive(Debug, Clone, FromRow)]
pub struct AdRow {
    pub id: Uuid,
    pub publisher: Uuid,
    pub title: String,
    pub ad_slot: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub device: String,
    pub budget: f64,
    pub bid_type: String,
    pub image_url: Option<String>,
    pub target_audience: Json<TargetAudience>,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub publisher_username: String,
    pub publisher_email: String,
}

/// Conjunctive listing filter. `location` is a case-insensitive substring
/// match; the rest are exact.
#[derive(Debug, Default)]
pub struct AdFilter<'a> {
    pub category: Option<&'a str>,
    pub location: Option<&'a str>,
    pub status: Option<&'a str>,
    pub publisher: Option<Uuid>,
}

const SELECT_JOINED: &str = r#"
    SELECT a.id, a.publisher, a.title, a.ad_slot, a.description, a.location,
           a.category, a.device, a.budget, a.bid_type, a.image_url,
           a.target_audience, a.status, a.created_at, a.updated_at,
           u.username AS publisher_username, u.email AS publisher_email
    FROM ads a
    JOIN users u ON u.id = a.publisher
"#;

const FILTER_CLAUSE: &str = r#"
    WHERE ($1::text IS NULL OR a.category = $1)
      AND ($2::text IS NULL OR a.location ILIKE '%' || $2 || '%')
      AND ($3::text IS NULL OR a.status = $3)
      AND ($4::uuid IS NULL OR a.publisher = $4)
"#;

pub async fn count(db: &PgPool, filter: &AdFilter<'_>) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM ads a {FILTER_CLAUSE}");
    sqlx::query_scalar::<_, i64>(&sql)
        .bind(filter.category)
        .bind(filter.location)
        .bind(filter.status)
        .bind(filter.publisher)
        .fetch_one(db)
        .await
}

pub async fn list(
    db: &PgPool,
    filter: &AdFilter<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<AdRow>, sqlx::Error> {
    let sql = format!(
        "{SELECT_JOINED} {FILTER_CLAUSE} ORDER BY a.created_at DESC LIMIT $5 OFFSET $6"
    );
    sqlx::query_as::<_, AdRow>(&sql)
        .bind(filter.category)
        .bind(filter.location)
        .bind(filter.status)
        .bind(filter.publisher)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<AdRow>, sqlx::Error> {
    let sql = format!("{SELECT_JOINED} WHERE a.id = $1");
    sqlx::query_as::<_, AdRow>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert(
    db: &PgPool,
    publisher: Uuid,
    ad: &NewAd,
    image_url: Option<&str>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO ads (publisher, title, ad_slot, description, location, category,
                         device, budget, bid_type, image_url, target_audience)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        "#,
    )
    .bind(publisher)
    .bind(&ad.title)
    .bind(&ad.ad_slot)
    .bind(&ad.description)
    .bind(&ad.location)
    .bind(&ad.category)
    .bind(ad.device.as_str())
    .bind(ad.budget)
    .bind(ad.bid_type.as_str())
    .bind(image_url)
    .bind(Json(&ad.target_audience))
    .fetch_one(db)
    .await
}

/// Partial update: absent fields keep their stored value, `updated_at` is
/// always refreshed. `publisher`, `image_url` and `created_at` are not
/// patchable.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    patch: &UpdateAdRequest,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE ads SET
            title = COALESCE($2, title),
            ad_slot = COALESCE($3, ad_slot),
            description = COALESCE($4, description),
            location = COALESCE($5, location),
            category = COALESCE($6, category),
            device = COALESCE($7, device),
            budget = COALESCE($8, budget),
            bid_type = COALESCE($9, bid_type),
            target_audience = COALESCE($10, target_audience),
            status = COALESCE($11, status),
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(patch.title.as_deref().map(str::trim))
    .bind(patch.ad_slot.as_deref().map(str::trim))
    .bind(patch.description.as_deref().map(str::trim))
    .bind(patch.location.as_deref().map(str::trim))
    .bind(patch.category.as_deref().map(str::trim))
    .bind(patch.device.map(|d| d.as_str()))
    .bind(patch.budget)
    .bind(patch.bid_type.map(|b| b.as_str()))
    .bind(patch.target_audience.as_ref().map(Json))
    .bind(patch.status.map(|s| s.as_str()))
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM ads WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
