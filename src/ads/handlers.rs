use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    state::AppState,
    uploads::validate_image,
};

use super::dto::{
    AdListResponse, AdResponse, DeletedResponse, ListQuery, PageQuery, Pagination,
    UpdateAdRequest,
};
use super::repo::{self, AdFilter, AdRow};
use super::validation::{validate_new_ad, validate_patch, RawAdFields};

fn parse_ad_id(id: &str) -> Result<Uuid, ApiError> {
    id.parse().map_err(|_| ApiError::InvalidId)
}

async fn load_page(
    state: &AppState,
    filter: AdFilter<'_>,
    page: i64,
    limit: i64,
) -> Result<AdListResponse, ApiError> {
    let page = page.max(1);
    let limit = limit.max(1);
    let total = repo::count(&state.db, &filter).await?;
    let rows = repo::list(&state.db, &filter, limit, (page - 1) * limit).await?;
    Ok(AdListResponse {
        ads: rows.into_iter().map(AdResponse::from).collect(),
        pagination: Pagination::compute(total, page, limit),
    })
}

/// GET /api/ads — public listing with conjunctive filters.
#[instrument(skip(state))]
pub async fn list_ads(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<AdListResponse>, ApiError> {
    let status = q.status.map(|s| s.as_str());
    let filter = AdFilter {
        category: q.category.as_deref(),
        location: q.location.as_deref(),
        status,
        publisher: None,
    };
    Ok(Json(load_page(&state, filter, q.page, q.limit).await?))
}

/// GET /api/ads/my-ads — listing scoped to the authenticated publisher.
#[instrument(skip(state))]
pub async fn my_ads(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<AdListResponse>, ApiError> {
    let filter = AdFilter {
        publisher: Some(user_id),
        ..Default::default()
    };
    Ok(Json(load_page(&state, filter, q.page, q.limit).await?))
}

/// GET /api/ads/:id — public. A non-UUID id is a 400, a missing ad a 404.
#[instrument(skip(state))]
pub async fn get_ad(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdResponse>, ApiError> {
    let id = parse_ad_id(&id)?;
    let ad = repo::get(&state.db, id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(ad.into()))
}

struct ImagePart {
    filename: String,
    content_type: String,
    data: Bytes,
}

/// POST /api/ads — multipart form with text fields and an optional `image`
/// part. Whatever `publisher` value the client sends is dropped here; the
/// authenticated principal owns the ad.
#[instrument(skip(state, mp))]
pub async fn create_ad(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<AdResponse>), ApiError> {
    let mut raw = RawAdFields::default();
    let mut image: Option<ImagePart> = None;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("malformed multipart body".into()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let data = field.bytes().await.map_err(|_| {
                ApiError::UploadRejected("image exceeds the 5MB limit".into())
            })?;
            image = Some(ImagePart {
                filename,
                content_type,
                data,
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|_| ApiError::Validation("malformed multipart body".into()))?;
        match name.as_str() {
            "title" => raw.title = Some(text),
            "adSlot" => raw.ad_slot = Some(text),
            "description" => raw.description = Some(text),
            "location" => raw.location = Some(text),
            "category" => raw.category = Some(text),
            "device" => raw.device = Some(text),
            "budget" => raw.budget = Some(text),
            "bidType" => raw.bid_type = Some(text),
            "targetAudience" => raw.target_audience = Some(text),
            _ => {} // unknown fields, including `publisher`, are ignored
        }
    }

    let ad = validate_new_ad(raw)?;

    // Validate the image before writing anything to disk, so a rejected
    // request leaves no file behind.
    let pending = match &image {
        Some(part) => Some(validate_image(
            &part.filename,
            &part.content_type,
            part.data.len(),
        )?),
        None => None,
    };

    let image_url = match (image, pending) {
        (Some(part), Some(ext)) => Some(state.uploads.save(&ext, part.data).await?),
        _ => None,
    };

    let id = repo::insert(&state.db, user_id, &ad, image_url.as_deref()).await?;
    let row = repo::get(&state.db, id).await?.ok_or(ApiError::NotFound)?;

    info!(ad_id = %id, publisher = %user_id, "ad created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

fn require_owner(ad: &AdRow, user_id: Uuid) -> Result<(), ApiError> {
    if ad.publisher != user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

/// PUT /api/ads/:id — owner-only JSON patch.
#[instrument(skip(state, patch))]
pub async fn update_ad(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<UpdateAdRequest>,
) -> Result<Json<AdResponse>, ApiError> {
    let id = parse_ad_id(&id)?;
    let ad = repo::get(&state.db, id).await?.ok_or(ApiError::NotFound)?;
    require_owner(&ad, user_id)?;
    validate_patch(&patch)?;

    repo::update(&state.db, id, &patch).await?;
    let row = repo::get(&state.db, id).await?.ok_or(ApiError::NotFound)?;

    info!(ad_id = %id, publisher = %user_id, "ad updated");
    Ok(Json(row.into()))
}

/// DELETE /api/ads/:id — owner-only. The record deletion is authoritative;
/// releasing the uploaded image is best-effort.
#[instrument(skip(state))]
pub async fn delete_ad(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = parse_ad_id(&id)?;
    let ad = repo::get(&state.db, id).await?.ok_or(ApiError::NotFound)?;
    require_owner(&ad, user_id)?;

    repo::delete(&state.db, id).await?;

    if let Some(image_url) = &ad.image_url {
        if let Err(e) = state.uploads.remove(image_url).await {
            warn!(error = %e, ad_id = %id, image_url = %image_url, "failed to remove ad image");
        }
    }

    info!(ad_id = %id, publisher = %user_id, "ad deleted");
    Ok(Json(DeletedResponse {
        message: "Ad deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_uuid_ids_are_rejected_before_the_store() {
        assert!(matches!(parse_ad_id("not-a-uuid"), Err(ApiError::InvalidId)));
        assert!(matches!(parse_ad_id(""), Err(ApiError::InvalidId)));
        assert!(parse_ad_id("11111111-1111-1111-1111-111111111111").is_ok());
    }
}
