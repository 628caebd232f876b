use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::AdRow;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Desktop,
    Mobile,
    Tablet,
    #[default]
    All,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Desktop => "desktop",
            Device::Mobile => "mobile",
            Device::Tablet => "tablet",
            Device::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BidType {
    #[default]
    Cpc,
    Cpm,
    Cpa,
}

impl BidType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidType::Cpc => "cpc",
            BidType::Cpm => "cpm",
            BidType::Cpa => "cpa",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    #[default]
    Active,
    Paused,
    Completed,
}

impl AdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Active => "active",
            AdStatus::Paused => "paused",
            AdStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    All,
}

/// Targeting metadata carried on every ad. Parsed leniently on creation:
/// malformed input degrades to the default rather than failing the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetAudience {
    pub age_range: Option<String>,
    pub gender: Gender,
    pub interests: Vec<String>,
}

/// Query string for the public ad listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub category: Option<String>,
    pub location: Option<String>,
    pub status: Option<AdStatus>,
}

/// Query string for the owner-scoped listing.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_ads: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn compute(total_ads: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total_ads + limit - 1) / limit
        } else {
            0
        };
        Self {
            current_page: page,
            total_pages,
            total_ads,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Publisher resolved for display: id, username and email only.
#[derive(Debug, Serialize)]
pub struct PublisherInfo {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdResponse {
    pub id: Uuid,
    pub publisher: PublisherInfo,
    pub title: String,
    pub ad_slot: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub device: String,
    pub budget: f64,
    pub bid_type: String,
    pub image_url: Option<String>,
    pub target_audience: TargetAudience,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<AdRow> for AdResponse {
    fn from(row: AdRow) -> Self {
        Self {
            id: row.id,
            publisher: PublisherInfo {
                id: row.publisher,
                username: row.publisher_username,
                email: row.publisher_email,
            },
            title: row.title,
            ad_slot: row.ad_slot,
            description: row.description,
            location: row.location,
            category: row.category,
            device: row.device,
            budget: row.budget,
            bid_type: row.bid_type,
            image_url: row.image_url,
            target_audience: row.target_audience.0,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdListResponse {
    pub ads: Vec<AdResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
}

/// JSON patch body for PUT /api/ads/:id. Absent fields stay untouched.
/// A `publisher` key, if sent, is ignored: ownership is never reassigned.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAdRequest {
    pub title: Option<String>,
    pub ad_slot: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub device: Option<Device>,
    pub budget: Option<f64>,
    pub bid_type: Option<BidType>,
    pub target_audience: Option<TargetAudience>,
    pub status: Option<AdStatus>,
}
