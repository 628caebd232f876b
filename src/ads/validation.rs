use super::dto::{BidType, Device, TargetAudience, UpdateAdRequest};
use crate::error::ApiError;

pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 1000;
pub const BUDGET_MIN: f64 = 1.0;
pub const BUDGET_MAX: f64 = 1_000_000.0;

/// Text fields as they came off the multipart form, before validation.
/// Any `publisher` field the client sends is dropped at collection time.
#[derive(Debug, Default)]
pub struct RawAdFields {
    pub title: Option<String>,
    pub ad_slot: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub device: Option<String>,
    pub budget: Option<String>,
    pub bid_type: Option<String>,
    pub target_audience: Option<String>,
}

/// A fully validated creation payload. The publisher is supplied by the
/// handler from the authenticated principal, never by the client.
#[derive(Debug, PartialEq)]
pub struct NewAd {
    pub title: String,
    pub ad_slot: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub device: Device,
    pub budget: f64,
    pub bid_type: BidType,
    pub target_audience: TargetAudience,
}

fn required(name: &'static str, value: Option<String>) -> Result<String, ApiError> {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        return Err(ApiError::MissingField(name));
    }
    Ok(value)
}

pub fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.chars().count() > TITLE_MAX {
        return Err(ApiError::Validation(format!(
            "title must be at most {TITLE_MAX} characters"
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), ApiError> {
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(ApiError::Validation(format!(
            "description must be at most {DESCRIPTION_MAX} characters"
        )));
    }
    Ok(())
}

pub fn validate_budget(budget: f64) -> Result<(), ApiError> {
    if !budget.is_finite() || !(BUDGET_MIN..=BUDGET_MAX).contains(&budget) {
        return Err(ApiError::Validation(format!(
            "budget must be between {BUDGET_MIN} and {BUDGET_MAX}"
        )));
    }
    Ok(())
}

fn parse_device(s: &str) -> Result<Device, ApiError> {
    match s {
        "desktop" => Ok(Device::Desktop),
        "mobile" => Ok(Device::Mobile),
        "tablet" => Ok(Device::Tablet),
        "all" => Ok(Device::All),
        _ => Err(ApiError::Validation(
            "device must be one of desktop, mobile, tablet, all".into(),
        )),
    }
}

fn parse_bid_type(s: &str) -> Result<BidType, ApiError> {
    match s {
        "cpc" => Ok(BidType::Cpc),
        "cpm" => Ok(BidType::Cpm),
        "cpa" => Ok(BidType::Cpa),
        _ => Err(ApiError::Validation(
            "bidType must be one of cpc, cpm, cpa".into(),
        )),
    }
}

/// Lenient by design: targeting data that fails to parse degrades to the
/// empty default instead of aborting the whole creation.
pub fn parse_target_audience(raw: Option<&str>) -> TargetAudience {
    raw.map(|s| serde_json::from_str(s).unwrap_or_default())
        .unwrap_or_default()
}

/// The single validation layer for ad fields, shared by creation and the
/// patch path below.
pub fn validate_new_ad(raw: RawAdFields) -> Result<NewAd, ApiError> {
    let title = required("title", raw.title)?;
    let ad_slot = required("adSlot", raw.ad_slot)?;
    let description = required("description", raw.description)?;
    let location = required("location", raw.location)?;
    let category = required("category", raw.category)?;
    let budget_raw = required("budget", raw.budget)?;

    validate_title(&title)?;
    validate_description(&description)?;

    let budget: f64 = budget_raw
        .parse()
        .map_err(|_| ApiError::Validation("budget must be a number".into()))?;
    validate_budget(budget)?;

    let device = match raw.device.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => parse_device(s)?,
        _ => Device::default(),
    };
    let bid_type = match raw.bid_type.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => parse_bid_type(s)?,
        _ => BidType::default(),
    };
    let target_audience = parse_target_audience(raw.target_audience.as_deref());

    Ok(NewAd {
        title,
        ad_slot,
        description,
        location,
        category,
        device,
        budget,
        bid_type,
        target_audience,
    })
}

/// Patched fields go through the same per-field validators as creation.
pub fn validate_patch(patch: &UpdateAdRequest) -> Result<(), ApiError> {
    for (name, value) in [
        ("title", &patch.title),
        ("adSlot", &patch.ad_slot),
        ("description", &patch.description),
        ("location", &patch.location),
        ("category", &patch.category),
    ] {
        if let Some(v) = value {
            if v.trim().is_empty() {
                return Err(ApiError::MissingField(name));
            }
        }
    }
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }
    if let Some(description) = &patch.description {
        validate_description(description)?;
    }
    if let Some(budget) = patch.budget {
        validate_budget(budget)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::dto::Gender;

    fn raw_ad() -> RawAdFields {
        RawAdFields {
            title: Some("Summer sale banner".into()),
            ad_slot: Some("homepage-top".into()),
            description: Some("A banner for the summer sale".into()),
            location: Some("Berlin".into()),
            category: Some("technology".into()),
            budget: Some("50".into()),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_a_minimal_ad_with_defaults() {
        let ad = validate_new_ad(raw_ad()).unwrap();
        assert_eq!(ad.device, Device::All);
        assert_eq!(ad.bid_type, BidType::Cpc);
        assert_eq!(ad.budget, 50.0);
        assert_eq!(ad.target_audience, TargetAudience::default());
    }

    #[test]
    fn each_required_field_is_enforced_after_trim() {
        for field in ["title", "adSlot", "description", "location", "category", "budget"] {
            let mut raw = raw_ad();
            match field {
                "title" => raw.title = Some("   ".into()),
                "adSlot" => raw.ad_slot = None,
                "description" => raw.description = Some("".into()),
                "location" => raw.location = None,
                "category" => raw.category = Some(" ".into()),
                "budget" => raw.budget = None,
                _ => unreachable!(),
            }
            assert!(
                matches!(validate_new_ad(raw), Err(ApiError::MissingField(f)) if f == field),
                "{field} should be required"
            );
        }
    }

    #[test]
    fn budget_boundaries_are_inclusive() {
        for ok in ["1", "1000000", "50.5"] {
            let mut raw = raw_ad();
            raw.budget = Some(ok.into());
            assert!(validate_new_ad(raw).is_ok(), "budget {ok} should pass");
        }
        for bad in ["0", "1000001", "-5", "NaN", "abc"] {
            let mut raw = raw_ad();
            raw.budget = Some(bad.into());
            assert!(validate_new_ad(raw).is_err(), "budget {bad} should fail");
        }
    }

    #[test]
    fn title_and_description_length_bounds() {
        let mut raw = raw_ad();
        raw.title = Some("t".repeat(200));
        assert!(validate_new_ad(raw).is_ok());

        let mut raw = raw_ad();
        raw.title = Some("t".repeat(201));
        assert!(matches!(validate_new_ad(raw), Err(ApiError::Validation(_))));

        let mut raw = raw_ad();
        raw.description = Some("d".repeat(1000));
        assert!(validate_new_ad(raw).is_ok());

        let mut raw = raw_ad();
        raw.description = Some("d".repeat(1001));
        assert!(matches!(validate_new_ad(raw), Err(ApiError::Validation(_))));
    }

    #[test]
    fn unknown_device_or_bid_type_is_rejected() {
        let mut raw = raw_ad();
        raw.device = Some("smartwatch".into());
        assert!(matches!(validate_new_ad(raw), Err(ApiError::Validation(_))));

        let mut raw = raw_ad();
        raw.bid_type = Some("flatrate".into());
        assert!(matches!(validate_new_ad(raw), Err(ApiError::Validation(_))));
    }

    #[test]
    fn malformed_targeting_degrades_to_default() {
        assert_eq!(parse_target_audience(Some("{not json")), TargetAudience::default());
        assert_eq!(parse_target_audience(None), TargetAudience::default());

        let ta = parse_target_audience(Some(
            r#"{"ageRange":"18-25","gender":"female","interests":["tech","music"]}"#,
        ));
        assert_eq!(ta.age_range.as_deref(), Some("18-25"));
        assert_eq!(ta.gender, Gender::Female);
        assert_eq!(ta.interests, vec!["tech", "music"]);
    }

    #[test]
    fn patch_fields_are_revalidated() {
        let ok = UpdateAdRequest {
            title: Some("new title".into()),
            budget: Some(1.0),
            ..Default::default()
        };
        assert!(validate_patch(&ok).is_ok());

        let bad_budget = UpdateAdRequest {
            budget: Some(0.0),
            ..Default::default()
        };
        assert!(validate_patch(&bad_budget).is_err());

        let blank_title = UpdateAdRequest {
            title: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(
            validate_patch(&blank_title),
            Err(ApiError::MissingField("title"))
        ));

        let long_description = UpdateAdRequest {
            description: Some("d".repeat(1001)),
            ..Default::default()
        };
        assert!(validate_patch(&long_description).is_err());
    }
}
