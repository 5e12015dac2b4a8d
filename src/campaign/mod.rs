use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::partner::PartnerId;
use crate::typedid::{TypedId, TypedIdMarker};

pub mod db;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

pub type CampaignId = TypedId<Campaign>;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Campaign {
    #[serde(rename = "_id")]
    pub id: CampaignId,
    pub partner_id: PartnerId,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub region: String,
    pub category: CampaignCategory,
    pub campaign_type: CampaignType,
    pub status: CampaignStatus,
    pub image_url: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

impl Campaign {
    /// Brings `status` in line with the campaign dates as of `today`.
    pub fn refresh_status(&mut self, today: NaiveDate) {
        self.status = CampaignStatus::on(self.start_date, self.end_date, today);
    }
}

impl TypedIdMarker for Campaign {
    fn tag() -> &'static str {
        "CPN"
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Expect,
    Active,
    Expired,
}

impl CampaignStatus {
    pub const ALL: [CampaignStatus; 3] = [
        CampaignStatus::Expect,
        CampaignStatus::Active,
        CampaignStatus::Expired,
    ];

    /// Both ends of the campaign are inclusive.
    pub fn on(start_date: NaiveDate, end_date: NaiveDate, today: NaiveDate) -> CampaignStatus {
        if today < start_date {
            CampaignStatus::Expect
        } else if today > end_date {
            CampaignStatus::Expired
        } else {
            CampaignStatus::Active
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CampaignStatus::Expect => "EXPECT",
            CampaignStatus::Active => "ACTIVE",
            CampaignStatus::Expired => "EXPIRED",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignType {
    Online,
    Offline,
}

impl CampaignType {
    pub fn label(self) -> &'static str {
        match self {
            CampaignType::Online => "ONLINE",
            CampaignType::Offline => "OFFLINE",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignCategory {
    Transportation,
    Energy,
    Recycling,
    ZeroWaste,
    Food,
    Water,
    Nature,
    Etc,
}

impl CampaignCategory {
    pub const ALL: [CampaignCategory; 8] = [
        CampaignCategory::Transportation,
        CampaignCategory::Energy,
        CampaignCategory::Recycling,
        CampaignCategory::ZeroWaste,
        CampaignCategory::Food,
        CampaignCategory::Water,
        CampaignCategory::Nature,
        CampaignCategory::Etc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CampaignCategory::Transportation => "TRANSPORTATION",
            CampaignCategory::Energy => "ENERGY",
            CampaignCategory::Recycling => "RECYCLING",
            CampaignCategory::ZeroWaste => "ZERO_WASTE",
            CampaignCategory::Food => "FOOD",
            CampaignCategory::Water => "WATER",
            CampaignCategory::Nature => "NATURE",
            CampaignCategory::Etc => "ETC",
        }
    }
}

/// The partner-editable fields of a campaign.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CampaignDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub region: String,
    pub category: CampaignCategory,
    pub campaign_type: CampaignType,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A partial update of a campaign; absent fields are left unchanged. An explicit `null`
/// `image_url` clears the image.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CampaignPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub region: Option<String>,
    pub category: Option<CampaignCategory>,
    pub campaign_type: Option<CampaignType>,
    #[serde(default, deserialize_with = "crate::utils::explicit_null")]
    pub image_url: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    #[test]
    fn status_follows_dates_inclusively() {
        let (start, end) = (date(3, 1), date(3, 31));

        assert_eq!(CampaignStatus::on(start, end, date(2, 29)), CampaignStatus::Expect);
        assert_eq!(CampaignStatus::on(start, end, date(3, 1)), CampaignStatus::Active);
        assert_eq!(CampaignStatus::on(start, end, date(3, 31)), CampaignStatus::Active);
        assert_eq!(CampaignStatus::on(start, end, date(4, 1)), CampaignStatus::Expired);
    }

    #[test]
    fn patch_tells_null_image_from_absent_image() {
        let cleared: CampaignPatch = serde_json::from_str(r#"{"image_url": null}"#).unwrap();
        let untouched: CampaignPatch = serde_json::from_str(r#"{"title": "Unplug"}"#).unwrap();
        let replaced: CampaignPatch =
            serde_json::from_str(r#"{"image_url": "https://cdn.example/a.png"}"#).unwrap();

        assert_eq!(cleared.image_url, Some(None));
        assert_eq!(untouched.image_url, None);
        assert_eq!(
            replaced.image_url,
            Some(Some("https://cdn.example/a.png".to_string()))
        );
    }
}
