use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::CampaignId;
use crate::typedid::{TypedId, TypedIdMarker};
use crate::user::UserId;

pub mod db;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

pub type RewardId = TypedId<RewardTracking>;

/// Whether the reward a participant earned was handed out outside the platform.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RewardTracking {
    #[serde(rename = "_id")]
    pub id: RewardId,
    pub campaign_id: CampaignId,
    pub user_id: UserId,
    pub is_rewarded: bool,
    pub note: String,
    #[serde(default, with = "crate::utils::optional_bson_datetime")]
    pub rewarded_at: Option<DateTime<Utc>>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

impl TypedIdMarker for RewardTracking {
    fn tag() -> &'static str {
        "RWD"
    }
}
