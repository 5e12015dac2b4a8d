use actix_web::web::{Data, Json, Path};
use actix_web::{get, put};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::{self, CampaignId};
use crate::database::Database;
use crate::error::Error;
use crate::session::PartnerSession;
use crate::user::UserId;

use super::manager::{self, RewardEntry, RewardSummary};
use super::RewardTracking;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewardEntryBody {
    pub user_id: UserId,
    pub nickname: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub points_earned: i64,
    pub is_rewarded: bool,
    pub note: String,
    pub rewarded_at: Option<DateTime<Utc>>,
}

impl RewardEntryBody {
    pub fn render(entry: RewardEntry) -> RewardEntryBody {
        RewardEntryBody {
            user_id: entry.user_id,
            nickname: entry.nickname,
            completed_at: entry.completed_at,
            points_earned: entry.points_earned,
            is_rewarded: entry.is_rewarded,
            note: entry.note,
            rewarded_at: entry.rewarded_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewardSummaryBody {
    pub eligible: usize,
    pub rewarded: usize,
    pub pending: usize,
}

impl RewardSummaryBody {
    pub fn render(summary: RewardSummary) -> RewardSummaryBody {
        RewardSummaryBody {
            eligible: summary.eligible,
            rewarded: summary.rewarded,
            pending: summary.pending,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewardsBody {
    pub summary: RewardSummaryBody,
    pub rewards: Vec<RewardEntryBody>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetRewardBody {
    pub is_rewarded: bool,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewardBody {
    pub campaign_id: CampaignId,
    pub user_id: UserId,
    pub is_rewarded: bool,
    pub note: String,
    pub rewarded_at: Option<DateTime<Utc>>,
    pub modified_at: DateTime<Utc>,
}

impl RewardBody {
    pub fn render(reward: RewardTracking) -> RewardBody {
        RewardBody {
            campaign_id: reward.campaign_id,
            user_id: reward.user_id,
            is_rewarded: reward.is_rewarded,
            note: reward.note,
            rewarded_at: reward.rewarded_at,
            modified_at: reward.modified_at,
        }
    }
}

#[get("/campaigns/{campaign_id}/rewards")]
#[tracing::instrument(skip(db))]
pub async fn get_rewards_in_campaign(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<CampaignId>,
) -> Result<Json<RewardsBody>, Error> {
    let campaign_id = params.into_inner();
    let campaign =
        campaign::manager::get_campaign_by_id(&***db, &session.partner, campaign_id).await?;

    let (entries, summary) = manager::get_rewards(&***db, &campaign).await?;

    let body = RewardsBody {
        summary: RewardSummaryBody::render(summary),
        rewards: entries.into_iter().map(RewardEntryBody::render).collect(),
    };

    Ok(Json(body))
}

#[put("/campaigns/{campaign_id}/rewards/{user_id}")]
#[tracing::instrument(skip(db))]
pub async fn set_reward_in_campaign(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<(CampaignId, UserId)>,
    body: Json<SetRewardBody>,
) -> Result<Json<RewardBody>, Error> {
    let (campaign_id, user_id) = params.into_inner();
    let body = body.into_inner();
    let campaign =
        campaign::manager::get_campaign_by_id(&***db, &session.partner, campaign_id).await?;

    let reward =
        manager::set_reward(&***db, &campaign, user_id, body.is_rewarded, body.note).await?;

    Ok(Json(RewardBody::render(reward)))
}
