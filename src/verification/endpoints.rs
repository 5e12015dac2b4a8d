use actix_web::web::{Data, Json, Path, Query};
use actix_web::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::{self, CampaignId};
use crate::config::AppConfig;
use crate::database::Database;
use crate::error::Error;
use crate::mission::{MissionId, VerificationType};
use crate::mission_log::{MissionLogId, MissionLogStatus, Proof};
use crate::session::PartnerSession;
use crate::user::UserId;

use super::manager::{self, Approval, ReviewedLog, VerificationEntry};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationQuery {
    pub status: Option<MissionLogStatus>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewedLogBody {
    pub id: MissionLogId,
    pub mission_id: MissionId,
    pub mission_title: String,
    pub verification_type: Option<VerificationType>,
    pub status: MissionLogStatus,
    pub proof: Option<Proof>,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl ReviewedLogBody {
    pub fn render(reviewed: ReviewedLog) -> ReviewedLogBody {
        let log = reviewed.log;
        ReviewedLogBody {
            id: log.id,
            mission_id: log.mission_template_id,
            mission_title: reviewed.mission_title,
            verification_type: reviewed.verification_type,
            status: log.status,
            proof: log.proof,
            started_at: log.started_at,
            submitted_at: log.submitted_at,
            completed_at: log.completed_at,
            rejection_reason: log.rejection_reason,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationBody {
    pub user_id: UserId,
    pub nickname: Option<String>,
    pub status: MissionLogStatus,
    pub latest_submission: Option<DateTime<Utc>>,
    pub logs: Vec<ReviewedLogBody>,
}

impl VerificationBody {
    pub fn render(entry: VerificationEntry) -> VerificationBody {
        VerificationBody {
            user_id: entry.user_id,
            nickname: entry.nickname,
            status: entry.status,
            latest_submission: entry.latest_submission,
            logs: entry.logs.into_iter().map(ReviewedLogBody::render).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalBody {
    pub user_id: UserId,
    pub approved_logs: usize,
    pub points_awarded: i64,
    pub points_credited: bool,
}

impl ApprovalBody {
    pub fn render(approval: Approval) -> ApprovalBody {
        ApprovalBody {
            user_id: approval.user_id,
            approved_logs: approval.approved_logs,
            points_awarded: approval.points_awarded,
            points_credited: approval.points_credited,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RejectBody {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RejectionBody {
    pub user_id: UserId,
    pub rejected_logs: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AutoReviewBody {
    pub approved: Vec<UserId>,
    pub skipped: usize,
}

#[get("/campaigns/{campaign_id}/verifications")]
#[tracing::instrument(skip(db))]
pub async fn get_verifications_in_campaign(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<CampaignId>,
    query: Query<VerificationQuery>,
) -> Result<Json<Vec<VerificationBody>>, Error> {
    let campaign_id = params.into_inner();
    let campaign =
        campaign::manager::get_campaign_by_id(&***db, &session.partner, campaign_id).await?;

    let entries = manager::get_verifications(&***db, &campaign, query.status).await?;

    let body = entries.into_iter().map(VerificationBody::render).collect();

    Ok(Json(body))
}

#[post("/campaigns/{campaign_id}/verifications/auto")]
#[tracing::instrument(skip(db, config))]
pub async fn auto_review_in_campaign(
    db: Data<Box<dyn Database>>,
    config: Data<AppConfig>,
    session: PartnerSession,
    params: Path<CampaignId>,
) -> Result<Json<AutoReviewBody>, Error> {
    let campaign_id = params.into_inner();
    let campaign =
        campaign::manager::get_campaign_by_id(&***db, &session.partner, campaign_id).await?;

    let review =
        manager::auto_review(&***db, &campaign, config.review.ai_confidence_threshold).await?;

    let body = AutoReviewBody {
        approved: review.approved.iter().map(|a| a.user_id).collect(),
        skipped: review.skipped,
    };

    Ok(Json(body))
}

#[post("/campaigns/{campaign_id}/verifications/{user_id}/approve")]
#[tracing::instrument(skip(db))]
pub async fn approve_participant(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<(CampaignId, UserId)>,
) -> Result<Json<ApprovalBody>, Error> {
    let (campaign_id, user_id) = params.into_inner();
    let campaign =
        campaign::manager::get_campaign_by_id(&***db, &session.partner, campaign_id).await?;

    let approval = manager::approve(&***db, &campaign, user_id).await?;

    Ok(Json(ApprovalBody::render(approval)))
}

#[post("/campaigns/{campaign_id}/verifications/{user_id}/reject")]
#[tracing::instrument(skip(db))]
pub async fn reject_participant(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<(CampaignId, UserId)>,
    body: Json<RejectBody>,
) -> Result<Json<RejectionBody>, Error> {
    let (campaign_id, user_id) = params.into_inner();
    let body = body.into_inner();
    let campaign =
        campaign::manager::get_campaign_by_id(&***db, &session.partner, campaign_id).await?;

    let rejected_logs = manager::reject(&***db, &campaign, user_id, body.reason).await?;

    Ok(Json(RejectionBody {
        user_id,
        rejected_logs,
    }))
}
