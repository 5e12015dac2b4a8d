use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, post, put};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Error;
use crate::mission::{MissionBody, MissionDraft};
use crate::session::PartnerSession;
use crate::utils::SuccessBody;

use super::manager::{self, CampaignSummary};
use super::{
    CampaignCategory, CampaignDraft, CampaignId, CampaignPatch, CampaignStatus, CampaignType,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateCampaignBody {
    #[serde(flatten)]
    pub campaign: CampaignDraft,
    #[serde(default)]
    pub missions: Vec<MissionDraft>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CampaignQuery {
    pub status: Option<CampaignStatus>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignBody {
    pub id: CampaignId,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub region: String,
    pub category: CampaignCategory,
    pub campaign_type: CampaignType,
    pub status: CampaignStatus,
    pub image_url: Option<String>,
    pub mission_count: usize,
    pub participant_count: usize,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl CampaignBody {
    pub fn render(summary: CampaignSummary) -> CampaignBody {
        let campaign = summary.campaign;
        CampaignBody {
            id: campaign.id,
            title: campaign.title,
            description: campaign.description,
            start_date: campaign.start_date,
            end_date: campaign.end_date,
            region: campaign.region,
            category: campaign.category,
            campaign_type: campaign.campaign_type,
            status: campaign.status,
            image_url: campaign.image_url,
            mission_count: summary.mission_count,
            participant_count: summary.participant_count,
            created_at: campaign.created_at,
            modified_at: campaign.modified_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignDetailBody {
    #[serde(flatten)]
    pub campaign: CampaignBody,
    pub missions: Vec<MissionBody>,
}

#[post("/campaigns")]
#[tracing::instrument(skip(db))]
pub async fn create_campaign(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    body: Json<CreateCampaignBody>,
) -> Result<Json<CampaignDetailBody>, Error> {
    let body = body.into_inner();

    let (campaign, missions) =
        manager::create_campaign(&***db, &session.partner, body.campaign, body.missions).await?;

    let body = CampaignDetailBody {
        campaign: CampaignBody::render(CampaignSummary {
            campaign,
            mission_count: missions.len(),
            participant_count: 0,
        }),
        missions: missions.into_iter().map(MissionBody::render).collect(),
    };

    Ok(Json(body))
}

#[get("/campaigns")]
#[tracing::instrument(skip(db))]
pub async fn get_campaigns(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    query: Query<CampaignQuery>,
) -> Result<Json<Vec<CampaignBody>>, Error> {
    let campaigns = manager::get_campaigns(&***db, &session.partner, query.status).await?;

    let body = campaigns.into_iter().map(CampaignBody::render).collect();

    Ok(Json(body))
}

#[get("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db))]
pub async fn get_campaign_by_id(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<CampaignId>,
) -> Result<Json<CampaignDetailBody>, Error> {
    let campaign_id = params.into_inner();

    let (summary, missions) =
        manager::get_campaign_detail(&***db, &session.partner, campaign_id).await?;

    let body = CampaignDetailBody {
        campaign: CampaignBody::render(summary),
        missions: missions.into_iter().map(MissionBody::render).collect(),
    };

    Ok(Json(body))
}

#[put("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db))]
pub async fn update_campaign(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<CampaignId>,
    body: Json<CampaignPatch>,
) -> Result<Json<CampaignDetailBody>, Error> {
    let campaign_id = params.into_inner();

    manager::update_campaign(&***db, &session.partner, campaign_id, body.into_inner()).await?;
    let (summary, missions) =
        manager::get_campaign_detail(&***db, &session.partner, campaign_id).await?;

    let body = CampaignDetailBody {
        campaign: CampaignBody::render(summary),
        missions: missions.into_iter().map(MissionBody::render).collect(),
    };

    Ok(Json(body))
}

#[delete("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db))]
pub async fn delete_campaign(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<CampaignId>,
) -> Result<Json<SuccessBody>, Error> {
    let campaign_id = params.into_inner();

    manager::delete_campaign(&***db, &session.partner, campaign_id).await?;

    Ok(Json(SuccessBody {}))
}
