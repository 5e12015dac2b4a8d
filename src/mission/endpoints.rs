use actix_web::web::{Data, Json, Path};
use actix_web::{delete, get, post, put};
use serde::{Deserialize, Serialize};

use crate::campaign::{self, CampaignId};
use crate::database::Database;
use crate::error::Error;
use crate::session::PartnerSession;
use crate::utils::SuccessBody;

use super::{manager, MissionDraft, MissionId, MissionLocation, MissionTemplate, Quiz, VerificationType};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MissionBody {
    pub id: MissionId,
    pub campaign_id: CampaignId,
    pub title: String,
    pub description: String,
    pub verification_type: VerificationType,
    pub reward_points: i64,
    pub order: i32,
    pub quiz: Option<Quiz>,
    pub location: Option<MissionLocation>,
}

impl MissionBody {
    pub fn render(mission: MissionTemplate) -> MissionBody {
        MissionBody {
            id: mission.id,
            campaign_id: mission.campaign_id,
            title: mission.title,
            description: mission.description,
            verification_type: mission.verification_type,
            reward_points: mission.reward_points,
            order: mission.order,
            quiz: mission.quiz,
            location: mission.location,
        }
    }
}

#[get("/campaigns/{campaign_id}/missions")]
#[tracing::instrument(skip(db))]
pub async fn get_missions_in_campaign(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<CampaignId>,
) -> Result<Json<Vec<MissionBody>>, Error> {
    let campaign_id = params.into_inner();
    let campaign =
        campaign::manager::get_campaign_by_id(&***db, &session.partner, campaign_id).await?;

    let missions = manager::get_missions(&***db, &campaign).await?;

    let body = missions.into_iter().map(MissionBody::render).collect();

    Ok(Json(body))
}

#[post("/campaigns/{campaign_id}/missions")]
#[tracing::instrument(skip(db))]
pub async fn add_mission_to_campaign(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<CampaignId>,
    body: Json<MissionDraft>,
) -> Result<Json<MissionBody>, Error> {
    let campaign_id = params.into_inner();
    let campaign =
        campaign::manager::get_campaign_by_id(&***db, &session.partner, campaign_id).await?;

    let mission = manager::add_mission(&***db, &campaign, body.into_inner()).await?;

    Ok(Json(MissionBody::render(mission)))
}

#[put("/campaigns/{campaign_id}/missions/{mission_id}")]
#[tracing::instrument(skip(db))]
pub async fn update_mission_in_campaign(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<(CampaignId, MissionId)>,
    body: Json<MissionDraft>,
) -> Result<Json<MissionBody>, Error> {
    let (campaign_id, mission_id) = params.into_inner();
    let campaign =
        campaign::manager::get_campaign_by_id(&***db, &session.partner, campaign_id).await?;

    let mission =
        manager::update_mission(&***db, &campaign, mission_id, body.into_inner()).await?;

    Ok(Json(MissionBody::render(mission)))
}

#[delete("/campaigns/{campaign_id}/missions/{mission_id}")]
#[tracing::instrument(skip(db))]
pub async fn delete_mission_in_campaign(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<(CampaignId, MissionId)>,
) -> Result<Json<SuccessBody>, Error> {
    let (campaign_id, mission_id) = params.into_inner();
    let campaign =
        campaign::manager::get_campaign_by_id(&***db, &session.partner, campaign_id).await?;

    manager::delete_mission(&***db, &campaign, mission_id).await?;

    Ok(Json(SuccessBody {}))
}
