use crate::campaign::Campaign;
use crate::database::Database;
use crate::error::Error;

use super::{MissionDraft, MissionId, MissionTemplate};

/// Turns a validated draft into a mission of `campaign`, placing it at `default_order`
/// unless the draft names its own position.
pub fn build_mission(campaign: &Campaign, draft: MissionDraft, default_order: i32) -> MissionTemplate {
    MissionTemplate {
        id: MissionId::new(),
        campaign_id: campaign.id,
        title: draft.title.trim().to_string(),
        description: draft.description,
        verification_type: draft.verification_type,
        reward_points: draft.reward_points,
        order: draft.order.unwrap_or(default_order),
        quiz: draft.quiz,
        location: draft.location,
    }
}

#[tracing::instrument(skip(db))]
pub async fn get_missions(
    db: &dyn Database,
    campaign: &Campaign,
) -> Result<Vec<MissionTemplate>, Error> {
    let missions = db.missions().fetch_missions_by_campaign(campaign.id).await?;

    Ok(missions)
}

#[tracing::instrument(skip(db))]
pub async fn get_mission_by_id(
    db: &dyn Database,
    campaign: &Campaign,
    mission_id: MissionId,
) -> Result<MissionTemplate, Error> {
    let mission = db
        .missions()
        .fetch_mission_by_campaign_and_id(campaign.id, mission_id)
        .await?
        .ok_or(Error::MissionNotFound {
            campaign_id: campaign.id,
            mission_id,
        })?;

    Ok(mission)
}

#[tracing::instrument(skip(db))]
pub async fn add_mission(
    db: &dyn Database,
    campaign: &Campaign,
    draft: MissionDraft,
) -> Result<MissionTemplate, Error> {
    draft.validate()?;

    let missions = db.missions().fetch_missions_by_campaign(campaign.id).await?;
    let next_order = missions.iter().map(|m| m.order).max().unwrap_or(0) + 1;

    let mission = build_mission(campaign, draft, next_order);
    db.missions().insert_mission(&mission).await?;

    Ok(mission)
}

#[tracing::instrument(skip(db))]
pub async fn update_mission(
    db: &dyn Database,
    campaign: &Campaign,
    mission_id: MissionId,
    draft: MissionDraft,
) -> Result<MissionTemplate, Error> {
    draft.validate()?;

    let existing = get_mission_by_id(db, campaign, mission_id).await?;

    let mut mission = build_mission(campaign, draft, existing.order);
    mission.id = existing.id;

    db.missions().replace_mission(&mission).await?;

    Ok(mission)
}

#[tracing::instrument(skip(db))]
pub async fn delete_mission(
    db: &dyn Database,
    campaign: &Campaign,
    mission_id: MissionId,
) -> Result<(), Error> {
    let mission = get_mission_by_id(db, campaign, mission_id).await?;

    let log_count = db
        .mission_logs()
        .count_mission_logs_by_mission(mission.id)
        .await?;
    if log_count > 0 {
        return Err(Error::MissionHasLogs {
            mission_id: mission.id,
        });
    }

    db.missions().delete_mission(mission.id).await?;

    Ok(())
}
