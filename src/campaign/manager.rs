use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::database::Database;
use crate::error::Error;
use crate::mission::manager::build_mission;
use crate::mission::{MissionDraft, MissionTemplate};
use crate::partner::Partner;
use crate::user::UserId;

use super::{Campaign, CampaignDraft, CampaignId, CampaignPatch, CampaignStatus};

/// A campaign with the counts shown in campaign lists.
#[derive(Clone, Debug)]
pub struct CampaignSummary {
    pub campaign: Campaign,
    pub mission_count: usize,
    pub participant_count: usize,
}

fn validate_campaign(draft: &CampaignDraft) -> Result<(), Error> {
    if draft.title.trim().is_empty() {
        return Err(Error::InvalidCampaign {
            reason: "title must not be empty".to_string(),
        });
    }
    if draft.end_date < draft.start_date {
        return Err(Error::InvalidCampaign {
            reason: "end_date must not be before start_date".to_string(),
        });
    }

    Ok(())
}

#[tracing::instrument(skip(db))]
pub async fn create_campaign(
    db: &dyn Database,
    partner: &Partner,
    draft: CampaignDraft,
    missions: Vec<MissionDraft>,
) -> Result<(Campaign, Vec<MissionTemplate>), Error> {
    validate_campaign(&draft)?;
    for mission in &missions {
        mission.validate()?;
    }

    let now = Utc::now();
    let campaign = Campaign {
        id: CampaignId::new(),
        partner_id: partner.id,
        title: draft.title.trim().to_string(),
        description: draft.description,
        start_date: draft.start_date,
        end_date: draft.end_date,
        region: draft.region,
        category: draft.category,
        campaign_type: draft.campaign_type,
        status: CampaignStatus::on(draft.start_date, draft.end_date, now.date_naive()),
        image_url: draft.image_url,
        created_at: now,
        modified_at: now,
    };

    let mut missions: Vec<MissionTemplate> = missions
        .into_iter()
        .zip(1..)
        .map(|(mission, position)| build_mission(&campaign, mission, position))
        .collect();
    missions.sort_by_key(|mission| mission.order);

    db.campaigns().insert_campaign(&campaign).await?;
    for mission in &missions {
        db.missions().insert_mission(mission).await?;
    }

    Ok((campaign, missions))
}

#[tracing::instrument(skip(db))]
pub async fn get_campaigns(
    db: &dyn Database,
    partner: &Partner,
    status: Option<CampaignStatus>,
) -> Result<Vec<CampaignSummary>, Error> {
    let today = Utc::now().date_naive();
    let mut campaigns = db.campaigns().fetch_campaigns_by_partner(partner.id).await?;
    for campaign in &mut campaigns {
        campaign.refresh_status(today);
    }
    campaigns.retain(|campaign| status.map_or(true, |status| campaign.status == status));

    let campaign_ids: Vec<CampaignId> = campaigns.iter().map(|c| c.id).collect();
    let missions = db
        .missions()
        .fetch_missions_by_campaigns(&campaign_ids)
        .await?;
    let logs = db
        .mission_logs()
        .fetch_mission_logs_by_campaigns(&campaign_ids)
        .await?;

    let mut mission_counts: HashMap<CampaignId, usize> = HashMap::new();
    for mission in &missions {
        *mission_counts.entry(mission.campaign_id).or_default() += 1;
    }

    let mut participants: HashMap<CampaignId, HashSet<UserId>> = HashMap::new();
    for log in &logs {
        participants
            .entry(log.campaign_id)
            .or_default()
            .insert(log.user_id);
    }

    let summaries = campaigns
        .into_iter()
        .map(|campaign| CampaignSummary {
            mission_count: mission_counts.get(&campaign.id).copied().unwrap_or(0),
            participant_count: participants.get(&campaign.id).map_or(0, HashSet::len),
            campaign,
        })
        .collect();

    Ok(summaries)
}

/// Fetches a campaign owned by `partner`; other partners' campaigns are reported as missing.
#[tracing::instrument(skip(db))]
pub async fn get_campaign_by_id(
    db: &dyn Database,
    partner: &Partner,
    campaign_id: CampaignId,
) -> Result<Campaign, Error> {
    let mut campaign = db
        .campaigns()
        .fetch_campaign_by_partner_and_id(partner.id, campaign_id)
        .await?
        .ok_or(Error::CampaignNotFound { campaign_id })?;

    campaign.refresh_status(Utc::now().date_naive());

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn get_campaign_detail(
    db: &dyn Database,
    partner: &Partner,
    campaign_id: CampaignId,
) -> Result<(CampaignSummary, Vec<MissionTemplate>), Error> {
    let campaign = get_campaign_by_id(db, partner, campaign_id).await?;

    let missions = db.missions().fetch_missions_by_campaign(campaign.id).await?;
    let logs = db
        .mission_logs()
        .fetch_mission_logs_by_campaign(campaign.id)
        .await?;
    let participants: HashSet<UserId> = logs.iter().map(|log| log.user_id).collect();

    let summary = CampaignSummary {
        campaign,
        mission_count: missions.len(),
        participant_count: participants.len(),
    };

    Ok((summary, missions))
}

#[tracing::instrument(skip(db))]
pub async fn update_campaign(
    db: &dyn Database,
    partner: &Partner,
    campaign_id: CampaignId,
    patch: CampaignPatch,
) -> Result<Campaign, Error> {
    let mut campaign = get_campaign_by_id(db, partner, campaign_id).await?;
    let old_modified_at = campaign.modified_at;

    let draft = CampaignDraft {
        title: patch.title.unwrap_or(campaign.title),
        description: patch.description.unwrap_or(campaign.description),
        start_date: patch.start_date.unwrap_or(campaign.start_date),
        end_date: patch.end_date.unwrap_or(campaign.end_date),
        region: patch.region.unwrap_or(campaign.region),
        category: patch.category.unwrap_or(campaign.category),
        campaign_type: patch.campaign_type.unwrap_or(campaign.campaign_type),
        image_url: patch.image_url.unwrap_or(campaign.image_url),
    };
    validate_campaign(&draft)?;

    let now = Utc::now();
    campaign.title = draft.title.trim().to_string();
    campaign.description = draft.description;
    campaign.start_date = draft.start_date;
    campaign.end_date = draft.end_date;
    campaign.region = draft.region;
    campaign.category = draft.category;
    campaign.campaign_type = draft.campaign_type;
    campaign.image_url = draft.image_url;
    campaign.modified_at = now;
    campaign.refresh_status(now.date_naive());

    db.campaigns()
        .update_campaign(&campaign, old_modified_at)
        .await?;

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn delete_campaign(
    db: &dyn Database,
    partner: &Partner,
    campaign_id: CampaignId,
) -> Result<(), Error> {
    let campaign = get_campaign_by_id(db, partner, campaign_id).await?;

    let logs = db
        .mission_logs()
        .fetch_mission_logs_by_campaign(campaign.id)
        .await?;
    if !logs.is_empty() {
        return Err(Error::CampaignHasParticipants {
            campaign_id: campaign.id,
        });
    }

    db.missions().delete_missions_by_campaign(campaign.id).await?;
    db.rewards().delete_rewards_by_campaign(campaign.id).await?;
    db.campaigns().delete_campaign(campaign.id).await?;

    Ok(())
}
