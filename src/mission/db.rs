use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, Bson};
use mongodb::options::FindOptions;
use mongodb::Database;

use crate::campaign::CampaignId;
use crate::database::{MemoryMissionStore, MongoMissionStore};
use crate::error::Error;

use super::{MissionId, MissionTemplate};

const MISSIONS: &str = "missions";

pub async fn initialize(db: &Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": MISSIONS,
            "indexes": [
                { "key": { "campaign_id": 1, "order": 1 }, "name": "by_campaign_id" },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

#[async_trait]
pub trait MissionStore: Send + Sync {
    async fn insert_mission(&self, mission: &MissionTemplate) -> Result<(), Error>;

    /// Sorted by `order`.
    async fn fetch_missions_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<MissionTemplate>, Error>;

    async fn fetch_missions_by_campaigns(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<Vec<MissionTemplate>, Error>;

    async fn fetch_mission_by_campaign_and_id(
        &self,
        campaign_id: CampaignId,
        mission_id: MissionId,
    ) -> Result<Option<MissionTemplate>, Error>;

    async fn replace_mission(&self, mission: &MissionTemplate) -> Result<(), Error>;

    async fn delete_mission(&self, mission_id: MissionId) -> Result<(), Error>;

    async fn delete_missions_by_campaign(&self, campaign_id: CampaignId) -> Result<(), Error>;
}

#[async_trait]
impl MissionStore for MongoMissionStore {
    #[tracing::instrument(skip(self))]
    async fn insert_mission(&self, mission: &MissionTemplate) -> Result<(), Error> {
        self.insert_one(mission, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_missions_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<MissionTemplate>, Error> {
        let options = FindOptions::builder().sort(bson::doc! { "order": 1 }).build();

        let missions: Vec<MissionTemplate> = self
            .find(bson::doc! { "campaign_id": campaign_id }, options)
            .await?
            .try_collect()
            .await?;

        Ok(missions)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_missions_by_campaigns(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<Vec<MissionTemplate>, Error> {
        let ids: Vec<Bson> = campaign_ids.iter().map(|id| Bson::from(*id)).collect();
        let options = FindOptions::builder().sort(bson::doc! { "order": 1 }).build();

        let missions: Vec<MissionTemplate> = self
            .find(bson::doc! { "campaign_id": { "$in": ids } }, options)
            .await?
            .try_collect()
            .await?;

        Ok(missions)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_mission_by_campaign_and_id(
        &self,
        campaign_id: CampaignId,
        mission_id: MissionId,
    ) -> Result<Option<MissionTemplate>, Error> {
        let mission = self
            .find_one(
                bson::doc! { "_id": mission_id, "campaign_id": campaign_id },
                None,
            )
            .await?;

        Ok(mission)
    }

    #[tracing::instrument(skip(self))]
    async fn replace_mission(&self, mission: &MissionTemplate) -> Result<(), Error> {
        self.replace_one(bson::doc! { "_id": mission.id }, mission, None)
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_mission(&self, mission_id: MissionId) -> Result<(), Error> {
        self.delete_one(bson::doc! { "_id": mission_id }, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_missions_by_campaign(&self, campaign_id: CampaignId) -> Result<(), Error> {
        self.delete_many(bson::doc! { "campaign_id": campaign_id }, None)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl MissionStore for MemoryMissionStore {
    async fn insert_mission(&self, mission: &MissionTemplate) -> Result<(), Error> {
        self.insert(mission.clone());

        Ok(())
    }

    async fn fetch_missions_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<MissionTemplate>, Error> {
        let mut missions = self.find(|mission| mission.campaign_id == campaign_id);
        missions.sort_by_key(|mission| mission.order);

        Ok(missions)
    }

    async fn fetch_missions_by_campaigns(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<Vec<MissionTemplate>, Error> {
        let mut missions = self.find(|mission| campaign_ids.contains(&mission.campaign_id));
        missions.sort_by_key(|mission| mission.order);

        Ok(missions)
    }

    async fn fetch_mission_by_campaign_and_id(
        &self,
        campaign_id: CampaignId,
        mission_id: MissionId,
    ) -> Result<Option<MissionTemplate>, Error> {
        Ok(self.find_one(|mission| mission.id == mission_id && mission.campaign_id == campaign_id))
    }

    async fn replace_mission(&self, mission: &MissionTemplate) -> Result<(), Error> {
        self.replace(|existing| existing.id == mission.id, mission.clone(), false);

        Ok(())
    }

    async fn delete_mission(&self, mission_id: MissionId) -> Result<(), Error> {
        self.delete(|mission| mission.id == mission_id);

        Ok(())
    }

    async fn delete_missions_by_campaign(&self, campaign_id: CampaignId) -> Result<(), Error> {
        self.delete(|mission| mission.campaign_id == campaign_id);

        Ok(())
    }
}
