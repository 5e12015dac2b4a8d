use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{self, Bson};
use mongodb::options::FindOptions;
use mongodb::Database;

use crate::campaign::CampaignId;
use crate::database::{MemoryMissionLogStore, MongoMissionLogStore};
use crate::error::Error;
use crate::mission::MissionId;
use crate::user::UserId;

use super::{MissionLog, MissionLogStatus};

const MISSION_LOGS: &str = "mission_logs";

pub async fn initialize(db: &Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": MISSION_LOGS,
            "indexes": [
                { "key": { "campaign_id": 1, "user_id": 1 }, "name": "by_campaign_id" },
                { "key": { "mission_template_id": 1 }, "name": "by_mission_template_id" },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

#[async_trait]
pub trait MissionLogStore: Send + Sync {
    async fn insert_mission_log(&self, log: &MissionLog) -> Result<(), Error>;

    async fn fetch_mission_logs_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<MissionLog>, Error>;

    async fn fetch_mission_logs_by_campaigns(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<Vec<MissionLog>, Error>;

    async fn fetch_mission_logs_by_campaign_and_user(
        &self,
        campaign_id: CampaignId,
        user_id: UserId,
    ) -> Result<Vec<MissionLog>, Error>;

    async fn count_mission_logs_by_mission(&self, mission_id: MissionId) -> Result<u64, Error>;

    /// Moves a log out of `PENDING_VERIFICATION`. Fails with
    /// `ConcurrentModificationDetected` if the log is no longer pending.
    async fn update_mission_log_review(
        &self,
        log: MissionLog,
        status: MissionLogStatus,
        rejection_reason: Option<String>,
    ) -> Result<MissionLog, Error>;
}

#[async_trait]
impl MissionLogStore for MongoMissionLogStore {
    #[tracing::instrument(skip(self))]
    async fn insert_mission_log(&self, log: &MissionLog) -> Result<(), Error> {
        self.insert_one(log, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_mission_logs_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<MissionLog>, Error> {
        let logs: Vec<MissionLog> = self
            .find(bson::doc! { "campaign_id": campaign_id }, None)
            .await?
            .try_collect()
            .await?;

        Ok(logs)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_mission_logs_by_campaigns(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<Vec<MissionLog>, Error> {
        let ids: Vec<Bson> = campaign_ids.iter().map(|id| Bson::from(*id)).collect();

        let logs: Vec<MissionLog> = self
            .find(bson::doc! { "campaign_id": { "$in": ids } }, None)
            .await?
            .try_collect()
            .await?;

        Ok(logs)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_mission_logs_by_campaign_and_user(
        &self,
        campaign_id: CampaignId,
        user_id: UserId,
    ) -> Result<Vec<MissionLog>, Error> {
        let options = FindOptions::builder()
            .sort(bson::doc! { "started_at": 1 })
            .build();

        let logs: Vec<MissionLog> = self
            .find(
                bson::doc! { "campaign_id": campaign_id, "user_id": user_id },
                options,
            )
            .await?
            .try_collect()
            .await?;

        Ok(logs)
    }

    #[tracing::instrument(skip(self))]
    async fn count_mission_logs_by_mission(&self, mission_id: MissionId) -> Result<u64, Error> {
        let count = self
            .count_documents(bson::doc! { "mission_template_id": mission_id }, None)
            .await?;

        Ok(count)
    }

    #[tracing::instrument(skip(self))]
    async fn update_mission_log_review(
        &self,
        mut log: MissionLog,
        status: MissionLogStatus,
        rejection_reason: Option<String>,
    ) -> Result<MissionLog, Error> {
        let now = Utc::now();
        let pending = bson::to_bson(&MissionLogStatus::PendingVerification)?;
        let completed_at = match status {
            MissionLogStatus::Completed => Some(now),
            _ => log.completed_at,
        };

        let result = self
            .update_one(
                bson::doc! { "_id": log.id, "status": pending },
                bson::doc! { "$set": {
                    "status": bson::to_bson(&status)?,
                    "completed_at": completed_at.map(bson::DateTime::from_chrono),
                    "rejection_reason": bson::to_bson(&rejection_reason)?,
                    "modified_at": bson::DateTime::from_chrono(now),
                } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::ConcurrentModificationDetected);
        }

        log.status = status;
        log.completed_at = completed_at;
        log.rejection_reason = rejection_reason;
        log.modified_at = now;

        Ok(log)
    }
}

#[async_trait]
impl MissionLogStore for MemoryMissionLogStore {
    async fn insert_mission_log(&self, log: &MissionLog) -> Result<(), Error> {
        self.insert(log.clone());

        Ok(())
    }

    async fn fetch_mission_logs_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<MissionLog>, Error> {
        Ok(self.find(|log| log.campaign_id == campaign_id))
    }

    async fn fetch_mission_logs_by_campaigns(
        &self,
        campaign_ids: &[CampaignId],
    ) -> Result<Vec<MissionLog>, Error> {
        Ok(self.find(|log| campaign_ids.contains(&log.campaign_id)))
    }

    async fn fetch_mission_logs_by_campaign_and_user(
        &self,
        campaign_id: CampaignId,
        user_id: UserId,
    ) -> Result<Vec<MissionLog>, Error> {
        let mut logs = self.find(|log| log.campaign_id == campaign_id && log.user_id == user_id);
        logs.sort_by_key(|log| log.started_at);

        Ok(logs)
    }

    async fn count_mission_logs_by_mission(&self, mission_id: MissionId) -> Result<u64, Error> {
        Ok(self.find(|log| log.mission_template_id == mission_id).len() as u64)
    }

    async fn update_mission_log_review(
        &self,
        mut log: MissionLog,
        status: MissionLogStatus,
        rejection_reason: Option<String>,
    ) -> Result<MissionLog, Error> {
        log.modified_at = Utc::now();
        log.status = status;
        log.rejection_reason = rejection_reason;
        if status == MissionLogStatus::Completed {
            log.completed_at = Some(log.modified_at);
        }

        let matched = self.replace(
            |existing| existing.id == log.id && existing.is_pending(),
            log.clone(),
            false,
        );

        if matched == 0 {
            return Err(Error::ConcurrentModificationDetected);
        }

        Ok(log)
    }
}
