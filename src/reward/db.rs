use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::options::ReplaceOptions;
use mongodb::{bson, Database};

use crate::campaign::CampaignId;
use crate::database::{MemoryRewardStore, MongoRewardStore};
use crate::error::Error;
use crate::user::UserId;

use super::RewardTracking;

const REWARDS: &str = "rewards";

pub async fn initialize(db: &Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": REWARDS,
            "indexes": [
                { "key": { "campaign_id": 1, "user_id": 1 }, "name": "by_campaign_and_user", "unique": true },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

#[async_trait]
pub trait RewardStore: Send + Sync {
    async fn fetch_rewards_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<RewardTracking>, Error>;

    async fn fetch_reward_by_campaign_and_user(
        &self,
        campaign_id: CampaignId,
        user_id: UserId,
    ) -> Result<Option<RewardTracking>, Error>;

    /// Inserts or replaces the record for the reward's (campaign, user) pair.
    async fn upsert_reward(&self, reward: &RewardTracking) -> Result<(), Error>;

    async fn delete_rewards_by_campaign(&self, campaign_id: CampaignId) -> Result<(), Error>;
}

#[async_trait]
impl RewardStore for MongoRewardStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_rewards_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<RewardTracking>, Error> {
        let rewards: Vec<RewardTracking> = self
            .find(bson::doc! { "campaign_id": campaign_id }, None)
            .await?
            .try_collect()
            .await?;

        Ok(rewards)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_reward_by_campaign_and_user(
        &self,
        campaign_id: CampaignId,
        user_id: UserId,
    ) -> Result<Option<RewardTracking>, Error> {
        let reward = self
            .find_one(
                bson::doc! { "campaign_id": campaign_id, "user_id": user_id },
                None,
            )
            .await?;

        Ok(reward)
    }

    #[tracing::instrument(skip(self))]
    async fn upsert_reward(&self, reward: &RewardTracking) -> Result<(), Error> {
        let options = ReplaceOptions::builder().upsert(true).build();

        self.replace_one(
            bson::doc! { "campaign_id": reward.campaign_id, "user_id": reward.user_id },
            reward,
            options,
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_rewards_by_campaign(&self, campaign_id: CampaignId) -> Result<(), Error> {
        self.delete_many(bson::doc! { "campaign_id": campaign_id }, None)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl RewardStore for MemoryRewardStore {
    async fn fetch_rewards_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<RewardTracking>, Error> {
        Ok(self.find(|reward| reward.campaign_id == campaign_id))
    }

    async fn fetch_reward_by_campaign_and_user(
        &self,
        campaign_id: CampaignId,
        user_id: UserId,
    ) -> Result<Option<RewardTracking>, Error> {
        Ok(self.find_one(|reward| reward.campaign_id == campaign_id && reward.user_id == user_id))
    }

    async fn upsert_reward(&self, reward: &RewardTracking) -> Result<(), Error> {
        self.replace(
            |existing| {
                existing.campaign_id == reward.campaign_id && existing.user_id == reward.user_id
            },
            reward.clone(),
            true,
        );

        Ok(())
    }

    async fn delete_rewards_by_campaign(&self, campaign_id: CampaignId) -> Result<(), Error> {
        self.delete(|reward| reward.campaign_id == campaign_id);

        Ok(())
    }
}
