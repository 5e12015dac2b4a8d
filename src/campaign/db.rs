use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::{bson, Database};

use crate::database::{MemoryCampaignStore, MongoCampaignStore};
use crate::error::Error;
use crate::partner::PartnerId;

use super::{Campaign, CampaignId};

const CAMPAIGNS: &str = "campaigns";

pub async fn initialize(db: &Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": CAMPAIGNS,
            "indexes": [
                { "key": { "partner_id": 1, "created_at": -1 }, "name": "by_partner_id" },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error>;

    /// Newest first.
    async fn fetch_campaigns_by_partner(&self, partner_id: PartnerId)
        -> Result<Vec<Campaign>, Error>;

    async fn fetch_campaign_by_partner_and_id(
        &self,
        partner_id: PartnerId,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error>;

    /// Fails with `ConcurrentModificationDetected` if the stored campaign was modified
    /// after `old_modified_at`.
    async fn update_campaign(
        &self,
        campaign: &Campaign,
        old_modified_at: DateTime<Utc>,
    ) -> Result<(), Error>;

    async fn delete_campaign(&self, campaign_id: CampaignId) -> Result<(), Error>;
}

#[async_trait]
impl CampaignStore for MongoCampaignStore {
    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error> {
        self.insert_one(campaign, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns_by_partner(
        &self,
        partner_id: PartnerId,
    ) -> Result<Vec<Campaign>, Error> {
        let options = FindOptions::builder()
            .sort(bson::doc! { "created_at": -1 })
            .build();

        let campaigns: Vec<Campaign> = self
            .find(bson::doc! { "partner_id": partner_id }, options)
            .await?
            .try_collect()
            .await?;

        Ok(campaigns)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_partner_and_id(
        &self,
        partner_id: PartnerId,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error> {
        let campaign = self
            .find_one(
                bson::doc! { "_id": campaign_id, "partner_id": partner_id },
                None,
            )
            .await?;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn update_campaign(
        &self,
        campaign: &Campaign,
        old_modified_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        let old_modified_at = bson::DateTime::from_chrono(old_modified_at);

        let result = self
            .replace_one(
                bson::doc! { "_id": campaign.id, "modified_at": old_modified_at },
                campaign,
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::ConcurrentModificationDetected);
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_campaign(&self, campaign_id: CampaignId) -> Result<(), Error> {
        self.delete_one(bson::doc! { "_id": campaign_id }, None)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error> {
        self.insert(campaign.clone());

        Ok(())
    }

    async fn fetch_campaigns_by_partner(
        &self,
        partner_id: PartnerId,
    ) -> Result<Vec<Campaign>, Error> {
        let mut campaigns = self.find(|campaign| campaign.partner_id == partner_id);
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(campaigns)
    }

    async fn fetch_campaign_by_partner_and_id(
        &self,
        partner_id: PartnerId,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error> {
        Ok(self.find_one(|campaign| campaign.id == campaign_id && campaign.partner_id == partner_id))
    }

    async fn update_campaign(
        &self,
        campaign: &Campaign,
        old_modified_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        let matched = self.replace(
            |existing| existing.id == campaign.id && existing.modified_at == old_modified_at,
            campaign.clone(),
            false,
        );

        if matched == 0 {
            return Err(Error::ConcurrentModificationDetected);
        }

        Ok(())
    }

    async fn delete_campaign(&self, campaign_id: CampaignId) -> Result<(), Error> {
        self.delete(|campaign| campaign.id == campaign_id);

        Ok(())
    }
}
