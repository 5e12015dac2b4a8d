use async_trait::async_trait;
use mongodb::{bson, Database};

use crate::database::{MemoryPartnerStore, MongoPartnerStore};
use crate::error::Error;
use crate::user::UserId;

use super::Partner;

const PARTNERS: &str = "partners";

pub async fn initialize(db: &Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": PARTNERS,
            "indexes": [
                { "key": { "user_id": 1 }, "name": "by_user_id", "unique": true },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

#[async_trait]
pub trait PartnerStore: Send + Sync {
    async fn insert_partner(&self, partner: &Partner) -> Result<(), Error>;

    async fn fetch_partner_by_user(&self, user_id: UserId) -> Result<Option<Partner>, Error>;
}

#[async_trait]
impl PartnerStore for MongoPartnerStore {
    #[tracing::instrument(skip(self))]
    async fn insert_partner(&self, partner: &Partner) -> Result<(), Error> {
        self.insert_one(partner, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_partner_by_user(&self, user_id: UserId) -> Result<Option<Partner>, Error> {
        let partner = self
            .find_one(bson::doc! { "user_id": user_id }, None)
            .await?;

        Ok(partner)
    }
}

#[async_trait]
impl PartnerStore for MemoryPartnerStore {
    async fn insert_partner(&self, partner: &Partner) -> Result<(), Error> {
        self.insert(partner.clone());

        Ok(())
    }

    async fn fetch_partner_by_user(&self, user_id: UserId) -> Result<Option<Partner>, Error> {
        Ok(self.find_one(|partner| partner.user_id == user_id))
    }
}
