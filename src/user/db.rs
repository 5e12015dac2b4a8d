use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, Bson};

use crate::database::{MemoryProfileStore, MongoProfileStore};
use crate::error::Error;

use super::{Profile, UserId};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn insert_profile(&self, profile: &Profile) -> Result<(), Error>;

    async fn fetch_profile_by_id(&self, user_id: UserId) -> Result<Option<Profile>, Error>;

    async fn fetch_profiles_by_ids(&self, user_ids: &[UserId]) -> Result<Vec<Profile>, Error>;

    async fn increment_profile_points(&self, user_id: UserId, amount: i64) -> Result<(), Error>;
}

#[async_trait]
impl ProfileStore for MongoProfileStore {
    #[tracing::instrument(skip(self))]
    async fn insert_profile(&self, profile: &Profile) -> Result<(), Error> {
        self.insert_one(profile, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_profile_by_id(&self, user_id: UserId) -> Result<Option<Profile>, Error> {
        let profile = self.find_one(bson::doc! { "_id": user_id }, None).await?;

        Ok(profile)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_profiles_by_ids(&self, user_ids: &[UserId]) -> Result<Vec<Profile>, Error> {
        let ids: Vec<Bson> = user_ids.iter().map(|id| Bson::from(*id)).collect();
        let profiles: Vec<Profile> = self
            .find(bson::doc! { "_id": { "$in": ids } }, None)
            .await?
            .try_collect()
            .await?;

        Ok(profiles)
    }

    #[tracing::instrument(skip(self))]
    async fn increment_profile_points(&self, user_id: UserId, amount: i64) -> Result<(), Error> {
        let result = self
            .update_one(
                bson::doc! { "_id": user_id },
                bson::doc! { "$inc": { "points": amount } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::ProfileNotFound { user_id });
        }

        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn insert_profile(&self, profile: &Profile) -> Result<(), Error> {
        self.insert(profile.clone());

        Ok(())
    }

    async fn fetch_profile_by_id(&self, user_id: UserId) -> Result<Option<Profile>, Error> {
        Ok(self.find_one(|profile| profile.id == user_id))
    }

    async fn fetch_profiles_by_ids(&self, user_ids: &[UserId]) -> Result<Vec<Profile>, Error> {
        Ok(self.find(|profile| user_ids.contains(&profile.id)))
    }

    async fn increment_profile_points(&self, user_id: UserId, amount: i64) -> Result<(), Error> {
        let matched = self.update(
            |profile| profile.id == user_id,
            |profile| profile.points += amount,
        );

        if matched == 0 {
            return Err(Error::ProfileNotFound { user_id });
        }

        Ok(())
    }
}
