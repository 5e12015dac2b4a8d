use async_trait::async_trait;
use mongodb::bson;

use crate::database::{MemorySessionStore, MongoSessionStore};
use crate::error::Error;

use super::Session;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<(), Error>;

    async fn fetch_session(&self, token: &str) -> Result<Option<Session>, Error>;
}

#[async_trait]
impl SessionStore for MongoSessionStore {
    #[tracing::instrument(skip(self, session))]
    async fn insert_session(&self, session: &Session) -> Result<(), Error> {
        self.insert_one(session, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, token))]
    async fn fetch_session(&self, token: &str) -> Result<Option<Session>, Error> {
        let session = self.find_one(bson::doc! { "_id": token }, None).await?;

        Ok(session)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert_session(&self, session: &Session) -> Result<(), Error> {
        self.insert(session.clone());

        Ok(())
    }

    async fn fetch_session(&self, token: &str) -> Result<Option<Session>, Error> {
        Ok(self.find_one(|session| session.token == token))
    }
}
