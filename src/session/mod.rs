use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::database::Database;
use crate::error::Error;
use crate::partner::Partner;
use crate::user::UserId;

pub mod db;

pub const SESSION_COOKIE: &str = "session";

/// A login issued by the identity provider. This service only ever reads them.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
    #[serde(rename = "_id")]
    pub token: String,
    pub user_id: UserId,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

/// The partner on whose behalf a request is made.
#[derive(Clone, Debug)]
pub struct PartnerSession {
    pub user_id: UserId,
    pub partner: Partner,
}

#[tracing::instrument(skip(db, token))]
pub async fn authenticate(db: &dyn Database, token: Option<String>) -> Result<PartnerSession, Error> {
    let token = token.ok_or(Error::Unauthenticated)?;
    let session = db
        .sessions()
        .fetch_session(&token)
        .await?
        .ok_or(Error::Unauthenticated)?;

    if session.expires_at <= Utc::now() {
        debug!("session for {} has expired", session.user_id);
        return Err(Error::Unauthenticated);
    }

    let partner = db
        .partners()
        .fetch_partner_by_user(session.user_id)
        .await?
        .ok_or(Error::NotAPartner {
            user_id: session.user_id,
        })?;

    Ok(PartnerSession {
        user_id: session.user_id,
        partner,
    })
}

fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_owned());
    }

    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
}

impl FromRequest for PartnerSession {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<PartnerSession, Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let db = req.app_data::<Data<Box<dyn Database>>>().cloned();
        let token = session_token(req);

        Box::pin(async move {
            let db = db.ok_or_else(|| {
                Error::ExistentialState("database is not registered with the app".to_string())
            })?;

            authenticate(&***db, token).await
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::database::test;
    use crate::database::MemoryDatabase;

    fn session(user_id: UserId, expires_in: Duration) -> Session {
        Session {
            token: "token-1".to_string(),
            user_id,
            expires_at: Utc::now() + expires_in,
        }
    }

    #[tokio::test]
    async fn authenticate_resolves_partner() {
        let db = MemoryDatabase::new();
        let partner = test::partner();
        db.partners.insert(partner.clone());
        db.sessions.insert(session(partner.user_id, Duration::hours(1)));

        let session = authenticate(&db, Some("token-1".to_string())).await.unwrap();

        assert_eq!(session.partner.id, partner.id);
        assert_eq!(session.user_id, partner.user_id);
    }

    #[tokio::test]
    async fn authenticate_rejects_missing_and_expired_tokens() {
        let db = MemoryDatabase::new();
        let partner = test::partner();
        db.partners.insert(partner.clone());
        db.sessions.insert(session(partner.user_id, Duration::hours(-1)));

        assert_eq!(
            authenticate(&db, None).await.unwrap_err(),
            Error::Unauthenticated
        );
        assert_eq!(
            authenticate(&db, Some("token-1".to_string())).await.unwrap_err(),
            Error::Unauthenticated
        );
        assert_eq!(
            authenticate(&db, Some("unknown".to_string())).await.unwrap_err(),
            Error::Unauthenticated
        );
    }

    #[tokio::test]
    async fn authenticate_rejects_users_without_partner() {
        let db = MemoryDatabase::new();
        let user_id = UserId::new();
        db.sessions.insert(session(user_id, Duration::hours(1)));

        let result = authenticate(&db, Some("token-1".to_string())).await;

        assert_eq!(result.unwrap_err(), Error::NotAPartner { user_id });
    }
}
