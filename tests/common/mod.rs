#![allow(dead_code)]

use actix_web::http::header::AUTHORIZATION;
use actix_web::test::TestRequest;
use actix_web::web::Data;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use campaign_console::campaign::CampaignId;
use campaign_console::database::{Database, MemoryDatabase};
use campaign_console::mission::MissionId;
use campaign_console::mission_log::{MissionLog, MissionLogId, MissionLogStatus, Proof};
use campaign_console::partner::{Partner, PartnerId};
use campaign_console::session::Session;
use campaign_console::user::{Profile, UserId};

pub const TOKEN: &str = "test-session";

/// Builds the app around `$db` with no assistant configured.
macro_rules! console {
    ($db:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($db.clone())
                .app_data(actix_web::web::Data::new(
                    campaign_console::config::AppConfig::default(),
                ))
                .app_data(actix_web::web::Data::new(
                    campaign_console::assistant::Assistant::disabled(),
                ))
                .configure(campaign_console::configure)
                .default_service(actix_web::web::to(campaign_console::not_found)),
        )
        .await
    };
}

/// An in-memory store holding one partner whose session is `TOKEN`.
pub async fn database() -> Data<Box<dyn Database>> {
    let db: Box<dyn Database> = Box::new(MemoryDatabase::new());
    let user_id = UserId::new();

    db.partners()
        .insert_partner(&Partner {
            id: PartnerId::new(),
            user_id,
            organization: "Green Bean Cooperative".to_string(),
            contact_email: "hello@greenbean.example".to_string(),
        })
        .await
        .unwrap();
    db.sessions()
        .insert_session(&Session {
            token: TOKEN.to_string(),
            user_id,
            expires_at: Utc::now() + Duration::hours(1),
        })
        .await
        .unwrap();

    Data::new(db)
}

pub fn authorized(req: TestRequest) -> TestRequest {
    req.insert_header((AUTHORIZATION, format!("Bearer {}", TOKEN)))
}

pub fn campaign_body(title: &str, category: &str) -> Value {
    let today = Utc::now().date_naive();
    json!({
        "title": title,
        "description": "Bring your own cup",
        "start_date": today - Duration::days(3),
        "end_date": today + Duration::days(30),
        "region": "Seoul",
        "category": category,
        "campaign_type": "OFFLINE",
        "missions": [
            { "title": "Order with a tumbler", "verification_type": "IMAGE", "reward_points": 10 },
            { "title": "Recycling review", "verification_type": "TEXT_REVIEW", "reward_points": 5 },
        ],
    })
}

pub async fn add_profile(db: &Data<Box<dyn Database>>, nickname: &str) -> UserId {
    let id = UserId::new();
    db.profiles()
        .insert_profile(&Profile {
            id,
            nickname: nickname.to_string(),
            points: 0,
        })
        .await
        .unwrap();
    id
}

pub async fn add_log(
    db: &Data<Box<dyn Database>>,
    campaign_id: CampaignId,
    mission_id: MissionId,
    user_id: UserId,
    status: MissionLogStatus,
) -> MissionLog {
    let now = Utc::now();
    let submitted = status != MissionLogStatus::InProgress;
    let log = MissionLog {
        id: MissionLogId::new(),
        user_id,
        campaign_id,
        mission_template_id: mission_id,
        status,
        proof: submitted.then(|| Proof {
            image_url: Some("https://cdn.example/proof.jpg".to_string()),
            text: None,
            quiz_answer: None,
            location: None,
            ai_judgment: None,
        }),
        started_at: now - Duration::hours(3),
        submitted_at: submitted.then(|| now - Duration::hours(2)),
        completed_at: (status == MissionLogStatus::Completed).then(|| now),
        rejection_reason: None,
        modified_at: now,
    };
    db.mission_logs().insert_mission_log(&log).await.unwrap();
    log
}

pub fn id<T: std::str::FromStr>(value: &Value) -> T
where
    T::Err: std::fmt::Debug,
{
    value.as_str().unwrap().parse().unwrap()
}
