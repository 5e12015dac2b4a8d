use chrono::{Duration, NaiveDate, Utc};
use rand::Rng;
use tracing::info;

use crate::campaign::{Campaign, CampaignCategory, CampaignId, CampaignStatus, CampaignType};
use crate::database::Database;
use crate::error::Error;
use crate::mission::{MissionId, MissionTemplate, Quiz, VerificationType};
use crate::mission_log::{AiJudgment, MissionLog, MissionLogId, MissionLogStatus, Proof};
use crate::partner::{Partner, PartnerId};
use crate::session::Session;
use crate::user::{Profile, UserId};

pub const DEMO_SESSION_TOKEN: &str = "demo-session";
const DEMO_PARTNER_USER: &str = "USR-6A1E0C2B-52D4-4C3B-9C51-0E8B1A7D4F20";

const NICKNAMES: [&str; 12] = [
    "pine", "moss", "fern", "cedar", "willow", "maple", "birch", "clover", "ivy", "sage", "reed",
    "aspen",
];

struct Demo {
    partner: Partner,
    campaigns: Vec<Campaign>,
    missions: Vec<MissionTemplate>,
    profiles: Vec<Profile>,
    logs: Vec<MissionLog>,
}

fn campaign(
    partner: &Partner,
    title: &str,
    category: CampaignCategory,
    start_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
) -> Campaign {
    let now = Utc::now();
    Campaign {
        id: CampaignId::new(),
        partner_id: partner.id,
        title: title.to_string(),
        description: format!("{} with the Green Bean community.", title),
        start_date,
        end_date,
        region: "Seoul".to_string(),
        category,
        campaign_type: CampaignType::Offline,
        status: CampaignStatus::on(start_date, end_date, today),
        image_url: None,
        created_at: now,
        modified_at: now,
    }
}

fn mission(
    campaign: &Campaign,
    order: i32,
    title: &str,
    verification_type: VerificationType,
    reward_points: i64,
) -> MissionTemplate {
    MissionTemplate {
        id: MissionId::new(),
        campaign_id: campaign.id,
        title: title.to_string(),
        description: format!("{}.", title),
        verification_type,
        reward_points,
        order,
        quiz: (verification_type == VerificationType::Quiz).then(|| Quiz {
            question: "Which bin do clean plastic bottles go in?".to_string(),
            options: vec!["General".to_string(), "Recycling".to_string()],
            answer_index: 1,
        }),
        location: None,
    }
}

fn build_demo(partner_user: UserId) -> Demo {
    let mut rng = rand::thread_rng();
    let now = Utc::now();
    let today = now.date_naive();

    let partner = Partner {
        id: PartnerId::new(),
        user_id: partner_user,
        organization: "Green Bean Cooperative".to_string(),
        contact_email: "hello@greenbean.example".to_string(),
    };

    let campaigns = vec![
        campaign(
            &partner,
            "Bike to Work Week",
            CampaignCategory::Transportation,
            today - Duration::days(20),
            today + Duration::days(10),
            today,
        ),
        campaign(
            &partner,
            "Tumbler Challenge",
            CampaignCategory::ZeroWaste,
            today - Duration::days(10),
            today + Duration::days(30),
            today,
        ),
        campaign(
            &partner,
            "Riverside Cleanup",
            CampaignCategory::Nature,
            today - Duration::days(60),
            today - Duration::days(30),
            today,
        ),
    ];

    let missions = vec![
        mission(&campaigns[0], 1, "Ride to the office", VerificationType::Image, 30),
        mission(&campaigns[0], 2, "Share your route", VerificationType::TextReview, 20),
        mission(&campaigns[1], 1, "Order with a tumbler", VerificationType::Image, 10),
        mission(&campaigns[1], 2, "Recycling quiz", VerificationType::Quiz, 5),
        mission(&campaigns[2], 1, "Collect litter", VerificationType::Image, 50),
    ];

    let profiles: Vec<Profile> = NICKNAMES
        .iter()
        .map(|nickname| Profile {
            id: UserId::new(),
            nickname: nickname.to_string(),
            points: rng.gen_range(0..500),
        })
        .collect();

    let mut logs = vec![];
    for profile in &profiles {
        for mission in &missions {
            if !rng.gen_bool(0.6) {
                continue;
            }

            let status = match rng.gen_range(0..10) {
                0..=1 => MissionLogStatus::InProgress,
                2..=4 => MissionLogStatus::PendingVerification,
                5..=8 => MissionLogStatus::Completed,
                _ => MissionLogStatus::Failed,
            };
            let started_at = now - Duration::hours(rng.gen_range(2..24 * 14));
            let submitted_at = (status != MissionLogStatus::InProgress)
                .then(|| started_at + Duration::minutes(rng.gen_range(5..90)));
            let ai_judgment = AiJudgment {
                passed: rng.gen_bool(0.85),
                confidence: rng.gen_range(0.5..1.0),
                reason: "the photo matches the mission".to_string(),
            };

            logs.push(MissionLog {
                id: MissionLogId::new(),
                user_id: profile.id,
                campaign_id: mission.campaign_id,
                mission_template_id: mission.id,
                status,
                proof: submitted_at.map(|_| Proof {
                    image_url: Some("https://cdn.greenbean.example/proof.jpg".to_string()),
                    text: None,
                    quiz_answer: None,
                    location: None,
                    ai_judgment: Some(ai_judgment),
                }),
                started_at,
                submitted_at,
                completed_at: (status == MissionLogStatus::Completed)
                    .then(|| submitted_at.map(|at| at + Duration::hours(1)))
                    .flatten(),
                rejection_reason: (status == MissionLogStatus::Failed)
                    .then(|| "the proof did not show the mission".to_string()),
                modified_at: now,
            });
        }
    }

    Demo {
        partner,
        campaigns,
        missions,
        profiles,
        logs,
    }
}

/// Loads a demo partner with campaigns and participant activity. Does nothing if the demo
/// partner already exists.
pub async fn seed(db: &dyn Database) -> Result<(), Error> {
    let partner_user: UserId = DEMO_PARTNER_USER
        .parse()
        .map_err(|err| Error::ExistentialState(format!("invalid demo user id: {}", err)))?;

    if db.partners().fetch_partner_by_user(partner_user).await?.is_some() {
        info!("demo data already present");
        return Ok(());
    }

    let demo = build_demo(partner_user);

    db.partners().insert_partner(&demo.partner).await?;
    db.sessions()
        .insert_session(&Session {
            token: DEMO_SESSION_TOKEN.to_string(),
            user_id: partner_user,
            expires_at: Utc::now() + Duration::days(365),
        })
        .await?;
    for campaign in &demo.campaigns {
        db.campaigns().insert_campaign(campaign).await?;
    }
    for mission in &demo.missions {
        db.missions().insert_mission(mission).await?;
    }
    for profile in &demo.profiles {
        db.profiles().insert_profile(profile).await?;
    }
    for log in &demo.logs {
        db.mission_logs().insert_mission_log(log).await?;
    }

    info!(
        "seeded {} campaigns and {} mission logs, use session token \"{}\"",
        demo.campaigns.len(),
        demo.logs.len(),
        DEMO_SESSION_TOKEN
    );

    Ok(())
}
