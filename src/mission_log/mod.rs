use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::CampaignId;
use crate::mission::{MissionId, MissionTemplate};
use crate::typedid::{TypedId, TypedIdMarker};
use crate::user::UserId;

pub mod db;

pub type MissionLogId = TypedId<MissionLog>;

/// A user's attempt at one mission. Written by the participant app, reviewed here.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MissionLog {
    #[serde(rename = "_id")]
    pub id: MissionLogId,
    pub user_id: UserId,
    pub campaign_id: CampaignId,
    pub mission_template_id: MissionId,
    pub status: MissionLogStatus,
    pub proof: Option<Proof>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "crate::utils::optional_bson_datetime")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::utils::optional_bson_datetime")]
    pub completed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

impl MissionLog {
    pub fn is_completed(&self) -> bool {
        self.status == MissionLogStatus::Completed
    }

    pub fn is_pending(&self) -> bool {
        self.status == MissionLogStatus::PendingVerification
    }

    pub fn ai_judgment(&self) -> Option<&AiJudgment> {
        self.proof.as_ref().and_then(|proof| proof.ai_judgment.as_ref())
    }
}

impl TypedIdMarker for MissionLog {
    fn tag() -> &'static str {
        "LOG"
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionLogStatus {
    InProgress,
    PendingVerification,
    Completed,
    Failed,
}

impl MissionLogStatus {
    pub fn label(self) -> &'static str {
        match self {
            MissionLogStatus::InProgress => "IN_PROGRESS",
            MissionLogStatus::PendingVerification => "PENDING_VERIFICATION",
            MissionLogStatus::Completed => "COMPLETED",
            MissionLogStatus::Failed => "FAILED",
        }
    }
}

/// What the participant submitted. Which fields are set depends on the verification type.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Proof {
    pub image_url: Option<String>,
    pub text: Option<String>,
    pub quiz_answer: Option<usize>,
    pub location: Option<ProofLocation>,
    pub ai_judgment: Option<AiJudgment>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ProofLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// The verdict of the upstream image/text judging model.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AiJudgment {
    pub passed: bool,
    pub confidence: f64,
    pub reason: String,
}

/// Groups logs by the user who made them.
pub fn group_by_user<'a>(
    logs: impl IntoIterator<Item = &'a MissionLog>,
) -> BTreeMap<UserId, Vec<&'a MissionLog>> {
    let mut grouped: BTreeMap<UserId, Vec<&MissionLog>> = BTreeMap::new();
    for log in logs {
        grouped.entry(log.user_id).or_default().push(log);
    }
    grouped
}

/// Whether `logs` holds a completed log for every one of `missions`.
pub fn completed_every_mission(missions: &[MissionTemplate], logs: &[&MissionLog]) -> bool {
    !missions.is_empty()
        && missions.iter().all(|mission| {
            logs.iter()
                .any(|log| log.mission_template_id == mission.id && log.is_completed())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::CampaignCategory;
    use crate::database::test;

    #[test]
    fn completing_every_mission_needs_one_completed_log_each() {
        let (_db, _partner, _campaign, missions) = test::seeded(CampaignCategory::Food, 2);
        let user_id = UserId::new();
        let first = test::log(&missions[0], user_id, MissionLogStatus::Completed);
        let second = test::log(&missions[1], user_id, MissionLogStatus::PendingVerification);

        assert!(!completed_every_mission(&missions, &[&first, &second]));

        let second = test::log(&missions[1], user_id, MissionLogStatus::Completed);
        assert!(completed_every_mission(&missions, &[&first, &second]));
        assert!(!completed_every_mission(&[], &[&first, &second]));
    }

    #[test]
    fn grouping_keeps_each_user_once() {
        let (_db, _partner, _campaign, missions) = test::seeded(CampaignCategory::Food, 2);
        let (alice, bob) = (UserId::new(), UserId::new());
        let logs = vec![
            test::log(&missions[0], alice, MissionLogStatus::Completed),
            test::log(&missions[1], alice, MissionLogStatus::Completed),
            test::log(&missions[0], bob, MissionLogStatus::InProgress),
        ];

        let grouped = group_by_user(&logs);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&alice].len(), 2);
        assert_eq!(grouped[&bob].len(), 1);
    }
}
