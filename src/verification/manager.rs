use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::campaign::Campaign;
use crate::database::Database;
use crate::error::Error;
use crate::mission::{MissionId, MissionTemplate, VerificationType};
use crate::mission_log::{group_by_user, MissionLog, MissionLogStatus};
use crate::user::UserId;

#[derive(Clone, Debug)]
pub struct VerificationEntry {
    pub user_id: UserId,
    pub nickname: Option<String>,
    pub status: MissionLogStatus,
    pub latest_submission: Option<DateTime<Utc>>,
    pub logs: Vec<ReviewedLog>,
}

#[derive(Clone, Debug)]
pub struct ReviewedLog {
    pub log: MissionLog,
    pub mission_title: String,
    pub verification_type: Option<VerificationType>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Approval {
    pub user_id: UserId,
    pub approved_logs: usize,
    pub points_awarded: i64,
    pub points_credited: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AutoReview {
    pub approved: Vec<Approval>,
    pub skipped: usize,
}

/// The status a participant shows up with in review lists.
pub fn overall_status(logs: &[&MissionLog]) -> MissionLogStatus {
    if logs.iter().all(|log| log.is_pending()) {
        MissionLogStatus::PendingVerification
    } else if logs.iter().all(|log| log.is_completed()) {
        MissionLogStatus::Completed
    } else if logs.iter().any(|log| log.status == MissionLogStatus::Failed) {
        MissionLogStatus::Failed
    } else {
        MissionLogStatus::InProgress
    }
}

#[tracing::instrument(skip(db))]
pub async fn get_verifications(
    db: &dyn Database,
    campaign: &Campaign,
    status: Option<MissionLogStatus>,
) -> Result<Vec<VerificationEntry>, Error> {
    let missions: HashMap<MissionId, MissionTemplate> = db
        .missions()
        .fetch_missions_by_campaign(campaign.id)
        .await?
        .into_iter()
        .map(|mission| (mission.id, mission))
        .collect();
    let logs = db
        .mission_logs()
        .fetch_mission_logs_by_campaign(campaign.id)
        .await?;

    let grouped: Vec<(UserId, Vec<&MissionLog>, MissionLogStatus)> = group_by_user(&logs)
        .into_iter()
        .map(|(user_id, logs)| {
            let status = overall_status(&logs);
            (user_id, logs, status)
        })
        .filter(|(_, _, overall)| status.map_or(true, |status| *overall == status))
        .collect();

    let user_ids: Vec<UserId> = grouped.iter().map(|(user_id, _, _)| *user_id).collect();
    let nicknames: HashMap<UserId, String> = db
        .profiles()
        .fetch_profiles_by_ids(&user_ids)
        .await?
        .into_iter()
        .map(|profile| (profile.id, profile.nickname))
        .collect();

    let mut entries: Vec<VerificationEntry> = grouped
        .into_iter()
        .map(|(user_id, mut logs, status)| {
            logs.sort_by_key(|log| missions.get(&log.mission_template_id).map(|m| m.order));
            VerificationEntry {
                user_id,
                nickname: nicknames.get(&user_id).cloned(),
                status,
                latest_submission: logs.iter().filter_map(|log| log.submitted_at).max(),
                logs: logs
                    .into_iter()
                    .map(|log| {
                        let mission = missions.get(&log.mission_template_id);
                        ReviewedLog {
                            log: log.clone(),
                            mission_title: mission.map(|m| m.title.clone()).unwrap_or_default(),
                            verification_type: mission.map(|m| m.verification_type),
                        }
                    })
                    .collect(),
            }
        })
        .collect();
    entries.sort_by(|a, b| b.latest_submission.cmp(&a.latest_submission));

    Ok(entries)
}

/// Fetches the user's logs, failing unless there is at least one and all are pending.
async fn fetch_pending_logs(
    db: &dyn Database,
    campaign: &Campaign,
    user_id: UserId,
) -> Result<Vec<MissionLog>, Error> {
    let logs = db
        .mission_logs()
        .fetch_mission_logs_by_campaign_and_user(campaign.id, user_id)
        .await?;

    if logs.is_empty() {
        return Err(Error::ParticipantNotFound {
            campaign_id: campaign.id,
            user_id,
        });
    }
    if !logs.iter().all(MissionLog::is_pending) {
        return Err(Error::LogsNotPendingVerification {
            campaign_id: campaign.id,
            user_id,
        });
    }

    Ok(logs)
}

#[tracing::instrument(skip(db))]
pub async fn approve(
    db: &dyn Database,
    campaign: &Campaign,
    user_id: UserId,
) -> Result<Approval, Error> {
    let logs = fetch_pending_logs(db, campaign, user_id).await?;
    let points: HashMap<MissionId, i64> = db
        .missions()
        .fetch_missions_by_campaign(campaign.id)
        .await?
        .into_iter()
        .map(|mission| (mission.id, mission.reward_points))
        .collect();

    // logs completed before a failed flip are still credited
    let mut points_awarded = 0;
    let mut approved_logs = 0;
    let mut failure = None;
    for log in logs {
        let reward = points.get(&log.mission_template_id).copied().unwrap_or(0);
        match db
            .mission_logs()
            .update_mission_log_review(log, MissionLogStatus::Completed, None)
            .await
        {
            Ok(_) => {
                points_awarded += reward;
                approved_logs += 1;
            }
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    if approved_logs == 0 {
        if let Some(err) = failure {
            return Err(err);
        }
    }

    let points_credited = match db
        .profiles()
        .increment_profile_points(user_id, points_awarded)
        .await
    {
        Ok(()) => true,
        Err(err) => {
            error!(
                "approved {} logs for {} but failed to credit {} points: {}",
                approved_logs, user_id, points_awarded, err
            );
            false
        }
    };

    if let Some(err) = failure {
        error!(
            "approval of {} stopped after {} logs worth {} points: {}",
            user_id, approved_logs, points_awarded, err
        );
        return Err(err);
    }

    info!("approved {} logs for {}", approved_logs, user_id);

    Ok(Approval {
        user_id,
        approved_logs,
        points_awarded,
        points_credited,
    })
}

#[tracing::instrument(skip(db))]
pub async fn reject(
    db: &dyn Database,
    campaign: &Campaign,
    user_id: UserId,
    reason: Option<String>,
) -> Result<usize, Error> {
    let logs = fetch_pending_logs(db, campaign, user_id).await?;

    let rejected_logs = logs.len();
    for log in logs {
        db.mission_logs()
            .update_mission_log_review(log, MissionLogStatus::Failed, reason.clone())
            .await?;
    }

    info!("rejected {} logs for {}", rejected_logs, user_id);

    Ok(rejected_logs)
}

/// Approves every participant whose pending proofs were all passed upstream with at least
/// `confidence_threshold` confidence.
#[tracing::instrument(skip(db))]
pub async fn auto_review(
    db: &dyn Database,
    campaign: &Campaign,
    confidence_threshold: f64,
) -> Result<AutoReview, Error> {
    let logs = db
        .mission_logs()
        .fetch_mission_logs_by_campaign(campaign.id)
        .await?;

    let mut candidates = vec![];
    let mut review = AutoReview::default();
    for (user_id, logs) in group_by_user(&logs) {
        if !logs.iter().all(|log| log.is_pending()) {
            continue;
        }

        let passed = logs.iter().all(|log| {
            log.ai_judgment()
                .map_or(false, |judgment| {
                    judgment.passed && judgment.confidence >= confidence_threshold
                })
        });
        if passed {
            candidates.push(user_id);
        } else {
            review.skipped += 1;
        }
    }

    for user_id in candidates {
        match approve(db, campaign, user_id).await {
            Ok(approval) => review.approved.push(approval),
            Err(err) => {
                warn!("skipping automatic approval of {}: {}", user_id, err);
                review.skipped += 1;
            }
        }
    }

    Ok(review)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::campaign::db::CampaignStore;
    use crate::campaign::{CampaignCategory, CampaignId};
    use crate::database::{test, MemoryDatabase, MemoryMissionLogStore};
    use crate::mission::db::MissionStore;
    use crate::mission_log::db::MissionLogStore;
    use crate::partner::db::PartnerStore;
    use crate::reward::db::RewardStore;
    use crate::session::db::SessionStore;
    use crate::user::db::ProfileStore;
    use crate::user::Profile;

    fn fetch_log(db: &MemoryDatabase, log: &MissionLog) -> MissionLog {
        db.mission_logs.find_one(|l| l.id == log.id).unwrap()
    }

    #[tokio::test]
    async fn approve_completes_logs_and_credits_points() {
        let (db, _partner, campaign, missions) = test::seeded(CampaignCategory::Food, 2);
        let user = UserId::new();
        db.profiles.insert(test::profile(user, 5));
        let logs: Vec<_> = missions
            .iter()
            .map(|m| test::log(m, user, MissionLogStatus::PendingVerification))
            .collect();
        for log in &logs {
            db.mission_logs.insert(log.clone());
        }

        let approval = approve(&db, &campaign, user).await.unwrap();

        assert_eq!(
            approval,
            Approval {
                user_id: user,
                approved_logs: 2,
                points_awarded: 20,
                points_credited: true,
            }
        );
        for log in &logs {
            let stored = fetch_log(&db, log);
            assert_eq!(stored.status, MissionLogStatus::Completed);
            assert!(stored.completed_at.is_some());
        }
        assert_eq!(db.profiles.find_one(|p| p.id == user).unwrap().points, 25);
    }

    #[tokio::test]
    async fn approve_requires_every_log_pending() {
        let (db, _partner, campaign, missions) = test::seeded(CampaignCategory::Food, 2);
        let user = UserId::new();
        let pending = test::log(&missions[0], user, MissionLogStatus::PendingVerification);
        db.mission_logs.insert(pending.clone());
        db.mission_logs
            .insert(test::log(&missions[1], user, MissionLogStatus::InProgress));

        let result = approve(&db, &campaign, user).await;

        assert_eq!(
            result.unwrap_err(),
            Error::LogsNotPendingVerification {
                campaign_id: campaign.id,
                user_id: user
            }
        );
        assert_eq!(fetch_log(&db, &pending).status, MissionLogStatus::PendingVerification);

        let stranger = UserId::new();
        assert_eq!(
            approve(&db, &campaign, stranger).await.unwrap_err(),
            Error::ParticipantNotFound {
                campaign_id: campaign.id,
                user_id: stranger
            }
        );
    }

    #[tokio::test]
    async fn reject_fails_logs_with_reason() {
        let (db, _partner, campaign, missions) = test::seeded(CampaignCategory::Food, 1);
        let user = UserId::new();
        let log = test::log(&missions[0], user, MissionLogStatus::PendingVerification);
        db.mission_logs.insert(log.clone());

        let rejected = reject(&db, &campaign, user, Some("blurry photo".to_string()))
            .await
            .unwrap();

        let stored = fetch_log(&db, &log);
        assert_eq!(rejected, 1);
        assert_eq!(stored.status, MissionLogStatus::Failed);
        assert_eq!(stored.rejection_reason.as_deref(), Some("blurry photo"));
        assert!(approve(&db, &campaign, user).await.is_err());
    }

    struct OfflineProfiles;

    #[async_trait]
    impl ProfileStore for OfflineProfiles {
        async fn insert_profile(&self, _profile: &Profile) -> Result<(), Error> {
            Err(Error::ExistentialState("profiles offline".to_string()))
        }

        async fn fetch_profile_by_id(&self, _user_id: UserId) -> Result<Option<Profile>, Error> {
            Err(Error::ExistentialState("profiles offline".to_string()))
        }

        async fn fetch_profiles_by_ids(&self, _ids: &[UserId]) -> Result<Vec<Profile>, Error> {
            Err(Error::ExistentialState("profiles offline".to_string()))
        }

        async fn increment_profile_points(&self, _id: UserId, _amount: i64) -> Result<(), Error> {
            Err(Error::ExistentialState("profiles offline".to_string()))
        }
    }

    struct ProfilesOfflineDatabase {
        inner: MemoryDatabase,
        profiles: OfflineProfiles,
    }

    impl Database for ProfilesOfflineDatabase {
        fn campaigns(&self) -> &dyn CampaignStore {
            &self.inner.campaigns
        }

        fn missions(&self) -> &dyn MissionStore {
            &self.inner.missions
        }

        fn mission_logs(&self) -> &dyn MissionLogStore {
            &self.inner.mission_logs
        }

        fn rewards(&self) -> &dyn RewardStore {
            &self.inner.rewards
        }

        fn partners(&self) -> &dyn PartnerStore {
            &self.inner.partners
        }

        fn profiles(&self) -> &dyn ProfileStore {
            &self.profiles
        }

        fn sessions(&self) -> &dyn SessionStore {
            &self.inner.sessions
        }
    }

    #[tokio::test]
    async fn failed_point_credit_does_not_roll_back_approval() {
        let (inner, _partner, campaign, missions) = test::seeded(CampaignCategory::Food, 1);
        let user = UserId::new();
        let log = test::log(&missions[0], user, MissionLogStatus::PendingVerification);
        inner.mission_logs.insert(log.clone());
        let db = ProfilesOfflineDatabase {
            inner,
            profiles: OfflineProfiles,
        };

        let approval = approve(&db, &campaign, user).await.unwrap();

        assert!(!approval.points_credited);
        assert_eq!(approval.points_awarded, 10);
        assert_eq!(fetch_log(&db.inner, &log).status, MissionLogStatus::Completed);
    }

    /// Fails every review update after the first `allowed`, as if another reviewer won.
    struct ContestedLogs {
        inner: MemoryMissionLogStore,
        allowed: usize,
        updates: AtomicUsize,
    }

    #[async_trait]
    impl MissionLogStore for ContestedLogs {
        async fn insert_mission_log(&self, log: &MissionLog) -> Result<(), Error> {
            self.inner.insert_mission_log(log).await
        }

        async fn fetch_mission_logs_by_campaign(
            &self,
            campaign_id: CampaignId,
        ) -> Result<Vec<MissionLog>, Error> {
            self.inner.fetch_mission_logs_by_campaign(campaign_id).await
        }

        async fn fetch_mission_logs_by_campaigns(
            &self,
            campaign_ids: &[CampaignId],
        ) -> Result<Vec<MissionLog>, Error> {
            self.inner.fetch_mission_logs_by_campaigns(campaign_ids).await
        }

        async fn fetch_mission_logs_by_campaign_and_user(
            &self,
            campaign_id: CampaignId,
            user_id: UserId,
        ) -> Result<Vec<MissionLog>, Error> {
            self.inner
                .fetch_mission_logs_by_campaign_and_user(campaign_id, user_id)
                .await
        }

        async fn count_mission_logs_by_mission(&self, mission_id: MissionId) -> Result<u64, Error> {
            self.inner.count_mission_logs_by_mission(mission_id).await
        }

        async fn update_mission_log_review(
            &self,
            log: MissionLog,
            status: MissionLogStatus,
            rejection_reason: Option<String>,
        ) -> Result<MissionLog, Error> {
            if self.updates.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                return Err(Error::ConcurrentModificationDetected);
            }

            self.inner
                .update_mission_log_review(log, status, rejection_reason)
                .await
        }
    }

    struct ContestedDatabase {
        inner: MemoryDatabase,
        mission_logs: ContestedLogs,
    }

    impl Database for ContestedDatabase {
        fn campaigns(&self) -> &dyn CampaignStore {
            &self.inner.campaigns
        }

        fn missions(&self) -> &dyn MissionStore {
            &self.inner.missions
        }

        fn mission_logs(&self) -> &dyn MissionLogStore {
            &self.mission_logs
        }

        fn rewards(&self) -> &dyn RewardStore {
            &self.inner.rewards
        }

        fn partners(&self) -> &dyn PartnerStore {
            &self.inner.partners
        }

        fn profiles(&self) -> &dyn ProfileStore {
            &self.inner.profiles
        }

        fn sessions(&self) -> &dyn SessionStore {
            &self.inner.sessions
        }
    }

    fn contested(inner: MemoryDatabase, allowed: usize) -> ContestedDatabase {
        let logs = MemoryMissionLogStore::new();
        for log in inner.mission_logs.find(|_| true) {
            logs.insert(log);
        }

        ContestedDatabase {
            inner,
            mission_logs: ContestedLogs {
                inner: logs,
                allowed,
                updates: AtomicUsize::new(0),
            },
        }
    }

    #[tokio::test]
    async fn interrupted_approval_credits_completed_logs() {
        let (inner, _partner, campaign, missions) = test::seeded(CampaignCategory::Food, 2);
        let user = UserId::new();
        inner.profiles.insert(test::profile(user, 5));
        for mission in &missions {
            inner
                .mission_logs
                .insert(test::log(mission, user, MissionLogStatus::PendingVerification));
        }
        let db = contested(inner, 1);

        let result = approve(&db, &campaign, user).await;

        assert_eq!(result.unwrap_err(), Error::ConcurrentModificationDetected);
        let mut statuses: Vec<_> = db
            .mission_logs
            .inner
            .find(|log| log.user_id == user)
            .into_iter()
            .map(|log| log.status)
            .collect();
        statuses.sort_by_key(|status| status.label());
        assert_eq!(
            statuses,
            vec![MissionLogStatus::Completed, MissionLogStatus::PendingVerification]
        );
        assert_eq!(db.inner.profiles.find_one(|p| p.id == user).unwrap().points, 15);
    }

    #[tokio::test]
    async fn approval_lost_entirely_credits_nothing() {
        let (inner, _partner, campaign, missions) = test::seeded(CampaignCategory::Food, 1);
        let user = UserId::new();
        inner.profiles.insert(test::profile(user, 5));
        inner
            .mission_logs
            .insert(test::log(&missions[0], user, MissionLogStatus::PendingVerification));
        let db = contested(inner, 0);

        let result = approve(&db, &campaign, user).await;

        assert_eq!(result.unwrap_err(), Error::ConcurrentModificationDetected);
        assert_eq!(db.inner.profiles.find_one(|p| p.id == user).unwrap().points, 5);
    }

    #[tokio::test]
    async fn auto_review_follows_upstream_judgments() {
        let (db, _partner, campaign, missions) = test::seeded(CampaignCategory::Food, 1);
        let (confident, doubtful, failed, busy) =
            (UserId::new(), UserId::new(), UserId::new(), UserId::new());
        for user in [confident, doubtful, failed, busy] {
            db.profiles.insert(test::profile(user, 0));
        }
        let pending = |user| test::log(&missions[0], user, MissionLogStatus::PendingVerification);
        db.mission_logs.insert(test::judged(pending(confident), true, 0.95));
        db.mission_logs.insert(test::judged(pending(doubtful), true, 0.4));
        db.mission_logs.insert(test::judged(pending(failed), false, 0.99));
        db.mission_logs
            .insert(test::log(&missions[0], busy, MissionLogStatus::InProgress));

        let review = auto_review(&db, &campaign, 0.8).await.unwrap();

        assert_eq!(review.approved.len(), 1);
        assert_eq!(review.approved[0].user_id, confident);
        assert_eq!(review.skipped, 2);

        let listed = get_verifications(&db, &campaign, Some(MissionLogStatus::PendingVerification))
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|entry| entry.user_id != confident));
    }

    #[tokio::test]
    async fn verifications_group_logs_per_user() {
        let (db, _partner, campaign, missions) = test::seeded(CampaignCategory::Food, 2);
        let (alice, bob) = (UserId::new(), UserId::new());
        db.profiles.insert(test::profile(alice, 0));
        db.mission_logs
            .insert(test::log(&missions[1], alice, MissionLogStatus::Completed));
        db.mission_logs
            .insert(test::log(&missions[0], alice, MissionLogStatus::Completed));
        db.mission_logs
            .insert(test::log(&missions[0], bob, MissionLogStatus::Failed));
        db.mission_logs
            .insert(test::log(&missions[1], bob, MissionLogStatus::PendingVerification));

        let entries = get_verifications(&db, &campaign, None).await.unwrap();
        assert_eq!(entries.len(), 2);

        let alice_entry = entries.iter().find(|e| e.user_id == alice).unwrap();
        assert_eq!(alice_entry.status, MissionLogStatus::Completed);
        assert!(alice_entry.nickname.is_some());
        assert_eq!(alice_entry.logs[0].mission_title, missions[0].title);
        assert_eq!(alice_entry.logs[1].mission_title, missions[1].title);

        let bob_entry = entries.iter().find(|e| e.user_id == bob).unwrap();
        assert_eq!(bob_entry.status, MissionLogStatus::Failed);
        assert!(bob_entry.nickname.is_none());

        let failed = get_verifications(&db, &campaign, Some(MissionLogStatus::Failed))
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].user_id, bob);
    }
}
