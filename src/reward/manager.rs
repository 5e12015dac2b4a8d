use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::campaign::Campaign;
use crate::database::Database;
use crate::error::Error;
use crate::mission::MissionTemplate;
use crate::mission_log::{completed_every_mission, group_by_user, MissionLog};
use crate::user::UserId;

use super::{RewardId, RewardTracking};

/// A participant who completed every mission of a campaign, with their reward state.
#[derive(Clone, Debug)]
pub struct RewardEntry {
    pub user_id: UserId,
    pub nickname: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub points_earned: i64,
    pub is_rewarded: bool,
    pub note: String,
    pub rewarded_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RewardSummary {
    pub eligible: usize,
    pub rewarded: usize,
    pub pending: usize,
}

struct Completion {
    user_id: UserId,
    completed_at: Option<DateTime<Utc>>,
    points_earned: i64,
}

fn completions(missions: &[MissionTemplate], logs: &[MissionLog]) -> Vec<Completion> {
    let points: HashMap<_, _> = missions.iter().map(|m| (m.id, m.reward_points)).collect();

    group_by_user(logs)
        .into_iter()
        .filter(|(_, logs)| completed_every_mission(missions, logs))
        .map(|(user_id, logs)| Completion {
            user_id,
            completed_at: logs.iter().filter_map(|log| log.completed_at).max(),
            points_earned: logs
                .iter()
                .filter(|log| log.is_completed())
                .filter_map(|log| points.get(&log.mission_template_id))
                .sum(),
        })
        .collect()
}

#[tracing::instrument(skip(db))]
pub async fn get_rewards(
    db: &dyn Database,
    campaign: &Campaign,
) -> Result<(Vec<RewardEntry>, RewardSummary), Error> {
    let missions = db.missions().fetch_missions_by_campaign(campaign.id).await?;
    let logs = db
        .mission_logs()
        .fetch_mission_logs_by_campaign(campaign.id)
        .await?;
    let rewards = db.rewards().fetch_rewards_by_campaign(campaign.id).await?;

    let completions = completions(&missions, &logs);
    let user_ids: Vec<UserId> = completions.iter().map(|c| c.user_id).collect();
    let nicknames: HashMap<UserId, String> = db
        .profiles()
        .fetch_profiles_by_ids(&user_ids)
        .await?
        .into_iter()
        .map(|profile| (profile.id, profile.nickname))
        .collect();
    let rewards: HashMap<UserId, RewardTracking> = rewards
        .into_iter()
        .map(|reward| (reward.user_id, reward))
        .collect();

    let mut entries: Vec<RewardEntry> = completions
        .into_iter()
        .map(|completion| {
            let reward = rewards.get(&completion.user_id);
            RewardEntry {
                user_id: completion.user_id,
                nickname: nicknames.get(&completion.user_id).cloned(),
                completed_at: completion.completed_at,
                points_earned: completion.points_earned,
                is_rewarded: reward.map_or(false, |r| r.is_rewarded),
                note: reward.map(|r| r.note.clone()).unwrap_or_default(),
                rewarded_at: reward.and_then(|r| r.rewarded_at),
            }
        })
        .collect();
    entries.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    let rewarded = entries.iter().filter(|entry| entry.is_rewarded).count();
    let summary = RewardSummary {
        eligible: entries.len(),
        rewarded,
        pending: entries.len() - rewarded,
    };

    Ok((entries, summary))
}

/// Records whether `user_id` received their reward. Applying the same request again
/// leaves the stored record unchanged apart from `modified_at`.
#[tracing::instrument(skip(db))]
pub async fn set_reward(
    db: &dyn Database,
    campaign: &Campaign,
    user_id: UserId,
    is_rewarded: bool,
    note: Option<String>,
) -> Result<RewardTracking, Error> {
    let missions = db.missions().fetch_missions_by_campaign(campaign.id).await?;
    let logs = db
        .mission_logs()
        .fetch_mission_logs_by_campaign_and_user(campaign.id, user_id)
        .await?;
    let logs: Vec<&MissionLog> = logs.iter().collect();
    if !completed_every_mission(&missions, &logs) {
        return Err(Error::ParticipantNotFound {
            campaign_id: campaign.id,
            user_id,
        });
    }

    let now = Utc::now();
    let existing = db
        .rewards()
        .fetch_reward_by_campaign_and_user(campaign.id, user_id)
        .await?;

    let reward = match existing {
        Some(existing) => RewardTracking {
            rewarded_at: match (is_rewarded, existing.rewarded_at) {
                (true, Some(rewarded_at)) => Some(rewarded_at),
                (true, None) => Some(now),
                (false, _) => None,
            },
            is_rewarded,
            note: note.unwrap_or(existing.note),
            modified_at: now,
            ..existing
        },
        None => RewardTracking {
            id: RewardId::new(),
            campaign_id: campaign.id,
            user_id,
            is_rewarded,
            note: note.unwrap_or_default(),
            rewarded_at: is_rewarded.then(|| now),
            modified_at: now,
        },
    };

    db.rewards().upsert_reward(&reward).await?;

    Ok(reward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::CampaignCategory;
    use crate::database::test;
    use crate::mission_log::MissionLogStatus;

    #[tokio::test]
    async fn only_users_who_finished_every_mission_are_eligible() {
        let (db, _partner, campaign, missions) = test::seeded(CampaignCategory::Recycling, 2);
        let (finisher, straggler) = (UserId::new(), UserId::new());
        for mission in &missions {
            db.mission_logs
                .insert(test::log(mission, finisher, MissionLogStatus::Completed));
        }
        db.mission_logs
            .insert(test::log(&missions[0], straggler, MissionLogStatus::Completed));
        db.profiles.insert(test::profile(finisher, 0));

        let (entries, summary) = get_rewards(&db, &campaign).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, finisher);
        assert_eq!(entries[0].points_earned, 20);
        assert!(entries[0].nickname.is_some());
        assert_eq!(
            summary,
            RewardSummary {
                eligible: 1,
                rewarded: 0,
                pending: 1
            }
        );

        let result = set_reward(&db, &campaign, straggler, true, None).await;
        assert_eq!(
            result.unwrap_err(),
            Error::ParticipantNotFound {
                campaign_id: campaign.id,
                user_id: straggler
            }
        );
    }

    #[tokio::test]
    async fn reward_toggling_is_idempotent() {
        let (db, _partner, campaign, missions) = test::seeded(CampaignCategory::Recycling, 1);
        let user = UserId::new();
        db.mission_logs
            .insert(test::log(&missions[0], user, MissionLogStatus::Completed));

        let first = set_reward(&db, &campaign, user, true, Some("gift card sent".into()))
            .await
            .unwrap();
        let second = set_reward(&db, &campaign, user, true, Some("gift card sent".into()))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.is_rewarded);
        assert_eq!(second.note, "gift card sent");
        assert_eq!(first.rewarded_at, second.rewarded_at);
        assert_eq!(db.rewards.find(|_| true).len(), 1);

        let (_, summary) = get_rewards(&db, &campaign).await.unwrap();
        assert_eq!(summary.rewarded, 1);

        let cleared = set_reward(&db, &campaign, user, false, None).await.unwrap();
        assert!(!cleared.is_rewarded);
        assert_eq!(cleared.rewarded_at, None);
        assert_eq!(cleared.note, "gift card sent");

        let again = set_reward(&db, &campaign, user, false, None).await.unwrap();
        assert_eq!(again.is_rewarded, cleared.is_rewarded);
        assert_eq!(again.rewarded_at, cleared.rewarded_at);
        assert_eq!(again.note, cleared.note);
    }
}
