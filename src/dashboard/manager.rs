use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDate, Utc};

use crate::campaign::{Campaign, CampaignCategory, CampaignId, CampaignStatus};
use crate::database::Database;
use crate::error::Error;
use crate::mission::{MissionId, MissionTemplate};
use crate::mission_log::{completed_every_mission, group_by_user, MissionLog, MissionLogStatus};
use crate::partner::Partner;
use crate::user::UserId;
use crate::utils::completion_rate;

use super::co2;

pub const DEFAULT_CHART_DAYS: u32 = 7;
pub const MAX_CHART_DAYS: u32 = 90;

/// Everything a partner's dashboard is computed from.
#[derive(Clone, Debug, Default)]
pub struct PartnerActivity {
    pub campaigns: Vec<Campaign>,
    pub missions: Vec<MissionTemplate>,
    pub logs: Vec<MissionLog>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Overview {
    pub total_campaigns: usize,
    pub campaigns_by_status: Vec<(CampaignStatus, usize)>,
    pub participants: usize,
    pub total_logs: usize,
    pub completed_logs: usize,
    pub completion_rate: u32,
    pub pending_review_users: usize,
    pub points_issued: i64,
    pub co2_kg: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub participants_started: usize,
    pub missions_completed: usize,
    pub co2_kg: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Co2Entry {
    pub category: CampaignCategory,
    pub completed: usize,
    pub coefficient: f64,
    pub co2_kg: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Co2Breakdown {
    pub categories: Vec<Co2Entry>,
    pub total_co2_kg: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MissionAnalytics {
    pub mission_id: MissionId,
    pub title: String,
    pub order: i32,
    pub participants: usize,
    pub completed: usize,
    pub pending: usize,
    pub failed: usize,
    pub completion_rate: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CampaignAnalytics {
    pub campaign_id: CampaignId,
    pub missions: Vec<MissionAnalytics>,
    pub participants: usize,
    pub completers: usize,
    pub completion_rate: u32,
    pub co2_kg: f64,
}

impl PartnerActivity {
    fn categories(&self) -> HashMap<CampaignId, CampaignCategory> {
        self.campaigns
            .iter()
            .map(|campaign| (campaign.id, campaign.category))
            .collect()
    }

    /// Completed logs counted per category of the campaign they belong to.
    fn completed_by_category<'a>(
        &self,
        logs: impl IntoIterator<Item = &'a MissionLog>,
    ) -> BTreeMap<CampaignCategory, usize> {
        let categories = self.categories();
        let mut counts = BTreeMap::new();
        for log in logs.into_iter().filter(|log| log.is_completed()) {
            if let Some(category) = categories.get(&log.campaign_id) {
                *counts.entry(*category).or_insert(0) += 1;
            }
        }
        counts
    }
}

fn total_co2(completed: &BTreeMap<CampaignCategory, usize>) -> f64 {
    completed
        .iter()
        .map(|(category, count)| co2::co2_kg(*category, *count))
        .sum()
}

#[tracing::instrument(skip(db))]
pub async fn fetch_partner_activity(
    db: &dyn Database,
    partner: &Partner,
) -> Result<PartnerActivity, Error> {
    let today = Utc::now().date_naive();
    let mut campaigns = db.campaigns().fetch_campaigns_by_partner(partner.id).await?;
    for campaign in &mut campaigns {
        campaign.refresh_status(today);
    }

    let campaign_ids: Vec<CampaignId> = campaigns.iter().map(|campaign| campaign.id).collect();
    let missions = db.missions().fetch_missions_by_campaigns(&campaign_ids).await?;
    let logs = db
        .mission_logs()
        .fetch_mission_logs_by_campaigns(&campaign_ids)
        .await?;

    Ok(PartnerActivity {
        campaigns,
        missions,
        logs,
    })
}

pub fn overview(activity: &PartnerActivity) -> Overview {
    let campaigns_by_status = CampaignStatus::ALL
        .iter()
        .map(|status| {
            let count = activity
                .campaigns
                .iter()
                .filter(|campaign| campaign.status == *status)
                .count();
            (*status, count)
        })
        .collect();

    let participants: HashSet<UserId> = activity.logs.iter().map(|log| log.user_id).collect();
    let pending_review: HashSet<UserId> = activity
        .logs
        .iter()
        .filter(|log| log.is_pending())
        .map(|log| log.user_id)
        .collect();

    let reward_points: HashMap<MissionId, i64> = activity
        .missions
        .iter()
        .map(|mission| (mission.id, mission.reward_points))
        .collect();
    let completed: Vec<&MissionLog> = activity.logs.iter().filter(|log| log.is_completed()).collect();
    let points_issued = completed
        .iter()
        .filter_map(|log| reward_points.get(&log.mission_template_id))
        .sum();

    Overview {
        total_campaigns: activity.campaigns.len(),
        campaigns_by_status,
        participants: participants.len(),
        total_logs: activity.logs.len(),
        completed_logs: completed.len(),
        completion_rate: completion_rate(completed.len(), activity.logs.len()),
        pending_review_users: pending_review.len(),
        points_issued,
        co2_kg: total_co2(&activity.completed_by_category(completed)),
    }
}

/// Validates the requested window, falling back to a week when none is given.
pub fn chart_days(days: Option<u32>) -> Result<u32, Error> {
    let days = days.unwrap_or(DEFAULT_CHART_DAYS);
    if !(1..=MAX_CHART_DAYS).contains(&days) {
        return Err(Error::InvalidQueryParameter {
            name: "days".to_string(),
            reason: format!("must be between 1 and {}", MAX_CHART_DAYS),
        });
    }

    Ok(days)
}

/// One point per UTC day, oldest first, ending on `today`.
pub fn chart_detail(activity: &PartnerActivity, today: NaiveDate, days: u32) -> Vec<ChartPoint> {
    (0..days)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(i64::from(offset));

            let started: HashSet<UserId> = activity
                .logs
                .iter()
                .filter(|log| log.started_at.date_naive() == date)
                .map(|log| log.user_id)
                .collect();
            let completed: Vec<&MissionLog> = activity
                .logs
                .iter()
                .filter(|log| log.is_completed())
                .filter(|log| log.completed_at.map(|at| at.date_naive()) == Some(date))
                .collect();

            ChartPoint {
                date,
                participants_started: started.len(),
                missions_completed: completed.len(),
                co2_kg: total_co2(&activity.completed_by_category(completed)),
            }
        })
        .collect()
}

pub fn co2_breakdown(activity: &PartnerActivity) -> Co2Breakdown {
    let completed = activity.completed_by_category(&activity.logs);
    let categories: Vec<Co2Entry> = CampaignCategory::ALL
        .iter()
        .map(|category| {
            let count = completed.get(category).copied().unwrap_or(0);
            Co2Entry {
                category: *category,
                completed: count,
                coefficient: co2::coefficient(*category),
                co2_kg: co2::co2_kg(*category, count),
            }
        })
        .collect();

    Co2Breakdown {
        total_co2_kg: categories.iter().map(|entry| entry.co2_kg).sum(),
        categories,
    }
}

#[tracing::instrument(skip(db))]
pub async fn campaign_analytics(
    db: &dyn Database,
    campaign: &Campaign,
) -> Result<CampaignAnalytics, Error> {
    let missions = db.missions().fetch_missions_by_campaign(campaign.id).await?;
    let logs = db
        .mission_logs()
        .fetch_mission_logs_by_campaign(campaign.id)
        .await?;

    Ok(analyze_campaign(campaign, &missions, &logs))
}

pub fn analyze_campaign(
    campaign: &Campaign,
    missions: &[MissionTemplate],
    logs: &[MissionLog],
) -> CampaignAnalytics {
    let per_mission = missions
        .iter()
        .map(|mission| {
            let logs: Vec<&MissionLog> = logs
                .iter()
                .filter(|log| log.mission_template_id == mission.id)
                .collect();
            let count = |status: MissionLogStatus| logs.iter().filter(|log| log.status == status).count();
            let participants: HashSet<UserId> = logs.iter().map(|log| log.user_id).collect();
            let completed = count(MissionLogStatus::Completed);

            MissionAnalytics {
                mission_id: mission.id,
                title: mission.title.clone(),
                order: mission.order,
                participants: participants.len(),
                completed,
                pending: count(MissionLogStatus::PendingVerification),
                failed: count(MissionLogStatus::Failed),
                completion_rate: completion_rate(completed, participants.len()),
            }
        })
        .collect();

    let by_user = group_by_user(logs);
    let completers = by_user
        .values()
        .filter(|logs| completed_every_mission(missions, logs))
        .count();
    let completed_logs = logs.iter().filter(|log| log.is_completed()).count();

    CampaignAnalytics {
        campaign_id: campaign.id,
        missions: per_mission,
        participants: by_user.len(),
        completers,
        completion_rate: completion_rate(completers, by_user.len()),
        co2_kg: co2::co2_kg(campaign.category, completed_logs),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::database::test;
    use crate::mission_log::MissionLogStatus::*;

    /// Two campaigns of one partner, one mission each, with some shared users.
    fn activity() -> PartnerActivity {
        let partner = test::partner();
        let bikes = test::campaign(&partner, CampaignCategory::Transportation);
        let cups = test::campaign(&partner, CampaignCategory::ZeroWaste);
        let ride = test::mission(&bikes, 1, 30);
        let cup = test::mission(&cups, 1, 10);
        let (alice, bob, carol) = (UserId::new(), UserId::new(), UserId::new());

        let logs = vec![
            test::log(&ride, alice, Completed),
            test::log(&cup, alice, Completed),
            test::log(&ride, bob, PendingVerification),
            test::log(&cup, bob, Completed),
            test::log(&cup, carol, Failed),
        ];

        PartnerActivity {
            campaigns: vec![bikes, cups],
            missions: vec![ride, cup],
            logs,
        }
    }

    #[test]
    fn overview_counts_each_participant_once() {
        let activity = activity();

        let overview = overview(&activity);

        assert_eq!(overview.total_campaigns, 2);
        assert_eq!(overview.participants, 3);
        assert_eq!(overview.total_logs, 5);
        assert_eq!(overview.completed_logs, 3);
        assert_eq!(overview.completion_rate, 60);
        assert_eq!(overview.pending_review_users, 1);
        assert_eq!(overview.points_issued, 50);
        assert_eq!(co2::round_kg(overview.co2_kg), 3.2);
        assert!(overview
            .campaigns_by_status
            .contains(&(CampaignStatus::Active, 2)));
    }

    #[test]
    fn co2_total_is_sum_of_categories() {
        let activity = activity();

        let breakdown = co2_breakdown(&activity);

        assert_eq!(breakdown.categories.len(), CampaignCategory::ALL.len());
        let expected: f64 = breakdown
            .categories
            .iter()
            .map(|entry| entry.coefficient * entry.completed as f64)
            .sum();
        assert_eq!(breakdown.total_co2_kg, expected);

        let water = breakdown
            .categories
            .iter()
            .find(|entry| entry.category == CampaignCategory::Water)
            .unwrap();
        assert_eq!(water.completed, 0);
        assert_eq!(water.co2_kg, 0.0);

        let zero_waste = breakdown
            .categories
            .iter()
            .find(|entry| entry.category == CampaignCategory::ZeroWaste)
            .unwrap();
        assert_eq!(zero_waste.completed, 2);
    }

    #[test]
    fn chart_days_are_bounded() {
        assert_eq!(chart_days(None).unwrap(), 7);
        assert_eq!(chart_days(Some(90)).unwrap(), 90);
        assert!(matches!(
            chart_days(Some(0)),
            Err(Error::InvalidQueryParameter { .. })
        ));
        assert!(matches!(
            chart_days(Some(91)),
            Err(Error::InvalidQueryParameter { .. })
        ));
    }

    #[test]
    fn chart_buckets_by_utc_day() {
        let mut activity = activity();
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let at = |day, hour| Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap();

        for log in &mut activity.logs {
            log.started_at = at(8, 9);
            if log.completed_at.is_some() {
                log.completed_at = Some(at(10, 23));
            }
        }
        activity.logs[1].started_at = at(10, 0);

        let points = chart_detail(&activity, today, 3);

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 5, 8).unwrap());
        assert_eq!(points[2].date, today);
        assert_eq!(points[0].participants_started, 3);
        assert_eq!(points[1].participants_started, 0);
        assert_eq!(points[2].participants_started, 1);
        assert_eq!(points[2].missions_completed, 3);
        assert_eq!(points[1].co2_kg, 0.0);
        assert_eq!(co2::round_kg(points[2].co2_kg), 3.2);
    }

    #[test]
    fn campaign_analytics_per_mission() {
        let (_db, _partner, campaign, missions) = test::seeded(CampaignCategory::Food, 2);
        let (alice, bob) = (UserId::new(), UserId::new());
        let logs = vec![
            test::log(&missions[0], alice, Completed),
            test::log(&missions[1], alice, Completed),
            test::log(&missions[0], bob, Completed),
            test::log(&missions[1], bob, PendingVerification),
        ];

        let analytics = analyze_campaign(&campaign, &missions, &logs);

        assert_eq!(analytics.participants, 2);
        assert_eq!(analytics.completers, 1);
        assert_eq!(analytics.completion_rate, 50);
        assert_eq!(co2::round_kg(analytics.co2_kg), 2.7);
        assert_eq!(analytics.missions[0].participants, 2);
        assert_eq!(analytics.missions[0].completion_rate, 100);
        assert_eq!(analytics.missions[1].completed, 1);
        assert_eq!(analytics.missions[1].pending, 1);
        assert_eq!(analytics.missions[1].completion_rate, 50);
    }
}
