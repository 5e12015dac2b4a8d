use chrono::Utc;

use crate::campaign::Campaign;
use crate::dashboard::co2::round_kg;
use crate::dashboard::manager as dashboard;
use crate::database::Database;
use crate::error::Error;
use crate::mission_log::MissionLogStatus;
use crate::partner::Partner;
use crate::reward::manager as reward;
use crate::verification::manager as verification;

use super::{fact, headers, timestamp, Report, Section, Table};

#[tracing::instrument(skip(db))]
pub async fn campaign_report(db: &dyn Database, campaign: &Campaign) -> Result<Report, Error> {
    let analytics = dashboard::campaign_analytics(db, campaign).await?;
    let verifications = verification::get_verifications(db, campaign, None).await?;
    let (rewards, reward_summary) = reward::get_rewards(db, campaign).await?;

    let count_status = |status: MissionLogStatus| {
        verifications
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    };

    let overview = Section {
        heading: "Campaign".to_string(),
        facts: vec![
            fact("Title", &campaign.title),
            fact(
                "Period",
                format!("{} ~ {}", campaign.start_date, campaign.end_date),
            ),
            fact("Region", &campaign.region),
            fact("Category", campaign.category.label()),
            fact("Type", campaign.campaign_type.label()),
            fact("Status", campaign.status.label()),
        ],
        table: None,
    };

    let participation = Section {
        heading: "Participation".to_string(),
        facts: vec![
            fact("Participants", analytics.participants),
            fact("Completed every mission", analytics.completers),
            fact("Completion rate", format!("{}%", analytics.completion_rate)),
            fact("CO2 reduced (kg)", round_kg(analytics.co2_kg)),
        ],
        table: Some(Table {
            headers: headers(&[
                "order",
                "mission",
                "participants",
                "completed",
                "pending",
                "failed",
                "completion_rate",
            ]),
            rows: analytics
                .missions
                .iter()
                .map(|mission| {
                    vec![
                        mission.order.to_string(),
                        mission.title.clone(),
                        mission.participants.to_string(),
                        mission.completed.to_string(),
                        mission.pending.to_string(),
                        mission.failed.to_string(),
                        format!("{}%", mission.completion_rate),
                    ]
                })
                .collect(),
        }),
    };

    let review = Section {
        heading: "Verification".to_string(),
        facts: vec![
            fact(
                "Pending verification",
                count_status(MissionLogStatus::PendingVerification),
            ),
            fact("Completed", count_status(MissionLogStatus::Completed)),
            fact("Failed", count_status(MissionLogStatus::Failed)),
            fact("In progress", count_status(MissionLogStatus::InProgress)),
        ],
        table: Some(Table {
            headers: headers(&["user_id", "nickname", "status", "logs", "latest_submission"]),
            rows: verifications
                .iter()
                .map(|entry| {
                    vec![
                        entry.user_id.to_string(),
                        entry.nickname.clone().unwrap_or_default(),
                        entry.status.label().to_string(),
                        entry.logs.len().to_string(),
                        timestamp(entry.latest_submission),
                    ]
                })
                .collect(),
        }),
    };

    let rewards = Section {
        heading: "Rewards".to_string(),
        facts: vec![
            fact("Eligible", reward_summary.eligible),
            fact("Rewarded", reward_summary.rewarded),
            fact("Pending", reward_summary.pending),
        ],
        table: Some(Table {
            headers: headers(&[
                "user_id",
                "nickname",
                "completed_at",
                "points",
                "rewarded",
                "rewarded_at",
                "note",
            ]),
            rows: rewards
                .iter()
                .map(|entry| {
                    vec![
                        entry.user_id.to_string(),
                        entry.nickname.clone().unwrap_or_default(),
                        timestamp(entry.completed_at),
                        entry.points_earned.to_string(),
                        if entry.is_rewarded { "yes" } else { "no" }.to_string(),
                        timestamp(entry.rewarded_at),
                        entry.note.clone(),
                    ]
                })
                .collect(),
        }),
    };

    let now = Utc::now();
    Ok(Report {
        title: format!("Campaign report: {}", campaign.title),
        file_stem: format!("campaign-{}-{}", campaign.id, now.format("%Y%m%d")),
        generated_at: now,
        sections: vec![overview, participation, review, rewards],
    })
}

#[tracing::instrument(skip(db))]
pub async fn dashboard_report(db: &dyn Database, partner: &Partner) -> Result<Report, Error> {
    let activity = dashboard::fetch_partner_activity(db, partner).await?;
    let overview = dashboard::overview(&activity);
    let breakdown = dashboard::co2_breakdown(&activity);

    let mut facts = vec![fact("Campaigns", overview.total_campaigns)];
    for (status, count) in &overview.campaigns_by_status {
        facts.push(fact(&format!("Campaigns {}", status.label()), count));
    }
    facts.extend([
        fact("Participants", overview.participants),
        fact("Mission logs", overview.total_logs),
        fact("Completed logs", overview.completed_logs),
        fact("Completion rate", format!("{}%", overview.completion_rate)),
        fact("Users awaiting review", overview.pending_review_users),
        fact("Points issued", overview.points_issued),
        fact("CO2 reduced (kg)", round_kg(overview.co2_kg)),
    ]);

    let campaign_rows = activity
        .campaigns
        .iter()
        .map(|campaign| {
            let missions: Vec<_> = activity
                .missions
                .iter()
                .filter(|mission| mission.campaign_id == campaign.id)
                .cloned()
                .collect();
            let logs: Vec<_> = activity
                .logs
                .iter()
                .filter(|log| log.campaign_id == campaign.id)
                .cloned()
                .collect();
            let analytics = dashboard::analyze_campaign(campaign, &missions, &logs);

            vec![
                campaign.title.clone(),
                campaign.status.label().to_string(),
                campaign.category.label().to_string(),
                campaign.start_date.to_string(),
                campaign.end_date.to_string(),
                analytics.participants.to_string(),
                analytics.completers.to_string(),
                format!("{}%", analytics.completion_rate),
                round_kg(analytics.co2_kg).to_string(),
            ]
        })
        .collect();

    let sections = vec![
        Section {
            heading: "Overview".to_string(),
            facts,
            table: None,
        },
        Section {
            heading: "Campaigns".to_string(),
            facts: vec![],
            table: Some(Table {
                headers: headers(&[
                    "campaign",
                    "status",
                    "category",
                    "start_date",
                    "end_date",
                    "participants",
                    "completers",
                    "completion_rate",
                    "co2_kg",
                ]),
                rows: campaign_rows,
            }),
        },
        Section {
            heading: "CO2 reduction by category".to_string(),
            facts: vec![fact("Total (kg)", round_kg(breakdown.total_co2_kg))],
            table: Some(Table {
                headers: headers(&["category", "completed", "coefficient", "co2_kg"]),
                rows: breakdown
                    .categories
                    .iter()
                    .map(|entry| {
                        vec![
                            entry.category.label().to_string(),
                            entry.completed.to_string(),
                            entry.coefficient.to_string(),
                            round_kg(entry.co2_kg).to_string(),
                        ]
                    })
                    .collect(),
            }),
        },
    ];

    let now = Utc::now();
    Ok(Report {
        title: format!("Partner dashboard: {}", partner.organization),
        file_stem: format!("dashboard-{}", now.format("%Y%m%d")),
        generated_at: now,
        sections,
    })
}
