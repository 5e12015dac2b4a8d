use actix_web::get;
use actix_web::web::{Data, Json, Path, Query};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::{self, CampaignCategory, CampaignId, CampaignStatus};
use crate::database::Database;
use crate::error::Error;
use crate::mission::MissionId;
use crate::session::PartnerSession;

use super::co2::round_kg;
use super::manager::{
    self, CampaignAnalytics, ChartPoint, Co2Breakdown, Co2Entry, MissionAnalytics, Overview,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusCountBody {
    pub status: CampaignStatus,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OverviewBody {
    pub total_campaigns: usize,
    pub campaigns_by_status: Vec<StatusCountBody>,
    pub participants: usize,
    pub total_logs: usize,
    pub completed_logs: usize,
    pub completion_rate: u32,
    pub pending_review_users: usize,
    pub points_issued: i64,
    pub co2_kg: f64,
}

impl OverviewBody {
    pub fn render(overview: Overview) -> OverviewBody {
        OverviewBody {
            total_campaigns: overview.total_campaigns,
            campaigns_by_status: overview
                .campaigns_by_status
                .into_iter()
                .map(|(status, count)| StatusCountBody { status, count })
                .collect(),
            participants: overview.participants,
            total_logs: overview.total_logs,
            completed_logs: overview.completed_logs,
            completion_rate: overview.completion_rate,
            pending_review_users: overview.pending_review_users,
            points_issued: overview.points_issued,
            co2_kg: round_kg(overview.co2_kg),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartQuery {
    pub days: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartPointBody {
    pub date: NaiveDate,
    pub participants_started: usize,
    pub missions_completed: usize,
    pub co2_kg: f64,
}

impl ChartPointBody {
    pub fn render(point: ChartPoint) -> ChartPointBody {
        ChartPointBody {
            date: point.date,
            participants_started: point.participants_started,
            missions_completed: point.missions_completed,
            co2_kg: round_kg(point.co2_kg),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Co2EntryBody {
    pub category: CampaignCategory,
    pub completed: usize,
    pub coefficient: f64,
    pub co2_kg: f64,
}

impl Co2EntryBody {
    pub fn render(entry: Co2Entry) -> Co2EntryBody {
        Co2EntryBody {
            category: entry.category,
            completed: entry.completed,
            coefficient: entry.coefficient,
            co2_kg: round_kg(entry.co2_kg),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Co2BreakdownBody {
    pub categories: Vec<Co2EntryBody>,
    pub total_co2_kg: f64,
}

impl Co2BreakdownBody {
    pub fn render(breakdown: Co2Breakdown) -> Co2BreakdownBody {
        Co2BreakdownBody {
            categories: breakdown
                .categories
                .into_iter()
                .map(Co2EntryBody::render)
                .collect(),
            total_co2_kg: round_kg(breakdown.total_co2_kg),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MissionAnalyticsBody {
    pub mission_id: MissionId,
    pub title: String,
    pub order: i32,
    pub participants: usize,
    pub completed: usize,
    pub pending: usize,
    pub failed: usize,
    pub completion_rate: u32,
}

impl MissionAnalyticsBody {
    pub fn render(analytics: MissionAnalytics) -> MissionAnalyticsBody {
        MissionAnalyticsBody {
            mission_id: analytics.mission_id,
            title: analytics.title,
            order: analytics.order,
            participants: analytics.participants,
            completed: analytics.completed,
            pending: analytics.pending,
            failed: analytics.failed,
            completion_rate: analytics.completion_rate,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignAnalyticsBody {
    pub campaign_id: CampaignId,
    pub missions: Vec<MissionAnalyticsBody>,
    pub participants: usize,
    pub completers: usize,
    pub completion_rate: u32,
    pub co2_kg: f64,
}

impl CampaignAnalyticsBody {
    pub fn render(analytics: CampaignAnalytics) -> CampaignAnalyticsBody {
        CampaignAnalyticsBody {
            campaign_id: analytics.campaign_id,
            missions: analytics
                .missions
                .into_iter()
                .map(MissionAnalyticsBody::render)
                .collect(),
            participants: analytics.participants,
            completers: analytics.completers,
            completion_rate: analytics.completion_rate,
            co2_kg: round_kg(analytics.co2_kg),
        }
    }
}

#[get("/dashboard/overview")]
#[tracing::instrument(skip(db))]
pub async fn get_dashboard_overview(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
) -> Result<Json<OverviewBody>, Error> {
    let activity = manager::fetch_partner_activity(&***db, &session.partner).await?;

    let overview = manager::overview(&activity);

    Ok(Json(OverviewBody::render(overview)))
}

#[get("/dashboard/chart")]
#[tracing::instrument(skip(db))]
pub async fn get_dashboard_chart(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    query: Query<ChartQuery>,
) -> Result<Json<Vec<ChartPointBody>>, Error> {
    let days = manager::chart_days(query.days)?;
    let activity = manager::fetch_partner_activity(&***db, &session.partner).await?;

    let points = manager::chart_detail(&activity, Utc::now().date_naive(), days);

    let body = points.into_iter().map(ChartPointBody::render).collect();

    Ok(Json(body))
}

#[get("/dashboard/co2")]
#[tracing::instrument(skip(db))]
pub async fn get_dashboard_co2(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
) -> Result<Json<Co2BreakdownBody>, Error> {
    let activity = manager::fetch_partner_activity(&***db, &session.partner).await?;

    let breakdown = manager::co2_breakdown(&activity);

    Ok(Json(Co2BreakdownBody::render(breakdown)))
}

#[get("/campaigns/{campaign_id}/analytics")]
#[tracing::instrument(skip(db))]
pub async fn get_campaign_analytics(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<CampaignId>,
) -> Result<Json<CampaignAnalyticsBody>, Error> {
    let campaign_id = params.into_inner();
    let campaign =
        campaign::manager::get_campaign_by_id(&***db, &session.partner, campaign_id).await?;

    let analytics = manager::campaign_analytics(&***db, &campaign).await?;

    Ok(Json(CampaignAnalyticsBody::render(analytics)))
}
