use actix_web::get;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::web::{Data, Path, Query};
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

use crate::campaign::{self, CampaignId};
use crate::database::Database;
use crate::error::Error;
use crate::session::PartnerSession;

use super::{manager, Report, ReportFormat};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

impl ReportQuery {
    fn format(&self) -> Result<ReportFormat, Error> {
        match &self.format {
            Some(format) => format.parse(),
            None => Ok(ReportFormat::Csv),
        }
    }
}

fn download(report: &Report, format: ReportFormat) -> Result<HttpResponse, Error> {
    let bytes = format.render(report)?;

    Ok(HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(report.file_name(format))],
        })
        .body(bytes))
}

#[get("/campaigns/{campaign_id}/report")]
#[tracing::instrument(skip(db))]
pub async fn get_campaign_report(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    params: Path<CampaignId>,
    query: Query<ReportQuery>,
) -> Result<HttpResponse, Error> {
    let format = query.format()?;
    let campaign_id = params.into_inner();
    let campaign =
        campaign::manager::get_campaign_by_id(&***db, &session.partner, campaign_id).await?;

    let report = manager::campaign_report(&***db, &campaign).await?;

    download(&report, format)
}

#[get("/dashboard/report")]
#[tracing::instrument(skip(db))]
pub async fn get_dashboard_report(
    db: Data<Box<dyn Database>>,
    session: PartnerSession,
    query: Query<ReportQuery>,
) -> Result<HttpResponse, Error> {
    let format = query.format()?;

    let report = manager::dashboard_report(&***db, &session.partner).await?;

    download(&report, format)
}
