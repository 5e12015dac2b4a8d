use actix_web::web::{self, Data, JsonConfig, PathConfig, QueryConfig, ServiceConfig};
use actix_web::{App, HttpResponse, HttpServer, ResponseError};
use clap::Parser;
use mongodb::Client;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

pub mod assistant;
pub mod campaign;
pub mod config;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod mission;
pub mod mission_log;
pub mod partner;
pub mod report;
pub mod reward;
pub mod seed;
pub mod session;
pub mod typedid;
pub mod user;
pub mod utils;
pub mod verification;

use assistant::client::ChatClient;
use assistant::Assistant;
use config::{AppConfig, Args, DatabaseConfig};
use database::{Database, MemoryDatabase, MongoDatabase};
use error::Error;

/// Registers extractor error formatting and every endpoint.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.app_data(JsonConfig::default().error_handler(|err, _req| {
        // format json errors with custom format
        Error::InvalidJson(err).into()
    }))
    .app_data(PathConfig::default().error_handler(|err, _req| {
        // format path errors with custom format
        Error::InvalidPath(err).into()
    }))
    .app_data(QueryConfig::default().error_handler(|err, _req| {
        // format query errors with custom format
        Error::InvalidQuery(err).into()
    }))
    .service(campaign::endpoints::create_campaign)
    .service(campaign::endpoints::get_campaigns)
    .service(campaign::endpoints::get_campaign_by_id)
    .service(campaign::endpoints::update_campaign)
    .service(campaign::endpoints::delete_campaign)
    .service(mission::endpoints::get_missions_in_campaign)
    .service(mission::endpoints::add_mission_to_campaign)
    .service(mission::endpoints::update_mission_in_campaign)
    .service(mission::endpoints::delete_mission_in_campaign)
    .service(verification::endpoints::get_verifications_in_campaign)
    .service(verification::endpoints::auto_review_in_campaign)
    .service(verification::endpoints::approve_participant)
    .service(verification::endpoints::reject_participant)
    .service(reward::endpoints::get_rewards_in_campaign)
    .service(reward::endpoints::set_reward_in_campaign)
    .service(dashboard::endpoints::get_campaign_analytics)
    .service(dashboard::endpoints::get_dashboard_overview)
    .service(dashboard::endpoints::get_dashboard_chart)
    .service(dashboard::endpoints::get_dashboard_co2)
    .service(report::endpoints::get_campaign_report)
    .service(report::endpoints::get_dashboard_report)
    .service(assistant::endpoints::generate_description)
    .service(assistant::endpoints::generate_missions);
}

pub async fn not_found() -> HttpResponse {
    Error::PathNotFound.error_response()
}

async fn connect(config: &DatabaseConfig) -> Result<Box<dyn Database>, Error> {
    match config {
        DatabaseConfig::Mongo { uri, name } => {
            info!("connecting to db: {}", uri);
            let db = Client::with_uri_str(uri).await?.database(name);
            Ok(Box::new(MongoDatabase::initialize(db).await?))
        }
        DatabaseConfig::Memory => {
            warn!("using the in-memory store, all data is lost on shutdown");
            Ok(Box::new(MemoryDatabase::new()))
        }
    }
}

pub async fn run() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::NEW)
        .compact()
        .init();

    let args = Args::parse();
    if !args.config.exists() {
        warn!(
            "configuration file {} does not exist, using defaults and environment",
            args.config.display()
        );
    }
    let config = AppConfig::load(&args)?;

    let db = connect(&config.database).await?;
    if config.seed {
        seed::seed(&*db).await?;
    }

    let assistant = match config.assistant.clone() {
        Some(assistant) => {
            info!("assistant model: {}", assistant.model);
            Assistant::new(Box::new(ChatClient::new(assistant)?))
        }
        None => Assistant::disabled(),
    };

    let listen_address = config.listen_address;
    let db = Data::new(db);
    let config = Data::new(config);
    let assistant = Data::new(assistant);

    info!("listening on {}", listen_address);
    HttpServer::new(move || {
        App::new()
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(assistant.clone())
            .wrap(TracingLogger::default())
            .configure(configure)
            .default_service(web::to(not_found))
    })
    .bind(listen_address)?
    .run()
    .await?;

    Ok(())
}
