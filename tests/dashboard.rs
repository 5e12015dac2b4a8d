#[macro_use]
mod common;

use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use serde_json::{json, Value};

use campaign_console::campaign::CampaignId;
use campaign_console::mission::MissionId;
use campaign_console::mission_log::MissionLogStatus;

use common::{add_log, add_profile, authorized, campaign_body, database, id};

#[actix_web::test]
async fn dashboard_counts_participants_across_campaigns() {
    let db = database().await;
    let app = console!(db);

    let mut campaigns = vec![];
    for (title, category) in [("Bike Week", "TRANSPORTATION"), ("Tumbler Week", "ZERO_WASTE")] {
        let req = authorized(TestRequest::post().uri("/campaigns"))
            .set_json(campaign_body(title, category))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let campaign_id: CampaignId = id(&created["id"]);
        let mission: MissionId = id(&created["missions"][0]["id"]);
        campaigns.push((campaign_id, mission));
    }

    let user = add_profile(&db, "willow").await;
    for (campaign_id, mission) in &campaigns {
        add_log(&db, *campaign_id, *mission, user, MissionLogStatus::Completed).await;
    }

    let req = authorized(TestRequest::get().uri("/dashboard/overview")).to_request();
    let overview: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(overview["total_campaigns"], 2);
    assert_eq!(overview["participants"], 1);
    assert_eq!(overview["completed_logs"], 2);
    assert_eq!(overview["completion_rate"], 100);
    assert_eq!(overview["co2_kg"], json!(2.9));

    let req = authorized(TestRequest::get().uri("/dashboard/co2")).to_request();
    let co2: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(co2["categories"].as_array().unwrap().len(), 8);
    assert_eq!(co2["total_co2_kg"], json!(2.9));

    let req = authorized(TestRequest::get().uri("/dashboard/chart")).to_request();
    let chart: Value = test::call_and_read_body_json(&app, req).await;
    let chart = chart.as_array().unwrap();
    assert_eq!(chart.len(), 7);
    let completed: u64 = chart
        .iter()
        .map(|point| point["missions_completed"].as_u64().unwrap())
        .sum();
    assert_eq!(completed, 2);

    let req = authorized(TestRequest::get().uri("/dashboard/chart?days=91")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_meta"]["name"], "days");

    let uri = format!("/campaigns/{}/analytics", campaigns[0].0);
    let req = authorized(TestRequest::get().uri(&uri)).to_request();
    let analytics: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(analytics["participants"], 1);
    assert_eq!(analytics["completers"], 0);
    assert_eq!(analytics["missions"][0]["completion_rate"], 100);
}

#[actix_web::test]
async fn reports_download_as_attachments() {
    let db = database().await;
    let app = console!(db);

    let req = authorized(TestRequest::post().uri("/campaigns"))
        .set_json(campaign_body("Tumbler Week", "ZERO_WASTE"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let campaign_id: CampaignId = id(&created["id"]);

    let uri = format!("/campaigns/{}/report?format=csv", campaign_id);
    let req = authorized(TestRequest::get().uri(&uri)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/csv"));
    let disposition = resp.headers().get(CONTENT_DISPOSITION).unwrap();
    let disposition = disposition.to_str().unwrap().to_owned();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains(".csv"));
    let body = test::read_body(resp).await;
    assert!(body.starts_with(b"\xEF\xBB\xBF"));

    for (format, magic) in [("pdf", &b"%PDF"[..]), ("docx", &b"PK"[..])] {
        let uri = format!("/dashboard/report?format={}", format);
        let req = authorized(TestRequest::get().uri(&uri)).to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert!(body.starts_with(magic), "{}", format);
    }

    let uri = format!("/campaigns/{}/report?format=xlsx", campaign_id);
    let req = authorized(TestRequest::get().uri(&uri)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E4001007");
}

#[actix_web::test]
async fn assistant_reports_when_unconfigured() {
    let db = database().await;
    let app = console!(db);

    let req = authorized(TestRequest::post().uri("/assistant/description"))
        .set_json(json!({ "prompt": "A week of reusable cups" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E5031000");
}
