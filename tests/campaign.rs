#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use serde_json::{json, Value};

use common::{authorized, campaign_body, database};

#[actix_web::test]
async fn requests_without_session_are_rejected() {
    let db = database().await;
    let app = console!(db);

    let req = TestRequest::get().uri("/campaigns").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E4011000");
}

#[actix_web::test]
async fn unknown_paths_use_the_error_format() {
    let db = database().await;
    let app = console!(db);

    let req = authorized(TestRequest::get().uri("/nowhere")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E4041000");
}

#[actix_web::test]
async fn create_and_fetch_campaign() {
    let db = database().await;
    let app = console!(db);

    let req = authorized(TestRequest::post().uri("/campaigns"))
        .set_json(campaign_body("Tumbler Week", "ZERO_WASTE"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(created["status"], "ACTIVE");
    assert_eq!(created["mission_count"], 2);
    assert_eq!(created["missions"][1]["order"], 2);

    let uri = format!("/campaigns/{}", created["id"].as_str().unwrap());
    let req = authorized(TestRequest::get().uri(&uri)).to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["title"], "Tumbler Week");
    assert_eq!(fetched["missions"].as_array().unwrap().len(), 2);

    let req = authorized(TestRequest::get().uri("/campaigns?status=EXPIRED")).to_request();
    let expired: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(expired.as_array().unwrap().len(), 0);

    let req = authorized(TestRequest::put().uri(&uri))
        .set_json(json!({ "title": "Tumbler Month" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["title"], "Tumbler Month");
    assert_eq!(updated["region"], "Seoul");
}

#[actix_web::test]
async fn invalid_campaigns_are_rejected() {
    let db = database().await;
    let app = console!(db);

    let mut body = campaign_body("Backwards", "FOOD");
    body["end_date"] = json!("2000-01-01");
    let req = authorized(TestRequest::post().uri("/campaigns"))
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = authorized(TestRequest::post().uri("/campaigns"))
        .insert_header(("content-type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E4001000");
}

#[actix_web::test]
async fn missions_can_be_added_and_removed() {
    let db = database().await;
    let app = console!(db);

    let req = authorized(TestRequest::post().uri("/campaigns"))
        .set_json(campaign_body("Tumbler Week", "ZERO_WASTE"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let missions_uri = format!("/campaigns/{}/missions", created["id"].as_str().unwrap());

    let req = authorized(TestRequest::post().uri(&missions_uri))
        .set_json(json!({
            "title": "Quiz time",
            "verification_type": "QUIZ",
            "reward_points": 3,
            "quiz": { "question": "Paper or plastic?", "options": ["paper", "plastic"], "answer_index": 0 },
        }))
        .to_request();
    let added: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(added["order"], 3);

    let uri = format!("{}/{}", missions_uri, added["id"].as_str().unwrap());
    let req = authorized(TestRequest::delete().uri(&uri)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = authorized(TestRequest::get().uri(&missions_uri)).to_request();
    let missions: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(missions.as_array().unwrap().len(), 2);
}
