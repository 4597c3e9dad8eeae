//! `Latest`, `History`, and `Explain` endpoint integration tests.

mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::{fixtures, Role, TestApp};
use serde_json::{json, Value};

async fn generate(app: &TestApp) -> Value {
    let request = common::RequestBuilder::new(Method::POST, "/api/induction/generate")
        .as_role(Role::Supervisor)
        .json(json!({}))
        .build();
    app.execute(request).await.json_value()
}

#[tokio::test]
async fn latest_returns_404_when_no_plan_exists() {
    let app = TestApp::new(fixtures::optimal_fleet(Utc::now()));
    let request = common::RequestBuilder::new(Method::GET, "/api/induction/latest")
        .as_role(Role::Reader)
        .build();

    let response = app.execute(request).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn latest_returns_the_most_recently_generated_plan() {
    let app = TestApp::new(fixtures::optimal_fleet(Utc::now()));
    let generated = generate(&app).await;

    let request = common::RequestBuilder::new(Method::GET, "/api/induction/latest")
        .as_role(Role::Reader)
        .build();
    let response = app.execute(request).await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json_value();
    assert_eq!(body["plan"]["id"], generated["plan"]["id"]);
    assert!(body["topTrains"].as_array().unwrap().len() <= 5);
    assert!(body["summary"]["totalTrains"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn history_is_newest_first_and_paginated() {
    let app = TestApp::new(fixtures::optimal_fleet(Utc::now()));
    generate(&app).await;
    let second = common::RequestBuilder::new(Method::POST, "/api/induction/generate")
        .as_role(Role::Supervisor)
        .json(json!({ "forceRegenerate": true }))
        .build();
    let second_body: Value = app.execute(second).await.json_value();

    let request = common::RequestBuilder::new(Method::GET, "/api/induction/history?limit=1&page=1")
        .as_role(Role::Reader)
        .build();
    let response = app.execute(request).await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json_value();
    let plans = body["plans"].as_array().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0]["id"], second_body["plan"]["id"]);
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn explain_returns_404_for_unknown_plan_id() {
    let app = TestApp::new(fixtures::optimal_fleet(Utc::now()));
    let request = common::RequestBuilder::new(
        Method::GET,
        &format!("/api/induction/explain/{}", uuid::Uuid::new_v4()),
    )
    .as_role(Role::Reader)
    .build();

    let response = app.execute(request).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn explain_returns_reasoning_and_detailed_analysis_per_entry() {
    let app = TestApp::new(fixtures::optimal_fleet(Utc::now()));
    let generated = generate(&app).await;
    let plan_id = generated["plan"]["id"].as_str().unwrap();

    let request = common::RequestBuilder::new(Method::GET, &format!("/api/induction/explain/{plan_id}"))
        .as_role(Role::Reader)
        .build();
    let response = app.execute(request).await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json_value();
    let explanations = body["explanations"].as_array().unwrap();
    assert_eq!(explanations.len(), 3);
    for entry in explanations {
        assert!(!entry["reasoning"].as_str().unwrap().is_empty());
        assert!(entry["detailedAnalysis"].is_object());
    }
}
