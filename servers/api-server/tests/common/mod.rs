//! Common test utilities for integration tests.
//!
//! Provides a test application builder backed by the in-memory fleet and
//! plan repositories (`db::memory`), JWT-minting helpers for each caller
//! role, and thin request/response wrappers.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use db::memory::{InMemoryPlanRepository, InMemoryTrainRepository};
use domain::Train;
use jsonwebtoken::{encode, EncodingKey, Header};
use optimizer_client::OptimizerClient;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tower::ServiceExt;

// Each test binary declares `mod common;` at its crate root, which shadows
// the extern prelude entry for the `common` crate dependency. Reach it with
// a leading `::` to name the dependency unambiguously, and re-export `Role`
// so call sites can keep writing `common::Role` against this module.
pub use ::common::Role;

pub const TEST_JWT_SECRET: &str = "test-secret-key-that-is-at-least-32-characters-long";

/// Test application wrapper around the real axum router, with direct
/// handles to the in-memory repositories so tests can seed fleet state
/// and assert on persisted plans without going through HTTP.
pub struct TestApp {
    pub router: Router,
    pub trains: InMemoryTrainRepository,
    pub plans: InMemoryPlanRepository,
}

impl TestApp {
    /// Build a test application seeded with `trains` and no optimizer
    /// endpoint configured (every request exercises the local fallback
    /// path unless a test overrides `EXTERNAL_OPTIMIZER_URL`).
    pub fn new(trains: Vec<Train>) -> Self {
        std::env::set_var("JWT_SECRET", TEST_JWT_SECRET);

        let train_repo = InMemoryTrainRepository::new(trains);
        let plan_repo = InMemoryPlanRepository::new();

        let state = api_server::state::AppState::new(
            Arc::new(train_repo.clone()) as Arc<dyn db::TrainRepository>,
            Arc::new(plan_repo.clone()) as Arc<dyn db::PlanRepository>,
            OptimizerClient::with_config(optimizer_client::OptimizerConfig {
                base_url: None,
                timeout_ms: 1_000,
            }),
        );

        Self {
            router: api_server::create_router(state),
            trains: train_repo,
            plans: plan_repo,
        }
    }

    pub async fn execute(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("request failed");
        TestResponse::from_response(response).await
    }

    pub fn get(&self, uri: &str) -> RequestBuilder {
        RequestBuilder::new(Method::GET, uri)
    }

    pub fn post(&self, uri: &str) -> RequestBuilder {
        RequestBuilder::new(Method::POST, uri)
    }
}

/// Mint a bearer token for `role`, signed with the test JWT secret.
pub fn token_for(role: Role) -> String {
    #[derive(serde::Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
        name: String,
        role: Role,
    }

    let claims = Claims {
        sub: "test-caller".to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp(),
        name: "Test Caller".to_string(),
        role,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()))
        .expect("failed to mint test token")
}

pub struct RequestBuilder {
    method: Method,
    uri: String,
    body: Option<Value>,
    auth_token: Option<String>,
}

impl RequestBuilder {
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            body: None,
            auth_token: None,
        }
    }

    pub fn json<T: Serialize>(mut self, body: T) -> Self {
        self.body = Some(serde_json::to_value(body).expect("failed to serialize body"));
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    pub fn as_role(self, role: Role) -> Self {
        self.bearer(&token_for(role))
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(&self.uri);

        if self.body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        if let Some(token) = &self.auth_token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let body = match self.body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };

        builder.body(body).expect("failed to build request")
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub async fn from_response(response: axum::response::Response) -> Self {
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body")
            .to_vec();
        Self { status, body }
    }

    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!("failed to parse JSON response: {e}; body was {}", self.text())
        })
    }

    pub fn json_value(&self) -> Value {
        self.json()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(self.status, expected, "unexpected status; body was {}", self.text());
        self
    }
}

/// Builders for the `Train` fixtures used across the end-to-end test
/// scenarios (an "everything green" train that tests override per field).
pub mod fixtures {
    use chrono::{DateTime, Duration, Utc};
    use domain::model::{
        Branding, Cleaning, CleaningState, Fitness, Maintenance, MaintenanceState, Operational, Train,
    };
    use uuid::Uuid;

    /// A healthy, fully service-ready trainset with no branding obligation.
    pub fn healthy_train(code: &str, mileage: i64, now: DateTime<Utc>) -> Train {
        Train {
            id: Uuid::new_v4(),
            code: code.to_string(),
            fitness: Fitness {
                valid: true,
                expiry: now + Duration::days(30),
                last_inspection: Some(now - Duration::days(5)),
            },
            maintenance: Maintenance {
                status: MaintenanceState::Operational,
                last_maintenance: now - Duration::days(10),
                next_maintenance_due: now + Duration::days(30),
            },
            cleaning: Cleaning {
                status: CleaningState::Clean,
            },
            operational: Operational {
                current_mileage: mileage,
                current_location: "Muttom Depot".to_string(),
                available_for_service: true,
                total_operational_hours: 1_000.0,
            },
            branding: Branding {
                has_branding: false,
                campaign: String::new(),
                priority: 1,
            },
            performance_score: 0.0,
            reliability_score: 0.0,
        }
    }

    pub fn branded_train(code: &str, mileage: i64, priority: u8, now: DateTime<Utc>) -> Train {
        let mut t = healthy_train(code, mileage, now);
        t.branding.has_branding = true;
        t.branding.campaign = "Metro Ads".to_string();
        t.branding.priority = priority;
        t
    }

    /// Scenario 1: `TS-01`/`TS-02`/`TS-03` with `TS-03` winning
    /// on branding priority despite `TS-01` also carrying a campaign.
    pub fn optimal_fleet(now: DateTime<Utc>) -> Vec<Train> {
        vec![
            branded_train("TS-01", 5000, 3, now),
            healthy_train("TS-02", 5200, now),
            branded_train("TS-03", 4800, 5, now),
        ]
    }
}
