//! Induction plan routes: generate, latest, history, explain, simulate.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use common::{AppError, PageQuery};
use uuid::Uuid;

use crate::plan_service::{self, GenerateOutcome};
use crate::state::AppState;
use api_core::AuthCaller;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate))
        .route("/latest", get(latest))
        .route("/history", get(history))
        .route("/explain/{plan_id}", get(explain))
        .route("/simulate", post(simulate))
}

/// Generate a finalized induction plan for a plan date.
#[utoipa::path(
    post,
    path = "/api/induction/generate",
    request_body = plan_service::GenerateRequest,
    responses(
        (status = 201, description = "Plan generated", body = plan_service::GenerateResponse),
        (status = 400, description = "Empty fleet"),
        (status = 403, description = "Caller lacks supervisor-or-higher role"),
        (status = 409, description = "A finalized plan already exists for this date", body = plan_service::ConflictResponse),
    ),
    tag = "Induction",
    security(("bearer_auth" = []))
)]
pub async fn generate(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    Json(req): Json<plan_service::GenerateRequest>,
) -> Result<axum::response::Response, AppError> {
    caller.role.can_generate().then_some(()).ok_or_else(|| {
        AppError::Forbidden(format!("role {} lacks permission for this operation", caller.role))
    })?;

    match plan_service::generate(&state, &caller, req).await? {
        GenerateOutcome::Created(resp) => Ok((StatusCode::CREATED, Json(resp)).into_response()),
        GenerateOutcome::Conflict(resp) => Ok((StatusCode::CONFLICT, Json(resp)).into_response()),
    }
}

/// The most recently generated finalized plan.
#[utoipa::path(
    get,
    path = "/api/induction/latest",
    responses(
        (status = 200, description = "Latest finalized plan", body = plan_service::LatestResponse),
        (status = 404, description = "No plan has been generated yet"),
    ),
    tag = "Induction",
    security(("bearer_auth" = []))
)]
pub async fn latest(
    State(state): State<AppState>,
    AuthCaller(_caller): AuthCaller,
) -> Result<Json<plan_service::LatestResponse>, AppError> {
    Ok(Json(plan_service::latest(&state).await?))
}

/// Paginated, newest-first plan history.
#[utoipa::path(
    get,
    path = "/api/induction/history",
    params(PageQuery),
    responses(
        (status = 200, description = "Plan history", body = plan_service::HistoryResponse),
    ),
    tag = "Induction",
    security(("bearer_auth" = []))
)]
pub async fn history(
    State(state): State<AppState>,
    AuthCaller(_caller): AuthCaller,
    Query(page_query): Query<PageQuery>,
) -> Result<Json<plan_service::HistoryResponse>, AppError> {
    Ok(Json(plan_service::history(&state, page_query).await?))
}

/// Full plan with per-entry reasoning and derived detail.
#[utoipa::path(
    get,
    path = "/api/induction/explain/{plan_id}",
    params(("plan_id" = Uuid, Path, description = "Plan id")),
    responses(
        (status = 200, description = "Plan explanation", body = plan_service::ExplainResponse),
        (status = 404, description = "No plan found with this id"),
    ),
    tag = "Induction",
    security(("bearer_auth" = []))
)]
pub async fn explain(
    State(state): State<AppState>,
    AuthCaller(_caller): AuthCaller,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<plan_service::ExplainResponse>, AppError> {
    Ok(Json(plan_service::explain(&state, plan_id).await?))
}

/// Run a what-if simulation without persisting the result.
#[utoipa::path(
    post,
    path = "/api/induction/simulate",
    request_body = plan_service::SimulateRequest,
    responses(
        (status = 200, description = "Simulation result", body = plan_service::SimulateResponse),
        (status = 400, description = "Missing required fields"),
        (status = 403, description = "Caller lacks supervisor-or-higher role"),
        (status = 404, description = "Target train not found"),
    ),
    tag = "Induction",
    security(("bearer_auth" = []))
)]
pub async fn simulate(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    Json(req): Json<plan_service::SimulateRequest>,
) -> Result<Json<plan_service::SimulateResponse>, AppError> {
    caller.role.can_generate().then_some(()).ok_or_else(|| {
        AppError::Forbidden(format!("role {} lacks permission for this operation", caller.role))
    })?;

    if req.train_id.trim().is_empty() {
        return Err(AppError::BadRequest("trainId is required".to_string()));
    }

    Ok(Json(plan_service::simulate(&state, req).await?))
}
