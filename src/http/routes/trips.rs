use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{EngineError, GatewayError};
use crate::models::offer::FlightOffer;
use crate::models::session::WorkflowStep;
use crate::services::session;
use crate::state::AppState;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .route("/v1/trips/{trip_id}/offers", get(handle_offers))
        .route("/v1/trips/{trip_id}/workflow", get(handle_workflow))
        .route("/v1/trips/{trip_id}/selection", post(handle_selection))
        .route("/v1/trips/{trip_id}/milestones", post(handle_milestone))
        .route("/v1/trips/{trip_id}/reset", post(handle_reset))
        .with_state(app_state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OffersResponse {
    offers: Vec<FlightOffer>,
    total_quotes: usize,
    quotes_received: i32,
    quotes_expected: i32,
    current_step: String,
    deep_link: Option<String>,
    warnings: Vec<String>,
}

/// One resolution pass: fetch the trip, resolve every priced lift,
/// commit the session. Partial operator data is a 200 with warnings,
/// never an error.
async fn handle_offers(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<OffersResponse>, Response> {
    let outcome = session::poll_trip(&state, &trip_id)
        .await
        .map_err(error_response)?;

    Ok(Json(OffersResponse {
        total_quotes: outcome.total_quotes,
        quotes_received: outcome.session.quotes_received,
        quotes_expected: outcome.session.quotes_expected,
        current_step: outcome.session.current_step.clone(),
        deep_link: outcome.session.deep_link.clone(),
        offers: outcome.offers,
        warnings: outcome.warnings,
    }))
}

async fn handle_workflow(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<impl IntoResponse, Response> {
    let session = session::workflow_state(&state, &trip_id)
        .await
        .map_err(error_response)?;
    Ok(Json(session))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectionRequest {
    quote_id: String,
}

async fn handle_selection(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Json(req): Json<SelectionRequest>,
) -> Result<impl IntoResponse, Response> {
    let session = session::record_selection(&state, &trip_id, &req.quote_id)
        .await
        .map_err(error_response)?;
    Ok(Json(session))
}

#[derive(Deserialize)]
struct MilestoneRequest {
    milestone: String,
}

async fn handle_milestone(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Json(req): Json<MilestoneRequest>,
) -> Result<impl IntoResponse, Response> {
    let session =
        session::record_milestone(&state, &trip_id, WorkflowStep::parse(&req.milestone))
            .await
            .map_err(error_response)?;
    Ok(Json(session))
}

async fn handle_reset(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<impl IntoResponse, Response> {
    let session = session::reset(&state, &trip_id)
        .await
        .map_err(error_response)?;
    Ok(Json(session))
}

fn error_response(e: EngineError) -> Response {
    let (status, message) = match &e {
        EngineError::Gateway(GatewayError::Auth { .. }) => (
            StatusCode::BAD_GATEWAY,
            "Marketplace authentication failed".to_string(),
        ),
        EngineError::Gateway(GatewayError::NotFound { .. }) => (StatusCode::NOT_FOUND, e.to_string()),
        EngineError::Gateway(GatewayError::Unavailable { .. }) => {
            (StatusCode::BAD_GATEWAY, e.to_string())
        }
        EngineError::UnknownTrip(_) | EngineError::UnknownQuote(_) => {
            (StatusCode::NOT_FOUND, e.to_string())
        }
        EngineError::InvalidRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        EngineError::Db(_) => {
            error!("❌ Database error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
        }
    };

    (status, Json(ErrorResponse { error: message })).into_response()
}
