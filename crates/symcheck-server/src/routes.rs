//! HTTP routes.
//!
//! `/api/*` are the current JSON endpoints; `/predict` and `/symptoms` keep
//! the older response shapes for existing clients.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde_json::{Value, json};
use symcheck_ai::PredictError;
use symcheck_core::{
    ErrorDetail, HealthResponse, LegacyPredictResponse, LegacySymptomsResponse, SymptomRequest,
    SymptomResponse, SymptomsListResponse,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::state::AppState;

const MODEL_NOT_LOADED: &str = "Model not loaded";

/// Build the service router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api/symptoms", get(list_symptoms))
        .route("/api/check-symptoms", post(check_symptoms))
        .route("/predict", post(legacy_predict))
        .route("/symptoms", get(legacy_symptoms))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": format!(
            "Welcome to the {}. POST a list of symptoms to /api/check-symptoms.",
            state.service
        )
    }))
}

/// Always 200; degraded state is reported in the body.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.health())
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let code = if state.predictor().is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(state.health()))
}

async fn list_symptoms(State(state): State<AppState>) -> Json<SymptomsListResponse> {
    Json(symptom_listing(&state))
}

async fn check_symptoms(
    State(state): State<AppState>,
    Json(request): Json<SymptomRequest>,
) -> Json<SymptomResponse> {
    Json(check(&state, request.symptoms).await)
}

async fn legacy_predict(
    State(state): State<AppState>,
    Json(request): Json<SymptomRequest>,
) -> Result<Json<LegacyPredictResponse>, (StatusCode, Json<ErrorDetail>)> {
    let response = check(&state, request.symptoms).await;
    if response.success {
        Ok(Json(LegacyPredictResponse::from(&response)))
    } else {
        Err(detail(StatusCode::BAD_REQUEST, response.error))
    }
}

async fn legacy_symptoms(
    State(state): State<AppState>,
) -> Result<Json<LegacySymptomsResponse>, (StatusCode, Json<ErrorDetail>)> {
    let listing = symptom_listing(&state);
    if listing.success {
        Ok(Json(LegacySymptomsResponse {
            symptoms: listing.symptoms,
        }))
    } else {
        Err(detail(StatusCode::INTERNAL_SERVER_ERROR, listing.error))
    }
}

fn detail(code: StatusCode, message: Option<String>) -> (StatusCode, Json<ErrorDetail>) {
    let detail = message.unwrap_or_else(|| code.to_string());
    (code, Json(ErrorDetail { detail }))
}

fn symptom_listing(state: &AppState) -> SymptomsListResponse {
    match state.predictor() {
        Some(p) => SymptomsListResponse::ok(p.symptoms().iter().map(str::to_string).collect()),
        None => SymptomsListResponse::failure(format!("{MODEL_NOT_LOADED} properly")),
    }
}

/// Run one prediction off the async reactor.
async fn check(state: &AppState, symptoms: Vec<String>) -> SymptomResponse {
    if symptoms.is_empty() {
        return SymptomResponse::failure(PredictError::EmptyInput.to_string());
    }
    let Some(predictor) = state.predictor().cloned() else {
        return SymptomResponse::failure(MODEL_NOT_LOADED);
    };

    match tokio::task::spawn_blocking(move || predictor.respond(symptoms)).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "prediction task did not complete");
            SymptomResponse::failure(format!("Prediction error: {e}"))
        }
    }
}
