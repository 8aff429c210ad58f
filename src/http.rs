//! Stateless HTTP API surface, built the way the pack's own
//! service crates wire up `axum`: a thin router over the engine, a trace
//! layer, and one `ApiError` mapping the error taxonomy to status codes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::model::{BatchResult, Datasheet, DecodedVds, FlatDatasheet};

pub fn router(engine: Engine) -> Router {
    Router::new()
        .route("/v1/decode/:vds", get(decode_handler))
        .route("/v1/validate/:vds", get(validate_handler))
        .route("/v1/datasheet/:vds", get(datasheet_handler))
        .route("/v1/batch", post(batch_handler))
        .route("/v1/metadata", get(metadata_handler))
        .route("/v1/vds", get(list_vds_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody { error: self.1 });
        (self.0, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::Input(_) => StatusCode::BAD_REQUEST,
            EngineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, err.to_string())
    }
}

const REQUEST_BUDGET: Duration = Duration::from_secs(5);

async fn decode_handler(State(engine): State<Engine>, Path(vds): Path<String>) -> Result<Json<DecodedVds>, ApiError> {
    let decoded = engine.decode(&vds)?;
    Ok(Json(decoded))
}

async fn validate_handler(
    State(engine): State<Engine>,
    Path(vds): Path<String>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let datasheet = engine
        .generate_with_deadline(&vds, Some(Instant::now() + REQUEST_BUDGET))?;
    Ok(Json(ValidateResponse {
        vds_no: datasheet.metadata.vds_no.clone(),
        validation_status: datasheet.metadata.validation_status,
        validation_errors: datasheet.metadata.validation_errors.clone(),
        warnings: datasheet.metadata.warnings.clone(),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateResponse {
    vds_no: String,
    validation_status: crate::model::ValidationStatus,
    validation_errors: Vec<String>,
    warnings: Vec<String>,
}

#[derive(Deserialize)]
struct DatasheetQuery {
    #[serde(default)]
    view: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum DatasheetResponse {
    Structured(Datasheet),
    Flat(FlatDatasheet),
}

async fn datasheet_handler(
    State(engine): State<Engine>,
    Path(vds): Path<String>,
    Query(query): Query<DatasheetQuery>,
) -> Result<Json<DatasheetResponse>, ApiError> {
    let datasheet = engine.generate_with_deadline(&vds, Some(Instant::now() + REQUEST_BUDGET))?;
    let response = match query.view.as_deref() {
        Some("flat") => DatasheetResponse::Flat(datasheet.flat_view()),
        _ => DatasheetResponse::Structured(datasheet),
    };
    Ok(Json(response))
}

#[derive(Deserialize)]
struct BatchRequest {
    vds: Vec<String>,
}

#[derive(Serialize)]
struct BatchResponse {
    results: Vec<BatchResult>,
}

async fn batch_handler(
    State(engine): State<Engine>,
    Json(request): Json<BatchRequest>,
) -> Json<BatchResponse> {
    let results = engine.generate_batch(&request.vds);
    Json(BatchResponse { results })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataResponse {
    valve_types: Vec<String>,
    piping_classes: Vec<String>,
    end_connections: Vec<String>,
    bore_types: Vec<String>,
    pressure_classes: Vec<String>,
}

async fn metadata_handler(State(engine): State<Engine>) -> Json<MetadataResponse> {
    let grammar = &engine.config().grammar;
    Json(MetadataResponse {
        valve_types: grammar.prefixes.values().map(|p| p.valve_type_name.clone()).collect(),
        piping_classes: engine.pms_repository().all_classes().into_iter().map(str::to_string).collect(),
        end_connections: grammar.end_connections.values().cloned().collect(),
        bore_types: grammar.bore_types.values().cloned().collect(),
        pressure_classes: engine
            .pms_repository()
            .all_pressure_ratings()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

#[derive(Deserialize)]
struct ListVdsQuery {
    valve_type: Option<String>,
    offset: Option<usize>,
    limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListVdsResponse {
    total: usize,
    vds: Vec<String>,
}

async fn list_vds_handler(
    State(engine): State<Engine>,
    Query(query): Query<ListVdsQuery>,
) -> Json<ListVdsResponse> {
    let prefix_filter = query.valve_type.clone();
    let all: Vec<&str> = engine.vds_index().all_vds_codes(|vds| match &prefix_filter {
        Some(prefix) => vds.starts_with(prefix.as_str()),
        None => true,
    });
    let total = all.len();
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(total);
    let page: Vec<String> = all.into_iter().skip(offset).take(limit).map(str::to_string).collect();
    Json(ListVdsResponse { total, vds: page })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    data_loaded: bool,
    vds_index_count: usize,
    piping_classes_count: usize,
}

async fn health_handler(State(engine): State<Engine>) -> Json<HealthResponse> {
    let vds_index_count = engine.vds_index().len();
    let piping_classes_count = engine.pms_repository().len();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        data_loaded: vds_index_count > 0 && piping_classes_count > 0,
        vds_index_count,
        piping_classes_count,
    })
}
