// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::middleware::attach_trace_id;
use super::routes::AppState;
use crate::error::{GatewayError, Result};
use crate::localization::localize;
use crate::metrics;
use crate::models::{trace_id_of, AnalyzeRequest, PassthroughResult, StructuredResult, UpstreamResult};
use crate::upstream::{FileOptions, RelayHeaders};
use crate::utils::logging::redact_image_payload;
use crate::vision::ImageUpload;
use axum::{
    body::Bytes,
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::{BytesRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub upstream_base_url: String,
    pub timestamp: String,
}

/// Query string of the JSON routes.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeParams {
    #[serde(default)]
    pub debug: bool,
}

/// Query string of the multipart routes.
#[derive(Debug, Deserialize)]
pub struct FileParams {
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_true")]
    pub exif_correction: bool,
}

fn default_true() -> bool {
    true
}

impl From<FileParams> for FileOptions {
    fn from(params: FileParams) -> Self {
        FileOptions {
            debug: params.debug,
            exif_correction: params.exif_correction,
        }
    }
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        upstream_base_url: state.config.upstream.base_url.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

/// Fallback for paths no route matches.
pub async fn not_found_handler(method: Method, uri: Uri) -> GatewayError {
    GatewayError::NotFound(format!("no route for {} {}", method, uri.path()))
}

/// Handler for POST /api/analyze
pub async fn analyze_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<AnalyzeParams>, QueryRejection>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let started = Instant::now();
    let result = structured_route(&state, Route::Analyze, query, &headers, body).await;
    finish(Route::Analyze, started, result)
}

/// Handler for POST /api/face-shape
pub async fn face_shape_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<AnalyzeParams>, QueryRejection>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let started = Instant::now();
    let result = structured_route(&state, Route::FaceShape, query, &headers, body).await;
    finish(Route::FaceShape, started, result)
}

/// Handler for POST /api/analyze/file
pub async fn analyze_file_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<FileParams>, QueryRejection>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let started = Instant::now();
    let result = analyze_file_route(&state, query, &headers, multipart).await;
    finish(Route::AnalyzeFile, started, result)
}

/// Handler for POST /api/face-shape/file
pub async fn face_shape_file_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<FileParams>, QueryRejection>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let started = Instant::now();
    let result = face_shape_file_route(&state, query, &headers, multipart).await;
    finish(Route::FaceShapeFile, started, result)
}

#[derive(Debug, Clone, Copy)]
enum Route {
    Analyze,
    AnalyzeFile,
    FaceShape,
    FaceShapeFile,
}

impl Route {
    fn path(&self) -> &'static str {
        match self {
            Route::Analyze => "/api/analyze",
            Route::AnalyzeFile => "/api/analyze/file",
            Route::FaceShape => "/api/face-shape",
            Route::FaceShapeFile => "/api/face-shape/file",
        }
    }
}

/// Shared body of the two JSON routes.
async fn structured_route(
    state: &AppState,
    route: Route,
    query: std::result::Result<Query<AnalyzeParams>, QueryRejection>,
    headers: &HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Response> {
    let Query(params) = query.map_err(|e| GatewayError::Validation(e.body_text()))?;
    let body = body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            GatewayError::PayloadTooLarge(e.body_text())
        } else {
            GatewayError::Validation(e.body_text())
        }
    })?;
    let body = std::str::from_utf8(&body)
        .map_err(|e| GatewayError::Validation(format!("request body is not UTF-8: {}", e)))?;

    debug!("Raw request JSON (first 500 chars): {}",
        redact_image_payload(body).chars().take(500).collect::<String>());

    let request = AnalyzeRequest::parse(body)?;
    let inbound = RelayHeaders::from_headers(headers);
    let relay = RelayHeaders::new(
        inbound.trace_id.or_else(|| request.trace_id().map(str::to_string)),
        inbound.accept_language,
    );

    info!(
        "Received {} request: debug={}, trace_id={:?}",
        route.path(),
        params.debug,
        relay.trace_id
    );

    let result = match route {
        Route::FaceShape => state.client.face_shape_structured(&request, params.debug, &relay).await?,
        _ => state.client.analyze_structured(&request, params.debug, &relay).await?,
    };

    Ok(structured_response(result, &relay))
}

async fn analyze_file_route(
    state: &AppState,
    query: std::result::Result<Query<FileParams>, QueryRejection>,
    headers: &HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let options = file_options(query)?;
    let upload = read_upload(multipart).await?;
    let relay = RelayHeaders::from_headers(headers);

    info!(
        "Received personal color upload: {:?} ({} bytes)",
        upload.filename,
        upload.bytes.len()
    );

    // Passthrough results are already serialized and skip localization
    match state.client.analyze_file(upload, options, &relay).await? {
        UpstreamResult::Structured(result) => Ok(structured_response(result, &relay)),
        UpstreamResult::Passthrough(result) => Ok(passthrough_response(result, &relay)),
    }
}

async fn face_shape_file_route(
    state: &AppState,
    query: std::result::Result<Query<FileParams>, QueryRejection>,
    headers: &HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let options = file_options(query)?;
    let upload = read_upload(multipart).await?;
    let relay = RelayHeaders::from_headers(headers);

    info!(
        "Received face shape upload: {:?} ({} bytes)",
        upload.filename,
        upload.bytes.len()
    );

    let result = state.client.face_shape_file(upload, options, &relay).await?;
    Ok(structured_response(result, &relay))
}

fn file_options(query: std::result::Result<Query<FileParams>, QueryRejection>) -> Result<FileOptions> {
    query
        .map(|Query(params)| params.into())
        .map_err(|e| GatewayError::Validation(e.body_text()))
}

/// Pull the `file` part out of a multipart body.
async fn read_upload(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<ImageUpload> {
    let mut multipart = multipart.map_err(|e| GatewayError::Validation(e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let upload = ImageUpload::new(bytes, filename, content_type);
        if upload.is_empty() {
            return Err(GatewayError::InvalidImage("uploaded file is empty".to_string()));
        }
        return Ok(upload);
    }

    Err(GatewayError::InvalidImage("missing multipart field 'file'".to_string()))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> GatewayError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge(e.body_text())
    } else {
        GatewayError::Validation(format!("Multipart error: {}", e.body_text()))
    }
}

/// Localize a structured result and echo its correlation id.
fn structured_response(result: StructuredResult, relay: &RelayHeaders) -> Response {
    let localized = localize(result.payload, relay.accept_language.as_deref());
    let trace_id = trace_id_of(&localized)
        .map(str::to_string)
        .or_else(|| relay.trace_id.clone());

    let mut response = (result.status, Json(localized)).into_response();
    attach_trace_id(&mut response, trace_id.as_deref());
    response
}

/// Relay the upstream status and body untouched.
fn passthrough_response(result: PassthroughResult, relay: &RelayHeaders) -> Response {
    let mut response = (
        result.status,
        [(header::CONTENT_TYPE, "application/json")],
        result.body,
    )
        .into_response();
    attach_trace_id(&mut response, relay.trace_id.as_deref());
    response
}

/// Record route metrics and render errors as JSON.
fn finish(route: Route, started: Instant, result: Result<Response>) -> Response {
    let response = result.unwrap_or_else(IntoResponse::into_response);
    metrics::record_request(
        route.path(),
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}
