// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    analyze_file_handler, analyze_handler, face_shape_file_handler, face_shape_handler,
    health_handler, metrics_handler, not_found_handler,
};
use super::middleware::{json_method_not_allowed, request_id_layers};
use crate::config::AppConfig;
use crate::error::Result;
use crate::upstream::AnalysisClient;
use axum::{
    extract::DefaultBodyLimit,
    middleware::map_response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub client: Arc<AnalysisClient>,
}

pub fn create_router(config: AppConfig, client: AnalysisClient) -> Result<Router> {
    let body_limit = config.server.max_body_bytes;
    let state = AppState {
        config,
        client: Arc::new(client),
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/analyze/file", post(analyze_file_handler))
        .route("/api/face-shape", post(face_shape_handler))
        .route("/api/face-shape/file", post(face_shape_file_handler))
        .fallback(not_found_handler)
        .layer(map_response(json_method_not_allowed))
        // Base64 bodies and photo uploads both exceed axum's 2MB default
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
