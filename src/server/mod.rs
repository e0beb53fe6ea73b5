//! Axum-based HTTP surface of the dongju gateway.
//!
//! Exposes the four analysis routes (personal color and face shape, each as
//! JSON and as multipart upload), delegates them to the upstream client, and
//! localizes structured results before they reach the web client.
//!
//! # Components
//!
//! - `handlers`: Route handlers, request shape validation and response shaping.
//! - `middleware`: Request ID tracking layers.
//! - `routes`: The router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::{AnalyzeParams, FileParams, HealthResponse};
pub use routes::{create_router, AppState};
