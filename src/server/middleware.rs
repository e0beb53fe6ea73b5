// HTTP middleware and response header helpers
// Author: kelexine (https://github.com/kelexine)

use crate::error::GatewayError;
use crate::upstream::TRACE_ID_HEADER;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// `x-request-id` layers; independent of the client-facing `X-Trace-Id`.
pub fn request_id_layers() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::x_request_id(MakeRequestUuid),
        PropagateRequestIdLayer::x_request_id(),
    )
}

/// Echo a correlation id as `X-Trace-Id`. Values that are not valid header
/// text are dropped.
pub fn attach_trace_id(response: &mut Response, trace_id: Option<&str>) {
    let value = trace_id
        .filter(|t| !t.trim().is_empty())
        .and_then(|t| HeaderValue::from_str(t).ok());
    if let Some(value) = value {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
}

/// Give the router's own 405 the JSON error shape. Relayed upstream
/// responses always carry a content type and are left alone.
pub async fn json_method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let message = match &allow {
        Some(allow) => format!("allowed: {}", allow.to_str().unwrap_or_default()),
        None => "method not supported on this route".to_string(),
    };

    let mut rewritten = GatewayError::MethodNotAllowed(message).into_response();
    if let Some(allow) = allow {
        rewritten.headers_mut().insert(header::ALLOW, allow);
    }
    rewritten
}
