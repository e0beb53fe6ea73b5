// Upstream result variants
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use serde_json::{Map, Value};

/// Open response schema: string keys to arbitrary JSON values, insertion
/// order preserved so unknown upstream fields round-trip untouched.
pub type ResultMap = Map<String, Value>;

/// What a relay operation hands back to the endpoint.
///
/// The two variants are deliberately distinct: a structured result is
/// localized before it reaches the client, a passthrough result is relayed
/// byte-for-byte.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamResult {
    Structured(StructuredResult),
    Passthrough(PassthroughResult),
}

/// Decoded upstream body. `payload` is `None` when the upstream answered
/// with an empty body or JSON `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredResult {
    pub status: StatusCode,
    pub payload: Option<ResultMap>,
}

/// Upstream status and body captured verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughResult {
    pub status: StatusCode,
    pub body: String,
}

/// Correlation id reported by the upstream inside a result map.
pub fn trace_id_of(map: &ResultMap) -> Option<&str> {
    ["traceId", "trace_id"]
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .find(|t| !t.trim().is_empty())
}
