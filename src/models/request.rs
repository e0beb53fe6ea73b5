//! Analysis request accepted on the JSON transport.
//!
//! Clients send either the canonical snake_case spelling or legacy camelCase
//! keys. Legacy keys are folded onto the canonical ones in a single pass
//! before typed deserialization, so the outbound body only ever carries the
//! canonical spelling.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// (legacy, canonical) key pairs at the top level of the request.
const REQUEST_ALIASES: &[(&str, &str)] = &[("imageBase64", "image_base64")];

/// (legacy, canonical) key pairs inside `options`.
const OPTION_ALIASES: &[(&str, &str)] = &[
    ("trace_id", "traceId"),
    ("exifCorrection", "exif_correction"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64 encoded image, forwarded to the upstream as-is.
    #[serde(default)]
    pub image_base64: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<AnalyzeOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    #[serde(rename = "traceId", default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// EXIF orientation correction, on unless the client opts out.
    #[serde(default = "default_true")]
    pub exif_correction: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            trace_id: None,
            exif_correction: true,
            debug: None,
        }
    }
}

fn default_true() -> bool {
    true
}

impl AnalyzeRequest {
    pub fn new(image_base64: impl Into<String>) -> Self {
        Self {
            image_base64: image_base64.into(),
            options: None,
        }
    }

    /// Parse a raw JSON body, resolving legacy aliases, and validate it.
    pub fn parse(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| GatewayError::Validation(format!("malformed JSON body: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(GatewayError::Validation("request body must be a JSON object".to_string()));
        };

        resolve_aliases(&mut root, REQUEST_ALIASES);
        if let Some(Value::Object(options)) = root.get_mut("options") {
            resolve_aliases(options, OPTION_ALIASES);
        }

        let request: AnalyzeRequest = serde_json::from_value(Value::Object(root))
            .map_err(|e| GatewayError::Validation(format!("invalid request body: {}", e)))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.image_base64.trim().is_empty() {
            return Err(GatewayError::Validation("image_base64 must not be blank".to_string()));
        }
        Ok(())
    }

    /// Correlation id carried inside the body, if any.
    pub fn trace_id(&self) -> Option<&str> {
        self.options
            .as_ref()
            .and_then(|o| o.trace_id.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

/// Move legacy keys onto their canonical name. An explicit canonical key wins
/// over its legacy spelling.
fn resolve_aliases(map: &mut Map<String, Value>, aliases: &[(&str, &str)]) {
    for (legacy, canonical) in aliases {
        if let Some(value) = map.remove(*legacy) {
            map.entry(canonical.to_string()).or_insert(value);
        }
    }
}
