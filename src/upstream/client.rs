// Analysis service client
// Author: kelexine (https://github.com/kelexine)

use super::{Analysis, FileOptions, RelayHeaders, TRACE_ID_HEADER};
use crate::config::UpstreamConfig;
use crate::error::{GatewayError, Result};
use crate::metrics;
use crate::models::{AnalyzeRequest, PassthroughResult, ResultMap, StructuredResult, UpstreamResult};
use crate::vision::{self, ImageUpload};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Client for the upstream analysis service.
///
/// One pooled HTTP client is shared by every call; each operation is a
/// single request/response with no retry. Supports:
/// - Personal color and face shape analysis over JSON (inline base64)
/// - The same analyses over multipart upload, with HEIC/HEIF normalization
pub struct AnalysisClient {
    http_client: Client,
    config: UpstreamConfig,
}

impl AnalysisClient {
    /// Build the pooled client. The connect timeout applies to every call;
    /// response timeouts are set per transport.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| GatewayError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created upstream HTTP client for {}", config.base_url);

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    /// Get the upstream base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim().trim_end_matches('/'), path)
    }

    /// Personal color analysis, JSON transport.
    pub async fn analyze_structured(
        &self,
        request: &AnalyzeRequest,
        debug_mode: bool,
        headers: &RelayHeaders,
    ) -> Result<StructuredResult> {
        self.post_json(Analysis::PersonalColor, request, debug_mode, headers).await
    }

    /// Face shape analysis, JSON transport.
    pub async fn face_shape_structured(
        &self,
        request: &AnalyzeRequest,
        debug_mode: bool,
        headers: &RelayHeaders,
    ) -> Result<StructuredResult> {
        self.post_json(Analysis::FaceShape, request, debug_mode, headers).await
    }

    /// Personal color analysis, multipart transport.
    ///
    /// A 2xx JSON answer is decoded. Anything else (an upstream error status
    /// or a body that is not JSON) is handed back verbatim as a passthrough.
    pub async fn analyze_file(
        &self,
        upload: ImageUpload,
        options: FileOptions,
        headers: &RelayHeaders,
    ) -> Result<UpstreamResult> {
        let analysis = Analysis::PersonalColor;
        let part = prepare_part(analysis, upload).await?;

        let started = Instant::now();
        let (status, body) = match self.post_file(analysis, part, options, headers).await {
            Ok(sent) => sent,
            Err(e) => {
                metrics::record_upstream_call(analysis.name(), "error", started.elapsed().as_secs_f64());
                return Err(e);
            }
        };

        let result = if status.is_success() {
            match parse_payload(&body) {
                Ok(payload) => UpstreamResult::Structured(StructuredResult { status, payload }),
                Err(e) => {
                    warn!("Relaying undecodable {} body verbatim: {}", analysis.name(), e);
                    UpstreamResult::Passthrough(PassthroughResult { status, body })
                }
            }
        } else {
            warn!("Relaying upstream HTTP {} for {} verbatim", status, analysis.name());
            UpstreamResult::Passthrough(PassthroughResult { status, body })
        };

        let outcome = match result {
            UpstreamResult::Structured(_) => "structured",
            UpstreamResult::Passthrough(_) => "passthrough",
        };
        metrics::record_upstream_call(analysis.name(), outcome, started.elapsed().as_secs_f64());

        Ok(result)
    }

    /// Face shape analysis, multipart transport. The body is always decoded;
    /// an undecodable body is an error.
    pub async fn face_shape_file(
        &self,
        upload: ImageUpload,
        options: FileOptions,
        headers: &RelayHeaders,
    ) -> Result<StructuredResult> {
        let analysis = Analysis::FaceShape;
        let part = prepare_part(analysis, upload).await?;

        let started = Instant::now();
        let decoded = self
            .post_file(analysis, part, options, headers)
            .await
            .and_then(|(status, body)| decode_structured(status, &body));
        let outcome = if decoded.is_ok() { "structured" } else { "error" };
        metrics::record_upstream_call(analysis.name(), outcome, started.elapsed().as_secs_f64());
        decoded
    }

    async fn post_json(
        &self,
        analysis: Analysis,
        request: &AnalyzeRequest,
        debug_mode: bool,
        headers: &RelayHeaders,
    ) -> Result<StructuredResult> {
        let url = self.url(analysis.json_path());
        debug!("Calling {} (debug={})", url, debug_mode);

        let started = Instant::now();
        let builder = self
            .http_client
            .post(&url)
            .query(&[("debug", debug_mode)])
            .timeout(self.config.read_timeout())
            .json(request);

        let sent = self.send(with_relay_headers(builder, headers)).await;
        let decoded = sent.and_then(|(status, body)| decode_structured(status, &body));

        let outcome = if decoded.is_ok() { "structured" } else { "error" };
        metrics::record_upstream_call(analysis.name(), outcome, started.elapsed().as_secs_f64());
        decoded
    }

    /// Send a prepared file part; returns the raw status and body.
    async fn post_file(
        &self,
        analysis: Analysis,
        part: Part,
        options: FileOptions,
        headers: &RelayHeaders,
    ) -> Result<(StatusCode, String)> {
        let url = self.url(analysis.file_path());
        debug!(
            "Calling {} (debug={}, exif_correction={})",
            url, options.debug, options.exif_correction
        );

        let builder = self
            .http_client
            .post(&url)
            .query(&[("debug", options.debug), ("exif_correction", options.exif_correction)])
            .timeout(self.config.file_timeout())
            .multipart(Form::new().part("file", part));

        self.send(with_relay_headers(builder, headers)).await
    }

    async fn send(&self, builder: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = builder.send().await.map_err(|e| {
            warn!("Upstream call failed: {}", e);
            GatewayError::from_transport(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!("Failed to read upstream body: {}", e);
            GatewayError::from_transport(e)
        })?;

        info!("Upstream responded HTTP {} ({} bytes)", status, body.len());
        debug!(
            "Raw upstream body (first 500 chars): {}",
            body.chars().take(500).collect::<String>()
        );

        Ok((status, body))
    }
}

fn with_relay_headers(builder: RequestBuilder, headers: &RelayHeaders) -> RequestBuilder {
    let mut builder = builder.header(ACCEPT, "application/json");
    if let Some(trace_id) = &headers.trace_id {
        builder = builder.header(TRACE_ID_HEADER, trace_id);
    }
    if let Some(language) = &headers.accept_language {
        builder = builder.header(ACCEPT_LANGUAGE, language);
    }
    builder
}

/// Reject empty uploads and normalize the rest. Nothing is sent upstream
/// when this fails.
async fn prepare_part(analysis: Analysis, upload: ImageUpload) -> Result<Part> {
    if upload.is_empty() {
        return Err(GatewayError::InvalidImage("uploaded file is empty".to_string()));
    }

    let upload = vision::normalize_upload(upload).await?;
    file_part(analysis, upload)
}

fn file_part(analysis: Analysis, upload: ImageUpload) -> Result<Part> {
    let (default_name, default_type) = analysis.part_defaults();
    let filename = upload
        .filename
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| default_name.to_string());
    let content_type = upload
        .content_type
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or_else(|| default_type.to_string());

    let length = upload.bytes.len() as u64;
    Part::stream_with_length(upload.bytes, length)
        .file_name(filename)
        .mime_str(&content_type)
        .map_err(|e| GatewayError::InvalidImage(format!("unsupported content type {}: {}", content_type, e)))
}

/// Empty body or JSON `null` -> no payload; a JSON object -> payload.
fn parse_payload(body: &str) -> std::result::Result<Option<ResultMap>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<Option<ResultMap>>(body)
}

/// Decode an upstream answer into structured data. Error statuses carrying a
/// JSON object are data too; only an undecodable body is a failure.
fn decode_structured(status: StatusCode, body: &str) -> Result<StructuredResult> {
    if !status.is_success() && body.trim().is_empty() {
        return Err(GatewayError::Upstream(format!("HTTP {} with empty body", status)));
    }

    let payload = parse_payload(body).map_err(|e| GatewayError::UpstreamDecode {
        status: status.as_u16(),
        message: e.to_string(),
    })?;

    Ok(StructuredResult { status, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_object() {
        let result = decode_structured(StatusCode::OK, r#"{"status":"ok","season":"winter"}"#).unwrap();
        assert_eq!(result.status, StatusCode::OK);
        assert_eq!(result.payload.unwrap()["season"], json!("winter"));
    }

    #[test]
    fn test_decode_empty_and_null() {
        assert_eq!(decode_structured(StatusCode::OK, "").unwrap().payload, None);
        assert_eq!(decode_structured(StatusCode::OK, "null").unwrap().payload, None);
    }

    #[test]
    fn test_decode_error_status_with_json_is_data() {
        let result = decode_structured(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"status":"error","code":"NO_FACE"}"#,
        )
        .unwrap();
        assert_eq!(result.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(result.payload.unwrap()["code"], json!("NO_FACE"));
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(
            decode_structured(StatusCode::INTERNAL_SERVER_ERROR, "not json"),
            Err(GatewayError::UpstreamDecode { status: 500, .. })
        ));
        assert!(matches!(
            decode_structured(StatusCode::OK, "[1,2,3]"),
            Err(GatewayError::UpstreamDecode { status: 200, .. })
        ));
        assert!(matches!(
            decode_structured(StatusCode::BAD_GATEWAY, ""),
            Err(GatewayError::Upstream(_))
        ));
    }

    fn upstream_errors(operation: &str) -> f64 {
        metrics::UPSTREAM_CALLS
            .with_label_values(&[operation, "error"])
            .get()
    }

    #[tokio::test]
    async fn test_file_transport_failures_are_counted() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = UpstreamConfig {
            base_url: format!("http://127.0.0.1:{}", port),
            ..Default::default()
        };
        let client = AnalysisClient::new(&config).unwrap();
        let upload = ImageUpload::new(
            b"jpeg bytes".to_vec(),
            Some("face.jpg".to_string()),
            Some("image/jpeg".to_string()),
        );

        let personal_before = upstream_errors("personal_color");
        let face_before = upstream_errors("face_shape");

        let err = client
            .analyze_file(upload.clone(), FileOptions::default(), &RelayHeaders::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnavailable(_)));
        let err = client
            .face_shape_file(upload, FileOptions::default(), &RelayHeaders::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnavailable(_)));

        assert_eq!(upstream_errors("personal_color"), personal_before + 1.0);
        assert_eq!(upstream_errors("face_shape"), face_before + 1.0);

        // Rejected before any call, so not an upstream failure
        let empty = ImageUpload::new(Vec::new(), None, None);
        assert!(client
            .analyze_file(empty, FileOptions::default(), &RelayHeaders::default())
            .await
            .is_err());
        assert_eq!(upstream_errors("personal_color"), personal_before + 1.0);
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = UpstreamConfig {
            base_url: "http://inference:7880/".to_string(),
            ..Default::default()
        };
        let client = AnalysisClient::new(&config).unwrap();
        assert_eq!(client.url("/analyze"), "http://inference:7880/analyze");
    }
}
