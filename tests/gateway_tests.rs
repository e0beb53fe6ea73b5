// End-to-end gateway tests: router in front of a mock analysis service
// Author: kelexine (https://github.com/kelexine)

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use dongju_gateway::config::AppConfig;
use dongju_gateway::server::create_router;
use dongju_gateway::upstream::AnalysisClient;
use image::ImageFormat;
use serde_json::{json, Value};
use std::io::Cursor;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "dongju-test-boundary";

fn app(server: &MockServer) -> Router {
    app_with_limit(server, AppConfig::default().server.max_body_bytes)
}

fn app_with_limit(server: &MockServer, max_body_bytes: usize) -> Router {
    let mut config = AppConfig::default();
    config.upstream.base_url = server.uri();
    config.server.max_body_bytes = max_body_bytes;
    let client = AnalysisClient::new(&config.upstream).unwrap();
    create_router(config, client).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_body(filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([240, 200, 180]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn parse(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_health_reports_upstream() {
    let server = MockServer::start().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, _, body) = send(app(&server), request).await;
    assert_eq!(status, StatusCode::OK);

    let body = parse(&body);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["upstream_base_url"], server.uri());
}

#[tokio::test]
async fn test_personal_color_json_is_localized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(query_param("debug", "false"))
        .and(body_json(json!({ "image_base64": "Zm9v" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "season": "summer",
            "tone": "cool"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, _, body) = send(
        app(&server),
        json_request("/api/analyze", json!({ "image_base64": "Zm9v" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["season"], "summer");
    assert_eq!(body["season_ko"], "여름 쿨");
    assert_eq!(body["tone_ko"], "쿨");
    assert_eq!(body["message_ko"], "분석이 완료되었습니다.");
}

#[tokio::test]
async fn test_face_shape_json_with_debug() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/face-shape"))
        .and(query_param("debug", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "face_shape": "Oval",
            "debug": { "landmarks": 468 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, _, body) = send(
        app(&server),
        json_request("/api/face-shape?debug=true", json!({ "image_base64": "Zm9v" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["face_shape_ko"], "계란형");
    assert_eq!(body["debug"]["landmarks"], 468);
}

#[tokio::test]
async fn test_legacy_field_names_forwarded_canonically() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(body_json(json!({
            "image_base64": "Zm9v",
            "options": { "traceId": "legacy-1", "exif_correction": false }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, headers, _) = send(
        app(&server),
        json_request(
            "/api/analyze",
            json!({
                "imageBase64": "Zm9v",
                "options": { "trace_id": "legacy-1", "exifCorrection": false }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-trace-id"], "legacy-1");
}

#[tokio::test]
async fn test_blank_image_rejected_without_upstream_call() {
    let server = MockServer::start().await;

    let (status, _, body) = send(
        app(&server),
        json_request("/api/analyze", json!({ "image_base64": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = parse(&body);
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let server = MockServer::start().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/face-shape")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _, body) = send(app(&server), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_trace_id_and_locale_relayed_and_echoed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(header("x-trace-id", "client-trace"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = json_request("/api/analyze", json!({ "image_base64": "Zm9v" }));
    request.headers_mut().insert("X-Trace-Id", "client-trace".parse().unwrap());
    request
        .headers_mut()
        .insert("Accept-Language", "ko-KR,ko;q=0.9".parse().unwrap());

    let (status, headers, _) = send(app(&server), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-trace-id"], "client-trace");

    // The language list is relayed as one header value, commas included
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].headers["accept-language"], "ko-KR,ko;q=0.9");
}

#[tokio::test]
async fn test_upstream_trace_id_takes_precedence() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/face-shape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "traceId": "upstream-trace"
        })))
        .mount(&server)
        .await;

    let mut request = json_request("/api/face-shape", json!({ "image_base64": "Zm9v" }));
    request.headers_mut().insert("X-Trace-Id", "client-trace".parse().unwrap());

    let (_, headers, _) = send(app(&server), request).await;
    assert_eq!(headers["x-trace-id"], "upstream-trace");
}

#[tokio::test]
async fn test_foreign_locale_skips_labels() {
    let server = MockServer::start().await;

    let upstream = json!({ "status": "ok", "season": "winter", "tone": "cool" });
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
        .mount(&server)
        .await;

    let mut request = json_request("/api/analyze", json!({ "image_base64": "Zm9v" }));
    request
        .headers_mut()
        .insert("Accept-Language", "en-US".parse().unwrap());

    let (status, _, body) = send(app(&server), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), upstream);
}

#[tokio::test]
async fn test_empty_upstream_body_becomes_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let (status, _, body) = send(
        app(&server),
        json_request("/api/analyze", json!({ "image_base64": "Zm9v" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], "EMPTY_RESPONSE");
    assert_eq!(body["message_ko"], "서버 응답이 비어 있습니다.");
}

#[tokio::test]
async fn test_upstream_error_code_gets_korean_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/face-shape"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "status": "error",
            "code": "NO_FACE"
        })))
        .mount(&server)
        .await;

    let (status, _, body) = send(
        app(&server),
        json_request("/api/face-shape", json!({ "image_base64": "Zm9v" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = parse(&body);
    assert_eq!(body["code"], "NO_FACE");
    assert!(body["message_ko"].as_str().unwrap().contains("얼굴"));
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut config = AppConfig::default();
    config.upstream.base_url = format!("http://127.0.0.1:{}", port);
    let client = AnalysisClient::new(&config.upstream).unwrap();
    let app = create_router(config, client).unwrap();

    let (status, _, body) = send(app, json_request("/api/analyze", json!({ "image_base64": "Zm9v" }))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(parse(&body)["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_empty_upload_rejected_without_upstream_call() {
    let server = MockServer::start().await;

    let (status, _, body) = send(
        app(&server),
        multipart_request("/api/analyze/file", multipart_body("face.jpg", "image/jpeg", b"")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["code"], "INVALID_IMAGE");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_file_field_rejected() {
    let server = MockServer::start().await;

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
    );
    let (status, _, body) = send(
        app(&server),
        multipart_request("/api/face-shape/file", body.into_bytes()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["code"], "INVALID_IMAGE");
}

#[tokio::test]
async fn test_heic_upload_converted_and_localized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/face-shape/file"))
        .and(query_param("debug", "false"))
        .and(query_param("exif_correction", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "face_shape": "heart"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, _, body) = send(
        app(&server),
        multipart_request(
            "/api/face-shape/file",
            multipart_body("photo.heic", "image/heic", &png_bytes()),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["face_shape_ko"], "하트형");

    let requests = server.received_requests().await.unwrap();
    let forwarded = String::from_utf8_lossy(&requests[0].body).to_lowercase();
    assert!(forwarded.contains("filename=\"photo.jpg\""));
    assert!(forwarded.contains("content-type: image/jpeg"));
}

#[tokio::test]
async fn test_personal_color_upload_failure_relayed_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze/file"))
        .respond_with(ResponseTemplate::new(500).set_body_string("not json"))
        .mount(&server)
        .await;

    let mut request = multipart_request(
        "/api/analyze/file?exif_correction=false",
        multipart_body("face.png", "image/png", &png_bytes()),
    );
    request.headers_mut().insert("X-Trace-Id", "upload-1".parse().unwrap());

    let (status, headers, body) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"not json");
    assert_eq!(headers["x-trace-id"], "upload-1");
}

#[tokio::test]
async fn test_personal_color_upload_success_is_localized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze/file"))
        .and(query_param("exif_correction", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "season": "autumn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, _, body) = send(
        app(&server),
        multipart_request(
            "/api/analyze/file?exif_correction=false",
            multipart_body("face.png", "image/png", &png_bytes()),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["season_ko"], "가을 웜");
}

#[tokio::test]
async fn test_face_shape_upload_decode_failure_is_bad_gateway() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/face-shape/file"))
        .respond_with(ResponseTemplate::new(500).set_body_string("not json"))
        .mount(&server)
        .await;

    let (status, _, body) = send(
        app(&server),
        multipart_request(
            "/api/face-shape/file",
            multipart_body("face.png", "image/png", &png_bytes()),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body = parse(&body);
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], "UPSTREAM_DECODE_ERROR");
}

#[tokio::test]
async fn test_metrics_endpoint_counts_requests() {
    let server = MockServer::start().await;

    let _ = send(
        app(&server),
        json_request("/api/analyze", json!({ "image_base64": "" })),
    )
    .await;

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let (status, _, body) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("gateway_requests_total"));
}

#[tokio::test]
async fn test_oversized_json_body_is_413() {
    let server = MockServer::start().await;
    let image = "A".repeat(8 * 1024);

    let (status, _, body) = send(
        app_with_limit(&server, 1024),
        json_request("/api/analyze", json!({ "image_base64": image })),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    let body = parse(&body);
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_upload_is_413() {
    let server = MockServer::start().await;
    let bytes = vec![0xAB; 8 * 1024];

    let (status, _, body) = send(
        app_with_limit(&server, 1024),
        multipart_request(
            "/api/face-shape/file",
            multipart_body("face.jpg", "image/jpeg", &bytes),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(parse(&body)["code"], "PAYLOAD_TOO_LARGE");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_path_is_json_404() {
    let server = MockServer::start().await;

    let (status, _, body) = send(
        app(&server),
        json_request("/api/skin-tone", json!({ "image_base64": "Zm9v" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let body = parse(&body);
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_wrong_method_is_json_405() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .method("GET")
        .uri("/api/analyze")
        .body(Body::empty())
        .unwrap();

    let (status, headers, body) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(headers.contains_key("allow"));
    let body = parse(&body);
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_relayed_upstream_404_is_not_rewritten() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze/file"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"detail\":\"model missing\"}"))
        .mount(&server)
        .await;

    let (status, _, body) = send(
        app(&server),
        multipart_request(
            "/api/analyze/file",
            multipart_body("face.png", "image/png", &png_bytes()),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"{\"detail\":\"model missing\"}");
}
