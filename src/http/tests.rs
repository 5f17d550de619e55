use super::*;
use crate::analysis::PitchExtractor;
use crate::audio::{synth, FormatConverter, HoundDecoder, PassthroughConverter};
use crate::error::{ConversionError, FailureKind};
use axum::body::{to_bytes, Body};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "vocalcoach-test-boundary";

fn make_router(max_upload_bytes: usize) -> (TempDir, AppState, Router) {
    router_with(max_upload_bytes, Arc::new(PassthroughConverter), 2)
}

fn router_with(
    max_upload_bytes: usize,
    converter: Arc<dyn FormatConverter>,
    workers: usize,
) -> (TempDir, AppState, Router) {
    let root = tempfile::tempdir().expect("tempdir");
    let mut config = AppConfig::default();
    config.server.max_upload_bytes = max_upload_bytes;
    config.storage.upload_dir = root.path().join("uploads");
    config.storage.converted_dir = root.path().join("converted");
    startup::prepare_directories(&config.storage).expect("working dirs");

    let orchestrator = RequestOrchestrator::new(
        &config,
        converter,
        Arc::new(HoundDecoder),
        PitchExtractor::new(config.analysis.clone()),
    );
    let state = AppState::new(orchestrator, config.storage.clone());
    let router = build_router(state.clone(), workers);
    (root, state, router)
}

/// Passthrough converter that holds each conversion open for a while and
/// records how many ran at once
#[derive(Default)]
struct SlowConverter {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FormatConverter for SlowConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(100));
        let result = fs::copy(input, output).map(|_| ());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result.map_err(ConversionError::from)
    }
    fn is_available(&self) -> bool {
        true
    }
    fn name(&self) -> &str {
        "slow"
    }
}

fn tone_wav(frequency_hz: f32, duration_secs: f32) -> Vec<u8> {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tone.wav");
    synth::write_wav(&path, &synth::sine(frequency_hz, 44_100, duration_secs, 0.5), 44_100)
        .expect("write tone");
    fs::read(path).expect("read tone")
}

/// Hand-built multipart body: optional file part, optional gender part
fn multipart_body(file: Option<(&str, &[u8])>, gender: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(gender) = gender {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"gender\"\r\n\r\n{gender}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn analyze_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .expect("analyze request")
}

async fn response_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    let json = serde_json::from_slice::<Value>(&bytes).expect("JSON body");
    (status, json)
}

fn assert_no_request_files(state: &AppState) {
    for dir in [&state.storage.upload_dir, &state.storage.converted_dir] {
        assert_eq!(fs::read_dir(dir).expect("read dir").count(), 0);
    }
}

#[tokio::test]
async fn home_lists_endpoints() {
    let (_root, _state, router) = make_router(10 * 1024 * 1024);
    let (status, json) = response_json(
        router
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("home request"))
            .await
            .expect("home call"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "VocalCoach API is running!");
    assert_eq!(json["endpoints"]["analyze"], "/analyze (POST)");
}

#[tokio::test]
async fn health_reports_storage_and_converter() {
    let (_root, _state, router) = make_router(10 * 1024 * 1024);
    let (status, json) = response_json(
        router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("health request"),
            )
            .await
            .expect("health call"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["services"]["converter"], "available");
    assert_eq!(json["services"]["storage"]["upload_folder"], true);
    assert_eq!(json["services"]["storage"]["converted_folder"], true);
}

#[tokio::test]
async fn analyze_male_tone() {
    let (_root, state, router) = make_router(10 * 1024 * 1024);
    let wav = tone_wav(140.0, 1.0);
    let body = multipart_body(Some(("take.wav", wav.as_slice())), Some("male"));

    let (status, json) = response_json(
        router
            .oneshot(analyze_request(body))
            .await
            .expect("analyze call"),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["status"], "success");
    assert_eq!(json["voice_type"], "Baritone");
    let pitch = json["average_pitch"].as_f64().expect("pitch");
    assert!((pitch - 140.0).abs() < 1.5);
    assert!(!json["pitch_series"].as_array().expect("series").is_empty());
    assert!(json["processing_time"].as_str().expect("time").starts_with("0:00:"));
    assert_no_request_files(&state);
}

#[tokio::test]
async fn analyze_without_file_part() {
    let (_root, _state, router) = make_router(10 * 1024 * 1024);
    let (status, json) = response_json(
        router
            .oneshot(analyze_request(multipart_body(None, Some("female"))))
            .await
            .expect("analyze call"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "error");
    assert_eq!(json["kind"], "ValidationError");
    assert_eq!(json["message"], "No file part in request");
}

#[tokio::test]
async fn analyze_rejects_non_multipart() {
    let (_root, _state, router) = make_router(10 * 1024 * 1024);
    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .expect("analyze request");

    let (status, json) = response_json(router.oneshot(request).await.expect("analyze call")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "ValidationError");
}

#[tokio::test]
async fn analyze_rejects_unsupported_extension() {
    let (_root, state, router) = make_router(10 * 1024 * 1024);
    let body = multipart_body(Some(("notes.txt", &b"hello"[..])), None);

    let (status, json) = response_json(
        router
            .oneshot(analyze_request(body))
            .await
            .expect("analyze call"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Unsupported file format");
    assert_no_request_files(&state);
}

#[tokio::test]
async fn analyze_rejects_oversized_upload() {
    let (_root, state, router) = make_router(1024);
    let body = multipart_body(Some(("big.wav", &[0u8; 4096][..])), None);

    let (status, json) = response_json(
        router
            .oneshot(analyze_request(body))
            .await
            .expect("analyze call"),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["kind"], "PayloadTooLarge");
    assert_no_request_files(&state);
}

#[tokio::test]
async fn analyze_silence_is_validation_error() {
    let (_root, state, router) = make_router(10 * 1024 * 1024);
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("quiet.wav");
    synth::write_wav(&path, &synth::silence(44_100, 1.0), 44_100).expect("write silence");
    let wav = fs::read(&path).expect("read silence");

    let (status, json) = response_json(
        router
            .oneshot(analyze_request(multipart_body(Some(("quiet.wav", wav.as_slice())), None)))
            .await
            .expect("analyze call"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "No pitch detected");
    assert_no_request_files(&state);
}

#[test]
fn failure_kinds_map_to_status_codes() {
    assert_eq!(status_for(FailureKind::ValidationError), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(FailureKind::PayloadTooLarge), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        status_for(FailureKind::ConversionError),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_for(FailureKind::ProcessingError),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn analyze_runs_at_most_workers_at_once() {
    let converter = Arc::new(SlowConverter::default());
    let (_root, state, router) = router_with(10 * 1024 * 1024, converter.clone(), 1);
    let wav = tone_wav(140.0, 1.0);
    let request = || analyze_request(multipart_body(Some(("take.wav", wav.as_slice())), None));

    let (first, second, third) = tokio::join!(
        router.clone().oneshot(request()),
        router.clone().oneshot(request()),
        router.clone().oneshot(request()),
    );

    for response in [first, second, third] {
        let (status, json) = response_json(response.expect("analyze call")).await;
        assert_eq!(status, StatusCode::OK, "{json}");
    }
    assert_eq!(converter.peak.load(Ordering::SeqCst), 1);
    assert_no_request_files(&state);
}
