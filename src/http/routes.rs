use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::error::{log_request_error, AnalysisFailure, FailureKind, RequestError};
use crate::orchestrator::{AnalysisOutcome, UploadedAudio};
use crate::status::ServiceStatus;

use super::AppState;

/// HTTP status for a failure kind
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::ValidationError => StatusCode::BAD_REQUEST,
        FailureKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        FailureKind::ConversionError | FailureKind::ProcessingError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AnalysisOutcome {
    fn into_response(self) -> Response {
        let status = match self.failure_kind() {
            None => StatusCode::OK,
            Some(kind) => status_for(kind),
        };
        (status, Json(self)).into_response()
    }
}

fn reject(err: RequestError) -> AnalysisOutcome {
    log_request_error(&err, "HTTP /analyze");
    AnalysisOutcome::Failure(AnalysisFailure::from(&err))
}

/// POST /analyze
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AnalysisOutcome {
    let limit_bytes = state.orchestrator.max_upload_bytes();

    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            log::debug!("[HTTP] Not a multipart request: {}", rejection);
            return reject(RequestError::MissingFile);
        }
    };

    let upload = match read_upload(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return reject(RequestError::MissingFile),
        Err(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return reject(RequestError::PayloadTooLarge { limit_bytes })
        }
        Err(err) => {
            log::warn!("[HTTP] Malformed multipart body: {}", err.body_text());
            return reject(RequestError::MissingFile);
        }
    };

    let orchestrator = state.orchestrator.clone();
    match tokio::task::spawn_blocking(move || orchestrator.submit(upload)).await {
        Ok(outcome) => outcome,
        Err(err) => reject(RequestError::Panicked {
            reason: err.to_string(),
        }),
    }
}

/// Collect the `file` and `gender` parts; `None` when there is no file part
async fn read_upload(multipart: &mut Multipart) -> Result<Option<UploadedAudio>, MultipartError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut gender = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("gender") => gender = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(file.map(|(filename, bytes)| UploadedAudio {
        bytes,
        filename,
        gender,
    }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    let converter = state.orchestrator.converter().clone();
    let storage = state.storage.clone();

    match tokio::task::spawn_blocking(move || ServiceStatus::probe(converter.as_ref(), &storage))
        .await
    {
        Ok(status) => Json(status).into_response(),
        Err(err) => {
            log::error!("[HTTP] Health probe failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "status": "error", "message": "health probe failed" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub analyze: &'static str,
    pub health_check: &'static str,
}

/// Body of `GET /`
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: &'static str,
    pub endpoints: Endpoints,
}

/// GET /
pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "VocalCoach API is running!",
        endpoints: Endpoints {
            analyze: "/analyze (POST)",
            health_check: "/health (GET)",
        },
    })
}
