//! HTTP handlers for the conversation endpoints.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::application::ConversationOrchestrator;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};

use super::dto::{ChatRequest, ChatResponse, ContactRequest, ErrorResponse, UploadResponse};

/// Shared state for all conversation handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConversationOrchestrator>,
    /// Upload size ceiling, enforced again here after the body limit layer.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(orchestrator: Arc<ConversationOrchestrator>, max_upload_bytes: usize) -> Self {
        Self {
            orchestrator,
            max_upload_bytes,
        }
    }
}

/// POST /api/chat - one free-text conversation turn.
pub async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let user_id = match parse_user_id(&req.user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    if req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("message cannot be empty")),
        )
            .into_response();
    }

    match state.orchestrator.process_message(&user_id, &req.message).await {
        Ok(outcome) => (StatusCode::OK, Json(ChatResponse::from(outcome))).into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// POST /api/upload-resume - multipart resume upload (`file` + `user_id`).
pub async fn upload_resume(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut user_id_raw: Option<String> = None;
    let mut file: Option<(Option<String>, Option<String>, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::bad_request(format!(
                        "malformed multipart body: {}",
                        e
                    ))),
                )
                    .into_response()
            }
        };

        match field.name() {
            Some("user_id") => match field.text().await {
                Ok(text) => user_id_raw = Some(text),
                Err(e) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse::bad_request(format!(
                            "unreadable user_id field: {}",
                            e
                        ))),
                    )
                        .into_response()
                }
            },
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => file = Some((filename, content_type, bytes.to_vec())),
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(ErrorResponse::bad_request(format!(
                                "unreadable file field: {}",
                                e
                            ))),
                        )
                            .into_response()
                    }
                }
            }
            _ => {}
        }
    }

    let user_id = match user_id_raw.as_deref().map(parse_user_id) {
        Some(Ok(id)) => id,
        Some(Err(response)) => return response,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("missing user_id field")),
            )
                .into_response()
        }
    };

    let (filename, content_type, bytes) = match file {
        Some(parts) => parts,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("missing file field")),
            )
                .into_response()
        }
    };

    if let Err(e) = check_pdf_upload(
        filename.as_deref(),
        content_type.as_deref(),
        &bytes,
        state.max_upload_bytes,
    ) {
        return domain_error_response(e);
    }

    match state.orchestrator.process_upload(&user_id, &bytes).await {
        Ok(outcome) => (StatusCode::OK, Json(UploadResponse::from(outcome))).into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// POST /api/submit-contact - structured contact-form submission.
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> Response {
    let user_id = match parse_user_id(&req.user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state
        .orchestrator
        .process_contact(&user_id, &req.email, &req.phone)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(ChatResponse::from(outcome))).into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// GET /health - liveness probe.
pub async fn health() -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response()
}

// ────────────────────────────────────────────────────────────────────────
// Validation and error mapping
// ────────────────────────────────────────────────────────────────────────

fn parse_user_id(raw: &str) -> Result<UserId, Response> {
    UserId::new(raw).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(e.to_string())),
        )
            .into_response()
    })
}

/// Rejects uploads that are not plausibly a PDF before extraction runs.
fn check_pdf_upload(
    filename: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<(), DomainError> {
    if bytes.len() > max_bytes {
        return Err(DomainError::new(
            ErrorCode::FileTooLarge,
            format!("file exceeds the {} byte limit", max_bytes),
        ));
    }

    let name_says_pdf = filename
        .map(|f| f.to_ascii_lowercase().ends_with(".pdf"))
        .unwrap_or(false);
    let type_says_pdf = content_type
        .map(|t| t.eq_ignore_ascii_case("application/pdf"))
        .unwrap_or(false);
    if !name_says_pdf && !type_says_pdf {
        return Err(DomainError::new(
            ErrorCode::InvalidFileType,
            "only PDF resumes are accepted",
        ));
    }

    if !bytes.starts_with(b"%PDF-") {
        return Err(DomainError::new(
            ErrorCode::InvalidFileType,
            "the file does not look like a PDF",
        ));
    }

    Ok(())
}

fn domain_error_response(error: DomainError) -> Response {
    let status = if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        match error.code {
            ErrorCode::ProviderTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::ProviderError => StatusCode::BAD_GATEWAY,
            // Extraction failures included: the document passed the client
            // checks but could not be processed.
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    };

    if status.is_server_error() {
        warn!(code = %error.code, message = %error.message, "request failed");
    }

    (status, Json(ErrorResponse::from(&error))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_check_accepts_named_pdf_with_magic_bytes() {
        assert!(check_pdf_upload(
            Some("resume.pdf"),
            Some("application/pdf"),
            b"%PDF-1.7 content",
            1024,
        )
        .is_ok());
    }

    #[test]
    fn pdf_check_accepts_content_type_without_filename() {
        assert!(check_pdf_upload(None, Some("application/pdf"), b"%PDF-1.4", 1024).is_ok());
    }

    #[test]
    fn pdf_check_rejects_wrong_extension_and_type() {
        let err = check_pdf_upload(Some("resume.docx"), Some("text/plain"), b"%PDF-", 1024)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFileType);
    }

    #[test]
    fn pdf_check_rejects_missing_magic_bytes() {
        let err = check_pdf_upload(Some("resume.pdf"), None, b"MZ\x90\x00", 1024).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFileType);
    }

    #[test]
    fn pdf_check_rejects_oversized_files() {
        let err = check_pdf_upload(Some("resume.pdf"), None, &[0u8; 64], 32).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileTooLarge);
    }

    #[test]
    fn extraction_failure_maps_to_500() {
        let error = DomainError::new(ErrorCode::ExtractionFailed, "unreadable");
        let response = domain_error_response(error);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_errors_map_to_400_and_storage_to_500() {
        let response = domain_error_response(DomainError::validation("email", "bad"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = domain_error_response(DomainError::storage("disk full"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
