//! Request and response DTOs for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::application::{TurnOutcome, UiHints};
use crate::domain::foundation::DomainError;

/// POST /api/chat request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
}

/// POST /api/chat response body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub completion_percentage: u8,
    pub ui_hints: UiHints,
}

impl From<TurnOutcome> for ChatResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            response: outcome.reply,
            completion_percentage: outcome.completion.value(),
            ui_hints: outcome.ui_hints,
        }
    }
}

/// POST /api/upload-resume response body.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub completion_percentage: u8,
    pub ui_hints: UiHints,
}

impl From<TurnOutcome> for UploadResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            response: outcome.reply,
            name: outcome.name,
            completion_percentage: outcome.completion.value(),
            ui_hints: outcome.ui_hints,
        }
    }
}

/// POST /api/submit-contact request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactRequest {
    pub user_id: String,
    pub email: String,
    pub phone: String,
}

/// Error envelope returned for every non-2xx response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&DomainError> for ErrorResponse {
    fn from(error: &DomainError) -> Self {
        Self {
            error: error.message.clone(),
            code: error.code.to_string(),
        }
    }
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "VALIDATION_FAILED".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Percentage;

    fn outcome() -> TurnOutcome {
        TurnOutcome {
            reply: "Hello!".to_string(),
            completion: Percentage::new(25),
            ui_hints: UiHints {
                show_upload: true,
                show_contact_form: false,
            },
            name: Some("Jo".to_string()),
        }
    }

    #[test]
    fn chat_response_carries_reply_and_percentage() {
        let response = ChatResponse::from(outcome());
        assert_eq!(response.response, "Hello!");
        assert_eq!(response.completion_percentage, 25);
        assert!(response.ui_hints.show_upload);
    }

    #[test]
    fn upload_response_serializes_without_absent_name() {
        let mut o = outcome();
        o.name = None;
        let json = serde_json::to_value(UploadResponse::from(o)).unwrap();
        assert!(json.get("name").is_none());
        assert_eq!(json["completion_percentage"], 25);
    }

    #[test]
    fn error_response_uses_the_error_code_name() {
        let err = DomainError::validation("email", "looks wrong");
        let body = ErrorResponse::from(&err);
        assert_eq!(body.code, "VALIDATION_FAILED");
        assert_eq!(body.error, "looks wrong");
    }
}
