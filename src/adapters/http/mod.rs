//! HTTP adapter - the axum surface over the orchestrator.

mod dto;
mod handlers;
mod routes;

pub use dto::{ChatRequest, ChatResponse, ContactRequest, ErrorResponse, UploadResponse};
pub use handlers::AppState;
pub use routes::api_router;
