//! Foundation module - Shared domain primitives.
//!
//! Contains the value objects and error types that form the vocabulary
//! of the career intake domain.

mod errors;
mod ids;
mod percentage;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::UserId;
pub use percentage::Percentage;
