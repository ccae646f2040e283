//! Profile module - the per-user intake state.
//!
//! Holds the conversation stage machine, the static field schema with its
//! validators and completion weights, the profile aggregate that accumulates
//! validated answers, and the append-only transcript.

mod fields;
mod profile;
mod prompts;
mod scan;
mod stage;
mod transcript;

pub use fields::{
    completion_percentage, field_spec, field_specs, validate, FieldDelta, FieldId, FieldSpec,
};
pub use profile::Profile;
pub use prompts::{
    achievements_question, complete_confirmation, contact_question, delivery_email_question,
    follow_up_prompt, goals_question, greeting, stage_question, upload_nudge,
    upload_success, value_prop_question,
};
pub use scan::{scan_resume_text, ResumeFacts};
pub use stage::Stage;
pub use transcript::{Role, TranscriptEntry};
