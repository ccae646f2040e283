//! Conversation Orchestrator - the per-user turn pipeline.
//!
//! The only component that mutates a [`Profile`]. Each turn runs under the
//! user's mutex for its whole read-modify-write span, including adapter
//! calls, so concurrent requests for one user serialize instead of racing.
//! Turns for different users run fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::foundation::{DomainError, ErrorCode, Percentage, UserId};
use crate::domain::profile::{
    self as prompts, scan_resume_text, FieldDelta, FieldId, Profile, Stage, TranscriptEntry,
};
use crate::ports::{ConversationProvider, ConverseContext, ProfileStore, ResumeExtractor};

/// Generic retry message for adapter failures; no raw adapter error ever
/// reaches the client.
const ADAPTER_RETRY_REPLY: &str =
    "I'm having trouble on my end right now. Please try that again in a moment.";

/// Tuning knobs for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Budget for any single adapter call (LLM or extraction).
    pub adapter_timeout: Duration,
    /// Answers shorter than this (trimmed chars) are judged shallow.
    pub shallow_answer_len: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            adapter_timeout: Duration::from_secs(30),
            shallow_answer_len: 40,
        }
    }
}

/// Derived flags telling the client which widgets to display.
///
/// Computed from the stage and field state only, never from reply text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct UiHints {
    pub show_upload: bool,
    pub show_contact_form: bool,
}

/// Result of one orchestrated turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub completion: Percentage,
    pub ui_hints: UiHints,
    /// Display name, when one has been found in the resume.
    pub name: Option<String>,
}

/// Owns the turn pipeline and the per-user mutual exclusion.
pub struct ConversationOrchestrator {
    store: Arc<dyn ProfileStore>,
    provider: Arc<dyn ConversationProvider>,
    extractor: Arc<dyn ResumeExtractor>,
    config: OrchestratorConfig,
    /// One mutex per user id; turns for the same user queue on it.
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl ConversationOrchestrator {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        provider: Arc<dyn ConversationProvider>,
        extractor: Arc<dyn ResumeExtractor>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            provider,
            extractor,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Processes one chat message for a user.
    pub async fn process_message(
        &self,
        user_id: &UserId,
        message: &str,
    ) -> Result<TurnOutcome, DomainError> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut profile = self.load_or_create(user_id).await?;
        debug!(user_id = %user_id, stage = %profile.stage, "processing chat turn");

        let reply = match profile.stage {
            Stage::Start => {
                profile.advance_stage();
                prompts::greeting()
            }
            Stage::AwaitingResume => prompts::upload_nudge(profile.name.as_deref()),
            Stage::AwaitingEmail => self.handle_delivery_email(&mut profile, message),
            Stage::Complete => prompts::complete_confirmation(profile.name.as_deref()),
            _ => self.handle_conversational(&mut profile, message).await?,
        };

        profile.recompute_satisfied();
        self.persist_turn(&profile, message, &reply).await?;
        Ok(self.outcome(&profile, reply))
    }

    /// Processes a resume upload for a user. Size and content-type limits
    /// are enforced at the transport boundary before this is called.
    pub async fn process_upload(
        &self,
        user_id: &UserId,
        bytes: &[u8],
    ) -> Result<TurnOutcome, DomainError> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut profile = self.load_or_create(user_id).await?;

        if profile.stage.is_complete() {
            let reply = prompts::complete_confirmation(profile.name.as_deref());
            self.persist_turn(&profile, "[uploaded a resume]", &reply).await?;
            return Ok(self.outcome(&profile, reply));
        }

        let extracted = match timeout(
            self.config.adapter_timeout,
            self.extractor.extract_text(bytes),
        )
        .await
        {
            Err(_) => Err(format!(
                "extraction timed out after {}s",
                self.config.adapter_timeout.as_secs()
            )),
            Ok(Err(e)) => Err(e.to_string()),
            Ok(Ok(text)) if text.trim().is_empty() => {
                Err("document contained no extractable text".to_string())
            }
            Ok(Ok(text)) => Ok(text),
        };

        let text = match extracted {
            Ok(text) => text,
            Err(reason) => {
                // Stage and profile untouched; the exchange is still logged.
                warn!(user_id = %user_id, %reason, "resume extraction failed");
                let reply = "I couldn't read that file. Please make sure it's a \
                             valid PDF and try again.";
                self.persist_turn(&profile, "[uploaded a resume]", reply).await?;
                return Err(DomainError::new(ErrorCode::ExtractionFailed, reply));
            }
        };

        self.absorb_resume(&mut profile, text);
        profile.recompute_satisfied();

        // Start has no gate; a direct upload initializes the session first.
        while profile.stage == Stage::Start {
            profile.advance_stage();
        }
        profile.advance_stage();

        let reply = format!(
            "{} {}",
            prompts::upload_success(profile.name.as_deref()),
            prompts::stage_question(
                profile.stage,
                profile.name.as_deref(),
                &profile.missing_contact_labels(),
            )
        );
        info!(
            user_id = %user_id,
            stage = %profile.stage,
            completion = %profile.completion(),
            "resume absorbed"
        );
        self.persist_turn(&profile, "[uploaded a resume]", &reply).await?;
        Ok(self.outcome(&profile, reply))
    }

    /// Processes a contact-form submission for a user.
    ///
    /// Both values are validated independently but stored only together:
    /// a submission with any invalid field stores nothing and the rejection
    /// names each invalid field so no input is dropped silently.
    pub async fn process_contact(
        &self,
        user_id: &UserId,
        email: &str,
        phone: &str,
    ) -> Result<TurnOutcome, DomainError> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut profile = self.load_or_create(user_id).await?;
        let rendered = format!("Email: {}\nPhone: {}", email, phone);

        if profile.stage.is_complete() {
            let reply = prompts::complete_confirmation(profile.name.as_deref());
            self.persist_turn(&profile, &rendered, &reply).await?;
            return Ok(self.outcome(&profile, reply));
        }

        let email_result = crate::domain::profile::validate(FieldId::ContactEmail, email);
        let phone_result = crate::domain::profile::validate(FieldId::ContactPhone, phone);

        let reply = match (&email_result, &phone_result) {
            (Ok(email), Ok(phone)) => {
                profile
                    .apply_delta(&FieldDelta::new(FieldId::ContactEmail, email.clone()))
                    .map_err(|e| DomainError::validation("email", e.to_string()))?;
                profile
                    .apply_delta(&FieldDelta::new(FieldId::ContactPhone, phone.clone()))
                    .map_err(|e| DomainError::validation("phone", e.to_string()))?;
                profile.recompute_satisfied();

                if profile.stage == Stage::AwaitingContactInfo {
                    profile.advance_stage();
                    prompts::stage_question(profile.stage, profile.name.as_deref(), &[])
                } else {
                    "Thanks, I've updated your contact details.".to_string()
                }
            }
            _ => {
                let mut problems = Vec::new();
                if let Err(e) = &email_result {
                    problems.push(format!("the email looks invalid ({})", e));
                }
                if let Err(e) = &phone_result {
                    problems.push(format!("the phone number looks invalid ({})", e));
                }
                format!(
                    "I couldn't save that: {}. Nothing was stored — please \
                     resubmit both values.",
                    problems.join(" and ")
                )
            }
        };

        profile.recompute_satisfied();
        self.persist_turn(&profile, &rendered, &reply).await?;
        Ok(self.outcome(&profile, reply))
    }

    // ────────────────────────────────────────────────────────────────────
    // Turn internals
    // ────────────────────────────────────────────────────────────────────

    /// Handles the delivery-email stage locally; no LLM call needed.
    fn handle_delivery_email(&self, profile: &mut Profile, message: &str) -> String {
        match crate::domain::profile::validate(FieldId::DeliveryEmail, message) {
            Ok(value) => {
                // Validated above; apply cannot fail.
                let _ = profile.apply_delta(&FieldDelta::new(FieldId::DeliveryEmail, value));
                profile.recompute_satisfied();
                profile.advance_stage();
                prompts::complete_confirmation(profile.name.as_deref())
            }
            Err(_) => format!(
                "That doesn't look like an email address. {}",
                prompts::delivery_email_question(profile.name.as_deref())
            ),
        }
    }

    /// Handles the stages whose answers flow through the LLM.
    async fn handle_conversational(
        &self,
        profile: &mut Profile,
        message: &str,
    ) -> Result<String, DomainError> {
        let stage = profile.stage;
        let transcript = self
            .store
            .load_transcript(&profile.user_id)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;

        let context = ConverseContext {
            stage,
            name: profile.name.clone(),
            transcript,
            message: message.to_string(),
            missing_fields: FieldId::ALL
                .iter()
                .filter(|f| !profile.fields_satisfied.contains(f))
                .map(|f| f.name().to_string())
                .collect(),
            captured: profile.captured_values(),
        };

        let outcome = match timeout(
            self.config.adapter_timeout,
            self.provider.converse(context),
        )
        .await
        {
            Err(_) => {
                warn!(user_id = %profile.user_id, "provider call timed out");
                return Ok(ADAPTER_RETRY_REPLY.to_string());
            }
            Ok(Err(e)) => {
                warn!(user_id = %profile.user_id, error = %e, "provider call failed");
                return Ok(ADAPTER_RETRY_REPLY.to_string());
            }
            Ok(Ok(outcome)) => outcome,
        };

        // The raw message is the stage's answer where the stage collects
        // free text; follow-up answers deepen it instead of replacing it.
        if let Some(field) = narrative_field(stage) {
            let result = if profile.follow_ups_used(stage) == 0 {
                profile.apply_delta(&FieldDelta::new(field, message))
            } else {
                profile.append_narrative(field, message)
            };
            if let Err(e) = result {
                debug!(user_id = %profile.user_id, error = %e, "stage answer not storable");
            }
        }

        // Merge provider deltas through the validators; deltas come after
        // the raw answer, so last-write-wins lands on the extracted value.
        for delta in &outcome.field_deltas {
            if let Err(e) = profile.apply_delta(delta) {
                debug!(
                    user_id = %profile.user_id,
                    field = %delta.field,
                    error = %e,
                    "discarding invalid provider delta"
                );
            }
        }
        profile.recompute_satisfied();

        if !profile.current_gate_satisfied() {
            return Ok(non_empty_or(outcome.reply, || {
                prompts::stage_question(
                    stage,
                    profile.name.as_deref(),
                    &profile.missing_contact_labels(),
                )
            }));
        }

        let shallow = message.trim().chars().count() < self.config.shallow_answer_len
            || outcome.needs_follow_up;
        if stage.allows_follow_up() && shallow && profile.follow_ups_used(stage) == 0 {
            // Hold the stage for exactly one follow-up question.
            profile.note_follow_up(stage);
            return Ok(non_empty_or(outcome.reply, || {
                prompts::follow_up_prompt(stage)
            }));
        }

        profile.advance_stage();
        Ok(prompts::stage_question(
            profile.stage,
            profile.name.as_deref(),
            &profile.missing_contact_labels(),
        ))
    }

    /// Stores extracted resume text and pre-fills unset contact fields from
    /// the scan. Existing values are never overwritten by the scan.
    fn absorb_resume(&self, profile: &mut Profile, text: String) {
        let facts = scan_resume_text(&text);
        profile.resume_text = Some(text);

        if profile.name.is_none() {
            profile.name = facts.name;
        }
        if profile.contact_email.is_none() {
            profile.contact_email = facts.email;
        }
        if profile.contact_phone.is_none() {
            profile.contact_phone = facts.phone;
        }
        if profile.linkedin_url.is_none() {
            profile.linkedin_url = facts.linkedin_url;
        }
    }

    async fn user_lock(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load_or_create(&self, user_id: &UserId) -> Result<Profile, DomainError> {
        let existing = self
            .store
            .load_profile(user_id)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;
        Ok(existing.unwrap_or_else(|| Profile::new(user_id.clone())))
    }

    async fn persist_turn(
        &self,
        profile: &Profile,
        user_text: &str,
        bot_text: &str,
    ) -> Result<(), DomainError> {
        let entries = [
            TranscriptEntry::user(user_text),
            TranscriptEntry::bot(bot_text),
        ];
        self.store
            .save_turn(profile, &entries)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))
    }

    fn outcome(&self, profile: &Profile, reply: String) -> TurnOutcome {
        TurnOutcome {
            reply,
            completion: profile.completion(),
            ui_hints: UiHints {
                show_upload: profile.stage == Stage::AwaitingResume
                    || !profile.fields_satisfied.contains(&FieldId::Resume),
                show_contact_form: profile.stage == Stage::AwaitingContactInfo,
            },
            name: profile.name.clone(),
        }
    }
}

/// The field a free-text stage fills with the raw answer.
fn narrative_field(stage: Stage) -> Option<FieldId> {
    match stage {
        Stage::AwaitingGoals => Some(FieldId::CareerGoals),
        Stage::AwaitingValueProp => Some(FieldId::ValueProposition),
        Stage::AwaitingAchievements => Some(FieldId::Achievements),
        _ => None,
    }
}

fn non_empty_or(reply: String, fallback: impl FnOnce() -> String) -> String {
    if reply.trim().is_empty() {
        fallback()
    } else {
        reply
    }
}
