//! Profile aggregate - the per-user accumulated, validated career data.
//!
//! The orchestrator is the only writer. `fields_satisfied` is derived from
//! the stored values on every mutation, never edited directly, so the
//! completion calculation can never drift from the data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::foundation::{Percentage, UserId, ValidationError};

use super::{completion_percentage, validate, FieldDelta, FieldId, Stage};

/// Per-user accumulated career data plus conversation position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    /// Display name scanned from the resume, used to personalize prompts.
    pub name: Option<String>,
    pub resume_text: Option<String>,
    pub linkedin_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub career_goals: Option<String>,
    pub value_proposition: Option<String>,
    pub achievements: Vec<String>,
    /// Where the finished profile summary should be sent.
    pub delivery_email: Option<String>,
    pub stage: Stage,
    /// Derived: exactly the fields whose current value passes its validator.
    pub fields_satisfied: BTreeSet<FieldId>,
    /// Follow-up questions already spent, per stage.
    pub follow_ups: BTreeMap<Stage, u8>,
    pub last_updated: DateTime<Utc>,
}

impl Profile {
    /// Creates an empty profile at the start of the conversation.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            name: None,
            resume_text: None,
            linkedin_url: None,
            contact_email: None,
            contact_phone: None,
            career_goals: None,
            value_proposition: None,
            achievements: Vec::new(),
            delivery_email: None,
            stage: Stage::Start,
            fields_satisfied: BTreeSet::new(),
            follow_ups: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }

    /// Applies one validated delta, overwriting any previous value
    /// (last-write-wins within a turn; achievements accumulate instead).
    ///
    /// Callers recompute satisfaction afterwards via
    /// [`Profile::recompute_satisfied`].
    pub fn apply_delta(&mut self, delta: &FieldDelta) -> Result<(), ValidationError> {
        let value = validate(delta.field, &delta.value)?;
        match delta.field {
            FieldId::Resume => self.resume_text = Some(value),
            FieldId::ContactEmail => self.contact_email = Some(value),
            FieldId::ContactPhone => self.contact_phone = Some(value),
            FieldId::LinkedInUrl => self.linkedin_url = Some(value),
            FieldId::CareerGoals => self.career_goals = Some(value),
            FieldId::ValueProposition => self.value_proposition = Some(value),
            FieldId::Achievements => {
                if !self.achievements.contains(&value) {
                    self.achievements.push(value);
                }
            }
            FieldId::DeliveryEmail => self.delivery_email = Some(value),
        }
        self.touch();
        Ok(())
    }

    /// Appends free text to an already-answered narrative field.
    ///
    /// Used for follow-up answers, which deepen the original answer rather
    /// than replace it.
    pub fn append_narrative(&mut self, field: FieldId, text: &str) -> Result<(), ValidationError> {
        let value = validate(field, text)?;
        let slot = match field {
            FieldId::CareerGoals => &mut self.career_goals,
            FieldId::ValueProposition => &mut self.value_proposition,
            _ => return self.apply_delta(&FieldDelta::new(field, value)),
        };
        match slot {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(&value);
            }
            None => *slot = Some(value),
        }
        self.touch();
        Ok(())
    }

    /// Current raw value of a field, if any. Achievements are reported as
    /// present once the list is non-empty.
    pub fn field_value(&self, field: FieldId) -> Option<&str> {
        match field {
            FieldId::Resume => self.resume_text.as_deref(),
            FieldId::ContactEmail => self.contact_email.as_deref(),
            FieldId::ContactPhone => self.contact_phone.as_deref(),
            FieldId::LinkedInUrl => self.linkedin_url.as_deref(),
            FieldId::CareerGoals => self.career_goals.as_deref(),
            FieldId::ValueProposition => self.value_proposition.as_deref(),
            FieldId::Achievements => self.achievements.first().map(String::as_str),
            FieldId::DeliveryEmail => self.delivery_email.as_deref(),
        }
    }

    /// Rederives `fields_satisfied` from the stored values.
    ///
    /// Invariant: after this call the set is exactly the fields whose value
    /// passes its validator.
    pub fn recompute_satisfied(&mut self) {
        self.fields_satisfied = FieldId::ALL
            .into_iter()
            .filter(|field| {
                self.field_value(*field)
                    .map(|v| validate(*field, v).is_ok())
                    .unwrap_or(false)
            })
            .collect();
    }

    /// Completion percentage from the satisfied set.
    pub fn completion(&self) -> Percentage {
        completion_percentage(&self.fields_satisfied)
    }

    /// True when every field gating the current stage is satisfied.
    pub fn current_gate_satisfied(&self) -> bool {
        self.stage
            .gating_fields()
            .iter()
            .all(|f| self.fields_satisfied.contains(f))
    }

    /// Advances the stage one position if the current gate is satisfied.
    ///
    /// Returns true when the stage moved. The stage never regresses and
    /// never skips, regardless of data captured ahead of it.
    pub fn advance_stage(&mut self) -> bool {
        if !self.current_gate_satisfied() {
            return false;
        }
        match self.stage.next() {
            Some(next) => {
                self.stage = next;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Follow-ups already asked in the given stage.
    pub fn follow_ups_used(&self, stage: Stage) -> u8 {
        self.follow_ups.get(&stage).copied().unwrap_or(0)
    }

    /// Records that a follow-up was asked in the given stage.
    pub fn note_follow_up(&mut self, stage: Stage) {
        *self.follow_ups.entry(stage).or_insert(0) += 1;
        self.touch();
    }

    /// Snapshot of the captured values keyed by schema name.
    ///
    /// Resume text is reported as its size only; achievements join into one
    /// line. Used to build provider context, so a follow-up question can
    /// reference what the user already said.
    pub fn captured_values(&self) -> BTreeMap<String, String> {
        let mut captured = BTreeMap::new();
        for field in FieldId::ALL {
            let value = match field {
                FieldId::Resume => self
                    .resume_text
                    .as_ref()
                    .map(|t| format!("uploaded, {} characters", t.chars().count())),
                FieldId::Achievements => {
                    (!self.achievements.is_empty()).then(|| self.achievements.join("; "))
                }
                _ => self.field_value(field).map(str::to_string),
            };
            if let Some(value) = value {
                captured.insert(field.name().to_string(), value);
            }
        }
        captured
    }

    /// Human labels for whichever contact pieces are still missing.
    pub fn missing_contact_labels(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.fields_satisfied.contains(&FieldId::ContactEmail) {
            missing.push("email address");
        }
        if !self.fields_satisfied.contains(&FieldId::ContactPhone) {
            missing.push("phone number");
        }
        missing
    }

    fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}
