//! Conversation stage machine.
//!
//! The fixed question sequence of the intake conversation. Stages only move
//! forward, one position at a time; answers arriving ahead of the current
//! stage are captured but never cause a skip.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::FieldId;

/// Discrete step in the fixed conversation sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    AwaitingResume,
    AwaitingContactInfo,
    AwaitingGoals,
    AwaitingValueProp,
    AwaitingAchievements,
    AwaitingEmail,
    Complete,
}

impl Stage {
    /// All stages in conversation order.
    pub const ALL: [Stage; 8] = [
        Stage::Start,
        Stage::AwaitingResume,
        Stage::AwaitingContactInfo,
        Stage::AwaitingGoals,
        Stage::AwaitingValueProp,
        Stage::AwaitingAchievements,
        Stage::AwaitingEmail,
        Stage::Complete,
    ];

    /// Position in the fixed ordering.
    pub fn position(&self) -> usize {
        Stage::ALL.iter().position(|s| s == self).expect("stage in ALL")
    }

    /// The next stage, or `None` from the terminal stage.
    pub fn next(&self) -> Option<Stage> {
        Stage::ALL.get(self.position() + 1).copied()
    }

    /// True for the terminal stage.
    pub fn is_complete(&self) -> bool {
        *self == Stage::Complete
    }

    /// Fields that must be satisfied before this stage advances.
    ///
    /// `Start` has no gate (the greeting turn always advances) and
    /// `Complete` is terminal.
    pub fn gating_fields(&self) -> &'static [FieldId] {
        match self {
            Stage::Start => &[],
            Stage::AwaitingResume => &[FieldId::Resume],
            Stage::AwaitingContactInfo => &[FieldId::ContactEmail, FieldId::ContactPhone],
            Stage::AwaitingGoals => &[FieldId::CareerGoals],
            Stage::AwaitingValueProp => &[FieldId::ValueProposition],
            Stage::AwaitingAchievements => &[FieldId::Achievements],
            Stage::AwaitingEmail => &[FieldId::DeliveryEmail],
            Stage::Complete => &[],
        }
    }

    /// Stages whose answer is free text routed through the LLM.
    ///
    /// The remaining stages (greeting, upload nudge, delivery email, final
    /// confirmation) are answered by the orchestrator directly.
    pub fn is_conversational(&self) -> bool {
        matches!(
            self,
            Stage::AwaitingContactInfo
                | Stage::AwaitingGoals
                | Stage::AwaitingValueProp
                | Stage::AwaitingAchievements
        )
    }

    /// Stages where a shallow answer earns one follow-up question.
    pub fn allows_follow_up(&self) -> bool {
        matches!(
            self,
            Stage::AwaitingGoals | Stage::AwaitingValueProp | Stage::AwaitingAchievements
        )
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Start
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Start => "start",
            Stage::AwaitingResume => "awaiting_resume",
            Stage::AwaitingContactInfo => "awaiting_contact_info",
            Stage::AwaitingGoals => "awaiting_goals",
            Stage::AwaitingValueProp => "awaiting_value_prop",
            Stage::AwaitingAchievements => "awaiting_achievements",
            Stage::AwaitingEmail => "awaiting_email",
            Stage::Complete => "complete",
        };
        write!(f, "{}", s)
    }
}
