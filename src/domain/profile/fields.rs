//! Field model - the static schema of collectible data.
//!
//! Each field has a validator and a fixed completion weight. The weight
//! table sums to exactly 100 so the completion percentage is an exact
//! integer share of the satisfied fields. Weights are deliberately unequal:
//! the resume and contact info are the gating inputs and carry more.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::foundation::{Percentage, ValidationError};

use super::Stage;

/// Identifier of one collectible datum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Resume,
    ContactEmail,
    ContactPhone,
    LinkedInUrl,
    CareerGoals,
    ValueProposition,
    Achievements,
    DeliveryEmail,
}

impl FieldId {
    /// All fields in the schema.
    pub const ALL: [FieldId; 8] = [
        FieldId::Resume,
        FieldId::ContactEmail,
        FieldId::ContactPhone,
        FieldId::LinkedInUrl,
        FieldId::CareerGoals,
        FieldId::ValueProposition,
        FieldId::Achievements,
        FieldId::DeliveryEmail,
    ];

    /// Schema name, also used in validation messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldId::Resume => "resume",
            FieldId::ContactEmail => "email",
            FieldId::ContactPhone => "phone",
            FieldId::LinkedInUrl => "linkedin_url",
            FieldId::CareerGoals => "career_goals",
            FieldId::ValueProposition => "value_proposition",
            FieldId::Achievements => "achievements",
            FieldId::DeliveryEmail => "delivery_email",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Static schema entry: weight and the stage that introduces the field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub id: FieldId,
    pub weight: u8,
    pub stage_introduced: Stage,
}

/// The immutable field schema, shared read-only across all users.
pub fn field_specs() -> &'static [FieldSpec] {
    // Weights sum to exactly 100.
    static SPECS: [FieldSpec; 8] = [
        FieldSpec {
            id: FieldId::Resume,
            weight: 25,
            stage_introduced: Stage::AwaitingResume,
        },
        FieldSpec {
            id: FieldId::ContactEmail,
            weight: 10,
            stage_introduced: Stage::AwaitingContactInfo,
        },
        FieldSpec {
            id: FieldId::ContactPhone,
            weight: 10,
            stage_introduced: Stage::AwaitingContactInfo,
        },
        FieldSpec {
            id: FieldId::LinkedInUrl,
            weight: 5,
            stage_introduced: Stage::AwaitingContactInfo,
        },
        FieldSpec {
            id: FieldId::CareerGoals,
            weight: 16,
            stage_introduced: Stage::AwaitingGoals,
        },
        FieldSpec {
            id: FieldId::ValueProposition,
            weight: 12,
            stage_introduced: Stage::AwaitingValueProp,
        },
        FieldSpec {
            id: FieldId::Achievements,
            weight: 14,
            stage_introduced: Stage::AwaitingAchievements,
        },
        FieldSpec {
            id: FieldId::DeliveryEmail,
            weight: 8,
            stage_introduced: Stage::AwaitingEmail,
        },
    ];
    &SPECS
}

/// Looks up the spec for a field.
pub fn field_spec(id: FieldId) -> &'static FieldSpec {
    field_specs()
        .iter()
        .find(|s| s.id == id)
        .expect("every FieldId has a spec")
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9().\-\s]+$").expect("valid phone regex"));

/// A validated datum extracted from an LLM reply, a form, or a scan.
///
/// Deltas always pass through [`validate`] before touching the profile;
/// adapter output is never trusted as pre-validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDelta {
    pub field: FieldId,
    pub value: String,
}

impl FieldDelta {
    pub fn new(field: FieldId, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Applies the field's validator, returning the normalized value.
///
/// Pure function: trims whitespace and checks format, no side effects.
pub fn validate(field: FieldId, raw: &str) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::empty_field(field.name()));
    }

    match field {
        FieldId::ContactEmail | FieldId::DeliveryEmail => {
            if !EMAIL_RE.is_match(value) {
                return Err(ValidationError::invalid_format(
                    field.name(),
                    "expected an address like name@example.com",
                ));
            }
        }
        FieldId::ContactPhone => {
            let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
            if !PHONE_CHARS_RE.is_match(value) || digits < 10 {
                return Err(ValidationError::invalid_format(
                    field.name(),
                    "expected at least 10 digits with optional +, spaces, or hyphens",
                ));
            }
        }
        FieldId::LinkedInUrl => {
            if !value.contains("linkedin.com/") {
                return Err(ValidationError::invalid_format(
                    field.name(),
                    "expected a linkedin.com profile URL",
                ));
            }
        }
        // Free-text fields only need to be non-empty.
        FieldId::Resume
        | FieldId::CareerGoals
        | FieldId::ValueProposition
        | FieldId::Achievements => {}
    }

    Ok(value.to_string())
}

/// Completion percentage: satisfied weight over total weight.
///
/// Monotonic in the satisfied set and never above 100.
pub fn completion_percentage(satisfied: &BTreeSet<FieldId>) -> Percentage {
    let total: u32 = field_specs().iter().map(|s| u32::from(s.weight)).sum();
    let earned: u32 = field_specs()
        .iter()
        .filter(|s| satisfied.contains(&s.id))
        .map(|s| u32::from(s.weight))
        .sum();

    // Weights sum to 100, so this is exact; rounding guards a re-weighted table.
    let pct = ((earned * 100) + total / 2) / total;
    Percentage::new(pct as u8)
}
