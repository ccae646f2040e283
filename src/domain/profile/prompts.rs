//! Canned per-stage prompt text.
//!
//! The orchestrator owns the question sequence; the LLM only elaborates
//! within a stage. Questions address the user by name once one is known.

use super::Stage;

fn name_clause(name: Option<&str>) -> String {
    match name {
        Some(n) if !n.is_empty() => format!(", {}", n),
        _ => String::new(),
    }
}

/// First reply for a brand-new session.
pub fn greeting() -> String {
    "Hello! I'm your career intake assistant. To get started, please upload \
     your current resume (PDF) so I can read it and pre-fill what I can."
        .to_string()
}

/// Reply when a text message arrives while a resume upload is still needed.
pub fn upload_nudge(name: Option<&str>) -> String {
    format!(
        "I still need your resume to proceed{}. Please use the upload button \
         to share it as a PDF.",
        name_clause(name)
    )
}

/// Thanks the user for a successful upload.
pub fn upload_success(name: Option<&str>) -> String {
    format!("Thanks for uploading your resume{}!", name_clause(name))
}

/// Asks for whatever contact info the resume did not carry.
pub fn contact_question(name: Option<&str>, missing: &[&str]) -> String {
    if missing.is_empty() {
        format!(
            "I found your contact details in the resume{} — say anything to \
             continue, or correct them with the contact form.",
            name_clause(name)
        )
    } else {
        format!(
            "I couldn't find your {} in the resume. Please provide it below, \
             and share your LinkedIn profile URL if you have one.",
            missing.join(" and ")
        )
    }
}

/// Opens the career goals stage.
pub fn goals_question(name: Option<&str>) -> String {
    format!(
        "Now{}, I'd like to understand your professional goals. What are you \
         aiming to achieve over the next 1-3 years, and which industries or \
         roles are you targeting?",
        name_clause(name)
    )
}

/// Opens the value proposition stage.
pub fn value_prop_question(name: Option<&str>) -> String {
    format!(
        "Thank you for sharing that{}. What would you say is your unique \
         value proposition — what do you want to be known for professionally, \
         and what sets you apart?",
        name_clause(name)
    )
}

/// Opens the achievements stage.
pub fn achievements_question(name: Option<&str>) -> String {
    format!(
        "That's really helpful{}. Could you share 2-3 of your most \
         significant professional achievements? Measurable results (revenue, \
         team size, budget) make these shine.",
        name_clause(name)
    )
}

/// Asks for the delivery email, the final field.
pub fn delivery_email_question(name: Option<&str>) -> String {
    format!(
        "Almost done{}! What email address should I send your completed \
         profile summary to?",
        name_clause(name)
    )
}

/// Confirmation once everything is collected; re-emitted on any further turn.
pub fn complete_confirmation(name: Option<&str>) -> String {
    format!(
        "Perfect{}! I've collected everything needed for your career profile. \
         You'll hear from us shortly — thank you!",
        name_clause(name)
    )
}

/// Fallback follow-up when the provider did not supply one.
pub fn follow_up_prompt(stage: Stage) -> String {
    let topic = match stage {
        Stage::AwaitingGoals => "career goals",
        Stage::AwaitingValueProp => "value proposition",
        Stage::AwaitingAchievements => "achievements",
        _ => "answer",
    };
    format!(
        "Could you tell me a bit more about your {}? A concrete detail or \
         two would help.",
        topic
    )
}

/// The opening question for a stage, used when the orchestrator advances.
pub fn stage_question(stage: Stage, name: Option<&str>, missing_contact: &[&str]) -> String {
    match stage {
        Stage::Start => greeting(),
        Stage::AwaitingResume => greeting(),
        Stage::AwaitingContactInfo => contact_question(name, missing_contact),
        Stage::AwaitingGoals => goals_question(name),
        Stage::AwaitingValueProp => value_prop_question(name),
        Stage::AwaitingAchievements => achievements_question(name),
        Stage::AwaitingEmail => delivery_email_question(name),
        Stage::Complete => complete_confirmation(name),
    }
}
