//! Integration tests for the full conversation pipeline.
//!
//! These drive the orchestrator end to end over the in-memory store with
//! scripted provider and extractor mocks: stage progression, resume
//! absorption, contact-form semantics, follow-ups, adapter failures, and
//! concurrent turns.

use std::sync::Arc;

use career_intake::adapters::ai::{MockConversationProvider, MockConverseError};
use career_intake::adapters::document::MockResumeExtractor;
use career_intake::adapters::storage::InMemoryProfileStore;
use career_intake::application::{ConversationOrchestrator, OrchestratorConfig};
use career_intake::domain::foundation::UserId;
use career_intake::domain::profile::{FieldDelta, FieldId, Profile, Stage};
use career_intake::ports::{ConverseOutcome, ProfileStore};

const RESUME_TEXT: &str = "Jo Example\njo@example.com\n+1 555 123 4567\n\
                           linkedin.com/in/jo\nEngineer with ten years of experience.";

fn user() -> UserId {
    UserId::new("browser-abc").unwrap()
}

struct Harness {
    store: Arc<InMemoryProfileStore>,
    provider: MockConversationProvider,
    orchestrator: ConversationOrchestrator,
}

fn harness(provider: MockConversationProvider, extractor: MockResumeExtractor) -> Harness {
    let store = Arc::new(InMemoryProfileStore::new());
    let orchestrator = ConversationOrchestrator::new(
        store.clone(),
        Arc::new(provider.clone()),
        Arc::new(extractor),
        OrchestratorConfig::default(),
    );
    Harness {
        store,
        provider,
        orchestrator,
    }
}

/// Seeds a stored profile mid-conversation so tests can start at any stage.
async fn seed_profile(store: &InMemoryProfileStore, build: impl FnOnce(&mut Profile)) {
    let mut profile = Profile::new(user());
    build(&mut profile);
    profile.recompute_satisfied();
    store.save_turn(&profile, &[]).await.unwrap();
}

async fn stored_profile(store: &InMemoryProfileStore) -> Profile {
    store.load_profile(&user()).await.unwrap().unwrap()
}

#[tokio::test]
async fn first_message_greets_and_asks_for_resume() {
    let h = harness(MockConversationProvider::new(), MockResumeExtractor::new());

    let outcome = h.orchestrator.process_message(&user(), "hello").await.unwrap();

    assert!(outcome.reply.contains("upload"));
    assert_eq!(outcome.completion.value(), 0);
    assert!(outcome.ui_hints.show_upload);
    assert!(!outcome.ui_hints.show_contact_form);

    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingResume);
    // No provider call for the scripted opening.
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn chat_without_resume_keeps_nudging() {
    let h = harness(MockConversationProvider::new(), MockResumeExtractor::new());

    h.orchestrator.process_message(&user(), "hi").await.unwrap();
    let outcome = h
        .orchestrator
        .process_message(&user(), "here are my goals: lead a team")
        .await
        .unwrap();

    assert!(outcome.reply.contains("resume"));
    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingResume);
    assert!(profile.career_goals.is_none());
}

#[tokio::test]
async fn upload_absorbs_resume_and_prefills_contact_fields() {
    let h = harness(
        MockConversationProvider::new(),
        MockResumeExtractor::new().with_text(RESUME_TEXT),
    );

    let outcome = h
        .orchestrator
        .process_upload(&user(), b"%PDF-bytes")
        .await
        .unwrap();

    // Resume 25 + email 10 + phone 10 + linkedin 5.
    assert_eq!(outcome.completion.value(), 50);
    assert_eq!(outcome.name.as_deref(), Some("Jo Example"));
    assert!(outcome.reply.contains("Thanks for uploading your resume, Jo Example!"));
    assert!(outcome.ui_hints.show_contact_form);
    assert!(!outcome.ui_hints.show_upload);

    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingContactInfo);
    assert_eq!(profile.contact_email.as_deref(), Some("jo@example.com"));
    assert!(profile.contact_phone.is_some());
    assert!(profile.linkedin_url.is_some());
}

#[tokio::test]
async fn upload_advances_exactly_one_gated_stage() {
    // A resume full of contact data must still land on the contact stage,
    // never skip past it.
    let h = harness(
        MockConversationProvider::new(),
        MockResumeExtractor::new().with_text(RESUME_TEXT),
    );

    h.orchestrator.process_message(&user(), "hi").await.unwrap();
    h.orchestrator.process_upload(&user(), b"%PDF-").await.unwrap();

    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingContactInfo);
}

#[tokio::test]
async fn failed_extraction_leaves_profile_untouched() {
    let h = harness(
        MockConversationProvider::new(),
        MockResumeExtractor::new().with_unreadable("broken xref"),
    );

    h.orchestrator.process_message(&user(), "hi").await.unwrap();
    let result = h.orchestrator.process_upload(&user(), b"%PDF-").await;
    assert!(result.is_err());

    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingResume);
    assert!(profile.resume_text.is_none());
    assert!(profile.fields_satisfied.is_empty());

    // The failed exchange is still on the transcript.
    let transcript = h.store.load_transcript(&user()).await.unwrap();
    assert_eq!(transcript.len(), 4);
    assert!(transcript[3].text.contains("couldn't read"));
}

#[tokio::test]
async fn contact_form_with_any_invalid_field_stores_nothing() {
    let h = harness(MockConversationProvider::new(), MockResumeExtractor::new());
    seed_profile(&h.store, |p| {
        p.resume_text = Some("resume".to_string());
        p.stage = Stage::AwaitingContactInfo;
    })
    .await;

    let outcome = h
        .orchestrator
        .process_contact(&user(), "not-an-email", "+1 555 123 4567")
        .await
        .unwrap();

    assert!(outcome.reply.contains("Nothing was stored"));
    assert!(outcome.reply.contains("email"));

    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingContactInfo);
    assert!(profile.contact_email.is_none());
    // The valid phone was NOT kept: the submission is all-or-nothing.
    assert!(profile.contact_phone.is_none());
}

#[tokio::test]
async fn valid_contact_form_advances_to_goals() {
    let h = harness(MockConversationProvider::new(), MockResumeExtractor::new());
    seed_profile(&h.store, |p| {
        p.resume_text = Some("resume".to_string());
        p.stage = Stage::AwaitingContactInfo;
    })
    .await;

    let outcome = h
        .orchestrator
        .process_contact(&user(), "jo@example.com", "(555) 123-4567")
        .await
        .unwrap();

    assert!(outcome.reply.contains("goals"));
    // Resume 25 + email 10 + phone 10.
    assert_eq!(outcome.completion.value(), 45);

    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingGoals);

    // The form submission is rendered into the transcript.
    let transcript = h.store.load_transcript(&user()).await.unwrap();
    let submitted = &transcript[transcript.len() - 2];
    assert_eq!(submitted.text, "Email: jo@example.com\nPhone: (555) 123-4567");
}

#[tokio::test]
async fn resubmitting_identical_contact_details_is_idempotent() {
    let h = harness(MockConversationProvider::new(), MockResumeExtractor::new());
    seed_profile(&h.store, |p| {
        p.resume_text = Some("resume".to_string());
        p.stage = Stage::AwaitingContactInfo;
    })
    .await;

    let first = h
        .orchestrator
        .process_contact(&user(), "jo@example.com", "(555) 123-4567")
        .await
        .unwrap();
    let second = h
        .orchestrator
        .process_contact(&user(), "jo@example.com", "(555) 123-4567")
        .await
        .unwrap();

    assert_eq!(second.completion.value(), first.completion.value());

    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingGoals);
    assert_eq!(profile.contact_email.as_deref(), Some("jo@example.com"));
    assert_eq!(profile.contact_phone.as_deref(), Some("(555) 123-4567"));
}

#[tokio::test]
async fn contact_resubmission_after_stage_updates_without_regressing() {
    let h = harness(MockConversationProvider::new(), MockResumeExtractor::new());
    seed_profile(&h.store, |p| {
        p.resume_text = Some("resume".to_string());
        p.contact_email = Some("old@example.com".to_string());
        p.contact_phone = Some("5551234567".to_string());
        p.stage = Stage::AwaitingGoals;
    })
    .await;

    let outcome = h
        .orchestrator
        .process_contact(&user(), "new@example.com", "5559876543")
        .await
        .unwrap();

    assert!(outcome.reply.contains("updated your contact details"));
    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingGoals);
    assert_eq!(profile.contact_email.as_deref(), Some("new@example.com"));
}

#[tokio::test]
async fn substantive_goals_answer_advances_and_stores_raw_text() {
    let provider = MockConversationProvider::new().with_outcome(ConverseOutcome {
        reply: "Those are solid goals!".to_string(),
        field_deltas: vec![FieldDelta::new(FieldId::LinkedInUrl, "linkedin.com/in/jo")],
        needs_follow_up: false,
    });
    let h = harness(provider, MockResumeExtractor::new());
    seed_profile(&h.store, |p| {
        p.resume_text = Some("resume".to_string());
        p.contact_email = Some("jo@example.com".to_string());
        p.contact_phone = Some("5551234567".to_string());
        p.stage = Stage::AwaitingGoals;
    })
    .await;

    let message = "I want to move into engineering leadership within three years, \
                   ideally at a company building developer tools.";
    let outcome = h.orchestrator.process_message(&user(), message).await.unwrap();

    // The advance hands out the next stage's question.
    assert!(outcome.reply.contains("value proposition"));

    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingValueProp);
    assert_eq!(profile.career_goals.as_deref(), Some(message));
    // The opportunistic provider delta landed without skipping any stage.
    assert_eq!(profile.linkedin_url.as_deref(), Some("linkedin.com/in/jo"));

    // The provider saw the values captured before this turn.
    let calls = h.provider.get_calls();
    assert_eq!(
        calls[0].captured.get("email").map(String::as_str),
        Some("jo@example.com")
    );
    assert!(calls[0].captured.contains_key("resume"));
}

#[tokio::test]
async fn shallow_answer_gets_exactly_one_follow_up() {
    let provider = MockConversationProvider::new()
        .with_outcome(ConverseOutcome {
            reply: "Could you expand on that?".to_string(),
            field_deltas: vec![],
            needs_follow_up: true,
        })
        .with_reply("Understood.");
    let h = harness(provider, MockResumeExtractor::new());
    seed_profile(&h.store, |p| {
        p.resume_text = Some("resume".to_string());
        p.contact_email = Some("jo@example.com".to_string());
        p.contact_phone = Some("5551234567".to_string());
        p.stage = Stage::AwaitingGoals;
    })
    .await;

    // First shallow answer: stage holds for one follow-up.
    let outcome = h.orchestrator.process_message(&user(), "get promoted").await.unwrap();
    assert_eq!(outcome.reply, "Could you expand on that?");
    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingGoals);
    assert_eq!(profile.career_goals.as_deref(), Some("get promoted"));

    // Second shallow answer: budget spent, stage advances anyway.
    let outcome = h.orchestrator.process_message(&user(), "to manager").await.unwrap();
    assert!(outcome.reply.contains("value proposition"));
    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingValueProp);
    // Follow-up answer deepened the original rather than replacing it.
    assert_eq!(profile.career_goals.as_deref(), Some("get promoted\nto manager"));
}

#[tokio::test]
async fn shallow_check_counts_characters_not_bytes() {
    let provider = MockConversationProvider::new().with_reply("Could you say a bit more?");
    let h = harness(provider, MockResumeExtractor::new());
    seed_profile(&h.store, |p| {
        p.resume_text = Some("resume".to_string());
        p.contact_email = Some("jo@example.com".to_string());
        p.contact_phone = Some("5551234567".to_string());
        p.stage = Stage::AwaitingGoals;
    })
    .await;

    // 14 characters but 42 bytes of UTF-8: still a shallow answer.
    let outcome = h
        .orchestrator
        .process_message(&user(), "チームを率いて成長したいです")
        .await
        .unwrap();

    assert_eq!(outcome.reply, "Could you say a bit more?");
    assert_eq!(stored_profile(&h.store).await.stage, Stage::AwaitingGoals);
}

#[tokio::test]
async fn provider_failure_returns_retry_reply_without_mutation() {
    let provider = MockConversationProvider::new().with_error(MockConverseError::Unavailable {
        message: "down".to_string(),
    });
    let h = harness(provider, MockResumeExtractor::new());
    seed_profile(&h.store, |p| {
        p.resume_text = Some("resume".to_string());
        p.contact_email = Some("jo@example.com".to_string());
        p.contact_phone = Some("5551234567".to_string());
        p.stage = Stage::AwaitingGoals;
    })
    .await;

    let outcome = h
        .orchestrator
        .process_message(&user(), "I want to lead a platform org someday")
        .await
        .unwrap();

    assert!(outcome.reply.contains("try that again"));
    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::AwaitingGoals);
    assert!(profile.career_goals.is_none());
}

#[tokio::test]
async fn delivery_email_stage_validates_locally() {
    let h = harness(MockConversationProvider::new(), MockResumeExtractor::new());
    seed_profile(&h.store, |p| {
        p.resume_text = Some("resume".to_string());
        p.contact_email = Some("jo@example.com".to_string());
        p.contact_phone = Some("5551234567".to_string());
        p.career_goals = Some("lead a platform team".to_string());
        p.value_proposition = Some("deep systems expertise".to_string());
        p.achievements = vec!["shipped a major migration".to_string()];
        p.stage = Stage::AwaitingEmail;
    })
    .await;

    let outcome = h.orchestrator.process_message(&user(), "not-an-email").await.unwrap();
    assert!(outcome.reply.contains("doesn't look like an email address"));
    assert_eq!(stored_profile(&h.store).await.stage, Stage::AwaitingEmail);

    let outcome = h
        .orchestrator
        .process_message(&user(), "jo@inbox.example.com")
        .await
        .unwrap();
    assert!(outcome.reply.contains("collected everything"));

    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::Complete);
    assert_eq!(profile.delivery_email.as_deref(), Some("jo@inbox.example.com"));
    // Everything except LinkedIn (weight 5) is satisfied.
    assert_eq!(profile.completion().value(), 95);
    // The provider is never consulted for the delivery email.
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn completed_conversation_answers_every_channel_with_confirmation() {
    let h = harness(
        MockConversationProvider::new(),
        MockResumeExtractor::new().with_text(RESUME_TEXT),
    );
    seed_profile(&h.store, |p| {
        p.name = Some("Jo".to_string());
        p.resume_text = Some("resume".to_string());
        p.stage = Stage::Complete;
    })
    .await;

    let chat = h.orchestrator.process_message(&user(), "hello again").await.unwrap();
    assert!(chat.reply.contains("collected everything"));

    let upload = h.orchestrator.process_upload(&user(), b"%PDF-").await.unwrap();
    assert!(upload.reply.contains("collected everything"));

    let contact = h
        .orchestrator
        .process_contact(&user(), "x@y.co", "5551234567")
        .await
        .unwrap();
    assert!(contact.reply.contains("collected everything"));

    // Stage held and the late contact submission changed nothing.
    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.stage, Stage::Complete);
    assert!(profile.contact_email.is_none());
}

#[tokio::test]
async fn full_conversation_reaches_one_hundred_percent_monotonically() {
    let provider = MockConversationProvider::new()
        // Goals turn extracts nothing extra.
        .with_reply("Great goals!")
        // Value prop turn.
        .with_reply("Strong positioning!")
        // Achievements turn spots the LinkedIn profile too.
        .with_outcome(ConverseOutcome {
            reply: "Impressive!".to_string(),
            field_deltas: vec![FieldDelta::new(
                FieldId::LinkedInUrl,
                "https://linkedin.com/in/jo",
            )],
            needs_follow_up: false,
        });
    let h = harness(
        provider,
        MockResumeExtractor::new().with_text("Jo Example\njo@example.com\nEngineer."),
    );

    let mut last = 0u8;
    let mut check = |completion: u8| {
        assert!(completion >= last, "completion regressed: {} -> {}", last, completion);
        last = completion;
    };

    check(h.orchestrator.process_message(&user(), "hi").await.unwrap().completion.value());
    check(h.orchestrator.process_upload(&user(), b"%PDF-").await.unwrap().completion.value());
    check(
        h.orchestrator
            .process_contact(&user(), "jo@example.com", "+1 (555) 123-4567")
            .await
            .unwrap()
            .completion
            .value(),
    );
    check(
        h.orchestrator
            .process_message(&user(), "I want to grow into a principal engineer role at scale")
            .await
            .unwrap()
            .completion
            .value(),
    );
    check(
        h.orchestrator
            .process_message(&user(), "I pair deep systems knowledge with clear communication")
            .await
            .unwrap()
            .completion
            .value(),
    );
    check(
        h.orchestrator
            .process_message(&user(), "I led a 12-person team through a zero-downtime migration")
            .await
            .unwrap()
            .completion
            .value(),
    );
    let final_outcome = h
        .orchestrator
        .process_message(&user(), "jo@inbox.example.com")
        .await
        .unwrap();
    check(final_outcome.completion.value());

    assert_eq!(final_outcome.completion.value(), 100);
    assert_eq!(stored_profile(&h.store).await.stage, Stage::Complete);
}

#[tokio::test]
async fn concurrent_turns_for_one_user_serialize_without_losing_updates() {
    let h = harness(MockConversationProvider::new(), MockResumeExtractor::new());
    seed_profile(&h.store, |p| {
        p.resume_text = Some("resume".to_string());
        p.contact_email = Some("jo@example.com".to_string());
        p.contact_phone = Some("5551234567".to_string());
        p.career_goals = Some("lead a platform team".to_string());
        p.stage = Stage::AwaitingValueProp;
    })
    .await;

    // One turn answers the value-prop question, the other resubmits contact
    // info. The writes touch disjoint fields, so both must survive whichever
    // order the per-user lock grants.
    let message = "I combine deep systems knowledge with clear writing for executives";
    let user_id = user();
    let (chat_turn, contact_turn) = tokio::join!(
        h.orchestrator.process_message(&user_id, message),
        h.orchestrator.process_contact(&user_id, "new@example.com", "5559876543"),
    );
    chat_turn.unwrap();
    contact_turn.unwrap();

    let profile = stored_profile(&h.store).await;
    assert_eq!(profile.value_proposition.as_deref(), Some(message));
    assert_eq!(profile.contact_email.as_deref(), Some("new@example.com"));
    assert_eq!(profile.contact_phone.as_deref(), Some("5559876543"));

    // Two turns, four transcript entries.
    let transcript = h.store.load_transcript(&user()).await.unwrap();
    assert_eq!(transcript.len(), 4);
}
