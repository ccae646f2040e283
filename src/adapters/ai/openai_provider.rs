//! OpenAI Provider - Implementation of ConversationProvider for OpenAI's API.
//!
//! One chat-completions call per turn. The model is asked to answer as the
//! intake assistant AND to report any career data it spotted, as a single
//! JSON object, so the reply text and the field deltas arrive together.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::domain::profile::{FieldDelta, FieldId, Role, Stage};
use crate::ports::{ConversationProvider, ConverseContext, ConverseError, ConverseOutcome};

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gpt-4o", "gpt-4o-mini").
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new OpenAI provider with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self, ConverseError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConverseError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Builds the message list: system prompt, transcript, current message.
    fn to_openai_request(&self, context: &ConverseContext) -> OpenAIRequest {
        let mut messages = vec![OpenAIMessage {
            role: "system".to_string(),
            content: system_prompt(context),
        }];

        for entry in &context.transcript {
            messages.push(OpenAIMessage {
                role: match entry.role {
                    Role::User => "user",
                    Role::Bot => "assistant",
                }
                .to_string(),
                content: entry.text.clone(),
            });
        }

        messages.push(OpenAIMessage {
            role: "user".to_string(),
            content: context.message.clone(),
        });

        OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            temperature: 0.7,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        }
    }

    async fn send_request(&self, context: &ConverseContext) -> Result<Response, ConverseError> {
        let openai_request = self.to_openai_request(context);

        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ConverseError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    ConverseError::Network(format!("connection failed: {}", e))
                } else {
                    ConverseError::Network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, ConverseError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(ConverseError::AuthenticationFailed),
            429 => Err(ConverseError::RateLimited {
                retry_after_secs: Self::parse_retry_after(&error_body),
            }),
            500..=599 => Err(ConverseError::Unavailable(format!(
                "server error {}: {}",
                status, error_body
            ))),
            _ => Err(ConverseError::Network(format!(
                "unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses retry-after seconds out of a rate-limit error body.
    fn parse_retry_after(error_body: &str) -> u32 {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
            if let Some(s) = parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
            {
                // "try again in Xs" pattern
                if let Some(idx) = s.find("try again in ") {
                    let rest = &s[idx + 13..];
                    if let Some(num_end) = rest.find(|c: char| !c.is_ascii_digit()) {
                        if let Ok(secs) = rest[..num_end].parse::<u32>() {
                            return secs;
                        }
                    }
                }
            }
        }
        30
    }

    async fn parse_response(&self, response: Response) -> Result<ConverseOutcome, ConverseError> {
        let response = self.handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ConverseError::Parse(format!("failed to parse response: {}", e)))?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ConverseError::Parse("no choices in response".to_string()))?;

        parse_model_turn(&choice.message.content)
    }
}

#[async_trait]
impl ConversationProvider for OpenAIProvider {
    async fn converse(&self, context: ConverseContext) -> Result<ConverseOutcome, ConverseError> {
        let mut last_error = ConverseError::Network("no attempts made".to_string());
        let mut retry_count = 0;

        while retry_count <= self.config.max_retries {
            match self.send_request(&context).await {
                Ok(response) => match self.parse_response(response).await {
                    Ok(outcome) => return Ok(outcome),
                    Err(err) => {
                        if !err.is_retryable() || retry_count >= self.config.max_retries {
                            return Err(err);
                        }
                        last_error = err;
                    }
                },
                Err(err) => {
                    if !err.is_retryable() || retry_count >= self.config.max_retries {
                        return Err(err);
                    }
                    last_error = err;
                }
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            sleep(Duration::from_secs(1 << retry_count)).await;
            retry_count += 1;
        }

        Err(last_error)
    }
}

/// Builds the per-turn system prompt from the conversation context.
fn system_prompt(context: &ConverseContext) -> String {
    let name_line = match &context.name {
        Some(name) => format!("The user's name is {}.", name),
        None => "The user's name is not known yet.".to_string(),
    };

    let missing = if context.missing_fields.is_empty() {
        "none".to_string()
    } else {
        context.missing_fields.join(", ")
    };

    let captured = if context.captured.is_empty() {
        "nothing yet".to_string()
    } else {
        context
            .captured
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    };

    format!(
        "You are a friendly career-intake assistant collecting a professional \
         profile through conversation. {name_line}\n\
         Current topic: {topic}.\n\
         Already provided: {captured}.\n\
         Still missing: {missing}.\n\n\
         Respond with a single JSON object with exactly these keys:\n\
         {{\"reply\": \"<your conversational reply>\", \
         \"fields\": {{\"<field_name>\": \"<value>\", ...}}, \
         \"needs_follow_up\": <true|false>}}\n\n\
         Put any career data the user just shared into \"fields\", using only \
         these field names: email, phone, linkedin_url, career_goals, \
         value_proposition, achievements, delivery_email. Omit fields you did \
         not learn. Set \"needs_follow_up\" to true only when the user's answer \
         on the current topic is too thin to be useful.",
        name_line = name_line,
        topic = stage_topic(context.stage),
        captured = captured,
        missing = missing,
    )
}

fn stage_topic(stage: Stage) -> &'static str {
    match stage {
        Stage::AwaitingContactInfo => "their contact details (email, phone, LinkedIn)",
        Stage::AwaitingGoals => "their career goals",
        Stage::AwaitingValueProp => "the unique value they bring to an employer",
        Stage::AwaitingAchievements => "their proudest achievements",
        Stage::Start
        | Stage::AwaitingResume
        | Stage::AwaitingEmail
        | Stage::Complete => "general conversation",
    }
}

/// Parses the model's JSON turn into a [`ConverseOutcome`].
///
/// Unknown field names are dropped with a debug log; the downstream
/// validators decide whether the values themselves are usable.
fn parse_model_turn(content: &str) -> Result<ConverseOutcome, ConverseError> {
    let turn: ModelTurn = serde_json::from_str(content)
        .map_err(|e| ConverseError::Parse(format!("model output was not the expected JSON: {}", e)))?;

    if turn.reply.trim().is_empty() {
        return Err(ConverseError::Parse("model reply was empty".to_string()));
    }

    let mut field_deltas = Vec::new();
    for (name, value) in turn.fields {
        match field_id_by_name(&name) {
            Some(field) => field_deltas.push(FieldDelta::new(field, value)),
            None => debug!(field = %name, "dropping unknown field from model output"),
        }
    }

    Ok(ConverseOutcome {
        reply: turn.reply,
        field_deltas,
        needs_follow_up: turn.needs_follow_up,
    })
}

fn field_id_by_name(name: &str) -> Option<FieldId> {
    FieldId::ALL.into_iter().find(|id| id.name() == name)
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

/// The structured turn the model is instructed to emit.
#[derive(Debug, Deserialize)]
struct ModelTurn {
    reply: String,
    #[serde(default)]
    fields: BTreeMap<String, String>,
    #[serde(default)]
    needs_follow_up: bool,
}
