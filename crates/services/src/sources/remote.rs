use std::env;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::Question;
use reqwest::Client;

use super::adapters::{GeneratedPayload, from_generated};
use super::{DEFAULT_QUESTION_COUNT, QuestionSource, QuizRequest};
use crate::error::SourceError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub webhook_url: String,
    pub timeout: Duration,
    pub question_count: u32,
}

impl GeneratorConfig {
    #[must_use]
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            timeout: DEFAULT_TIMEOUT,
            question_count: DEFAULT_QUESTION_COUNT,
        }
    }

    /// Read the generator settings from the environment.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from a key lookup.
    ///
    /// Returns `None` when `QUIZ_WEBHOOK_URL` is missing or blank. Numeric
    /// overrides that are unparseable or zero fall back to their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let webhook_url = lookup("QUIZ_WEBHOOK_URL")?;
        if webhook_url.trim().is_empty() {
            return None;
        }

        let timeout = lookup("QUIZ_WEBHOOK_TIMEOUT_SECS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        let question_count = lookup("QUIZ_QUESTION_COUNT")
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|count| *count > 0)
            .unwrap_or(DEFAULT_QUESTION_COUNT);

        Some(Self {
            webhook_url: webhook_url.trim().to_string(),
            timeout,
            question_count,
        })
    }
}

/// Question source backed by an HTTP webhook that generates quizzes from lesson text.
#[derive(Clone)]
pub struct RemoteQuestionSource {
    client: Client,
    config: GeneratorConfig,
}

impl RemoteQuestionSource {
    /// Build a source with a client bounded by the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be constructed.
    pub fn new(config: GeneratorConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Build a source from the environment, or `None` when no webhook is configured.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be constructed.
    pub fn from_env() -> Result<Option<Self>, reqwest::Error> {
        GeneratorConfig::from_env().map(Self::new).transpose()
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

#[async_trait]
impl QuestionSource for RemoteQuestionSource {
    async fn fetch_questions(&self, request: &QuizRequest) -> Result<Vec<Question>, SourceError> {
        log::debug!(
            "requesting {} questions for lesson {} from {}",
            request.question_count,
            request.lesson_id,
            self.config.webhook_url
        );

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus(status));
        }

        let body = response.text().await?;
        let payload: GeneratedPayload = serde_json::from_str(&body)?;
        let questions = from_generated(payload.into_questions())?;

        log::info!(
            "generator returned {} questions for lesson {}",
            questions.len(),
            request.lesson_id
        );
        Ok(questions)
    }
}
