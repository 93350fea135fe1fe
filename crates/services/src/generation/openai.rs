use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GeneratedQuestions, QuestionGenerator, enforce_count, parse_questions};
use crate::error::GenerationError;

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Fail with `GenerationError::Short` instead of accepting fewer
    /// questions than requested.
    pub strict: bool,
}

impl OpenAiConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: api_key.into(),
            model: "gpt-4o-mini".into(),
            strict: false,
        }
    }

    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("QUIZ_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let mut config = Self::new(api_key);
        if let Ok(base_url) = env::var("QUIZ_AI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = env::var("QUIZ_AI_MODEL") {
            config.model = model;
        }
        Some(config)
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Question generator backed by an OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct OpenAiQuestionGenerator {
    client: Client,
    config: Option<OpenAiConfig>,
}

impl OpenAiQuestionGenerator {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(OpenAiConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<OpenAiConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn complete(&self, config: &OpenAiConfig, prompt: String) -> Result<String, GenerationError> {
        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        Ok(content)
    }
}

#[async_trait]
impl QuestionGenerator for OpenAiQuestionGenerator {
    async fn generate(
        &self,
        text: &str,
        count: usize,
    ) -> Result<GeneratedQuestions, GenerationError> {
        let config = self.config.as_ref().ok_or(GenerationError::Disabled)?;

        log::debug!("requesting {count} questions from {}", config.model);
        let reply = self.complete(config, build_prompt(text, count)).await?;
        enforce_count(parse_questions(&reply, count)?, config.strict)
    }
}

fn build_prompt(text: &str, count: usize) -> String {
    format!(
        r#"Generate {count} multiple-choice questions based on the content below. Each question has exactly 4 options and exactly one of them is correct; "correct_answer" must repeat that option verbatim. Reply with JSON only, in this format:
{{
  "questions": [
    {{
      "question": "...",
      "correct_answer": "...",
      "options": ["...", "...", "...", "..."]
    }}
  ]
}}

Content: {text}"#
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_without_config() {
        let generator = OpenAiQuestionGenerator::new(None);
        assert!(!generator.enabled());
        let err = generator.generate("text", 5).await.unwrap_err();
        assert!(matches!(err, GenerationError::Disabled));
    }

    #[test]
    fn prompt_names_count_and_shape() {
        let prompt = build_prompt("Supply meets demand.", 3);
        assert!(prompt.starts_with("Generate 3 multiple-choice questions"));
        assert!(prompt.contains(r#""correct_answer": "...""#));
        assert!(prompt.ends_with("Content: Supply meets demand."));
    }

    #[test]
    fn chat_response_reads_first_choice() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{}"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("{}"));
    }
}
