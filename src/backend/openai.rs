//! OpenAI-compatible text service
//!
//! Generates post text by calling any OpenAI-compatible chat completions
//! endpoint (OpenAI, Ollama, vLLM, LM Studio, etc.).

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::OpenAiSettings;
use crate::error::{Error, Result};

use super::style::{build_text_prompt, format_with_mood};
use super::{Artifact, ContentParams, GenerationService, Modality, StyleParams};

const SERVICE: &str = "openai";

const SYSTEM_PROMPT: &str = "You write short, natural social media posts in the first person. \
Reply with the post text only.";

// ─────────────────────────────────────────────────────────────────
// OpenAI API types (request/response)
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    total_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────
// OpenAI Text Service
// ─────────────────────────────────────────────────────────────────

/// Text generation through an OpenAI-compatible API
pub struct OpenAiTextService {
    config: OpenAiSettings,
    client: OnceCell<Client>,
    total_requests: RwLock<u64>,
    total_tokens: RwLock<u64>,
}

impl OpenAiTextService {
    pub fn new(config: OpenAiSettings) -> Self {
        info!(
            base_url = %config.base_url,
            model = %config.model,
            "OpenAI-compatible text service configured"
        );

        Self {
            config,
            client: OnceCell::new(),
            total_requests: RwLock::new(0),
            total_tokens: RwLock::new(0),
        }
    }

    /// Successful requests and tokens consumed so far
    pub fn usage(&self) -> (u64, u64) {
        (*self.total_requests.read(), *self.total_tokens.read())
    }

    /// Build the authorization header value (if API key is set)
    fn auth_header(&self) -> Option<String> {
        if self.config.api_key.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", self.config.api_key))
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                Client::builder()
                    .timeout(Duration::from_secs(self.config.timeout_secs))
                    .build()
                    .map_err(|e| {
                        Error::generation(SERVICE, format!("failed to create HTTP client: {}", e))
                    })
            })
            .await
    }

    /// Make a chat completion request with retry logic
    async fn chat_completion(&self, prompt: String) -> Result<String> {
        let client = self.client().await?;

        let request_body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        let url = self.completions_url();
        let mut last_error: Option<Error> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(500 * 2u64.pow(attempt - 1));
                debug!(attempt, ?backoff, "Retrying after error");
                tokio::time::sleep(backoff).await;
            }

            let mut req = client.post(&url).json(&request_body);
            if let Some(ref auth) = self.auth_header() {
                req = req.header("Authorization", auth);
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        match response.json::<ChatCompletionResponse>().await {
                            Ok(parsed) => {
                                *self.total_requests.write() += 1;
                                if let Some(u) = parsed.usage {
                                    *self.total_tokens.write() += u.total_tokens as u64;
                                }

                                let choice = parsed.choices.into_iter().next().ok_or_else(|| {
                                    Error::generation(SERVICE, "no choices in API response")
                                })?;
                                return Ok(choice.message.content.unwrap_or_default());
                            }
                            Err(e) => {
                                last_error = Some(Error::generation(
                                    SERVICE,
                                    format!("failed to parse API response: {}", e),
                                ));
                            }
                        }
                    } else if status.as_u16() == 429 || status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        warn!(status = %status, attempt, "Retryable API error: {}", body);
                        last_error = Some(Error::generation(
                            SERVICE,
                            format!("API error {}: {}", status, body),
                        ));
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::generation(
                            SERVICE,
                            format!("API error {}: {}", status, body),
                        ));
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        warn!(attempt, error = %e, "Request timed out");
                        last_error = Some(Error::GenerationTimeout {
                            service: SERVICE.to_string(),
                            timeout_secs: self.config.timeout_secs,
                        });
                    } else if e.is_connect() {
                        warn!(attempt, error = %e, "Retryable connection error");
                        last_error =
                            Some(Error::generation(SERVICE, format!("connection error: {}", e)));
                    } else {
                        return Err(Error::generation(SERVICE, format!("request error: {}", e)));
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::generation(SERVICE, "all retry attempts exhausted")))
    }
}

/// User prompt for one post.
fn post_prompt(content: &ContentParams, style: &StyleParams) -> String {
    let mut request = format!("Write a short social media post about {}.", content.prompt.trim());
    if let Some(ref mood) = style.mood {
        request.push_str(&format!(" You are feeling {}.", mood));
    }
    build_text_prompt(&request, &style.traits, content.topic.as_deref(), &content.history)
}

#[async_trait]
impl GenerationService for OpenAiTextService {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn modality(&self) -> Modality {
        Modality::Text
    }

    async fn initialize(&self) -> Result<()> {
        self.client().await.map(|_| ())
    }

    async fn generate(
        &self,
        content: &ContentParams,
        style: &StyleParams,
    ) -> Result<Option<Artifact>> {
        if content.prompt.trim().is_empty() {
            return Err(Error::generation(SERVICE, "rejected prompt: cannot be empty"));
        }
        style
            .preset
            .check(Modality::Text)
            .map_err(|e| e.rejected_by(SERVICE))?;

        let reply = self.chat_completion(post_prompt(content, style)).await?;
        if reply.trim().is_empty() {
            return Err(Error::generation(SERVICE, "empty completion"));
        }

        let mut rng = StdRng::seed_from_u64(style.variant);
        let text = format_with_mood(&reply, style.mood.as_deref().unwrap_or_default(), &mut rng);
        Ok(Some(Artifact::Text(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_header() {
        let service = OpenAiTextService::new(OpenAiSettings {
            api_key: "sk-test-123".to_string(),
            ..Default::default()
        });
        assert_eq!(service.auth_header(), Some("Bearer sk-test-123".to_string()));

        let no_key = OpenAiTextService::new(OpenAiSettings::default());
        assert_eq!(no_key.auth_header(), None);
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let service = OpenAiTextService::new(OpenAiSettings {
            base_url: "http://localhost:11434/v1/".to_string(),
            ..Default::default()
        });
        assert_eq!(service.completions_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_post_prompt() {
        let content = ContentParams {
            prompt: "street food".to_string(),
            topic: Some("food".to_string()),
            history: vec!["Yesterday's chai".to_string()],
        };
        let style = StyleParams {
            mood: Some("excited".to_string()),
            traits: vec!["Adventurous".to_string()],
            ..Default::default()
        };
        let prompt = post_prompt(&content, &style);
        assert!(prompt.starts_with("Yesterday's chai\n"));
        assert!(prompt.contains("Speaking as someone who is Adventurous"));
        assert!(prompt.contains("about street food. You are feeling excited."));
        assert!(prompt.contains("cuisine"));
    }

    #[tokio::test]
    async fn test_initialize_builds_client_once() {
        let service = OpenAiTextService::new(OpenAiSettings::default());
        service.initialize().await.unwrap();
        service.initialize().await.unwrap();
        assert!(service.client.get().is_some());
        assert_eq!(service.usage(), (0, 0));
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_without_request() {
        let service = OpenAiTextService::new(OpenAiSettings::default());
        let err = service
            .generate(&ContentParams::default(), &StyleParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation { .. }));
        assert!(err.is_recoverable());
    }
}
