//! Hosted chat-completion predictor (Groq's OpenAI-compatible endpoint).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use stockpilot_ai::prompt::{PROBE_PROMPT, SYSTEM_PROMPT, decode_prediction, decode_probe, prediction_prompt};
use stockpilot_ai::{AiError, PredictionInput, PredictionResult, RemotePredictor};

use crate::config::GroqConfig;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

pub struct GroqPredictor {
    client: reqwest::Client,
    config: GroqConfig,
}

impl GroqPredictor {
    pub fn new(config: GroqConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GroqConfig {
        &self.config
    }

    /// One chat round-trip; returns the assistant message text.
    async fn complete(&self, user_prompt: &str, limit: Duration) -> Result<String, AiError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.config.temperature,
        };

        let call = async {
            let resp = self
                .client
                .post(&self.config.endpoint)
                .bearer_auth(&self.config.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| transport_error(e, limit))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(AiError::Status {
                    status: status.as_u16(),
                });
            }

            let parsed: ChatResponse = resp
                .json()
                .await
                .map_err(|e| AiError::MalformedReply(e.to_string()))?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| AiError::MalformedReply("reply has no message content".to_string()))
        };

        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| AiError::Timeout(limit))?
    }
}

fn transport_error(e: reqwest::Error, limit: Duration) -> AiError {
    if e.is_timeout() {
        AiError::Timeout(limit)
    } else {
        AiError::Transport(e.to_string())
    }
}

#[async_trait]
impl RemotePredictor for GroqPredictor {
    fn name(&self) -> &'static str {
        "groq"
    }

    async fn try_predict(&self, input: &PredictionInput) -> Result<PredictionResult, AiError> {
        let reply = self
            .complete(&prediction_prompt(input), self.config.timeout)
            .await?;
        debug!(sku = %input.sku, "groq prediction reply received");
        decode_prediction(&reply)
    }

    async fn probe(&self) -> Result<(), AiError> {
        let reply = self.complete(PROBE_PROMPT, self.config.probe_timeout).await?;
        decode_probe(&reply)
    }
}
