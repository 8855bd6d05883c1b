//! Language-model narration of research turns
//!
//! The narrator is an optional text-in/text-out collaborator. It never feeds
//! back into the research itself; its output is stored as turn commentary.

use crate::research::transcript::{RoleKind, Transcript};
use crate::types::{AppError, Result};
use crate::utils::config::NarratorConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

#[async_trait]
pub trait Narrator: Send + Sync {
    /// Produce an utterance for `role` given the goal and the turns so far.
    async fn narrate(&self, goal: &str, role: RoleKind, transcript: &Transcript) -> Result<String>;
}

/// Narrator backed by an Ollama server (`POST {base}/api/chat`).
pub struct OllamaNarrator {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaNarrator {
    pub fn new(config: &NarratorConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn system_prompt(role: RoleKind) -> String {
        let duty = match role {
            RoleKind::Planner => "You lead a Pokémon research team and turn goals into research plans.",
            RoleKind::Collector => "You collect Pokémon data and explain what the numbers show.",
            RoleKind::Reporter => "You present research findings to trainers.",
        };
        format!(
            "You are {}. {} Reply with two or three sentences in character. Do not invent data.",
            role.persona(),
            duty
        )
    }

    fn parse_response(body: &Value) -> Result<String> {
        body.get("message")
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::LLM("Response has no message content".to_string()))
    }
}

#[async_trait]
impl Narrator for OllamaNarrator {
    async fn narrate(&self, goal: &str, role: RoleKind, transcript: &Transcript) -> Result<String> {
        let user = format!(
            "Research goal: {}\n\nTranscript so far:\n{}\nComment on the latest turn.",
            goal,
            transcript.render_text()
        );

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": Self::system_prompt(role)},
                {"role": "user", "content": user}
            ],
            "stream": false,
            "options": {
                "temperature": self.temperature
            }
        });

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLM(format!(
                "Ollama request failed ({}): {}",
                status, text
            )));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| AppError::LLM(format!("Failed to parse response: {}", e)))?;

        Self::parse_response(&response_json)
    }
}
