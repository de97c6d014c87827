use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::prompt::{agent_system_prompt, report_system_prompt, AgentContext, ReportFraming};
use super::{ChatAgent, ReportGenerator};
use crate::config::LlmConfig;
use crate::model::{Speaker, Turn};

/// Client for an OpenAI-compatible chat completions endpoint
pub struct LlmClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow!("llm.api_key is not set"))?
            .to_string();

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
        })
    }

    async fn complete(&self, messages: Vec<ChatMessage>, json: bool) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            response_format: json.then_some(ResponseFormat { kind: "json_object" }),
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Chat completion request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Chat completion returned HTTP {status}: {body}");
        }

        let body: ChatResponse = resp
            .json()
            .await
            .context("Chat completion returned an unreadable body")?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            bail!("Chat completion returned no content");
        }

        Ok(content)
    }
}

fn role_for(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::Participant => "user",
        Speaker::Agent => "assistant",
    }
}

#[async_trait::async_trait]
impl ChatAgent for LlmClient {
    async fn reply(
        &self,
        history: &[Turn],
        text: &str,
        context: Option<&AgentContext>,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::new("system", agent_system_prompt(context)));
        messages.extend(
            history
                .iter()
                .map(|turn| ChatMessage::new(role_for(turn.speaker), turn.text.clone())),
        );
        messages.push(ChatMessage::new("user", text));

        debug!("Requesting reply with {} history turns", history.len());
        self.complete(messages, false).await
    }
}

#[async_trait::async_trait]
impl ReportGenerator for LlmClient {
    async fn generate(&self, transcript: &str, framing: ReportFraming) -> Result<String> {
        let messages = vec![
            ChatMessage::new("system", report_system_prompt(framing)),
            ChatMessage::new("user", format!("TRANSCRIPT:\n{transcript}")),
        ];

        info!("Requesting {:?} report ({} chars of transcript)", framing, transcript.len());
        self.complete(messages, true).await
    }
}
