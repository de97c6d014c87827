use anyhow::Result;
use serde::Deserialize;

use crate::interview::InterviewPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub interview: InterviewPolicy,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub collaborators: CollaboratorConfig,
    #[serde(default)]
    pub invitations: InvitationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// Base URL invitation links point at
    pub public_url: String,
    /// Where denied or unknown report views are sent
    #[serde(default = "default_denied_redirect")]
    pub denied_redirect: String,
}

fn default_denied_redirect() -> String {
    "/dashboard".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    NatsKv,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

fn default_bucket() -> String {
    "interviews".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            bucket: default_bucket(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub stt_subject: String,
    pub tts_subject: String,
    pub language: String,
    #[serde(default)]
    pub alternative_languages: Vec<String>,
    #[serde(default)]
    pub voice: Option<String>,
    /// Encoding of recorded audio (browser MediaRecorder default)
    pub input_encoding: String,
    pub input_sample_rate: u32,
    pub output_encoding: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            stt_subject: "stt.transcribe".to_string(),
            tts_subject: "tts.synthesize".to_string(),
            language: "es-ES".to_string(),
            alternative_languages: vec!["es-MX".to_string(), "en-US".to_string()],
            voice: None,
            input_encoding: "webm_opus".to_string(),
            input_sample_rate: 48000,
            output_encoding: "mp3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmConfig {
    /// Chat completions endpoint
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorMode {
    #[default]
    Live,
    /// Scripted substitutes, no external calls
    DryRun,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CollaboratorConfig {
    #[serde(default)]
    pub mode: CollaboratorMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvitationMode {
    Deliver,
    /// Build links and log them, deliver nothing
    #[default]
    DryRun,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationConfig {
    #[serde(default)]
    pub mode: InvitationMode,
    #[serde(default = "default_invitation_subject")]
    pub subject: String,
}

fn default_invitation_subject() -> String {
    "notify.invitation".to_string()
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            mode: InvitationMode::DryRun,
            subject: default_invitation_subject(),
        }
    }
}

impl Config {
    /// Load from a config file, with `INTERVIEWS__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("INTERVIEWS").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Check that every live collaborator has what it needs
    pub fn validate(&self) -> crate::Result<()> {
        let needs_nats = self.collaborators.mode == CollaboratorMode::Live
            || self.store.backend == StoreBackend::NatsKv
            || self.invitations.mode == InvitationMode::Deliver;

        if needs_nats && self.nats_url().is_none() {
            return Err(crate::Error::Config(
                "nats.url is required for live speech, the nats_kv store or invitation delivery"
                    .to_string(),
            ));
        }

        if self.collaborators.mode == CollaboratorMode::Live {
            if self.llm.endpoint.trim().is_empty() {
                return Err(crate::Error::Config(
                    "llm.endpoint is required in live mode".to_string(),
                ));
            }
            if self.llm.model.trim().is_empty() {
                return Err(crate::Error::Config(
                    "llm.model is required in live mode".to_string(),
                ));
            }
            if self.llm_api_key().is_none() {
                return Err(crate::Error::Config(
                    "llm.api_key is required in live mode (set INTERVIEWS__LLM__API_KEY)"
                        .to_string(),
                ));
            }
        }

        if self.interview.max_turns == 0 {
            return Err(crate::Error::Config(
                "interview.max_turns must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn nats_url(&self) -> Option<&str> {
        self.nats
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn llm_api_key(&self) -> Option<&str> {
        self.llm
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
