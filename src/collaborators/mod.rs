//! External capabilities the interview consumes
//!
//! - `Transcriber`: recorded audio → text (best effort, empty is fine)
//! - `ChatAgent`: history + new participant text → interviewer reply
//! - `SpeechSynthesizer`: plain text → audio
//! - `ReportGenerator`: transcript → structured report payload
//!
//! Live implementations talk to the speech services over NATS and to a chat
//! completions endpoint over HTTP. Dry-run substitutes answer from a script
//! and say so in the logs.

mod dry_run;
mod llm;
mod prompt;
mod speech;

pub use dry_run::{DryRunChat, DryRunReports, DryRunSpeech};
pub use llm::LlmClient;
pub use prompt::{
    agent_system_prompt, report_system_prompt, AgentContext, ParticipantExcerpt, ReportFraming,
    TeamMember, READY_PROMPT,
};
pub use speech::{clean_for_speech, NatsSpeech};

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{CollaboratorMode, Config};
use crate::model::Turn;
use crate::nats::NatsClient;

#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one recording
    async fn transcribe(&self, session_id: &str, audio: &[u8]) -> Result<String>;
}

#[async_trait::async_trait]
pub trait ChatAgent: Send + Sync {
    /// Produce the interviewer's next reply.
    ///
    /// `history` is every earlier turn in order; `text` is the participant's
    /// new utterance.
    async fn reply(
        &self,
        history: &[Turn],
        text: &str,
        context: Option<&AgentContext>,
    ) -> Result<String>;
}

#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize plain text into audio bytes
    async fn synthesize(&self, session_id: &str, text: &str) -> Result<Vec<u8>>;
}

#[async_trait::async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Ask for a structured report; returns the raw payload text
    async fn generate(&self, transcript: &str, framing: ReportFraming) -> Result<String>;
}

/// The set of collaborators, built once at startup
#[derive(Clone)]
pub struct Collaborators {
    pub transcriber: Arc<dyn Transcriber>,
    pub chat: Arc<dyn ChatAgent>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub reports: Arc<dyn ReportGenerator>,
}

impl Collaborators {
    /// Build collaborators for the configured mode.
    ///
    /// Call `Config::validate` first: live mode fails here on missing settings.
    pub async fn from_config(config: &Config) -> Result<Self> {
        match config.collaborators.mode {
            CollaboratorMode::DryRun => {
                warn!(dry_run = true, "Using scripted collaborators, no speech or chat calls will be made");
                Ok(Self::dry_run())
            }
            CollaboratorMode::Live => {
                let url = config
                    .nats_url()
                    .ok_or_else(|| anyhow::anyhow!("nats.url is required in live mode"))?;
                let nats = Arc::new(
                    NatsClient::connect(url, Duration::from_secs(config.nats.request_timeout_secs))
                        .await?,
                );
                let speech = Arc::new(NatsSpeech::new(nats, config.speech.clone()));
                let llm = Arc::new(LlmClient::new(&config.llm)?);

                info!("Live collaborators ready (model {})", config.llm.model);

                Ok(Self {
                    transcriber: speech.clone(),
                    chat: llm.clone(),
                    speech,
                    reports: llm,
                })
            }
        }
    }

    pub fn dry_run() -> Self {
        let speech = Arc::new(DryRunSpeech);
        Self {
            transcriber: speech.clone(),
            chat: Arc::new(DryRunChat),
            speech,
            reports: Arc::new(DryRunReports),
        }
    }
}
