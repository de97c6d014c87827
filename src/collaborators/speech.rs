use anyhow::{anyhow, Context, Result};
use base64::Engine;
use std::sync::Arc;
use tracing::{debug, info};

use super::{SpeechSynthesizer, Transcriber};
use crate::config::SpeechConfig;
use crate::nats::{NatsClient, SynthesizeReply, SynthesizeRequest, TranscribeReply, TranscribeRequest};

/// Speech-to-text and text-to-speech over NATS request/reply
pub struct NatsSpeech {
    nats: Arc<NatsClient>,
    config: SpeechConfig,
}

impl NatsSpeech {
    pub fn new(nats: Arc<NatsClient>, config: SpeechConfig) -> Self {
        Self { nats, config }
    }
}

#[async_trait::async_trait]
impl Transcriber for NatsSpeech {
    async fn transcribe(&self, session_id: &str, audio: &[u8]) -> Result<String> {
        let request = TranscribeRequest {
            session_id: session_id.to_string(),
            audio: base64::engine::general_purpose::STANDARD.encode(audio),
            encoding: self.config.input_encoding.clone(),
            sample_rate: self.config.input_sample_rate,
            language: self.config.language.clone(),
            alternative_languages: self.config.alternative_languages.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let reply: TranscribeReply = self
            .nats
            .request(&self.config.stt_subject, &request)
            .await
            .context("Transcription request failed")?;

        if let Some(error) = reply.error {
            return Err(anyhow!("Transcription service error: {}", error));
        }

        info!(
            "Transcribed {} bytes of audio for {} (confidence={:?})",
            audio.len(),
            session_id,
            reply.confidence
        );

        Ok(reply.text.trim().to_string())
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for NatsSpeech {
    async fn synthesize(&self, session_id: &str, text: &str) -> Result<Vec<u8>> {
        let request = SynthesizeRequest {
            session_id: session_id.to_string(),
            text: text.to_string(),
            language: self.config.language.clone(),
            voice: self.config.voice.clone(),
            encoding: self.config.output_encoding.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let reply: SynthesizeReply = self
            .nats
            .request(&self.config.tts_subject, &request)
            .await
            .context("Synthesis request failed")?;

        if let Some(error) = reply.error {
            return Err(anyhow!("Synthesis service error: {}", error));
        }

        let audio = base64::engine::general_purpose::STANDARD
            .decode(reply.audio.as_bytes())
            .context("Synthesis reply carried invalid base64 audio")?;

        if audio.is_empty() {
            return Err(anyhow!("Synthesis service returned no audio"));
        }

        debug!("Synthesized {} bytes of audio for {}", audio.len(), session_id);

        Ok(audio)
    }
}

/// Strip markdown markup so it is not read aloud
pub fn clean_for_speech(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '*' | '#' | '`' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}
