use serde::{Deserialize, Serialize};

/// Transcription request sent to the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeRequest {
    pub session_id: String,
    pub audio: String, // Base64-encoded recording
    pub encoding: String,
    pub sample_rate: u32,
    pub language: String,
    #[serde(default)]
    pub alternative_languages: Vec<String>,
    pub timestamp: String, // RFC3339 timestamp
}

/// Transcription reply from the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeReply {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Speech synthesis request sent to the TTS service
#[derive(Debug, Serialize, Deserialize)]
pub struct SynthesizeRequest {
    pub session_id: String,
    pub text: String,
    pub language: String,
    #[serde(default)]
    pub voice: Option<String>,
    pub encoding: String,
    pub timestamp: String,
}

/// Speech synthesis reply from the TTS service
#[derive(Debug, Serialize, Deserialize)]
pub struct SynthesizeReply {
    #[serde(default)]
    pub audio: String, // Base64-encoded audio
    #[serde(default)]
    pub error: Option<String>,
}

/// Invitation handed to the mail delivery service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationMessage {
    pub interview_id: String,
    pub name: String,
    pub role: String,
    pub contact: String,
    pub link: String,
    #[serde(default)]
    pub organization: Option<String>,
    pub timestamp: String,
}
