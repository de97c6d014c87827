use anyhow::Result;
use serde_json::json;
use tracing::warn;

use super::prompt::{AgentContext, ReportFraming};
use super::{ChatAgent, ReportGenerator, SpeechSynthesizer, Transcriber};
use crate::model::{Dimension, Horizon, Speaker, Turn};

const SCRIPT: &[&str] = &[
    "Welcome to the digital maturity diagnostic. Everything you share stays confidential. To begin, how would you describe your organization's strategy for data and AI?",
    "Thank you. How open is your team to experimenting with new tools?",
    "Which of your core processes are still mostly manual?",
    "Where does your key business data live today, and who can reach it?",
    "How do you use reports or dashboards to make decisions?",
    "What does your current technology stack look like?",
    "Who decides how AI and data may be used, and what rules apply?",
];

const CLOSING: &str = "That covers every area of the diagnostic. Thank you for your time.";

/// Scripted interviewer
pub struct DryRunChat;

#[async_trait::async_trait]
impl ChatAgent for DryRunChat {
    async fn reply(
        &self,
        history: &[Turn],
        _text: &str,
        context: Option<&AgentContext>,
    ) -> Result<String> {
        let asked = history
            .iter()
            .filter(|turn| turn.speaker == Speaker::Agent)
            .count();
        warn!(
            dry_run = true,
            enterprise = context.is_some(),
            "Scripted reply #{}",
            asked + 1
        );
        Ok(SCRIPT.get(asked).copied().unwrap_or(CLOSING).to_string())
    }
}

/// Echoes text back as "audio" and recordings back as text
pub struct DryRunSpeech;

#[async_trait::async_trait]
impl Transcriber for DryRunSpeech {
    async fn transcribe(&self, session_id: &str, audio: &[u8]) -> Result<String> {
        warn!(dry_run = true, "Transcribing {} bytes for {}", audio.len(), session_id);
        Ok(String::from_utf8_lossy(audio).trim().to_string())
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for DryRunSpeech {
    async fn synthesize(&self, session_id: &str, text: &str) -> Result<Vec<u8>> {
        warn!(dry_run = true, "Synthesizing {} chars for {}", text.len(), session_id);
        Ok(text.as_bytes().to_vec())
    }
}

/// Fixed mid-maturity report
pub struct DryRunReports;

#[async_trait::async_trait]
impl ReportGenerator for DryRunReports {
    async fn generate(&self, transcript: &str, framing: ReportFraming) -> Result<String> {
        warn!(
            dry_run = true,
            "Generating {:?} report from {} chars",
            framing,
            transcript.len()
        );

        let mut dimensions = serde_json::Map::new();
        for dimension in Dimension::ALL {
            dimensions.insert(
                dimension.key().to_string(),
                json!({
                    "score": 3,
                    "level": "Intermediate",
                    "analysis": format!("Scripted assessment of {}.", dimension.description()),
                    "recommendation": "Run a focused pilot and measure the outcome.",
                }),
            );
        }

        let mut roadmap = serde_json::Map::new();
        for horizon in Horizon::ALL {
            roadmap.insert(
                horizon.key().to_string(),
                json!([{
                    "title": format!("{} initiative", horizon.key()),
                    "impact": "medium",
                    "description": "Scripted initiative.",
                    "objective": "Show the report layout without a live model.",
                    "steps": ["Plan", "Pilot", "Measure", "Scale", "Review", "Repeat"],
                }]),
            );
        }

        let report = json!({
            "overallScore": 3.0,
            "strongestArea": "strategy",
            "mainOpportunity": "data",
            "executiveSummary": "Scripted report generated without a language model.",
            "dimensions": dimensions,
            "roadmap": roadmap,
        });

        Ok(report.to_string())
    }
}
