use serde::{Deserialize, Serialize};

/// Interview behaviour knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewPolicy {
    /// Persisted messages after which new recordings are refused.
    /// Default: 120
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Recent turns of each other participant shared with the agent
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Compile reports as soon as a session or interview completes
    #[serde(default = "default_auto_compile")]
    pub auto_compile_reports: bool,

    /// Seconds without a request after which a live session is dropped from
    /// memory. It is reopened from the store on the next request.
    #[serde(default = "default_idle_session_secs")]
    pub idle_session_secs: u64,
}

fn default_max_turns() -> usize {
    120
}

fn default_context_window() -> usize {
    5
}

fn default_auto_compile() -> bool {
    true
}

fn default_idle_session_secs() -> u64 {
    1800
}

impl Default for InterviewPolicy {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            context_window: default_context_window(),
            auto_compile_reports: default_auto_compile(),
            idle_session_secs: default_idle_session_secs(),
        }
    }
}
