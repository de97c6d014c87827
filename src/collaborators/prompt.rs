//! Interviewer and report prompts

use std::fmt::Write;

use crate::model::{Dimension, ParticipantId, Turn};

/// Synthetic first message that asks the agent to open the interview
pub const READY_PROMPT: &str =
    "Hello, I am ready for the diagnostic. Please begin according to the protocol.";

const AGENT_INSTRUCTIONS: &str = "\
You are a senior AI strategy consultant running a professional digital maturity interview. \
Your goal is to help the organization adopt AI in line with its business goals.

Interaction rules:
- Open with a short professional introduction, explain the purpose of the diagnostic and ask for consent to confidentiality.
- Ask exactly one question at a time; this is a spoken conversation.
- Listen actively and ask follow-up questions when an answer is not enough to judge maturity.
- Do not propose technical solutions during the interview; only gather information.
- When every dimension is covered, confirm the main findings with the participant and thank them.
- Answer in plain text only. No markdown, lists or special symbols: your words are read aloud.

Assessment framework, seven dimensions:
";

const AGENT_OUTRO: &str = "
Adapt to the diagnostic type. For a solo diagnostic (entrepreneurs, small businesses) use simple, \
direct language and look for quick wins. For an enterprise diagnostic use corporate language \
(governance, compliance, architecture) and focus on long-term vision, innovation budgets and \
information silos. Classify maturity as initial, basic, intermediate or advanced.";

/// A teammate in a multi-participant interview
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMember {
    pub name: String,
    pub role: String,
}

/// Recent turns of another participant
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantExcerpt {
    pub participant: ParticipantId,
    pub turns: Vec<Turn>,
}

/// Per-turn context for multi-participant interviews
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgentContext {
    pub participant: Option<ParticipantId>,
    pub role: String,
    /// Everyone else planned for the interview
    pub team: Vec<TeamMember>,
    pub shared: Vec<ParticipantExcerpt>,
}

/// Full system prompt for the interviewer
pub fn agent_system_prompt(context: Option<&AgentContext>) -> String {
    let mut prompt = String::from(AGENT_INSTRUCTIONS);
    for dimension in Dimension::ALL {
        let _ = writeln!(prompt, "- {}: {}", dimension.key(), dimension.description());
    }
    prompt.push_str(AGENT_OUTRO);

    let Some(context) = context else {
        return prompt;
    };

    prompt.push_str("\n\nENTERPRISE INTERVIEW CONTEXT:\n");
    if let Some(participant) = &context.participant {
        let _ = writeln!(
            prompt,
            "You are interviewing {} in the role of {}.",
            participant, context.role
        );
    }

    if context.team.is_empty() {
        prompt.push_str(
            "They are the only participant, so assess all seven dimensions of the diagnostic.\n",
        );
    } else {
        let team: Vec<String> = context
            .team
            .iter()
            .map(|m| format!("{} ({})", m.name, m.role))
            .collect();
        let _ = writeln!(prompt, "The rest of the team: {}.", team.join(", "));
        let _ = writeln!(
            prompt,
            "Focus mainly on the dimensions and questions most relevant to a {}. \
             Do not try to cover everything; other members will cover other areas.",
            context.role
        );
    }

    let shared: Vec<&ParticipantExcerpt> =
        context.shared.iter().filter(|e| !e.turns.is_empty()).collect();
    if !shared.is_empty() {
        prompt.push_str("\nSHARED CONTEXT (what other members have said):\n");
        for excerpt in shared {
            let _ = writeln!(prompt, "--- Participant: {} ---", excerpt.participant);
            for turn in &excerpt.turns {
                let _ = writeln!(prompt, "{}: {}", turn.speaker.label(), turn.text);
            }
        }
        prompt.push_str("Use this to contrast answers and go deeper instead of asking again.\n");
    }

    prompt
}

/// Whether a report covers one participant or the whole interview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFraming {
    Individual,
    Consolidated,
}

/// Fixed structured prompt for report generation
pub fn report_system_prompt(framing: ReportFraming) -> String {
    let framing_text = match framing {
        ReportFraming::Individual => {
            "Individual report for one leader or role. Use their own answers as evidence."
        }
        ReportFraming::Consolidated => {
            "Consolidated report. Identify patterns, silos and consensus across the interviews."
        }
    };

    let mut dimensions = String::new();
    for dimension in Dimension::ALL {
        let _ = writeln!(
            dimensions,
            "    \"{}\": {{ \"score\": number, \"level\": string, \"analysis\": string, \"recommendation\": string }},",
            dimension.key()
        );
    }
    let dimensions = dimensions.trim_end().trim_end_matches(',');

    format!(
        r#"You are a senior digital strategy consultant (CIO/CDO) experienced in business transformation.
Analyze the interview transcript and produce an executive digital and AI maturity report.

CONTEXT: {framing_text}

Be direct and constructive, executive in tone. Base every statement on what was said.

Assess seven dimensions: strategy, culture, processes, data, analytics, technology, governance.
For each dimension:
- score: integer 1-5
- level: "Initial", "Basic", "Intermediate", "Advanced" or "Optimized"
- analysis: 50-70 words on the current state citing evidence from the interview; infer from context when evidence is thin, never leave it empty
- recommendation: one concrete strategic action

Also compute:
- overallScore: mean of the dimension scores, one decimal
- strongestArea: the strongest dimension
- mainOpportunity: the most critical dimension
- executiveSummary: 150-200 words on the current state, the risk of not acting and the vision

Roadmap with three horizons (shortTerm, mediumTerm, longTerm), each with initiatives having:
- title
- impact: "high", "medium" or "low"
- description: at most 25 words
- objective: business objective with expected KPIs and value
- steps: 6-10 implementation steps

Reply with JSON only, in exactly this shape:
{{
  "overallScore": number,
  "strongestArea": string,
  "mainOpportunity": string,
  "executiveSummary": string,
  "dimensions": {{
{dimensions}
  }},
  "roadmap": {{
    "shortTerm": [{{ "title": string, "impact": string, "description": string, "objective": string, "steps": [string] }}],
    "mediumTerm": [{{ "title": string, "impact": string, "description": string, "objective": string, "steps": [string] }}],
    "longTerm": [{{ "title": string, "impact": string, "description": string, "objective": string, "steps": [string] }}]
  }}
}}"#
    )
}
