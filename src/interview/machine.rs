use serde::Serialize;
use std::collections::VecDeque;

use crate::collaborators::{clean_for_speech, READY_PROMPT};
use crate::error::{Error, Result};
use crate::model::NewTurn;
use crate::progress::compute_progress;

/// Where one participant is in the turn cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewState {
    NotStarted,
    Listening,
    Transcribing,
    AwaitingReply,
    Speaking,
    Finished,
}

/// Something that happened to the session
#[derive(Debug, Clone, PartialEq)]
pub enum InterviewEvent {
    /// Participant acknowledged the start
    Start,
    /// Participant stopped recording
    RecordingStopped { audio: Vec<u8> },
    Transcribed { text: String },
    ReplyReceived { text: String },
    /// Playback of the agent's reply ended
    PlaybackEnded,
    /// The collaborator serving the current step failed
    CollaboratorFailed,
    /// Participant confirmed they are done
    Finish,
}

impl InterviewEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InterviewEvent::Start => "start",
            InterviewEvent::RecordingStopped { .. } => "recording_stopped",
            InterviewEvent::Transcribed { .. } => "transcribed",
            InterviewEvent::ReplyReceived { .. } => "reply_received",
            InterviewEvent::PlaybackEnded => "playback_ended",
            InterviewEvent::CollaboratorFailed => "collaborator_failed",
            InterviewEvent::Finish => "finish",
        }
    }
}

/// Work the driver has to carry out, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Transcribe { audio: Vec<u8> },
    PersistTurn(NewTurn),
    /// Ask the agent to answer `text`, with every earlier turn as history
    RequestReply { text: String },
    UpdateProgress { progress: u8 },
    /// Synthesize already-cleaned text
    Synthesize { text: String },
    /// Force progress to 100 and mark the session completed
    Complete,
}

/// Turn cycle of one participant.
///
/// Pure: `advance` only changes state and queues commands. The driver runs
/// the commands and feeds results back as events.
#[derive(Debug, Clone)]
pub struct InterviewMachine {
    state: InterviewState,
    /// Messages persisted, or queued for persistence
    turn_count: usize,
    max_turns: usize,
    commands: VecDeque<Command>,
}

impl InterviewMachine {
    pub fn new(max_turns: usize) -> Self {
        Self {
            state: InterviewState::NotStarted,
            turn_count: 0,
            max_turns,
            commands: VecDeque::new(),
        }
    }

    /// Rebuild the machine for a session with persisted history
    pub fn resume(turn_count: usize, completed: bool, max_turns: usize) -> Self {
        let state = if completed {
            InterviewState::Finished
        } else if turn_count == 0 {
            InterviewState::NotStarted
        } else {
            InterviewState::Listening
        };

        Self {
            state,
            turn_count,
            max_turns,
            commands: VecDeque::new(),
        }
    }

    pub fn state(&self) -> InterviewState {
        self.state
    }

    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn next_command(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    pub fn has_pending_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    pub fn advance(&mut self, event: InterviewEvent) -> Result<InterviewState> {
        use InterviewEvent as E;
        use InterviewState as S;

        let next = match (self.state, event) {
            (S::Finished, E::Finish) => return Ok(S::Finished),
            (S::Finished, _) => return Err(Error::SessionFinished),

            (_, E::Finish) => {
                self.commands.clear();
                self.commands.push_back(Command::Complete);
                S::Finished
            }

            (S::NotStarted, E::Start) => {
                self.persist(NewTurn::priming(READY_PROMPT));
                self.commands.push_back(Command::RequestReply {
                    text: READY_PROMPT.to_string(),
                });
                S::AwaitingReply
            }

            (S::Listening, E::RecordingStopped { audio }) => {
                if self.turn_count >= self.max_turns {
                    return Err(Error::TurnLimitReached(self.max_turns));
                }
                self.commands.push_back(Command::Transcribe { audio });
                S::Transcribing
            }

            (S::Transcribing, E::Transcribed { text }) => {
                self.persist(NewTurn::participant(text.clone()));
                self.commands.push_back(Command::RequestReply { text });
                S::AwaitingReply
            }

            (S::AwaitingReply, E::ReplyReceived { text }) => {
                self.persist(NewTurn::agent(text.clone()));
                self.commands.push_back(Command::UpdateProgress {
                    progress: compute_progress(self.turn_count, false),
                });
                self.commands.push_back(Command::Synthesize {
                    text: clean_for_speech(&text),
                });
                S::Speaking
            }

            (S::Speaking, E::PlaybackEnded) => S::Listening,

            (S::Transcribing | S::AwaitingReply | S::Speaking, E::CollaboratorFailed) => {
                self.commands.clear();
                S::Listening
            }

            (state, event) => {
                return Err(Error::InvalidTransition {
                    state,
                    event: event.name(),
                })
            }
        };

        self.state = next;
        Ok(next)
    }

    /// Drop the rest of the current turn after a persistence failure.
    ///
    /// `persisted_turns` is what the store actually holds.
    pub fn abort_turn(&mut self, persisted_turns: usize) {
        self.commands.clear();
        self.turn_count = persisted_turns;
        self.state = if persisted_turns == 0 {
            InterviewState::NotStarted
        } else {
            InterviewState::Listening
        };
    }

    fn persist(&mut self, turn: NewTurn) {
        self.turn_count += 1;
        self.commands.push_back(Command::PersistTurn(turn));
    }
}
