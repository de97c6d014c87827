// Integration tests for the interview turn cycle
//
// The machine is pure: each test feeds events and checks the state and the
// commands it queues for the driver.

use maturity_interviews::error::Error;
use maturity_interviews::interview::{Command, InterviewEvent, InterviewMachine, InterviewState};
use maturity_interviews::model::Speaker;

fn drain(machine: &mut InterviewMachine) -> Vec<Command> {
    std::iter::from_fn(|| machine.next_command()).collect()
}

/// Machine that has spoken its greeting and is waiting for the participant
fn listening() -> InterviewMachine {
    let mut machine = InterviewMachine::new(120);
    machine.advance(InterviewEvent::Start).unwrap();
    drain(&mut machine);
    machine
        .advance(InterviewEvent::ReplyReceived {
            text: "Hola".to_string(),
        })
        .unwrap();
    drain(&mut machine);
    machine.advance(InterviewEvent::PlaybackEnded).unwrap();
    machine
}

#[test]
fn test_full_turn_cycle() {
    let mut machine = listening();
    assert_eq!(machine.state(), InterviewState::Listening);
    assert_eq!(machine.turn_count(), 2);

    let state = machine
        .advance(InterviewEvent::RecordingStopped {
            audio: vec![1, 2, 3],
        })
        .unwrap();
    assert_eq!(state, InterviewState::Transcribing);
    assert_eq!(
        drain(&mut machine),
        vec![Command::Transcribe {
            audio: vec![1, 2, 3]
        }]
    );

    let state = machine
        .advance(InterviewEvent::Transcribed {
            text: "Somos una pyme".to_string(),
        })
        .unwrap();
    assert_eq!(state, InterviewState::AwaitingReply);
    let commands = drain(&mut machine);
    match &commands[..] {
        [Command::PersistTurn(turn), Command::RequestReply { text }] => {
            assert_eq!(turn.speaker, Speaker::Participant);
            assert!(!turn.synthetic);
            assert_eq!(text, "Somos una pyme");
        }
        other => panic!("unexpected commands: {:?}", other),
    }

    let state = machine
        .advance(InterviewEvent::ReplyReceived {
            text: "¿Cuántos empleados?".to_string(),
        })
        .unwrap();
    assert_eq!(state, InterviewState::Speaking);
    let commands = drain(&mut machine);
    assert_eq!(commands.len(), 3);
    assert!(matches!(&commands[0], Command::PersistTurn(t) if t.speaker == Speaker::Agent));
    assert_eq!(commands[1], Command::UpdateProgress { progress: 10 });
    assert!(matches!(&commands[2], Command::Synthesize { .. }));

    assert_eq!(
        machine.advance(InterviewEvent::PlaybackEnded).unwrap(),
        InterviewState::Listening
    );
    assert_eq!(machine.turn_count(), 4);
}

#[test]
fn test_empty_transcription_is_still_a_turn() {
    let mut machine = listening();
    machine
        .advance(InterviewEvent::RecordingStopped { audio: vec![] })
        .unwrap();
    drain(&mut machine);

    machine
        .advance(InterviewEvent::Transcribed {
            text: String::new(),
        })
        .unwrap();
    assert!(matches!(
        drain(&mut machine).first(),
        Some(Command::PersistTurn(turn)) if turn.text.is_empty()
    ));
}

#[test]
fn test_collaborator_failure_returns_to_listening() {
    for failing_state in ["transcribing", "awaiting_reply", "speaking"] {
        let mut machine = listening();
        machine
            .advance(InterviewEvent::RecordingStopped { audio: vec![9] })
            .unwrap();
        if failing_state != "transcribing" {
            machine
                .advance(InterviewEvent::Transcribed {
                    text: "hola".to_string(),
                })
                .unwrap();
        }
        if failing_state == "speaking" {
            machine
                .advance(InterviewEvent::ReplyReceived {
                    text: "respuesta".to_string(),
                })
                .unwrap();
        }

        assert_eq!(
            machine.advance(InterviewEvent::CollaboratorFailed).unwrap(),
            InterviewState::Listening
        );
        assert!(!machine.has_pending_commands());
    }
}

#[test]
fn test_finish_is_idempotent() {
    let mut machine = listening();

    assert_eq!(
        machine.advance(InterviewEvent::Finish).unwrap(),
        InterviewState::Finished
    );
    assert_eq!(drain(&mut machine), vec![Command::Complete]);

    assert_eq!(
        machine.advance(InterviewEvent::Finish).unwrap(),
        InterviewState::Finished
    );
    assert!(drain(&mut machine).is_empty());
}

#[test]
fn test_finish_from_not_started() {
    let mut machine = InterviewMachine::new(120);
    assert_eq!(
        machine.advance(InterviewEvent::Finish).unwrap(),
        InterviewState::Finished
    );
    assert_eq!(drain(&mut machine), vec![Command::Complete]);
}

#[test]
fn test_no_turns_after_finish() {
    let mut machine = listening();
    machine.advance(InterviewEvent::Finish).unwrap();

    let result = machine.advance(InterviewEvent::RecordingStopped { audio: vec![1] });
    assert!(matches!(result, Err(Error::SessionFinished)));
}

#[test]
fn test_invalid_transition_keeps_state() {
    let mut machine = listening();

    let result = machine.advance(InterviewEvent::PlaybackEnded);
    assert!(matches!(
        result,
        Err(Error::InvalidTransition {
            state: InterviewState::Listening,
            event: "playback_ended"
        })
    ));
    assert_eq!(machine.state(), InterviewState::Listening);
}

#[test]
fn test_turn_limit_refuses_new_recordings() {
    let mut machine = InterviewMachine::resume(120, false, 120);
    assert_eq!(machine.state(), InterviewState::Listening);

    let result = machine.advance(InterviewEvent::RecordingStopped { audio: vec![1] });
    assert!(matches!(result, Err(Error::TurnLimitReached(120))));
    assert_eq!(machine.state(), InterviewState::Listening);

    // Finishing is still possible
    assert_eq!(
        machine.advance(InterviewEvent::Finish).unwrap(),
        InterviewState::Finished
    );
}

#[test]
fn test_resume_states() {
    assert_eq!(
        InterviewMachine::resume(0, false, 120).state(),
        InterviewState::NotStarted
    );
    assert_eq!(
        InterviewMachine::resume(7, false, 120).state(),
        InterviewState::Listening
    );
    assert_eq!(
        InterviewMachine::resume(7, true, 120).state(),
        InterviewState::Finished
    );
}

#[test]
fn test_abort_turn_restores_persisted_count() {
    let mut machine = listening();
    machine
        .advance(InterviewEvent::RecordingStopped { audio: vec![1] })
        .unwrap();
    drain(&mut machine);
    machine
        .advance(InterviewEvent::Transcribed {
            text: "hola".to_string(),
        })
        .unwrap();
    assert_eq!(machine.turn_count(), 3);

    machine.abort_turn(2);
    assert_eq!(machine.turn_count(), 2);
    assert_eq!(machine.state(), InterviewState::Listening);
    assert!(!machine.has_pending_commands());

    machine.abort_turn(0);
    assert_eq!(machine.state(), InterviewState::NotStarted);
}
