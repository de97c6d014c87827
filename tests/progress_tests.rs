// Integration tests for completion progress
//
// Organic progress follows the conversation length and is capped below
// 100; multi-participant progress is the mean over planned participants.

use maturity_interviews::model::{ParticipantId, PlannedParticipant, Session, SessionUpdate, Status};
use maturity_interviews::progress::{aggregate, compute_progress, ORGANIC_CAP};

fn session(contact: &str, progress: u8, status: Status) -> Session {
    let mut session = Session::new(ParticipantId::new(contact));
    session.apply(
        &SessionUpdate {
            status: Some(status),
            progress: Some(progress),
            account: None,
        },
        chrono::Utc::now(),
    );
    session
}

fn team() -> Vec<PlannedParticipant> {
    vec![
        PlannedParticipant::new("Ana", "CEO", "ana@example.com"),
        PlannedParticipant::new("Luis", "CTO", "luis@example.com"),
        PlannedParticipant::new("Marta", "COO", "marta@example.com"),
    ]
}

#[test]
fn test_progress_follows_turn_count() {
    assert_eq!(compute_progress(0, false), 0);
    assert_eq!(compute_progress(4, false), 10);
    assert_eq!(compute_progress(38, false), 95);
    assert_eq!(compute_progress(100, false), 95);
}

#[test]
fn test_forced_progress_is_complete() {
    for n in [0, 1, 37, 500] {
        assert_eq!(compute_progress(n, true), 100);
    }
}

#[test]
fn test_organic_progress_never_reaches_complete() {
    assert!((0..1000).all(|n| compute_progress(n, false) <= ORGANIC_CAP));
}

#[test]
fn test_aggregate_is_mean_over_planned() {
    let sessions = vec![
        session("ana@example.com", 100, Status::Completed),
        session("luis@example.com", 50, Status::Active),
    ];

    let result = aggregate(&team(), &sessions);
    assert_eq!(result.progress, 50.0);
    assert_eq!(result.status, Status::Active);

    let marta = &result.participants[2];
    assert_eq!(marta.progress, 0);
    assert_eq!(marta.status, Status::Pending);
}

#[test]
fn test_aggregate_completes_only_when_everyone_finished() {
    let mut sessions = vec![
        session("ana@example.com", 100, Status::Completed),
        session("luis@example.com", 100, Status::Completed),
        session("marta@example.com", 95, Status::Active),
    ];
    assert_eq!(aggregate(&team(), &sessions).status, Status::Active);

    sessions[2] = session("marta@example.com", 100, Status::Completed);
    let result = aggregate(&team(), &sessions);
    assert_eq!(result.progress, 100.0);
    assert_eq!(result.status, Status::Completed);
}

#[test]
fn test_aggregate_ignores_unplanned_sessions() {
    let sessions = vec![session("stranger@example.com", 100, Status::Completed)];

    let result = aggregate(&team(), &sessions);
    assert_eq!(result.progress, 0.0);
    assert_eq!(result.status, Status::Pending);
}
