// Integration tests for the in-memory interview store
//
// Transcripts must replay in strict timestamp order per scope, and
// concurrent session updates must all land in the aggregate.

use anyhow::Result;
use maturity_interviews::model::{
    Interview, NewTurn, ParticipantId, PlannedParticipant, Scope, SessionUpdate, Status,
};
use maturity_interviews::store::{InterviewStore, MemoryStore};
use std::sync::Arc;

fn enterprise() -> Interview {
    Interview::multi_participant(
        "owner-1",
        vec![
            PlannedParticipant::new("Ana", "CEO", "ana@example.com"),
            PlannedParticipant::new("Luis", "CTO", "luis@example.com"),
        ],
        None,
    )
}

fn participant_scope(interview: &Interview, contact: &str) -> Scope {
    Scope::Participant {
        interview_id: interview.id.clone(),
        participant: ParticipantId::new(contact),
    }
}

#[tokio::test]
async fn test_transcripts_do_not_interleave() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let interview = enterprise();
    store.create_interview(&interview).await?;

    let ana = participant_scope(&interview, "ana@example.com");
    let luis = participant_scope(&interview, "luis@example.com");

    let mut tasks = Vec::new();
    for scope in [ana.clone(), luis.clone()] {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            for i in 0..50 {
                store
                    .append_turn(&scope, NewTurn::participant(format!("{} {}", scope, i)))
                    .await?;
            }
            anyhow::Ok(())
        }));
    }
    for task in tasks {
        task.await??;
    }

    for scope in [&ana, &luis] {
        let turns = store.turns(scope).await?;
        assert_eq!(turns.len(), 50);
        assert!(turns.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        for (i, turn) in turns.iter().enumerate() {
            assert_eq!(turn.text, format!("{} {}", scope, i));
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_recent_turns_keeps_order() -> Result<()> {
    let store = MemoryStore::new();
    let interview = Interview::solo("owner-1");
    store.create_interview(&interview).await?;

    let scope = Scope::Interview(interview.id.clone());
    for i in 0..8 {
        store
            .append_turn(&scope, NewTurn::agent(format!("turn {}", i)))
            .await?;
    }

    let recent = store.recent_turns(&scope, 3).await?;
    let texts: Vec<&str> = recent.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["turn 5", "turn 6", "turn 7"]);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_finishes_complete_the_interview() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let interview = enterprise();
    store.create_interview(&interview).await?;

    let mut tasks = Vec::new();
    for contact in ["ana@example.com", "luis@example.com"] {
        let store = Arc::clone(&store);
        let id = interview.id.clone();
        tasks.push(tokio::spawn(async move {
            let update = SessionUpdate {
                status: Some(Status::Completed),
                progress: Some(100),
                account: None,
            };
            store
                .upsert_session(&id, &ParticipantId::new(contact), &update)
                .await?;
            store.recompute_aggregate(&id).await?;
            anyhow::Ok(())
        }));
    }
    for task in tasks {
        task.await??;
    }

    let stored = store.get_interview(&interview.id).await?.unwrap();
    assert_eq!(stored.progress, 100.0);
    assert_eq!(stored.status, Status::Completed);
    assert!(stored.participants.iter().all(|p| p.progress == 100));

    Ok(())
}

#[tokio::test]
async fn test_progress_updates_merge() -> Result<()> {
    let store = MemoryStore::new();
    let interview = enterprise();
    store.create_interview(&interview).await?;
    let ana = ParticipantId::new("ana@example.com");

    store
        .upsert_session(
            &interview.id,
            &ana,
            &SessionUpdate {
                status: Some(Status::Active),
                progress: None,
                account: Some("acct-1".to_string()),
            },
        )
        .await?;
    let session = store
        .upsert_session(
            &interview.id,
            &ana,
            &SessionUpdate {
                progress: Some(30),
                ..Default::default()
            },
        )
        .await?;

    assert_eq!(session.progress, 30);
    assert_eq!(session.status, Status::Active);
    assert_eq!(session.account.as_deref(), Some("acct-1"));

    let updated = store.recompute_aggregate(&interview.id).await?;
    assert_eq!(updated.progress, 15.0);
    assert_eq!(updated.status, Status::Active);

    Ok(())
}

#[tokio::test]
async fn test_unknown_interview_is_not_found() -> Result<()> {
    let store = MemoryStore::new();
    let result = store
        .upsert_session(
            "interview-missing",
            &ParticipantId::new("ana@example.com"),
            &SessionUpdate::default(),
        )
        .await;

    assert!(matches!(
        result,
        Err(maturity_interviews::Error::NotFound(_))
    ));
    assert!(store.get_interview("interview-missing").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_list_is_newest_first() -> Result<()> {
    let store = MemoryStore::new();
    let first = Interview::solo("owner-1");
    let mut second = Interview::solo("owner-1");
    second.created_at = first.created_at + chrono::Duration::seconds(5);

    store.create_interview(&first).await?;
    store.create_interview(&second).await?;

    let ids: Vec<String> = store
        .list_interviews()
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);

    Ok(())
}
