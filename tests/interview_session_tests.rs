// Integration tests for the interview session driver
//
// Sessions run against the in-memory store with scripted collaborators, so
// the whole turn loop (persistence, progress, reports) is exercised without
// speech services or a language model.

use anyhow::{anyhow, Result};
use maturity_interviews::collaborators::{
    AgentContext, ChatAgent, Collaborators, DryRunChat, SpeechSynthesizer, Transcriber,
};
use maturity_interviews::error::Error;
use maturity_interviews::identity::{ActingIdentity, IdentitySource};
use maturity_interviews::interview::{
    InterviewPolicy, InterviewService, InterviewState, ParticipantInput,
};
use maturity_interviews::invitations::{InvitationDispatch, Invitations};
use maturity_interviews::model::{Interview, ParticipantId, Scope, Speaker, Status, Turn};
use maturity_interviews::store::{InterviewStore, MemoryStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct FailingTranscriber;

#[async_trait::async_trait]
impl Transcriber for FailingTranscriber {
    async fn transcribe(&self, _session_id: &str, _audio: &[u8]) -> Result<String> {
        Err(anyhow!("speech service unavailable"))
    }
}

/// Greets normally, then fails every later reply
struct FlakyChat;

#[async_trait::async_trait]
impl ChatAgent for FlakyChat {
    async fn reply(
        &self,
        history: &[Turn],
        _text: &str,
        _context: Option<&AgentContext>,
    ) -> Result<String> {
        if history.is_empty() {
            Ok("Bienvenido".to_string())
        } else {
            Err(anyhow!("model overloaded"))
        }
    }
}

/// Speaks the greeting, then fails
struct FlakySpeech {
    calls: Mutex<usize>,
}

#[async_trait::async_trait]
impl SpeechSynthesizer for FlakySpeech {
    async fn synthesize(&self, _session_id: &str, text: &str) -> Result<Vec<u8>> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls == 1 {
            Ok(text.as_bytes().to_vec())
        } else {
            Err(anyhow!("voice service timed out"))
        }
    }
}

/// Chat agent that remembers what it was asked
#[derive(Default)]
struct RecordingChat {
    calls: Mutex<Vec<(Vec<Turn>, String, Option<AgentContext>)>>,
}

#[async_trait::async_trait]
impl ChatAgent for RecordingChat {
    async fn reply(
        &self,
        history: &[Turn],
        text: &str,
        context: Option<&AgentContext>,
    ) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((history.to_vec(), text.to_string(), context.cloned()));
        Ok(format!("**Pregunta** {}", calls.len()))
    }
}

fn owner() -> ActingIdentity {
    ActingIdentity {
        participant: ParticipantId::new("owner@example.com"),
        account: Some("owner-1".to_string()),
        source: IdentitySource::Account,
    }
}

fn guest(contact: &str) -> ActingIdentity {
    ActingIdentity {
        participant: ParticipantId::new(contact),
        account: None,
        source: IdentitySource::Invitation,
    }
}

fn service_with(
    store: Arc<MemoryStore>,
    collaborators: Collaborators,
    policy: InterviewPolicy,
) -> InterviewService {
    InterviewService::new(
        store,
        collaborators,
        Invitations::dry_run("http://localhost:3000"),
        policy,
    )
}

async fn create_team(service: &InterviewService) -> Result<Interview> {
    let account = maturity_interviews::identity::Account {
        id: "owner-1".to_string(),
        email: "owner@example.com".to_string(),
    };
    let participants = vec![
        ParticipantInput {
            name: "Ana".to_string(),
            role: "CEO".to_string(),
            contact: "Ana@Example.com".to_string(),
        },
        ParticipantInput {
            name: "Luis".to_string(),
            role: "CTO".to_string(),
            contact: "luis@example.com".to_string(),
        },
    ];

    let (interview, dispatch) = service
        .create_multi(&account, participants, Some("Acme".to_string()))
        .await?;
    assert!(matches!(dispatch, InvitationDispatch::DryRun { ref links } if links.len() == 2));

    Ok(interview)
}

/// Wait for a background report to land
async fn wait_for_report(store: &MemoryStore, scope: &Scope) -> Result<bool> {
    for _ in 0..200 {
        let found = match scope {
            Scope::Interview(id) => store
                .get_interview(id)
                .await?
                .is_some_and(|i| i.report.is_some()),
            Scope::Participant {
                interview_id,
                participant,
            } => store
                .get_session(interview_id, participant)
                .await?
                .is_some_and(|s| s.report.is_some()),
        };
        if found {
            return Ok(true);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(false)
}

#[tokio::test]
async fn test_solo_interview_flow() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let service = service_with(
        Arc::clone(&store),
        Collaborators::dry_run(),
        InterviewPolicy::default(),
    );

    let interview = service
        .create_solo(&maturity_interviews::identity::Account {
            id: "owner-1".to_string(),
            email: "owner@example.com".to_string(),
        })
        .await?;
    let session = service.open_session(&owner(), &interview.id).await?;

    let greeting = session.start().await?;
    assert_eq!(greeting.state, Some(InterviewState::Speaking));
    assert!(greeting.reply.is_some());
    assert!(greeting.audio.is_some());
    assert_eq!(session.playback_ended().await?, InterviewState::Listening);

    let turn = session.submit_audio(b"Somos una pyme".to_vec()).await?;
    assert_eq!(turn.transcript.as_deref(), Some("Somos una pyme"));
    assert_eq!(turn.progress, Some(10));
    assert!(turn.aborted.is_none());

    // The priming message is persisted but never shown
    let visible = session.transcript().await;
    assert_eq!(visible.len(), 3);
    assert_eq!(visible[0].speaker, Speaker::Agent);
    assert_eq!(visible[1].text, "Somos una pyme");
    assert_eq!(store.turns(session.scope()).await?.len(), 4);

    let stored = store.get_interview(&interview.id).await?.unwrap();
    assert_eq!(stored.progress, 10.0);

    let done = session.finish().await?;
    assert_eq!(done.state, Some(InterviewState::Finished));
    assert_eq!(done.progress, Some(100));

    let again = session.finish().await?;
    assert_eq!(again.state, Some(InterviewState::Finished));

    let stored = store.get_interview(&interview.id).await?.unwrap();
    assert_eq!(stored.status, Status::Completed);
    assert_eq!(stored.progress, 100.0);

    assert!(wait_for_report(&store, &Scope::Interview(interview.id.clone())).await?);

    Ok(())
}

#[tokio::test]
async fn test_chat_gets_history_without_the_new_text() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let chat = Arc::new(RecordingChat::default());
    let collaborators = Collaborators {
        chat: chat.clone(),
        ..Collaborators::dry_run()
    };
    let service = service_with(Arc::clone(&store), collaborators, InterviewPolicy::default());

    let interview = service
        .create_solo(&maturity_interviews::identity::Account {
            id: "owner-1".to_string(),
            email: "owner@example.com".to_string(),
        })
        .await?;
    let session = service.open_session(&owner(), &interview.id).await?;

    session.start().await?;
    session.playback_ended().await?;
    let turn = session.submit_audio(b"Vendemos muebles".to_vec()).await?;

    // Markup is stripped before synthesis only
    assert_eq!(turn.reply.as_deref(), Some("**Pregunta** 2"));
    assert_eq!(turn.audio, Some(b"Pregunta 2".to_vec()));

    let calls = chat.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);

    let (history, text, context) = &calls[0];
    assert!(history.is_empty());
    assert!(context.is_none());
    assert!(!text.is_empty());

    let (history, text, _) = &calls[1];
    assert_eq!(text, "Vendemos muebles");
    assert_eq!(history.len(), 2);
    assert!(history[0].synthetic);
    assert_eq!(history[1].speaker, Speaker::Agent);

    Ok(())
}

#[tokio::test]
async fn test_failed_transcription_aborts_only_the_turn() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let collaborators = Collaborators {
        transcriber: Arc::new(FailingTranscriber),
        ..Collaborators::dry_run()
    };
    let service = service_with(Arc::clone(&store), collaborators, InterviewPolicy::default());

    let interview = service
        .create_solo(&maturity_interviews::identity::Account {
            id: "owner-1".to_string(),
            email: "owner@example.com".to_string(),
        })
        .await?;
    let session = service.open_session(&owner(), &interview.id).await?;
    session.start().await?;
    session.playback_ended().await?;

    let outcome = session.submit_audio(b"hola".to_vec()).await?;
    assert_eq!(outcome.state, Some(InterviewState::Listening));
    assert!(outcome.aborted.is_some());
    assert!(outcome.reply.is_none());

    // Only the priming message and the greeting were persisted
    assert_eq!(store.turns(session.scope()).await?.len(), 2);
    assert_eq!(session.snapshot().await.state, InterviewState::Listening);

    Ok(())
}

#[tokio::test]
async fn test_failed_reply_keeps_the_participant_turn() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let collaborators = Collaborators {
        chat: Arc::new(FlakyChat),
        ..Collaborators::dry_run()
    };
    let service = service_with(Arc::clone(&store), collaborators, InterviewPolicy::default());

    let interview = service
        .create_solo(&maturity_interviews::identity::Account {
            id: "owner-1".to_string(),
            email: "owner@example.com".to_string(),
        })
        .await?;
    let session = service.open_session(&owner(), &interview.id).await?;
    session.start().await?;
    session.playback_ended().await?;
    let before = store.get_interview(&interview.id).await?.unwrap().progress;

    let outcome = session.submit_audio(b"Tenemos un ERP".to_vec()).await?;
    assert_eq!(outcome.state, Some(InterviewState::Listening));
    assert_eq!(outcome.transcript.as_deref(), Some("Tenemos un ERP"));
    assert!(outcome.aborted.is_some());
    assert!(outcome.reply.is_none());
    assert!(outcome.progress.is_none());

    let turns = store.turns(session.scope()).await?;
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[2].speaker, Speaker::Participant);
    assert_eq!(turns[2].text, "Tenemos un ERP");

    let stored = store.get_interview(&interview.id).await?.unwrap();
    assert_eq!(stored.progress, before);

    // The participant can simply try again
    assert_eq!(session.snapshot().await.turn_count, 3);
    let retry = session.submit_audio(b"otra vez".to_vec()).await?;
    assert_eq!(retry.state, Some(InterviewState::Listening));

    Ok(())
}

#[tokio::test]
async fn test_failed_synthesis_keeps_reply_and_progress() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let collaborators = Collaborators {
        speech: Arc::new(FlakySpeech {
            calls: Mutex::new(0),
        }),
        ..Collaborators::dry_run()
    };
    let service = service_with(Arc::clone(&store), collaborators, InterviewPolicy::default());

    let interview = service
        .create_solo(&maturity_interviews::identity::Account {
            id: "owner-1".to_string(),
            email: "owner@example.com".to_string(),
        })
        .await?;
    let session = service.open_session(&owner(), &interview.id).await?;
    session.start().await?;
    session.playback_ended().await?;

    let outcome = session.submit_audio(b"Usamos hojas de calculo".to_vec()).await?;
    assert_eq!(outcome.state, Some(InterviewState::Listening));
    assert!(outcome.reply.is_some());
    assert!(outcome.audio.is_none());
    assert!(outcome.aborted.is_some());
    assert_eq!(outcome.progress, Some(10));

    let turns = store.turns(session.scope()).await?;
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[3].speaker, Speaker::Agent);

    let stored = store.get_interview(&interview.id).await?.unwrap();
    assert_eq!(stored.progress, 10.0);

    Ok(())
}

#[tokio::test]
async fn test_turn_limit_requires_explicit_finish() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let policy = InterviewPolicy {
        max_turns: 2,
        ..Default::default()
    };
    let service = service_with(Arc::clone(&store), Collaborators::dry_run(), policy);

    let interview = service
        .create_solo(&maturity_interviews::identity::Account {
            id: "owner-1".to_string(),
            email: "owner@example.com".to_string(),
        })
        .await?;
    let session = service.open_session(&owner(), &interview.id).await?;
    session.start().await?;
    session.playback_ended().await?;

    let result = session.submit_audio(b"hola".to_vec()).await;
    assert!(matches!(result, Err(Error::TurnLimitReached(2))));

    let stored = store.get_interview(&interview.id).await?.unwrap();
    assert_ne!(stored.status, Status::Completed);

    session.finish().await?;
    let stored = store.get_interview(&interview.id).await?.unwrap();
    assert_eq!(stored.status, Status::Completed);

    Ok(())
}

#[tokio::test]
async fn test_multi_participant_aggregate() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let service = service_with(
        Arc::clone(&store),
        Collaborators::dry_run(),
        InterviewPolicy::default(),
    );
    let interview = create_team(&service).await?;

    let ana = service
        .open_session(&guest("ana@example.com"), &interview.id)
        .await?;
    // Opening alone writes nothing
    let ana_id = ParticipantId::new("ana@example.com");
    assert!(store.get_session(&interview.id, &ana_id).await?.is_none());
    let stored = store.get_interview(&interview.id).await?.unwrap();
    assert_ne!(stored.status, Status::Active);

    ana.start().await?;
    let session = store.get_session(&interview.id, &ana_id).await?.unwrap();
    assert_eq!(session.status, Status::Active);
    let stored = store.get_interview(&interview.id).await?.unwrap();
    assert_eq!(stored.status, Status::Active);

    ana.playback_ended().await?;
    ana.submit_audio(b"Dirijo la empresa".to_vec()).await?;
    ana.finish().await?;

    let stored = store.get_interview(&interview.id).await?.unwrap();
    assert_eq!(stored.progress, 50.0);
    assert_eq!(stored.status, Status::Active);

    let luis = service
        .open_session(&guest("luis@example.com"), &interview.id)
        .await?;
    luis.start().await?;
    luis.finish().await?;

    let stored = store.get_interview(&interview.id).await?.unwrap();
    assert_eq!(stored.progress, 100.0);
    assert_eq!(stored.status, Status::Completed);

    let ana_scope = Scope::Participant {
        interview_id: interview.id.clone(),
        participant: ParticipantId::new("ana@example.com"),
    };
    assert!(wait_for_report(&store, &ana_scope).await?);
    assert!(wait_for_report(&store, &Scope::Interview(interview.id.clone())).await?);

    Ok(())
}

#[tokio::test]
async fn test_agent_sees_other_participants() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let chat = Arc::new(RecordingChat::default());
    let collaborators = Collaborators {
        chat: chat.clone(),
        ..Collaborators::dry_run()
    };
    let service = service_with(Arc::clone(&store), collaborators, InterviewPolicy::default());
    let interview = create_team(&service).await?;

    let ana = service
        .open_session(&guest("ana@example.com"), &interview.id)
        .await?;
    ana.start().await?;
    ana.playback_ended().await?;
    ana.submit_audio(b"No tenemos datos centralizados".to_vec())
        .await?;

    let luis = service
        .open_session(&guest("luis@example.com"), &interview.id)
        .await?;
    luis.start().await?;

    let calls = chat.calls.lock().unwrap();
    let (_, _, context) = calls.last().unwrap();
    let context = context.as_ref().unwrap();

    assert_eq!(context.role, "CTO");
    assert_eq!(context.team.len(), 1);
    assert_eq!(context.team[0].name, "Ana");
    assert_eq!(context.shared.len(), 1);

    let excerpt = &context.shared[0];
    assert_eq!(excerpt.participant, ParticipantId::new("ana@example.com"));
    assert!(excerpt.turns.iter().all(|t| !t.synthetic));
    assert!(excerpt
        .turns
        .iter()
        .any(|t| t.text == "No tenemos datos centralizados"));

    Ok(())
}

#[tokio::test]
async fn test_uninvited_guest_is_forbidden() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let service = service_with(
        Arc::clone(&store),
        Collaborators::dry_run(),
        InterviewPolicy::default(),
    );
    let interview = create_team(&service).await?;

    let result = service
        .open_session(&guest("stranger@example.com"), &interview.id)
        .await;
    assert!(matches!(result, Err(Error::Forbidden)));

    let result = service.open_session(&owner(), "interview-missing").await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_reopened_session_resumes() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let collaborators = Collaborators {
        chat: Arc::new(DryRunChat),
        ..Collaborators::dry_run()
    };
    let service = service_with(Arc::clone(&store), collaborators, InterviewPolicy::default());
    let interview = create_team(&service).await?;

    {
        let ana = service
            .open_session(&guest("ana@example.com"), &interview.id)
            .await?;
        ana.start().await?;
    }

    let ana = service
        .open_session(&guest("ana@example.com"), &interview.id)
        .await?;
    let snapshot = ana.snapshot().await;
    assert_eq!(snapshot.state, InterviewState::Listening);
    assert_eq!(snapshot.turn_count, 2);

    ana.finish().await?;
    let ana = service
        .open_session(&guest("ana@example.com"), &interview.id)
        .await?;
    assert_eq!(ana.snapshot().await.state, InterviewState::Finished);

    Ok(())
}

#[tokio::test]
async fn test_validation_rejects_bad_participants() -> Result<()> {
    let service = service_with(
        Arc::new(MemoryStore::new()),
        Collaborators::dry_run(),
        InterviewPolicy::default(),
    );
    let account = maturity_interviews::identity::Account {
        id: "owner-1".to_string(),
        email: "owner@example.com".to_string(),
    };

    let result = service.create_multi(&account, Vec::new(), None).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    let result = service
        .create_multi(
            &account,
            vec![ParticipantInput {
                name: " ".to_string(),
                role: "CTO".to_string(),
                contact: "luis@example.com".to_string(),
            }],
            None,
        )
        .await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    let duplicate = ParticipantInput {
        name: "Luis".to_string(),
        role: "CTO".to_string(),
        contact: "luis@example.com".to_string(),
    };
    let mut shouting = duplicate.clone();
    shouting.contact = " LUIS@example.com".to_string();
    let result = service
        .create_multi(&account, vec![duplicate, shouting], None)
        .await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    Ok(())
}
