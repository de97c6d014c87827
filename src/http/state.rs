use crate::error::Result;
use crate::identity::ActingIdentity;
use crate::interview::{InterviewService, InterviewSession};
use crate::model::Scope;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// A session held in memory between requests
struct LiveSession {
    session: Arc<InterviewSession>,
    last_active: Instant,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InterviewService>,

    /// Live interview sessions (scope → session)
    sessions: Arc<RwLock<HashMap<Scope, LiveSession>>>,

    /// Where denied or unknown report and transcript views are redirected
    pub denied_redirect: String,

    /// Idle time after which a live session is evicted
    idle_timeout: Duration,
}

impl AppState {
    pub fn new(service: Arc<InterviewService>, denied_redirect: impl Into<String>) -> Self {
        let idle_timeout = Duration::from_secs(service.policy().idle_session_secs);
        Self {
            service,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            denied_redirect: denied_redirect.into(),
            idle_timeout,
        }
    }

    /// The viewer's live session, opened on first use
    pub async fn session_for(
        &self,
        viewer: &ActingIdentity,
        interview_id: &str,
    ) -> Result<Arc<InterviewSession>> {
        let scope = self.service.session_scope(viewer, interview_id).await?;

        {
            let mut sessions = self.sessions.write().await;
            if let Some(live) = sessions.get_mut(&scope) {
                live.last_active = Instant::now();
                return Ok(Arc::clone(&live.session));
            }
        }

        let session = Arc::new(self.service.open_session(viewer, interview_id).await?);

        // Another request may have opened it meanwhile; keep the first
        let mut sessions = self.sessions.write().await;
        let live = sessions.entry(scope).or_insert(LiveSession {
            session,
            last_active: Instant::now(),
        });
        live.last_active = Instant::now();
        Ok(Arc::clone(&live.session))
    }

    /// Drop a session from the registry
    pub async fn close_session(&self, scope: &Scope) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(scope);
    }

    /// Number of sessions currently held in memory
    pub async fn live_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Evict sessions idle for longer than the configured timeout.
    ///
    /// A session still referenced by a request in flight stays.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|scope, live| {
            let keep = live.last_active.elapsed() < self.idle_timeout
                || Arc::strong_count(&live.session) > 1;
            if !keep {
                debug!(scope = %scope, "Evicting idle session");
            }
            keep
        });

        before - sessions.len()
    }

    /// Periodically evict idle sessions in the background
    pub fn spawn_reaper(&self) -> JoinHandle<()> {
        let state = self.clone();
        let period = (self.idle_timeout / 4).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = state.evict_idle().await;
                if evicted > 0 {
                    info!("Evicted {} idle interview sessions", evicted);
                }
            }
        })
    }
}
