use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::normalize::parse_report;
use super::transcript::assemble;
use crate::collaborators::ReportGenerator;
use crate::error::{Error, Result};
use crate::model::{Report, Scope};
use crate::store::InterviewStore;

/// Compiles transcripts into reports and attaches them to their scope
pub struct ReportCompiler {
    store: Arc<dyn InterviewStore>,
    generator: Arc<dyn ReportGenerator>,
    in_flight: Arc<Mutex<HashSet<Scope>>>,
}

/// Marks a scope as being compiled until dropped
struct Claim {
    in_flight: Arc<Mutex<HashSet<Scope>>>,
    scope: Scope,
}

impl Drop for Claim {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.remove(&self.scope);
    }
}

impl ReportCompiler {
    pub fn new(store: Arc<dyn InterviewStore>, generator: Arc<dyn ReportGenerator>) -> Self {
        Self {
            store,
            generator,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn claim(&self, scope: &Scope) -> Result<Claim> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(scope.clone()) {
            return Err(Error::ReportInProgress);
        }

        Ok(Claim {
            in_flight: Arc::clone(&self.in_flight),
            scope: scope.clone(),
        })
    }

    /// Compile and persist the report for `scope`, replacing any earlier one.
    ///
    /// On failure the earlier report, if any, is left in place.
    pub async fn compile(&self, scope: &Scope) -> Result<Report> {
        let _claim = self.claim(scope)?;
        self.run(scope).await
    }

    /// Compile in the background unless `scope` already has a report or one
    /// is being compiled.
    pub fn compile_on_completion(self: &Arc<Self>, scope: Scope) -> Option<JoinHandle<()>> {
        let claim = match self.claim(&scope) {
            Ok(claim) => claim,
            Err(_) => {
                debug!("Report for {} already being compiled", scope);
                return None;
            }
        };

        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            let _claim = claim;

            match this.has_report(&scope).await {
                Ok(true) => debug!("{} already has a report", scope),
                Ok(false) => {
                    if let Err(e) = this.run(&scope).await {
                        error!("Automatic report for {} failed: {}", scope, e);
                    }
                }
                Err(e) => error!("Could not check report for {}: {}", scope, e),
            }
        }))
    }

    async fn has_report(&self, scope: &Scope) -> Result<bool> {
        match scope {
            Scope::Interview(id) => Ok(self
                .store
                .get_interview(id)
                .await?
                .is_some_and(|i| i.report.is_some())),
            Scope::Participant {
                interview_id,
                participant,
            } => Ok(self
                .store
                .get_session(interview_id, participant)
                .await?
                .is_some_and(|s| s.report.is_some())),
        }
    }

    async fn run(&self, scope: &Scope) -> Result<Report> {
        let interview = self
            .store
            .get_interview(scope.interview_id())
            .await?
            .ok_or_else(|| Error::NotFound(format!("interview {}", scope.interview_id())))?;

        let input = assemble(self.store.as_ref(), &interview, scope).await?;

        info!("Compiling {:?} report for {}", input.framing, scope);

        let raw = self
            .generator
            .generate(&input.transcript, input.framing)
            .await
            .map_err(|e| Error::collaborator("report generator", e))?;

        let report = parse_report(&raw)?;
        self.store.save_report(scope, &report).await?;

        info!(
            "Report for {} saved (overall score {:.1})",
            scope, report.overall_score
        );

        Ok(report)
    }
}
