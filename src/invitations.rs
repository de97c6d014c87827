//! Invitation links and delivery
//!
//! Each planned participant gets a link carrying the interview id and their
//! encoded contact. Delivery publishes one message per participant for the
//! mail service; in dry-run mode the links are only returned and logged.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{InvitationConfig, InvitationMode};
use crate::error::{Error, Result};
use crate::identity::encode_token;
use crate::model::{Interview, ParticipantId};
use crate::nats::{InvitationMessage, NatsClient};

#[async_trait::async_trait]
pub trait InvitationTransport: Send + Sync {
    async fn deliver(&self, subject: &str, message: &InvitationMessage) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl InvitationTransport for NatsClient {
    async fn deliver(&self, subject: &str, message: &InvitationMessage) -> anyhow::Result<()> {
        self.publish(subject, message).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvitationLink {
    pub contact: ParticipantId,
    pub link: String,
}

/// Result of dispatching invitations
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InvitationDispatch {
    Sent { delivered: usize, failed: usize },
    /// Nothing was delivered
    DryRun { links: Vec<InvitationLink> },
}

pub struct Invitations {
    mode: InvitationMode,
    public_url: String,
    subject: String,
    transport: Option<Arc<dyn InvitationTransport>>,
}

impl Invitations {
    pub fn new(
        config: &InvitationConfig,
        public_url: &str,
        transport: Option<Arc<dyn InvitationTransport>>,
    ) -> Self {
        Self {
            mode: config.mode,
            public_url: public_url.trim_end_matches('/').to_string(),
            subject: config.subject.clone(),
            transport,
        }
    }

    pub fn dry_run(public_url: &str) -> Self {
        Self::new(&InvitationConfig::default(), public_url, None)
    }

    /// Link a participant opens to join `interview_id`
    pub fn link(&self, interview_id: &str, contact: &ParticipantId) -> String {
        format!(
            "{}/interview?id={}&u={}",
            self.public_url,
            interview_id,
            encode_token(contact.as_str())
        )
    }

    pub async fn dispatch(&self, interview: &Interview) -> Result<InvitationDispatch> {
        let links: Vec<InvitationLink> = interview
            .participants
            .iter()
            .map(|p| InvitationLink {
                contact: p.contact.clone(),
                link: self.link(&interview.id, &p.contact),
            })
            .collect();

        let transport = match (self.mode, &self.transport) {
            (InvitationMode::DryRun, _) => {
                for link in &links {
                    warn!(dry_run = true, "Invitation for {} not sent: {}", link.contact, link.link);
                }
                return Ok(InvitationDispatch::DryRun { links });
            }
            (InvitationMode::Deliver, Some(transport)) => transport,
            (InvitationMode::Deliver, None) => {
                return Err(Error::Config(
                    "invitation delivery is enabled but no transport is configured".to_string(),
                ))
            }
        };

        let mut delivered = 0;
        let mut failed = 0;

        for (participant, link) in interview.participants.iter().zip(links) {
            let message = InvitationMessage {
                interview_id: interview.id.clone(),
                name: participant.name.clone(),
                role: participant.role.clone(),
                contact: participant.contact.to_string(),
                link: link.link,
                organization: interview.organization.clone(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            };

            match transport.deliver(&self.subject, &message).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        interview_id = %interview.id,
                        participant = %participant.contact,
                        "Failed to send invitation: {:#}",
                        e
                    );
                    failed += 1;
                }
            }
        }

        info!(
            interview_id = %interview.id,
            "Invitations sent: {} delivered, {} failed",
            delivered,
            failed
        );

        Ok(InvitationDispatch::Sent { delivered, failed })
    }
}
