//! Acting identity resolution
//!
//! A request acts either as a signed-in account or as a guest carrying an
//! invitation token. Tokens are URL-safe base64 of the participant's contact
//! identifier: reversible and text-safe, not a proof of anything.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::ParticipantId;

/// Authenticated account as reported by the auth gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
}

/// What a request carries about its caller
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub account: Option<Account>,
    /// Opaque `u` parameter from an invitation link
    pub invitation_token: Option<String>,
}

/// How the acting participant was identified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    Account,
    Invitation,
}

/// The participant a request acts as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingIdentity {
    pub participant: ParticipantId,
    /// Signed-in account id, kept for ownership checks
    pub account: Option<String>,
    pub source: IdentitySource,
}

/// Encode a contact identifier for use in an invitation link
pub fn encode_token(contact: &str) -> String {
    URL_SAFE_NO_PAD.encode(contact.as_bytes())
}

/// Decode an invitation token; anything undecodable is "no identity"
pub fn decode_token(token: &str) -> Option<String> {
    let trimmed = token.trim().trim_end_matches('=');
    if trimmed.is_empty() {
        return None;
    }

    let bytes = match URL_SAFE_NO_PAD.decode(trimmed) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Ignoring undecodable invitation token: {}", e);
            return None;
        }
    };

    match String::from_utf8(bytes) {
        Ok(contact) if !contact.trim().is_empty() => Some(contact),
        _ => None,
    }
}

/// Resolve who a request acts as.
///
/// An invitation token names the acting participant even for a signed-in
/// caller; otherwise the account's e-mail is used. Returns `None` when neither
/// is available.
pub fn resolve(ctx: &RequestContext) -> Option<ActingIdentity> {
    let account_id = ctx.account.as_ref().map(|a| a.id.clone());

    if let Some(contact) = ctx.invitation_token.as_deref().and_then(decode_token) {
        return Some(ActingIdentity {
            participant: ParticipantId::new(&contact),
            account: account_id,
            source: IdentitySource::Invitation,
        });
    }

    let account = ctx.account.as_ref()?;
    let participant = ParticipantId::new(&account.email);
    if participant.is_empty() {
        return None;
    }

    Some(ActingIdentity {
        participant,
        account: account_id,
        source: IdentitySource::Account,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_url_safe() {
        let token = encode_token("ana+ops@example.com");
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
        assert!(!token.contains('='));
    }

    #[test]
    fn test_padded_token_still_decodes() {
        let token = format!("{}==", encode_token("a@b.co"));
        assert_eq!(decode_token(&token).as_deref(), Some("a@b.co"));
    }
}
