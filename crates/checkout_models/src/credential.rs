//! The session credential: a signed token issued by the processor backend,
//! handed to the SDK by the merchant integration at checkout start.
//!
//! The token is three dot-separated segments; the middle segment is
//! base64url-encoded JSON. Signature verification happens server-side, the
//! client only decodes the payload to learn where to send requests and when
//! the session runs out.

use base64::Engine;
use masking::{PeekInterface, Secret};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::enums::{Environment, SessionIntent};

#[derive(Debug, thiserror::Error)]
pub enum CredentialDecodeError {
    #[error("credential token has an unexpected segment layout")]
    MalformedToken,
    #[error("credential payload is not valid base64")]
    InvalidBase64,
    #[error("credential payload is not valid JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialPayload {
    #[serde(default)]
    env: Option<Environment>,
    intent: SessionIntent,
    /// Unix seconds.
    exp: i64,
    #[serde(default)]
    pci_url: Option<String>,
    #[serde(default)]
    core_url: Option<String>,
    #[serde(default)]
    supported_three_ds_protocol_versions: Vec<String>,
    #[serde(default)]
    use_three_ds_weak_validation: Option<bool>,
}

/// Decoded session credential. Immutable; a refresh replaces it wholesale.
#[derive(Clone, Debug)]
pub struct SessionCredential {
    raw: Secret<String>,
    pub environment: Environment,
    pub intent: SessionIntent,
    pub expiry: OffsetDateTime,
    pub pci_url: Option<String>,
    pub core_url: Option<String>,
    pub supported_three_ds_protocol_versions: Vec<String>,
    pub use_three_ds_weak_validation: bool,
}

impl SessionCredential {
    /// Decode a raw credential token. Accepts the full three-segment signed
    /// form or a bare base64 payload (issued by some sandbox tooling).
    pub fn decode(raw_token: &str) -> Result<Self, CredentialDecodeError> {
        let raw_token = raw_token.trim();
        if raw_token.is_empty() {
            return Err(CredentialDecodeError::MalformedToken);
        }

        let segments: Vec<&str> = raw_token.split('.').collect();
        let payload_segment = match segments.len() {
            1 => segments[0],
            3 => segments[1],
            _ => return Err(CredentialDecodeError::MalformedToken),
        };

        let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload_segment)
            .or_else(|_| base64::engine::general_purpose::STANDARD.decode(payload_segment))
            .map_err(|_| CredentialDecodeError::InvalidBase64)?;
        let payload: CredentialPayload = serde_json::from_slice(&payload_bytes)?;

        Ok(Self {
            raw: Secret::new(raw_token.to_string()),
            environment: payload.env.unwrap_or_default(),
            intent: payload.intent,
            expiry: OffsetDateTime::from_unix_timestamp(payload.exp)
                .map_err(|_| CredentialDecodeError::MalformedToken)?,
            pci_url: payload.pci_url,
            core_url: payload.core_url,
            supported_three_ds_protocol_versions: payload.supported_three_ds_protocol_versions,
            // Weak validation is opt-out, matching the server default.
            use_three_ds_weak_validation: payload.use_three_ds_weak_validation.unwrap_or(true),
        })
    }

    /// The raw token string, injected as the auth header on every request.
    pub fn raw_token(&self) -> &str {
        self.raw.peek()
    }

    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expiry
    }

    /// A credential is usable while it has not expired.
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}
