//! Process-wide session credential registry.
//!
//! The credential is the one piece of shared mutable state in the SDK. It is
//! fetched at checkout start, replaced wholesale whenever the processor
//! rotates it mid-flow, and refreshed on demand through a single in-flight
//! request fanned out to every waiter.

use std::sync::RwLock;

use checkout_models::SessionCredential;
use error_stack::ResultExt;
use masking::{PeekInterface, Secret};
use tracing::instrument;

use crate::errors::{report, CheckoutError, CustomResult, DiagnosticsExt};

/// Merchant-side source of fresh credential tokens. Implemented by the
/// integration; typically a call to the merchant backend which in turn asks
/// the processor for a new client session.
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn fetch_credential(&self) -> CustomResult<Secret<String>, CheckoutError>;
}

pub struct CredentialStore {
    current: RwLock<Option<SessionCredential>>,
    /// Serializes refreshes: concurrent callers that miss the fast path wait
    /// here and re-check instead of issuing duplicate fetches.
    refresh: tokio::sync::Mutex<()>,
    provider: Option<Box<dyn CredentialProvider>>,
}

impl CredentialStore {
    pub fn new(provider: Option<Box<dyn CredentialProvider>>) -> Self {
        Self {
            current: RwLock::new(None),
            refresh: tokio::sync::Mutex::new(()),
            provider,
        }
    }

    /// Decode and install a raw credential token, replacing any previous one.
    pub fn set_raw(&self, raw_token: &str) -> CustomResult<(), CheckoutError> {
        let credential = SessionCredential::decode(raw_token)
            .change_context(CheckoutError::InvalidCredential)
            .attach_diagnostics()?;
        self.replace(credential);
        Ok(())
    }

    pub fn replace(&self, credential: SessionCredential) {
        if let Ok(mut guard) = self.current.write() {
            *guard = Some(credential);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.current.write() {
            *guard = None;
        }
    }

    /// The current credential, valid or not.
    pub fn current(&self) -> Option<SessionCredential> {
        self.current.read().ok().and_then(|guard| guard.clone())
    }

    /// The current credential, only if it is still valid. No refresh.
    pub fn current_valid(&self) -> Option<SessionCredential> {
        self.current().filter(SessionCredential::is_valid)
    }

    /// Return a valid credential, refreshing through the provider when the
    /// stored one is absent or expired. Concurrent callers share one
    /// in-flight refresh.
    #[instrument(skip_all)]
    pub async fn ensure_valid(&self) -> CustomResult<SessionCredential, CheckoutError> {
        if let Some(credential) = self.current_valid() {
            return Ok(credential);
        }

        let _refresh_guard = self.refresh.lock().await;
        // Another caller may have refreshed while this one waited.
        if let Some(credential) = self.current_valid() {
            return Ok(credential);
        }

        let provider = self.provider.as_ref().ok_or_else(|| {
            report(CheckoutError::InvalidCredential)
                .attach_printable("no credential is stored and no provider is configured")
        })?;

        tracing::info!("session credential absent or expired, requesting a fresh one");
        let raw_token = provider.fetch_credential().await?;
        let credential = SessionCredential::decode(raw_token.peek())
            .change_context(CheckoutError::InvalidCredential)
            .attach_printable("provider returned an undecodable credential")
            .attach_diagnostics()?;
        if !credential.is_valid() {
            return Err(report(CheckoutError::InvalidCredential)
                .attach_printable("provider returned an expired credential"));
        }

        self.replace(credential.clone());
        Ok(credential)
    }
}
