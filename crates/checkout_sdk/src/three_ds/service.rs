//! 3-D Secure orchestration.
//!
//! Drives one authentication transaction end to end: device preparation
//! through the engine, the server-side begin call, the optional challenge,
//! and the continue call that closes the transaction.
//!
//! Failure handling is split two ways. Fatal failures (bad credential,
//! missing configuration) abort before the processor learns anything.
//! Everything that goes wrong after that point falls back to the continue
//! endpoint carrying a structured [`EngineErrorInfo`], so the processor can
//! record the failure and still hand back a resume token; the payment then
//! proceeds without device authentication. The one exception is the user
//! cancelling the challenge, which is terminal and closes nothing.
//!
//! The continue endpoint is called at most once per transaction, on the
//! success path and on every fallback path alike.

use std::sync::atomic::{AtomicBool, Ordering};

use checkout_models::{
    BeginAuthRequest, CardNetwork, ContinueInfo, EngineErrorInfo, PaymentMethodToken,
    ProcessorConfiguration, ServerAuthData, ServerAuthentication, SessionCredential,
};
use error_stack::ResultExt;
use tracing::instrument;

use crate::{
    api_client::ProcessorApi,
    consts,
    errors::{report, CheckoutError, CustomResult, DiagnosticsExt},
    three_ds::engine::{EngineError, EngineInitConfig, EngineTransaction, ThreeDsEngine},
};

/// Result of a completed authentication transaction. The resume token is
/// what the payment resume endpoint expects; the authentication record is
/// present when the server produced one.
#[derive(Debug)]
pub struct ThreeDsOutcome {
    pub resume_token: String,
    pub authentication: Option<ServerAuthentication>,
}

/// Where the transaction stands. Stepped forward by
/// [`ThreeDsService::authenticate`]; terminal states are `Finalize` (which
/// still performs the continue call) and the cancel/abort exits.
enum AuthStep {
    PrepareDevice,
    BeginServerAuth(EngineTransaction),
    Challenge(Box<ServerAuthentication>, Option<String>),
    Finalize(ContinueInfo),
}

/// Resets the in-progress flag when the transaction scope ends, on every
/// exit path.
struct TransactionGuard<'a>(&'a AtomicBool);

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ThreeDsService<'a> {
    api: &'a dyn ProcessorApi,
    engine: Option<&'a dyn ThreeDsEngine>,
    in_progress: AtomicBool,
}

impl<'a> ThreeDsService<'a> {
    pub fn new(api: &'a dyn ProcessorApi, engine: Option<&'a dyn ThreeDsEngine>) -> Self {
        Self {
            api,
            engine,
            in_progress: AtomicBool::new(false),
        }
    }

    /// Run one authentication transaction for a tokenized card.
    ///
    /// Only one transaction may be in flight per service; a second call
    /// while the first is unresolved fails with
    /// [`CheckoutError::AuthenticationInProgress`].
    #[instrument(skip_all, fields(token = %token.token))]
    pub async fn authenticate(
        &self,
        credential: &SessionCredential,
        configuration: Option<&ProcessorConfiguration>,
        token: &PaymentMethodToken,
    ) -> CustomResult<ThreeDsOutcome, CheckoutError> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(report(CheckoutError::AuthenticationInProgress));
        }
        let _guard = TransactionGuard(&self.in_progress);

        // Fatal preconditions: nothing has reached the processor yet, so
        // there is no transaction to close.
        if !credential.is_valid() {
            return Err(report(CheckoutError::InvalidCredential)
                .attach_printable("credential expired before authentication started"));
        }
        let configuration = configuration
            .ok_or_else(|| report(CheckoutError::MissingConfiguration))
            .attach_printable("processor configuration was not fetched before authentication")?;

        let mut step = AuthStep::PrepareDevice;
        let mut auth_record: Option<ServerAuthentication> = None;
        loop {
            step = match step {
                AuthStep::PrepareDevice => {
                    match self.prepare_device(credential, configuration, token).await {
                        Ok(transaction) => AuthStep::BeginServerAuth(transaction),
                        Err(error) => {
                            tracing::warn!(error_id = %error.error_id, "device preparation failed, continuing without 3DS");
                            AuthStep::Finalize(ContinueInfo::with_error(None, error))
                        }
                    }
                }
                AuthStep::BeginServerAuth(transaction) => {
                    let protocol_version = transaction.max_supported_protocol_version.clone();
                    match self.begin_server_auth(credential, token, transaction).await {
                        Ok(response) => {
                            if response.authentication.response_code.requires_challenge() {
                                AuthStep::Challenge(
                                    Box::new(response.authentication),
                                    Some(protocol_version),
                                )
                            } else {
                                // Frictionless and not-performed outcomes
                                // close the transaction the same way.
                                auth_record = Some(response.authentication);
                                AuthStep::Finalize(ContinueInfo::clean(Some(protocol_version)))
                            }
                        }
                        Err(error) => {
                            tracing::warn!(error_id = %error.error_id, "server authentication failed, continuing without 3DS");
                            AuthStep::Finalize(ContinueInfo::with_error(
                                Some(protocol_version),
                                error,
                            ))
                        }
                    }
                }
                AuthStep::Challenge(authentication, protocol_version) => {
                    match self.perform_challenge(&authentication).await {
                        Ok(()) => {
                            auth_record = Some(*authentication);
                            AuthStep::Finalize(ContinueInfo::clean(protocol_version))
                        }
                        Err(ChallengeFailure::Cancelled) => {
                            // Terminal by design: the user backed out, the
                            // transaction is abandoned unclosed.
                            return Err(report(CheckoutError::ChallengeCancelled));
                        }
                        Err(ChallengeFailure::Engine(error)) => {
                            tracing::warn!(error_id = %error.error_id, "challenge failed, continuing without 3DS");
                            AuthStep::Finalize(ContinueInfo::with_error(protocol_version, error))
                        }
                    }
                }
                AuthStep::Finalize(continue_info) => {
                    let response = self
                        .api
                        .continue_three_ds_auth(credential, &token.token, &continue_info)
                        .await
                        .change_context(CheckoutError::ThreeDsFailed)
                        .attach_printable("continue call failed, transaction left unresolved")
                        .attach_diagnostics()?;
                    return Ok(ThreeDsOutcome {
                        resume_token: response.resume_token,
                        authentication: response.authentication.or(auth_record),
                    });
                }
            };
        }
    }

    /// Initialize the engine and create a device transaction. Any failure
    /// here becomes a continue-endpoint fallback, never a hard error.
    async fn prepare_device(
        &self,
        credential: &SessionCredential,
        configuration: &ProcessorConfiguration,
        token: &PaymentMethodToken,
    ) -> Result<EngineTransaction, EngineErrorInfo> {
        let engine = self.engine.ok_or_else(|| {
            EngineErrorInfo::new(
                "missing-3ds-engine",
                "no 3-D Secure engine is wired into the SDK",
            )
        })?;

        let engine_version = engine.version();
        if !version_at_least(&engine_version, consts::MIN_ENGINE_VERSION) {
            return Err(EngineErrorInfo::new(
                "invalid-3ds-engine-version",
                format!(
                    "engine version {engine_version} is older than the minimum supported {}",
                    consts::MIN_ENGINE_VERSION
                ),
            ));
        }

        let license_key = configuration
            .three_ds_license_key()
            .cloned()
            .ok_or_else(|| {
                EngineErrorInfo::new(
                    "missing-3ds-license-key",
                    "processor configuration carries no 3-D Secure license key",
                )
            })?;

        let network = token
            .bin_network()
            .map(CardNetwork::from_network_str)
            .unwrap_or(CardNetwork::Unknown);
        let directory_server_id = network.directory_server_id().ok_or_else(|| {
            EngineErrorInfo::new(
                "unsupported-card-network",
                format!("no directory server is registered for {network}"),
            )
        })?;

        engine
            .initialize(EngineInitConfig {
                environment: credential.environment.into(),
                license_key,
                certificates: configuration.three_ds_certificates().to_vec(),
                enable_weak_validation: credential.use_three_ds_weak_validation,
            })
            .await
            .map_err(|report| engine_error_info(report, "3ds-engine-init-failed"))?;

        let protocol_version =
            max_protocol_version(&credential.supported_three_ds_protocol_versions);
        engine
            .create_transaction(directory_server_id, &protocol_version)
            .await
            .map_err(|report| engine_error_info(report, "3ds-transaction-failed"))
    }

    async fn begin_server_auth(
        &self,
        credential: &SessionCredential,
        token: &PaymentMethodToken,
        transaction: EngineTransaction,
    ) -> Result<checkout_models::BeginAuthResponse, EngineErrorInfo> {
        let request = BeginAuthRequest {
            max_protocol_version: transaction.max_supported_protocol_version,
            device: transaction.auth_data,
        };
        self.api
            .begin_three_ds_auth(credential, &token.token, &request)
            .await
            .map_err(|report| {
                tracing::warn!(?report, "begin authentication request failed");
                EngineErrorInfo::new(
                    "3ds-begin-auth-failed",
                    report.current_context().to_string(),
                )
            })
    }

    async fn perform_challenge(
        &self,
        authentication: &ServerAuthentication,
    ) -> Result<(), ChallengeFailure> {
        let engine = self
            .engine
            .ok_or_else(|| {
                ChallengeFailure::Engine(EngineErrorInfo::new(
                    "missing-3ds-engine",
                    "no 3-D Secure engine is wired into the SDK",
                ))
            })?;
        let auth_data = ServerAuthData::from(authentication);
        let completion = engine
            .perform_challenge(&auth_data)
            .await
            .map_err(|report| match report.current_context() {
                EngineError::Cancelled => ChallengeFailure::Cancelled,
                EngineError::Sdk(_) => {
                    ChallengeFailure::Engine(engine_error_info(report, "3ds-challenge-failed"))
                }
            })?;
        // The issuer's verdict travels server-side; the device-side status is
        // recorded for diagnostics only.
        tracing::info!(transaction_status = %completion.transaction_status, "challenge completed");
        Ok(())
    }
}

enum ChallengeFailure {
    Cancelled,
    Engine(EngineErrorInfo),
}

fn engine_error_info(
    report: error_stack::Report<EngineError>,
    fallback_id: &str,
) -> EngineErrorInfo {
    match report.current_context() {
        EngineError::Sdk(info) => info.clone(),
        EngineError::Cancelled => {
            EngineErrorInfo::new(fallback_id, report.current_context().to_string())
        }
    }
}

/// Numeric dotted-segment comparison; missing segments count as zero. Falls
/// back to rejecting unparsable versions.
fn version_at_least(version: &str, minimum: &str) -> bool {
    let parse = |value: &str| -> Option<Vec<u32>> {
        value
            .trim()
            .split('.')
            .map(|segment| segment.parse::<u32>().ok())
            .collect()
    };
    match (parse(version), parse(minimum)) {
        (Some(version), Some(minimum)) => {
            let len = version.len().max(minimum.len());
            for index in 0..len {
                let have = version.get(index).copied().unwrap_or(0);
                let need = minimum.get(index).copied().unwrap_or(0);
                if have != need {
                    return have > need;
                }
            }
            true
        }
        _ => false,
    }
}

/// Highest protocol version the session supports, by the same dotted-segment
/// order.
fn max_protocol_version(supported: &[String]) -> String {
    supported
        .iter()
        .fold(None::<&String>, |best, candidate| match best {
            Some(best) if version_at_least(best, candidate) => Some(best),
            _ => Some(candidate),
        })
        .cloned()
        .unwrap_or_else(|| consts::DEFAULT_THREE_DS_PROTOCOL_VERSION.to_string())
}
