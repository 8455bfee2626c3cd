//! Seam to the device-side 3-D Secure engine.
//!
//! The engine is the vendor component that produces device authentication
//! data and renders the challenge surface. The orchestration in
//! [`super::service`] only talks to this trait; production wires in the
//! vendor bridge, tests wire in a scripted double.

use checkout_models::{EngineErrorInfo, Environment, SdkAuthData, ServerAuthData, ThreeDsCertificate};
use masking::Secret;

use crate::errors::CustomResult;

/// Engine-side failures. `Cancelled` is the user dismissing the challenge
/// surface; everything else carries the structured error the continue
/// endpoint expects.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("3-D Secure challenge was cancelled by the user")]
    Cancelled,
    #[error("3-D Secure engine failed: {}", .0.description)]
    Sdk(EngineErrorInfo),
}

/// Environment selector understood by the engine. Anything that is not
/// production or staging runs against the sandbox directory servers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEnvironment {
    Sandbox,
    Staging,
    Production,
}

impl From<Environment> for EngineEnvironment {
    fn from(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::Production,
            Environment::Staging => Self::Staging,
            Environment::Sandbox => Self::Sandbox,
        }
    }
}

/// Everything the engine needs before a transaction can be created.
pub struct EngineInitConfig {
    pub environment: EngineEnvironment,
    pub license_key: Secret<String>,
    pub certificates: Vec<ThreeDsCertificate>,
    /// Relaxes device checks (jailbreak/root detection) when the session
    /// opts in.
    pub enable_weak_validation: bool,
}

/// Device authentication material for one transaction.
pub struct EngineTransaction {
    /// Highest protocol version both device and directory server speak.
    pub max_supported_protocol_version: String,
    pub auth_data: SdkAuthData,
}

/// Outcome of a completed challenge.
pub struct ChallengeCompletion {
    pub transaction_status: String,
}

#[async_trait::async_trait]
pub trait ThreeDsEngine: Send + Sync {
    /// Engine build version, gated against the minimum supported one before
    /// initialization.
    fn version(&self) -> String;

    async fn initialize(&self, config: EngineInitConfig) -> CustomResult<(), EngineError>;

    /// Create a transaction against the given directory server and produce
    /// the device authentication data.
    async fn create_transaction(
        &self,
        directory_server_id: &str,
        protocol_version: &str,
    ) -> CustomResult<EngineTransaction, EngineError>;

    /// Render the challenge surface and block until it resolves.
    async fn perform_challenge(
        &self,
        auth_data: &ServerAuthData,
    ) -> CustomResult<ChallengeCompletion, EngineError>;
}
