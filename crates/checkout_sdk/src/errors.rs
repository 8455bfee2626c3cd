//! Error taxonomy for the checkout flow.
//!
//! Two layers: [`ApiClientError`] describes what went wrong at the transport
//! level, [`CheckoutError`] is the flow-level taxonomy surfaced to the
//! merchant integration. Services translate the former into the latter with
//! `change_context`, so the full chain stays attached for diagnostics.

use std::fmt;

use serde::Deserialize;

/// Type alias for `Result<T, error_stack::Report<E>>`.
pub type CustomResult<T, E> = error_stack::Result<T, E>;

/// Error body the processor returns on non-2xx responses.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorErrorResponse {
    pub error_id: String,
    pub description: String,
    pub diagnostics_id: String,
    #[serde(default)]
    pub validation_errors: Option<Vec<String>>,
}

/// Transport-level failures talking to the processor.
#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("failed to construct the HTTP client")]
    ClientConstructionFailed,
    #[error("failed to parse the request URL")]
    UrlParsingFailed,
    #[error("failed to serialize the request body")]
    BodySerializationFailed,
    #[error("failed to send the request: {0}")]
    RequestNotSent(String),
    #[error("request timed out")]
    RequestTimeout,
    #[error("unauthorized: the session credential was rejected")]
    Unauthorized,
    #[error("server returned {status}")]
    ServerError {
        status: u16,
        response: Option<ProcessorErrorResponse>,
    },
    #[error("failed to decode the response body")]
    ResponseDecodingFailed,
}

/// A single invalid-field finding of the input validator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: crate::validator::InputElementType,
    pub message: &'static str,
}

/// Aggregated outcome of input validation: every missing required field and
/// every malformed present field, in one value, so the caller can render
/// per-field errors in a single pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub missing: Vec<crate::validator::InputElementType>,
    pub invalid: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input validation failed:")?;
        for field in &self.missing {
            write!(f, " missing {field};")?;
        }
        for violation in &self.invalid {
            write!(f, " {}: {};", violation.field, violation.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Flow-level error taxonomy surfaced to the merchant integration.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// Fatal to the current attempt; a credential refresh may recover.
    #[error("session credential is missing, expired, or malformed")]
    InvalidCredential,
    /// Fatal; the processor configuration has not been fetched.
    #[error("processor configuration is not available")]
    MissingConfiguration,
    /// Recoverable; re-render the form with the aggregated findings.
    #[error("{0}")]
    Validation(ValidationErrors),
    /// The credential carries no PCI endpoint; tokenization cannot start.
    #[error("tokenization pre-request checks failed")]
    TokenizationPreRequestFailed,
    /// Transport or server failure on the tokenization endpoint.
    #[error("tokenization request failed")]
    TokenizationFailed,
    /// Terminal failure of the 3DS orchestration.
    #[error("3-D Secure authentication failed")]
    ThreeDsFailed,
    /// User dismissed the challenge surface; terminal, no retry.
    #[error("3-D Secure challenge was cancelled")]
    ChallengeCancelled,
    /// A second authentication transaction was started while one was
    /// unresolved.
    #[error("an authentication transaction is already in progress")]
    AuthenticationInProgress,
    /// Transport or server failure on the create/resume payment endpoints.
    #[error("payment request failed")]
    PaymentRequestFailed,
}

/// Unique identifier attached to every surfaced error, quoted in logs and
/// support requests.
#[derive(Clone, Debug)]
pub struct DiagnosticsId(pub uuid::Uuid);

impl DiagnosticsId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for DiagnosticsId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DiagnosticsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "diagnostics_id: {}", self.0)
    }
}

/// Build a report carrying a fresh diagnostics id.
pub fn report(error: CheckoutError) -> error_stack::Report<CheckoutError> {
    error_stack::Report::new(error).attach_printable(DiagnosticsId::new())
}

/// Attach a fresh diagnostics id to reports produced via `change_context`.
pub trait DiagnosticsExt {
    #[must_use]
    fn attach_diagnostics(self) -> Self;
}

impl<T, E> DiagnosticsExt for CustomResult<T, E> {
    fn attach_diagnostics(self) -> Self {
        self.map_err(|report| report.attach_printable(DiagnosticsId::new()))
    }
}
