//! Wire and domain types shared across the checkout SDK.
//!
//! Everything the processor API sends or receives lives here: the decoded
//! session credential, the processor configuration, payment-instrument and
//! token types, the create/resume payment bodies, and the 3-D Secure
//! transport types. Wire casing is camelCase throughout.

pub mod configuration;
pub mod credential;
pub mod enums;
pub mod payments;
pub mod three_ds;

pub use configuration::{ConfigurationKeys, ProcessorConfiguration, ThreeDsCertificate};
pub use credential::{CredentialDecodeError, SessionCredential};
pub use enums::{
    CardNetwork, Environment, PaymentInstrumentType, PaymentStatus, RequiredActionKind,
    SessionIntent, ThreeDsResponseCode,
};
pub use payments::{
    BinData, PaymentCreateRequest, PaymentInstrumentData, PaymentMethodToken, PaymentResponse,
    PaymentResumeRequest, RequiredAction, ThreeDsAuthenticationData, TokenInstrumentData,
    TokenizationRequest,
};
pub use three_ds::{
    BeginAuthRequest, BeginAuthResponse, ContinueInfo, EngineErrorInfo, PostAuthResponse,
    SdkAuthData, ServerAuthData, ServerAuthentication,
};
