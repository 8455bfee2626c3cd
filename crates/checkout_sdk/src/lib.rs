//! Checkout SDK core: payment method tokenization, 3-D Secure
//! orchestration, and payment create/resume against the processor API.
//!
//! The crate is organized around one shared [`session::CredentialStore`],
//! stateless services per processor endpoint group, and
//! [`flow::CheckoutFlow`] tying them together for the merchant integration.

pub mod api_client;
pub mod consts;
pub mod errors;
pub mod flow;
pub mod payments;
pub mod session;
pub mod three_ds;
pub mod tokenization;
pub mod validator;

pub use api_client::{ProcessorApi, ProcessorClient};
pub use errors::{ApiClientError, CheckoutError, CustomResult, ValidationErrors};
pub use flow::{CheckoutDelegate, CheckoutFlow, CheckoutOutcome, CheckoutSettings};
pub use session::{CredentialProvider, CredentialStore};
pub use three_ds::{ThreeDsEngine, ThreeDsOutcome, ThreeDsService};
pub use tokenization::TokenizationService;
