//! Exchange raw payment instrument data for a single-use or vaulted token.

use checkout_models::{
    PaymentInstrumentData, PaymentMethodToken, SessionCredential, SessionIntent,
    TokenizationRequest,
};
use error_stack::ResultExt;
use tracing::instrument;

use crate::{
    api_client::ProcessorApi,
    errors::{report, CheckoutError, CustomResult, DiagnosticsExt},
};

pub struct TokenizationService<'a> {
    api: &'a dyn ProcessorApi,
}

impl<'a> TokenizationService<'a> {
    pub fn new(api: &'a dyn ProcessorApi) -> Self {
        Self { api }
    }

    /// Tokenize the given instrument under the session's intent. A vault
    /// session marks the token for storage; a checkout session produces a
    /// single-use token.
    #[instrument(skip_all, fields(instrument = %instrument.instrument_type()))]
    pub async fn tokenize(
        &self,
        credential: &SessionCredential,
        instrument: PaymentInstrumentData,
    ) -> CustomResult<PaymentMethodToken, CheckoutError> {
        if credential.pci_url.is_none() {
            return Err(report(CheckoutError::TokenizationPreRequestFailed)
                .attach_printable("session credential carries no PCI endpoint"));
        }

        let token_type = match credential.intent {
            SessionIntent::Vault => Some(SessionIntent::Vault),
            SessionIntent::Checkout => None,
        };
        let request = TokenizationRequest {
            payment_instrument: instrument,
            token_type,
        };

        self.api
            .tokenize(credential, &request)
            .await
            .change_context(CheckoutError::TokenizationFailed)
            .attach_diagnostics()
    }
}
