//! Payment create/resume against the processor core API.

use checkout_models::{
    PaymentCreateRequest, PaymentResponse, PaymentResumeRequest, SessionCredential,
};
use error_stack::ResultExt;
use tracing::instrument;

use crate::{
    api_client::ProcessorApi,
    errors::{CheckoutError, CustomResult, DiagnosticsExt},
};

pub struct PaymentService<'a> {
    api: &'a dyn ProcessorApi,
}

impl<'a> PaymentService<'a> {
    pub fn new(api: &'a dyn ProcessorApi) -> Self {
        Self { api }
    }

    #[instrument(skip_all)]
    pub async fn create(
        &self,
        credential: &SessionCredential,
        payment_method_token: String,
    ) -> CustomResult<PaymentResponse, CheckoutError> {
        let request = PaymentCreateRequest {
            payment_method_token,
        };
        self.api
            .create_payment(credential, &request)
            .await
            .change_context(CheckoutError::PaymentRequestFailed)
            .attach_diagnostics()
    }

    #[instrument(skip_all, fields(payment_id = %payment_id))]
    pub async fn resume(
        &self,
        credential: &SessionCredential,
        payment_id: &str,
        resume_token: String,
    ) -> CustomResult<PaymentResponse, CheckoutError> {
        let request = PaymentResumeRequest { resume_token };
        self.api
            .resume_payment(credential, payment_id, &request)
            .await
            .change_context(CheckoutError::PaymentRequestFailed)
            .attach_diagnostics()
    }
}
