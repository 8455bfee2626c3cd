//! End-to-end checkout orchestration.
//!
//! `CheckoutFlow::pay` is the single entry point the merchant integration
//! drives: validate input, tokenize, create the payment, and service any
//! 3-D Secure required actions the server raises, resuming the payment after
//! each one. Progress and failure are mirrored to the [`CheckoutDelegate`];
//! `checkout_failed` fires exactly once per failed attempt, whichever stage
//! failed.

use checkout_models::{
    PaymentMethodToken, PaymentResponse, PaymentStatus, ProcessorConfiguration, SessionIntent,
};
use masking::PeekInterface;
use tracing::instrument;

use crate::{
    api_client::ProcessorApi,
    consts,
    errors::{report, CheckoutError, CustomResult},
    payments::PaymentService,
    session::CredentialStore,
    three_ds::{ThreeDsEngine, ThreeDsService},
    tokenization::TokenizationService,
    validator::{self, InputElementType, InputFields},
};

/// Integration-supplied switches for one checkout attempt.
#[derive(Clone, Debug)]
pub struct CheckoutSettings {
    /// When off, server-requested 3DS rounds take the continue-without-
    /// authentication fallback instead of driving the device engine.
    pub is_three_ds_enabled: bool,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            is_three_ds_enabled: true,
        }
    }
}

/// Observer surface for the merchant integration. All methods default to
/// no-ops so integrations implement only what they render.
pub trait CheckoutDelegate: Send + Sync {
    fn tokenization_started(&self) {}
    fn tokenization_succeeded(&self, _token: &PaymentMethodToken) {}
    fn tokenization_failed(&self, _error: &error_stack::Report<CheckoutError>) {}
    fn payment_resume_requested(&self, _resume_token: &str) {}
    fn three_ds_challenge_dismissed(&self) {}
    fn checkout_failed(&self, _error: &error_stack::Report<CheckoutError>) {}
}

/// What a finished attempt produced. Vault sessions stop at the token;
/// checkout sessions carry the payment through to a terminal status.
#[derive(Debug)]
pub enum CheckoutOutcome {
    Tokenized(PaymentMethodToken),
    Payment(PaymentResponse),
}

pub struct CheckoutFlow<'a> {
    api: &'a dyn ProcessorApi,
    credentials: &'a CredentialStore,
    configuration: Option<ProcessorConfiguration>,
    settings: CheckoutSettings,
    delegate: &'a dyn CheckoutDelegate,
    three_ds: ThreeDsService<'a>,
}

impl<'a> CheckoutFlow<'a> {
    pub fn new(
        api: &'a dyn ProcessorApi,
        engine: Option<&'a dyn ThreeDsEngine>,
        credentials: &'a CredentialStore,
        settings: CheckoutSettings,
        delegate: &'a dyn CheckoutDelegate,
    ) -> Self {
        let effective_engine = settings.is_three_ds_enabled.then_some(engine).flatten();
        Self {
            api,
            credentials,
            configuration: None,
            settings,
            delegate,
            three_ds: ThreeDsService::new(api, effective_engine),
        }
    }

    /// Attach the processor configuration fetched at session start. Without
    /// it any 3DS round aborts with [`CheckoutError::MissingConfiguration`]
    /// before the processor is contacted.
    pub fn with_configuration(mut self, configuration: ProcessorConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Run one checkout attempt from raw form input.
    ///
    /// On failure the delegate's `checkout_failed` fires once with the full
    /// report before the error is returned.
    #[instrument(skip_all)]
    pub async fn pay(
        &self,
        fields: InputFields,
        required: &[InputElementType],
    ) -> CustomResult<CheckoutOutcome, CheckoutError> {
        match self.run(fields, required).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                self.delegate.checkout_failed(&error);
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        fields: InputFields,
        required: &[InputElementType],
    ) -> CustomResult<CheckoutOutcome, CheckoutError> {
        let mut credential = self.credentials.ensure_valid().await?;

        validator::validate(&fields, required)
            .map_err(|errors| report(CheckoutError::Validation(errors)))?;
        let instrument = validator::build_instrument(&fields)?;

        self.delegate.tokenization_started();
        let token = match TokenizationService::new(self.api)
            .tokenize(&credential, instrument)
            .await
        {
            Ok(token) => token,
            Err(error) => {
                self.delegate.tokenization_failed(&error);
                return Err(error);
            }
        };
        self.delegate.tokenization_succeeded(&token);

        if credential.intent == SessionIntent::Vault {
            return Ok(CheckoutOutcome::Tokenized(token));
        }

        let payments = PaymentService::new(self.api);
        let mut payment = payments.create(&credential, token.token.clone()).await?;

        let mut rounds: u8 = 0;
        while let Some(action) = payment.required_action.take() {
            if !action.name.is_three_ds() {
                return Err(report(CheckoutError::PaymentRequestFailed).attach_printable(
                    format!("server requested an unsupported action: {}", action.name),
                ));
            }
            if rounds >= consts::MAX_REQUIRED_ACTION_ROUNDS {
                return Err(report(CheckoutError::ThreeDsFailed).attach_printable(format!(
                    "server requested more than {} authentication rounds",
                    consts::MAX_REQUIRED_ACTION_ROUNDS
                )));
            }
            rounds += 1;

            // The server may rotate the session credential together with the
            // required action; later calls must carry the new one.
            if let Some(new_token) = &action.client_token {
                self.credentials.set_raw(new_token.peek())?;
                credential = self.credentials.ensure_valid().await?;
            }

            let outcome = match self
                .three_ds
                .authenticate(&credential, self.configuration.as_ref(), &token)
                .await
            {
                Ok(outcome) => outcome,
                Err(error) => {
                    if matches!(error.current_context(), CheckoutError::ChallengeCancelled) {
                        self.delegate.three_ds_challenge_dismissed();
                    }
                    return Err(error);
                }
            };

            self.delegate.payment_resume_requested(&outcome.resume_token);
            payment = payments
                .resume(&credential, &payment.id, outcome.resume_token)
                .await?;
        }

        if matches!(
            payment.status,
            PaymentStatus::Declined | PaymentStatus::Failed | PaymentStatus::Cancelled
        ) {
            return Err(report(CheckoutError::PaymentRequestFailed)
                .attach_printable(format!("payment ended in status {}", payment.status)));
        }

        Ok(CheckoutOutcome::Payment(payment))
    }

    /// Whether device-side 3DS is active for this flow.
    pub fn is_three_ds_enabled(&self) -> bool {
        self.settings.is_three_ds_enabled
    }
}
