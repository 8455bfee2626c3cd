#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use base64::Engine;
use checkout_models::{
    BeginAuthRequest, BeginAuthResponse, ConfigurationKeys, ContinueInfo, EngineErrorInfo,
    PaymentCreateRequest, PaymentInstrumentType, PaymentMethodToken, PaymentResponse,
    PaymentResumeRequest, PaymentStatus, PostAuthResponse, ProcessorConfiguration, RequiredAction,
    RequiredActionKind, SdkAuthData, ServerAuthData, ServerAuthentication, SessionCredential,
    ThreeDsResponseCode, TokenInstrumentData, TokenizationRequest,
};
use checkout_sdk::{
    three_ds::{ChallengeCompletion, EngineError, EngineInitConfig, EngineTransaction},
    validator::{InputElementType, InputFields},
    ApiClientError, CheckoutDelegate, CheckoutError, CheckoutFlow, CheckoutOutcome,
    CheckoutSettings, CredentialStore, CustomResult, ProcessorApi, ThreeDsEngine, ThreeDsService,
};
use masking::Secret;

fn raw_token(exp_offset_secs: i64, intent: &str) -> String {
    let exp = time::OffsetDateTime::now_utc().unix_timestamp() + exp_offset_secs;
    let payload = serde_json::json!({
        "env": "SANDBOX",
        "intent": intent,
        "exp": exp,
        "pciUrl": "https://sdk.example.com/pci",
        "coreUrl": "https://sdk.example.com/core",
        "supportedThreeDsProtocolVersions": ["2.1.0", "2.2.0"],
    });
    let body =
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
    format!("hdr.{body}.sig")
}

fn checkout_store(exp_offset_secs: i64) -> CredentialStore {
    let store = CredentialStore::new(None);
    store.set_raw(&raw_token(exp_offset_secs, "CHECKOUT")).unwrap();
    store
}

fn configuration() -> ProcessorConfiguration {
    ProcessorConfiguration {
        keys: Some(ConfigurationKeys {
            three_ds_license_key: Some(Secret::new("license-key".to_string())),
            three_ds_certificates: Vec::new(),
        }),
    }
}

fn card_fields() -> InputFields {
    InputFields::from([
        (
            InputElementType::CardNumber,
            Secret::new("4242424242424242".to_string()),
        ),
        (InputElementType::ExpiryMonth, Secret::new("12".to_string())),
        (InputElementType::ExpiryYear, Secret::new("2030".to_string())),
        (InputElementType::Cvv, Secret::new("123".to_string())),
    ])
}

const CARD_REQUIRED: &[InputElementType] = &[
    InputElementType::CardNumber,
    InputElementType::ExpiryMonth,
    InputElementType::ExpiryYear,
    InputElementType::Cvv,
];

fn visa_token() -> PaymentMethodToken {
    PaymentMethodToken {
        token: "tok_123".to_string(),
        payment_instrument_type: PaymentInstrumentType::PaymentCard,
        payment_instrument_data: Some(TokenInstrumentData {
            bin_data: Some(checkout_models::BinData {
                network: Some("VISA".to_string()),
                issuer_country_code: None,
            }),
            last4_digits: Some("4242".to_string()),
        }),
        three_d_secure_authentication: None,
        analytics_id: None,
    }
}

#[derive(Default)]
struct MockApi {
    tokenize_calls: AtomicUsize,
    begin_calls: AtomicUsize,
    continue_calls: AtomicUsize,
    create_calls: AtomicUsize,
    resume_calls: AtomicUsize,
    /// Response code the begin endpoint answers with.
    begin_code: Option<ThreeDsResponseCode>,
    fail_tokenize: bool,
    /// How many payment responses still demand an authentication round.
    pending_action_rounds: AtomicUsize,
    /// Rotated credential attached to required actions, when set.
    rotated_credential: Option<String>,
    /// `error_id` of the continue-info error per continue call, if any.
    continue_errors: Mutex<Vec<Option<String>>>,
    /// Raw credential token seen by each begin call.
    begin_credentials: Mutex<Vec<String>>,
}

impl MockApi {
    fn with_action_rounds(rounds: usize) -> Self {
        let api = Self::default();
        api.pending_action_rounds.store(rounds, Ordering::SeqCst);
        api
    }

    fn payment_response(&self) -> PaymentResponse {
        let pending = self
            .pending_action_rounds
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if pending {
            PaymentResponse {
                id: "pay_1".to_string(),
                status: PaymentStatus::Pending,
                order_id: None,
                required_action: Some(RequiredAction {
                    name: RequiredActionKind::ThreeDsAuthentication,
                    description: None,
                    client_token: self.rotated_credential.clone().map(Secret::new),
                }),
            }
        } else {
            PaymentResponse {
                id: "pay_1".to_string(),
                status: PaymentStatus::Authorized,
                order_id: None,
                required_action: None,
            }
        }
    }
}

#[async_trait::async_trait]
impl ProcessorApi for MockApi {
    async fn tokenize(
        &self,
        _credential: &SessionCredential,
        _request: &TokenizationRequest,
    ) -> CustomResult<PaymentMethodToken, ApiClientError> {
        self.tokenize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_tokenize {
            return Err(error_stack::Report::new(ApiClientError::ServerError {
                status: 500,
                response: None,
            }));
        }
        Ok(visa_token())
    }

    async fn begin_three_ds_auth(
        &self,
        credential: &SessionCredential,
        _token_id: &str,
        _request: &BeginAuthRequest,
    ) -> CustomResult<BeginAuthResponse, ApiClientError> {
        self.begin_calls.fetch_add(1, Ordering::SeqCst);
        self.begin_credentials
            .lock()
            .unwrap()
            .push(credential.raw_token().to_string());
        Ok(BeginAuthResponse {
            authentication: ServerAuthentication {
                response_code: self.begin_code.unwrap_or(ThreeDsResponseCode::AuthSuccess),
                acs_reference_number: Some("acs-ref".to_string()),
                acs_signed_content: Some("signed".to_string()),
                acs_transaction_id: Some("acs-txn".to_string()),
                transaction_id: Some("txn".to_string()),
                protocol_version: Some("2.2.0".to_string()),
            },
            resume_token: "resume-from-begin".to_string(),
        })
    }

    async fn continue_three_ds_auth(
        &self,
        _credential: &SessionCredential,
        _token_id: &str,
        continue_info: &ContinueInfo,
    ) -> CustomResult<PostAuthResponse, ApiClientError> {
        self.continue_calls.fetch_add(1, Ordering::SeqCst);
        self.continue_errors
            .lock()
            .unwrap()
            .push(continue_info.error.as_ref().map(|e| e.error_id.clone()));
        Ok(PostAuthResponse {
            resume_token: "resume-from-continue".to_string(),
            authentication: None,
        })
    }

    async fn create_payment(
        &self,
        _credential: &SessionCredential,
        _request: &PaymentCreateRequest,
    ) -> CustomResult<PaymentResponse, ApiClientError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payment_response())
    }

    async fn resume_payment(
        &self,
        _credential: &SessionCredential,
        _payment_id: &str,
        _request: &PaymentResumeRequest,
    ) -> CustomResult<PaymentResponse, ApiClientError> {
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payment_response())
    }
}

#[derive(Clone, Copy)]
enum ChallengeScript {
    Succeed,
    Cancel,
    Fail,
}

struct MockEngine {
    version: String,
    fail_init: bool,
    challenge: ChallengeScript,
    init_delay: Option<Duration>,
    init_calls: AtomicUsize,
    challenge_calls: AtomicUsize,
}

impl MockEngine {
    fn healthy() -> Self {
        Self {
            version: "2.0.0".to_string(),
            fail_init: false,
            challenge: ChallengeScript::Succeed,
            init_delay: None,
            init_calls: AtomicUsize::new(0),
            challenge_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl ThreeDsEngine for MockEngine {
    fn version(&self) -> String {
        self.version.clone()
    }

    async fn initialize(&self, _config: EngineInitConfig) -> CustomResult<(), EngineError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.init_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_init {
            return Err(error_stack::Report::new(EngineError::Sdk(
                EngineErrorInfo::new("engine-init-crashed", "device engine failed to start"),
            )));
        }
        Ok(())
    }

    async fn create_transaction(
        &self,
        _directory_server_id: &str,
        protocol_version: &str,
    ) -> CustomResult<EngineTransaction, EngineError> {
        Ok(EngineTransaction {
            max_supported_protocol_version: protocol_version.to_string(),
            auth_data: SdkAuthData {
                sdk_app_id: "app".to_string(),
                sdk_transaction_id: "sdk-txn".to_string(),
                sdk_timeout: 300,
                sdk_enc_data: "enc".to_string(),
                sdk_ephem_pub_key: "pub".to_string(),
                sdk_reference_number: "ref".to_string(),
            },
        })
    }

    async fn perform_challenge(
        &self,
        _auth_data: &ServerAuthData,
    ) -> CustomResult<ChallengeCompletion, EngineError> {
        self.challenge_calls.fetch_add(1, Ordering::SeqCst);
        match self.challenge {
            ChallengeScript::Succeed => Ok(ChallengeCompletion {
                transaction_status: "Y".to_string(),
            }),
            ChallengeScript::Cancel => Err(error_stack::Report::new(EngineError::Cancelled)),
            ChallengeScript::Fail => Err(error_stack::Report::new(EngineError::Sdk(
                EngineErrorInfo::new("challenge-crashed", "challenge surface failed"),
            ))),
        }
    }
}

#[derive(Default)]
struct RecordingDelegate {
    tokenization_started: AtomicUsize,
    tokenization_succeeded: AtomicUsize,
    tokenization_failed: AtomicUsize,
    resume_requested: AtomicUsize,
    challenge_dismissed: AtomicUsize,
    failed: AtomicUsize,
}

impl CheckoutDelegate for RecordingDelegate {
    fn tokenization_started(&self) {
        self.tokenization_started.fetch_add(1, Ordering::SeqCst);
    }
    fn tokenization_succeeded(&self, _token: &PaymentMethodToken) {
        self.tokenization_succeeded.fetch_add(1, Ordering::SeqCst);
    }
    fn tokenization_failed(&self, _error: &error_stack::Report<CheckoutError>) {
        self.tokenization_failed.fetch_add(1, Ordering::SeqCst);
    }
    fn payment_resume_requested(&self, _resume_token: &str) {
        self.resume_requested.fetch_add(1, Ordering::SeqCst);
    }
    fn three_ds_challenge_dismissed(&self) {
        self.challenge_dismissed.fetch_add(1, Ordering::SeqCst);
    }
    fn checkout_failed(&self, _error: &error_stack::Report<CheckoutError>) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

fn flow<'a>(
    api: &'a MockApi,
    engine: Option<&'a dyn ThreeDsEngine>,
    store: &'a CredentialStore,
    delegate: &'a RecordingDelegate,
) -> CheckoutFlow<'a> {
    CheckoutFlow::new(api, engine, store, CheckoutSettings::default(), delegate)
        .with_configuration(configuration())
}

#[tokio::test]
async fn frictionless_flow_never_presents_a_challenge() {
    let api = MockApi {
        begin_code: Some(ThreeDsResponseCode::AuthSuccess),
        ..MockApi::with_action_rounds(1)
    };
    let engine = MockEngine::healthy();
    let store = checkout_store(3600);
    let delegate = RecordingDelegate::default();

    let outcome = flow(&api, Some(&engine), &store, &delegate)
        .pay(card_fields(), CARD_REQUIRED)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        CheckoutOutcome::Payment(PaymentResponse {
            status: PaymentStatus::Authorized,
            ..
        })
    ));
    assert_eq!(engine.challenge_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.continue_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.continue_errors.lock().unwrap().as_slice(), [None]);
    assert_eq!(delegate.tokenization_started.load(Ordering::SeqCst), 1);
    assert_eq!(delegate.tokenization_succeeded.load(Ordering::SeqCst), 1);
    assert_eq!(delegate.resume_requested.load(Ordering::SeqCst), 1);
    assert_eq!(delegate.failed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn challenge_flow_completes_and_finalizes_once() {
    let api = MockApi {
        begin_code: Some(ThreeDsResponseCode::Challenge),
        ..MockApi::with_action_rounds(1)
    };
    let engine = MockEngine::healthy();
    let store = checkout_store(3600);
    let delegate = RecordingDelegate::default();

    flow(&api, Some(&engine), &store, &delegate)
        .pay(card_fields(), CARD_REQUIRED)
        .await
        .unwrap();

    assert_eq!(engine.challenge_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.begin_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.continue_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.continue_errors.lock().unwrap().as_slice(), [None]);
}

#[tokio::test]
async fn engine_init_failure_still_closes_the_transaction() {
    let api = MockApi {
        begin_code: Some(ThreeDsResponseCode::Challenge),
        ..MockApi::with_action_rounds(1)
    };
    let engine = MockEngine {
        fail_init: true,
        ..MockEngine::healthy()
    };
    let store = checkout_store(3600);
    let delegate = RecordingDelegate::default();

    let outcome = flow(&api, Some(&engine), &store, &delegate)
        .pay(card_fields(), CARD_REQUIRED)
        .await
        .unwrap();

    // Device preparation never got as far as the server begin call, yet the
    // transaction is still closed through the continue endpoint and the
    // payment proceeds without device authentication.
    assert!(matches!(outcome, CheckoutOutcome::Payment(_)));
    assert_eq!(api.begin_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.continue_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        api.continue_errors.lock().unwrap().as_slice(),
        [Some("engine-init-crashed".to_string())]
    );
}

#[tokio::test]
async fn outdated_engine_takes_the_fallback_without_initializing() {
    let api = MockApi::with_action_rounds(1);
    let engine = MockEngine {
        version: "1.0.9".to_string(),
        ..MockEngine::healthy()
    };
    let store = checkout_store(3600);
    let delegate = RecordingDelegate::default();

    flow(&api, Some(&engine), &store, &delegate)
        .pay(card_fields(), CARD_REQUIRED)
        .await
        .unwrap();

    assert_eq!(engine.init_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        api.continue_errors.lock().unwrap().as_slice(),
        [Some("invalid-3ds-engine-version".to_string())]
    );
}

#[tokio::test]
async fn missing_engine_takes_the_fallback() {
    let api = MockApi::with_action_rounds(1);
    let store = checkout_store(3600);
    let delegate = RecordingDelegate::default();

    let outcome = flow(&api, None, &store, &delegate)
        .pay(card_fields(), CARD_REQUIRED)
        .await
        .unwrap();

    assert!(matches!(outcome, CheckoutOutcome::Payment(_)));
    assert_eq!(
        api.continue_errors.lock().unwrap().as_slice(),
        [Some("missing-3ds-engine".to_string())]
    );
}

#[tokio::test]
async fn missing_configuration_aborts_without_finalizing() {
    let api = MockApi::with_action_rounds(1);
    let engine = MockEngine::healthy();
    let store = checkout_store(3600);
    let delegate = RecordingDelegate::default();

    let error = CheckoutFlow::new(
        &api,
        Some(&engine),
        &store,
        CheckoutSettings::default(),
        &delegate,
    )
    .pay(card_fields(), CARD_REQUIRED)
    .await
    .unwrap_err();

    assert!(matches!(
        error.current_context(),
        CheckoutError::MissingConfiguration
    ));
    assert_eq!(api.begin_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.continue_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelled_challenge_is_terminal_and_never_finalizes() {
    let api = MockApi {
        begin_code: Some(ThreeDsResponseCode::Challenge),
        ..MockApi::with_action_rounds(1)
    };
    let engine = MockEngine {
        challenge: ChallengeScript::Cancel,
        ..MockEngine::healthy()
    };
    let store = checkout_store(3600);
    let delegate = RecordingDelegate::default();

    let error = flow(&api, Some(&engine), &store, &delegate)
        .pay(card_fields(), CARD_REQUIRED)
        .await
        .unwrap_err();

    assert!(matches!(
        error.current_context(),
        CheckoutError::ChallengeCancelled
    ));
    assert_eq!(api.continue_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.resume_calls.load(Ordering::SeqCst), 0);
    assert_eq!(delegate.challenge_dismissed.load(Ordering::SeqCst), 1);
    assert_eq!(delegate.failed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_challenge_falls_back_to_the_continue_endpoint() {
    let api = MockApi {
        begin_code: Some(ThreeDsResponseCode::Challenge),
        ..MockApi::with_action_rounds(1)
    };
    let engine = MockEngine {
        challenge: ChallengeScript::Fail,
        ..MockEngine::healthy()
    };
    let store = checkout_store(3600);
    let delegate = RecordingDelegate::default();

    flow(&api, Some(&engine), &store, &delegate)
        .pay(card_fields(), CARD_REQUIRED)
        .await
        .unwrap();

    assert_eq!(
        api.continue_errors.lock().unwrap().as_slice(),
        [Some("challenge-crashed".to_string())]
    );
    assert_eq!(delegate.challenge_dismissed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn tokenization_failure_is_terminal_and_reported() {
    let api = MockApi {
        fail_tokenize: true,
        ..MockApi::default()
    };
    let store = checkout_store(3600);
    let delegate = RecordingDelegate::default();

    let error = flow(&api, None, &store, &delegate)
        .pay(card_fields(), CARD_REQUIRED)
        .await
        .unwrap_err();

    assert!(matches!(
        error.current_context(),
        CheckoutError::TokenizationFailed
    ));
    assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
    assert_eq!(delegate.tokenization_failed.load(Ordering::SeqCst), 1);
    assert_eq!(delegate.failed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn expired_credential_fails_before_any_network_call() {
    let api = MockApi::with_action_rounds(1);
    let engine = MockEngine::healthy();
    let store = checkout_store(-60);
    let delegate = RecordingDelegate::default();

    let error = flow(&api, Some(&engine), &store, &delegate)
        .pay(card_fields(), CARD_REQUIRED)
        .await
        .unwrap_err();

    assert!(matches!(
        error.current_context(),
        CheckoutError::InvalidCredential
    ));
    assert_eq!(api.tokenize_calls.load(Ordering::SeqCst), 0);
    assert_eq!(delegate.failed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn validation_reports_all_findings_before_any_network_call() {
    let api = MockApi::default();
    let store = checkout_store(3600);
    let delegate = RecordingDelegate::default();

    let mut fields = card_fields();
    fields.remove(&InputElementType::Cvv);
    fields.insert(
        InputElementType::CardNumber,
        Secret::new("4242424242424241".to_string()),
    );

    let error = flow(&api, None, &store, &delegate)
        .pay(fields, CARD_REQUIRED)
        .await
        .unwrap_err();

    match error.current_context() {
        CheckoutError::Validation(errors) => {
            assert_eq!(errors.missing, vec![InputElementType::Cvv]);
            assert_eq!(errors.invalid.len(), 1);
            assert_eq!(errors.invalid[0].field, InputElementType::CardNumber);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(api.tokenize_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn authentication_rounds_are_bounded() {
    // Server keeps demanding authentication on every resume.
    let api = MockApi::with_action_rounds(100);
    let engine = MockEngine::healthy();
    let store = checkout_store(3600);
    let delegate = RecordingDelegate::default();

    let error = flow(&api, Some(&engine), &store, &delegate)
        .pay(card_fields(), CARD_REQUIRED)
        .await
        .unwrap_err();

    assert!(matches!(
        error.current_context(),
        CheckoutError::ThreeDsFailed
    ));
    assert_eq!(api.continue_calls.load(Ordering::SeqCst), 2);
    assert_eq!(api.resume_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn vault_session_stops_at_the_token() {
    let api = MockApi::default();
    let store = CredentialStore::new(None);
    store.set_raw(&raw_token(3600, "VAULT")).unwrap();
    let delegate = RecordingDelegate::default();

    let outcome = flow(&api, None, &store, &delegate)
        .pay(card_fields(), CARD_REQUIRED)
        .await
        .unwrap();

    assert!(matches!(outcome, CheckoutOutcome::Tokenized(_)));
    assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
    assert_eq!(delegate.tokenization_succeeded.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rotated_credential_is_used_for_the_authentication_round() {
    let rotated = raw_token(7200, "CHECKOUT");
    let api = MockApi {
        rotated_credential: Some(rotated.clone()),
        ..MockApi::with_action_rounds(1)
    };
    let engine = MockEngine::healthy();
    let store = checkout_store(3600);
    let initial = store.current().unwrap().raw_token().to_string();
    let delegate = RecordingDelegate::default();

    flow(&api, Some(&engine), &store, &delegate)
        .pay(card_fields(), CARD_REQUIRED)
        .await
        .unwrap();

    let begin_credentials = api.begin_credentials.lock().unwrap();
    assert_eq!(begin_credentials.as_slice(), [rotated.clone()]);
    assert_ne!(begin_credentials[0], initial);
    assert_eq!(store.current().unwrap().raw_token(), rotated);
}

#[tokio::test]
async fn only_one_authentication_transaction_may_be_in_flight() {
    let api = MockApi {
        begin_code: Some(ThreeDsResponseCode::AuthSuccess),
        ..MockApi::default()
    };
    let engine = MockEngine {
        init_delay: Some(Duration::from_millis(20)),
        ..MockEngine::healthy()
    };
    let store = checkout_store(3600);
    let credential = store.current().unwrap();
    let config = configuration();
    let token = visa_token();

    let service = ThreeDsService::new(&api, Some(&engine));
    let (first, second) = tokio::join!(
        service.authenticate(&credential, Some(&config), &token),
        service.authenticate(&credential, Some(&config), &token),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let busy = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .filter(|e| {
            matches!(
                e.current_context(),
                CheckoutError::AuthenticationInProgress
            )
        })
        .count();
    assert_eq!(busy, 1);
}
