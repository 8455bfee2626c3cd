//! Processor API client: the trait seam the services call through, plus the
//! reqwest-backed implementation.
//!
//! One method per endpoint the authentication flow touches. Request/response
//! marshalling and auth-header injection live here; the services above only
//! see typed bodies and [`ApiClientError`].

use std::time::Duration;

use checkout_models::{
    BeginAuthRequest, BeginAuthResponse, ContinueInfo, PaymentCreateRequest, PaymentMethodToken,
    PaymentResponse, PaymentResumeRequest, PostAuthResponse, SessionCredential,
    TokenizationRequest,
};
use error_stack::ResultExt;
use serde::{de::DeserializeOwned, Serialize};
use tracing::instrument;

use crate::{
    consts,
    errors::{ApiClientError, CustomResult},
};

/// The processor endpoints the authentication flow calls.
#[async_trait::async_trait]
pub trait ProcessorApi: Send + Sync {
    async fn tokenize(
        &self,
        credential: &SessionCredential,
        request: &TokenizationRequest,
    ) -> CustomResult<PaymentMethodToken, ApiClientError>;

    async fn begin_three_ds_auth(
        &self,
        credential: &SessionCredential,
        token_id: &str,
        request: &BeginAuthRequest,
    ) -> CustomResult<BeginAuthResponse, ApiClientError>;

    async fn continue_three_ds_auth(
        &self,
        credential: &SessionCredential,
        token_id: &str,
        continue_info: &ContinueInfo,
    ) -> CustomResult<PostAuthResponse, ApiClientError>;

    async fn create_payment(
        &self,
        credential: &SessionCredential,
        request: &PaymentCreateRequest,
    ) -> CustomResult<PaymentResponse, ApiClientError>;

    async fn resume_payment(
        &self,
        credential: &SessionCredential,
        payment_id: &str,
        request: &PaymentResumeRequest,
    ) -> CustomResult<PaymentResponse, ApiClientError>;
}

/// Default client talking to the processor over HTTPS.
pub struct ProcessorClient {
    client: reqwest::Client,
}

impl ProcessorClient {
    pub fn new() -> CustomResult<Self, ApiClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(consts::REQUEST_TIMEOUT_SECS))
            .build()
            .change_context(ApiClientError::ClientConstructionFailed)?;
        Ok(Self { client })
    }

    fn join_url(base: Option<&str>, path: &str) -> CustomResult<url::Url, ApiClientError> {
        let base = base.ok_or(ApiClientError::UrlParsingFailed)?;
        let mut base_url =
            url::Url::parse(base).change_context(ApiClientError::UrlParsingFailed)?;
        // Url::join would drop a non-slash-terminated final segment.
        {
            let mut segments = base_url
                .path_segments_mut()
                .map_err(|_| ApiClientError::UrlParsingFailed)?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
        }
        Ok(base_url)
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn post_json<B, R>(
        &self,
        credential: &SessionCredential,
        url: url::Url,
        body: &B,
    ) -> CustomResult<R, ApiClientError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header(consts::CLIENT_TOKEN_HEADER, credential.raw_token())
            .json(body)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    error_stack::Report::new(ApiClientError::RequestTimeout)
                } else {
                    error_stack::Report::new(ApiClientError::RequestNotSent(error.to_string()))
                }
            })
            .attach_printable("unable to send request to the processor")?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(error_stack::Report::new(ApiClientError::Unauthorized));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error_body = serde_json::from_str(&body).ok();
            tracing::warn!(status = status.as_u16(), "processor returned an error response");
            return Err(error_stack::Report::new(ApiClientError::ServerError {
                status: status.as_u16(),
                response: error_body,
            }));
        }

        response
            .json::<R>()
            .await
            .change_context(ApiClientError::ResponseDecodingFailed)
    }
}

#[async_trait::async_trait]
impl ProcessorApi for ProcessorClient {
    async fn tokenize(
        &self,
        credential: &SessionCredential,
        request: &TokenizationRequest,
    ) -> CustomResult<PaymentMethodToken, ApiClientError> {
        let url = Self::join_url(credential.pci_url.as_deref(), "payment-instruments")?;
        self.post_json(credential, url, request).await
    }

    async fn begin_three_ds_auth(
        &self,
        credential: &SessionCredential,
        token_id: &str,
        request: &BeginAuthRequest,
    ) -> CustomResult<BeginAuthResponse, ApiClientError> {
        let url = Self::join_url(
            credential.core_url.as_deref(),
            &format!("3ds/{token_id}/auth"),
        )?;
        self.post_json(credential, url, request).await
    }

    async fn continue_three_ds_auth(
        &self,
        credential: &SessionCredential,
        token_id: &str,
        continue_info: &ContinueInfo,
    ) -> CustomResult<PostAuthResponse, ApiClientError> {
        let url = Self::join_url(
            credential.core_url.as_deref(),
            &format!("3ds/{token_id}/continue"),
        )?;
        self.post_json(credential, url, continue_info).await
    }

    async fn create_payment(
        &self,
        credential: &SessionCredential,
        request: &PaymentCreateRequest,
    ) -> CustomResult<PaymentResponse, ApiClientError> {
        let url = Self::join_url(credential.core_url.as_deref(), "payments")?;
        self.post_json(credential, url, request).await
    }

    async fn resume_payment(
        &self,
        credential: &SessionCredential,
        payment_id: &str,
        request: &PaymentResumeRequest,
    ) -> CustomResult<PaymentResponse, ApiClientError> {
        let url = Self::join_url(
            credential.core_url.as_deref(),
            &format!("payments/{payment_id}/resume"),
        )?;
        self.post_json(credential, url, request).await
    }
}
