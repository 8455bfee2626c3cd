//! 3-D Secure transport types: the begin/continue auth bodies and the
//! structured continuation-error payload sent when the SDK falls back to
//! server-side authentication.

use serde::{Deserialize, Serialize};

use crate::enums::ThreeDsResponseCode;

/// Device authentication blob produced by the 3DS engine for one
/// transaction.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkAuthData {
    pub sdk_app_id: String,
    pub sdk_transaction_id: String,
    pub sdk_timeout: u32,
    pub sdk_enc_data: String,
    pub sdk_ephem_pub_key: String,
    pub sdk_reference_number: String,
}

/// Body of the begin-3DS-auth call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginAuthRequest {
    pub max_protocol_version: String,
    pub device: SdkAuthData,
}

/// The `authentication` object of the begin-auth response.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerAuthentication {
    pub response_code: ThreeDsResponseCode,
    #[serde(default)]
    pub acs_reference_number: Option<String>,
    #[serde(default)]
    pub acs_signed_content: Option<String>,
    #[serde(default)]
    pub acs_transaction_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub protocol_version: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginAuthResponse {
    pub authentication: ServerAuthentication,
    pub resume_token: String,
}

/// Challenge parameters handed to the 3DS engine: the ACS data negotiated by
/// the begin-auth call.
#[derive(Clone, Debug)]
pub struct ServerAuthData {
    pub acs_reference_number: Option<String>,
    pub acs_signed_content: Option<String>,
    pub acs_transaction_id: Option<String>,
    pub response_code: ThreeDsResponseCode,
    pub transaction_id: Option<String>,
}

impl From<&ServerAuthentication> for ServerAuthData {
    fn from(auth: &ServerAuthentication) -> Self {
        Self {
            acs_reference_number: auth.acs_reference_number.clone(),
            acs_signed_content: auth.acs_signed_content.clone(),
            acs_transaction_id: auth.acs_transaction_id.clone(),
            response_code: auth.response_code,
            transaction_id: auth.transaction_id.clone(),
        }
    }
}

/// Structured description of an engine-side failure, forwarded to the server
/// so it can finish authentication without the device SDK.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineErrorInfo {
    pub error_id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub three_ds_error_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub three_ds_error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub three_ds_error_component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub three_ds_sdk_transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub three_ds_error_detail: Option<String>,
}

impl EngineErrorInfo {
    /// Minimal info for failures that never reached the engine proper.
    pub fn new(error_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            error_id: error_id.into(),
            description: description.into(),
            recovery_suggestion: None,
            three_ds_error_code: None,
            three_ds_error_type: None,
            three_ds_error_component: None,
            three_ds_sdk_transaction_id: None,
            protocol_version: None,
            three_ds_error_detail: None,
        }
    }
}

/// Body of the continue-3DS-auth call. Sent on every path; `error` is only
/// populated when the device-side flow could not complete.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_protocol_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EngineErrorInfo>,
}

impl ContinueInfo {
    pub fn clean(init_protocol_version: Option<String>) -> Self {
        Self {
            init_protocol_version,
            error: None,
        }
    }

    pub fn with_error(init_protocol_version: Option<String>, error: EngineErrorInfo) -> Self {
        Self {
            init_protocol_version,
            error: Some(error),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthResponse {
    pub resume_token: String,
    #[serde(default)]
    pub authentication: Option<ServerAuthentication>,
}
