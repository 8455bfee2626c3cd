//! Tokenization and payment request/response bodies.

use cards::{CardNumber, CardSecurityCode};
use masking::Secret;
use serde::{Deserialize, Serialize};

use crate::enums::{
    PaymentInstrumentType, PaymentStatus, RequiredActionKind, SessionIntent, ThreeDsResponseCode,
};

/// User-entered payment instrument fields, consumed once by tokenization and
/// then dropped. Never persisted, never logged in the clear.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum PaymentInstrumentData {
    #[serde(rename_all = "camelCase")]
    Card {
        number: CardNumber,
        expiration_month: String,
        expiration_year: String,
        cvv: CardSecurityCode,
        #[serde(skip_serializing_if = "Option::is_none")]
        cardholder_name: Option<Secret<String>>,
    },
    #[serde(rename_all = "camelCase")]
    BankAccount {
        iban: Secret<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        account_holder_name: Option<Secret<String>>,
    },
    #[serde(rename_all = "camelCase")]
    PhoneOtp {
        phone_number: Secret<String>,
        otp: Secret<String>,
    },
}

impl PaymentInstrumentData {
    pub fn instrument_type(&self) -> PaymentInstrumentType {
        match self {
            Self::Card { .. } => PaymentInstrumentType::PaymentCard,
            Self::BankAccount { .. } => PaymentInstrumentType::BankAccount,
            Self::PhoneOtp { .. } => PaymentInstrumentType::Unknown,
        }
    }
}

/// Body of `POST {pci_url}/payment-instruments`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizationRequest {
    pub payment_instrument: PaymentInstrumentData,
    /// Present and `VAULT` when the session intent is vaulting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<SessionIntent>,
}

/// BIN-derived metadata the processor binds to a tokenized card.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinData {
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub issuer_country_code: Option<String>,
}

/// Prior 3DS authentication state bound to a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDsAuthenticationData {
    pub response_code: ThreeDsResponseCode,
    #[serde(default)]
    pub reason_code: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInstrumentData {
    #[serde(default)]
    pub bin_data: Option<BinData>,
    #[serde(default)]
    pub last4_digits: Option<String>,
}

/// Result of tokenization: the opaque token plus instrument metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodToken {
    pub token: String,
    pub payment_instrument_type: PaymentInstrumentType,
    #[serde(default)]
    pub payment_instrument_data: Option<TokenInstrumentData>,
    #[serde(default)]
    pub three_d_secure_authentication: Option<ThreeDsAuthenticationData>,
    #[serde(default)]
    pub analytics_id: Option<String>,
}

impl PaymentMethodToken {
    /// The card network string the processor derived from the BIN, if any.
    pub fn bin_network(&self) -> Option<&str> {
        self.payment_instrument_data
            .as_ref()
            .and_then(|data| data.bin_data.as_ref())
            .and_then(|bin| bin.network.as_deref())
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreateRequest {
    pub payment_method_token: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResumeRequest {
    pub resume_token: String,
}

/// Server-declared next step attached to a payment response.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredAction {
    pub name: RequiredActionKind,
    #[serde(default)]
    pub description: Option<String>,
    /// A fresh session credential, when the processor rotates it mid-flow.
    #[serde(default)]
    pub client_token: Option<Secret<String>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
}
