//! Enumerations shared across the SDK and its wire format.

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Environment {
    Production,
    Staging,
    #[default]
    Sandbox,
}

/// What the session credential was minted for.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionIntent {
    Checkout,
    Vault,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentInstrumentType {
    PaymentCard,
    BankAccount,
    Wallet,
    #[serde(other)]
    Unknown,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CardNetwork {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Diners,
    Jcb,
    UnionPay,
    Maestro,
    CartesBancaires,
    #[serde(other)]
    Unknown,
}

impl CardNetwork {
    /// Map a BIN onto a network. Prefix tables per the card scheme specs;
    /// ranges that overlap are checked most-specific first.
    pub fn from_bin(bin: &str) -> Self {
        let digits: String = bin.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Self::Unknown;
        }

        let starts = |prefixes: &[&str]| prefixes.iter().any(|p| digits.starts_with(p));
        let in_range = |len: usize, lo: u32, hi: u32| {
            digits
                .get(..len)
                .and_then(|s| s.parse::<u32>().ok())
                .is_some_and(|n| (lo..=hi).contains(&n))
        };

        if starts(&["34", "37"]) {
            Self::Amex
        } else if in_range(3, 300, 305) || starts(&["36", "38", "39"]) {
            Self::Diners
        } else if starts(&["6011", "65"]) || in_range(6, 622126, 622925) {
            Self::Discover
        } else if in_range(4, 3528, 3589) {
            Self::Jcb
        } else if starts(&["62", "81"]) {
            Self::UnionPay
        } else if in_range(4, 2221, 2720) || in_range(2, 51, 55) {
            Self::Mastercard
        } else if starts(&["50", "56", "57", "58", "63", "67"]) {
            Self::Maestro
        } else if starts(&["4"]) {
            Self::Visa
        } else {
            Self::Unknown
        }
    }

    /// Parse the network string the processor attaches to BIN data.
    /// Unrecognised values map to [`Self::Unknown`] rather than failing.
    pub fn from_network_str(value: &str) -> Self {
        value.parse().unwrap_or(Self::Unknown)
    }

    /// EMVCo directory server RID routing a 3DS transaction to this scheme.
    /// Networks without their own directory server ride on their parent
    /// scheme's; `None` means the transaction cannot be routed.
    pub fn directory_server_id(&self) -> Option<&'static str> {
        match self {
            Self::Visa => Some("A000000003"),
            Self::Mastercard | Self::Maestro => Some("A000000004"),
            Self::Amex => Some("A000000025"),
            Self::Discover | Self::Diners => Some("A000000152"),
            Self::Jcb => Some("A000000065"),
            Self::UnionPay => Some("A000000333"),
            Self::CartesBancaires => Some("A000000042"),
            Self::Unknown => None,
        }
    }

    /// Length of the card security code for this network.
    pub fn security_code_length(&self) -> usize {
        match self {
            Self::Amex => 4,
            _ => 3,
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreeDsResponseCode {
    NotPerformed,
    Skipped,
    AuthSuccess,
    AuthFailed,
    Challenge,
    /// Web-only; never produced for app-based flows but the server may
    /// still return it, so it is handled like the other no-challenge codes.
    #[serde(rename = "METHOD")]
    #[strum(serialize = "METHOD")]
    Method,
}

impl ThreeDsResponseCode {
    /// Whether this code requires presenting an interactive challenge.
    pub fn requires_challenge(&self) -> bool {
        matches!(self, Self::Challenge)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequiredActionKind {
    #[serde(rename = "3DS_AUTHENTICATION")]
    #[strum(serialize = "3DS_AUTHENTICATION")]
    ThreeDsAuthentication,
    #[serde(other)]
    Unknown,
}

impl RequiredActionKind {
    /// Required actions that loop the flow back into the 3DS orchestrator.
    pub fn is_three_ds(&self) -> bool {
        matches!(self, Self::ThreeDsAuthentication)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Settled,
    Authorized,
    Declined,
    Failed,
    Cancelled,
    /// Status values the processor adds later decode here instead of
    /// failing the whole payment response.
    #[serde(other)]
    Unknown,
}
