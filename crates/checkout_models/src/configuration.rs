//! Processor configuration fetched at checkout start.
//!
//! Only the slice the authentication flow touches is modelled: the keys
//! block carrying the 3DS engine license and the per-network root
//! certificates. The rest of the configuration surface (payment method
//! display data, checkout modules) belongs to the UI layer.

use masking::Secret;
use serde::Deserialize;

use crate::enums::CardNetwork;

/// Root certificate material for one card network's directory server.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDsCertificate {
    pub card_network: CardNetwork,
    pub root_certificate: String,
    pub encryption_key: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationKeys {
    #[serde(default)]
    pub three_ds_license_key: Option<Secret<String>>,
    #[serde(default)]
    pub three_ds_certificates: Vec<ThreeDsCertificate>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorConfiguration {
    #[serde(default)]
    pub keys: Option<ConfigurationKeys>,
}

impl ProcessorConfiguration {
    pub fn three_ds_license_key(&self) -> Option<&Secret<String>> {
        self.keys.as_ref().and_then(|keys| keys.three_ds_license_key.as_ref())
    }

    pub fn three_ds_certificates(&self) -> &[ThreeDsCertificate] {
        self.keys
            .as_ref()
            .map(|keys| keys.three_ds_certificates.as_slice())
            .unwrap_or_default()
    }
}
