use std::{fmt, ops::Deref, str::FromStr};

use masking::{PeekInterface, Strategy, StrongSecret, WithType};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Deserialize, Serialize, Error)]
#[error("not a valid card number")]
pub struct CardNumberValidationError;

impl From<core::convert::Infallible> for CardNumberValidationError {
    fn from(_: core::convert::Infallible) -> Self {
        Self
    }
}

/// Card number, Luhn-checked on construction.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CardNumber(StrongSecret<String, CardNumberStrategy>);

impl CardNumber {
    /// First six digits, the BIN used for network detection and
    /// directory-server routing.
    pub fn bin(&self) -> String {
        self.0.peek().chars().take(6).collect()
    }

    /// First eight digits, the extended BIN.
    pub fn extended_bin(&self) -> String {
        self.0.peek().chars().take(8).collect()
    }

    /// Last four digits, safe to show to the user.
    pub fn last4(&self) -> String {
        let digits: Vec<char> = self.0.peek().chars().collect();
        digits[digits.len().saturating_sub(4)..].iter().collect()
    }

    /// Number of digits in the PAN.
    pub fn len(&self) -> usize {
        self.0.peek().len()
    }

    /// Whether the PAN is empty. Cannot happen for a constructed value;
    /// present to satisfy the `len`/`is_empty` convention.
    pub fn is_empty(&self) -> bool {
        self.0.peek().is_empty()
    }
}

impl FromStr for CardNumber {
    type Err = CardNumberValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pan_no_whitespace: String = s.split_whitespace().collect();
        match luhn::valid(&pan_no_whitespace) {
            true => Ok(Self(StrongSecret::from_str(&pan_no_whitespace)?)),
            false => Err(CardNumberValidationError),
        }
    }
}

impl TryFrom<String> for CardNumber {
    type Error = CardNumberValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl Deref for CardNumber {
    type Target = StrongSecret<String, CardNumberStrategy>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CardNumber {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Deserialize, Serialize, Error)]
#[error("not a valid card security code")]
pub struct CardSecurityCodeValidationError;

/// Card security code (CVV/CVC), three or four digits. Kept as digits
/// rather than a number because leading zeros are significant.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CardSecurityCode(StrongSecret<String>);

impl CardSecurityCode {
    /// Number of digits.
    pub fn len(&self) -> usize {
        self.0.peek().len()
    }

    /// Whether the code is empty. Cannot happen for a constructed value;
    /// present to satisfy the `len`/`is_empty` convention.
    pub fn is_empty(&self) -> bool {
        self.0.peek().is_empty()
    }
}

impl FromStr for CardSecurityCode {
    type Err = CardSecurityCodeValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if (3..=4).contains(&code.len()) && code.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(StrongSecret::new(code.to_string())))
        } else {
            Err(CardSecurityCodeValidationError)
        }
    }
}

impl TryFrom<String> for CardSecurityCode {
    type Error = CardSecurityCodeValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl Deref for CardSecurityCode {
    type Target = StrongSecret<String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CardSecurityCode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Masking strategy keeping the first six digits visible.
pub enum CardNumberStrategy {}

impl<T> Strategy<T> for CardNumberStrategy
where
    T: AsRef<str>,
{
    fn fmt(val: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let val_str: &str = val.as_ref();

        if val_str.len() < 15 || val_str.len() > 19 {
            return WithType::fmt(val, f);
        }

        match val_str.get(..6) {
            Some(bin) => write!(f, "{}{}", bin, "*".repeat(val_str.len() - 6)),
            None => WithType::fmt(val, f),
        }
    }
}
