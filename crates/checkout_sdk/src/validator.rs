//! Input validation: runs before any network call, aggregates every finding.

use std::{collections::BTreeMap, str::FromStr};

use cards::{CardExpiration, CardNumber, CardSecurityCode};
use checkout_models::{CardNetwork, PaymentInstrumentData};
use masking::{PeekInterface, Secret};

use crate::errors::{
    report, CheckoutError, CustomResult, FieldViolation, ValidationErrors,
};

/// Form field types the input layer can collect.
#[derive(
    Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum InputElementType {
    CardNumber,
    ExpiryMonth,
    ExpiryYear,
    Cvv,
    CardholderName,
    Iban,
    Otp,
    PhoneNumber,
}

/// Canonical check order. Findings are reported in this order no matter how
/// the caller ordered the required list, which keeps validation output
/// deterministic.
const CANONICAL_ORDER: [InputElementType; 8] = [
    InputElementType::CardNumber,
    InputElementType::ExpiryMonth,
    InputElementType::ExpiryYear,
    InputElementType::Cvv,
    InputElementType::CardholderName,
    InputElementType::Iban,
    InputElementType::Otp,
    InputElementType::PhoneNumber,
];

/// Raw user-entered values keyed by field type.
pub type InputFields = BTreeMap<InputElementType, Secret<String>>;

/// Pure, synchronous form validation. Checks presence of every required
/// field and the format of every present field, and reports all findings in
/// one pass.
pub fn validate(
    fields: &InputFields,
    required: &[InputElementType],
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    for element in CANONICAL_ORDER {
        let value = fields.get(&element);
        if required.contains(&element) && value.is_none() {
            errors.missing.push(element);
        }
        if let Some(value) = value {
            if let Some(message) = check_field(element, value.peek(), fields) {
                errors.invalid.push(FieldViolation {
                    field: element,
                    message,
                });
            }
        }
    }

    // Cross-field check: a well-formed month and year may still be in the past.
    if !errors.invalid.iter().any(|violation| {
        matches!(
            violation.field,
            InputElementType::ExpiryMonth | InputElementType::ExpiryYear
        )
    }) {
        if let Some(expired) = expiry_in_past(fields) {
            if expired {
                errors.invalid.push(FieldViolation {
                    field: InputElementType::ExpiryYear,
                    message: "card has expired",
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_field(
    element: InputElementType,
    value: &str,
    fields: &InputFields,
) -> Option<&'static str> {
    let value = value.trim();
    match element {
        InputElementType::CardNumber => {
            CardNumber::from_str(value)
                .is_err()
                .then_some("card number failed the Luhn check")
        }
        InputElementType::ExpiryMonth => {
            let valid = value
                .parse::<u8>()
                .is_ok_and(|month| (1..=12).contains(&month));
            (!valid).then_some("expiry month must be between 01 and 12")
        }
        InputElementType::ExpiryYear => {
            let valid = value.len() == 4 && value.parse::<u16>().is_ok_and(|year| year >= 1997);
            (!valid).then_some("expiry year must be four digits")
        }
        InputElementType::Cvv => {
            let expected_len = fields
                .get(&InputElementType::CardNumber)
                .and_then(|number| CardNumber::from_str(number.peek()).ok())
                .map(|number| CardNetwork::from_bin(&number.bin()).security_code_length());
            let valid = CardSecurityCode::from_str(value).is_ok_and(|code| match expected_len {
                Some(len) => code.len() == len,
                None => true,
            });
            (!valid).then_some("security code length does not match the card network")
        }
        InputElementType::CardholderName => value.is_empty().then_some("cardholder name is empty"),
        InputElementType::Iban => {
            let valid = value.len() >= 15
                && value.len() <= 34
                && value.chars().take(2).all(|c| c.is_ascii_alphabetic())
                && value.chars().skip(2).take(2).all(|c| c.is_ascii_digit())
                && value.chars().all(|c| c.is_ascii_alphanumeric());
            (!valid).then_some("IBAN is not well-formed")
        }
        InputElementType::Otp => {
            let valid =
                (4..=8).contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit());
            (!valid).then_some("one-time code must be 4 to 8 digits")
        }
        InputElementType::PhoneNumber => {
            let digits = value.strip_prefix('+').unwrap_or(value);
            let valid =
                (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
            (!valid).then_some("phone number is not well-formed")
        }
    }
}

fn expiry_in_past(fields: &InputFields) -> Option<bool> {
    let month = fields
        .get(&InputElementType::ExpiryMonth)?
        .peek()
        .trim()
        .parse::<u8>()
        .ok()?;
    let year = fields
        .get(&InputElementType::ExpiryYear)?
        .peek()
        .trim()
        .parse::<u16>()
        .ok()?;
    Some(CardExpiration::new(month, year).ok()?.is_expired())
}

/// Build the tokenization payload from validated fields. Picks the
/// instrument family by which fields are present: card beats bank account
/// beats phone/OTP.
pub fn build_instrument(fields: &InputFields) -> CustomResult<PaymentInstrumentData, CheckoutError> {
    let get = |element: InputElementType| {
        fields
            .get(&element)
            .map(|value| value.peek().trim().to_string())
    };

    if let Some(number) = get(InputElementType::CardNumber) {
        let (Some(month), Some(year), Some(cvv)) = (
            get(InputElementType::ExpiryMonth),
            get(InputElementType::ExpiryYear),
            get(InputElementType::Cvv),
        ) else {
            return Err(report(CheckoutError::Validation(ValidationErrors {
                missing: [
                    InputElementType::ExpiryMonth,
                    InputElementType::ExpiryYear,
                    InputElementType::Cvv,
                ]
                .into_iter()
                .filter(|element| !fields.contains_key(element))
                .collect(),
                invalid: Vec::new(),
            })));
        };
        let number = CardNumber::from_str(&number).map_err(|_| {
            report(CheckoutError::Validation(ValidationErrors {
                missing: Vec::new(),
                invalid: vec![FieldViolation {
                    field: InputElementType::CardNumber,
                    message: "card number failed the Luhn check",
                }],
            }))
        })?;
        let cvv = CardSecurityCode::from_str(&cvv).map_err(|_| {
            report(CheckoutError::Validation(ValidationErrors {
                missing: Vec::new(),
                invalid: vec![FieldViolation {
                    field: InputElementType::Cvv,
                    message: "security code length does not match the card network",
                }],
            }))
        })?;
        return Ok(PaymentInstrumentData::Card {
            number,
            expiration_month: format!("{:02}", month.parse::<u8>().unwrap_or_default()),
            expiration_year: year,
            cvv,
            cardholder_name: get(InputElementType::CardholderName).map(Secret::new),
        });
    }

    if let Some(iban) = get(InputElementType::Iban) {
        return Ok(PaymentInstrumentData::BankAccount {
            iban: Secret::new(iban),
            account_holder_name: get(InputElementType::CardholderName).map(Secret::new),
        });
    }

    if let (Some(phone_number), Some(otp)) = (
        get(InputElementType::PhoneNumber),
        get(InputElementType::Otp),
    ) {
        return Ok(PaymentInstrumentData::PhoneOtp {
            phone_number: Secret::new(phone_number),
            otp: Secret::new(otp),
        });
    }

    Err(report(CheckoutError::Validation(ValidationErrors {
        missing: vec![InputElementType::CardNumber],
        invalid: Vec::new(),
    })))
}
