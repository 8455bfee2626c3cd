//! Card primitives: PAN, security code and expiry types that validate on
//! construction and mask themselves in debug output.

mod expiry;
mod validate;

pub use expiry::{CardExpiration, CardExpirationMonth, CardExpirationYear, ExpiryError};
pub use validate::{
    CardNumber, CardNumberStrategy, CardNumberValidationError, CardSecurityCode,
    CardSecurityCodeValidationError,
};
