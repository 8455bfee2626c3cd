#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Secret-keeping wrapper types for PCI and PII data.
//!
//! Card numbers, CVVs, cardholder names, IBANs, and session credentials move
//! through the SDK inside [`Secret`] or [`StrongSecret`]. Both mask their
//! contents in `Debug` output; [`StrongSecret`] additionally wipes its memory
//! on drop. The only ways to reach the inner value are the explicit
//! [`PeekInterface::peek`] and [`ExposeInterface::expose`] calls, which keeps
//! accidental logging of secrets a compile-time concern rather than a code
//! review one.

pub use zeroize::Zeroize as ZeroizableSecret;

mod abs;
mod secret;
mod serde_impls;
mod strategy;
mod strong_secret;

pub use abs::{ExposeInterface, ExposeOptionInterface, PeekInterface};
pub use secret::Secret;
pub use strategy::{Strategy, WithType, WithoutType};
pub use strong_secret::StrongSecret;

/// This module should be included with asterisk.
///
/// `use masking::prelude::*;`
pub mod prelude {
    pub use super::{ExposeInterface, ExposeOptionInterface, PeekInterface};
}
