use masking::{PeekInterface, StrongSecret};
use thiserror::Error;
use time::{util::days_in_year_month, Date, OffsetDateTime, PrimitiveDateTime, Time};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpiryError {
    #[error("invalid card expiration month")]
    InvalidMonth,
    #[error("invalid card expiration year")]
    InvalidYear,
}

#[derive(Debug)]
pub struct CardExpirationMonth(StrongSecret<u8>);

impl CardExpirationMonth {
    pub fn new(month: u8) -> Result<Self, ExpiryError> {
        if (1..=12).contains(&month) {
            Ok(Self(StrongSecret::new(month)))
        } else {
            Err(ExpiryError::InvalidMonth)
        }
    }

    /// Zero-padded month, the form the processor expects.
    pub fn two_digits(&self) -> String {
        format!("{:02}", self.0.peek())
    }

    pub fn peek(&self) -> u8 {
        *self.0.peek()
    }
}

#[derive(Debug)]
pub struct CardExpirationYear(StrongSecret<u16>);

impl CardExpirationYear {
    pub fn new(year: u16) -> Result<Self, ExpiryError> {
        // Four-digit years only; the earliest card networks date to the 1990s.
        if year >= 1997 {
            Ok(Self(StrongSecret::new(year)))
        } else {
            Err(ExpiryError::InvalidYear)
        }
    }

    pub fn four_digits(&self) -> String {
        self.0.peek().to_string()
    }

    pub fn peek(&self) -> u16 {
        *self.0.peek()
    }
}

pub struct CardExpiration {
    pub month: CardExpirationMonth,
    pub year: CardExpirationYear,
}

impl CardExpiration {
    pub fn new(month: u8, year: u16) -> Result<Self, ExpiryError> {
        Ok(Self {
            month: CardExpirationMonth::new(month)?,
            year: CardExpirationYear::new(year)?,
        })
    }

    /// A card expires at the end of the last day of its expiration month.
    pub fn is_expired(&self) -> bool {
        let now_utc = OffsetDateTime::now_utc();

        let year = i32::from(self.year.peek());
        let Ok(month) = time::Month::try_from(self.month.peek()) else {
            return true;
        };
        let expiration_day = days_in_year_month(year, month);
        let Ok(expiration_date) = Date::from_calendar_date(year, month, expiration_day) else {
            return true;
        };

        // Max difference between UTC and any local timezone is 14 hours;
        // lean towards accepting a card that is valid somewhere.
        let expiration_datetime_utc =
            PrimitiveDateTime::new(expiration_date, Time::MIDNIGHT).assume_utc()
                + time::Duration::hours(14)
                + time::Duration::days(1);

        now_utc > expiration_datetime_utc
    }
}
