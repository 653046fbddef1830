//! Money types with precise decimal arithmetic
//!
//! Premiums and contract amounts are carried as `rust_decimal` values together
//! with their ISO 4217 currency. The brokerage back office prices in euro, so a
//! bare decimal converts into a EUR amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    EUR,
    CHF,
    GBP,
    USD,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
            Currency::CHF => "CHF",
            Currency::GBP => "GBP",
            Currency::USD => "USD",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::EUR
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::EUR),
            "CHF" => Ok(Currency::CHF),
            "GBP" => Ok(Currency::GBP),
            "USD" => Ok(Currency::USD),
            other => Err(UnknownCurrency(other.to_string())),
        }
    }
}

/// A currency code outside the supported set
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown currency: {0}")]
pub struct UnknownCurrency(pub String);

/// A monetary amount with associated currency
///
/// Amounts are stored with 4 decimal places internally and rounded to the
/// currency's minor unit when they leave the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Creates a euro amount
    pub fn eur(amount: Decimal) -> Self {
        Self::new(amount, Currency::EUR)
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Rounds to the currency's standard decimal places
    pub fn round_to_currency(&self) -> Self {
        Self {
            amount: self.amount.round_dp(self.currency.decimal_places()),
            currency: self.currency,
        }
    }
}

/// A bare amount is a euro amount
impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money::eur(amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{:.dp$} {}",
            self.amount,
            self.currency.code(),
            dp = dp as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bare_decimal_is_euro() {
        let m: Money = dec!(42.5).into();
        assert_eq!(m.currency(), Currency::EUR);
        assert_eq!(m.amount(), dec!(42.5));
    }

    #[test]
    fn test_round_to_currency() {
        let m = Money::eur(dec!(19.999));
        assert_eq!(m.round_to_currency().amount(), dec!(20.00));
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::EUR);
        assert_eq!(
            "XYZ".parse::<Currency>(),
            Err(UnknownCurrency("XYZ".to_string()))
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    proptest! {
        #[test]
        fn rounding_never_moves_more_than_half_a_cent(minor in -1_000_000_000i64..1_000_000_000i64, extra in 0i64..100i64) {
            let amount = Decimal::new(minor * 100 + extra, 4);
            let money = Money::eur(amount);
            let diff = (money.round_to_currency().amount() - money.amount()).abs();
            prop_assert!(diff <= dec!(0.005));
        }
    }
}
