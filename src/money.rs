//! Currency normalisation into the ledger unit.
//!
//! Every computation downstream of this module works in whole-ish ledger
//! units (NTD). Foreign amounts are converted with a supplied rate and
//! rounded half away from zero; ledger amounts pass through untouched.

use crate::error::SettleError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two currencies an expense may be recorded in.
///
/// `Ntd` is the ledger currency; a rate always means
/// "1 JPY = rate NTD".
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use trip_settle::Currency;
///
/// assert_eq!(Currency::from_str(" twd ").unwrap(), Currency::Ntd);
/// assert!(Currency::from_str("USD").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    Jpy,
    Ntd,
}

/// Currency every balance and transfer is expressed in.
pub const LEDGER_CURRENCY: Currency = Currency::Ntd;

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Jpy => "JPY",
            Currency::Ntd => "NTD",
        }
    }

    pub fn is_ledger(&self) -> bool {
        *self == LEDGER_CURRENCY
    }
}

impl FromStr for Currency {
    type Err = SettleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JPY" => Ok(Currency::Jpy),
            "NTD" | "TWD" => Ok(Currency::Ntd),
            _ => Err(SettleError::InvalidCurrency(s.trim().to_string())),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = SettleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::from_str(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Rounds to a whole ledger unit, halves away from zero (2.5 -> 3, -2.5 -> -3).
pub fn round_ledger(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts `amount` into ledger units.
///
/// Ledger-currency amounts are returned unchanged, without rounding.
/// Foreign amounts become `round(amount * rate)`. The caller supplies a
/// positive rate. Returns `None` if the product overflows.
pub fn to_ledger_amount(amount: Decimal, currency: Currency, rate: Decimal) -> Option<Decimal> {
    debug_assert!(rate > Decimal::ZERO, "exchange rate must be positive");
    if currency.is_ledger() {
        return Some(amount);
    }
    amount.checked_mul(rate).map(round_ledger)
}

/// Converts ledger units back into the foreign currency, for display.
pub fn from_ledger_amount(amount: Decimal, rate: Decimal) -> Option<Decimal> {
    debug_assert!(rate > Decimal::ZERO, "exchange rate must be positive");
    amount.checked_div(rate).map(round_ledger)
}

/// An amount shown in both currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyPreview {
    pub ledger: Decimal,
    pub foreign: Decimal,
}

/// Previews `amount` in both currencies, as a standalone calculator would.
pub fn preview(amount: Decimal, currency: Currency, rate: Decimal) -> Option<CurrencyPreview> {
    let preview = match currency {
        Currency::Ntd => CurrencyPreview {
            ledger: amount,
            foreign: from_ledger_amount(amount, rate)?,
        },
        Currency::Jpy => CurrencyPreview {
            ledger: to_ledger_amount(amount, currency, rate)?,
            foreign: amount,
        },
    };
    Some(preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_codes() {
        assert_eq!(Currency::from_str("JPY").unwrap(), Currency::Jpy);
        assert_eq!(Currency::from_str("jpy").unwrap(), Currency::Jpy);
        assert_eq!(Currency::from_str("NTD").unwrap(), Currency::Ntd);
        assert_eq!(Currency::from_str("TWD").unwrap(), Currency::Ntd);
    }

    #[test]
    fn test_parse_rejects_unknown_code() {
        match Currency::from_str("EUR") {
            Err(SettleError::InvalidCurrency(code)) => assert_eq!(code, "EUR"),
            other => panic!("Expected InvalidCurrency, got {:?}", other),
        }
    }

    #[test]
    fn test_ledger_amount_passes_through_unrounded() {
        assert_eq!(
            to_ledger_amount(dec!(123.45), Currency::Ntd, dec!(0.2)),
            Some(dec!(123.45))
        );
    }

    #[test]
    fn test_foreign_amount_is_converted_and_rounded() {
        assert_eq!(to_ledger_amount(dec!(1000), Currency::Jpy, dec!(0.2)), Some(dec!(200)));
        assert_eq!(to_ledger_amount(dec!(1234), Currency::Jpy, dec!(0.2)), Some(dec!(247)));
        // 5 * 0.5 = 2.5 rounds away from zero
        assert_eq!(to_ledger_amount(dec!(5), Currency::Jpy, dec!(0.5)), Some(dec!(3)));
        assert_eq!(to_ledger_amount(dec!(7), Currency::Jpy, dec!(0.5)), Some(dec!(4)));
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let first = to_ledger_amount(dec!(999), Currency::Jpy, dec!(0.2163));
        let second = to_ledger_amount(dec!(999), Currency::Jpy, dec!(0.2163));
        assert_eq!(first, second);
        assert_eq!(first, Some(dec!(216)));
    }

    #[test]
    fn test_round_ledger_midpoints() {
        assert_eq!(round_ledger(dec!(2.5)), dec!(3));
        assert_eq!(round_ledger(dec!(-2.5)), dec!(-3));
        assert_eq!(round_ledger(dec!(2.49)), dec!(2));
    }

    #[test]
    fn test_preview_both_directions() {
        let from_ntd = preview(dec!(300), Currency::Ntd, dec!(0.2)).unwrap();
        assert_eq!(from_ntd.ledger, dec!(300));
        assert_eq!(from_ntd.foreign, dec!(1500));

        let from_jpy = preview(dec!(1500), Currency::Jpy, dec!(0.2)).unwrap();
        assert_eq!(from_jpy.ledger, dec!(300));
        assert_eq!(from_jpy.foreign, dec!(1500));
    }

    #[test]
    fn test_overflowing_conversion_is_none() {
        assert_eq!(to_ledger_amount(Decimal::MAX, Currency::Jpy, dec!(2)), None);
        assert_eq!(from_ledger_amount(Decimal::MAX, dec!(0.5)), None);
        assert!(preview(Decimal::MAX, Currency::Ntd, dec!(0.2)).is_none());
    }
}
