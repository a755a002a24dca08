//! Fixed-precision money.
//!
//! Amounts are stored as `numeric(12,2)`: ten integer digits and two
//! decimal places. Values are rounded half away from zero, like Postgres does
//! on assignment.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};

use crate::error::ValidationError;

/// Decimal places kept for every amount.
pub const SCALE: u32 = 2;

/// Largest integer part a `numeric(12,2)` column accepts is 10 digits.
const INTEGER_DIGITS: u32 = 10;

/// Round to two places and fix the scale, so `1500` renders as `1500.00`.
pub fn normalize(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(SCALE);
    rounded
}

/// Read a stored amount at the column's scale.
///
/// `to_jsonb` hands numerics over as JSON numbers, which lose trailing zeros.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    <Decimal as Deserialize>::deserialize(deserializer).map(normalize)
}

/// [`deserialize`] for nullable columns.
pub fn deserialize_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Decimal>, D::Error> {
    Option::<Decimal>::deserialize(deserializer).map(|v| v.map(normalize))
}

/// Reject amounts that would overflow the column after rounding.
pub fn check(field: &str, value: &Decimal) -> Result<(), ValidationError> {
    let limit = Decimal::from(10_i64.pow(INTEGER_DIGITS));
    if normalize(*value).abs() >= limit {
        return Err(ValidationError::invalid(
            field,
            format!("must have at most {INTEGER_DIGITS} integer digits"),
        ));
    }
    Ok(())
}

/// Dashboard headline figure: thousands of reais without decimals, e.g. `R$ 1250k`.
pub fn format_thousands(value: Decimal) -> String {
    let thousands = (value / Decimal::ONE_THOUSAND)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    format!("R$ {thousands}k")
}

/// Full Brazilian currency notation, e.g. `R$ 1.250.000,00`.
pub fn format_brl(value: Decimal) -> String {
    let amount = normalize(value);
    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    let digits = amount.abs().to_string();
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{sign}R$ {grouped},{frac_part}")
}

/// Period-over-period growth with an explicit sign, e.g. `+18.7%`.
pub fn format_growth(percent: f64) -> String {
    format!("{percent:+.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn thousands_headline() {
        assert_eq!(format_thousands(dec("1250000")), "R$ 1250k");
        assert_eq!(format_thousands(dec("1250000.00")), "R$ 1250k");
        assert_eq!(format_thousands(dec("1500")), "R$ 2k");
        assert_eq!(format_thousands(dec("499.99")), "R$ 0k");
        assert_eq!(format_thousands(Decimal::ZERO), "R$ 0k");
    }

    #[test]
    fn brl_grouping() {
        assert_eq!(format_brl(dec("1250000")), "R$ 1.250.000,00");
        assert_eq!(format_brl(dec("999.5")), "R$ 999,50");
        assert_eq!(format_brl(dec("-1234.567")), "-R$ 1.234,57");
        assert_eq!(format_brl(Decimal::ZERO), "R$ 0,00");
    }

    #[test]
    fn growth_keeps_sign() {
        assert_eq!(format_growth(18.7), "+18.7%");
        assert_eq!(format_growth(-3.24), "-3.2%");
        assert_eq!(format_growth(0.0), "+0.0%");
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(normalize(dec("0.005")).to_string(), "0.01");
        assert_eq!(normalize(dec("-0.005")).to_string(), "-0.01");
        assert_eq!(normalize(dec("42")).to_string(), "42.00");
    }

    #[test]
    fn stored_amounts_keep_two_places() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(deserialize_with = "deserialize")]
            amount: Decimal,
            #[serde(deserialize_with = "deserialize_opt")]
            value: Option<Decimal>,
        }

        let row: Row = serde_json::from_str(r#"{"amount": 1500.00, "value": 350.4}"#).unwrap();
        assert_eq!(row.amount.to_string(), "1500.00");
        assert_eq!(row.value.map(|v| v.to_string()).as_deref(), Some("350.40"));

        let row: Row = serde_json::from_str(r#"{"amount": "9999999999.99", "value": null}"#).unwrap();
        assert_eq!(row.amount.to_string(), "9999999999.99");
        assert_eq!(row.value, None);
    }

    #[test]
    fn precision_limit() {
        assert!(check("value", &dec("9999999999.99")).is_ok());
        assert!(check("value", &dec("9999999999.995")).is_err());
        assert!(check("value", &dec("-10000000000")).is_err());
    }
}
