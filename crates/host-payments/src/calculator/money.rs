//! Fixed-point helpers for amounts in the native currency.
//!
//! The currency supports at most 8 decimal places; every amount leaving the
//! calculator is rounded and rendered to exactly that precision.

use rust_decimal::{Decimal, RoundingStrategy};

/// Maximum precision supported by the native currency
pub const DECIMAL_PLACES: u32 = 8;

/// Round to the currency's precision, midpoint away from zero
pub fn round(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Render with exactly 8 decimal places, e.g. `1.95000000`
pub fn to_fixed(amount: Decimal) -> String {
    format!("{:.prec$}", round(amount), prec = DECIMAL_PLACES as usize)
}

/// Amounts of the integer sub-unit (10^-8) expressed in whole currency units
pub fn from_base_units(units: i64) -> Decimal {
    Decimal::new(units, DECIMAL_PLACES)
}

/// Serde adapter writing a `Decimal` as a fixed 8-place string
pub mod fixed {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_fixed(*amount))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        <Decimal as Deserialize>::deserialize(deserializer)
    }
}

/// Serde adapter for optional fixed 8-place amounts
pub mod fixed_opt {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(amount: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match amount {
            Some(amount) => serializer.serialize_some(&super::to_fixed(*amount)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        <Option<Decimal> as Deserialize>::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_to_fixed_pads() {
        assert_eq!(to_fixed(dec!(10)), "10.00000000");
        assert_eq!(to_fixed(dec!(0.00001)), "0.00001000");
        assert_eq!(to_fixed(Decimal::ZERO), "0.00000000");
    }

    #[test]
    fn test_round_midpoint_away_from_zero() {
        assert_eq!(round(dec!(0.123456785)), dec!(0.12345679));
        assert_eq!(round(dec!(0.123456784999)), dec!(0.12345678));
        assert_eq!(to_fixed(dec!(1.999999995)), "2.00000000");
    }

    #[test]
    fn test_base_units() {
        assert_eq!(from_base_units(164), dec!(0.00000164));
        assert_eq!(from_base_units(100_000_000), dec!(1));
    }
}
