// 1.0: all the primitives live here. nothing in the engine works without these types.
// asset ids, amounts, rates, regimes, valuations. each is a newtype so the compiler catches
// mixups between an amount and a rate that are both just 256-bit integers underneath.

use crate::fixed_point::{decimal_to_scaled, format_units, pow10, RATE_DECIMALS};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

// 1.1: an asset and the exponent of its fixed point scale. 18 decimals → 1.0 == 10^18.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub decimals: u8,
}

impl Asset {
    pub fn new(id: impl Into<String>, decimals: u8) -> Self {
        Self {
            id: AssetId::new(id),
            decimals,
        }
    }

    /// One whole unit in the asset's smallest denomination. None if decimals are out of range.
    pub fn unit(&self) -> Option<U256> {
        pow10(self.decimals)
    }
}

// 1.2: amount of some asset in its smallest unit. never negative, never a float.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(U256);

impl Amount {
    pub fn new(raw: U256) -> Self {
        Self(raw)
    }

    pub fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn from_u128(raw: u128) -> Self {
        Self(U256::from(raw))
    }

    /// Exact conversion from a human amount, e.g. `1.5` at 6 decimals → 1_500_000.
    pub fn from_decimal(value: Decimal, decimals: u8) -> Option<Self> {
        decimal_to_scaled(value, decimals).map(Self)
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: Amount) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Human readable form at the given precision.
    pub fn format(&self, decimals: u8) -> String {
        format_units(self.0, decimals)
    }
}

impl From<u64> for Amount {
    fn from(raw: u64) -> Self {
        Self(U256::from(raw))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: conversion rate. smallest units of the target per one whole unit of the source, so
// its scale is the target's decimals. from_decimal builds one at RATE_DECIMALS (0.25 → 0.25e18).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rate(U256);

impl Rate {
    pub fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    pub fn from_u128(raw: u128) -> Self {
        Self(U256::from(raw))
    }

    pub fn zero() -> Self {
        Self(U256::zero())
    }

    #[must_use]
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        decimal_to_scaled(value, RATE_DECIMALS).map(Self)
    }

    pub fn raw(&self) -> U256 {
        self.0
    }
}

// raw integer: the scale belongs to whichever asset the rate lands in
impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 256-bit values travel as base-10 strings so JSON readers never truncate them
macro_rules! impl_decimal_string_serde {
    ($ty:ident) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                U256::from_dec_str(raw.trim()).map(Self).map_err(|_| {
                    serde::de::Error::custom(format!("invalid unsigned integer: {raw}"))
                })
            }
        }
    };
}

impl_decimal_string_serde!(Amount);
impl_decimal_string_serde!(Rate);

// 1.4: which oracle view to read. one regime per call tree, never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    Canonical,
    Live,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Canonical => f.write_str("canonical"),
            Regime::Live => f.write_str("live"),
        }
    }
}

// 1.5: result of a valuation. is_valid == false means "do not use value".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    pub value: Amount,
    pub is_valid: bool,
}

impl Valuation {
    pub fn valid(value: Amount) -> Self {
        Self {
            value,
            is_valid: true,
        }
    }

    pub fn invalid() -> Self {
        Self {
            value: Amount::zero(),
            is_valid: false,
        }
    }

    /// Validly worth nothing.
    pub fn worthless() -> Self {
        Self::valid(Amount::zero())
    }

    /// Sum two branches. None on overflow; validity is conjunctive.
    pub fn checked_combine(&self, other: &Valuation) -> Option<Self> {
        Some(Self {
            value: self.value.checked_add(other.value)?,
            is_valid: self.is_valid && other.is_valid,
        })
    }

    /// The value, only if it can be trusted.
    pub fn trusted(&self) -> Option<Amount> {
        self.is_valid.then_some(self.value)
    }
}

// 1.6: one row of a multi asset valuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub asset: AssetId,
    pub amount: Amount,
}

impl Holding {
    pub fn new(asset: impl Into<String>, amount: Amount) -> Self {
        Self {
            asset: AssetId::new(asset),
            amount,
        }
    }
}

// 1.7: millisecond timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn millis_since(&self, earlier: &Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rate_from_decimal_scales_to_1e18() {
        let rate = Rate::from_decimal(dec!(0.25)).unwrap();
        assert_eq!(rate, Rate::from_u128(250_000_000_000_000_000));
        assert_eq!(rate.to_string(), "250000000000000000");

        assert!(Rate::from_decimal(dec!(-0.5)).is_none());
    }

    #[test]
    fn amount_from_decimal() {
        let amount = Amount::from_decimal(dec!(1.5), 6).unwrap();
        assert_eq!(amount, Amount::from(1_500_000));
        assert_eq!(amount.format(6), "1.5");

        // more digits than the asset carries
        assert!(Amount::from_decimal(dec!(0.0000001), 6).is_none());
    }

    #[test]
    fn combine_is_conjunctive() {
        let a = Valuation::valid(Amount::from(10));
        let b = Valuation {
            value: Amount::from(5),
            is_valid: false,
        };

        let both = a.checked_combine(&b).unwrap();
        assert_eq!(both.value, Amount::from(15));
        assert!(!both.is_valid);
        assert_eq!(both.trusted(), None);

        let max = Valuation::valid(Amount::new(U256::max_value()));
        assert!(max.checked_combine(&a).is_none());
    }

    #[test]
    fn amount_serde_as_string() {
        let amount = Amount::from_u128(125_000_000_000_000_000);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"125000000000000000\"");

        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);

        assert!(serde_json::from_str::<Amount>("\"-1\"").is_err());
    }

    #[test]
    fn asset_id_honours_width() {
        let id = AssetId::from("USD");
        assert_eq!(format!("[{id:<6}]"), "[USD   ]");
        assert_eq!(format!("[{id:>6}]"), "[   USD]");
    }

    #[test]
    fn rate_displays_raw_units() {
        // a USDC quoted rate of 2000.5 at 6 decimals
        assert_eq!(Rate::from_u128(2_000_500_000).to_string(), "2000500000");
    }

    #[test]
    fn asset_unit() {
        assert_eq!(Asset::new("USDC", 6).unit(), Some(U256::from(1_000_000u64)));
        assert_eq!(Asset::new("BAD", 90).unit(), None);
    }
}
