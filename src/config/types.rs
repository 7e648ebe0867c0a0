//! Small newtypes for scalar fields that should not be confused with bare
//! `f64`/`u16`. Mirrors the project's existing approach of wrapping
//! domain scalars rather than passing raw primitives around.

use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// A USD (or listing-currency) amount. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(f64);

impl Money {
    pub const fn new(val: f64) -> Self {
        Self(if val < 0.0 { 0.0 } else { val })
    }

    pub fn round2(&self) -> Self {
        Self::new((self.0 * 100.0).round() / 100.0)
    }
}

impl Deref for Money {
    type Target = f64;
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

/// Weight in grams. Always non-negative; carries the 2dp rounding the
/// extractors are required to produce.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Grams(f64);

impl Grams {
    pub fn new(val: f64) -> Self {
        let clamped = if val < 0.0 { 0.0 } else { val };
        Self((clamped * 100.0).round() / 100.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Deref for Grams {
    type Target = f64;
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl std::fmt::Display for Grams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}g", self.0)
    }
}

/// A 0-100 clamped score (deal score, risk score).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub fn new(val: i32) -> Self {
        Self(val.clamp(0, 100) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn as_ratio(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Deref for Score {
    type Target = u8;
    fn deref(&self) -> &u8 {
        &self.0
    }
}

/// Gold karat purity. Restricted to the set the source catalogue
/// actually recognises: {8,9,10,14,18,22,24}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Karat(u8);

impl Karat {
    pub const VALID: [u8; 7] = [8, 9, 10, 14, 18, 22, 24];

    pub fn from_raw(val: u8) -> Option<Self> {
        Self::VALID.contains(&val).then_some(Self(val))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Fractional purity, e.g. 14k -> 0.583333...
    pub fn fineness(&self) -> f64 {
        self.0 as f64 / 24.0
    }
}

impl std::fmt::Display for Karat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}k", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_clamps_negative_to_zero() {
        assert_eq!(*Money::new(-5.0), 0.0);
        assert_eq!(*Money::new(12.5), 12.5);
    }

    #[test]
    fn grams_rounds_to_two_decimal_places() {
        assert_eq!(Grams::new(1.23456).value(), 1.23);
        assert_eq!(Grams::new(-1.0).value(), 0.0);
    }

    #[test]
    fn score_clamps_to_0_100() {
        assert_eq!(Score::new(-10).value(), 0);
        assert_eq!(Score::new(150).value(), 100);
        assert_eq!(Score::new(42).value(), 42);
        assert!((Score::new(50).as_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn karat_only_accepts_the_known_set() {
        assert!(Karat::from_raw(14).is_some());
        assert!(Karat::from_raw(15).is_none());
        assert_eq!(Karat::from_raw(24).unwrap().fineness(), 1.0);
    }
}
