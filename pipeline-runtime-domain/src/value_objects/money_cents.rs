// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Integer-cents money representation.
//!
//! The transform engine's `TO_CENTS`/`FROM_CENTS` built-ins must round-trip
//! without drifting, so currency amounts are always carried as `MoneyCents`
//! (an `i64` count of minor units) once they cross a transform boundary.
//! Floating point is only ever used transiently while parsing externally
//! supplied decimal strings.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Parses a decimal string (e.g. `"19.99"`) into cents, rounding to the
    /// nearest cent. `scale` is the number of minor units per major unit
    /// (100 for most currencies, matching the spec's `TO_CENTS` contract).
    pub fn from_decimal_str(value: &str, scale: i64) -> Result<Self, PipelineError> {
        let parsed: f64 = value
            .trim()
            .parse()
            .map_err(|_| PipelineError::ValidationFailed(format!("'{}' is not a decimal amount", value)))?;
        if !parsed.is_finite() {
            return Err(PipelineError::ValidationFailed(format!(
                "'{}' is not a finite decimal amount",
                value
            )));
        }
        Ok(Self((parsed * scale as f64).round() as i64))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Renders back to a decimal string with `scale` minor units per major
    /// unit, the inverse of `from_decimal_str` with the same scale.
    pub fn to_decimal_string(&self, scale: i64) -> String {
        let major = self.0 / scale;
        let minor = (self.0 % scale).abs();
        let width = scale.to_string().len().saturating_sub(1);
        format!("{}.{:0width$}", major, minor, width = width)
    }
}

impl std::ops::Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: Self) -> Self::Output {
        MoneyCents(self.0 + rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_cents() {
        let m = MoneyCents::from_decimal_str("19.99", 100).unwrap();
        assert_eq!(m.cents(), 1999);
        assert_eq!(m.to_decimal_string(100), "19.99");
    }

    #[test]
    fn rounds_to_nearest_cent() {
        let m = MoneyCents::from_decimal_str("19.994", 100).unwrap();
        assert_eq!(m.cents(), 1999);
    }

    #[test]
    fn rejects_non_numeric() {
        assert!(MoneyCents::from_decimal_str("not-a-number", 100).is_err());
    }

    #[test]
    fn addition_is_exact() {
        let a = MoneyCents::from_cents(150);
        let b = MoneyCents::from_cents(25);
        assert_eq!((a + b).cents(), 175);
    }
}
