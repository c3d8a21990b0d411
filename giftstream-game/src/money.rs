//! Fixed-point monetary amounts.
//!
//! Every cost, reward and balance is held as whole hundredths so that the
//! "rounded to two decimals" rule is a property of the type instead of a
//! convention each caller has to remember.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::numbers::{floor_f64_to_i64, i64_to_f64, round_f64_to_i64};

/// Amount in hundredths of a unit (token or coin).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Self = Self(0);

    /// Build from whole units, e.g. `Cents::from_whole(100)` is `100.00`.
    #[must_use]
    pub const fn from_whole(units: i64) -> Self {
        Self(units.saturating_mul(100))
    }

    /// Round a decimal unit value to the nearest cent.
    #[must_use]
    pub fn from_units(units: f64) -> Self {
        Self(round_f64_to_i64(units * 100.0))
    }

    /// Decimal unit value (`1234` cents is `12.34`).
    #[must_use]
    pub fn as_units(self) -> f64 {
        i64_to_f64(self.0) / 100.0
    }

    /// Raw hundredths.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiply by a factor, rounding to the nearest cent.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self(round_f64_to_i64(i64_to_f64(self.0) * factor))
    }

    /// Multiply by a factor and drop the fractional unit, keeping whole units only.
    #[must_use]
    pub fn scale_floor_whole(self, factor: f64) -> Self {
        Self::from_whole(floor_f64_to_i64(self.as_units() * factor))
    }

    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Cents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Cents {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Cents {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Cents {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
