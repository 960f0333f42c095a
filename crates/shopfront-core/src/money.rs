//! # Money
//!
//! Integer money in minor units. `0.1 + 0.2` is not `0.3` in floating point,
//! and a billing engine cannot afford to be off by a paisa, so every amount in
//! the system is an `i64` count of the smallest currency unit. Only display
//! code ever turns it back into a decimal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

/// A monetary value in minor units (e.g. paise, cents).
///
/// Signed so that derived figures (profit on a below-cost sale) can go
/// negative; prices themselves are validated positive before they reach
/// storage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    /// Creates a value from minor units. The only constructor; there is
    /// deliberately no `from_float`.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// The raw minor-unit count.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// The major-unit portion (rupees/dollars).
    #[inline]
    pub const fn major_part(&self) -> i64 {
        self.0 / 100
    }

    /// The minor-unit portion, 0-99, sign dropped.
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Tax on this amount at the given rate, rounded half up on minor units.
    ///
    /// Integer formula: `(amount * bps + 5000) / 10000`. The `+ 5000` term is
    /// the half-unit that turns truncation into rounding, so the result
    /// matches `round(amount * rate, 2)` done in decimal arithmetic.
    /// i128 intermediate prevents overflow on large subtotals.
    pub fn tax_at(&self, rate: TaxRate) -> Money {
        let tax = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money(tax as i64)
    }

    /// Unit price × quantity, the line-total calculation.
    #[inline]
    pub const fn times(&self, quantity: i64) -> Self {
        Money(self.0 * quantity)
    }
}

impl fmt::Display for Money {
    /// Debug-friendly `Rs 10.99` rendering. Real receipts are formatted by
    /// the presentation layer.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rs {}.{:02}", sign, self.major_part().abs(), self.minor_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}
