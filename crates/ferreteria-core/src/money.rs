//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    245 × 0.21 = 51.449999999999996  ❌ WRONG!                           │
//! │                                                                         │
//! │  Integer cents don't fit either: a hardware store sells 2.5 m of        │
//! │  cable at $3.99/m, so quantity × price has more than two decimals.     │
//! │                                                                         │
//! │  OUR SOLUTION: Exact base-10 Decimal                                    │
//! │    245 × 0.21 = 51.45 exactly                                          │
//! │    2.5 × 3.99 = 9.975 kept in full, rounded only when displayed        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ferreteria_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line = price * Decimal::new(25, 1); // × 2.5
//! assert_eq!(line.amount(), Decimal::new(27475, 3)); // 27.475, unrounded
//! assert_eq!(line.to_string(), "$27.48"); // rounded for display only
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Decimal places kept when a value is presented or persisted.
pub const CURRENCY_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount held at full precision.
///
/// ## Design Decisions
/// - **Decimal**: exact base-10 arithmetic, no binary float drift
/// - **No implicit rounding**: `+`, `-`, `×` keep every digit; call
///   [`Money::rounded`] at presentation or persistence boundaries
/// - **Serialized as a string** so the web UI never parses it as a float
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  LineItem.unit_price × quantity ──► line subtotal ──┐                   │
/// │                                                      ├─► Ledger totals  │
/// │  line subtotal × discount% ──────► line discount ────┘                   │
/// │                                                                         │
/// │  Totals.rounded() ──► "$296.45" in the form summary / persisted record │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(#[ts(as = "String")] Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from minor units (cents).
    ///
    /// ## Example
    /// ```rust
    /// use ferreteria_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.amount(), Decimal::new(1099, 2));
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, CURRENCY_SCALE))
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Rounds to currency precision (2 decimals, half away from zero).
    ///
    /// This is the only place precision is dropped. Accumulating rounded
    /// line amounts instead would compound the error across lines.
    ///
    /// ## Example
    /// ```rust
    /// use ferreteria_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let raw = Money::new(Decimal::new(9975, 3)); // 9.975
    /// assert_eq!(raw.rounded().amount(), Decimal::new(998, 2)); // 9.98
    /// ```
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Calculates tax on this amount at full precision.
    ///
    /// ## Example
    /// ```rust
    /// use ferreteria_core::money::Money;
    /// use ferreteria_core::types::TaxRate;
    /// use rust_decimal::Decimal;
    ///
    /// let base = Money::new(Decimal::new(245, 0));
    /// let iva = base.calculate_tax(TaxRate::IVA);
    /// assert_eq!(iva.amount(), Decimal::new(5145, 2)); // 51.45
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(self.0 * rate.fraction())
    }

    /// Returns `percent`% of this amount, e.g. a line discount.
    ///
    /// ## Example
    /// ```rust
    /// use ferreteria_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let subtotal = Money::new(Decimal::new(50, 0));
    /// let discount = subtotal.percentage(Decimal::new(10, 0));
    /// assert_eq!(discount.amount(), Decimal::new(5, 0));
    /// ```
    pub fn percentage(&self, percent: Decimal) -> Money {
        Money(self.0 * percent / Decimal::ONE_HUNDRED)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display rounds to currency precision: `$296.45`, `-$5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded().0;
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{}${:.2}", sign, rounded.abs())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
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

/// Multiplication by a decimal quantity.
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: Decimal) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
