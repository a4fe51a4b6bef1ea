//! # Line-Item Ledger
//!
//! The in-memory list of line items for one in-progress invoice or purchase
//! order, and the totals derived from it.
//!
//! ## Totals Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For each line:                                                         │
//! │    line subtotal = quantity × unit price                                │
//! │    line discount = line subtotal × discount% / 100                      │
//! │                                                                         │
//! │  subtotal       = Σ line subtotal                                       │
//! │  total discount = Σ line discount                                       │
//! │  taxable base   = subtotal − total discount                             │
//! │  tax (IVA)      = taxable base × 0.21                                   │
//! │  grand total    = taxable base + tax                                    │
//! │                                                                         │
//! │  Everything accumulates at full precision; rounding to 2 decimals     │
//! │  happens in Totals::rounded() for display and persistence.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ferreteria_core::ledger::{Ledger, LineInput};
//! use ferreteria_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let mut ledger = Ledger::new();
//! ledger
//!     .add_line(LineInput::new("7", "Taladro", Decimal::new(2, 0), Money::from_cents(10000)))
//!     .unwrap();
//! ledger
//!     .add_line(
//!         LineInput::new("9", "Brocas", Decimal::ONE, Money::from_cents(5000))
//!             .with_discount(Decimal::new(10, 0)),
//!     )
//!     .unwrap();
//!
//! let totals = ledger.compute_totals();
//! assert_eq!(totals.grand_total.to_string(), "$296.45");
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::LedgerError;
use crate::money::Money;
use crate::types::{CatalogProduct, LineItem, ProductRef, TaxRate};
use crate::validation::{
    parse_decimal, validate_discount_percent, validate_line_count, validate_product_ref,
    validate_quantity, validate_unit_price,
};

/// Fixed tax rate applied to every ledger.
pub const TAX_RATE: TaxRate = TaxRate::IVA;

// =============================================================================
// Totals
// =============================================================================

/// Derived totals of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Totals {
    pub subtotal: Money,
    pub total_discount: Money,
    pub taxable_base: Money,
    pub tax: Money,
    pub grand_total: Money,
}

impl Totals {
    /// Builds totals from the accumulated subtotal and discount.
    fn from_sums(subtotal: Money, total_discount: Money, rate: TaxRate) -> Self {
        let taxable_base = subtotal - total_discount;
        let tax = taxable_base.calculate_tax(rate);
        Totals {
            subtotal,
            total_discount,
            taxable_base,
            tax,
            grand_total: taxable_base + tax,
        }
    }

    /// Each field rounded to 2 decimals, for the form summary and for
    /// persisting.
    ///
    /// Fields are rounded independently, so the rounded values may be off
    /// by a cent from re-adding the rounded parts.
    pub fn rounded(&self) -> Totals {
        Totals {
            subtotal: self.subtotal.rounded(),
            total_discount: self.total_discount.rounded(),
            taxable_base: self.taxable_base.rounded(),
            tax: self.tax.rounded(),
            grand_total: self.grand_total.rounded(),
        }
    }
}

/// Per-line breakdown for the product table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

impl From<&LineItem> for LineTotals {
    fn from(line: &LineItem) -> Self {
        LineTotals {
            subtotal: line.subtotal(),
            discount: line.discount(),
            total: line.total(),
        }
    }
}

// =============================================================================
// Line Input
// =============================================================================

/// Typed arguments of [`Ledger::add_line`].
#[derive(Debug, Clone, PartialEq)]
pub struct LineInput {
    pub product_ref: ProductRef,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub discount_percent: Decimal,
}

impl LineInput {
    /// Creates an input with no discount.
    pub fn new(
        product_ref: impl Into<ProductRef>,
        product_name: impl Into<String>,
        quantity: Decimal,
        unit_price: Money,
    ) -> Self {
        LineInput {
            product_ref: product_ref.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            discount_percent: Decimal::ZERO,
        }
    }

    /// Creates an input for a catalog product at its catalog price.
    pub fn from_product(product: &CatalogProduct, quantity: Decimal) -> Self {
        LineInput::new(
            product.id.clone(),
            product.name.clone(),
            quantity,
            product.price,
        )
    }

    /// Sets the discount percentage.
    pub fn with_discount(mut self, percent: Decimal) -> Self {
        self.discount_percent = percent;
        self
    }

    /// Checks every line invariant.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_product_ref(&self.product_ref)?;
        validate_quantity(self.quantity)?;
        validate_unit_price(self.unit_price)?;
        validate_discount_percent(self.discount_percent)?;
        Ok(())
    }
}

/// The "add product" row of the form, as raw strings.
///
/// ## Mapping
/// ```text
/// selectProducto ──► product_ref   (blank → "product is required")
/// option label   ──► product_name
/// cantidad       ──► quantity      (blank/non-numeric → rejected)
/// precio         ──► unit_price    (blank/non-numeric → rejected)
/// descuento      ──► discount      (blank → 0)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineForm {
    pub product_ref: String,
    pub product_name: String,
    pub quantity: String,
    pub unit_price: String,
    #[serde(default)]
    pub discount_percent: String,
}

impl LineForm {
    /// Parses the raw fields into a [`LineInput`].
    ///
    /// Only parsing happens here; range checks run in [`Ledger::add_line`].
    pub fn parse(&self) -> Result<LineInput, LedgerError> {
        let product_ref = ProductRef::from(self.product_ref.as_str());
        validate_product_ref(&product_ref)?;

        let quantity = parse_decimal("quantity", &self.quantity)?;
        let unit_price = Money::new(parse_decimal("unit price", &self.unit_price)?);
        let discount_percent = if self.discount_percent.trim().is_empty() {
            Decimal::ZERO
        } else {
            parse_decimal("discount", &self.discount_percent)?
        };

        Ok(LineInput {
            product_ref,
            product_name: self.product_name.trim().to_string(),
            quantity,
            unit_price,
            discount_percent,
        })
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Ordered line items of one document.
///
/// ## Invariants
/// - Every line satisfies the [`LineItem`] invariants
/// - Product references are unique (re-adding merges)
/// - Insertion order is display order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    lines: Vec<LineItem>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Ledger { lines: Vec::new() }
    }

    /// Builds a ledger from persisted lines (edit form).
    ///
    /// Lines go through [`Ledger::add_line`], so duplicates merge and invalid
    /// stored lines are reported instead of silently loaded.
    pub fn from_lines(lines: impl IntoIterator<Item = LineItem>) -> Result<Self, LedgerError> {
        let mut ledger = Ledger::new();
        for line in lines {
            ledger.add_line(LineInput {
                product_ref: line.product_ref,
                product_name: line.product_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                discount_percent: line.discount_percent,
            })?;
        }
        Ok(ledger)
    }

    /// Adds a product to the ledger, or merges into the existing line.
    ///
    /// ## Merge Behavior
    /// When `product_ref` is already present:
    /// - quantity: **added** to the existing quantity
    /// - unit price and discount: **replaced** by the new values
    /// - product name: kept
    ///
    /// ```text
    /// add(ref 7, qty 2, price 10)   →  [ref 7: qty 2, price 10]
    /// add(ref 7, qty 3, price 12)   →  [ref 7: qty 5, price 12]
    /// ```
    ///
    /// ## Limits
    /// Quantity (merged quantity included) up to [`crate::MAX_LINE_QUANTITY`],
    /// unit price up to [`crate::MAX_UNIT_PRICE`], at most
    /// [`crate::MAX_LEDGER_LINES`] lines. Past them the input is rejected as
    /// "too large", which keeps [`Ledger::compute_totals`] overflow-free.
    ///
    /// On error the ledger is left exactly as it was.
    pub fn add_line(&mut self, input: LineInput) -> Result<(), LedgerError> {
        input.validate()?;

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_ref == input.product_ref)
        {
            let quantity = line
                .quantity
                .checked_add(input.quantity)
                .ok_or_else(|| LedgerError::invalid("quantity", "is too large"))?;
            validate_quantity(quantity)?;
            line.quantity = quantity;
            line.unit_price = input.unit_price;
            line.discount_percent = input.discount_percent;
            return Ok(());
        }

        validate_line_count(self.lines.len())?;
        self.lines.push(LineItem {
            product_ref: input.product_ref,
            product_name: input.product_name,
            quantity: input.quantity,
            unit_price: input.unit_price,
            discount_percent: input.discount_percent,
        });
        Ok(())
    }

    /// Removes and returns the line at `index`; later lines shift up.
    pub fn remove_line(&mut self, index: usize) -> Result<LineItem, LedgerError> {
        if index >= self.lines.len() {
            return Err(LedgerError::IndexOutOfRange {
                index,
                len: self.lines.len(),
            });
        }
        Ok(self.lines.remove(index))
    }

    /// Computes the document totals at full precision.
    ///
    /// Pure: calling it twice without a mutation in between yields identical
    /// results. An empty ledger yields all-zero totals.
    pub fn compute_totals(&self) -> Totals {
        let rows = self.line_totals();
        let subtotal = rows.iter().map(|row| row.subtotal).sum();
        let total_discount = rows.iter().map(|row| row.discount).sum();

        Totals::from_sums(subtotal, total_discount, TAX_RATE)
    }

    /// Per-line breakdown, in display order.
    pub fn line_totals(&self) -> Vec<LineTotals> {
        self.lines.iter().map(LineTotals::from).collect()
    }

    /// The lines in display order.
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Consumes the ledger, returning its lines.
    pub fn into_lines(self) -> Vec<LineItem> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(num: i64, scale: u32) -> Decimal {
        Decimal::new(num, scale)
    }

    fn money(units: i64) -> Money {
        Money::new(Decimal::new(units, 0))
    }

    fn line(product: &str, qty: i64, price: i64, discount: i64) -> LineInput {
        LineInput::new(product, format!("Product {}", product), dec(qty, 0), money(price))
            .with_discount(dec(discount, 0))
    }

    fn assert_consistent(totals: &Totals) {
        assert_eq!(totals.taxable_base, totals.subtotal - totals.total_discount);
        assert_eq!(totals.grand_total, totals.taxable_base + totals.tax);
    }

    #[test]
    fn test_empty_ledger_has_zero_totals() {
        let ledger = Ledger::new();
        let totals = ledger.compute_totals();

        assert_eq!(totals, Totals::default());
        assert!(totals.grand_total.is_zero());
        assert!(ledger.line_totals().is_empty());
    }

    #[test]
    fn test_mixed_discount_scenario() {
        let mut ledger = Ledger::new();
        ledger.add_line(line("1", 2, 100, 0)).unwrap();
        ledger.add_line(line("2", 1, 50, 10)).unwrap();

        let totals = ledger.compute_totals();
        assert_eq!(totals.subtotal, money(250));
        assert_eq!(totals.total_discount, money(5));
        assert_eq!(totals.taxable_base, money(245));
        assert_eq!(totals.tax, Money::from_cents(5145));
        assert_eq!(totals.grand_total, Money::from_cents(29645));
        assert_consistent(&totals);
    }

    #[test]
    fn test_single_line_scenario() {
        let mut ledger = Ledger::new();
        ledger.add_line(line("1", 3, 10, 0)).unwrap();

        let totals = ledger.compute_totals();
        assert_eq!(totals.subtotal, money(30));
        assert!(totals.total_discount.is_zero());
        assert_eq!(totals.taxable_base, money(30));
        assert_eq!(totals.tax, Money::from_cents(630));
        assert_eq!(totals.grand_total, Money::from_cents(3630));
    }

    #[test]
    fn test_totals_are_consistent_for_awkward_values() {
        let mut ledger = Ledger::new();
        ledger
            .add_line(
                LineInput::new("a", "Cable", dec(333, 2), Money::new(dec(1999, 3)))
                    .with_discount(dec(125, 1)),
            )
            .unwrap();
        ledger
            .add_line(
                LineInput::new("b", "Tornillos", dec(7, 1), Money::new(dec(1, 2)))
                    .with_discount(dec(333, 1)),
            )
            .unwrap();

        assert_consistent(&ledger.compute_totals());
    }

    #[test]
    fn test_accumulates_before_rounding() {
        // three lines of 0.333 each: rounding per line would give 0.99
        let mut ledger = Ledger::new();
        for product in ["a", "b", "c"] {
            ledger
                .add_line(LineInput::new(product, product, Decimal::ONE, Money::new(dec(333, 3))))
                .unwrap();
        }

        let totals = ledger.compute_totals();
        assert_eq!(totals.subtotal.amount(), dec(999, 3));
        assert_eq!(totals.rounded().subtotal, Money::from_cents(100));
    }

    #[test]
    fn test_compute_totals_is_idempotent() {
        let mut ledger = Ledger::new();
        ledger.add_line(line("1", 2, 100, 0)).unwrap();
        ledger.add_line(line("2", 1, 50, 10)).unwrap();

        assert_eq!(ledger.compute_totals(), ledger.compute_totals());
    }

    #[test]
    fn test_zero_quantity_leaves_ledger_unchanged() {
        let mut ledger = Ledger::new();
        ledger.add_line(line("1", 2, 100, 0)).unwrap();
        let before = ledger.clone();

        let err = ledger.add_line(line("2", 0, 10, 0)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidLineInput { .. }));
        assert_eq!(ledger, before);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_negative_price_leaves_ledger_unchanged() {
        let mut ledger = Ledger::new();
        ledger.add_line(line("1", 2, 100, 0)).unwrap();
        let before = ledger.clone();

        assert!(ledger.add_line(line("1", 1, -5, 0)).is_err());
        assert!(ledger.add_line(line("2", 1, 0, 0)).is_err());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_rejects_missing_product_and_bad_discount() {
        let mut ledger = Ledger::new();

        assert!(ledger.add_line(line("", 1, 10, 0)).is_err());
        assert!(ledger.add_line(line("1", 1, 10, 101)).is_err());
        assert!(ledger.add_line(line("1", 1, 10, -1)).is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_huge_quantity_from_form_is_rejected() {
        let mut ledger = Ledger::new();
        ledger.add_line(line("1", 2, 100, 0)).unwrap();
        let before = ledger.clone();

        let input = LineForm {
            product_ref: "9".to_string(),
            product_name: "Clavos".to_string(),
            quantity: Decimal::MAX.to_string(),
            unit_price: "2".to_string(),
            ..LineForm::default()
        }
        .parse()
        .unwrap();

        let err = ledger.add_line(input).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidLineInput { ref field, .. } if field == "quantity"
        ));
        assert_eq!(ledger, before);
        assert_eq!(ledger.compute_totals().grand_total, Money::from_cents(24200));
    }

    #[test]
    fn test_huge_unit_price_is_rejected() {
        let mut ledger = Ledger::new();

        let err = ledger
            .add_line(LineInput::new("1", "Grupo electrógeno", Decimal::ONE, Money::new(Decimal::MAX)))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidLineInput { ref field, .. } if field == "unit price"
        ));

        let over = Money::new(Decimal::from(crate::MAX_UNIT_PRICE) + Decimal::ONE);
        assert!(ledger
            .add_line(LineInput::new("1", "Grupo electrógeno", Decimal::ONE, over))
            .is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_merge_past_quantity_limit_is_rejected() {
        let max = Decimal::from(crate::MAX_LINE_QUANTITY);
        let mut ledger = Ledger::new();
        ledger
            .add_line(LineInput::new("7", "Arena", max, money(10)))
            .unwrap();
        let before = ledger.clone();

        // price and discount must not change either
        let err = ledger
            .add_line(LineInput::new("7", "Arena", Decimal::ONE, money(12)).with_discount(dec(5, 0)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidLineInput { .. }));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_line_limit() {
        let mut ledger = Ledger::new();
        for i in 0..crate::MAX_LEDGER_LINES {
            ledger.add_line(line(&i.to_string(), 1, 1, 0)).unwrap();
        }
        let before = ledger.clone();

        let err = ledger.add_line(line("extra", 1, 1, 0)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidLineInput { .. }));
        assert_eq!(ledger, before);

        // merging into an existing line is still allowed
        ledger.add_line(line("0", 1, 1, 0)).unwrap();
        assert_eq!(ledger.lines()[0].quantity, dec(2, 0));
    }

    #[test]
    fn test_totals_at_every_limit() {
        let quantity = Decimal::from(crate::MAX_LINE_QUANTITY);
        let price = Money::new(Decimal::from(crate::MAX_UNIT_PRICE));
        let mut ledger = Ledger::new();
        for i in 0..crate::MAX_LEDGER_LINES {
            ledger
                .add_line(LineInput::new(i as i64, "Max", quantity, price))
                .unwrap();
        }

        // 500 × 1e6 × 1e9
        let totals = ledger.compute_totals();
        assert_eq!(totals.subtotal.amount(), Decimal::new(500_000_000_000_000_000, 0));
        assert_eq!(totals.grand_total.amount(), Decimal::new(605_000_000_000_000_000, 0));
        assert_consistent(&totals);
        assert_eq!(totals.rounded(), totals);
    }

    #[test]
    fn test_duplicate_product_merges() {
        let mut ledger = Ledger::new();
        ledger.add_line(line("7", 2, 10, 0)).unwrap();
        ledger
            .add_line(LineInput::new("7", "Renamed", dec(3, 0), money(12)).with_discount(dec(5, 0)))
            .unwrap();

        assert_eq!(ledger.len(), 1);
        let merged = &ledger.lines()[0];
        assert_eq!(merged.quantity, dec(5, 0));
        assert_eq!(merged.unit_price, money(12));
        assert_eq!(merged.discount_percent, dec(5, 0));
        // name comes from the first add
        assert_eq!(merged.product_name, "Product 7");
    }

    #[test]
    fn test_merge_keeps_position() {
        let mut ledger = Ledger::new();
        ledger.add_line(line("1", 1, 10, 0)).unwrap();
        ledger.add_line(line("2", 1, 10, 0)).unwrap();
        ledger.add_line(line("1", 1, 10, 0)).unwrap();

        let refs: Vec<&str> = ledger.lines().iter().map(|l| l.product_ref.as_str()).collect();
        assert_eq!(refs, vec!["1", "2"]);
    }

    #[test]
    fn test_numeric_and_string_refs_merge() {
        let mut ledger = Ledger::new();
        ledger
            .add_line(LineInput::new(42, "Pala", Decimal::ONE, money(10)))
            .unwrap();
        ledger
            .add_line(LineInput::new("42", "Pala", Decimal::ONE, money(10)))
            .unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.lines()[0].quantity, dec(2, 0));
    }

    #[test]
    fn test_remove_first_of_three_preserves_order() {
        let mut ledger = Ledger::new();
        ledger.add_line(line("a", 1, 10, 0)).unwrap();
        ledger.add_line(line("b", 2, 20, 0)).unwrap();
        ledger.add_line(line("c", 3, 30, 0)).unwrap();
        let original = ledger.lines().to_vec();

        let removed = ledger.remove_line(0).unwrap();

        assert_eq!(removed, original[0]);
        assert_eq!(ledger.lines(), &original[1..]);
    }

    #[test]
    fn test_remove_out_of_range_is_rejected() {
        let mut ledger = Ledger::new();
        ledger.add_line(line("a", 1, 10, 0)).unwrap();
        let before = ledger.clone();

        let err = ledger.remove_line(1).unwrap_err();
        assert_eq!(err, LedgerError::IndexOutOfRange { index: 1, len: 1 });
        assert_eq!(ledger, before);

        assert!(Ledger::new().remove_line(0).is_err());
    }

    #[test]
    fn test_line_totals() {
        let mut ledger = Ledger::new();
        ledger.add_line(line("1", 1, 50, 10)).unwrap();

        let rows = ledger.line_totals();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subtotal, money(50));
        assert_eq!(rows[0].discount, money(5));
        assert_eq!(rows[0].total, money(45));
    }

    #[test]
    fn test_line_form_parse() {
        let form = LineForm {
            product_ref: "12".to_string(),
            product_name: " Llave inglesa ".to_string(),
            quantity: "2.5".to_string(),
            unit_price: "100".to_string(),
            discount_percent: String::new(),
        };

        let input = form.parse().unwrap();
        assert_eq!(input.product_ref, ProductRef::from(12));
        assert_eq!(input.product_name, "Llave inglesa");
        assert_eq!(input.quantity, dec(25, 1));
        assert_eq!(input.discount_percent, Decimal::ZERO);
    }

    #[test]
    fn test_line_form_rejects_missing_numbers() {
        let form = LineForm {
            product_ref: "12".to_string(),
            quantity: "dos".to_string(),
            unit_price: "100".to_string(),
            ..LineForm::default()
        };
        assert!(form.parse().is_err());

        let form = LineForm {
            product_ref: "12".to_string(),
            quantity: "1".to_string(),
            ..LineForm::default()
        };
        assert!(form.parse().is_err());

        let form = LineForm {
            quantity: "1".to_string(),
            unit_price: "100".to_string(),
            ..LineForm::default()
        };
        assert!(form.parse().is_err());
    }

    #[test]
    fn test_from_lines_merges_and_validates() {
        let item = LineItem {
            product_ref: ProductRef::from("x"),
            product_name: "X".to_string(),
            quantity: dec(1, 0),
            unit_price: money(10),
            discount_percent: Decimal::ZERO,
        };

        let ledger = Ledger::from_lines(vec![item.clone(), item.clone()]).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.lines()[0].quantity, dec(2, 0));

        let broken = LineItem {
            quantity: Decimal::ZERO,
            ..item
        };
        assert!(Ledger::from_lines(vec![broken]).is_err());
    }

    #[test]
    fn test_from_product() {
        let product = CatalogProduct {
            id: ProductRef::from(3),
            name: "Serrucho".to_string(),
            price: Money::from_cents(1850),
        };
        let mut ledger = Ledger::new();
        ledger
            .add_line(LineInput::from_product(&product, Decimal::ONE))
            .unwrap();

        assert_eq!(ledger.compute_totals().subtotal, Money::from_cents(1850));
    }
}
