//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic is done with `Decimal` internally, then converted back to
//! `f64` for storage/serialization, rounded to 2 decimal places half-up.

use rust_decimal::prelude::*;

/// Rounding: 2 decimal places, midpoint away from zero
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price per item
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per order line
pub const MAX_QUANTITY: i32 = 9999;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Line total: unit_price * quantity
pub fn line_total(unit_price: f64, quantity: i32) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Monetary totals of an order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub shipping_fee: f64,
    pub discount_amount: f64,
    /// subtotal + tax + shipping - discount
    pub total_amount: f64,
}

/// Compute order totals from (unit_price, quantity) lines.
///
/// Tax, shipping and discount are zero in this pipeline (pricing rules live
/// with the catalog collaborator); the identity
/// `total = subtotal + tax + shipping - discount` is kept explicit so the
/// columns stay meaningful.
pub fn compute_totals(lines: &[(f64, i32)]) -> OrderTotals {
    let subtotal: Decimal = lines
        .iter()
        .map(|(price, qty)| to_decimal(*price) * Decimal::from(*qty))
        .sum();

    let tax = Decimal::ZERO;
    let shipping = Decimal::ZERO;
    let discount = Decimal::ZERO;
    let total = subtotal + tax + shipping - discount;

    OrderTotals {
        subtotal: to_f64(subtotal),
        tax_amount: to_f64(tax),
        shipping_fee: to_f64(shipping),
        discount_amount: to_f64(discount),
        total_amount: to_f64(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_precision() {
        // Classic floating point problem: 0.1 + 0.2 != 0.3
        let sum = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum), 0.3);
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(10.0, 2), 20.0);
        assert_eq!(line_total(0.01, 100), 1.0);
        assert_eq!(line_total(10.99, 3), 32.97);
    }

    #[test]
    fn test_compute_totals_two_lines() {
        // (P1, qty=2, 10.00) + (P2, qty=1, 5.00) => subtotal 25.00, total 25.00
        let totals = compute_totals(&[(10.0, 2), (5.0, 1)]);
        assert_eq!(totals.subtotal, 25.0);
        assert_eq!(totals.total_amount, 25.0);
        assert_eq!(totals.tax_amount, 0.0);
        assert_eq!(totals.discount_amount, 0.0);
    }

    #[test]
    fn test_compute_totals_accumulation() {
        // 100 penny lines sum exactly to 1.00
        let lines: Vec<(f64, i32)> = (0..100).map(|_| (0.01, 1)).collect();
        let totals = compute_totals(&lines);
        assert_eq!(totals.subtotal, 1.0);
        assert_eq!(totals.total_amount, 1.0);
    }

    #[test]
    fn test_totals_identity_holds() {
        let t = compute_totals(&[(19.99, 3), (4.5, 2)]);
        let recomposed =
            to_f64(to_decimal(t.subtotal) + to_decimal(t.tax_amount) + to_decimal(t.shipping_fee)
                - to_decimal(t.discount_amount));
        assert_eq!(t.total_amount, recomposed);
    }
}
