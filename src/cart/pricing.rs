//! Cart totals.
//!
//! All arithmetic happens on [`Decimal`]; money values are rounded to cents
//! (midpoint away from zero) only once, on the way out.

use std::collections::HashMap;

use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal, RoundingStrategy,
};
use serde::Serialize;
use tracing::warn;

use super::CartLine;
use crate::entities::product;

/// 8 %
pub const SALES_TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// A cart line resolved against the product's current price.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricedLine {
    pub product_id: i32,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartTotals {
    pub total_items: u64,
    /// Sum of line subtotals, before tax and discount.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sales_tax: Decimal,
    /// Discount rate in percent.
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
}

impl CartTotals {
    pub fn grand_total_f64(&self) -> f64 {
        self.grand_total.to_f64().unwrap_or_default()
    }
}

/// Resolves lines against `products`. Lines whose product is missing (deleted
/// or soft-deleted) are dropped, never reported.
pub fn price_lines(lines: &[CartLine], products: &HashMap<i32, product::Model>) -> Vec<PricedLine> {
    lines
        .iter()
        .filter_map(|line| {
            let product = products.get(&line.product_id)?;
            let Some(unit_price) = Decimal::from_f64(product.price) else {
                warn!(product_id = product.id, price = product.price, "Unrepresentable price, skipping line");
                return None;
            };

            Some(PricedLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price,
                quantity: line.quantity,
                subtotal: unit_price * Decimal::from(line.quantity),
            })
        })
        .collect()
}

pub fn compute_totals(lines: &[PricedLine], discount: f64) -> CartTotals {
    let total_items = lines.iter().map(|line| u64::from(line.quantity)).sum();
    let total_price: Decimal = lines.iter().map(|line| line.subtotal).sum();

    let discount = Decimal::from_f64(discount)
        .unwrap_or_default()
        .clamp(Decimal::ZERO, HUNDRED);

    // Each component is rounded before the next one is derived from it, so
    // the reported figures always add up to the reported grand total.
    let total_price = money(total_price);
    let sales_tax = money(total_price * SALES_TAX_RATE);
    let discount_amount = money((total_price + sales_tax) * discount / HUNDRED);
    let grand_total = total_price + sales_tax - discount_amount;

    CartTotals {
        total_items,
        total_price,
        sales_tax,
        discount,
        discount_amount,
        grand_total,
    }
}

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn product(id: i32, price: f64) -> product::Model {
        product::Model {
            id,
            name: format!("product-{id}"),
            description: String::new(),
            category: "misc".into(),
            price,
            stock: 10,
            discount: 0.0,
            tags: product::Tags::default(),
            rating_average: 0.0,
            rating_count: 0,
            is_featured: false,
            deleted: false,
        }
    }

    fn catalog(products: Vec<product::Model>) -> HashMap<i32, product::Model> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn line(product_id: i32, quantity: u32) -> CartLine {
        CartLine {
            product_id,
            quantity,
        }
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let totals = compute_totals(&[], 10.0);

        assert_eq!(totals.total_items, 0);
        assert_eq!(totals.total_price, Decimal::ZERO);
        assert_eq!(totals.sales_tax, Decimal::ZERO);
        assert_eq!(totals.discount_amount, Decimal::ZERO);
        assert_eq!(totals.grand_total, Decimal::ZERO);
    }

    #[test]
    fn totals_sum_quantities_and_subtotals() {
        let products = catalog(vec![product(1, 10.0), product(2, 5.5), product(3, 0.1)]);
        let lines = price_lines(&[line(1, 2), line(2, 1), line(3, 3)], &products);

        let totals = compute_totals(&lines, 0.0);

        assert_eq!(totals.total_items, 6);
        assert_eq!(totals.total_price, dec("25.8"));
        assert_eq!(totals.sales_tax, dec("2.06"));
        assert_eq!(totals.grand_total, dec("27.86"));
    }

    #[test]
    fn lines_without_a_product_are_excluded() {
        let products = catalog(vec![product(1, 4.0)]);
        let lines = price_lines(&[line(1, 2), line(42, 7)], &products);

        assert_eq!(lines.len(), 1);

        let totals = compute_totals(&lines, 0.0);
        assert_eq!(totals.total_items, 2);
        assert_eq!(totals.total_price, dec("8"));
    }

    #[test]
    fn discount_applies_after_tax() {
        let products = catalog(vec![product(1, 10.0), product(2, 5.5)]);
        let lines = price_lines(&[line(1, 2), line(2, 1)], &products);

        let totals = compute_totals(&lines, 10.0);

        // 25.50 + 2.04 tax = 27.54, minus 10 % (2.75) = 24.79
        assert_eq!(totals.total_price, dec("25.5"));
        assert_eq!(totals.sales_tax, dec("2.04"));
        assert_eq!(totals.discount, dec("10"));
        assert_eq!(totals.discount_amount, dec("2.75"));
        assert_eq!(totals.grand_total, dec("24.79"));
    }

    #[test]
    fn reported_components_add_up_to_grand_total() {
        let products = catalog(vec![product(1, 0.19)]);
        let lines = price_lines(&[line(1, 1)], &products);

        let totals = compute_totals(&lines, 50.0);

        assert_eq!(totals.sales_tax, dec("0.02"));
        assert_eq!(totals.discount_amount, dec("0.11"));
        assert_eq!(totals.grand_total, dec("0.10"));
        assert_eq!(
            totals.total_price + totals.sales_tax - totals.discount_amount,
            totals.grand_total
        );
    }

    #[test]
    fn out_of_range_discount_is_clamped() {
        let products = catalog(vec![product(1, 10.0)]);
        let lines = price_lines(&[line(1, 1)], &products);

        assert_eq!(compute_totals(&lines, 250.0).grand_total, Decimal::ZERO);
        assert_eq!(compute_totals(&lines, -5.0).grand_total, dec("10.8"));
    }

    #[test]
    fn subtotal_is_quantity_times_price() {
        let products = catalog(vec![product(9, 19.99)]);
        let lines = price_lines(&[line(9, 3)], &products);

        assert_eq!(lines[0].unit_price, dec("19.99"));
        assert_eq!(lines[0].subtotal, dec("59.97"));
    }
}
