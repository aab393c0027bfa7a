pub mod pricing;
pub mod service;

use serde::Serialize;

use crate::error::ApiError;

pub use pricing::{compute_totals, price_lines, CartTotals, PricedLine, SALES_TAX_RATE};
pub use service::{CartService, CartView};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartLine {
    pub product_id: i32,
    pub quantity: u32,
}

/// A user's cart as loaded from (or about to be written to) the store.
///
/// `version` is 0 until the cart has been persisted once; every successful
/// save bumps it, and a save is only accepted against the version it was
/// read at.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cart {
    pub user_id: i32,
    pub lines: Vec<CartLine>,
    pub discount: f64,
    #[serde(skip)]
    pub version: i32,
}

impl Cart {
    pub fn new(user_id: i32) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
            discount: 0.0,
            version: 0,
        }
    }

    pub fn line(&self, product_id: i32) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    /// Increments an existing line or appends a new one at the end. A merged
    /// quantity that would overflow is rejected and the line left as it was.
    pub fn add(&mut self, product_id: i32, quantity: u32) -> Result<(), ApiError> {
        match self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            Some(line) => {
                line.quantity = line.quantity.checked_add(quantity).ok_or_else(|| {
                    ApiError::InvalidArgument(format!(
                        "Quantity for product {product_id} is too large"
                    ))
                })?;
            }
            None => self.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
        Ok(())
    }

    pub fn remove(&mut self, product_id: i32) -> Result<CartLine, ApiError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.product_id == product_id)
            .ok_or_else(|| line_not_found(product_id))?;

        Ok(self.lines.remove(index))
    }

    pub fn set_quantity(&mut self, product_id: i32, quantity: u32) -> Result<(), ApiError> {
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or_else(|| line_not_found(product_id))?;

        line.quantity = quantity;
        Ok(())
    }
}

/// Quantities arrive signed so that zero and negatives can be rejected with a
/// proper message instead of a deserialization failure.
pub fn positive_quantity(quantity: i64) -> Result<u32, ApiError> {
    if quantity <= 0 {
        return Err(ApiError::InvalidArgument(
            "Quantity should be greater than 0".into(),
        ));
    }

    u32::try_from(quantity)
        .map_err(|_| ApiError::InvalidArgument(format!("Quantity {quantity} is too large")))
}

fn line_not_found(product_id: i32) -> ApiError {
    ApiError::NotFound(format!("Product {product_id} not found in cart"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_same_product_twice_merges_lines() {
        let mut cart = Cart::new(1);
        cart.add(7, 2).unwrap();
        cart.add(7, 3).unwrap();

        assert_eq!(
            cart.lines,
            vec![CartLine {
                product_id: 7,
                quantity: 5
            }]
        );
    }

    #[test]
    fn merged_quantity_overflow_is_rejected() {
        let mut cart = Cart::new(1);
        cart.add(7, u32::MAX - 1).unwrap();
        let before = cart.clone();

        let result = cart.add(7, 2);

        assert!(matches!(result, Err(ApiError::InvalidArgument(_))));
        assert_eq!(cart, before);
    }

    #[test]
    fn new_products_are_appended_in_order() {
        let mut cart = Cart::new(1);
        cart.add(3, 1).unwrap();
        cart.add(1, 1).unwrap();
        cart.add(3, 1).unwrap();

        let ids: Vec<i32> = cart.lines.iter().map(|line| line.product_id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn removing_missing_line_leaves_cart_untouched() {
        let mut cart = Cart::new(1);
        cart.add(3, 4).unwrap();
        let before = cart.clone();

        let result = cart.remove(99);

        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(cart, before);
    }

    #[test]
    fn set_quantity_replaces_outright() {
        let mut cart = Cart::new(1);
        cart.add(3, 4).unwrap();

        cart.set_quantity(3, 1).unwrap();

        assert_eq!(cart.line(3).map(|line| line.quantity), Some(1));
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        assert!(matches!(
            positive_quantity(0),
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(matches!(
            positive_quantity(-4),
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(matches!(
            positive_quantity(i64::from(u32::MAX) + 1),
            Err(ApiError::InvalidArgument(_))
        ));
        assert_eq!(positive_quantity(12), Ok(12));
    }
}
