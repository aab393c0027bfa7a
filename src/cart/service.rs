use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::{info, warn};

use super::{compute_totals, positive_quantity, price_lines, Cart, CartTotals, PricedLine};
use crate::error::ApiError;
use crate::store::{
    CartStore, CouponStore, NewOrder, NewOrderPart, OrderStore, OrderView, ProductStore,
    StoreError,
};

/// What the cart endpoints return: the priced lines plus totals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartView {
    pub user_id: i32,
    pub discount: f64,
    pub lines: Vec<PricedLine>,
    pub totals: CartTotals,
}

#[derive(Clone)]
pub struct CartService {
    products: Arc<dyn ProductStore>,
    carts: Arc<dyn CartStore>,
    coupons: Arc<dyn CouponStore>,
    orders: Arc<dyn OrderStore>,
    write_attempts: u32,
}

impl CartService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        carts: Arc<dyn CartStore>,
        coupons: Arc<dyn CouponStore>,
        orders: Arc<dyn OrderStore>,
        write_attempts: u32,
    ) -> Self {
        Self {
            products,
            carts,
            coupons,
            orders,
            write_attempts: write_attempts.max(1),
        }
    }

    pub async fn get_cart(&self, user_id: i32) -> Result<CartView, ApiError> {
        let cart = self.existing_cart(user_id).await?;
        self.view(&cart).await
    }

    pub async fn totals(&self, user_id: i32) -> Result<CartTotals, ApiError> {
        Ok(self.get_cart(user_id).await?.totals)
    }

    pub async fn add_item(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i64,
    ) -> Result<CartView, ApiError> {
        let quantity = positive_quantity(quantity)?;

        if self.products.find_active(product_id).await?.is_none() {
            return Err(ApiError::NotFound(format!(
                "No product with {product_id} id was found"
            )));
        }

        let cart = self
            .mutate(user_id, true, |cart| cart.add(product_id, quantity))
            .await?;

        info!(user_id, product_id, quantity, "Added product to cart");
        self.view(&cart).await
    }

    pub async fn remove_item(&self, user_id: i32, product_id: i32) -> Result<CartView, ApiError> {
        let cart = self
            .mutate(user_id, false, |cart| cart.remove(product_id).map(|_| ()))
            .await?;

        info!(user_id, product_id, "Removed product from cart");
        self.view(&cart).await
    }

    pub async fn update_quantity(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i64,
    ) -> Result<CartView, ApiError> {
        let quantity = positive_quantity(quantity)?;

        let cart = self
            .mutate(user_id, false, |cart| cart.set_quantity(product_id, quantity))
            .await?;

        info!(user_id, product_id, quantity, "Updated cart quantity");
        self.view(&cart).await
    }

    pub async fn clear(&self, user_id: i32) -> Result<(), ApiError> {
        if !self.carts.delete_by_user(user_id).await? {
            return Err(cart_not_found());
        }

        info!(user_id, "Cleared cart");
        Ok(())
    }

    pub async fn apply_coupon(&self, user_id: i32, code: &str) -> Result<CartView, ApiError> {
        let coupon = self
            .coupons
            .find_by_code(code)
            .await?
            .filter(|coupon| coupon.is_usable_at(Utc::now()))
            .ok_or_else(|| ApiError::InvalidArgument("Invalid or expired coupon code".into()))?;

        let cart = self
            .mutate(user_id, false, |cart| {
                cart.discount = coupon.discount;
                Ok(())
            })
            .await?;

        info!(user_id, code, discount = coupon.discount, "Applied coupon");
        self.view(&cart).await
    }

    /// Turns the cart into an order. Lines whose product disappeared are
    /// dropped; a cart with nothing left to buy is rejected.
    pub async fn checkout(&self, user_id: i32) -> Result<OrderView, ApiError> {
        let cart = self.existing_cart(user_id).await?;
        let view = self.view(&cart).await?;

        if view.lines.is_empty() {
            return Err(ApiError::InvalidArgument(
                "Cart has no purchasable items".into(),
            ));
        }

        let order = NewOrder {
            user_id,
            cart_version: cart.version,
            discount: cart.discount,
            total: view.totals.grand_total_f64(),
            parts: view
                .lines
                .iter()
                .map(|line| NewOrderPart {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price.to_f64().unwrap_or_default(),
                })
                .collect(),
        };

        let placed = self.orders.place_order(order).await?;

        info!(user_id, order_id = placed.order.id, total = placed.order.total, "Checked out cart");
        Ok(placed)
    }

    async fn existing_cart(&self, user_id: i32) -> Result<Cart, ApiError> {
        self.carts
            .find_by_user(user_id)
            .await?
            .ok_or_else(cart_not_found)
    }

    /// Read-modify-write with optimistic concurrency. On a version conflict
    /// the cart is re-read and `apply` runs again, up to `write_attempts`
    /// times. Errors from `apply` abort without writing.
    async fn mutate<F>(&self, user_id: i32, create: bool, mut apply: F) -> Result<Cart, ApiError>
    where
        F: FnMut(&mut Cart) -> Result<(), ApiError> + Send,
    {
        for attempt in 1..=self.write_attempts {
            let mut cart = match self.carts.find_by_user(user_id).await? {
                Some(cart) => cart,
                None if create => Cart::new(user_id),
                None => return Err(cart_not_found()),
            };

            apply(&mut cart)?;

            match self.carts.save(&cart).await {
                Ok(saved) => return Ok(saved),
                Err(StoreError::VersionConflict) => {
                    warn!(user_id, attempt, "Cart changed concurrently, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(StoreError::VersionConflict.into())
    }

    async fn view(&self, cart: &Cart) -> Result<CartView, ApiError> {
        let ids: Vec<i32> = cart.lines.iter().map(|line| line.product_id).collect();
        let products: HashMap<_, _> = self
            .products
            .find_active_many(&ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        let lines = price_lines(&cart.lines, &products);
        let totals = compute_totals(&lines, cart.discount);

        Ok(CartView {
            user_id: cart.user_id,
            discount: cart.discount,
            lines,
            totals,
        })
    }
}

fn cart_not_found() -> ApiError {
    ApiError::NotFound("Cart not found".into())
}
