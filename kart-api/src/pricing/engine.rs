use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use common_types::{CartItem, Discount, Order, OrderItem, Product};

use crate::store::{CouponStore, OrderStore, ProductStore, StoreError};

use super::discount::{round2, subtotal};
use super::{discount, Clock, PricingError, SystemClock};

/// A requested line item, as received from the client.
#[derive(Debug, Clone)]
pub struct RequestedItem {
    pub product_id: String,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct PlaceOrderRequest {
    pub items: Vec<RequestedItem>,
    /// Empty string means no coupon. The code is matched as-is, untrimmed.
    pub coupon_code: String,
}

/// The outcome of a successfully placed order. `products` carries one entry
/// per request line item, in request order (duplicates appear once per
/// occurrence).
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub products: Vec<Product>,
}

/// Order placement business logic: validation, batch product fetch, subtotal,
/// coupon evaluation, and persistence.
pub struct OrderService {
    products: Arc<dyn ProductStore + Send + Sync>,
    coupons: Arc<dyn CouponStore + Send + Sync>,
    orders: Arc<dyn OrderStore + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(
        products: Arc<dyn ProductStore + Send + Sync>,
        coupons: Arc<dyn CouponStore + Send + Sync>,
        orders: Arc<dyn OrderStore + Send + Sync>,
    ) -> Self {
        Self::with_clock(products, coupons, orders, Arc::new(SystemClock))
    }

    pub fn with_clock(
        products: Arc<dyn ProductStore + Send + Sync>,
        coupons: Arc<dyn CouponStore + Send + Sync>,
        orders: Arc<dyn OrderStore + Send + Sync>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            products,
            coupons,
            orders,
            clock,
        }
    }

    #[instrument(skip_all, fields(items = request.items.len()))]
    pub async fn place_order(
        &self,
        request: PlaceOrderRequest,
    ) -> Result<PlacedOrder, PricingError> {
        if request.items.is_empty() {
            return Err(PricingError::EmptyItems);
        }

        let mut ids = Vec::with_capacity(request.items.len());
        for item in &request.items {
            if item.quantity <= 0 {
                return Err(PricingError::InvalidQuantity(item.product_id.clone()));
            }
            ids.push(item.product_id.clone());
        }

        // One query for the whole cart; absent rows surface as missing IDs.
        let fetched = self.products.get_by_ids(&ids).await?;
        let by_id: HashMap<&str, &Product> =
            fetched.iter().map(|p| (p.id.as_str(), p)).collect();

        let mut products = Vec::with_capacity(request.items.len());
        let mut cart = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = by_id
                .get(item.product_id.as_str())
                .ok_or_else(|| PricingError::ProductNotFound(item.product_id.clone()))?;

            products.push((*product).clone());
            cart.push(CartItem {
                product_id: item.product_id.clone(),
                unit_price: product.price,
                quantity: item.quantity,
            });
        }

        let subtotal = subtotal(&cart);

        let mut discount_amount = Decimal::ZERO;
        if !request.coupon_code.is_empty() {
            let discount = self.evaluate_coupon(&request.coupon_code, &cart).await?;
            discount_amount = discount.amount;
        }

        let total = round2(discount::floor_at_zero(subtotal - discount_amount));
        let discount_amount = round2(discount_amount);

        let order = Order {
            id: Uuid::new_v4(),
            items: request
                .items
                .iter()
                .map(|item| OrderItem {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                })
                .collect(),
            total,
            discounts: discount_amount,
            coupon_code: request.coupon_code,
            created_at: self.clock.now(),
        };
        self.orders.create(&order).await?;

        info!(order_id = %order.id, total = %order.total, discounts = %order.discounts, "order placed");

        Ok(PlacedOrder { order, products })
    }

    /// Looks up the rule, checks the temporal, usage, and min-items gates,
    /// computes the discount, and finally increments the usage counter.
    async fn evaluate_coupon(
        &self,
        code: &str,
        items: &[CartItem],
    ) -> Result<Discount, PricingError> {
        let rule = match self.coupons.find_by_code(code).await {
            Ok(rule) => rule,
            Err(StoreError::CouponNotFound) => return Err(PricingError::InvalidCoupon),
            Err(err) => return Err(err.into()),
        };

        let now = self.clock.now();
        if let Some(valid_from) = rule.valid_from {
            if now < valid_from {
                return Err(PricingError::CouponExpired);
            }
        }
        if let Some(valid_until) = rule.valid_until {
            if now > valid_until {
                return Err(PricingError::CouponExpired);
            }
        }

        if rule.max_uses > 0 && rule.uses >= rule.max_uses {
            return Err(PricingError::CouponUsageLimitReached);
        }

        let discount = discount::apply(&rule, items)?;

        // Counter bump lives in the store as a single atomic UPDATE; a
        // failure here is a server error, not a client error.
        self.coupons.increment_uses(&rule.code).await?;

        Ok(discount)
    }
}
