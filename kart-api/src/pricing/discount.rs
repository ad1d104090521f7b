//! Discount calculation for the supported coupon kinds.
//!
//! All arithmetic is exact decimal; rounding to 2 decimal places happens
//! once, half-away-from-zero, after the max-discount clamp and the floor
//! at zero.

use rust_decimal::{Decimal, RoundingStrategy};

use common_types::{CartItem, CouponRule, Discount, DiscountKind};

use super::PricingError;

/// Calculates the discount for the given rule and cart items. Fails with
/// `InvalidCoupon` when the cart does not satisfy the rule's minimum item
/// count.
pub fn apply(rule: &CouponRule, items: &[CartItem]) -> Result<Discount, PricingError> {
    if rule.min_items > 0 && total_quantity(items) < rule.min_items {
        return Err(PricingError::InvalidCoupon);
    }

    let amount = match rule.kind {
        DiscountKind::Percentage => subtotal(items) * rule.value / Decimal::ONE_HUNDRED,
        DiscountKind::Fixed => rule.value.min(subtotal(items)),
        // Unit price, not line total: the cheapest single item is free.
        DiscountKind::FreeLowest => lowest_unit_price(items),
    };

    let amount = if rule.max_discount > Decimal::ZERO {
        amount.min(rule.max_discount)
    } else {
        amount
    };

    Ok(Discount {
        amount: round2(floor_at_zero(amount)),
        description: rule.description.clone(),
    })
}

/// Sum of `unit_price * quantity` across all items, exact decimal.
pub fn subtotal(items: &[CartItem]) -> Decimal {
    items
        .iter()
        .map(|item| item.unit_price * Decimal::from(item.quantity))
        .sum()
}

fn total_quantity(items: &[CartItem]) -> i32 {
    items.iter().map(|item| item.quantity).sum()
}

/// Lowest unit price among the items; zero for an empty cart.
fn lowest_unit_price(items: &[CartItem]) -> Decimal {
    items
        .iter()
        .map(|item| item.unit_price)
        .min()
        .unwrap_or(Decimal::ZERO)
}

/// Clamps negative values to zero.
pub fn floor_at_zero(amount: Decimal) -> Decimal {
    if amount.is_sign_negative() {
        Decimal::ZERO
    } else {
        amount
    }
}

/// Rounds to 2 decimal places, ties away from zero.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: &str, unit_price: &str, quantity: i32) -> CartItem {
        CartItem {
            product_id: product_id.to_string(),
            unit_price: unit_price.parse().unwrap(),
            quantity,
        }
    }

    fn rule(kind: DiscountKind, value: &str) -> CouponRule {
        CouponRule {
            code: "TESTCODE".to_string(),
            kind,
            value: value.parse().unwrap(),
            min_items: 0,
            description: "test rule".to_string(),
            valid_from: None,
            valid_until: None,
            max_uses: 0,
            uses: 0,
            max_discount: Decimal::ZERO,
        }
    }

    #[test]
    fn percentage_is_exact_share_of_subtotal() {
        let items = vec![item("3", "8.00", 1)];
        let discount = apply(&rule(DiscountKind::Percentage, "18"), &items).unwrap();
        assert_eq!(discount.amount, "1.44".parse::<Decimal>().unwrap());
    }

    #[test]
    fn percentage_rounds_half_away_from_zero() {
        // 12.5% of 5.00 = 0.625, which must round up to 0.63, not to the
        // even neighbor 0.62.
        let items = vec![item("1", "5.00", 1)];
        let discount = apply(&rule(DiscountKind::Percentage, "12.5"), &items).unwrap();
        assert_eq!(discount.amount, "0.63".parse::<Decimal>().unwrap());
    }

    #[test]
    fn fixed_is_capped_at_subtotal() {
        let items = vec![item("5", "4.00", 1)];
        let discount = apply(&rule(DiscountKind::Fixed, "9"), &items).unwrap();
        assert_eq!(discount.amount, "4.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn fixed_below_subtotal_applies_in_full() {
        let items = vec![item("1", "6.50", 2)];
        let discount = apply(&rule(DiscountKind::Fixed, "9"), &items).unwrap();
        assert_eq!(discount.amount, "9.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn free_lowest_uses_unit_price_not_line_total() {
        // The cheapest unit is 4.00 even though its line total is 12.00.
        let items = vec![item("1", "6.50", 1), item("5", "4.00", 3)];
        let discount = apply(&rule(DiscountKind::FreeLowest, "0"), &items).unwrap();
        assert_eq!(discount.amount, "4.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn free_lowest_on_empty_cart_is_zero() {
        let discount = apply(&rule(DiscountKind::FreeLowest, "0"), &[]).unwrap();
        assert_eq!(discount.amount, Decimal::ZERO);
    }

    #[test]
    fn min_items_counts_quantities_not_lines() {
        let mut gated = rule(DiscountKind::FreeLowest, "0");
        gated.min_items = 2;

        // One line, quantity 2: eligible.
        let items = vec![item("1", "6.50", 2)];
        assert!(apply(&gated, &items).is_ok());

        // One line, quantity 1: rejected.
        let items = vec![item("1", "6.50", 1)];
        assert!(matches!(
            apply(&gated, &items),
            Err(PricingError::InvalidCoupon)
        ));
    }

    #[test]
    fn max_discount_clamps_before_rounding() {
        let mut capped = rule(DiscountKind::Percentage, "50");
        capped.max_discount = "2.50".parse().unwrap();

        let items = vec![item("3", "8.00", 1)];
        let discount = apply(&capped, &items).unwrap();
        assert_eq!(discount.amount, "2.50".parse::<Decimal>().unwrap());
    }

    #[test]
    fn discount_is_never_negative() {
        let items = vec![item("1", "6.50", 1)];
        let discount = apply(&rule(DiscountKind::Percentage, "0"), &items).unwrap();
        assert!(discount.amount >= Decimal::ZERO);
    }

    #[test]
    fn percentage_full_value_matches_subtotal() {
        let items = vec![item("1", "6.50", 1), item("5", "4.00", 2)];
        let discount = apply(&rule(DiscountKind::Percentage, "100"), &items).unwrap();
        assert_eq!(discount.amount, subtotal(&items));
    }

    #[test]
    fn subtotal_multiplies_by_quantity() {
        let items = vec![item("1", "6.50", 2), item("5", "4.00", 1)];
        assert_eq!(subtotal(&items), "17.00".parse::<Decimal>().unwrap());
    }
}
