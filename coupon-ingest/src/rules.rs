use rust_decimal::Decimal;

use common_types::DiscountKind;

/// The discount rule assigned to a confirmed coupon code.
#[derive(Debug, Clone)]
pub struct CodeRule {
    pub kind: DiscountKind,
    pub value: Decimal,
    pub min_items: i32,
    pub description: &'static str,
}

/// Known codes carry curated rules; any other confirmed code gets the
/// default 10% promotion.
pub fn rule_for_code(code: &str) -> CodeRule {
    match code {
        "BIRTHDAY" => CodeRule {
            kind: DiscountKind::FreeLowest,
            value: Decimal::ZERO,
            min_items: 0,
            description: "Birthday: free lowest item",
        },
        "BUYGETON" => CodeRule {
            kind: DiscountKind::FreeLowest,
            value: Decimal::ZERO,
            min_items: 2,
            description: "Lowest item free (buy 2+)",
        },
        "FIFTYOFF" => CodeRule {
            kind: DiscountKind::Percentage,
            value: Decimal::from(50),
            min_items: 0,
            description: "50% off entire order",
        },
        "SIXTYOFF" => CodeRule {
            kind: DiscountKind::Percentage,
            value: Decimal::from(60),
            min_items: 0,
            description: "60% off entire order",
        },
        "FREEZAAA" => CodeRule {
            kind: DiscountKind::Percentage,
            value: Decimal::from(100),
            min_items: 0,
            description: "Everything free!",
        },
        "GNULINUX" => CodeRule {
            kind: DiscountKind::Percentage,
            value: Decimal::from(15),
            min_items: 0,
            description: "Open source discount: 15% off",
        },
        "OVER9000" => CodeRule {
            kind: DiscountKind::Fixed,
            value: Decimal::from(9),
            min_items: 0,
            description: "$9 off your order",
        },
        "HAPPYHRS" => CodeRule {
            kind: DiscountKind::Percentage,
            value: Decimal::from(18),
            min_items: 0,
            description: "Happy Hours: 18% off",
        },
        _ => CodeRule {
            kind: DiscountKind::Percentage,
            value: Decimal::from(10),
            min_items: 0,
            description: "Valid promo code: 10% off",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_curated_rules() {
        let rule = rule_for_code("OVER9000");
        assert_eq!(rule.kind, DiscountKind::Fixed);
        assert_eq!(rule.value, Decimal::from(9));

        let rule = rule_for_code("BUYGETON");
        assert_eq!(rule.kind, DiscountKind::FreeLowest);
        assert_eq!(rule.min_items, 2);
    }

    #[test]
    fn unknown_codes_get_the_default_promotion() {
        let rule = rule_for_code("WXYZWXYZ");
        assert_eq!(rule.kind, DiscountKind::Percentage);
        assert_eq!(rule.value, Decimal::from(10));
        assert_eq!(rule.min_items, 0);
    }
}
