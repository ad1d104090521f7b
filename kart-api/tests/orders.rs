//! End-to-end order placement scenarios against in-memory stores.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use common_types::DiscountKind;
use kart_api::pricing::{OrderService, PlaceOrderRequest, PricingError, RequestedItem};
use kart_api::test_utils::{
    product, rule, FixedClock, MemoryCouponStore, MemoryOrderStore, MemoryProductStore,
};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn catalog() -> MemoryProductStore {
    MemoryProductStore::new(vec![
        product("1", "Waffle with Berries", "6.50"),
        product("3", "Macaron Mix of Five", "8.00"),
        product("5", "Pistachio Baklava", "4.00"),
    ])
}

fn items(entries: &[(&str, i32)]) -> Vec<RequestedItem> {
    entries
        .iter()
        .map(|(id, quantity)| RequestedItem {
            product_id: id.to_string(),
            quantity: *quantity,
        })
        .collect()
}

fn service(coupons: Arc<MemoryCouponStore>, orders: Arc<MemoryOrderStore>) -> OrderService {
    OrderService::new(Arc::new(catalog()), coupons, orders)
}

#[tokio::test]
async fn single_item_no_coupon() {
    let orders = Arc::new(MemoryOrderStore::default());
    let service = service(Arc::new(MemoryCouponStore::default()), orders.clone());

    let placed = service
        .place_order(PlaceOrderRequest {
            items: items(&[("1", 1)]),
            coupon_code: String::new(),
        })
        .await
        .unwrap();

    assert_eq!(placed.order.total, dec("6.50"));
    assert_eq!(placed.order.discounts, dec("0.00"));
    assert_eq!(placed.products.len(), 1);
    assert_eq!(orders.created().len(), 1);
}

#[tokio::test]
async fn happyhours_takes_18_percent() {
    let coupons = Arc::new(MemoryCouponStore::new(vec![rule(
        "HAPPYHOURS",
        DiscountKind::Percentage,
        "18",
    )]));
    let service = service(coupons.clone(), Arc::new(MemoryOrderStore::default()));

    let placed = service
        .place_order(PlaceOrderRequest {
            items: items(&[("3", 1)]),
            coupon_code: "HAPPYHOURS".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(placed.order.discounts, dec("1.44"));
    assert_eq!(placed.order.total, dec("6.56"));
    assert_eq!(coupons.uses("HAPPYHOURS"), 1);
}

#[tokio::test]
async fn coupon_codes_match_case_insensitively() {
    let coupons = Arc::new(MemoryCouponStore::new(vec![rule(
        "HAPPYHOURS",
        DiscountKind::Percentage,
        "18",
    )]));
    let service = service(coupons, Arc::new(MemoryOrderStore::default()));

    let placed = service
        .place_order(PlaceOrderRequest {
            items: items(&[("3", 1)]),
            coupon_code: "happyhours".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(placed.order.discounts, dec("1.44"));
}

#[tokio::test]
async fn buygetone_frees_the_lowest_item() {
    let mut bogo = rule("BUYGETONE", DiscountKind::FreeLowest, "0");
    bogo.min_items = 2;
    let coupons = Arc::new(MemoryCouponStore::new(vec![bogo]));
    let service = service(coupons, Arc::new(MemoryOrderStore::default()));

    let placed = service
        .place_order(PlaceOrderRequest {
            items: items(&[("1", 1), ("5", 1)]),
            coupon_code: "BUYGETONE".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(placed.order.discounts, dec("4.00"));
    assert_eq!(placed.order.total, dec("6.50"));
}

#[tokio::test]
async fn buygetone_rejects_a_single_item() {
    let mut bogo = rule("BUYGETONE", DiscountKind::FreeLowest, "0");
    bogo.min_items = 2;
    let coupons = Arc::new(MemoryCouponStore::new(vec![bogo]));
    let service = service(coupons.clone(), Arc::new(MemoryOrderStore::default()));

    let result = service
        .place_order(PlaceOrderRequest {
            items: items(&[("1", 1)]),
            coupon_code: "BUYGETONE".to_string(),
        })
        .await;

    assert!(matches!(result, Err(PricingError::InvalidCoupon)));
    // A rejected coupon must not consume a use.
    assert_eq!(coupons.uses("BUYGETONE"), 0);
}

#[tokio::test]
async fn unknown_coupon_is_invalid() {
    let service = service(
        Arc::new(MemoryCouponStore::default()),
        Arc::new(MemoryOrderStore::default()),
    );

    let result = service
        .place_order(PlaceOrderRequest {
            items: items(&[("1", 1)]),
            coupon_code: "NONEXISTENT".to_string(),
        })
        .await;

    assert!(matches!(result, Err(PricingError::InvalidCoupon)));
}

#[tokio::test]
async fn fixed_discount_floors_total_at_zero() {
    let coupons = Arc::new(MemoryCouponStore::new(vec![rule(
        "OVER9000",
        DiscountKind::Fixed,
        "9",
    )]));
    let service = service(coupons, Arc::new(MemoryOrderStore::default()));

    let placed = service
        .place_order(PlaceOrderRequest {
            items: items(&[("5", 1)]),
            coupon_code: "OVER9000".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(placed.order.discounts, dec("4.00"));
    assert_eq!(placed.order.total, dec("0.00"));
}

#[tokio::test]
async fn empty_items_are_rejected() {
    let service = service(
        Arc::new(MemoryCouponStore::default()),
        Arc::new(MemoryOrderStore::default()),
    );

    let result = service
        .place_order(PlaceOrderRequest {
            items: vec![],
            coupon_code: String::new(),
        })
        .await;

    assert!(matches!(result, Err(PricingError::EmptyItems)));
}

#[tokio::test]
async fn non_positive_quantity_is_rejected() {
    let service = service(
        Arc::new(MemoryCouponStore::default()),
        Arc::new(MemoryOrderStore::default()),
    );

    let result = service
        .place_order(PlaceOrderRequest {
            items: items(&[("1", 0)]),
            coupon_code: String::new(),
        })
        .await;

    match result {
        Err(PricingError::InvalidQuantity(id)) => assert_eq!(id, "1"),
        other => panic!("expected InvalidQuantity, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let service = service(
        Arc::new(MemoryCouponStore::default()),
        Arc::new(MemoryOrderStore::default()),
    );

    let result = service
        .place_order(PlaceOrderRequest {
            items: items(&[("1", 1), ("404", 1)]),
            coupon_code: String::new(),
        })
        .await;

    match result {
        Err(PricingError::ProductNotFound(id)) => assert_eq!(id, "404"),
        other => panic!("expected ProductNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn duplicate_cart_lines_each_appear_in_the_response() {
    let orders = Arc::new(MemoryOrderStore::default());
    let service = service(Arc::new(MemoryCouponStore::default()), orders.clone());

    let placed = service
        .place_order(PlaceOrderRequest {
            items: items(&[("1", 1), ("1", 2)]),
            coupon_code: String::new(),
        })
        .await
        .unwrap();

    assert_eq!(placed.products.len(), 2);
    assert_eq!(placed.order.total, dec("19.50"));
    assert_eq!(placed.order.items.len(), 2);
}

#[tokio::test]
async fn whitespace_code_is_a_literal_lookup() {
    let service = service(
        Arc::new(MemoryCouponStore::new(vec![rule(
            "HAPPYHOURS",
            DiscountKind::Percentage,
            "18",
        )])),
        Arc::new(MemoryOrderStore::default()),
    );

    let result = service
        .place_order(PlaceOrderRequest {
            items: items(&[("3", 1)]),
            coupon_code: " HAPPYHOURS ".to_string(),
        })
        .await;

    assert!(matches!(result, Err(PricingError::InvalidCoupon)));
}

#[tokio::test]
async fn usage_limit_fails_the_next_attempt() {
    let mut limited = rule("LIMITED", DiscountKind::Percentage, "10");
    limited.max_uses = 2;
    let coupons = Arc::new(MemoryCouponStore::new(vec![limited]));
    let service = service(coupons.clone(), Arc::new(MemoryOrderStore::default()));

    for _ in 0..2 {
        service
            .place_order(PlaceOrderRequest {
                items: items(&[("1", 1)]),
                coupon_code: "LIMITED".to_string(),
            })
            .await
            .unwrap();
    }
    assert_eq!(coupons.uses("LIMITED"), 2);

    let result = service
        .place_order(PlaceOrderRequest {
            items: items(&[("1", 1)]),
            coupon_code: "LIMITED".to_string(),
        })
        .await;

    assert!(matches!(result, Err(PricingError::CouponUsageLimitReached)));
}

#[tokio::test]
async fn temporal_gates_use_the_injected_clock() {
    let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();

    let mut expired = rule("OLD", DiscountKind::Percentage, "10");
    expired.valid_until = Some(now - Duration::days(1));

    let mut upcoming = rule("SOON", DiscountKind::Percentage, "10");
    upcoming.valid_from = Some(now + Duration::days(1));

    let mut window = rule("WINDOW", DiscountKind::Percentage, "10");
    window.valid_from = Some(now - Duration::days(1));
    window.valid_until = Some(now + Duration::days(1));

    let coupons = Arc::new(MemoryCouponStore::new(vec![expired, upcoming, window]));
    let service = OrderService::with_clock(
        Arc::new(catalog()),
        coupons,
        Arc::new(MemoryOrderStore::default()),
        Arc::new(FixedClock(now)),
    );

    for code in ["OLD", "SOON"] {
        let result = service
            .place_order(PlaceOrderRequest {
                items: items(&[("1", 1)]),
                coupon_code: code.to_string(),
            })
            .await;
        assert!(
            matches!(result, Err(PricingError::CouponExpired)),
            "code {code} should be outside its window"
        );
    }

    service
        .place_order(PlaceOrderRequest {
            items: items(&[("1", 1)]),
            coupon_code: "WINDOW".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn totals_reconcile_with_the_subtotal() {
    let coupons = Arc::new(MemoryCouponStore::new(vec![rule(
        "FIFTYOFF",
        DiscountKind::Percentage,
        "50",
    )]));
    let service = service(coupons, Arc::new(MemoryOrderStore::default()));

    let placed = service
        .place_order(PlaceOrderRequest {
            items: items(&[("1", 2), ("5", 3)]),
            coupon_code: "FIFTYOFF".to_string(),
        })
        .await
        .unwrap();

    let subtotal = dec("25.00");
    assert!(placed.order.total >= Decimal::ZERO);
    assert!(placed.order.total <= subtotal);
    assert_eq!(placed.order.total + placed.order.discounts, subtotal);
}
