//! Integration tests for promotion pricing, cart totals and coupons.
//!
//! Run with: cargo test -p dealshop-integration-tests --test carts

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use chrono::{Duration, Utc};

use axum::http::StatusCode;
use dealshop_core::{Price, check_empty};
use dealshop_integration_tests::{TestApp, fixtures};
use dealshop_storefront::db::{CartRepository, CouponRepository, NewCoupon};

fn today() -> chrono::NaiveDate {
    Utc::now().date_naive()
}

// ============================================================================
// Promotion Pricing
// ============================================================================

#[tokio::test]
async fn test_price_without_promotion() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let shop = fixtures::shop(&app.store, &user).await;
    let product = fixtures::product_without_promotion(&app.store, &shop).await;

    assert!(!product.is_promotion_active(today()));
    assert_eq!(product.effective_unit_price(today()), Price::new(5000));
    assert!(product.promotional_price.is_zero());
}

#[tokio::test]
async fn test_price_with_active_promotion() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let shop = fixtures::shop(&app.store, &user).await;
    let product = fixtures::product_with_active_promotion(&app.store, &shop).await;

    assert!(product.is_promotion_active(today()));
    assert_eq!(product.effective_unit_price(today()), Price::new(4500));
    assert_eq!(product.base_price, Price::new(6000));
}

#[tokio::test]
async fn test_price_with_expired_promotion() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let shop = fixtures::shop(&app.store, &user).await;
    let product = fixtures::product_with_expired_promotion(&app.store, &shop).await;

    assert!(!product.is_promotion_active(today()));
    assert_eq!(product.effective_unit_price(today()), Price::new(4000));
    assert_eq!(product.promotional_price, Price::new(3000));
}

// ============================================================================
// Cart Totals
// ============================================================================

#[tokio::test]
async fn test_empty_cart() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let customer = fixtures::customer(&app.store, &user).await;
    let cart = fixtures::cart(&app.store, &customer).await;

    assert!(cart.active);
    assert_eq!(cart.customer_id, customer.id);
    assert_eq!(cart.total(today()), Price::ZERO);
    assert!(!check_empty(&cart));
}

#[tokio::test]
async fn test_cart_line_totals() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let shop = fixtures::shop(&app.store, &user).await;
    let plain = fixtures::product_without_promotion(&app.store, &shop).await;
    let promo = fixtures::product_with_active_promotion(&app.store, &shop).await;
    let expired = fixtures::product_with_expired_promotion(&app.store, &shop).await;
    let customer = fixtures::customer(&app.store, &user).await;
    let cart = fixtures::cart(&app.store, &customer).await;

    app.store.add_line(cart.id, plain.id, 2).await.unwrap();
    app.store.add_line(cart.id, promo.id, 3).await.unwrap();
    app.store.add_line(cart.id, expired.id, 5).await.unwrap();
    let cart = app.store.get_cart(cart.id).await.unwrap().unwrap();

    let totals: Vec<Price> = cart.lines.iter().map(|l| l.total(today())).collect();
    assert!(totals.contains(&Price::new(10_000))); // 5000 * 2
    assert!(totals.contains(&Price::new(13_500))); // 4500 * 3
    assert!(totals.contains(&Price::new(20_000))); // 4000 * 5
    assert_eq!(cart.total(today()), Price::new(43_500));
    assert!(check_empty(&cart));
}

#[tokio::test]
async fn test_cart_total_multiple_products() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let shop = fixtures::shop(&app.store, &user).await;
    let plain = fixtures::product_without_promotion(&app.store, &shop).await;
    let promo = fixtures::product_with_active_promotion(&app.store, &shop).await;
    let customer = fixtures::customer(&app.store, &user).await;
    let cart = fixtures::cart(&app.store, &customer).await;

    app.store.add_line(cart.id, plain.id, 1).await.unwrap();
    app.store.add_line(cart.id, promo.id, 1).await.unwrap();
    let cart = app.store.get_cart(cart.id).await.unwrap().unwrap();

    assert_eq!(cart.total(today()), Price::new(9500));
    assert_eq!(cart.total_with_coupon(today()), Price::new(9500));
}

#[tokio::test]
async fn test_cart_total_with_15_percent_coupon() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let shop = fixtures::shop(&app.store, &user).await;
    let product = fixtures::product_without_promotion(&app.store, &shop).await;
    let coupon = fixtures::coupon(&app.store, &product).await;
    let customer = fixtures::customer(&app.store, &user).await;
    let cart = fixtures::cart(&app.store, &customer).await;
    fixtures::cart_line(&app.store, &cart, &product).await;

    app.store
        .set_cart_coupon(cart.id, Some(coupon.id))
        .await
        .unwrap();
    let cart = app.store.get_cart(cart.id).await.unwrap().unwrap();

    assert_eq!(cart.total(today()), Price::new(10_000));
    assert_eq!(cart.total_with_coupon(today()), Price::new(8500));
}

// ============================================================================
// Coupons
// ============================================================================

#[tokio::test]
async fn test_coupon_lookup_and_eligible_products() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let shop = fixtures::shop(&app.store, &user).await;
    let plain = fixtures::product_without_promotion(&app.store, &shop).await;
    let promo = fixtures::product_with_active_promotion(&app.store, &shop).await;
    let coupon = fixtures::coupon(&app.store, &plain).await;

    let found = app
        .store
        .find_coupon_by_code(fixtures::COUPON_CODE)
        .await
        .unwrap()
        .expect("coupon exists");

    assert_eq!(found.id, coupon.id);
    assert!(found.is_redeemable(today()));
    assert!(found.is_eligible(plain.id));
    assert!(!found.is_eligible(promo.id));
    assert_eq!(found.eligible_products.len(), 1);
}

#[tokio::test]
async fn test_duplicate_coupon_code_conflicts() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let shop = fixtures::shop(&app.store, &user).await;
    let product = fixtures::product_without_promotion(&app.store, &shop).await;
    let coupon = fixtures::coupon(&app.store, &product).await;

    let result = app
        .store
        .create_coupon(&NewCoupon {
            code: coupon.code.clone(),
            label: "Doublon".to_owned(),
            discount_ratio: coupon.discount_ratio,
            expiry_date: today() + Duration::days(5),
            is_active: true,
            max_uses: 1,
            eligible_products: Vec::new(),
        })
        .await;

    assert!(result.is_err());
}

// ============================================================================
// Cart Pages
// ============================================================================

#[tokio::test]
async fn test_cart_requires_login() {
    let app = TestApp::new();

    let response = app.get("/cart", None).await;

    assert!(response.status.is_redirection());
    assert_eq!(response.location(), Some("/login"));
}

#[tokio::test]
async fn test_add_to_cart_and_apply_coupon_through_pages() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let shop = fixtures::shop(&app.store, &user).await;
    let product = fixtures::product_without_promotion(&app.store, &shop).await;
    fixtures::coupon(&app.store, &product).await;
    let cookie = app.login("testuser", fixtures::USER_PASSWORD).await;
    let product_id = product.id.to_string();

    let response = app
        .post_form(
            "/cart/add",
            &[("product_id", &product_id), ("quantity", "2")],
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/cart"));

    // Codes are case-insensitive.
    let response = app
        .post_form("/cart/coupon", &[("code", " noel2024 ")], Some(&cookie))
        .await;
    assert_eq!(response.location(), Some("/cart"));

    let page = app.get("/cart", Some(&cookie)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Attiéké Poisson"));
    assert!(page.body.contains("10 000 FCFA"));
    assert!(page.body.contains("8 500 FCFA"));
    assert!(page.body.contains("NOEL2024"));
}

#[tokio::test]
async fn test_unknown_coupon_reports_error() {
    let app = TestApp::new();
    fixtures::user(&app.store).await;
    let cookie = app.login("testuser", fixtures::USER_PASSWORD).await;

    let response = app
        .post_form("/cart/coupon", &[("code", "NOPE")], Some(&cookie))
        .await;
    assert_eq!(response.location(), Some("/cart?error=coupon_not_found"));

    let page = app.get("/cart?error=coupon_not_found", Some(&cookie)).await;
    assert!(page.body.contains("Code promo inconnu."));
}

#[tokio::test]
async fn test_remove_line_through_page() {
    let app = TestApp::new();
    let user = fixtures::user(&app.store).await;
    let shop = fixtures::shop(&app.store, &user).await;
    let product = fixtures::product_without_promotion(&app.store, &shop).await;
    let customer = fixtures::customer(&app.store, &user).await;
    let cart = fixtures::cart(&app.store, &customer).await;
    let cart = fixtures::cart_line(&app.store, &cart, &product).await;
    let cookie = app.login("testuser", fixtures::USER_PASSWORD).await;
    let line_id = cart.lines[0].id.to_string();

    let response = app
        .post_form("/cart/remove", &[("line_id", &line_id)], Some(&cookie))
        .await;
    assert_eq!(response.location(), Some("/cart"));

    let cart = app.store.get_cart(cart.id).await.unwrap().unwrap();
    assert!(cart.lines.is_empty());

    let response = app
        .post_form("/cart/remove", &[("line_id", &line_id)], Some(&cookie))
        .await;
    assert_eq!(response.location(), Some("/cart?error=line_not_found"));
}
