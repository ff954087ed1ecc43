//! Split checkout and buy-now over the in-memory store

mod common;

use std::sync::Arc;

use common::*;
use http::{Method, StatusCode};
use market_server::db::MarketStore;
use serde_json::{Value, json};

fn order_for<'a>(data: &'a Value, seller_id: &str) -> &'a Value {
    data["orders"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["order"]["seller_id"] == seller_id)
        .unwrap_or_else(|| panic!("no order for {seller_id}: {data}"))
}

async fn buy_now(app: &TestApp, food_item_id: i64, quantity: i32) -> (StatusCode, Value) {
    app.request(
        Method::POST,
        "/api/orders/buy-now",
        Some(&TestApp::customer()),
        Some(json!({
            "food_item_id": food_item_id,
            "quantity": quantity,
            "delivery_address": "12 Rizal Ave, Manila",
            "phone_number": "+63 917 555 0101",
            "delivery_fee": "5.00",
        })),
    )
    .await
}

#[tokio::test]
async fn checkout_creates_one_order_per_seller() {
    let app = TestApp::new().await;
    let token = TestApp::customer();
    app.add_to_cart(&token, ADOBO, 2).await;
    app.add_to_cart(&token, LECHON, 1).await;

    let (status, body) = app.checkout(&token, &[SELLER_A, SELLER_B]).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let data = &body["data"];
    assert_eq!(data["success"], true);
    assert_eq!(data["orders_created"], 2);
    assert_eq!(data["total_orders"], 2);
    assert!(data["errors"].as_array().unwrap().is_empty());

    let a = order_for(data, SELLER_A);
    assert_eq!(a["order"]["status"], "Pending");
    assert_eq!(money(&a["order"]["sub_total"]), dec("25.00"));
    assert_eq!(money(&a["order"]["delivery_fee"]), dec("5.00"));
    assert_eq!(money(&a["order"]["tax"]), dec("3.00"));
    assert_eq!(money(&a["order"]["total"]), dec("33.00"));
    assert_eq!(a["order"]["estimated_delivery_time"], 50);
    assert!(a["order"]["order_number"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(a["seller_name"], "Lola's Kitchen");
    assert_eq!(a["customer_name"], "Juan Dela Cruz");
    assert_eq!(a["items"][0]["food_item_name"], "Chicken Adobo");
    assert_eq!(a["items"][0]["quantity"], 2);

    let b = order_for(data, SELLER_B);
    assert_eq!(money(&b["order"]["tax"]), dec("3.60"));
    assert_eq!(money(&b["order"]["total"]), dec("38.60"));
    assert_eq!(b["order"]["estimated_delivery_time"], 75);

    let cart = app.cart(&token).await;
    assert!(cart["sellers"].as_array().unwrap().is_empty());

    let (_, food) = app
        .request(Method::GET, &format!("/api/foods/{ADOBO}"), Some(&token), None)
        .await;
    assert_eq!(food["data"]["total_sold"], 2);
}

#[tokio::test]
async fn unselected_sellers_stay_in_cart() {
    let app = TestApp::new().await;
    let token = TestApp::customer();
    app.add_to_cart(&token, ADOBO, 1).await;
    app.add_to_cart(&token, PANCIT, 3).await;

    let (status, body) = app.checkout(&token, &[SELLER_C]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["orders_created"], 1);

    let cart = app.cart(&token).await;
    assert!(seller_group(&cart, SELLER_A).is_some());
    assert!(seller_group(&cart, SELLER_C).is_none());
}

#[tokio::test]
async fn partial_checkout_keeps_failed_partition_and_retry_only_redoes_it() {
    let app = TestApp::new().await;
    let token = TestApp::customer();
    app.add_to_cart(&token, ADOBO, 1).await;
    app.add_to_cart(&token, LECHON, 1).await;
    app.add_to_cart(&token, PANCIT, 1).await;
    app.store.set_available(LECHON, false);

    let (status, body) = app.checkout(&token, &[SELLER_A, SELLER_B, SELLER_C]).await;
    assert_eq!(status, StatusCode::MULTI_STATUS, "{body}");
    let data = &body["data"];
    assert_eq!(data["orders_created"], 2);
    assert_eq!(data["total_orders"], 3);
    let errors = data["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["seller_id"], SELLER_B);
    assert_eq!(errors[0]["seller_name"], "Lechon House");
    assert_eq!(errors[0]["error_type"], "unavailable_items");
    assert_eq!(errors[0]["items"], json!(["Lechon Kawali"]));

    let cart = app.cart(&token).await;
    assert_eq!(cart["sellers"].as_array().unwrap().len(), 1);
    assert!(seller_group(&cart, SELLER_B).is_some());
    assert_eq!(app.store.order_count(), 2);

    app.store.set_available(LECHON, true);
    let (status, body) = app.checkout(&token, &[SELLER_A, SELLER_B, SELLER_C]).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["orders_created"], 1);
    assert_eq!(body["data"]["total_orders"], 1);
    assert_eq!(app.store.order_count(), 3);
}

#[tokio::test]
async fn price_change_rejects_only_that_seller() {
    let app = TestApp::new().await;
    let token = TestApp::customer();
    app.add_to_cart(&token, ADOBO, 1).await;
    app.add_to_cart(&token, LECHON, 1).await;
    app.store.set_price(ADOBO, dec("13.00"));

    let (status, body) = app.checkout(&token, &[SELLER_A, SELLER_B]).await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    let error = &body["data"]["errors"][0];
    assert_eq!(error["error_type"], "price_changes");
    assert_eq!(error["seller_id"], SELLER_A);
    let change = &error["price_changes"][0];
    assert_eq!(change["item_name"], "Chicken Adobo");
    assert_eq!(money(&change["old_price"]), dec("12.50"));
    assert_eq!(money(&change["new_price"]), dec("13.00"));
}

#[tokio::test]
async fn unavailable_is_reported_before_price_changes() {
    let app = TestApp::new().await;
    let token = TestApp::customer();
    app.add_to_cart(&token, ADOBO, 1).await;
    app.add_to_cart(&token, HALO_HALO, 1).await;
    app.store.set_price(ADOBO, dec("20.00"));
    app.store.set_available(HALO_HALO, false);

    let (status, body) = app.checkout(&token, &[SELLER_A]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["details"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["error_type"], "unavailable_items");
    assert_eq!(errors[0]["items"], json!(["Halo-Halo"]));
}

#[tokio::test]
async fn checkout_with_every_partition_failing_is_rejected() {
    let app = TestApp::new().await;
    let token = TestApp::customer();
    app.add_to_cart(&token, ADOBO, 1).await;
    app.store.set_available(ADOBO, false);

    let (status, body) = app.checkout(&token, &[SELLER_A]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4003);
    assert_eq!(body["details"]["orders_created"], 0);
    assert_eq!(body["details"]["total_orders"], 1);
    assert_eq!(app.store.order_count(), 0);

    let cart = app.cart(&token).await;
    assert!(seller_group(&cart, SELLER_A).is_some());
}

#[tokio::test]
async fn empty_cart_and_unmatched_sellers_are_rejected() {
    let app = TestApp::new().await;
    let token = TestApp::customer();

    let (status, body) = app.checkout(&token, &[SELLER_A]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3003);

    // A cart that exists but holds nothing is still empty
    app.cart(&token).await;
    let (_, body) = app.checkout(&token, &[SELLER_A]).await;
    assert_eq!(body["code"], 3003);

    app.add_to_cart(&token, LECHON, 1).await;
    let (status, body) = app.checkout(&token, &[SELLER_A]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3004);

    let (status, body) = app.checkout(&token, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn store_failure_becomes_system_error_for_that_seller() {
    let app = TestApp::new().await;
    let token = TestApp::customer();
    app.add_to_cart(&token, ADOBO, 1).await;
    app.add_to_cart(&token, LECHON, 1).await;
    app.store.inject_commit_failure(SELLER_B);

    let (status, body) = app.checkout(&token, &[SELLER_A, SELLER_B]).await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    let error = &body["data"]["errors"][0];
    assert_eq!(error["error_type"], "system_error");
    assert_eq!(
        error["message"],
        "Failed to create order for Lechon House. Please try again."
    );
    assert!(!body.to_string().contains("simulated commit failure"));

    let cart = app.cart(&token).await;
    assert!(seller_group(&cart, SELLER_B).is_some());

    app.store.clear_commit_failures();
    let (status, _) = app.checkout(&token, &[SELLER_B]).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn stale_cart_version_loses_the_claim() {
    let app = TestApp::new().await;
    let cart = app.store.get_or_create_cart(CUSTOMER, 1).await.unwrap();

    assert!(app.store.claim_cart(cart.id, cart.version, 2).await.unwrap());
    assert!(!app.store.claim_cart(cart.id, cart.version, 3).await.unwrap());

    let fresh = app.store.find_cart(CUSTOMER).await.unwrap().unwrap();
    assert_eq!(fresh.version, cart.version + 1);
}

#[tokio::test]
async fn buy_now_creates_order_without_touching_cart() {
    let app = TestApp::new().await;
    let token = TestApp::customer();
    app.add_to_cart(&token, ADOBO, 1).await;

    let (status, body) = buy_now(&app, LECHON, 2).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order = &body["data"]["order"];
    assert_eq!(order["seller_id"], SELLER_B);
    assert_eq!(money(&order["sub_total"]), dec("60.00"));
    assert_eq!(money(&order["tax"]), dec("7.20"));
    assert_eq!(money(&order["total"]), dec("72.20"));
    assert_eq!(order["estimated_delivery_time"], 75);

    let cart = app.cart(&token).await;
    assert!(seller_group(&cart, SELLER_A).is_some());
}

#[tokio::test]
async fn buy_now_rejects_bad_quantity_and_unavailable_items() {
    let app = TestApp::new().await;

    let (status, body) = buy_now(&app, ADOBO, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3005);
    assert_eq!(body["message"], "Quantity must be greater than 0");

    let (status, _) = buy_now(&app, ADOBO, 101).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.store.set_available(PANCIT, false);
    let (status, body) = buy_now(&app, PANCIT, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 6003);

    let (status, _) = buy_now(&app, 999, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.store.order_count(), 0);
}

#[tokio::test]
async fn order_number_collision_draws_a_new_number() {
    let numbers = Arc::new(ScriptedNumbers::new(&[
        "ORD-20250101-AAAAAA",
        "ORD-20250101-AAAAAA",
        "ORD-20250101-BBBBBB",
    ]));
    let app = TestApp::with_numbers(numbers.clone()).await;

    let (_, first) = buy_now(&app, ADOBO, 1).await;
    assert_eq!(first["data"]["order"]["order_number"], "ORD-20250101-AAAAAA");

    let (status, second) = buy_now(&app, ADOBO, 1).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["data"]["order"]["order_number"], "ORD-20250101-BBBBBB");
    assert_eq!(numbers.issued(), 3);
}

#[tokio::test]
async fn exhausted_order_numbers_fail_without_creating_an_order() {
    let numbers = Arc::new(ScriptedNumbers::new(&["ORD-20250101-SAME00"; 5]));
    let app = TestApp::with_numbers(numbers.clone()).await;

    let (status, _) = buy_now(&app, ADOBO, 1).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = buy_now(&app, ADOBO, 1).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4004);
    assert_eq!(numbers.issued(), 5);
    assert_eq!(app.store.order_count(), 1);
}
