//! Shared harness: in-memory store, seeded users and menu, router driven via `oneshot`

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use market_server::AppState;
use market_server::api::create_router;
use market_server::auth::{UserRole, create_token};
use market_server::db::{MarketStore, MemoryStore};
use market_server::services::pricing::{OrderNumberGenerator, RandomOrderNumbers};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::{FoodItem, UserProfile};
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";

pub const CUSTOMER: &str = "cust-1";
pub const OTHER_CUSTOMER: &str = "cust-2";
pub const SELLER_A: &str = "seller-a";
pub const SELLER_B: &str = "seller-b";
pub const SELLER_C: &str = "seller-c";
pub const ADMIN: &str = "admin-1";

/// Seller A: adobo 12.50 (20 min), halo-halo 5.00 (10 min)
pub const ADOBO: i64 = 101;
pub const HALO_HALO: i64 = 102;
/// Seller B: lechon 30.00 (45 min)
pub const LECHON: i64 = 201;
/// Seller C: pancit 8.25 (15 min)
pub const PANCIT: i64 = 301;

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Money fields are serialized as strings; accept numbers too
pub fn money(v: &Value) -> Decimal {
    match v {
        Value::String(s) => dec(s),
        Value::Number(n) => dec(&n.to_string()),
        other => panic!("not a money value: {other}"),
    }
}

/// Hands out scripted order numbers, then falls back to `ORD-FALLBACK-n`
#[derive(Default)]
pub struct ScriptedNumbers {
    queue: Mutex<VecDeque<String>>,
    issued: Mutex<u32>,
}

impl ScriptedNumbers {
    pub fn new(numbers: &[&str]) -> Self {
        Self {
            queue: Mutex::new(numbers.iter().map(|s| s.to_string()).collect()),
            issued: Mutex::new(0),
        }
    }

    pub fn issued(&self) -> u32 {
        *self.issued.lock()
    }
}

impl OrderNumberGenerator for ScriptedNumbers {
    fn next_number(&self, _now_millis: i64) -> String {
        let n = {
            let mut issued = self.issued.lock();
            *issued += 1;
            *issued
        };
        self.queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| format!("ORD-FALLBACK-{n}"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

fn profile(id: &str, first: &str, last: &str, business: Option<&str>) -> UserProfile {
    UserProfile {
        id: id.into(),
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{id}@example.com"),
        business_name: business.map(String::from),
        rating: business.map(|_| dec("4.5")),
    }
}

fn food(id: i64, seller: &str, name: &str, price: &str, prep: i32) -> FoodItem {
    FoodItem {
        id,
        seller_id: seller.into(),
        name: name.into(),
        description: None,
        category: "Filipino".into(),
        price: dec(price),
        is_available: true,
        preparation_time: prep,
        rating: Decimal::ZERO,
        total_ratings: 0,
        total_sold: 0,
        main_image_url: Some(format!("/img/{id}.jpg")),
        created_at: 0,
        updated_at: 0,
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_numbers(Arc::new(RandomOrderNumbers::seeded(42))).await
    }

    pub async fn with_numbers(numbers: Arc<dyn OrderNumberGenerator>) -> Self {
        let store = Arc::new(MemoryStore::new());
        store.upsert_user(profile(CUSTOMER, "Juan", "Dela Cruz", None));
        store.upsert_user(profile(OTHER_CUSTOMER, "Maria", "Santos", None));
        store.upsert_user(profile(SELLER_A, "Lola", "Reyes", Some("Lola's Kitchen")));
        store.upsert_user(profile(SELLER_B, "Ben", "Cruz", Some("Lechon House")));
        store.upsert_user(profile(SELLER_C, "Carla", "Lim", Some("Pancit Corner")));
        store.upsert_user(profile(ADMIN, "Ada", "Admin", None));

        for item in [
            food(ADOBO, SELLER_A, "Chicken Adobo", "12.50", 20),
            food(HALO_HALO, SELLER_A, "Halo-Halo", "5.00", 10),
            food(LECHON, SELLER_B, "Lechon Kawali", "30.00", 45),
            food(PANCIT, SELLER_C, "Pancit Canton", "8.25", 15),
        ] {
            store.insert_food_item(&item).await.unwrap();
        }

        let state = AppState::with_store(store.clone(), SECRET, numbers);
        Self {
            router: create_router(state),
            store,
        }
    }

    pub fn token(user_id: &str, role: UserRole) -> String {
        create_token(user_id, role, SECRET).unwrap()
    }

    pub fn customer() -> String {
        Self::token(CUSTOMER, UserRole::Customer)
    }

    pub fn seller(id: &str) -> String {
        Self::token(id, UserRole::Seller)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn add_to_cart(&self, token: &str, food_item_id: i64, quantity: i32) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/cart/add",
                Some(token),
                Some(serde_json::json!({ "food_item_id": food_item_id, "quantity": quantity })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "add_to_cart failed: {body}");
        body["data"].clone()
    }

    pub async fn cart(&self, token: &str) -> Value {
        let (status, body) = self.request(Method::GET, "/api/cart", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        body["data"].clone()
    }

    pub async fn checkout(&self, token: &str, sellers: &[&str]) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/orders/checkout-selected",
            Some(token),
            Some(serde_json::json!({
                "seller_ids": sellers,
                "delivery_address": "12 Rizal Ave, Manila",
                "phone_number": "+63 917 555 0101",
                "delivery_fee": "5.00",
            })),
        )
        .await
    }
}

/// Seller group in a cart view
pub fn seller_group<'a>(cart: &'a Value, seller_id: &str) -> Option<&'a Value> {
    cart["sellers"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["seller_id"] == seller_id)
}
