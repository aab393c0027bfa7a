#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use storefront::{
    app,
    config::Config,
    entities::{connect, setup_schema},
    middleware::auth::{generate_token, Role},
    state::AppState,
};

pub const SECRET: &str = "integration-secret";
pub const ADMIN_ID: i32 = 1;

pub struct TestApp {
    pub addr: String,
    pub client: Client,
}

impl TestApp {
    /// Serves a fresh app backed by its own in-memory database.
    pub async fn spawn() -> Self {
        let config = Config {
            database_url: "sqlite::memory:".into(),
            bind_addr: "127.0.0.1:0".into(),
            secret: SECRET.into(),
            product_cache_ttl: Duration::from_secs(600),
            cart_write_attempts: 3,
            seed_demo_data: false,
        };

        let db = connect(&config.database_url).await.unwrap();
        setup_schema(&db).await.unwrap();

        let listener = tokio::net::TcpListener::bind(&config.bind_addr)
            .await
            .unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());

        let router = app(AppState::new(Arc::new(db), config));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    pub fn as_user(&self, builder: RequestBuilder, user_id: i32) -> RequestBuilder {
        builder.bearer_auth(token(user_id, Role::User))
    }

    pub fn as_admin(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(token(ADMIN_ID, Role::Admin))
    }

    pub async fn create_product(&self, name: &str, price: f64, stock: i32) -> i32 {
        let response = self
            .as_admin(self.client.post(self.url("/api/admin/product")))
            .json(&json!({
                "name": name,
                "description": format!("Fresh {name}"),
                "category": "bakery",
                "price": price,
                "stock": stock,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap() as i32
    }

    pub async fn create_coupon(&self, code: &str, discount: f64) {
        let expiry = chrono::Utc::now() + chrono::Duration::days(1);
        let response = self
            .as_admin(self.client.post(self.url("/api/admin/coupon")))
            .json(&json!({
                "code": code,
                "discount": discount,
                "expiry": expiry,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    pub async fn add_to_cart(&self, user_id: i32, product_id: i32, quantity: i64) -> StatusCode {
        self.as_user(self.client.post(self.url("/api/cart")), user_id)
            .json(&json!({ "product_id": product_id, "quantity": quantity }))
            .send()
            .await
            .unwrap()
            .status()
    }
}

pub fn token(user_id: i32, role: Role) -> String {
    generate_token(SECRET, user_id, role, chrono::Duration::minutes(5)).unwrap()
}

pub fn assert_money(value: &Value, expected: f64) {
    let actual = value.as_f64().unwrap();
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
