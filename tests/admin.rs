mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

#[tokio::test]
async fn test_coupon_creation_and_listing() {
    let app = TestApp::spawn().await;
    app.create_coupon("SPRING_15", 15.0).await;

    let coupons: Value = app
        .as_admin(app.client.get(app.url("/api/admin/coupon")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(coupons.as_array().unwrap().len(), 1);
    assert_eq!(coupons[0]["code"], "SPRING_15");
    assert_eq!(coupons[0]["is_active"], true);
}

#[tokio::test]
async fn test_coupon_validation() {
    let app = TestApp::spawn().await;
    app.create_coupon("SAVE10", 10.0).await;
    let tomorrow = chrono::Utc::now() + chrono::Duration::days(1);
    let yesterday = chrono::Utc::now() - chrono::Duration::days(1);

    let cases = [
        (json!({ "code": "SAVE10", "discount": 5.0, "expiry": tomorrow }), StatusCode::CONFLICT),
        (json!({ "code": "OLD", "discount": 5.0, "expiry": yesterday }), StatusCode::BAD_REQUEST),
        (json!({ "code": "BIG", "discount": 150.0, "expiry": tomorrow }), StatusCode::BAD_REQUEST),
        (json!({ "code": "a b", "discount": 5.0, "expiry": tomorrow }), StatusCode::BAD_REQUEST),
    ];

    for (payload, expected) in cases {
        let response = app
            .as_admin(app.client.post(app.url("/api/admin/coupon")))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "{payload}");
    }
}

#[tokio::test]
async fn test_order_status_update() {
    let app = TestApp::spawn().await;
    let id = app.create_product("Bagel", 1.0, 5).await;
    app.add_to_cart(7, id, 1).await;
    let order: Value = app
        .as_user(app.client.post(app.url("/api/cart/checkout")), 7)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id = order["id"].as_i64().unwrap();
    let url = app.url(&format!("/api/admin/order/{order_id}"));

    let response = app
        .as_admin(app.client.patch(&url))
        .json(&json!({ "status": "processing" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["status"], "processing");

    let response = app
        .as_admin(app.client.patch(&url))
        .json(&json!({ "status": "lost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .as_admin(app.client.patch(app.url("/api/admin/order/9999")))
        .json(&json!({ "status": "received" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
