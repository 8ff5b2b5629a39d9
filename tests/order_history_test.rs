mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn history_keeps_purchase_time_prices() {
    let app = TestApp::new().await;
    let user = app.shopper();
    let cheese = app.seed_product("Cheddar", "Dairy", dec!(6.75), 10).await;

    app.add_to_cart(&user, cheese.id, 2).await;
    let placed = response_json(app.checkout(&user, None).await).await;

    // Reprice and rename after the sale.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{}", cheese.id),
            Some(json!({ "price": "9.99", "name": "Aged Cheddar" })),
            Some(&app.manager.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let orders = response_json(app.get("/api/v1/orders", &user).await).await;
    let order = &orders[0];
    assert_eq!(order["order_id"], placed["order_id"]);
    assert_eq!(order["total_price"], "13.50");
    assert_eq!(order["discount_applied"], "0.00");
    assert!(order["created_at"].as_str().is_some());

    let line = &order["items"][0];
    assert_eq!(line["product"], "Cheddar");
    assert_eq!(line["price"], "6.75");
    assert_eq!(line["quantity"], 2);
    assert_eq!(line["total"], "13.50");
}

#[tokio::test]
async fn history_is_newest_first_and_private_to_the_user() {
    let app = TestApp::new().await;
    let user = app.shopper();
    let other = app.shopper();
    let rice = app.seed_product("Rice", "Pantry", dec!(8.00), 10).await;

    let mut placed = Vec::new();
    for quantity in [1, 2, 3] {
        app.add_to_cart(&user, rice.id, quantity).await;
        let body = response_json(app.checkout(&user, None).await).await;
        placed.push(body["order_id"].as_str().unwrap().to_string());
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let orders = response_json(app.get("/api/v1/orders", &user).await).await;
    let ids: Vec<&str> = orders
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["order_id"].as_str().unwrap())
        .collect();
    placed.reverse();
    assert_eq!(ids, placed);

    let others = response_json(app.get("/api/v1/orders", &other).await).await;
    assert_eq!(others, json!([]));
}

#[tokio::test]
async fn deleting_a_product_keeps_the_order_snapshot() {
    let app = TestApp::new().await;
    let user = app.shopper();
    let spinach = app.seed_product("Spinach", "Vegetables", dec!(2.99), 10).await;

    app.add_to_cart(&user, spinach.id, 1).await;
    app.checkout(&user, None).await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/products/{}", spinach.id),
            None,
            Some(&app.manager.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let orders = response_json(app.get("/api/v1/orders", &user).await).await;
    let line = &orders[0]["items"][0];
    assert_eq!(line["product"], "Spinach");
    assert_eq!(line["price"], "2.99");
    assert!(line["product_id"].is_null());
}
