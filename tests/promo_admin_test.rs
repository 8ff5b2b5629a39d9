//! Manager-only promo code administration over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use grocery_api::entities::{promo_usage, PromoUsage};
use rstest::rstest;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};

fn save10() -> Value {
    json!({
        "code": "SAVE10",
        "discount_type": "percent",
        "discount_value": "10",
        "expiry_date": null
    })
}

async fn create(app: &TestApp, body: Value) -> (StatusCode, Value) {
    let response = app.post("/api/v1/promo", body, &app.manager).await;
    let status = response.status();
    (status, response_json(response).await)
}

async fn list(app: &TestApp) -> Vec<Value> {
    let response = app.get("/api/v1/promo", &app.manager).await;
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response)
        .await
        .as_array()
        .cloned()
        .unwrap_or_default()
}

#[tokio::test]
async fn manager_creates_promo_with_defaults() {
    let app = TestApp::new().await;

    let (status, body) = create(&app, save10()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Promo code created");
    assert_eq!(body["code"], "SAVE10");

    let promos = list(&app).await;
    assert_eq!(promos.len(), 1);
    let promo = &promos[0];
    assert_eq!(promo["discount_type"], "percent");
    assert_eq!(promo["discount_value"], "10.00");
    assert_eq!(promo["min_order_amount"], "0.00");
    assert_eq!(promo["active"], true);
    assert_eq!(promo["one_time_use"], false);
    assert!(promo["expiry_date"].is_null());
}

#[rstest]
#[case("code", "code is required")]
#[case("discount_type", "discount_type is required")]
#[case("discount_value", "discount_value is required")]
#[case("expiry_date", "expiry_date is required")]
#[tokio::test]
async fn each_required_field_is_reported_by_name(#[case] field: &str, #[case] message: &str) {
    let app = TestApp::new().await;
    let mut body = save10();
    body.as_object_mut().unwrap().remove(field);

    let (status, body) = create(&app, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "missing_field");
    assert_eq!(body["error"], message);
}

#[rstest]
#[case(json!({ "discount_type": "bogo" }))]
#[case(json!({ "discount_value": "-1" }))]
#[case(json!({ "min_order_amount": "-0.01" }))]
#[case(json!({ "code": "   " }))]
#[tokio::test]
async fn invalid_fields_are_rejected(#[case] patch: Value) {
    let app = TestApp::new().await;
    let mut body = save10();
    for (key, value) in patch.as_object().unwrap() {
        body[key] = value.clone();
    }

    let (status, _) = create(&app, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn duplicate_codes_are_rejected_case_insensitively() {
    let app = TestApp::new().await;
    create(&app, save10()).await;

    let mut body = save10();
    body["code"] = json!(" save10 ");
    let (status, body) = create(&app, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Promo code already exists");
}

#[tokio::test]
async fn regular_users_are_forbidden_everywhere() {
    let app = TestApp::new().await;
    let shopper = app.shopper();
    let (_, created) = create(&app, save10()).await;
    assert_eq!(created["code"], "SAVE10");
    let id = list(&app).await[0]["id"].as_str().unwrap().to_string();

    let response = app.post("/api/v1/promo", save10(), &shopper).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Only managers can create promo codes");
    assert_eq!(body["code"], "forbidden");

    let response = app.get("/api/v1/promo", &shopper).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/v1/promo/{}", id);
    let response = app
        .request(Method::PUT, &uri, Some(json!({ "active": false })), Some(&shopper.token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(Method::DELETE, &uri, None, Some(&shopper.token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Only managers can delete promo codes");

    assert_eq!(list(&app).await.len(), 1);
}

#[tokio::test]
async fn update_replaces_only_supplied_fields() {
    let app = TestApp::new().await;
    let mut body = save10();
    body["min_order_amount"] = json!("20");
    body["one_time_use"] = json!(true);
    create(&app, body).await;
    let id = list(&app).await[0]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/promo/{}", id),
            Some(json!({ "discount_value": "15", "expiry_date": "2030-01-01T00:00:00Z" })),
            Some(&app.manager.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response).await["message"],
        "Promo updated successfully"
    );

    let promo = &list(&app).await[0];
    assert_eq!(promo["code"], "SAVE10");
    assert_eq!(promo["discount_type"], "percent");
    assert_eq!(promo["discount_value"], "15.00");
    assert_eq!(promo["min_order_amount"], "20.00");
    assert_eq!(promo["one_time_use"], true);
    assert!(promo["expiry_date"].as_str().unwrap().starts_with("2030-01-01"));

    // An explicit null clears the expiry.
    app.request(
        Method::PUT,
        &format!("/api/v1/promo/{}", id),
        Some(json!({ "expiry_date": null })),
        Some(&app.manager.token),
    )
    .await;
    assert!(list(&app).await[0]["expiry_date"].is_null());
}

#[tokio::test]
async fn update_and_delete_of_unknown_id_are_not_found() {
    let app = TestApp::new().await;
    let uri = format!("/api/v1/promo/{}", uuid::Uuid::new_v4());

    let response = app
        .request(Method::PUT, &uri, Some(json!({ "active": false })), Some(&app.manager.token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "Promo code not found");

    let response = app
        .request(Method::DELETE, &uri, None, Some(&app.manager.token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_promo_and_its_usage_history() {
    let app = TestApp::new().await;
    let shopper = app.shopper();
    let milk = app
        .seed_product("Milk", "Dairy", rust_decimal_macros::dec!(3.00), 10)
        .await;

    let mut body = save10();
    body["code"] = json!("WELCOME5");
    body["discount_type"] = json!("fixed");
    body["discount_value"] = json!("5");
    body["one_time_use"] = json!(true);
    create(&app, body).await;
    let id = list(&app).await[0]["id"].as_str().unwrap().to_string();

    app.add_to_cart(&shopper, milk.id, 2).await;
    assert_eq!(
        app.checkout(&shopper, Some("WELCOME5")).await.status(),
        StatusCode::CREATED
    );

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/promo/{}", id),
            None,
            Some(&app.manager.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["message"], "Promo deleted");

    assert!(list(&app).await.is_empty());
    let usages = PromoUsage::find()
        .filter(promo_usage::Column::UserId.eq(shopper.id))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(usages, 0);

    // The order keeps the code it was placed with.
    let orders = response_json(app.get("/api/v1/orders", &shopper).await).await;
    assert_eq!(orders[0]["promo_code"], "WELCOME5");
}

#[tokio::test]
async fn list_is_newest_first() {
    let app = TestApp::new().await;
    for code in ["FIRST", "SECOND", "THIRD"] {
        let mut body = save10();
        body["code"] = json!(code);
        create(&app, body).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let codes: Vec<String> = list(&app)
        .await
        .iter()
        .map(|p| p["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, ["THIRD", "SECOND", "FIRST"]);
}
