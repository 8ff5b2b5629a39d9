//! Cart upserts, line ownership and the wishlist.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use grocery_api::{
    entities::commerce::{cart, Cart},
    services::commerce::{AddToCartInput, CartService},
};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinSet;

#[tokio::test]
async fn adding_the_same_product_twice_increments_one_line() {
    let app = TestApp::new().await;
    let user = app.shopper();
    let apples = app.seed_product("Apples", "Fruit", dec!(2.50), 50).await;

    let response = app.add_to_cart(&user, apples.id, 2).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response_json(response).await["message"], "Added to cart");
    app.add_to_cart(&user, apples.id, 3).await;

    let cart = response_json(app.get("/api/v1/cart", &user).await).await;
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(items[0]["price"], "2.50");
    assert_eq!(items[0]["total"], "12.50");
    assert_eq!(cart["subtotal"], "12.50");
}

#[tokio::test]
async fn quantity_defaults_to_one_and_must_be_positive() {
    let app = TestApp::new().await;
    let user = app.shopper();
    let apples = app.seed_product("Apples", "Fruit", dec!(2.50), 50).await;

    let response = app
        .post("/api/v1/cart/items", json!({ "product_id": apples.id }), &user)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    for quantity in [0, -1] {
        let response = app.add_to_cart(&user, apples.id, quantity).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let cart = response_json(app.get("/api/v1/cart", &user).await).await;
    assert_eq!(cart["items"][0]["quantity"], 1);
}

#[tokio::test]
async fn unknown_product_cannot_be_added() {
    let app = TestApp::new().await;
    let user = app.shopper();

    let response = app.add_to_cart(&user, uuid::Uuid::new_v4(), 1).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "Product not found");
}

#[tokio::test]
async fn cart_lines_are_only_editable_by_their_owner() {
    let app = TestApp::new().await;
    let owner = app.shopper();
    let intruder = app.shopper();
    let apples = app.seed_product("Apples", "Fruit", dec!(2.50), 50).await;
    app.add_to_cart(&owner, apples.id, 1).await;

    let cart = response_json(app.get("/api/v1/cart", &owner).await).await;
    let item_id = cart["items"][0]["item_id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/cart/items/{}", item_id);

    let response = app
        .request(Method::PUT, &uri, Some(json!({ "quantity": 9 })), Some(&intruder.token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "Cart item not found");

    let response = app
        .request(Method::PUT, &uri, Some(json!({ "quantity": 4 })), Some(&owner.token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["message"], "Cart updated");

    let response = app
        .request(Method::PUT, &uri, Some(json!({ "quantity": 0 })), Some(&owner.token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(Method::DELETE, &uri, None, Some(&intruder.token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.request(Method::DELETE, &uri, None, Some(&owner.token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["message"], "Removed from cart");

    let response = app.request(Method::DELETE, &uri, None, Some(&owner.token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_first_adds_share_one_cart() {
    let app = Arc::new(TestApp::new().await);
    let user = app.shopper();
    let apples = app.seed_product("Apples", "Fruit", dec!(2.50), 50).await;
    let carts = Arc::new(CartService::new(app.state.db.clone()));

    let mut adds = JoinSet::new();
    for _ in 0..4 {
        let carts = carts.clone();
        let user_id = user.id;
        let product_id = apples.id;
        adds.spawn(async move {
            carts
                .add_item(
                    user_id,
                    AddToCartInput {
                        product_id,
                        quantity: Some(1),
                    },
                )
                .await
        });
    }
    while let Some(result) = adds.join_next().await {
        result.expect("add task panicked").expect("add succeeds");
    }

    let cart_count = Cart::find()
        .filter(cart::Column::UserId.eq(user.id))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(cart_count, 1);

    let view = carts.view(user.id).await.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 4);
}

#[tokio::test]
async fn wishlist_add_is_idempotent_and_newest_first() {
    let app = TestApp::new().await;
    let user = app.shopper();
    let milk = app.seed_product("Milk", "Dairy", dec!(3.49), 10).await;
    let bread = app.seed_product("Bread", "Bakery", dec!(5.50), 10).await;

    for product in [milk.id, milk.id, bread.id] {
        let response = app
            .post("/api/v1/wishlist", json!({ "product_id": product }), &user)
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response_json(response).await["message"], "Added to wishlist");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let list = response_json(app.get("/api/v1/wishlist", &user).await).await;
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["product"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Bread", "Milk"]);
    assert_eq!(list[1]["price"], "3.49");
}

#[tokio::test]
async fn wishlist_remove_and_missing_entries() {
    let app = TestApp::new().await;
    let user = app.shopper();
    let milk = app.seed_product("Milk", "Dairy", dec!(3.49), 10).await;

    let response = app
        .post("/api/v1/wishlist", json!({ "product_id": uuid::Uuid::new_v4() }), &user)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.post("/api/v1/wishlist", json!({ "product_id": milk.id }), &user)
        .await;
    let uri = format!("/api/v1/wishlist/{}", milk.id);

    let response = app.request(Method::DELETE, &uri, None, Some(&user.token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["message"], "Removed from wishlist");

    let response = app.request(Method::DELETE, &uri, None, Some(&user.token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "Product not in wishlist");
}
