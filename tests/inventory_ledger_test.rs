mod common;

use assert_matches::assert_matches;
use common::TestApp;
use grocery_api::{errors::ServiceError, services::inventory::InventoryLedger};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn reserve_moves_stock_into_popularity() {
    let app = TestApp::new().await;
    let eggs = app.seed_product("Eggs", "Dairy", dec!(5.10), 12).await;
    let ledger = InventoryLedger::new();

    let reservation = ledger
        .reserve(&*app.state.db, eggs.id, 5)
        .await
        .expect("enough stock");
    assert_eq!(reservation.quantity, 5);

    let after = app.product(eggs.id).await;
    assert_eq!(after.stock, 7);
    assert_eq!(after.popularity, 5);
}

#[tokio::test]
async fn reserve_exact_remaining_stock_empties_the_shelf() {
    let app = TestApp::new().await;
    let eggs = app.seed_product("Eggs", "Dairy", dec!(5.10), 3).await;

    InventoryLedger::new()
        .reserve(&*app.state.db, eggs.id, 3)
        .await
        .expect("exact stock is enough");

    assert_eq!(app.product(eggs.id).await.stock, 0);
}

#[tokio::test]
async fn insufficient_stock_names_the_product_and_changes_nothing() {
    let app = TestApp::new().await;
    let eggs = app.seed_product("Eggs", "Dairy", dec!(5.10), 2).await;

    let err = InventoryLedger::new()
        .reserve(&*app.state.db, eggs.id, 3)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(name) if name == "Eggs");

    let after = app.product(eggs.id).await;
    assert_eq!(after.stock, 2);
    assert_eq!(after.popularity, 0);
}

#[tokio::test]
async fn release_restores_stock_and_popularity() {
    let app = TestApp::new().await;
    let eggs = app.seed_product("Eggs", "Dairy", dec!(5.10), 10).await;
    let rice = app.seed_product("Rice", "Pantry", dec!(8.00), 4).await;
    let ledger = InventoryLedger::new();
    let db = &*app.state.db;

    let first = ledger.reserve(db, eggs.id, 4).await.unwrap();
    let second = ledger.reserve(db, rice.id, 4).await.unwrap();
    ledger.release_all(db, &[first, second]).await;

    let eggs_after = app.product(eggs.id).await;
    let rice_after = app.product(rice.id).await;
    assert_eq!((eggs_after.stock, eggs_after.popularity), (10, 0));
    assert_eq!((rice_after.stock, rice_after.popularity), (4, 0));
}

#[tokio::test]
async fn non_positive_quantities_are_rejected() {
    let app = TestApp::new().await;
    let eggs = app.seed_product("Eggs", "Dairy", dec!(5.10), 10).await;
    let ledger = InventoryLedger::new();

    for quantity in [0, -3] {
        let err = ledger
            .reserve(&*app.state.db, eggs.id, quantity)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }
    assert_eq!(app.product(eggs.id).await.stock, 10);
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let app = TestApp::new().await;

    let err = InventoryLedger::new()
        .reserve(&*app.state.db, Uuid::new_v4(), 1)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(msg) if msg == "Product not found");
}
