#![allow(dead_code)]

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use grocery_api::{
    auth::Role,
    config::AppConfig,
    db,
    entities::{
        product::{self, Entity as Product},
        promo_code::{self, code_key, DiscountType},
    },
    events::{self, EventSender},
    AppState,
};

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Test principal: a user id plus a bearer token minted for it
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

/// Helper harness: the full router over a fresh SQLite file in a temp dir.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub manager: TestUser,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Construct a test application, letting the caller tune the config first.
    pub async fn with_config(tune: impl FnOnce(&mut AppConfig)) -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("grocery_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // One connection: SQLite allows a single writer anyway.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        tune(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(pool, cfg, EventSender::new(event_tx));
        let router = grocery_api::build_router(state.clone());

        let manager_id = Uuid::new_v4();
        let manager = TestUser {
            id: manager_id,
            token: mint(&state, manager_id, Role::Manager),
        };

        Self {
            router,
            state,
            manager,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    /// A fresh regular shopper
    pub fn shopper(&self) -> TestUser {
        let id = Uuid::new_v4();
        TestUser {
            id,
            token: mint(&self.state, id, Role::Regular),
        }
    }

    /// Send a JSON request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let bytes = body
            .map(|json| serde_json::to_vec(&json).expect("failed to serialize json request body"));
        self.request_raw(method, uri, bytes, token).await
    }

    /// Send a request whose body is passed through untouched.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: Option<Vec<u8>>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = match body {
            Some(bytes) => {
                builder = builder.header("content-type", "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    /// Drive a fully built request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> Response {
        self.request(Method::GET, uri, None, Some(&user.token)).await
    }

    pub async fn post(&self, uri: &str, body: Value, user: &TestUser) -> Response {
        self.request(Method::POST, uri, Some(body), Some(&user.token))
            .await
    }

    pub async fn add_to_cart(&self, user: &TestUser, product_id: Uuid, quantity: i32) -> Response {
        self.post(
            "/api/v1/cart/items",
            serde_json::json!({ "product_id": product_id, "quantity": quantity }),
            user,
        )
        .await
    }

    /// POST /checkout with an optional promo code
    pub async fn checkout(&self, user: &TestUser, promo_code: Option<&str>) -> Response {
        let body = promo_code.map(|code| serde_json::json!({ "promo_code": code }));
        self.request(Method::POST, "/api/v1/checkout", body, Some(&user.token))
            .await
    }

    pub async fn seed_product(
        &self,
        name: &str,
        category: &str,
        price: Decimal,
        stock: i32,
    ) -> product::Model {
        let now = Utc::now();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            category: Set(category.to_string()),
            price: Set(price),
            stock: Set(stock),
            popularity: Set(0),
            image_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product for tests")
    }

    pub async fn seed_promo(
        &self,
        code: &str,
        discount_type: DiscountType,
        discount_value: Decimal,
        min_order_amount: Decimal,
        expiry_date: Option<DateTime<Utc>>,
        one_time_use: bool,
    ) -> promo_code::Model {
        let now = Utc::now();
        promo_code::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_string()),
            code_key: Set(code_key(code)),
            discount_type: Set(discount_type),
            discount_value: Set(discount_value),
            min_order_amount: Set(min_order_amount),
            expiry_date: Set(expiry_date),
            active: Set(true),
            one_time_use: Set(one_time_use),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed promo for tests")
    }

    /// Current catalog row, read straight from the database
    pub async fn product(&self, id: Uuid) -> product::Model {
        Product::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("query product")
            .expect("product exists")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

fn mint(state: &AppState, user_id: Uuid, role: Role) -> String {
    state
        .auth
        .issue_token(user_id, Some("Test User".to_string()), role)
        .expect("mint test token")
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
