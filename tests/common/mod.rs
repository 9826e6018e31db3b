// Shared harness for the integration tests. Not every test file exercises
// every helper.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use quickbite_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::user::UserRole,
    entities::{menu_item, restaurant, user},
    events::{self, EventSender},
    handlers::AppServices,
    notifications::OrderFeedHub,
    AppState,
};

/// Application harness backed by a fresh on-disk SQLite database. Each
/// instance gets its own temp directory, so tests never share state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new application with a migrated, empty database.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("quickbite_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only",
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let feed_hub = Arc::new(OrderFeedHub::new(16));
        let event_task = tokio::spawn(events::process_events(event_rx, feed_hub.clone()));

        let auth = Arc::new(AuthService::new(
            AuthConfig::from_app_config(&cfg),
            db_arc.clone(),
        ));
        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()), &cfg);

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            feed_hub,
            services,
            auth,
        };

        let router = Router::new()
            .nest("/api/v1", quickbite_api::api_v1_routes(state.clone()))
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {tok}"));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Insert a user with the given role; returns the row and a bearer token
    /// for it. The password is always `password123`.
    pub async fn seed_user(&self, name: &str, email: &str, role: UserRole) -> (user::Model, String) {
        let now = Utc::now();
        let saved = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(self
                .state
                .auth
                .hash_password("password123")
                .expect("hash test password")),
            phone: Set(None),
            address: Set(None),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed user");

        let token = self
            .state
            .auth
            .generate_token(&saved)
            .expect("token for seeded user");
        (saved, token)
    }

    pub async fn seed_restaurant(
        &self,
        owner_id: Uuid,
        name: &str,
        delivery_fee: Decimal,
    ) -> restaurant::Model {
        let now = Utc::now();
        restaurant::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            name: Set(name.to_string()),
            description: Set(Some(format!("{name} test kitchen"))),
            cuisine: Set("Italian".to_string()),
            address: Set("42 Test Street".to_string()),
            phone: Set(None),
            image_url: Set(None),
            rating: Set(Decimal::ZERO),
            review_count: Set(0),
            delivery_fee: Set(delivery_fee),
            minimum_order: Set(Decimal::ZERO),
            delivery_time_minutes: Set(30),
            is_open: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed restaurant")
    }

    pub async fn seed_menu_item(
        &self,
        restaurant_id: Uuid,
        name: &str,
        price: Decimal,
    ) -> menu_item::Model {
        let now = Utc::now();
        menu_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            restaurant_id: Set(restaurant_id),
            name: Set(name.to_string()),
            description: Set(None),
            price: Set(price),
            category: Set(Some("Mains".to_string())),
            image_url: Set(None),
            is_available: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed menu item")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Read and parse a JSON response body.
pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is json")
}
