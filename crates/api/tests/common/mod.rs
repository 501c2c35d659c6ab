//! Common test utilities for HTTP integration tests.
//!
//! The router runs over an in-memory store and accepts HS256 tokens signed
//! with a fixed test secret, so no database is needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use domain::services::RecordingNotifier;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use persistence::MemoryTicketStore;
use serde_json::{json, Value};
use shared::jwt::JwtConfig;
use ticketing_api::app::{create_app, AppState};
use ticketing_api::config::{
    BookingConfig, CacheConfig, Config, DatabaseConfig, JwtAuthConfig, LoggingConfig,
    SecurityConfig, ServerConfig, StorageBackend, StorageConfig,
};
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-do-not-use-in-production";

/// Test configuration: memory backend, HS256 tokens, short lock wait.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig::default(),
        storage: StorageConfig {
            backend: StorageBackend::Memory,
        },
        booking: BookingConfig {
            lock_timeout_ms: 2000,
        },
        cache: CacheConfig {
            event_list_ttl_secs: 30,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig::default(),
        jwt: JwtAuthConfig {
            secret: TEST_JWT_SECRET.to_string(),
            private_key: String::new(),
            public_key: String::new(),
            access_token_expiry_secs: 900,
            leeway_secs: 0,
        },
    }
}

/// A seeded account together with a valid access token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub token: String,
}

/// Router plus handles on the store and notification sink behind it.
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryTicketStore>,
    pub notifier: RecordingNotifier,
    pub jwt: JwtConfig,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryTicketStore::new(config.booking.lock_timeout()));
        let notifier = RecordingNotifier::new();
        let jwt = config.jwt.build().expect("Failed to build JWT config");

        let state = AppState::new(
            config,
            store.clone(),
            jwt.clone(),
            Arc::new(notifier.clone()),
        );

        Self {
            app: create_app(state),
            store,
            notifier,
            jwt,
        }
    }

    fn token_for(&self, user_id: i64) -> String {
        self.jwt
            .generate_access_token(user_id)
            .expect("Failed to sign test token")
            .0
    }

    fn fake_identity() -> (String, String) {
        let email: String = SafeEmail().fake();
        let name: String = Name().fake();
        // Prefix keeps generated emails unique within one store.
        (format!("{}.{}", uuid::Uuid::new_v4().simple(), email), name)
    }

    pub async fn attendee(&self) -> TestUser {
        let (email, name) = Self::fake_identity();
        let id = self
            .store
            .add_user(&email, Some(&name))
            .await
            .expect("Failed to seed attendee");
        TestUser {
            id,
            token: self.token_for(id),
            email,
            name,
        }
    }

    pub async fn organizer(&self) -> TestUser {
        let (email, name) = Self::fake_identity();
        let id = self
            .store
            .add_organizer(&email, Some(&name))
            .await
            .expect("Failed to seed organizer");
        TestUser {
            id,
            token: self.token_for(id),
            email,
            name,
        }
    }

    /// Sends a request and returns the status and parsed JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        (status, parse_response_body(response).await)
    }

    /// Creates an event through the API and returns its id.
    pub async fn create_event(&self, organizer: &TestUser, body: Value) -> i64 {
        let (status, created) = self
            .send(json_request_with_auth(
                Method::POST,
                "/api/event",
                body,
                &organizer.token,
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create event failed: {}", created);
        created["id"].as_i64().expect("Missing event id")
    }

    /// Creates a plain event with the given capacity.
    pub async fn event_with_capacity(&self, organizer: &TestUser, capacity: i32) -> i64 {
        self.create_event(organizer, event_body("Test Event", capacity))
            .await
    }

    /// Reserves `qty` units and returns the booking id.
    pub async fn reserve(&self, user: &TestUser, event_id: i64, qty: i64) -> i64 {
        let (status, body) = self
            .send(json_request_with_auth(
                Method::POST,
                &format!("/api/event/{}/book", event_id),
                json!({ "qty": qty }),
                &user.token,
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "reserve failed: {}", body);
        body["booking_id"].as_i64().expect("Missing booking id")
    }

    pub async fn approve(&self, organizer: &TestUser, booking_id: i64) -> (StatusCode, Value) {
        self.send(post_request_with_auth(
            &format!("/api/organizer/booking/{}/approve", booking_id),
            &organizer.token,
        ))
        .await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON body for a new event starting next month.
pub fn event_body(title: &str, capacity: i32) -> Value {
    json!({
        "title": title,
        "description": "An evening of live music",
        "location": "Main Hall",
        "start_date": "2030-06-01T19:00:00Z",
        "end_date": "2030-06-01T23:00:00Z",
        "price_in_cents": 2500,
        "capacity": capacity
    })
}

/// Build a JSON request with authentication.
pub fn json_request_with_auth(
    method: Method,
    uri: &str,
    body: Value,
    token: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a bodiless POST request with authentication.
pub fn post_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build a GET request with authentication.
pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build an anonymous GET request.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a DELETE request with authentication.
pub fn delete_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}
