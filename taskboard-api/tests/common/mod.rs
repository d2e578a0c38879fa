/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An application router over the in-memory store and blob store
/// - Account creation and login through the HTTP surface
/// - Request helpers returning status and parsed JSON

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::blob::MemoryBlobStore;
use taskboard_shared::store::memory::MemoryStore;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse";
pub const BOUNDARY: &str = "taskboard-test-boundary";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: Router,
    pub config: Config,
    pub blobs: Arc<MemoryBlobStore>,
}

/// A decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        if self.body.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "response is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }
}

impl TestContext {
    /// Creates a new test context with a fresh in-memory store
    pub fn new() -> Self {
        Self::with_config(Config::for_testing())
    }

    pub fn with_config(config: Config) -> Self {
        let blobs = Arc::new(MemoryBlobStore::new());
        let state = AppState::new(config.clone(), Arc::new(MemoryStore::new()), blobs.clone());

        Self {
            app: build_router(state),
            config,
            blobs,
        }
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Sends a JSON request, with a bearer token when given
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request("POST", uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request("PATCH", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request("DELETE", uri, Some(token), None).await
    }

    /// Registers `<first_name>@example.com` and returns the login response
    pub async fn signup(&self, first_name: &str) -> Value {
        let email = format!("{}@example.com", first_name.to_lowercase());

        let registered = self
            .request(
                "POST",
                "/v1/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "password2": PASSWORD,
                    "first_name": first_name,
                    "sur_name": "Tester",
                })),
            )
            .await;
        assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.json());

        let login = self
            .request(
                "POST",
                "/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(login.status, StatusCode::OK, "{:?}", login.json());
        login.json()
    }

    /// Registers a user and returns their access token
    pub async fn token(&self, first_name: &str) -> String {
        self.signup(first_name).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Creates a resource and returns its slug
    pub async fn create(&self, uri: &str, token: &str, body: Value) -> String {
        let response = self.post(uri, token, body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.json());
        response.json()["slug"].as_str().unwrap().to_string()
    }

    /// Creates a board with one list and one card; returns their slugs
    pub async fn hierarchy(&self, token: &str) -> (String, String, String) {
        let board = self
            .create("/v1/boards", token, json!({ "name": "Sprint" }))
            .await;
        let list = self
            .create("/v1/lists", token, json!({ "board": board, "name": "Todo" }))
            .await;
        let card = self
            .create("/v1/cards", token, json!({ "list": list, "name": "Write tests" }))
            .await;
        (board, list, card)
    }

    /// Uploads `payload` to a card as a multipart form
    pub async fn upload(
        &self,
        token: &str,
        card: &str,
        file_name: &str,
        content_type: &str,
        payload: &[u8],
    ) -> TestResponse {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"card\"\r\n\r\n{card}\r\n",
                b = BOUNDARY,
                card = card
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: {ct}\r\n\r\n",
                b = BOUNDARY,
                name = file_name,
                ct = content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/v1/attachments")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        self.send(request).await
    }
}
