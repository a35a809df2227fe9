use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        Request,
    },
    response::Response,
    Router,
};
use cookie::Cookie;
use std::collections::HashMap;
use std::sync::Mutex;
use tower::ServiceExt; // for `oneshot`

use agora::{build_router, AppConfig, AppState};

/// Password every builder-registered user signs up with
pub const TEST_PASSWORD: &str = "pw12345";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub router: Router,
    pub clients: HashMap<String, TestClient>,
}

impl TestSetup {
    /// Client of a user registered by the builder
    pub fn client(&self, username: &str) -> &TestClient {
        self.clients
            .get(username)
            .unwrap_or_else(|| panic!("{} was not registered by the builder", username))
    }

    /// A fresh client with no session cookie
    pub fn anonymous(&self) -> TestClient {
        TestClient::new(self.router.clone())
    }
}

pub struct TestSetupBuilder {
    users: Vec<String>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self { users: vec![] }
    }

    pub fn with_users(mut self, users: Vec<&str>) -> Self {
        self.users = users.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_alice_and_bob(self) -> Self {
        self.with_users(vec!["alice", "bob"])
    }

    pub async fn build(self) -> TestSetup {
        let config = AppConfig {
            jwt_secret: "integration-test-secret".to_string(),
            bcrypt_cost: 4,
            ..AppConfig::default()
        };
        let state = AppState::in_memory(&config);
        let router = build_router(state.clone());

        let mut clients = HashMap::new();
        for username in self.users {
            let client = TestClient::new(router.clone());
            let response = client.register(&username, TEST_PASSWORD).await;
            assert!(
                response.status().is_redirection(),
                "registering {} failed with {}",
                username,
                response.status()
            );
            clients.insert(username, client);
        }

        TestSetup {
            state,
            router,
            clients,
        }
    }
}

// ============================================================================
// Cookie-carrying HTTP client
// ============================================================================

/// Drives the router like a browser: remembers the session cookie between requests
pub struct TestClient {
    router: Router,
    cookie: Mutex<Option<String>>,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            cookie: Mutex::new(None),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.cookie.lock().unwrap().is_some()
    }

    pub async fn get(&self, uri: &str) -> Response {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, form: &[(&str, &str)]) -> Response {
        let body = serde_urlencoded::to_string(form).unwrap();

        let request = self
            .request("POST", uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match self.cookie.lock().unwrap().as_deref() {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Cookie::parse(value).ok())
        {
            // An emptied cookie is how the server logs the browser out
            *self.cookie.lock().unwrap() = if set_cookie.value().is_empty() {
                None
            } else {
                Some(Cookie::new(set_cookie.name(), set_cookie.value()).to_string())
            };
        }

        response
    }
}
