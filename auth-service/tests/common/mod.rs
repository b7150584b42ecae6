use std::sync::Arc;
use std::time::Duration as StdDuration;

use auth::PasswordCost;
use auth::PasswordHasher;
use auth_service::domain::token::service::TokenService;
use auth_service::domain::token::service::TokenSettings;
use auth_service::domain::user::service::UserService;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::repositories::InMemoryCredentialStore;
use auth_service::outbound::repositories::InMemoryUserRepository;
use chrono::Duration;
use serde_json::json;
use serde_json::Value;

pub const SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server backed by in-memory stores
pub struct TestApp {
    pub address: String,
    pub credential_store: Arc<InMemoryCredentialStore>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with_secret(SECRET).await
    }

    /// Spawn with an explicit signing secret (empty for an unconfigured service)
    pub async fn spawn_with_secret(secret: &str) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let credential_store = Arc::new(InMemoryCredentialStore::new());
        let token_service = Arc::new(TokenService::new(
            Arc::clone(&credential_store),
            secret,
            TokenSettings {
                token_duration: Duration::minutes(30),
                store_timeout: StdDuration::from_secs(2),
                issuer: "auth-service-test".to_string(),
                audience: "auth-service-test-users".to_string(),
            },
        ));

        // Cheap work factor keeps the suite fast
        let password_hasher = PasswordHasher::with_cost(PasswordCost {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        })
        .expect("Failed to create password hasher");

        let user_service = Arc::new(UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::clone(&token_service),
            password_hasher,
            StdDuration::from_secs(2),
        )
        .expect("Failed to create user service"));

        let router = create_router(user_service, token_service);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            credential_store,
            api_client: reqwest::Client::new(),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Register a user and return the response body
    pub async fn signup(&self, email: &str, password: &str) -> Value {
        let response = self
            .post("/v1/signup")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        response.json().await.expect("Failed to parse response")
    }

    /// Log in and return the signed token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post("/v1/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Missing token in login response")
            .to_string()
    }
}
