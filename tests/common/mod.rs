// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use whisperbox::{
    config::{Config, MailConfig},
    db, routes,
    state::AppState,
    utils::mailer::{MailError, Mailer},
};

pub const TEST_JWT_SECRET: &str = "test_secret_for_integration_tests";

#[derive(Debug, Clone)]
pub struct SentCode {
    pub email: String,
    pub username: String,
    pub code: String,
}

/// Captures codes instead of sending them. Can be switched to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentCode>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentCode> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|sent| sent.email == email)
            .map(|sent| sent.code.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Rejected {
                status: 503,
                body: "mail provider unavailable".into(),
            });
        }
        self.sent.lock().unwrap().push(SentCode {
            email: email.to_string(),
            username: username.to_string(),
            code: code.to_string(),
        });
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub mailer: Arc<RecordingMailer>,
    pub client: reqwest::Client,
}

/// Store opened against a fresh in-memory database with migrations applied.
pub async fn test_pool() -> SqlitePool {
    let pool = db::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");
    db::migrate(&pool).await.expect("Failed to migrate database");
    pool
}

/// Spawns the app on a random port with its own in-memory store.
pub async fn spawn_app() -> TestApp {
    let pool = test_pool().await;
    let mailer = Arc::new(RecordingMailer::default());

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        mail: MailConfig {
            resend_api_key: None,
            from: "test@whisperbox.local".to_string(),
        },
    };

    let state = AppState {
        pool: pool.clone(),
        config,
        mailer: mailer.clone(),
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        mailer,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.address, path)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/register"))
            .json(&json!({"username": username, "email": email, "password": password}))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn verify(&self, username: &str, code: &str) -> reqwest::Response {
        self.client
            .post(self.url("/verify"))
            .json(&json!({"username": username, "code": code}))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn sign_in(&self, identifier: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/sign-in"))
            .json(&json!({"identifier": identifier, "password": password}))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register, verify with the mailed code and sign in. Returns the token.
    pub async fn verified_user(&self, username: &str, email: &str, password: &str) -> String {
        let response = self.register(username, email, password).await;
        assert_eq!(response.status().as_u16(), 201);

        let code = self.mailer.last_code_for(email).expect("no code mailed");
        let response = self.verify(username, &code).await;
        assert_eq!(response.status().as_u16(), 200);

        let body: Value = self.sign_in(username, password).await.json().await.unwrap();
        body["token"].as_str().expect("Token not found").to_string()
    }

    pub async fn send_message(&self, username: &str, content: &str) -> reqwest::Response {
        self.client
            .post(self.url("/send-message"))
            .json(&json!({"username": username, "content": content}))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn list_messages(&self, token: &str) -> reqwest::Response {
        self.client
            .get(self.url("/messages"))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Message list of the token's owner, asserting success.
    pub async fn inbox(&self, token: &str) -> Vec<Value> {
        let response = self.list_messages(token).await;
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        body["messages"].as_array().cloned().unwrap_or_default()
    }

    pub async fn delete_message(&self, token: &str, message_id: i64) -> reqwest::Response {
        self.client
            .delete(self.url(&format!("/messages/{}", message_id)))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn set_acceptance(&self, token: &str, accept: bool) -> reqwest::Response {
        self.client
            .post(self.url("/acceptance"))
            .bearer_auth(token)
            .json(&json!({"acceptMessages": accept}))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_acceptance(&self, token: &str) -> reqwest::Response {
        self.client
            .get(self.url("/acceptance"))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn message_count(&self, username: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages m JOIN accounts a ON m.account_id = a.id WHERE a.username = ?",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }
}

pub async fn status_and_body(response: reqwest::Response) -> (u16, Value) {
    let status = response.status().as_u16();
    let body: Value = response.json().await.unwrap();
    (status, body)
}
