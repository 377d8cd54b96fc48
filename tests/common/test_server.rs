use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use rolekeeper::auth::PasswordManager;
use rolekeeper::config::ServerConfig;
use rolekeeper::seed::{create_superadmin, seed_all};
use rolekeeper::server::{AppState, create_router};
use rolekeeper::store::{SqliteStore, Store};

pub const ADMIN_EMAIL: &str = "root@example.com";
pub const ADMIN_PASSWORD: &str = "root-password-123";

/// An in-process server bound to an ephemeral port over a fresh database.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub admin_token: String,
    pub client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            jwt_secret: "integration-test-secret-0123".to_string(),
            ..ServerConfig::default()
        };

        let store = SqliteStore::new(config.db_path()).expect("open store");
        store.initialize().expect("initialize store");
        seed_all(&store);
        create_superadmin(
            &store,
            &PasswordManager::new(),
            ADMIN_EMAIL,
            ADMIN_PASSWORD,
            "Root",
        )
        .expect("create superadmin");

        let state = Arc::new(AppState::new(Arc::new(store), config));
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let base_url = format!("http://127.0.0.1:{}", port);
        let client = reqwest::Client::new();
        Self::wait_for_ready(&client, &base_url).await;

        let mut server = Self {
            temp_dir,
            base_url,
            admin_token: String::new(),
            client,
            handle,
        };
        server.admin_token = server.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        server
    }

    async fn wait_for_ready(client: &reqwest::Client, base_url: &str) {
        for _ in 0..50 {
            if client
                .get(format!("{}/health", base_url))
                .send()
                .await
                .is_ok()
            {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        panic!("Server did not become ready");
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Logs in and returns the access token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let resp: Value = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&serde_json::json!({"email": email, "password": password}))
            .send()
            .await
            .expect("login")
            .json()
            .await
            .expect("parse login response");
        resp["data"]["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    /// POSTs to an admin endpoint and returns `(status, body)`.
    pub async fn admin_post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(&format!("/api/v1/admin{path}")))
            .bearer_auth(&self.admin_token)
            .json(&body)
            .send()
            .await
            .expect("admin post");
        let status = resp.status().as_u16();
        let body = resp.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// POSTs to an admin endpoint that must succeed and returns the new id.
    pub async fn admin_create(&self, path: &str, body: Value) -> String {
        let (status, resp) = self.admin_post(path, body).await;
        assert_eq!(status, 201, "POST {path} failed: {resp}");
        resp["data"]["id"].as_str().expect("id").to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
