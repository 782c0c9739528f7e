#![allow(dead_code)]

use argon2::Params;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use quill_api::config::Environment;
use quill_api::password::Passwords;
use quill_api::{AppState, AppStateInner, Config, build_router};
use quill_db::Database;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const ADMIN_EMAIL: &str = "admin@example.com";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    // Held so the upload directory outlives the app.
    pub uploads: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_environment(Environment::Development)
    }

    pub fn with_environment(environment: Environment) -> Self {
        Self::with_config(|config| config.environment = environment)
    }

    /// Test defaults, then `adjust` for the case at hand.
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let mut config = Config {
            jwt_secret: TEST_SECRET.into(),
            upload_dir: uploads.path().to_path_buf(),
            admin_emails: vec![ADMIN_EMAIL.into()],
            ..Config::default()
        };
        adjust(&mut config);

        // Cheap argon2 parameters keep the suite fast.
        let passwords = Passwords::new(Params::new(8, 1, 1, None).unwrap());
        let db = Database::open_in_memory().unwrap();
        let state = AppStateInner::new(db, config, passwords);

        TestApp {
            router: build_router(state.clone()),
            state,
            uploads,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
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

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    /// Register an account and return its token and user body.
    pub async fn register(&self, name: &str, email: &str) -> (String, Value) {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "name": name,
                    "email": email,
                    "password": "hunter22",
                    "answer": "blue",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let token = body["token"].as_str().unwrap().to_string();
        (token, body["user"].clone())
    }

    pub async fn admin(&self) -> String {
        self.register("Admin", ADMIN_EMAIL).await.0
    }

    pub async fn create_blog(&self, token: &str, body: Value) -> Value {
        let (status, body) = self
            .request(Method::POST, "/api/v1/blogs", Some(token), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create blog failed: {}", body);
        body["data"].clone()
    }
}
