#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use cms_admin_backend::config::AppConfig;
use cms_admin_backend::infrastructure::database;
use cms_admin_backend::services::storage::{StorageError, StorageService};
use cms_admin_backend::{AppState, create_app};
use http_body_util::BodyExt;
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use tracing_subscriber::{EnvFilter, fmt};

pub fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("cms_admin_backend=debug"))
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

/// In-memory object store. Presigned URLs point at `object_base/<key>`.
pub struct MockStorageService {
    pub objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    pub object_base: String,
    /// Presigning any key containing this fragment fails
    pub fail_presign_on: Option<String>,
    pub fail_delete: AtomicBool,
    /// Deleting any key containing this fragment fails
    pub fail_delete_on: Option<String>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::with_base("http://mock-store.local/obj")
    }

    pub fn with_base(object_base: &str) -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            object_base: object_base.trim_end_matches('/').to_string(),
            fail_presign_on: None,
            fail_delete: AtomicBool::new(false),
            fail_delete_on: None,
        }
    }

    pub fn failing_presign(fragment: &str) -> Self {
        Self {
            fail_presign_on: Some(fragment.to_string()),
            ..Self::new()
        }
    }

    pub fn put(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn presign_put(
        &self,
        key: &str,
        _content_type: &str,
        _expires_in: Duration,
    ) -> Result<String, StorageError> {
        if let Some(fragment) = &self.fail_presign_on {
            if key.contains(fragment.as_str()) {
                return Err(StorageError::Provider(format!("cannot sign {}", key)));
            }
        }
        Ok(format!("{}/{}", self.object_base, key))
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        let refused = self
            .fail_delete_on
            .as_deref()
            .is_some_and(|fragment| key.contains(fragment));
        if refused || self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::Provider("delete refused".to_string()));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn object_exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.contains(key))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: "integration-test-secret".to_string(),
        max_batch_files: 5,
        ..AppConfig::default()
    }
}

pub async fn test_app(storage: Arc<dyn StorageService>) -> (Router, AppState) {
    test_app_with_config(storage, test_config()).await
}

pub async fn test_app_with_config(
    storage: Arc<dyn StorageService>,
    config: AppConfig,
) -> (Router, AppState) {
    init_tracing();
    let db = setup_test_db().await;
    let state = AppState::new(db, storage, config);
    (create_app(state.clone()), state)
}

/// Sends a JSON request and returns the status with the parsed body
/// (`Value::Null` when the body is empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

pub async fn register_and_login(app: &Router, username: &str) -> String {
    let credentials = json!({ "username": username, "password": "password123" });

    let (status, body) = send(app, "POST", "/register", None, Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let (status, body) = send(app, "POST", "/login", None, Some(credentials)).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

pub fn presign_entry(key: &str, data: &[u8]) -> Value {
    json!({
        "key": key,
        "name": key.rsplit('/').next().unwrap_or(key),
        "content_type": "image/png",
        "size": data.len(),
        "checksum": cms_admin_backend::utils::hash::calculate_hash(data),
    })
}
