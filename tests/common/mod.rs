use axum::{
    body::{self, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use cakeshop_api::{config::AppConfig, db, AppState};

const BOUNDARY: &str = "cakeshop-test-boundary";

/// Helper harness: application state backed by a throwaway SQLite database
/// and tempdir-backed image directories.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _tmp: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database and image state.
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let db_path = tmp.path().join("cakeshop_test.db");
        let upload_dir = tmp.path().join("uploads");
        let default_images_dir = tmp.path().join("images").join("default");

        let cfg = AppConfig {
            database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
            host: "127.0.0.1".to_string(),
            port: 13_000,
            environment: "test".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            public_base_url: Some("http://localhost:13000".to_string()),
            upload_dir: upload_dir.display().to_string(),
            default_images_dir: default_images_dir.display().to_string(),
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            auto_migrate: true,
            db_max_connections: 1,
            db_min_connections: 1,
            db_connect_timeout_secs: 5,
            db_idle_timeout_secs: 60,
            db_acquire_timeout_secs: 5,
        };

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("connect to test database");
        db::run_migrations(&pool).await.expect("run migrations");

        let state = AppState::new(Arc::new(pool), cfg);
        state.images.ensure_dirs().await.expect("create upload dir");
        std::fs::create_dir_all(&default_images_dir).expect("create default images dir");
        // A bundled default image so static serving can be exercised
        std::fs::write(default_images_dir.join("chocolate_cakes.jpg"), b"jpg-bytes")
            .expect("write default image");

        let router = cakeshop_api::app_router(state.clone());

        Self {
            router,
            state,
            _tmp: tmp,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("route request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Submit a multipart order form. `file` is (filename, content-type, bytes).
    pub async fn submit_order(
        &self,
        method: Method,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> Response {
        let body = multipart_body(fields, file);
        self.request(
            Request::builder()
                .method(method)
                .uri("/order")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    pub async fn delete_order(&self, payload: Value) -> Response {
        self.request(
            Request::builder()
                .method(Method::DELETE)
                .uri("/order")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Names of files currently present in the uploads directory.
    pub fn uploaded_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.state.images.upload_dir())
            .expect("read upload dir")
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Encode a multipart/form-data body with the shared test boundary.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body")
}
