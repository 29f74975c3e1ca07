//! Cakeshop API Library
//!
//! Backend for an online cake-ordering shop: order CRUD over HTTP with
//! photo uploads, per-category default images, and file lifecycle tied to
//! order records.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::get,
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use services::images::ImageStore;
use services::orders::OrderService;

/// Multipart bodies above this size are rejected outright; the image store
/// applies its own 5 MiB per-file ceiling below it.
const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub orders: Arc<OrderService>,
    pub images: Arc<ImageStore>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let images = Arc::new(ImageStore::new(&config.upload_dir));
        let orders = Arc::new(OrderService::new(db.clone(), images.clone()));
        Self {
            db,
            config,
            orders,
            images,
        }
    }
}

/// Order API routes
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api_status))
        .route("/health", get(health_check))
        .route(
            "/order",
            get(handlers::orders::list_orders)
                .post(handlers::orders::create_order)
                .put(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
}

/// Full application router: API routes, static image serving, docs, and
/// request tracing. CORS is layered on by the binary from its config.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(order_routes())
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .nest_service(
            "/images/default",
            ServeDir::new(&state.config.default_images_dir),
        )
        .merge(openapi::swagger_ui())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn api_status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "cakeshop-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Json(json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
