//! API Module
//!
//! HTTP API layer for the webhook server.

pub mod error;
pub mod health;
pub mod webhook;

use axum::{
    Router,
    routing::{any, get},
};
use runhook_runner::queue::JobQueue;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::service::ChecksumValidator;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub validator: Arc<ChecksumValidator>,
    pub queue: JobQueue,
}

impl AppState {
    pub fn new(validator: ChecksumValidator, queue: JobQueue) -> Self {
        Self {
            validator: Arc::new(validator),
            queue,
        }
    }
}

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Anything else is a webhook naming its script by path
        .route("/{*script_path}", any(webhook::receive_webhook))
        .fallback(webhook::missing_script)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
