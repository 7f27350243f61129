//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Request/response types

pub mod middleware;
pub mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use revguard_core::detect::DetectionConfig;
use revguard_core::ingest::{HeaderPolicy, UploadConfig};
use revguard_shared::{AppConfig, JwtService};

/// Headroom on top of the upload byte cap for multipart framing and the
/// small text fields that ride along with the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Explicit configuration for the upload processing pipeline.
///
/// Built once from [`AppConfig`] and passed into every pipeline call so
/// limits and thresholds never live in process-wide mutable state.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Upload size limits.
    pub upload: UploadConfig,
    /// Detection rule thresholds.
    pub detection: DetectionConfig,
    /// Default-header matching policy.
    pub header_policy: HeaderPolicy,
}

impl PipelineSettings {
    /// Builds pipeline settings from the application configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            upload: UploadConfig {
                max_bytes: config.upload.max_bytes,
            },
            detection: DetectionConfig {
                amount_ceiling: config.detection.amount_ceiling,
            },
            header_policy: HeaderPolicy::default(),
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Upload pipeline configuration.
    pub pipeline: Arc<PipelineSettings>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.pipeline.upload.max_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
