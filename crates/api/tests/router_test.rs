//! Router-level tests that need no database.
//!
//! These exercise the public health endpoint and the authentication
//! boundary; the state carries a disconnected pool that is never touched.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header::AUTHORIZATION};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use tower::ServiceExt;
use uuid::Uuid;

use revguard_api::{AppState, PipelineSettings, create_router};
use revguard_core::detect::DetectionConfig;
use revguard_core::ingest::{HeaderPolicy, UploadConfig};
use revguard_shared::{JwtConfig, JwtService};

fn test_state() -> AppState {
    let jwt_service = JwtService::new(JwtConfig {
        secret: "test-secret-key-for-testing".to_string(),
        access_token_expiry_secs: 900,
    });

    AppState {
        db: Arc::new(DatabaseConnection::Disconnected),
        jwt_service: Arc::new(jwt_service),
        pipeline: Arc::new(PipelineSettings {
            upload: UploadConfig::default(),
            detection: DetectionConfig::default(),
            header_policy: HeaderPolicy::default(),
        }),
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = create_router(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = create_router(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = create_router(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/uploads")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "missing_token");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = create_router(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/notifications")
                .header(AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "invalid_token");
}

#[tokio::test]
async fn test_wrong_secret_token_is_rejected() {
    let state = test_state();
    let app = create_router(state);

    let other_issuer = JwtService::new(JwtConfig {
        secret: "a-completely-different-secret".to_string(),
        access_token_expiry_secs: 900,
    });
    let token = other_issuer.generate_access_token(Uuid::new_v4()).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/uploads")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_alert_rule_catalog_lists_vocabulary() {
    let state = test_state();
    let token = state
        .jwt_service
        .generate_access_token(Uuid::new_v4())
        .unwrap();
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/alert-rules/catalog")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let metrics: Vec<&str> = json["metrics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert!(metrics.contains(&"total_impact"));
    assert!(metrics.contains(&"duplicate_count"));
    assert!(metrics.contains(&"total_impact_delta"));

    let comparators = json["comparators"].as_array().unwrap();
    assert_eq!(comparators.len(), 4);
    let severities = json["severities"].as_array().unwrap();
    assert_eq!(severities.len(), 4);
}
