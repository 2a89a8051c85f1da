use axum::response::Json;
use serde::Serialize;

use super::ApiResponse;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::new(
        "success",
        HealthStatus {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    ))
}
