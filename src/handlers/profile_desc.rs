//! Profile description handlers
//!
//! Public reads; writes are superadmin-only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;

use crate::entity::profile_desc;
use crate::error::{AppResult, OptionExt};
use crate::middleware::auth::{CurrentUser, DbConn};
use crate::policy::{authorize, Policy};
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct ProfileDescRequest {
    pub deskripsi: Option<String>,
}

/// GET /api/profile-descs
pub async fn index(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<profile_desc::Model>>>> {
    let rows = profile_desc::Entity::find()
        .order_by_desc(profile_desc::Column::CreatedAt)
        .all(&*db)
        .await?;

    Ok(Json(ApiResponse::new("success", rows)))
}

/// GET /api/profile-descs/{id}
pub async fn show(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<profile_desc::Model>>> {
    let model = profile_desc::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    Ok(Json(ApiResponse::new("success", model)))
}

/// POST /api/profile-descs
pub async fn store(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Json(req): Json<ProfileDescRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<profile_desc::Model>>)> {
    authorize(&db, &state.config.media_division, &current_user, Policy::SuperadminOnly).await?;

    let mut v = Validator::new();
    v.required("deskripsi", req.deskripsi.as_deref());
    v.finish()?;

    let now = Utc::now();
    let model = profile_desc::ActiveModel {
        deskripsi: Set(req.deskripsi.unwrap_or_default()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("ProfileDesc created successfully", model)),
    ))
}

/// PUT /api/profile-descs/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<ProfileDescRequest>,
) -> AppResult<Json<ApiResponse<profile_desc::Model>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::SuperadminOnly).await?;

    let existing = profile_desc::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    let mut v = Validator::new();
    v.required("deskripsi", req.deskripsi.as_deref());
    v.finish()?;

    let mut model: profile_desc::ActiveModel = existing.into();
    model.deskripsi = Set(req.deskripsi.unwrap_or_default());
    model.updated_at = Set(Utc::now());

    let updated = model.update(&*db).await?;

    Ok(Json(ApiResponse::new("ProfileDesc updated successfully", updated)))
}

/// DELETE /api/profile-descs/{id}
pub async fn destroy(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::SuperadminOnly).await?;

    profile_desc::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    profile_desc::Entity::delete_by_id(id).exec(&*db).await?;

    Ok(Json(ApiResponse::message("ProfileDesc deleted successfully")))
}
