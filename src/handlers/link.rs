//! Link handlers
//!
//! Public reads; writes require admin or superadmin.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;

use crate::entity::link;
use crate::error::{AppResult, OptionExt};
use crate::middleware::auth::{CurrentUser, DbConn};
use crate::policy::{authorize, Policy};
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub nama: Option<String>,
    pub link: Option<String>,
}

fn validate_link(v: &mut Validator, req: &LinkRequest) {
    v.required("nama", req.nama.as_deref())
        .max_len("nama", req.nama.as_deref(), 255)
        .required("link", req.link.as_deref());
    if let Some(url) = req.link.as_deref() {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            v.fail("link", "The link field must be a valid URL.");
        }
    }
}

/// GET /api/links
pub async fn index(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<link::Model>>>> {
    let rows = link::Entity::find()
        .order_by_desc(link::Column::CreatedAt)
        .all(&*db)
        .await?;

    Ok(Json(ApiResponse::new("success", rows)))
}

/// GET /api/links/{id}
pub async fn show(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<link::Model>>> {
    let model = link::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    Ok(Json(ApiResponse::new("success", model)))
}

/// POST /api/links
pub async fn store(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Json(req): Json<LinkRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<link::Model>>)> {
    authorize(&db, &state.config.media_division, &current_user, Policy::AdminOrSuperadmin).await?;

    let mut v = Validator::new();
    validate_link(&mut v, &req);
    v.finish()?;

    let now = Utc::now();
    let model = link::ActiveModel {
        nama: Set(req.nama.unwrap_or_default()),
        link: Set(req.link.unwrap_or_default()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Link created successfully", model)),
    ))
}

/// PUT /api/links/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<LinkRequest>,
) -> AppResult<Json<ApiResponse<link::Model>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::AdminOrSuperadmin).await?;

    let existing = link::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    let mut v = Validator::new();
    validate_link(&mut v, &req);
    v.finish()?;

    let mut model: link::ActiveModel = existing.into();
    model.nama = Set(req.nama.unwrap_or_default());
    model.link = Set(req.link.unwrap_or_default());
    model.updated_at = Set(Utc::now());

    let updated = model.update(&*db).await?;

    Ok(Json(ApiResponse::new("Link updated successfully", updated)))
}

/// DELETE /api/links/{id}
pub async fn destroy(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::AdminOrSuperadmin).await?;

    link::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    link::Entity::delete_by_id(id).exec(&*db).await?;

    Ok(Json(ApiResponse::message("Link deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_validation() {
        let mut v = Validator::new();
        validate_link(
            &mut v,
            &LinkRequest {
                nama: Some("Google Drive KBMK".to_string()),
                link: Some("https://drive.google.com/drive/folders/xyz".to_string()),
            },
        );
        assert!(v.is_ok());

        let mut v = Validator::new();
        validate_link(
            &mut v,
            &LinkRequest {
                nama: Some("Drive".to_string()),
                link: Some("drive.google.com".to_string()),
            },
        );
        assert!(!v.is_ok());

        let mut v = Validator::new();
        validate_link(&mut v, &LinkRequest { nama: None, link: None });
        assert!(!v.is_ok());
    }
}
