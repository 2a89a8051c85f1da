//! Schedule handlers
//!
//! Public reads; writes are superadmin-only. JSON bodies, no file fields.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;

use crate::entity::schedule;
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::auth::{CurrentUser, DbConn};
use crate::policy::{authorize, Policy};
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub nama: Option<String>,
    pub tanggal: Option<String>,
    pub deskripsi: Option<String>,
}

/// GET /api/schedules
pub async fn index(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<schedule::Model>>>> {
    let rows = schedule::Entity::find()
        .order_by_desc(schedule::Column::CreatedAt)
        .all(&*db)
        .await?;

    Ok(Json(ApiResponse::new("success", rows)))
}

/// GET /api/schedules/{id}
pub async fn show(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<schedule::Model>>> {
    let model = schedule::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    Ok(Json(ApiResponse::new("success", model)))
}

/// POST /api/schedules
pub async fn store(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Json(req): Json<ScheduleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<schedule::Model>>)> {
    authorize(&db, &state.config.media_division, &current_user, Policy::SuperadminOnly).await?;

    let mut v = Validator::new();
    v.required("nama", req.nama.as_deref())
        .max_len("nama", req.nama.as_deref(), 255)
        .required("tanggal", req.tanggal.as_deref())
        .date("tanggal", req.tanggal.as_deref())
        .required("deskripsi", req.deskripsi.as_deref());
    v.finish()?;

    let tanggal = parse_date(req.tanggal.as_deref().unwrap_or_default())?;

    let now = Utc::now();
    let model = schedule::ActiveModel {
        nama: Set(req.nama.unwrap_or_default()),
        tanggal: Set(tanggal),
        deskripsi: Set(req.deskripsi.unwrap_or_default()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Schedule created successfully", model)),
    ))
}

/// PUT /api/schedules/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<ScheduleRequest>,
) -> AppResult<Json<ApiResponse<schedule::Model>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::SuperadminOnly).await?;

    let existing = schedule::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    let mut v = Validator::new();
    if req.nama.is_some() {
        v.required("nama", req.nama.as_deref()).max_len("nama", req.nama.as_deref(), 255);
    }
    if req.tanggal.is_some() {
        v.date("tanggal", req.tanggal.as_deref());
    }
    if req.deskripsi.is_some() {
        v.required("deskripsi", req.deskripsi.as_deref());
    }
    v.finish()?;

    let mut model: schedule::ActiveModel = existing.into();
    if let Some(nama) = req.nama {
        model.nama = Set(nama);
    }
    if let Some(tanggal) = req.tanggal.as_deref() {
        model.tanggal = Set(parse_date(tanggal)?);
    }
    if let Some(deskripsi) = req.deskripsi {
        model.deskripsi = Set(deskripsi);
    }
    model.updated_at = Set(Utc::now());

    let updated = model.update(&*db).await?;

    Ok(Json(ApiResponse::new("Schedule updated successfully", updated)))
}

/// DELETE /api/schedules/{id}
pub async fn destroy(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::SuperadminOnly).await?;

    schedule::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    schedule::Entity::delete_by_id(id).exec(&*db).await?;

    Ok(Json(ApiResponse::message("Schedule deleted successfully")))
}

fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| AppError::BadRequest(format!("Invalid date: {}", e)))
}
