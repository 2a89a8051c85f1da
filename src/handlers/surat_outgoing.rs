//! Outgoing letter handlers
//!
//! Admin-only CRUD over letters issued by the organization. The letter
//! document is uploaded as multipart; the creator is recorded from the
//! authenticated caller.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;

use crate::entity::surat_outgoing;
use crate::entity::user::{self, UserSimple};
use crate::error::{AppError, AppResult, OptionExt};
use crate::handlers::surat_request::generate_nomor;
use crate::handlers::{validate_file, FormData};
use crate::middleware::auth::{CurrentUser, DbConn};
use crate::policy::{authorize, Policy};
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::storage::UploadKind;
use crate::validation::Validator;

/// An outgoing letter together with its creator
#[derive(Debug, Serialize)]
pub struct SuratOutgoingDetail {
    #[serde(flatten)]
    pub surat: surat_outgoing::Model,
    pub file_url: String,
    pub dibuat_oleh_user: Option<UserSimple>,
}

impl SuratOutgoingDetail {
    fn build(surat: surat_outgoing::Model, creator: Option<UserSimple>) -> Self {
        Self {
            file_url: format!("/api/files/{}", surat.file_surat),
            dibuat_oleh_user: creator,
            surat,
        }
    }
}

/// GET /api/surat-outgoing
pub async fn index(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Vec<SuratOutgoingDetail>>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::AdminOrSuperadmin).await?;

    let letters = surat_outgoing::Entity::find()
        .order_by_desc(surat_outgoing::Column::CreatedAt)
        .all(&*db)
        .await?;

    let creator_ids: Vec<i64> = letters.iter().map(|l| l.dibuat_oleh).collect();
    let creators: HashMap<i64, UserSimple> = user::Entity::find()
        .filter(user::Column::Id.is_in(creator_ids))
        .all(&*db)
        .await?
        .into_iter()
        .map(|u| (u.id, UserSimple::from(u)))
        .collect();

    let data = letters
        .into_iter()
        .map(|surat| {
            let creator = creators.get(&surat.dibuat_oleh).cloned();
            SuratOutgoingDetail::build(surat, creator)
        })
        .collect();

    Ok(Json(ApiResponse::new("success", data)))
}

/// GET /api/surat-outgoing/{id}
pub async fn show(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<SuratOutgoingDetail>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::AdminOrSuperadmin).await?;

    let surat = surat_outgoing::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Surat tidak ditemukan.")?;

    let creator = user::Entity::find_by_id(surat.dibuat_oleh)
        .one(&*db)
        .await?
        .map(UserSimple::from);

    Ok(Json(ApiResponse::new(
        "success",
        SuratOutgoingDetail::build(surat, creator),
    )))
}

/// POST /api/surat-outgoing
pub async fn store(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<SuratOutgoingDetail>>)> {
    authorize(&db, &state.config.media_division, &current_user, Policy::AdminOrSuperadmin).await?;

    let form = FormData::read(multipart, "file_surat").await?;

    let mut v = Validator::new();
    v.required("perihal", form.get("perihal"))
        .max_len("perihal", form.get("perihal"), 255)
        .required("tujuan", form.get("tujuan"))
        .required("jenis_surat", form.get("jenis_surat"))
        .max_len("jenis_surat", form.get("jenis_surat"), 255);
    validate_file(
        &mut v,
        "file_surat",
        form.file.as_ref(),
        UploadKind::Document,
        true,
        state.config.max_upload_size,
    );
    v.finish()?;

    let file = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("The file_surat field is required.".to_string()))?;
    let file_surat = state
        .store
        .save("surat_outgoing", &file.file_name, &file.bytes)
        .await?;

    let nomor_surat = unique_nomor(&db).await?;

    let now = Utc::now();
    let surat = surat_outgoing::ActiveModel {
        nomor_surat: Set(nomor_surat),
        perihal: Set(form.get("perihal").unwrap_or_default().to_string()),
        tujuan: Set(form.get("tujuan").unwrap_or_default().to_string()),
        jenis_surat: Set(form.get("jenis_surat").unwrap_or_default().to_string()),
        file_surat: Set(file_surat),
        dibuat_oleh: Set(current_user.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    let creator = Some(UserSimple {
        id: current_user.id,
        username: current_user.username.clone(),
        email: current_user.email.clone(),
    });

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Surat keluar berhasil dibuat.",
            SuratOutgoingDetail::build(surat, creator),
        )),
    ))
}

/// PUT /api/surat-outgoing/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<SuratOutgoingDetail>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::AdminOrSuperadmin).await?;

    let existing = surat_outgoing::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Surat tidak ditemukan.")?;

    let form = FormData::read(multipart, "file_surat").await?;

    let mut v = Validator::new();
    if form.has("perihal") {
        v.required("perihal", form.get("perihal")).max_len("perihal", form.get("perihal"), 255);
    }
    if form.has("tujuan") {
        v.required("tujuan", form.get("tujuan"));
    }
    if form.has("jenis_surat") {
        v.required("jenis_surat", form.get("jenis_surat"))
            .max_len("jenis_surat", form.get("jenis_surat"), 255);
    }
    validate_file(
        &mut v,
        "file_surat",
        form.file.as_ref(),
        UploadKind::Document,
        false,
        state.config.max_upload_size,
    );
    v.finish()?;

    let old_file = existing.file_surat.clone();
    let mut model: surat_outgoing::ActiveModel = existing.into();

    if let Some(perihal) = form.get("perihal") {
        model.perihal = Set(perihal.to_string());
    }
    if let Some(tujuan) = form.get("tujuan") {
        model.tujuan = Set(tujuan.to_string());
    }
    if let Some(jenis_surat) = form.get("jenis_surat") {
        model.jenis_surat = Set(jenis_surat.to_string());
    }
    if let Some(file) = form.file.as_ref() {
        state.store.delete(&old_file).await;
        let file_surat = state
            .store
            .save("surat_outgoing", &file.file_name, &file.bytes)
            .await?;
        model.file_surat = Set(file_surat);
    }
    model.updated_at = Set(Utc::now());

    let updated = model.update(&*db).await?;

    let creator = user::Entity::find_by_id(updated.dibuat_oleh)
        .one(&*db)
        .await?
        .map(UserSimple::from);

    Ok(Json(ApiResponse::new(
        "Surat keluar berhasil diperbarui.",
        SuratOutgoingDetail::build(updated, creator),
    )))
}

/// DELETE /api/surat-outgoing/{id}
pub async fn destroy(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::AdminOrSuperadmin).await?;

    let existing = surat_outgoing::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Surat tidak ditemukan.")?;

    state.store.delete(&existing.file_surat).await;
    surat_outgoing::Entity::delete_by_id(id).exec(&*db).await?;

    Ok(Json(ApiResponse::message("Surat keluar berhasil dihapus.")))
}

async fn unique_nomor(db: &sea_orm::DatabaseConnection) -> AppResult<String> {
    // Collisions are rare; a handful of retries is plenty
    for _ in 0..5 {
        let nomor = generate_nomor("SK");
        let taken = surat_outgoing::Entity::find()
            .filter(surat_outgoing::Column::NomorSurat.eq(nomor.as_str()))
            .one(db)
            .await?
            .is_some();
        if !taken {
            return Ok(nomor);
        }
    }
    Err(AppError::Internal("Gagal membuat nomor surat.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn letter(nomor: &str) -> surat_outgoing::Model {
        let now = Utc::now();
        surat_outgoing::Model {
            id: 1,
            nomor_surat: nomor.to_string(),
            perihal: "Undangan rapat".to_string(),
            tujuan: "Mitra KBMK".to_string(),
            jenis_surat: "Undangan".to_string(),
            file_surat: "surat_outgoing/x.pdf".to_string(),
            dibuat_oleh: 2,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_unique_nomor_retries_past_collision() {
        // first draw collides with an existing row, the second is free
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![letter("SK-20250101-AB12")], Vec::new()])
            .into_connection();

        let nomor = unique_nomor(&db).await.unwrap();
        assert!(nomor.starts_with("SK-"));
    }

    #[tokio::test]
    async fn test_unique_nomor_gives_up_after_retries() {
        let collisions: Vec<Vec<surat_outgoing::Model>> =
            (0..5).map(|_| vec![letter("SK-20250101-AB12")]).collect();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(collisions)
            .into_connection();

        let err = unique_nomor(&db).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
