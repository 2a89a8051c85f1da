//! Documentation handlers
//!
//! Public paginated listing; writes allowed to admins and the media
//! division's coordinator.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::Serialize;

use crate::entity::documentation;
use crate::error::{AppError, AppResult, OptionExt};
use crate::handlers::pengurus::PageQuery;
use crate::handlers::{validate_file, FormData};
use crate::middleware::auth::{CurrentUser, DbConn};
use crate::policy::{authorize, Policy};
use crate::routes::{ApiResponse, PageMeta};
use crate::state::AppState;
use crate::storage::UploadKind;
use crate::validation::Validator;

#[derive(Debug, Serialize)]
pub struct DocumentationResponse {
    pub id: i64,
    pub nama: String,
    pub deskripsi: String,
    pub tanggal: NaiveDate,
    pub lokasi: String,
    pub foto: String,
    pub foto_url: String,
    pub created_at: sea_orm::prelude::DateTimeUtc,
    pub updated_at: sea_orm::prelude::DateTimeUtc,
}

impl From<documentation::Model> for DocumentationResponse {
    fn from(model: documentation::Model) -> Self {
        Self {
            id: model.id,
            nama: model.nama,
            deskripsi: model.deskripsi,
            tanggal: model.tanggal,
            lokasi: model.lokasi,
            foto_url: format!("/api/files/{}", model.foto),
            foto: model.foto,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentationIndexResponse {
    pub message: String,
    pub data: Vec<DocumentationResponse>,
    pub meta: PageMeta,
}

/// GET /api/documentations
pub async fn index(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<DocumentationIndexResponse>> {
    let page_size = state.config.listing.documentation_page_size.max(1);
    let paginator = documentation::Entity::find()
        .order_by_desc(documentation::Column::CreatedAt)
        .paginate(&*db, page_size);

    let last_page = paginator.num_pages().await?.max(1);
    let current_page = query.page.unwrap_or(1).max(1).min(last_page);
    let rows = paginator.fetch_page(current_page - 1).await?;

    Ok(Json(DocumentationIndexResponse {
        message: "success".to_string(),
        data: rows.into_iter().map(DocumentationResponse::from).collect(),
        meta: PageMeta { current_page, last_page },
    }))
}

/// GET /api/documentations/{id}
pub async fn show(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<DocumentationResponse>>> {
    let model = documentation::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    Ok(Json(ApiResponse::new("success", model.into())))
}

/// POST /api/documentations
pub async fn store(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<DocumentationResponse>>)> {
    authorize(
        &db,
        &state.config.media_division,
        &current_user,
        Policy::AdminOrMediaCoordinator,
    )
    .await?;

    let form = FormData::read(multipart, "foto").await?;

    let mut v = Validator::new();
    v.required("nama", form.get("nama"))
        .max_len("nama", form.get("nama"), 50)
        .required("deskripsi", form.get("deskripsi"))
        .required("tanggal", form.get("tanggal"))
        .date("tanggal", form.get("tanggal"))
        .required("lokasi", form.get("lokasi"))
        .max_len("lokasi", form.get("lokasi"), 255);
    validate_file(
        &mut v,
        "foto",
        form.file.as_ref(),
        UploadKind::Image,
        true,
        state.config.max_upload_size,
    );
    v.finish()?;

    let tanggal = parse_date(form.get("tanggal").unwrap_or_default())?;

    let file = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("The foto field is required.".to_string()))?;
    let foto = state
        .store
        .save("documentations", &file.file_name, &file.bytes)
        .await?;

    let now = Utc::now();
    let model = documentation::ActiveModel {
        nama: Set(form.get("nama").unwrap_or_default().to_string()),
        deskripsi: Set(form.get("deskripsi").unwrap_or_default().to_string()),
        tanggal: Set(tanggal),
        lokasi: Set(form.get("lokasi").unwrap_or_default().to_string()),
        foto: Set(foto),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Documentation created successfully",
            model.into(),
        )),
    ))
}

/// PUT /api/documentations/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<DocumentationResponse>>> {
    authorize(
        &db,
        &state.config.media_division,
        &current_user,
        Policy::AdminOrMediaCoordinator,
    )
    .await?;

    let existing = documentation::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    let form = FormData::read(multipart, "foto").await?;

    let mut v = Validator::new();
    if form.has("nama") {
        v.required("nama", form.get("nama")).max_len("nama", form.get("nama"), 50);
    }
    if form.has("deskripsi") {
        v.required("deskripsi", form.get("deskripsi"));
    }
    if form.has("tanggal") {
        v.required("tanggal", form.get("tanggal")).date("tanggal", form.get("tanggal"));
    }
    if form.has("lokasi") {
        v.required("lokasi", form.get("lokasi")).max_len("lokasi", form.get("lokasi"), 255);
    }
    validate_file(
        &mut v,
        "foto",
        form.file.as_ref(),
        UploadKind::Image,
        false,
        state.config.max_upload_size,
    );
    v.finish()?;

    let old_foto = existing.foto.clone();
    let mut model: documentation::ActiveModel = existing.into();

    if let Some(nama) = form.get("nama") {
        model.nama = Set(nama.to_string());
    }
    if let Some(deskripsi) = form.get("deskripsi") {
        model.deskripsi = Set(deskripsi.to_string());
    }
    if let Some(tanggal) = form.get("tanggal") {
        model.tanggal = Set(parse_date(tanggal)?);
    }
    if let Some(lokasi) = form.get("lokasi") {
        model.lokasi = Set(lokasi.to_string());
    }
    if let Some(file) = form.file.as_ref() {
        state.store.delete(&old_foto).await;
        let foto = state
            .store
            .save("documentations", &file.file_name, &file.bytes)
            .await?;
        model.foto = Set(foto);
    }
    model.updated_at = Set(Utc::now());

    let updated = model.update(&*db).await?;

    Ok(Json(ApiResponse::new(
        "Documentation updated successfully",
        updated.into(),
    )))
}

/// DELETE /api/documentations/{id}
pub async fn destroy(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    authorize(
        &db,
        &state.config.media_division,
        &current_user,
        Policy::AdminOrMediaCoordinator,
    )
    .await?;

    let existing = documentation::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    state.store.delete(&existing.foto).await;
    documentation::Entity::delete_by_id(id).exec(&*db).await?;

    Ok(Json(ApiResponse::message("Documentation deleted successfully")))
}

/// Parse a `YYYY-MM-DD` value that already passed validation
fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| AppError::BadRequest(format!("Invalid date: {}", e)))
}
