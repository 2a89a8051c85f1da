//! Incoming letter workflow
//!
//! Public submission creates a `pending` request; admins forward it to a
//! coordinator by creating a disposition, and the assignee drives both the
//! disposition and (indirectly) the parent request through their statuses.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::surat_disposition::{self, DispositionStatus};
use crate::entity::surat_request::{self, SuratStatus};
use crate::entity::user::{self, UserSimple};
use crate::error::{AppError, AppResult, OptionExt};
use crate::handlers::{validate_file, FormData};
use crate::middleware::auth::{CurrentUser, DbConn};
use crate::policy::{authorize, Policy};
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::storage::UploadKind;
use crate::validation::{ValidationErrors, Validator};

/// A single-field 422
fn field_error(field: &str, message: &str) -> AppError {
    let mut errors = ValidationErrors::default();
    errors.add(field, message);
    AppError::Validation(errors)
}

const NOMOR_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a letter number, `{prefix}-YYYYMMDD-XXXX`
pub fn generate_nomor(prefix: &str) -> String {
    let date = Utc::now().format("%Y%m%d");
    let bytes = Uuid::new_v4().into_bytes();
    let suffix: String = bytes[..4]
        .iter()
        .map(|b| NOMOR_CHARSET[*b as usize % NOMOR_CHARSET.len()] as char)
        .collect();
    format!("{}-{}-{}", prefix, date, suffix)
}

/// A disposition together with its assignee
#[derive(Debug, Serialize)]
pub struct DispositionDetail {
    #[serde(flatten)]
    pub disposition: surat_disposition::Model,
    pub assigned_user: Option<UserSimple>,
}

/// A request together with its disposition history
#[derive(Debug, Serialize)]
pub struct SuratRequestDetail {
    #[serde(flatten)]
    pub request: surat_request::Model,
    pub file_url: String,
    pub dispositions: Vec<DispositionDetail>,
}

/// POST /api/surat-requests (public)
pub async fn store(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<surat_request::Model>>)> {
    let form = FormData::read(multipart, "file_surat").await?;

    let mut v = Validator::new();
    v.required("nama_pengirim", form.get("nama_pengirim"))
        .max_len("nama_pengirim", form.get("nama_pengirim"), 255)
        .email("email_pengirim", form.get("email_pengirim"))
        .max_len("email_pengirim", form.get("email_pengirim"), 255)
        .required("perihal", form.get("perihal"))
        .max_len("perihal", form.get("perihal"), 255)
        .required("tujuan", form.get("tujuan"))
        .max_len("asal_instansi", form.get("asal_instansi"), 255)
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
        .save("surat_requests", &file.file_name, &file.bytes)
        .await?;

    let nomor_surat = unique_nomor(&db, "SR").await?;

    let optional = |name: &str| {
        form.get(name)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let now = Utc::now();
    let model = surat_request::ActiveModel {
        nomor_surat: Set(nomor_surat),
        nama_pengirim: Set(form.get("nama_pengirim").unwrap_or_default().to_string()),
        email_pengirim: Set(optional("email_pengirim")),
        perihal: Set(form.get("perihal").unwrap_or_default().to_string()),
        tujuan: Set(form.get("tujuan").unwrap_or_default().to_string()),
        asal_instansi: Set(optional("asal_instansi")),
        jenis_surat: Set(form.get("jenis_surat").unwrap_or_default().to_string()),
        file_surat: Set(file_surat),
        status: Set(SuratStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Surat berhasil diajukan.", model)),
    ))
}

/// GET /api/surat-requests
pub async fn index(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Vec<SuratRequestDetail>>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::AdminOrSuperadmin).await?;

    let requests = surat_request::Entity::find()
        .order_by_desc(surat_request::Column::CreatedAt)
        .all(&*db)
        .await?;

    let request_ids: Vec<i64> = requests.iter().map(|r| r.id).collect();
    let dispositions = surat_disposition::Entity::find()
        .filter(surat_disposition::Column::SuratRequestId.is_in(request_ids))
        .order_by_desc(surat_disposition::Column::CreatedAt)
        .all(&*db)
        .await?;

    let assignee_ids: Vec<i64> = dispositions.iter().map(|d| d.assigned_to).collect();
    let users: HashMap<i64, UserSimple> = user::Entity::find()
        .filter(user::Column::Id.is_in(assignee_ids))
        .all(&*db)
        .await?
        .into_iter()
        .map(|u| (u.id, UserSimple::from(u)))
        .collect();

    let mut by_request: HashMap<i64, Vec<DispositionDetail>> = HashMap::new();
    for disposition in dispositions {
        let assigned_user = users.get(&disposition.assigned_to).cloned();
        by_request
            .entry(disposition.surat_request_id)
            .or_default()
            .push(DispositionDetail {
                disposition,
                assigned_user,
            });
    }

    let data = requests
        .into_iter()
        .map(|request| SuratRequestDetail {
            file_url: format!("/api/files/{}", request.file_surat),
            dispositions: by_request.remove(&request.id).unwrap_or_default(),
            request,
        })
        .collect();

    Ok(Json(ApiResponse::new("success", data)))
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assigned_to: Option<i64>,
    pub catatan: Option<String>,
}

/// PATCH /api/surat-requests/{id}/assign
pub async fn assign(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<AssignRequest>,
) -> AppResult<Json<ApiResponse<surat_disposition::Model>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::AdminOrSuperadmin).await?;

    let Some(assigned_to) = req.assigned_to else {
        return Err(field_error("assigned_to", "The assigned_to field is required."));
    };

    let Some(assignee) = user::Entity::find_by_id(assigned_to).one(&*db).await? else {
        return Err(field_error("assigned_to", "The selected assigned_to is invalid."));
    };

    let request = surat_request::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Surat tidak ditemukan.")?;

    // Disposition insert and parent status change happen together or not at all
    let disposition = assign_in_txn(&db, &request, assigned_to, req.catatan.clone())
        .await
        .map_err(|e| {
            tracing::error!("Disposition transaction failed: {}", e);
            AppError::Internal("Gagal menugaskan surat.".to_string())
        })?;

    Ok(Json(ApiResponse::new(
        format!("Surat berhasil ditugaskan kepada {}.", assignee.username),
        disposition,
    )))
}

async fn assign_in_txn(
    db: &sea_orm::DatabaseConnection,
    request: &surat_request::Model,
    assigned_to: i64,
    catatan: Option<String>,
) -> Result<surat_disposition::Model, sea_orm::DbErr> {
    let txn = db.begin().await?;

    let now = Utc::now();
    let disposition = surat_disposition::ActiveModel {
        surat_request_id: Set(request.id),
        assigned_to: Set(assigned_to),
        catatan: Set(catatan),
        status: Set(DispositionStatus::BelumDibaca),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if request.status.can_advance_to(SuratStatus::Diteruskan) {
        let mut model: surat_request::ActiveModel = request.clone().into();
        model.status = Set(SuratStatus::Diteruskan);
        model.updated_at = Set(now);
        model.update(&txn).await?;
    }

    txn.commit().await?;
    Ok(disposition)
}

/// A disposition together with its parent request, for the assignee's inbox
#[derive(Debug, Serialize)]
pub struct MyDispositionItem {
    #[serde(flatten)]
    pub disposition: surat_disposition::Model,
    pub surat_request: Option<surat_request::Model>,
}

/// GET /api/my-dispositions
pub async fn my_dispositions(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Vec<MyDispositionItem>>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::Coordinator).await?;

    let dispositions = surat_disposition::Entity::find()
        .filter(surat_disposition::Column::AssignedTo.eq(current_user.id))
        .order_by_desc(surat_disposition::Column::CreatedAt)
        .all(&*db)
        .await?;

    let request_ids: Vec<i64> = dispositions.iter().map(|d| d.surat_request_id).collect();
    let requests: HashMap<i64, surat_request::Model> = surat_request::Entity::find()
        .filter(surat_request::Column::Id.is_in(request_ids))
        .all(&*db)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    let data = dispositions
        .into_iter()
        .map(|disposition| MyDispositionItem {
            surat_request: requests.get(&disposition.surat_request_id).cloned(),
            disposition,
        })
        .collect();

    Ok(Json(ApiResponse::new("success", data)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

/// PATCH /api/surat-dispositions/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<surat_disposition::Model>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::Coordinator).await?;

    let disposition = surat_disposition::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Disposisi tidak ditemukan.")?;

    if disposition.assigned_to != current_user.id {
        return Err(AppError::Forbidden("Unauthorized.".to_string()));
    }

    let mut v = Validator::new();
    v.required("status", req.status.as_deref())
        .one_of("status", req.status.as_deref(), &["diproses", "selesai"]);
    v.finish()?;

    let target = req
        .status
        .as_deref()
        .and_then(DispositionStatus::parse_update_target)
        .ok_or_else(|| AppError::BadRequest("The selected status is invalid.".to_string()))?;

    let request_id = disposition.surat_request_id;
    let now = Utc::now();

    let mut model: surat_disposition::ActiveModel = disposition.into();
    model.status = Set(target);
    model.updated_at = Set(now);
    let updated = model.update(&*db).await?;

    // Keep the parent request in step: `selesai` always wins, `diproses`
    // only moves the request forward
    if let Some(request) = surat_request::Entity::find_by_id(request_id).one(&*db).await? {
        let next = match target {
            DispositionStatus::Selesai => Some(SuratStatus::Selesai),
            DispositionStatus::Diproses if request.status.can_advance_to(SuratStatus::Diproses) => {
                Some(SuratStatus::Diproses)
            }
            _ => None,
        };
        if let Some(next) = next {
            if request.status != next {
                let mut parent: surat_request::ActiveModel = request.into();
                parent.status = Set(next);
                parent.updated_at = Set(now);
                parent.update(&*db).await?;
            }
        }
    }

    Ok(Json(ApiResponse::new("Status berhasil diperbarui.", updated)))
}

async fn unique_nomor(db: &sea_orm::DatabaseConnection, prefix: &str) -> AppResult<String> {
    // Collisions are rare; a handful of retries is plenty
    for _ in 0..5 {
        let nomor = generate_nomor(prefix);
        let taken = surat_request::Entity::find()
            .filter(surat_request::Column::NomorSurat.eq(nomor.as_str()))
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
    use crate::config::Config;
    use crate::entity::user::Role;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn coordinator(id: i64) -> CurrentUser {
        CurrentUser {
            id,
            username: format!("user{}", id),
            email: format!("user{}@gmail.com", id),
            role: Some(Role::KoorDivisi),
            division_id: Some(1),
            token_id: 1,
        }
    }

    fn disposition(id: i64, assigned_to: i64, status: DispositionStatus) -> surat_disposition::Model {
        let now = Utc::now();
        surat_disposition::Model {
            id,
            surat_request_id: 9,
            assigned_to,
            catatan: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(status: SuratStatus) -> surat_request::Model {
        let now = Utc::now();
        surat_request::Model {
            id: 9,
            nomor_surat: "SR-20250101-AB12".to_string(),
            nama_pengirim: "Budi".to_string(),
            email_pengirim: None,
            perihal: "Permohonan kerjasama".to_string(),
            tujuan: "Ketua KBMK".to_string(),
            asal_instansi: None,
            jenis_surat: "Permohonan".to_string(),
            file_surat: "surat_requests/x.pdf".to_string(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_update_status_rejects_non_assignee() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![disposition(1, 5, DispositionStatus::BelumDibaca)]])
            .into_connection();
        let db = Arc::new(db);
        let state = AppState::new(db.clone(), Config::default());

        let err = update_status(
            axum::extract::State(state),
            Extension(DbConn(db)),
            Extension(coordinator(3)),
            Path(1),
            Json(UpdateStatusRequest {
                status: Some("selesai".to_string()),
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_status_selesai_completes_parent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![disposition(1, 3, DispositionStatus::BelumDibaca)]])
            .append_query_results([vec![disposition(1, 3, DispositionStatus::Selesai)]])
            .append_query_results([vec![request(SuratStatus::Diteruskan)]])
            .append_query_results([vec![request(SuratStatus::Selesai)]])
            .into_connection();
        let db = Arc::new(db);
        let state = AppState::new(db.clone(), Config::default());

        let response = update_status(
            axum::extract::State(state),
            Extension(DbConn(db)),
            Extension(coordinator(3)),
            Path(1),
            Json(UpdateStatusRequest {
                status: Some("selesai".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.message, "Status berhasil diperbarui.");
        let updated = response.0.data.unwrap();
        assert_eq!(updated.status, DispositionStatus::Selesai);
    }

    #[tokio::test]
    async fn test_update_status_rejects_belum_dibaca_target() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![disposition(1, 3, DispositionStatus::BelumDibaca)]])
            .into_connection();
        let db = Arc::new(db);
        let state = AppState::new(db.clone(), Config::default());

        let err = update_status(
            axum::extract::State(state),
            Extension(DbConn(db)),
            Extension(coordinator(3)),
            Path(1),
            Json(UpdateStatusRequest {
                status: Some("belum dibaca".to_string()),
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_assign_forwards_pending_request() {
        let now = Utc::now();
        let assignee = user::Model {
            id: 3,
            username: "koordivmedia".to_string(),
            email: "koordivmedia@gmail.com".to_string(),
            password: "hash".to_string(),
            role: Some(Role::KoorDivisi),
            division_id: Some(1),
            created_at: now,
            updated_at: now,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![assignee]])
            .append_query_results([vec![request(SuratStatus::Pending)]])
            .append_query_results([vec![disposition(1, 3, DispositionStatus::BelumDibaca)]])
            .append_query_results([vec![request(SuratStatus::Diteruskan)]])
            .into_connection();
        let db = Arc::new(db);
        let state = AppState::new(db.clone(), Config::default());

        let admin = CurrentUser {
            role: Some(Role::Admin),
            ..coordinator(2)
        };
        let response = assign(
            axum::extract::State(state),
            Extension(DbConn(db)),
            Extension(admin),
            Path(9),
            Json(AssignRequest {
                assigned_to: Some(3),
                catatan: Some("Mohon ditindaklanjuti".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(
            response.0.message,
            "Surat berhasil ditugaskan kepada koordivmedia."
        );
        let created = response.0.data.unwrap();
        assert_eq!(created.status, DispositionStatus::BelumDibaca);
        assert_eq!(created.assigned_to, 3);
    }

    #[tokio::test]
    async fn test_assign_rejects_unknown_target() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let db = Arc::new(db);
        let state = AppState::new(db.clone(), Config::default());

        let admin = CurrentUser {
            role: Some(Role::Admin),
            ..coordinator(2)
        };
        let err = assign(
            axum::extract::State(state),
            Extension(DbConn(db)),
            Extension(admin),
            Path(9),
            Json(AssignRequest {
                assigned_to: Some(777),
                catatan: None,
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_nomor_format() {
        let nomor = generate_nomor("SR");
        let parts: Vec<&str> = nomor.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "SR");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_nomor_varies() {
        let nomors: std::collections::HashSet<String> =
            (0..50).map(|_| generate_nomor("SR")).collect();
        assert!(nomors.len() > 1);
    }

    #[test]
    fn test_nomor_prefix() {
        assert!(generate_nomor("SK").starts_with("SK-"));
    }
}
