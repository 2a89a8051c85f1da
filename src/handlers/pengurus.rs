//! Pengurus handlers
//!
//! Public ranked listing plus superadmin-only writes. The listing order is
//! derived from the jabatan rule table below, not from a stored column.

use std::collections::BTreeMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::entity::division::{self, DivisionResponse};
use crate::entity::pengurus;
use crate::error::{AppError, AppResult, OptionExt};
use crate::handlers::{validate_file, FormData};
use crate::middleware::auth::{CurrentUser, DbConn};
use crate::policy::{authorize, Policy};
use crate::routes::{ApiResponse, PageMeta};
use crate::state::AppState;
use crate::storage::UploadKind;
use crate::validation::Validator;

/// Ordered jabatan ranking rules: first case-insensitive substring match wins.
/// Titles matching no rule rank 15; a missing jabatan ranks last.
const JABATAN_RULES: [(&str, u32); 7] = [
    ("ketua", 1),
    ("sekretaris", 2),
    ("bendahara", 3),
    ("koordinator", 10),
    ("wakil", 11),
    ("staff", 20),
    ("anggota", 20),
];

const JABATAN_OTHER: u32 = 15;
const JABATAN_NONE: u32 = 999;

/// Priority of a jabatan under the rule table; lower sorts first
pub fn jabatan_priority(jabatan: Option<&str>) -> u32 {
    let Some(jabatan) = jabatan.filter(|j| !j.trim().is_empty()) else {
        return JABATAN_NONE;
    };
    let lowered = jabatan.to_lowercase();
    for (pattern, rank) in JABATAN_RULES {
        if lowered.contains(pattern) {
            return rank;
        }
    }
    JABATAN_OTHER
}

#[derive(Debug, Serialize)]
pub struct PengurusResponse {
    pub id: i64,
    pub nama: String,
    pub jabatan: Option<String>,
    pub division_id: Option<i64>,
    pub division: Option<DivisionResponse>,
    pub foto: String,
    pub foto_url: String,
    pub deskripsi: String,
    pub created_at: sea_orm::prelude::DateTimeUtc,
    pub updated_at: sea_orm::prelude::DateTimeUtc,
}

impl PengurusResponse {
    fn build(model: pengurus::Model, division: Option<division::Model>) -> Self {
        Self {
            id: model.id,
            nama: model.nama,
            jabatan: model.jabatan,
            division_id: model.division_id,
            division: division.map(DivisionResponse::from),
            foto_url: format!("/api/files/{}", model.foto),
            foto: model.foto,
            deskripsi: model.deskripsi,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PengurusIndexResponse {
    pub message: String,
    pub data: Vec<PengurusResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
}

/// GET /api/pengurus
///
/// Loads everything, ranks by the jabatan rule table with a stable sort,
/// then optionally slices a page when pagination is configured.
pub async fn index(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PengurusIndexResponse>> {
    let rows = pengurus::Entity::find()
        .order_by_asc(pengurus::Column::Id)
        .all(&*db)
        .await?;
    let divisions = load_divisions(&db).await?;

    let mut rows = rows;
    rows.sort_by_key(|p| jabatan_priority(p.jabatan.as_deref()));

    let page_size = state.config.listing.pengurus_page_size;
    let (rows, meta) = if page_size > 0 {
        let total = rows.len() as u64;
        let last_page = (total.max(1) + page_size - 1) / page_size;
        let current_page = query.page.unwrap_or(1).max(1).min(last_page);
        let start = ((current_page - 1) * page_size) as usize;
        let page: Vec<_> = rows.into_iter().skip(start).take(page_size as usize).collect();
        (page, Some(PageMeta { current_page, last_page }))
    } else {
        (rows, None)
    };

    let data = rows
        .into_iter()
        .map(|p| {
            let division = p.division_id.and_then(|id| divisions.get(&id).cloned());
            PengurusResponse::build(p, division)
        })
        .collect();

    Ok(Json(PengurusIndexResponse {
        message: "success".to_string(),
        data,
        meta,
    }))
}

/// GET /api/pengurus/{id}
pub async fn show(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<PengurusResponse>>> {
    let model = pengurus::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    let division = match model.division_id {
        Some(div_id) => division::Entity::find_by_id(div_id).one(&*db).await?,
        None => None,
    };

    Ok(Json(ApiResponse::new(
        "success",
        PengurusResponse::build(model, division),
    )))
}

/// POST /api/pengurus
pub async fn store(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<PengurusResponse>>)> {
    authorize(&db, &state.config.media_division, &current_user, Policy::SuperadminOnly).await?;

    let form = FormData::read(multipart, "foto").await?;

    let mut v = Validator::new();
    v.required("nama", form.get("nama"))
        .max_len("nama", form.get("nama"), 50)
        .required("division_id", form.get("division_id"))
        .max_len("jabatan", form.get("jabatan"), 100)
        .required("deskripsi", form.get("deskripsi"));
    validate_file(
        &mut v,
        "foto",
        form.file.as_ref(),
        UploadKind::Image,
        true,
        state.config.max_upload_size,
    );
    let division_id = parse_division_id(&db, &mut v, form.get("division_id")).await?;
    v.finish()?;

    let file = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("The foto field is required.".to_string()))?;
    let foto = state.store.save("pengurus", &file.file_name, &file.bytes).await?;

    let now = Utc::now();
    let model = pengurus::ActiveModel {
        nama: Set(form.get("nama").unwrap_or_default().to_string()),
        jabatan: Set(form.get("jabatan").map(|j| j.to_string()).filter(|j| !j.is_empty())),
        division_id: Set(division_id),
        foto: Set(foto),
        deskripsi: Set(form.get("deskripsi").unwrap_or_default().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    let division = match model.division_id {
        Some(div_id) => division::Entity::find_by_id(div_id).one(&*db).await?,
        None => None,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Pengurus created successfully",
            PengurusResponse::build(model, division),
        )),
    ))
}

/// PUT /api/pengurus/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<PengurusResponse>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::SuperadminOnly).await?;

    let existing = pengurus::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    let form = FormData::read(multipart, "foto").await?;

    let mut v = Validator::new();
    if form.has("nama") {
        v.required("nama", form.get("nama")).max_len("nama", form.get("nama"), 50);
    }
    if form.has("division_id") {
        v.required("division_id", form.get("division_id"));
    }
    if form.has("jabatan") {
        v.max_len("jabatan", form.get("jabatan"), 100);
    }
    if form.has("deskripsi") {
        v.required("deskripsi", form.get("deskripsi"));
    }
    validate_file(
        &mut v,
        "foto",
        form.file.as_ref(),
        UploadKind::Image,
        false,
        state.config.max_upload_size,
    );
    let division_id = if form.has("division_id") {
        parse_division_id(&db, &mut v, form.get("division_id")).await?
    } else {
        existing.division_id
    };
    v.finish()?;

    let old_foto = existing.foto.clone();
    let mut model: pengurus::ActiveModel = existing.into();

    if let Some(nama) = form.get("nama") {
        model.nama = Set(nama.to_string());
    }
    if form.has("jabatan") {
        model.jabatan = Set(form.get("jabatan").map(|j| j.to_string()).filter(|j| !j.is_empty()));
    }
    model.division_id = Set(division_id);
    if let Some(deskripsi) = form.get("deskripsi") {
        model.deskripsi = Set(deskripsi.to_string());
    }
    if let Some(file) = form.file.as_ref() {
        state.store.delete(&old_foto).await;
        let foto = state.store.save("pengurus", &file.file_name, &file.bytes).await?;
        model.foto = Set(foto);
    }
    model.updated_at = Set(Utc::now());

    let updated = model.update(&*db).await?;

    let division = match updated.division_id {
        Some(div_id) => division::Entity::find_by_id(div_id).one(&*db).await?,
        None => None,
    };

    Ok(Json(ApiResponse::new(
        "Pengurus updated successfully",
        PengurusResponse::build(updated, division),
    )))
}

/// DELETE /api/pengurus/{id}
pub async fn destroy(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    authorize(&db, &state.config.media_division, &current_user, Policy::SuperadminOnly).await?;

    let existing = pengurus::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    state.store.delete(&existing.foto).await;
    pengurus::Entity::delete_by_id(id).exec(&*db).await?;

    Ok(Json(ApiResponse::message("Pengurus deleted successfully")))
}

/// Parse and existence-check a division_id form value
async fn parse_division_id(
    db: &DatabaseConnection,
    v: &mut Validator,
    value: Option<&str>,
) -> AppResult<Option<i64>> {
    let Some(raw) = value.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let Ok(id) = raw.trim().parse::<i64>() else {
        v.fail("division_id", "The division_id field must be an integer.");
        return Ok(None);
    };
    if division::Entity::find_by_id(id).one(db).await?.is_none() {
        v.fail("division_id", "The selected division_id is invalid.");
        return Ok(None);
    }
    Ok(Some(id))
}

async fn load_divisions(db: &DatabaseConnection) -> AppResult<BTreeMap<i64, division::Model>> {
    let all = division::Entity::find().all(db).await?;
    Ok(all.into_iter().map(|d| (d.id, d)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jabatan_priority_rules() {
        assert_eq!(jabatan_priority(Some("Ketua Umum")), 1);
        assert_eq!(jabatan_priority(Some("Sekretaris")), 2);
        assert_eq!(jabatan_priority(Some("Bendahara Umum")), 3);
        assert_eq!(jabatan_priority(Some("Koordinator Divisi Media")), 10);
        assert_eq!(jabatan_priority(Some("Staff Divisi Humas")), 20);
        assert_eq!(jabatan_priority(Some("Anggota")), 20);
        assert_eq!(jabatan_priority(Some("Penasihat")), 15);
        assert_eq!(jabatan_priority(None), 999);
        assert_eq!(jabatan_priority(Some("")), 999);
        assert_eq!(jabatan_priority(Some("  ")), 999);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // "Wakil Ketua" matches the ketua rule before the wakil rule
        assert_eq!(jabatan_priority(Some("Wakil Ketua")), 1);
        // "Wakil Koordinator" matches koordinator before wakil
        assert_eq!(jabatan_priority(Some("Wakil Koordinator")), 10);
        assert_eq!(jabatan_priority(Some("Wakil")), 11);
    }

    #[test]
    fn test_priority_is_case_insensitive() {
        assert_eq!(jabatan_priority(Some("KETUA")), 1);
        assert_eq!(jabatan_priority(Some("bEnDaHaRa")), 3);
    }

    #[test]
    fn test_listing_order_property() {
        let jabatans = [
            Some("Staff Divisi Media"),
            Some("Ketua Umum"),
            None,
            Some("Penasihat"),
            Some("Koordinator Divisi Humas"),
            Some("Sekretaris"),
            Some("Wakil Sekretaris"),
        ];

        let mut priorities: Vec<u32> =
            jabatans.iter().map(|j| jabatan_priority(*j)).collect();
        priorities.sort();

        for pair in priorities.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert_eq!(priorities.first(), Some(&1));
        assert_eq!(priorities.last(), Some(&999));
    }

    #[test]
    fn test_stable_sort_preserves_underlying_order() {
        // two staff entries keep their relative order after ranking
        let mut rows = vec![
            (1, Some("Staff Divisi Media")),
            (2, Some("Ketua Umum")),
            (3, Some("Staff Divisi Humas")),
        ];
        rows.sort_by_key(|(_, j)| jabatan_priority(*j));
        let ids: Vec<i64> = rows.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
