//! Division handlers
//!
//! Public directory of organizational units.

use axum::{Extension, Json};
use sea_orm::{EntityTrait, QueryOrder};
use serde::Serialize;

use crate::entity::division;
use crate::error::AppResult;
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

#[derive(Debug, Serialize)]
pub struct DivisionItem {
    pub id: i64,
    pub nama: String,
}

/// GET /api/divisions
pub async fn index(Extension(db): Extension<DbConn>) -> AppResult<Json<ApiResponse<Vec<DivisionItem>>>> {
    let divisions = division::Entity::find()
        .order_by_asc(division::Column::Id)
        .all(&*db)
        .await?;

    let data = divisions
        .into_iter()
        .map(|d| DivisionItem { id: d.id, nama: d.nama })
        .collect();

    Ok(Json(ApiResponse::new("success", data)))
}
