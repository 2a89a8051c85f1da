//! Pengurus entity
//!
//! People records linked to a division. Listing order is derived from the
//! jabatan ranking rule table (see handlers::pengurus).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pengurus")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(50))")]
    pub nama: String,

    /// Position title, free text ("Ketua Umum", "Koordinator Divisi Media", ...)
    #[sea_orm(column_type = "String(Some(100))", nullable)]
    pub jabatan: Option<String>,

    #[sea_orm(nullable)]
    pub division_id: Option<i64>,

    /// Stored photo path, e.g. `pengurus/{uuid}.jpg`
    #[sea_orm(column_type = "String(Some(255))")]
    pub foto: String,

    #[sea_orm(column_type = "Text")]
    pub deskripsi: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
