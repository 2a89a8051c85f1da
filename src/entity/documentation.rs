//! Documentation entity
//!
//! Activity documentation with a photo.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documentations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(50))")]
    pub nama: String,

    #[sea_orm(column_type = "Text")]
    pub deskripsi: String,

    pub tanggal: Date,

    #[sea_orm(column_type = "String(Some(255))")]
    pub lokasi: String,

    /// Stored photo path, e.g. `documentations/{uuid}.jpg`
    #[sea_orm(column_type = "String(Some(255))")]
    pub foto: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
