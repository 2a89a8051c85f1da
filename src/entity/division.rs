//! Division entity
//!
//! Named organizational units, referenced by users and pengurus.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "divisions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(50))", unique)]
    pub nama: String,

    #[sea_orm(column_type = "Text")]
    pub deskripsi: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Division as embedded in pengurus responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DivisionResponse {
    pub id: i64,
    pub nama: String,
    pub deskripsi: String,
}

impl From<Model> for DivisionResponse {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            nama: model.nama,
            deskripsi: model.deskripsi,
        }
    }
}
