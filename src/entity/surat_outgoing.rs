//! Outgoing letter entity
//!
//! Independent log of letters sent by the organization. No relation to
//! incoming requests.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "surat_outgoing")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Generated letter number, `SK-YYYYMMDD-XXXX`
    #[sea_orm(column_type = "String(Some(20))", unique)]
    pub nomor_surat: String,

    #[sea_orm(column_type = "String(Some(255))")]
    pub perihal: String,

    #[sea_orm(column_type = "Text")]
    pub tujuan: String,

    #[sea_orm(column_type = "String(Some(255))")]
    pub jenis_surat: String,

    /// Stored document path, e.g. `surat_outgoing/{uuid}.pdf`
    #[sea_orm(column_type = "String(Some(255))")]
    pub file_surat: String,

    /// Creator user id
    pub dibuat_oleh: i64,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
