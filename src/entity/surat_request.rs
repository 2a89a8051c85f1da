//! Incoming letter request entity
//!
//! Created by public submission with status `pending`; the status only moves
//! forward, driven by disposition events.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of an incoming letter request. Transitions are forward-only:
/// pending -> diteruskan -> diproses -> selesai.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
pub enum SuratStatus {
    #[sea_orm(string_value = "pending")]
    #[serde(rename = "pending")]
    Pending,
    #[sea_orm(string_value = "diteruskan")]
    #[serde(rename = "diteruskan")]
    Diteruskan,
    #[sea_orm(string_value = "diproses")]
    #[serde(rename = "diproses")]
    Diproses,
    #[sea_orm(string_value = "selesai")]
    #[serde(rename = "selesai")]
    Selesai,
}

impl SuratStatus {
    fn rank(self) -> u8 {
        match self {
            SuratStatus::Pending => 0,
            SuratStatus::Diteruskan => 1,
            SuratStatus::Diproses => 2,
            SuratStatus::Selesai => 3,
        }
    }

    /// Whether moving to `next` is a forward transition
    pub fn can_advance_to(self, next: SuratStatus) -> bool {
        next.rank() > self.rank()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "surat_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Generated letter number, `SR-YYYYMMDD-XXXX`
    #[sea_orm(column_type = "String(Some(20))", unique)]
    pub nomor_surat: String,

    #[sea_orm(column_type = "String(Some(255))")]
    pub nama_pengirim: String,

    #[sea_orm(column_type = "String(Some(255))", nullable)]
    pub email_pengirim: Option<String>,

    #[sea_orm(column_type = "String(Some(255))")]
    pub perihal: String,

    #[sea_orm(column_type = "Text")]
    pub tujuan: String,

    #[sea_orm(column_type = "String(Some(255))", nullable)]
    pub asal_instansi: Option<String>,

    #[sea_orm(column_type = "String(Some(255))")]
    pub jenis_surat: String,

    /// Stored document path, e.g. `surat_requests/{uuid}.pdf`
    #[sea_orm(column_type = "String(Some(255))")]
    pub file_surat: String,

    pub status: SuratStatus,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_forward_only() {
        use SuratStatus::*;

        assert!(Pending.can_advance_to(Diteruskan));
        assert!(Diteruskan.can_advance_to(Diproses));
        assert!(Diproses.can_advance_to(Selesai));
        assert!(Diteruskan.can_advance_to(Selesai));

        // no path back
        assert!(!Selesai.can_advance_to(Diproses));
        assert!(!Diproses.can_advance_to(Diteruskan));
        assert!(!Diteruskan.can_advance_to(Pending));
        assert!(!Selesai.can_advance_to(Selesai));
    }
}
