//! Letter disposition entity
//!
//! Assignment of an incoming letter request to a user. A request may
//! accumulate multiple dispositions (reassignment history); only the
//! assignee may change a disposition's status.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Disposition status. `BelumDibaca` is the creation default and is never an
/// accepted target of the update endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
pub enum DispositionStatus {
    #[sea_orm(string_value = "belum dibaca")]
    #[serde(rename = "belum dibaca")]
    BelumDibaca,
    #[sea_orm(string_value = "diproses")]
    #[serde(rename = "diproses")]
    Diproses,
    #[sea_orm(string_value = "selesai")]
    #[serde(rename = "selesai")]
    Selesai,
}

impl DispositionStatus {
    /// Parse an update-endpoint target; only `diproses` and `selesai` are allowed
    pub fn parse_update_target(value: &str) -> Option<Self> {
        match value {
            "diproses" => Some(DispositionStatus::Diproses),
            "selesai" => Some(DispositionStatus::Selesai),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "surat_dispositions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub surat_request_id: i64,

    pub assigned_to: i64,

    #[sea_orm(column_type = "Text", nullable)]
    pub catatan: Option<String>,

    pub status: DispositionStatus,

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
    fn test_update_targets() {
        assert_eq!(
            DispositionStatus::parse_update_target("diproses"),
            Some(DispositionStatus::Diproses)
        );
        assert_eq!(
            DispositionStatus::parse_update_target("selesai"),
            Some(DispositionStatus::Selesai)
        );
        // the creation default is not reachable through the update endpoint
        assert_eq!(DispositionStatus::parse_update_target("belum dibaca"), None);
        assert_eq!(DispositionStatus::parse_update_target("pending"), None);
    }
}
