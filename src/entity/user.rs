//! User entity
//!
//! Table: users. Role and division membership are the authorization inputs
//! consumed by the access gate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role. Stored as a string column; `koor_divisi` users additionally
/// carry a division membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Role {
    #[sea_orm(string_value = "superadmin")]
    #[serde(rename = "superadmin")]
    Superadmin,
    #[sea_orm(string_value = "admin")]
    #[serde(rename = "admin")]
    Admin,
    #[sea_orm(string_value = "koor_divisi")]
    #[serde(rename = "koor_divisi")]
    KoorDivisi,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::KoorDivisi => "koor_divisi",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "superadmin" => Some(Role::Superadmin),
            "admin" => Some(Role::Admin),
            "koor_divisi" => Some(Role::KoorDivisi),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(50))", unique)]
    pub username: String,

    #[sea_orm(column_type = "String(Some(50))", unique)]
    pub email: String,

    /// bcrypt hash, never serialized
    #[sea_orm(column_type = "String(Some(128))")]
    #[serde(skip_serializing)]
    pub password: String,

    #[sea_orm(nullable)]
    pub role: Option<Role>,

    #[sea_orm(nullable)]
    pub division_id: Option<i64>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// User as exposed by the API (no password hash)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Option<Role>,
    pub division_id: Option<i64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl From<Model> for UserResponse {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role: model.role,
            division_id: model.division_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Minimal user reference attached to dispositions and outgoing letters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserSimple {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<Model> for UserSimple {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Superadmin, Role::Admin, Role::KoorDivisi] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("member"), None);
    }
}
