//! Access token entity
//!
//! Opaque bearer tokens. The client holds `{id}|{secret}`; only the SHA-256
//! digest of the secret is stored.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "access_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub user_id: i64,

    /// SHA-256 hex digest of the token secret
    #[sea_orm(column_type = "String(Some(64))")]
    pub token_hash: String,

    pub created_at: DateTimeUtc,

    #[sea_orm(nullable)]
    pub last_used_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
