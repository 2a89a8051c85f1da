//! Authentication middleware
//!
//! Bearer-token authentication for API routes. The client presents
//! `Authorization: Bearer {id}|{secret}`; the token row stores only the
//! SHA-256 digest of the secret.

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::ops::Deref;
use std::sync::Arc;

use crate::entity::{access_token, user};
use crate::entity::user::Role;
use crate::state::AppState;

/// Database connection wrapper for use in handlers via Extension
#[derive(Clone)]
pub struct DbConn(pub Arc<DatabaseConnection>);

impl Deref for DbConn {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

/// Authenticated caller, inserted into request extensions
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Option<Role>,
    pub division_id: Option<i64>,
    /// Token row that authenticated this request (revoked on logout)
    pub token_id: i64,
}

/// Hex SHA-256 digest of a token secret
pub fn token_digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Split a plaintext token `{id}|{secret}` into its parts
pub fn split_token(token: &str) -> Option<(i64, &str)> {
    let (id, secret) = token.split_once('|')?;
    let id: i64 = id.parse().ok()?;
    if secret.is_empty() {
        return None;
    }
    Some((id, secret))
}

/// Requests that proceed without a token
fn is_public_path(method: &Method, path: &str) -> bool {
    if !path.starts_with("/api") {
        return true;
    }

    // Public auth and submission endpoints
    if method == Method::POST {
        return matches!(path, "/api/register" | "/api/login" | "/api/surat-requests");
    }

    if method != Method::GET {
        return false;
    }

    // Public reads
    if path == "/api/health" || path == "/api/divisions" {
        return true;
    }
    if path.starts_with("/api/files/") {
        return true;
    }
    const PUBLIC_RESOURCES: [&str; 5] = [
        "/api/pengurus",
        "/api/documentations",
        "/api/schedules",
        "/api/profile-descs",
        "/api/links",
    ];
    PUBLIC_RESOURCES
        .iter()
        .any(|base| path == *base || path.starts_with(&format!("{}/", base)))
}

fn unauthenticated() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Unauthenticated."})),
    )
        .into_response()
}

/// Authentication middleware
pub async fn auth_layer(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // All handlers access the database via Extension<DbConn>
    request.extensions_mut().insert(DbConn(state.db.clone()));

    // Resolve the caller if a token is presented, public path or not, so
    // public handlers can still see who is asking.
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string());

    let current_user = match bearer {
        Some(token) => match resolve_user(&state.db, &token).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!("Database error during auth: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"message": "Internal server error"})),
                )
                    .into_response();
            }
        },
        None => None,
    };

    match current_user {
        Some(user) => {
            request.extensions_mut().insert(user);
        }
        None if is_public_path(&method, &path) => {}
        None => return unauthenticated(),
    }

    next.run(request).await
}

/// Look up the token, verify the digest, and load its user
async fn resolve_user(
    db: &DatabaseConnection,
    token: &str,
) -> Result<Option<CurrentUser>, sea_orm::DbErr> {
    let Some((token_id, secret)) = split_token(token) else {
        return Ok(None);
    };

    let Some(row) = access_token::Entity::find_by_id(token_id).one(db).await? else {
        return Ok(None);
    };

    if row.token_hash != token_digest(secret) {
        tracing::warn!("Token digest mismatch for token id {}", token_id);
        return Ok(None);
    }

    let Some(user_model) = user::Entity::find_by_id(row.user_id).one(db).await? else {
        tracing::warn!("Token {} references a missing user", token_id);
        return Ok(None);
    };

    let mut touched: access_token::ActiveModel = row.into();
    touched.last_used_at = Set(Some(Utc::now()));
    if let Err(e) = touched.update(db).await {
        tracing::warn!("Failed to update token last_used_at: {}", e);
    }

    Ok(Some(CurrentUser {
        id: user_model.id,
        username: user_model.username,
        email: user_model.email,
        role: user_model.role,
        division_id: user_model.division_id,
        token_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_token() {
        assert_eq!(split_token("42|abcdef"), Some((42, "abcdef")));
        assert_eq!(split_token("notanid|abcdef"), None);
        assert_eq!(split_token("42|"), None);
        assert_eq!(split_token("no-separator"), None);
    }

    #[test]
    fn test_token_digest_is_stable_hex() {
        let digest = token_digest("secret");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, token_digest("secret"));
        assert_ne!(digest, token_digest("Secret"));
    }

    #[test]
    fn test_public_paths() {
        let get = Method::GET;
        let post = Method::POST;
        let patch = Method::PATCH;

        assert!(is_public_path(&post, "/api/login"));
        assert!(is_public_path(&post, "/api/register"));
        assert!(is_public_path(&post, "/api/surat-requests"));
        assert!(is_public_path(&get, "/api/pengurus"));
        assert!(is_public_path(&get, "/api/pengurus/3"));
        assert!(is_public_path(&get, "/api/documentations"));
        assert!(is_public_path(&get, "/api/divisions"));
        assert!(is_public_path(&get, "/api/files/pengurus/a.jpg"));
        assert!(is_public_path(&get, "/api/health"));

        // writes are protected, and GET on the surat list is too
        assert!(!is_public_path(&post, "/api/pengurus"));
        assert!(!is_public_path(&get, "/api/surat-requests"));
        assert!(!is_public_path(&patch, "/api/surat-requests/1/assign"));
        assert!(!is_public_path(&get, "/api/my-dispositions"));
        assert!(!is_public_path(&post, "/api/logout"));
        assert!(!is_public_path(&get, "/api/me"));
        // prefix must match whole segments
        assert!(!is_public_path(&get, "/api/pengurusx"));
    }
}
