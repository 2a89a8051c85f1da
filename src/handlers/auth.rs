//! Authentication handlers
//!
//! Register, login, logout, and current-user endpoints. Tokens are opaque
//! `{id}|{secret}` strings; only the secret's digest is stored.

use axum::{http::StatusCode, Extension, Json};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user::{self, Role, UserResponse};
use crate::entity::access_token;
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::auth::{token_digest, CurrentUser, DbConn};
use crate::routes::ApiResponse;
use crate::validation::Validator;

/// Register request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub role: Option<String>,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token payload returned by register and login
#[derive(Debug, Serialize)]
pub struct AuthData {
    pub user: UserResponse,
    pub token: String,
    pub token_type: String,
}

/// POST /api/register
pub async fn register(
    Extension(db): Extension<DbConn>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthData>>)> {
    let mut v = Validator::new();
    v.required("username", req.username.as_deref())
        .max_len("username", req.username.as_deref(), 50)
        .required("email", req.email.as_deref())
        .email("email", req.email.as_deref())
        .max_len("email", req.email.as_deref(), 50)
        .required("password", req.password.as_deref())
        .min_len("password", req.password.as_deref(), 6)
        .required("role", req.role.as_deref())
        .one_of("role", req.role.as_deref(), &["admin", "superadmin"]);

    if req.password.is_some() && req.password != req.password_confirmation {
        v.fail("password", "The password confirmation does not match.");
    }

    // Uniqueness, reported in the same field-keyed shape
    if let Some(username) = req.username.as_deref() {
        let taken = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*db)
            .await?;
        if taken.is_some() {
            v.fail("username", "The username has already been taken.");
        }
    }
    if let Some(email) = req.email.as_deref() {
        let taken = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*db)
            .await?;
        if taken.is_some() {
            v.fail("email", "The email has already been taken.");
        }
    }

    v.finish()?;

    let role = req.role.as_deref().and_then(Role::from_str);
    let password = bcrypt::hash(req.password.as_deref().unwrap_or_default(), bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    let now = Utc::now();
    let new_user = user::ActiveModel {
        username: Set(req.username.unwrap_or_default()),
        email: Set(req.email.unwrap_or_default()),
        password: Set(password),
        role: Set(role),
        division_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    tracing::info!("User registered: {}", new_user.username);

    let token = issue_token(&db, new_user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Register success!",
            AuthData {
                user: new_user.into(),
                token,
                token_type: "Bearer".to_string(),
            },
        )),
    ))
}

/// POST /api/login
pub async fn login(
    Extension(db): Extension<DbConn>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthData>>> {
    let mut v = Validator::new();
    v.required("email", req.email.as_deref())
        .email("email", req.email.as_deref())
        .required("password", req.password.as_deref());
    v.finish()?;

    let email = req.email.unwrap_or_default();
    let db_user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&*db)
        .await?;

    let Some(db_user) = db_user else {
        tracing::warn!("Login failed: unknown email {}", email);
        return Err(AppError::InvalidCredentials);
    };

    let password_valid =
        bcrypt::verify(req.password.as_deref().unwrap_or_default(), &db_user.password)
            .unwrap_or(false);
    if !password_valid {
        tracing::warn!("Login failed: wrong password for {}", db_user.username);
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(&db, db_user.id).await?;

    tracing::info!("User logged in: {}", db_user.username);

    Ok(Json(ApiResponse::new(
        "Login success!",
        AuthData {
            user: db_user.into(),
            token,
            token_type: "Bearer".to_string(),
        },
    )))
}

/// POST /api/logout
pub async fn logout(
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<()>>> {
    access_token::Entity::delete_by_id(current_user.token_id)
        .exec(&*db)
        .await?;

    tracing::info!("User logged out: {}", current_user.username);

    Ok(Json(ApiResponse::message("Logout success!")))
}

/// GET /api/me
pub async fn me(
    Extension(db): Extension<DbConn>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let db_user = user::Entity::find_by_id(current_user.id)
        .one(&*db)
        .await?
        .ok_or_not_found("Not found")?;

    Ok(Json(ApiResponse::new(
        "User data fetched successfully",
        db_user.into(),
    )))
}

/// Create a token row for `user_id` and return the plaintext `{id}|{secret}`
pub async fn issue_token(db: &DatabaseConnection, user_id: i64) -> AppResult<String> {
    let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());

    let row = access_token::ActiveModel {
        user_id: Set(user_id),
        token_hash: Set(token_digest(&secret)),
        created_at: Set(Utc::now()),
        last_used_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(format!("{}|{}", row.id, secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::split_token;

    #[test]
    fn test_issued_token_shape() {
        // secrets are two simple-format UUIDs, 64 hex chars
        let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        assert_eq!(secret.len(), 64);

        let plaintext = format!("17|{}", secret);
        let (id, parsed_secret) = split_token(&plaintext).unwrap();
        assert_eq!(id, 17);
        assert_eq!(token_digest(parsed_secret), token_digest(&secret));
    }
}
