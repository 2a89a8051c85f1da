//! Access gate
//!
//! Route-level authorization policies evaluated against the authenticated
//! caller. Role-only policies are a pure decision; the media-coordinator
//! policy additionally resolves the caller's division against the configured
//! media division name, looked up per call.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entity::division;
use crate::entity::user::Role;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;

/// Named authorization policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// role == superadmin
    SuperadminOnly,
    /// role in {admin, superadmin}
    AdminOrSuperadmin,
    /// admin/superadmin, or koor_divisi whose division is the media division
    AdminOrMediaCoordinator,
    /// any staff role: superadmin, admin, or koor_divisi
    Coordinator,
}

/// Outcome of the role-only part of a policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDecision {
    Allow,
    Deny,
    /// koor_divisi under AdminOrMediaCoordinator: division must be checked
    CheckMediaDivision,
}

/// Pure role check; no database access
pub fn role_allows(policy: Policy, role: Option<Role>) -> RoleDecision {
    let Some(role) = role else {
        return RoleDecision::Deny;
    };

    match policy {
        Policy::SuperadminOnly => match role {
            Role::Superadmin => RoleDecision::Allow,
            _ => RoleDecision::Deny,
        },
        Policy::AdminOrSuperadmin => match role {
            Role::Superadmin | Role::Admin => RoleDecision::Allow,
            Role::KoorDivisi => RoleDecision::Deny,
        },
        Policy::AdminOrMediaCoordinator => match role {
            Role::Superadmin | Role::Admin => RoleDecision::Allow,
            Role::KoorDivisi => RoleDecision::CheckMediaDivision,
        },
        Policy::Coordinator => RoleDecision::Allow,
    }
}

/// Authorize `user` under `policy`, or return 403.
///
/// The media division is resolved by name on every call; renaming the
/// division in the directory changes who passes this gate.
pub async fn authorize(
    db: &DatabaseConnection,
    media_division: &str,
    user: &CurrentUser,
    policy: Policy,
) -> AppResult<()> {
    match role_allows(policy, user.role) {
        RoleDecision::Allow => Ok(()),
        RoleDecision::Deny => Err(AppError::Forbidden(
            "Anda tidak memiliki izin akses.".to_string(),
        )),
        RoleDecision::CheckMediaDivision => {
            let media = division::Entity::find()
                .filter(division::Column::Nama.eq(media_division))
                .one(db)
                .await?;

            let allowed = matches!(
                (&media, user.division_id),
                (Some(m), Some(div_id)) if m.id == div_id
            );

            if allowed {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "Anda tidak memiliki izin akses sebagai Koordinator Media.".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superadmin_only() {
        assert_eq!(
            role_allows(Policy::SuperadminOnly, Some(Role::Superadmin)),
            RoleDecision::Allow
        );
        assert_eq!(
            role_allows(Policy::SuperadminOnly, Some(Role::Admin)),
            RoleDecision::Deny
        );
        assert_eq!(
            role_allows(Policy::SuperadminOnly, Some(Role::KoorDivisi)),
            RoleDecision::Deny
        );
        assert_eq!(role_allows(Policy::SuperadminOnly, None), RoleDecision::Deny);
    }

    #[test]
    fn test_admin_or_superadmin() {
        assert_eq!(
            role_allows(Policy::AdminOrSuperadmin, Some(Role::Admin)),
            RoleDecision::Allow
        );
        assert_eq!(
            role_allows(Policy::AdminOrSuperadmin, Some(Role::Superadmin)),
            RoleDecision::Allow
        );
        assert_eq!(
            role_allows(Policy::AdminOrSuperadmin, Some(Role::KoorDivisi)),
            RoleDecision::Deny
        );
    }

    #[test]
    fn test_media_coordinator_needs_division_check() {
        assert_eq!(
            role_allows(Policy::AdminOrMediaCoordinator, Some(Role::Admin)),
            RoleDecision::Allow
        );
        assert_eq!(
            role_allows(Policy::AdminOrMediaCoordinator, Some(Role::Superadmin)),
            RoleDecision::Allow
        );
        assert_eq!(
            role_allows(Policy::AdminOrMediaCoordinator, Some(Role::KoorDivisi)),
            RoleDecision::CheckMediaDivision
        );
        assert_eq!(
            role_allows(Policy::AdminOrMediaCoordinator, None),
            RoleDecision::Deny
        );
    }

    #[test]
    fn test_coordinator_allows_all_staff() {
        for role in [Role::Superadmin, Role::Admin, Role::KoorDivisi] {
            assert_eq!(role_allows(Policy::Coordinator, Some(role)), RoleDecision::Allow);
        }
        assert_eq!(role_allows(Policy::Coordinator, None), RoleDecision::Deny);
    }

    #[tokio::test]
    async fn test_authorize_media_coordinator_against_db() {
        use chrono::Utc;
        use sea_orm::{DatabaseBackend, MockDatabase};

        let media = division::Model {
            id: 1,
            nama: "Media".to_string(),
            deskripsi: "Mengelola dokumentasi, desain, dan media sosial.".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![media.clone()], vec![media]])
            .into_connection();

        let in_media = CurrentUser {
            id: 3,
            username: "koordivmedia".to_string(),
            email: "koordivmedia@gmail.com".to_string(),
            role: Some(Role::KoorDivisi),
            division_id: Some(1),
            token_id: 1,
        };
        assert!(authorize(&db, "Media", &in_media, Policy::AdminOrMediaCoordinator)
            .await
            .is_ok());

        let other_division = CurrentUser {
            division_id: Some(2),
            ..in_media
        };
        let err = authorize(&db, "Media", &other_division, Policy::AdminOrMediaCoordinator)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
