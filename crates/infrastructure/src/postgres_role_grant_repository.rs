use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use clinic_application::RoleGrantRepository;
use clinic_core::{AppError, AppResult, Role};
use clinic_domain::{Permission, PermissionId, RoleGrant};

use crate::postgres_permission_repository::PermissionRow;

/// PostgreSQL-backed store of role grants.
#[derive(Clone)]
pub struct PostgresRoleGrantRepository {
    pool: PgPool,
}

impl PostgresRoleGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleGrantRow {
    role: String,
    permission_id: i64,
    permission_key: String,
    permission_name: Option<String>,
}

impl TryFrom<RoleGrantRow> for RoleGrant {
    type Error = AppError;

    fn try_from(row: RoleGrantRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(row.role.as_str()).map_err(|_| {
            AppError::Internal(format!("grant has an unknown stored role '{}'", row.role))
        })?;
        let permission = Permission::try_from(PermissionRow {
            id: row.permission_id,
            key: row.permission_key,
            name: row.permission_name,
        })?;

        Ok(RoleGrant::new(role, permission))
    }
}

#[async_trait]
impl RoleGrantRepository for PostgresRoleGrantRepository {
    async fn list_grants_for_role(&self, role: Role) -> AppResult<Vec<RoleGrant>> {
        sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT
                grants.role,
                permissions.id AS permission_id,
                permissions.key AS permission_key,
                permissions.name AS permission_name
            FROM role_permissions AS grants
            INNER JOIN permissions
                ON permissions.id = grants.permission_id
            WHERE grants.role = $1
            ORDER BY permissions.key
            "#,
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role grants: {error}")))?
        .into_iter()
        .map(RoleGrant::try_from)
        .collect()
    }

    async fn grant_permission(&self, role: Role, permission_id: PermissionId) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role, permission_id)
            VALUES ($1, $2)
            ON CONFLICT (role, permission_id) DO NOTHING
            "#,
        )
        .bind(role.as_str())
        .bind(permission_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| map_missing_permission(error, permission_id))?;

        Ok(())
    }

    async fn revoke_permission(
        &self,
        role: Role,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE role = $1 AND permission_id = $2
            "#,
        )
        .bind(role.as_str())
        .bind(permission_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke permission: {error}")))?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn list_permission_keys_for_role(&self, role: Role) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT permissions.key
            FROM role_permissions AS grants
            INNER JOIN permissions
                ON permissions.id = grants.permission_id
            WHERE grants.role = $1
            "#,
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve effective permissions: {error}"))
        })
    }
}

fn map_missing_permission(error: sqlx::Error, permission_id: PermissionId) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::NotFound(format!("permission '{permission_id}' was not found"));
    }

    AppError::Internal(format!("failed to grant permission: {error}"))
}
