use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use clinic_application::PermissionRepository;
use clinic_core::{AppError, AppResult};
use clinic_domain::{Permission, PermissionId, PermissionKey};


/// PostgreSQL-backed permission registry.
#[derive(Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PermissionRow {
    pub(crate) id: i64,
    pub(crate) key: String,
    pub(crate) name: Option<String>,
}

impl TryFrom<PermissionRow> for Permission {
    type Error = AppError;

    fn try_from(row: PermissionRow) -> Result<Self, Self::Error> {
        let key = PermissionKey::new(row.key).map_err(|_| {
            AppError::Internal(format!("permission '{}' has an invalid stored key", row.id))
        })?;

        Ok(Permission::new(PermissionId::new(row.id), key, row.name))
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, key, name
            FROM permissions
            ORDER BY key
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?
        .into_iter()
        .map(Permission::try_from)
        .collect()
    }

    async fn find_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, key, name
            FROM permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find permission: {error}")))?
        .map(Permission::try_from)
        .transpose()
    }

    async fn create_permission(
        &self,
        key: PermissionKey,
        name: Option<String>,
    ) -> AppResult<Permission> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO permissions (key, name)
            VALUES ($1, $2)
            RETURNING id, key, name
            "#,
        )
        .bind(key.as_str())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_permission_conflict(error, &key))?;

        Permission::try_from(row)
    }

    async fn ensure_permission(
        &self,
        key: PermissionKey,
        name: Option<String>,
    ) -> AppResult<Permission> {
        sqlx::query(
            r#"
            INSERT INTO permissions (key, name)
            VALUES ($1, $2)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key.as_str())
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to ensure permission: {error}")))?;

        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, key, name
            FROM permissions
            WHERE key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve permission: {error}")))?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "permission '{key}' was removed while it was being ensured"
            ))
        })?;

        Permission::try_from(row)
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<bool> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let removed_grants = sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE permission_id = $1
            "#,
        )
        .bind(permission_id.as_i64())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove role grants: {error}")))?
        .rows_affected();

        let removed = sqlx::query(
            r#"
            DELETE FROM permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_i64())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete permission: {error}")))?
        .rows_affected()
            > 0;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        debug!(
            permission_id = permission_id.as_i64(),
            removed, removed_grants, "permission delete applied"
        );

        Ok(removed)
    }
}

fn map_permission_conflict(error: sqlx::Error, key: &PermissionKey) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("permission '{key}' already exists"));
    }

    AppError::Internal(format!("failed to create permission: {error}"))
}
