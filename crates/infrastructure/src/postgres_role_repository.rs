use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use custodia_application::RoleRepository;
use custodia_core::{AppError, AppResult};
use custodia_domain::{PermissionId, Role, RoleId};

use crate::postgres_decode::decode_permissions;


/// PostgreSQL-backed repository for roles and group membership.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn add_child(&self, role_id: RoleId, statement: &str, value: String) -> AppResult<bool> {
        let inserted = self.execute_child(role_id, statement, value).await?;
        if inserted == 0 {
            self.require_role(role_id).await?;
        }

        Ok(inserted > 0)
    }

    async fn remove_child(
        &self,
        role_id: RoleId,
        statement: &str,
        value: String,
    ) -> AppResult<bool> {
        let removed = self.execute_child(role_id, statement, value).await?;
        if removed == 0 {
            self.require_role(role_id).await?;
        }

        Ok(removed > 0)
    }

    async fn execute_child(
        &self,
        role_id: RoleId,
        statement: &str,
        value: String,
    ) -> AppResult<u64> {
        sqlx::query(statement)
            .bind(role_id.as_uuid())
            .bind(value)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected())
            .map_err(|error| {
                AppError::Internal(format!("failed to edit role '{role_id}': {error}"))
            })
    }

    async fn require_role(&self, role_id: RoleId) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM roles WHERE id = $1)")
                .bind(role_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to find role '{role_id}': {error}"))
                })?;

        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("role '{role_id}' was not found")))
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: Uuid,
    label: String,
    permissions: Vec<String>,
    groups: Vec<String>,
}

const SELECT_ROLES: &str = r#"
    SELECT
        roles.id AS role_id,
        roles.label,
        COALESCE(
            (
                SELECT array_agg(role_permissions.permission ORDER BY role_permissions.permission)
                FROM role_permissions
                WHERE role_permissions.role_id = roles.id
            ),
            '{}'
        ) AS permissions,
        COALESCE(
            (
                SELECT array_agg(role_groups.group_name ORDER BY role_groups.group_name)
                FROM role_groups
                WHERE role_groups.role_id = roles.id
            ),
            '{}'
        ) AS groups
    FROM roles
"#;

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn create_role(&self, role: Role) -> AppResult<Role> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query("INSERT INTO roles (id, label) VALUES ($1, $2)")
            .bind(role.role_id().as_uuid())
            .bind(role.label())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_role_conflict(error, role.label()))?;

        insert_role_children(&mut transaction, &role).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(role)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(&format!("{SELECT_ROLES} WHERE roles.id = $1"))
            .bind(role_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find role '{role_id}': {error}"))
            })?;

        row.map(role_from_row).transpose()
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!("{SELECT_ROLES} ORDER BY roles.label"))
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(role_from_row).collect()
    }

    async fn add_role_permission(
        &self,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<bool> {
        self.add_child(
            role_id,
            r#"
            INSERT INTO role_permissions (role_id, permission)
            SELECT roles.id, $2 FROM roles WHERE roles.id = $1
            ON CONFLICT (role_id, permission) DO NOTHING
            "#,
            permission.storage_value(),
        )
        .await
    }

    async fn remove_role_permission(
        &self,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<bool> {
        self.remove_child(
            role_id,
            "DELETE FROM role_permissions WHERE role_id = $1 AND permission = $2",
            permission.storage_value(),
        )
        .await
    }

    async fn add_role_group(&self, role_id: RoleId, group: &str) -> AppResult<bool> {
        self.add_child(
            role_id,
            r#"
            INSERT INTO role_groups (role_id, group_name)
            SELECT roles.id, $2 FROM roles WHERE roles.id = $1
            ON CONFLICT (role_id, group_name) DO NOTHING
            "#,
            group.to_owned(),
        )
        .await
    }

    async fn remove_role_group(&self, role_id: RoleId, group: &str) -> AppResult<bool> {
        self.remove_child(
            role_id,
            "DELETE FROM role_groups WHERE role_id = $1 AND group_name = $2",
            group.to_owned(),
        )
        .await
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete role '{role_id}': {error}"))
            })?;

        Ok(())
    }

    async fn add_group_member(&self, group: &str, subject: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO group_members (group_name, subject)
            VALUES ($1, $2)
            ON CONFLICT (group_name, subject) DO NOTHING
            "#,
        )
        .bind(group)
        .bind(subject)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to add '{subject}' to group '{group}': {error}"
            ))
        })?;

        Ok(())
    }

    async fn remove_group_member(&self, group: &str, subject: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM group_members WHERE group_name = $1 AND subject = $2")
            .bind(group)
            .bind(subject)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to remove '{subject}' from group '{group}': {error}"
                ))
            })?;

        Ok(())
    }

    async fn list_group_members(&self, group: &str) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT subject
            FROM group_members
            WHERE group_name = $1
            ORDER BY subject
            "#,
        )
        .bind(group)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list members of group '{group}': {error}"
            ))
        })
    }

    async fn list_roles_for_subject(&self, subject: &str) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            r#"
            {SELECT_ROLES}
            WHERE roles.id IN (
                SELECT role_groups.role_id
                FROM role_groups
                INNER JOIN group_members
                    ON group_members.group_name = role_groups.group_name
                WHERE group_members.subject = $1
            )
            ORDER BY roles.label
            "#
        ))
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list roles for subject '{subject}': {error}"
            ))
        })?;

        rows.into_iter().map(role_from_row).collect()
    }
}

async fn insert_role_children(
    transaction: &mut Transaction<'_, Postgres>,
    role: &Role,
) -> AppResult<()> {
    let role_id = role.role_id().as_uuid();
    let permissions: Vec<String> = role
        .permissions()
        .iter()
        .map(PermissionId::storage_value)
        .collect();
    let groups: Vec<String> = role.groups().iter().cloned().collect();

    sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission)
        SELECT $1, permission FROM UNNEST($2::TEXT[]) AS permission
        "#,
    )
    .bind(role_id)
    .bind(&permissions)
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to persist permissions of role '{role_id}': {error}"
        ))
    })?;

    sqlx::query(
        r#"
        INSERT INTO role_groups (role_id, group_name)
        SELECT $1, group_name FROM UNNEST($2::TEXT[]) AS group_name
        "#,
    )
    .bind(role_id)
    .bind(&groups)
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to persist groups of role '{role_id}': {error}"
        ))
    })?;

    Ok(())
}

fn role_from_row(row: RoleRow) -> AppResult<Role> {
    let permissions = decode_permissions(row.permissions)?;
    let groups: BTreeSet<String> = row.groups.into_iter().collect();

    Role::from_parts(RoleId::from_uuid(row.role_id), row.label, permissions, groups).map_err(
        |error| {
            AppError::Internal(format!(
                "failed to decode role '{}': {error}",
                row.role_id
            ))
        },
    )
}

fn map_role_conflict(error: sqlx::Error, label: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role '{label}' already exists"));
    }

    AppError::Internal(format!("failed to persist role '{label}': {error}"))
}
