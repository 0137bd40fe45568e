use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use custodia_application::{AccessControlListRepository, AclChange, AclMutation};
use custodia_core::{AppError, AppResult};
use custodia_domain::{AccessControlList, AclId, ObjectRef, PermissionId, RoleId};

use crate::postgres_decode::{decode_object_ref, decode_permissions};


/// PostgreSQL-backed repository for object-level access control entries.
#[derive(Clone)]
pub struct PostgresAccessControlListRepository {
    pool: PgPool,
}

impl PostgresAccessControlListRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AclRow {
    acl_id: Uuid,
    content_type: String,
    object_id: String,
    role_id: Uuid,
    permissions: Vec<String>,
}

#[derive(Debug, FromRow)]
struct UpsertedAclRow {
    id: Uuid,
    inserted: bool,
}

#[derive(Debug, FromRow)]
struct GrantedObjectRow {
    content_type: String,
    object_id: String,
}

const SELECT_ACLS: &str = r#"
    SELECT
        acls.id AS acl_id,
        acls.content_type,
        acls.object_id,
        acls.role_id,
        COALESCE(
            array_agg(permissions.permission ORDER BY permissions.permission)
                FILTER (WHERE permissions.permission IS NOT NULL),
            '{}'
        ) AS permissions
    FROM access_control_lists AS acls
    LEFT JOIN access_control_list_permissions AS permissions
        ON permissions.acl_id = acls.id
"#;

#[async_trait]
impl AccessControlListRepository for PostgresAccessControlListRepository {
    async fn find_acl(
        &self,
        target: &ObjectRef,
        role_id: RoleId,
    ) -> AppResult<Option<AccessControlList>> {
        let row = sqlx::query_as::<_, AclRow>(&format!(
            r#"
            {SELECT_ACLS}
            WHERE acls.content_type = $1 AND acls.object_id = $2 AND acls.role_id = $3
            GROUP BY acls.id
            "#
        ))
        .bind(target.model().storage_value())
        .bind(target.object_id())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find access control list for '{target}': {error}"
            ))
        })?;

        row.map(acl_from_row).transpose()
    }

    async fn add_permission(
        &self,
        target: &ObjectRef,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<AclMutation> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        // The no-op update locks an existing row so a concurrent last revoke
        // cannot drop it before the permission lands.
        let entry = sqlx::query_as::<_, UpsertedAclRow>(
            r#"
            INSERT INTO access_control_lists (id, content_type, object_id, role_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (content_type, object_id, role_id)
                DO UPDATE SET content_type = EXCLUDED.content_type
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(AclId::new().as_uuid())
        .bind(target.model().storage_value())
        .bind(target.object_id())
        .bind(role_id.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to save access control list for '{target}': {error}"
            ))
        })?;

        let added = sqlx::query(
            r#"
            INSERT INTO access_control_list_permissions (acl_id, permission)
            VALUES ($1, $2)
            ON CONFLICT (acl_id, permission) DO NOTHING
            "#,
        )
        .bind(entry.id)
        .bind(permission.storage_value())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to add '{permission}' to access control list '{}': {error}",
                entry.id
            ))
        })?
        .rows_affected();

        let acl = fetch_acl_by_id(&mut transaction, entry.id).await?;
        commit(transaction).await?;

        let change = if entry.inserted {
            AclChange::Created
        } else if added > 0 {
            AclChange::Edited
        } else {
            AclChange::Unchanged
        };

        Ok(AclMutation {
            change,
            acl: Some(acl),
        })
    }

    async fn remove_permission(
        &self,
        target: &ObjectRef,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<AclMutation> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let acl_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM access_control_lists
            WHERE content_type = $1 AND object_id = $2 AND role_id = $3
            FOR UPDATE
            "#,
        )
        .bind(target.model().storage_value())
        .bind(target.object_id())
        .bind(role_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to lock access control list for '{target}': {error}"
            ))
        })?;

        let Some(acl_id) = acl_id else {
            commit(transaction).await?;
            return Ok(AclMutation {
                change: AclChange::Unchanged,
                acl: None,
            });
        };

        let removed = sqlx::query(
            "DELETE FROM access_control_list_permissions WHERE acl_id = $1 AND permission = $2",
        )
        .bind(acl_id)
        .bind(permission.storage_value())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to remove '{permission}' from access control list '{acl_id}': {error}"
            ))
        })?
        .rows_affected();

        let acl = fetch_acl_by_id(&mut transaction, acl_id).await?;
        let change = if removed == 0 {
            AclChange::Unchanged
        } else if acl.is_empty() {
            sqlx::query(
                r#"
                DELETE FROM access_control_lists AS acls
                WHERE acls.id = $1
                    AND NOT EXISTS (
                        SELECT 1 FROM access_control_list_permissions AS permissions
                        WHERE permissions.acl_id = acls.id
                    )
                "#,
            )
            .bind(acl_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to delete empty access control list '{acl_id}': {error}"
                ))
            })?;
            AclChange::Deleted
        } else {
            AclChange::Edited
        };
        commit(transaction).await?;

        Ok(AclMutation {
            change,
            acl: Some(acl),
        })
    }

    async fn delete_acls_for_role(&self, role_id: RoleId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM access_control_lists WHERE role_id = $1")
            .bind(role_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to delete access control lists of role '{role_id}': {error}"
                ))
            })?;

        Ok(result.rows_affected())
    }

    async fn list_acls_for_object(&self, target: &ObjectRef) -> AppResult<Vec<AccessControlList>> {
        let rows = sqlx::query_as::<_, AclRow>(&format!(
            r#"
            {SELECT_ACLS}
            WHERE acls.content_type = $1 AND acls.object_id = $2
            GROUP BY acls.id
            ORDER BY acls.created_at
            "#
        ))
        .bind(target.model().storage_value())
        .bind(target.object_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list access control lists for '{target}': {error}"
            ))
        })?;

        rows.into_iter().map(acl_from_row).collect()
    }

    async fn list_granted_objects(
        &self,
        role_ids: &[RoleId],
        permission: &PermissionId,
    ) -> AppResult<HashSet<ObjectRef>> {
        let role_ids: Vec<Uuid> = role_ids.iter().map(RoleId::as_uuid).collect();
        let rows = sqlx::query_as::<_, GrantedObjectRow>(
            r#"
            SELECT DISTINCT acls.content_type, acls.object_id
            FROM access_control_lists AS acls
            INNER JOIN access_control_list_permissions AS permissions
                ON permissions.acl_id = acls.id
            WHERE acls.role_id = ANY($1)
                AND permissions.permission = $2
            "#,
        )
        .bind(&role_ids)
        .bind(permission.storage_value())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list objects granted '{permission}': {error}"
            ))
        })?;

        rows.into_iter()
            .map(|row| decode_object_ref(&row.content_type, &row.object_id))
            .collect()
    }
}

async fn fetch_acl_by_id(
    transaction: &mut Transaction<'_, Postgres>,
    acl_id: Uuid,
) -> AppResult<AccessControlList> {
    let row = sqlx::query_as::<_, AclRow>(&format!(
        r#"
        {SELECT_ACLS}
        WHERE acls.id = $1
        GROUP BY acls.id
        "#
    ))
    .bind(acl_id)
    .fetch_one(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to read access control list '{acl_id}': {error}"
        ))
    })?;

    acl_from_row(row)
}

async fn commit(transaction: Transaction<'_, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
}

fn acl_from_row(row: AclRow) -> AppResult<AccessControlList> {
    let target = decode_object_ref(&row.content_type, &row.object_id)?;
    let permissions = decode_permissions(row.permissions)?;

    Ok(AccessControlList::from_parts(
        AclId::from_uuid(row.acl_id),
        target,
        RoleId::from_uuid(row.role_id),
        permissions,
    ))
}
