use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use custodia_application::{ObjectRelationRepository, RelatedObjectResolver};
use custodia_core::{AppError, AppResult};
use custodia_domain::ObjectRef;

use crate::postgres_decode::decode_object_ref;


/// PostgreSQL-backed projection of the relations inheritance paths follow.
///
/// Each row maps one named relation of one object to the related object,
/// whatever its model type.
#[derive(Clone)]
pub struct PostgresObjectGraphRepository {
    pool: PgPool,
}

impl PostgresObjectGraphRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RelatedRow {
    related_content_type: String,
    related_object_id: String,
}

#[async_trait]
impl RelatedObjectResolver for PostgresObjectGraphRepository {
    async fn resolve_related(
        &self,
        object: &ObjectRef,
        relation: &str,
    ) -> AppResult<Option<ObjectRef>> {
        let row = sqlx::query_as::<_, RelatedRow>(
            r#"
            SELECT related_content_type, related_object_id
            FROM object_relations
            WHERE content_type = $1 AND object_id = $2 AND relation = $3
            "#,
        )
        .bind(object.model().storage_value())
        .bind(object.object_id())
        .bind(relation)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to resolve relation '{relation}' of '{object}': {error}"
            ))
        })?;

        row.map(|row| decode_object_ref(&row.related_content_type, &row.related_object_id))
            .transpose()
    }
}

#[async_trait]
impl ObjectRelationRepository for PostgresObjectGraphRepository {
    async fn set_relation(
        &self,
        child: &ObjectRef,
        relation: &str,
        parent: &ObjectRef,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        // Serializes relation writes so two concurrent links cannot close a
        // cycle that neither sees on its own.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('object_relations'))")
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to lock object relations: {error}"))
            })?;

        let cyclic = sqlx::query_scalar::<_, bool>(
            r#"
            WITH RECURSIVE reachable (content_type, object_id) AS (
                SELECT $3::TEXT, $4::TEXT
                UNION
                SELECT relations.related_content_type, relations.related_object_id
                FROM object_relations AS relations
                INNER JOIN reachable
                    ON relations.content_type = reachable.content_type
                    AND relations.object_id = reachable.object_id
            )
            SELECT EXISTS (
                SELECT 1 FROM reachable WHERE content_type = $1 AND object_id = $2
            )
            "#,
        )
        .bind(child.model().storage_value())
        .bind(child.object_id())
        .bind(parent.model().storage_value())
        .bind(parent.object_id())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to walk ancestors of '{parent}': {error}"
            ))
        })?;

        if cyclic {
            return Err(AppError::Validation(format!(
                "relation '{relation}' of '{child}' would make it its own ancestor"
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO object_relations (
                content_type,
                object_id,
                relation,
                related_content_type,
                related_object_id
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (content_type, object_id, relation) DO UPDATE
            SET related_content_type = EXCLUDED.related_content_type,
                related_object_id = EXCLUDED.related_object_id,
                updated_at = now()
            "#,
        )
        .bind(child.model().storage_value())
        .bind(child.object_id())
        .bind(relation)
        .bind(parent.model().storage_value())
        .bind(parent.object_id())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to set relation '{relation}' of '{child}': {error}"
            ))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn clear_relation(&self, child: &ObjectRef, relation: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM object_relations
            WHERE content_type = $1 AND object_id = $2 AND relation = $3
            "#,
        )
        .bind(child.model().storage_value())
        .bind(child.object_id())
        .bind(relation)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to clear relation '{relation}' of '{child}': {error}"
            ))
        })?;

        Ok(())
    }
}
