use crate::data::database_error;
use crate::data::transaction::PgTransaction;
use crate::domain::error::DomainError;
use crate::domain::post::PostVersion;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

#[async_trait]
pub trait PostVersionRepository: Send + Sync {
    type Tx: Send;

    async fn create(&self, tx: &mut Self::Tx, version: &PostVersion) -> Result<(), DomainError>;
    /// Rewrites title, content and publish timestamp of an existing row.
    async fn update(&self, tx: &mut Self::Tx, version: &PostVersion) -> Result<(), DomainError>;
    /// Locks and returns the highest-numbered version of a post.
    async fn find_latest_by_post_id_for_update(
        &self,
        tx: &mut Self::Tx,
        post_id: Uuid,
    ) -> Result<Option<PostVersion>, DomainError>;
    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<PostVersion>, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostVersion>, DomainError>;
    async fn delete(&self, tx: &mut Self::Tx, id: Uuid) -> Result<(), DomainError>;
}

const COLUMNS: &str =
    "id, post_id, version_number, title, content, published_at, created_at";

#[derive(Clone)]
pub struct PostgresPostVersionRepository {
    pool: PgPool,
}

impl PostgresPostVersionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostVersionRepository for PostgresPostVersionRepository {
    type Tx = PgTransaction;

    async fn create(&self, tx: &mut Self::Tx, version: &PostVersion) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO post_versions
                (id, post_id, version_number, title, content, published_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(version.id)
        .bind(version.post_id)
        .bind(version.version_number)
        .bind(&version.title)
        .bind(&version.content)
        .bind(version.published_at)
        .bind(version.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| database_error("create post version", e))?;

        info!(
            post_id = %version.post_id,
            version_id = %version.id,
            version_number = version.version_number,
            "post version created"
        );
        Ok(())
    }

    async fn update(&self, tx: &mut Self::Tx, version: &PostVersion) -> Result<(), DomainError> {
        let updated = sqlx::query(
            r#"
            UPDATE post_versions
            SET title = $2, content = $3, published_at = $4
            WHERE id = $1
            "#,
        )
        .bind(version.id)
        .bind(&version.title)
        .bind(&version.content)
        .bind(version.published_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| database_error("update post version", e))?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::PostVersionNotFound(version.id));
        }
        Ok(())
    }

    async fn find_latest_by_post_id_for_update(
        &self,
        tx: &mut Self::Tx,
        post_id: Uuid,
    ) -> Result<Option<PostVersion>, DomainError> {
        let query = format!(
            "SELECT {COLUMNS} FROM post_versions \
             WHERE post_id = $1 \
             ORDER BY version_number DESC \
             LIMIT 1 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, PostVersion>(&query)
            .bind(post_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| database_error("find latest post version", e))
    }

    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<PostVersion>, DomainError> {
        let query = format!("SELECT {COLUMNS} FROM post_versions WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, PostVersion>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| database_error("find post version for update", e))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostVersion>, DomainError> {
        let query = format!("SELECT {COLUMNS} FROM post_versions WHERE id = $1");
        sqlx::query_as::<_, PostVersion>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("find post version", e))
    }

    async fn delete(&self, tx: &mut Self::Tx, id: Uuid) -> Result<(), DomainError> {
        let deleted = sqlx::query("DELETE FROM post_versions WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| database_error("delete post version", e))?;

        if deleted.rows_affected() == 0 {
            return Err(DomainError::PostVersionNotFound(id));
        }

        info!(version_id = %id, "post version deleted");
        Ok(())
    }
}
