use crate::data::database_error;
use crate::data::transaction::PgTransaction;
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostWithVersion};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

#[async_trait]
pub trait PostRepository: Send + Sync {
    type Tx: Send;

    async fn create(&self, tx: &mut Self::Tx, post: &Post) -> Result<(), DomainError>;
    /// Persists `current_version_id` and `updated_at`.
    async fn update(&self, tx: &mut Self::Tx, post: &Post) -> Result<(), DomainError>;
    /// Locking read; the row stays locked until `tx` ends.
    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<Post>, DomainError>;
    async fn find_with_current_version(
        &self,
        id: Uuid,
    ) -> Result<Option<PostWithVersion>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    type Tx = PgTransaction;

    async fn create(&self, tx: &mut Self::Tx, post: &Post) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, current_version_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(post.id)
        .bind(post.current_version_id)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| database_error("create post", e))?;

        info!(post_id = %post.id, "post created");
        Ok(())
    }

    async fn update(&self, tx: &mut Self::Tx, post: &Post) -> Result<(), DomainError> {
        let updated = sqlx::query(
            r#"
            UPDATE posts
            SET current_version_id = $1, updated_at = $2
            WHERE id = $3
            "#,
        )
        .bind(post.current_version_id)
        .bind(post.updated_at)
        .bind(post.id)
        .execute(&mut **tx)
        .await
        .map_err(|e| database_error("update post", e))?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::PostNotFound(post.id));
        }
        Ok(())
    }

    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, current_version_id, created_at, updated_at
            FROM posts WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| database_error("lock post", e))
    }

    async fn find_with_current_version(
        &self,
        id: Uuid,
    ) -> Result<Option<PostWithVersion>, DomainError> {
        sqlx::query_as::<_, PostWithVersion>(
            r#"
            SELECT p.id, p.current_version_id, p.created_at, p.updated_at,
                   pv.title, pv.content, pv.version_number, pv.published_at
            FROM posts p
            JOIN post_versions pv ON pv.id = p.current_version_id AND pv.post_id = p.id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find post with current version", e))
    }
}
