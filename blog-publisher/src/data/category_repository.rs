use crate::data::database_error;
use crate::data::transaction::PgTransaction;
use crate::domain::category::{Category, PostVersionCategory};
use crate::domain::error::DomainError;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    type Tx: Send;

    async fn create(&self, tx: &mut Self::Tx, category: &Category) -> Result<(), DomainError>;
    async fn update(&self, tx: &mut Self::Tx, category: &Category) -> Result<(), DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, DomainError>;
    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<Category>, DomainError>;
    /// Exact, case-sensitive match.
    async fn find_by_name(
        &self,
        tx: &mut Self::Tx,
        name: &str,
    ) -> Result<Option<Category>, DomainError>;
    async fn find_by_ids(
        &self,
        tx: &mut Self::Tx,
        ids: &[Uuid],
    ) -> Result<Vec<Category>, DomainError>;
    /// Inserts the links, skipping pairs that already exist. Returns how many
    /// rows were actually written.
    async fn attach_to_post_version(
        &self,
        tx: &mut Self::Tx,
        links: &[PostVersionCategory],
    ) -> Result<u64, DomainError>;
    async fn list_by_post_version(
        &self,
        post_version_id: Uuid,
    ) -> Result<Vec<Category>, DomainError>;
}

const UNIQUE_NAME_CONSTRAINT: &str = "categories_name_key";

#[derive(Clone)]
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn name_conflict(e: sqlx::Error, name: &str) -> DomainError {
    if e.as_database_error()
        .and_then(|db| db.constraint())
        .map(|c| c == UNIQUE_NAME_CONSTRAINT)
        == Some(true)
    {
        DomainError::CategoryNameTaken(name.to_string())
    } else {
        database_error("write category", e)
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    type Tx = PgTransaction;

    async fn create(&self, tx: &mut Self::Tx, category: &Category) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| name_conflict(e, &category.name))?;

        info!(category_id = %category.id, name = %category.name, "category created");
        Ok(())
    }

    async fn update(&self, tx: &mut Self::Tx, category: &Category) -> Result<(), DomainError> {
        let updated = sqlx::query("UPDATE categories SET name = $1, updated_at = $2 WHERE id = $3")
            .bind(&category.name)
            .bind(category.updated_at)
            .bind(category.id)
            .execute(&mut **tx)
            .await
            .map_err(|e| name_conflict(e, &category.name))?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::CategoryNotFound(category.id));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, DomainError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find category", e))
    }

    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<Category>, DomainError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| database_error("find category for update", e))
    }

    async fn find_by_name(
        &self,
        tx: &mut Self::Tx,
        name: &str,
    ) -> Result<Option<Category>, DomainError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| database_error("find category by name", e))
    }

    async fn find_by_ids(
        &self,
        tx: &mut Self::Tx,
        ids: &[Uuid],
    ) -> Result<Vec<Category>, DomainError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| database_error("find categories by ids", e))
    }

    async fn attach_to_post_version(
        &self,
        tx: &mut Self::Tx,
        links: &[PostVersionCategory],
    ) -> Result<u64, DomainError> {
        if links.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO post_version_categories (post_version_id, category_id, created_at) ",
        );
        builder.push_values(links, |mut row, link| {
            row.push_bind(link.post_version_id)
                .push_bind(link.category_id)
                .push_bind(link.created_at);
        });
        builder.push(" ON CONFLICT (post_version_id, category_id) DO NOTHING");

        let inserted = builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(|e| database_error("attach categories to post version", e))?;

        Ok(inserted.rows_affected())
    }

    async fn list_by_post_version(
        &self,
        post_version_id: Uuid,
    ) -> Result<Vec<Category>, DomainError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name, c.created_at, c.updated_at
            FROM categories c
            JOIN post_version_categories pvc ON pvc.category_id = c.id
            WHERE pvc.post_version_id = $1
            ORDER BY c.name
            "#,
        )
        .bind(post_version_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("list categories of post version", e))
    }
}
