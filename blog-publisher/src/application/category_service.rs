use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::{Collaborators, missing_fields, require_text};
use crate::data::category_repository::CategoryRepository;
use crate::data::post_version_repository::PostVersionRepository;
use crate::data::transaction::{Transactor, finish};
use crate::domain::category::{Category, PostVersionCategory};
use crate::domain::error::DomainError;
use crate::presentation::dto::{AttachCategoriesRequest, CategoryRequest, CategoryResponse};

#[async_trait]
pub trait CategoryUseCase: Send + Sync {
    async fn create_category(
        &self,
        request: CategoryRequest,
    ) -> Result<CategoryResponse, DomainError>;
    async fn update_category(
        &self,
        id: Uuid,
        request: CategoryRequest,
    ) -> Result<CategoryResponse, DomainError>;
    async fn get_category(&self, id: Uuid) -> Result<CategoryResponse, DomainError>;
    async fn attach_to_post_version(
        &self,
        request: AttachCategoriesRequest,
    ) -> Result<(), DomainError>;
}

pub struct CategoryService<T, V, C> {
    transactor: Arc<T>,
    versions: Arc<V>,
    categories: Arc<C>,
    collaborators: Collaborators,
}

impl<T, V, C> CategoryService<T, V, C>
where
    T: Transactor,
    V: PostVersionRepository<Tx = T::Tx>,
    C: CategoryRepository<Tx = T::Tx>,
{
    pub fn new(
        transactor: Arc<T>,
        versions: Arc<V>,
        categories: Arc<C>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            transactor,
            versions,
            categories,
            collaborators,
        }
    }

    fn clean_name(&self, raw: &str) -> Result<String, DomainError> {
        let mut missing = Vec::new();
        let name = require_text(
            self.collaborators.sanitizer.as_ref(),
            raw,
            "name",
            &mut missing,
        );
        missing_fields(missing)?;
        Ok(name)
    }

    async fn create_in(
        &self,
        tx: &mut T::Tx,
        name: String,
        now: DateTime<Utc>,
    ) -> Result<Category, DomainError> {
        if self.categories.find_by_name(tx, &name).await?.is_some() {
            return Err(DomainError::CategoryNameTaken(name));
        }
        let category = Category::new(self.collaborators.ids.next_id(), name, now);
        self.categories.create(tx, &category).await?;
        Ok(category)
    }

    async fn update_in(
        &self,
        tx: &mut T::Tx,
        id: Uuid,
        name: String,
        now: DateTime<Utc>,
    ) -> Result<Category, DomainError> {
        let mut category = self
            .categories
            .find_by_id_for_update(tx, id)
            .await?
            .ok_or(DomainError::CategoryNotFound(id))?;
        if category.name == name {
            return Err(DomainError::InvalidInput(
                "name is the same as before".into(),
            ));
        }
        if let Some(other) = self.categories.find_by_name(tx, &name).await? {
            if other.id != id {
                return Err(DomainError::CategoryNameTaken(name));
            }
        }

        category.rename(name, now);
        self.categories.update(tx, &category).await?;
        info!(category_id = %id, name = %category.name, "category renamed");
        Ok(category)
    }

    async fn attach_in(
        &self,
        tx: &mut T::Tx,
        request: &AttachCategoriesRequest,
        now: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let version_id = request.post_version_id;
        self.versions
            .find_by_id_for_update(tx, version_id)
            .await?
            .ok_or(DomainError::PostVersionNotFound(version_id))?;

        let found: HashSet<Uuid> = self
            .categories
            .find_by_ids(tx, &request.category_ids)
            .await?
            .into_iter()
            .map(|category| category.id)
            .collect();
        let missing: Vec<Uuid> = request
            .category_ids
            .iter()
            .copied()
            .filter(|id| !found.contains(id))
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::CategoriesNotFound(missing));
        }

        let links: Vec<PostVersionCategory> = request
            .category_ids
            .iter()
            .map(|&category_id| PostVersionCategory {
                post_version_id: version_id,
                category_id,
                created_at: now,
            })
            .collect();
        self.categories.attach_to_post_version(tx, &links).await
    }
}

#[async_trait]
impl<T, V, C> CategoryUseCase for CategoryService<T, V, C>
where
    T: Transactor + 'static,
    V: PostVersionRepository<Tx = T::Tx> + 'static,
    C: CategoryRepository<Tx = T::Tx> + 'static,
{
    #[instrument(skip(self))]
    async fn create_category(
        &self,
        request: CategoryRequest,
    ) -> Result<CategoryResponse, DomainError> {
        let name = self.clean_name(&request.name)?;
        let now = self.collaborators.clock.now();

        let mut tx = self.transactor.begin().await?;
        let result = self.create_in(&mut tx, name, now).await;
        let category = finish(tx, result).await?;

        info!(category_id = %category.id, "category created");
        Ok(CategoryResponse::from(category))
    }

    #[instrument(skip(self))]
    async fn update_category(
        &self,
        id: Uuid,
        request: CategoryRequest,
    ) -> Result<CategoryResponse, DomainError> {
        let name = self.clean_name(&request.name)?;
        let now = self.collaborators.clock.now();

        let mut tx = self.transactor.begin().await?;
        let result = self.update_in(&mut tx, id, name, now).await;
        let category = finish(tx, result).await?;

        Ok(CategoryResponse::from(category))
    }

    async fn get_category(&self, id: Uuid) -> Result<CategoryResponse, DomainError> {
        self.categories
            .find_by_id(id)
            .await?
            .map(CategoryResponse::from)
            .ok_or(DomainError::CategoryNotFound(id))
    }

    #[instrument(skip(self))]
    async fn attach_to_post_version(
        &self,
        request: AttachCategoriesRequest,
    ) -> Result<(), DomainError> {
        request.validate()?;
        let now = self.collaborators.clock.now();

        let mut tx = self.transactor.begin().await?;
        let result = self.attach_in(&mut tx, &request, now).await;
        let inserted = finish(tx, result).await?;

        info!(
            post_version_id = %request.post_version_id,
            requested = request.category_ids.len(),
            inserted,
            "categories attached to post version"
        );
        Ok(())
    }
}
