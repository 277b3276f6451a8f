use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::{Collaborators, missing_fields, require_text};
use crate::data::category_repository::CategoryRepository;
use crate::data::post_repository::PostRepository;
use crate::data::post_version_repository::PostVersionRepository;
use crate::data::transaction::{Transactor, finish};
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostDetail, PostVersion, Revision};
use crate::presentation::dto::{
    CreatePostRequest, PostResponse, PublishResponse, UpdatePostRequest,
};

/// Operations the delivery layer binds to.
#[async_trait]
pub trait PostUseCase: Send + Sync {
    async fn create_post(&self, request: CreatePostRequest) -> Result<PostResponse, DomainError>;
    async fn update_post(
        &self,
        post_id: Uuid,
        request: UpdatePostRequest,
    ) -> Result<PostResponse, DomainError>;
    async fn publish_post(&self, post_id: Uuid) -> Result<PublishResponse, DomainError>;
    async fn delete_draft(&self, post_id: Uuid) -> Result<(), DomainError>;
    async fn get_post(&self, post_id: Uuid) -> Result<PostDetail, DomainError>;
    async fn get_version(&self, version_id: Uuid) -> Result<PostVersion, DomainError>;
}

/// Drives the draft/published lifecycle of posts.
///
/// Every mutation runs in one transaction and takes its locks in the same
/// order: the post row first, then its latest version.
pub struct PostService<T, P, V, C> {
    transactor: Arc<T>,
    posts: Arc<P>,
    versions: Arc<V>,
    categories: Arc<C>,
    collaborators: Collaborators,
}

impl<T, P, V, C> PostService<T, P, V, C>
where
    T: Transactor,
    P: PostRepository<Tx = T::Tx>,
    V: PostVersionRepository<Tx = T::Tx>,
    C: CategoryRepository<Tx = T::Tx>,
{
    pub fn new(
        transactor: Arc<T>,
        posts: Arc<P>,
        versions: Arc<V>,
        categories: Arc<C>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            transactor,
            posts,
            versions,
            categories,
            collaborators,
        }
    }

    async fn lock_post(&self, tx: &mut T::Tx, post_id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id_for_update(tx, post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))
    }

    async fn lock_latest_version(
        &self,
        tx: &mut T::Tx,
        post_id: Uuid,
    ) -> Result<PostVersion, DomainError> {
        self.versions
            .find_latest_by_post_id_for_update(tx, post_id)
            .await?
            .ok_or(DomainError::NoVersions(post_id))
    }

    async fn create_in(
        &self,
        tx: &mut T::Tx,
        title: String,
        content: String,
        now: DateTime<Utc>,
    ) -> Result<PostVersion, DomainError> {
        let mut post = Post::new(self.collaborators.ids.next_id(), now);
        self.posts.create(tx, &post).await?;

        let version = PostVersion::first_draft(
            self.collaborators.ids.next_id(),
            post.id,
            title,
            content,
            now,
        );
        self.versions.create(tx, &version).await?;

        post.point_to(Some(version.id), now);
        self.posts.update(tx, &post).await?;
        Ok(version)
    }

    async fn update_in(
        &self,
        tx: &mut T::Tx,
        post_id: Uuid,
        title: Option<String>,
        content: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<PostVersion, DomainError> {
        let mut post = self.lock_post(tx, post_id).await?;
        let latest = self.lock_latest_version(tx, post_id).await?;

        let title = title.unwrap_or_else(|| latest.title.clone());
        let content = content.unwrap_or_else(|| latest.content.clone());

        match latest.revise(title, content, || self.collaborators.ids.next_id(), now) {
            Revision::Amended(draft) => {
                self.versions.update(tx, &draft).await?;
                info!(
                    post_id = %post_id,
                    version_id = %draft.id,
                    version_number = draft.version_number,
                    "draft amended"
                );
                Ok(draft)
            }
            Revision::Superseded(draft) => {
                self.versions.create(tx, &draft).await?;
                post.point_to(Some(draft.id), now);
                self.posts.update(tx, &post).await?;
                info!(
                    post_id = %post_id,
                    version_id = %draft.id,
                    version_number = draft.version_number,
                    "new draft stacked on published version"
                );
                Ok(draft)
            }
        }
    }

    async fn publish_in(
        &self,
        tx: &mut T::Tx,
        post_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PostVersion, DomainError> {
        let mut post = self.lock_post(tx, post_id).await?;
        let mut latest = self.lock_latest_version(tx, post_id).await?;

        latest.publish(now)?;
        self.versions.update(tx, &latest).await?;

        post.point_to(Some(latest.id), now);
        self.posts.update(tx, &post).await?;

        info!(
            post_id = %post_id,
            version_id = %latest.id,
            version_number = latest.version_number,
            "post version published"
        );
        Ok(latest)
    }

    async fn delete_draft_in(
        &self,
        tx: &mut T::Tx,
        post_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut post = self.lock_post(tx, post_id).await?;
        let latest = self.lock_latest_version(tx, post_id).await?;
        latest.ensure_deletable()?;

        self.versions.delete(tx, latest.id).await?;

        // The post falls back to whatever is now the newest version, or to
        // nothing when the deleted draft was the first one.
        let previous = self
            .versions
            .find_latest_by_post_id_for_update(tx, post_id)
            .await?;
        post.point_to(previous.as_ref().map(|v| v.id), now);
        self.posts.update(tx, &post).await?;

        info!(
            post_id = %post_id,
            version_id = %latest.id,
            version_number = latest.version_number,
            current_version_id = ?post.current_version_id,
            "draft deleted"
        );
        Ok(())
    }
}

#[async_trait]
impl<T, P, V, C> PostUseCase for PostService<T, P, V, C>
where
    T: Transactor + 'static,
    P: PostRepository<Tx = T::Tx> + 'static,
    V: PostVersionRepository<Tx = T::Tx> + 'static,
    C: CategoryRepository<Tx = T::Tx> + 'static,
{
    #[instrument(skip(self, request))]
    async fn create_post(&self, request: CreatePostRequest) -> Result<PostResponse, DomainError> {
        let sanitizer = self.collaborators.sanitizer.as_ref();
        let mut missing = Vec::new();
        let title = require_text(sanitizer, &request.title, "title", &mut missing);
        let content = require_text(sanitizer, &request.content, "content", &mut missing);
        missing_fields(missing)?;

        let now = self.collaborators.clock.now();
        let mut tx = self.transactor.begin().await?;
        let result = self.create_in(&mut tx, title, content, now).await;
        let version = finish(tx, result).await?;

        Ok(PostResponse::from(&version))
    }

    #[instrument(skip(self, request))]
    async fn update_post(
        &self,
        post_id: Uuid,
        request: UpdatePostRequest,
    ) -> Result<PostResponse, DomainError> {
        let sanitizer = self.collaborators.sanitizer.as_ref();
        let title = request
            .title
            .map(|raw| sanitizer.sanitize(&raw))
            .filter(|clean| !clean.is_empty());
        let content = request
            .content
            .map(|raw| sanitizer.sanitize(&raw))
            .filter(|clean| !clean.is_empty());
        if title.is_none() && content.is_none() {
            return Err(DomainError::InvalidInput(
                "title or content is required".into(),
            ));
        }

        let now = self.collaborators.clock.now();
        let mut tx = self.transactor.begin().await?;
        let result = self.update_in(&mut tx, post_id, title, content, now).await;
        let version = finish(tx, result).await?;

        Ok(PostResponse::from(&version))
    }

    #[instrument(skip(self))]
    async fn publish_post(&self, post_id: Uuid) -> Result<PublishResponse, DomainError> {
        let now = self.collaborators.clock.now();
        let mut tx = self.transactor.begin().await?;
        let result = self.publish_in(&mut tx, post_id, now).await;
        let version = finish(tx, result).await?;

        Ok(PublishResponse {
            post_id: version.post_id,
            post_version_id: version.id,
            published_at: version.published_at.unwrap_or(now),
            title: version.title,
            content: version.content,
        })
    }

    #[instrument(skip(self))]
    async fn delete_draft(&self, post_id: Uuid) -> Result<(), DomainError> {
        let now = self.collaborators.clock.now();
        let mut tx = self.transactor.begin().await?;
        let result = self.delete_draft_in(&mut tx, post_id, now).await;
        finish(tx, result).await
    }

    async fn get_post(&self, post_id: Uuid) -> Result<PostDetail, DomainError> {
        let row = self
            .posts
            .find_with_current_version(post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))?;
        let categories = self
            .categories
            .list_by_post_version(row.current_version_id)
            .await?;
        Ok(PostDetail::new(row, categories))
    }

    async fn get_version(&self, version_id: Uuid) -> Result<PostVersion, DomainError> {
        self.versions
            .find_by_id(version_id)
            .await?
            .ok_or(DomainError::PostVersionNotFound(version_id))
    }
}
