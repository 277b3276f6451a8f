use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::category::Category;
use crate::domain::error::DomainError;

/// Stable identity of an article. Content lives in its versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub current_version_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            current_version_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn point_to(&mut self, version_id: Option<Uuid>, now: DateTime<Utc>) {
        self.current_version_id = version_id;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Draft,
    Published,
}

/// One snapshot of a post. Mutable in place only while it is a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PostVersion {
    pub id: Uuid,
    pub post_id: Uuid,
    pub version_number: i64,
    pub title: String,
    pub content: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of applying an edit to the latest version of a post.
#[derive(Debug, Clone, PartialEq)]
pub enum Revision {
    /// The latest version was a draft and now carries the new content.
    Amended(PostVersion),
    /// The latest version was published; a new draft was stacked on top.
    Superseded(PostVersion),
}

impl PostVersion {
    pub fn first_draft(
        id: Uuid,
        post_id: Uuid,
        title: String,
        content: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            post_id,
            version_number: 1,
            title,
            content,
            published_at: None,
            created_at: now,
        }
    }

    pub fn status(&self) -> VersionStatus {
        if self.published_at.is_some() {
            VersionStatus::Published
        } else {
            VersionStatus::Draft
        }
    }

    pub fn is_published(&self) -> bool {
        self.status() == VersionStatus::Published
    }

    /// Drafts are amended in place; published versions are never touched and
    /// get a successor numbered `version_number + 1` instead.
    pub fn revise(
        self,
        title: String,
        content: String,
        next_id: impl FnOnce() -> Uuid,
        now: DateTime<Utc>,
    ) -> Revision {
        match self.status() {
            VersionStatus::Draft => Revision::Amended(PostVersion {
                title,
                content,
                ..self
            }),
            VersionStatus::Published => Revision::Superseded(PostVersion {
                id: next_id(),
                post_id: self.post_id,
                version_number: self.version_number + 1,
                title,
                content,
                published_at: None,
                created_at: now,
            }),
        }
    }

    pub fn publish(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.is_published() {
            return Err(DomainError::AlreadyPublished(self.id));
        }
        self.published_at = Some(now);
        Ok(())
    }

    pub fn ensure_deletable(&self) -> Result<(), DomainError> {
        if self.is_published() {
            return Err(DomainError::PublishedVersionNotDeletable(self.id));
        }
        Ok(())
    }
}

/// Post joined with the version it currently points at.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PostWithVersion {
    pub id: Uuid,
    pub current_version_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub version_number: i64,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub post_id: Uuid,
    pub current_version_id: Uuid,
    pub title: String,
    pub content: String,
    pub version_number: i64,
    pub status: VersionStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub categories: Vec<Category>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostDetail {
    pub fn new(row: PostWithVersion, categories: Vec<Category>) -> Self {
        let status = if row.published_at.is_some() {
            VersionStatus::Published
        } else {
            VersionStatus::Draft
        };
        Self {
            post_id: row.id,
            current_version_id: row.current_version_id,
            title: row.title,
            content: row.content,
            version_number: row.version_number,
            status,
            published_at: row.published_at,
            categories,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn draft() -> PostVersion {
        PostVersion::first_draft(
            Uuid::now_v7(),
            Uuid::now_v7(),
            "T".into(),
            "C".into(),
            Utc::now(),
        )
    }

    #[test]
    fn first_draft_is_unpublished_version_one() {
        let version = draft();
        assert_eq!(version.version_number, 1);
        assert_eq!(version.status(), VersionStatus::Draft);
    }

    #[test]
    fn revising_a_draft_keeps_identity_and_number() {
        let version = draft();
        let id = version.id;
        let created_at = version.created_at;

        let revision = version.revise(
            "T2".into(),
            "C2".into(),
            || panic!("drafts must not allocate an id"),
            Utc::now(),
        );

        assert_matches!(revision, Revision::Amended(ref v) if v.id == id
            && v.version_number == 1
            && v.created_at == created_at
            && v.title == "T2");
    }

    #[test]
    fn revising_a_published_version_stacks_a_new_draft() {
        let mut version = draft();
        version.publish(Utc::now()).unwrap();
        let next = Uuid::now_v7();

        let revision = version.clone().revise("T2".into(), "C2".into(), || next, Utc::now());

        assert_matches!(revision, Revision::Superseded(ref v) if v.id == next
            && v.post_id == version.post_id
            && v.version_number == 2
            && v.published_at.is_none());
    }

    #[test]
    fn publishing_twice_is_rejected() {
        let mut version = draft();
        let first = Utc::now();
        version.publish(first).unwrap();

        assert_matches!(
            version.publish(Utc::now()),
            Err(DomainError::AlreadyPublished(id)) if id == version.id
        );
        assert_eq!(version.published_at, Some(first));
    }

    #[test]
    fn only_drafts_are_deletable() {
        let mut version = draft();
        assert!(version.ensure_deletable().is_ok());
        version.publish(Utc::now()).unwrap();
        assert_matches!(
            version.ensure_deletable(),
            Err(DomainError::PublishedVersionNotDeletable(_))
        );
    }

    #[test]
    fn pointing_a_post_bumps_updated_at() {
        let created = Utc::now();
        let mut post = Post::new(Uuid::now_v7(), created);
        let version_id = Uuid::now_v7();
        let later = created + chrono::Duration::seconds(5);

        post.point_to(Some(version_id), later);

        assert_eq!(post.current_version_id, Some(version_id));
        assert_eq!(post.created_at, created);
        assert_eq!(post.updated_at, later);
    }
}
