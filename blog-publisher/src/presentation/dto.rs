use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::category::Category;
use crate::domain::error::DomainError;
use crate::domain::post::PostVersion;

// ======================= POSTS =======================

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostResponse {
    pub post_id: Uuid,
    pub post_version_id: Uuid,
    pub version_number: i64,
    pub title: String,
    pub content: String,
}

impl From<&PostVersion> for PostResponse {
    fn from(version: &PostVersion) -> Self {
        Self {
            post_id: version.post_id,
            post_version_id: version.id,
            version_number: version.version_number,
            title: version.title.clone(),
            content: version.content.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishResponse {
    pub post_id: Uuid,
    pub post_version_id: Uuid,
    pub published_at: DateTime<Utc>,
    pub title: String,
    pub content: String,
}

// ======================= CATEGORIES =======================

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachCategoriesRequest {
    pub post_version_id: Uuid,
    pub category_ids: Vec<Uuid>,
}

impl AttachCategoriesRequest {
    /// Rejects an empty id list and ids repeated within the request.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.category_ids.is_empty() {
            return Err(DomainError::InvalidInput("category ids required".into()));
        }
        let mut seen = HashSet::with_capacity(self.category_ids.len());
        let duplicates: Vec<String> = self
            .category_ids
            .iter()
            .filter(|id| !seen.insert(**id))
            .map(Uuid::to_string)
            .collect();
        if !duplicates.is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "duplicate category ids: {}",
                duplicates.join(", ")
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
