use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(id: Uuid, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, name: String, now: DateTime<Utc>) {
        self.name = name;
        self.updated_at = now;
    }
}

/// Join row between a post version and a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PostVersionCategory {
    pub post_version_id: Uuid,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
}
