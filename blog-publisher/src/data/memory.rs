//! Process-local store backing every repository trait.
//!
//! A transaction holds an exclusive lock over all tables for its whole
//! lifetime and writes straight into them, recording the previous value of
//! every row it touches. Commit forgets the record; dropping the transaction
//! without committing (rollback, error, panic, cancellation) replays it in
//! reverse. This gives the same serialization the Postgres backend gets from
//! row locks, only coarser, and a write costs only the rows it touches.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::data::category_repository::CategoryRepository;
use crate::data::post_repository::PostRepository;
use crate::data::post_version_repository::PostVersionRepository;
use crate::data::transaction::{Transaction, Transactor};
use crate::domain::category::{Category, PostVersionCategory};
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostVersion, PostWithVersion};

type LinkKey = (Uuid, Uuid);

#[derive(Debug, Default)]
struct Tables {
    posts: HashMap<Uuid, Post>,
    versions: HashMap<Uuid, PostVersion>,
    categories: HashMap<Uuid, Category>,
    links: BTreeMap<LinkKey, PostVersionCategory>,
}

impl Tables {
    fn latest_version(&self, post_id: Uuid) -> Option<&PostVersion> {
        self.versions
            .values()
            .filter(|v| v.post_id == post_id)
            .max_by_key(|v| v.version_number)
    }

    fn name_taken(&self, name: &str, except: Uuid) -> bool {
        self.categories
            .values()
            .any(|c| c.name == name && c.id != except)
    }
}

/// Value a row had before the transaction wrote it; `None` if it was absent.
#[derive(Debug)]
enum Undo {
    Post(Uuid, Option<Post>),
    Version(Uuid, Option<PostVersion>),
    Category(Uuid, Option<Category>),
    Link(LinkKey, Option<PostVersionCategory>),
}

fn restore<K: std::hash::Hash + Eq, V>(table: &mut HashMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(row) => {
            table.insert(key, row);
        }
        None => {
            table.remove(&key);
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every version of a post, oldest first.
    pub async fn versions_of(&self, post_id: Uuid) -> Vec<PostVersion> {
        let tables = self.tables.lock().await;
        let mut versions: Vec<PostVersion> = tables
            .versions
            .values()
            .filter(|v| v.post_id == post_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.version_number);
        versions
    }

    pub async fn post(&self, id: Uuid) -> Option<Post> {
        self.tables.lock().await.posts.get(&id).cloned()
    }

    pub async fn links_of(&self, post_version_id: Uuid) -> Vec<PostVersionCategory> {
        self.tables
            .lock()
            .await
            .links
            .values()
            .filter(|link| link.post_version_id == post_version_id)
            .cloned()
            .collect()
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    undo: Vec<Undo>,
    committed: bool,
}

impl MemoryTransaction {
    fn tables(&self) -> &Tables {
        &self.guard
    }

    fn put_post(&mut self, post: Post) {
        let previous = self.guard.posts.insert(post.id, post.clone());
        self.undo.push(Undo::Post(post.id, previous));
    }

    fn put_version(&mut self, version: PostVersion) {
        let previous = self.guard.versions.insert(version.id, version.clone());
        self.undo.push(Undo::Version(version.id, previous));
    }

    fn remove_version(&mut self, id: Uuid) -> Option<PostVersion> {
        let removed = self.guard.versions.remove(&id)?;
        self.undo.push(Undo::Version(id, Some(removed.clone())));

        let keys: Vec<LinkKey> = self
            .guard
            .links
            .range((id, Uuid::nil())..=(id, Uuid::from_u128(u128::MAX)))
            .map(|(key, _)| *key)
            .collect();
        for key in keys {
            let link = self.guard.links.remove(&key);
            self.undo.push(Undo::Link(key, link));
        }
        Some(removed)
    }

    fn put_category(&mut self, category: Category) {
        let previous = self.guard.categories.insert(category.id, category.clone());
        self.undo.push(Undo::Category(category.id, previous));
    }

    fn put_link(&mut self, link: PostVersionCategory) {
        let key = (link.post_version_id, link.category_id);
        let previous = self.guard.links.insert(key, link);
        self.undo.push(Undo::Link(key, previous));
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let tables = &mut *self.guard;
        while let Some(undo) = self.undo.pop() {
            match undo {
                Undo::Post(id, previous) => restore(&mut tables.posts, id, previous),
                Undo::Version(id, previous) => restore(&mut tables.versions, id, previous),
                Undo::Category(id, previous) => restore(&mut tables.categories, id, previous),
                Undo::Link(key, previous) => match previous {
                    Some(link) => {
                        tables.links.insert(key, link);
                    }
                    None => {
                        tables.links.remove(&key);
                    }
                },
            }
        }
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(mut self) -> Result<(), DomainError> {
        self.committed = true;
        Ok(())
    }

    async fn rollback(self) -> Result<(), DomainError> {
        drop(self);
        Ok(())
    }
}

#[async_trait]
impl Transactor for InMemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, DomainError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        Ok(MemoryTransaction {
            guard,
            undo: Vec::new(),
            committed: false,
        })
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    type Tx = MemoryTransaction;

    async fn create(&self, tx: &mut Self::Tx, post: &Post) -> Result<(), DomainError> {
        if tx.tables().posts.contains_key(&post.id) {
            return Err(DomainError::Internal(format!("duplicate post id {}", post.id)));
        }
        tx.put_post(post.clone());
        Ok(())
    }

    async fn update(&self, tx: &mut Self::Tx, post: &Post) -> Result<(), DomainError> {
        let mut stored = tx
            .tables()
            .posts
            .get(&post.id)
            .cloned()
            .ok_or(DomainError::PostNotFound(post.id))?;
        stored.current_version_id = post.current_version_id;
        stored.updated_at = post.updated_at;
        tx.put_post(stored);
        Ok(())
    }

    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<Post>, DomainError> {
        Ok(tx.tables().posts.get(&id).cloned())
    }

    async fn find_with_current_version(
        &self,
        id: Uuid,
    ) -> Result<Option<PostWithVersion>, DomainError> {
        let tables = self.tables.lock().await;
        let Some(post) = tables.posts.get(&id) else {
            return Ok(None);
        };
        let version = post
            .current_version_id
            .and_then(|version_id| tables.versions.get(&version_id))
            .filter(|version| version.post_id == post.id);

        Ok(version.map(|version| PostWithVersion {
            id: post.id,
            current_version_id: version.id,
            created_at: post.created_at,
            updated_at: post.updated_at,
            title: version.title.clone(),
            content: version.content.clone(),
            version_number: version.version_number,
            published_at: version.published_at,
        }))
    }
}

#[async_trait]
impl PostVersionRepository for InMemoryStore {
    type Tx = MemoryTransaction;

    async fn create(&self, tx: &mut Self::Tx, version: &PostVersion) -> Result<(), DomainError> {
        let tables = tx.tables();
        if !tables.posts.contains_key(&version.post_id) {
            return Err(DomainError::Internal(format!(
                "post version {} references missing post {}",
                version.id, version.post_id
            )));
        }
        let number_taken = tables.versions.values().any(|v| {
            v.post_id == version.post_id && v.version_number == version.version_number
        });
        if number_taken || tables.versions.contains_key(&version.id) {
            return Err(DomainError::Internal(format!(
                "duplicate version {} of post {}",
                version.version_number, version.post_id
            )));
        }
        tx.put_version(version.clone());
        Ok(())
    }

    async fn update(&self, tx: &mut Self::Tx, version: &PostVersion) -> Result<(), DomainError> {
        let mut stored = tx
            .tables()
            .versions
            .get(&version.id)
            .cloned()
            .ok_or(DomainError::PostVersionNotFound(version.id))?;
        stored.title = version.title.clone();
        stored.content = version.content.clone();
        stored.published_at = version.published_at;
        tx.put_version(stored);
        Ok(())
    }

    async fn find_latest_by_post_id_for_update(
        &self,
        tx: &mut Self::Tx,
        post_id: Uuid,
    ) -> Result<Option<PostVersion>, DomainError> {
        Ok(tx.tables().latest_version(post_id).cloned())
    }

    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<PostVersion>, DomainError> {
        Ok(tx.tables().versions.get(&id).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostVersion>, DomainError> {
        Ok(self.tables.lock().await.versions.get(&id).cloned())
    }

    async fn delete(&self, tx: &mut Self::Tx, id: Uuid) -> Result<(), DomainError> {
        tx.remove_version(id)
            .map(|_| ())
            .ok_or(DomainError::PostVersionNotFound(id))
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    type Tx = MemoryTransaction;

    async fn create(&self, tx: &mut Self::Tx, category: &Category) -> Result<(), DomainError> {
        if tx.tables().name_taken(&category.name, category.id) {
            return Err(DomainError::CategoryNameTaken(category.name.clone()));
        }
        tx.put_category(category.clone());
        Ok(())
    }

    async fn update(&self, tx: &mut Self::Tx, category: &Category) -> Result<(), DomainError> {
        if tx.tables().name_taken(&category.name, category.id) {
            return Err(DomainError::CategoryNameTaken(category.name.clone()));
        }
        let mut stored = tx
            .tables()
            .categories
            .get(&category.id)
            .cloned()
            .ok_or(DomainError::CategoryNotFound(category.id))?;
        stored.name = category.name.clone();
        stored.updated_at = category.updated_at;
        tx.put_category(stored);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, DomainError> {
        Ok(self.tables.lock().await.categories.get(&id).cloned())
    }

    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<Category>, DomainError> {
        Ok(tx.tables().categories.get(&id).cloned())
    }

    async fn find_by_name(
        &self,
        tx: &mut Self::Tx,
        name: &str,
    ) -> Result<Option<Category>, DomainError> {
        Ok(tx
            .tables()
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn find_by_ids(
        &self,
        tx: &mut Self::Tx,
        ids: &[Uuid],
    ) -> Result<Vec<Category>, DomainError> {
        let tables = tx.tables();
        Ok(ids
            .iter()
            .filter_map(|id| tables.categories.get(id).cloned())
            .collect())
    }

    async fn attach_to_post_version(
        &self,
        tx: &mut Self::Tx,
        links: &[PostVersionCategory],
    ) -> Result<u64, DomainError> {
        let mut inserted = 0;
        for link in links {
            let tables = tx.tables();
            if !tables.versions.contains_key(&link.post_version_id) {
                return Err(DomainError::PostVersionNotFound(link.post_version_id));
            }
            if !tables.categories.contains_key(&link.category_id) {
                return Err(DomainError::CategoryNotFound(link.category_id));
            }
            if !tables
                .links
                .contains_key(&(link.post_version_id, link.category_id))
            {
                tx.put_link(link.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_by_post_version(
        &self,
        post_version_id: Uuid,
    ) -> Result<Vec<Category>, DomainError> {
        let tables = self.tables.lock().await;
        let mut categories: Vec<Category> = tables
            .links
            .values()
            .filter(|link| link.post_version_id == post_version_id)
            .filter_map(|link| tables.categories.get(&link.category_id).cloned())
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}
