//! Helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use blog_publisher::application::Collaborators;
use blog_publisher::application::category_service::CategoryService;
use blog_publisher::application::post_service::PostService;
use blog_publisher::data::memory::{InMemoryStore, MemoryTransaction};
use blog_publisher::data::post_version_repository::PostVersionRepository;
use blog_publisher::domain::error::DomainError;
use blog_publisher::domain::post::PostVersion;
use blog_publisher::infrastructure::clock::Clock;
use blog_publisher::infrastructure::ids::IdGenerator;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

pub type MemoryPosts = PostService<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore>;
pub type MemoryCategories = CategoryService<InMemoryStore, InMemoryStore, InMemoryStore>;

/// Clock that moves forward one second every time it is read.
pub struct TickingClock {
    seconds: AtomicI64,
}

impl TickingClock {
    pub fn new() -> Self {
        Self {
            seconds: AtomicI64::new(1_700_000_000),
        }
    }
}

impl Clock for TickingClock {
    fn now(&self) -> DateTime<Utc> {
        let seconds = self.seconds.fetch_add(1, Ordering::SeqCst);
        Utc.timestamp_opt(seconds, 0).single().unwrap()
    }
}

/// Predictable ids: 1, 2, 3, ...
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> Uuid {
        Uuid::from_u128(self.next.fetch_add(1, Ordering::SeqCst) as u128)
    }
}

pub fn collaborators() -> Collaborators {
    Collaborators::default().with_clock(Arc::new(TickingClock::new()))
}

pub struct Harness {
    pub store: InMemoryStore,
    pub posts: MemoryPosts,
    pub categories: MemoryCategories,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_collaborators(collaborators())
    }

    pub fn with_collaborators(collaborators: Collaborators) -> Self {
        let store = InMemoryStore::new();
        let shared = Arc::new(store.clone());
        let posts = PostService::new(
            Arc::clone(&shared),
            Arc::clone(&shared),
            Arc::clone(&shared),
            Arc::clone(&shared),
            collaborators.clone(),
        );
        let categories = CategoryService::new(
            Arc::clone(&shared),
            Arc::clone(&shared),
            shared,
            collaborators,
        );
        Self {
            store,
            posts,
            categories,
        }
    }
}

/// How a wrapped version store misbehaves.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    FailCreate,
    PanicOnUpdate,
}

/// Version store that delegates to the in-memory store but injects a fault.
pub struct FaultyVersions {
    pub inner: InMemoryStore,
    pub fault: Fault,
}

#[async_trait]
impl PostVersionRepository for FaultyVersions {
    type Tx = MemoryTransaction;

    async fn create(&self, tx: &mut Self::Tx, version: &PostVersion) -> Result<(), DomainError> {
        if self.fault == Fault::FailCreate {
            return Err(DomainError::Internal("disk on fire".into()));
        }
        PostVersionRepository::create(&self.inner, tx, version).await
    }

    async fn update(&self, tx: &mut Self::Tx, version: &PostVersion) -> Result<(), DomainError> {
        if self.fault == Fault::PanicOnUpdate {
            panic!("version store crashed mid-transaction");
        }
        PostVersionRepository::update(&self.inner, tx, version).await
    }

    async fn find_latest_by_post_id_for_update(
        &self,
        tx: &mut Self::Tx,
        post_id: Uuid,
    ) -> Result<Option<PostVersion>, DomainError> {
        self.inner.find_latest_by_post_id_for_update(tx, post_id).await
    }

    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<PostVersion>, DomainError> {
        PostVersionRepository::find_by_id_for_update(&self.inner, tx, id).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostVersion>, DomainError> {
        PostVersionRepository::find_by_id(&self.inner, id).await
    }

    async fn delete(&self, tx: &mut Self::Tx, id: Uuid) -> Result<(), DomainError> {
        self.inner.delete(tx, id).await
    }
}

pub type FaultyPosts = PostService<InMemoryStore, InMemoryStore, FaultyVersions, InMemoryStore>;

pub fn faulty_posts(store: &InMemoryStore, fault: Fault, ids: Arc<dyn IdGenerator>) -> FaultyPosts {
    let shared = Arc::new(store.clone());
    PostService::new(
        Arc::clone(&shared),
        Arc::clone(&shared),
        Arc::new(FaultyVersions {
            inner: store.clone(),
            fault,
        }),
        shared,
        collaborators().with_ids(ids),
    )
}
