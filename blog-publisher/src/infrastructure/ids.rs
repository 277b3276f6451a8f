use uuid::Uuid;

/// Source of identifiers for posts, versions and categories.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Time-ordered UUIDs: later ids sort after earlier ones, both as bytes and
/// in their hyphenated text form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn next_id(&self) -> Uuid {
        Uuid::now_v7()
    }
}
