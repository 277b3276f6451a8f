use std::sync::Arc;

use blog_publisher::application::post_service::PostUseCase;
use blog_publisher::data::memory::InMemoryStore;
use blog_publisher::domain::error::{DomainError, ErrorKind};
use blog_publisher::presentation::dto::{CreatePostRequest, UpdatePostRequest};
use uuid::Uuid;

mod common;

use common::Harness;

fn create() -> CreatePostRequest {
    CreatePostRequest {
        title: "T".into(),
        content: "C".into(),
    }
}

fn update(n: usize) -> UpdatePostRequest {
    UpdatePostRequest {
        title: Some(format!("T{n}")),
        content: Some(format!("C{n}")),
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Update,
    Publish,
    Delete,
}

static OPS: [Op; 3] = [Op::Update, Op::Publish, Op::Delete];

/// Every operation sequence of length `len` over `OPS`.
fn sequences(len: usize) -> Vec<Vec<Op>> {
    (0..len).fold(vec![Vec::new()], |acc, _| {
        acc.into_iter()
            .flat_map(|prefix| {
                OPS.iter().map(move |op| {
                    let mut next = prefix.clone();
                    next.push(*op);
                    next
                })
            })
            .collect()
    })
}

async fn assert_invariants(store: &InMemoryStore, post_id: Uuid, trail: &[Op]) {
    let versions = store.versions_of(post_id).await;
    let drafts = versions.iter().filter(|v| v.published_at.is_none()).count();
    assert!(drafts <= 1, "{drafts} drafts after {trail:?}");

    for (index, version) in versions.iter().enumerate() {
        assert_eq!(
            version.version_number,
            index as i64 + 1,
            "gap in version numbers after {trail:?}"
        );
    }
    for pair in versions.windows(2) {
        assert!(
            pair[0].created_at <= pair[1].created_at,
            "version order disagrees with creation order after {trail:?}"
        );
        assert!(
            pair[0].published_at.is_some(),
            "draft below the latest version after {trail:?}"
        );
    }

    let post = store.post(post_id).await.expect("post shell is never deleted");
    assert_eq!(
        post.current_version_id,
        versions.last().map(|v| v.id),
        "current version is not the latest after {trail:?}"
    );
}

#[tokio::test]
async fn single_draft_invariant_holds_for_every_interleaving() {
    for len in 1..=4 {
        for sequence in sequences(len) {
            let h = Harness::new();
            let created = h.posts.create_post(create()).await.unwrap();
            assert_invariants(&h.store, created.post_id, &[]).await;

            for (step, op) in sequence.iter().enumerate() {
                let result = match op {
                    Op::Update => h
                        .posts
                        .update_post(created.post_id, update(step))
                        .await
                        .map(|_| ()),
                    Op::Publish => h.posts.publish_post(created.post_id).await.map(|_| ()),
                    Op::Delete => h.posts.delete_draft(created.post_id).await,
                };
                if let Err(err) = result {
                    assert!(
                        matches!(err.kind(), ErrorKind::NotFound | ErrorKind::Conflict),
                        "unexpected {err:?} after {:?}",
                        &sequence[..=step]
                    );
                }
                assert_invariants(&h.store, created.post_id, &sequence[..=step]).await;
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_publishes_succeed_once() {
    let h = Arc::new(Harness::new());
    let post_id = h.posts.create_post(create()).await.unwrap().post_id;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.posts.publish_post(post_id).await })
        })
        .collect();

    let mut published = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => published += 1,
            Err(DomainError::AlreadyPublished(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(published, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_after_publish_stack_one_draft() {
    let h = Arc::new(Harness::new());
    let post_id = h.posts.create_post(create()).await.unwrap().post_id;
    h.posts.publish_post(post_id).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.posts.update_post(post_id, update(n)).await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.version_number, 2);
    }

    let versions = h.store.versions_of(post_id).await;
    assert_eq!(versions.len(), 2);
    assert!(versions[1].published_at.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_posts_do_not_interfere() {
    let h = Arc::new(Harness::new());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                let created = h.posts.create_post(create()).await?;
                h.posts.publish_post(created.post_id).await?;
                h.posts.update_post(created.post_id, update(1)).await?;
                Ok::<_, DomainError>(created.post_id)
            })
        })
        .collect();

    for handle in handles {
        let post_id = handle.await.unwrap().unwrap();
        let detail = h.posts.get_post(post_id).await.unwrap();
        assert_eq!(detail.version_number, 2);
    }
}
