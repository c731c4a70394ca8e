//! Thread lifecycle, likes under concurrency, listing and suspension.

use std::sync::Arc;

use domains::{
    AppError, ErrorKind, PageRequest, SortDirection, SortField, SuspensionChange, ThreadChanges, ThreadFilter,
    ThreadSort,
};
use futures::future::join_all;
use integration_tests::World;

#[tokio::test]
async fn concurrent_likes_from_distinct_users_all_land() {
    let world = Arc::new(World::new());
    let owner = world.user("owner").await;
    let topic = world.topic("General").await;
    let thread = world.thread(&owner, &topic, "Popular").await;

    let mut likers = Vec::new();
    for i in 0..24 {
        likers.push(world.user(&format!("fan{i}")).await);
    }

    let tasks = likers.iter().map(|liker| {
        let world = world.clone();
        let (user_id, thread_id) = (liker.id, thread.id);
        tokio::spawn(async move { world.services.threads.like(user_id, thread_id).await })
    });
    for outcome in join_all(tasks).await {
        outcome.unwrap().unwrap();
    }

    let stored = world.services.threads.get(thread.id).await.unwrap();
    assert_eq!(stored.likes.len(), likers.len());

    let err = world.services.threads.like(likers[3].id, thread.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn unlike_requires_a_prior_like() {
    let world = World::new();
    let owner = world.user("owner").await;
    let fan = world.user("fan").await;
    let topic = world.topic("General").await;
    let thread = world.thread(&owner, &topic, "t").await;

    let err = world.services.threads.unlike(fan.id, thread.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotLiked { .. }));

    world.services.threads.like(fan.id, thread.id).await.unwrap();
    world.services.threads.like(owner.id, thread.id).await.unwrap();
    world.services.threads.unlike(fan.id, thread.id).await.unwrap();

    let stored = world.services.threads.get(thread.id).await.unwrap();
    assert_eq!(stored.likes.len(), 1);
    assert!(stored.is_liked_by(owner.id));
}

#[tokio::test]
async fn like_on_missing_thread_is_not_found() {
    let world = World::new();
    let fan = world.user("fan").await;
    let err = world.services.threads.like(fan.id, uuid::Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, AppError::ThreadNotFound(_)));
}

#[tokio::test]
async fn second_page_of_fifteen_has_five() {
    let world = World::new();
    let owner = world.user("owner").await;
    let topic = world.topic("General").await;
    for i in 0..15 {
        world.thread(&owner, &topic, &format!("thread {i:02}")).await;
    }

    let sort = ThreadSort { field: SortField::Title, direction: SortDirection::Asc };
    let page = world
        .services
        .threads
        .paginate(&ThreadFilter::default(), sort, PageRequest::new(2, 10))
        .await
        .unwrap();

    assert_eq!(page.items.len(), 5);
    assert_eq!(page.total_items, 15);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items[0].title, "thread 10");
}

#[tokio::test]
async fn filters_narrow_the_total_as_well_as_the_page() {
    let world = World::new();
    let owner = world.user("owner").await;
    let rust = world.topic("Rust").await;
    let go = world.topic("Go").await;
    world.thread(&owner, &rust, "Borrow checker tips").await;
    world.thread(&owner, &rust, "Async traits").await;
    world.thread(&owner, &go, "Goroutines vs tasks").await;

    let by_topic = ThreadFilter { topic_id: Some(rust.id), ..Default::default() };
    let page = world
        .services
        .threads
        .paginate(&by_topic, ThreadSort::default(), PageRequest::new(1, 1))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_items, 2);

    let by_title = ThreadFilter { title: Some("TASKS".into()), ..Default::default() };
    let page = world
        .services
        .threads
        .paginate(&by_title, ThreadSort::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].title, "Goroutines vs tasks");
}

#[tokio::test]
async fn only_creator_or_admin_may_update() {
    let world = World::new();
    let owner = world.user("owner").await;
    let stranger = world.user("stranger").await;
    let admin = world.admin("root").await;
    let topic = world.topic("General").await;
    let other_topic = world.topic("Meta").await;
    let thread = world.thread(&owner, &topic, "Original").await;

    let changes = ThreadChanges {
        topic_id: other_topic.id,
        title: "Edited".into(),
        description: "new".into(),
        suspension: None,
    };
    let err = world
        .services
        .threads
        .update(stranger.id, thread.id, changes.clone(), false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let updated = world.services.threads.update(admin.id, thread.id, changes, true).await.unwrap();
    assert_eq!(updated.title, "Edited");
    assert_eq!(updated.topic_id, other_topic.id);
    assert!(updated.updated_at >= thread.updated_at);

    let bad_topic = ThreadChanges {
        topic_id: uuid::Uuid::now_v7(),
        title: "x".into(),
        description: "y".into(),
        suspension: None,
    };
    let err = world.services.threads.update(owner.id, thread.id, bad_topic, false).await.unwrap_err();
    assert!(matches!(err, AppError::TopicNotFound(_)));
}

#[tokio::test]
async fn suspending_a_user_hides_their_threads_until_unsuspended() {
    let world = World::new();
    let author = world.user("author").await;
    let other = world.user("other").await;
    let topic = world.topic("General").await;
    world.thread(&author, &topic, "a1").await;
    world.thread(&author, &topic, "a2").await;
    world.thread(&other, &topic, "o1").await;

    let suspended = world.services.coordinator.suspend_user(author.id).await.unwrap();
    assert_eq!(suspended, 2);
    assert!(!world.services.users.get(author.id).await.unwrap().is_active);

    let visible = world
        .services
        .threads
        .paginate(&ThreadFilter::default(), ThreadSort::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(visible.total_items, 1);

    let everything = ThreadFilter { include_suspended: true, ..Default::default() };
    let all = world
        .services
        .threads
        .paginate(&everything, ThreadSort::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.total_items, 3);
    assert!(all.items.iter().filter(|t| t.creator_id == author.id).all(|t| t.is_suspended()));

    world.services.coordinator.unsuspend_user(author.id).await.unwrap();
    let visible = world
        .services
        .threads
        .paginate(&ThreadFilter::default(), ThreadSort::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(visible.total_items, 3);
}

#[tokio::test]
async fn admin_suspends_and_restores_a_single_thread() {
    let world = World::new();
    let owner = world.user("owner").await;
    let admin = world.admin("root").await;
    let topic = world.topic("General").await;
    let thread = world.thread(&owner, &topic, "Flagged").await;
    world.thread(&owner, &topic, "Fine").await;

    let mut changes = ThreadChanges {
        topic_id: topic.id,
        title: thread.title.clone(),
        description: thread.description.clone(),
        suspension: Some(SuspensionChange::Suspend { detail: Some("off topic".into()) }),
    };
    let err = world.services.threads.update(owner.id, thread.id, changes.clone(), false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(!world.services.threads.get(thread.id).await.unwrap().is_suspended());

    let updated = world.services.threads.update(admin.id, thread.id, changes.clone(), true).await.unwrap();
    assert_eq!(updated.suspension.as_ref().map(|s| s.detail.as_str()), Some("off topic"));
    let stored = world.services.threads.get(thread.id).await.unwrap();
    assert!(stored.is_suspended());
    assert!(world.services.users.get(owner.id).await.unwrap().is_active);

    let visible = world
        .services
        .threads
        .paginate(&ThreadFilter::default(), ThreadSort::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(visible.total_items, 1);

    changes.suspension = Some(SuspensionChange::Lift);
    world.services.threads.update(admin.id, thread.id, changes, true).await.unwrap();
    assert!(!world.services.threads.get(thread.id).await.unwrap().is_suspended());
}

#[tokio::test]
async fn admins_cannot_be_suspended() {
    let world = World::new();
    let admin = world.admin("root").await;
    let err = world.services.coordinator.suspend_user(admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::CannotSuspendAdmin));
    assert!(world.services.users.get(admin.id).await.unwrap().is_active);
}

#[tokio::test]
async fn composed_view_counts_every_relation() {
    let world = World::new();
    let owner = world.user("owner").await;
    let viewer = world.user("viewer").await;
    let topic = world.topic("General").await;
    let thread = world.thread(&owner, &topic, "Counted").await;

    let services = &world.services;
    services.threads.like(viewer.id, thread.id).await.unwrap();
    services.follows.create(viewer.id, thread.id).await.unwrap();
    services.bookmarks.create(viewer.id, thread.id).await.unwrap();
    services.reports.create(viewer.id, thread.id).await.unwrap();
    world.comment(&thread, &viewer, "first").await;
    world.comment(&thread, &owner, "second").await;

    let stored = services.threads.get(thread.id).await.unwrap();
    let view = services.composer.thread_response(&stored, Some(viewer.id)).await.unwrap();
    assert_eq!(view.total_like, 1);
    assert_eq!(view.total_comment, 2);
    assert_eq!(view.total_follow, 1);
    assert_eq!(view.total_bookmark, 1);
    assert_eq!(view.total_report, 1);
    assert_eq!(view.topic.id, topic.id);
    assert_eq!(view.likes[0].user.id, viewer.id);
    let flags = view.viewer.unwrap();
    assert!(flags.is_liked && flags.is_followed && flags.is_bookmarked);

    let owner_view = services.composer.thread_response(&stored, Some(owner.id)).await.unwrap();
    let flags = owner_view.viewer.unwrap();
    assert!(!flags.is_liked && !flags.is_followed && !flags.is_bookmarked);
}
