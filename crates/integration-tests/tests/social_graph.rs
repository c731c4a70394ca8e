//! Comments, follows, bookmarks and reports against a live service graph.

use std::sync::Arc;

use domains::media::{filename_from_url, COMMENT_IMAGES};
use domains::{AppError, ErrorKind, MockFollowRepository, PageRequest, ReportedType};
use integration_tests::{png, World};
use services::{NewComment, NotificationPolicy, Repositories, Services};
use storage_adapters::MemoryStore;

#[tokio::test]
async fn commenter_is_skipped_under_the_default_policy() {
    let world = World::with_policy(NotificationPolicy::ExcludeCommenter);
    let u = world.user("u").await;
    let v = world.user("v").await;
    let w = world.user("w").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&u, &topic, "T").await;

    world.services.threads.like(v.id, thread.id).await.unwrap();
    assert_eq!(world.services.threads.get(thread.id).await.unwrap().likes.len(), 1);
    world.services.follows.create(v.id, thread.id).await.unwrap();
    world.services.follows.create(w.id, thread.id).await.unwrap();
    assert_eq!(world.services.follows.get(v.id, thread.id).await.unwrap().notification, 0);

    world.comment(&thread, &v, "hello").await;

    assert_eq!(world.services.follows.get(v.id, thread.id).await.unwrap().notification, 0);
    assert_eq!(world.services.follows.get(w.id, thread.id).await.unwrap().notification, 1);
}

#[tokio::test]
async fn commenter_is_counted_under_the_include_policy() {
    let world = World::with_policy(NotificationPolicy::IncludeCommenter);
    let u = world.user("u").await;
    let v = world.user("v").await;
    let w = world.user("w").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&u, &topic, "T").await;

    world.services.follows.create(v.id, thread.id).await.unwrap();
    world.services.follows.create(w.id, thread.id).await.unwrap();
    world.comment(&thread, &v, "hello").await;

    assert_eq!(world.services.follows.get(v.id, thread.id).await.unwrap().notification, 1);
    assert_eq!(world.services.follows.get(w.id, thread.id).await.unwrap().notification, 1);
}

#[tokio::test]
async fn reset_brings_the_counter_back_to_zero() {
    let world = World::new();
    let owner = world.user("owner").await;
    let follower = world.user("follower").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&owner, &topic, "T").await;

    world.services.follows.create(follower.id, thread.id).await.unwrap();
    for i in 0..3 {
        world.comment(&thread, &owner, &format!("update {i}")).await;
    }
    assert_eq!(world.services.follows.get(follower.id, thread.id).await.unwrap().notification, 3);

    world.services.follows.reset_notification(thread.id, follower.id).await.unwrap();
    assert_eq!(world.services.follows.get(follower.id, thread.id).await.unwrap().notification, 0);

    let err = world.services.follows.reset_notification(thread.id, owner.id).await.unwrap_err();
    assert!(matches!(err, AppError::FollowNotFound { .. }));
}

#[tokio::test]
async fn follow_and_bookmark_pairs_are_unique() {
    let world = World::new();
    let owner = world.user("owner").await;
    let fan = world.user("fan").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&owner, &topic, "T").await;

    world.services.follows.create(fan.id, thread.id).await.unwrap();
    let err = world.services.follows.create(fan.id, thread.id).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyFollowing { .. }));

    world.services.bookmarks.create(fan.id, thread.id).await.unwrap();
    let err = world.services.bookmarks.create(fan.id, thread.id).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyBookmarked { .. }));

    world.services.bookmarks.delete(fan.id, thread.id).await.unwrap();
    world.services.bookmarks.create(fan.id, thread.id).await.unwrap();

    let err = world.services.follows.create(fan.id, uuid::Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, AppError::ThreadNotFound(_)));
}

#[tokio::test]
async fn follow_listing_is_composed_with_the_thread() {
    let world = World::new();
    let owner = world.user("owner").await;
    let fan = world.user("fan").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&owner, &topic, "Followed").await;
    world.services.follows.create(fan.id, thread.id).await.unwrap();
    world.comment(&thread, &owner, "news").await;

    let follows = world.services.follows.list_by_user(fan.id).await.unwrap();
    let views = world.services.composer.follow_list(&follows).await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].thread.title, "Followed");
    assert_eq!(views[0].notification, 1);
    assert_eq!(views[0].total_comment, 1);
    assert_eq!(views[0].user.id, fan.id);
}

#[tokio::test]
async fn reports_resolve_their_target_and_reject_repeats() {
    let world = World::new();
    let reporter = world.user("reporter").await;
    let troll = world.user("troll").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&troll, &topic, "spam").await;
    let reports = &world.services.reports;

    assert_eq!(reports.create(reporter.id, troll.id).await.unwrap().reported_type, ReportedType::User);
    assert_eq!(reports.create(reporter.id, thread.id).await.unwrap().reported_type, ReportedType::Thread);

    let err = reports.create(reporter.id, troll.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = reports.create(reporter.id, uuid::Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, AppError::TargetNotFound(_)));

    let stats = reports.stats().await.unwrap();
    assert_eq!((stats.total, stats.users, stats.threads), (2, 1, 1));

    let page = reports.list(Some(ReportedType::Thread), PageRequest::default()).await.unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].reported_id, thread.id);
}

#[tokio::test]
async fn replies_stay_one_level_deep_within_their_thread() {
    let world = World::new();
    let owner = world.user("owner").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&owner, &topic, "T").await;
    let elsewhere = world.thread(&owner, &topic, "other").await;

    let top = world.comment(&thread, &owner, "top").await;
    let reply = world.reply(&top, &owner, "reply").await;
    assert_eq!(reply.parent_id, Some(top.id));

    let nested = NewComment { content: "deeper".into(), parent_id: Some(reply.id), image: None };
    let err = world.services.comments.create(thread.id, owner.id, nested).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let cross = NewComment { content: "wrong thread".into(), parent_id: Some(top.id), image: None };
    let err = world.services.comments.create(elsewhere.id, owner.id, cross).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let dangling = NewComment { content: "ghost".into(), parent_id: Some(uuid::Uuid::now_v7()), image: None };
    let err = world.services.comments.create(thread.id, owner.id, dangling).await.unwrap_err();
    assert!(matches!(err, AppError::CommentNotFound(_)));
}

#[tokio::test]
async fn comment_image_is_replaced_and_removed_with_the_comment() {
    let world = World::new();
    let owner = world.user("owner").await;
    let other = world.user("other").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&owner, &topic, "T").await;

    let comment = world.comment_with_image(&thread, &owner, "pic").await;
    let url = comment.image.clone().unwrap();
    let name = filename_from_url(&url).unwrap().to_string();
    assert!(world.media.contains(COMMENT_IMAGES, &name));

    let err = world.services.comments.update(comment.id, other.id, "hijack", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let updated = world.services.comments.update(comment.id, owner.id, "new pic", Some(png())).await.unwrap();
    assert_eq!(updated.content, "new pic");
    assert!(world.media.contains(COMMENT_IMAGES, &name));

    world.services.comments.delete(comment.id, owner.id).await.unwrap();
    assert!(!world.media.contains(COMMENT_IMAGES, &name));
    assert_eq!(world.services.comments.count_by_thread(thread.id).await.unwrap(), 0);
}

#[tokio::test]
async fn single_delete_keeps_the_comment_when_its_image_cannot_go() {
    let world = World::new();
    let owner = world.user("owner").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&owner, &topic, "T").await;
    let comment = world.comment_with_image(&thread, &owner, "pic").await;

    world.media.fail_deletes(true);
    let err = world.services.comments.delete(comment.id, owner.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalDependency);
    assert!(world.services.comments.get(comment.id).await.is_ok());

    world.media.fail_deletes(false);
    world.services.comments.delete(comment.id, owner.id).await.unwrap();
    assert!(world.media.is_empty());
}

#[tokio::test]
async fn failed_image_delete_keeps_the_replies_of_a_top_level_comment() {
    let world = World::new();
    let owner = world.user("owner").await;
    let fan = world.user("fan").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&owner, &topic, "T").await;
    let parent = world.comment_with_image(&thread, &owner, "pic").await;
    let reply = world.reply(&parent, &fan, "nice").await;

    world.media.fail_deletes(true);
    let err = world.services.comments.delete(parent.id, owner.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalDependency);
    assert!(world.services.comments.get(parent.id).await.is_ok());
    assert!(world.services.comments.get(reply.id).await.is_ok());

    world.media.fail_deletes(false);
    world.services.comments.delete(parent.id, owner.id).await.unwrap();
    assert!(world.services.comments.get(reply.id).await.is_err());
    assert_eq!(world.services.comments.count_by_thread(thread.id).await.unwrap(), 0);
}

#[tokio::test]
async fn comment_survives_a_failed_follower_fan_out() {
    let store = MemoryStore::new();
    let mut follows = MockFollowRepository::new();
    follows
        .expect_increment_notifications()
        .times(1)
        .returning(|_, _| Err(AppError::Timeout("follows.increment_notifications".into())));
    let repos = Repositories {
        users: store.users.clone(),
        topics: store.topics.clone(),
        threads: store.threads.clone(),
        comments: store.comments.clone(),
        follows: Arc::new(follows),
        bookmarks: store.bookmarks.clone(),
        reports: store.reports.clone(),
        media: Arc::new(storage_adapters::MemoryMediaStore::new()),
    };
    let services = Services::new(repos, NotificationPolicy::default());

    let author = services.users.create("author", "author@example.com", domains::Role::User).await.unwrap();
    let topic = services.topics.create("X", None).await.unwrap();
    let thread = services.threads.create(author.id, topic.id, "T", "d").await.unwrap();

    let input = NewComment { content: "still here".into(), parent_id: None, image: None };
    let comment = services.coordinator.post_comment(thread.id, author.id, input).await.unwrap();
    assert_eq!(services.comments.get(comment.id).await.unwrap().content, "still here");
}
