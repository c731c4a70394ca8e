//! Thread and user deletion: every dependent collection is cleaned, failures
//! are collected, and the parent row stays until a retry succeeds.

use domains::media::{filename_from_url, PROFILE_IMAGES};
use domains::{
    AppError, CascadeStep, CommentRepository, ErrorKind, MediaStore, PageRequest, ThreadFilter, ThreadSort, User,
    UserRepository,
};
use integration_tests::{png, World};

#[tokio::test]
async fn deleting_a_thread_clears_every_dependent_collection() {
    let world = World::new();
    let owner = world.user("owner").await;
    let fan = world.user("fan").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&owner, &topic, "doomed").await;
    let keeper = world.thread(&owner, &topic, "keeper").await;

    let services = &world.services;
    let top = world.comment_with_image(&thread, &fan, "pic").await;
    world.reply(&top, &owner, "reply").await;
    world.comment(&keeper, &fan, "elsewhere").await;
    services.follows.create(fan.id, thread.id).await.unwrap();
    services.follows.create(fan.id, keeper.id).await.unwrap();
    services.bookmarks.create(fan.id, thread.id).await.unwrap();
    services.reports.create(fan.id, thread.id).await.unwrap();

    let snapshot = services.coordinator.delete_thread(owner.id, thread.id, false).await.unwrap();
    assert_eq!(snapshot.id, thread.id);

    assert!(matches!(services.threads.get(thread.id).await, Err(AppError::ThreadNotFound(_))));
    assert_eq!(services.comments.count_by_thread(thread.id).await.unwrap(), 0);
    assert_eq!(services.follows.count_by_thread(thread.id).await.unwrap(), 0);
    assert_eq!(services.bookmarks.count_by_thread(thread.id).await.unwrap(), 0);
    assert_eq!(services.reports.count_by_target(thread.id).await.unwrap(), 0);
    assert!(world.media.is_empty());

    assert_eq!(services.comments.count_by_thread(keeper.id).await.unwrap(), 1);
    assert_eq!(services.follows.count_by_thread(keeper.id).await.unwrap(), 1);
}

#[tokio::test]
async fn strangers_cannot_delete_a_thread_but_admins_can() {
    let world = World::new();
    let owner = world.user("owner").await;
    let stranger = world.user("stranger").await;
    let admin = world.admin("root").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&owner, &topic, "T").await;
    world.comment(&thread, &owner, "mine").await;

    let err = world.services.coordinator.delete_thread(stranger.id, thread.id, false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(world.services.comments.count_by_thread(thread.id).await.unwrap(), 1);

    world.services.coordinator.delete_thread(admin.id, thread.id, true).await.unwrap();
    assert!(world.services.threads.get(thread.id).await.is_err());
}

#[tokio::test]
async fn image_failure_keeps_the_thread_and_the_affected_comment_for_retry() {
    let world = World::new();
    let owner = world.user("owner").await;
    let fan = world.user("fan").await;
    let topic = world.topic("X").await;
    let thread = world.thread(&owner, &topic, "T").await;

    let with_image = world.comment_with_image(&thread, &fan, "pic").await;
    let plain = world.comment(&thread, &fan, "text").await;
    world.services.follows.create(fan.id, thread.id).await.unwrap();

    world.media.fail_deletes(true);
    let err = world.services.coordinator.delete_thread(owner.id, thread.id, false).await.unwrap_err();
    let AppError::CascadeIncomplete(report) = &err else {
        panic!("expected an incomplete cascade, got {err:?}");
    };
    assert_eq!(err.kind(), ErrorKind::ExternalDependency);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].step, CascadeStep::CommentImage);
    assert_eq!(report.failures[0].target, Some(with_image.id));

    // Later steps still ran; only the parent row and the stuck comment remain.
    assert!(world.services.threads.get(thread.id).await.is_ok());
    assert!(world.services.comments.get(with_image.id).await.is_ok());
    assert!(world.services.comments.get(plain.id).await.is_err());
    assert_eq!(world.services.follows.count_by_thread(thread.id).await.unwrap(), 0);

    world.media.fail_deletes(false);
    world.services.coordinator.delete_thread(owner.id, thread.id, false).await.unwrap();
    assert_eq!(world.services.comments.count_by_thread(thread.id).await.unwrap(), 0);
    assert!(world.media.is_empty());
}

#[tokio::test]
async fn deleting_a_user_suspends_their_threads_and_removes_their_traces() {
    let world = World::new();
    let gone = world.user("gone").await;
    let stay = world.user("stay").await;
    let topic = world.topic("X").await;
    let own_thread = world.thread(&gone, &topic, "by gone").await;
    let other_thread = world.thread(&stay, &topic, "by stay").await;

    let services = &world.services;
    let own_comment = world.comment_with_image(&other_thread, &gone, "pic").await;
    world.reply(&own_comment, &stay, "reply to gone").await;
    let kept = world.comment(&own_thread, &stay, "on gone's thread").await;
    services.threads.like(gone.id, other_thread.id).await.unwrap();
    services.follows.create(gone.id, other_thread.id).await.unwrap();
    services.bookmarks.create(gone.id, other_thread.id).await.unwrap();
    services.reports.create(stay.id, gone.id).await.unwrap();

    let removed = services.coordinator.delete_user(gone.id).await.unwrap();
    assert_eq!(removed.id, gone.id);
    assert!(matches!(services.users.get(gone.id).await, Err(AppError::UserNotFound(_))));

    let own_thread = services.threads.get(own_thread.id).await.unwrap();
    assert!(own_thread.is_suspended());
    assert!(services.comments.get(kept.id).await.is_ok());

    assert!(world.store.comments.find_by_user(gone.id).await.unwrap().is_empty());
    assert_eq!(services.comments.count_by_thread(other_thread.id).await.unwrap(), 0);
    assert!(world.media.is_empty());
    assert!(services.follows.list_by_user(gone.id).await.unwrap().is_empty());
    assert!(services.bookmarks.list_by_user(gone.id).await.unwrap().is_empty());
    assert!(services.threads.get(other_thread.id).await.unwrap().likes.is_empty());
    assert_eq!(services.reports.count_by_target(gone.id).await.unwrap(), 0);

    let visible = services
        .threads
        .paginate(&ThreadFilter::default(), ThreadSort::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(visible.total_items, 1);

    let view = services.composer.thread_response(&own_thread, Some(stay.id)).await.unwrap();
    assert!(view.creator.is_none());
    assert_eq!(view.total_comment, 1);
}

#[tokio::test]
async fn admin_accounts_are_never_deleted() {
    let world = World::new();
    let admin = world.admin("root").await;
    let topic = world.topic("X").await;
    world.thread(&admin, &topic, "announcement").await;

    let err = world.services.coordinator.delete_user(admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::CannotDeleteAdmin));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(world.services.users.get(admin.id).await.is_ok());
}

#[tokio::test]
async fn profile_image_failure_keeps_the_account_until_retry() {
    let world = World::new();
    let mut user = User::new("pictured", "pictured@example.com", domains::Role::User);
    let url = world.media.upload(PROFILE_IMAGES, png(), &user.id.to_string()).await.unwrap();
    user.profile_image = Some(url.clone());
    world.store.users.insert(&user).await.unwrap();

    let topic = world.topic("X").await;
    let thread = world.thread(&user, &topic, "mine").await;
    world.services.follows.create(user.id, thread.id).await.unwrap();

    world.media.fail_deletes(true);
    let err = world.services.coordinator.delete_user(user.id).await.unwrap_err();
    let AppError::CascadeIncomplete(report) = &err else {
        panic!("expected an incomplete cascade, got {err:?}");
    };
    assert_eq!(report.failures[0].step, CascadeStep::ProfileImage);
    assert!(world.services.users.get(user.id).await.is_ok());
    // The independent steps committed anyway.
    assert!(world.services.follows.list_by_user(user.id).await.unwrap().is_empty());
    assert!(world.services.threads.get(thread.id).await.unwrap().is_suspended());

    world.media.fail_deletes(false);
    world.services.coordinator.delete_user(user.id).await.unwrap();
    let name = filename_from_url(&url).unwrap();
    assert!(!world.media.contains(PROFILE_IMAGES, name));
    assert!(world.services.users.get(user.id).await.is_err());
}
