//! Shared fixtures: the whole service graph over the in-memory store, plus a
//! media store that can be told to fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use domains::media::MediaUpload;
use domains::{AppError, Comment, MediaStore, Result, Role, Thread, Topic, User};
use services::{NewComment, NotificationPolicy, Repositories, Services};
use storage_adapters::{MemoryMediaStore, MemoryStore};
use uuid::Uuid;

/// Eight bytes of PNG signature; enough for every store that sniffs formats.
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub fn png() -> MediaUpload {
    MediaUpload::new(PNG.to_vec(), Some(mime::IMAGE_PNG))
}

/// `MemoryMediaStore` whose deletes can be switched off.
#[derive(Default)]
pub struct FlakyMediaStore {
    inner: MemoryMediaStore,
    fail_deletes: AtomicBool,
}

impl FlakyMediaStore {
    pub fn fail_deletes(&self, failing: bool) {
        self.fail_deletes.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.inner.contains(namespace, name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl MediaStore for FlakyMediaStore {
    async fn upload(&self, namespace: &str, file: MediaUpload, desired_name: &str) -> Result<String> {
        self.inner.upload(namespace, file, desired_name).await
    }

    async fn delete(&self, namespace: &str, filename: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::ExternalDependency("media store unavailable".into()));
        }
        self.inner.delete(namespace, filename).await
    }
}

pub struct World {
    pub store: MemoryStore,
    pub media: Arc<FlakyMediaStore>,
    pub services: Services,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self::with_policy(NotificationPolicy::default())
    }

    pub fn with_policy(policy: NotificationPolicy) -> Self {
        let store = MemoryStore::new();
        let media = Arc::new(FlakyMediaStore::default());
        let repos = Repositories {
            users: store.users.clone(),
            topics: store.topics.clone(),
            threads: store.threads.clone(),
            comments: store.comments.clone(),
            follows: store.follows.clone(),
            bookmarks: store.bookmarks.clone(),
            reports: store.reports.clone(),
            media: media.clone(),
        };
        Self { store, media, services: Services::new(repos, policy) }
    }

    pub async fn user(&self, name: &str) -> User {
        self.account(name, Role::User).await
    }

    pub async fn admin(&self, name: &str) -> User {
        self.account(name, Role::Admin).await
    }

    async fn account(&self, name: &str, role: Role) -> User {
        self.services
            .users
            .create(name, &format!("{name}@example.com"), role)
            .await
            .expect("create user")
    }

    pub async fn topic(&self, name: &str) -> Topic {
        self.services.topics.create(name, None).await.expect("create topic")
    }

    pub async fn thread(&self, creator: &User, topic: &Topic, title: &str) -> Thread {
        self.services
            .threads
            .create(creator.id, topic.id, title, "description")
            .await
            .expect("create thread")
    }

    /// Posts through the coordinator, so followers are notified.
    pub async fn comment(&self, thread: &Thread, author: &User, text: &str) -> Comment {
        self.post(thread.id, author, text, None, None).await
    }

    pub async fn comment_with_image(&self, thread: &Thread, author: &User, text: &str) -> Comment {
        self.post(thread.id, author, text, None, Some(png())).await
    }

    pub async fn reply(&self, parent: &Comment, author: &User, text: &str) -> Comment {
        self.post(parent.thread_id, author, text, Some(parent.id), None).await
    }

    async fn post(
        &self,
        thread_id: Uuid,
        author: &User,
        text: &str,
        parent_id: Option<Uuid>,
        image: Option<MediaUpload>,
    ) -> Comment {
        let input = NewComment { content: text.into(), parent_id, image };
        self.services
            .coordinator
            .post_comment(thread_id, author.id, input)
            .await
            .expect("post comment")
    }

    #[cfg(feature = "web-axum")]
    pub fn router(&self) -> axum::Router {
        api_adapters::router(api_adapters::AppState::new(self.services.clone()))
    }
}
