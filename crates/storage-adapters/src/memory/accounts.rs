use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{Result, Topic, TopicRepository, User, UserRepository};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryUserRepository {
    users: DashMap<Uuid, User>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn set_active(&self, id: Uuid, is_active: bool, at: DateTime<Utc>) -> Result<bool> {
        Ok(match self.users.get_mut(&id) {
            Some(mut user) => {
                user.is_active = is_active;
                user.updated_at = at;
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.users.remove(&id).is_some())
    }
}

/// Topic names are unique case-insensitively; `names` is the index.
#[derive(Default)]
pub struct MemoryTopicRepository {
    topics: DashMap<Uuid, Topic>,
    names: DashMap<String, Uuid>,
}

#[async_trait]
impl TopicRepository for MemoryTopicRepository {
    async fn insert_unique(&self, topic: &Topic) -> Result<bool> {
        match self.names.entry(topic.name.to_lowercase()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(topic.id);
                self.topics.insert(topic.id, topic.clone());
                Ok(true)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Topic>> {
        Ok(self.topics.get(&id).map(|topic| topic.clone()))
    }

    async fn list(&self) -> Result<Vec<Topic>> {
        let mut topics: Vec<Topic> = self.topics.iter().map(|entry| entry.value().clone()).collect();
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(topics)
    }
}
