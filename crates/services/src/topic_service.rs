use std::sync::Arc;

use domains::{AppError, Result, Topic, TopicRepository};
use tracing::info;
use uuid::Uuid;

use crate::require_text;

pub struct TopicService {
    topics: Arc<dyn TopicRepository>,
}

impl TopicService {
    pub fn new(topics: Arc<dyn TopicRepository>) -> Self {
        Self { topics }
    }

    /// Names are unique; a collision is a conflict rather than an overwrite.
    pub async fn create(&self, name: &str, description: Option<String>) -> Result<Topic> {
        let name = require_text("name", name)?;
        let description = description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
        let topic = Topic::new(name, description);

        if !self.topics.insert_unique(&topic).await? {
            return Err(AppError::TopicNameTaken(topic.name));
        }
        info!(topic_id = %topic.id, name = %topic.name, "topic created");
        Ok(topic)
    }

    pub async fn get(&self, topic_id: Uuid) -> Result<Topic> {
        self.topics
            .find_by_id(topic_id)
            .await?
            .ok_or(AppError::TopicNotFound(topic_id))
    }

    pub async fn list(&self) -> Result<Vec<Topic>> {
        self.topics.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockTopicRepository;

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let mut topics = MockTopicRepository::new();
        topics.expect_insert_unique().returning(|_| Ok(false));

        let err = TopicService::new(Arc::new(topics)).create("rust", None).await.unwrap_err();
        assert!(matches!(err, AppError::TopicNameTaken(name) if name == "rust"));
    }
}
