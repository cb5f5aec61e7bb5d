//! Content browser
//!
//! Read access to the taxonomy and research notes, append-only publishing,
//! and the random-rule lookup behind the learn page.

use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::info;

use crate::store::{KnowledgeArea, Store};
use crate::types::{LyceumError, Result};

/// Branches and rules shown for a chosen topic
#[derive(Debug, Clone)]
pub struct TopicView {
    pub topic: String,
    pub branches: Vec<String>,
    pub rules: Vec<String>,
}

pub struct ContentBrowser {
    store: Arc<Store>,
}

impl ContentBrowser {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Top-level topics
    pub fn functions(&self) -> Vec<String> {
        self.store
            .taxonomy
            .functions()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Topics with their branches, for the explore page
    pub fn areas(&self) -> &[KnowledgeArea] {
        self.store.taxonomy.areas()
    }

    /// Branches plus rules for a topic; both empty when unknown
    pub fn topic(&self, topic: &str) -> TopicView {
        TopicView {
            topic: topic.to_string(),
            branches: self.store.taxonomy.branches_for(topic).to_vec(),
            rules: self.rules_for(topic),
        }
    }

    pub fn rules_for(&self, topic: &str) -> Vec<String> {
        self.store.taxonomy.rules_for(topic).to_vec()
    }

    /// Append a research note. Always succeeds, whatever the topic.
    pub fn publish(&self, topic: &str, text: &str) -> usize {
        let count = self.store.research.append(topic, text.to_string());
        info!(topic = %topic, chars = text.len(), count, "Research published");
        count
    }

    /// Notes published under `topic`, oldest first
    pub fn notes_for(&self, topic: &str) -> Vec<String> {
        self.store.research.entries(topic)
    }

    /// One rule of `topic` picked at random
    pub fn random_rule(&self, topic: &str) -> Result<String> {
        self.store
            .taxonomy
            .rules_for(topic)
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| LyceumError::UnknownTopic(topic.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn browser() -> ContentBrowser {
        ContentBrowser::new(Arc::new(Store::default()))
    }

    #[test]
    fn test_publish_then_browse() {
        let content = browser();
        content.publish("algebra", "first");
        content.publish("algebra", "note");

        let notes = content.notes_for("algebra");
        assert_eq!(notes.last().map(String::as_str), Some("note"));
        assert!(content.notes_for("geometry").is_empty());
    }

    #[test]
    fn test_publish_accepts_unknown_topic_and_empty_text() {
        let content = browser();
        assert_eq!(content.publish("not-a-topic", ""), 1);
        assert_eq!(content.notes_for("not-a-topic"), vec![String::new()]);
    }

    #[test]
    fn test_topic_view() {
        let content = browser();
        let view = content.topic("mathematics");
        assert_eq!(view.branches.len(), 3);
        assert!(!view.rules.is_empty());

        let ghost = content.topic("ghost");
        assert!(ghost.branches.is_empty());
        assert!(ghost.rules.is_empty());
    }

    #[test]
    fn test_random_rule() {
        let content = browser();
        let rule = content.random_rule("geometry").unwrap();
        assert!(content.rules_for("geometry").contains(&rule));

        assert!(matches!(
            content.random_rule("ghost"),
            Err(LyceumError::UnknownTopic(_))
        ));
    }
}
