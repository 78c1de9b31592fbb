//! Topics: cross-cutting tags and the index that aggregates them.
//!
//! A [`Topic`] is a value type identified by its trimmed name. Topics are
//! assigned to entities through metadata — a `topic`/`topics` key, its
//! indexed forms (`topics[0]`, `topics[1]`, …), or comma-separated values —
//! and aggregate upward: an entity's effective topic set is the union of
//! its own tags and every descendant's, so a topic page for "rockets"
//! lists the article even when only one sub-sub-article carries the tag.
//!
//! The [`TopicIndex`] is built alongside the tree and stores only *direct*
//! assignments; aggregation happens at query time with a single traversal
//! of the queried subtree.

use crate::metadata::Metadata;
use crate::slug::SlugGenerator;
use crate::tree::{ContentTree, EntityId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A normalized topic tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Topic {
    name: String,
}

impl Topic {
    pub fn new(name: &str) -> Self {
        Self { name: name.trim().to_string() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Extract topic tags from metadata.
///
/// Recognized keys are `topic` and `topics`, either plain or indexed
/// (`topics[0]`, …). Values may hold several comma-separated tags.
pub fn topics_from(metadata: &Metadata) -> BTreeSet<Topic> {
    let mut topics = BTreeSet::new();
    for (key, value) in metadata.iter() {
        let base = key.split('[').next().unwrap_or(key);
        if base == "topic" || base == "topics" {
            for part in value.split(',') {
                if !part.trim().is_empty() {
                    topics.insert(Topic::new(part));
                }
            }
        }
    }
    topics
}

/// Direct topic assignments per entity, plus the per-run topic slugs.
#[derive(Debug, Default)]
pub struct TopicIndex {
    direct: HashMap<EntityId, BTreeSet<Topic>>,
    slugs: BTreeMap<Topic, String>,
}

impl TopicIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record directly-assigned topics for an entity.
    pub fn add(&mut self, id: EntityId, topics: impl IntoIterator<Item = Topic>) {
        let set = self.direct.entry(id).or_default();
        set.extend(topics);
    }

    /// Topics assigned to the entity itself, without descendants.
    pub fn direct(&self, id: EntityId) -> BTreeSet<Topic> {
        self.direct.get(&id).cloned().unwrap_or_default()
    }

    /// Union of the entity's topics and every descendant's, in one
    /// traversal of the subtree.
    pub fn aggregated(&self, tree: &ContentTree, id: EntityId) -> BTreeSet<Topic> {
        let mut result = BTreeSet::new();
        self.collect(tree, id, &mut result);
        result
    }

    fn collect(&self, tree: &ContentTree, id: EntityId, out: &mut BTreeSet<Topic>) {
        if let Some(topics) = self.direct.get(&id) {
            out.extend(topics.iter().cloned());
        }
        for &child in tree.entity(id).children() {
            self.collect(tree, child, out);
        }
    }

    /// Every topic assigned anywhere in the run.
    pub fn all_topics(&self) -> BTreeSet<Topic> {
        self.direct.values().flatten().cloned().collect()
    }

    /// Page slug for a topic, assigned at freeze.
    pub fn slug(&self, topic: &Topic) -> &str {
        self.slugs.get(topic).map(String::as_str).unwrap_or_default()
    }

    /// Assign slugs to every known topic in name order, drawing from the
    /// same generator that named the entities.
    pub(crate) fn assign_slugs(&mut self, generator: &mut SlugGenerator) {
        for topic in self.all_topics() {
            let slug = generator.generate(topic.name());
            self.slugs.insert(topic, slug);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;
    use crate::test_helpers::ts;

    fn topic_metadata(pairs: &[(&str, &str)]) -> Metadata {
        let mut m = Metadata::new();
        for (k, v) in pairs {
            m.insert(*k, *v);
        }
        m
    }

    // =========================================================================
    // Extraction tests
    // =========================================================================

    #[test]
    fn extracts_plain_topic_key() {
        let topics = topics_from(&topic_metadata(&[("topics", "rockets")]));
        assert_eq!(topics, BTreeSet::from([Topic::new("rockets")]));
    }

    #[test]
    fn extracts_indexed_keys() {
        let topics = topics_from(&topic_metadata(&[
            ("topics[0]", "rockets"),
            ("topics[1]", "press"),
        ]));
        assert_eq!(topics.len(), 2);
        assert!(topics.contains(&Topic::new("press")));
    }

    #[test]
    fn splits_comma_separated_values() {
        let topics = topics_from(&topic_metadata(&[("topic", "a, b,c")]));
        assert_eq!(topics.len(), 3);
        assert!(topics.contains(&Topic::new("b")));
    }

    #[test]
    fn ignores_unrelated_keys() {
        let topics = topics_from(&topic_metadata(&[
            ("title", "Hello"),
            ("topical", "nope"),
        ]));
        assert!(topics.is_empty());
    }

    #[test]
    fn trims_and_dedups() {
        let topics = topics_from(&topic_metadata(&[("topics", " rockets , rockets")]));
        assert_eq!(topics.len(), 1);
    }

    // =========================================================================
    // Aggregation tests
    // =========================================================================

    /// Three-level tree: root tagged "top", child tagged "mid",
    /// grandchild tagged "deep".
    fn tagged_tree() -> (ContentTree, TopicIndex) {
        let mut b = TreeBuilder::new();
        b.open_directory("root", ts(2024, 1, 1), ts(2024, 1, 1)).unwrap();
        b.found_metadata(topic_metadata(&[("topics", "top")]));
        b.open_directory("child", ts(2024, 1, 1), ts(2024, 1, 1)).unwrap();
        b.found_metadata(topic_metadata(&[("topics", "mid")]));
        b.open_directory("grandchild", ts(2024, 1, 1), ts(2024, 1, 1)).unwrap();
        b.found_metadata(topic_metadata(&[("topics", "deep")]));
        b.close_directory();
        b.close_directory();
        b.close_directory();
        b.finish()
    }

    #[test]
    fn aggregated_is_superset_of_direct() {
        let (tree, index) = tagged_tree();
        let root = tree.roots()[0];
        let direct = index.direct(root);
        let aggregated = index.aggregated(&tree, root);
        assert!(aggregated.is_superset(&direct));
    }

    #[test]
    fn aggregated_includes_all_descendants() {
        let (tree, index) = tagged_tree();
        let root = tree.roots()[0];
        let names: Vec<String> = index
            .aggregated(&tree, root)
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["deep", "mid", "top"]);
    }

    #[test]
    fn aggregation_stops_at_the_queried_subtree() {
        let (tree, index) = tagged_tree();
        let root = tree.roots()[0];
        let child = tree.entity(root).children()[0];
        let aggregated = index.aggregated(&tree, child);
        assert!(aggregated.contains(&Topic::new("mid")));
        assert!(aggregated.contains(&Topic::new("deep")));
        assert!(!aggregated.contains(&Topic::new("top")));
    }

    #[test]
    fn entity_without_topics_aggregates_children_only() {
        let mut b = TreeBuilder::new();
        b.open_directory("plain", ts(2024, 1, 1), ts(2024, 1, 1)).unwrap();
        b.open_directory("tagged", ts(2024, 1, 1), ts(2024, 1, 1)).unwrap();
        b.found_metadata(topic_metadata(&[("topics", "only-here")]));
        b.close_directory();
        b.close_directory();
        let (tree, index) = b.finish();
        let root = tree.roots()[0];

        assert!(index.direct(root).is_empty());
        assert_eq!(index.aggregated(&tree, root).len(), 1);
    }

    #[test]
    fn all_topics_unions_everything() {
        let (_, index) = tagged_tree();
        assert_eq!(index.all_topics().len(), 3);
    }

    // =========================================================================
    // Slug tests
    // =========================================================================

    #[test]
    fn topic_slugs_assigned_at_freeze() {
        let (_, index) = tagged_tree();
        assert_eq!(index.slug(&Topic::new("deep")), "deep");
        assert_eq!(index.slug(&Topic::new("mid")), "mid");
    }

    #[test]
    fn topic_slug_collides_with_entity_slug() {
        let mut b = TreeBuilder::new();
        b.open_directory("rockets", ts(2024, 1, 1), ts(2024, 1, 1)).unwrap();
        b.found_metadata(topic_metadata(&[("topics", "rockets")]));
        b.close_directory();
        let (tree, index) = b.finish();

        // entity named first, topic gets the suffixed slug
        assert_eq!(tree.entity(tree.roots()[0]).slug(), "rockets");
        assert_eq!(index.slug(&Topic::new("rockets")), "rockets2");
    }
}
