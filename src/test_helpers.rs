//! Shared test utilities for the arbor test suite.
//!
//! Timestamp shorthand, leaf-content builders for exercising the tree
//! without touching the filesystem, and lookup helpers that panic with a
//! useful message on a miss.

use chrono::{NaiveDate, NaiveDateTime};

use crate::document::Document;
use crate::metadata::Metadata;
use crate::tree::{ContentTree, EntityId, Leaf};

/// Midnight timestamp shorthand for fixtures.
pub(crate) fn ts(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid fixture date")
        .and_hms_opt(0, 0, 0)
        .expect("valid fixture time")
}

/// A document leaf whose front matter carries an explicit title.
pub(crate) fn titled_document_leaf(title: &str) -> Leaf {
    let mut metadata = Metadata::new();
    metadata.insert("title", title);
    Leaf::Document(Document::new(
        Vec::new(),
        metadata,
        ts(2024, 1, 1),
        ts(2024, 1, 2),
        0,
    ))
}

/// Find an entity by resolved title. Panics if not found.
pub(crate) fn find_entity(tree: &ContentTree, title: &str) -> EntityId {
    tree.all_entities()
        .into_iter()
        .find(|&id| tree.entity(id).title() == title)
        .unwrap_or_else(|| {
            let titles: Vec<String> = tree
                .all_entities()
                .into_iter()
                .map(|id| tree.entity(id).title())
                .collect();
            panic!("entity '{title}' not found. Available: {titles:?}")
        })
}
