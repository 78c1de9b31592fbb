//! The content tree: articles, sub-articles, and sub-sub-articles.
//!
//! A content directory maps onto a strictly three-level tree. Each directory
//! becomes an *entity*; files inside it become the entity's leaf content;
//! subdirectories become child entities one level down. Rather than three
//! near-identical structs, the tree stores one generic [`Entity`] per node
//! in an arena ([`ContentTree`]), with the nesting [`Level`] carried as
//! data and parent links stored as non-owning arena indices.
//!
//! ## Lifecycle
//!
//! Construction is append-only and driven by [`TreeBuilder`], whose API
//! mirrors the order the scanner discovers things: open a directory, report
//! its files, close it. [`TreeBuilder::finish`] freezes the tree — children
//! are sorted into their listing order, parent links are fixed, and every
//! entity and topic receives its slug from one [`SlugGenerator`]. After
//! that the tree is immutable and safe to read from any number of threads.
//!
//! ## Resolved attributes
//!
//! Several entity attributes aggregate over the subtree and live on
//! [`ContentTree`] rather than [`Entity`]:
//!
//! - `last_update` is the maximum of the entity's own directory timestamp
//!   and every descendant's.
//! - `created` aggregates the same way — also taking the maximum. That
//!   mirrors "most recently touched" semantics rather than true earliest
//!   creation, and listing pages depend on it, so it stays.
//! - `published` prefers the `date` metadata key; an unparseable date is
//!   logged and falls back to `last_update`.
//! - `size` sums leaf content sizes over the subtree.

use crate::config::SortOrder;
use crate::document::Document;
use crate::metadata::{self, Metadata};
use crate::slug::SlugGenerator;
use crate::topics::{Topic, TopicIndex, topics_from};
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("directory {0:?} is nested deeper than {MAX_DEPTH} levels")]
    TooDeep(String),
}

/// Maximum directory nesting the tree supports.
pub const MAX_DEPTH: usize = 3;

/// Index of an entity in its [`ContentTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(usize);

/// Nesting level of an entity. Children of a node are always exactly one
/// level deeper; sub-sub-articles hold leaf content only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Article,
    SubArticle,
    SubSubArticle,
}

impl Level {
    /// Level for a zero-based directory depth, or `None` past the third.
    pub fn from_depth(depth: usize) -> Option<Level> {
        match depth {
            0 => Some(Level::Article),
            1 => Some(Level::SubArticle),
            2 => Some(Level::SubSubArticle),
            _ => None,
        }
    }
}

/// A media file referenced by an entity, kept as a path relative to the
/// content root plus the file's recorded attributes.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub source: PathBuf,
    pub size_bytes: u64,
    pub created: NaiveDateTime,
    pub updated: NaiveDateTime,
}

/// Leaf content attached to an entity.
///
/// Every consumption site matches exhaustively, so adding a variant here
/// surfaces every place that needs to handle it.
#[derive(Debug, Clone)]
pub enum Leaf {
    Document(Document),
    Image(MediaFile),
    Video(MediaFile),
    Youtube {
        id: String,
        size_bytes: u64,
        created: NaiveDateTime,
        updated: NaiveDateTime,
    },
}

impl Leaf {
    /// The leaf's own title, if it carries one. Only documents do.
    pub fn title(&self) -> Option<String> {
        match self {
            Leaf::Document(doc) => doc.title(),
            Leaf::Image(_) | Leaf::Video(_) | Leaf::Youtube { .. } => None,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        match self {
            Leaf::Document(doc) => doc.size_bytes(),
            Leaf::Image(media) | Leaf::Video(media) => media.size_bytes,
            Leaf::Youtube { size_bytes, .. } => *size_bytes,
        }
    }
}

/// One node of the content tree.
#[derive(Debug)]
pub struct Entity {
    level: Level,
    directory_name: String,
    metadata: Metadata,
    content: Vec<Leaf>,
    children: Vec<EntityId>,
    parent: Option<EntityId>,
    created: NaiveDateTime,
    updated: NaiveDateTime,
    slug: String,
}

impl Entity {
    fn new(level: Level, directory_name: &str, created: NaiveDateTime, updated: NaiveDateTime) -> Self {
        Self {
            level,
            directory_name: directory_name.to_string(),
            metadata: Metadata::new(),
            content: Vec::new(),
            children: Vec::new(),
            parent: None,
            created,
            updated,
            slug: String::new(),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn directory_name(&self) -> &str {
        &self.directory_name
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn content(&self) -> &[Leaf] {
        &self.content
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Own directory creation timestamp (not aggregated).
    pub fn own_created(&self) -> NaiveDateTime {
        self.created
    }

    /// Own directory update timestamp (not aggregated).
    pub fn own_updated(&self) -> NaiveDateTime {
        self.updated
    }

    /// Unique page slug, assigned when the tree is frozen.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Resolved title: metadata `title`, else the first titled leaf, else
    /// the directory name. Directory names are never empty, so neither is
    /// the result.
    pub fn title(&self) -> String {
        if let Some(title) = self.metadata.get("title") {
            return title.to_string();
        }
        for leaf in &self.content {
            if let Some(title) = leaf.title() {
                return title;
            }
        }
        self.directory_name.clone()
    }

    /// An entity is pinned when the `pinned` key is present with any value
    /// other than the literal `"false"`.
    pub fn pinned(&self) -> bool {
        match self.metadata.get("pinned") {
            Some(value) => value != "false",
            None => false,
        }
    }
}

/// The frozen, immutable tree of all entities.
#[derive(Debug)]
pub struct ContentTree {
    entities: Vec<Entity>,
    roots: Vec<EntityId>,
}

impl ContentTree {
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    /// Top-level articles in title order.
    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Every entity in tree order: each article, then its sub-articles,
    /// then their sub-sub-articles.
    pub fn all_entities(&self) -> Vec<EntityId> {
        let mut out = Vec::with_capacity(self.entities.len());
        for &root in &self.roots {
            self.collect_subtree(root, &mut out);
        }
        out
    }

    fn collect_subtree(&self, id: EntityId, out: &mut Vec<EntityId>) {
        out.push(id);
        for &child in self.entity(id).children() {
            self.collect_subtree(child, out);
        }
    }

    /// Ancestor chain from the outermost article down to `id`, inclusive.
    pub fn path_ids(&self, id: EntityId) -> Vec<EntityId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.entity(current).parent() {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Most recent update of the entity's directory or any descendant's.
    pub fn last_update(&self, id: EntityId) -> NaiveDateTime {
        let entity = self.entity(id);
        let mut latest = entity.own_updated();
        for &child in entity.children() {
            latest = latest.max(self.last_update(child));
        }
        latest
    }

    /// Aggregated creation timestamp. Takes the maximum over the entity
    /// and its descendants, matching `last_update` rather than a true
    /// earliest-creation date.
    pub fn created(&self, id: EntityId) -> NaiveDateTime {
        let entity = self.entity(id);
        let mut latest = entity.own_created();
        for &child in entity.children() {
            latest = latest.max(self.created(child));
        }
        latest
    }

    /// Publish date: the parsed `date` metadata key when present and
    /// parseable; otherwise the aggregated last update. A bad date is
    /// logged and ignored.
    pub fn published(&self, id: EntityId) -> NaiveDateTime {
        if let Some(raw) = self.entity(id).metadata().get("date") {
            match metadata::parse_date(raw) {
                Ok(date) => return date,
                Err(e) => eprintln!("{}: {}", self.entity(id).title(), e),
            }
        }
        self.last_update(id)
    }

    /// Total size in bytes of all leaf content in the subtree.
    pub fn size(&self, id: EntityId) -> u64 {
        let entity = self.entity(id);
        let own: u64 = entity.content().iter().map(Leaf::size_bytes).sum();
        own + entity
            .children()
            .iter()
            .map(|&child| self.size(child))
            .sum::<u64>()
    }

    /// Top-level articles under the given listing order. Ties always fall
    /// back to the title order.
    pub fn sorted_roots(&self, sort: SortOrder) -> Vec<EntityId> {
        let mut roots = self.roots.clone();
        roots.sort_by(|&a, &b| self.compare(a, b, sort));
        roots
    }

    fn compare(&self, a: EntityId, b: EntityId, sort: SortOrder) -> Ordering {
        let by_title = || self.entity(a).title().cmp(&self.entity(b).title());
        match sort {
            SortOrder::Title => by_title(),
            SortOrder::Pinned => {
                let (pa, pb) = (self.entity(a).pinned(), self.entity(b).pinned());
                pb.cmp(&pa).then_with(by_title)
            }
            SortOrder::PublishedFirst => {
                self.published(b).cmp(&self.published(a)).then_with(by_title)
            }
            SortOrder::PublishedLast => {
                self.published(a).cmp(&self.published(b)).then_with(by_title)
            }
            SortOrder::Edited => {
                self.last_update(a).cmp(&self.last_update(b)).then_with(by_title)
            }
        }
    }
}

/// Accumulates entities during the scan, then freezes into a [`ContentTree`].
///
/// The builder's methods follow the scanner's discovery order: directories
/// open and close in strict nesting order, and files report into whichever
/// directory is currently open.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    entities: Vec<Entity>,
    stack: Vec<EntityId>,
    roots: Vec<EntityId>,
    topics: TopicIndex,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new entity for a discovered directory.
    pub fn open_directory(
        &mut self,
        name: &str,
        created: NaiveDateTime,
        updated: NaiveDateTime,
    ) -> Result<(), TreeError> {
        let level =
            Level::from_depth(self.stack.len()).ok_or_else(|| TreeError::TooDeep(name.to_string()))?;
        let id = EntityId(self.entities.len());
        self.entities.push(Entity::new(level, name, created, updated));
        self.stack.push(id);
        Ok(())
    }

    /// Attach leaf content to the currently open entity.
    pub fn found_content(&mut self, leaf: Leaf) {
        debug_assert!(!self.stack.is_empty(), "content outside any directory");
        if let Some(&current) = self.stack.last() {
            self.entities[current.0].content.push(leaf);
        }
    }

    /// Merge metadata into the currently open entity and record any topic
    /// tags it carries.
    pub fn found_metadata(&mut self, m: Metadata) {
        debug_assert!(!self.stack.is_empty(), "metadata outside any directory");
        if let Some(&current) = self.stack.last() {
            self.topics.add(current, topics_from(&m));
            self.entities[current.0].metadata.merge(m);
        }
    }

    /// Record topics assigned through a content file's own metadata
    /// (for example a youtube reference with topic tags).
    pub fn found_topics(&mut self, topics: impl IntoIterator<Item = Topic>) {
        if let Some(&current) = self.stack.last() {
            self.topics.add(current, topics);
        }
    }

    /// Close the innermost open directory, attaching it to its parent (or
    /// registering it as a top-level article).
    pub fn close_directory(&mut self) {
        let Some(id) = self.stack.pop() else { return };
        match self.stack.last() {
            Some(&parent) => {
                self.entities[id.0].parent = Some(parent);
                self.entities[parent.0].children.push(id);
            }
            None => self.roots.push(id),
        }
    }

    /// Freeze the tree: order children by title, assign entity slugs
    /// depth-first, then topic slugs in name order. The slug generator
    /// lives and dies inside this call — slugs are unique per run and
    /// never persist across runs.
    pub fn finish(mut self) -> (ContentTree, TopicIndex) {
        debug_assert!(self.stack.is_empty(), "unclosed directories at freeze");

        sort_by_title(&self.entities, &mut self.roots);
        for idx in 0..self.entities.len() {
            let mut children = std::mem::take(&mut self.entities[idx].children);
            sort_by_title(&self.entities, &mut children);
            self.entities[idx].children = children;
        }

        let mut generator = SlugGenerator::new();
        let roots = self.roots.clone();
        for root in roots {
            assign_slugs(&mut self.entities, &mut generator, root);
        }
        self.topics.assign_slugs(&mut generator);

        (
            ContentTree { entities: self.entities, roots: self.roots },
            self.topics,
        )
    }
}

fn sort_by_title(entities: &[Entity], ids: &mut [EntityId]) {
    ids.sort_by(|a, b| entities[a.0].title().cmp(&entities[b.0].title()));
}

fn assign_slugs(entities: &mut [Entity], generator: &mut SlugGenerator, id: EntityId) {
    let title = entities[id.0].title();
    entities[id.0].slug = generator.generate(&title);
    for child in entities[id.0].children.clone() {
        assign_slugs(entities, generator, child);
    }
}
