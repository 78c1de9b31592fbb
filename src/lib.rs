//! # Arbor
//!
//! A static site generator for nested article archives. Your filesystem is
//! the data source: directories become articles (down to three levels of
//! nesting), the files inside them become the article's content, and small
//! `.yml` files supply titles, dates, and topic tags.
//!
//! # Architecture: Scan, Freeze, Render
//!
//! A build is two phases around one frozen data structure:
//!
//! ```text
//! 1. Scan     content/  →  ContentTree + TopicIndex   (filesystem → tree)
//! 2. Render   tree      →  dist/                      (tree → HTML pages)
//! ```
//!
//! The scan walks the content directory once, accumulating entities
//! bottom-up. Freezing the tree sorts every sibling list, fixes parent
//! links, and assigns every entity and topic its unique slug. From then on
//! the tree is immutable: rendering is a pure read — which is also why
//! entity pages can render in parallel without coordination.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the content directory and drives tree construction |
//! | [`tree`] | The entity arena: articles at three nesting levels, leaf content, aggregation |
//! | [`document`] | Formatted text model: paragraphs, fragments, HTML, previews, titles |
//! | [`topics`] | Topic tags and the entity → topics index with subtree aggregation |
//! | [`slug`] | Unique URL-safe identifiers derived from titles |
//! | [`paths`] | Canonical page paths, breadcrumbs, relative prefixes, pagination |
//! | [`metadata`] | Metadata maps, front matter, date parsing |
//! | [`render`] | Page assembly and HTML generation with Maud |
//! | [`config`] | `site.toml` loading and validation |
//! | [`output`] | CLI listing output (pure `format_*` + `print_*`) |
//!
//! # Design Decisions
//!
//! ## One Entity Type, Not Three
//!
//! Articles, sub-articles, and sub-sub-articles share every behavior —
//! title resolution, timestamps, topics, slugs — and differ only in their
//! place in the tree. They are one generic [`tree::Entity`] with a
//! [`tree::Level`] tag, stored in an arena indexed by [`tree::EntityId`].
//! Parent links are plain arena indices, so child ownership stays strictly
//! top-down and back-references cannot create cycles. The three-level
//! limit is enforced at construction: a fourth level is reported and
//! skipped, never silently flattened.
//!
//! ## Slugs Are Run-Scoped
//!
//! Page identifiers must be unique across the whole site (duplicate titles
//! are normal). One [`slug::SlugGenerator`] is created inside the freeze
//! pass, names every entity and then every topic, and is dropped. There is
//! no global counter and nothing persists between runs.
//!
//! ## Maud Over Template Engines
//!
//! Page chrome is generated with [Maud](https://maud.lambda.xyz/):
//! compile-time checked templates, auto-escaped interpolation, no template
//! directory to ship. Document bodies are rendered by the document model
//! itself (escaping at the text leaves) and embedded pre-escaped.
//!
//! ## Full Rebuilds Only
//!
//! Every run scans everything and writes everything. There is no cache,
//! no diffing, and no state carried between runs; the output directory is
//! reproducible from the content directory alone.

pub mod config;
pub mod document;
pub mod metadata;
pub mod output;
pub mod paths;
pub mod render;
pub mod scan;
pub mod slug;
pub mod topics;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;
