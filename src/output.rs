//! CLI output formatting.
//!
//! Each piece of command output has a pure `format_*` function returning
//! lines, plus a `print_*` wrapper that writes them to stdout. Format
//! functions take the frozen [`Site`] and do no I/O, so tests assert on
//! exact lines without capturing stdout.
//!
//! ## Listing format
//!
//! ```text
//! Articles:
//!  - Launch Week (May 1, 2024) [press, rockets]
//!    - Briefing Notes (May 3, 2024)
//!      - photos (May 3, 2024)
//!  - Field Notes (Feb 12, 2024)
//! ```
//!
//! One indent step per nesting level; topics in brackets when requested.

use crate::config::SortOrder;
use crate::metadata::readable_date;
use crate::paths;
use crate::render::RenderSummary;
use crate::scan::Site;
use crate::topics::Topic;
use crate::tree::EntityId;
use serde_json::json;
use std::collections::BTreeSet;
use std::path::Path;

// ============================================================================
// Article listing
// ============================================================================

/// Format the article tree, one line per entity.
///
/// `all` includes sub- and sub-sub-articles; `with_topics` appends each
/// entity's aggregated topics in brackets.
pub fn format_article_list(
    site: &Site,
    all: bool,
    with_topics: bool,
    sort: SortOrder,
) -> Vec<String> {
    let mut lines = vec!["Articles:".to_string()];
    for root in site.tree.sorted_roots(sort) {
        push_entity_line(site, root, 0, with_topics, &mut lines);
        if all {
            for &sub in site.tree.entity(root).children() {
                push_entity_line(site, sub, 1, with_topics, &mut lines);
                for &subsub in site.tree.entity(sub).children() {
                    push_entity_line(site, subsub, 2, with_topics, &mut lines);
                }
            }
        }
    }
    lines
}

fn push_entity_line(
    site: &Site,
    id: EntityId,
    depth: usize,
    with_topics: bool,
    lines: &mut Vec<String>,
) {
    let indent = "  ".repeat(depth);
    let date = readable_date(&site.tree.published(id));
    let topics = if with_topics {
        topics_suffix(&site.topics.aggregated(&site.tree, id))
    } else {
        String::new()
    };
    lines.push(format!(
        "{} - {} ({}){}",
        indent,
        site.tree.entity(id).title(),
        date,
        topics
    ));
}

fn topics_suffix(topics: &BTreeSet<Topic>) -> String {
    if topics.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = topics.iter().map(Topic::name).collect();
    format!(" [{}]", names.join(", "))
}

pub fn print_article_list(site: &Site, all: bool, with_topics: bool, sort: SortOrder) {
    for line in format_article_list(site, all, with_topics, sort) {
        println!("{}", line);
    }
}

// ============================================================================
// Topic listing
// ============================================================================

/// Format all topics in name order.
pub fn format_topic_list(site: &Site) -> Vec<String> {
    let mut lines = vec!["Topics:".to_string()];
    for topic in site.topics.all_topics() {
        lines.push(format!(" - {}", topic.name()));
    }
    lines
}

pub fn print_topic_list(site: &Site) {
    for line in format_topic_list(site) {
        println!("{}", line);
    }
}

// ============================================================================
// Size
// ============================================================================

/// Format the total size of all leaf content.
pub fn format_size(site: &Site) -> Vec<String> {
    let total: u64 = site.tree.roots().iter().map(|&r| site.tree.size(r)).sum();
    vec![format!("Total content size: {} bytes", total)]
}

pub fn print_size(site: &Site) {
    for line in format_size(site) {
        println!("{}", line);
    }
}

// ============================================================================
// Build summary
// ============================================================================

/// Format the post-render summary.
pub fn format_build_summary(summary: &RenderSummary, target: &Path) -> Vec<String> {
    let list_pages = summary.article_list_pages + summary.topic_list_pages;
    vec![
        format!(
            "Generated {} entity pages, {} list pages, {} topic pages ({} topics)",
            summary.entity_pages, list_pages, summary.topic_pages, summary.topics
        ),
        format!("Site written to {}", target.display()),
    ]
}

pub fn print_build_summary(summary: &RenderSummary, target: &Path) {
    for line in format_build_summary(summary, target) {
        println!("{}", line);
    }
}

// ============================================================================
// JSON listing
// ============================================================================

/// The resolved article tree as JSON, for machine consumers of `list --json`.
pub fn article_tree_json(site: &Site) -> serde_json::Value {
    let articles: Vec<serde_json::Value> = site
        .tree
        .sorted_roots(site.config.sort)
        .into_iter()
        .map(|id| entity_json(site, id))
        .collect();
    json!({
        "title": site.title,
        "owner": site.owner,
        "articles": articles,
    })
}

fn entity_json(site: &Site, id: EntityId) -> serde_json::Value {
    let entity = site.tree.entity(id);
    let topics: Vec<String> = site
        .topics
        .aggregated(&site.tree, id)
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    let children: Vec<serde_json::Value> = entity
        .children()
        .iter()
        .map(|&child| entity_json(site, child))
        .collect();
    json!({
        "title": entity.title(),
        "slug": entity.slug(),
        "path": paths::entity_path(&site.tree, id),
        "published": site.tree.published(id).format("%Y-%m-%dT%H:%M:%S").to_string(),
        "pinned": entity.pinned(),
        "topics": topics,
        "children": children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sample_site(tmp: &TempDir) -> Site {
        write(tmp.path(), "beta/meta.yml", "title: Beta\ndate: 2024-03-01\n");
        write(
            tmp.path(),
            "alpha/meta.yml",
            "title: Alpha\ndate: 2024-05-01\ntopics: rockets\n",
        );
        write(tmp.path(), "alpha/inner/note.txt", "Inner Story\n\nBody.\n");
        scan::scan(tmp.path()).unwrap()
    }

    #[test]
    fn list_is_title_sorted_by_default() {
        let tmp = TempDir::new().unwrap();
        let site = sample_site(&tmp);
        let lines = format_article_list(&site, false, false, SortOrder::Title);
        assert_eq!(lines[0], "Articles:");
        assert!(lines[1].starts_with(" - Alpha (May 1, 2024)"));
        assert!(lines[2].starts_with(" - Beta (Mar 1, 2024)"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn list_all_indents_nested_levels() {
        let tmp = TempDir::new().unwrap();
        let site = sample_site(&tmp);
        let lines = format_article_list(&site, true, false, SortOrder::Title);
        assert!(lines.iter().any(|l| l.starts_with("   - Inner Story")));
    }

    #[test]
    fn list_with_topics_appends_brackets() {
        let tmp = TempDir::new().unwrap();
        let site = sample_site(&tmp);
        let lines = format_article_list(&site, false, true, SortOrder::Title);
        assert!(lines[1].ends_with("[rockets]"));
        assert!(!lines[2].contains('['));
    }

    #[test]
    fn published_first_reorders() {
        let tmp = TempDir::new().unwrap();
        let site = sample_site(&tmp);
        let lines = format_article_list(&site, false, false, SortOrder::PublishedFirst);
        assert!(lines[1].starts_with(" - Alpha"));
        let lines = format_article_list(&site, false, false, SortOrder::PublishedLast);
        assert!(lines[1].starts_with(" - Beta"));
    }

    #[test]
    fn topic_list_sorted() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "one/m.yml", "topics:\n  - zebra\n  - apple\n");
        let site = scan::scan(tmp.path()).unwrap();
        let lines = format_topic_list(&site);
        assert_eq!(lines, vec!["Topics:", " - apple", " - zebra"]);
    }

    #[test]
    fn size_sums_all_content() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/x.txt", "12345");
        write(tmp.path(), "b/y.txt", "1234567");
        let site = scan::scan(tmp.path()).unwrap();
        let lines = format_size(&site);
        assert_eq!(lines, vec!["Total content size: 12 bytes"]);
    }

    #[test]
    fn build_summary_counts() {
        let summary = RenderSummary {
            entity_pages: 7,
            article_list_pages: 2,
            topic_list_pages: 1,
            topic_pages: 3,
            topics: 3,
        };
        let lines = format_build_summary(&summary, Path::new("dist"));
        assert_eq!(
            lines[0],
            "Generated 7 entity pages, 3 list pages, 3 topic pages (3 topics)"
        );
        assert!(lines[1].contains("dist"));
    }

    #[test]
    fn json_tree_shape() {
        let tmp = TempDir::new().unwrap();
        let site = sample_site(&tmp);
        let value = article_tree_json(&site);
        let articles = value["articles"].as_array().unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0]["title"], "Alpha");
        assert_eq!(articles[0]["path"], "/p/alpha/");
        assert_eq!(articles[0]["children"][0]["title"], "Inner Story");
        assert_eq!(articles[0]["topics"][0], "rockets");
    }
}
