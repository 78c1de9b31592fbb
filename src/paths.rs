//! Site paths, breadcrumbs, and pagination.
//!
//! Everything here is a pure function of the frozen content tree. Paths are
//! site-absolute, start and end with `/`, and map one-to-one onto output
//! directories — a page for path `/p/launch/press/` is written to
//! `p/launch/press/index.html` under the output root.
//!
//! ## Address space
//!
//! ```text
//! /                         home page
//! /articles/                all-articles listing (paginated)
//! /topics/                  topic listing (paginated)
//! /topics/<topic>/          per-topic listing (paginated)
//! /p/<article>/             article page
//! /p/<article>/<sub>/       sub-article page
//! /p/<article>/<sub>/<subsub>/
//! ```
//!
//! Because generated pages sit at varying depths, every page records the
//! relative prefix back to the site root ([`rel_to_root`]) so stylesheet
//! and navigation links resolve without a configured base URL.
//!
//! ## Pagination
//!
//! Listings paginate in fixed groups of five. Page links show a contiguous
//! window around the selected page (all pages when there are ten or fewer),
//! with standalone first/last links when the window is clipped.

use crate::tree::{ContentTree, EntityId};

pub const HOME_ADDRESS: &str = "/";
pub const ARTICLES_ADDRESS: &str = "/articles/";
pub const TOPICS_ADDRESS: &str = "/topics/";
pub const ENTRY_ADDRESS: &str = "/p/";

/// Items per listing page.
pub const PAGE_SIZE: usize = 5;

/// Canonical path of an entity page: the entry prefix followed by the
/// slugs of its ancestors and itself, root to leaf.
pub fn entity_path(tree: &ContentTree, id: EntityId) -> String {
    let mut path = String::from(ENTRY_ADDRESS);
    for ancestor in tree.path_ids(id) {
        path.push_str(tree.entity(ancestor).slug());
        path.push('/');
    }
    path
}

/// Canonical path of a topic's listing page.
pub fn topic_path(topic_slug: &str) -> String {
    format!("{TOPICS_ADDRESS}{topic_slug}/")
}

/// Breadcrumb chain for an entity: `(path, title)` pairs from the
/// outermost ancestor down to the entity itself.
pub fn breadcrumbs(tree: &ContentTree, id: EntityId) -> Vec<(String, String)> {
    tree.path_ids(id)
        .into_iter()
        .map(|ancestor| (entity_path(tree, ancestor), tree.entity(ancestor).title()))
        .collect()
}

/// Relative prefix from a page's path back to the site root: `.` for a
/// page at the root level, else `..` repeated once per extra level.
pub fn rel_to_root(path: &str) -> String {
    debug_assert!(path.starts_with('/'), "site paths are absolute: {path}");
    let nesting = path.matches('/').count();
    debug_assert!(nesting > 0);
    if nesting == 1 {
        return ".".to_string();
    }
    let prefix = "../".repeat(nesting - 1);
    prefix.trim_end_matches('/').to_string()
}

/// The `index.html` URL for a directory-shaped path.
pub fn page_url(path: &str) -> String {
    debug_assert!(path.starts_with('/') && path.ends_with('/'));
    format!("{path}index.html")
}

/// Path of page `page` (zero-based) of a paginated listing. Page zero
/// reuses the base path; page `k` appends `k + 1`.
pub fn paginated_path(base: &str, page: usize) -> String {
    debug_assert!(base.starts_with('/'));
    if page == 0 {
        base.to_string()
    } else {
        format!("{}{}/", base, page + 1)
    }
}

/// Split items into pages of `page_size`, preserving order. The result
/// always holds at least one page, so empty listings still get a page.
pub fn paginate<T>(items: Vec<T>, page_size: usize) -> Vec<Vec<T>> {
    let mut pages = Vec::new();
    let mut current = Vec::with_capacity(page_size);
    for item in items {
        if current.len() >= page_size {
            pages.push(std::mem::replace(&mut current, Vec::with_capacity(page_size)));
        }
        current.push(item);
    }
    pages.push(current);
    pages
}

/// One link in a pagination control.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLink {
    pub url: String,
    pub label: String,
    pub selected: bool,
}

/// Pagination controls: groups of page links. Clipped windows produce a
/// standalone leading group (link to page 1) and/or trailing group (link
/// to the last page) around the main window.
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    groups: Vec<Vec<PageLink>>,
}

impl Pagination {
    /// Build the control for `page_count` pages with `selected` active.
    ///
    /// A single page yields no controls. With more than ten pages the
    /// window is clipped: near the start it covers pages 1–9, near the
    /// end the last nine, otherwise three pages to either side of the
    /// selection.
    ///
    /// `selected < page_count` and `page_count > 0` are the caller's
    /// responsibility — violations are defects, not runtime conditions.
    pub fn windowed(
        selected: usize,
        page_count: usize,
        mut link_url: impl FnMut(usize) -> String,
    ) -> Pagination {
        debug_assert!(page_count > 0);
        debug_assert!(selected < page_count);
        if page_count == 1 {
            return Pagination::default();
        }

        let mut start = 0;
        let mut end = page_count - 1;
        if page_count > 10 {
            if selected < 5 {
                end = 8;
            } else if selected > page_count - 6 {
                start = page_count - 9;
            } else {
                start = selected - 3;
                end = selected + 3;
            }
        }

        let mut groups = Vec::new();
        if start != 0 {
            groups.push(vec![PageLink {
                url: link_url(0),
                label: "1".to_string(),
                selected: false,
            }]);
        }
        let window = (start..=end)
            .map(|idx| PageLink {
                url: link_url(idx),
                label: (idx + 1).to_string(),
                selected: idx == selected,
            })
            .collect();
        groups.push(window);
        if end != page_count - 1 {
            groups.push(vec![PageLink {
                url: link_url(page_count - 1),
                label: page_count.to_string(),
                selected: selected == page_count - 1,
            }]);
        }

        Pagination { groups }
    }

    pub fn groups(&self) -> &[Vec<PageLink>] {
        &self.groups
    }

    /// Whether the control is worth rendering: more than one group, or a
    /// single group with more than one link.
    pub fn is_shown(&self) -> bool {
        match self.groups.as_slice() {
            [] => false,
            [only] => only.len() != 1,
            _ => true,
        }
    }
}
