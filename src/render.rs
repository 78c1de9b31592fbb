//! HTML site generation.
//!
//! Walks the frozen [`Site`] read-only and decides what pages exist, what
//! is on them, and how they link to each other. Page chrome is built with
//! [maud](https://maud.lambda.xyz/) — templates are type-checked Rust with
//! automatic escaping — while document bodies arrive as pre-rendered HTML
//! from the document model and are embedded with `PreEscaped`.
//!
//! ## Generated pages
//!
//! - **Home** (`/index.html`): site title plus the top five articles under
//!   the configured sort order
//! - **Entity pages** (`/p/…/index.html`): one per article, sub-article,
//!   and sub-sub-article — content fragments, breadcrumbs, topics, and
//!   "Read on" previews of child entities
//! - **Article listing** (`/articles/…`): every entity, five per page
//! - **Topic listing** (`/topics/…`) and one listing per topic
//! - **Stylesheet** (`/css/main.css`): embedded at compile time
//!
//! Links are stored site-absolute and prefixed at render time with the
//! page's relative path back to the root, so the output works from any
//! directory or file server without a configured base URL.
//!
//! ## Parallelism
//!
//! The tree is immutable by the time rendering starts and every entity
//! page is independent, so entity pages render across the rayon pool.
//! List pages depend on shared pagination state and render sequentially —
//! they are few.

use crate::config::SortOrder;
use crate::metadata::readable_date;
use crate::paths::{
    self, ARTICLES_ADDRESS, HOME_ADDRESS, PAGE_SIZE, Pagination, TOPICS_ADDRESS,
};
use crate::scan::Site;
use crate::topics::Topic;
use crate::tree::{EntityId, Leaf};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const CSS: &str = include_str!("../static/style.css");

/// How many article previews the homepage shows.
const HOMEPAGE_PREVIEWS: usize = 5;

/// A named link, stored with a site-absolute URL.
#[derive(Debug, Clone)]
pub struct SiteLink {
    pub url: String,
    pub label: String,
}

/// Preview snippet of an entity for listing pages.
#[derive(Debug, Clone)]
pub struct ArticlePreview {
    pub prefix: &'static str,
    pub title: String,
    pub date: String,
    pub summary_html: String,
    pub url: String,
}

/// Counts reported after a render for the CLI summary.
#[derive(Debug, Default, PartialEq)]
pub struct RenderSummary {
    pub entity_pages: usize,
    pub article_list_pages: usize,
    pub topic_list_pages: usize,
    pub topic_pages: usize,
    pub topics: usize,
}

/// Remove previous build output. Only the target's own contents are
/// deleted; the directory itself stays.
pub fn clean_target(target: &Path) -> Result<(), RenderError> {
    if !target.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(target)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Render the whole site into `target`.
pub fn render_site(
    site: &Site,
    source_root: &Path,
    target: &Path,
    sort: SortOrder,
) -> Result<RenderSummary, RenderError> {
    Renderer::new(site, source_root, target, sort).render()
}

struct Renderer<'a> {
    site: &'a Site,
    source_root: &'a Path,
    target: &'a Path,
    sort: SortOrder,
    generated_at: String,
    // Navigation header, computed once and reused on every page.
    headers: Vec<SiteLink>,
}

impl<'a> Renderer<'a> {
    fn new(site: &'a Site, source_root: &'a Path, target: &'a Path, sort: SortOrder) -> Self {
        let mut headers = vec![
            SiteLink { url: paths::page_url(HOME_ADDRESS), label: "Home".to_string() },
            SiteLink { url: paths::page_url(ARTICLES_ADDRESS), label: "Articles".to_string() },
        ];
        if !site.topics.all_topics().is_empty() {
            headers.push(SiteLink {
                url: paths::page_url(TOPICS_ADDRESS),
                label: "Topics".to_string(),
            });
        }
        Self {
            site,
            source_root,
            target,
            sort,
            generated_at: readable_date(&chrono::Local::now().naive_local()),
            headers,
        }
    }

    fn render(&self) -> Result<RenderSummary, RenderError> {
        let mut summary = RenderSummary::default();

        fs::create_dir_all(self.target)?;
        fs::create_dir_all(self.target.join("css"))?;
        fs::write(self.target.join("css/main.css"), CSS)?;
        self.copy_assets()?;

        self.render_homepage()?;

        let all = self.site.tree.all_entities();
        all.par_iter()
            .try_for_each(|&id| self.render_entity_page(id))?;
        summary.entity_pages = all.len();

        summary.article_list_pages = self.render_listing(
            ARTICLES_ADDRESS,
            "Articles".to_string(),
            all.clone(),
        )?;

        let topics: Vec<Topic> = self.site.topics.all_topics().into_iter().collect();
        summary.topics = topics.len();
        summary.topic_list_pages = self.render_topic_list(&topics)?;
        for topic in &topics {
            let members: Vec<EntityId> = all
                .iter()
                .copied()
                .filter(|&id| self.site.topics.aggregated(&self.site.tree, id).contains(topic))
                .collect();
            let base = paths::topic_path(self.site.topics.slug(topic));
            summary.topic_pages += self.render_listing(
                &base,
                format!("Articles for: {}", topic.name()),
                members,
            )?;
        }

        Ok(summary)
    }

    // ------------------------------------------------------------------
    // Individual pages
    // ------------------------------------------------------------------

    fn render_homepage(&self) -> Result<(), RenderError> {
        let rel = paths::rel_to_root(HOME_ADDRESS);
        let previews: Vec<ArticlePreview> = self
            .site
            .tree
            .sorted_roots(self.sort)
            .into_iter()
            .take(HOMEPAGE_PREVIEWS)
            .map(|id| self.preview_for(id, ""))
            .collect();

        let content = html! {
            section.recent-articles {
                h2 { "Recent articles" }
                @for preview in &previews {
                    (self.article_preview(preview, &rel))
                }
                p.more {
                    a href={ (rel) (paths::page_url(ARTICLES_ADDRESS)) } { "All articles" }
                }
            }
        };
        let page = self.base_document(&self.site.title, &rel, None, content);
        self.write_page(HOME_ADDRESS, page)
    }

    fn render_entity_page(&self, id: EntityId) -> Result<(), RenderError> {
        let tree = &self.site.tree;
        let page_path = paths::entity_path(tree, id);
        let rel = paths::rel_to_root(&page_path);

        let breadcrumbs = paths::breadcrumbs(tree, id);
        let topics: Vec<SiteLink> = self
            .site
            .topics
            .aggregated(tree, id)
            .iter()
            .map(|t| self.topic_link(t))
            .collect();
        let published = readable_date(&tree.published(id));

        let breadcrumb_markup = html! {
            nav.breadcrumbs {
                @for (i, (path, title)) in breadcrumbs.iter().enumerate() {
                    @if i > 0 { " › " }
                    a href={ (rel) (paths::page_url(path)) } { (title) }
                }
            }
        };

        let content = html! {
            article {
                header.article-header {
                    h1 { (tree.entity(id).title()) }
                    p.meta {
                        "Published " (published)
                        @if !topics.is_empty() {
                            " · "
                            @for (i, topic) in topics.iter().enumerate() {
                                @if i > 0 { ", " }
                                a.topic href={ (rel) (topic.url) } { (topic.label) }
                            }
                        }
                    }
                }
                (self.entity_content(id, &rel))
            }
        };

        let page = self.base_document(
            &tree.entity(id).title(),
            &rel,
            Some(breadcrumb_markup),
            content,
        );
        self.write_page(&page_path, page)?;
        self.copy_media(id, &page_path)
    }

    /// Content fragments in order: leaf content first, then "Read on"
    /// previews for child entities.
    fn entity_content(&self, id: EntityId, rel: &str) -> Markup {
        let tree = &self.site.tree;
        let entity = tree.entity(id);
        html! {
            @for leaf in entity.content() {
                (self.leaf_fragment(leaf))
            }
            @for &child in entity.children() {
                @let preview = self.preview_for(child, "Read on: ");
                (self.article_preview(&preview, rel))
            }
        }
    }

    /// Render one leaf. The match is exhaustive on purpose: a new leaf
    /// kind must decide its page representation here.
    fn leaf_fragment(&self, leaf: &Leaf) -> Markup {
        match leaf {
            Leaf::Document(doc) => {
                let mut body = String::new();
                doc.to_html(&mut body);
                html! { section.document { (PreEscaped(body)) } }
            }
            Leaf::Image(media) => {
                let name = file_name(&media.source);
                html! {
                    figure.media {
                        img src=(name) alt=(name) loading="lazy";
                    }
                }
            }
            Leaf::Video(media) => {
                let name = file_name(&media.source);
                html! {
                    figure.media {
                        video controls {
                            source src=(name);
                        }
                    }
                }
            }
            Leaf::Youtube { id, .. } => html! {
                figure.media.youtube {
                    iframe
                        src={ "https://www.youtube.com/embed/" (id) }
                        title="Embedded video"
                        allowfullscreen {}
                }
            },
        }
    }

    /// Copy the content root's `assets/` directory (favicons, fonts) to
    /// the output root, preserving its internal structure.
    fn copy_assets(&self) -> Result<(), RenderError> {
        let assets = self.source_root.join(crate::scan::ASSETS_DIR);
        if !assets.is_dir() {
            return Ok(());
        }
        for entry in walkdir::WalkDir::new(&assets)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let rel = entry.path().strip_prefix(self.source_root).unwrap_or(entry.path());
            let dest = self.target.join(rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), dest)?;
        }
        Ok(())
    }

    /// Copy an entity's media files next to its page so relative `src`
    /// attributes resolve.
    fn copy_media(&self, id: EntityId, page_path: &str) -> Result<(), RenderError> {
        let page_dir = self.page_dir(page_path);
        for leaf in self.site.tree.entity(id).content() {
            match leaf {
                Leaf::Image(media) | Leaf::Video(media) => {
                    let dest = page_dir.join(file_name(&media.source));
                    fs::copy(self.source_root.join(&media.source), dest)?;
                }
                Leaf::Document(_) | Leaf::Youtube { .. } => {}
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Listing pages
    // ------------------------------------------------------------------

    /// Render a paginated listing of entity previews under `base`.
    /// Returns the number of pages written.
    fn render_listing(
        &self,
        base: &str,
        heading: String,
        members: Vec<EntityId>,
    ) -> Result<usize, RenderError> {
        let pages = paths::paginate(members, PAGE_SIZE);
        let page_count = pages.len();
        for (idx, members) in pages.into_iter().enumerate() {
            let page_path = paths::paginated_path(base, idx);
            let rel = paths::rel_to_root(&page_path);
            let pagination = Pagination::windowed(idx, page_count, |i| {
                paths::page_url(&paths::paginated_path(base, i))
            });
            let previews: Vec<ArticlePreview> = members
                .into_iter()
                .map(|id| self.preview_for(id, ""))
                .collect();

            let content = html! {
                h1 { (heading) }
                @for preview in &previews {
                    (self.article_preview(preview, &rel))
                }
                @if pagination.is_shown() {
                    (self.pagination_markup(&pagination, &rel))
                }
            };
            let page = self.base_document(&heading, &rel, None, content);
            self.write_page(&page_path, page)?;
        }
        Ok(page_count)
    }

    fn render_topic_list(&self, topics: &[Topic]) -> Result<usize, RenderError> {
        let pages = paths::paginate(topics.to_vec(), PAGE_SIZE);
        let page_count = pages.len();
        for (idx, topics) in pages.into_iter().enumerate() {
            let page_path = paths::paginated_path(TOPICS_ADDRESS, idx);
            let rel = paths::rel_to_root(&page_path);
            let pagination = Pagination::windowed(idx, page_count, |i| {
                paths::page_url(&paths::paginated_path(TOPICS_ADDRESS, i))
            });
            let links: Vec<SiteLink> = topics.iter().map(|t| self.topic_link(t)).collect();

            let content = html! {
                h1 { "Topics" }
                ul.topic-list {
                    @for link in &links {
                        li { a href={ (rel) (link.url) } { (link.label) } }
                    }
                }
                @if pagination.is_shown() {
                    (self.pagination_markup(&pagination, &rel))
                }
            };
            let page = self.base_document("Topics", &rel, None, content);
            self.write_page(&page_path, page)?;
        }
        Ok(page_count)
    }

    // ------------------------------------------------------------------
    // Shared pieces
    // ------------------------------------------------------------------

    /// Preview of an entity: title, date, and document text drawn from a
    /// shared character budget across all of the entity's documents.
    fn preview_for(&self, id: EntityId, prefix: &'static str) -> ArticlePreview {
        let tree = &self.site.tree;
        let mut summary = String::new();
        let mut budget = self.site.config.preview_length;
        for leaf in tree.entity(id).content() {
            match leaf {
                Leaf::Document(doc) => {
                    if budget > 0 {
                        budget = doc.preview(&mut summary, budget);
                    }
                }
                Leaf::Image(_) | Leaf::Video(_) | Leaf::Youtube { .. } => {}
            }
        }
        ArticlePreview {
            prefix,
            title: tree.entity(id).title(),
            date: readable_date(&tree.published(id)),
            summary_html: summary,
            url: paths::page_url(&paths::entity_path(tree, id)),
        }
    }

    fn article_preview(&self, preview: &ArticlePreview, rel: &str) -> Markup {
        html! {
            div.article-preview {
                h3 {
                    @if !preview.prefix.is_empty() { (preview.prefix) }
                    a href={ (rel) (preview.url) } { (preview.title) }
                }
                p.meta { (preview.date) }
                div.summary { (PreEscaped(preview.summary_html.clone())) }
            }
        }
    }

    fn pagination_markup(&self, pagination: &Pagination, rel: &str) -> Markup {
        html! {
            nav.pagination {
                @for group in pagination.groups() {
                    span.page-group {
                        @for link in group {
                            a.page-link.current[link.selected] href={ (rel) (link.url) } {
                                (link.label)
                            }
                        }
                    }
                }
            }
        }
    }

    fn topic_link(&self, topic: &Topic) -> SiteLink {
        SiteLink {
            url: paths::page_url(&paths::topic_path(self.site.topics.slug(topic))),
            label: topic.name().to_string(),
        }
    }

    fn base_document(
        &self,
        title: &str,
        rel: &str,
        breadcrumbs: Option<Markup>,
        content: Markup,
    ) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    title {
                        @if title == self.site.title { (title) }
                        @else { (title) " · " (self.site.title) }
                    }
                    link rel="stylesheet" href={ (rel) "/css/main.css" };
                }
                body {
                    header.site-header {
                        a.site-title href={ (rel) (paths::page_url(HOME_ADDRESS)) } {
                            (self.site.title)
                        }
                        nav.site-nav {
                            @for link in &self.headers {
                                a href={ (rel) (link.url) } { (link.label) }
                            }
                        }
                        @if let Some(crumbs) = breadcrumbs { (crumbs) }
                    }
                    main { (content) }
                    footer.site-footer {
                        @if !self.site.owner.is_empty() { span { (self.site.owner) } " · " }
                        span { "Generated " (self.generated_at) }
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    fn page_dir(&self, site_path: &str) -> std::path::PathBuf {
        self.target.join(site_path.trim_start_matches('/'))
    }

    fn write_page(&self, site_path: &str, markup: Markup) -> Result<(), RenderError> {
        let dir = self.page_dir(site_path);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("index.html"), markup.into_string())?;
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
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
        let root = tmp.path();
        write(root, "launch-week/article.yml", "title: Launch Week\ndate: 2024-05-01\ntopics: rockets\n");
        write(root, "launch-week/intro.md", "# Liftoff\n\nWe made it to orbit after years of work.\n");
        write(root, "launch-week/rocket.jpg", "jpegbytes");
        write(root, "launch-week/press/briefing.txt", "Briefing Notes\n\nTranscript.\n");
        scan::scan(root).unwrap()
    }

    fn render_sample(tmp: &TempDir) -> (Site, TempDir, RenderSummary) {
        let site = sample_site(tmp);
        let out = TempDir::new().unwrap();
        let summary =
            render_site(&site, tmp.path(), out.path(), SortOrder::Title).unwrap();
        (site, out, summary)
    }

    fn read(out: &TempDir, rel: &str) -> String {
        fs::read_to_string(out.path().join(rel)).unwrap()
    }

    #[test]
    fn writes_expected_page_set() {
        let tmp = TempDir::new().unwrap();
        let (_, out, summary) = render_sample(&tmp);

        assert!(out.path().join("index.html").exists());
        assert!(out.path().join("css/main.css").exists());
        assert!(out.path().join("articles/index.html").exists());
        assert!(out.path().join("topics/index.html").exists());
        assert!(out.path().join("topics/rockets/index.html").exists());
        assert!(out.path().join("p/launch_week/index.html").exists());
        assert!(out.path().join("p/launch_week/briefing_notes/index.html").exists());
        assert_eq!(summary.entity_pages, 2);
        assert_eq!(summary.topics, 1);
    }

    #[test]
    fn entity_page_has_breadcrumbs_and_relative_css() {
        let tmp = TempDir::new().unwrap();
        let (_, out, _) = render_sample(&tmp);
        let html = read(&out, "p/launch_week/briefing_notes/index.html");

        // three levels deep → three ups to the root
        assert!(html.contains("href=\"../../../css/main.css\""));
        assert!(html.contains("Launch Week"));
        assert!(html.contains("Briefing Notes"));
        assert!(html.contains("../../../p/launch_week/index.html"));
    }

    #[test]
    fn media_copied_next_to_page() {
        let tmp = TempDir::new().unwrap();
        let (_, out, _) = render_sample(&tmp);
        assert!(out.path().join("p/launch_week/rocket.jpg").exists());
        let html = read(&out, "p/launch_week/index.html");
        assert!(html.contains("src=\"rocket.jpg\""));
    }

    #[test]
    fn child_preview_links_from_parent_page() {
        let tmp = TempDir::new().unwrap();
        let (_, out, _) = render_sample(&tmp);
        let html = read(&out, "p/launch_week/index.html");
        assert!(html.contains("Read on: "));
        assert!(html.contains("../p/launch_week/briefing_notes/index.html"));
    }

    #[test]
    fn document_html_embedded_not_escaped() {
        let tmp = TempDir::new().unwrap();
        let (_, out, _) = render_sample(&tmp);
        let html = read(&out, "p/launch_week/index.html");
        assert!(html.contains("<h2>Liftoff</h2>"));
    }

    #[test]
    fn topic_page_lists_tagged_entities() {
        let tmp = TempDir::new().unwrap();
        let (_, out, _) = render_sample(&tmp);
        let html = read(&out, "topics/rockets/index.html");
        assert!(html.contains("Articles for: rockets"));
        assert!(html.contains("Launch Week"));
    }

    #[test]
    fn single_listing_page_shows_no_pagination() {
        let tmp = TempDir::new().unwrap();
        let (_, out, _) = render_sample(&tmp);
        let html = read(&out, "articles/index.html");
        assert!(!html.contains("class=\"pagination\""));
    }

    #[test]
    fn long_listing_paginates_at_five() {
        let tmp = TempDir::new().unwrap();
        for i in 0..12 {
            write(
                tmp.path(),
                &format!("story-{i:02}/note.txt", ),
                &format!("Story {i:02}\n\nBody text.\n"),
            );
        }
        let site = scan::scan(tmp.path()).unwrap();
        let out = TempDir::new().unwrap();
        let summary =
            render_site(&site, tmp.path(), out.path(), SortOrder::Title).unwrap();

        assert_eq!(summary.article_list_pages, 3);
        assert!(out.path().join("articles/index.html").exists());
        assert!(out.path().join("articles/2/index.html").exists());
        assert!(out.path().join("articles/3/index.html").exists());

        let page3 = read(&out, "articles/3/index.html");
        // remainder page: stories 10 and 11
        assert!(page3.contains("Story 10"));
        assert!(page3.contains("Story 11"));
        assert!(!page3.contains("Story 09"));
        assert!(page3.contains("class=\"pagination\""));
    }

    #[test]
    fn preview_respects_configured_budget() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "site.toml", "preview_length = 10\n");
        write(tmp.path(), "story/note.txt", "A Title\n\n0123456789ABCDEF\n");
        let site = scan::scan(tmp.path()).unwrap();
        let out = TempDir::new().unwrap();
        render_site(&site, tmp.path(), out.path(), SortOrder::Title).unwrap();

        let html = read(&out, "articles/index.html");
        assert!(html.contains("..."));
        assert!(!html.contains("ABCDEF"));
    }

    #[test]
    fn clean_target_empties_directory() {
        let out = TempDir::new().unwrap();
        fs::create_dir_all(out.path().join("old/deep")).unwrap();
        fs::write(out.path().join("old/deep/file.html"), "stale").unwrap();
        fs::write(out.path().join("stray.txt"), "stale").unwrap();

        clean_target(out.path()).unwrap();
        assert!(out.path().exists());
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn assets_copied_to_output_root() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "assets/fonts/serif.woff2", "font");
        write(tmp.path(), "assets/favicon.ico", "icon");
        write(tmp.path(), "story/note.txt", "A note\n");
        let site = scan::scan(tmp.path()).unwrap();
        let out = TempDir::new().unwrap();
        render_site(&site, tmp.path(), out.path(), SortOrder::Title).unwrap();

        assert!(out.path().join("assets/favicon.ico").exists());
        assert!(out.path().join("assets/fonts/serif.woff2").exists());
    }

    #[test]
    fn topics_header_only_when_topics_exist() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "story/note.txt", "A note\n");
        let site = scan::scan(tmp.path()).unwrap();
        let out = TempDir::new().unwrap();
        render_site(&site, tmp.path(), out.path(), SortOrder::Title).unwrap();
        let html = read(&out, "index.html");
        assert!(!html.contains(">Topics</a>"));
        assert!(html.contains(">Articles</a>"));
    }
}
