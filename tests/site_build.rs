//! End-to-end build tests: content directory in, HTML site out.

use arbor::config::SortOrder;
use arbor::{render, scan};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn build(source: &TempDir) -> (TempDir, render::RenderSummary) {
    let site = scan::scan(source.path()).unwrap();
    let out = TempDir::new().unwrap();
    let summary =
        render::render_site(&site, source.path(), out.path(), SortOrder::Title).unwrap();
    (out, summary)
}

fn read(out: &TempDir, rel: &str) -> String {
    fs::read_to_string(out.path().join(rel)).unwrap()
}

#[test]
fn full_build_produces_linked_three_level_site() {
    let source = TempDir::new().unwrap();
    write(source.path(), "site.toml", "title = \"Mission Log\"\nowner = \"The Crew\"\n");
    write(
        source.path(),
        "launch/article.yml",
        "title: Launch\ndate: 2024-05-01\ntopics: rockets\n",
    );
    write(source.path(), "launch/intro.md", "# Liftoff\n\nOrbit achieved.\n");
    write(source.path(), "launch/photo.jpg", "jpeg");
    write(source.path(), "launch/press/briefing.txt", "Press\n\nBriefing text.\n");
    write(source.path(), "launch/press/photos/pad.png", "png");

    let (out, summary) = build(&source);

    // one page per entity, at its canonical path
    assert_eq!(summary.entity_pages, 3);
    assert!(out.path().join("p/launch/index.html").exists());
    assert!(out.path().join("p/launch/press/index.html").exists());
    assert!(out.path().join("p/launch/press/photos/index.html").exists());

    // home, listing, topics
    assert!(out.path().join("index.html").exists());
    assert!(out.path().join("articles/index.html").exists());
    assert!(out.path().join("topics/rockets/index.html").exists());

    // site identity flows into every page
    let home = read(&out, "index.html");
    assert!(home.contains("Mission Log"));
    assert!(home.contains("The Crew"));

    // deepest page: breadcrumbs to both ancestors, correct root prefix
    let deepest = read(&out, "p/launch/press/photos/index.html");
    assert!(deepest.contains("../../../../css/main.css"));
    assert!(deepest.contains("../../../../p/launch/index.html"));
    assert!(deepest.contains("../../../../p/launch/press/index.html"));

    // media copied next to its page
    assert!(out.path().join("p/launch/photo.jpg").exists());
}

#[test]
fn duplicate_titles_get_distinct_output_paths() {
    let source = TempDir::new().unwrap();
    write(source.path(), "a/m.yml", "title: Demo Day\n");
    write(source.path(), "b/m.yml", "title: Demo Day\n");

    let (out, summary) = build(&source);

    assert_eq!(summary.entity_pages, 2);
    assert!(out.path().join("p/demo_day/index.html").exists());
    assert!(out.path().join("p/demo_day2/index.html").exists());
}

#[test]
fn listing_pagination_windows_past_ten_pages() {
    let source = TempDir::new().unwrap();
    // 51 articles → 11 listing pages of five
    for i in 0..51 {
        write(
            source.path(),
            &format!("story-{i:02}/note.txt"),
            &format!("Story {i:02}\n\nBody.\n"),
        );
    }

    let (out, summary) = build(&source);
    assert_eq!(summary.article_list_pages, 11);
    assert!(out.path().join("articles/11/index.html").exists());

    // first page: window covers pages 1-9 plus a standalone link to 11
    let first = read(&out, "articles/index.html");
    assert!(first.contains(">9<"));
    assert!(!first.contains(">10<"));
    assert!(first.contains(">11<"));

    // last page: standalone link back to page 1, window ends at 11
    let last = read(&out, "articles/11/index.html");
    assert!(last.contains(">1<"));
    assert!(last.contains(">11<"));
    assert!(last.contains("articles/10/index.html"));
}

#[test]
fn topics_aggregate_to_topic_pages_from_any_depth() {
    let source = TempDir::new().unwrap();
    write(source.path(), "journey/m.yml", "title: Journey\n");
    write(source.path(), "journey/alps/m.yml", "title: Alps\ntopics: mountains\n");
    write(source.path(), "journey/alps/summit/m.yml", "title: Summit\n");

    let (out, _) = build(&source);

    let topic_page = read(&out, "topics/mountains/index.html");
    // the tagged sub-article and its ancestor both list under the topic
    assert!(topic_page.contains("Journey"));
    assert!(topic_page.contains("Alps"));
    // the untagged child below the tagged entity does not
    assert!(!topic_page.contains("Summit"));
}

#[test]
fn clean_build_removes_stale_output() {
    let source = TempDir::new().unwrap();
    write(source.path(), "story/note.txt", "Story\n\nBody.\n");

    let out = TempDir::new().unwrap();
    fs::create_dir_all(out.path().join("p/old_page")).unwrap();
    fs::write(out.path().join("p/old_page/index.html"), "stale").unwrap();

    render::clean_target(out.path()).unwrap();
    let site = scan::scan(source.path()).unwrap();
    render::render_site(&site, source.path(), out.path(), SortOrder::Title).unwrap();

    assert!(!out.path().join("p/old_page").exists());
    assert!(out.path().join("p/story/index.html").exists());
}
