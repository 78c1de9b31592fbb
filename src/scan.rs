//! Filesystem scanning: content directory → frozen content tree.
//!
//! The scanner walks the content root and narrates what it finds to a
//! [`TreeBuilder`] in strict nesting order. The directory layout *is* the
//! article structure:
//!
//! ```text
//! content/
//! ├── site.toml                # Site configuration (optional)
//! ├── about.yml                # Site-level metadata (title, owner)
//! ├── assets/                  # Static assets, copied to the output root
//! ├── launch-week/             # Article
//! │   ├── article.yml          # Entity metadata (title, date, topics…)
//! │   ├── intro.md             # Document content (front matter supported)
//! │   ├── rocket.jpg           # Image content
//! │   └── press/               # Sub-article
//! │       ├── briefing.txt     # Plain-text document
//! │       ├── recap.youtube    # Embedded video reference
//! │       └── photos/          # Sub-sub-article
//! │           └── pad.png
//! └── _drafts/                 # Skip prefix: excluded entirely
//! ```
//!
//! ## File dispatch
//!
//! By extension, case-insensitively: `.md` and `.txt` become documents,
//! `.jpg`/`.png` images, `.mp4`/`.mpg` videos, `.youtube` embedded video
//! references, `.yml` metadata for the surrounding directory. Anything
//! else is ignored. Files at the top level contribute only site metadata —
//! articles start one directory down.
//!
//! ## Failure behavior
//!
//! Local problems degrade: a youtube reference without an `id` and a
//! directory nested past the third level are reported and skipped. I/O
//! errors abort the scan — there is no partial-success mode.

use crate::config::{self, ConfigError, SiteConfig};
use crate::document::{self, Document};
use crate::metadata::{self, Metadata};
use crate::topics::{TopicIndex, topics_from};
use crate::tree::{ContentTree, Leaf, MAX_DEPTH, MediaFile, TreeBuilder, TreeError};
use chrono::{DateTime, Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("content directory not found: {0:?}")]
    RootNotFound(PathBuf),
}

/// Directories starting with this prefix are excluded from the site.
pub const SKIP_PREFIX: char = '_';

/// Top-level directory of static assets, copied to the output root
/// instead of becoming an article.
pub const ASSETS_DIR: &str = "assets";

/// Everything a run needs: the frozen tree, the topic index, and resolved
/// site identity.
#[derive(Debug)]
pub struct Site {
    pub tree: ContentTree,
    pub topics: TopicIndex,
    pub config: SiteConfig,
    pub title: String,
    pub owner: String,
}

/// Scan a content root into a [`Site`].
pub fn scan(root: &Path) -> Result<Site, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    let config = config::load_config(root)?;

    let mut builder = TreeBuilder::new();
    let mut site_metadata = Metadata::new();
    for path in sorted_entries(root)? {
        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == ASSETS_DIR) {
                continue;
            }
            scan_directory(&mut builder, root, &path)?;
        } else if has_extension(&path, "yml") {
            site_metadata.merge(read_metadata_file(&path)?);
        }
    }
    let (tree, topics) = builder.finish();

    let directory_title = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "site".to_string());
    let title = config
        .title
        .clone()
        .or_else(|| site_metadata.get("title").map(String::from))
        .unwrap_or(directory_title);
    let owner = config
        .owner
        .clone()
        .or_else(|| site_metadata.get("owner").map(String::from))
        .unwrap_or_default();

    Ok(Site { tree, topics, config, title, owner })
}

fn scan_directory(builder: &mut TreeBuilder, root: &Path, dir: &Path) -> Result<(), ScanError> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if name.starts_with(SKIP_PREFIX) {
        return Ok(());
    }

    let attrs = fs::metadata(dir)?;
    let (created, updated) = file_times(&attrs);
    if let Err(TreeError::TooDeep(_)) = builder.open_directory(&name, created, updated) {
        eprintln!(
            "skipping {}: nested deeper than {} levels",
            dir.display(),
            MAX_DEPTH
        );
        return Ok(());
    }

    for path in sorted_entries(dir)? {
        if path.is_dir() {
            scan_directory(builder, root, &path)?;
        } else {
            scan_file(builder, root, &path)?;
        }
    }

    builder.close_directory();
    Ok(())
}

fn scan_file(builder: &mut TreeBuilder, root: &Path, file: &Path) -> Result<(), ScanError> {
    let Some(extension) = file.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
        return Ok(());
    };
    match extension.as_str() {
        "md" => {
            let source = fs::read_to_string(file)?;
            let (front_matter, body) = metadata::extract_front_matter(&source);
            let attrs = fs::metadata(file)?;
            let (created, updated) = file_times(&attrs);
            builder.found_content(Leaf::Document(Document::new(
                document::from_markdown(body),
                front_matter,
                created,
                updated,
                attrs.len(),
            )));
        }
        "txt" => {
            let source = fs::read_to_string(file)?;
            let attrs = fs::metadata(file)?;
            let (created, updated) = file_times(&attrs);
            builder.found_content(Leaf::Document(Document::new(
                document::from_plain_text(&source),
                Metadata::new(),
                created,
                updated,
                attrs.len(),
            )));
        }
        "jpg" | "png" => {
            builder.found_content(Leaf::Image(media_file(root, file)?));
        }
        "mp4" | "mpg" => {
            builder.found_content(Leaf::Video(media_file(root, file)?));
        }
        "youtube" => {
            let m = read_metadata_file(file)?;
            let Some(id) = m.get("id") else {
                eprintln!("youtube file has no id, skipping: {}", file.display());
                return Ok(());
            };
            let attrs = fs::metadata(file)?;
            let (created, updated) = file_times(&attrs);
            builder.found_topics(topics_from(&m));
            builder.found_content(Leaf::Youtube {
                id: id.to_string(),
                size_bytes: attrs.len(),
                created,
                updated,
            });
        }
        "yml" => {
            builder.found_metadata(read_metadata_file(file)?);
        }
        _ => {}
    }
    Ok(())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn read_metadata_file(file: &Path) -> Result<Metadata, ScanError> {
    let source = fs::read_to_string(file)?;
    Ok(metadata::parse_flat_yaml(&source))
}

fn media_file(root: &Path, file: &Path) -> Result<MediaFile, ScanError> {
    let attrs = fs::metadata(file)?;
    let (created, updated) = file_times(&attrs);
    let source = file.strip_prefix(root).unwrap_or(file).to_path_buf();
    Ok(MediaFile { source, size_bytes: attrs.len(), created, updated })
}

/// Directory entries in sorted name order, hidden files excluded. The
/// sort makes metadata merging and content order deterministic across
/// filesystems.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            let name = p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            !name.starts_with('.') && name != config::CONFIG_FILE
        })
        .collect();
    entries.sort();
    Ok(entries)
}

fn file_times(attrs: &fs::Metadata) -> (NaiveDateTime, NaiveDateTime) {
    let to_naive = |st: std::time::SystemTime| DateTime::<Local>::from(st).naive_local();
    let modified = attrs.modified().ok().map(to_naive);
    let created = attrs.created().ok().map(to_naive);
    // Filesystems without birth times fall back to the modification time.
    let updated = modified.or(created).unwrap_or_default();
    let created = created.or(modified).unwrap_or_default();
    (created, updated)
}
