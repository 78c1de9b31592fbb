//! The formatted document model.
//!
//! Structured text (markdown and plain text files) is parsed once into an
//! immutable tree of [`Paragraph`]s and [`TextFragment`]s, and everything
//! downstream — page bodies, previews, title inference — works from that
//! tree. The model is deliberately small: it carries exactly the structure
//! the site renders, not the full markdown feature set.
//!
//! ## Rendering
//!
//! [`Document::to_html`] produces the page-body HTML. Plain text is escaped
//! exactly once, at the leaves; decorated fragments wrap their children in
//! fixed tag pairs and never re-escape. Heading levels shift down by one
//! (a level-1 heading renders as `<h2>`) so the page `<h1>` stays reserved
//! for the entity title, clamped at `<h6>`.
//!
//! ## Previews
//!
//! [`Document::preview`] writes a length-bounded summary for listing pages.
//! The character budget is shared across the whole document (and across
//! documents — the remaining budget is returned so callers can chain), and
//! shrinks as text is emitted. When a text fragment would overflow the
//! remaining budget it is truncated to exactly the budget, an ellipsis is
//! appended, and the budget drops to zero; nothing after that emits any
//! visible text. Images, code blocks, and horizontal rules contribute
//! nothing and pass the budget through.

use crate::metadata::Metadata;
use chrono::NaiveDateTime;
use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// Block-level content of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Paragraph {
    Heading { level: u8, text: TextFragment },
    Text(TextFragment),
    BulletList(Vec<Paragraph>),
    BlockQuote(Vec<Paragraph>),
    CodeBlock { source: String, language: Option<String> },
    HorizontalRow,
}

/// Inline content of a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub enum TextFragment {
    Plain(String),
    Emphasis(Box<TextFragment>),
    Strong(Box<TextFragment>),
    InlineImage { source: String, alt: Box<TextFragment> },
    Link { target: String, text: Box<TextFragment> },
    Sequence(Vec<TextFragment>),
}

impl TextFragment {
    /// Build a fragment from parts, collapsing a single-element sequence
    /// to the element itself.
    pub fn sequence(mut fragments: Vec<TextFragment>) -> TextFragment {
        if fragments.len() == 1 {
            fragments.remove(0)
        } else {
            TextFragment::Sequence(fragments)
        }
    }

    /// Concatenated unformatted text of this fragment. Inline images
    /// contribute nothing.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_plain_text(&mut out);
        out
    }

    fn collect_plain_text(&self, out: &mut String) {
        match self {
            TextFragment::Plain(text) => out.push_str(text),
            TextFragment::Emphasis(inner) | TextFragment::Strong(inner) => {
                inner.collect_plain_text(out)
            }
            TextFragment::Link { text, .. } => text.collect_plain_text(out),
            TextFragment::InlineImage { .. } => {}
            TextFragment::Sequence(fragments) => {
                for f in fragments {
                    f.collect_plain_text(out);
                }
            }
        }
    }

    fn to_html(&self, out: &mut String) {
        match self {
            TextFragment::Plain(text) => out.push_str(&encode_text(text)),
            TextFragment::Emphasis(inner) => {
                out.push_str("<em>");
                inner.to_html(out);
                out.push_str("</em>");
            }
            TextFragment::Strong(inner) => {
                out.push_str("<strong>");
                inner.to_html(out);
                out.push_str("</strong>");
            }
            TextFragment::InlineImage { source, alt } => {
                out.push_str("<img src=\"");
                out.push_str(&encode_double_quoted_attribute(source));
                out.push_str("\" alt=\"");
                out.push_str(&encode_double_quoted_attribute(&alt.plain_text()));
                out.push_str("\" />");
            }
            TextFragment::Link { target, text } => {
                out.push_str("<a href=\"");
                out.push_str(&encode_double_quoted_attribute(target));
                out.push_str("\">");
                text.to_html(out);
                out.push_str("</a>");
            }
            TextFragment::Sequence(fragments) => {
                for f in fragments {
                    f.to_html(out);
                }
            }
        }
    }

    fn preview(&self, out: &mut String, budget: usize) -> usize {
        match self {
            TextFragment::Plain(text) => {
                if budget == 0 {
                    return 0;
                }
                let chars = text.chars().count();
                if chars > budget {
                    let cut: String = text.chars().take(budget).collect();
                    out.push_str(&encode_text(&cut));
                    out.push_str("...");
                    0
                } else {
                    out.push_str(&encode_text(text));
                    budget - chars
                }
            }
            TextFragment::Emphasis(inner) => wrap_preview(out, "<em>", "</em>", inner, budget),
            TextFragment::Strong(inner) => {
                wrap_preview(out, "<strong>", "</strong>", inner, budget)
            }
            TextFragment::Link { target, text } => {
                out.push_str("<a href=\"");
                out.push_str(&encode_double_quoted_attribute(target));
                out.push_str("\">");
                let budget = text.preview(out, budget);
                out.push_str("</a>");
                budget
            }
            TextFragment::InlineImage { .. } => budget,
            TextFragment::Sequence(fragments) => {
                let mut budget = budget;
                for f in fragments {
                    if budget > 0 {
                        budget = f.preview(out, budget);
                    }
                }
                budget
            }
        }
    }
}

fn wrap_preview(
    out: &mut String,
    open: &str,
    close: &str,
    inner: &TextFragment,
    budget: usize,
) -> usize {
    out.push_str(open);
    let budget = inner.preview(out, budget);
    out.push_str(close);
    budget
}

impl Paragraph {
    pub fn to_html(&self, out: &mut String) {
        match self {
            Paragraph::Heading { level, text } => {
                let tag = (*level + 1).min(6);
                out.push_str(&format!("<h{tag}>"));
                text.to_html(out);
                out.push_str(&format!("</h{tag}>"));
            }
            Paragraph::Text(text) => {
                out.push_str("<p>");
                text.to_html(out);
                out.push_str("</p>");
            }
            Paragraph::BulletList(items) => {
                out.push_str("<ul>");
                for item in items {
                    out.push_str("<li>");
                    item.to_html(out);
                    out.push_str("</li>");
                }
                out.push_str("</ul>");
            }
            Paragraph::BlockQuote(paragraphs) => {
                out.push_str("<blockquote>");
                for p in paragraphs {
                    p.to_html(out);
                }
                out.push_str("</blockquote>");
            }
            Paragraph::CodeBlock { source, .. } => {
                out.push_str("<pre>");
                out.push_str(&encode_text(source));
                out.push_str("</pre>");
            }
            Paragraph::HorizontalRow => out.push_str("<hr />"),
        }
    }

    fn preview(&self, out: &mut String, budget: usize) -> usize {
        match self {
            Paragraph::Heading { level, text } => {
                out.push_str(&format!("<p><strong class=\"previewh{}\">", level + 1));
                let budget = text.preview(out, budget);
                out.push_str("</strong></p>");
                budget
            }
            Paragraph::Text(text) => {
                out.push_str("<p>");
                let budget = text.preview(out, budget);
                out.push_str("</p>");
                budget
            }
            Paragraph::BulletList(items) => {
                let mut budget = budget;
                out.push_str("<ul>");
                for item in items {
                    if budget > 0 {
                        out.push_str("<li>");
                        budget = item.preview(out, budget);
                        out.push_str("</li>");
                    }
                }
                out.push_str("</ul>");
                budget
            }
            Paragraph::BlockQuote(paragraphs) => {
                let mut budget = budget;
                out.push_str("<blockquote>");
                for p in paragraphs {
                    if budget > 0 {
                        budget = p.preview(out, budget);
                    }
                }
                out.push_str("</blockquote>");
                budget
            }
            Paragraph::CodeBlock { .. } | Paragraph::HorizontalRow => budget,
        }
    }
}

/// An immutable formatted text document plus its own metadata and the
/// source file's timestamps and size.
#[derive(Debug, Clone)]
pub struct Document {
    paragraphs: Vec<Paragraph>,
    metadata: Metadata,
    created: NaiveDateTime,
    updated: NaiveDateTime,
    size_bytes: u64,
}

impl Document {
    pub fn new(
        paragraphs: Vec<Paragraph>,
        metadata: Metadata,
        created: NaiveDateTime,
        updated: NaiveDateTime,
        size_bytes: u64,
    ) -> Self {
        Self { paragraphs, metadata, created, updated, size_bytes }
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn created(&self) -> NaiveDateTime {
        self.created
    }

    pub fn updated(&self) -> NaiveDateTime {
        self.updated
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Render the full document body as HTML.
    pub fn to_html(&self, out: &mut String) {
        for p in &self.paragraphs {
            p.to_html(out);
        }
    }

    /// Write a preview of at most `budget` text characters and return the
    /// remaining budget, so several documents can share one budget.
    pub fn preview(&self, out: &mut String, mut budget: usize) -> usize {
        for p in &self.paragraphs {
            if budget > 0 {
                budget = p.preview(out, budget);
            }
        }
        budget
    }

    /// The document's own title, if it has one.
    ///
    /// Resolution order: front-matter `title`, then the text of the first
    /// top-level heading, then the first line of a leading text paragraph
    /// if non-blank.
    pub fn title(&self) -> Option<String> {
        if let Some(title) = self.metadata.get("title") {
            return Some(title.to_string());
        }
        for p in &self.paragraphs {
            if let Paragraph::Heading { level, text } = p
                && *level <= 1
            {
                return Some(text.plain_text());
            }
        }
        if let Some(Paragraph::Text(text)) = self.paragraphs.first() {
            let full = text.plain_text();
            let first_line = full.lines().next().unwrap_or("");
            if !first_line.trim().is_empty() {
                return Some(first_line.to_string());
            }
        }
        None
    }
}

// ============================================================================
// Markdown conversion
// ============================================================================

/// Convert markdown source (front matter already stripped) into the
/// document paragraph model.
///
/// The pulldown-cmark event stream is folded with a builder stack: every
/// `Start` tag pushes a frame, every `End` tag pops it and attaches the
/// built node to its parent. Markdown features outside the model (tables,
/// raw HTML, footnotes) are dropped.
pub fn from_markdown(source: &str) -> Vec<Paragraph> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(source, options);

    let mut builder = MarkdownBuilder::default();
    for event in parser {
        builder.push_event(event);
    }
    builder.finish()
}

#[derive(Debug)]
enum Frame {
    Heading(u8),
    Paragraph,
    List,
    Item,
    BlockQuote,
    CodeBlock(Option<String>),
    Emphasis,
    Strong,
    Link(String),
    Image(String),
    // Tags the model does not represent; contents flow through.
    Transparent,
}

#[derive(Debug, Default)]
struct Builder {
    frame: Option<Frame>,
    fragments: Vec<TextFragment>,
    blocks: Vec<Paragraph>,
    code: String,
}

#[derive(Debug, Default)]
struct MarkdownBuilder {
    stack: Vec<Builder>,
    top_level: Vec<Paragraph>,
}

impl MarkdownBuilder {
    fn push_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(end) => self.close(end),
            Event::Text(text) => {
                if let Some(b) = self.stack.last_mut() {
                    if matches!(b.frame, Some(Frame::CodeBlock(_))) {
                        b.code.push_str(&text);
                    } else {
                        b.fragments.push(TextFragment::Plain(text.to_string()));
                    }
                }
            }
            Event::Code(code) => {
                if let Some(b) = self.stack.last_mut() {
                    b.fragments.push(TextFragment::Plain(code.to_string()));
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(b) = self.stack.last_mut() {
                    b.fragments.push(TextFragment::Plain("\n".to_string()));
                }
            }
            Event::Rule => self.attach_block(Paragraph::HorizontalRow),
            // Raw HTML, footnotes, and task markers are outside the model.
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Heading { level, .. } => Frame::Heading(level as u8),
            Tag::Paragraph => Frame::Paragraph,
            Tag::List(_) => Frame::List,
            Tag::Item => Frame::Item,
            Tag::BlockQuote(_) => Frame::BlockQuote,
            Tag::CodeBlock(CodeBlockKind::Fenced(lang)) => {
                Frame::CodeBlock((!lang.is_empty()).then(|| lang.to_string()))
            }
            Tag::CodeBlock(CodeBlockKind::Indented) => Frame::CodeBlock(None),
            Tag::Emphasis => Frame::Emphasis,
            Tag::Strong => Frame::Strong,
            Tag::Link { dest_url, .. } => Frame::Link(dest_url.to_string()),
            Tag::Image { dest_url, .. } => Frame::Image(dest_url.to_string()),
            _ => Frame::Transparent,
        };
        self.stack.push(Builder { frame: Some(frame), ..Builder::default() });
    }

    fn close(&mut self, _end: TagEnd) {
        let Some(builder) = self.stack.pop() else { return };
        let Some(frame) = builder.frame else { return };

        match frame {
            Frame::Heading(level) => {
                let text = TextFragment::sequence(builder.fragments);
                self.attach_block(Paragraph::Heading { level, text });
            }
            Frame::Paragraph => {
                if !builder.fragments.is_empty() {
                    let text = TextFragment::sequence(builder.fragments);
                    self.attach_block(Paragraph::Text(text));
                }
            }
            Frame::List => self.attach_block(Paragraph::BulletList(builder.blocks)),
            Frame::Item => {
                // A plain list item (no nested paragraph) carries fragments.
                let mut blocks = builder.blocks;
                if !builder.fragments.is_empty() {
                    blocks.insert(0, Paragraph::Text(TextFragment::sequence(builder.fragments)));
                }
                for block in blocks {
                    self.attach_block(block);
                }
            }
            Frame::BlockQuote => self.attach_block(Paragraph::BlockQuote(builder.blocks)),
            Frame::CodeBlock(language) => {
                self.attach_block(Paragraph::CodeBlock { source: builder.code, language });
            }
            Frame::Emphasis => {
                let inner = TextFragment::sequence(builder.fragments);
                self.attach_fragment(TextFragment::Emphasis(Box::new(inner)));
            }
            Frame::Strong => {
                let inner = TextFragment::sequence(builder.fragments);
                self.attach_fragment(TextFragment::Strong(Box::new(inner)));
            }
            Frame::Link(target) => {
                let text = TextFragment::sequence(builder.fragments);
                self.attach_fragment(TextFragment::Link { target, text: Box::new(text) });
            }
            Frame::Image(source) => {
                let alt = TextFragment::sequence(builder.fragments);
                self.attach_fragment(TextFragment::InlineImage { source, alt: Box::new(alt) });
            }
            Frame::Transparent => {
                for f in builder.fragments {
                    self.attach_fragment(f);
                }
                for b in builder.blocks {
                    self.attach_block(b);
                }
            }
        }
    }

    fn attach_block(&mut self, block: Paragraph) {
        match self.stack.last_mut() {
            Some(parent) => parent.blocks.push(block),
            None => self.top_level.push(block),
        }
    }

    fn attach_fragment(&mut self, fragment: TextFragment) {
        if let Some(parent) = self.stack.last_mut() {
            parent.fragments.push(fragment);
        }
    }

    fn finish(mut self) -> Vec<Paragraph> {
        while let Some(mut builder) = self.stack.pop() {
            self.top_level.append(&mut builder.blocks);
        }
        self.top_level
    }
}

/// Convert a plain text file into paragraphs, splitting at blank lines.
pub fn from_plain_text(source: &str) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    for line in source.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(Paragraph::Text(TextFragment::Plain(current.clone())));
                current.clear();
            }
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if !current.is_empty() {
        paragraphs.push(Paragraph::Text(TextFragment::Plain(current)));
    }
    paragraphs
}
