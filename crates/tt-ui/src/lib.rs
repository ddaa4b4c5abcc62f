//! # tt-ui
//!
//! Server-rendered public pages. Render nodes are flattened into plain view
//! structs so the templates only compare strings and walk vectors.

use askama::Template;
use chrono::{DateTime, Utc};
use tt_core::blocks::GalleryImage;
use tt_core::content::{ContentBody, HeroMedia};
use tt_core::models::ContentDocument;
use tt_core::render::{self, PageContext, RenderNode};

pub struct ImageView {
    pub url: String,
    pub caption: String,
    pub alt: String,
}

impl From<&GalleryImage> for ImageView {
    fn from(image: &GalleryImage) -> Self {
        Self {
            url: image.url.clone(),
            caption: image.caption.clone().unwrap_or_default(),
            alt: image.alt.clone().unwrap_or_default(),
        }
    }
}

/// One render node, with absent text fields as empty strings.
#[derive(Default)]
pub struct NodeView {
    pub kind: &'static str,
    pub text: String,
    pub url: String,
    /// Caption for media, attribution for quotes
    pub caption: String,
    pub alt: String,
    pub items: Vec<String>,
    pub images: Vec<ImageView>,
}

impl From<&RenderNode> for NodeView {
    fn from(node: &RenderNode) -> Self {
        let or_empty = |s: &Option<String>| s.clone().unwrap_or_default();
        match node {
            RenderNode::Paragraph { text } => Self { kind: "paragraph", text: text.clone(), ..Default::default() },
            RenderNode::Image { url, caption, alt } => Self {
                kind: "image",
                url: url.clone(),
                caption: or_empty(caption),
                alt: or_empty(alt),
                ..Default::default()
            },
            RenderNode::Video { url, caption } => {
                Self { kind: "video", url: url.clone(), caption: or_empty(caption), ..Default::default() }
            }
            RenderNode::Audio { url, caption } => {
                Self { kind: "audio", url: url.clone(), caption: or_empty(caption), ..Default::default() }
            }
            RenderNode::Quote { text, author } => Self {
                kind: "quote",
                text: text.clone(),
                caption: or_empty(author),
                ..Default::default()
            },
            RenderNode::List { items } => Self { kind: "list", items: items.clone(), ..Default::default() },
            RenderNode::Gallery { images } => Self {
                kind: "gallery",
                images: images.iter().map(ImageView::from).collect(),
                ..Default::default()
            },
        }
    }
}

#[derive(Template)]
#[template(path = "document.html")]
pub struct DocumentTemplate<'a> {
    pub title: &'a str,
    pub page: &'static str,
    pub published: String,
    pub reading_time: usize,
    /// Zero or one node
    pub hero: Vec<NodeView>,
    pub nodes: Vec<NodeView>,
}

pub struct IndexEntry {
    pub title: String,
    pub slug: String,
    pub kind: &'static str,
    pub published: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub heading: &'a str,
    pub entries: Vec<IndexEntry>,
}

fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%-d %B %Y").to_string()).unwrap_or_default()
}

/// Renders a document's public detail page. Unreadable stored content shows
/// as an empty body rather than failing the page.
pub fn render_document_page(doc: &ContentDocument) -> askama::Result<String> {
    let body = ContentBody::decode_or_empty(doc.kind, &doc.content);
    let hero = HeroMedia::decode_or_empty(doc.kind, doc.hero_image.as_deref());
    let ctx = PageContext::for_kind(doc.kind);

    DocumentTemplate {
        title: &doc.title,
        page: doc.kind.as_str(),
        published: format_date(doc.published_at),
        reading_time: render::reading_time_minutes(&body),
        hero: render::render_hero(doc.kind, &hero).iter().map(NodeView::from).collect(),
        nodes: render::render(&body, &ctx).iter().map(NodeView::from).collect(),
    }
    .render()
}

pub fn render_index_page(heading: &str, docs: &[ContentDocument]) -> askama::Result<String> {
    IndexTemplate {
        heading,
        entries: docs
            .iter()
            .map(|doc| IndexEntry {
                title: doc.title.clone(),
                slug: doc.slug.clone(),
                kind: doc.kind.as_str(),
                published: format_date(doc.published_at),
            })
            .collect(),
    }
    .render()
}
