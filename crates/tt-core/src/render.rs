//! # Renderer
//!
//! Maps decoded blocks to render nodes for a page context. Rendering is pure:
//! the same body and context always produce the same nodes.

use serde::Serialize;

use crate::blocks::{Block, BlockBody, BlockKind, GalleryImage};
use crate::content::{ContentBody, HeroMedia};
use crate::models::ContentKind;

const WORDS_PER_MINUTE: usize = 200;

/// The detail page a document is shown on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Article,
    Video,
    Audio,
    Gallery,
    Thread,
}

impl From<ContentKind> for PageKind {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Standard => Self::Article,
            ContentKind::Video => Self::Video,
            ContentKind::Audio => Self::Audio,
            ContentKind::Gallery => Self::Gallery,
            ContentKind::Thread => Self::Thread,
        }
    }
}

/// Per-page rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub page: PageKind,
    /// Label used in the thread prefix, `[Post N]`
    pub post_label: String,
    /// Block kinds this page does not show
    pub omitted: Vec<BlockKind>,
}

impl PageContext {
    pub fn new(page: PageKind) -> Self {
        let omitted = match page {
            PageKind::Audio => vec![BlockKind::List, BlockKind::Gallery],
            _ => Vec::new(),
        };
        Self { page, post_label: "Post".to_string(), omitted }
    }

    pub fn for_kind(kind: ContentKind) -> Self {
        Self::new(kind.into())
    }

    pub fn with_post_label(mut self, label: impl Into<String>) -> Self {
        self.post_label = label.into();
        self
    }

    fn shows(&self, kind: BlockKind) -> bool {
        !self.omitted.contains(&kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum RenderNode {
    Paragraph {
        text: String,
    },
    Image {
        url: String,
        caption: Option<String>,
        alt: Option<String>,
    },
    Video {
        url: String,
        caption: Option<String>,
    },
    Audio {
        url: String,
        caption: Option<String>,
    },
    Quote {
        text: String,
        author: Option<String>,
    },
    List {
        items: Vec<String>,
    },
    Gallery {
        images: Vec<GalleryImage>,
    },
}

/// Renders a document body. In a thread context each text node is prefixed
/// with the 1-based index of the post it came from.
pub fn render(body: &ContentBody, ctx: &PageContext) -> Vec<RenderNode> {
    match body {
        ContentBody::Blocks(seq) => seq
            .blocks()
            .iter()
            .filter_map(|block| render_block(block, ctx, None))
            .collect(),
        ContentBody::Thread(posts) => posts
            .posts()
            .iter()
            .enumerate()
            .flat_map(|(index, post)| {
                let label = (ctx.page == PageKind::Thread).then(|| format!("[{} {}]", ctx.post_label, index + 1));
                post.blocks
                    .blocks()
                    .iter()
                    .filter_map(move |block| render_block(block, ctx, label.as_deref()))
                    .collect::<Vec<_>>()
            })
            .collect(),
    }
}

fn render_block(block: &Block, ctx: &PageContext, post_label: Option<&str>) -> Option<RenderNode> {
    if !ctx.shows(block.kind()) {
        return None;
    }
    let node = match &block.body {
        BlockBody::Text(b) => RenderNode::Paragraph {
            text: match post_label {
                Some(label) => format!("{label} {}", b.text),
                None => b.text.clone(),
            },
        },
        BlockBody::Image(b) => RenderNode::Image {
            url: b.url.clone(),
            caption: b.caption.clone(),
            alt: b.alt.clone(),
        },
        BlockBody::Video(b) => RenderNode::Video { url: b.url.clone(), caption: b.caption.clone() },
        BlockBody::Audio(b) => RenderNode::Audio { url: b.url.clone(), caption: b.caption.clone() },
        BlockBody::Quote(b) => RenderNode::Quote { text: b.text.clone(), author: b.author.clone() },
        BlockBody::List(b) => RenderNode::List { items: b.items.clone() },
        BlockBody::Gallery(b) if b.images.is_empty() => return None,
        BlockBody::Gallery(b) => RenderNode::Gallery { images: b.images.clone() },
    };
    Some(node)
}

/// Renders a document's hero media as a single node.
pub fn render_hero(kind: ContentKind, hero: &HeroMedia) -> Option<RenderNode> {
    match hero {
        HeroMedia::None => None,
        HeroMedia::Gallery(images) if images.is_empty() => None,
        HeroMedia::Gallery(images) => Some(RenderNode::Gallery { images: images.clone() }),
        HeroMedia::Single(url) => Some(match kind {
            ContentKind::Video => RenderNode::Video { url: url.clone(), caption: None },
            ContentKind::Audio => RenderNode::Audio { url: url.clone(), caption: None },
            _ => RenderNode::Image { url: url.clone(), caption: None, alt: None },
        }),
    }
}

/// Minutes to read at 200 words per minute, never less than one.
pub fn reading_time_minutes(body: &ContentBody) -> usize {
    reading_time_for_words(body.word_count())
}

pub fn reading_time_for_words(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}
