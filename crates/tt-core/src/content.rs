//! # Content codec
//!
//! The one place stored `content` and `heroImage` text is decoded.
//! `decode` distinguishes legitimately empty content from unreadable content;
//! `decode_or_empty` is for read paths that must never fail a page.

use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use serde_json::Value;
use thiserror::Error;

use crate::blocks::GalleryImage;
use crate::editor::{BlockSequence, PostSequence};
use crate::models::ContentKind;

#[derive(Debug, Error)]
pub enum ContentError {
    /// The stored text is not JSON at all.
    #[error("corrupt content: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// Valid JSON that does not match the block schema.
    #[error("invalid content: {0}")]
    Invalid(#[source] serde_json::Error),
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Data => ContentError::Invalid(err),
            Category::Syntax | Category::Eof | Category::Io => ContentError::Corrupt(err),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    blocks: T,
}

/// The decoded `content` field of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBody {
    Blocks(BlockSequence),
    /// `thread` documents: posts, each with its own blocks
    Thread(PostSequence),
}

impl ContentBody {
    pub fn empty(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Thread => Self::Thread(PostSequence::new()),
            _ => Self::Blocks(BlockSequence::new()),
        }
    }

    /// Decodes the stored envelope for a document of `kind`.
    pub fn decode(kind: ContentKind, raw: &str) -> Result<Self, ContentError> {
        if raw.trim().is_empty() {
            return Ok(Self::empty(kind));
        }
        Ok(match kind {
            ContentKind::Thread => {
                let env: Envelope<PostSequence> = serde_json::from_str(raw)?;
                Self::Thread(env.blocks)
            }
            _ => {
                let env: Envelope<BlockSequence> = serde_json::from_str(raw)?;
                Self::Blocks(env.blocks)
            }
        })
    }

    /// Like [`ContentBody::decode`], but unreadable content becomes empty.
    pub fn decode_or_empty(kind: ContentKind, raw: &str) -> Self {
        Self::decode(kind, raw).unwrap_or_else(|err| {
            log::warn!("rendering {kind} content as empty: {err}");
            Self::empty(kind)
        })
    }

    /// Validates a client-supplied block (or post) array. `null` is empty.
    pub fn from_value(kind: ContentKind, blocks: Value) -> Result<Self, ContentError> {
        if blocks.is_null() {
            return Ok(Self::empty(kind));
        }
        Ok(match kind {
            ContentKind::Thread => Self::Thread(serde_json::from_value(blocks)?),
            _ => Self::Blocks(serde_json::from_value(blocks)?),
        })
    }

    /// Encodes the stored `{"blocks": [...]}` envelope.
    pub fn to_json(&self) -> String {
        let encoded = match self {
            Self::Blocks(seq) => serde_json::to_string(&Envelope { blocks: seq }),
            Self::Thread(seq) => serde_json::to_string(&Envelope { blocks: seq }),
        };
        encoded.unwrap_or_else(|_| r#"{"blocks":[]}"#.to_string())
    }

    /// The block (or post) array without its envelope.
    pub fn blocks_value(&self) -> Value {
        let encoded = match self {
            Self::Blocks(seq) => serde_json::to_value(seq),
            Self::Thread(seq) => serde_json::to_value(seq),
        };
        encoded.unwrap_or_else(|_| Value::Array(Vec::new()))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Blocks(seq) => seq.is_empty(),
            Self::Thread(seq) => seq.is_empty(),
        }
    }

    /// Words across every `text` block, all posts included.
    pub fn word_count(&self) -> usize {
        match self {
            Self::Blocks(seq) => seq.word_count(),
            Self::Thread(seq) => seq.word_count(),
        }
    }
}

/// A document's lead media, stored apart from its blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HeroMedia {
    #[default]
    None,
    /// standard, video, audio and thread documents
    Single(String),
    /// gallery documents; stored as a JSON array
    Gallery(Vec<GalleryImage>),
}

impl HeroMedia {
    /// Decodes the stored `heroImage` column for a document of `kind`.
    pub fn decode(kind: ContentKind, raw: Option<&str>) -> Result<Self, ContentError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::None),
            Some(raw) => raw,
        };
        match kind {
            ContentKind::Gallery => Ok(Self::gallery(serde_json::from_str(raw)?)),
            _ => Ok(Self::Single(raw.to_string())),
        }
    }

    /// A gallery with no images is no hero at all.
    fn gallery(images: Vec<GalleryImage>) -> Self {
        if images.is_empty() {
            Self::None
        } else {
            Self::Gallery(images)
        }
    }

    pub fn decode_or_empty(kind: ContentKind, raw: Option<&str>) -> Self {
        Self::decode(kind, raw).unwrap_or_else(|err| {
            log::warn!("ignoring unreadable {kind} hero media: {err}");
            Self::None
        })
    }

    /// Accepts a client value: a URL string, or for galleries an image array
    /// (or that array already JSON-encoded as a string).
    pub fn from_value(kind: ContentKind, value: Option<Value>) -> Result<Self, ContentError> {
        match (kind, value) {
            (_, None) | (_, Some(Value::Null)) => Ok(Self::None),
            (ContentKind::Gallery, Some(Value::String(raw))) => Self::decode(kind, Some(&raw)),
            (ContentKind::Gallery, Some(value)) => Ok(Self::gallery(serde_json::from_value(value)?)),
            (_, Some(value)) => {
                let url: String = serde_json::from_value(value)?;
                Self::decode(kind, Some(&url))
            }
        }
    }

    /// The text written to the `heroImage` column.
    pub fn to_stored(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Single(url) => Some(url.clone()),
            Self::Gallery(images) => serde_json::to_string(images).ok(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::None => Value::Null,
            Self::Single(url) => Value::String(url.clone()),
            Self::Gallery(images) => serde_json::to_value(images).unwrap_or(Value::Null),
        }
    }
}
