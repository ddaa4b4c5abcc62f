//! # Blocks
//!
//! Typed content units. On the wire a block is
//! `{"id", "type", "content": {..}, "order"}`; in memory the payload is a
//! [`BlockBody`] variant so that a payload can never disagree with its type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image,
    Video,
    Audio,
    Quote,
    List,
    Gallery,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Quote => "quote",
            Self::List => "list",
            Self::Gallery => "gallery",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "quote" => Ok(Self::Quote),
            "list" => Ok(Self::List),
            "gallery" => Ok(Self::Gallery),
            other => Err(BlockError::UnknownType(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("unknown block type '{0}'")]
    UnknownType(String),

    #[error("invalid {kind} payload: {source}")]
    Payload {
        kind: BlockKind,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageBlock {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Payload shared by `video` and `audio` blocks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaBlock {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuoteBlock {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListBlock {
    pub items: Vec<String>,
}

/// One image of a gallery block or of a gallery document's hero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GalleryImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GalleryBlock {
    pub images: Vec<GalleryImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockBody {
    Text(TextBlock),
    Image(ImageBlock),
    Video(MediaBlock),
    Audio(MediaBlock),
    Quote(QuoteBlock),
    List(ListBlock),
    Gallery(GalleryBlock),
}

impl BlockBody {
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Text(_) => BlockKind::Text,
            Self::Image(_) => BlockKind::Image,
            Self::Video(_) => BlockKind::Video,
            Self::Audio(_) => BlockKind::Audio,
            Self::Quote(_) => BlockKind::Quote,
            Self::List(_) => BlockKind::List,
            Self::Gallery(_) => BlockKind::Gallery,
        }
    }

    /// The empty payload a freshly added block starts with.
    pub fn default_for(kind: BlockKind) -> Self {
        let empty = || Some(String::new());
        match kind {
            BlockKind::Text => Self::Text(TextBlock::default()),
            BlockKind::Image => Self::Image(ImageBlock { url: String::new(), caption: empty(), alt: empty() }),
            BlockKind::Video => Self::Video(MediaBlock { url: String::new(), caption: empty() }),
            BlockKind::Audio => Self::Audio(MediaBlock { url: String::new(), caption: empty() }),
            BlockKind::Quote => Self::Quote(QuoteBlock { text: String::new(), author: empty() }),
            BlockKind::List => Self::List(ListBlock { items: vec![String::new()] }),
            BlockKind::Gallery => Self::Gallery(GalleryBlock::default()),
        }
    }

    /// Decodes a wire payload against the declared block type.
    pub fn from_payload(kind: BlockKind, payload: Value) -> Result<Self, BlockError> {
        let wrap = |source| BlockError::Payload { kind, source };
        Ok(match kind {
            BlockKind::Text => Self::Text(serde_json::from_value(payload).map_err(wrap)?),
            BlockKind::Image => Self::Image(serde_json::from_value(payload).map_err(wrap)?),
            BlockKind::Video => Self::Video(serde_json::from_value(payload).map_err(wrap)?),
            BlockKind::Audio => Self::Audio(serde_json::from_value(payload).map_err(wrap)?),
            BlockKind::Quote => Self::Quote(serde_json::from_value(payload).map_err(wrap)?),
            BlockKind::List => Self::List(serde_json::from_value(payload).map_err(wrap)?),
            BlockKind::Gallery => Self::Gallery(serde_json::from_value(payload).map_err(wrap)?),
        })
    }

    pub fn to_payload(&self) -> Value {
        let encoded = match self {
            Self::Text(b) => serde_json::to_value(b),
            Self::Image(b) => serde_json::to_value(b),
            Self::Video(b) | Self::Audio(b) => serde_json::to_value(b),
            Self::Quote(b) => serde_json::to_value(b),
            Self::List(b) => serde_json::to_value(b),
            Self::Gallery(b) => serde_json::to_value(b),
        };
        // Plain structs of strings always encode.
        encoded.unwrap_or(Value::Null)
    }

    /// Whitespace-separated tokens of a `text` payload; other kinds count zero.
    pub fn word_count(&self) -> usize {
        match self {
            Self::Text(b) => b.text.split_whitespace().count(),
            _ => 0,
        }
    }
}

/// A block inside a document's (or post's) sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub id: String,
    /// Index within the owning sequence
    pub order: u32,
    pub body: BlockBody,
}

impl Block {
    pub fn new(body: BlockBody) -> Self {
        Self { id: new_id(), order: 0, body }
    }

    pub fn kind(&self) -> BlockKind {
        self.body.kind()
    }
}

#[derive(Serialize, Deserialize)]
struct RawBlock {
    #[serde(deserialize_with = "id_from_string_or_number")]
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    order: u32,
}

impl TryFrom<RawBlock> for Block {
    type Error = BlockError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let kind: BlockKind = raw.kind.parse()?;
        Ok(Self {
            id: raw.id,
            order: raw.order,
            body: BlockBody::from_payload(kind, raw.content)?,
        })
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        Self {
            id: block.id,
            kind: block.body.kind().as_str().to_string(),
            content: block.body.to_payload(),
            order: block.order,
        }
    }
}

/// Client-generated identifiers for blocks and posts.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Older editors emitted millisecond timestamps as numeric ids.
pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
