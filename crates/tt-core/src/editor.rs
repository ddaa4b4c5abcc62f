//! # Block Sequence Editor
//!
//! Immutable aggregates over ordered blocks and thread posts. Every mutator
//! returns a new sequence and leaves `self` untouched, so a failed command
//! never leaves a half-edited document behind.
//!
//! Invariants held by both aggregates:
//! - ids are unique within the sequence,
//! - `order` equals the array index after every command.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blocks::{id_from_string_or_number, new_id, Block, BlockBody, BlockKind};
use crate::content::{ContentBody, ContentError};
use crate::models::ContentKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("no block with id '{0}'")]
    UnknownBlock(String),

    #[error("no post with id '{0}'")]
    UnknownPost(String),

    #[error("duplicate id '{0}'")]
    DuplicateId(String),

    #[error("block '{id}' is {expected}, payload is {found}")]
    KindMismatch {
        id: String,
        expected: BlockKind,
        found: BlockKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Swaps `index` with its neighbour. Returns false at the boundaries.
fn swap_neighbour<T>(items: &mut [T], index: usize, direction: Direction) -> bool {
    let target = match direction {
        Direction::Up if index > 0 => index - 1,
        Direction::Down if index + 1 < items.len() => index + 1,
        _ => return false,
    };
    items.swap(index, target);
    true
}

fn ensure_unique<'a>(ids: impl Iterator<Item = &'a str>) -> Result<(), EditError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(EditError::DuplicateId(id.to_string()));
        }
    }
    Ok(())
}

/// Commands accepted by [`BlockSequence::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum BlockCommand {
    AddBlock(BlockKind),
    UpdateBlock { id: String, body: BlockBody },
    DeleteBlock { id: String },
    MoveBlock { id: String, direction: Direction },
}

/// Ordered blocks of a non-thread document, or of one thread post.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Block>", into = "Vec<Block>")]
pub struct BlockSequence {
    blocks: Vec<Block>,
}

impl TryFrom<Vec<Block>> for BlockSequence {
    type Error = EditError;

    fn try_from(blocks: Vec<Block>) -> Result<Self, Self::Error> {
        Self::from_blocks(blocks)
    }
}

impl From<BlockSequence> for Vec<Block> {
    fn from(seq: BlockSequence) -> Self {
        seq.blocks
    }
}

impl BlockSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts blocks in their given array order, renumbering `order`.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, EditError> {
        ensure_unique(blocks.iter().map(|b| b.id.as_str()))?;
        let mut seq = Self { blocks };
        seq.renumber();
        Ok(seq)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn word_count(&self) -> usize {
        self.blocks.iter().map(|b| b.body.word_count()).sum()
    }

    fn position(&self, id: &str) -> Result<usize, EditError> {
        self.blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| EditError::UnknownBlock(id.to_string()))
    }

    fn renumber(&mut self) {
        for (index, block) in self.blocks.iter_mut().enumerate() {
            block.order = index as u32;
        }
    }

    /// Appends a block of `kind` with its default payload.
    pub fn add_block(&self, kind: BlockKind) -> Self {
        let mut next = self.clone();
        let mut block = Block::new(BlockBody::default_for(kind));
        block.order = next.blocks.len() as u32;
        next.blocks.push(block);
        next
    }

    /// Replaces the payload of block `id`. The block's kind cannot change.
    pub fn update_block(&self, id: &str, body: BlockBody) -> Result<Self, EditError> {
        let index = self.position(id)?;
        let expected = self.blocks[index].kind();
        if body.kind() != expected {
            return Err(EditError::KindMismatch {
                id: id.to_string(),
                expected,
                found: body.kind(),
            });
        }
        let mut next = self.clone();
        next.blocks[index].body = body;
        Ok(next)
    }

    pub fn delete_block(&self, id: &str) -> Result<Self, EditError> {
        let index = self.position(id)?;
        let mut next = self.clone();
        next.blocks.remove(index);
        next.renumber();
        Ok(next)
    }

    /// Swaps block `id` with its neighbour; unchanged at the boundaries.
    pub fn move_block(&self, id: &str, direction: Direction) -> Result<Self, EditError> {
        let index = self.position(id)?;
        let mut next = self.clone();
        if swap_neighbour(&mut next.blocks, index, direction) {
            next.renumber();
        }
        Ok(next)
    }

    pub fn apply(&self, command: BlockCommand) -> Result<Self, EditError> {
        match command {
            BlockCommand::AddBlock(kind) => Ok(self.add_block(kind)),
            BlockCommand::UpdateBlock { id, body } => self.update_block(&id, body),
            BlockCommand::DeleteBlock { id } => self.delete_block(&id),
            BlockCommand::MoveBlock { id, direction } => self.move_block(&id, direction),
        }
    }

    /// Encodes the sequence as the stored `{"blocks": [...]}` envelope.
    pub fn to_json(&self) -> String {
        ContentBody::Blocks(self.clone()).to_json()
    }

    /// Decodes a stored envelope. Blank input is an empty sequence.
    pub fn from_json(raw: &str) -> Result<Self, ContentError> {
        match ContentBody::decode(ContentKind::Standard, raw)? {
            ContentBody::Blocks(seq) => Ok(seq),
            ContentBody::Thread(_) => Ok(Self::new()),
        }
    }
}

/// One entry of a thread: its own ordered block sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub blocks: BlockSequence,
    #[serde(default)]
    pub order: u32,
}

impl Post {
    pub fn new() -> Self {
        Self { id: new_id(), blocks: BlockSequence::new(), order: 0 }
    }
}

impl Default for Post {
    fn default() -> Self {
        Self::new()
    }
}

/// Commands accepted by [`PostSequence::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadCommand {
    AddPost,
    DeletePost { post_id: String },
    MovePost { post_id: String, direction: Direction },
    /// A block command scoped to one post's sequence.
    InPost { post_id: String, command: BlockCommand },
}

/// Ordered posts of a thread document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Post>", into = "Vec<Post>")]
pub struct PostSequence {
    posts: Vec<Post>,
}

impl TryFrom<Vec<Post>> for PostSequence {
    type Error = EditError;

    fn try_from(posts: Vec<Post>) -> Result<Self, Self::Error> {
        Self::from_posts(posts)
    }
}

impl From<PostSequence> for Vec<Post> {
    fn from(seq: PostSequence) -> Self {
        seq.posts
    }
}

impl PostSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_posts(posts: Vec<Post>) -> Result<Self, EditError> {
        ensure_unique(posts.iter().map(|p| p.id.as_str()))?;
        let mut seq = Self { posts };
        seq.renumber();
        Ok(seq)
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, post_id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    pub fn word_count(&self) -> usize {
        self.posts.iter().map(|p| p.blocks.word_count()).sum()
    }

    fn position(&self, post_id: &str) -> Result<usize, EditError> {
        self.posts
            .iter()
            .position(|p| p.id == post_id)
            .ok_or_else(|| EditError::UnknownPost(post_id.to_string()))
    }

    fn renumber(&mut self) {
        for (index, post) in self.posts.iter_mut().enumerate() {
            post.order = index as u32;
        }
    }

    pub fn add_post(&self) -> Self {
        let mut next = self.clone();
        let mut post = Post::new();
        post.order = next.posts.len() as u32;
        next.posts.push(post);
        next
    }

    pub fn delete_post(&self, post_id: &str) -> Result<Self, EditError> {
        let index = self.position(post_id)?;
        let mut next = self.clone();
        next.posts.remove(index);
        next.renumber();
        Ok(next)
    }

    pub fn move_post(&self, post_id: &str, direction: Direction) -> Result<Self, EditError> {
        let index = self.position(post_id)?;
        let mut next = self.clone();
        if swap_neighbour(&mut next.posts, index, direction) {
            next.renumber();
        }
        Ok(next)
    }

    /// Runs `command` against one post's blocks; sibling posts are untouched.
    fn edit_post(&self, post_id: &str, command: BlockCommand) -> Result<Self, EditError> {
        let index = self.position(post_id)?;
        let blocks = self.posts[index].blocks.apply(command)?;
        let mut next = self.clone();
        next.posts[index].blocks = blocks;
        Ok(next)
    }

    pub fn add_post_block(&self, post_id: &str, kind: BlockKind) -> Result<Self, EditError> {
        self.edit_post(post_id, BlockCommand::AddBlock(kind))
    }

    pub fn update_block_in_post(&self, post_id: &str, block_id: &str, body: BlockBody) -> Result<Self, EditError> {
        self.edit_post(post_id, BlockCommand::UpdateBlock { id: block_id.to_string(), body })
    }

    pub fn delete_block_from_post(&self, post_id: &str, block_id: &str) -> Result<Self, EditError> {
        self.edit_post(post_id, BlockCommand::DeleteBlock { id: block_id.to_string() })
    }

    pub fn move_block_in_post(&self, post_id: &str, block_id: &str, direction: Direction) -> Result<Self, EditError> {
        self.edit_post(
            post_id,
            BlockCommand::MoveBlock { id: block_id.to_string(), direction },
        )
    }

    pub fn apply(&self, command: ThreadCommand) -> Result<Self, EditError> {
        match command {
            ThreadCommand::AddPost => Ok(self.add_post()),
            ThreadCommand::DeletePost { post_id } => self.delete_post(&post_id),
            ThreadCommand::MovePost { post_id, direction } => self.move_post(&post_id, direction),
            ThreadCommand::InPost { post_id, command } => self.edit_post(&post_id, command),
        }
    }

    pub fn to_json(&self) -> String {
        ContentBody::Thread(self.clone()).to_json()
    }

    pub fn from_json(raw: &str) -> Result<Self, ContentError> {
        match ContentBody::decode(ContentKind::Thread, raw)? {
            ContentBody::Thread(seq) => Ok(seq),
            ContentBody::Blocks(_) => Ok(Self::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::TextBlock;

    fn ids(seq: &BlockSequence) -> Vec<String> {
        seq.blocks().iter().map(|b| b.id.clone()).collect()
    }

    fn orders(seq: &BlockSequence) -> Vec<u32> {
        seq.blocks().iter().map(|b| b.order).collect()
    }

    fn three_blocks() -> BlockSequence {
        BlockSequence::new()
            .add_block(BlockKind::Text)
            .add_block(BlockKind::Image)
            .add_block(BlockKind::Quote)
    }

    #[test]
    fn add_block_appends_with_next_order() {
        let seq = three_blocks();
        let grown = seq.add_block(BlockKind::List);

        assert_eq!(grown.len(), seq.len() + 1);
        let last = grown.blocks().last().unwrap();
        assert_eq!(last.order as usize, seq.len());
        assert_eq!(last.kind(), BlockKind::List);
        // The original is untouched.
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn move_up_then_down_restores_order() {
        let seq = three_blocks();
        let middle = seq.blocks()[1].id.clone();

        let moved = seq.move_block(&middle, Direction::Up).unwrap();
        assert_eq!(moved.blocks()[0].id, middle);
        assert_eq!(orders(&moved), vec![0, 1, 2]);

        let back = moved.move_block(&middle, Direction::Down).unwrap();
        assert_eq!(back, seq);
    }

    #[test]
    fn moves_at_boundaries_are_noops() {
        let seq = three_blocks();
        let first = seq.blocks()[0].id.clone();
        let last = seq.blocks()[2].id.clone();

        assert_eq!(seq.move_block(&first, Direction::Up).unwrap(), seq);
        assert_eq!(seq.move_block(&last, Direction::Down).unwrap(), seq);
    }

    #[test]
    fn delete_renumbers_siblings() {
        let seq = three_blocks();
        let first = seq.blocks()[0].id.clone();

        let shorter = seq.delete_block(&first).unwrap();
        assert_eq!(shorter.len(), 2);
        assert_eq!(orders(&shorter), vec![0, 1]);
        assert_eq!(ids(&shorter), ids(&seq)[1..].to_vec());
    }

    #[test]
    fn update_replaces_payload_of_same_kind() {
        let seq = three_blocks();
        let id = seq.blocks()[0].id.clone();
        let body = BlockBody::Text(TextBlock { text: "Haifa, 1948".into() });

        let updated = seq.update_block(&id, body.clone()).unwrap();
        assert_eq!(updated.get(&id).unwrap().body, body);
    }

    #[test]
    fn update_rejects_kind_change() {
        let seq = three_blocks();
        let id = seq.blocks()[1].id.clone();
        let err = seq
            .update_block(&id, BlockBody::Text(TextBlock { text: "x".into() }))
            .unwrap_err();
        assert_eq!(
            err,
            EditError::KindMismatch { id, expected: BlockKind::Image, found: BlockKind::Text }
        );
    }

    #[test]
    fn unknown_ids_are_reported() {
        let seq = three_blocks();
        assert_eq!(
            seq.delete_block("missing").unwrap_err(),
            EditError::UnknownBlock("missing".into())
        );
        assert!(seq.move_block("missing", Direction::Down).is_err());
    }

    #[test]
    fn from_blocks_rejects_duplicate_ids() {
        let seq = three_blocks();
        let mut blocks: Vec<Block> = seq.into();
        blocks[1].id = blocks[0].id.clone();
        assert!(matches!(BlockSequence::from_blocks(blocks), Err(EditError::DuplicateId(_))));
    }

    #[test]
    fn json_round_trip_is_identity() {
        let seq = three_blocks()
            .apply(BlockCommand::AddBlock(BlockKind::Gallery))
            .unwrap();
        let decoded = BlockSequence::from_json(&seq.to_json()).unwrap();
        assert_eq!(decoded, seq);
    }

    #[test]
    fn post_commands_only_touch_their_post() {
        let thread = PostSequence::new().add_post().add_post();
        let first = thread.posts()[0].id.clone();
        let second = thread.posts()[1].id.clone();

        let edited = thread
            .add_post_block(&first, BlockKind::Text)
            .unwrap()
            .add_post_block(&first, BlockKind::Image)
            .unwrap();
        assert_eq!(edited.get(&first).unwrap().blocks.len(), 2);
        assert_eq!(edited.get(&second).unwrap(), thread.get(&second).unwrap());

        let image = edited.get(&first).unwrap().blocks.blocks()[1].id.clone();
        let moved = edited.move_block_in_post(&first, &image, Direction::Up).unwrap();
        assert_eq!(moved.get(&first).unwrap().blocks.blocks()[0].id, image);

        let trimmed = moved.delete_block_from_post(&first, &image).unwrap();
        assert_eq!(trimmed.get(&first).unwrap().blocks.len(), 1);

        let text = trimmed.get(&first).unwrap().blocks.blocks()[0].id.clone();
        let rewritten = trimmed
            .update_block_in_post(&first, &text, BlockBody::Text(TextBlock { text: "Lydda".into() }))
            .unwrap();
        assert_eq!(rewritten.get(&first).unwrap().blocks.word_count(), 1);
    }

    #[test]
    fn move_post_renumbers_posts() {
        let thread = PostSequence::new().add_post().add_post().add_post();
        let last = thread.posts()[2].id.clone();

        let moved = thread
            .apply(ThreadCommand::MovePost { post_id: last.clone(), direction: Direction::Up })
            .unwrap();
        assert_eq!(moved.posts()[1].id, last);
        let orders: Vec<u32> = moved.posts().iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);

        assert_eq!(moved.delete_post(&last).unwrap().len(), 2);
        assert_eq!(
            thread.delete_post("nope").unwrap_err(),
            EditError::UnknownPost("nope".into())
        );
    }

    #[test]
    fn thread_round_trip_is_identity() {
        let thread = PostSequence::new().add_post();
        let post = thread.posts()[0].id.clone();
        let thread = thread.add_post_block(&post, BlockKind::Audio).unwrap();

        assert_eq!(PostSequence::from_json(&thread.to_json()).unwrap(), thread);
    }
}
