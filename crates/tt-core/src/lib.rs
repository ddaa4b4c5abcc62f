//! trace-of-the-tides/crates/tt-core/src/lib.rs
//!
//! The central content model and interface definitions for Trace of the Tides.

pub mod blocks;
pub mod content;
pub mod editor;
pub mod error;
pub mod models;
pub mod render;
pub mod services;
pub mod slug;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
