//! Core types and trait definitions for the Lineage family tree.
//!
//! No HTTP or database dependencies. Every other crate in the workspace
//! builds on it.

// `MemberStore` spells out `Send` futures; impls use plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod graph;
pub mod maintainer;
pub mod member;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
