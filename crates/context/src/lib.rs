//! # Carve Context
//!
//! Ordered composition of model context from typed cells.
//!
//! A [`ContextBuilder`] holds an append-only sequence of [`ContextCell`]s
//! (file trees, full files, scaffolds, nearby-file expansions, prompts,
//! sections, free text) and compiles them into a single document. Cells
//! render in insertion order and compilation never mutates a cell.
//!
//! Failure semantics are split: a missing target for a full-file or
//! file-tree cell aborts the compile, while unresolved prompts and
//! un-scaffoldable files degrade to a placeholder or are dropped.

mod builder;
mod cell;
mod error;
mod prompt;
mod render;
mod tree;

pub use builder::ContextBuilder;
pub use cell::{CellBody, ContextCell};
pub use error::{ContextError, Result};
pub use prompt::{NoPrompts, PromptSource};
