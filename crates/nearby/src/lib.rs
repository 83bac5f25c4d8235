//! # Carve Nearby
//!
//! Proximity-ranked file discovery for context assembly.
//!
//! Given a target file or directory, [`NearestFileFinder`] walks the
//! surrounding filesystem graph breadth-first (siblings, children, then
//! outward through parent directories) and returns the closest files,
//! ranked so that files sharing the target's extension come first.
//!
//! Ignore semantics come from the nearest ancestor `.gitignore` via
//! [`GitignoreFilter`]; traversal accepts any [`PathFilter`] so it can be
//! exercised against fakes in tests.

mod error;
mod filter;
mod finder;

pub use error::{NearbyError, Result};
pub use filter::{GitignoreFilter, PathFilter};
pub use finder::{FileDistance, NearestFileFinder, DEFAULT_MAX_DEPTH};
