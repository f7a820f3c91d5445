//! Boundary-tag arena allocator for Strata asset loading.
//!
//! Every resource the engine loads (file contents, texture pixels, mesh
//! buffers) is carved out of one fixed-size arena owned by an
//! [`ArenaAllocator`]. The arena is subdivided on demand into variably sized,
//! alignable chunks that can be released, reallocated and coalesced, and
//! live chunks can carry labels so a listing shows who owns what.
//!
//! # Architecture
//!
//! ```text
//! ArenaAllocator
//! ├── Vec<u32> arena (fixed capacity, word-addressed)
//! │   └── chunk* = [ header | padding | offset | payload | footer ]
//! ├── LabelRegistry (header offset → label, debug tracking only)
//! └── ArenaConfig (capacity, debug tracking)
//! ```
//!
//! # Modules
//!
//! - [`tag`]: packs chunk size and allocation flag into one word.
//! - [`heap`]: first-fit allocation, release with coalescing, reallocation.
//! - [`inspect`]: chunk listings, stats and integrity checks.
//! - [`labels`]: diagnostic labels for live chunks.
//!
//! # Failure modes
//!
//! Out-of-memory and invalid pointers are reported as [`ArenaError`] values
//! and leave the arena unchanged. Double-free and use-after-free are not
//! detected in general; a pointer must be released at most once.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod handle;
pub mod heap;
pub mod inspect;
pub mod labels;
pub mod tag;

// Public re-exports for the primary API surface.
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use handle::ArenaPtr;
pub use heap::ArenaAllocator;
pub use inspect::{ArenaStats, ChunkInfo, ChunkWalk, MemoryReport};
pub use labels::UNKNOWN_LABEL;
