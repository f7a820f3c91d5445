//! Strata: the memory arena behind a small renderer's asset loading.
//!
//! This is the top-level facade crate. It re-exports the allocator from
//! `strata-arena` and adds the thin caller-side helpers the engine uses to
//! pull resources into the arena.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! let mut arena = ArenaAllocator::new(ArenaConfig::new(64 * 1024)).unwrap();
//!
//! let verts = arena.allocate(36 * 32, 16, Some("mesh - cube")).unwrap();
//! let name = arena.allocate(5, 4, Some("mesh name - cube")).unwrap();
//! arena.payload_mut(name).unwrap()[..5].copy_from_slice(b"cube\0");
//!
//! // Grow the vertex buffer; the first bytes come along.
//! let verts = arena.reallocate(verts, 72 * 32, 16, None).unwrap();
//!
//! for chunk in arena.list_chunks().unwrap() {
//!     println!("{chunk}");
//! }
//! arena.release(verts).unwrap();
//! arena.release(name).unwrap();
//! assert_eq!(arena.stats().unwrap().free_chunk_count, 1);
//! ```
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`arena`] | `strata-arena`: allocator, pointers, config, errors, introspection |
//! | [`loader`] | Reading files into labelled arena chunks |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Arena allocator, pointers, configuration and introspection (`strata-arena`).
pub use strata_arena as arena;

pub mod loader;

/// Common imports for typical Strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Allocator
    pub use strata_arena::{ArenaAllocator, ArenaConfig, ArenaPtr};

    // Introspection
    pub use strata_arena::{ArenaStats, ChunkInfo, MemoryReport};

    // Errors
    pub use strata_arena::ArenaError;

    // Loading
    pub use crate::loader::{load_file, FileBlob, LoadError};
}
