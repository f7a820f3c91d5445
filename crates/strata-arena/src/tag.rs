//! Boundary-tag encoding for chunk headers and footers.
//!
//! Every chunk in the arena starts with a header word and ends with a footer
//! word. Both words hold the same [`ChunkTag`]: the chunk's total size in
//! bytes with the allocation flag packed into the two low-order bits. Sizes
//! are always word-aligned, so those bits are never part of the size itself.
//!
//! ```text
//!  31                               2   1   0
//! ┌──────────────────────────────────┬───┬───┐
//! │        size (bytes, / 4)         │ 0 │ A │
//! └──────────────────────────────────┴───┴───┘
//! ```

use std::fmt;

/// Size of one arena word in bytes. Headers, footers and offset words are
/// all one word wide, and every chunk size is a multiple of it.
pub const WORD_SIZE: u32 = 4;

/// Bits of a tag reserved for flags.
const FLAG_MASK: u32 = 0x03;

/// Flag bit set on allocated chunks.
const ALLOCATED: u32 = 0x01;

/// Packed `size | allocated` word written at both ends of a chunk.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkTag(u32);

impl ChunkTag {
    /// Encode a tag for a chunk of `size` bytes.
    ///
    /// `size` is rounded up to the next word multiple. Sizes within three
    /// bytes of `u32::MAX` saturate to the largest representable size.
    pub fn new(size: u32, allocated: bool) -> Self {
        let size = word_align(size).unwrap_or(u32::MAX & !FLAG_MASK);
        let flag = if allocated { ALLOCATED } else { 0 };
        Self(size | flag)
    }

    /// Reinterpret a raw word read from the arena.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw word as stored in the arena.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Total chunk size in bytes, including header and footer.
    pub const fn size(self) -> u32 {
        self.0 & !FLAG_MASK
    }

    /// Whether both flag bits are clear.
    pub const fn is_free(self) -> bool {
        self.0 & FLAG_MASK == 0
    }

    /// Whether the chunk is handed out to a caller.
    pub const fn is_allocated(self) -> bool {
        !self.is_free()
    }
}

impl fmt::Debug for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkTag")
            .field("size", &self.size())
            .field("allocated", &self.is_allocated())
            .finish()
    }
}

/// Round `value` up to a multiple of `align`.
///
/// `align` must be non-zero. Returns `None` on overflow.
pub fn align_up(value: u32, align: u32) -> Option<u32> {
    debug_assert!(align != 0, "align_up called with zero alignment");
    match value % align {
        0 => Some(value),
        rem => value.checked_add(align - rem),
    }
}

/// Round `value` up to a multiple of [`WORD_SIZE`].
pub fn word_align(value: u32) -> Option<u32> {
    align_up(value, WORD_SIZE)
}

/// Coerce a requested alignment to a non-zero multiple of [`WORD_SIZE`].
///
/// Alignments below one word are raised to one word; other non-multiples
/// are rounded up (6 becomes 8, 12 stays 12). Powers of two are not required.
pub fn coerce_alignment(align: u32) -> u32 {
    match word_align(align.max(WORD_SIZE)) {
        Some(align) => align,
        // Only reachable for alignments within a word of u32::MAX.
        None => u32::MAX & !FLAG_MASK,
    }
}
