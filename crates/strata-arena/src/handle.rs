//! Opaque payload pointers.
//!
//! An [`ArenaPtr`] names an allocation by the byte offset of its payload
//! within the arena. Callers never see raw memory: payload bytes are reached
//! through [`ArenaAllocator::payload`](crate::ArenaAllocator::payload) and
//! friends, which validate the pointer on every use.

use std::fmt;

/// Location of an allocation's payload within the arena.
///
/// Every payload sits at least two words into its chunk (after the header
/// and offset words), so offset 0 never names a live payload and is used
/// as the null pointer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[must_use]
pub struct ArenaPtr {
    offset: u32,
}

impl ArenaPtr {
    /// The null pointer. Releasing it is a no-op and reallocating it is
    /// a fresh allocation.
    pub const NULL: ArenaPtr = ArenaPtr { offset: 0 };

    /// Build a pointer from a raw payload offset.
    ///
    /// The offset is not trusted: every allocator operation checks it
    /// against the arena before reading through it.
    pub const fn from_offset(offset: u32) -> Self {
        Self { offset }
    }

    /// Byte offset of the payload from the start of the arena.
    pub const fn offset(self) -> u32 {
        self.offset
    }

    /// Whether this is [`ArenaPtr::NULL`].
    pub const fn is_null(self) -> bool {
        self.offset == 0
    }
}

impl fmt::Debug for ArenaPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "ArenaPtr(null)")
        } else {
            write!(f, "ArenaPtr({:#010x})", self.offset)
        }
    }
}

impl fmt::Display for ArenaPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.offset)
    }
}
