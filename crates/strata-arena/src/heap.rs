//! The boundary-tag arena allocator.
//!
//! [`ArenaAllocator`] owns one fixed-size buffer and carves it into chunks on
//! demand. The buffer is always fully partitioned: starting at offset 0,
//! jumping forward by each chunk's size lands exactly on `capacity`.
//!
//! # Chunk layout
//!
//! ```text
//! free chunk:       [ header | ........................... | footer ]
//! allocated chunk:  [ header | padding | offset | payload  | footer ]
//!                                               ^
//!                                               ArenaPtr
//! ```
//!
//! Header and footer hold the same [`ChunkTag`]. The offset word sits
//! directly before the payload and stores the distance back to the header,
//! so a bare [`ArenaPtr`] finds its chunk regardless of alignment padding.
//! The footer lets `release` find a free left neighbour by reading the word
//! just before its own header.
//!
//! Free chunks are not linked together; allocation walks every chunk from
//! offset 0 and takes the first free one that fits.

use std::alloc::Layout;

use indexmap::IndexSet;
use tracing::{debug, error, trace, warn};

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::handle::ArenaPtr;
use crate::labels::LabelRegistry;
use crate::tag::{coerce_alignment, word_align, ChunkTag, WORD_SIZE};

/// Header word plus offset word: the shortest distance from a chunk's start
/// to its payload.
pub(crate) const PREFIX_BYTES: u32 = 2 * WORD_SIZE;

/// Footer word.
pub(crate) const FOOTER_BYTES: u32 = WORD_SIZE;

/// A general-purpose allocator over a single fixed-size arena.
///
/// Not thread-safe: every method assumes exclusive access for the length of
/// the call. Wrap the whole allocator in one lock if it must be shared.
///
/// # Example
///
/// ```
/// use strata_arena::{ArenaAllocator, ArenaConfig};
///
/// let mut arena = ArenaAllocator::new(ArenaConfig::new(1024)).unwrap();
/// let ptr = arena.allocate(100, 8, Some("vertex buffer")).unwrap();
/// arena.payload_mut(ptr).unwrap()[..4].copy_from_slice(&[1, 2, 3, 4]);
/// arena.release(ptr).unwrap();
/// assert_eq!(arena.list_chunks().unwrap().len(), 1);
/// ```
pub struct ArenaAllocator {
    /// Backing storage, addressed in words. Never resized after creation.
    pub(crate) words: Vec<u32>,
    /// Managed size in bytes (`words.len() * WORD_SIZE`).
    pub(crate) capacity: u32,
    /// Diagnostic labels keyed by chunk header offset.
    pub(crate) labels: LabelRegistry,
    /// Payload offsets handed out by `allocate` and not yet released.
    live: IndexSet<u32>,
    config: ArenaConfig,
}

/// A validated allocated chunk, recovered from a payload pointer.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LiveChunk {
    pub(crate) header: u32,
    pub(crate) tag: ChunkTag,
    pub(crate) payload: u32,
}

impl LiveChunk {
    /// One past the chunk's last byte.
    fn end(&self) -> u32 {
        self.header + self.tag.size()
    }

    /// Payload bytes between the offset word and the footer.
    pub(crate) fn usable_size(&self) -> u32 {
        self.end() - FOOTER_BYTES - self.payload
    }

    fn payload_words(&self) -> std::ops::Range<usize> {
        let start = (self.payload / WORD_SIZE) as usize;
        start..start + (self.usable_size() / WORD_SIZE) as usize
    }
}

/// A free chunk chosen by the first-fit walk.
#[derive(Clone, Copy, Debug)]
struct Fit {
    start: u32,
    available: u32,
    padding: u32,
    total: u32,
}

impl ArenaAllocator {
    /// Create an allocator with a single free chunk spanning the arena.
    ///
    /// Returns `Err(ArenaError::InvalidConfig)` for unusable configs and
    /// `Err(ArenaError::InitFailed)` if the backing storage cannot be
    /// acquired. Neither is recoverable; callers should abort setup.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let capacity = config.effective_capacity();
        let word_count = (capacity / WORD_SIZE) as usize;

        let mut words = Vec::new();
        if words.try_reserve_exact(word_count).is_err() {
            error!(capacity, "failed to acquire arena storage");
            return Err(ArenaError::InitFailed { capacity });
        }
        words.resize(word_count, 0);

        let mut arena = Self {
            words,
            capacity,
            labels: LabelRegistry::new(config.debug_tracking),
            live: IndexSet::new(),
            config,
        };
        arena.write_chunk(0, ChunkTag::new(capacity, false));
        debug!(
            capacity,
            debug_tracking = arena.config.debug_tracking,
            "arena initialised"
        );
        Ok(arena)
    }

    /// Managed arena size in bytes.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The configuration this arena was built from.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Whether allocation labels are being recorded.
    pub fn debug_tracking(&self) -> bool {
        self.labels.is_enabled()
    }

    /// Allocate `size` bytes whose payload address is a multiple of
    /// `alignment`.
    ///
    /// `alignment` is coerced to a non-zero multiple of four. `size` may be
    /// zero; the result is still a distinct, releasable pointer. `label` is
    /// recorded for diagnostics when debug tracking is enabled.
    ///
    /// Returns `Err(ArenaError::OutOfMemory)` when no free chunk fits; the
    /// arena is left untouched in that case.
    pub fn allocate(
        &mut self,
        size: u32,
        alignment: u32,
        label: Option<&str>,
    ) -> Result<ArenaPtr, ArenaError> {
        let alignment = coerce_alignment(alignment);
        let fit = match word_align(size) {
            Some(payload_size) => self
                .find_fit(payload_size, alignment)?
                .map(|fit| (fit, payload_size)),
            None => None,
        };

        let Some((fit, payload_size)) = fit else {
            error!(
                requested = size,
                alignment,
                capacity = self.capacity,
                label = label.unwrap_or(crate::labels::UNKNOWN_LABEL),
                "failed to allocate: insufficient arena memory"
            );
            return Err(ArenaError::OutOfMemory {
                requested: size,
                alignment,
                capacity: self.capacity,
            });
        };

        Ok(self.carve(fit, payload_size, label))
    }

    /// Allocate space for a value with the given layout.
    ///
    /// Convenience for typed resources:
    /// `arena.allocate_layout(Layout::new::<Mesh>(), Some("mesh"))`.
    pub fn allocate_layout(
        &mut self,
        layout: Layout,
        label: Option<&str>,
    ) -> Result<ArenaPtr, ArenaError> {
        let (Ok(size), Ok(alignment)) =
            (u32::try_from(layout.size()), u32::try_from(layout.align()))
        else {
            error!(?layout, "failed to allocate: layout exceeds arena addressing");
            return Err(ArenaError::OutOfMemory {
                requested: u32::MAX,
                alignment: u32::MAX,
                capacity: self.capacity,
            });
        };
        self.allocate(size, alignment, label)
    }

    /// Return an allocation to the arena.
    ///
    /// The freed chunk is merged with a free neighbour on either side, so no
    /// two free chunks are ever adjacent afterwards. Releasing
    /// [`ArenaPtr::NULL`] does nothing.
    ///
    /// Pointers that `allocate` never returned, or that were already
    /// released, are logged and rejected with `Err(ArenaError::InvalidPointer)`,
    /// leaving the arena unchanged. A stale pointer whose offset has since
    /// been handed out again is indistinguishable from the new allocation
    /// and releases it.
    pub fn release(&mut self, ptr: ArenaPtr) -> Result<(), ArenaError> {
        if ptr.is_null() {
            return Ok(());
        }
        let chunk = self
            .resolve(ptr)
            .inspect_err(|err| error!(%err, "skipping release"))?;
        self.free_chunk(chunk)
    }

    /// Move an allocation to a fresh chunk of `size` bytes.
    ///
    /// Always allocates, copies `min(old usable size, size)` bytes and
    /// releases the old chunk, even when shrinking. The new chunk is
    /// claimed before the old one is freed, so the returned pointer always
    /// differs from `ptr`. A null `ptr` behaves like
    /// [`allocate`](Self::allocate).
    ///
    /// When `label` is `None` the new chunk keeps the old chunk's label. On
    /// `Err(ArenaError::OutOfMemory)` the old allocation is still valid.
    pub fn reallocate(
        &mut self,
        ptr: ArenaPtr,
        size: u32,
        alignment: u32,
        label: Option<&str>,
    ) -> Result<ArenaPtr, ArenaError> {
        if ptr.is_null() {
            return self.allocate(size, alignment, label);
        }
        let old = self
            .resolve(ptr)
            .inspect_err(|err| error!(%err, "skipping reallocate"))?;

        let label = match label {
            Some(label) => Some(label.to_owned()),
            None => self.labels.get(old.header).map(str::to_owned),
        };
        let new_ptr = self.allocate(size, alignment, label.as_deref())?;

        // `allocate` succeeded, so the word-rounded size cannot overflow.
        let new_usable = word_align(size).unwrap_or(size);
        let copy_words = (old.usable_size().min(new_usable) / WORD_SIZE) as usize;
        let src = (old.payload / WORD_SIZE) as usize;
        let dst = (new_ptr.offset() / WORD_SIZE) as usize;
        self.words.copy_within(src..src + copy_words, dst);

        if let Err(err) = self.free_chunk(old) {
            // Leave the arena as it was before the call.
            if let Ok(fresh) = self.resolve(new_ptr) {
                let _ = self.free_chunk(fresh);
            }
            return Err(err);
        }
        trace!(from = %ptr, to = %new_ptr, size, "reallocated");
        Ok(new_ptr)
    }

    /// Payload bytes of a live allocation.
    ///
    /// The slice covers the word-rounded usable size, which may be up to
    /// three bytes longer than the requested size.
    pub fn payload(&self, ptr: ArenaPtr) -> Result<&[u8], ArenaError> {
        let chunk = self.resolve(ptr)?;
        Ok(bytemuck::cast_slice(&self.words[chunk.payload_words()]))
    }

    /// Mutable payload bytes of a live allocation.
    pub fn payload_mut(&mut self, ptr: ArenaPtr) -> Result<&mut [u8], ArenaError> {
        let chunk = self.resolve(ptr)?;
        Ok(bytemuck::cast_slice_mut(&mut self.words[chunk.payload_words()]))
    }

    /// Usable payload size of a live allocation in bytes.
    pub fn usable_size(&self, ptr: ArenaPtr) -> Result<u32, ArenaError> {
        Ok(self.resolve(ptr)?.usable_size())
    }

    /// Process address of a live allocation's payload.
    ///
    /// Only meaningful for diagnostics such as checking alignment; the
    /// address is never dereferenced by the allocator's callers.
    pub fn address_of(&self, ptr: ArenaPtr) -> Result<usize, ArenaError> {
        let chunk = self.resolve(ptr)?;
        Ok(self.address(chunk.payload))
    }

    /// Label recorded for a live allocation, if any.
    pub fn label_of(&self, ptr: ArenaPtr) -> Result<Option<&str>, ArenaError> {
        let chunk = self.resolve(ptr)?;
        Ok(self.labels.get(chunk.header))
    }

    // ── internals ──────────────────────────────────────────────────

    /// First-fit walk over every chunk, free or not.
    fn find_fit(&self, payload_size: u32, alignment: u32) -> Result<Option<Fit>, ArenaError> {
        let mut start = 0;
        while start < self.capacity {
            let tag = self.chunk_at(start)?;
            if tag.is_free() {
                let padding = self.padding_for(start, alignment);
                let needed = u64::from(PREFIX_BYTES)
                    + u64::from(padding)
                    + u64::from(payload_size)
                    + u64::from(FOOTER_BYTES);
                if u64::from(tag.size()) >= needed {
                    return Ok(Some(Fit {
                        start,
                        available: tag.size(),
                        padding,
                        // Bounded by tag.size().
                        total: needed as u32,
                    }));
                }
            }
            start += tag.size();
        }
        Ok(None)
    }

    /// Bytes to skip after the header and offset words so the payload
    /// address is a multiple of `alignment`.
    fn padding_for(&self, start: u32, alignment: u32) -> u32 {
        let payload_addr = self.address(start) + PREFIX_BYTES as usize;
        let align = alignment as usize;
        // Always a word multiple: the base, `start` and `align` all are.
        ((align - payload_addr % align) % align) as u32
    }

    /// Mark a fitted chunk allocated and split off any remainder.
    fn carve(&mut self, fit: Fit, payload_size: u32, label: Option<&str>) -> ArenaPtr {
        let Fit {
            start,
            available,
            padding,
            total,
        } = fit;

        self.write_chunk(start, ChunkTag::new(total, true));
        let payload = start + PREFIX_BYTES + padding;
        self.set_word(payload - WORD_SIZE, padding + PREFIX_BYTES);

        let remaining = available - total;
        if remaining > 0 {
            self.write_chunk(start + total, ChunkTag::new(remaining, false));
        }

        if let Some(label) = label {
            self.labels.insert(start, label);
        }
        self.live.insert(payload);
        trace!(
            header = start,
            payload,
            payload_size,
            padding,
            chunk_size = total,
            remaining,
            "allocated chunk"
        );
        ArenaPtr::from_offset(payload)
    }

    /// Free a live chunk, coalescing with free neighbours.
    ///
    /// Every neighbour is checked before anything is written, so an error
    /// leaves the arena as it was.
    fn free_chunk(&mut self, chunk: LiveChunk) -> Result<(), ArenaError> {
        let mut start = chunk.header;
        let mut size = chunk.tag.size();

        let right = chunk.end();
        if right < self.capacity {
            let next = self
                .chunk_at(right)
                .inspect_err(|err| warn!(%err, "right neighbour unreadable"))?;
            if next.is_free() {
                size += next.size();
            }
        }

        if start >= WORD_SIZE {
            // The word before our header is the left neighbour's footer.
            let prev = self.tag_at(start - WORD_SIZE);
            if prev.is_free() {
                let prev_start = self
                    .left_neighbour(start, prev)
                    .inspect_err(|err| warn!(%err, "left neighbour unreadable"))?;
                start = prev_start;
                size += prev.size();
            }
        }

        self.labels.remove(chunk.header);
        self.live.swap_remove(&chunk.payload);
        self.write_chunk(start, ChunkTag::new(size, false));
        trace!(
            header = chunk.header,
            freed = chunk.tag.size(),
            merged_start = start,
            merged_size = size,
            "released chunk"
        );
        Ok(())
    }

    /// Header offset of the free chunk whose footer sits just before `start`.
    fn left_neighbour(&self, start: u32, footer: ChunkTag) -> Result<u32, ArenaError> {
        let size = footer.size();
        let corrupt = |reason: String| ArenaError::Corrupted {
            offset: start - WORD_SIZE,
            reason,
        };
        if size == 0 || size > start {
            return Err(corrupt(format!(
                "footer size {size} does not fit before offset {start}"
            )));
        }
        let prev_start = start - size;
        let header = self.tag_at(prev_start);
        if header != footer {
            return Err(corrupt(format!(
                "footer {:#010x} does not match header {:#010x} at {prev_start}",
                footer.raw(),
                header.raw(),
            )));
        }
        Ok(prev_start)
    }

    /// Validate `ptr` and recover the allocated chunk it points into.
    pub(crate) fn resolve(&self, ptr: ArenaPtr) -> Result<LiveChunk, ArenaError> {
        let payload = ptr.offset();
        let invalid = ArenaError::InvalidPointer {
            offset: payload,
            capacity: self.capacity,
        };
        if !self.live.contains(&payload) {
            return Err(invalid);
        }

        // Live payloads are word aligned and at least PREFIX_BYTES in. The
        // tags below can still be wrong if the arena words were overwritten.
        let back = self.word(payload - WORD_SIZE);
        if back < PREFIX_BYTES || back % WORD_SIZE != 0 || back > payload {
            return Err(invalid);
        }
        let header = payload - back;
        let tag = self.tag_at(header);
        let end = match header.checked_add(tag.size()) {
            Some(end) if end <= self.capacity => end,
            _ => return Err(invalid),
        };
        let payload_fits = payload
            .checked_add(FOOTER_BYTES)
            .is_some_and(|needed| needed <= end);
        if tag.is_free() || !payload_fits || self.tag_at(end - WORD_SIZE) != tag {
            return Err(invalid);
        }

        Ok(LiveChunk {
            header,
            tag,
            payload,
        })
    }

    /// Read a chunk header, checking the jump it implies stays in bounds.
    pub(crate) fn chunk_at(&self, offset: u32) -> Result<ChunkTag, ArenaError> {
        let tag = self.tag_at(offset);
        let size = tag.size();
        if size == 0 {
            return Err(ArenaError::Corrupted {
                offset,
                reason: "zero-size chunk".to_owned(),
            });
        }
        match offset.checked_add(size) {
            Some(end) if end <= self.capacity => Ok(tag),
            _ => Err(ArenaError::Corrupted {
                offset,
                reason: format!(
                    "chunk of {size} bytes overruns arena of {} bytes",
                    self.capacity
                ),
            }),
        }
    }

    /// Write a tag at both ends of the chunk it describes.
    fn write_chunk(&mut self, start: u32, tag: ChunkTag) {
        self.set_word(start, tag.raw());
        self.set_word(start + tag.size() - WORD_SIZE, tag.raw());
    }

    pub(crate) fn tag_at(&self, offset: u32) -> ChunkTag {
        ChunkTag::from_raw(self.word(offset))
    }

    fn word(&self, offset: u32) -> u32 {
        self.words[(offset / WORD_SIZE) as usize]
    }

    fn set_word(&mut self, offset: u32, value: u32) {
        self.words[(offset / WORD_SIZE) as usize] = value;
    }

    /// Process address of an arena offset.
    pub(crate) fn address(&self, offset: u32) -> usize {
        self.words.as_ptr() as usize + offset as usize
    }
}
