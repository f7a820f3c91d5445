//! Read-only arena introspection.
//!
//! Everything here walks the arena from offset 0 by chunk size and never
//! writes to it. Walks are bounds-checked on every jump: a size field that
//! would carry the walk past `capacity` (or a zero size, which would never
//! advance) ends the walk with [`ArenaError::Corrupted`].

use std::fmt;

use tracing::{debug, warn};

use crate::error::ArenaError;
use crate::heap::ArenaAllocator;
use crate::labels::UNKNOWN_LABEL;
use crate::tag::{ChunkTag, WORD_SIZE};

/// One chunk as seen by [`ArenaAllocator::list_chunks`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkInfo {
    /// Label recorded at allocation time, or `"unknown"`.
    pub label: String,
    /// Byte offset of the chunk header within the arena.
    pub offset: u32,
    /// Total chunk size in bytes, header and footer included.
    pub size: u32,
    /// Whether the chunk is free.
    pub is_free: bool,
}

impl fmt::Display for ChunkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_free { "free    " } else { "occupied" };
        write!(
            f,
            "chunk: offset {:#010x}, size {:#010x}, status: {status}, label: {}",
            self.offset, self.size, self.label
        )
    }
}

/// Aggregate occupancy figures for an arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Managed arena size in bytes.
    pub capacity: u32,
    /// Bytes in allocated chunks, metadata and padding included.
    pub used_bytes: u32,
    /// Bytes in free chunks.
    pub free_bytes: u32,
    /// Number of chunks of either kind.
    pub chunk_count: usize,
    /// Number of free chunks.
    pub free_chunk_count: usize,
    /// Size of the largest free chunk. An allocation needs this to be at
    /// least payload + padding + 12 bytes to succeed.
    pub largest_free: u32,
}

/// Printable table of every chunk in an arena.
#[derive(Clone, Debug)]
pub struct MemoryReport {
    /// Chunks in arena order.
    pub chunks: Vec<ChunkInfo>,
    /// Totals over `chunks`.
    pub stats: ArenaStats,
}

impl fmt::Display for MemoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "------MEMORY-DEBUG------")?;
        for chunk in &self.chunks {
            writeln!(f, "\t{chunk}")?;
        }
        write!(
            f,
            "{} chunks ({} free), {}/{} bytes used, largest free {}",
            self.stats.chunk_count,
            self.stats.free_chunk_count,
            self.stats.used_bytes,
            self.stats.capacity,
            self.stats.largest_free,
        )
    }
}

/// Iterator over `(offset, tag)` for every chunk in arena order.
///
/// Yields one `Err` and then stops if a header is malformed.
pub struct ChunkWalk<'a> {
    arena: &'a ArenaAllocator,
    offset: u32,
    failed: bool,
}

impl Iterator for ChunkWalk<'_> {
    type Item = Result<(u32, ChunkTag), ArenaError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.arena.capacity {
            return None;
        }
        match self.arena.chunk_at(self.offset) {
            Ok(tag) => {
                let at = self.offset;
                self.offset += tag.size();
                Some(Ok((at, tag)))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl ArenaAllocator {
    /// Walk every chunk header in arena order.
    pub fn walk(&self) -> ChunkWalk<'_> {
        ChunkWalk {
            arena: self,
            offset: 0,
            failed: false,
        }
    }

    /// List every chunk with its label, offset, size and status.
    ///
    /// The listing always covers the arena exactly; a malformed header
    /// yields `Err(ArenaError::Corrupted)` instead of a partial listing.
    pub fn list_chunks(&self) -> Result<Vec<ChunkInfo>, ArenaError> {
        self.walk()
            .map(|entry| {
                entry.map(|(offset, tag)| ChunkInfo {
                    label: self.labels.get_or_unknown(offset).to_owned(),
                    offset,
                    size: tag.size(),
                    is_free: tag.is_free(),
                })
            })
            .collect()
    }

    /// List only chunks that carry a label, in labelling order.
    pub fn labelled_chunks(&self) -> Vec<ChunkInfo> {
        self.labels
            .iter()
            .map(|(offset, label)| {
                let tag = self.tag_at(offset);
                ChunkInfo {
                    label: label.to_owned(),
                    offset,
                    size: tag.size(),
                    is_free: tag.is_free(),
                }
            })
            .collect()
    }

    /// Occupancy totals.
    pub fn stats(&self) -> Result<ArenaStats, ArenaError> {
        let mut stats = ArenaStats {
            capacity: self.capacity,
            ..ArenaStats::default()
        };
        for entry in self.walk() {
            let (_, tag) = entry?;
            stats.chunk_count += 1;
            if tag.is_free() {
                stats.free_chunk_count += 1;
                stats.free_bytes += tag.size();
                stats.largest_free = stats.largest_free.max(tag.size());
            } else {
                stats.used_bytes += tag.size();
            }
        }
        Ok(stats)
    }

    /// Check the arena's structural invariants.
    ///
    /// - chunk sizes partition the arena exactly;
    /// - every header equals its footer;
    /// - no two free chunks are adjacent.
    pub fn verify(&self) -> Result<(), ArenaError> {
        let mut prev_free = false;
        for entry in self.walk() {
            let (offset, tag) = entry.inspect_err(|err| warn!(%err, "arena walk failed"))?;
            let footer = self.tag_at(offset + tag.size() - WORD_SIZE);
            if footer != tag {
                let err = ArenaError::Corrupted {
                    offset,
                    reason: format!(
                        "header {:#010x} does not match footer {:#010x}",
                        tag.raw(),
                        footer.raw()
                    ),
                };
                warn!(%err, "arena verification failed");
                return Err(err);
            }
            if prev_free && tag.is_free() {
                let err = ArenaError::Corrupted {
                    offset,
                    reason: "adjacent free chunks were not coalesced".to_owned(),
                };
                warn!(%err, "arena verification failed");
                return Err(err);
            }
            prev_free = tag.is_free();
        }
        Ok(())
    }

    /// Snapshot of every chunk plus totals, printable via `Display`.
    pub fn report(&self) -> Result<MemoryReport, ArenaError> {
        Ok(MemoryReport {
            chunks: self.list_chunks()?,
            stats: self.stats()?,
        })
    }

    /// Log every chunk at debug level.
    pub fn dump(&self) {
        for entry in self.walk() {
            match entry {
                Ok((offset, tag)) => debug!(
                    offset,
                    address = self.address(offset),
                    size = tag.size(),
                    free = tag.is_free(),
                    label = self.labels.get(offset).unwrap_or(UNKNOWN_LABEL),
                    "memory chunk"
                ),
                Err(err) => warn!(%err, "memory dump stopped early"),
            }
        }
    }
}
