//! Test utilities for Strata development.
//!
//! Provides invariant checkers for [`ArenaAllocator`], a [`LiveSet`] shadow
//! model that remembers what each live payload should contain, and
//! [`init_test_logging`] for routing `tracing` output through the test
//! harness.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::HashMap;

use strata_arena::{ArenaAllocator, ArenaPtr, ChunkInfo};
use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Panic unless the arena satisfies every structural invariant:
///
/// - chunks start at offset 0 and are contiguous;
/// - chunk sizes sum to the capacity exactly;
/// - header and footer agree for every chunk (via [`ArenaAllocator::verify`]);
/// - no two adjacent chunks are both free.
pub fn assert_arena_invariants(arena: &ArenaAllocator) {
    let chunks = arena
        .list_chunks()
        .unwrap_or_else(|err| panic!("arena walk failed: {err}"));
    assert_partition(&chunks, arena.capacity());
    for pair in chunks.windows(2) {
        assert!(
            !(pair[0].is_free && pair[1].is_free),
            "adjacent free chunks at {:#x} and {:#x}",
            pair[0].offset,
            pair[1].offset,
        );
    }
    if let Err(err) = arena.verify() {
        panic!("arena verification failed: {err}");
    }
}

/// Panic unless `chunks` tile `[0, capacity)` with no gap or overlap.
pub fn assert_partition(chunks: &[ChunkInfo], capacity: u32) {
    let mut expected = 0u32;
    for chunk in chunks {
        assert_eq!(
            chunk.offset, expected,
            "chunk at {:#x} does not follow the previous chunk",
            chunk.offset
        );
        assert!(chunk.size > 0, "zero-size chunk at {:#x}", chunk.offset);
        expected += chunk.size;
    }
    assert_eq!(expected, capacity, "chunk sizes do not sum to capacity");
}

/// Deterministic, seed-dependent byte pattern for payload checks.
pub fn pattern(seed: u32, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9) | 1;
    (0..len)
        .map(|_| {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

/// Shadow model of live allocations and the bytes written into them.
#[derive(Default)]
pub struct LiveSet {
    live: HashMap<ArenaPtr, Vec<u8>>,
    order: Vec<ArenaPtr>,
}

impl LiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate, fill the payload with a pattern and remember it.
    ///
    /// Returns `None` when the arena is out of memory.
    pub fn allocate(
        &mut self,
        arena: &mut ArenaAllocator,
        size: u32,
        align: u32,
        seed: u32,
    ) -> Option<ArenaPtr> {
        let ptr = arena.allocate(size, align, None).ok()?;
        let bytes = pattern(seed, size as usize);
        arena.payload_mut(ptr).expect("fresh pointer resolves")[..bytes.len()]
            .copy_from_slice(&bytes);
        self.live.insert(ptr, bytes);
        self.order.push(ptr);
        Some(ptr)
    }

    /// Release the `index`-th live allocation (modulo the live count).
    pub fn release_nth(&mut self, arena: &mut ArenaAllocator, index: usize) -> Option<ArenaPtr> {
        if self.order.is_empty() {
            return None;
        }
        let ptr = self.order.swap_remove(index % self.order.len());
        self.live.remove(&ptr);
        arena.release(ptr).expect("live pointer releases");
        Some(ptr)
    }

    /// Reallocate the `index`-th live allocation, checking the preserved
    /// prefix and refilling the tail.
    pub fn reallocate_nth(
        &mut self,
        arena: &mut ArenaAllocator,
        index: usize,
        size: u32,
        align: u32,
        seed: u32,
    ) -> Option<ArenaPtr> {
        if self.order.is_empty() {
            return None;
        }
        let slot = index % self.order.len();
        let old = self.order[slot];
        let new = arena.reallocate(old, size, align, None).ok()?;

        let mut bytes = self.live.remove(&old).expect("tracked pointer");
        let keep = bytes.len().min(size as usize);
        bytes.truncate(keep);
        assert_eq!(
            &arena.payload(new).expect("new pointer resolves")[..keep],
            &bytes[..],
            "reallocate lost payload bytes"
        );
        bytes.extend(pattern(seed, size as usize - keep));
        arena.payload_mut(new).expect("new pointer resolves")[keep..size as usize]
            .copy_from_slice(&bytes[keep..]);

        self.order[slot] = new;
        self.live.insert(new, bytes);
        Some(new)
    }

    /// Panic unless every live payload still holds what was written.
    pub fn assert_payloads(&self, arena: &ArenaAllocator) {
        for (ptr, bytes) in &self.live {
            let payload = arena
                .payload(*ptr)
                .unwrap_or_else(|err| panic!("live pointer {ptr:?} no longer resolves: {err}"));
            assert_eq!(&payload[..bytes.len()], &bytes[..], "payload at {ptr:?} changed");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_arena::ArenaConfig;

    #[test]
    fn pattern_is_deterministic_per_seed() {
        assert_eq!(pattern(7, 32), pattern(7, 32));
        assert_ne!(pattern(7, 32), pattern(8, 32));
    }

    #[test]
    fn live_set_round_trip() {
        let mut arena = ArenaAllocator::new(ArenaConfig::new(4096)).unwrap();
        let mut live = LiveSet::new();
        live.allocate(&mut arena, 100, 8, 1).unwrap();
        live.allocate(&mut arena, 33, 16, 2).unwrap();
        live.reallocate_nth(&mut arena, 0, 300, 8, 3).unwrap();
        live.assert_payloads(&arena);
        assert_arena_invariants(&arena);
        live.release_nth(&mut arena, 0).unwrap();
        live.release_nth(&mut arena, 0).unwrap();
        assert!(live.is_empty());
        assert_eq!(arena.list_chunks().unwrap().len(), 1);
    }
}
