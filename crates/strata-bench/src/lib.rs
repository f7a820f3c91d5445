//! Benchmark workloads for the Strata arena allocator.
//!
//! Provides deterministic allocation traces for benchmarking:
//!
//! - [`churn_trace`]: mixed allocate/release/reallocate traffic with
//!   resource-like sizes
//! - [`replay`]: drives a trace against an [`ArenaAllocator`]

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use strata_arena::{ArenaAllocator, ArenaError, ArenaPtr};

/// One step of an allocation trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceOp {
    /// Allocate `size` bytes at `align`.
    Alloc { size: u32, align: u32 },
    /// Release the live allocation at `slot` (modulo live count).
    Release { slot: usize },
    /// Reallocate the live allocation at `slot` to `size` bytes.
    Realloc { slot: usize, size: u32 },
}

/// Sizes a resource loader typically asks for: names, small structs,
/// mesh buffers, texture rows, whole textures.
const SIZE_CLASSES: [u32; 6] = [12, 48, 256, 1024, 4096, 16 * 1024];

/// Alignments seen from resource loaders.
const ALIGNS: [u32; 4] = [4, 8, 16, 64];

/// Build a deterministic trace of `len` operations.
///
/// Roughly half the operations allocate, a third release and the rest
/// reallocate, so the arena fragments and coalesces continuously.
pub fn churn_trace(seed: u64, len: usize) -> Vec<TraceOp> {
    let mut state = seed | 1;
    let mut next = move || {
        // 64-bit LCG, high bits only.
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    (0..len)
        .map(|_| match next() % 6 {
            0..=2 => TraceOp::Alloc {
                size: SIZE_CLASSES[next() % SIZE_CLASSES.len()] + (next() % 64) as u32,
                align: ALIGNS[next() % ALIGNS.len()],
            },
            3 | 4 => TraceOp::Release { slot: next() },
            _ => TraceOp::Realloc {
                slot: next(),
                size: SIZE_CLASSES[next() % SIZE_CLASSES.len()],
            },
        })
        .collect()
}

/// Run `trace` against `arena`, then release whatever is still live.
///
/// Returns the number of allocations that failed for lack of memory. Any
/// other allocator error aborts the replay and is returned.
pub fn replay(arena: &mut ArenaAllocator, trace: &[TraceOp]) -> Result<usize, ArenaError> {
    let mut live: Vec<ArenaPtr> = Vec::new();
    let mut failures = 0;

    for op in trace {
        match *op {
            TraceOp::Alloc { size, align } => match arena.allocate(size, align, None) {
                Ok(ptr) => live.push(ptr),
                Err(ArenaError::OutOfMemory { .. }) => failures += 1,
                Err(err) => return Err(err),
            },
            TraceOp::Release { slot } if !live.is_empty() => {
                let ptr = live.swap_remove(slot % live.len());
                arena.release(ptr)?;
            }
            TraceOp::Realloc { slot, size } if !live.is_empty() => {
                let slot = slot % live.len();
                match arena.reallocate(live[slot], size, 16, None) {
                    Ok(ptr) => live[slot] = ptr,
                    Err(ArenaError::OutOfMemory { .. }) => failures += 1,
                    Err(err) => return Err(err),
                }
            }
            _ => {}
        }
    }

    for ptr in live {
        arena.release(ptr)?;
    }
    Ok(failures)
}
