//! End-to-end allocator scenarios: allocate, write, release, coalesce,
//! exhaust and recover.

use strata_arena::{ArenaAllocator, ArenaConfig, ArenaError, ArenaPtr, UNKNOWN_LABEL};
use strata_test_utils::{assert_arena_invariants, init_test_logging, pattern};

fn arena(capacity: u32) -> ArenaAllocator {
    init_test_logging();
    ArenaAllocator::new(ArenaConfig::new(capacity)).unwrap()
}

#[test]
fn write_read_release_restores_single_chunk() {
    let mut a = arena(1024);
    let p = a.allocate(100, 8, None).unwrap();
    assert_eq!(a.address_of(p).unwrap() % 8, 0);

    let bytes = pattern(1, 100);
    a.payload_mut(p).unwrap()[..100].copy_from_slice(&bytes);
    assert_eq!(&a.payload(p).unwrap()[..100], &bytes[..]);
    assert_arena_invariants(&a);

    a.release(p).unwrap();
    let chunks = a.list_chunks().unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].offset, 0);
    assert_eq!(chunks[0].size, 1024);
    assert!(chunks[0].is_free);
}

#[test]
fn releasing_neighbours_merges_their_spans() {
    let mut a = arena(1024);
    let pa = a.allocate(64, 4, Some("A")).unwrap();
    let pb = a.allocate(64, 4, Some("B")).unwrap();
    let pc = a.allocate(64, 4, Some("C")).unwrap();

    let before = a.list_chunks().unwrap();
    let (chunk_a, chunk_b, chunk_c) = (&before[0], &before[1], &before[2]);
    assert_eq!(chunk_a.label, "A");
    assert_eq!(chunk_b.label, "B");
    assert_eq!(chunk_c.label, "C");

    a.release(pb).unwrap();
    assert_arena_invariants(&a);
    a.release(pa).unwrap();
    assert_arena_invariants(&a);

    let after = a.list_chunks().unwrap();
    assert_eq!(after.len(), 3);
    assert!(after[0].is_free);
    assert_eq!(after[0].offset, chunk_a.offset);
    assert_eq!(after[0].size, chunk_a.size + chunk_b.size);
    assert_eq!(after[0].label, UNKNOWN_LABEL);
    assert_eq!(after[1].label, "C");

    // C sits between two free chunks; releasing it merges all three.
    a.release(pc).unwrap();
    let last = a.list_chunks().unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].size, 1024);
    assert!(a.labelled_chunks().is_empty());
}

#[test]
fn oversized_request_fails_cleanly() {
    let capacity = 2048;
    let mut a = arena(capacity);
    let before = a.list_chunks().unwrap();

    let err = a.allocate(capacity + 1, 4, None).unwrap_err();
    assert!(matches!(err, ArenaError::OutOfMemory { .. }));
    assert_eq!(a.list_chunks().unwrap(), before);

    let p = a.allocate(128, 4, None).unwrap();
    assert!(!p.is_null());
    assert_arena_invariants(&a);
}

#[test]
fn releasing_foreign_pointer_is_a_logged_noop() {
    let mut a = arena(1024);
    let _p = a.allocate(40, 8, Some("kept")).unwrap();
    let before = a.list_chunks().unwrap();

    for offset in [4, 6, 200, 1020, 1024, 1 << 20] {
        let err = a.release(ArenaPtr::from_offset(offset)).unwrap_err();
        assert!(matches!(err, ArenaError::InvalidPointer { .. }));
        assert_eq!(a.list_chunks().unwrap(), before);
    }
    assert!(a.reallocate(ArenaPtr::from_offset(2048), 8, 4, None).is_err());
    assert_eq!(a.list_chunks().unwrap(), before);
}

#[test]
fn pointer_inside_live_payload_is_not_released() {
    let mut a = arena(1024);
    let p = a.allocate(40, 8, Some("live")).unwrap();
    // A payload word that reads like an offset back to p's header.
    a.payload_mut(p).unwrap()[..4].copy_from_slice(&12u32.to_ne_bytes());
    let before = a.list_chunks().unwrap();

    let err = a.release(ArenaPtr::from_offset(p.offset() + 4)).unwrap_err();
    assert!(matches!(err, ArenaError::InvalidPointer { .. }));
    assert_eq!(a.list_chunks().unwrap(), before);
    assert_eq!(a.label_of(p).unwrap(), Some("live"));
    assert_arena_invariants(&a);
}

#[test]
fn exhaust_then_recover() {
    let mut a = arena(4096);
    let mut live = Vec::new();
    while let Ok(p) = a.allocate(100, 16, None) {
        live.push(p);
    }
    assert!(live.len() > 10);
    assert_arena_invariants(&a);

    // Free every other allocation: no merges possible yet.
    for p in live.iter().step_by(2) {
        a.release(*p).unwrap();
    }
    assert_arena_invariants(&a);
    assert!(a.allocate(100, 16, None).is_ok());

    for p in live.iter().skip(1).step_by(2) {
        a.release(*p).unwrap();
    }
    assert_arena_invariants(&a);
}

#[test]
fn reallocation_preserves_prefix_across_growth() {
    let mut a = arena(8192);
    let mut p = a.allocate(16, 16, Some("stbi buffer")).unwrap();
    let bytes = pattern(9, 16);
    a.payload_mut(p).unwrap()[..16].copy_from_slice(&bytes);

    for size in [64, 256, 1024, 32] {
        p = a.reallocate(p, size, 16, None).unwrap();
        assert_eq!(a.address_of(p).unwrap() % 16, 0);
        let keep = 16.min(size as usize);
        assert_eq!(&a.payload(p).unwrap()[..keep], &bytes[..keep]);
        assert_eq!(a.label_of(p).unwrap(), Some("stbi buffer"));
        assert_arena_invariants(&a);
    }
}

#[test]
fn debug_tracking_off_lists_unknown() {
    init_test_logging();
    let config = ArenaConfig::new(1024).with_debug_tracking(false);
    let mut a = ArenaAllocator::new(config).unwrap();
    let _p = a.allocate(16, 4, Some("ignored")).unwrap();
    let chunks = a.list_chunks().unwrap();
    assert!(chunks.iter().all(|c| c.label == UNKNOWN_LABEL));
    assert!(a.labelled_chunks().is_empty());
}
