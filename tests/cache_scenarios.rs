//! Cache-simulator scenarios replaying hand-built access traces directly
//! against [`Cache`], mirroring what `csim` does with a parsed trace file.

use y86_pipe_sim::cache::{Cache, Geometry, Operation};

// S5: three reads that collide into the same set (2 sets, 2-way,
// 4-byte lines) all miss, and the third evicts the oldest (clean) line.
#[test]
fn three_way_set_collision_evicts_the_oldest_clean_line() {
    let mut cache = Cache::new(Geometry { s: 1, b: 2, e: 2 });

    let r1 = cache.access(0x00, Operation::Read);
    let r2 = cache.access(0x10, Operation::Read);
    let r3 = cache.access(0x20, Operation::Read);

    assert!(!r1.hit && !r2.hit && !r3.hit);
    let stats = cache.stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.clean_evictions, 1);
    assert_eq!(stats.dirty_evictions, 0);

    let evicted = r3.evicted.expect("third access must evict the oldest line");
    assert_eq!(evicted.addr, 0x00);
    assert!(!evicted.dirty);
}

// S6: a direct-mapped (1-way) set thrashing between two addresses that
// alias to it; the write-read-write pattern produces one dirty and one
// clean eviction.
#[test]
fn one_way_set_thrashing_between_two_writes() {
    let mut cache = Cache::new(Geometry { s: 1, b: 2, e: 1 });

    let r1 = cache.write_byte(0x00, 0xaa);
    let r2 = cache.read_byte(0x10).1;
    let r3 = cache.write_byte(0x00, 0xbb);

    assert!(!r1.hit && !r2.hit && !r3.hit);
    let stats = cache.stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.dirty_evictions + stats.clean_evictions, 2);
}

#[test]
fn dirty_bytes_in_cache_reflects_outstanding_writes() {
    let mut cache = Cache::new(Geometry { s: 2, b: 3, e: 1 });
    assert_eq!(cache.dirty_bytes_in_cache(), 0);

    cache.write_byte(0x00, 1);
    assert_eq!(cache.dirty_bytes_in_cache(), 8); // one 8-byte line, dirty

    cache.access(0x08, Operation::Read); // different set, no eviction
    assert_eq!(cache.dirty_bytes_in_cache(), 8);
}

#[test]
fn word_spanning_a_line_boundary_is_eight_independent_byte_accesses() {
    let mut cache = Cache::new(Geometry { s: 0, b: 2, e: 4 });
    let (_, writes) = cache.access_word(2, Operation::Write, Some(0x0102030405060708));
    assert_eq!(writes.len(), 8);

    let (word, reads) = cache.access_word(2, Operation::Read, None);
    assert_eq!(reads.len(), 8);
    assert_eq!(word, 0x0102030405060708);
}
