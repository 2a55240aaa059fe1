//! Boundary behaviors around filling and overflowing a single fixed page.

use page_arena::Pool;

#[test]
fn zero_length_alloc_consumes_no_page() {
    let pool = Pool::new(16);
    let mut h = pool.handle();
    let region = h.alloc_bytes(&[]);
    assert!(region.is_empty());
    assert_eq!(pool.stats().pages(), 0);
}

#[test]
fn alloc_of_exactly_page_size_uses_a_fixed_page() {
    let pool = Pool::new(16);
    let mut h = pool.handle();
    let region = h.alloc_bytes(&[1u8; 16]);
    assert_eq!(region.len(), 16);
    assert_eq!(pool.stats().pages_oversized(), 0);
    assert_eq!(pool.stats().pages_fixed_sized(), 4096);
}

#[test]
fn alloc_of_page_size_plus_one_uses_an_oversized_page() {
    let pool = Pool::new(16);
    let mut h = pool.handle();
    let region = h.alloc_bytes(&[1u8; 17]);
    assert_eq!(region.len(), 17);
    assert_eq!(pool.stats().pages_oversized(), 1);
}

#[test]
fn filling_a_page_exactly_then_allocating_one_more_byte_reserves_a_new_page() {
    let pool = Pool::new(16);
    let mut h = pool.handle();
    let _ = h.alloc_bytes(&[1u8; 16]); // fills the page's payload capacity exactly
    let _ = h.alloc_bytes(&[2u8; 1]);
    assert_eq!(pool.stats().pages_link(&h).len(), 2);
}

#[test]
fn allocations_land_in_strict_insertion_order() {
    let pool = Pool::new(64);
    let mut h = pool.handle();
    let _ = h.alloc_bytes(b"first");
    let _ = h.alloc_bytes(b"second");
    let links = pool.stats().pages_link(&h);
    // Both fit on one page (page_size=64 has ample room), so the list has
    // exactly one entry no matter how many allocations shared it.
    assert_eq!(links.len(), 1);
    assert!(links[0].used_bytes >= b"first".len() + b"second".len());
}
