//! A chunk is a contiguous, anonymously-mapped block holding a 4096-bit idle
//! bitmap followed by exactly [`PAGES_PER_CHUNK`] fixed-size pages.
//!
//! The bitmap encodes idleness directly: bit set means idle, bit clear means
//! in use. Reservation always takes the lowest set bit first.

use std::ptr::NonNull;

use sys_alloc::{Mmap, MmapOptions};

use crate::page::{PageHeader, HEADER_SIZE};

/// Pages per chunk. Fixed; not configurable.
pub(crate) const PAGES_PER_CHUNK: usize = 4096;

/// Number of `u64` words in the idle bitmap (4096 bits / 64 bits per word).
const BITMAP_WORDS: usize = PAGES_PER_CHUNK / 64;

const BITMAP_BYTES: usize = BITMAP_WORDS * std::mem::size_of::<u64>();

/// A 4096-page backing block plus its idle bitmap.
///
/// Backed by an anonymous `sys_alloc::Mmap` rather than `std::alloc`: the
/// mapping is large (bitmap + `4096 * wrapped_page_size` bytes) and the OS
/// zero-fills it, which every page in the chunk relies on for `next` and
/// `bump_offset` starting at their zero value until the page is activated.
pub(crate) struct Chunk {
    mmap: Mmap,
    wrapped_page_size: usize,
}

impl Chunk {
    /// Maps a new chunk and stamps every page's `index` as
    /// `chunk_idx * PAGES_PER_CHUNK + i`. All 4096 bits start set (idle).
    pub(crate) fn new(chunk_idx: usize, wrapped_page_size: usize) -> Self {
        let total = BITMAP_BYTES + wrapped_page_size * PAGES_PER_CHUNK;
        // SAFETY: `total` is non-zero and the mapping is exclusively owned by
        // this `Chunk` for its whole lifetime.
        let mmap = unsafe {
            MmapOptions::new()
                .len(total)
                .map_anon()
                .expect("host out of memory while mapping a new chunk")
        };

        let chunk = Self {
            mmap,
            wrapped_page_size,
        };

        // SAFETY: the mapping is freshly created and exclusively owned here.
        unsafe {
            let bitmap = chunk.bitmap_ptr();
            for word in bitmap.iter_mut() {
                *word = u64::MAX;
            }
        }

        for i in 0..PAGES_PER_CHUNK {
            let page = chunk.page_at(i);
            // SAFETY: page is within the freshly mapped, zero-filled region.
            unsafe {
                (*page.as_ptr()).index = (chunk_idx * PAGES_PER_CHUNK + i) as isize;
            }
        }

        chunk
    }

    /// Scans the bitmap in ascending word/bit order, clears the first set
    /// bit found, and returns the corresponding page with its bump offset
    /// activated to `HEADER_SIZE`. Returns `None` if every bit is clear.
    pub(crate) fn reserve_next_idle(&self) -> Option<NonNull<PageHeader>> {
        // SAFETY: the mapping is alive for `self`'s lifetime and no other
        // code mutates the bitmap concurrently (single-threaded per pool).
        let bitmap = unsafe { self.bitmap_ptr() };
        for (word_idx, word) in bitmap.iter_mut().enumerate() {
            if *word != 0 {
                let bit_idx = word.trailing_zeros() as usize;
                *word &= !(1u64 << bit_idx);
                let page = self.page_at(word_idx * 64 + bit_idx);
                // SAFETY: page is within the mapped region.
                unsafe {
                    (*page.as_ptr()).bump_offset = HEADER_SIZE;
                }
                return Some(page);
            }
        }
        None
    }

    /// Sets the idle bit for `page_idx_in_chunk`. Returns `1` if the bit
    /// transitioned from clear to set, `0` if it was already set (a
    /// double-release).
    pub(crate) fn release(&self, page_idx_in_chunk: usize) -> u16 {
        let word_idx = page_idx_in_chunk / 64;
        let bit_idx = page_idx_in_chunk % 64;
        let mask = 1u64 << bit_idx;
        // SAFETY: bounds are enforced by callers deriving `page_idx_in_chunk`
        // from a valid page index (`0..PAGES_PER_CHUNK`).
        let bitmap = unsafe { self.bitmap_ptr() };
        let word = &mut bitmap[word_idx];
        let was_set = *word & mask != 0;
        *word |= mask;
        u16::from(!was_set)
    }

    /// Reads the idle bit for `page_idx_in_chunk` without mutating it.
    pub(crate) fn is_idle(&self, page_idx_in_chunk: usize) -> bool {
        let word_idx = page_idx_in_chunk / 64;
        let bit_idx = page_idx_in_chunk % 64;
        // SAFETY: read-only access to the bitmap; no concurrent mutation
        // (single-threaded per pool).
        let bitmap = unsafe { self.bitmap_ptr() };
        bitmap[word_idx] & (1u64 << bit_idx) != 0
    }

    /// Address of the page header at `idx_in_chunk`.
    pub(crate) fn page_at(&self, idx_in_chunk: usize) -> NonNull<PageHeader> {
        debug_assert!(idx_in_chunk < PAGES_PER_CHUNK);
        // SAFETY: offset stays within the mapped region for any
        // `idx_in_chunk < PAGES_PER_CHUNK`.
        unsafe {
            let addr = self
                .mmap
                .ptr()
                .add(BITMAP_BYTES + idx_in_chunk * self.wrapped_page_size);
            NonNull::new_unchecked(addr.cast::<PageHeader>())
        }
    }

    /// # Safety
    /// Exclusive access to the bitmap region must be upheld by the caller
    /// (no concurrent bitmap access; the pool is single-threaded).
    unsafe fn bitmap_ptr(&self) -> &mut [u64; BITMAP_WORDS] {
        unsafe { &mut *self.mmap.ptr().cast::<[u64; BITMAP_WORDS]>() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRAPPED: usize = 16 + HEADER_SIZE;

    #[test]
    fn reserve_consumes_lowest_bit_first() {
        let chunk = Chunk::new(0, WRAPPED);
        let first = chunk.reserve_next_idle().unwrap();
        assert_eq!(unsafe { (*first.as_ptr()).index }, 0);
        let second = chunk.reserve_next_idle().unwrap();
        assert_eq!(unsafe { (*second.as_ptr()).index }, 1);
    }

    #[test]
    fn release_then_reserve_reuses_lowest_idle_bit() {
        let chunk = Chunk::new(0, WRAPPED);
        let _first = chunk.reserve_next_idle().unwrap();
        let _second = chunk.reserve_next_idle().unwrap();
        assert_eq!(chunk.release(0), 1);
        let reused = chunk.reserve_next_idle().unwrap();
        assert_eq!(unsafe { (*reused.as_ptr()).index }, 0);
    }

    #[test]
    fn double_release_reports_zero_bits_flipped() {
        let chunk = Chunk::new(0, WRAPPED);
        let _first = chunk.reserve_next_idle().unwrap();
        assert_eq!(chunk.release(0), 1);
        assert_eq!(chunk.release(0), 0);
    }

    #[test]
    fn exhausting_a_chunk_returns_none() {
        let chunk = Chunk::new(0, WRAPPED);
        for _ in 0..PAGES_PER_CHUNK {
            assert!(chunk.reserve_next_idle().is_some());
        }
        assert!(chunk.reserve_next_idle().is_none());
    }
}
